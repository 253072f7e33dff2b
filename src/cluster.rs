//! HDBSCAN clustering of the embedding.

use hdbscan::{Hdbscan, HdbscanHyperParams};

use crate::{
    config::ClusterParams,
    error::KmerBinError,
    table::{dimension_names, ClusteredTable, EmbeddedTable},
};

#[cfg(feature = "tracing")]
use tracing::{debug, info};

/// Assigns a `bin_id` to every read of `embedded`.
///
/// Only the first `params.n_components` embedding columns are clustered.
/// Reads that fall in no dense region get [`crate::table::NOISE`].
///
/// # Errors
///
/// - [`KmerBinError::Schema`] if the table is empty or has fewer than
///   `n_components` embedding columns;
/// - [`KmerBinError::Clustering`] if `min_samples` exceeds the number of reads
///   or the clustering library rejects the data.
pub fn cluster(
    embedded: EmbeddedTable,
    params: &ClusterParams,
) -> Result<ClusteredTable, KmerBinError> {
    let points = feature_rows(&embedded, params.n_components)?;

    if params.min_samples > points.len() {
        return Err(KmerBinError::Clustering {
            details: format!(
                "min_samples ({}) is larger than the number of reads ({})",
                params.min_samples,
                points.len()
            ),
        });
    }

    #[cfg(feature = "tracing")]
    info!(
        reads = points.len(),
        columns = ?dimension_names(params.n_components).collect::<Vec<_>>(),
        min_cluster_size = params.min_cluster_size,
        min_samples = params.min_samples,
        epsilon = params.epsilon,
        "Clustering embedding"
    );

    let hyper_params = HdbscanHyperParams::builder()
        .min_cluster_size(params.min_cluster_size)
        .min_samples(params.min_samples)
        .epsilon(params.epsilon)
        .build();

    let labels = Hdbscan::new(&points, hyper_params)
        .cluster()
        .map_err(|e| KmerBinError::Clustering {
            details: format!("{e:?}"),
        })?;

    let clustered = ClusteredTable::new(embedded, labels)?;

    #[cfg(feature = "tracing")]
    {
        info!(
            clusters = clustered.n_clusters(),
            noise = clustered.n_noise(),
            "Clustering complete"
        );
        for (label, row) in clustered.first_row_by_label() {
            debug!(label, first_read = %clustered.reads()[row], "Cluster");
        }
    }

    Ok(clustered)
}

/// The `D1..D<n_components>` columns as one point per read.
fn feature_rows(
    embedded: &EmbeddedTable,
    n_components: usize,
) -> Result<Vec<Vec<f64>>, KmerBinError> {
    if embedded.n_reads() == 0 {
        return Err(KmerBinError::schema("no reads to cluster"));
    }
    if n_components == 0 || n_components > embedded.n_components() {
        let missing = dimension_names(n_components)
            .skip(embedded.n_components())
            .collect::<Vec<_>>()
            .join(", ");
        return Err(KmerBinError::schema(format!(
            "clustering needs {n_components} embedding columns, found {} (missing {missing})",
            embedded.n_components()
        )));
    }

    Ok(embedded
        .embedding()
        .rows()
        .into_iter()
        .map(|row| row.iter().take(n_components).copied().collect())
        .collect())
}
