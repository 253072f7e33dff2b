//! The read-binning pipeline.
//!
//! One run reads the frequency table, embeds it, clusters the embedding,
//! optionally plots it, and writes the clustered table. The table is written
//! last, so a failed run never leaves a fresh output table behind.

use crate::{
    cluster::cluster,
    config::Config,
    embed::embed,
    error::KmerBinError,
    plot::plot_clusters,
    table::{read_frequency_table, write_clustered_table, ClusteredTable},
};

#[cfg(feature = "tracing")]
use tracing::{info, info_span};

/// Runs the full pipeline described by `config` and returns the clustered
/// table that was written.
///
/// # Errors
///
/// Returns the first [`KmerBinError`] raised by any stage. Nothing is written
/// to `config.output` unless every earlier stage, the plot included, succeeds.
///
/// # Example
///
/// ```rust,no_run
/// use kmerbin::{config::Config, input::Input, run::run};
/// use std::path::Path;
///
/// let config = Config::new(Input::from_path(Path::new("freqs.tsv")), "bins.tsv");
/// let table = run(&config)?;
/// println!("{} clusters", table.n_clusters());
/// # Ok::<(), kmerbin::error::KmerBinError>(())
/// ```
pub fn run(config: &Config) -> Result<ClusteredTable, KmerBinError> {
    #[cfg(feature = "tracing")]
    let _span = info_span!("run", input = %config.input, output = %config.output.display())
        .entered();

    let frequencies = read_frequency_table(&config.input)?;
    let embedded = embed(&frequencies, &config.embed)?;
    let clustered = cluster(embedded, &config.cluster)?;

    if config.plot {
        plot_clusters(&clustered, &config.plot_path())?;
    }

    write_clustered_table(&clustered, &config.output)?;

    #[cfg(feature = "tracing")]
    info!(
        reads = clustered.n_reads(),
        clusters = clustered.n_clusters(),
        noise = clustered.n_noise(),
        "Run complete"
    );

    Ok(clustered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Input;
    use std::fmt::Write as _;

    /// Two groups of reads with opposite k-mer profiles.
    fn two_profile_table(reads_per_group: usize) -> String {
        let mut text = String::from("read\tlength\tAA\tAC\tCA\tCC\n");
        for i in 0..2 * reads_per_group {
            let step = (i % reads_per_group) as f64 * 0.001;
            let row = if i < reads_per_group {
                [0.4 + step, 0.3, 0.2, 0.1 - step / 2.0]
            } else {
                [0.1 - step / 2.0, 0.2, 0.3, 0.4 + step]
            };
            writeln!(
                text,
                "read{i}\t{}\t{}\t{}\t{}\t{}",
                1000 + i,
                row[0],
                row[1],
                row[2],
                row[3]
            )
            .unwrap();
        }
        text
    }

    fn config_for(dir: &std::path::Path, reads_per_group: usize) -> Config {
        let input = dir.join("freqs.tsv");
        std::fs::write(&input, two_profile_table(reads_per_group)).unwrap();
        let mut config = Config::new(Input::File(input), dir.join("bins.tsv"));
        config.embed.n_neighbors = 10;
        config.cluster.min_cluster_size = 5;
        config.cluster.min_samples = 5;
        config
    }

    #[test]
    fn run_writes_clustered_table() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_for(dir.path(), 25);

        let table = run(&config).unwrap();
        assert_eq!(table.n_reads(), 50);
        assert_eq!(table.n_components(), 2);

        let written = std::fs::read_to_string(&config.output).unwrap();
        let mut lines = written.lines();
        assert_eq!(lines.next(), Some("read\tlength\tD1\tD2\tbin_id"));
        assert_eq!(lines.count(), 50);
        assert!(!config.plot_path().exists());
    }

    #[test]
    fn failed_embedding_leaves_no_output() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_for(dir.path(), 5);
        config.embed.n_neighbors = 11;

        let err = run(&config).unwrap_err();
        assert!(matches!(err, KmerBinError::Embedding { .. }));
        assert!(!config.output.exists());
    }

    #[test]
    fn missing_input_is_input_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::new(
            Input::File(dir.path().join("absent.tsv")),
            dir.path().join("bins.tsv"),
        );
        let err = run(&config).unwrap_err();
        assert!(matches!(err, KmerBinError::InputRead { .. }));
        assert!(!config.output.exists());
    }
}
