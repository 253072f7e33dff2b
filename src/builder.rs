//! Builder pattern API for binning reads from library code.
//!
//! This module provides a fluent builder over [`Config`] with the same
//! validation as the command line.
//!
//! # Example
//!
//! ```rust,no_run
//! use kmerbin::builder::KmerBinner;
//!
//! let table = KmerBinner::new()
//!     .n_neighbors(15)?
//!     .min_cluster_size(5)?
//!     .metric("cosine")
//!     .run("freqs.tsv", "bins.tsv")?;
//!
//! println!("{} clusters, {} noise reads", table.n_clusters(), table.n_noise());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::path::{Path, PathBuf};

use crate::{
    config::{
        validate_epsilon, validate_min_cluster_size, validate_min_dist, validate_min_samples,
        validate_n_components, validate_n_neighbors, ClusterParams, Config, EmbedParams,
    },
    error::{KmerBinError, ParamError},
    input::Input,
    run::run,
    table::ClusteredTable,
};

/// A builder for configuring a binning run.
///
/// Use [`KmerBinner::new()`] to start from the defaults, adjust it with the
/// fluent setters, then call [`run()`](KmerBinner::run) or build a
/// [`Config`] with [`config()`](KmerBinner::config).
///
/// Setters for numeric hyperparameters validate their argument and return
/// [`ParamError`] when it is out of range.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct KmerBinner {
    embed: EmbedParams,
    cluster: ClusterParams,
    plot: bool,
}

impl KmerBinner {
    /// Creates a builder with the default hyperparameters.
    ///
    /// # Example
    ///
    /// ```rust
    /// use kmerbin::builder::KmerBinner;
    ///
    /// let binner = KmerBinner::new();
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of neighbors used to build the embedding graph.
    ///
    /// # Errors
    ///
    /// Returns [`ParamError`] if `n` is less than 2.
    pub fn n_neighbors(mut self, n: usize) -> Result<Self, ParamError> {
        self.embed.n_neighbors = validate_n_neighbors(n)?;
        Ok(self)
    }

    /// Sets the minimum distance between embedded points.
    ///
    /// # Errors
    ///
    /// Returns [`ParamError`] if `min_dist` is negative or not finite.
    pub fn min_dist(mut self, min_dist: f64) -> Result<Self, ParamError> {
        self.embed.min_dist = validate_min_dist(min_dist)?;
        Ok(self)
    }

    /// Sets the distance metric by name. Unknown names are reported when the
    /// run starts.
    #[must_use]
    pub fn metric(mut self, metric: impl Into<String>) -> Self {
        self.embed.metric = metric.into();
        self
    }

    /// Computes neighbor distances one row at a time instead of in blocks of
    /// [`crate::embed::DISTANCE_BLOCK_ROWS`]. The embedding is identical either way.
    #[must_use]
    pub fn low_memory(mut self, low_memory: bool) -> Self {
        self.embed.low_memory = low_memory;
        self
    }

    /// Sets the embedding dimensionality, which is also the number of
    /// dimensions clustered.
    ///
    /// # Errors
    ///
    /// Returns [`ParamError`] if `n` is 0.
    pub fn n_components(mut self, n: usize) -> Result<Self, ParamError> {
        let n = validate_n_components(n)?;
        self.embed.n_components = n;
        self.cluster.n_components = n;
        Ok(self)
    }

    /// Sets the seed of the embedding's random number generator.
    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.embed.random_state = seed;
        self
    }

    /// Sets the smallest group of reads that counts as a cluster.
    ///
    /// # Errors
    ///
    /// Returns [`ParamError`] if `n` is less than 2.
    pub fn min_cluster_size(mut self, n: usize) -> Result<Self, ParamError> {
        self.cluster.min_cluster_size = validate_min_cluster_size(n)?;
        Ok(self)
    }

    /// Sets the neighborhood size that defines a core point.
    ///
    /// # Errors
    ///
    /// Returns [`ParamError`] if `n` is 0.
    pub fn min_samples(mut self, n: usize) -> Result<Self, ParamError> {
        self.cluster.min_samples = validate_min_samples(n)?;
        Ok(self)
    }

    /// Sets the cluster selection epsilon.
    ///
    /// # Errors
    ///
    /// Returns [`ParamError`] if `epsilon` is negative or not finite.
    pub fn epsilon(mut self, epsilon: f64) -> Result<Self, ParamError> {
        self.cluster.epsilon = validate_epsilon(epsilon)?;
        Ok(self)
    }

    /// Also renders the clusters to a PNG next to the output table.
    #[must_use]
    pub fn plot(mut self, plot: bool) -> Self {
        self.plot = plot;
        self
    }

    /// Builds the run configuration. An `input` of `-` reads stdin.
    ///
    /// # Example
    ///
    /// ```rust
    /// use kmerbin::builder::KmerBinner;
    ///
    /// let config = KmerBinner::new().n_components(3)?.config("freqs.tsv", "bins.tsv");
    /// assert_eq!(config.cluster.n_components, 3);
    /// # Ok::<(), kmerbin::error::ParamError>(())
    /// ```
    pub fn config(&self, input: impl AsRef<Path>, output: impl Into<PathBuf>) -> Config {
        Config {
            input: Input::from_path(input.as_ref()),
            output: output.into(),
            embed: self.embed.clone(),
            cluster: self.cluster.clone(),
            plot: self.plot,
        }
    }

    /// Bins the reads of `input` and writes the clustered table to `output`.
    ///
    /// # Errors
    ///
    /// Returns any [`KmerBinError`] raised by the pipeline.
    pub fn run(
        &self,
        input: impl AsRef<Path>,
        output: impl Into<PathBuf>,
    ) -> Result<ClusteredTable, KmerBinError> {
        run(&self.config(input, output))
    }
}
