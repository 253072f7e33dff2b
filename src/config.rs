//! Run configuration and hyperparameter validation.
//!
//! [`Config`] is built from the command line ([`crate::cli::Args`]) or
//! through [`crate::builder::KmerBinner`]. The validators here are shared by
//! both so the CLI and the library reject the same values.

use std::path::PathBuf;

use crate::{cli::Args, error::ParamError, input::Input};

/// Default number of neighbors for the embedding.
pub const DEFAULT_N_NEIGHBORS: usize = 50;
/// Default minimum distance between embedded points.
pub const DEFAULT_MIN_DIST: f64 = 0.1;
/// Default distance metric name.
pub const DEFAULT_METRIC: &str = "euclidean";
/// Default embedding dimensionality.
pub const DEFAULT_N_COMPONENTS: usize = 2;
/// Default seed for the embedding's random number generator.
pub const DEFAULT_RANDOM_STATE: u64 = 123;
/// Default minimum cluster size.
pub const DEFAULT_MIN_CLUSTER_SIZE: usize = 10;
/// Default minimum samples for core points.
pub const DEFAULT_MIN_SAMPLES: usize = 10;
/// Default cluster-selection epsilon.
pub const DEFAULT_EPSILON: f64 = 0.0;
/// Default path of the clustered table.
pub const DEFAULT_OUTPUT: &str = "kmerbin_clusters.tsv";

/// Hyperparameters of the embedding stage.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbedParams {
    pub n_neighbors: usize,
    pub min_dist: f64,
    /// Metric name, parsed by the embedder.
    pub metric: String,
    pub low_memory: bool,
    pub n_components: usize,
    /// Seed for initialization and negative sampling.
    pub random_state: u64,
}

impl Default for EmbedParams {
    fn default() -> Self {
        Self {
            n_neighbors: DEFAULT_N_NEIGHBORS,
            min_dist: DEFAULT_MIN_DIST,
            metric: DEFAULT_METRIC.to_string(),
            low_memory: false,
            n_components: DEFAULT_N_COMPONENTS,
            random_state: DEFAULT_RANDOM_STATE,
        }
    }
}

/// Hyperparameters of the clustering stage.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterParams {
    pub min_cluster_size: usize,
    pub min_samples: usize,
    pub epsilon: f64,
    /// Number of `D*` columns fed to the clusterer.
    pub n_components: usize,
}

impl Default for ClusterParams {
    fn default() -> Self {
        Self {
            min_cluster_size: DEFAULT_MIN_CLUSTER_SIZE,
            min_samples: DEFAULT_MIN_SAMPLES,
            epsilon: DEFAULT_EPSILON,
            n_components: DEFAULT_N_COMPONENTS,
        }
    }
}

/// Everything one pipeline run needs.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub input: Input,
    pub output: PathBuf,
    pub embed: EmbedParams,
    pub cluster: ClusterParams,
    pub plot: bool,
}

impl Config {
    /// Creates a configuration with default hyperparameters.
    pub fn new(input: Input, output: impl Into<PathBuf>) -> Self {
        Self {
            input,
            output: output.into(),
            embed: EmbedParams::default(),
            cluster: ClusterParams::default(),
            plot: false,
        }
    }

    /// Path of the plot image: the output path with a `.png` extension.
    pub fn plot_path(&self) -> PathBuf {
        self.output.with_extension("png")
    }
}

impl From<Args> for Config {
    fn from(args: Args) -> Self {
        Self {
            input: Input::from_path(&args.kmer),
            output: args.cluster,
            embed: EmbedParams {
                n_neighbors: args.n_neighbors,
                min_dist: args.min_dist,
                metric: args.metric,
                low_memory: args.low_memory,
                n_components: args.n_components,
                random_state: args.seed,
            },
            cluster: ClusterParams {
                min_cluster_size: args.min_cluster_size,
                min_samples: args.min_samples,
                epsilon: args.epsilon,
                n_components: args.n_components,
            },
            plot: args.plot,
        }
    }
}

pub fn validate_n_neighbors(n: usize) -> Result<usize, ParamError> {
    at_least("n_neighbors", n, 2)
}

pub fn validate_n_components(n: usize) -> Result<usize, ParamError> {
    at_least("n_components", n, 1)
}

pub fn validate_min_cluster_size(n: usize) -> Result<usize, ParamError> {
    at_least("min_cluster_size", n, 2)
}

pub fn validate_min_samples(n: usize) -> Result<usize, ParamError> {
    at_least("min_samples", n, 1)
}

pub fn validate_min_dist(x: f64) -> Result<f64, ParamError> {
    non_negative("min_dist", x)
}

pub fn validate_epsilon(x: f64) -> Result<f64, ParamError> {
    non_negative("epsilon", x)
}

fn at_least(name: &'static str, n: usize, min: usize) -> Result<usize, ParamError> {
    if n >= min {
        return Ok(n);
    }
    Err(ParamError {
        name,
        value: n.to_string(),
        constraint: if min == 1 {
            "must be at least 1"
        } else {
            "must be at least 2"
        },
    })
}

fn non_negative(name: &'static str, x: f64) -> Result<f64, ParamError> {
    if x.is_finite() && x >= 0.0 {
        return Ok(x);
    }
    Err(ParamError {
        name,
        value: x.to_string(),
        constraint: "must be a finite, non-negative number",
    })
}
