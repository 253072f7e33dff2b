//! Command-line interface definition.

use clap::Parser;
use std::path::PathBuf;

use crate::config::{
    self, DEFAULT_EPSILON, DEFAULT_METRIC, DEFAULT_MIN_CLUSTER_SIZE, DEFAULT_MIN_DIST,
    DEFAULT_MIN_SAMPLES, DEFAULT_N_COMPONENTS, DEFAULT_N_NEIGHBORS, DEFAULT_OUTPUT,
    DEFAULT_RANDOM_STATE,
};

/// Bin sequencing reads by k-mer composition: UMAP embedding followed by
/// HDBSCAN clustering.
#[derive(Parser, Debug)]
#[command(name = "kmerbin")]
#[command(version, author, about, long_about = None)]
pub struct Args {
    /// K-mer frequency table (tab-delimited, header row, `-` for stdin)
    #[arg(short = 'k', long = "kmer")]
    pub kmer: PathBuf,

    /// Number of neighbors for UMAP
    #[arg(short = 'n', long = "n_neighbors", default_value_t = DEFAULT_N_NEIGHBORS, value_parser = parse_n_neighbors)]
    pub n_neighbors: usize,

    /// Minimum distance between embedded points for UMAP
    #[arg(short = 'd', long = "min_dist", default_value_t = DEFAULT_MIN_DIST, value_parser = parse_min_dist)]
    pub min_dist: f64,

    /// Distance metric for UMAP
    #[arg(short = 'r', long = "metric", default_value = DEFAULT_METRIC)]
    pub metric: String,

    /// Compute neighbor distances one row at a time instead of in blocks
    #[arg(short = 'l', long = "low_memory")]
    pub low_memory: bool,

    /// Number of UMAP output dimensions
    #[arg(short = 't', long = "n_components", default_value_t = DEFAULT_N_COMPONENTS, value_parser = parse_n_components)]
    pub n_components: usize,

    /// Minimum cluster size for HDBSCAN
    #[arg(short = 's', long = "min_cluster_size", default_value_t = DEFAULT_MIN_CLUSTER_SIZE, value_parser = parse_min_cluster_size)]
    pub min_cluster_size: usize,

    /// Minimum samples for HDBSCAN core points
    #[arg(short = 'm', long = "min_samples", default_value_t = DEFAULT_MIN_SAMPLES, value_parser = parse_min_samples)]
    pub min_samples: usize,

    /// Cluster selection epsilon (stop splitting clusters closer than this)
    #[arg(short = 'e', long = "epsilon", default_value_t = DEFAULT_EPSILON, value_parser = parse_epsilon)]
    pub epsilon: f64,

    /// Output path for the clustered table
    #[arg(short = 'c', long = "cluster", default_value = DEFAULT_OUTPUT)]
    pub cluster: PathBuf,

    /// Also plot the clusters to a PNG next to the clustered table
    #[arg(short = 'p', long = "plot")]
    pub plot: bool,

    /// Suppress informational output
    #[arg(short = 'q', long = "quiet")]
    pub quiet: bool,

    /// Random seed for the embedding
    #[arg(long = "seed", default_value_t = DEFAULT_RANDOM_STATE)]
    pub seed: u64,
}

fn parse_usize(s: &str) -> Result<usize, String> {
    s.parse().map_err(|_| format!("'{s}' is not a valid number"))
}

fn parse_f64(s: &str) -> Result<f64, String> {
    s.parse().map_err(|_| format!("'{s}' is not a valid number"))
}

fn parse_n_neighbors(s: &str) -> Result<usize, String> {
    config::validate_n_neighbors(parse_usize(s)?).map_err(|e| e.to_string())
}

fn parse_n_components(s: &str) -> Result<usize, String> {
    config::validate_n_components(parse_usize(s)?).map_err(|e| e.to_string())
}

fn parse_min_cluster_size(s: &str) -> Result<usize, String> {
    config::validate_min_cluster_size(parse_usize(s)?).map_err(|e| e.to_string())
}

fn parse_min_samples(s: &str) -> Result<usize, String> {
    config::validate_min_samples(parse_usize(s)?).map_err(|e| e.to_string())
}

fn parse_min_dist(s: &str) -> Result<f64, String> {
    config::validate_min_dist(parse_f64(s)?).map_err(|e| e.to_string())
}

fn parse_epsilon(s: &str) -> Result<f64, String> {
    config::validate_epsilon(parse_f64(s)?).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_is_well_formed() {
        Args::command().debug_assert();
    }

    #[test]
    fn defaults() {
        let args = Args::try_parse_from(["kmerbin", "-k", "freqs.tsv"]).unwrap();
        assert_eq!(args.n_neighbors, 50);
        assert!((args.min_dist - 0.1).abs() < f64::EPSILON);
        assert_eq!(args.metric, "euclidean");
        assert!(!args.low_memory);
        assert_eq!(args.n_components, 2);
        assert_eq!(args.min_cluster_size, 10);
        assert_eq!(args.min_samples, 10);
        assert!(args.epsilon.abs() < f64::EPSILON);
        assert_eq!(args.cluster, PathBuf::from("kmerbin_clusters.tsv"));
        assert!(!args.plot);
        assert_eq!(args.seed, 123);
    }

    #[test]
    fn short_flags() {
        let args = Args::try_parse_from([
            "kmerbin", "-k", "freqs.tsv", "-n", "15", "-d", "0.0", "-r", "cosine", "-l", "-t",
            "3", "-s", "5", "-m", "3", "-e", "0.25", "-c", "out.tsv", "-p", "-q",
        ])
        .unwrap();
        assert_eq!(args.n_neighbors, 15);
        assert!(args.min_dist.abs() < f64::EPSILON);
        assert_eq!(args.metric, "cosine");
        assert!(args.low_memory);
        assert_eq!(args.n_components, 3);
        assert_eq!(args.min_cluster_size, 5);
        assert_eq!(args.min_samples, 3);
        assert!((args.epsilon - 0.25).abs() < f64::EPSILON);
        assert_eq!(args.cluster, PathBuf::from("out.tsv"));
        assert!(args.plot);
        assert!(args.quiet);
    }

    #[test]
    fn long_flags_use_underscores() {
        let args = Args::try_parse_from([
            "kmerbin",
            "--kmer",
            "freqs.tsv",
            "--n_neighbors",
            "20",
            "--min_cluster_size",
            "4",
            "--low_memory",
        ])
        .unwrap();
        assert_eq!(args.n_neighbors, 20);
        assert_eq!(args.min_cluster_size, 4);
        assert!(args.low_memory);
    }

    #[test]
    fn kmer_is_required() {
        assert!(Args::try_parse_from(["kmerbin"]).is_err());
    }

    #[test]
    fn rejects_out_of_range_values() {
        for bad in [
            vec!["-n", "1"],
            vec!["-n", "abc"],
            vec!["-t", "0"],
            vec!["-s", "1"],
            vec!["-m", "0"],
            vec!["-d", "-0.5"],
            vec!["-e", "nan"],
        ] {
            let mut argv = vec!["kmerbin", "-k", "freqs.tsv"];
            argv.extend(bad.iter());
            assert!(
                Args::try_parse_from(argv.iter().copied()).is_err(),
                "{bad:?} accepted"
            );
        }
    }
}
