//! # kmerbin
//!
//! Bins sequencing reads by k-mer composition. A per-read k-mer frequency
//! table is reduced to a low-dimensional embedding with UMAP, the embedding is
//! clustered with HDBSCAN, and every read is written back out with its
//! coordinates and a `bin_id` (`-1` for reads that fall in no cluster).
//!
//! ## Pipeline
//!
//! ```text
//! frequency table ─► embed (UMAP) ─► cluster (HDBSCAN) ─► [plot] ─► clustered table
//! ```
//!
//! Each stage is a public function, and [`run::run`] chains them:
//!
//! - [`table::read_frequency_table`]
//! - [`embed::embed`]
//! - [`cluster::cluster`]
//! - [`plot::plot_clusters`]
//! - [`table::write_clustered_table`]
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use kmerbin::builder::KmerBinner;
//!
//! let table = KmerBinner::new()
//!     .n_neighbors(30)?
//!     .min_cluster_size(5)?
//!     .plot(true)
//!     .run("freqs.tsv", "bins.tsv")?;
//!
//! for (label, first_row) in table.first_row_by_label() {
//!     println!("bin {label} starts at {}", table.reads()[first_row]);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Determinism
//!
//! The embedding runs on one thread from a seeded RNG
//! ([`config::DEFAULT_RANDOM_STATE`] unless overridden), so identical input
//! and hyperparameters give bit-identical output.
//!
//! ## Features
//!
//! - `tracing`: structured logging of every stage (enabled by default)
//! - `gzip`: transparently read `.gz` frequency tables

pub mod builder;
pub mod cli;
pub mod cluster;
pub mod config;
pub mod embed;
pub mod error;
pub mod format;
pub mod input;
pub mod metric;
pub mod plot;
pub mod run;
pub mod table;
