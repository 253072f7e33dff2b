//! Error types for kmerbin.
//!
//! Every stage of the pipeline reports failures through [`KmerBinError`].
//! None of them are recovered: the binary prints the error and exits.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur in kmerbin operations.
#[derive(Debug, Error)]
pub enum KmerBinError {
    /// Failed to open or read the frequency table.
    #[error("failed to read frequency table '{path}': {source}")]
    InputRead {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// A table does not have the expected columns, shape or contents.
    #[error("malformed table: {details}")]
    Schema { details: String },

    /// The distance metric name is not one kmerbin knows.
    #[error("unknown distance metric '{name}' (expected one of: {expected})")]
    UnknownMetric { name: String, expected: String },

    /// The embedding could not be computed for these data and parameters.
    #[error("embedding failed: {details}")]
    Embedding { details: String },

    /// The clustering library rejected the embedding.
    #[error("clustering failed: {details}")]
    Clustering { details: String },

    /// Failed to render or encode the cluster plot.
    #[error("failed to plot clusters to '{path}': {details}")]
    Plot { details: String, path: PathBuf },

    /// Failed to write the clustered table.
    #[error("failed to write clustered table '{path}': {source}")]
    OutputWrite {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
}

impl KmerBinError {
    pub(crate) fn schema(details: impl Into<String>) -> Self {
        Self::Schema {
            details: details.into(),
        }
    }

    pub(crate) fn embedding(details: impl Into<String>) -> Self {
        Self::Embedding {
            details: details.into(),
        }
    }
}

/// Error for a hyperparameter outside its valid range.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid {name} '{value}': {constraint}")]
pub struct ParamError {
    /// Name of the parameter, as spelled on the command line.
    pub name: &'static str,
    /// The rejected value.
    pub value: String,
    /// Human readable description of the valid range.
    pub constraint: &'static str,
}
