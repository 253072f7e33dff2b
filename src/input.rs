//! Input source abstraction for file and stdin.
//!
//! Frequency tables are usually produced by an upstream k-mer counting step
//! and can be piped straight in with `-k -`.
//!
//! # Example
//!
//! ```rust
//! use kmerbin::input::Input;
//! use std::path::Path;
//!
//! let input = Input::from_path(Path::new("freqs.tsv"));
//! assert!(matches!(input, Input::File(_)));
//!
//! let input = Input::from_path(Path::new("-"));
//! assert!(matches!(input, Input::Stdin));
//! ```

use std::{
    fs::File,
    io::{self, BufReader, Read},
    path::{Path, PathBuf},
};

use crate::error::KmerBinError;

/// Source of a k-mer frequency table.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Input {
    /// Read from a file at the specified path.
    File(PathBuf),
    /// Read from standard input.
    #[default]
    Stdin,
}

impl Input {
    /// Creates an `Input` from a path, treating `-` as stdin.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        if path.as_os_str() == "-" {
            Self::Stdin
        } else {
            Self::File(path.to_path_buf())
        }
    }

    /// Returns `true` if this input is stdin.
    #[must_use]
    pub const fn is_stdin(&self) -> bool {
        matches!(self, Self::Stdin)
    }

    /// Returns the file path if this is a file input.
    #[must_use]
    pub fn as_path(&self) -> Option<&Path> {
        match self {
            Self::File(path) => Some(path),
            Self::Stdin => None,
        }
    }

    /// Path used in error messages.
    pub(crate) fn display_path(&self) -> PathBuf {
        match self {
            Self::File(path) => path.clone(),
            Self::Stdin => PathBuf::from("<stdin>"),
        }
    }

    /// Opens the input for reading, decompressing `.gz` files when the
    /// `gzip` feature is enabled.
    pub fn open(&self) -> Result<Box<dyn Read>, KmerBinError> {
        match self {
            Self::Stdin => Ok(Box::new(BufReader::new(io::stdin()))),
            Self::File(path) => {
                let file = File::open(path).map_err(|source| KmerBinError::InputRead {
                    source,
                    path: path.clone(),
                })?;
                open_file(file, path)
            }
        }
    }
}

/// Check if a path has a gzip extension (.gz).
fn is_gzip_path(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "gz")
}

#[cfg(feature = "gzip")]
fn open_file(file: File, path: &Path) -> Result<Box<dyn Read>, KmerBinError> {
    use flate2::read::MultiGzDecoder;

    if is_gzip_path(path) {
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

#[cfg(not(feature = "gzip"))]
fn open_file(file: File, path: &Path) -> Result<Box<dyn Read>, KmerBinError> {
    if is_gzip_path(path) {
        return Err(KmerBinError::schema(format!(
            "'{}' looks gzip-compressed; rebuild with the `gzip` feature to read it",
            path.display()
        )));
    }
    Ok(Box::new(BufReader::new(file)))
}

impl std::fmt::Display for Input {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Stdin => write!(f, "<stdin>"),
        }
    }
}
