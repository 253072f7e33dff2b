//! Table format detection.
//!
//! Frequency tables are tab-separated by convention. Comma-separated tables
//! are accepted when the file extension says so. Output is always
//! tab-separated.

use std::ffi::OsStr;
use std::path::Path;

/// Delimited text format of a frequency table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TableFormat {
    /// Tab-separated values (`.tsv`, `.tab`, `.txt`, anything unknown).
    #[default]
    Tsv,
    /// Comma-separated values (`.csv`).
    Csv,
}

impl TableFormat {
    /// Detects the table format from a file path's extension.
    ///
    /// Handles gzip-compressed files by stripping the `.gz` extension first.
    ///
    /// # Examples
    ///
    /// ```
    /// use kmerbin::format::TableFormat;
    /// use std::path::Path;
    ///
    /// assert_eq!(TableFormat::from_extension(Path::new("freqs.tsv")), TableFormat::Tsv);
    /// assert_eq!(TableFormat::from_extension(Path::new("freqs.csv.gz")), TableFormat::Csv);
    /// assert_eq!(TableFormat::from_extension(Path::new("freqs")), TableFormat::Tsv);
    /// ```
    #[must_use]
    pub fn from_extension(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(OsStr::to_str)
            .map(str::to_lowercase);

        let effective_ext = match ext.as_deref() {
            Some("gz") => path
                .file_stem()
                .and_then(|stem| Path::new(stem).extension())
                .and_then(OsStr::to_str)
                .map(str::to_lowercase),
            other => other.map(String::from),
        };

        match effective_ext.as_deref() {
            Some("csv") => Self::Csv,
            _ => Self::Tsv,
        }
    }

    /// Field delimiter byte for this format.
    #[must_use]
    pub const fn delimiter(self) -> u8 {
        match self {
            Self::Tsv => b'\t',
            Self::Csv => b',',
        }
    }
}

impl std::fmt::Display for TableFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Tsv => write!(f, "tsv"),
            Self::Csv => write!(f, "csv"),
        }
    }
}
