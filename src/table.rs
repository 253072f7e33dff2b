//! Frequency, embedded and clustered tables, and their delimited text I/O.
//!
//! Data flows through three table types, one per pipeline stage:
//!
//! - [`FrequencyTable`]: `read`, `length` and one column per k-mer motif;
//! - [`EmbeddedTable`]: `read`, `length` and the embedding columns `D1..Dn`;
//! - [`ClusteredTable`]: the embedded table plus one `bin_id` per read.
//!
//! Every table keeps the row order of the input file.

use std::{
    collections::BTreeMap,
    fs::File,
    io::{self, BufWriter, Read, Write},
    path::{Path, PathBuf},
};

use ndarray::Array2;

use crate::{error::KmerBinError, format::TableFormat, input::Input};

#[cfg(feature = "tracing")]
use tracing::{debug, info};

/// Name of the read identifier column.
pub const READ_COLUMN: &str = "read";
/// Name of the read length column.
pub const LENGTH_COLUMN: &str = "length";
/// Name of the cluster label column.
pub const BIN_COLUMN: &str = "bin_id";
/// Label of reads that belong to no cluster.
pub const NOISE: i32 = -1;

/// Per-read k-mer frequencies.
#[derive(Debug, Clone, PartialEq)]
pub struct FrequencyTable {
    reads: Vec<String>,
    lengths: Vec<u64>,
    motifs: Vec<String>,
    frequencies: Array2<f64>,
}

impl FrequencyTable {
    /// Creates a table, checking that every column has one entry per read.
    pub fn new(
        reads: Vec<String>,
        lengths: Vec<u64>,
        motifs: Vec<String>,
        frequencies: Array2<f64>,
    ) -> Result<Self, KmerBinError> {
        if motifs.is_empty() {
            return Err(KmerBinError::schema("no k-mer motif columns"));
        }
        if reads.len() != lengths.len() || reads.len() != frequencies.nrows() {
            return Err(KmerBinError::schema(format!(
                "{} reads, {} lengths and {} frequency rows",
                reads.len(),
                lengths.len(),
                frequencies.nrows()
            )));
        }
        if motifs.len() != frequencies.ncols() {
            return Err(KmerBinError::schema(format!(
                "{} motif names for {} frequency columns",
                motifs.len(),
                frequencies.ncols()
            )));
        }
        Ok(Self {
            reads,
            lengths,
            motifs,
            frequencies,
        })
    }

    pub fn n_reads(&self) -> usize {
        self.reads.len()
    }

    pub fn reads(&self) -> &[String] {
        &self.reads
    }

    pub fn lengths(&self) -> &[u64] {
        &self.lengths
    }

    /// Motif column names, in header order.
    pub fn motifs(&self) -> &[String] {
        &self.motifs
    }

    /// Reads × motifs frequency matrix.
    pub fn frequencies(&self) -> &Array2<f64> {
        &self.frequencies
    }
}

/// Reads with their embedding coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddedTable {
    reads: Vec<String>,
    lengths: Vec<u64>,
    embedding: Array2<f64>,
}

impl EmbeddedTable {
    pub fn new(
        reads: Vec<String>,
        lengths: Vec<u64>,
        embedding: Array2<f64>,
    ) -> Result<Self, KmerBinError> {
        if reads.len() != lengths.len() || reads.len() != embedding.nrows() {
            return Err(KmerBinError::schema(format!(
                "{} reads, {} lengths and {} embedding rows",
                reads.len(),
                lengths.len(),
                embedding.nrows()
            )));
        }
        Ok(Self {
            reads,
            lengths,
            embedding,
        })
    }

    /// Joins the identifying columns of `table` with `embedding`.
    pub fn from_frequencies(
        table: &FrequencyTable,
        embedding: Array2<f64>,
    ) -> Result<Self, KmerBinError> {
        Self::new(table.reads.clone(), table.lengths.clone(), embedding)
    }

    pub fn n_reads(&self) -> usize {
        self.reads.len()
    }

    pub fn n_components(&self) -> usize {
        self.embedding.ncols()
    }

    pub fn reads(&self) -> &[String] {
        &self.reads
    }

    pub fn lengths(&self) -> &[u64] {
        &self.lengths
    }

    /// The raw reads × `n_components` embedding.
    pub fn embedding(&self) -> &Array2<f64> {
        &self.embedding
    }

    /// `read`, `length`, then `D1..Dn`.
    pub fn column_names(&self) -> Vec<String> {
        let mut names = vec![READ_COLUMN.to_string(), LENGTH_COLUMN.to_string()];
        names.extend(dimension_names(self.n_components()));
        names
    }
}

/// Names of the embedding columns: `D1` through `D<n>`.
pub fn dimension_names(n: usize) -> impl Iterator<Item = String> {
    (1..=n).map(|d| format!("D{d}"))
}

/// Embedded reads with their cluster labels.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusteredTable {
    embedded: EmbeddedTable,
    bin_ids: Vec<i32>,
}

impl ClusteredTable {
    pub fn new(embedded: EmbeddedTable, bin_ids: Vec<i32>) -> Result<Self, KmerBinError> {
        if bin_ids.len() != embedded.n_reads() {
            return Err(KmerBinError::schema(format!(
                "{} labels for {} reads",
                bin_ids.len(),
                embedded.n_reads()
            )));
        }
        if let Some(bad) = bin_ids.iter().find(|&&id| id < NOISE) {
            return Err(KmerBinError::schema(format!("invalid bin_id {bad}")));
        }
        Ok(Self { embedded, bin_ids })
    }

    pub fn n_reads(&self) -> usize {
        self.embedded.n_reads()
    }

    pub fn n_components(&self) -> usize {
        self.embedded.n_components()
    }

    pub fn reads(&self) -> &[String] {
        self.embedded.reads()
    }

    pub fn lengths(&self) -> &[u64] {
        self.embedded.lengths()
    }

    pub fn embedding(&self) -> &Array2<f64> {
        self.embedded.embedding()
    }

    pub fn bin_ids(&self) -> &[i32] {
        &self.bin_ids
    }

    /// `read`, `length`, `D1..Dn`, then `bin_id`.
    pub fn column_names(&self) -> Vec<String> {
        let mut names = self.embedded.column_names();
        names.push(BIN_COLUMN.to_string());
        names
    }

    /// Row index of the first read carrying each label, in ascending label
    /// order. Noise is included when present.
    pub fn first_row_by_label(&self) -> BTreeMap<i32, usize> {
        let mut first = BTreeMap::new();
        for (row, &id) in self.bin_ids.iter().enumerate() {
            first.entry(id).or_insert(row);
        }
        first
    }

    /// Number of distinct labels, noise included.
    pub fn n_labels(&self) -> usize {
        self.first_row_by_label().len()
    }

    /// Number of distinct clusters, noise excluded.
    pub fn n_clusters(&self) -> usize {
        self.first_row_by_label()
            .keys()
            .filter(|&&id| id != NOISE)
            .count()
    }

    /// Number of reads labeled as noise.
    pub fn n_noise(&self) -> usize {
        self.bin_ids.iter().filter(|&&id| id == NOISE).count()
    }
}

/// Reads a frequency table from a file or stdin.
///
/// The delimiter follows the file extension (see [`TableFormat`]); stdin is
/// read as tab-separated.
pub fn read_frequency_table(input: &Input) -> Result<FrequencyTable, KmerBinError> {
    let format = input
        .as_path()
        .map_or(TableFormat::Tsv, TableFormat::from_extension);

    #[cfg(feature = "tracing")]
    info!(input = %input, format = %format, "Reading frequency table");

    let table = parse_table(input.open()?, format, &input.display_path())?;

    #[cfg(feature = "tracing")]
    info!(
        reads = table.n_reads(),
        motifs = table.motifs().len(),
        "Frequency table loaded"
    );

    Ok(table)
}

/// Parses a frequency table from any reader.
pub fn parse_frequency_table<R: Read>(
    reader: R,
    format: TableFormat,
) -> Result<FrequencyTable, KmerBinError> {
    parse_table(reader, format, Path::new("<reader>"))
}

fn parse_table<R: Read>(
    reader: R,
    format: TableFormat,
    source: &Path,
) -> Result<FrequencyTable, KmerBinError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(format.delimiter())
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| read_error(e, source))?
        .clone();

    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| KmerBinError::schema(format!("missing required column '{name}'")))
    };
    let read_col = column(READ_COLUMN)?;
    let length_col = column(LENGTH_COLUMN)?;

    let motif_cols: Vec<usize> = (0..headers.len())
        .filter(|&i| i != read_col && i != length_col)
        .collect();
    let motifs: Vec<String> = motif_cols.iter().map(|&i| headers[i].to_string()).collect();
    if motifs.is_empty() {
        return Err(KmerBinError::schema("no k-mer motif columns"));
    }

    let mut reads = Vec::new();
    let mut lengths = Vec::new();
    let mut flat = Vec::new();

    for (row, record) in reader.records().enumerate() {
        let record = record.map_err(|e| read_error(e, source))?;
        let data_row = row + 1;

        reads.push(record[read_col].to_string());

        let length = &record[length_col];
        lengths.push(length.parse::<u64>().map_err(|_| {
            KmerBinError::schema(format!(
                "row {data_row}: length '{length}' is not a non-negative integer"
            ))
        })?);

        for (&col, motif) in motif_cols.iter().zip(&motifs) {
            let field = &record[col];
            match field.parse::<f64>() {
                Ok(value) if value.is_finite() && value >= 0.0 => flat.push(value),
                _ => {
                    return Err(KmerBinError::schema(format!(
                        "row {data_row}: column '{motif}': '{field}' is not a non-negative number"
                    )))
                }
            }
        }
    }

    #[cfg(feature = "tracing")]
    debug!(rows = reads.len(), "Parsed frequency rows");

    let frequencies = Array2::from_shape_vec((reads.len(), motifs.len()), flat)
        .map_err(|e| KmerBinError::schema(e.to_string()))?;

    FrequencyTable::new(reads, lengths, motifs, frequencies)
}

fn read_error(err: csv::Error, source: &Path) -> KmerBinError {
    let details = err.to_string();
    match err.into_kind() {
        csv::ErrorKind::Io(source_err) => KmerBinError::InputRead {
            source: source_err,
            path: source.to_path_buf(),
        },
        _ => KmerBinError::schema(details),
    }
}

/// Writes the clustered table as tab-separated values with a header row.
pub fn write_clustered_table(table: &ClusteredTable, path: &Path) -> Result<(), KmerBinError> {
    let to_error = |source: io::Error| KmerBinError::OutputWrite {
        source,
        path: PathBuf::from(path),
    };

    let file = File::create(path).map_err(to_error)?;
    let mut writer = BufWriter::new(file);
    write_clustered(table, &mut writer).map_err(to_error)?;
    writer.flush().map_err(to_error)?;

    #[cfg(feature = "tracing")]
    info!(path = %path.display(), rows = table.n_reads(), "Clustered table written");

    Ok(())
}

/// Serializes the clustered table to any writer.
pub fn write_clustered<W: Write>(table: &ClusteredTable, writer: W) -> io::Result<()> {
    let mut out = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_writer(writer);

    out.write_record(table.column_names())?;

    let embedding = table.embedding();
    for row in 0..table.n_reads() {
        let mut record = Vec::with_capacity(table.n_components() + 3);
        record.push(table.reads()[row].clone());
        record.push(table.lengths()[row].to_string());
        record.extend(embedding.row(row).iter().map(|x| format!("{x:?}")));
        record.push(table.bin_ids()[row].to_string());
        out.write_record(&record)?;
    }

    out.flush()
}
