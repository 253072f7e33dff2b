//! Fuzz target for `parse_frequency_table`.
//!
//! Tests that arbitrary bytes are either parsed into a consistent table or
//! rejected with an error, never a panic.

#![no_main]

use kmerbin::format::TableFormat;
use kmerbin::table::parse_frequency_table;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    for format in [TableFormat::Tsv, TableFormat::Csv] {
        if let Ok(table) = parse_frequency_table(data, format) {
            let (rows, cols) = table.frequencies().dim();
            assert_eq!(rows, table.n_reads());
            assert_eq!(rows, table.lengths().len());
            assert_eq!(cols, table.motifs().len());
            assert!(cols > 0, "accepted a table without motif columns");

            // Accepted frequencies must be usable by every distance metric
            assert!(
                table.frequencies().iter().all(|v| v.is_finite() && *v >= 0.0),
                "accepted a negative or non-finite frequency"
            );
        }
    }
});
