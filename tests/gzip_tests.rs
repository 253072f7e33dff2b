//! Tests for gzip compressed input support.

#![cfg(feature = "gzip")]
#![allow(clippy::unwrap_used, clippy::expect_used)]

use flate2::{write::GzEncoder, Compression};
use kmerbin::{input::Input, table::read_frequency_table};
use std::{fs, io::Write, path::PathBuf};

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn gzip_fixture(dir: &std::path::Path, name: &str, gz_name: &str) -> PathBuf {
    let path = dir.join(gz_name);
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&fs::read(fixture_path(name)).unwrap()).unwrap();
    fs::write(&path, encoder.finish().unwrap()).unwrap();
    path
}

#[test]
fn gzip_and_plain_produce_same_table() {
    let dir = tempfile::tempdir().unwrap();
    let gz = gzip_fixture(dir.path(), "small.tsv", "small.tsv.gz");

    let plain = read_frequency_table(&Input::File(fixture_path("small.tsv"))).unwrap();
    let compressed = read_frequency_table(&Input::File(gz)).unwrap();
    assert_eq!(plain, compressed);
}

#[test]
fn gzip_csv_is_comma_separated() {
    let dir = tempfile::tempdir().unwrap();
    let csv_path = dir.path().join("small.csv");
    let text = fs::read_to_string(fixture_path("small.tsv"))
        .unwrap()
        .replace('\t', ",");
    fs::write(&csv_path, text).unwrap();

    let gz = dir.path().join("small.csv.gz");
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&fs::read(&csv_path).unwrap()).unwrap();
    fs::write(&gz, encoder.finish().unwrap()).unwrap();

    let table = read_frequency_table(&Input::File(gz)).unwrap();
    assert_eq!(table.n_reads(), 12);
    assert_eq!(table.motifs(), ["AA", "AC", "CA", "CC"]);
}
