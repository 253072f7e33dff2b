//! Property-based tests using proptest.
//!
//! These tests verify invariants that should hold across all valid inputs,
//! catching edge cases that might be missed by example-based tests.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use kmerbin::{
    cluster::cluster,
    config::{ClusterParams, EmbedParams},
    embed::embed,
    format::TableFormat,
    metric::Metric,
    table::{parse_frequency_table, write_clustered, FrequencyTable, NOISE},
};
use ndarray::{Array1, Array2};
use proptest::prelude::*;

/// Strategy for frequency tables with 6..=24 reads and 2..=5 motifs.
fn frequency_table() -> impl Strategy<Value = FrequencyTable> {
    (6usize..=24, 2usize..=5).prop_flat_map(|(n, motifs)| {
        proptest::collection::vec(0.0f64..1.0, n * motifs).prop_map(move |values| {
            FrequencyTable::new(
                (0..n).map(|i| format!("read{i}")).collect(),
                vec![100; n],
                (0..motifs).map(|m| format!("M{m}")).collect(),
                Array2::from_shape_vec((n, motifs), values).unwrap(),
            )
            .unwrap()
        })
    })
}

fn metric() -> impl Strategy<Value = Metric> {
    proptest::sample::select(Metric::ALL.to_vec())
}

fn vector(len: usize) -> impl Strategy<Value = Array1<f64>> {
    proptest::collection::vec(0.0f64..10.0, len).prop_map(Array1::from)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// Every read gets exactly one embedding row and one label >= -1.
    #[test]
    fn pipeline_preserves_row_count(
        table in frequency_table(),
        n_components in 1usize..=3,
        metric in metric(),
    ) {
        let n = table.n_reads();
        let embedded = embed(&table, &EmbedParams {
            n_neighbors: 5,
            n_components,
            metric: metric.name().to_string(),
            ..EmbedParams::default()
        }).unwrap();
        prop_assert_eq!(embedded.embedding().dim(), (n, n_components));
        prop_assert!(embedded.embedding().iter().all(|x| x.is_finite()));

        let clustered = cluster(embedded, &ClusterParams {
            min_cluster_size: 3,
            min_samples: 3,
            epsilon: 0.0,
            n_components,
        }).unwrap();
        prop_assert_eq!(clustered.bin_ids().len(), n);
        prop_assert!(clustered.bin_ids().iter().all(|&id| id >= NOISE));

        let mut buf = Vec::new();
        write_clustered(&clustered, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        prop_assert_eq!(text.lines().count(), n + 1);
    }

    /// Distances are symmetric and non-negative.
    #[test]
    fn metric_is_symmetric(metric in metric(), x in vector(6), y in vector(6)) {
        let xy = metric.distance(x.view(), y.view());
        let yx = metric.distance(y.view(), x.view());
        prop_assert!(xy >= 0.0);
        prop_assert!((xy - yx).abs() <= 1e-9 * xy.abs().max(1.0));
    }

    /// Parsing accepts any non-negative numbers and keeps row order.
    #[test]
    fn parse_keeps_rows(values in proptest::collection::vec(0.0f64..1e6, 1..20)) {
        let mut text = String::from("read\tlength\tAA\n");
        for (i, v) in values.iter().enumerate() {
            text.push_str(&format!("r{i}\t{i}\t{v}\n"));
        }
        let table = parse_frequency_table(text.as_bytes(), TableFormat::Tsv).unwrap();
        prop_assert_eq!(table.n_reads(), values.len());
        for (i, v) in values.iter().enumerate() {
            prop_assert_eq!(table.frequencies()[[i, 0]], *v);
            prop_assert_eq!(&table.reads()[i], &format!("r{i}"));
        }
    }
}
