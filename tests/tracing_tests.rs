//! Tests for tracing instrumentation.
//!
//! These tests verify that tracing spans and events are emitted correctly
//! when the tracing feature is enabled.

#![cfg(feature = "tracing")]
#![allow(clippy::unwrap_used, clippy::expect_used)]

use kmerbin::{config::Config, input::Input, run::run, table::read_frequency_table};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// A simple layer that counts events at INFO level or above.
struct EventCounter {
    count: Arc<AtomicUsize>,
}

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for EventCounter {
    fn on_event(
        &self,
        event: &tracing::Event<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        if event.metadata().level() <= &Level::INFO {
            self.count.fetch_add(1, Ordering::SeqCst);
        }
    }
}

#[test]
fn reading_table_emits_tracing_events() {
    let event_count = Arc::new(AtomicUsize::new(0));
    let layer = EventCounter {
        count: Arc::clone(&event_count),
    };

    let subscriber = tracing_subscriber::registry().with(layer);

    tracing::subscriber::with_default(subscriber, || {
        let input = Input::File(fixture_path("small.tsv"));
        let _table = read_frequency_table(&input).expect("should read table");
    });

    assert!(
        event_count.load(Ordering::SeqCst) >= 2,
        "should emit start and finish events"
    );
}

#[test]
fn pipeline_emits_an_event_per_stage() {
    let event_count = Arc::new(AtomicUsize::new(0));
    let layer = EventCounter {
        count: Arc::clone(&event_count),
    };

    let subscriber = tracing_subscriber::registry().with(layer);
    let dir = tempfile::tempdir().unwrap();

    tracing::subscriber::with_default(subscriber, || {
        let mut config = Config::new(
            Input::File(fixture_path("small.tsv")),
            dir.path().join("bins.tsv"),
        );
        config.embed.n_neighbors = 5;
        config.cluster.min_cluster_size = 3;
        config.cluster.min_samples = 3;
        run(&config).expect("pipeline should succeed");
    });

    // read (2), embed (2), cluster (2), write (1), run summary (1)
    assert!(
        event_count.load(Ordering::SeqCst) >= 8,
        "expected at least one event per stage, got {}",
        event_count.load(Ordering::SeqCst)
    );
}
