//! Fuzz target for metric name parsing.

#![no_main]

use kmerbin::metric::Metric;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|name: &str| {
    match name.parse::<Metric>() {
        // Canonical names parse back to the same metric
        Ok(metric) => assert_eq!(metric.name().parse::<Metric>().ok(), Some(metric)),
        Err(err) => assert!(err.to_string().contains("unknown distance metric")),
    }
});
