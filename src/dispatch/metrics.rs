use once_cell::sync::Lazy;
use prometheus::{
    register_histogram, register_int_counter_vec, Encoder, Histogram, IntCounterVec, TextEncoder,
};

use crate::core::{DispatchError, DispatchResult, ErrorContext};

const DEFAULT_BUCKETS: &[f64] = &[
    0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 20.0, 50.0, 100.0, 200.0, 500.0, 1000.0,
];

// Dispatches by outcome ("ok" or the error kind)
static DISPATCHES: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "pagegate_dispatch_total",
        "The total number of page dispatches by outcome",
        &["outcome"]
    )
    .expect("dispatch counter registers once")
});

// Page name rewrites before handler resolution
static REDIRECTS: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "pagegate_redirect_total",
        "Page name rewrites by reason (hook, unallowed, login)",
        &["reason"]
    )
    .expect("redirect counter registers once")
});

// Dispatch latency
static LATENCY: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "pagegate_dispatch_latency",
        "Page dispatch latency in milliseconds",
        DEFAULT_BUCKETS.to_vec()
    )
    .expect("latency histogram registers once")
});

pub(crate) fn record_redirect(reason: &str) {
    REDIRECTS.with_label_values(&[reason]).inc();
}

pub(crate) fn record_dispatch(result: Result<(), &DispatchError>, elapsed_ms: f64) {
    let outcome = match result {
        Ok(()) => "ok",
        Err(e) => e.kind(),
    };
    DISPATCHES.with_label_values(&[outcome]).inc();
    LATENCY.observe(elapsed_ms);
}

/// Number of dispatches recorded with `outcome`
pub fn dispatch_count(outcome: &str) -> u64 {
    DISPATCHES.with_label_values(&[outcome]).get()
}

/// Number of redirects recorded with `reason`
pub fn redirect_count(reason: &str) -> u64 {
    REDIRECTS.with_label_values(&[reason]).get()
}

/// Render the default registry in the Prometheus text format
pub fn gather_text() -> DispatchResult<String> {
    // Touch the collectors so they show up before the first dispatch.
    Lazy::force(&DISPATCHES);
    Lazy::force(&REDIRECTS);
    Lazy::force(&LATENCY);

    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder
        .encode(&prometheus::gather(), &mut buffer)
        .with_context("Failed to encode metrics")?;
    String::from_utf8(buffer).with_context("Metrics are not valid UTF-8")
}
