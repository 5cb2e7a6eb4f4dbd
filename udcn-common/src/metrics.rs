//! Metrics for the forwarding engine.
//!
//! The engine is single-threaded (spec: no locking, one reactor task), so
//! unlike a metrics layer built for a multi-threaded server there is no
//! need to clone a snapshot across threads or support concurrent writers
//! beyond the atomics needed for a `&self` API. `Metric` is one atomic
//! counter-or-gauge type rather than two — nothing here enforces
//! monotonicity at the type level, so a separate `Gauge` type would only
//! have bought a naming convention.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/* ---------------------------------------------------------------- *
 * Metric: a counter or a gauge, same representation either way
 * ---------------------------------------------------------------- */

#[derive(Debug, Default)]
pub struct Metric(AtomicU64);

impl Metric {
    pub fn increment(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add(&self, value: u64) {
        self.0.fetch_add(value, Ordering::Relaxed);
    }

    pub fn set(&self, value: u64) {
        self.0.store(value, Ordering::Relaxed);
    }

    pub fn value(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/* ---------------------------------------------------------------- *
 * Histogram: fixed buckets, used for processing-time distributions
 * ---------------------------------------------------------------- */

#[derive(Debug)]
pub struct Histogram {
    buckets: Vec<AtomicU64>,
    boundaries: Vec<u64>,
    overflow: AtomicU64,
    sum: AtomicU64,
    count: AtomicU64,
}

impl Histogram {
    pub fn new(boundaries: Vec<u64>) -> Self {
        let buckets = (0..boundaries.len()).map(|_| AtomicU64::new(0)).collect();
        Self {
            buckets,
            boundaries,
            overflow: AtomicU64::new(0),
            sum: AtomicU64::new(0),
            count: AtomicU64::new(0),
        }
    }

    pub fn observe(&self, value: u64) {
        self.sum.fetch_add(value, Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Relaxed);

        match self.boundaries.iter().position(|&b| value <= b) {
            Some(idx) => {
                self.buckets[idx].fetch_add(1, Ordering::Relaxed);
            }
            None => {
                self.overflow.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    pub fn average_micros(&self) -> f64 {
        let c = self.count.load(Ordering::Relaxed);
        if c == 0 {
            0.0
        } else {
            self.sum.load(Ordering::Relaxed) as f64 / c as f64
        }
    }
}

/* ---------------------------------------------------------------- *
 * Timer: wraps a Histogram with start/stop around a pipeline call
 * ---------------------------------------------------------------- */

#[derive(Debug)]
pub struct Timer {
    start: std::cell::Cell<Option<Instant>>,
    histogram: Histogram,
}

impl Timer {
    /// Buckets in microseconds: a forwarding pipeline call is expected to
    /// complete in well under a millisecond absent a derivation; the top
    /// bucket catches a cache miss that falls through to FIB lookup.
    pub fn new() -> Self {
        Self {
            start: std::cell::Cell::new(None),
            histogram: Histogram::new(vec![10, 50, 100, 500, 1_000, 10_000]),
        }
    }

    pub fn start(&self) {
        self.start.set(Some(Instant::now()));
    }

    pub fn stop(&self) {
        if let Some(started) = self.start.take() {
            self.histogram.observe(started.elapsed().as_micros() as u64);
        }
    }

    pub fn histogram(&self) -> &Histogram {
        &self.histogram
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

/* ---------------------------------------------------------------- *
 * Aggregate metrics for the forwarding engine
 * ---------------------------------------------------------------- */

#[derive(Debug, Default)]
pub struct ForwarderMetrics {
    pub in_interests: Metric,
    pub out_interests: Metric,
    pub in_datas: Metric,
    pub out_datas: Metric,
    pub interest_loops: Metric,
    pub unsolicited_datas: Metric,

    pub cs_hits: Metric,
    pub cs_misses: Metric,
    pub cs_inserts: Metric,
    pub cs_evictions: Metric,
    pub cs_size: Metric,

    pub op_hits: Metric,
    pub op_misses: Metric,
    pub op_inserts: Metric,
    pub op_evictions: Metric,
    pub op_size: Metric,

    pub derivations_attempted: Metric,
    pub derivations_succeeded: Metric,
    pub derivations_failed: Metric,

    pub pit_inserts: Metric,
    pub pit_aggregations: Metric,
    pub pit_expirations: Metric,
    pub pit_size: Metric,

    pub fib_hits: Metric,
    pub fib_misses: Metric,
    pub fib_size: Metric,

    pub dnl_size: Metric,

    pub interest_processing_time: Timer,
    pub data_processing_time: Timer,
}

impl ForwarderMetrics {
    pub fn new() -> Self {
        Self::default()
    }
}
