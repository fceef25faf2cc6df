use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;

use crate::protocol::ErrorKind;

/// Upper bounds for the batch size histogram, in rows.
pub const BATCH_SIZE_BUCKETS: [f64; 9] = [1.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 1000.0];

/// Upper bounds for the batch latency histogram, in seconds.
pub const BATCH_LATENCY_BUCKETS: [f64; 9] = [0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0];

/// A monotonically increasing counter.
#[derive(Debug, Default)]
pub struct Counter(AtomicU64);

impl Counter {
    /// Increments by 1.
    pub fn inc(&self) {
        self.add(1);
    }

    /// Increments by `v`.
    pub fn add(&self, v: u64) {
        self.0.fetch_add(v, Ordering::Relaxed);
    }

    /// Current value.
    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// Observations sorted into cumulative buckets.
#[derive(Debug)]
pub struct Histogram {
    bounds: &'static [f64],
    counts: Vec<AtomicU64>,
    sum: Mutex<f64>,
    count: AtomicU64,
}

impl Histogram {
    /// Creates a histogram with the given bucket upper bounds.
    pub fn new(bounds: &'static [f64]) -> Self {
        Self {
            bounds,
            counts: bounds.iter().map(|_| AtomicU64::new(0)).collect(),
            sum: Mutex::new(0.0),
            count: AtomicU64::new(0),
        }
    }

    /// Records one observation.
    pub fn observe(&self, v: f64) {
        self.count.fetch_add(1, Ordering::Relaxed);
        *self.sum.lock() += v;
        for (bound, count) in self.bounds.iter().zip(&self.counts) {
            if v <= *bound {
                count.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Point-in-time copy.
    pub fn snapshot(&self) -> HistogramSnapshot {
        HistogramSnapshot {
            buckets: self
                .bounds
                .iter()
                .zip(&self.counts)
                .map(|(bound, count)| (*bound, count.load(Ordering::Relaxed)))
                .collect(),
            sum: *self.sum.lock(),
            count: self.count.load(Ordering::Relaxed),
        }
    }
}

/// Copy of a [`Histogram`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramSnapshot {
    /// `(upper bound, cumulative count)` pairs.
    pub buckets: Vec<(f64, u64)>,
    /// Sum of all observations.
    pub sum: f64,
    /// Number of observations.
    pub count: u64,
}

/// Ingestion counters shared by every connection.
#[derive(Debug)]
pub struct IngestMetrics {
    /// Batches received, whatever their outcome.
    pub batches_total: Counter,
    /// Batches fully admitted.
    pub batches_accepted: Counter,
    /// Batches refused because they did not decode.
    pub rejected_codec: Counter,
    /// Batches refused because a row failed validation.
    pub rejected_validation: Counter,
    /// Batches refused because the mempool lacked room.
    pub rejected_capacity: Counter,
    /// Frames refused for their size.
    pub rejected_framing: Counter,
    /// Failed handshakes.
    pub rejected_auth: Counter,
    /// Rows in decoded batches.
    pub transactions_total: Counter,
    /// Rows admitted to the mempool.
    pub transactions_processed: Counter,
    /// Rows in decoded batches that were refused.
    pub transactions_failed: Counter,
    /// Rows per decoded batch.
    pub batch_size: Histogram,
    /// Seconds spent decoding, validating and admitting a batch.
    pub batch_latency: Histogram,
}

impl Default for IngestMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl IngestMetrics {
    /// Creates zeroed metrics.
    pub fn new() -> Self {
        Self {
            batches_total: Counter::default(),
            batches_accepted: Counter::default(),
            rejected_codec: Counter::default(),
            rejected_validation: Counter::default(),
            rejected_capacity: Counter::default(),
            rejected_framing: Counter::default(),
            rejected_auth: Counter::default(),
            transactions_total: Counter::default(),
            transactions_processed: Counter::default(),
            transactions_failed: Counter::default(),
            batch_size: Histogram::new(&BATCH_SIZE_BUCKETS),
            batch_latency: Histogram::new(&BATCH_LATENCY_BUCKETS),
        }
    }

    /// Counts one refusal of `kind`.
    pub fn record_rejection(&self, kind: ErrorKind) {
        match kind {
            ErrorKind::Codec => &self.rejected_codec,
            ErrorKind::Validation => &self.rejected_validation,
            ErrorKind::Capacity => &self.rejected_capacity,
            ErrorKind::Framing => &self.rejected_framing,
            ErrorKind::Auth => &self.rejected_auth,
        }
        .inc();
    }

    /// Records the time one batch took to handle.
    pub fn record_latency(&self, elapsed: Duration) {
        self.batch_latency.observe(elapsed.as_secs_f64());
    }

    /// Point-in-time copy; `mempool_size` is sampled by the caller.
    pub fn snapshot(&self, mempool_size: usize) -> MetricsSnapshot {
        MetricsSnapshot {
            batches_total: self.batches_total.get(),
            batches_accepted: self.batches_accepted.get(),
            rejected_codec: self.rejected_codec.get(),
            rejected_validation: self.rejected_validation.get(),
            rejected_capacity: self.rejected_capacity.get(),
            rejected_framing: self.rejected_framing.get(),
            rejected_auth: self.rejected_auth.get(),
            transactions_total: self.transactions_total.get(),
            transactions_processed: self.transactions_processed.get(),
            transactions_failed: self.transactions_failed.get(),
            batch_size: self.batch_size.snapshot(),
            batch_latency: self.batch_latency.snapshot(),
            mempool_size: mempool_size as u64,
        }
    }
}

/// Copy of [`IngestMetrics`] plus the mempool size at the time it was taken.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    /// See [`IngestMetrics::batches_total`].
    pub batches_total: u64,
    /// See [`IngestMetrics::batches_accepted`].
    pub batches_accepted: u64,
    /// See [`IngestMetrics::rejected_codec`].
    pub rejected_codec: u64,
    /// See [`IngestMetrics::rejected_validation`].
    pub rejected_validation: u64,
    /// See [`IngestMetrics::rejected_capacity`].
    pub rejected_capacity: u64,
    /// See [`IngestMetrics::rejected_framing`].
    pub rejected_framing: u64,
    /// See [`IngestMetrics::rejected_auth`].
    pub rejected_auth: u64,
    /// See [`IngestMetrics::transactions_total`].
    pub transactions_total: u64,
    /// See [`IngestMetrics::transactions_processed`].
    pub transactions_processed: u64,
    /// See [`IngestMetrics::transactions_failed`].
    pub transactions_failed: u64,
    /// See [`IngestMetrics::batch_size`].
    pub batch_size: HistogramSnapshot,
    /// See [`IngestMetrics::batch_latency`].
    pub batch_latency: HistogramSnapshot,
    /// Entries held by the mempool.
    pub mempool_size: u64,
}

impl MetricsSnapshot {
    /// Encodes the snapshot in the Prometheus text exposition format.
    pub fn to_prometheus(&self) -> String {
        let mut out = String::with_capacity(2048);

        write_counter(&mut out, "tessera_batches_total", "Batches received", self.batches_total);
        write_counter(
            &mut out,
            "tessera_batches_accepted_total",
            "Batches fully admitted",
            self.batches_accepted,
        );
        out.push_str("# HELP tessera_batches_rejected_total Batches refused, by reason\n");
        out.push_str("# TYPE tessera_batches_rejected_total counter\n");
        for (kind, value) in [
            ("codec", self.rejected_codec),
            ("validation", self.rejected_validation),
            ("capacity", self.rejected_capacity),
            ("framing", self.rejected_framing),
            ("auth", self.rejected_auth),
        ] {
            out.push_str(&format!(
                "tessera_batches_rejected_total{{kind=\"{}\"}} {}\n",
                kind, value
            ));
        }
        out.push('\n');

        write_counter(
            &mut out,
            "tessera_transactions_total",
            "Rows in decoded batches",
            self.transactions_total,
        );
        write_counter(
            &mut out,
            "tessera_transactions_processed_total",
            "Rows admitted to the mempool",
            self.transactions_processed,
        );
        write_counter(
            &mut out,
            "tessera_transactions_failed_total",
            "Rows in refused batches",
            self.transactions_failed,
        );
        write_histogram(&mut out, "tessera_batch_size", "Rows per batch", &self.batch_size);
        write_histogram(
            &mut out,
            "tessera_batch_latency_seconds",
            "Batch handling latency in seconds",
            &self.batch_latency,
        );

        out.push_str("# HELP tessera_mempool_size Entries held by the mempool\n");
        out.push_str("# TYPE tessera_mempool_size gauge\n");
        out.push_str(&format!("tessera_mempool_size {}\n", self.mempool_size));
        out
    }
}

fn write_counter(out: &mut String, name: &str, help: &str, value: u64) {
    out.push_str(&format!("# HELP {} {}\n", name, help));
    out.push_str(&format!("# TYPE {} counter\n", name));
    out.push_str(&format!("{} {}\n\n", name, value));
}

fn write_histogram(out: &mut String, name: &str, help: &str, hist: &HistogramSnapshot) {
    out.push_str(&format!("# HELP {} {}\n", name, help));
    out.push_str(&format!("# TYPE {} histogram\n", name));
    for (bound, count) in &hist.buckets {
        out.push_str(&format!("{}_bucket{{le=\"{}\"}} {}\n", name, bound, count));
    }
    out.push_str(&format!("{}_bucket{{le=\"+Inf\"}} {}\n", name, hist.count));
    out.push_str(&format!("{}_sum {}\n", name, hist.sum));
    out.push_str(&format!("{}_count {}\n\n", name, hist.count));
}
