use std::sync::Arc;
use std::time::Instant;

use tessera_codec::decode_batch;
use tessera_consensus::TransactionRecord;
use tessera_mempool::Mempool;

use crate::metrics::{IngestMetrics, MetricsSnapshot};
use crate::protocol::{Ack, ErrorKind, ErrorPayload, RowError};

/// Turns one request payload into an acknowledgment.
///
/// Decoding and validation run without touching the mempool; admission is a
/// single all-or-nothing call, so a rejected batch leaves no trace.
#[derive(Clone)]
pub struct BatchHandler {
    mempool: Arc<Mempool>,
    metrics: Arc<IngestMetrics>,
}

impl BatchHandler {
    /// Creates a handler admitting into `mempool`.
    pub fn new(mempool: Arc<Mempool>) -> Self {
        Self {
            mempool,
            metrics: Arc::new(IngestMetrics::new()),
        }
    }

    /// The mempool this handler admits into.
    pub fn mempool(&self) -> &Arc<Mempool> {
        &self.mempool
    }

    /// Counters shared by every clone of this handler.
    pub fn metrics(&self) -> &Arc<IngestMetrics> {
        &self.metrics
    }

    /// Current metrics with the mempool size sampled now.
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot(self.mempool.size())
    }

    /// Decodes, validates and admits one batch.
    pub fn handle(&self, payload: &[u8]) -> Ack {
        let started = Instant::now();
        self.metrics.batches_total.inc();
        let ack = self.process(payload);
        if let Ack::Rejected(reply) = &ack {
            self.metrics.record_rejection(reply.error);
        } else {
            self.metrics.batches_accepted.inc();
        }
        self.metrics.record_latency(started.elapsed());
        ack
    }

    fn process(&self, payload: &[u8]) -> Ack {
        let batch = match decode_batch(payload) {
            Ok(batch) => batch,
            Err(e) => {
                tracing::debug!(error = %e, bytes = payload.len(), "batch did not decode");
                return Ack::Rejected(ErrorPayload::new(ErrorKind::Codec, e.to_string()));
            }
        };

        let row_count = batch.rows.len();
        self.metrics.transactions_total.add(row_count as u64);
        self.metrics.batch_size.observe(row_count as f64);

        let mut records = Vec::with_capacity(row_count);
        let mut failures = Vec::new();
        for (row, fields) in batch.rows.into_iter().enumerate() {
            match TransactionRecord::from_row(fields) {
                Ok(record) => records.push(record),
                Err(e) => failures.push(RowError {
                    row,
                    field: e.field().map(str::to_string),
                    reason: e.to_string(),
                }),
            }
        }

        if !failures.is_empty() {
            tracing::debug!(
                rows = row_count,
                invalid = failures.len(),
                "batch failed validation"
            );
            self.metrics.transactions_failed.add(row_count as u64);
            return Ack::Rejected(ErrorPayload {
                error: ErrorKind::Validation,
                message: format!("{} of {} rows invalid", failures.len(), row_count),
                rows: failures,
            });
        }

        match self.mempool.admit_batch(records) {
            Ok(range) => {
                tracing::debug!(
                    rows = row_count,
                    first = range.start,
                    next = range.end,
                    "batch admitted"
                );
                self.metrics.transactions_processed.add(row_count as u64);
                Ack::Ok
            }
            Err(e) => {
                tracing::warn!(rows = row_count, error = %e, "batch not admitted");
                self.metrics.transactions_failed.add(row_count as u64);
                Ack::Rejected(ErrorPayload::new(ErrorKind::Capacity, e.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use tessera_codec::{encode, Row};

    fn rows(values: Vec<Value>) -> Vec<Row> {
        values
            .into_iter()
            .map(|v| v.as_object().cloned().unwrap())
            .collect()
    }

    fn handler(capacity: usize) -> BatchHandler {
        BatchHandler::new(Arc::new(Mempool::new(capacity).unwrap()))
    }

    #[test]
    fn valid_batch_is_admitted_in_order() {
        let handler = handler(10);
        let batch = rows(vec![
            json!({"entity_id": "e1", "event": "create", "timestamp": 1700000000}),
            json!({"entity_id": "e2", "event": "update", "timestamp": 1700000001}),
        ]);
        assert_eq!(handler.handle(&encode(&batch).unwrap()), Ack::Ok);

        let snapshot = handler.mempool().snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].record.entity_id(), Some("e1"));
        assert_eq!(snapshot[1].sequence, 2);
    }

    #[test]
    fn invalid_row_rejects_whole_batch() {
        let handler = handler(10);
        let batch = rows(vec![
            json!({"entity_id": "e1", "event": "create", "timestamp": 1}),
            json!({"entity_id": "e2", "event": "update"}),
        ]);
        match handler.handle(&encode(&batch).unwrap()) {
            Ack::Rejected(payload) => {
                assert_eq!(payload.error, ErrorKind::Validation);
                assert_eq!(payload.rows.len(), 1);
                assert_eq!(payload.rows[0].row, 1);
                assert_eq!(payload.rows[0].field.as_deref(), Some("timestamp"));
            }
            Ack::Ok => panic!("invalid batch admitted"),
        }
        assert_eq!(handler.mempool().size(), 0);
    }

    #[test]
    fn undecodable_payload_is_codec_error() {
        let handler = handler(10);
        for payload in [&b""[..], &b"garbage bytes"[..]] {
            match handler.handle(payload) {
                Ack::Rejected(p) => assert_eq!(p.error, ErrorKind::Codec),
                Ack::Ok => panic!("garbage admitted"),
            }
        }
    }

    #[test]
    fn full_mempool_is_capacity_error() {
        let handler = handler(1);
        let batch = rows(vec![
            json!({"entity_id": "e1", "event": "create", "timestamp": 1}),
            json!({"entity_id": "e2", "event": "create", "timestamp": 2}),
        ]);
        match handler.handle(&encode(&batch).unwrap()) {
            Ack::Rejected(p) => assert_eq!(p.error, ErrorKind::Capacity),
            Ack::Ok => panic!("over-capacity batch admitted"),
        }
        assert_eq!(handler.mempool().size(), 0);
    }

    #[test]
    fn empty_batch_is_acknowledged() {
        let handler = handler(1);
        assert_eq!(handler.handle(&encode(&[]).unwrap()), Ack::Ok);
        assert!(handler.mempool().is_empty());
    }

    #[test]
    fn empty_or_non_string_entity_id_is_reported_per_row() {
        let handler = handler(10);
        let batch = rows(vec![
            json!({"entity_id": "", "event": "create", "timestamp": 1}),
            json!({"entity_id": 42, "event": "create", "timestamp": 2}),
            json!({"entity_id": "e3", "event": "create", "timestamp": 3}),
        ]);
        match handler.handle(&encode(&batch).unwrap()) {
            Ack::Rejected(payload) => {
                assert_eq!(payload.error, ErrorKind::Validation);
                let reported: Vec<usize> = payload.rows.iter().map(|r| r.row).collect();
                assert_eq!(reported, vec![0, 1]);
                assert!(payload
                    .rows
                    .iter()
                    .all(|r| r.field.as_deref() == Some("entity_id")));
            }
            Ack::Ok => panic!("blank entity_id admitted"),
        }
        assert!(handler.mempool().is_empty());
    }

    #[test]
    fn outcomes_are_counted() {
        let handler = handler(2);
        let good = rows(vec![
            json!({"entity_id": "e1", "event": "create", "timestamp": 1}),
            json!({"entity_id": "e2", "event": "create", "timestamp": 2}),
        ]);
        let bad = rows(vec![json!({"entity_id": "e3", "event": "create"})]);

        assert_eq!(handler.handle(&encode(&good).unwrap()), Ack::Ok);
        assert!(matches!(handler.handle(&encode(&bad).unwrap()), Ack::Rejected(_)));
        assert!(matches!(handler.handle(&encode(&good).unwrap()), Ack::Rejected(_)));
        assert!(matches!(handler.handle(b"junk"), Ack::Rejected(_)));

        let snap = handler.clone().metrics_snapshot();
        assert_eq!(snap.batches_total, 4);
        assert_eq!(snap.batches_accepted, 1);
        assert_eq!(snap.rejected_validation, 1);
        assert_eq!(snap.rejected_capacity, 1);
        assert_eq!(snap.rejected_codec, 1);
        assert_eq!(snap.transactions_total, 5);
        assert_eq!(snap.transactions_processed, 2);
        assert_eq!(snap.transactions_failed, 3);
        assert_eq!(snap.batch_size.count, 3);
        assert_eq!(snap.batch_latency.count, 4);
        assert_eq!(snap.mempool_size, 2);
    }
}
