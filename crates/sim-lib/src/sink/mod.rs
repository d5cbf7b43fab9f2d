//! Persistence sinks for generated records
//!
//! This module provides:
//! - `MetricSink`: async trait for batch storage backends
//! - `BatchWriter`: splits output into rate-limited batches
//! - `MemorySink` and `JsonLinesSink` implementations

mod json_lines;

pub use json_lines::{read_json_lines, write_json_lines, JsonLinesSink};

use crate::models::MetricRecord;
use crate::observability::StructuredLogger;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::debug;

/// Records per write
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Pause between consecutive batches
pub const DEFAULT_BATCH_PAUSE: Duration = Duration::from_millis(100);

/// Storage backend accepting batches of records
#[async_trait]
pub trait MetricSink: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    async fn write_batch(&self, batch: &[MetricRecord]) -> Result<()>;

    async fn flush(&self) -> Result<()> {
        Ok(())
    }
}

/// Totals written by [`BatchWriter::write_all`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SinkReport {
    pub batches: usize,
    pub records: usize,
}

/// Writes records to a sink in fixed-size batches
#[derive(Debug, Clone)]
pub struct BatchWriter {
    batch_size: usize,
    pause: Duration,
    logger: StructuredLogger,
}

impl Default for BatchWriter {
    fn default() -> Self {
        Self::new(DEFAULT_BATCH_SIZE, DEFAULT_BATCH_PAUSE)
    }
}

impl BatchWriter {
    /// A zero batch size is treated as one
    pub fn new(batch_size: usize, pause: Duration) -> Self {
        Self {
            batch_size: batch_size.max(1),
            pause,
            logger: StructuredLogger::new("sink"),
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub async fn write_all<S: MetricSink + ?Sized>(
        &self,
        sink: &S,
        records: &[MetricRecord],
    ) -> Result<SinkReport> {
        let mut report = SinkReport::default();

        for (i, batch) in records.chunks(self.batch_size).enumerate() {
            if i > 0 && !self.pause.is_zero() {
                tokio::time::sleep(self.pause).await;
            }
            sink.write_batch(batch)
                .await
                .with_context(|| format!("Failed to write batch {} to {}", i, sink.name()))?;
            report.batches += 1;
            report.records += batch.len();
            debug!(sink = sink.name(), batch = i, size = batch.len(), "Wrote batch");
        }

        sink.flush()
            .await
            .with_context(|| format!("Failed to flush {}", sink.name()))?;
        self.logger
            .log_sink_flush(sink.name(), report.batches, report.records);
        Ok(report)
    }
}

/// Keeps every batch in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    batches: Mutex<Vec<Vec<MetricRecord>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn records(&self) -> Vec<MetricRecord> {
        self.batches.lock().await.iter().flatten().cloned().collect()
    }

    pub async fn batch_sizes(&self) -> Vec<usize> {
        self.batches.lock().await.iter().map(Vec::len).collect()
    }
}

#[async_trait]
impl MetricSink for MemorySink {
    fn name(&self) -> &str {
        "memory"
    }

    async fn write_batch(&self, batch: &[MetricRecord]) -> Result<()> {
        self.batches.lock().await.push(batch.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::HealthStatus;
    use chrono::{Duration as ChronoDuration, TimeZone, Utc};

    pub(crate) fn records(n: usize) -> Vec<MetricRecord> {
        let start = Utc.with_ymd_and_hms(2026, 3, 2, 0, 0, 0).unwrap();
        (0..n)
            .map(|i| MetricRecord {
                timestamp: start + ChronoDuration::minutes(10 * i as i64),
                server_id: "api-01".to_string(),
                cpu: 20.0,
                memory: 40.0,
                disk: 30.0,
                response_time_ms: 120.0,
                status: HealthStatus::Healthy,
            })
            .collect()
    }

    struct FailingSink;

    #[async_trait]
    impl MetricSink for FailingSink {
        fn name(&self) -> &str {
            "failing"
        }

        async fn write_batch(&self, _batch: &[MetricRecord]) -> Result<()> {
            anyhow::bail!("downstream rejected batch")
        }
    }

    #[tokio::test]
    async fn test_batches_of_one_hundred() {
        let sink = MemorySink::new();
        let writer = BatchWriter::new(DEFAULT_BATCH_SIZE, Duration::ZERO);

        let report = writer.write_all(&sink, &records(250)).await.unwrap();

        assert_eq!(report, SinkReport { batches: 3, records: 250 });
        assert_eq!(sink.batch_sizes().await, vec![100, 100, 50]);
        assert_eq!(sink.records().await, records(250));
    }

    #[tokio::test]
    async fn test_pauses_between_batches() {
        let sink = MemorySink::new();
        let writer = BatchWriter::new(10, Duration::from_millis(20));

        let started = std::time::Instant::now();
        writer.write_all(&sink, &records(30)).await.unwrap();

        // Two pauses for three batches
        assert!(started.elapsed() >= Duration::from_millis(40));
    }

    #[tokio::test]
    async fn test_empty_input_writes_nothing() {
        let sink = MemorySink::new();
        let report = BatchWriter::default().write_all(&sink, &[]).await.unwrap();
        assert_eq!(report, SinkReport::default());
        assert!(sink.batch_sizes().await.is_empty());
    }

    #[tokio::test]
    async fn test_sink_errors_carry_context() {
        let err = BatchWriter::new(5, Duration::ZERO)
            .write_all(&FailingSink, &records(3))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("batch 0 to failing"));
    }

    #[test]
    fn test_zero_batch_size_is_clamped() {
        assert_eq!(BatchWriter::new(0, Duration::ZERO).batch_size(), 1);
    }
}
