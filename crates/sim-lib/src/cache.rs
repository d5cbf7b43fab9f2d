//! Memoized datasets keyed by a content hash of roster and schedule

use crate::models::{FailureEvent, ServerDescriptor};
use crate::observability::SimMetrics;
use crate::simulation::{Dataset, SimulationBuilder};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct KeyMaterial<'a> {
    roster: &'a [ServerDescriptor],
    schedule: &'a [FailureEvent],
    horizon_points: usize,
    interval_minutes: u32,
    start_time: DateTime<Utc>,
    seed: u64,
}

/// SHA-256 hex digest identifying a synthesis input
pub fn dataset_key(
    roster: &[ServerDescriptor],
    schedule: &[FailureEvent],
    horizon_points: usize,
    interval_minutes: u32,
    start_time: DateTime<Utc>,
    seed: u64,
) -> Result<String> {
    let material = KeyMaterial {
        roster,
        schedule,
        horizon_points,
        interval_minutes,
        start_time,
        seed,
    };
    let mut hasher = Sha256::new();
    serde_json::to_writer(&mut hasher, &material).context("Failed to serialize cache key")?;
    Ok(hex::encode(hasher.finalize()))
}

/// Hit/miss counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}

/// Concurrent dataset cache
#[derive(Debug, Default)]
pub struct DatasetCache {
    entries: DashMap<String, Arc<Dataset>>,
    hits: AtomicU64,
    misses: AtomicU64,
    metrics: Option<SimMetrics>,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_metrics(metrics: SimMetrics) -> Self {
        Self {
            metrics: Some(metrics),
            ..Self::default()
        }
    }

    pub fn key_for(dataset: &Dataset) -> Result<String> {
        dataset_key(
            &dataset.roster,
            &dataset.schedule,
            dataset.horizon_points,
            dataset.interval_minutes,
            dataset.start_time,
            dataset.seed,
        )
    }

    /// Plan the run, then synthesize only when the plan has not been seen
    pub fn get_or_generate(&self, builder: SimulationBuilder) -> Result<Arc<Dataset>> {
        let mut simulation = builder.build()?;
        let plan = simulation.plan()?;
        let key = dataset_key(
            &plan.roster,
            &plan.schedule,
            simulation.config().horizon_points,
            simulation.config().interval_minutes,
            simulation.start_time(),
            simulation.seed(),
        )?;

        if let Some(hit) = self.get(&key) {
            return Ok(hit);
        }
        self.record_miss();

        let dataset = Arc::new(simulation.synthesize(plan)?);
        debug!(key = %key, records = dataset.records.len(), "Cached generated dataset");
        Ok(self.entries.entry(key).or_insert(dataset).value().clone())
    }

    /// Store a dataset, returning its key
    pub fn insert(&self, dataset: Dataset) -> Result<String> {
        let key = Self::key_for(&dataset)?;
        self.entries.insert(key.clone(), Arc::new(dataset));
        Ok(key)
    }

    pub fn get(&self, key: &str) -> Option<Arc<Dataset>> {
        let hit = self.entries.get(key).map(|entry| entry.value().clone());
        if hit.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            if let Some(metrics) = &self.metrics {
                metrics.inc_cache_hit();
            }
        }
        hit
    }

    fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
        if let Some(metrics) = &self.metrics {
            metrics.inc_cache_miss();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove one entry; returns whether it existed
    pub fn invalidate(&self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}
