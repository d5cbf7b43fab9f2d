//! Newline-delimited JSON file sink

use super::MetricSink;
use crate::models::MetricRecord;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// Appends one JSON object per record to a file
#[derive(Debug)]
pub struct JsonLinesSink {
    path: PathBuf,
    file: Mutex<File>,
}

impl JsonLinesSink {
    /// Open `path` for appending, creating it if missing
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .with_context(|| format!("Failed to open {}", path.display()))?;

        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl MetricSink for JsonLinesSink {
    fn name(&self) -> &str {
        "jsonl"
    }

    async fn write_batch(&self, batch: &[MetricRecord]) -> Result<()> {
        let mut buf = Vec::with_capacity(batch.len() * 160);
        for record in batch {
            serde_json::to_writer(&mut buf, record)?;
            buf.push(b'\n');
        }
        self.file
            .lock()
            .await
            .write_all(&buf)
            .await
            .with_context(|| format!("Failed to append to {}", self.path.display()))
    }

    async fn flush(&self) -> Result<()> {
        let mut file = self.file.lock().await;
        file.flush().await?;
        file.sync_data().await?;
        Ok(())
    }
}

/// Replace `path` with one JSON line per item, returning the count written
pub async fn write_json_lines<T: Serialize>(path: impl AsRef<Path>, items: &[T]) -> Result<usize> {
    let path = path.as_ref();
    let mut buf = Vec::new();
    for item in items {
        serde_json::to_writer(&mut buf, item)?;
        buf.push(b'\n');
    }
    tokio::fs::write(path, buf)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(items.len())
}

/// Parse a JSON-lines file, skipping blank lines
pub async fn read_json_lines<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<Vec<T>> {
    let path = path.as_ref();
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;

    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str(line)
                .with_context(|| format!("{}:{}: invalid record", path.display(), i + 1))
        })
        .collect()
}
