//! Priority-change audit log
//!
//! Appends one JSON object per applied priority change (JSONL), so label
//! history survives even though the task document only keeps the latest.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info};

use crate::tasks::Priority;

/// A single applied priority change
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PriorityChange {
    /// When the change was applied
    pub timestamp: DateTime<Utc>,
    /// Instance that applied it
    pub node_id: String,
    /// Task document ID (hex)
    pub task_id: String,
    pub title: String,
    /// Label before the change, if it was a recognised one
    pub previous: Option<Priority>,
    /// Label written
    pub assigned: Priority,
    /// Seconds until the deadline at classification time (negative if overdue)
    pub time_left_secs: i64,
}

impl PriorityChange {
    /// Convert to JSONL line
    pub fn to_jsonl(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Audit logger that writes priority changes to a JSONL file.
///
/// Without `init_file` it is a no-op.
#[derive(Clone)]
pub struct PriorityAuditLogger {
    inner: Arc<Mutex<AuditLoggerInner>>,
    node_id: String,
}

struct AuditLoggerInner {
    writer: Option<BufWriter<File>>,
    path: Option<PathBuf>,
}

impl PriorityAuditLogger {
    pub fn new(node_id: String) -> Self {
        Self {
            inner: Arc::new(Mutex::new(AuditLoggerInner {
                writer: None,
                path: None,
            })),
            node_id,
        }
    }

    /// Open (or create) the audit file for appending
    pub async fn init_file(&self, path: &Path) -> std::io::Result<()> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;

        let mut inner = self.inner.lock().await;
        inner.writer = Some(BufWriter::new(file));
        inner.path = Some(path.to_path_buf());

        info!("Priority audit log initialized at {}", path.display());
        Ok(())
    }

    /// Record an applied change
    pub async fn log_change(
        &self,
        task_id: String,
        title: String,
        previous: Option<Priority>,
        assigned: Priority,
        time_left_secs: i64,
    ) {
        let change = PriorityChange {
            timestamp: Utc::now(),
            node_id: self.node_id.clone(),
            task_id,
            title,
            previous,
            assigned,
            time_left_secs,
        };
        self.log(change).await;
    }

    pub async fn log(&self, change: PriorityChange) {
        let jsonl = match change.to_jsonl() {
            Ok(line) => line,
            Err(e) => {
                error!("Failed to serialize priority change: {}", e);
                return;
            }
        };

        let mut inner = self.inner.lock().await;

        if let Some(ref mut writer) = inner.writer {
            if let Err(e) = writeln!(writer, "{}", jsonl) {
                error!("Failed to write priority change: {}", e);
            }
            if let Err(e) = writer.flush() {
                error!("Failed to flush priority audit log: {}", e);
            }
        }
    }

    /// Path of the audit file, if enabled
    pub async fn path(&self) -> Option<PathBuf> {
        self.inner.lock().await.path.clone()
    }
}
