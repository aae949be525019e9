//! # Export Audit Log
//!
//! One append-only entry per successful export: who exported which
//! evidence, with which hash, in which format, from where.
//!
//! Audit writes never fail an export. The distributor logs a failed write
//! with `tracing::warn!` and returns the document anyway.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;

use sst_core::{ActorId, CompanyId};

use crate::error::AuditError;

/// Action recorded for evidence exports.
pub const ACTION_EXPORT: &str = "EVIDENCE_EXPORTED";

/// Entity type recorded for evidence exports.
pub const ENTITY_EVIDENCE: &str = "EvidenceRecord";

/// Audit payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditPayload {
    /// Content hash of the exported evidence.
    pub hash: String,
    /// Export format.
    pub format: String,
    /// Engine version of the evidence.
    pub version: String,
    /// Export time.
    pub timestamp: DateTime<Utc>,
}

/// A single audit log entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogEntry {
    /// Acting user.
    pub actor_id: ActorId,
    /// Company owning the entity.
    pub company_id: CompanyId,
    /// Action performed.
    pub action: String,
    /// Entity kind.
    pub entity_type: String,
    /// Entity identifier.
    pub entity_id: String,
    /// Action details.
    pub payload: AuditPayload,
    /// Client address, when known.
    pub ip_address: Option<String>,
    /// Client user agent, when known.
    pub user_agent: Option<String>,
}

/// Append-only audit destination.
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Append one entry.
    async fn append(&self, entry: &AuditLogEntry) -> Result<(), AuditError>;
}

/// In-memory audit log.
#[derive(Debug, Default)]
pub struct MemoryAuditLog {
    entries: Mutex<Vec<AuditLogEntry>>,
}

impl MemoryAuditLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// All entries, oldest first.
    pub fn entries(&self) -> Vec<AuditLogEntry> {
        self.entries.lock().clone()
    }

    /// Entries for one entity id.
    pub fn entries_for_entity(&self, entity_id: &str) -> Vec<AuditLogEntry> {
        self.entries
            .lock()
            .iter()
            .filter(|e| e.entity_id == entity_id)
            .cloned()
            .collect()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether the log is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl AuditSink for MemoryAuditLog {
    async fn append(&self, entry: &AuditLogEntry) -> Result<(), AuditError> {
        self.entries.lock().push(entry.clone());
        Ok(())
    }
}

/// JSON Lines audit log, one entry per line, opened in append mode.
///
/// Appends from one instance are serialized; each entry is a single write
/// of one full line.
#[derive(Debug)]
pub struct JsonlAuditLog {
    path: PathBuf,
    lock: tokio::sync::Mutex<()>,
}

impl JsonlAuditLog {
    /// Log appending to `path`; the file is created on first write.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Target file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every entry back.
    pub fn read_all(&self) -> Result<Vec<AuditLogEntry>, AuditError> {
        let text = std::fs::read_to_string(&self.path)?;
        text.lines()
            .filter(|l| !l.trim().is_empty())
            .map(|l| serde_json::from_str(l).map_err(AuditError::from))
            .collect()
    }
}

#[async_trait]
impl AuditSink for JsonlAuditLog {
    async fn append(&self, entry: &AuditLogEntry) -> Result<(), AuditError> {
        let mut line = serde_json::to_vec(entry)?;
        line.push(b'\n');

        let _guard = self.lock.lock().await;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(&line).await?;
        file.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(entity: &str) -> AuditLogEntry {
        AuditLogEntry {
            actor_id: ActorId::new("auditor").unwrap(),
            company_id: CompanyId::new("acme").unwrap(),
            action: ACTION_EXPORT.into(),
            entity_type: ENTITY_EVIDENCE.into(),
            entity_id: entity.into(),
            payload: AuditPayload {
                hash: "ab".repeat(32),
                format: "text".into(),
                version: "1.4.0".into(),
                timestamp: Utc::now(),
            },
            ip_address: Some("10.0.0.7".into()),
            user_agent: None,
        }
    }

    #[test]
    fn entry_uses_wire_names() {
        let v = serde_json::to_value(entry("e1")).unwrap();
        for key in ["actorId", "companyId", "action", "entityType", "entityId", "payload", "ipAddress", "userAgent"] {
            assert!(v.get(key).is_some(), "missing {key}");
        }
        for key in ["hash", "format", "version", "timestamp"] {
            assert!(v["payload"].get(key).is_some(), "missing payload.{key}");
        }
    }

    #[tokio::test]
    async fn memory_log_filters_by_entity() {
        let log = MemoryAuditLog::new();
        log.append(&entry("e1")).await.unwrap();
        log.append(&entry("e2")).await.unwrap();
        assert_eq!(log.entries_for_entity("e2").len(), 1);
        assert_eq!(log.len(), 2);
    }

    #[tokio::test]
    async fn jsonl_log_appends() {
        let dir = tempfile::tempdir().unwrap();
        let log = JsonlAuditLog::new(dir.path().join("audit.jsonl"));
        log.append(&entry("e1")).await.unwrap();
        log.append(&entry("e2")).await.unwrap();

        let entries = log.read_all().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].entity_id, "e2");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_appends_keep_whole_lines() {
        let dir = tempfile::tempdir().unwrap();
        let log = std::sync::Arc::new(JsonlAuditLog::new(dir.path().join("audit.jsonl")));

        let tasks: Vec<_> = (0..16)
            .map(|i| {
                let log = log.clone();
                tokio::spawn(async move { log.append(&entry(&format!("e{i}"))).await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let entries = log.read_all().unwrap();
        assert_eq!(entries.len(), 16);
    }
}
