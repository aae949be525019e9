//! # Decision Log
//!
//! Records every composed pipeline decision for later review. Each entry
//! carries the decision's canonical digest so a stored decision can be
//! checked against its entry.
//!
//! Writes are best-effort from the pipeline's point of view: it awaits
//! [`DecisionLog::record`] and only logs a failure.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;

use sst_core::{CompanyId, SnapshotId};

use crate::pipeline::{AgentDecision, DecisionStatus};

/// Errors writing a decision entry.
#[derive(Debug, thiserror::Error)]
pub enum DecisionLogError {
    /// The log could not be written.
    #[error("decision log I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The entry could not be serialized.
    #[error("decision log serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Any other backend failure.
    #[error("decision log backend error: {0}")]
    Backend(String),
}

/// A single decision log entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionEntry {
    /// Company evaluated.
    pub company_id: CompanyId,
    /// Exposure snapshot behind the decision.
    pub snapshot_id: SnapshotId,
    /// Overall verdict.
    pub status: DecisionStatus,
    /// Fiscal score.
    pub score: u32,
    /// Number of legal issues.
    pub issues: usize,
    /// Hex SHA-256 of the canonical decision, when it canonicalizes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
    /// When the decision was composed.
    pub evaluated_at: DateTime<Utc>,
}

impl DecisionEntry {
    /// Summarize a decision.
    pub fn from_decision(decision: &AgentDecision) -> Self {
        Self {
            company_id: decision.company_id.clone(),
            snapshot_id: decision.snapshot_id,
            status: decision.status,
            score: decision.fiscal.score,
            issues: decision.legal.issues.len(),
            digest: decision.digest().map(|d| d.to_hex()),
            evaluated_at: decision.evaluated_at,
        }
    }
}

/// Destination for composed decisions.
#[async_trait]
pub trait DecisionLog: Send + Sync {
    /// Record one decision.
    async fn record(&self, decision: &AgentDecision) -> Result<(), DecisionLogError>;
}

// ---------------------------------------------------------------------------
// In-memory
// ---------------------------------------------------------------------------

/// Bounded in-memory log. When the capacity is exceeded the oldest 10% of
/// entries are dropped.
#[derive(Debug)]
pub struct MemoryDecisionLog {
    entries: Mutex<Vec<DecisionEntry>>,
    max_entries: usize,
}

impl MemoryDecisionLog {
    /// Default capacity.
    pub const DEFAULT_CAPACITY: usize = 10_000;

    /// Log with the default capacity.
    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    /// Log holding at most `max_entries`.
    pub fn with_capacity(max_entries: usize) -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            max_entries: max_entries.max(1),
        }
    }

    /// Snapshot of all entries, oldest first.
    pub fn entries(&self) -> Vec<DecisionEntry> {
        self.entries.lock().clone()
    }

    /// Entries for one company.
    pub fn entries_for_company(&self, company: &CompanyId) -> Vec<DecisionEntry> {
        self.entries
            .lock()
            .iter()
            .filter(|e| &e.company_id == company)
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

impl Default for MemoryDecisionLog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DecisionLog for MemoryDecisionLog {
    async fn record(&self, decision: &AgentDecision) -> Result<(), DecisionLogError> {
        let entry = DecisionEntry::from_decision(decision);
        let mut entries = self.entries.lock();
        entries.push(entry);
        if entries.len() > self.max_entries {
            let trim = (self.max_entries / 10).max(1);
            entries.drain(..trim);
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// JSON Lines file
// ---------------------------------------------------------------------------

/// Append-only JSON Lines log, one entry per line.
#[derive(Debug)]
pub struct JsonlDecisionLog {
    path: PathBuf,
    lock: tokio::sync::Mutex<()>,
}

impl JsonlDecisionLog {
    /// Log appending to `path`. The file is created on first write.
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
}

#[async_trait]
impl DecisionLog for JsonlDecisionLog {
    async fn record(&self, decision: &AgentDecision) -> Result<(), DecisionLogError> {
        let mut line = serde_json::to_vec(&DecisionEntry::from_decision(decision))?;
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
    use crate::agents::{FineProbability, FiscalAssessment, LegalAssessment};
    use sst_exposure::TechnicalExposureResult;

    fn decision(company: &str, score: u32) -> AgentDecision {
        AgentDecision {
            company_id: CompanyId::new(company).unwrap(),
            snapshot_id: SnapshotId::new(),
            technical: TechnicalExposureResult::default(),
            legal: LegalAssessment {
                compliant: false,
                issues: vec!["Inventário de riscos inexistente".into()],
                legal_risk: 20,
            },
            fiscal: FiscalAssessment {
                score,
                probability_of_fine: FineProbability::Baixa,
            },
            status: DecisionStatus::Ok,
            evaluated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn memory_log_records_digest() {
        let log = MemoryDecisionLog::new();
        let d = decision("acme", 40);
        log.record(&d).await.unwrap();

        let entries = log.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].score, 40);
        assert_eq!(entries[0].issues, 1);
        assert_eq!(entries[0].digest, d.digest().map(|x| x.to_hex()));
    }

    #[tokio::test]
    async fn memory_log_trims_oldest_tenth() {
        let log = MemoryDecisionLog::with_capacity(20);
        for i in 0..21 {
            log.record(&decision("acme", i)).await.unwrap();
        }
        let entries = log.entries();
        assert_eq!(entries.len(), 19);
        assert_eq!(entries[0].score, 2);
    }

    #[tokio::test]
    async fn memory_log_filters_by_company() {
        let log = MemoryDecisionLog::new();
        log.record(&decision("acme", 40)).await.unwrap();
        log.record(&decision("globex", 0)).await.unwrap();
        assert_eq!(log.entries_for_company(&CompanyId::new("globex").unwrap()).len(), 1);
    }

    #[tokio::test]
    async fn jsonl_log_appends_lines() {
        let dir = tempfile::tempdir().unwrap();
        let log = JsonlDecisionLog::new(dir.path().join("decisions.jsonl"));

        log.record(&decision("acme", 40)).await.unwrap();
        log.record(&decision("acme", 70)).await.unwrap();

        let text = std::fs::read_to_string(log.path()).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        let second: DecisionEntry = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second.score, 70);
    }
}
