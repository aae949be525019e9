//! # Daily Exposure Snapshots
//!
//! A snapshot freezes one evaluation of a company's exposure for a reference
//! date. Sealed evidence records point back to the snapshot they were
//! generated from.
//!
//! Persisting a snapshot is a history side effect, never a precondition:
//! [`persist_snapshot`] logs a failed write and reports it as `false`, and
//! the caller carries on with the evaluation it already has.
//!
//! Sinks are append-only and keyed by [`SnapshotId`]. Several snapshots may
//! exist for the same company and day; none replaces another, so every
//! evidence record's back-reference stays resolvable.
//!
//! Layout of [`FsSnapshotSink`]: `<base>/snapshots/<id>.json`.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;

use sst_core::{sha256_digest, CanonicalBytes, CompanyId, SnapshotId};

use crate::model::TechnicalExposureResult;

/// A frozen exposure evaluation for one company and reference date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExposureSnapshot {
    /// Snapshot identifier, minted at capture time.
    pub id: SnapshotId,
    /// Company the evaluation belongs to.
    pub company_id: CompanyId,
    /// Day the snapshot represents.
    pub reference_date: NaiveDate,
    /// When the snapshot was captured.
    pub captured_at: DateTime<Utc>,
    /// Hex SHA-256 of the canonicalized result, when it canonicalizes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
    /// The evaluation itself.
    pub result: TechnicalExposureResult,
}

impl ExposureSnapshot {
    /// Capture a snapshot of an evaluation.
    ///
    /// The digest is omitted when the result cannot be canonicalized (for
    /// instance, free-form risk fields carrying floats).
    pub fn capture(
        company_id: CompanyId,
        reference_date: NaiveDate,
        result: TechnicalExposureResult,
    ) -> Self {
        let digest = match CanonicalBytes::new(&result) {
            Ok(canonical) => Some(sha256_digest(&canonical).to_hex()),
            Err(e) => {
                tracing::warn!(company = %company_id, error = %e, "exposure snapshot canonicalization failed, digest unavailable");
                None
            }
        };
        Self {
            id: SnapshotId::new(),
            company_id,
            reference_date,
            captured_at: Utc::now(),
            digest,
            result,
        }
    }
}

/// Errors writing or reading snapshots.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    /// Snapshots are append-only.
    #[error("snapshot {0} already exists; snapshots are append-only")]
    AlreadyExists(SnapshotId),

    /// Filesystem failure.
    #[error("snapshot I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A snapshot could not be (de)serialized.
    #[error("snapshot serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The backing store rejected or failed the operation.
    #[error("snapshot backend error: {0}")]
    Backend(String),
}

/// Append-only history of exposure snapshots.
#[async_trait]
pub trait SnapshotSink: Send + Sync {
    /// Write a new snapshot. Fails with [`SnapshotError::AlreadyExists`] if
    /// the id is taken.
    async fn write(&self, snapshot: &ExposureSnapshot) -> Result<(), SnapshotError>;

    /// Fetch a snapshot by id.
    async fn fetch(&self, id: &SnapshotId) -> Result<Option<ExposureSnapshot>, SnapshotError>;

    /// Most recently captured snapshot of a company for a day.
    async fn latest(
        &self,
        company_id: &CompanyId,
        date: NaiveDate,
    ) -> Result<Option<ExposureSnapshot>, SnapshotError>;
}

/// Best-effort snapshot persistence. Returns whether the write succeeded.
pub async fn persist_snapshot(sink: &dyn SnapshotSink, snapshot: &ExposureSnapshot) -> bool {
    match sink.write(snapshot).await {
        Ok(()) => {
            tracing::debug!(snapshot = %snapshot.id, company = %snapshot.company_id, "exposure snapshot persisted");
            true
        }
        Err(e) => {
            tracing::warn!(
                snapshot = %snapshot.id,
                company = %snapshot.company_id,
                error = %e,
                "exposure snapshot persistence failed, continuing with in-memory result"
            );
            false
        }
    }
}

fn newest_of_day<I>(snapshots: I, company_id: &CompanyId, date: NaiveDate) -> Option<ExposureSnapshot>
where
    I: IntoIterator<Item = ExposureSnapshot>,
{
    snapshots
        .into_iter()
        .filter(|s| &s.company_id == company_id && s.reference_date == date)
        .max_by(|a, b| a.captured_at.cmp(&b.captured_at).then(a.id.cmp(&b.id)))
}

// ---------------------------------------------------------------------------
// In-memory
// ---------------------------------------------------------------------------

/// In-memory snapshot sink.
#[derive(Debug, Default)]
pub struct MemorySnapshotSink {
    snapshots: RwLock<Vec<ExposureSnapshot>>,
}

impl MemorySnapshotSink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored snapshots.
    pub fn len(&self) -> usize {
        self.snapshots.read().len()
    }

    /// Whether the sink holds no snapshots.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl SnapshotSink for MemorySnapshotSink {
    async fn write(&self, snapshot: &ExposureSnapshot) -> Result<(), SnapshotError> {
        let mut snapshots = self.snapshots.write();
        if snapshots.iter().any(|s| s.id == snapshot.id) {
            return Err(SnapshotError::AlreadyExists(snapshot.id));
        }
        snapshots.push(snapshot.clone());
        Ok(())
    }

    async fn fetch(&self, id: &SnapshotId) -> Result<Option<ExposureSnapshot>, SnapshotError> {
        Ok(self.snapshots.read().iter().find(|s| &s.id == id).cloned())
    }

    async fn latest(
        &self,
        company_id: &CompanyId,
        date: NaiveDate,
    ) -> Result<Option<ExposureSnapshot>, SnapshotError> {
        Ok(newest_of_day(self.snapshots.read().iter().cloned(), company_id, date))
    }
}

// ---------------------------------------------------------------------------
// Filesystem
// ---------------------------------------------------------------------------

/// One JSON file per snapshot under `<base>/snapshots/`.
#[derive(Debug, Clone)]
pub struct FsSnapshotSink {
    dir: PathBuf,
}

impl FsSnapshotSink {
    /// Open (creating if needed) a sink rooted at `base`.
    pub fn open(base: impl AsRef<Path>) -> Result<Self, SnapshotError> {
        let dir = base.as_ref().join("snapshots");
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Directory holding the snapshot files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of a snapshot's file.
    pub fn path_of(&self, id: &SnapshotId) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }

    async fn read(path: &Path) -> Result<ExposureSnapshot, SnapshotError> {
        let bytes = tokio::fs::read(path).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl SnapshotSink for FsSnapshotSink {
    async fn write(&self, snapshot: &ExposureSnapshot) -> Result<(), SnapshotError> {
        let bytes = serde_json::to_vec_pretty(snapshot)?;
        let path = self.path_of(&snapshot.id);
        let mut file = match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(SnapshotError::AlreadyExists(snapshot.id));
            }
            Err(e) => return Err(e.into()),
        };
        file.write_all(&bytes).await?;
        file.sync_all().await?;
        Ok(())
    }

    async fn fetch(&self, id: &SnapshotId) -> Result<Option<ExposureSnapshot>, SnapshotError> {
        match Self::read(&self.path_of(id)).await {
            Ok(snapshot) => Ok(Some(snapshot)),
            Err(SnapshotError::Io(e)) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn latest(
        &self,
        company_id: &CompanyId,
        date: NaiveDate,
    ) -> Result<Option<ExposureSnapshot>, SnapshotError> {
        let mut found = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            found.push(Self::read(&path).await?);
        }
        Ok(newest_of_day(found, company_id, date))
    }
}
