//! # Evidence Stores
//!
//! Evidence records are append-only: a store accepts each id exactly once
//! and offers no update path. The filesystem store enforces this with
//! `create_new`, so a concurrent second insert of the same id fails
//! instead of overwriting.
//!
//! Layout of [`FsEvidenceStore`]: `<base>/evidence/<id>.json`. Record I/O
//! goes through `tokio::fs`, so reads and writes never block a runtime
//! worker.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::io::AsyncWriteExt;

use sst_core::{CompanyId, EvidenceId};

use crate::error::StoreError;
use crate::seal::EvidenceRecord;

/// Persistence port for sealed evidence.
#[async_trait]
pub trait EvidenceStore: Send + Sync {
    /// Insert a new record. Fails with [`StoreError::AlreadyExists`] if the
    /// id is taken.
    async fn insert(&self, record: &EvidenceRecord) -> Result<(), StoreError>;

    /// Fetch a record by id.
    async fn get(&self, id: &EvidenceId) -> Result<Option<EvidenceRecord>, StoreError>;

    /// All records of a company, oldest first.
    async fn list_for_company(&self, company: &CompanyId) -> Result<Vec<EvidenceRecord>, StoreError>;
}

fn sort_oldest_first(records: &mut [EvidenceRecord]) {
    records.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
}

// ---------------------------------------------------------------------------
// In-memory
// ---------------------------------------------------------------------------

/// In-memory evidence store.
#[derive(Debug, Default)]
pub struct MemoryEvidenceStore {
    records: RwLock<BTreeMap<EvidenceId, EvidenceRecord>>,
}

impl MemoryEvidenceStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl EvidenceStore for MemoryEvidenceStore {
    async fn insert(&self, record: &EvidenceRecord) -> Result<(), StoreError> {
        let mut records = self.records.write();
        if records.contains_key(&record.id) {
            return Err(StoreError::AlreadyExists(record.id));
        }
        records.insert(record.id, record.clone());
        Ok(())
    }

    async fn get(&self, id: &EvidenceId) -> Result<Option<EvidenceRecord>, StoreError> {
        Ok(self.records.read().get(id).cloned())
    }

    async fn list_for_company(&self, company: &CompanyId) -> Result<Vec<EvidenceRecord>, StoreError> {
        let mut out: Vec<_> = self
            .records
            .read()
            .values()
            .filter(|r| &r.company_id == company)
            .cloned()
            .collect();
        sort_oldest_first(&mut out);
        Ok(out)
    }
}

// ---------------------------------------------------------------------------
// Filesystem
// ---------------------------------------------------------------------------

/// One JSON file per record under `<base>/evidence/`.
#[derive(Debug, Clone)]
pub struct FsEvidenceStore {
    dir: PathBuf,
}

impl FsEvidenceStore {
    /// Open (creating if needed) a store rooted at `base`.
    pub fn open(base: impl AsRef<Path>) -> Result<Self, StoreError> {
        let dir = base.as_ref().join("evidence");
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Directory holding the record files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of a record's file.
    pub fn path_of(&self, id: &EvidenceId) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }

    async fn read(path: &Path) -> Result<EvidenceRecord, StoreError> {
        let bytes = tokio::fs::read(path).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl EvidenceStore for FsEvidenceStore {
    async fn insert(&self, record: &EvidenceRecord) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(record)?;
        let path = self.path_of(&record.id);
        let mut file = match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(StoreError::AlreadyExists(record.id));
            }
            Err(e) => return Err(e.into()),
        };
        file.write_all(&bytes).await?;
        file.sync_all().await?;
        tracing::debug!(evidence = %record.id, path = %path.display(), "evidence record written");
        Ok(())
    }

    async fn get(&self, id: &EvidenceId) -> Result<Option<EvidenceRecord>, StoreError> {
        let path = self.path_of(id);
        match Self::read(&path).await {
            Ok(record) => Ok(Some(record)),
            Err(StoreError::Io(e)) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn list_for_company(&self, company: &CompanyId) -> Result<Vec<EvidenceRecord>, StoreError> {
        let mut out = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let record = Self::read(&path).await?;
            if &record.company_id == company {
                out.push(record);
            }
        }
        sort_oldest_first(&mut out);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use sst_core::{ActorId, SnapshotId};

    use crate::seal::content_hash;

    fn record(company: &str, content: &str) -> EvidenceRecord {
        EvidenceRecord {
            id: EvidenceId::new(),
            company_id: CompanyId::new(company).unwrap(),
            snapshot_id: SnapshotId::new(),
            content_hash: content_hash(content),
            engine_version: "1.4.0".into(),
            reference_date: NaiveDate::from_ymd_opt(2026, 3, 31).unwrap(),
            conteudo_markdown: content.into(),
            created_by: ActorId::new("tecnico.sst").unwrap(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn memory_store_is_append_only() {
        let store = MemoryEvidenceStore::new();
        let r = record("acme", "# a");
        store.insert(&r).await.unwrap();
        let err = store.insert(&r).await.unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists(id) if id == r.id));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn memory_store_lists_by_company() {
        let store = MemoryEvidenceStore::new();
        store.insert(&record("acme", "# a")).await.unwrap();
        store.insert(&record("acme", "# b")).await.unwrap();
        store.insert(&record("globex", "# c")).await.unwrap();
        let acme = store.list_for_company(&CompanyId::new("acme").unwrap()).await.unwrap();
        assert_eq!(acme.len(), 2);
    }

    #[tokio::test]
    async fn fs_store_round_trips_and_refuses_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsEvidenceStore::open(dir.path()).unwrap();
        let r = record("acme", "# Evidência\n");

        store.insert(&r).await.unwrap();
        assert!(store.path_of(&r.id).exists());
        assert_eq!(store.get(&r.id).await.unwrap(), Some(r.clone()));

        let err = store.insert(&r).await.unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn fs_store_missing_record_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsEvidenceStore::open(dir.path()).unwrap();
        assert_eq!(store.get(&EvidenceId::new()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn fs_store_lists_by_company() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsEvidenceStore::open(dir.path()).unwrap();
        store.insert(&record("acme", "# a")).await.unwrap();
        store.insert(&record("globex", "# b")).await.unwrap();
        let found = store.list_for_company(&CompanyId::new("globex").unwrap()).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].conteudo_markdown, "# b");
    }
}
