//! # Sealing & Integrity Guard
//!
//! Sealing renders a template against its bindings, hashes the final
//! markdown with SHA-256, and inserts content and hash together as one new
//! [`EvidenceRecord`]. The hash never appears inside the hashed content.
//!
//! [`verify_integrity`] recomputes the hash of the stored content and
//! compares it in constant time. Every export path calls it before any
//! layout work.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

use sst_core::{sha256_content, ActorId, CompanyId, ContentDigest, EvidenceId, SnapshotId};

use crate::binding::Bindings;
use crate::error::EvidenceError;
use crate::store::EvidenceStore;
use crate::template::Template;

/// A sealed evidence artifact. Never updated after insertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceRecord {
    /// Record identifier.
    pub id: EvidenceId,
    /// Company the evidence belongs to.
    pub company_id: CompanyId,
    /// Exposure snapshot the content was generated from.
    pub snapshot_id: SnapshotId,
    /// Hex SHA-256 of `conteudo_markdown`.
    pub content_hash: String,
    /// Engine version that computed the figures.
    pub engine_version: String,
    /// Day the evidence represents.
    pub reference_date: NaiveDate,
    /// The rendered markdown, exactly as hashed.
    pub conteudo_markdown: String,
    /// Who sealed the evidence.
    pub created_by: ActorId,
    /// When it was sealed.
    pub created_at: DateTime<Utc>,
}

/// Everything about a seal except the content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealRequest {
    /// Company the evidence belongs to.
    pub company_id: CompanyId,
    /// Exposure snapshot behind the figures.
    pub snapshot_id: SnapshotId,
    /// Day the evidence represents.
    pub reference_date: NaiveDate,
    /// Engine version.
    pub engine_version: String,
    /// Sealing actor.
    pub created_by: ActorId,
}

/// Hex SHA-256 of rendered markdown.
pub fn content_hash(markdown: &str) -> String {
    sha256_content(markdown.as_bytes()).to_hex()
}

/// Check that a record's content still matches its sealed hash.
pub fn verify_integrity(record: &EvidenceRecord) -> Result<(), EvidenceError> {
    let actual = sha256_content(record.conteudo_markdown.as_bytes());
    let matches = ContentDigest::from_hex(&record.content_hash)
        .map(|expected| bool::from(actual.bytes[..].ct_eq(&expected.bytes[..])))
        .unwrap_or(false);

    if matches {
        Ok(())
    } else {
        tracing::warn!(evidence = %record.id, company = %record.company_id, "evidence integrity check failed");
        Err(EvidenceError::IntegrityMismatch {
            evidence_id: record.id,
            expected: record.content_hash.clone(),
            actual: actual.to_hex(),
        })
    }
}

/// Renders and seals evidence into an [`EvidenceStore`].
#[derive(Clone)]
pub struct Sealer {
    store: Arc<dyn EvidenceStore>,
}

impl Sealer {
    /// Create a sealer writing into `store`.
    pub fn new(store: Arc<dyn EvidenceStore>) -> Self {
        Self { store }
    }

    /// Render `template` with `bindings` and insert the sealed record.
    ///
    /// Template errors abort before anything is written.
    pub async fn seal(
        &self,
        template: &Template,
        bindings: &dyn Bindings,
        request: SealRequest,
    ) -> Result<EvidenceRecord, EvidenceError> {
        let markdown = template.render(bindings)?;
        let record = EvidenceRecord {
            id: EvidenceId::new(),
            company_id: request.company_id,
            snapshot_id: request.snapshot_id,
            content_hash: content_hash(&markdown),
            engine_version: request.engine_version,
            reference_date: request.reference_date,
            conteudo_markdown: markdown,
            created_by: request.created_by,
            created_at: Utc::now(),
        };

        self.store.insert(&record).await?;
        tracing::info!(
            evidence = %record.id,
            company = %record.company_id,
            hash = %record.content_hash,
            "evidence sealed"
        );
        Ok(record)
    }
}

impl std::fmt::Debug for Sealer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sealer").finish_non_exhaustive()
    }
}
