//! # Evidence Distribution
//!
//! Export path for sealed evidence:
//!
//! 1. Load the record; a missing id is [`EvidenceError::NotFound`].
//! 2. [`verify_integrity`]; a mismatch aborts before any layout work and
//!    nothing is audited.
//! 3. Parse the stored markdown, lay it out, and finalize every footer with
//!    the content hash and `Página X de N`.
//! 4. Encode in the requested [`ExportFormat`].
//! 5. Append an audit entry. A failed audit write is logged and the
//!    document is still returned.

use std::sync::Arc;

use chrono::Utc;

use sst_core::{ActorId, EvidenceId};

use crate::audit::{AuditLogEntry, AuditPayload, AuditSink, ACTION_EXPORT, ENTITY_EVIDENCE};
use crate::error::EvidenceError;
use crate::render::{markdown, ExportFormat, Layout, SealedDocument};
use crate::seal::{verify_integrity, EvidenceRecord};
use crate::store::EvidenceStore;

/// Who is exporting what, and how.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRequest {
    /// Evidence to export.
    pub evidence_id: EvidenceId,
    /// Exporting user.
    pub actor_id: ActorId,
    /// Output encoding.
    pub format: ExportFormat,
    /// Client address, when known.
    pub ip_address: Option<String>,
    /// Client user agent, when known.
    pub user_agent: Option<String>,
}

impl ExportRequest {
    /// Request with no client metadata.
    pub fn new(evidence_id: EvidenceId, actor_id: ActorId, format: ExportFormat) -> Self {
        Self {
            evidence_id,
            actor_id,
            format,
            ip_address: None,
            user_agent: None,
        }
    }
}

/// Result of a successful export.
#[derive(Debug, Clone)]
pub struct ExportOutcome {
    /// The exported record.
    pub record: EvidenceRecord,
    /// The finalized page model.
    pub document: SealedDocument,
    /// Encoded output.
    pub bytes: Vec<u8>,
    /// Whether the audit entry was written.
    pub audited: bool,
}

/// Integrity-guarded exporter.
#[derive(Clone)]
pub struct Distributor {
    store: Arc<dyn EvidenceStore>,
    audit: Arc<dyn AuditSink>,
    layout: Layout,
}

impl Distributor {
    /// Exporter reading from `store` and auditing into `audit`, with the
    /// default A4 layout.
    pub fn new(store: Arc<dyn EvidenceStore>, audit: Arc<dyn AuditSink>) -> Self {
        Self {
            store,
            audit,
            layout: Layout::default(),
        }
    }

    /// Use a different layout.
    pub fn with_layout(mut self, layout: Layout) -> Self {
        self.layout = layout;
        self
    }

    /// Export one evidence record.
    pub async fn export(&self, request: &ExportRequest) -> Result<ExportOutcome, EvidenceError> {
        let record = self
            .store
            .get(&request.evidence_id)
            .await?
            .ok_or(EvidenceError::NotFound(request.evidence_id))?;

        verify_integrity(&record)?;

        let blocks = markdown::parse(&record.conteudo_markdown);
        let document = self.layout.render(&blocks).finalize(&record.content_hash);
        let bytes = request.format.encode(&document)?;

        let entry = AuditLogEntry {
            actor_id: request.actor_id.clone(),
            company_id: record.company_id.clone(),
            action: ACTION_EXPORT.to_string(),
            entity_type: ENTITY_EVIDENCE.to_string(),
            entity_id: record.id.to_string(),
            payload: AuditPayload {
                hash: record.content_hash.clone(),
                format: request.format.as_str().to_string(),
                version: record.engine_version.clone(),
                timestamp: Utc::now(),
            },
            ip_address: request.ip_address.clone(),
            user_agent: request.user_agent.clone(),
        };
        let audited = match self.audit.append(&entry).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(evidence = %record.id, error = %e, "export audit write failed");
                false
            }
        };

        tracing::info!(
            evidence = %record.id,
            actor = %request.actor_id,
            format = %request.format,
            pages = document.page_count(),
            "evidence exported"
        );
        Ok(ExportOutcome {
            record,
            document,
            bytes,
            audited,
        })
    }
}

impl std::fmt::Debug for Distributor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Distributor")
            .field("layout", &self.layout)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use serde_json::json;
    use sst_core::{CompanyId, SnapshotId};

    use crate::audit::MemoryAuditLog;
    use crate::binding::JsonBindings;
    use crate::error::AuditError;
    use crate::seal::{SealRequest, Sealer};
    use crate::store::MemoryEvidenceStore;
    use crate::template::Template;

    struct BrokenAudit;

    #[async_trait]
    impl AuditSink for BrokenAudit {
        async fn append(&self, _entry: &AuditLogEntry) -> Result<(), AuditError> {
            Err(AuditError::Backend("disk full".into()))
        }
    }

    /// Store that hands back a tampered copy of whatever was inserted.
    #[derive(Default)]
    struct TamperingStore {
        inner: MemoryEvidenceStore,
    }

    #[async_trait]
    impl EvidenceStore for TamperingStore {
        async fn insert(&self, record: &EvidenceRecord) -> Result<(), crate::error::StoreError> {
            self.inner.insert(record).await
        }

        async fn get(&self, id: &EvidenceId) -> Result<Option<EvidenceRecord>, crate::error::StoreError> {
            Ok(self.inner.get(id).await?.map(|mut r| {
                r.conteudo_markdown.push_str("\nlinha adulterada\n");
                r
            }))
        }

        async fn list_for_company(
            &self,
            company: &sst_core::CompanyId,
        ) -> Result<Vec<EvidenceRecord>, crate::error::StoreError> {
            self.inner.list_for_company(company).await
        }
    }

    fn actor() -> ActorId {
        ActorId::new("auditor.externo").unwrap()
    }

    async fn seal_into(store: Arc<dyn EvidenceStore>) -> EvidenceRecord {
        let template = Template::parse("# Evidência\n\nEmpresa: {{empresa.nome}}\n\n> Documento selado\n").unwrap();
        let bindings = JsonBindings::new(json!({ "empresa": { "nome": "Acme" } }));
        Sealer::new(store)
            .seal(
                &template,
                &bindings,
                SealRequest {
                    company_id: CompanyId::new("acme").unwrap(),
                    snapshot_id: SnapshotId::new(),
                    reference_date: NaiveDate::from_ymd_opt(2026, 3, 31).unwrap(),
                    engine_version: "1.4.0".into(),
                    created_by: ActorId::new("tecnico.sst").unwrap(),
                },
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn export_stamps_footers_and_audits() {
        let store = Arc::new(MemoryEvidenceStore::new());
        let audit = Arc::new(MemoryAuditLog::new());
        let record = seal_into(store.clone()).await;

        let distributor = Distributor::new(store, audit.clone());
        let mut request = ExportRequest::new(record.id, actor(), ExportFormat::Text);
        request.ip_address = Some("10.1.2.3".into());
        let outcome = distributor.export(&request).await.unwrap();

        assert!(outcome.audited);
        assert_eq!(outcome.document.page_count(), 1);
        let text = String::from_utf8(outcome.bytes).unwrap();
        assert!(text.starts_with("# Evidência\n"));
        assert!(text.contains("Empresa: Acme"));
        assert!(text.contains(&format!("Selo de integridade SHA-256: {}", record.content_hash)));
        assert!(text.ends_with("Página 1 de 1\n"));

        let entries = audit.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action, ACTION_EXPORT);
        assert_eq!(entries[0].entity_id, record.id.to_string());
        assert_eq!(entries[0].payload.hash, record.content_hash);
        assert_eq!(entries[0].payload.format, "text");
        assert_eq!(entries[0].payload.version, "1.4.0");
        assert_eq!(entries[0].ip_address.as_deref(), Some("10.1.2.3"));
    }

    #[tokio::test]
    async fn drift_blocks_export_without_audit() {
        let store = Arc::new(TamperingStore::default());
        let audit = Arc::new(MemoryAuditLog::new());
        let record = seal_into(store.clone()).await;

        let err = Distributor::new(store, audit.clone())
            .export(&ExportRequest::new(record.id, actor(), ExportFormat::Json))
            .await
            .unwrap_err();

        assert!(err.is_integrity_mismatch());
        assert!(audit.is_empty());
    }

    #[tokio::test]
    async fn audit_failure_still_returns_document() {
        let store = Arc::new(MemoryEvidenceStore::new());
        let record = seal_into(store.clone()).await;

        let outcome = Distributor::new(store, Arc::new(BrokenAudit))
            .export(&ExportRequest::new(record.id, actor(), ExportFormat::Json))
            .await
            .unwrap();

        assert!(!outcome.audited);
        let v: serde_json::Value = serde_json::from_slice(&outcome.bytes).unwrap();
        assert_eq!(v["contentHash"], record.content_hash.as_str());
    }

    #[tokio::test]
    async fn missing_evidence_is_not_found() {
        let id = EvidenceId::new();
        let err = Distributor::new(Arc::new(MemoryEvidenceStore::new()), Arc::new(MemoryAuditLog::new()))
            .export(&ExportRequest::new(id, actor(), ExportFormat::Text))
            .await
            .unwrap_err();
        assert!(matches!(err, EvidenceError::NotFound(found) if found == id));
    }
}
