//! Evaluate → seal → verify → export, on the file-backed store.
//!
//! Covers the full evidence lifecycle across crates: the exposure result
//! and regulatory state feed the report, the sealed record lands on disk,
//! exports carry the seal on every page, and editing the stored JSON is
//! caught before any layout or audit happens.

mod common;

use std::sync::Arc;

use chrono::Utc;

use sst_core::{ActorId, SnapshotId};
use sst_evidence::render::Element;
use sst_evidence::{
    content_hash, verify_integrity, Distributor, EvidenceError, EvidenceRecord, EvidenceStore, ExportFormat,
    ExportRequest, FsEvidenceStore, GenerationMeta, JsonlAuditLog, Layout, LayoutConfig, ReportData,
    SealRequest, Sealer, Template, ACTION_EXPORT, DEFAULT_TEMPLATE,
};
use sst_exposure::{ExposureEngine, ExposureSnapshot};
use sst_state::RegulatorySnapshot;

use common::{reference_date, Scenario};

async fn seal_scenario(store: Arc<FsEvidenceStore>, scenario: &Scenario) -> EvidenceRecord {
    let technical = ExposureEngine::default().evaluate(&scenario.risks, &scenario.workforce);
    let state = sst_state::evaluate(&RegulatorySnapshot::assemble(scenario.structure, &technical));
    let snapshot = ExposureSnapshot::capture(scenario.company.id.clone(), reference_date(), technical);
    let actor = ActorId::new("tecnico.sst").unwrap();

    let report = ReportData::assemble(
        &scenario.company,
        &scenario.sectors,
        &scenario.workforce,
        &snapshot.result,
        Some(&state),
        &GenerationMeta {
            reference_date: reference_date(),
            generated_at: Utc::now(),
            engine_version: "1.4.0".to_string(),
            generated_by: actor.clone(),
            snapshot_id: snapshot.id,
        },
    );
    let template = Template::parse(DEFAULT_TEMPLATE).unwrap();

    Sealer::new(store)
        .seal(
            &template,
            &report.to_bindings().unwrap(),
            SealRequest {
                company_id: scenario.company.id.clone(),
                snapshot_id: snapshot.id,
                reference_date: reference_date(),
                engine_version: "1.4.0".to_string(),
                created_by: actor,
            },
        )
        .await
        .unwrap()
}

fn export_request(record: &EvidenceRecord, format: ExportFormat) -> ExportRequest {
    ExportRequest {
        evidence_id: record.id,
        actor_id: ActorId::new("auditor.externo").unwrap(),
        format,
        ip_address: Some("192.0.2.10".to_string()),
        user_agent: Some("integration-test".to_string()),
    }
}

#[tokio::test]
async fn sealed_report_reflects_the_evaluation() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FsEvidenceStore::open(dir.path()).unwrap());
    let record = seal_scenario(store.clone(), &Scenario::single_critical_risk()).await;

    let md = &record.conteudo_markdown;
    assert!(md.contains("Razão social: Metalúrgica Alfa Ltda"));
    assert!(md.contains("CNAE: Não informado"));
    assert!(md.contains("Exposição total: 200"));
    assert!(md.contains("| r-fumos | Solda | Fumos metálicos | Soldagem MIG | 4 | 5 | 20 | 10 | 200 | Sim |"));
    assert!(!md.contains(&record.content_hash));

    assert_eq!(record.content_hash, content_hash(md));
    verify_integrity(&record).unwrap();

    let stored = store.get(&record.id).await.unwrap().unwrap();
    assert_eq!(stored, record);
}

#[tokio::test]
async fn export_stamps_every_page_and_audits_once() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FsEvidenceStore::open(dir.path()).unwrap());
    let audit = Arc::new(JsonlAuditLog::new(dir.path().join("audit.jsonl")));
    let record = seal_scenario(store.clone(), &Scenario::large_inventory(12, 8)).await;

    let outcome = Distributor::new(store, audit.clone())
        .export(&export_request(&record, ExportFormat::Text))
        .await
        .unwrap();

    let doc = &outcome.document;
    let total = doc.page_count();
    assert!(total > 1, "large inventory should span several pages");
    for (i, page) in doc.pages().iter().enumerate() {
        assert_eq!(page.number, i + 1);
        assert_eq!(page.footer.seal, format!("Selo de integridade SHA-256: {}", record.content_hash));
        assert_eq!(page.footer.pagination, format!("Página {} de {}", i + 1, total));
    }

    // Escaped pipes in hazards come back as literal pipes inside a single cell.
    let has_pipe_cell = doc.pages().iter().flat_map(|p| p.elements.iter()).any(|e| match e {
        Element::TableRow { cells, .. } => cells.iter().any(|c| c.join(" ").contains("Perigo 0 | agente")),
        _ => false,
    });
    assert!(has_pipe_cell);

    let text = String::from_utf8(outcome.bytes).unwrap();
    assert_eq!(text.matches("Selo de integridade SHA-256").count(), total);
    assert!(text.contains(&format!("Página {total} de {total}")));

    let entries = audit.read_all().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].action, ACTION_EXPORT);
    assert_eq!(entries[0].payload.hash, record.content_hash);
    assert_eq!(entries[0].payload.format, "text");
    assert_eq!(entries[0].user_agent.as_deref(), Some("integration-test"));
}

#[tokio::test]
async fn export_is_deterministic_for_the_same_record() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FsEvidenceStore::open(dir.path()).unwrap());
    let audit = Arc::new(JsonlAuditLog::new(dir.path().join("audit.jsonl")));
    let record = seal_scenario(store.clone(), &Scenario::large_inventory(4, 4)).await;
    let distributor = Distributor::new(store, audit.clone());

    let a = distributor.export(&export_request(&record, ExportFormat::Json)).await.unwrap();
    let b = distributor.export(&export_request(&record, ExportFormat::Json)).await.unwrap();
    assert_eq!(a.bytes, b.bytes);
    assert_eq!(audit.read_all().unwrap().len(), 2);
}

#[tokio::test]
async fn smaller_pages_mean_more_pages() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FsEvidenceStore::open(dir.path()).unwrap());
    let audit = Arc::new(JsonlAuditLog::new(dir.path().join("audit.jsonl")));
    let record = seal_scenario(store.clone(), &Scenario::large_inventory(6, 6)).await;

    let a4 = Distributor::new(store.clone(), audit.clone())
        .export(&export_request(&record, ExportFormat::Text))
        .await
        .unwrap();
    let small = Distributor::new(store, audit)
        .with_layout(Layout::new(LayoutConfig {
            page_height: 400.0,
            ..LayoutConfig::default()
        }))
        .export(&export_request(&record, ExportFormat::Text))
        .await
        .unwrap();

    assert!(small.document.page_count() > a4.document.page_count());
}

#[tokio::test]
async fn tampered_file_is_refused_without_audit() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FsEvidenceStore::open(dir.path()).unwrap());
    let audit_path = dir.path().join("audit.jsonl");
    let record = seal_scenario(store.clone(), &Scenario::single_critical_risk()).await;

    let path = store.path_of(&record.id);
    let mut json: serde_json::Value = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
    let edited = json["conteudoMarkdown"].as_str().unwrap().replace("Exposição total: 200", "Exposição total: 20");
    json["conteudoMarkdown"] = serde_json::Value::String(edited);
    std::fs::write(&path, serde_json::to_vec_pretty(&json).unwrap()).unwrap();

    let err = Distributor::new(store, Arc::new(JsonlAuditLog::new(&audit_path)))
        .export(&export_request(&record, ExportFormat::Text))
        .await
        .unwrap_err();

    match &err {
        EvidenceError::IntegrityMismatch { evidence_id, expected, actual } => {
            assert_eq!(*evidence_id, record.id);
            assert_eq!(expected, &record.content_hash);
            assert_ne!(actual, expected);
        }
        other => panic!("expected integrity mismatch, got {other:?}"),
    }
    assert!(err.to_string().contains("content changed since sealing"));
    assert!(!audit_path.exists());
}

#[tokio::test]
async fn records_are_append_only_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FsEvidenceStore::open(dir.path()).unwrap());
    let record = seal_scenario(store.clone(), &Scenario::single_critical_risk()).await;

    let mut clash = record.clone();
    clash.conteudo_markdown = "# outro\n".to_string();
    clash.content_hash = content_hash(&clash.conteudo_markdown);
    clash.snapshot_id = SnapshotId::new();
    assert!(store.insert(&clash).await.is_err());
    assert_eq!(store.get(&record.id).await.unwrap().unwrap(), record);

    let listed = store.list_for_company(&record.company_id).await.unwrap();
    assert_eq!(listed.len(), 1);
}
