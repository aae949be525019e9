//! # `sst seal`, `sst verify`, `sst export`
//!
//! Evidence lives in the file-backed store under `<data_dir>/evidence/`.
//! Sealing first records the exposure snapshot the evidence is built from
//! under `<data_dir>/snapshots/`, so `snapshotId` resolves to a stored
//! snapshot unless that best-effort write failed.
//! Export verifies integrity first; a mismatch surfaces as
//! [`EvidenceError::IntegrityMismatch`] and maps to exit code 2.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::Args;

use sst_core::{ActorId, EvidenceId};
use sst_evidence::{
    verify_integrity, Distributor, EvidenceError, EvidenceRecord, EvidenceStore, ExportFormat, ExportOutcome,
    ExportRequest, FsEvidenceStore, GenerationMeta, JsonlAuditLog, Layout, ReportData, SealRequest, Sealer,
    Template, DEFAULT_TEMPLATE,
};
use sst_exposure::{persist_snapshot, ExposureSnapshot, SnapshotSink};

use crate::commands::state::evaluate_state;
use crate::commands::{snapshot_sink, DatasetArgs};
use crate::config::CliConfig;
use crate::dataset::ComplianceDataset;

/// Arguments of `sst seal`.
#[derive(Args, Debug)]
pub struct SealArgs {
    #[command(flatten)]
    pub input: DatasetArgs,

    /// Acting user recorded on the evidence.
    #[arg(long)]
    pub actor: String,

    /// Custom template file; the built-in PGR evidence template otherwise.
    #[arg(long)]
    pub template: Option<PathBuf>,
}

/// Arguments of `sst verify`.
#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Evidence identifier.
    pub id: String,
}

/// Arguments of `sst export`.
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Evidence identifier.
    pub id: String,

    /// Exporting user recorded in the audit log.
    #[arg(long)]
    pub actor: String,

    /// Output format: text or json.
    #[arg(long, default_value = "text")]
    pub format: ExportFormat,

    /// Write the export here instead of stdout.
    #[arg(long, short)]
    pub out: Option<PathBuf>,

    /// Client address recorded in the audit log.
    #[arg(long)]
    pub ip: Option<String>,

    /// Client user agent recorded in the audit log.
    #[arg(long)]
    pub user_agent: Option<String>,
}

fn open_store(config: &CliConfig) -> Result<Arc<FsEvidenceStore>> {
    let store = FsEvidenceStore::open(&config.data_dir)
        .with_context(|| format!("failed to open evidence store under {}", config.data_dir.display()))?;
    Ok(Arc::new(store))
}

// ---------------------------------------------------------------------------
// Seal
// ---------------------------------------------------------------------------

/// Evaluate a dataset, render the template, and seal the result.
pub async fn seal_dataset(
    dataset: &ComplianceDataset,
    reference_date: NaiveDate,
    actor: ActorId,
    template_source: Option<&str>,
    config: &CliConfig,
) -> Result<EvidenceRecord> {
    let template = Template::parse(template_source.unwrap_or(DEFAULT_TEMPLATE)).context("invalid evidence template")?;

    let (technical, state) = evaluate_state(dataset, config);
    let snapshot = ExposureSnapshot::capture(dataset.company.id.clone(), reference_date, technical);
    let meta = GenerationMeta {
        reference_date,
        generated_at: Utc::now(),
        engine_version: config.engine_version.clone(),
        generated_by: actor.clone(),
        snapshot_id: snapshot.id,
    };
    let report = ReportData::assemble(
        &dataset.company,
        &dataset.sectors,
        &dataset.workforce,
        &snapshot.result,
        Some(&state),
        &meta,
    );
    let bindings = report.to_bindings().context("failed to build template bindings")?;

    if let Some(sink) = snapshot_sink(config) {
        persist_snapshot(sink.as_ref(), &snapshot).await;
    }

    let sealer = Sealer::new(open_store(config)?);
    let record = sealer
        .seal(
            &template,
            &bindings,
            SealRequest {
                company_id: dataset.company.id.clone(),
                snapshot_id: snapshot.id,
                reference_date,
                engine_version: config.engine_version.clone(),
                created_by: actor,
            },
        )
        .await?;
    Ok(record)
}

/// Execute `sst seal`.
pub async fn run_seal(args: &SealArgs, config: &CliConfig) -> Result<u8> {
    let (dataset, date) = args.input.load()?;
    let actor = ActorId::new(args.actor.as_str())?;
    let template = match &args.template {
        Some(path) => Some(
            std::fs::read_to_string(path)
                .with_context(|| format!("failed to read template: {}", path.display()))?,
        ),
        None => None,
    };

    let record = seal_dataset(&dataset, date, actor, template.as_deref(), config).await?;
    println!("  evidence: {}", record.id);
    println!("  company:  {}", record.company_id);
    println!("  snapshot: {}", record.snapshot_id);
    println!("  sha256:   {}", record.content_hash);
    Ok(0)
}

// ---------------------------------------------------------------------------
// Verify
// ---------------------------------------------------------------------------

/// Load a record and check its integrity.
pub async fn verify_evidence(id: EvidenceId, config: &CliConfig) -> Result<EvidenceRecord> {
    let store = open_store(config)?;
    let record = store.get(&id).await?.ok_or(EvidenceError::NotFound(id))?;
    verify_integrity(&record)?;
    Ok(record)
}

/// Execute `sst verify`.
pub async fn run_verify(args: &VerifyArgs, config: &CliConfig) -> Result<u8> {
    let id = EvidenceId::parse(&args.id)?;
    let record = verify_evidence(id, config).await?;
    let snapshot = match snapshot_sink(config) {
        Some(sink) => match sink.fetch(&record.snapshot_id).await {
            Ok(Some(_)) => "stored",
            Ok(None) => "not found",
            Err(e) => {
                tracing::warn!(snapshot = %record.snapshot_id, error = %e, "snapshot lookup failed");
                "unreadable"
            }
        },
        None => "unavailable",
    };
    println!("  evidence: {}", record.id);
    println!("  sha256:   {}", record.content_hash);
    println!("  snapshot: {} ({snapshot})", record.snapshot_id);
    println!("  status:   intact");
    Ok(0)
}

// ---------------------------------------------------------------------------
// Export
// ---------------------------------------------------------------------------

/// Verify, lay out, finalize, and audit one export.
pub async fn export_evidence(request: &ExportRequest, config: &CliConfig) -> Result<ExportOutcome> {
    let audit = Arc::new(JsonlAuditLog::new(config.audit_log_path()));
    let distributor = Distributor::new(open_store(config)?, audit).with_layout(Layout::new(config.layout));
    Ok(distributor.export(request).await?)
}

/// Execute `sst export`.
pub async fn run_export(args: &ExportArgs, config: &CliConfig) -> Result<u8> {
    let request = ExportRequest {
        evidence_id: EvidenceId::parse(&args.id)?,
        actor_id: ActorId::new(args.actor.as_str())?,
        format: args.format,
        ip_address: args.ip.clone(),
        user_agent: args.user_agent.clone(),
    };
    let outcome = export_evidence(&request, config).await?;

    match &args.out {
        Some(path) => {
            std::fs::write(path, &outcome.bytes)
                .with_context(|| format!("failed to write export: {}", path.display()))?;
            println!("  exported: {}", path.display());
            println!("  pages:    {}", outcome.document.page_count());
        }
        None => {
            use std::io::Write;
            std::io::stdout().write_all(&outcome.bytes)?;
        }
    }
    Ok(0)
}
