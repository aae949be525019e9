//! # `sst pipeline`
//!
//! Runs the technical → legal → fiscal pipeline over a dataset and prints
//! the decision. Decisions are appended to `<data_dir>/decisions.jsonl` and
//! each run's exposure snapshot lands in `<data_dir>/snapshots/`.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Args;

use sst_agentic::{AgentDecision, EvaluationContext, JsonlDecisionLog, Pipeline, TechnicalAgent};
use sst_exposure::ExposureEngine;

use crate::commands::{print_json, snapshot_sink, DatasetArgs};
use crate::config::CliConfig;
use crate::dataset::ComplianceDataset;

/// Arguments of `sst pipeline`.
#[derive(Args, Debug)]
pub struct PipelineArgs {
    #[command(flatten)]
    pub input: DatasetArgs,
}

/// Run the pipeline for the dataset's company.
pub async fn run_dataset_pipeline(
    dataset: &ComplianceDataset,
    reference_date: NaiveDate,
    config: &CliConfig,
) -> Result<AgentDecision> {
    std::fs::create_dir_all(&config.data_dir)
        .with_context(|| format!("failed to create data directory: {}", config.data_dir.display()))?;

    let source = Arc::new(dataset.to_source());
    let log = Arc::new(JsonlDecisionLog::new(config.decision_log_path()));
    let mut technical = TechnicalAgent::new(source.clone(), ExposureEngine::new(config.exposure));
    if let Some(sink) = snapshot_sink(config) {
        technical = technical.with_snapshot_sink(sink);
    }
    let pipeline = Pipeline::new(source, log)
        .with_config(config.pipeline)
        .with_technical(technical);

    let ctx = EvaluationContext::new(dataset.company.id.clone(), reference_date);
    Ok(pipeline.run(&ctx).await?)
}

/// Execute `sst pipeline`.
pub async fn run_pipeline(args: &PipelineArgs, config: &CliConfig) -> Result<u8> {
    let (dataset, date) = args.input.load()?;
    let decision = run_dataset_pipeline(&dataset, date, config).await?;
    print_json(&decision)?;
    Ok(0)
}
