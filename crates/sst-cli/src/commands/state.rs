//! # `sst state`
//!
//! Combines a dataset's structural indicators with its exposure result and
//! prints the regulatory state.

use anyhow::Result;
use clap::Args;

use sst_exposure::TechnicalExposureResult;
use sst_state::{RegulatorySnapshot, RegulatoryStateResult};

use crate::commands::exposure::evaluate_exposure;
use crate::commands::{print_json, DatasetArgs};
use crate::config::CliConfig;
use crate::dataset::ComplianceDataset;

/// Arguments of `sst state`.
#[derive(Args, Debug)]
pub struct StateArgs {
    #[command(flatten)]
    pub input: DatasetArgs,
}

/// Evaluate exposure, then the regulatory state.
pub fn evaluate_state(
    dataset: &ComplianceDataset,
    config: &CliConfig,
) -> (TechnicalExposureResult, RegulatoryStateResult) {
    let technical = evaluate_exposure(dataset, config);
    let snapshot = RegulatorySnapshot::assemble(dataset.structure(), &technical);
    let state = sst_state::evaluate(&snapshot);
    (technical, state)
}

/// Execute `sst state`.
pub fn run_state(args: &StateArgs, config: &CliConfig) -> Result<u8> {
    let (dataset, _) = args.input.load()?;
    let (_, state) = evaluate_state(&dataset, config);
    tracing::debug!(company = %dataset.company.id, state = state.state.as_str(), progress = state.progress, "regulatory state evaluated");
    print_json(&state)?;
    Ok(0)
}
