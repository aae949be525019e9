//! # `sst exposure`
//!
//! Evaluates a dataset's risk inventory and prints the technical exposure
//! result.

use anyhow::Result;
use clap::Args;

use sst_exposure::{ExposureEngine, TechnicalExposureResult};

use crate::commands::{print_json, DatasetArgs};
use crate::config::CliConfig;
use crate::dataset::ComplianceDataset;

/// Arguments of `sst exposure`.
#[derive(Args, Debug)]
pub struct ExposureArgs {
    #[command(flatten)]
    pub input: DatasetArgs,
}

/// Run the exposure engine over a dataset.
pub fn evaluate_exposure(dataset: &ComplianceDataset, config: &CliConfig) -> TechnicalExposureResult {
    ExposureEngine::new(config.exposure).evaluate(&dataset.risks, &dataset.workforce)
}

/// Execute `sst exposure`.
pub fn run_exposure(args: &ExposureArgs, config: &CliConfig) -> Result<u8> {
    let (dataset, _) = args.input.load()?;
    let result = evaluate_exposure(&dataset, config);
    tracing::debug!(
        company = %dataset.company.id,
        risks = result.total_risks,
        critical = result.critical_risks,
        "exposure evaluated"
    );
    print_json(&result)?;
    Ok(0)
}
