//! Subcommand handlers. Each handler returns the process exit code.

pub mod evidence;
pub mod exposure;
pub mod pipeline;
pub mod state;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use chrono::NaiveDate;
use clap::Args;
use serde::Serialize;

use sst_exposure::FsSnapshotSink;

use crate::config::CliConfig;
use crate::dataset::ComplianceDataset;

/// Dataset input shared by the evaluating subcommands.
#[derive(Args, Debug, Clone)]
pub struct DatasetArgs {
    /// Path to a JSON compliance dataset.
    #[arg(long)]
    pub dataset: PathBuf,

    /// Reference date (YYYY-MM-DD); defaults to the dataset's, then today.
    #[arg(long)]
    pub date: Option<NaiveDate>,
}

impl DatasetArgs {
    /// Load the dataset and resolve the reference date.
    pub fn load(&self) -> Result<(ComplianceDataset, NaiveDate)> {
        let dataset = ComplianceDataset::load(&self.dataset)?;
        let date = dataset.reference_date(self.date);
        Ok((dataset, date))
    }
}

/// Pretty-print a value as JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Snapshot history under `<data_dir>/snapshots/`.
///
/// Snapshot persistence never fails a command: when the directory cannot
/// be opened this warns and returns `None`.
pub fn snapshot_sink(config: &CliConfig) -> Option<Arc<FsSnapshotSink>> {
    match FsSnapshotSink::open(&config.data_dir) {
        Ok(sink) => Some(Arc::new(sink)),
        Err(e) => {
            tracing::warn!(data_dir = %config.data_dir.display(), error = %e, "snapshot history unavailable");
            None
        }
    }
}
