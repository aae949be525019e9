//! # CLI Configuration
//!
//! Optional YAML file passed with `--config`. Every field has a default, so
//! an empty file and no file at all behave the same.
//!
//! ```yaml
//! data_dir: /var/lib/sst
//! audit_log: /var/log/sst/audit.jsonl
//! engine_version: "1.4.0"
//! exposure:
//!   critical_threshold: 20
//! pipeline:
//!   critical_score_threshold: 70
//! layout:
//!   page_height: 842
//!   margin: 50
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use sst_agentic::PipelineConfig;
use sst_evidence::LayoutConfig;
use sst_exposure::ExposureConfig;

/// Engine version stamped into sealed evidence when none is configured.
pub const DEFAULT_ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Top-level CLI configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Root of the evidence store and decision log.
    pub data_dir: PathBuf,
    /// Export audit log; `<data_dir>/audit.jsonl` when unset.
    pub audit_log: Option<PathBuf>,
    /// Version recorded in evidence and audit entries.
    pub engine_version: String,
    /// Exposure engine tunables.
    pub exposure: ExposureConfig,
    /// Pipeline tunables.
    pub pipeline: PipelineConfig,
    /// Export page geometry.
    pub layout: LayoutConfig,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("sst-data"),
            audit_log: None,
            engine_version: DEFAULT_ENGINE_VERSION.to_string(),
            exposure: ExposureConfig::default(),
            pipeline: PipelineConfig::default(),
            layout: LayoutConfig::default(),
        }
    }
}

impl CliConfig {
    /// Load from `path`, or defaults when `None`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        Self::from_yaml(&text).with_context(|| format!("invalid config file: {}", path.display()))
    }

    /// Parse YAML; an empty document yields the defaults.
    pub fn from_yaml(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }

    /// Resolved export audit log path.
    pub fn audit_log_path(&self) -> PathBuf {
        self.audit_log
            .clone()
            .unwrap_or_else(|| self.data_dir.join("audit.jsonl"))
    }

    /// Pipeline decision log path.
    pub fn decision_log_path(&self) -> PathBuf {
        self.data_dir.join("decisions.jsonl")
    }
}
