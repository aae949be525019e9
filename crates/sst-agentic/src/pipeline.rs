//! # Agent Pipeline
//!
//! Strictly sequential composition:
//!
//! ```text
//! technical = TechnicalAgent(ctx)
//! legal     = LegalAgent(ctx + technical)
//! fiscal    = FiscalAgent(ctx + technical + legal)
//! decision  = { technical, legal, fiscal, status }
//! ```
//!
//! `status` is `CRITICAL` iff `fiscal.score` exceeds the configured
//! threshold (70 by default). With the current fiscal weights the score
//! peaks at exactly 70, so the default threshold never yields `CRITICAL`;
//! lower it in [`PipelineConfig`] to make the status reachable.
//!
//! ## Failure Semantics
//!
//! A failing stage aborts the run with [`PipelineError::StageFailed`]: no
//! partial decision is returned and nothing is logged.
//!
//! Recording the finished decision is a side effect that cannot fail the
//! run: a [`DecisionLog`] error is logged and dropped. The write is awaited
//! rather than spawned, so a decision returned by [`Pipeline::run`] is
//! already on the log, and a short-lived process (the CLI) cannot exit
//! with the write still pending. Log latency is therefore part of the run.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use sst_core::{sha256_digest, CanonicalBytes, CompanyId, ContentDigest, SnapshotId};
use sst_exposure::{ExposureEngine, TechnicalExposureResult};

use crate::agents::{
    AgentError, FiscalAgent, FiscalAssessment, LegalAgent, LegalAssessment, TechnicalAgent,
};
use crate::audit::DecisionLog;
use crate::context::EvaluationContext;
use crate::source::ComplianceDataSource;

/// Default fiscal score above which a decision is `CRITICAL`.
pub const DEFAULT_CRITICAL_SCORE_THRESHOLD: u32 = 70;

// ---------------------------------------------------------------------------
// Config & errors
// ---------------------------------------------------------------------------

/// Pipeline tunables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Fiscal score strictly above which the status is `CRITICAL`.
    pub critical_score_threshold: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            critical_score_threshold: DEFAULT_CRITICAL_SCORE_THRESHOLD,
        }
    }
}

/// Pipeline stage names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Exposure evaluation.
    Technical,
    /// Compliance gap analysis.
    Legal,
    /// Fine-risk scoring.
    Fiscal,
}

impl Stage {
    /// Stage name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Technical => "technical",
            Self::Legal => "legal",
            Self::Fiscal => "fiscal",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors from a pipeline run.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// A scoring stage failed; fix the upstream data and re-run.
    #[error("{stage} stage failed: {source}")]
    StageFailed {
        /// The stage that failed.
        stage: Stage,
        /// Underlying failure.
        #[source]
        source: AgentError,
    },
}

impl PipelineError {
    /// The stage that failed.
    pub fn stage(&self) -> Stage {
        match self {
            Self::StageFailed { stage, .. } => *stage,
        }
    }
}

fn at(stage: Stage) -> impl FnOnce(AgentError) -> PipelineError {
    move |source| PipelineError::StageFailed { stage, source }
}

// ---------------------------------------------------------------------------
// Decision
// ---------------------------------------------------------------------------

/// Overall verdict of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DecisionStatus {
    /// Fiscal score within tolerance.
    Ok,
    /// Fiscal score above the critical threshold.
    Critical,
}

impl DecisionStatus {
    /// Wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for DecisionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The composed output of one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentDecision {
    /// Company evaluated.
    pub company_id: CompanyId,
    /// Exposure snapshot the technical stage captured.
    pub snapshot_id: SnapshotId,
    /// Technical stage output.
    pub technical: TechnicalExposureResult,
    /// Legal stage output.
    pub legal: LegalAssessment,
    /// Fiscal stage output.
    pub fiscal: FiscalAssessment,
    /// Overall verdict.
    pub status: DecisionStatus,
    /// When the decision was composed.
    pub evaluated_at: DateTime<Utc>,
}

impl AgentDecision {
    /// Content digest of the decision.
    ///
    /// `None` when canonicalization fails (free-form risk fields holding
    /// floats, for instance).
    pub fn digest(&self) -> Option<ContentDigest> {
        match CanonicalBytes::new(self) {
            Ok(canonical) => Some(sha256_digest(&canonical)),
            Err(e) => {
                tracing::warn!(company = %self.company_id, error = %e, "decision canonicalization failed, digest unavailable");
                None
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// The orchestrator. Holds injected ports and configuration only.
pub struct Pipeline {
    technical: TechnicalAgent,
    legal: LegalAgent,
    fiscal: FiscalAgent,
    log: Arc<dyn DecisionLog>,
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a pipeline reading from `source` and recording into `log`.
    pub fn new(source: Arc<dyn ComplianceDataSource>, log: Arc<dyn DecisionLog>) -> Self {
        Self {
            technical: TechnicalAgent::new(source, ExposureEngine::default()),
            legal: LegalAgent,
            fiscal: FiscalAgent,
            log,
            config: PipelineConfig::default(),
        }
    }

    /// Override pipeline tunables.
    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the technical agent, e.g. to change engine config or attach
    /// a snapshot sink.
    pub fn with_technical(mut self, technical: TechnicalAgent) -> Self {
        self.technical = technical;
        self
    }

    /// Active configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run every stage in order and record the decision.
    pub async fn run(&self, ctx: &EvaluationContext) -> Result<AgentDecision, PipelineError> {
        tracing::debug!(company = %ctx.company_id, date = %ctx.reference_date, "pipeline run started");

        let snapshot = self.technical.run(ctx).await.map_err(at(Stage::Technical))?;
        let technical_ctx = ctx.with_technical(&snapshot.result);

        let legal = self.legal.run(technical_ctx).map_err(at(Stage::Legal))?;
        let fiscal = self
            .fiscal
            .run(technical_ctx.with_legal(&legal))
            .map_err(at(Stage::Fiscal))?;

        let status = if fiscal.score > self.config.critical_score_threshold {
            DecisionStatus::Critical
        } else {
            DecisionStatus::Ok
        };

        let decision = AgentDecision {
            company_id: ctx.company_id.clone(),
            snapshot_id: snapshot.id,
            technical: snapshot.result,
            legal,
            fiscal,
            status,
            evaluated_at: Utc::now(),
        };

        // Awaited: the decision is on the log before the caller sees it.
        if let Err(e) = self.log.record(&decision).await {
            tracing::warn!(company = %decision.company_id, error = %e, "decision log write failed, returning decision");
        }

        tracing::info!(company = %decision.company_id, status = %decision.status, score = decision.fiscal.score, "pipeline decision composed");
        Ok(decision)
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("technical", &self.technical)
            .field("config", &self.config)
            .finish()
    }
}
