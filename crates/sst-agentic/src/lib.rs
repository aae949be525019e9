#![deny(missing_docs)]

//! # sst-agentic — Compliance Agent Pipeline
//!
//! Sequentially composes three independent scoring stages (technical
//! exposure, legal compliance, fiscal risk) into one [`AgentDecision`], then
//! hands the decision to a [`DecisionLog`].
//!
//! ## Architecture
//!
//! - [`source`]: the injected data-access port. No global clients.
//! - [`context`]: the growing, borrow-checked stage context.
//! - [`agents`]: the three stages.
//! - [`pipeline`]: the orchestrator, its config, and its error type.
//! - [`audit`]: decision log port and adapters.

pub mod agents;
pub mod audit;
pub mod context;
pub mod pipeline;
pub mod source;

pub use agents::{
    AgentError, FineProbability, FiscalAgent, FiscalAssessment, LegalAgent, LegalAssessment,
    TechnicalAgent,
};
pub use audit::{DecisionEntry, DecisionLog, DecisionLogError, JsonlDecisionLog, MemoryDecisionLog};
pub use context::{EvaluationContext, LegalContext, TechnicalContext};
pub use pipeline::{
    AgentDecision, DecisionStatus, Pipeline, PipelineConfig, PipelineError, Stage,
    DEFAULT_CRITICAL_SCORE_THRESHOLD,
};
pub use source::{ComplianceDataSource, DataSourceError, InMemoryDataSource};
