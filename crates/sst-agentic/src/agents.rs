//! # Scoring Agents
//!
//! Three independent stages, run in order by the pipeline:
//!
//! 1. **Technical** — reads the inventory and workforce through the data
//!    source port, runs the exposure engine, and captures the day's
//!    exposure snapshot.
//!
//! 2. **Legal** — flags a company with no risk inventory at all. Each
//!    issue adds 20 points of legal risk. Unrated risks (severity or
//!    probability absent) rate 0 and are not an issue.
//!
//! 3. **Fiscal** — scores the likelihood of a fine: +40 when not legally
//!    compliant, +30 when any risk is critical. Above 50 the probability
//!    is `ALTA`.
//!
//! Legal and fiscal stages are pure. They reject a technical result whose
//! counts disagree with its own inventory instead of scoring it.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use sst_exposure::{
    persist_snapshot, ExposureEngine, ExposureSnapshot, SnapshotSink, TechnicalExposureResult,
};

use crate::context::{EvaluationContext, LegalContext, TechnicalContext};
use crate::source::{ComplianceDataSource, DataSourceError};

/// Legal risk points per issue.
pub const LEGAL_RISK_PER_ISSUE: u32 = 20;

/// Fiscal score added when the company is not legally compliant.
pub const NON_COMPLIANCE_WEIGHT: u32 = 40;

/// Fiscal score added when any risk is critical.
pub const CRITICAL_RISK_WEIGHT: u32 = 30;

/// Fiscal score above which a fine is likely.
pub const HIGH_FINE_THRESHOLD: u32 = 50;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Failure inside a single stage.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    /// Reading compliance data failed.
    #[error(transparent)]
    DataSource(#[from] DataSourceError),

    /// A prior stage produced a result that contradicts itself.
    #[error("inconsistent technical result: {0}")]
    InconsistentInput(String),
}

// ---------------------------------------------------------------------------
// Technical
// ---------------------------------------------------------------------------

/// Runs the exposure engine over data fetched through the port.
pub struct TechnicalAgent {
    source: Arc<dyn ComplianceDataSource>,
    engine: ExposureEngine,
    snapshots: Option<Arc<dyn SnapshotSink>>,
}

impl TechnicalAgent {
    /// Create a technical agent reading from `source`.
    pub fn new(source: Arc<dyn ComplianceDataSource>, engine: ExposureEngine) -> Self {
        Self {
            source,
            engine,
            snapshots: None,
        }
    }

    /// Persist each run's snapshot to `sink`, best-effort.
    pub fn with_snapshot_sink(mut self, sink: Arc<dyn SnapshotSink>) -> Self {
        self.snapshots = Some(sink);
        self
    }

    /// Fetch, evaluate, and snapshot.
    pub async fn run(&self, ctx: &EvaluationContext) -> Result<ExposureSnapshot, AgentError> {
        let risks = self.source.fetch_risks(&ctx.company_id).await?;
        let workforce = self.source.fetch_workforce(&ctx.company_id).await?;
        let result = self.engine.evaluate(&risks, &workforce);

        let snapshot = ExposureSnapshot::capture(ctx.company_id.clone(), ctx.reference_date, result);
        if let Some(sink) = &self.snapshots {
            persist_snapshot(sink.as_ref(), &snapshot).await;
        }
        Ok(snapshot)
    }
}

impl fmt::Debug for TechnicalAgent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TechnicalAgent")
            .field("engine", &self.engine)
            .field("snapshots", &self.snapshots.is_some())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Legal
// ---------------------------------------------------------------------------

/// Outcome of the legal stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegalAssessment {
    /// True iff no issue was found.
    pub compliant: bool,
    /// Human-readable compliance gaps.
    pub issues: Vec<String>,
    /// `issues × 20`.
    pub legal_risk: u32,
}

/// Checks the risk inventory for compliance gaps.
#[derive(Debug, Clone, Copy, Default)]
pub struct LegalAgent;

impl LegalAgent {
    /// Assess the technical result.
    pub fn run(&self, ctx: TechnicalContext<'_>) -> Result<LegalAssessment, AgentError> {
        let technical = ctx.technical;
        if technical.total_risks != technical.inventory.len() {
            return Err(AgentError::InconsistentInput(format!(
                "riscosCount is {} but the inventory holds {} entries",
                technical.total_risks,
                technical.inventory.len()
            )));
        }

        let mut issues = Vec::new();
        if technical.inventory.is_empty() {
            issues.push(
                "Inventário de riscos inexistente: nenhum risco ocupacional mapeado (NR-01)."
                    .to_string(),
            );
        }

        let legal_risk = u32::try_from(issues.len())
            .unwrap_or(u32::MAX)
            .saturating_mul(LEGAL_RISK_PER_ISSUE);
        tracing::debug!(company = %ctx.base.company_id, issues = issues.len(), legal_risk, "legal stage complete");

        Ok(LegalAssessment {
            compliant: issues.is_empty(),
            issues,
            legal_risk,
        })
    }
}

// ---------------------------------------------------------------------------
// Fiscal
// ---------------------------------------------------------------------------

/// Likelihood of a regulatory fine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FineProbability {
    /// Score above the high-fine threshold.
    Alta,
    /// Everything else.
    Baixa,
}

impl FineProbability {
    /// Wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Alta => "ALTA",
            Self::Baixa => "BAIXA",
        }
    }
}

impl fmt::Display for FineProbability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of the fiscal stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FiscalAssessment {
    /// Fine-risk score.
    pub score: u32,
    /// Classification of the score.
    pub probability_of_fine: FineProbability,
}

/// Scores fine risk from the legal and technical outcomes.
#[derive(Debug, Clone, Copy, Default)]
pub struct FiscalAgent;

impl FiscalAgent {
    /// Score the accumulated context.
    pub fn run(&self, ctx: LegalContext<'_>) -> Result<FiscalAssessment, AgentError> {
        check_criticality(ctx.technical)?;

        let mut score = 0u32;
        if !ctx.legal.compliant {
            score += NON_COMPLIANCE_WEIGHT;
        }
        if ctx.technical.critical_risks > 0 {
            score += CRITICAL_RISK_WEIGHT;
        }
        let probability_of_fine = if score > HIGH_FINE_THRESHOLD {
            FineProbability::Alta
        } else {
            FineProbability::Baixa
        };
        tracing::debug!(company = %ctx.base.company_id, score, probability = %probability_of_fine, "fiscal stage complete");

        Ok(FiscalAssessment {
            score,
            probability_of_fine,
        })
    }
}

fn check_criticality(technical: &TechnicalExposureResult) -> Result<(), AgentError> {
    if technical.critical_risks > technical.total_risks {
        return Err(AgentError::InconsistentInput(format!(
            "{} critical risks out of {} total",
            technical.critical_risks, technical.total_risks
        )));
    }
    if technical.is_critical != (technical.critical_risks > 0) {
        return Err(AgentError::InconsistentInput(format!(
            "isCritico is {} with {} critical risks",
            technical.is_critical, technical.critical_risks
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use sst_core::{CompanyId, RiskId, SectorId};
    use sst_exposure::{MemorySnapshotSink, Ordinal, RiskRecord, SnapshotSink, WorkforceIndex};

    use crate::source::InMemoryDataSource;

    fn ctx() -> EvaluationContext {
        EvaluationContext::new(
            CompanyId::new("acme").unwrap(),
            NaiveDate::from_ymd_opt(2026, 5, 4).unwrap(),
        )
    }

    fn evaluate(risks: &[RiskRecord], workers: u64) -> TechnicalExposureResult {
        let mut wf = WorkforceIndex::default();
        wf.by_sector.insert(SectorId::new("S").unwrap(), workers);
        ExposureEngine::default().evaluate(risks, &wf)
    }

    fn risk(id: &str, sev: u32, prob: u32) -> RiskRecord {
        RiskRecord::new(RiskId::new(id).unwrap(), Some(SectorId::new("S").unwrap()), sev, prob)
    }

    #[test]
    fn empty_inventory_yields_exactly_one_issue() {
        let base = ctx();
        let technical = TechnicalExposureResult::default();
        let legal = LegalAgent.run(base.with_technical(&technical)).unwrap();
        assert!(!legal.compliant);
        assert_eq!(legal.issues.len(), 1);
        assert_eq!(legal.legal_risk, 20);

        let fiscal = FiscalAgent
            .run(base.with_technical(&technical).with_legal(&legal))
            .unwrap();
        assert_eq!(fiscal.score, 40);
        assert_eq!(fiscal.probability_of_fine, FineProbability::Baixa);
    }

    #[test]
    fn unrated_risks_are_not_a_legal_issue() {
        let base = ctx();
        let unrated = RiskRecord::new(
            RiskId::new("r1").unwrap(),
            Some(SectorId::new("S").unwrap()),
            4u32,
            Ordinal::absent(),
        );
        let technical = evaluate(&[unrated, risk("r2", 0, 3)], 10);
        assert_eq!(technical.inventory[0].rating, 0);

        let legal = LegalAgent.run(base.with_technical(&technical)).unwrap();
        assert!(legal.compliant);
        assert!(legal.issues.is_empty());
        assert_eq!(legal.legal_risk, 0);

        let fiscal = FiscalAgent
            .run(base.with_technical(&technical).with_legal(&legal))
            .unwrap();
        assert_eq!(fiscal.score, 0);
        assert_eq!(fiscal.probability_of_fine, FineProbability::Baixa);
    }

    #[test]
    fn non_compliance_and_criticality_cross_the_fine_threshold() {
        // The legal stage only flags an empty inventory, which cannot hold a
        // critical risk; score the fiscal weights directly.
        let base = ctx();
        let technical = evaluate(&[risk("r1", 5, 5)], 2);
        let legal = LegalAssessment {
            compliant: false,
            issues: vec!["Inventário de riscos inexistente.".into()],
            legal_risk: LEGAL_RISK_PER_ISSUE,
        };

        let fiscal = FiscalAgent
            .run(base.with_technical(&technical).with_legal(&legal))
            .unwrap();
        assert_eq!(fiscal.score, 70);
        assert_eq!(fiscal.probability_of_fine, FineProbability::Alta);
    }

    #[test]
    fn rated_inventory_is_compliant() {
        let base = ctx();
        let technical = evaluate(&[risk("r1", 2, 3)], 4);
        let legal = LegalAgent.run(base.with_technical(&technical)).unwrap();
        assert!(legal.compliant);
        assert_eq!(legal.legal_risk, 0);

        let fiscal = FiscalAgent
            .run(base.with_technical(&technical).with_legal(&legal))
            .unwrap();
        assert_eq!(fiscal.score, 0);
    }

    #[test]
    fn critical_only_stays_below_threshold() {
        let base = ctx();
        let technical = evaluate(&[risk("r1", 4, 5)], 10);
        let legal = LegalAgent.run(base.with_technical(&technical)).unwrap();
        let fiscal = FiscalAgent
            .run(base.with_technical(&technical).with_legal(&legal))
            .unwrap();
        assert_eq!(fiscal.score, 30);
        assert_eq!(fiscal.probability_of_fine, FineProbability::Baixa);
    }

    #[test]
    fn legal_rejects_count_mismatch() {
        let base = ctx();
        let technical = TechnicalExposureResult {
            total_risks: 3,
            ..Default::default()
        };
        let err = LegalAgent.run(base.with_technical(&technical)).unwrap_err();
        assert!(matches!(err, AgentError::InconsistentInput(_)));
    }

    #[test]
    fn fiscal_rejects_contradictory_criticality() {
        let base = ctx();
        let technical = TechnicalExposureResult {
            is_critical: true,
            ..Default::default()
        };
        let legal = LegalAssessment {
            compliant: true,
            issues: vec![],
            legal_risk: 0,
        };
        let err = FiscalAgent
            .run(base.with_technical(&technical).with_legal(&legal))
            .unwrap_err();
        assert!(err.to_string().contains("isCritico"));
    }

    #[tokio::test]
    async fn technical_agent_evaluates_and_snapshots() {
        let source = Arc::new(InMemoryDataSource::new());
        let mut wf = WorkforceIndex::default();
        wf.by_sector.insert(SectorId::new("S").unwrap(), 10);
        source.insert(ctx().company_id, vec![risk("r1", 4, 5)], wf);
        let sink = Arc::new(MemorySnapshotSink::new());

        let agent = TechnicalAgent::new(source, ExposureEngine::default())
            .with_snapshot_sink(sink.clone());
        let snapshot = agent.run(&ctx()).await.unwrap();

        assert_eq!(snapshot.result.total_exposure, 200);
        assert_eq!(sink.len(), 1);
        let stored = sink.fetch(&snapshot.id).await.unwrap().unwrap();
        assert_eq!(stored, snapshot);
    }

    #[tokio::test]
    async fn technical_agent_surfaces_data_errors() {
        let agent = TechnicalAgent::new(Arc::new(InMemoryDataSource::new()), ExposureEngine::default());
        let err = agent.run(&ctx()).await.unwrap_err();
        assert!(matches!(err, AgentError::DataSource(DataSourceError::UnknownCompany(_))));
    }
}
