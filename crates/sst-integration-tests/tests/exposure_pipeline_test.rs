//! Exposure → regulatory state → agent pipeline, across crates.
//!
//! Scenario: one sector, one risk rated severity 4 × probability 5, ten
//! workers. The risk rates 20, exposes 200, and is critical; the state
//! machine holds the company in GRO_EM_ANDAMENTO on the critical alert and
//! the pipeline scores 30 (compliant, critical risk present).

mod common;

use std::sync::Arc;

use proptest::prelude::*;

use sst_agentic::{
    DecisionStatus, EvaluationContext, FineProbability, InMemoryDataSource, MemoryDecisionLog, Pipeline,
    PipelineError, Stage, TechnicalAgent,
};
use sst_core::{CompanyId, RiskId, SectorId};
use sst_exposure::{ExposureEngine, MemorySnapshotSink, RiskRecord, SnapshotSink, WorkforceIndex};
use sst_state::{Gate, RegulatorySnapshot, RegulatoryState, StructuralIndicators};

use common::{reference_date, Scenario};

#[test]
fn single_critical_risk_rates_twenty_and_exposes_two_hundred() {
    let s = Scenario::single_critical_risk();
    let result = ExposureEngine::default().evaluate(&s.risks, &s.workforce);

    assert_eq!(result.total_risks, 1);
    assert_eq!(result.critical_risks, 1);
    assert_eq!(result.total_exposure, 200);
    assert!(result.is_critical);
    assert_eq!(result.inventory[0].rating, 20);
    assert_eq!(result.inventory[0].exposure, 200);
    assert_eq!(result.exposure_by_sector.values().copied().collect::<Vec<_>>(), vec![200]);
}

#[test]
fn critical_exposure_holds_state_in_progress() {
    let s = Scenario::single_critical_risk();
    let technical = ExposureEngine::default().evaluate(&s.risks, &s.workforce);
    let state = sst_state::evaluate(&RegulatorySnapshot::assemble(s.structure, &technical));

    assert_eq!(state.state, RegulatoryState::GroEmAndamento);
    assert_eq!(state.blocking_gate, Some(Gate::NoCriticalAlerts));
    assert_eq!(state.progress, 85);
    assert!(state.next_step.contains('1'));
}

#[test]
fn clearing_every_gate_reaches_gold() {
    let mut s = Scenario::single_critical_risk();
    s.risks[0].probability = 2u32.into();
    let technical = ExposureEngine::default().evaluate(&s.risks, &s.workforce);
    assert!(!technical.is_critical);

    let state = sst_state::evaluate(&RegulatorySnapshot::assemble(s.structure, &technical));
    assert_eq!(state.state, RegulatoryState::ConformeOuro);
    assert_eq!(state.progress, 100);
    assert!(state.blocking_gate.is_none());
}

#[tokio::test]
async fn pipeline_composes_all_stages() {
    let s = Scenario::single_critical_risk();
    let source = Arc::new(InMemoryDataSource::new());
    source.insert(s.company.id.clone(), s.risks.clone(), s.workforce.clone());
    let log = Arc::new(MemoryDecisionLog::new());
    let snapshots = Arc::new(MemorySnapshotSink::new());

    let pipeline = Pipeline::new(source.clone(), log.clone())
        .with_technical(TechnicalAgent::new(source, ExposureEngine::default()).with_snapshot_sink(snapshots.clone()));
    let decision = pipeline
        .run(&EvaluationContext::new(s.company.id.clone(), reference_date()))
        .await
        .unwrap();

    assert_eq!(decision.technical.total_exposure, 200);
    assert!(decision.legal.compliant);
    assert_eq!(decision.legal.legal_risk, 0);
    assert_eq!(decision.fiscal.score, 30);
    assert_eq!(decision.fiscal.probability_of_fine, FineProbability::Baixa);
    assert_eq!(decision.status, DecisionStatus::Ok);

    let stored = snapshots.latest(&s.company.id, reference_date()).await.unwrap().unwrap();
    assert_eq!(stored.id, decision.snapshot_id);

    let entries = log.entries_for_company(&s.company.id);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].snapshot_id, decision.snapshot_id);
}

#[tokio::test]
async fn empty_inventory_is_non_compliant() {
    let company = CompanyId::new("vazia").unwrap();
    let source = Arc::new(InMemoryDataSource::new());
    source.insert(company.clone(), Vec::new(), WorkforceIndex::default());

    let decision = Pipeline::new(source, Arc::new(MemoryDecisionLog::new()))
        .run(&EvaluationContext::new(company, reference_date()))
        .await
        .unwrap();

    assert!(!decision.legal.compliant);
    assert_eq!(decision.legal.issues.len(), 1);
    assert_eq!(decision.legal.legal_risk, 20);
    assert_eq!(decision.fiscal.score, 40);
}

#[tokio::test]
async fn unknown_company_fails_at_technical_stage() {
    let log = Arc::new(MemoryDecisionLog::new());
    let err = Pipeline::new(Arc::new(InMemoryDataSource::new()), log.clone())
        .run(&EvaluationContext::new(CompanyId::new("ninguem").unwrap(), reference_date()))
        .await
        .unwrap_err();

    assert_eq!(err.stage(), Stage::Technical);
    assert!(matches!(err, PipelineError::StageFailed { .. }));
    assert!(log.is_empty());
}

proptest! {
    #[test]
    fn critical_flag_agrees_with_count(
        ratings in prop::collection::vec((0u32..=5, 0u32..=5, 0u64..50), 0..20),
    ) {
        let sector = SectorId::new("s").unwrap();
        let mut workforce = WorkforceIndex::default();
        let mut risks = Vec::new();
        for (i, (sev, prob, workers)) in ratings.iter().enumerate() {
            let sector_i = SectorId::new(format!("s{i}")).unwrap();
            workforce.by_sector.insert(sector_i.clone(), *workers);
            risks.push(RiskRecord::new(RiskId::new(format!("r{i}")).unwrap(), Some(sector_i), *sev, *prob));
        }
        risks.push(RiskRecord::new(RiskId::new("unmapped").unwrap(), None, 5u32, 5u32));
        workforce.by_sector.insert(sector, 7);

        let result = ExposureEngine::default().evaluate(&risks, &workforce);
        prop_assert_eq!(result.is_critical, result.critical_risks > 0);
        prop_assert_eq!(result.total_exposure, result.inventory.iter().map(|r| r.exposure).sum::<u64>());
        prop_assert_eq!(result.total_exposure, result.exposure_by_sector.values().sum::<u64>());

        let state = sst_state::evaluate(&RegulatorySnapshot::assemble(
            StructuralIndicators { company_verified: true, ..StructuralIndicators::default() },
            &result,
        ));
        prop_assert!(state.progress <= 100);
    }
}
