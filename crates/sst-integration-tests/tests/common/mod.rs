//! Shared fixtures for the cross-crate integration tests.

#![allow(dead_code)]

use chrono::NaiveDate;

use sst_core::{CompanyId, RiskId, SectorId};
use sst_evidence::{CompanyProfile, SectorProfile};
use sst_exposure::{RiskRecord, WorkforceIndex};
use sst_state::StructuralIndicators;

/// Reference date used across scenarios.
pub fn reference_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 31).unwrap()
}

/// A small metalworking company.
pub struct Scenario {
    /// Company identity.
    pub company: CompanyProfile,
    /// Registered sectors.
    pub sectors: Vec<SectorProfile>,
    /// Risk inventory.
    pub risks: Vec<RiskRecord>,
    /// Workforce index.
    pub workforce: WorkforceIndex,
    /// Structural indicators.
    pub structure: StructuralIndicators,
}

impl Scenario {
    /// One sector, one risk rated 4 × 5, ten workers.
    pub fn single_critical_risk() -> Self {
        let sector = SectorId::new("solda").unwrap();
        let mut risk = RiskRecord::new(RiskId::new("r-fumos").unwrap(), Some(sector.clone()), 4u32, 5u32);
        risk.hazard = Some("Fumos metálicos".to_string());
        risk.source = Some("Soldagem MIG".to_string());

        let mut workforce = WorkforceIndex::default();
        workforce.by_sector.insert(sector.clone(), 10);
        workforce.by_role.insert("Soldador".to_string(), 10);

        Self {
            company: CompanyProfile {
                id: CompanyId::new("metal-alfa").unwrap(),
                razao_social: "Metalúrgica Alfa Ltda".to_string(),
                cnpj: Some("12.345.678/0001-90".to_string()),
                cnae: None,
                grau_risco: Some(3),
            },
            sectors: vec![SectorProfile {
                id: sector,
                nome: "Solda".to_string(),
            }],
            risks: vec![risk],
            workforce,
            structure: StructuralIndicators {
                company_verified: true,
                sector_count: 1,
                employee_count: 10,
                sectors_without_risks: 0,
                pgr_active: true,
                ..StructuralIndicators::default()
            },
        }
    }

    /// Enough sectors and risks to fill several pages.
    pub fn large_inventory(sectors: usize, risks_per_sector: usize) -> Self {
        let mut scenario = Self::single_critical_risk();
        scenario.sectors.clear();
        scenario.risks.clear();
        scenario.workforce = WorkforceIndex::default();
        for s in 0..sectors {
            let sector = SectorId::new(format!("setor-{s:03}")).unwrap();
            scenario.sectors.push(SectorProfile {
                id: sector.clone(),
                nome: format!("Setor {s}"),
            });
            scenario.workforce.by_sector.insert(sector.clone(), 3 + s as u64);
            for r in 0..risks_per_sector {
                let severity = 1 + (r % 5) as u32;
                let probability = 1 + ((s + r) % 5) as u32;
                let mut risk = RiskRecord::new(
                    RiskId::new(format!("r-{s:03}-{r:02}")).unwrap(),
                    Some(sector.clone()),
                    severity,
                    probability,
                );
                risk.hazard = Some(format!("Perigo {r} | agente físico"));
                scenario.risks.push(risk);
            }
        }
        scenario.structure.sector_count = sectors as u32;
        scenario.structure.employee_count = scenario.workforce.total_workers() as u32;
        scenario
    }
}
