//! # Compliance Datasets
//!
//! JSON input shared by every evaluating subcommand: one company with its
//! sectors, risk inventory, workforce index, and structural indicators.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use sst_agentic::InMemoryDataSource;
use sst_evidence::{CompanyProfile, SectorProfile};
use sst_exposure::{sectors_without_risks, RiskRecord, WorkforceIndex};
use sst_state::StructuralIndicators;

/// One company's compliance data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceDataset {
    /// Company identity.
    pub company: CompanyProfile,
    /// Registered sectors.
    #[serde(default)]
    pub sectors: Vec<SectorProfile>,
    /// Risk inventory.
    #[serde(default)]
    pub risks: Vec<RiskRecord>,
    /// Active workers per sector and role.
    #[serde(default)]
    pub workforce: WorkforceIndex,
    /// Structural indicators for the regulatory state machine.
    #[serde(default)]
    pub structure: StructuralIndicators,
    /// Day the data represents; the command line or today when absent.
    #[serde(default)]
    pub reference_date: Option<NaiveDate>,
}

impl ComplianceDataset {
    /// Load a dataset from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let bytes =
            std::fs::read(path).with_context(|| format!("failed to read dataset: {}", path.display()))?;
        serde_json::from_slice(&bytes).with_context(|| format!("invalid dataset: {}", path.display()))
    }

    /// Structural indicators with sector counts filled from the dataset
    /// when the file leaves them at zero.
    pub fn structure(&self) -> StructuralIndicators {
        let mut structure = self.structure;
        if structure.sector_count == 0 {
            structure.sector_count = u32::try_from(self.sectors.len()).unwrap_or(u32::MAX);
        }
        if structure.sectors_without_risks == 0 && !self.sectors.is_empty() {
            let uncovered = sectors_without_risks(self.sectors.iter().map(|s| &s.id), &self.risks);
            structure.sectors_without_risks = u32::try_from(uncovered).unwrap_or(u32::MAX);
        }
        if structure.employee_count == 0 {
            structure.employee_count = u32::try_from(self.workforce.total_workers()).unwrap_or(u32::MAX);
        }
        structure
    }

    /// Reference date: explicit override, then the dataset, then today.
    pub fn reference_date(&self, override_date: Option<NaiveDate>) -> NaiveDate {
        override_date
            .or(self.reference_date)
            .unwrap_or_else(|| chrono::Utc::now().date_naive())
    }

    /// In-memory data source serving this dataset.
    pub fn to_source(&self) -> InMemoryDataSource {
        let source = InMemoryDataSource::new();
        source.insert(self.company.id.clone(), self.risks.clone(), self.workforce.clone());
        source
    }
}
