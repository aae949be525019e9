//! # Compliance Data Source Port
//!
//! The pipeline never reaches for a shared client. Every run is handed a
//! [`ComplianceDataSource`] and reads its risk inventory and workforce
//! counts through it, so tests and the CLI substitute in-memory fixtures.

use std::collections::BTreeMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use sst_core::CompanyId;
use sst_exposure::{RiskRecord, WorkforceIndex};

/// Errors reading compliance data.
#[derive(Debug, thiserror::Error)]
pub enum DataSourceError {
    /// The data layer has no records for this company.
    #[error("no compliance data for company {0}")]
    UnknownCompany(CompanyId),

    /// The backing store failed.
    #[error("data source backend error: {0}")]
    Backend(String),
}

/// Read access to the records the technical stage evaluates.
#[async_trait]
pub trait ComplianceDataSource: Send + Sync {
    /// The company's current risk inventory.
    async fn fetch_risks(&self, company: &CompanyId) -> Result<Vec<RiskRecord>, DataSourceError>;

    /// Active worker counts by sector and role.
    async fn fetch_workforce(&self, company: &CompanyId) -> Result<WorkforceIndex, DataSourceError>;
}

#[derive(Debug, Clone, Default)]
struct CompanyRecords {
    risks: Vec<RiskRecord>,
    workforce: WorkforceIndex,
}

/// In-memory data source keyed by company.
#[derive(Debug, Default)]
pub struct InMemoryDataSource {
    companies: RwLock<BTreeMap<CompanyId, CompanyRecords>>,
}

impl InMemoryDataSource {
    /// Create an empty data source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a company's records.
    pub fn insert(&self, company: CompanyId, risks: Vec<RiskRecord>, workforce: WorkforceIndex) {
        self.companies
            .write()
            .insert(company, CompanyRecords { risks, workforce });
    }

    fn with_company<T>(
        &self,
        company: &CompanyId,
        f: impl FnOnce(&CompanyRecords) -> T,
    ) -> Result<T, DataSourceError> {
        self.companies
            .read()
            .get(company)
            .map(f)
            .ok_or_else(|| DataSourceError::UnknownCompany(company.clone()))
    }
}

#[async_trait]
impl ComplianceDataSource for InMemoryDataSource {
    async fn fetch_risks(&self, company: &CompanyId) -> Result<Vec<RiskRecord>, DataSourceError> {
        self.with_company(company, |c| c.risks.clone())
    }

    async fn fetch_workforce(&self, company: &CompanyId) -> Result<WorkforceIndex, DataSourceError> {
        self.with_company(company, |c| c.workforce.clone())
    }
}
