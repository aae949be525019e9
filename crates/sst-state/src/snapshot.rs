//! # Regulatory Snapshot
//!
//! The flat set of booleans and counts the state machine reads. Recomputed
//! per request by the data layer; never cached here.

use serde::{Deserialize, Serialize};

use sst_exposure::TechnicalExposureResult;

/// Structural indicators supplied by the data layer, before the exposure
/// engine has run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StructuralIndicators {
    /// Company registration has been verified.
    pub company_verified: bool,
    /// Registered sectors.
    pub sector_count: u32,
    /// Active employees.
    pub employee_count: u32,
    /// Registered sectors with no mapped risk.
    pub sectors_without_risks: u32,
    /// A PGR (risk management program) document is in force.
    pub pgr_active: bool,
    /// The PGR in force has passed its validity date.
    pub pgr_expired: bool,
    /// Occupational medical exams past their due date.
    pub expired_exams: u32,
    /// Critical alerts raised outside the exposure engine.
    pub external_alerts: u32,
    /// Control measures planned but not yet implemented.
    pub pending_measures: u32,
}

/// Complete input of the state machine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegulatorySnapshot {
    /// Company registration has been verified.
    pub company_verified: bool,
    /// Registered sectors.
    pub sector_count: u32,
    /// Active employees.
    pub employee_count: u32,
    /// Registered sectors with no mapped risk.
    pub sectors_without_risks: u32,
    /// Risks in the inventory.
    pub total_risks: u32,
    /// A PGR document is in force.
    pub pgr_active: bool,
    /// The PGR in force has expired.
    pub pgr_expired: bool,
    /// Medical exams past due.
    pub expired_exams: u32,
    /// Critical alerts, technical and external.
    pub critical_alerts: u32,
    /// Control measures pending implementation.
    pub pending_measures: u32,
}

impl RegulatorySnapshot {
    /// Combine structural indicators with an exposure evaluation.
    ///
    /// Risk count comes from the evaluation; critical alerts are the
    /// evaluation's critical risks plus the external alerts.
    pub fn assemble(structure: StructuralIndicators, technical: &TechnicalExposureResult) -> Self {
        let to_u32 = |n: usize| u32::try_from(n).unwrap_or(u32::MAX);
        Self {
            company_verified: structure.company_verified,
            sector_count: structure.sector_count,
            employee_count: structure.employee_count,
            sectors_without_risks: structure.sectors_without_risks,
            total_risks: to_u32(technical.total_risks),
            pgr_active: structure.pgr_active,
            pgr_expired: structure.pgr_expired,
            expired_exams: structure.expired_exams,
            critical_alerts: to_u32(technical.critical_risks)
                .saturating_add(structure.external_alerts),
            pending_measures: structure.pending_measures,
        }
    }
}
