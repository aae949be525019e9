//! # Exposure Engine
//!
//! Pure evaluation of a risk inventory against a workforce index.
//!
//! ## Invariants
//!
//! - `rating = severity × probability`, absent values count as 0.
//! - `exposure = rating × workers in the risk's sector`, 0 when the risk is
//!   unmapped or its sector has no active workers.
//! - `total_exposure` is the exact integer sum of every exposure.
//! - A risk is critical iff `rating ≥ critical_threshold`, and the result is
//!   critical iff any risk is.
//!
//! ## Known Limitation
//!
//! Risks carry no role reference, so role exposure cannot be computed.
//! Every role of the workforce index is still registered with value 0 so
//! that downstream tables list all roles.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use sst_core::SectorId;

use crate::model::{EnrichedRisk, Ordinal, RiskRecord, TechnicalExposureResult, WorkforceIndex};

/// Rating at or above which a risk is critical (e.g. severity 4 × probability 5).
pub const CRITICAL_RATING_THRESHOLD: u32 = 20;

/// Tunables for the exposure engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExposureConfig {
    /// Minimum rating for a risk to be classified as critical.
    pub critical_threshold: u32,
}

impl Default for ExposureConfig {
    fn default() -> Self {
        Self {
            critical_threshold: CRITICAL_RATING_THRESHOLD,
        }
    }
}

/// `severity × probability`; absent or invalid ordinals rate as 0.
pub fn compute_rating(severity: Ordinal, probability: Ordinal) -> u32 {
    severity.value().saturating_mul(probability.value())
}

/// Count registered sectors that have no risk mapped to them.
pub fn sectors_without_risks<'a>(
    sectors: impl IntoIterator<Item = &'a SectorId>,
    risks: &[RiskRecord],
) -> usize {
    sectors
        .into_iter()
        .filter(|sector| !risks.iter().any(|r| r.sector_id.as_ref() == Some(*sector)))
        .count()
}

/// The exposure engine. Holds configuration only, never evaluation state.
#[derive(Debug, Clone, Default)]
pub struct ExposureEngine {
    config: ExposureConfig,
}

impl ExposureEngine {
    /// Create an engine with the given configuration.
    pub fn new(config: ExposureConfig) -> Self {
        Self { config }
    }

    /// The active configuration.
    pub fn config(&self) -> &ExposureConfig {
        &self.config
    }

    /// Evaluate a risk inventory against the workforce index.
    pub fn evaluate(&self, risks: &[RiskRecord], workforce: &WorkforceIndex) -> TechnicalExposureResult {
        let mut exposure_by_sector: BTreeMap<SectorId, u64> = BTreeMap::new();
        let mut inventory = Vec::with_capacity(risks.len());
        let mut total_exposure = 0u64;
        let mut critical_risks = 0usize;

        for risk in risks {
            let rating = compute_rating(risk.severity, risk.probability);
            let workers = risk
                .sector_id
                .as_ref()
                .map(|s| workforce.workers_in(s))
                .unwrap_or(0);
            let exposure = u64::from(rating).saturating_mul(workers);
            let critical = rating >= self.config.critical_threshold;

            total_exposure = total_exposure.saturating_add(exposure);
            if critical {
                critical_risks += 1;
            }
            if let Some(sector) = &risk.sector_id {
                let slot = exposure_by_sector.entry(sector.clone()).or_insert(0);
                *slot = slot.saturating_add(exposure);
            }

            inventory.push(EnrichedRisk {
                risk: risk.clone(),
                rating,
                exposure,
                workers,
                critical,
            });
        }

        let exposure_by_role = workforce
            .by_role
            .keys()
            .map(|role| (role.clone(), 0u64))
            .collect();

        tracing::debug!(
            risks = risks.len(),
            critical_risks,
            total_exposure,
            "exposure evaluated"
        );

        TechnicalExposureResult {
            total_risks: risks.len(),
            critical_risks,
            total_exposure,
            exposure_by_sector,
            exposure_by_role,
            is_critical: critical_risks > 0,
            inventory,
        }
    }
}
