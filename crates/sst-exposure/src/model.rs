//! # Exposure Data Model
//!
//! Input records fed by the external data layer and the immutable result
//! produced by every evaluation. JSON field names follow the product's wire
//! format (`sectorId`, `exposicaoPorSetor`, `isCritico`, ...).

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use sst_core::{RiskId, SectorId};

// ---------------------------------------------------------------------------
// Ordinal
// ---------------------------------------------------------------------------

/// A lenient ordinal scale value (severity or probability, usually 1–5).
///
/// Deserialization never fails: integers and numeric strings are accepted,
/// while `null`, negatives, fractions, and anything non-numeric become an
/// absent value that rates as 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Ordinal(Option<u32>);

impl Ordinal {
    /// An ordinal with a known value.
    pub fn new(value: u32) -> Self {
        Self(Some(value))
    }

    /// An absent ordinal.
    pub fn absent() -> Self {
        Self(None)
    }

    /// The numeric value, with absent treated as 0.
    pub fn value(&self) -> u32 {
        self.0.unwrap_or(0)
    }

    /// Whether a usable value was supplied.
    pub fn is_present(&self) -> bool {
        self.0.is_some()
    }

    fn from_json(value: &Value) -> Self {
        let parsed = match value {
            Value::Number(n) => n
                .as_u64()
                .or_else(|| {
                    n.as_f64()
                        .filter(|f| f.is_finite() && *f >= 0.0 && f.fract() == 0.0)
                        .map(|f| f as u64)
                })
                .and_then(|v| u32::try_from(v).ok()),
            Value::String(s) => s.trim().parse::<u32>().ok(),
            _ => None,
        };
        Self(parsed)
    }
}

impl From<u32> for Ordinal {
    fn from(value: u32) -> Self {
        Self::new(value)
    }
}

impl Serialize for Ordinal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0 {
            Some(v) => serializer.serialize_u32(v),
            None => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for Ordinal {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(Self::from_json(&value))
    }
}

// ---------------------------------------------------------------------------
// RiskRecord
// ---------------------------------------------------------------------------

/// A hazard entry from the company's risk inventory. Read-only to the core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskRecord {
    /// Risk identifier.
    pub id: RiskId,
    /// Sector the risk is mapped to; `None` when unmapped.
    #[serde(default)]
    pub sector_id: Option<SectorId>,
    /// Severity on the ordinal scale.
    #[serde(default)]
    pub severity: Ordinal,
    /// Probability on the ordinal scale.
    #[serde(default)]
    pub probability: Ordinal,
    /// Hazard name (e.g. "Ruído contínuo").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hazard: Option<String>,
    /// Free-form description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Generating source (machine, process, activity).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Any other descriptive fields, preserved verbatim.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl RiskRecord {
    /// Minimal record, mostly for tests and fixtures.
    pub fn new(
        id: RiskId,
        sector_id: Option<SectorId>,
        severity: impl Into<Ordinal>,
        probability: impl Into<Ordinal>,
    ) -> Self {
        Self {
            id,
            sector_id,
            severity: severity.into(),
            probability: probability.into(),
            hazard: None,
            description: None,
            source: None,
            extra: BTreeMap::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// WorkforceIndex
// ---------------------------------------------------------------------------

/// Active worker counts, derived externally from employee records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkforceIndex {
    /// Sector → active worker count.
    #[serde(default)]
    pub by_sector: BTreeMap<SectorId, u64>,
    /// Role name → active worker count.
    #[serde(default)]
    pub by_role: BTreeMap<String, u64>,
}

impl WorkforceIndex {
    /// Active workers in a sector; 0 when the sector is unknown.
    pub fn workers_in(&self, sector: &SectorId) -> u64 {
        self.by_sector.get(sector).copied().unwrap_or(0)
    }

    /// Sum of active workers across all sectors.
    pub fn total_workers(&self) -> u64 {
        self.by_sector.values().copied().fold(0u64, u64::saturating_add)
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// A risk record augmented with its computed figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedRisk {
    /// The source record.
    #[serde(flatten)]
    pub risk: RiskRecord,
    /// severity × probability.
    pub rating: u32,
    /// rating × workers in the risk's sector.
    #[serde(rename = "exposicao")]
    pub exposure: u64,
    /// Workers in the risk's sector.
    #[serde(rename = "trabalhadores")]
    pub workers: u64,
    /// Whether the rating reached the critical threshold.
    #[serde(rename = "critico")]
    pub critical: bool,
}

/// The technical exposure picture of one evaluation.
///
/// Created fresh on every call and never mutated; the next evaluation
/// supersedes it entirely.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TechnicalExposureResult {
    /// Number of risks evaluated.
    #[serde(rename = "riscosCount")]
    pub total_risks: usize,
    /// Number of risks whose rating reached the critical threshold.
    #[serde(rename = "riscosCriticosCount")]
    pub critical_risks: usize,
    /// Σ exposure over every risk.
    #[serde(rename = "exposicaoTotal")]
    pub total_exposure: u64,
    /// Exposure per sector, for every sector that has at least one risk.
    #[serde(rename = "exposicaoPorSetor")]
    pub exposure_by_sector: BTreeMap<SectorId, u64>,
    /// Exposure per role. Every known role is listed with 0: risks are not
    /// yet joined to roles.
    #[serde(rename = "exposicaoPorCargo")]
    pub exposure_by_role: BTreeMap<String, u64>,
    /// True iff at least one risk is critical.
    #[serde(rename = "isCritico")]
    pub is_critical: bool,
    /// The enriched per-risk inventory, in input order.
    #[serde(rename = "inventario")]
    pub inventory: Vec<EnrichedRisk>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sector(s: &str) -> SectorId {
        SectorId::new(s).unwrap()
    }

    #[test]
    fn ordinal_accepts_integers_and_numeric_strings() {
        let o: Ordinal = serde_json::from_value(json!(4)).unwrap();
        assert_eq!(o.value(), 4);
        let o: Ordinal = serde_json::from_value(json!(" 3 ")).unwrap();
        assert_eq!(o.value(), 3);
        let o: Ordinal = serde_json::from_value(json!(5.0)).unwrap();
        assert_eq!(o.value(), 5);
    }

    #[test]
    fn ordinal_treats_invalid_as_zero() {
        for v in [json!(null), json!(-2), json!(2.5), json!("alto"), json!([1]), json!({})] {
            let o: Ordinal = serde_json::from_value(v.clone()).unwrap();
            assert_eq!(o.value(), 0, "input {v}");
            assert!(!o.is_present());
        }
    }

    #[test]
    fn risk_record_tolerates_missing_numeric_fields() {
        let risk: RiskRecord = serde_json::from_value(json!({
            "id": "r-1",
            "sectorId": "solda",
            "hazard": "Fumos metálicos",
            "epi": "máscara PFF2"
        }))
        .unwrap();
        assert_eq!(risk.severity.value(), 0);
        assert_eq!(risk.probability.value(), 0);
        assert_eq!(risk.sector_id, Some(sector("solda")));
        assert_eq!(risk.extra.get("epi"), Some(&json!("máscara PFF2")));
    }

    #[test]
    fn risk_record_without_sector_is_unmapped() {
        let risk: RiskRecord =
            serde_json::from_value(json!({"id": "r-2", "severity": 3, "probability": 2})).unwrap();
        assert!(risk.sector_id.is_none());
    }

    #[test]
    fn workforce_lookup_defaults_to_zero() {
        let mut wf = WorkforceIndex::default();
        wf.by_sector.insert(sector("a"), 7);
        wf.by_sector.insert(sector("b"), 3);
        assert_eq!(wf.workers_in(&sector("a")), 7);
        assert_eq!(wf.workers_in(&sector("z")), 0);
        assert_eq!(wf.total_workers(), 10);
    }

    #[test]
    fn result_uses_wire_field_names() {
        let value = serde_json::to_value(TechnicalExposureResult::default()).unwrap();
        for key in [
            "riscosCount",
            "riscosCriticosCount",
            "exposicaoTotal",
            "exposicaoPorSetor",
            "exposicaoPorCargo",
            "isCritico",
            "inventario",
        ] {
            assert!(value.get(key).is_some(), "missing {key}");
        }
    }
}
