//! # Template Bindings
//!
//! [`Bindings`] is the data contract between a computed report and any
//! renderer: scalar lookup by dotted path, row lookup by block. The
//! markdown template engine is one consumer; another renderer can reuse
//! the same contract.
//!
//! [`ReportData`] is the typed evidence payload. It is assembled from the
//! exposure result, the regulatory state, and the company profile, then
//! frozen into [`JsonBindings`] for rendering.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use sst_core::{ActorId, CompanyId, SectorId, SnapshotId};
use sst_exposure::{TechnicalExposureResult, WorkforceIndex};
use sst_state::RegulatoryStateResult;

use crate::template::BlockName;

/// Placeholder for optional fields that were not supplied.
pub const NOT_INFORMED: &str = "Não informado";

/// One table row: field name → rendered cell value.
pub type Row = BTreeMap<String, String>;

/// Token and block resolution for templates.
pub trait Bindings: Send + Sync {
    /// Scalar value at a dotted path, if any.
    fn value(&self, path: &str) -> Option<String>;

    /// Rows for a table block, if the block is bound.
    fn rows(&self, block: BlockName) -> Option<Vec<Row>>;
}

/// Fold a value onto one line: CR is dropped, LF becomes a space.
///
/// A substituted value can then never start a heading, rule, quote, or
/// table row of its own.
pub fn single_line(value: &str) -> String {
    value
        .chars()
        .filter(|c| *c != '\r')
        .map(|c| if c == '\n' { ' ' } else { c })
        .collect()
}

/// Make a value safe inside a pipe table cell.
pub fn escape_cell(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '|' => out.push_str("\\|"),
            '\r' => {}
            '\n' => out.push(' '),
            c => out.push(c),
        }
    }
    out
}

fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(true) => Some("Sim".to_string()),
        Value::Bool(false) => Some("Não".to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

// ---------------------------------------------------------------------------
// JsonBindings
// ---------------------------------------------------------------------------

/// Bindings over a JSON document. Block rows are the top-level arrays named
/// after each block; each element's scalar fields become the row.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonBindings {
    root: Value,
}

impl JsonBindings {
    /// Wrap a JSON document.
    pub fn new(root: Value) -> Self {
        Self { root }
    }

    /// The underlying document.
    pub fn root(&self) -> &Value {
        &self.root
    }
}

impl Bindings for JsonBindings {
    fn value(&self, path: &str) -> Option<String> {
        path.split('.')
            .try_fold(&self.root, |node, key| node.get(key))
            .and_then(scalar)
    }

    fn rows(&self, block: BlockName) -> Option<Vec<Row>> {
        let items = self.root.get(block.as_str())?.as_array()?;
        Some(
            items
                .iter()
                .map(|item| {
                    item.as_object()
                        .map(|fields| {
                            fields
                                .iter()
                                .filter_map(|(k, v)| scalar(v).map(|s| (k.clone(), s)))
                                .collect()
                        })
                        .unwrap_or_default()
                })
                .collect(),
        )
    }
}

// ---------------------------------------------------------------------------
// Report inputs
// ---------------------------------------------------------------------------

/// Company identity as registered by the data layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyProfile {
    /// Company identifier.
    pub id: CompanyId,
    /// Legal name.
    pub razao_social: String,
    /// CNPJ registration number.
    #[serde(default)]
    pub cnpj: Option<String>,
    /// Main economic activity code.
    #[serde(default)]
    pub cnae: Option<String>,
    /// NR-04 risk grade (1–4).
    #[serde(default)]
    pub grau_risco: Option<u8>,
}

/// A registered sector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectorProfile {
    /// Sector identifier.
    pub id: SectorId,
    /// Display name.
    pub nome: String,
}

/// Generation metadata stamped into the report body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationMeta {
    /// Day the evidence represents.
    pub reference_date: NaiveDate,
    /// When the report was generated.
    pub generated_at: DateTime<Utc>,
    /// Version of the engine that computed the figures.
    pub engine_version: String,
    /// Who requested the report.
    pub generated_by: ActorId,
    /// Exposure snapshot the figures come from.
    pub snapshot_id: SnapshotId,
}

// ---------------------------------------------------------------------------
// ReportData
// ---------------------------------------------------------------------------

/// Company section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanySection {
    /// Company identifier.
    pub id: String,
    /// Legal name.
    pub razao_social: String,
    /// CNPJ or the not-informed placeholder.
    pub cnpj: String,
    /// CNAE or the not-informed placeholder.
    pub cnae: String,
    /// Risk grade or the not-informed placeholder.
    pub grau_risco: String,
}

/// Aggregate indicators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndicatorSection {
    /// Risks in the inventory.
    pub riscos_count: usize,
    /// Critical risks.
    pub riscos_criticos_count: usize,
    /// Total exposure.
    pub exposicao_total: u64,
    /// Active workers.
    pub trabalhadores: u64,
    /// Registered sectors.
    pub setores_count: usize,
    /// Whether any risk is critical.
    pub is_critico: bool,
    /// Regulatory state label.
    pub estado: String,
    /// Regulatory progress, 0–100.
    pub progresso: u8,
    /// Next unblocking action.
    pub proximo_passo: String,
}

/// One row of the sector table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectorRow {
    /// Sector identifier.
    pub setor: String,
    /// Display name.
    pub nome: String,
    /// Active workers.
    pub trabalhadores: u64,
    /// Risks mapped to the sector.
    pub riscos: usize,
    /// Sector exposure.
    pub exposicao: u64,
}

/// One row of the role table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRow {
    /// Role name.
    pub cargo: String,
    /// Active workers.
    pub trabalhadores: u64,
    /// Role exposure.
    pub exposicao: u64,
}

/// One row of the inventory table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryRow {
    /// Risk identifier.
    pub id: String,
    /// Sector display name.
    pub setor: String,
    /// Hazard.
    pub perigo: String,
    /// Generating source.
    pub fonte: String,
    /// Severity.
    pub severidade: u32,
    /// Probability.
    pub probabilidade: u32,
    /// severity × probability.
    pub rating: u32,
    /// Workers exposed.
    pub trabalhadores: u64,
    /// Exposure.
    pub exposicao: u64,
    /// Whether the risk is critical.
    pub critico: bool,
}

/// Generation section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationSection {
    /// Reference date, `YYYY-MM-DD`.
    pub data_referencia: String,
    /// Generation timestamp, RFC 3339 UTC.
    pub gerado_em: String,
    /// Engine version.
    pub versao_motor: String,
    /// Requesting actor.
    pub gerado_por: String,
    /// Snapshot identifier.
    pub snapshot_id: String,
}

/// The complete evidence payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportData {
    /// Company identity.
    pub empresa: CompanySection,
    /// Aggregate indicators.
    pub indicadores: IndicatorSection,
    /// Sector table.
    pub setores: Vec<SectorRow>,
    /// Role table.
    pub cargos: Vec<RoleRow>,
    /// Inventory table.
    pub inventario: Vec<InventoryRow>,
    /// Generation metadata.
    pub geracao: GenerationSection,
}

impl ReportData {
    /// Assemble the payload.
    ///
    /// Sector rows cover every registered sector plus any sector that only
    /// appears in the exposure result, ordered by sector id.
    pub fn assemble(
        company: &CompanyProfile,
        sectors: &[SectorProfile],
        workforce: &WorkforceIndex,
        technical: &TechnicalExposureResult,
        state: Option<&RegulatoryStateResult>,
        meta: &GenerationMeta,
    ) -> Self {
        let names: BTreeMap<&SectorId, &str> =
            sectors.iter().map(|s| (&s.id, s.nome.as_str())).collect();
        let name_of = |id: &SectorId| {
            names
                .get(id)
                .map(|n| n.to_string())
                .unwrap_or_else(|| id.to_string())
        };

        let mut risks_per_sector: BTreeMap<&SectorId, usize> = BTreeMap::new();
        for item in &technical.inventory {
            if let Some(sector) = &item.risk.sector_id {
                *risks_per_sector.entry(sector).or_insert(0) += 1;
            }
        }

        let sector_ids: BTreeSet<&SectorId> = sectors
            .iter()
            .map(|s| &s.id)
            .chain(technical.exposure_by_sector.keys())
            .collect();
        let setores = sector_ids
            .into_iter()
            .map(|id| SectorRow {
                setor: id.to_string(),
                nome: name_of(id),
                trabalhadores: workforce.workers_in(id),
                riscos: risks_per_sector.get(id).copied().unwrap_or(0),
                exposicao: technical.exposure_by_sector.get(id).copied().unwrap_or(0),
            })
            .collect();

        let cargos = technical
            .exposure_by_role
            .iter()
            .map(|(role, exposure)| RoleRow {
                cargo: role.clone(),
                trabalhadores: workforce.by_role.get(role).copied().unwrap_or(0),
                exposicao: *exposure,
            })
            .collect();

        let inventario = technical
            .inventory
            .iter()
            .map(|item| InventoryRow {
                id: item.risk.id.to_string(),
                setor: item
                    .risk
                    .sector_id
                    .as_ref()
                    .map(&name_of)
                    .unwrap_or_else(|| NOT_INFORMED.to_string()),
                perigo: item.risk.hazard.clone().unwrap_or_else(|| NOT_INFORMED.to_string()),
                fonte: item.risk.source.clone().unwrap_or_else(|| NOT_INFORMED.to_string()),
                severidade: item.risk.severity.value(),
                probabilidade: item.risk.probability.value(),
                rating: item.rating,
                trabalhadores: item.workers,
                exposicao: item.exposure,
                critico: item.critical,
            })
            .collect();

        let (estado, progresso, proximo_passo) = match state {
            Some(s) => (s.label.clone(), s.progress, s.next_step.clone()),
            None => ("Não avaliado".to_string(), 0, NOT_INFORMED.to_string()),
        };

        Self {
            empresa: CompanySection {
                id: company.id.to_string(),
                razao_social: company.razao_social.clone(),
                cnpj: company.cnpj.clone().unwrap_or_else(|| NOT_INFORMED.to_string()),
                cnae: company.cnae.clone().unwrap_or_else(|| NOT_INFORMED.to_string()),
                grau_risco: company
                    .grau_risco
                    .map(|g| g.to_string())
                    .unwrap_or_else(|| NOT_INFORMED.to_string()),
            },
            indicadores: IndicatorSection {
                riscos_count: technical.total_risks,
                riscos_criticos_count: technical.critical_risks,
                exposicao_total: technical.total_exposure,
                trabalhadores: workforce.total_workers(),
                setores_count: sectors.len(),
                is_critico: technical.is_critical,
                estado,
                progresso,
                proximo_passo,
            },
            setores,
            cargos,
            inventario,
            geracao: GenerationSection {
                data_referencia: meta.reference_date.format("%Y-%m-%d").to_string(),
                gerado_em: meta.generated_at.to_rfc3339_opts(SecondsFormat::Secs, true),
                versao_motor: meta.engine_version.clone(),
                gerado_por: meta.generated_by.to_string(),
                snapshot_id: meta.snapshot_id.to_string(),
            },
        }
    }

    /// Freeze into template bindings.
    pub fn to_bindings(&self) -> Result<JsonBindings, serde_json::Error> {
        serde_json::to_value(self).map(JsonBindings::new)
    }
}
