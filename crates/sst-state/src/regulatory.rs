//! # Regulatory State Evaluation
//!
//! Nine ordered gates, grouped into the four states of the maturity ladder.
//! Progress is the sum of the weights of the satisfied gate prefix, so it
//! only grows as more gates hold and reaches 100 exactly at
//! [`RegulatoryState::ConformeOuro`].
//!
//! | # | Gate | Weight |
//! |---|------|--------|
//! | 1 | company verified | 10 |
//! | 2 | at least one sector | 10 |
//! | 3 | at least one employee | 10 |
//! | 4 | at least one risk mapped | 15 |
//! | 5 | every sector has risks | 15 |
//! | 6 | PGR active and in force | 15 |
//! | 7 | no expired medical exams | 10 |
//! | 8 | no critical alerts | 10 |
//! | 9 | no pending control measures | 5 |

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::snapshot::RegulatorySnapshot;

// ---------------------------------------------------------------------------
// RegulatoryState
// ---------------------------------------------------------------------------

/// Discrete maturity state. Variant order is ladder order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RegulatoryState {
    /// Company, sector, or employee setup is missing.
    EstruturaIncompleta,
    /// Structure is complete but risks are not mapped for every sector.
    MapeamentoPendente,
    /// Risk management program in progress.
    GroEmAndamento,
    /// Terminal: every gate holds.
    ConformeOuro,
}

impl RegulatoryState {
    /// Canonical state name as it appears on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EstruturaIncompleta => "ESTRUTURA_INCOMPLETA",
            Self::MapeamentoPendente => "MAPEAMENTO_PENDENTE",
            Self::GroEmAndamento => "GRO_EM_ANDAMENTO",
            Self::ConformeOuro => "CONFORME_OURO",
        }
    }

    /// Short human label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::EstruturaIncompleta => "Estrutura incompleta",
            Self::MapeamentoPendente => "Mapeamento pendente",
            Self::GroEmAndamento => "GRO em andamento",
            Self::ConformeOuro => "Conforme Ouro",
        }
    }

    /// One-sentence description of what the state means.
    pub fn description(&self) -> &'static str {
        match self {
            Self::EstruturaIncompleta => {
                "Cadastro da empresa, dos setores ou dos colaboradores ainda pendente."
            }
            Self::MapeamentoPendente => {
                "Estrutura completa, mas o inventário de riscos não cobre todos os setores."
            }
            Self::GroEmAndamento => {
                "Riscos mapeados; PGR, exames, alertas ou medidas de controle ainda exigem ação."
            }
            Self::ConformeOuro => {
                "PGR vigente, riscos mapeados em todos os setores e nenhuma pendência crítica."
            }
        }
    }

    /// Display color hint.
    pub fn color(&self) -> StateColor {
        match self {
            Self::EstruturaIncompleta => StateColor::Red,
            Self::MapeamentoPendente => StateColor::Amber,
            Self::GroEmAndamento => StateColor::Blue,
            Self::ConformeOuro => StateColor::Gold,
        }
    }
}

impl fmt::Display for RegulatoryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Color hint for UI display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateColor {
    /// Setup missing.
    Red,
    /// Mapping missing.
    Amber,
    /// Work in progress.
    Blue,
    /// Fully compliant.
    Gold,
}

// ---------------------------------------------------------------------------
// Gates
// ---------------------------------------------------------------------------

/// A single flow guard. Variant order is evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gate {
    /// Company registration verified.
    CompanyVerified,
    /// At least one sector registered.
    SectorsRegistered,
    /// At least one active employee.
    EmployeesRegistered,
    /// At least one risk in the inventory.
    RisksMapped,
    /// No registered sector without risks.
    FullRiskCoverage,
    /// PGR active and not expired.
    PgrInForce,
    /// No expired medical exams.
    ExamsCurrent,
    /// No critical alerts.
    NoCriticalAlerts,
    /// No pending control measures.
    NoPendingMeasures,
}

impl Gate {
    /// Every gate, in evaluation order.
    pub const ALL: [Gate; 9] = [
        Gate::CompanyVerified,
        Gate::SectorsRegistered,
        Gate::EmployeesRegistered,
        Gate::RisksMapped,
        Gate::FullRiskCoverage,
        Gate::PgrInForce,
        Gate::ExamsCurrent,
        Gate::NoCriticalAlerts,
        Gate::NoPendingMeasures,
    ];

    /// Progress points this gate contributes. The weights of all gates sum to 100.
    pub fn weight(&self) -> u8 {
        match self {
            Self::CompanyVerified | Self::SectorsRegistered | Self::EmployeesRegistered => 10,
            Self::RisksMapped | Self::FullRiskCoverage | Self::PgrInForce => 15,
            Self::ExamsCurrent | Self::NoCriticalAlerts => 10,
            Self::NoPendingMeasures => 5,
        }
    }

    /// The state a company is held in while this gate is unmet.
    pub fn blocked_state(&self) -> RegulatoryState {
        match self {
            Self::CompanyVerified | Self::SectorsRegistered | Self::EmployeesRegistered => {
                RegulatoryState::EstruturaIncompleta
            }
            Self::RisksMapped | Self::FullRiskCoverage => RegulatoryState::MapeamentoPendente,
            Self::PgrInForce
            | Self::ExamsCurrent
            | Self::NoCriticalAlerts
            | Self::NoPendingMeasures => RegulatoryState::GroEmAndamento,
        }
    }

    /// Whether the snapshot satisfies this gate.
    pub fn is_met(&self, s: &RegulatorySnapshot) -> bool {
        match self {
            Self::CompanyVerified => s.company_verified,
            Self::SectorsRegistered => s.sector_count > 0,
            Self::EmployeesRegistered => s.employee_count > 0,
            Self::RisksMapped => s.total_risks > 0,
            Self::FullRiskCoverage => s.sectors_without_risks == 0,
            Self::PgrInForce => s.pgr_active && !s.pgr_expired,
            Self::ExamsCurrent => s.expired_exams == 0,
            Self::NoCriticalAlerts => s.critical_alerts == 0,
            Self::NoPendingMeasures => s.pending_measures == 0,
        }
    }

    /// The action that unblocks this gate.
    pub fn next_step(&self, s: &RegulatorySnapshot) -> String {
        match self {
            Self::CompanyVerified => {
                "Verificar o cadastro da empresa (CNPJ e dados cadastrais).".to_string()
            }
            Self::SectorsRegistered => "Cadastrar ao menos um setor da empresa.".to_string(),
            Self::EmployeesRegistered => {
                "Cadastrar os colaboradores ativos e vinculá-los aos setores.".to_string()
            }
            Self::RisksMapped => {
                "Mapear os riscos ocupacionais no inventário de riscos.".to_string()
            }
            Self::FullRiskCoverage => format!(
                "Mapear riscos para {} setor(es) ainda sem riscos cadastrados.",
                s.sectors_without_risks
            ),
            Self::PgrInForce if s.pgr_active => "Revisar e renovar o PGR vencido.".to_string(),
            Self::PgrInForce => {
                "Elaborar e ativar o PGR (Programa de Gerenciamento de Riscos).".to_string()
            }
            Self::ExamsCurrent => format!(
                "Regularizar {} exame(s) médico(s) vencido(s) do PCMSO.",
                s.expired_exams
            ),
            Self::NoCriticalAlerts => format!(
                "Tratar {} alerta(s) crítico(s) com medidas de controle imediatas.",
                s.critical_alerts
            ),
            Self::NoPendingMeasures => format!(
                "Implementar {} medida(s) de controle pendente(s) do plano de ação.",
                s.pending_measures
            ),
        }
    }
}

const MAINTENANCE_STEP: &str =
    "Manter o monitoramento contínuo e selar a evidência do período.";

// ---------------------------------------------------------------------------
// Result
// ---------------------------------------------------------------------------

/// Which sub-checks currently pass. Derived from the same snapshot as the
/// state, for display only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentFlags {
    /// PGR in force and medical exams current.
    pub legal: bool,
    /// No critical alerts and no pending measures.
    pub fiscal: bool,
    /// Risks mapped for every sector.
    pub tecnico: bool,
    /// Every gate holds; evidence can be sealed as gold standard.
    pub evidencia: bool,
}

impl AgentFlags {
    fn derive(s: &RegulatorySnapshot) -> Self {
        let met = |g: Gate| g.is_met(s);
        Self {
            legal: met(Gate::PgrInForce) && met(Gate::ExamsCurrent),
            fiscal: met(Gate::NoCriticalAlerts) && met(Gate::NoPendingMeasures),
            tecnico: met(Gate::RisksMapped) && met(Gate::FullRiskCoverage),
            evidencia: Gate::ALL.iter().all(|g| g.is_met(s)),
        }
    }
}

/// Outcome of one state evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegulatoryStateResult {
    /// Current maturity state.
    pub state: RegulatoryState,
    /// 0–100, 100 iff `CONFORME_OURO`.
    pub progress: u8,
    /// Short human label.
    pub label: String,
    /// State description.
    pub description: String,
    /// The single next unblocking action.
    pub next_step: String,
    /// Display color hint.
    pub color: StateColor,
    /// Sub-check flags.
    pub agents: AgentFlags,
    /// The first unmet gate, absent at `CONFORME_OURO`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocking_gate: Option<Gate>,
}

/// Evaluate a snapshot. Identical snapshots always give identical results.
pub fn evaluate(snapshot: &RegulatorySnapshot) -> RegulatoryStateResult {
    let agents = AgentFlags::derive(snapshot);
    let mut progress = 0u8;

    for gate in Gate::ALL {
        if !gate.is_met(snapshot) {
            return build(gate.blocked_state(), progress, gate.next_step(snapshot), agents, Some(gate));
        }
        progress += gate.weight();
    }

    build(
        RegulatoryState::ConformeOuro,
        progress,
        MAINTENANCE_STEP.to_string(),
        agents,
        None,
    )
}

fn build(
    state: RegulatoryState,
    progress: u8,
    next_step: String,
    agents: AgentFlags,
    blocking_gate: Option<Gate>,
) -> RegulatoryStateResult {
    RegulatoryStateResult {
        state,
        progress,
        label: state.label().to_string(),
        description: state.description().to_string(),
        next_step,
        color: state.color(),
        agents,
        blocking_gate,
    }
}
