//! # sst-state — Regulatory Maturity State Machine
//!
//! Maps a structural/compliance snapshot of a company to a discrete maturity
//! state, a 0–100 progress score, and the single next unblocking action.
//!
//! ## Ladder
//!
//! ```text
//! ESTRUTURA_INCOMPLETA ──▶ MAPEAMENTO_PENDENTE ──▶ GRO_EM_ANDAMENTO ──▶ CONFORME_OURO
//!   company verified         ≥1 risk mapped          PGR valid
//!   ≥1 sector                every sector covered    no expired exams
//!   ≥1 employee                                      no critical alerts
//!                                                    no pending measures
//! ```
//!
//! Gates are flow guards: they are checked in order and evaluation stops at
//! the first unmet gate. A later state is reachable only when every gate of
//! every earlier state holds. [`evaluate`] is a pure function.

pub mod regulatory;
pub mod snapshot;

pub use regulatory::{
    evaluate, AgentFlags, Gate, RegulatoryState, RegulatoryStateResult, StateColor,
};
pub use snapshot::{RegulatorySnapshot, StructuralIndicators};
