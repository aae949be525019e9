//! # sst-evidence: Sealed Compliance Evidence
//!
//! Turns evaluated compliance data into tamper-evident artifacts.
//!
//! ## Flow
//!
//! ```text
//! ReportData ──► JsonBindings ──► Template::render ──► markdown
//!                                                        │ SHA-256
//!                                                        ▼
//!                                   EvidenceStore ◄── EvidenceRecord
//!                                        │
//!                       verify_integrity ▼
//!        markdown::parse ─► Layout ─► DraftDocument::finalize ─► ExportFormat
//!                                                        │
//!                                                        ▼
//!                                                   AuditSink
//! ```
//!
//! ## Guarantees
//!
//! - The stored hash always equals SHA-256 of the stored markdown at
//!   sealing time; records are never updated.
//! - Export refuses content whose hash no longer matches.
//! - Every exported page carries the seal and `Página X de N` with the
//!   final page count.
//! - Audit failures never block an export.

#![deny(missing_docs)]

pub mod audit;
pub mod binding;
pub mod distribution;
pub mod error;
pub mod render;
pub mod seal;
pub mod store;
pub mod template;

pub use audit::{AuditLogEntry, AuditPayload, AuditSink, JsonlAuditLog, MemoryAuditLog, ACTION_EXPORT, ENTITY_EVIDENCE};
pub use binding::{
    escape_cell, single_line, Bindings, CompanyProfile, GenerationMeta, JsonBindings, ReportData, Row, SectorProfile,
    NOT_INFORMED,
};
pub use distribution::{Distributor, ExportOutcome, ExportRequest};
pub use error::{AuditError, EvidenceError, StoreError, TemplateError};
pub use render::{DraftDocument, ExportFormat, Layout, LayoutConfig, SealedDocument};
pub use seal::{content_hash, verify_integrity, EvidenceRecord, SealRequest, Sealer};
pub use store::{EvidenceStore, FsEvidenceStore, MemoryEvidenceStore};
pub use template::{BlockName, Template, DEFAULT_TEMPLATE, RESERVED_HASH_TOKEN};
