//! # sst-exposure — Risk Exposure Engine
//!
//! Deterministic computation of how strongly a workforce is exposed to the
//! hazards in a company's risk inventory.
//!
//! ```text
//! rating   = severity × probability
//! exposure = rating × active workers in the risk's sector
//! critical = rating ≥ 20
//! ```
//!
//! [`ExposureEngine::evaluate`] is a pure function of its inputs: no I/O, no
//! hidden state, safe to call concurrently. The [`snapshot`] module adds the
//! optional daily history record, whose persistence is best-effort.

pub mod engine;
pub mod model;
pub mod snapshot;

pub use engine::{
    compute_rating, sectors_without_risks, ExposureConfig, ExposureEngine,
    CRITICAL_RATING_THRESHOLD,
};
pub use model::{EnrichedRisk, Ordinal, RiskRecord, TechnicalExposureResult, WorkforceIndex};
pub use snapshot::{
    persist_snapshot, ExposureSnapshot, FsSnapshotSink, MemorySnapshotSink, SnapshotError, SnapshotSink,
};
