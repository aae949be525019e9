#![deny(missing_docs)]

//! # sst-core — Foundational Types for the SST Evidence Stack
//!
//! This crate defines the primitives every other crate in the workspace
//! depends on. It has no internal crate dependencies.
//!
//! ## Design Principles
//!
//! 1. **Newtype wrappers for domain identifiers.** You cannot pass a
//!    [`SectorId`] where a [`CompanyId`] is expected.
//!
//! 2. **Two digest paths, both SHA-256.** Structured values (decisions,
//!    exposure snapshots, audit payloads) are digested through
//!    [`CanonicalBytes`]. Finished documents (sealed markdown) are digested
//!    over their exact bytes with [`sha256_content`].
//!
//! 3. **[`SstError`] hierarchy.** Structured errors with `thiserror`, no
//!    `.unwrap()` outside tests.

pub mod canonical;
pub mod digest;
pub mod error;
pub mod identity;

// Re-export primary types at crate root for ergonomic imports.
pub use canonical::CanonicalBytes;
pub use digest::{sha256_content, sha256_digest, ContentDigest, DigestAlgorithm};
pub use error::{CanonicalizationError, SstError, ValidationError};
pub use identity::{ActorId, CompanyId, EvidenceId, RiskId, SectorId, SnapshotId};
