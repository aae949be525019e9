//! # Error Hierarchy
//!
//! Structured error types shared across the workspace, built with
//! `thiserror`. Component crates define their own enums for their own
//! failure modes and convert into [`SstError`] where a caller needs one type.

use thiserror::Error;

/// Top-level error type for the SST evidence stack.
#[derive(Error, Debug)]
pub enum SstError {
    /// Canonicalization failure during digest computation.
    #[error("canonicalization error: {0}")]
    Canonicalization(#[from] CanonicalizationError),

    /// Domain primitive validation failure.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Stored content no longer matches its seal.
    #[error("integrity error: {0}")]
    Integrity(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors during canonical serialization.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// Float values are not permitted in canonical representations.
    #[error("float values are not permitted in canonical representations: {0}")]
    FloatRejected(f64),

    /// JSON serialization failed during canonicalization.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}

/// Validation errors for domain primitive newtypes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// An identifier was empty or whitespace-only.
    #[error("invalid {kind}: must be non-empty")]
    EmptyIdentifier {
        /// Which identifier namespace rejected the value.
        kind: &'static str,
    },

    /// A digest string is not 64 hex characters.
    #[error("invalid SHA-256 digest: \"{0}\" (expected 64 hex characters)")]
    InvalidDigest(String),

    /// A UUID-backed identifier failed to parse.
    #[error("invalid {kind}: \"{value}\" is not a UUID")]
    InvalidUuid {
        /// Which identifier namespace rejected the value.
        kind: &'static str,
        /// The rejected input.
        value: String,
    },
}
