//! # Evidence Error Types
//!
//! Integrity failures and template failures are distinct variants with
//! distinct remediation: a mismatch means the stored content drifted and
//! the evidence must be re-sealed, a template error means the template or
//! its data is wrong.

use sst_core::EvidenceId;

/// Errors parsing or rendering an evidence template.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    /// `{{` with no matching `}}`.
    #[error("unterminated tag at byte {offset}")]
    Unterminated {
        /// Byte offset of the opening braces.
        offset: usize,
    },

    /// `{{}}`.
    #[error("empty tag at byte {offset}")]
    EmptyTag {
        /// Byte offset of the tag.
        offset: usize,
    },

    /// A block construct other than the supported `#each` forms.
    #[error("unsupported template construct {{{{{tag}}}}} at byte {offset}")]
    UnsupportedConstruct {
        /// Tag content.
        tag: String,
        /// Byte offset of the tag.
        offset: usize,
    },

    /// `#each` over a collection that is not a known table block.
    #[error("unknown block '{name}'; expected setores, cargos, or inventario")]
    UnknownBlock {
        /// The requested collection.
        name: String,
    },

    /// `#each` inside another `#each`.
    #[error("nested block '{inner}' inside '{outer}'")]
    NestedBlock {
        /// Enclosing block.
        outer: String,
        /// Nested block.
        inner: String,
    },

    /// A block was opened and never closed.
    #[error("block '{name}' is never closed")]
    UnclosedBlock {
        /// The open block.
        name: String,
    },

    /// `{{/each}}` without an open block.
    #[error("unexpected {{{{/each}}}} at byte {offset}")]
    UnexpectedClose {
        /// Byte offset of the tag.
        offset: usize,
    },

    /// A token whose path contains characters outside `[A-Za-z0-9_.]`.
    #[error("invalid token path '{path}'")]
    InvalidToken {
        /// The offending path.
        path: String,
    },

    /// The document's own hash cannot appear in the hashed content.
    #[error("reserved token '{path}' cannot appear in sealed content")]
    ReservedToken {
        /// The reserved path.
        path: String,
    },

    /// A token the bindings could not resolve to a scalar.
    #[error("unresolved token '{path}'{}", .block.as_ref().map(|b| format!(" in block '{b}'")).unwrap_or_default())]
    UnresolvedToken {
        /// Token path.
        path: String,
        /// Enclosing block, if any.
        block: Option<String>,
    },

    /// The bindings supplied no rows collection for a block.
    #[error("no data bound for block '{name}'")]
    MissingBlock {
        /// The block.
        name: String,
    },

    /// A rendered block line that is not a `| … |` table row.
    #[error("malformed table row in block '{block}': {line:?}")]
    MalformedRow {
        /// The block.
        block: String,
        /// The rendered line.
        line: String,
    },
}

/// Errors from evidence stores.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Evidence records are append-only.
    #[error("evidence {0} already exists; records are append-only")]
    AlreadyExists(EvidenceId),

    /// Filesystem failure.
    #[error("evidence store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A record could not be (de)serialized.
    #[error("evidence store serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Any other backend failure.
    #[error("evidence store backend error: {0}")]
    Backend(String),
}

/// Errors writing an audit entry.
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    /// Filesystem failure.
    #[error("audit log I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The entry could not be serialized.
    #[error("audit log serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Any other backend failure.
    #[error("audit log backend error: {0}")]
    Backend(String),
}

/// Top-level evidence error.
#[derive(Debug, thiserror::Error)]
pub enum EvidenceError {
    /// Template parse or render failure.
    #[error("template error: {0}")]
    Template(#[from] TemplateError),

    /// The stored content no longer matches its sealed hash.
    #[error("evidence {evidence_id}: content changed since sealing (sealed {expected}, recomputed {actual})")]
    IntegrityMismatch {
        /// The record that failed verification.
        evidence_id: EvidenceId,
        /// Hash stored at sealing time.
        expected: String,
        /// Hash of the content as stored now.
        actual: String,
    },

    /// No record with this id.
    #[error("evidence {0} not found")]
    NotFound(EvidenceId),

    /// Store failure.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The sealed document could not be encoded in the requested format.
    #[error("export encoding failed: {0}")]
    Encoding(String),
}

impl EvidenceError {
    /// Whether this is an integrity failure.
    pub fn is_integrity_mismatch(&self) -> bool {
        matches!(self, Self::IntegrityMismatch { .. })
    }
}
