//! # sst-cli — Command Line for the SST Evidence Stack
//!
//! ## Subcommands
//!
//! - `sst exposure` — risk ratings and exposure totals for a dataset.
//! - `sst state` — regulatory state, progress, and next step.
//! - `sst pipeline` — technical → legal → fiscal decision.
//! - `sst seal` — render and seal evidence into the file store.
//! - `sst verify` — integrity check of stored evidence.
//! - `sst export` — verified, paginated, audited export.
//!
//! ```bash
//! sst seal --dataset empresa.json --actor tecnico.sst
//! sst verify 7f1c…
//! sst export 7f1c… --actor auditor --format json --out evidencia.json
//! ```
//!
//! ## Exit codes
//!
//! `0` success, `2` integrity mismatch, `1` any other failure.

pub mod commands;
pub mod config;
pub mod dataset;

use sst_evidence::EvidenceError;
use tracing_subscriber::EnvFilter;

/// Exit code for integrity mismatches.
pub const EXIT_INTEGRITY_MISMATCH: u8 = 2;

/// Exit code for every other failure.
pub const EXIT_FAILURE: u8 = 1;

/// Map a command failure to its process exit code.
pub fn exit_code_for(err: &anyhow::Error) -> u8 {
    let mismatch = err
        .chain()
        .any(|cause| cause.downcast_ref::<EvidenceError>().is_some_and(EvidenceError::is_integrity_mismatch));
    if mismatch {
        EXIT_INTEGRITY_MISMATCH
    } else {
        EXIT_FAILURE
    }
}

/// Log filter for a `-v` count. `RUST_LOG` wins when set.
pub fn env_filter(verbose: u8) -> EnvFilter {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

/// Install the global subscriber: human-readable, or JSON lines.
pub fn init_tracing(verbose: u8, json: bool) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter(verbose))
        .with_writer(std::io::stderr)
        .with_target(false);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
