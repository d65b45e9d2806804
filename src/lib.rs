//! ledgerflow: asynchronous invoice-document processing pipeline.
//!
//! Turns an uploaded invoice image into a merged accounting record through
//! three bounded worker pools: OCR field extraction → GST classification →
//! persistence. Callers submit a document and poll for status; they never
//! block on the external inference calls.

pub mod config;
pub mod pipeline;

use tracing_subscriber::EnvFilter;

/// Crate version, surfaced in startup logs.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize tracing for binaries and tests that embed the pipeline.
///
/// Respects `RUST_LOG` when set, otherwise falls back to
/// [`config::default_log_filter`]. Safe to call more than once: subsequent
/// calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .try_init();
}
