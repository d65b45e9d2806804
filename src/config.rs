//! Pipeline configuration.
//!
//! Pool widths are fixed at startup (no dynamic scaling): concurrency toward
//! the external extraction/classification services is bounded purely by pool
//! size, sized to what those services tolerate.

use std::time::Duration;

use crate::pipeline::prompts;

/// Default tracing filter when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "info,ledgerflow=debug"
}

/// Document-type tag applied when the caller does not supply one.
pub const DEFAULT_DOC_TYPE: &str = "gst_invoice";

/// Tuning knobs for the pipeline manager and its worker pools.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Extraction pool width. Extraction is the latency-heavy stage.
    pub extraction_workers: usize,
    /// Classification pool width.
    pub classification_workers: usize,
    /// Persistence pool width. Persistence is cheap and single-writer
    /// friendly, so this is smaller than the other pools.
    pub persistence_workers: usize,
    /// Polling interval used by `await_completion`.
    pub poll_interval: Duration,
    /// How long Completed/Failed tasks stay queryable before eviction.
    pub retention: Duration,
    /// How often the retention sweeper scans the task table.
    pub sweep_interval: Duration,
    /// Buffered capacity of the completion event channel.
    pub completion_channel_capacity: usize,
    /// Instruction text handed to the extraction capability with every call.
    pub extraction_instructions: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            extraction_workers: 5,
            classification_workers: 5,
            persistence_workers: 2,
            poll_interval: Duration::from_millis(50),
            retention: Duration::from_secs(15 * 60),
            sweep_interval: Duration::from_secs(60),
            completion_channel_capacity: 64,
            extraction_instructions: prompts::EXTRACTION_INSTRUCTIONS.to_string(),
        }
    }
}
