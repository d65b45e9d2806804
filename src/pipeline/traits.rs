//! Capability seams consumed by the pipeline.
//!
//! The pipeline orchestrates three external capabilities but implements
//! none of them: field extraction (vision OCR), semantic classification
//! (reasoning model) and durable persistence. Implementations are injected
//! into the [`PipelineManager`](super::manager::PipelineManager) and must be
//! safely callable concurrently up to the configured pool widths.

use async_trait::async_trait;

use super::error::{ClassificationError, ExtractionError, PersistenceError};
use super::types::{Classification, FieldMap};

/// Turns normalized image bytes into a structured field map.
#[async_trait]
pub trait FieldExtractor: Send + Sync {
    async fn extract(
        &self,
        image: &[u8],
        media_type: &str,
        instructions: &str,
    ) -> Result<FieldMap, ExtractionError>;
}

/// Assigns HSN code, ledger and group labels to extracted invoice fields.
#[async_trait]
pub trait InvoiceClassifier: Send + Sync {
    async fn classify(&self, fields: &FieldMap) -> Result<Classification, ClassificationError>;
}

/// Commits a merged record to durable storage, returning its record id.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn persist(&self, record: &FieldMap) -> Result<String, PersistenceError>;
}
