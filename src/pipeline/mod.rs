//! Asynchronous document-processing pipeline.
//!
//! A producer-consumer conveyor with three stage queues:
//! ```text
//! submit → [extraction queue] → extraction pool → [classification queue]
//!        → classification pool → [persistence queue] → persistence pool → done
//! ```
//!
//! ## Design principles
//! - Submit never blocks on an external call; callers poll `status` or
//!   subscribe to completion events.
//! - Queues carry task ids only; all task data lives in the [`TaskTable`],
//!   and a task is owned by at most one worker at any instant.
//! - Extraction failures are terminal; classification failures degrade the
//!   result (safe defaults) instead of dropping the document.
//! - No automatic retries anywhere; retry policy belongs to the caller or
//!   to the capability implementations.

pub mod error;
pub mod types;
pub mod traits;
pub mod prompts;
pub mod normalize;
pub mod merge;
pub mod store;
pub mod workers;
pub mod manager;

pub use error::{ClassificationError, ExtractionError, PersistenceError, SubmitError};
pub use types::{
    Classification, CompletionEvent, ConfidenceTier, DocumentSubmission, FieldMap, TaskRecord,
    TaskStatus, TaskView,
};
pub use traits::{FieldExtractor, InvoiceClassifier, RecordStore};
pub use store::TaskTable;
pub use manager::PipelineManager;
