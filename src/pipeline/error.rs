//! Pipeline error taxonomy.
//!
//! Each stage has its own error type so the failure policy can differ per
//! stage: extraction errors are terminal, classification errors degrade the
//! result, persistence errors are terminal after partial work.

use thiserror::Error;

/// Unusable input or extractor failure. Terminal: the task is marked
/// `Failed` and the message is surfaced verbatim via `status`.
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// The declared container cannot be normalized into an image the
    /// extractor consumes.
    #[error("Unsupported document container: {0}")]
    UnsupportedContainer(String),

    #[error("Input normalization failed: {0}")]
    Normalization(String),

    /// The external field-extraction capability failed.
    #[error("Extraction failed: {0}")]
    Upstream(String),
}

/// Categorization failure. Recovered locally: recorded on the task, the
/// document proceeds to persistence with default classification values.
#[derive(Error, Debug)]
pub enum ClassificationError {
    #[error("Classification failed: {0}")]
    Upstream(String),

    #[error("Classifier returned an unusable response: {0}")]
    Malformed(String),
}

/// Commit failure. Terminal: the one path that can mark a task `Failed`
/// after it reached `Persisting`.
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("Persistence failed: {0}")]
    Storage(String),
}

/// Submission rejected before a task was created.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SubmitError {
    #[error("Document has no content")]
    EmptyDocument,

    #[error("Document has no declared media type")]
    MissingMediaType,

    #[error("Pipeline is stopped and no longer accepts submissions")]
    Stopped,
}
