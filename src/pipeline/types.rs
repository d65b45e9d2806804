//! Core types for the document-processing pipeline.
//!
//! These model the full task lifecycle:
//! Submission → Extraction → Classification → Persistence → Completion.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::DEFAULT_DOC_TYPE;

/// Structured fields flowing between stages (extractor output, merged record).
pub type FieldMap = serde_json::Map<String, serde_json::Value>;

// ───────────────────────────────────────────
// Task status
// ───────────────────────────────────────────

/// Lifecycle status of a processing task.
///
/// The first six variants form the state machine proper and only ever move
/// forward (see [`TaskRecord::advance`]). `NotFound` and `Timeout` are
/// view-only pseudo-statuses returned by status lookups; they are never
/// stored in the task table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Queued,
    Extracting,
    Classifying,
    Persisting,
    Completed,
    Failed,
    NotFound,
    #[serde(rename = "timeout")]
    Timeout,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Extracting => "extracting",
            Self::Classifying => "classifying",
            Self::Persisting => "persisting",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::NotFound => "not_found",
            Self::Timeout => "timeout",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "queued" => Some(Self::Queued),
            "extracting" => Some(Self::Extracting),
            "classifying" => Some(Self::Classifying),
            "persisting" => Some(Self::Persisting),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            "not_found" => Some(Self::NotFound),
            "timeout" => Some(Self::Timeout),
            _ => None,
        }
    }

    /// Position in the forward-only state order. `None` for pseudo-statuses.
    /// `Failed` ranks above every non-terminal state so a failure from any
    /// stage is always a forward move.
    pub fn rank(&self) -> Option<u8> {
        match self {
            Self::Queued => Some(0),
            Self::Extracting => Some(1),
            Self::Classifying => Some(2),
            Self::Persisting => Some(3),
            Self::Completed => Some(4),
            Self::Failed => Some(4),
            Self::NotFound | Self::Timeout => None,
        }
    }

    /// Terminal statuses admit no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ───────────────────────────────────────────
// Submission
// ───────────────────────────────────────────

/// A document handed to `submit`, with caller-supplied context.
#[derive(Debug, Clone)]
pub struct DocumentSubmission {
    pub file_name: String,
    pub file_bytes: Vec<u8>,
    /// Declared media type, e.g. `image/png`. The manager validates that one
    /// is declared but never inspects document content, that is the
    /// extractor's job.
    pub media_type: String,
    /// Destination client this invoice belongs to.
    pub client_id: Option<i64>,
    pub doc_type: String,
    pub entered_by: Option<String>,
}

impl DocumentSubmission {
    pub fn new(
        file_name: impl Into<String>,
        file_bytes: Vec<u8>,
        media_type: impl Into<String>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            file_bytes,
            media_type: media_type.into(),
            client_id: None,
            doc_type: DEFAULT_DOC_TYPE.to_string(),
            entered_by: None,
        }
    }
}

// ───────────────────────────────────────────
// Classification output
// ───────────────────────────────────────────

/// Confidence tier reported by the classification capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceTier {
    High,
    Medium,
    Low,
}

impl ConfidenceTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

impl std::fmt::Display for ConfidenceTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Semantic labels produced by the classification stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Classification {
    /// HSN/SAC code, e.g. "9983".
    pub hsn_code: String,
    /// Tally ledger name, e.g. "Purchase @ 18%".
    pub ledger_name: String,
    /// Tally group name, e.g. "Purchase Accounts".
    pub group_name: String,
    pub confidence: ConfidenceTier,
}

// ───────────────────────────────────────────
// Task record
// ───────────────────────────────────────────

/// One document's end-to-end processing record.
///
/// Exclusively owned by the pipeline's task table; workers mutate it only
/// through [`TaskTable::with_record`](super::store::TaskTable::with_record),
/// and ownership transfers at each queue hand-off, so no per-task lock is
/// needed.
#[derive(Debug, Clone)]
pub struct TaskRecord {
    pub task_id: String,
    pub file_name: String,
    pub file_bytes: Vec<u8>,
    pub media_type: String,
    pub client_id: Option<i64>,
    pub doc_type: String,
    pub entered_by: Option<String>,

    pub status: TaskStatus,
    pub extraction: Option<FieldMap>,
    pub classification: Option<Classification>,
    /// Populated only at completion.
    pub final_record: Option<FieldMap>,
    /// Fatal error message (extraction or persistence failure).
    pub error: Option<String>,
    /// Non-fatal classification failure, kept for diagnostics. The task
    /// still completes with default classification values.
    pub classification_error: Option<String>,

    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl TaskRecord {
    /// Build a fresh `Queued` record with a generated task id.
    pub fn new(submission: DocumentSubmission) -> Self {
        Self {
            task_id: Uuid::new_v4().to_string(),
            file_name: submission.file_name,
            file_bytes: submission.file_bytes,
            media_type: submission.media_type,
            client_id: submission.client_id,
            doc_type: submission.doc_type,
            entered_by: submission.entered_by,
            status: TaskStatus::Queued,
            extraction: None,
            classification: None,
            final_record: None,
            error: None,
            classification_error: None,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    /// Advance the status, enforcing the forward-only invariant.
    ///
    /// Returns `true` if the transition was applied. Regressions and
    /// transitions out of a terminal state are ignored, as are the view-only
    /// pseudo-statuses.
    pub fn advance(&mut self, next: TaskStatus) -> bool {
        let (Some(current), Some(target)) = (self.status.rank(), next.rank()) else {
            return false;
        };
        if self.status.is_terminal() || target < current || self.status == next {
            return false;
        }
        self.status = next;
        if next.is_terminal() {
            self.completed_at = Some(Utc::now());
        }
        true
    }

    /// Processing latency, available once the task is terminal.
    pub fn processing_ms(&self) -> Option<u64> {
        let done = self.completed_at?;
        Some((done - self.created_at).num_milliseconds().max(0) as u64)
    }

    /// Snapshot for status queries. The merged result is exposed only when
    /// the task has completed.
    pub fn view(&self) -> TaskView {
        TaskView {
            task_id: self.task_id.clone(),
            status: self.status,
            file_name: Some(self.file_name.clone()),
            error: self.error.clone(),
            warning: self.classification_error.clone(),
            result: if self.status == TaskStatus::Completed {
                self.final_record.clone()
            } else {
                None
            },
        }
    }
}

// ───────────────────────────────────────────
// Status view
// ───────────────────────────────────────────

/// Caller-facing snapshot of a task, returned by `status` and
/// `await_completion`.
#[derive(Debug, Clone, Serialize)]
pub struct TaskView {
    pub task_id: String,
    pub status: TaskStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Non-fatal degradation note (classification failure).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<FieldMap>,
}

impl TaskView {
    /// View for an unknown (or already evicted) task id.
    pub fn not_found(task_id: &str) -> Self {
        Self {
            task_id: task_id.to_string(),
            status: TaskStatus::NotFound,
            file_name: None,
            error: None,
            warning: None,
            result: None,
        }
    }

    /// Pseudo-view returned when `await_completion` expires. The task keeps
    /// running in the background and stays discoverable via `status`.
    pub fn timed_out(task_id: &str) -> Self {
        Self {
            task_id: task_id.to_string(),
            status: TaskStatus::Timeout,
            file_name: None,
            error: None,
            warning: None,
            result: None,
        }
    }
}

// ───────────────────────────────────────────
// Completion events
// ───────────────────────────────────────────

/// Broadcast to subscribers when a task completes.
///
/// Fire-and-forget: delivery failures never roll back the `Completed` state.
#[derive(Debug, Clone, Serialize)]
pub struct CompletionEvent {
    pub task_id: String,
    /// Identifier returned by the persistence capability.
    pub record_id: String,
    pub duration_ms: u64,
    pub result: FieldMap,
}
