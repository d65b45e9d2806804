//! Stage worker loops.
//!
//! Each stage runs a pool of identical tokio tasks consuming one shared
//! queue of task ids. Workers dequeue with a short timeout so the shutdown
//! flag is observed within a bounded interval even when the queue is idle;
//! an in-flight unit of work always runs to its hand-off or terminal state.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, Mutex};

use super::merge::merge_results;
use super::normalize::normalize_for_extraction;
use super::store::TaskTable;
use super::traits::{FieldExtractor, InvoiceClassifier, RecordStore};
use super::types::{CompletionEvent, TaskStatus};

/// Producer side of a stage queue. Queues carry task ids only.
pub(crate) type StageSender = mpsc::UnboundedSender<String>;

/// Consumer side of a stage queue, shared across a worker pool. Only one
/// worker dequeues at a time; the task's ownership transfers with the id.
pub(crate) type SharedReceiver = Arc<Mutex<mpsc::UnboundedReceiver<String>>>;

/// How long a worker waits on its queue before re-checking shutdown.
pub(crate) const RECV_TIMEOUT: Duration = Duration::from_millis(250);

pub(crate) fn stage_queue() -> (StageSender, SharedReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (tx, Arc::new(Mutex::new(rx)))
}

/// Dequeue the next task id, or `None` once the pool should exit
/// (shutdown requested, or the queue closed).
async fn next_task(rx: &SharedReceiver, shutdown: &AtomicBool) -> Option<String> {
    loop {
        if shutdown.load(Ordering::Relaxed) {
            return None;
        }
        let received = {
            let mut guard = rx.lock().await;
            tokio::time::timeout(RECV_TIMEOUT, guard.recv()).await
        };
        match received {
            Ok(Some(task_id)) => return Some(task_id),
            Ok(None) => return None,
            Err(_) => continue, // timeout → re-check shutdown
        }
    }
}

// ───────────────────────────────────────────
// Extraction workers
// ───────────────────────────────────────────

/// Extraction worker: normalize input, call the field extractor, hand off to
/// classification. Failure here is terminal for the task.
pub(crate) async fn extraction_worker(
    worker_id: usize,
    rx: SharedReceiver,
    classify_tx: StageSender,
    table: TaskTable,
    extractor: Arc<dyn FieldExtractor>,
    instructions: Arc<String>,
    shutdown: Arc<AtomicBool>,
) {
    tracing::debug!(worker_id, "extraction worker started");

    while let Some(task_id) = next_task(&rx, &shutdown).await {
        let Some(payload) = table.with_record(&task_id, |task| {
            task.advance(TaskStatus::Extracting);
            (task.file_bytes.clone(), task.media_type.clone())
        }) else {
            tracing::warn!(%task_id, "unknown task id on extraction queue");
            continue;
        };
        let (bytes, media_type) = payload;

        let outcome = match normalize_for_extraction(bytes, &media_type) {
            Ok(input) => {
                extractor
                    .extract(&input.bytes, &input.media_type, &instructions)
                    .await
            }
            Err(e) => Err(e),
        };

        match outcome {
            Ok(fields) => {
                tracing::debug!(worker_id, %task_id, fields = fields.len(), "extraction complete");
                table.with_record(&task_id, |task| {
                    task.extraction = Some(fields);
                    task.advance(TaskStatus::Classifying);
                });
                if classify_tx.send(task_id.clone()).is_err() {
                    tracing::error!(%task_id, "classification queue closed, task stranded");
                }
            }
            Err(e) => {
                tracing::warn!(worker_id, %task_id, error = %e, "extraction failed");
                table.with_record(&task_id, |task| {
                    task.error = Some(e.to_string());
                    task.advance(TaskStatus::Failed);
                });
            }
        }
    }

    tracing::debug!(worker_id, "extraction worker stopped");
}

// ───────────────────────────────────────────
// Classification workers
// ───────────────────────────────────────────

/// Classification worker. Failure here is deliberately non-fatal: the task
/// proceeds to persistence with default labels so extracted data is never
/// lost to a classifier outage.
pub(crate) async fn classification_worker(
    worker_id: usize,
    rx: SharedReceiver,
    persist_tx: StageSender,
    table: TaskTable,
    classifier: Arc<dyn InvoiceClassifier>,
    shutdown: Arc<AtomicBool>,
) {
    tracing::debug!(worker_id, "classification worker started");

    while let Some(task_id) = next_task(&rx, &shutdown).await {
        let Some(fields) = table
            .with_record(&task_id, |task| task.extraction.clone())
            .flatten()
        else {
            tracing::warn!(%task_id, "task on classification queue without extraction data");
            continue;
        };

        match classifier.classify(&fields).await {
            Ok(labels) => {
                tracing::debug!(
                    worker_id,
                    %task_id,
                    hsn_code = %labels.hsn_code,
                    confidence = %labels.confidence,
                    "classification complete"
                );
                table.with_record(&task_id, |task| {
                    task.classification = Some(labels);
                    task.advance(TaskStatus::Persisting);
                });
            }
            Err(e) => {
                tracing::warn!(
                    worker_id,
                    %task_id,
                    error = %e,
                    "classification failed, continuing with defaults"
                );
                table.with_record(&task_id, |task| {
                    task.classification_error = Some(e.to_string());
                    task.advance(TaskStatus::Persisting);
                });
            }
        }

        if persist_tx.send(task_id.clone()).is_err() {
            tracing::error!(%task_id, "persistence queue closed, task stranded");
        }
    }

    tracing::debug!(worker_id, "classification worker stopped");
}

// ───────────────────────────────────────────
// Persistence workers
// ───────────────────────────────────────────

/// Persistence worker: merge available results, commit, mark completed and
/// broadcast the completion event. Commit failure is the one path to
/// `Failed` after `Persisting`.
pub(crate) async fn persistence_worker(
    worker_id: usize,
    rx: SharedReceiver,
    table: TaskTable,
    store: Arc<dyn RecordStore>,
    completions: broadcast::Sender<CompletionEvent>,
    shutdown: Arc<AtomicBool>,
) {
    tracing::debug!(worker_id, "persistence worker started");

    while let Some(task_id) = next_task(&rx, &shutdown).await {
        let Some(merged) = table.with_record(&task_id, |task| {
            task.advance(TaskStatus::Persisting);
            merge_results(task)
        }) else {
            tracing::warn!(%task_id, "unknown task id on persistence queue");
            continue;
        };

        match store.persist(&merged).await {
            Ok(record_id) => {
                let duration_ms = table
                    .with_record(&task_id, |task| {
                        task.final_record = Some(merged.clone());
                        task.advance(TaskStatus::Completed);
                        task.processing_ms().unwrap_or(0)
                    })
                    .unwrap_or(0);

                tracing::info!(worker_id, %task_id, %record_id, duration_ms, "task completed");

                // Fire-and-forget; no subscribers is fine.
                let _ = completions.send(CompletionEvent {
                    task_id: task_id.clone(),
                    record_id,
                    duration_ms,
                    result: merged,
                });
            }
            Err(e) => {
                tracing::error!(worker_id, %task_id, error = %e, "persistence failed");
                table.with_record(&task_id, |task| {
                    task.error = Some(e.to_string());
                    task.advance(TaskStatus::Failed);
                });
            }
        }
    }

    tracing::debug!(worker_id, "persistence worker stopped");
}
