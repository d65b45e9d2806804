//! Pipeline manager: owns the queues, the task table and the worker pools.
//!
//! The boundary the embedding service talks to: `submit` / `bulk_submit`
//! enqueue work and return immediately, `status` is a non-blocking snapshot,
//! `await_completion` is a polling convenience for callers that want
//! synchronous semantics, and `subscribe` exposes completion events as a
//! typed broadcast channel.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::config::PipelineConfig;

use super::error::SubmitError;
use super::store::TaskTable;
use super::traits::{FieldExtractor, InvoiceClassifier, RecordStore};
use super::types::{CompletionEvent, DocumentSubmission, TaskRecord, TaskView};
use super::workers::{
    classification_worker, extraction_worker, persistence_worker, stage_queue, SharedReceiver,
    StageSender, RECV_TIMEOUT,
};

/// Orchestrates the three-stage document pipeline.
///
/// Construction wires the capabilities and the (injected) task table;
/// nothing runs until [`start`](Self::start) is called. All methods take
/// `&self`; the manager is usually held in an `Arc` by the embedding
/// service.
pub struct PipelineManager {
    config: PipelineConfig,
    table: TaskTable,
    extractor: Arc<dyn FieldExtractor>,
    classifier: Arc<dyn InvoiceClassifier>,
    store: Arc<dyn RecordStore>,

    extract_tx: StageSender,
    extract_rx: SharedReceiver,
    classify_tx: StageSender,
    classify_rx: SharedReceiver,
    persist_tx: StageSender,
    persist_rx: SharedReceiver,

    completions: broadcast::Sender<CompletionEvent>,
    shutdown: Arc<AtomicBool>,
    started: AtomicBool,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl PipelineManager {
    /// Wire a manager from its collaborators.
    ///
    /// The task table is injected rather than created internally so tests
    /// and multi-tenant embeddings can run independent pipeline instances
    /// with fully separate state.
    pub fn new(
        extractor: Arc<dyn FieldExtractor>,
        classifier: Arc<dyn InvoiceClassifier>,
        store: Arc<dyn RecordStore>,
        table: TaskTable,
        config: PipelineConfig,
    ) -> Self {
        let (extract_tx, extract_rx) = stage_queue();
        let (classify_tx, classify_rx) = stage_queue();
        let (persist_tx, persist_rx) = stage_queue();
        let (completions, _) = broadcast::channel(config.completion_channel_capacity);

        Self {
            config,
            table,
            extractor,
            classifier,
            store,
            extract_tx,
            extract_rx,
            classify_tx,
            classify_rx,
            persist_tx,
            persist_rx,
            completions,
            shutdown: Arc::new(AtomicBool::new(false)),
            started: AtomicBool::new(false),
            handles: Mutex::new(Vec::new()),
        }
    }

    /// Spin up the worker pools and the retention sweeper.
    ///
    /// Idempotent: second and subsequent calls are no-ops. Documents
    /// submitted before `start` sit on the extraction queue until workers
    /// come up.
    pub fn start(&self) {
        if self.started.swap(true, Ordering::SeqCst) {
            tracing::debug!("pipeline already started");
            return;
        }

        let mut handles = self.handles.lock().unwrap_or_else(|e| e.into_inner());
        let instructions = Arc::new(self.config.extraction_instructions.clone());

        for worker_id in 0..self.config.extraction_workers {
            handles.push(tokio::spawn(extraction_worker(
                worker_id,
                self.extract_rx.clone(),
                self.classify_tx.clone(),
                self.table.clone(),
                self.extractor.clone(),
                instructions.clone(),
                self.shutdown.clone(),
            )));
        }
        for worker_id in 0..self.config.classification_workers {
            handles.push(tokio::spawn(classification_worker(
                worker_id,
                self.classify_rx.clone(),
                self.persist_tx.clone(),
                self.table.clone(),
                self.classifier.clone(),
                self.shutdown.clone(),
            )));
        }
        for worker_id in 0..self.config.persistence_workers {
            handles.push(tokio::spawn(persistence_worker(
                worker_id,
                self.persist_rx.clone(),
                self.table.clone(),
                self.store.clone(),
                self.completions.clone(),
                self.shutdown.clone(),
            )));
        }
        handles.push(tokio::spawn(retention_sweeper(
            self.table.clone(),
            self.config.retention,
            self.config.sweep_interval,
            self.shutdown.clone(),
        )));

        tracing::info!(
            extraction = self.config.extraction_workers,
            classification = self.config.classification_workers,
            persistence = self.config.persistence_workers,
            "pipeline started"
        );
    }

    /// Signal all workers to exit after their current unit of work.
    ///
    /// Hard-stop semantics, documented contract: in-flight external calls
    /// are not cancelled and their stage hand-off still happens, but
    /// queued-but-unstarted tasks are abandoned (they stay visible in their
    /// last status via `status`), and further `submit` calls fail with
    /// [`SubmitError::Stopped`]. A stopped manager is not restartable.
    pub fn stop(&self) {
        if !self.shutdown.swap(true, Ordering::SeqCst) {
            tracing::info!("pipeline stop requested");
        }
    }

    /// `stop()` plus waiting for every worker task to exit.
    pub async fn shutdown(&self) {
        self.stop();
        let drained: Vec<JoinHandle<()>> = {
            let mut handles = self.handles.lock().unwrap_or_else(|e| e.into_inner());
            handles.drain(..).collect()
        };
        for handle in drained {
            let _ = handle.await;
        }
        tracing::info!("pipeline stopped");
    }

    /// Queue a document for processing and return its task id immediately.
    ///
    /// Never blocks on any external call. The document must carry non-empty
    /// bytes and a declared media type; content is not inspected here, that
    /// is the extractor's job.
    pub fn submit(&self, document: DocumentSubmission) -> Result<String, SubmitError> {
        if self.shutdown.load(Ordering::Relaxed) {
            return Err(SubmitError::Stopped);
        }
        if document.file_bytes.is_empty() {
            return Err(SubmitError::EmptyDocument);
        }
        if document.media_type.trim().is_empty() {
            return Err(SubmitError::MissingMediaType);
        }

        let task = TaskRecord::new(document);
        let task_id = task.task_id.clone();
        self.table.insert(task);
        self.extract_tx
            .send(task_id.clone())
            .map_err(|_| SubmitError::Stopped)?;

        tracing::debug!(%task_id, "document queued for extraction");
        Ok(task_id)
    }

    /// Fan a batch of documents into `submit`, all-or-nothing on validation.
    ///
    /// No special bulk concurrency handling: each document gets its own
    /// task and flows through the same queues.
    pub fn bulk_submit(
        &self,
        documents: Vec<DocumentSubmission>,
    ) -> Result<Vec<String>, SubmitError> {
        for document in &documents {
            if document.file_bytes.is_empty() {
                return Err(SubmitError::EmptyDocument);
            }
            if document.media_type.trim().is_empty() {
                return Err(SubmitError::MissingMediaType);
            }
        }
        documents.into_iter().map(|d| self.submit(d)).collect()
    }

    /// Non-blocking status snapshot. Unknown ids (including evicted tasks)
    /// yield a `not_found` view rather than an error.
    pub fn status(&self, task_id: &str) -> TaskView {
        self.table
            .view(task_id)
            .unwrap_or_else(|| TaskView::not_found(task_id))
    }

    /// Poll `status` until the task is terminal or `timeout` elapses.
    ///
    /// On expiry a `timeout` pseudo-view is returned; the task keeps running
    /// in the background and remains discoverable via `status`. An unknown
    /// id returns `not_found` immediately.
    pub async fn await_completion(&self, task_id: &str, timeout: Duration) -> TaskView {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let view = self.status(task_id);
            if view.status.is_terminal() || view.status == super::types::TaskStatus::NotFound {
                return view;
            }
            if tokio::time::Instant::now() >= deadline {
                return TaskView::timed_out(task_id);
            }
            tokio::time::sleep(self.config.poll_interval).await;
        }
    }

    /// Subscribe to completion events. Events for tasks that complete while
    /// no subscriber exists are dropped.
    pub fn subscribe(&self) -> broadcast::Receiver<CompletionEvent> {
        self.completions.subscribe()
    }
}

/// Periodically evicts terminal tasks older than the retention window,
/// bounding task-table growth. Sleeps in short increments so shutdown is
/// observed promptly even with a long sweep interval.
async fn retention_sweeper(
    table: TaskTable,
    retention: Duration,
    sweep_interval: Duration,
    shutdown: Arc<AtomicBool>,
) {
    let retention = chrono::Duration::from_std(retention).unwrap_or(chrono::Duration::MAX);

    loop {
        let mut slept = Duration::ZERO;
        while slept < sweep_interval {
            if shutdown.load(Ordering::Relaxed) {
                return;
            }
            let step = RECV_TIMEOUT.min(sweep_interval - slept);
            tokio::time::sleep(step).await;
            slept += step;
        }

        let evicted = table.evict_terminal_before(Utc::now() - retention);
        if evicted > 0 {
            tracing::debug!(evicted, remaining = table.len(), "evicted tasks past retention");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::error::{
        ClassificationError, ExtractionError, PersistenceError,
    };
    use crate::pipeline::merge::DEFAULT_HSN_CODE;
    use crate::pipeline::types::{Classification, ConfidenceTier, FieldMap, TaskStatus};
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::io::Cursor;
    use std::sync::atomic::AtomicUsize;
    use std::time::Instant;

    // -- Mock capabilities ---------------------------------------------------

    struct MockExtractor {
        fields: FieldMap,
        delay: Duration,
        fail_with: Option<String>,
        calls: AtomicUsize,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl MockExtractor {
        fn returning(fields: FieldMap) -> Self {
            Self {
                fields,
                delay: Duration::ZERO,
                fail_with: None,
                calls: AtomicUsize::new(0),
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
            }
        }

        fn failing(message: &str) -> Self {
            let mut m = Self::returning(FieldMap::new());
            m.fail_with = Some(message.to_string());
            m
        }

        fn slow(fields: FieldMap, delay: Duration) -> Self {
            let mut m = Self::returning(fields);
            m.delay = delay;
            m
        }
    }

    #[async_trait]
    impl FieldExtractor for MockExtractor {
        async fn extract(
            &self,
            _image: &[u8],
            _media_type: &str,
            _instructions: &str,
        ) -> Result<FieldMap, ExtractionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            match &self.fail_with {
                Some(message) => Err(ExtractionError::Upstream(message.clone())),
                None => Ok(self.fields.clone()),
            }
        }
    }

    struct MockClassifier {
        labels: Classification,
        fail: bool,
    }

    impl MockClassifier {
        fn returning(labels: Classification) -> Self {
            Self { labels, fail: false }
        }

        fn failing() -> Self {
            Self {
                labels: purchase_labels(),
                fail: true,
            }
        }
    }

    #[async_trait]
    impl InvoiceClassifier for MockClassifier {
        async fn classify(
            &self,
            _fields: &FieldMap,
        ) -> Result<Classification, ClassificationError> {
            if self.fail {
                Err(ClassificationError::Upstream("model unavailable".into()))
            } else {
                Ok(self.labels.clone())
            }
        }
    }

    struct MockStore {
        fail: bool,
        committed: AtomicUsize,
    }

    impl MockStore {
        fn working() -> Self {
            Self { fail: false, committed: AtomicUsize::new(0) }
        }

        fn failing() -> Self {
            Self { fail: true, committed: AtomicUsize::new(0) }
        }
    }

    #[async_trait]
    impl RecordStore for MockStore {
        async fn persist(&self, _record: &FieldMap) -> Result<String, PersistenceError> {
            if self.fail {
                return Err(PersistenceError::Storage("disk full".into()));
            }
            let n = self.committed.fetch_add(1, Ordering::SeqCst);
            Ok(format!("rec-{n}"))
        }
    }

    // -- Helpers -------------------------------------------------------------

    fn acme_fields() -> FieldMap {
        let Value::Object(map) = json!({"vendor_name": "Acme", "grand_total": 100}) else {
            unreachable!()
        };
        map
    }

    fn purchase_labels() -> Classification {
        Classification {
            hsn_code: "9999".into(),
            ledger_name: "Purchase A/c".into(),
            group_name: "Purchase Accounts".into(),
            confidence: ConfidenceTier::High,
        }
    }

    fn tiny_png() -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        image::DynamicImage::ImageRgb8(image::RgbImage::new(1, 1))
            .write_to(&mut buf, image::ImageFormat::Png)
            .unwrap();
        buf.into_inner()
    }

    fn submission() -> DocumentSubmission {
        DocumentSubmission::new("invoice.png", tiny_png(), "image/png")
    }

    fn manager_with(
        extractor: MockExtractor,
        classifier: MockClassifier,
        store: MockStore,
        config: PipelineConfig,
    ) -> (PipelineManager, Arc<MockExtractor>) {
        let extractor = Arc::new(extractor);
        let manager = PipelineManager::new(
            extractor.clone(),
            Arc::new(classifier),
            Arc::new(store),
            TaskTable::new(),
            config,
        );
        (manager, extractor)
    }

    fn happy_manager() -> (PipelineManager, Arc<MockExtractor>) {
        manager_with(
            MockExtractor::returning(acme_fields()),
            MockClassifier::returning(purchase_labels()),
            MockStore::working(),
            PipelineConfig::default(),
        )
    }

    const WAIT: Duration = Duration::from_secs(5);

    // -- Lifecycle -----------------------------------------------------------

    #[tokio::test]
    async fn document_flows_to_completion() {
        let (manager, _) = happy_manager();
        manager.start();
        let mut events = manager.subscribe();

        let id = manager.submit(submission()).unwrap();
        let view = manager.await_completion(&id, WAIT).await;

        assert_eq!(view.status, TaskStatus::Completed);
        assert!(view.error.is_none());
        let result = view.result.expect("completed task exposes merged result");
        assert_eq!(result["vendor_name"], "Acme");
        assert_eq!(result["hsn_code"], "9999");
        assert_eq!(result["ai_confidence"], "high");
        assert_eq!(result["filename"], "invoice.png");

        let event = events.recv().await.unwrap();
        assert_eq!(event.task_id, id);
        assert_eq!(event.record_id, "rec-0");
        assert_eq!(event.result["vendor_name"], "Acme");
    }

    #[tokio::test]
    async fn extraction_failure_is_terminal() {
        let (manager, _) = manager_with(
            MockExtractor::failing("corrupt"),
            MockClassifier::returning(purchase_labels()),
            MockStore::working(),
            PipelineConfig::default(),
        );
        manager.start();

        let id = manager.submit(submission()).unwrap();
        let view = manager.await_completion(&id, WAIT).await;

        assert_eq!(view.status, TaskStatus::Failed);
        assert!(view.error.unwrap().contains("corrupt"));
        assert!(view.result.is_none());
    }

    #[tokio::test]
    async fn classification_failure_degrades_not_fails() {
        let (manager, _) = manager_with(
            MockExtractor::returning(acme_fields()),
            MockClassifier::failing(),
            MockStore::working(),
            PipelineConfig::default(),
        );
        manager.start();

        let id = manager.submit(submission()).unwrap();
        let view = manager.await_completion(&id, WAIT).await;

        assert_eq!(view.status, TaskStatus::Completed);
        assert!(view.error.is_none());
        assert!(view.warning.unwrap().contains("model unavailable"));
        let result = view.result.unwrap();
        assert_eq!(result["hsn_code"], DEFAULT_HSN_CODE);
        assert_eq!(result["vendor_name"], "Acme");
    }

    #[tokio::test]
    async fn persistence_failure_is_terminal() {
        let (manager, _) = manager_with(
            MockExtractor::returning(acme_fields()),
            MockClassifier::returning(purchase_labels()),
            MockStore::failing(),
            PipelineConfig::default(),
        );
        manager.start();

        let id = manager.submit(submission()).unwrap();
        let view = manager.await_completion(&id, WAIT).await;

        assert_eq!(view.status, TaskStatus::Failed);
        assert!(view.error.unwrap().contains("disk full"));
        assert!(view.result.is_none());
    }

    #[tokio::test]
    async fn unsupported_container_fails_extraction() {
        let (manager, extractor) = happy_manager();
        manager.start();

        let doc = DocumentSubmission::new("scan.pdf", b"%PDF-1.7".to_vec(), "application/pdf");
        let id = manager.submit(doc).unwrap();
        let view = manager.await_completion(&id, WAIT).await;

        assert_eq!(view.status, TaskStatus::Failed);
        assert!(view.error.unwrap().contains("application/pdf"));
        // Normalization failed before the extractor was ever called.
        assert_eq!(extractor.calls.load(Ordering::SeqCst), 0);
    }

    // -- Concurrency ---------------------------------------------------------

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn extraction_concurrency_is_bounded_by_pool_size() {
        let config = PipelineConfig {
            extraction_workers: 3,
            ..PipelineConfig::default()
        };
        let (manager, extractor) = manager_with(
            MockExtractor::slow(acme_fields(), Duration::from_millis(200)),
            MockClassifier::returning(purchase_labels()),
            MockStore::working(),
            config,
        );
        manager.start();

        let start = Instant::now();
        let ids: Vec<String> = (0..10).map(|_| manager.submit(submission()).unwrap()).collect();
        for id in &ids {
            let view = manager.await_completion(id, WAIT).await;
            assert_eq!(view.status, TaskStatus::Completed);
        }

        assert!(extractor.max_in_flight.load(Ordering::SeqCst) <= 3);
        assert_eq!(extractor.calls.load(Ordering::SeqCst), 10);
        // 10 docs through 3 workers at 200ms each ≈ 800ms, far below serial.
        assert!(start.elapsed() < Duration::from_millis(1900), "took {:?}", start.elapsed());
    }

    #[tokio::test]
    async fn submit_is_non_blocking_with_slow_extractor() {
        let (manager, _) = manager_with(
            MockExtractor::slow(acme_fields(), Duration::from_secs(2)),
            MockClassifier::returning(purchase_labels()),
            MockStore::working(),
            PipelineConfig::default(),
        );
        manager.start();

        let start = Instant::now();
        manager.submit(submission()).unwrap();
        assert!(start.elapsed() < Duration::from_millis(100));
    }

    #[tokio::test]
    async fn statuses_never_regress_under_polling() {
        let (manager, _) = manager_with(
            MockExtractor::slow(acme_fields(), Duration::from_millis(50)),
            MockClassifier::returning(purchase_labels()),
            MockStore::working(),
            PipelineConfig::default(),
        );
        manager.start();
        let id = manager.submit(submission()).unwrap();

        let deadline = Instant::now() + WAIT;
        let mut observed = Vec::new();
        loop {
            let status = manager.status(&id).status;
            observed.push(status);
            if status.is_terminal() || Instant::now() > deadline {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        let ranks: Vec<u8> = observed.iter().filter_map(|s| s.rank()).collect();
        assert!(ranks.windows(2).all(|w| w[0] <= w[1]), "regression in {observed:?}");
        assert_eq!(*observed.last().unwrap(), TaskStatus::Completed);
    }

    // -- Submit/poll API -----------------------------------------------------

    #[tokio::test]
    async fn identical_documents_get_distinct_ids() {
        let (manager, _) = happy_manager();
        let a = manager.submit(submission()).unwrap();
        let b = manager.submit(submission()).unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn unknown_id_reports_not_found() {
        let (manager, _) = happy_manager();
        let view = manager.status("nonexistent-id");
        assert_eq!(view.status, TaskStatus::NotFound);

        let awaited = manager.await_completion("nonexistent-id", WAIT).await;
        assert_eq!(awaited.status, TaskStatus::NotFound);
    }

    #[tokio::test]
    async fn await_completion_times_out_without_cancelling() {
        let (manager, _) = manager_with(
            MockExtractor::slow(acme_fields(), Duration::from_millis(300)),
            MockClassifier::returning(purchase_labels()),
            MockStore::working(),
            PipelineConfig {
                poll_interval: Duration::from_millis(10),
                ..PipelineConfig::default()
            },
        );
        manager.start();
        let id = manager.submit(submission()).unwrap();

        let early = manager.await_completion(&id, Duration::from_millis(50)).await;
        assert_eq!(early.status, TaskStatus::Timeout);

        // The task kept running in the background.
        let done = manager.await_completion(&id, WAIT).await;
        assert_eq!(done.status, TaskStatus::Completed);
    }

    #[tokio::test]
    async fn empty_document_is_rejected() {
        let (manager, _) = happy_manager();
        let doc = DocumentSubmission::new("empty.png", Vec::new(), "image/png");
        assert_eq!(manager.submit(doc), Err(SubmitError::EmptyDocument));
    }

    #[tokio::test]
    async fn missing_media_type_is_rejected() {
        let (manager, _) = happy_manager();
        let doc = DocumentSubmission::new("blob.bin", vec![1], "  ");
        assert_eq!(manager.submit(doc), Err(SubmitError::MissingMediaType));
    }

    #[tokio::test]
    async fn bulk_submit_fans_out() {
        let (manager, _) = happy_manager();
        manager.start();

        let ids = manager
            .bulk_submit(vec![submission(), submission(), submission()])
            .unwrap();
        assert_eq!(ids.len(), 3);
        assert_ne!(ids[0], ids[1]);

        for id in &ids {
            let view = manager.await_completion(id, WAIT).await;
            assert_eq!(view.status, TaskStatus::Completed);
        }
    }

    #[tokio::test]
    async fn bulk_submit_validates_before_queueing() {
        let (manager, _) = happy_manager();
        let bad = vec![
            submission(),
            DocumentSubmission::new("empty.png", Vec::new(), "image/png"),
        ];
        assert_eq!(manager.bulk_submit(bad), Err(SubmitError::EmptyDocument));
        // Nothing from the batch was admitted.
        assert!(manager.table.is_empty());
    }

    // -- Start/stop ----------------------------------------------------------

    #[tokio::test]
    async fn start_is_idempotent() {
        let (manager, extractor) = happy_manager();
        manager.start();
        manager.start();

        let id = manager.submit(submission()).unwrap();
        let view = manager.await_completion(&id, WAIT).await;
        assert_eq!(view.status, TaskStatus::Completed);
        assert_eq!(extractor.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn stop_rejects_new_submissions_and_workers_exit() {
        let (manager, _) = happy_manager();
        manager.start();

        let id = manager.submit(submission()).unwrap();
        let view = manager.await_completion(&id, WAIT).await;
        assert_eq!(view.status, TaskStatus::Completed);

        manager.shutdown().await;
        assert_eq!(manager.submit(submission()), Err(SubmitError::Stopped));

        // Completed tasks stay queryable after stop.
        assert_eq!(manager.status(&id).status, TaskStatus::Completed);
    }

    #[tokio::test]
    async fn stop_is_idempotent() {
        let (manager, _) = happy_manager();
        manager.start();
        manager.stop();
        manager.stop();
        manager.shutdown().await;
    }

    // -- Retention -----------------------------------------------------------

    #[tokio::test]
    async fn terminal_tasks_are_evicted_after_retention() {
        let (manager, _) = manager_with(
            MockExtractor::returning(acme_fields()),
            MockClassifier::returning(purchase_labels()),
            MockStore::working(),
            PipelineConfig {
                retention: Duration::ZERO,
                sweep_interval: Duration::from_millis(20),
                ..PipelineConfig::default()
            },
        );
        manager.start();

        let id = manager.submit(submission()).unwrap();
        let view = manager.await_completion(&id, WAIT).await;
        assert_eq!(view.status, TaskStatus::Completed);

        let deadline = Instant::now() + WAIT;
        loop {
            if manager.status(&id).status == TaskStatus::NotFound {
                break;
            }
            assert!(Instant::now() < deadline, "task was never evicted");
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}
