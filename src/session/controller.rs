//! Copilot session controller
//!
//! [`CopilotSession`] owns the transcript and coordinates one action at a
//! time: a natural-language query or a contract upload. Each action passes
//! the usage gate, is counted, calls the governance API, optionally reveals
//! the reply word by word, and commits exactly one assistant message.
//!
//! The session is `Send + Sync` and every operation takes `&self`, so it can
//! be shared behind an `Arc` between an input loop and background tasks.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use tokio_util::sync::CancellationToken;

use crate::api::{ContractUpload, CopilotApi, ProgressCallback, QueryFilters, QueryRequest, UploadFilters};
use crate::config::CopilotConfig;
use crate::error::Result;
use crate::session::events::{DataEvent, EventBus};
use crate::session::gate::{UsageGate, UsageSnapshot};
use crate::session::message::Message;
use crate::session::streaming::{reveal, RevealOutcome, RevealSink, RevealTiming};
use crate::storage::UsageStore;

/// Kind of in-flight action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Query,
    Upload,
}

/// Session activity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Busy(ActionKind),
}

impl SessionState {
    pub fn is_busy(&self) -> bool {
        matches!(self, SessionState::Busy(_))
    }
}

/// Result of submitting an action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The action ran and an assistant message was committed
    Completed {
        /// Whether the committed message describes a failure
        failed: bool,
    },
    /// The free-tier limit was reached; nothing was sent
    GateRejected,
    /// Another action is in flight; the call was ignored
    Busy,
    /// The input was rejected before anything happened
    Invalid(String),
}

impl SubmitOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, SubmitOutcome::Completed { failed: false })
    }
}

/// Returns the session to idle when dropped
struct BusyGuard<'a> {
    state: &'a Mutex<SessionState>,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        *lock(self.state) = SessionState::Idle;
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Conversational controller for queries and contract uploads
pub struct CopilotSession {
    api: Arc<dyn CopilotApi>,
    gate: UsageGate,
    transcript: Mutex<Vec<Message>>,
    state: Mutex<SessionState>,
    filters: RwLock<QueryFilters>,
    upload_progress: Arc<AtomicU8>,
    events: EventBus,
    presenter: Option<Arc<dyn RevealSink>>,
    query_timing: RevealTiming,
    upload_timing: RevealTiming,
    shutdown: CancellationToken,
}

impl CopilotSession {
    /// Create a session, loading persisted usage state from `store`
    ///
    /// # Errors
    ///
    /// Returns a storage error if the usage state cannot be read
    ///
    /// # Examples
    ///
    /// ```
    /// use governai::api::fake::FakeApi;
    /// use governai::config::CopilotConfig;
    /// use governai::session::{CopilotSession, SessionState};
    /// use governai::storage::MemoryUsageStore;
    /// use std::sync::Arc;
    ///
    /// let session = CopilotSession::new(
    ///     Arc::new(FakeApi::new()),
    ///     Arc::new(MemoryUsageStore::new()),
    ///     &CopilotConfig::default(),
    /// )
    /// .unwrap();
    /// assert_eq!(session.state(), SessionState::Idle);
    /// assert!(session.transcript().is_empty());
    /// ```
    pub fn new(
        api: Arc<dyn CopilotApi>,
        store: Arc<dyn UsageStore>,
        config: &CopilotConfig,
    ) -> Result<Self> {
        let gate = UsageGate::load(store, config.free_query_limit)?;
        Ok(Self {
            api,
            gate,
            transcript: Mutex::new(Vec::new()),
            state: Mutex::new(SessionState::Idle),
            filters: RwLock::new(QueryFilters::default()),
            upload_progress: Arc::new(AtomicU8::new(0)),
            events: EventBus::new(),
            presenter: None,
            query_timing: config.query_timing(),
            upload_timing: config.upload_timing(),
            shutdown: CancellationToken::new(),
        })
    }

    /// Attach a presenter that receives reveal frames and upload progress
    pub fn with_presenter(mut self, presenter: Arc<dyn RevealSink>) -> Self {
        self.presenter = Some(presenter);
        self
    }

    /// Publish data events on an existing bus
    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = events;
        self
    }

    /// Replace the filter context sent with every query
    pub fn set_filters(&self, filters: QueryFilters) {
        *self
            .filters
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = filters;
    }

    /// Filter context sent with every query
    pub fn filters(&self) -> QueryFilters {
        self.filters
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Snapshot of the transcript in insertion order
    pub fn transcript(&self) -> Vec<Message> {
        lock(&self.transcript).clone()
    }

    /// Most recent message, if any
    pub fn last_message(&self) -> Option<Message> {
        lock(&self.transcript).last().cloned()
    }

    pub fn state(&self) -> SessionState {
        *lock(&self.state)
    }

    pub fn usage(&self) -> UsageSnapshot {
        self.gate.snapshot()
    }

    /// Upload progress percentage; zero when no upload is in flight
    pub fn upload_progress(&self) -> u8 {
        self.upload_progress.load(Ordering::SeqCst)
    }

    pub fn upgrade_prompt_visible(&self) -> bool {
        self.gate.prompt_visible()
    }

    pub fn dismiss_upgrade_prompt(&self) {
        self.gate.dismiss_prompt();
    }

    /// Record a paid entitlement
    ///
    /// # Errors
    ///
    /// Returns a storage error if the flag cannot be persisted
    pub fn mark_paid(&self) -> Result<()> {
        self.gate.mark_paid()
    }

    /// Subscribe to data change events
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<DataEvent> {
        self.events.subscribe()
    }

    /// Cancel any in-progress reveal
    ///
    /// The reply being revealed is still committed, in full, exactly once.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    fn try_begin(&self, kind: ActionKind) -> Option<BusyGuard<'_>> {
        let mut state = lock(&self.state);
        if state.is_busy() {
            return None;
        }
        *state = SessionState::Busy(kind);
        Some(BusyGuard { state: &self.state })
    }

    fn append(&self, message: Message) {
        lock(&self.transcript).push(message);
    }

    fn count_usage(&self) {
        if let Err(e) = self.gate.record_usage() {
            tracing::warn!("Failed to persist usage count: {:#}", e);
        }
    }

    async fn present(&self, text: &str, timing: RevealTiming) {
        let Some(presenter) = &self.presenter else {
            return;
        };
        if reveal(text, timing, &self.shutdown, presenter.as_ref()).await
            == RevealOutcome::Cancelled
        {
            tracing::debug!("Reveal cancelled; committing full reply");
        }
    }

    /// Ask the copilot a natural-language question
    ///
    /// Blank input is rejected, a call made while another action is in
    /// flight is ignored, and a call past the free-tier limit raises the
    /// upgrade prompt without contacting the API. Otherwise the query is
    /// counted and exactly one assistant message is committed, whether the
    /// API succeeds or fails.
    pub async fn submit_query(&self, text: &str) -> SubmitOutcome {
        let text = text.trim();
        if text.is_empty() {
            return SubmitOutcome::Invalid("Query cannot be empty".to_string());
        }

        let Some(_busy) = self.try_begin(ActionKind::Query) else {
            tracing::debug!("Ignoring query while another action is in flight");
            return SubmitOutcome::Busy;
        };

        if let Err(e) = self.gate.check() {
            tracing::info!("Query rejected: {}", e);
            return SubmitOutcome::GateRejected;
        }

        self.append(Message::user(text));
        self.count_usage();

        let request = QueryRequest::new(text, self.filters());
        tracing::info!("Submitting copilot query ({} chars)", text.len());

        match self.api.query(&request).await {
            Ok(envelope) => {
                let message = Message::assistant_from_envelope(&envelope);
                self.present(message.content(), self.query_timing).await;
                self.append(message);
                SubmitOutcome::Completed { failed: false }
            }
            Err(failure) => {
                tracing::warn!("Copilot query failed: {}", failure);
                self.append(Message::assistant(failure.query_message()));
                SubmitOutcome::Completed { failed: true }
            }
        }
    }

    /// Read a contract from disk and upload it
    ///
    /// An unreadable file is rejected as invalid input.
    pub async fn submit_upload_path(
        &self,
        path: impl Into<std::path::PathBuf>,
        filters: UploadFilters,
    ) -> SubmitOutcome {
        let path = path.into();
        match ContractUpload::from_path(&path, filters).await {
            Ok(upload) => self.submit_upload(upload).await,
            Err(e) => {
                tracing::warn!("Cannot read {}: {}", path.display(), e);
                SubmitOutcome::Invalid(format!("Cannot read {}: {}", path.display(), e))
            }
        }
    }

    /// Upload a contract file for analysis
    ///
    /// Follows the same gate and busy rules as [`submit_query`]. On success a
    /// confirmation summarising the created contract is committed and a
    /// [`DataEvent::ContractsChanged`] is published; on failure an
    /// "Upload Failed" message is committed. Progress returns to zero when
    /// the upload ends.
    ///
    /// [`submit_query`]: CopilotSession::submit_query
    pub async fn submit_upload(&self, upload: ContractUpload) -> SubmitOutcome {
        if let Err(reason) = upload.filters.validate() {
            return SubmitOutcome::Invalid(reason);
        }

        let Some(_busy) = self.try_begin(ActionKind::Upload) else {
            tracing::debug!("Ignoring upload while another action is in flight");
            return SubmitOutcome::Busy;
        };

        if let Err(e) = self.gate.check() {
            tracing::info!("Upload rejected: {}", e);
            return SubmitOutcome::GateRejected;
        }

        self.append(Message::user_upload(&upload));
        self.count_usage();

        tracing::info!(
            "Uploading contract {} ({} bytes, {})",
            upload.file_name,
            upload.size_bytes(),
            upload.mime_type
        );

        self.upload_progress.store(0, Ordering::SeqCst);
        let result = self
            .api
            .upload_contract(&upload, self.progress_callback())
            .await;

        let outcome = match result {
            Ok(record) => {
                tracing::info!("Contract {} created from {}", record.id, upload.file_name);
                let message = Message::upload_result(&record);
                self.present(message.content(), self.upload_timing).await;
                self.append(message);
                self.events.publish(DataEvent::ContractsChanged);
                SubmitOutcome::Completed { failed: false }
            }
            Err(failure) => {
                tracing::warn!("Contract upload failed: {}", failure);
                self.append(Message::assistant(failure.upload_message()));
                SubmitOutcome::Completed { failed: true }
            }
        };

        self.upload_progress.store(0, Ordering::SeqCst);
        outcome
    }

    fn progress_callback(&self) -> ProgressCallback {
        let progress = self.upload_progress.clone();
        let presenter = self.presenter.clone();
        Arc::new(move |percent: u8| {
            let percent = percent.min(100);
            progress.store(percent, Ordering::SeqCst);
            if let Some(presenter) = &presenter {
                presenter.progress(percent);
            }
        })
    }
}
