//! In-process fake governance API for unit and integration tests
//!
//! [`FakeApi`] implements [`CopilotApi`] with scripted replies so the copilot
//! session can be driven without a network. Replies are consumed in FIFO
//! order; every request is recorded for later inspection.
//!
//! # Example
//!
//! ```
//! use governai::api::fake::FakeApi;
//! use governai::api::{CopilotApi, QueryFilters, QueryRequest};
//! use serde_json::json;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let api = FakeApi::new();
//! api.push_query_reply(Ok(json!({"answer": "3 active contracts found.", "sources": []})));
//!
//! let reply = api
//!     .query(&QueryRequest::new("Show me all active contracts", QueryFilters::default()))
//!     .await
//!     .unwrap();
//! assert_eq!(reply.answer(), Some("3 active contracts found."));
//! assert_eq!(api.recorded_queries().len(), 1);
//! # }
//! ```

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Notify;

use crate::api::types::{ContractRecord, QueryRequest, ResponseEnvelope};
use crate::api::{ApiFailure, ContractUpload, CopilotApi, ProgressCallback};

type Scripted<T> = Mutex<VecDeque<std::result::Result<T, ApiFailure>>>;

/// Scripted in-memory implementation of [`CopilotApi`]
#[derive(Default)]
pub struct FakeApi {
    query_replies: Scripted<Value>,
    upload_replies: Scripted<ContractRecord>,
    queries: Mutex<Vec<QueryRequest>>,
    uploads: Mutex<Vec<ContractUpload>>,
    gate: Option<Arc<Notify>>,
}

impl FakeApi {
    /// Create a fake with no scripted replies
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a fake whose calls block until `gate` is notified
    ///
    /// Useful for holding a request in flight while a test checks the
    /// session's busy state.
    pub fn gated(gate: Arc<Notify>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::default()
        }
    }

    /// Queue the body (or failure) returned by the next `query`
    pub fn push_query_reply(&self, reply: std::result::Result<Value, ApiFailure>) {
        lock(&self.query_replies).push_back(reply);
    }

    /// Queue the record (or failure) returned by the next `upload_contract`
    pub fn push_upload_reply(&self, reply: std::result::Result<ContractRecord, ApiFailure>) {
        lock(&self.upload_replies).push_back(reply);
    }

    /// Queries received so far
    pub fn recorded_queries(&self) -> Vec<QueryRequest> {
        lock(&self.queries).clone()
    }

    /// Uploads received so far
    pub fn recorded_uploads(&self) -> Vec<ContractUpload> {
        lock(&self.uploads).clone()
    }

    async fn wait_for_gate(&self) {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl CopilotApi for FakeApi {
    async fn query(&self, request: &QueryRequest) -> std::result::Result<ResponseEnvelope, ApiFailure> {
        lock(&self.queries).push(request.clone());
        self.wait_for_gate().await;
        let reply = lock(&self.query_replies).pop_front();
        match reply {
            Some(Ok(body)) => Ok(ResponseEnvelope::new(body)),
            Some(Err(failure)) => Err(failure),
            None => Err(ApiFailure::Unknown("no scripted query reply".to_string())),
        }
    }

    async fn upload_contract(
        &self,
        upload: &ContractUpload,
        progress: ProgressCallback,
    ) -> std::result::Result<ContractRecord, ApiFailure> {
        lock(&self.uploads).push(upload.clone());
        progress(0);
        self.wait_for_gate().await;
        progress(50);
        let reply = lock(&self.upload_replies).pop_front();
        match reply {
            Some(Ok(record)) => {
                progress(100);
                Ok(record)
            }
            Some(Err(failure)) => Err(failure),
            None => Err(ApiFailure::Unknown("no scripted upload reply".to_string())),
        }
    }
}
