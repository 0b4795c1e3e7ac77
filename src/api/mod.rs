//! Governance API abstraction
//!
//! The [`CopilotApi`] trait is the seam between the copilot session and the
//! remote service: the session only needs `query` and `upload_contract`.
//! [`ApiClient`] implements it over HTTP and additionally exposes the
//! read-only list/summary endpoints used by the table views.

pub mod client;
pub mod fake;
pub mod types;

pub use client::ApiClient;
pub use types::{
    ComplianceAlert, ComplianceDashboard, ComplianceFramework, ComplianceRecord, ContractRecord,
    DashboardSummary, DownloadFormat, ExtractedClause, GenerateReportRequest, QueryFilters, QueryRequest,
    ReportDownload, ReportRecord, ReportTemplate, ResponseEnvelope, UploadFilters,
};

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Callback receiving upload progress as a percentage (0..=100)
pub type ProgressCallback = Arc<dyn Fn(u8) + Send + Sync>;

/// A contract file staged for upload
#[derive(Debug, Clone, PartialEq)]
pub struct ContractUpload {
    /// File name sent in the multipart part
    pub file_name: String,
    /// MIME type guessed from the file extension
    pub mime_type: String,
    /// File content
    pub bytes: Vec<u8>,
    /// Classification metadata
    pub filters: UploadFilters,
}

impl ContractUpload {
    /// Read a contract file from disk
    ///
    /// # Errors
    ///
    /// Returns an IO error if the file cannot be read
    pub async fn from_path(path: impl Into<PathBuf>, filters: UploadFilters) -> std::io::Result<Self> {
        let path = path.into();
        let bytes = tokio::fs::read(&path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "contract".to_string());
        let mime_type = mime_guess::from_path(&path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        Ok(Self {
            file_name,
            mime_type,
            bytes,
            filters,
        })
    }

    /// Size of the file content in bytes
    pub fn size_bytes(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Classified API failure
///
/// Failures are sorted into the categories that the copilot presents to the
/// user: the server was unreachable, it faulted (5xx), it reported a
/// human-readable `detail`, or something else went wrong.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiFailure {
    /// No response was received
    #[error("Network Error: {0}")]
    Network(String),

    /// The server answered with a 5xx status
    #[error("Server error (status {status})")]
    Server {
        /// HTTP status code
        status: u16,
        /// `detail` field from the body, if present
        detail: Option<String>,
    },

    /// The server answered with a structured `detail` message
    #[error("{detail}")]
    Detail {
        /// HTTP status code
        status: u16,
        /// Human-readable detail
        detail: String,
    },

    /// Any other failure
    #[error("{0}")]
    Unknown(String),
}

const GENERIC_QUERY_ERROR: &str = "I encountered an issue processing your request.";
const GENERIC_UPLOAD_ERROR: &str = "Failed to upload contract. Please try again.";

impl ApiFailure {
    /// Classify a non-success HTTP response
    ///
    /// 5xx statuses are server faults regardless of body. Otherwise a JSON
    /// `detail` field (string, or any other JSON rendered compactly) yields
    /// [`ApiFailure::Detail`]; anything else is [`ApiFailure::Unknown`].
    ///
    /// # Examples
    ///
    /// ```
    /// use governai::api::ApiFailure;
    ///
    /// let failure = ApiFailure::from_response(404, r#"{"detail": "Report not found"}"#);
    /// assert_eq!(failure, ApiFailure::Detail { status: 404, detail: "Report not found".into() });
    /// ```
    pub fn from_response(status: u16, body: &str) -> Self {
        let detail = extract_detail(body);
        if status >= 500 {
            return ApiFailure::Server { status, detail };
        }
        match detail {
            Some(detail) => ApiFailure::Detail { status, detail },
            None => ApiFailure::Unknown(format!("Request failed with status code {}", status)),
        }
    }

    /// Classify a transport-level reqwest error
    pub fn from_transport(error: &reqwest::Error) -> Self {
        if error.is_connect() || error.is_timeout() || error.is_request() {
            ApiFailure::Network(error.to_string())
        } else {
            ApiFailure::Unknown(error.to_string())
        }
    }

    /// Transcript text for a failed copilot query
    pub fn query_message(&self) -> String {
        match self {
            ApiFailure::Network(_) => "**Connection Error**\n\nI couldn't reach the server. Please check:\n- The backend server is running and reachable\n- Your internet connection is stable\n- Try again in a moment".to_string(),
            ApiFailure::Server { .. } => "**Server Error**\n\nThe server encountered an issue. Please try again or contact support if the problem persists.".to_string(),
            ApiFailure::Detail { detail, .. } => format!("**Error**\n\n{}", detail),
            ApiFailure::Unknown(message) if !message.trim().is_empty() => {
                format!("**Error**\n\n{}", message)
            }
            ApiFailure::Unknown(_) => GENERIC_QUERY_ERROR.to_string(),
        }
    }

    /// Transcript text for a failed contract upload
    pub fn upload_message(&self) -> String {
        let reason = match self {
            ApiFailure::Detail { detail, .. } => detail.clone(),
            ApiFailure::Server {
                detail: Some(detail),
                ..
            } => detail.clone(),
            ApiFailure::Unknown(message) if message.trim().is_empty() => {
                GENERIC_UPLOAD_ERROR.to_string()
            }
            other => other.to_string(),
        };
        format!("**Upload Failed**\n\n{}", reason)
    }
}

fn extract_detail(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    match value.get("detail")? {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) if s.trim().is_empty() => None,
        serde_json::Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Copilot-facing API surface
///
/// Implemented by [`ApiClient`] for the real service and by
/// [`fake::FakeApi`] for tests.
#[async_trait]
pub trait CopilotApi: Send + Sync {
    /// Ask a natural-language question
    async fn query(&self, request: &QueryRequest) -> std::result::Result<ResponseEnvelope, ApiFailure>;

    /// Upload a contract for analysis, reporting progress percentages
    async fn upload_contract(
        &self,
        upload: &ContractUpload,
        progress: ProgressCallback,
    ) -> std::result::Result<ContractRecord, ApiFailure>;
}
