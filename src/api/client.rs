//! HTTP client for the governance API
//!
//! Wraps `reqwest` with the endpoint layout of the contract governance
//! service and classifies every failure into an [`ApiFailure`].

use crate::api::types::{
    ComplianceAlert, ComplianceDashboard, ComplianceFramework, ComplianceRecord, ContractRecord,
    DownloadFormat, GenerateReportRequest, QueryRequest, ReportDownload, ReportRecord,
    ReportTemplate, ResponseEnvelope,
};
use crate::api::{ApiFailure, ContractUpload, CopilotApi, ProgressCallback};
use crate::config::ApiConfig;
use crate::error::{GovernaiError, Result};

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

const QUERY_PATH: &str = "/api/v1/copilot/query";
const UPLOAD_PATH: &str = "/api/v1/contracts/upload";
const CONTRACTS_PATH: &str = "/api/v1/contracts/";
const COMPLIANCE_DASHBOARD_PATH: &str = "/api/v1/compliance/dashboard";
const COMPLIANCE_FRAMEWORKS_PATH: &str = "/api/v1/compliance/frameworks";
const COMPLIANCE_RECORDS_PATH: &str = "/api/v1/compliance/records";
const COMPLIANCE_ALERTS_PATH: &str = "/api/v1/compliance/alerts";
const REPORTS_PATH: &str = "/api/v1/reports";
const REPORT_TEMPLATES_PATH: &str = "/api/v1/reports/templates";
const REPORT_GENERATE_PATH: &str = "/api/v1/reports/generate";

const UPLOAD_CHUNK_SIZE: usize = 64 * 1024;

type ApiResult<T> = std::result::Result<T, ApiFailure>;

/// Governance API client
///
/// # Examples
///
/// ```no_run
/// use governai::api::{ApiClient, CopilotApi, QueryFilters, QueryRequest};
/// use governai::config::ApiConfig;
///
/// # async fn example() -> governai::error::Result<()> {
/// let client = ApiClient::new(&ApiConfig::default())?;
/// let response = client
///     .query(&QueryRequest::new("Show me all active contracts", QueryFilters::default()))
///     .await?;
/// println!("{}", response.answer().unwrap_or("No response received"));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a client for the configured base URL
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client initialization fails
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("governai/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| GovernaiError::Config(format!("Failed to create HTTP client: {}", e)))?;

        let base_url = config.base_url.trim_end_matches('/').to_string();
        tracing::info!("Initialized governance API client: base_url={}", base_url);

        Ok(Self { client, base_url })
    }

    /// Base URL without a trailing slash
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(&self, request: RequestBuilder) -> ApiResult<reqwest::Response> {
        let response = request.send().await.map_err(|e| {
            tracing::warn!("Governance API unreachable: {}", e);
            ApiFailure::from_transport(&e)
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        tracing::error!("Governance API returned error {}: {}", status, body);
        Err(ApiFailure::from_response(status.as_u16(), &body))
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> ApiResult<T> {
        let response = self.send(request).await?;
        response.json::<T>().await.map_err(|e| {
            tracing::error!("Failed to decode governance API response: {}", e);
            ApiFailure::Unknown(format!("Failed to parse API response: {}", e))
        })
    }

    /// `GET /api/v1/contracts/`
    pub async fn list_contracts(&self) -> ApiResult<Vec<ContractRecord>> {
        let url = self.endpoint(CONTRACTS_PATH);
        tracing::debug!("Fetching contracts: {}", url);
        self.send_json(self.client.get(&url)).await
    }

    /// `GET /api/v1/compliance/dashboard`
    pub async fn compliance_dashboard(&self) -> ApiResult<ComplianceDashboard> {
        let url = self.endpoint(COMPLIANCE_DASHBOARD_PATH);
        tracing::debug!("Fetching compliance dashboard: {}", url);
        self.send_json(self.client.get(&url)).await
    }

    /// `GET /api/v1/compliance/frameworks`
    pub async fn compliance_frameworks(&self) -> ApiResult<Vec<ComplianceFramework>> {
        let url = self.endpoint(COMPLIANCE_FRAMEWORKS_PATH);
        self.send_json(self.client.get(&url)).await
    }

    /// `GET /api/v1/compliance/records`
    pub async fn compliance_records(&self) -> ApiResult<Vec<ComplianceRecord>> {
        let url = self.endpoint(COMPLIANCE_RECORDS_PATH);
        self.send_json(self.client.get(&url)).await
    }

    /// `GET /api/v1/compliance/alerts`
    pub async fn compliance_alerts(&self) -> ApiResult<Vec<ComplianceAlert>> {
        let url = self.endpoint(COMPLIANCE_ALERTS_PATH);
        self.send_json(self.client.get(&url)).await
    }

    /// `GET /api/v1/reports`
    pub async fn list_reports(&self) -> ApiResult<Vec<ReportRecord>> {
        let url = self.endpoint(REPORTS_PATH);
        self.send_json(self.client.get(&url)).await
    }

    /// `GET /api/v1/reports/templates`
    pub async fn report_templates(&self) -> ApiResult<Vec<ReportTemplate>> {
        let url = self.endpoint(REPORT_TEMPLATES_PATH);
        self.send_json(self.client.get(&url)).await
    }

    /// `POST /api/v1/reports/generate`
    pub async fn generate_report(&self, request: &GenerateReportRequest) -> ApiResult<ReportRecord> {
        let url = self.endpoint(REPORT_GENERATE_PATH);
        tracing::info!(
            title = %request.title,
            report_type = %request.report_type,
            "Generating report"
        );
        self.send_json(self.client.post(&url).json(request)).await
    }

    /// `GET /api/v1/reports/{id}/download?format=...`
    ///
    /// JSON downloads are pretty-printed and named after the report title;
    /// binary formats are named `report_<id>.<format>`.
    pub async fn download_report(&self, id: i64, format: DownloadFormat) -> ApiResult<ReportDownload> {
        let url = self.endpoint(&format!("{}/{}/download", REPORTS_PATH, id));
        tracing::debug!("Downloading report {} as {}", id, format.as_str());
        let request = self
            .client
            .get(&url)
            .query(&[("format", format.as_str())]);

        match format {
            DownloadFormat::Json => {
                let value: serde_json::Value = self.send_json(request).await?;
                let title = value
                    .get("title")
                    .and_then(|t| t.as_str())
                    .filter(|t| !t.trim().is_empty())
                    .unwrap_or("report");
                let file_name = format!("{}.json", sanitize_file_stem(title));
                let bytes = serde_json::to_vec_pretty(&value)
                    .map_err(|e| ApiFailure::Unknown(format!("Failed to encode report: {}", e)))?;
                Ok(ReportDownload { file_name, bytes })
            }
            DownloadFormat::Pdf | DownloadFormat::Xlsx => {
                let response = self.send(request).await?;
                let bytes = response
                    .bytes()
                    .await
                    .map_err(|e| ApiFailure::from_transport(&e))?;
                Ok(ReportDownload {
                    file_name: format!("report_{}.{}", id, format.as_str()),
                    bytes: bytes.to_vec(),
                })
            }
        }
    }
}

#[async_trait]
impl CopilotApi for ApiClient {
    async fn query(&self, request: &QueryRequest) -> ApiResult<ResponseEnvelope> {
        let url = self.endpoint(QUERY_PATH);
        tracing::debug!("Sending copilot query to {}", url);
        let body: serde_json::Value = self.send_json(self.client.post(&url).json(request)).await?;
        Ok(ResponseEnvelope::new(body))
    }

    async fn upload_contract(
        &self,
        upload: &ContractUpload,
        progress: ProgressCallback,
    ) -> ApiResult<ContractRecord> {
        let url = self.endpoint(UPLOAD_PATH);
        let total = upload.size_bytes();
        tracing::info!(
            file = %upload.file_name,
            size_bytes = total,
            "Uploading contract"
        );

        progress(0);
        let body = progress_body(Bytes::from(upload.bytes.clone()), progress.clone());
        let part = Part::stream_with_length(body, total)
            .file_name(upload.file_name.clone())
            .mime_str(&upload.mime_type)
            .map_err(|e| ApiFailure::Unknown(format!("Invalid MIME type: {}", e)))?;

        let mut form = Form::new().part("file", part);
        for (name, value) in upload.filters.form_fields() {
            form = form.text(name, value);
        }

        let record: ContractRecord = self
            .send_json(self.client.post(&url).multipart(form))
            .await?;
        progress(100);
        tracing::info!(id = record.id, title = %record.title, "Contract uploaded");
        Ok(record)
    }
}

/// Chunked request body that reports how much of the file has been read
///
/// Percentages stop at 99 until the server has answered.
fn progress_body(data: Bytes, progress: ProgressCallback) -> reqwest::Body {
    let total = data.len() as u64;
    let sent = Arc::new(AtomicU64::new(0));
    let chunks: Vec<Bytes> = (0..data.len())
        .step_by(UPLOAD_CHUNK_SIZE)
        .map(|start| data.slice(start..(start + UPLOAD_CHUNK_SIZE).min(data.len())))
        .collect();

    let stream = futures::stream::iter(chunks.into_iter().map(move |chunk| {
        let done = sent.fetch_add(chunk.len() as u64, Ordering::SeqCst) + chunk.len() as u64;
        progress(percent(done, total).min(99));
        Ok::<Bytes, std::io::Error>(chunk)
    }));
    reqwest::Body::wrap_stream(stream)
}

fn percent(done: u64, total: u64) -> u8 {
    if total == 0 {
        return 100;
    }
    ((done.saturating_mul(100)) / total).min(100) as u8
}

fn sanitize_file_stem(title: &str) -> String {
    title
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c => c,
        })
        .collect::<String>()
        .trim()
        .to_string()
}
