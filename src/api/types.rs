//! Wire types for the governance API
//!
//! Request bodies, the copilot response envelope, and the record types
//! returned by the contract, compliance, and report endpoints. Record types
//! default every optional field so that older or newer API versions
//! deserialize without failing.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of `POST /api/v1/copilot/query`
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct QueryRequest {
    /// Natural-language question
    pub query: String,
    /// Filter context applied by the server
    pub context: QueryContext,
}

impl QueryRequest {
    /// Create a query request carrying the given filters
    pub fn new(query: impl Into<String>, filters: QueryFilters) -> Self {
        Self {
            query: query.into(),
            context: QueryContext { filters },
        }
    }
}

/// Query context wrapper (`{"filters": {...}}`)
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct QueryContext {
    /// Grouped filters
    pub filters: QueryFilters,
}

/// Filters grouped by view, sent verbatim as `context.filters`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct QueryFilters {
    /// Contract filters
    #[serde(default)]
    pub contracts: UploadFilters,
    /// Compliance filters
    #[serde(default)]
    pub compliance: ComplianceFilters,
    /// Report filters
    #[serde(default)]
    pub reports: ReportFilters,
    /// Dashboard filters
    #[serde(default)]
    pub dashboard: DashboardFilters,
}

/// Optional classification metadata attached to an upload or query
///
/// The client never interprets these values; it only checks that numeric
/// bounds are real numbers before passing them through.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UploadFilters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_risk_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_risk_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_contract_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_contract_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl UploadFilters {
    /// Check that every numeric bound is a finite number
    ///
    /// # Errors
    ///
    /// Returns the name of the first field holding NaN or infinity
    pub fn validate(&self) -> std::result::Result<(), String> {
        let numeric = [
            ("min_risk_score", self.min_risk_score),
            ("max_risk_score", self.max_risk_score),
            ("min_contract_value", self.min_contract_value),
            ("max_contract_value", self.max_contract_value),
        ];
        for (name, value) in numeric {
            if let Some(v) = value {
                if !v.is_finite() {
                    return Err(format!("{} must be a finite number", name));
                }
            }
        }
        Ok(())
    }

    /// Multipart text fields for every non-empty filter, in wire order
    ///
    /// Tags are sent as a JSON-encoded array.
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = Vec::new();
        let mut push_text = |name: &'static str, value: &Option<String>| {
            if let Some(v) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
                fields.push((name, v.to_string()));
            }
        };
        push_text("status", &self.status);
        push_text("contract_type", &self.contract_type);

        let numeric = [
            ("min_risk_score", self.min_risk_score),
            ("max_risk_score", self.max_risk_score),
            ("min_contract_value", self.min_contract_value),
            ("max_contract_value", self.max_contract_value),
        ];
        for (name, value) in numeric {
            if let Some(v) = value {
                fields.push((name, v.to_string()));
            }
        }

        if let Some(currency) = self
            .currency
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
        {
            fields.push(("currency", currency.to_string()));
        }

        if !self.tags.is_empty() {
            // Serializing a Vec<String> cannot fail
            let encoded = serde_json::to_string(&self.tags).unwrap_or_else(|_| "[]".to_string());
            fields.push(("tags", encoded));
        }

        fields
    }

    /// True when no field is set
    pub fn is_empty(&self) -> bool {
        self.form_fields().is_empty()
    }
}

impl From<crate::cli::UploadFilterArgs> for UploadFilters {
    fn from(args: crate::cli::UploadFilterArgs) -> Self {
        Self {
            status: args.status,
            contract_type: args.contract_type,
            min_risk_score: args.min_risk_score,
            max_risk_score: args.max_risk_score,
            min_contract_value: args.min_contract_value,
            max_contract_value: args.max_contract_value,
            currency: args.currency,
            tags: args.tags,
        }
    }
}

/// Compliance filters
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ComplianceFilters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub framework_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// Report filters
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ReportFilters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_type: Option<String>,
}

/// Dashboard period filters
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DashboardFilters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period_start: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period_end: Option<String>,
}

/// Where a copilot response field may live
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    /// Under the `response` object
    Nested,
    /// At the top level of the body
    TopLevel,
}

const ANSWER_ORDER: [Scope; 2] = [Scope::Nested, Scope::TopLevel];
const SOURCES_ORDER: [Scope; 2] = [Scope::TopLevel, Scope::Nested];
const DATA_ORDER: [Scope; 2] = [Scope::TopLevel, Scope::Nested];

/// Copilot query response body
///
/// The API answers with either `{answer, sources, data}` or
/// `{query, response: {answer, sources, data}, sources, data}`. Each field
/// is resolved through a fixed lookup order:
///
/// - `answer`: `response.answer`, then `answer`
/// - `sources`: `sources`, then `response.sources`
/// - `data`: `data`, then `response.data` (empty objects count as absent)
///
/// # Examples
///
/// ```
/// use governai::api::ResponseEnvelope;
/// use serde_json::json;
///
/// let nested = ResponseEnvelope::new(json!({"response": {"answer": "nested"}, "answer": "top"}));
/// assert_eq!(nested.answer(), Some("nested"));
///
/// let flat = ResponseEnvelope::new(json!({"answer": "3 active contracts found.", "sources": []}));
/// assert_eq!(flat.answer(), Some("3 active contracts found."));
/// assert!(flat.sources().is_empty());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseEnvelope {
    body: Value,
}

impl ResponseEnvelope {
    /// Wrap a decoded response body
    pub fn new(body: Value) -> Self {
        Self { body }
    }

    /// The raw response body
    pub fn body(&self) -> &Value {
        &self.body
    }

    fn scoped(&self, scope: Scope, field: &str) -> Option<&Value> {
        match scope {
            Scope::TopLevel => self.body.get(field),
            Scope::Nested => self.body.get("response").and_then(|r| r.get(field)),
        }
    }

    fn first_accepted<'a>(
        &'a self,
        order: &[Scope],
        field: &str,
        accept: impl Fn(&Value) -> bool,
    ) -> Option<&'a Value> {
        order
            .iter()
            .filter_map(|scope| self.scoped(*scope, field))
            .find(|v| accept(v))
    }

    /// Answer text, if any scope carries a non-empty string
    pub fn answer(&self) -> Option<&str> {
        self.first_accepted(&ANSWER_ORDER, "answer", |v| {
            v.as_str().map(|s| !s.is_empty()).unwrap_or(false)
        })
        .and_then(Value::as_str)
    }

    /// Citation labels; empty when neither scope carries an array
    pub fn sources(&self) -> Vec<String> {
        self.first_accepted(&SOURCES_ORDER, "sources", Value::is_array)
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .map(|item| match item {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Structured payload, if any scope carries a non-empty value
    pub fn data(&self) -> Option<&Value> {
        self.first_accepted(&DATA_ORDER, "data", |v| match v {
            Value::Null => false,
            Value::Object(map) => !map.is_empty(),
            Value::Array(items) => !items.is_empty(),
            _ => true,
        })
    }
}

/// Clause extracted from an uploaded contract
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ExtractedClause {
    #[serde(rename = "type", default)]
    pub clause_type: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl ExtractedClause {
    /// Clause body, preferring `text` over `description`
    pub fn body(&self) -> Option<&str> {
        self.text.as_deref().or(self.description.as_deref())
    }
}

/// Contract record returned by the upload and list endpoints
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ContractRecord {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub contract_number: Option<String>,
    #[serde(default)]
    pub status: String,
    #[serde(rename = "type", default)]
    pub contract_type: String,
    #[serde(default)]
    pub risk_score: Option<f64>,
    #[serde(default)]
    pub party_a: String,
    #[serde(default)]
    pub party_b: String,
    #[serde(default)]
    pub contract_value: Option<f64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub effective_date: Option<String>,
    #[serde(default)]
    pub expiration_date: Option<String>,
    #[serde(default)]
    pub risk_factors: Option<Vec<String>>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub extracted_clauses: Option<Vec<ExtractedClause>>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Compliance framework (GDPR, SOC2, ...)
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ComplianceFramework {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
}

/// Compliance assessment record
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ComplianceRecord {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub framework_id: Option<i64>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub requirement_id: Option<String>,
    #[serde(default)]
    pub requirement_description: Option<String>,
    #[serde(default)]
    pub compliance_score: Option<i64>,
    #[serde(default)]
    pub last_assessed: Option<String>,
    #[serde(default)]
    pub next_review_date: Option<String>,
    #[serde(default)]
    pub related_contract_id: Option<i64>,
}

/// Compliance alert
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ComplianceAlert {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub is_resolved: Option<bool>,
}

/// Compliance dashboard summary
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ComplianceDashboard {
    #[serde(default)]
    pub total_records: u64,
    #[serde(default)]
    pub compliant: u64,
    #[serde(default)]
    pub non_compliant: u64,
    #[serde(default)]
    pub at_risk: u64,
    #[serde(default)]
    pub compliance_rate: f64,
    #[serde(default)]
    pub active_alerts: u64,
}

/// Dashboard counters returned in copilot `data.dashboard`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DashboardSummary {
    #[serde(default)]
    pub total_contracts: u64,
    #[serde(default)]
    pub active_contracts: u64,
    #[serde(default)]
    pub compliance_rate: Option<f64>,
    #[serde(default)]
    pub compliant_records: u64,
    #[serde(default)]
    pub total_compliance_records: u64,
    #[serde(default)]
    pub total_reports: u64,
}

/// Generated report
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ReportRecord {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default, alias = "type")]
    pub report_type: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Report template
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ReportTemplate {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub report_type: Option<String>,
}

/// Body of `POST /api/v1/reports/generate`
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GenerateReportRequest {
    pub title: String,
    pub report_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_id: Option<i64>,
}

/// Report download format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadFormat {
    Json,
    Pdf,
    Xlsx,
}

impl DownloadFormat {
    /// Query-string value and file extension
    pub fn as_str(&self) -> &'static str {
        match self {
            DownloadFormat::Json => "json",
            DownloadFormat::Pdf => "pdf",
            DownloadFormat::Xlsx => "xlsx",
        }
    }
}

impl From<crate::cli::DownloadFormatArg> for DownloadFormat {
    fn from(arg: crate::cli::DownloadFormatArg) -> Self {
        match arg {
            crate::cli::DownloadFormatArg::Json => DownloadFormat::Json,
            crate::cli::DownloadFormatArg::Pdf => DownloadFormat::Pdf,
            crate::cli::DownloadFormatArg::Xlsx => DownloadFormat::Xlsx,
        }
    }
}

/// Downloaded report content
#[derive(Debug, Clone, PartialEq)]
pub struct ReportDownload {
    /// Suggested file name
    pub file_name: String,
    /// File content
    pub bytes: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_answer_prefers_nested_response() {
        let env = ResponseEnvelope::new(json!({
            "query": "q",
            "response": {"answer": "nested answer"},
            "answer": "top answer"
        }));
        assert_eq!(env.answer(), Some("nested answer"));
    }

    #[test]
    fn test_answer_falls_back_to_top_level() {
        let env = ResponseEnvelope::new(json!({"response": {}, "answer": "top answer"}));
        assert_eq!(env.answer(), Some("top answer"));

        let empty_nested = ResponseEnvelope::new(json!({"response": {"answer": ""}, "answer": "top"}));
        assert_eq!(empty_nested.answer(), Some("top"));
    }

    #[test]
    fn test_answer_absent() {
        let env = ResponseEnvelope::new(json!({"sources": ["a"]}));
        assert_eq!(env.answer(), None);
    }

    #[test]
    fn test_sources_prefer_top_level() {
        let env = ResponseEnvelope::new(json!({
            "response": {"sources": ["nested"]},
            "sources": ["top", 3]
        }));
        assert_eq!(env.sources(), vec!["top".to_string(), "3".to_string()]);

        let nested_only = ResponseEnvelope::new(json!({"response": {"sources": ["nested"]}}));
        assert_eq!(nested_only.sources(), vec!["nested".to_string()]);
    }

    #[test]
    fn test_data_skips_empty_objects() {
        let env = ResponseEnvelope::new(json!({
            "data": {},
            "response": {"data": {"contracts": [{"id": 1}]}}
        }));
        assert_eq!(env.data(), Some(&json!({"contracts": [{"id": 1}]})));

        let none = ResponseEnvelope::new(json!({"data": {}, "response": {"data": null}}));
        assert!(none.data().is_none());
    }

    #[test]
    fn test_form_fields_skip_empty_values() {
        let filters = UploadFilters {
            status: Some("active".to_string()),
            contract_type: Some("  ".to_string()),
            min_risk_score: Some(10.0),
            max_contract_value: Some(2500.5),
            currency: Some("EUR".to_string()),
            tags: vec!["vendor".to_string(), "renewal".to_string()],
            ..Default::default()
        };
        let fields = filters.form_fields();
        assert_eq!(
            fields,
            vec![
                ("status", "active".to_string()),
                ("min_risk_score", "10".to_string()),
                ("max_contract_value", "2500.5".to_string()),
                ("currency", "EUR".to_string()),
                ("tags", r#"["vendor","renewal"]"#.to_string()),
            ]
        );
        assert!(UploadFilters::default().is_empty());
    }

    #[test]
    fn test_filters_reject_nan() {
        let filters = UploadFilters {
            max_risk_score: Some(f64::NAN),
            ..Default::default()
        };
        let err = filters.validate().unwrap_err();
        assert!(err.contains("max_risk_score"));
    }

    #[test]
    fn test_query_request_serialization() {
        let request = QueryRequest::new("Show me all active contracts", QueryFilters::default());
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({
                "query": "Show me all active contracts",
                "context": {"filters": {"contracts": {}, "compliance": {}, "reports": {}, "dashboard": {}}}
            })
        );
    }

    #[test]
    fn test_contract_record_tolerates_missing_fields() {
        let record: ContractRecord = serde_json::from_value(json!({
            "id": 4,
            "title": "Master Services Agreement",
            "type": "vendor",
            "status": "active",
            "extracted_clauses": [{"type": "termination", "description": "30 days notice"}],
            "unknown_field": true
        }))
        .unwrap();
        assert_eq!(record.contract_type, "vendor");
        assert!(record.risk_score.is_none());
        let clauses = record.extracted_clauses.unwrap();
        assert_eq!(clauses[0].body(), Some("30 days notice"));
    }
}
