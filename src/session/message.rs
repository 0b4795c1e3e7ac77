//! Transcript messages
//!
//! A [`Message`] is created once and never changes afterwards; fields are
//! private and exposed through accessors only.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::api::{ContractRecord, ContractUpload, ResponseEnvelope};
use crate::render::{format_amount, format_date};

/// Fallback answer when the API response carries no answer text
pub const NO_RESPONSE: &str = "No response received";

/// Author of a transcript entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// Metadata of a file attached to a user message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachedFile {
    pub name: String,
    pub size_bytes: u64,
    pub mime_type: String,
}

/// One transcript entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    id: Uuid,
    role: Role,
    content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    sources: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    attached_file: Option<AttachedFile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    structured_payload: Option<Value>,
    created_at: DateTime<Utc>,
}

impl Message {
    fn build(
        role: Role,
        content: String,
        sources: Vec<String>,
        attached_file: Option<AttachedFile>,
        structured_payload: Option<Value>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content,
            sources,
            attached_file,
            structured_payload,
            created_at: Utc::now(),
        }
    }

    /// User text message
    ///
    /// # Examples
    ///
    /// ```
    /// use governai::session::{Message, Role};
    ///
    /// let message = Message::user("Show me all active contracts");
    /// assert_eq!(message.role(), Role::User);
    /// assert_eq!(message.content(), "Show me all active contracts");
    /// ```
    pub fn user(content: impl Into<String>) -> Self {
        Self::build(Role::User, content.into(), Vec::new(), None, None)
    }

    /// User message representing a file upload
    pub fn user_upload(upload: &ContractUpload) -> Self {
        let attached = AttachedFile {
            name: upload.file_name.clone(),
            size_bytes: upload.size_bytes(),
            mime_type: upload.mime_type.clone(),
        };
        Self::build(
            Role::User,
            format!("Uploading: {}", upload.file_name),
            Vec::new(),
            Some(attached),
            None,
        )
    }

    /// Plain assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::build(Role::Assistant, content.into(), Vec::new(), None, None)
    }

    /// Assistant message built from a copilot response
    pub fn assistant_from_envelope(envelope: &ResponseEnvelope) -> Self {
        Self::build(
            Role::Assistant,
            envelope.answer().unwrap_or(NO_RESPONSE).to_string(),
            envelope.sources(),
            None,
            envelope.data().cloned(),
        )
    }

    /// Assistant message confirming a contract upload
    pub fn upload_result(record: &ContractRecord) -> Self {
        // ContractRecord holds only JSON-representable fields
        let payload = serde_json::to_value(record).ok();
        Self::build(
            Role::Assistant,
            upload_summary(record),
            Vec::new(),
            None,
            payload,
        )
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    pub fn attached_file(&self) -> Option<&AttachedFile> {
        self.attached_file.as_ref()
    }

    pub fn structured_payload(&self) -> Option<&Value> {
        self.structured_payload.as_ref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Confirmation text for an uploaded contract
pub fn upload_summary(record: &ContractRecord) -> String {
    let mut lines = vec![
        "**Contract Uploaded Successfully!**".to_string(),
        String::new(),
        format!("**Title:** {}", record.title),
        format!(
            "**Contract Number:** {}",
            record.contract_number.as_deref().unwrap_or("N/A")
        ),
        format!("**Status:** {}", record.status),
        format!("**Type:** {}", record.contract_type),
        format!(
            "**Risk Score:** {}",
            record
                .risk_score
                .map(|score| format!("{:.1}%", score))
                .unwrap_or_else(|| "N/A".to_string())
        ),
        format!("**Parties:** {} ↔ {}", record.party_a, record.party_b),
    ];

    if let Some(value) = record.contract_value.filter(|v| *v != 0.0) {
        lines.push(format!(
            "**Value:** {} {}",
            record.currency.as_deref().unwrap_or("USD"),
            format_amount(value)
        ));
    }
    if let Some(expiration) = record.expiration_date.as_deref() {
        lines.push(format!("**Expiration:** {}", format_date(expiration)));
    }

    lines.push(String::new());
    lines.push("Contract has been analyzed and added to your system.".to_string());
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record() -> ContractRecord {
        ContractRecord {
            id: 9,
            title: "Master Services Agreement".to_string(),
            contract_number: None,
            status: "active".to_string(),
            contract_type: "vendor".to_string(),
            risk_score: Some(42.25),
            party_a: "Acme Corp".to_string(),
            party_b: "Globex".to_string(),
            contract_value: Some(1_250_000.0),
            currency: None,
            expiration_date: Some("2026-03-31T00:00:00".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_assistant_from_envelope_uses_fallbacks() {
        let envelope = ResponseEnvelope::new(json!({
            "response": {"answer": "Two contracts expire this quarter.", "sources": ["nested"]},
            "sources": ["contracts"],
            "data": {"contracts": [{"id": 1}]}
        }));
        let message = Message::assistant_from_envelope(&envelope);
        assert_eq!(message.role(), Role::Assistant);
        assert_eq!(message.content(), "Two contracts expire this quarter.");
        assert_eq!(message.sources(), ["contracts".to_string()]);
        assert_eq!(
            message.structured_payload(),
            Some(&json!({"contracts": [{"id": 1}]}))
        );
    }

    #[test]
    fn test_assistant_without_answer() {
        let message = Message::assistant_from_envelope(&ResponseEnvelope::new(json!({})));
        assert_eq!(message.content(), NO_RESPONSE);
        assert!(message.sources().is_empty());
        assert!(message.structured_payload().is_none());
    }

    #[test]
    fn test_user_upload_carries_attachment() {
        let upload = ContractUpload {
            file_name: "msa.pdf".to_string(),
            mime_type: "application/pdf".to_string(),
            bytes: vec![0; 2048],
            filters: Default::default(),
        };
        let message = Message::user_upload(&upload);
        assert_eq!(message.content(), "Uploading: msa.pdf");
        let file = message.attached_file().unwrap();
        assert_eq!(file.size_bytes, 2048);
        assert_eq!(file.mime_type, "application/pdf");
    }

    #[test]
    fn test_upload_summary() {
        let summary = upload_summary(&record());
        assert!(summary.starts_with("**Contract Uploaded Successfully!**"));
        assert!(summary.contains("**Contract Number:** N/A"));
        assert!(summary.contains("**Risk Score:** 42.2%") || summary.contains("**Risk Score:** 42.3%"));
        assert!(summary.contains("**Parties:** Acme Corp ↔ Globex"));
        assert!(summary.contains("**Value:** USD 1,250,000"));
        assert!(summary.contains("**Expiration:** 2026-03-31"));
        assert!(summary.ends_with("Contract has been analyzed and added to your system."));
    }

    #[test]
    fn test_upload_summary_omits_missing_value_and_expiration() {
        let mut record = record();
        record.contract_value = None;
        record.expiration_date = None;
        let summary = upload_summary(&record);
        assert!(!summary.contains("**Value:**"));
        assert!(!summary.contains("**Expiration:**"));
    }

    #[test]
    fn test_messages_get_unique_ids() {
        let a = Message::user("a");
        let b = Message::user("a");
        assert_ne!(a.id(), b.id());
    }
}
