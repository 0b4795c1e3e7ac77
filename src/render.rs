//! Terminal rendering for copilot replies and governance records
//!
//! Converts the lightweight markup used in assistant replies (bold,
//! italic, inline code, fenced code blocks) into colored terminal text, and
//! turns structured payloads into tables. Payloads are dispatched on their
//! top-level key: `contracts`, `compliance`, `reports`, then `dashboard`;
//! anything else is shown as pretty-printed JSON.

use std::sync::OnceLock;

use colored::Colorize;
use prettytable::{row, Table};
use regex::{Captures, Regex};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::api::{
    ComplianceAlert, ComplianceDashboard, ComplianceFramework, ComplianceRecord, ContractRecord,
    DashboardSummary, ReportRecord, ReportTemplate,
};

/// Format a monetary amount with thousands separators
///
/// At most two decimals are kept and trailing zeros are dropped.
///
/// # Examples
///
/// ```
/// use governai::render::format_amount;
///
/// assert_eq!(format_amount(1_250_000.0), "1,250,000");
/// assert_eq!(format_amount(1234.5), "1,234.5");
/// ```
pub fn format_amount(value: f64) -> String {
    let formatted = format!("{:.2}", value.abs());
    let (whole, fraction) = formatted.split_once('.').unwrap_or((&formatted, ""));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let fraction = fraction.trim_end_matches('0');
    let sign = if value < 0.0 { "-" } else { "" };
    if fraction.is_empty() {
        format!("{}{}", sign, grouped)
    } else {
        format!("{}{}.{}", sign, grouped, fraction)
    }
}

/// Reduce an API timestamp to its calendar date
///
/// Accepts RFC 3339, naive ISO date-times and plain dates; anything else is
/// returned unchanged.
pub fn format_date(raw: &str) -> String {
    let raw = raw.trim();
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(raw) {
        return dt.format("%Y-%m-%d").to_string();
    }
    if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return dt.format("%Y-%m-%d").to_string();
    }
    if let Ok(date) = chrono::NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.format("%Y-%m-%d").to_string();
    }
    raw.to_string()
}

fn fence_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)```[A-Za-z0-9_+-]*\n?(.*?)```").expect("valid regex"))
}

fn inline_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"`([^`\n]+)`|\*\*([^*\n]+)\*\*|\*([^*\n]+)\*").expect("valid regex")
    })
}

/// Render reply markup as colored terminal text
pub fn render_markup(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for caps in fence_re().captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        out.push_str(&render_inline(&text[last..whole.start()]));
        let code = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
        out.push_str(&code.trim_end_matches('\n').cyan().to_string());
        last = whole.end();
    }
    out.push_str(&render_inline(&text[last..]));
    out
}

fn render_inline(text: &str) -> String {
    inline_re()
        .replace_all(text, |caps: &Captures| {
            if let Some(code) = caps.get(1) {
                code.as_str().yellow().to_string()
            } else if let Some(bold) = caps.get(2) {
                bold.as_str().bold().to_string()
            } else if let Some(italic) = caps.get(3) {
                italic.as_str().italic().to_string()
            } else {
                caps[0].to_string()
            }
        })
        .into_owned()
}

/// Remove markup delimiters, leaving plain text
///
/// Used for incremental output where styled spans cannot be closed yet.
pub fn strip_markup(text: &str) -> String {
    text.replace("```", "").replace("**", "").replace('`', "")
}

/// Structured payload classified by its shape
#[derive(Debug, Clone, PartialEq)]
pub enum PayloadView {
    Contracts(Vec<ContractRecord>),
    Compliance(Vec<ComplianceRecord>),
    Reports(Vec<ReportRecord>),
    Dashboard(DashboardSummary),
    /// A single contract, as attached to upload confirmations
    Contract(Box<ContractRecord>),
    Raw(Value),
}

impl PayloadView {
    /// Classify a payload; unrecognized or malformed shapes fall back to raw
    pub fn classify(payload: &Value) -> Self {
        if let Some(items) = payload.get("contracts").filter(|v| v.is_array()) {
            if let Some(records) = decode::<Vec<ContractRecord>>(items) {
                return PayloadView::Contracts(records);
            }
        }
        if let Some(items) = payload.get("compliance").filter(|v| v.is_array()) {
            if let Some(records) = decode::<Vec<ComplianceRecord>>(items) {
                return PayloadView::Compliance(records);
            }
        }
        if let Some(items) = payload.get("reports").filter(|v| v.is_array()) {
            if let Some(records) = decode::<Vec<ReportRecord>>(items) {
                return PayloadView::Reports(records);
            }
        }
        if let Some(summary) = payload.get("dashboard").filter(|v| v.is_object()) {
            if let Some(summary) = decode::<DashboardSummary>(summary) {
                return PayloadView::Dashboard(summary);
            }
        }
        if payload.get("party_a").is_some() && payload.get("title").is_some() {
            if let Some(record) = decode::<ContractRecord>(payload) {
                return PayloadView::Contract(Box::new(record));
            }
        }
        PayloadView::Raw(payload.clone())
    }

    /// Terminal rendering of the payload
    pub fn render(&self) -> String {
        match self {
            PayloadView::Contracts(records) => titled(
                &format!("Contracts ({})", records.len()),
                contracts_table(records),
            ),
            PayloadView::Compliance(records) => titled(
                &format!("Compliance Records ({})", records.len()),
                compliance_table(records),
            ),
            PayloadView::Reports(records) => titled(
                &format!("Reports ({})", records.len()),
                reports_table(records),
            ),
            PayloadView::Dashboard(summary) => {
                titled("Dashboard Summary", dashboard_summary_table(summary))
            }
            PayloadView::Contract(record) => contract_detail(record),
            PayloadView::Raw(value) => {
                let json = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
                format!("{}\n{}", "Query Results".cyan().bold(), json)
            }
        }
    }
}

fn decode<T: DeserializeOwned>(value: &Value) -> Option<T> {
    match serde_json::from_value(value.clone()) {
        Ok(decoded) => Some(decoded),
        Err(e) => {
            tracing::debug!("Payload did not match expected shape: {}", e);
            None
        }
    }
}

fn titled(title: &str, table: Table) -> String {
    format!("{}\n{}", title.cyan().bold(), table)
}

fn risk_cell(score: Option<f64>) -> String {
    match score {
        Some(s) if s > 70.0 => format!("{:.0}%", s).red().to_string(),
        Some(s) if s > 40.0 => format!("{:.0}%", s).yellow().to_string(),
        Some(s) => format!("{:.0}%", s).green().to_string(),
        None => "-".to_string(),
    }
}

fn status_cell(status: &str) -> String {
    match status {
        "active" | "compliant" | "completed" => status.green().to_string(),
        "expired" | "non_compliant" | "failed" => status.red().to_string(),
        "" => "-".to_string(),
        other => other.yellow().to_string(),
    }
}

fn or_dash(value: Option<&str>) -> &str {
    value.filter(|v| !v.is_empty()).unwrap_or("-")
}

/// Contracts table
pub fn contracts_table(records: &[ContractRecord]) -> Table {
    let mut table = Table::new();
    table.add_row(row!["ID", "Title", "Number", "Status", "Type", "Risk", "Value", "Parties"]);
    for record in records {
        let value = record
            .contract_value
            .map(|v| {
                format!(
                    "{} {}",
                    record.currency.as_deref().unwrap_or("USD"),
                    format_amount(v)
                )
            })
            .unwrap_or_else(|| "-".to_string());
        let title = if record.title.is_empty() {
            "Untitled Contract"
        } else {
            record.title.as_str()
        };
        let contract_type = if record.contract_type.is_empty() {
            "other"
        } else {
            record.contract_type.as_str()
        };
        table.add_row(row![
            record.id,
            title,
            or_dash(record.contract_number.as_deref()),
            status_cell(&record.status),
            contract_type,
            risk_cell(record.risk_score),
            value,
            format!("{} ↔ {}", record.party_a, record.party_b)
        ]);
    }
    table
}

/// Detailed view of one contract, including risk factors and clauses
pub fn contract_detail(record: &ContractRecord) -> String {
    let mut table = Table::new();
    table.add_row(row!["Title", record.title]);
    table.add_row(row!["Number", or_dash(record.contract_number.as_deref())]);
    table.add_row(row!["Status", status_cell(&record.status)]);
    table.add_row(row!["Type", record.contract_type]);
    table.add_row(row!["Risk", risk_cell(record.risk_score)]);
    table.add_row(row!["Parties", format!("{} ↔ {}", record.party_a, record.party_b)]);
    if let Some(date) = record.effective_date.as_deref() {
        table.add_row(row!["Effective", format_date(date)]);
    }
    if let Some(date) = record.expiration_date.as_deref() {
        table.add_row(row!["Expires", format_date(date)]);
    }
    if let Some(tags) = record.tags.as_ref().filter(|t| !t.is_empty()) {
        table.add_row(row!["Tags", tags.join(", ")]);
    }

    let mut out = format!("{}\n{}", "Uploaded Contract".cyan().bold(), table);

    if let Some(factors) = record.risk_factors.as_ref().filter(|f| !f.is_empty()) {
        out.push_str(&format!("{}\n", "Risk Factors".yellow().bold()));
        for factor in factors {
            out.push_str(&format!("  - {}\n", factor));
        }
    }

    if let Some(clauses) = record.extracted_clauses.as_ref().filter(|c| !c.is_empty()) {
        out.push_str(&format!(
            "{}\n",
            format!("Extracted Clauses ({})", clauses.len()).cyan().bold()
        ));
        for clause in clauses {
            out.push_str(&format!(
                "  [{}] {}\n",
                clause.clause_type.as_deref().unwrap_or("clause"),
                clause.body().unwrap_or("")
            ));
        }
    }
    out
}

/// Compliance records table
pub fn compliance_table(records: &[ComplianceRecord]) -> Table {
    let mut table = Table::new();
    table.add_row(row!["Record", "Framework", "Requirement", "Status", "Score", "Next Review"]);
    for record in records {
        table.add_row(row![
            format!("#{}", record.id),
            record
                .framework_id
                .map(|id| id.to_string())
                .unwrap_or_else(|| "N/A".to_string()),
            or_dash(record.requirement_id.as_deref()),
            status_cell(&record.status),
            record
                .compliance_score
                .map(|s| s.to_string())
                .unwrap_or_else(|| "-".to_string()),
            record
                .next_review_date
                .as_deref()
                .map(format_date)
                .unwrap_or_else(|| "-".to_string())
        ]);
    }
    table
}

/// Compliance frameworks table
pub fn frameworks_table(frameworks: &[ComplianceFramework]) -> Table {
    let mut table = Table::new();
    table.add_row(row!["ID", "Name", "Version", "Description"]);
    for framework in frameworks {
        table.add_row(row![
            framework.id,
            framework.name,
            or_dash(framework.version.as_deref()),
            or_dash(framework.description.as_deref())
        ]);
    }
    table
}

/// Compliance alerts table
pub fn alerts_table(alerts: &[ComplianceAlert]) -> Table {
    let mut table = Table::new();
    table.add_row(row!["ID", "Severity", "Title", "Message", "Resolved"]);
    for alert in alerts {
        let severity = match alert.severity.as_deref() {
            Some(s @ ("critical" | "high")) => s.red().to_string(),
            Some(s @ "medium") => s.yellow().to_string(),
            Some(s) => s.to_string(),
            None => "-".to_string(),
        };
        table.add_row(row![
            alert.id,
            severity,
            alert.title,
            or_dash(alert.message.as_deref()),
            if alert.is_resolved.unwrap_or(false) { "Yes" } else { "No" }
        ]);
    }
    table
}

/// Compliance dashboard counters
pub fn compliance_dashboard_table(dashboard: &ComplianceDashboard) -> Table {
    let mut table = Table::new();
    table.add_row(row!["Total Records", dashboard.total_records]);
    table.add_row(row!["Compliant", dashboard.compliant.to_string().green()]);
    table.add_row(row!["Non-compliant", dashboard.non_compliant.to_string().red()]);
    table.add_row(row!["At Risk", dashboard.at_risk.to_string().yellow()]);
    table.add_row(row!["Compliance Rate", format!("{:.1}%", dashboard.compliance_rate)]);
    table.add_row(row!["Active Alerts", dashboard.active_alerts]);
    table
}

/// Copilot dashboard summary counters
pub fn dashboard_summary_table(summary: &DashboardSummary) -> Table {
    let mut table = Table::new();
    table.add_row(row![
        "Total Contracts",
        format!("{} ({} active)", summary.total_contracts, summary.active_contracts)
    ]);
    table.add_row(row![
        "Compliance Rate",
        format!(
            "{:.1}% ({} / {})",
            summary.compliance_rate.unwrap_or(0.0),
            summary.compliant_records,
            summary.total_compliance_records
        )
    ]);
    table.add_row(row!["Compliance Records", summary.total_compliance_records]);
    table.add_row(row!["Total Reports", summary.total_reports]);
    table
}

/// Reports table
pub fn reports_table(reports: &[ReportRecord]) -> Table {
    let mut table = Table::new();
    table.add_row(row!["ID", "Title", "Type", "Status", "Created"]);
    for report in reports {
        let title = if report.title.is_empty() {
            "Untitled Report"
        } else {
            report.title.as_str()
        };
        table.add_row(row![
            report.id,
            title,
            report.report_type.as_deref().unwrap_or("general"),
            status_cell(report.status.as_deref().unwrap_or("")),
            report
                .created_at
                .as_deref()
                .map(format_date)
                .unwrap_or_else(|| "-".to_string())
        ]);
    }
    table
}

/// Report templates table
pub fn templates_table(templates: &[ReportTemplate]) -> Table {
    let mut table = Table::new();
    table.add_row(row!["ID", "Name", "Type", "Description"]);
    for template in templates {
        table.add_row(row![
            template.id,
            template.name,
            or_dash(template.report_type.as_deref()),
            or_dash(template.description.as_deref())
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use serial_test::serial;

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(0.0), "0");
        assert_eq!(format_amount(999.0), "999");
        assert_eq!(format_amount(1000.0), "1,000");
        assert_eq!(format_amount(1_234_567.891), "1,234,567.89");
        assert_eq!(format_amount(-2500.5), "-2,500.5");
    }

    #[test]
    fn test_format_date_variants() {
        assert_eq!(format_date("2025-12-31T10:00:00Z"), "2025-12-31");
        assert_eq!(format_date("2025-12-31T10:00:00.123456"), "2025-12-31");
        assert_eq!(format_date("2025-12-31"), "2025-12-31");
        assert_eq!(format_date("next year"), "next year");
    }

    #[test]
    #[serial]
    fn test_render_markup_strips_delimiters() {
        colored::control::set_override(false);
        let rendered = render_markup("**Title:** the `id` is *new*\n```json\n{}\n```");
        assert_eq!(rendered, "Title: the id is new\n{}");
        colored::control::unset_override();
    }

    #[test]
    fn test_strip_markup() {
        assert_eq!(strip_markup("**Error**\n\nuse `x`"), "Error\n\nuse x");
    }

    #[test]
    fn test_classify_dispatch_order() {
        let payload = json!({
            "contracts": [{"id": 1, "title": "MSA", "party_a": "A", "party_b": "B"}],
            "reports": [{"id": 2}]
        });
        match PayloadView::classify(&payload) {
            PayloadView::Contracts(records) => assert_eq!(records[0].title, "MSA"),
            other => panic!("unexpected view: {:?}", other),
        }
    }

    #[test]
    fn test_classify_reports_with_type_key() {
        let payload = json!({"reports": [{"id": 3, "title": "Q3", "type": "risk"}]});
        match PayloadView::classify(&payload) {
            PayloadView::Reports(records) => {
                assert_eq!(records[0].report_type.as_deref(), Some("risk"))
            }
            other => panic!("unexpected view: {:?}", other),
        }
    }

    #[test]
    fn test_classify_dashboard_and_contract() {
        let dashboard = json!({"dashboard": {"total_contracts": 4, "compliance_rate": 87.5}});
        assert!(matches!(
            PayloadView::classify(&dashboard),
            PayloadView::Dashboard(DashboardSummary { total_contracts: 4, .. })
        ));

        let contract = json!({"id": 7, "title": "NDA", "party_a": "A", "party_b": "B"});
        assert!(matches!(
            PayloadView::classify(&contract),
            PayloadView::Contract(_)
        ));
    }

    #[test]
    fn test_classify_falls_back_to_raw() {
        let payload = json!({"contracts": "not a list", "count": 2});
        assert_eq!(PayloadView::classify(&payload), PayloadView::Raw(payload.clone()));
    }

    #[test]
    #[serial]
    fn test_render_tables_include_rows() {
        colored::control::set_override(false);
        let rendered = PayloadView::Compliance(vec![ComplianceRecord {
            id: 5,
            status: "compliant".to_string(),
            ..Default::default()
        }])
        .render();
        assert!(rendered.contains("Compliance Records (1)"));
        assert!(rendered.contains("#5"));
        assert!(rendered.contains("N/A"));
        colored::control::unset_override();
    }
}
