//! Contract, compliance, and report views
//!
//! Thin commands over the read-only API endpoints. Each fetches once and
//! prints a table. API failures are returned as [`GovernaiError::Api`] or
//! [`GovernaiError::Network`] carrying the server's detail text.

use std::path::{Path, PathBuf};

use colored::Colorize;

use crate::api::{ApiClient, ApiFailure, DownloadFormat, GenerateReportRequest};
use crate::cli::{ComplianceCommand, ReportsCommand};
use crate::config::Config;
use crate::error::{GovernaiError, Result};
use crate::render;

fn into_error(failure: ApiFailure) -> GovernaiError {
    match failure {
        ApiFailure::Network(message) => GovernaiError::Network(message),
        ApiFailure::Server { status, detail } => GovernaiError::Api {
            status,
            message: detail.unwrap_or_else(|| "Server error".to_string()),
        },
        ApiFailure::Detail { status, detail } => GovernaiError::Api {
            status,
            message: detail,
        },
        ApiFailure::Unknown(message) => GovernaiError::Api { status: 0, message },
    }
}

/// List contracts
///
/// # Errors
///
/// Returns an API error if the contracts cannot be fetched
pub async fn list_contracts(config: &Config, json: bool) -> Result<()> {
    let client = ApiClient::new(&config.api)?;
    let contracts = client.list_contracts().await.map_err(into_error)?;
    tracing::debug!("Fetched {} contracts", contracts.len());

    if json {
        println!("{}", serde_json::to_string_pretty(&contracts)?);
        return Ok(());
    }
    if contracts.is_empty() {
        println!("No contracts found.");
        return Ok(());
    }

    println!("\n{}\n", format!("Contracts ({})", contracts.len()).cyan().bold());
    render::contracts_table(&contracts).printstd();
    println!();
    Ok(())
}

/// Run a compliance subcommand
///
/// # Errors
///
/// Returns an API error if the request fails
pub async fn run_compliance(config: &Config, command: ComplianceCommand) -> Result<()> {
    let client = ApiClient::new(&config.api)?;
    match command {
        ComplianceCommand::Dashboard => {
            let dashboard = client.compliance_dashboard().await.map_err(into_error)?;
            println!("\n{}\n", "Compliance Dashboard".cyan().bold());
            render::compliance_dashboard_table(&dashboard).printstd();
        }
        ComplianceCommand::Frameworks => {
            let frameworks = client.compliance_frameworks().await.map_err(into_error)?;
            if frameworks.is_empty() {
                println!("No compliance frameworks configured.");
                return Ok(());
            }
            render::frameworks_table(&frameworks).printstd();
        }
        ComplianceCommand::Records => {
            let records = client.compliance_records().await.map_err(into_error)?;
            if records.is_empty() {
                println!("No compliance records found.");
                return Ok(());
            }
            println!(
                "\n{}\n",
                format!("Compliance Records ({})", records.len()).cyan().bold()
            );
            render::compliance_table(&records).printstd();
        }
        ComplianceCommand::Alerts => {
            let alerts = client.compliance_alerts().await.map_err(into_error)?;
            if alerts.is_empty() {
                println!("{}", "No active compliance alerts.".green());
                return Ok(());
            }
            render::alerts_table(&alerts).printstd();
        }
    }
    Ok(())
}

/// Run a reports subcommand
///
/// # Errors
///
/// Returns an API error if the request fails, or an IO error if a download
/// cannot be written
pub async fn run_reports(config: &Config, command: ReportsCommand) -> Result<()> {
    let client = ApiClient::new(&config.api)?;
    match command {
        ReportsCommand::List => {
            let reports = client.list_reports().await.map_err(into_error)?;
            if reports.is_empty() {
                println!("No reports generated yet.");
                return Ok(());
            }
            println!("\n{}\n", format!("Reports ({})", reports.len()).cyan().bold());
            render::reports_table(&reports).printstd();
        }
        ReportsCommand::Templates => {
            let templates = client.report_templates().await.map_err(into_error)?;
            if templates.is_empty() {
                println!("No report templates available.");
                return Ok(());
            }
            render::templates_table(&templates).printstd();
        }
        ReportsCommand::Generate {
            title,
            report_type,
            template_id,
        } => {
            if title.trim().is_empty() {
                return Err(GovernaiError::Validation("Report title cannot be empty".into()).into());
            }
            let request = GenerateReportRequest {
                title: title.trim().to_string(),
                report_type,
                template_id,
            };
            let report = client.generate_report(&request).await.map_err(into_error)?;
            tracing::info!("Generated report {} ({})", report.id, report.title);
            println!("{}", format!("Report {} generated", report.id).green());
            render::reports_table(std::slice::from_ref(&report)).printstd();
        }
        ReportsCommand::Download { id, format, output } => {
            let download = client
                .download_report(id, DownloadFormat::from(format))
                .await
                .map_err(into_error)?;
            let path = output.unwrap_or_else(|| PathBuf::from(&download.file_name));
            write_download(&path, &download.bytes).await?;
            println!(
                "{}",
                format!("Saved {} ({} bytes)", path.display(), download.bytes.len()).green()
            );
        }
    }
    Ok(())
}

async fn write_download(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, bytes).await?;
    tracing::debug!("Wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}
