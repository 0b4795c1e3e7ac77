//! Command-line interface definition for GovernAI
//!
//! This module defines the CLI structure using clap's derive API,
//! providing the interactive copilot plus one-shot commands for the
//! contract, compliance, and report views.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// GovernAI - contract governance copilot
///
/// Ask natural-language questions about contracts, compliance, and reports,
/// upload contracts for analysis, and browse the governance dashboards.
#[derive(Parser, Debug, Clone)]
#[command(name = "governai")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub json_logs: bool,

    /// Override the API base URL
    #[arg(long)]
    pub api_url: Option<String>,

    /// Override the usage database path
    #[arg(long)]
    pub usage_db: Option<String>,

    /// Print answers at once instead of revealing them word by word
    #[arg(long)]
    pub no_reveal: bool,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for GovernAI
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start an interactive copilot session
    Chat,

    /// Ask the copilot a single question
    Query {
        /// Natural-language question
        text: String,

        /// Print the raw structured payload as JSON
        #[arg(long)]
        json: bool,
    },

    /// Upload a contract document for analysis
    Upload {
        /// Path to the contract file
        file: PathBuf,

        /// Classification metadata sent with the upload
        #[command(flatten)]
        filters: UploadFilterArgs,
    },

    /// List contracts
    Contracts {
        /// Print the raw response as JSON
        #[arg(long)]
        json: bool,
    },

    /// Compliance views
    Compliance {
        /// Compliance subcommand
        #[command(subcommand)]
        command: ComplianceCommand,
    },

    /// Report listing, generation, and download
    Reports {
        /// Reports subcommand
        #[command(subcommand)]
        command: ReportsCommand,
    },

    /// Inspect or change the local free-tier usage state
    Usage {
        /// Usage subcommand
        #[command(subcommand)]
        command: UsageCommand,
    },
}

/// Upload filter flags shared by `upload` and the chat `/upload` command
#[derive(clap::Args, Debug, Clone, Default)]
pub struct UploadFilterArgs {
    /// Contract status (e.g. active, draft, expired)
    #[arg(long)]
    pub status: Option<String>,

    /// Contract type (e.g. vendor, employment, nda)
    #[arg(long)]
    pub contract_type: Option<String>,

    /// Lower risk score bound
    #[arg(long)]
    pub min_risk_score: Option<f64>,

    /// Upper risk score bound
    #[arg(long)]
    pub max_risk_score: Option<f64>,

    /// Lower contract value bound
    #[arg(long)]
    pub min_contract_value: Option<f64>,

    /// Upper contract value bound
    #[arg(long)]
    pub max_contract_value: Option<f64>,

    /// Contract currency code
    #[arg(long)]
    pub currency: Option<String>,

    /// Tag to attach (repeatable)
    #[arg(long = "tag")]
    pub tags: Vec<String>,
}

/// Compliance subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ComplianceCommand {
    /// Show the compliance dashboard summary
    Dashboard,
    /// List compliance frameworks
    Frameworks,
    /// List compliance records
    Records,
    /// List compliance alerts
    Alerts,
}

/// Reports subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ReportsCommand {
    /// List generated reports
    List,

    /// List report templates
    Templates,

    /// Generate a new report
    Generate {
        /// Report title
        #[arg(short, long)]
        title: String,

        /// Report type (financial, operational, compliance, risk)
        #[arg(short = 'r', long, default_value = "financial")]
        report_type: String,

        /// Template to base the report on
        #[arg(long)]
        template_id: Option<i64>,
    },

    /// Download a report to disk
    Download {
        /// Report identifier
        id: i64,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = DownloadFormatArg::Json)]
        format: DownloadFormatArg,

        /// Output path (defaults to a name derived from the report)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Download format selector
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadFormatArg {
    /// JSON document
    Json,
    /// PDF document
    Pdf,
    /// Excel workbook
    Xlsx,
}

/// Usage subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum UsageCommand {
    /// Show the query counter and paid flag
    Show,
    /// Record that the upgrade has been paid
    MarkPaid,
    /// Clear the persisted counter and paid flag
    Reset,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
