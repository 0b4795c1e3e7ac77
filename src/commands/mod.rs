/*!
Command handlers for the CLI

This module provides the handlers invoked by the CLI entrypoint:

- `chat`: Interactive copilot session
- `query`: One-shot copilot question
- `upload`: One-shot contract upload
- `usage`: Inspect or change the free-tier usage state
- `records`: Contract, compliance and report tables

The copilot handlers build a [`CopilotSession`] over the HTTP client and the
SQLite usage store, so one-shot commands and chat share the same gate.
*/

use std::io::Write;
use std::sync::{Arc, Mutex};

use colored::Colorize;

use crate::api::{ApiClient, UploadFilters};
use crate::config::Config;
use crate::error::Result;
use crate::render::{self, PayloadView};
use crate::session::{CopilotSession, Message, RevealSink, SubmitOutcome, UsageSnapshot};
use crate::storage::{SqliteUsageStore, UsageStore};

pub mod records;
pub mod special_commands;

/// Open the usage store named by the configuration
///
/// # Errors
///
/// Returns a storage error if the database cannot be created
pub fn open_usage_store(config: &Config) -> Result<Arc<dyn UsageStore>> {
    let store = match config.storage.usage_db.as_deref() {
        Some(path) => SqliteUsageStore::new_with_path(path)?,
        None => SqliteUsageStore::new()?,
    };
    Ok(Arc::new(store))
}

/// Build a copilot session over the HTTP API
///
/// # Errors
///
/// Returns an error if the HTTP client or usage store cannot be created
pub fn build_session(config: &Config, presenter: Option<Arc<TerminalPresenter>>) -> Result<CopilotSession> {
    let api = Arc::new(ApiClient::new(&config.api)?);
    let store = open_usage_store(config)?;
    let session = CopilotSession::new(api, store, &config.copilot)?;
    Ok(match presenter {
        Some(presenter) => session.with_presenter(presenter),
        None => session,
    })
}

/// Presenter for the terminal, revealing replies when configured to
pub fn terminal_presenter(config: &Config) -> Arc<TerminalPresenter> {
    Arc::new(TerminalPresenter::new(config.copilot.reveal_enabled))
}

#[derive(Debug, Default)]
struct PresenterState {
    printed: usize,
    progress_open: bool,
}

/// Writes reveal frames and upload progress to stdout
///
/// Frames are growing prefixes of the reply, so only the new suffix is
/// printed each time. Markup delimiters are dropped while revealing. With
/// reveal off, frames are ignored and only upload progress is shown.
#[derive(Debug)]
pub struct TerminalPresenter {
    reveal: bool,
    state: Mutex<PresenterState>,
}

impl TerminalPresenter {
    pub fn new(reveal: bool) -> Self {
        Self {
            reveal,
            state: Mutex::new(PresenterState::default()),
        }
    }

    /// Whether successful replies are printed as they are revealed
    pub fn reveals(&self) -> bool {
        self.reveal
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, PresenterState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Terminate an open progress line
    pub fn end_progress(&self) {
        let mut state = self.lock();
        if state.progress_open {
            println!();
            state.progress_open = false;
        }
    }
}

impl RevealSink for TerminalPresenter {
    fn frame(&self, partial: &str) {
        if !self.reveal {
            return;
        }
        self.end_progress();
        let mut state = self.lock();
        if state.printed == 0 {
            print!("\n{} ", "Copilot:".cyan().bold());
        }
        let delta = partial.get(state.printed..).unwrap_or_default();
        print!("{}", render::strip_markup(delta));
        state.printed = partial.len();
        let _ = std::io::stdout().flush();
    }

    fn finish(&self) {
        let mut state = self.lock();
        if state.printed > 0 {
            println!("\n");
        }
        state.printed = 0;
    }

    fn progress(&self, percent: u8) {
        let mut state = self.lock();
        print!("\r{} {:>3}%", "Uploading...".cyan(), percent);
        let _ = std::io::stdout().flush();
        state.progress_open = true;
        if percent >= 100 {
            println!();
            state.progress_open = false;
        }
    }
}

/// Print the outcome of a submitted action
///
/// `revealed` says whether a successful reply was already streamed to the
/// terminal, in which case only its sources and payload are printed.
pub fn print_outcome(outcome: &SubmitOutcome, last: Option<&Message>, usage: UsageSnapshot, revealed: bool) {
    match outcome {
        SubmitOutcome::Completed { failed } => {
            let Some(message) = last else { return };
            if *failed {
                println!("\n{}\n", render::render_markup(message.content()).red());
            } else {
                if !revealed {
                    println!(
                        "\n{} {}\n",
                        "Copilot:".cyan().bold(),
                        render::render_markup(message.content())
                    );
                }
                print_message_extras(message);
            }
        }
        SubmitOutcome::GateRejected => print_upgrade_prompt(usage),
        SubmitOutcome::Busy => {
            println!("{}", "Another request is still in progress.".yellow());
        }
        SubmitOutcome::Invalid(reason) => {
            eprintln!("{}", reason.red());
        }
    }
}

fn print_message_extras(message: &Message) {
    if !message.sources().is_empty() {
        println!(
            "{} {}\n",
            "Sources:".dimmed(),
            message.sources().join(", ").dimmed()
        );
    }
    if let Some(payload) = message.structured_payload() {
        println!("{}\n", PayloadView::classify(payload).render());
    }
}

/// Print the upgrade prompt shown once the free tier is used up
pub fn print_upgrade_prompt(usage: UsageSnapshot) {
    println!("\n{}", "Upgrade Required".yellow().bold());
    println!(
        "You've used {} free queries. To continue using GovernAI Copilot, please upgrade to a paid plan.",
        usage.query_count.to_string().cyan()
    );
    println!("  - Unlimited queries after payment");
    println!(
        "Already paid? Type {} to unlock, or {} to dismiss.\n",
        "/paid".green(),
        "/clear-prompt".dimmed()
    );
}

/// Print the free-tier usage line
pub fn print_usage(usage: UsageSnapshot) {
    if usage.is_paid {
        println!("{} ({} queries used)", "Paid plan".green(), usage.query_count);
    } else {
        let line = format!("Free queries used: {}/{}", usage.query_count, usage.limit);
        if usage.is_blocked() {
            println!("{}", line.red());
        } else {
            println!("{}", line.cyan());
        }
    }
}

// Chat command handler
pub mod chat {
    //! Interactive copilot session
    //!
    //! Reads lines with rustyline; slash commands are handled locally and
    //! everything else is sent to the copilot as a query.

    use super::special_commands::{parse_special_command, print_help, SpecialCommand};
    use super::*;
    use rustyline::error::ReadlineError;
    use rustyline::DefaultEditor;

    /// Start interactive chat
    ///
    /// # Errors
    ///
    /// Returns an error if the session or line editor cannot be created
    pub async fn run_chat(config: Config) -> Result<()> {
        tracing::info!("Starting interactive copilot session");

        let presenter = terminal_presenter(&config);
        let session = build_session(&config, Some(presenter.clone()))?;
        let mut rl = DefaultEditor::new()?;

        print_welcome_banner(&config, session.usage());

        loop {
            let usage = session.usage();
            if !usage.is_paid && usage.query_count > 0 {
                print_usage(usage);
            }
            if session.upgrade_prompt_visible() {
                print_upgrade_prompt(usage);
            }

            match rl.readline(&format!("{} ", "governai>".cyan().bold())) {
                Ok(line) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    rl.add_history_entry(trimmed)?;

                    let command = match parse_special_command(trimmed) {
                        Ok(command) => command,
                        Err(e) => {
                            eprintln!("{}\n", e.to_string().red());
                            continue;
                        }
                    };

                    let outcome = match command {
                        SpecialCommand::Exit => break,
                        SpecialCommand::Help => {
                            print_help();
                            continue;
                        }
                        SpecialCommand::Usage => {
                            print_usage(session.usage());
                            continue;
                        }
                        SpecialCommand::Upgrade => {
                            print_upgrade_prompt(session.usage());
                            continue;
                        }
                        SpecialCommand::MarkPaid => {
                            match session.mark_paid() {
                                Ok(()) => println!("{}\n", "Thanks! Unlimited queries unlocked.".green()),
                                Err(e) => eprintln!("{}\n", format!("Failed to save: {:#}", e).red()),
                            }
                            continue;
                        }
                        SpecialCommand::ClearPrompt => {
                            session.dismiss_upgrade_prompt();
                            continue;
                        }
                        SpecialCommand::Upload(path) => {
                            session
                                .submit_upload_path(path, UploadFilters::default())
                                .await
                        }
                        SpecialCommand::None => session.submit_query(trimmed).await,
                    };

                    presenter.end_progress();
                    print_outcome(
                        &outcome,
                        session.last_message().as_ref(),
                        session.usage(),
                        presenter.reveals(),
                    );
                }
                Err(ReadlineError::Interrupted) => {
                    println!("CTRL-C");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    println!("CTRL-D");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {:?}", err);
                    break;
                }
            }
        }

        session.shutdown();
        println!("Goodbye!");
        Ok(())
    }

    fn print_welcome_banner(config: &Config, usage: UsageSnapshot) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║              GovernAI Copilot - Welcome!                     ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");
        println!("API:    {}", config.api.base_url.cyan());
        match usage.remaining_free_queries() {
            Some(left) => println!("Usage:  {} free queries left\n", left),
            None => println!("Usage:  {}\n", "paid".green()),
        }
        println!("Ask about contracts, compliance, or reports.");
        println!("Type '/help' for available commands, 'exit' to quit\n");
    }
}

// One-shot query handler
pub mod query {
    use super::*;

    /// Ask a single question and print the answer
    ///
    /// With `json`, the structured payload (or `null`) is printed instead of
    /// the formatted answer.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be built
    pub async fn run_query(config: Config, text: String, json: bool) -> Result<SubmitOutcome> {
        let presenter = (!json).then(|| terminal_presenter(&config));
        let session = build_session(&config, presenter.clone())?;
        let outcome = session.submit_query(&text).await;
        let last = session.last_message();

        if json && matches!(outcome, SubmitOutcome::Completed { failed: false }) {
            let payload = last
                .as_ref()
                .and_then(|m| m.structured_payload().cloned())
                .unwrap_or(serde_json::Value::Null);
            println!("{}", serde_json::to_string_pretty(&payload)?);
        } else {
            let revealed = presenter.as_ref().map_or(false, |p| p.reveals());
            print_outcome(&outcome, last.as_ref(), session.usage(), revealed);
        }
        Ok(outcome)
    }
}

// One-shot upload handler
pub mod upload {
    use super::*;
    use std::path::PathBuf;

    /// Upload one contract and print the confirmation
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be built
    pub async fn run_upload(config: Config, file: PathBuf, filters: UploadFilters) -> Result<SubmitOutcome> {
        let presenter = terminal_presenter(&config);
        let session = build_session(&config, Some(presenter.clone()))?;
        let outcome = session.submit_upload_path(&file, filters).await;
        presenter.end_progress();
        print_outcome(
            &outcome,
            session.last_message().as_ref(),
            session.usage(),
            presenter.reveals(),
        );
        Ok(outcome)
    }
}

// Usage state handler
pub mod usage {
    use super::*;
    use crate::cli::UsageCommand;
    use crate::session::UsageGate;

    /// Show or change the persisted usage state
    ///
    /// # Errors
    ///
    /// Returns a storage error if the usage state cannot be read or written
    pub fn run_usage(config: &Config, command: UsageCommand) -> Result<()> {
        let gate = UsageGate::load(open_usage_store(config)?, config.copilot.free_query_limit)?;
        match command {
            UsageCommand::Show => print_usage(gate.snapshot()),
            UsageCommand::MarkPaid => {
                gate.mark_paid()?;
                println!("{}", "Marked as paid.".green());
            }
            UsageCommand::Reset => {
                gate.reset()?;
                println!("Usage counter reset.");
            }
        }
        Ok(())
    }
}
