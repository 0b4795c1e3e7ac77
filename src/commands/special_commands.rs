//! Special commands parser for interactive chat
//!
//! Lines starting with `/` are session commands rather than copilot
//! queries. Command names are case-insensitive; arguments keep their case.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when parsing special commands
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Unknown command was entered
    #[error("Unknown command: {0}\n\nType '/help' to see available commands")]
    UnknownCommand(String),

    /// Command requires an argument but none was provided
    #[error("Command {command} requires an argument\n\nUsage: {usage}")]
    MissingArgument { command: String, usage: String },

    /// Command does not take arguments
    #[error("Command {0} does not take arguments")]
    UnexpectedArgument(String),
}

/// Commands handled by the chat loop itself
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecialCommand {
    /// Upload a contract file for analysis
    Upload(PathBuf),

    /// Show free-tier usage
    Usage,

    /// Show the upgrade prompt
    Upgrade,

    /// Record a paid entitlement ("I've already paid")
    MarkPaid,

    /// Dismiss the upgrade prompt
    ClearPrompt,

    /// Display help information
    Help,

    /// Exit the interactive session
    Exit,

    /// Not a special command; the line is a copilot query
    None,
}

/// Parse a line of chat input
///
/// # Errors
///
/// Returns [`CommandError`] for unknown commands or bad arguments
///
/// # Examples
///
/// ```
/// use governai::commands::special_commands::{parse_special_command, SpecialCommand};
///
/// assert_eq!(parse_special_command("/usage").unwrap(), SpecialCommand::Usage);
/// assert_eq!(
///     parse_special_command("which contracts expire soon?").unwrap(),
///     SpecialCommand::None
/// );
/// ```
pub fn parse_special_command(input: &str) -> Result<SpecialCommand, CommandError> {
    let trimmed = input.trim();
    if !trimmed.starts_with('/') {
        return match trimmed.to_lowercase().as_str() {
            "exit" | "quit" => Ok(SpecialCommand::Exit),
            _ => Ok(SpecialCommand::None),
        };
    }

    let (name, arg) = match trimmed.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (trimmed, ""),
    };
    let name = name.to_lowercase();

    let no_args = |command: SpecialCommand| {
        if arg.is_empty() {
            Ok(command)
        } else {
            Err(CommandError::UnexpectedArgument(name.clone()))
        }
    };

    match name.as_str() {
        "/upload" => {
            if arg.is_empty() {
                Err(CommandError::MissingArgument {
                    command: name.clone(),
                    usage: "/upload <path-to-contract>".to_string(),
                })
            } else {
                Ok(SpecialCommand::Upload(PathBuf::from(unquote(arg))))
            }
        }
        "/usage" | "/status" => no_args(SpecialCommand::Usage),
        "/upgrade" => no_args(SpecialCommand::Upgrade),
        "/paid" => no_args(SpecialCommand::MarkPaid),
        "/clear-prompt" | "/dismiss" => no_args(SpecialCommand::ClearPrompt),
        "/help" | "/?" => no_args(SpecialCommand::Help),
        "/exit" | "/quit" => no_args(SpecialCommand::Exit),
        _ => Err(CommandError::UnknownCommand(name.clone())),
    }
}

fn unquote(arg: &str) -> &str {
    let quoted = arg.len() >= 2
        && ((arg.starts_with('"') && arg.ends_with('"'))
            || (arg.starts_with('\'') && arg.ends_with('\'')));
    if quoted {
        &arg[1..arg.len() - 1]
    } else {
        arg
    }
}

/// Print the chat help text
pub fn print_help() {
    println!(
        r#"
GovernAI Copilot Commands
=========================

Type a question to ask the copilot, for example:
  Show me all high-risk contracts
  What is our GDPR compliance status?

CONTRACTS:
  /upload <path>   - Upload a contract (PDF, DOCX, TXT) for analysis

USAGE:
  /usage           - Show free queries used
  /upgrade         - Show upgrade information
  /paid            - Mark this installation as paid
  /clear-prompt    - Dismiss the upgrade prompt

SESSION:
  /help            - Show this help
  /exit            - Leave the copilot (also: exit, quit, Ctrl-D)
"#
    );
}
