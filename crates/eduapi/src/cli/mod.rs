//! Command-line interface for eduapi.
//!
//! This module provides the CLI structure for the `eduapi` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::Value;

pub use commands::{BodyCommand, ConfigCommand, LoginCommand, PathCommand, TokenCommand};

use crate::error::Result;

/// eduapi - Talk to the EvolveEdu backend from the terminal
///
/// Sends requests through the same authenticated, error-classifying client
/// the application uses, keeping the session token between runs.
#[derive(Debug, Parser)]
#[command(name = "eduapi")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store a session token
    Login(LoginCommand),

    /// Forget the stored session token
    Logout,

    /// Show whether a session token is stored
    Token(TokenCommand),

    /// Send a GET request
    Get(PathCommand),

    /// Send a POST request
    Post(BodyCommand),

    /// Send a PUT request
    Put(BodyCommand),

    /// Send a PATCH request
    Patch(BodyCommand),

    /// Send a DELETE request
    Delete(PathCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        if self.quiet {
            crate::logging::Verbosity::Quiet
        } else {
            match self.verbose {
                0 => crate::logging::Verbosity::Normal,
                1 => crate::logging::Verbosity::Verbose,
                _ => crate::logging::Verbosity::Trace,
            }
        }
    }
}

/// Parse the `--data` argument of a body command.
///
/// A missing body is sent as `{}`.
///
/// # Errors
///
/// Returns an error if the argument is not valid JSON.
pub fn parse_data(data: Option<&str>) -> Result<Value> {
    match data {
        Some(raw) => Ok(serde_json::from_str(raw)?),
        None => Ok(Value::Object(serde_json::Map::new())),
    }
}

/// Mask a token for display, keeping only its last four characters.
#[must_use]
pub fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{tail}", "*".repeat(chars.len() - 4))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use serde_json::json;

    fn cli_with(verbose: u8, quiet: bool) -> Cli {
        Cli {
            config: None,
            verbose,
            quiet,
            command: Command::Logout,
        }
    }

    #[test]
    fn test_cli_name() {
        assert_eq!(Cli::command().get_name(), "eduapi");
    }

    #[test]
    fn test_cli_verify() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_verbosity_levels() {
        use crate::logging::Verbosity;

        assert_eq!(cli_with(0, true).verbosity(), Verbosity::Quiet);
        assert_eq!(cli_with(0, false).verbosity(), Verbosity::Normal);
        assert_eq!(cli_with(1, false).verbosity(), Verbosity::Verbose);
        assert_eq!(cli_with(2, false).verbosity(), Verbosity::Trace);
    }

    #[test]
    fn test_parse_login() {
        let cli = Cli::try_parse_from(["eduapi", "login", "--token", "abc"]).unwrap();
        match cli.command {
            Command::Login(cmd) => assert_eq!(cmd.token, "abc"),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_get() {
        let cli = Cli::try_parse_from(["eduapi", "get", "notes/"]).unwrap();
        match cli.command {
            Command::Get(cmd) => assert_eq!(cmd.path, "notes/"),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_post_with_data() {
        let cli =
            Cli::try_parse_from(["eduapi", "post", "quizzes/", "-d", r#"{"topic":"sets"}"#])
                .unwrap();
        match cli.command {
            Command::Post(cmd) => {
                assert_eq!(cmd.path, "quizzes/");
                assert_eq!(cmd.data.as_deref(), Some(r#"{"topic":"sets"}"#));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_config_validate() {
        let cli = Cli::try_parse_from(["eduapi", "config", "validate", "/tmp/c.toml"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Config(ConfigCommand::Validate { file: Some(_) })
        ));
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::try_parse_from(["eduapi", "token", "-vv", "--json"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, Command::Token(TokenCommand { json: true })));
    }

    #[test]
    fn test_parse_data() {
        assert_eq!(parse_data(None).unwrap(), json!({}));
        assert_eq!(parse_data(Some(r#"{"a":1}"#)).unwrap(), json!({"a": 1}));
        assert!(parse_data(Some("{not json")).is_err());
    }

    #[test]
    fn test_mask_token() {
        assert_eq!(mask_token("abcd"), "****");
        assert_eq!(mask_token("0123456789abcdef"), "************cdef");
    }
}
