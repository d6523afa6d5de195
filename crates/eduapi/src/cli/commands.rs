//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand};

/// Login command arguments.
#[derive(Debug, Args)]
pub struct LoginCommand {
    /// Session token issued by the backend
    #[arg(short, long, env = "EDUAPI_TOKEN", hide_env_values = true)]
    pub token: String,
}

/// Token status command arguments.
#[derive(Debug, Args)]
pub struct TokenCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Arguments for requests without a body.
#[derive(Debug, Args)]
pub struct PathCommand {
    /// Request path, relative to the API base URL (e.g. `notes/`)
    pub path: String,
}

/// Arguments for requests with a JSON body.
#[derive(Debug, Args)]
pub struct BodyCommand {
    /// Request path, relative to the API base URL (e.g. `notes/`)
    pub path: String,

    /// JSON request body
    #[arg(short, long, value_name = "JSON")]
    pub data: Option<String>,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        file: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Debug, Parser)]
    struct BodyHarness {
        #[command(flatten)]
        cmd: BodyCommand,
    }

    #[test]
    fn test_body_command_with_data() {
        let parsed =
            BodyHarness::try_parse_from(["test", "notes/", "--data", r#"{"title":"x"}"#]).unwrap();
        assert_eq!(parsed.cmd.path, "notes/");
        assert_eq!(parsed.cmd.data.as_deref(), Some(r#"{"title":"x"}"#));
    }

    #[test]
    fn test_body_command_without_data() {
        let parsed = BodyHarness::try_parse_from(["test", "notes/"]).unwrap();
        assert!(parsed.cmd.data.is_none());
    }

    #[test]
    fn test_token_command_debug() {
        let cmd = TokenCommand { json: true };
        assert!(format!("{cmd:?}").contains("json: true"));
    }
}
