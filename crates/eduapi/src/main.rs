//! `eduapi` - CLI for the EvolveEdu API client
//!
//! This binary sends requests through [`eduapi::ApiClient`], keeping the
//! session token in a local database between runs.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::sync::Arc;

use clap::Parser;

use eduapi::cli::{self, BodyCommand, Cli, Command, ConfigCommand, PathCommand};
use eduapi::effects::{ConsoleNavigator, ConsoleNotifier};
use eduapi::storage::{SqliteStore, TOKEN_KEY};
use eduapi::{init_logging, ApiClient, ApiRequest, ApiResponse, Config};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    init_logging(cli.verbosity());

    let config = Config::load_from(cli.config.clone())?;

    if let Command::Config(config_cmd) = cli.command {
        return handle_config(&config, config_cmd);
    }

    let store = SqliteStore::open(config.database_path())?;
    let client = ApiClient::builder(config.api.clone())
        .store(Arc::new(store.clone()))
        .notifier(Arc::new(ConsoleNotifier))
        .navigator(Arc::new(ConsoleNavigator::new(config.api.origin.clone())))
        .build()?;

    match cli.command {
        Command::Login(cmd) => {
            client.login(&cmd.token).await?;
            println!("Session token stored in {}", store.path().display());
        }
        Command::Logout => {
            if client.logout().await? {
                println!("Session token removed.");
            } else {
                println!("No session token was stored.");
            }
        }
        Command::Token(cmd) => handle_token(&client, &store, cmd.json).await?,
        Command::Get(PathCommand { path }) => print_response(&client.get(&path).await?)?,
        Command::Delete(PathCommand { path }) => print_response(&client.delete(&path).await?)?,
        Command::Post(cmd) => send_with_body(&client, ApiRequest::post(&cmd.path), &cmd).await?,
        Command::Put(cmd) => send_with_body(&client, ApiRequest::put(&cmd.path), &cmd).await?,
        Command::Patch(cmd) => send_with_body(&client, ApiRequest::patch(&cmd.path), &cmd).await?,
        Command::Config(cmd) => handle_config(&config, cmd)?,
    }

    Ok(())
}

async fn send_with_body(
    client: &ApiClient,
    request: ApiRequest,
    cmd: &BodyCommand,
) -> Result<(), Box<dyn std::error::Error>> {
    let body = cli::parse_data(cmd.data.as_deref())?;
    let response = client.send(request.with_body(body)).await?;
    print_response(&response)
}

fn print_response(response: &ApiResponse) -> Result<(), Box<dyn std::error::Error>> {
    if !response.body().is_null() {
        println!("{}", serde_json::to_string_pretty(response.body())?);
    }
    Ok(())
}

async fn handle_token(
    client: &ApiClient,
    store: &SqliteStore,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let token = client.token().await?;
    let updated_at = store.updated_at(TOKEN_KEY).await?;

    if json {
        let status = serde_json::json!({
            "authenticated": token.is_some(),
            "token": token.as_deref().map(cli::mask_token),
            "updated_at": updated_at,
            "store": store.path(),
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("eduapi session");
        println!("--------------");
        match (&token, updated_at) {
            (Some(token), Some(at)) => {
                println!("Token:         {}", cli::mask_token(token));
                println!("Stored at:     {}", at.to_rfc3339());
            }
            (Some(token), None) => println!("Token:         {}", cli::mask_token(token)),
            (None, _) => println!("Token:         (none)"),
        }
        println!("Store:         {}", store.path().display());
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[API]");
                println!("  Base URL:           {}", config.api.resolved_base_url()?);
                println!("  Timeout (secs):     {}", config.api.timeout_secs);
                println!("  Login path:         {}", config.api.login_path);
                println!();
                println!("[Storage]");
                println!("  Database path:      {}", config.database_path().display());
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}
