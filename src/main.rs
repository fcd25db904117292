use anyhow::Result;
use clap::{Parser, Subcommand};
use std::io::IsTerminal;
use std::process::ExitCode;

use trello_gcal_sync::api::{GoogleCalendarProvider, TrelloProvider};
use trello_gcal_sync::auth::{ClientSecret, CredentialProvider, StdinConsentPrompt, TokenStore};
use trello_gcal_sync::config::Config;
use trello_gcal_sync::env_vars::env_vars_by_category;
use trello_gcal_sync::logging;
use trello_gcal_sync::services::{CardSyncService, SyncSettings};

#[derive(Parser)]
#[command(name = "trello-gcal-sync")]
#[command(about = "Create Google Calendar events for the cards on a Trello list")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Config file path
    #[arg(short, long)]
    config: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create events for unsynced cards (default)
    Sync {
        /// List the cards that would be synced without creating anything
        #[arg(long)]
        dry_run: bool,

        /// Fail instead of prompting when calendar authorization is needed
        #[arg(long)]
        no_interactive: bool,
    },

    /// Authorize calendar access and store the credential
    Auth,

    /// Delete the stored calendar credential
    Revoke,

    /// Show the effective configuration and supported environment variables
    Config,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Load configuration first (needed for logging setup)
    let config = Config::load(cli.config.as_deref())?;

    let logging_handle = logging::init_logging(&config, cli.verbose)?;

    let command = cli.command.unwrap_or(Commands::Sync {
        dry_run: false,
        no_interactive: false,
    });

    let outcome = match command {
        Commands::Sync {
            dry_run,
            no_interactive,
        } => cmd_sync(&config, dry_run, no_interactive).await,
        Commands::Auth => cmd_auth(&config).await,
        Commands::Revoke => cmd_revoke(&config),
        Commands::Config => cmd_config(&config),
    };

    if let Some(log_path) = &logging_handle.log_file_path {
        eprintln!("Session log: {}", log_path.display());
    }

    outcome
}

/// Build the calendar credential provider, with a terminal prompt when allowed
fn credential_provider(config: &Config, interactive: bool) -> Result<CredentialProvider> {
    let secret = ClientSecret::load(&config.google.client_secret_path())?;
    let store = TokenStore::new(config.google.credentials_path());
    let provider = CredentialProvider::new(secret, store);

    if interactive && std::io::stdin().is_terminal() {
        Ok(provider.with_prompt(StdinConsentPrompt))
    } else {
        Ok(provider)
    }
}

async fn cmd_sync(config: &Config, dry_run: bool, no_interactive: bool) -> Result<ExitCode> {
    // Fail fast on configuration before touching either service
    let trello = config.validate()?;

    let access_token = credential_provider(config, !no_interactive)?
        .get_valid_credential()
        .await?;

    let board = TrelloProvider::new(trello.app_key.clone(), trello.app_token.clone());
    let calendar = GoogleCalendarProvider::new(access_token, &config.google.application_name);
    let service = CardSyncService::new(
        board,
        calendar,
        SyncSettings::from_config(&trello, &config.google),
    );
    service.authenticate_board().await?;

    if dry_run {
        let cards = service.plan().await?;
        if cards.is_empty() {
            println!("Nothing to sync");
            return Ok(ExitCode::SUCCESS);
        }

        println!("Would create {} events", cards.len());
        println!("{}", "─".repeat(60));
        for card in &cards {
            println!("  {}  {}", card.creation_date(), card.name);
        }
        return Ok(ExitCode::SUCCESS);
    }

    let result = service.synchronize().await?;
    println!("{}", result.summary());

    for failure in &result.failed {
        eprintln!("  {}: {}", failure.card_name, failure.error);
        if failure.is_duplicate_risk() {
            eprintln!("    the event was created; rerunning will create a duplicate");
        }
    }

    if result.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

async fn cmd_auth(config: &Config) -> Result<ExitCode> {
    let mut provider = credential_provider(config, true)?;
    provider.get_valid_credential().await?;

    println!("Calendar access authorized");
    println!("Credential file: {}", provider.store().path().display());
    Ok(ExitCode::SUCCESS)
}

fn cmd_revoke(config: &Config) -> Result<ExitCode> {
    let store = TokenStore::new(config.google.credentials_path());
    if store.remove()? {
        println!("Removed stored credential {}", store.path().display());
    } else {
        println!("No stored credential at {}", store.path().display());
    }
    Ok(ExitCode::SUCCESS)
}

fn cmd_config(config: &Config) -> Result<ExitCode> {
    println!("{}", config.redacted().to_toml()?);

    println!("Files");
    println!("{}", "─".repeat(60));
    if let Some(path) = Config::user_config_path() {
        let state = if path.exists() { "" } else { " (not found)" };
        println!("  config:        {}{}", path.display(), state);
    }
    println!(
        "  client secret: {}",
        config.google.client_secret_path().display()
    );
    println!(
        "  credentials:   {}",
        config.google.credentials_path().display()
    );
    println!("  logs:          {}", Config::logs_path().display());
    println!();

    println!("Environment variables");
    println!("{}", "─".repeat(60));
    for (category, vars) in env_vars_by_category() {
        println!("{}", category.display_name());
        for var in vars {
            let marker = if var.required { " (required)" } else { "" };
            println!("  {}{}", var.name, marker);
            println!("      {}", var.description);
            if let Some(default) = var.default {
                println!("      default: {}", default);
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}
