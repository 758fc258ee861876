//! Qualibot - Main Entry Point
//!
//! The deployed bot receives messages through an external gateway; this
//! binary carries the operational surface that ships with the crate: a
//! console chat simulator wired to in-process collaborators, and config
//! validation.

use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};

use qualibot::config::BotConfig;
use qualibot::dispatch::MessageProcessor;
use qualibot::notify::ConsoleNotifier;
use qualibot::observability::{init_default_logging, HealthServer};
use qualibot::store::memory::InMemoryStore;
use qualibot::testing::mocks::MockCalendar;

/// Conversational lead qualification bot
#[derive(Parser)]
#[command(name = "qualibot")]
#[command(about = "Conversational lead-qualification bot for property viewings")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run an interactive console conversation against a demo tenant
    Chat {
        /// Phone number to impersonate
        #[arg(long, default_value = "+254700000001")]
        phone: String,
    },
    /// Validate configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_default_logging();

    info!("Starting qualibot v{}", env!("CARGO_PKG_VERSION"));

    let config = match load_configuration(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Chat { phone } => run_chat(config, phone).await,
        Commands::Config { show } => handle_config_command(config, show),
    };

    if let Err(e) = result {
        error!("Command failed: {}", e);
        process::exit(1);
    }

    info!("Shutdown complete");
}

fn load_configuration(
    config_path: &Option<PathBuf>,
) -> Result<BotConfig, Box<dyn std::error::Error>> {
    match config_path {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            Ok(BotConfig::load_from_file(path)?)
        }
        None => {
            // Try default locations
            let default_paths = vec!["qualibot.toml", "config/qualibot.toml"];

            for path_str in default_paths {
                let path = PathBuf::from(path_str);
                if path.exists() {
                    info!("Loading configuration from: {}", path.display());
                    return Ok(BotConfig::load_from_file(&path)?);
                }
            }

            info!("No configuration file found, using built-in defaults");
            let config: BotConfig = toml::from_str("[bot]\nid = \"qualibot-dev\"\n")?;
            config.validate()?;
            Ok(config)
        }
    }
}

/// Interactive console conversation: in-memory store with a demo tenant,
/// an in-process calendar, replies printed to stdout.
async fn run_chat(config: BotConfig, phone: String) -> Result<(), Box<dyn std::error::Error>> {
    let store = InMemoryStore::new();
    let tenant = store.seed_demo().await;

    let health_server = Arc::new(HealthServer::new(
        config.bot.id.clone(),
        config.health.port,
    ));
    health_server.set_store_ready(true);
    health_server.set_notifier_ready(true);
    let health_handle = health_server.clone();
    tokio::spawn(async move {
        if let Err(e) = health_handle.start().await {
            error!("Health server error: {}", e);
        }
    });

    let processor = MessageProcessor::new(
        config,
        Arc::new(store.clone()),
        Arc::new(MockCalendar::new()),
        Arc::new(ConsoleNotifier),
    );

    println!(
        "Chatting with {} of {} as {phone}. Type a message, or /quit to exit.\n",
        tenant.bot_name, tenant.company_name
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let text = line.trim();
        if text.is_empty() {
            continue;
        }
        if text == "/quit" || text == "/exit" {
            break;
        }

        match processor.handle_inbound(tenant.id, &phone, text).await {
            Ok(outcome) => {
                info!(action = outcome.action.as_str(), "turn complete");
            }
            Err(e) => {
                error!("Turn failed: {}", e.sanitized());
            }
        }
    }

    Ok(())
}

fn handle_config_command(config: BotConfig, show: bool) -> Result<(), Box<dyn std::error::Error>> {
    if show {
        println!("Current configuration:");
        println!("{}", toml::to_string_pretty(&config)?);
    }

    info!("Configuration validation complete");
    Ok(())
}
