pub mod client;
pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use client::ApiClient;

#[derive(Parser)]
#[command(name = "superuser")]
#[command(about = "Superuser CLI - platform administration for the POS back office")]
#[command(version)]
pub struct Cli {
    #[arg(
        long,
        global = true,
        env = "SUPERUSER_API_URL",
        default_value = "http://localhost:3000",
        help = "Base URL of the superuser API"
    )]
    pub server: String,

    #[arg(
        long,
        global = true,
        env = "SUPERUSER_API_TOKEN",
        hide_env_values = true,
        help = "Bearer token of the platform admin"
    )]
    pub token: Option<String>,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Start, inspect and end impersonation grants")]
    Impersonate {
        #[command(subcommand)]
        cmd: commands::impersonate::ImpersonateCommands,
    },

    #[command(about = "Check server health status from API /health endpoint")]
    Health,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);
    let client = ApiClient::new(&cli.server, cli.token.clone())?;

    match cli.command {
        Commands::Impersonate { cmd } => {
            commands::impersonate::handle(cmd, &client, output_format).await
        }
        Commands::Health => commands::health::handle(&client, output_format).await,
    }
}
