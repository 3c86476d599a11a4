pub mod commands;
pub mod context;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "portal")]
#[command(about = "School portal CLI - session, routing and API access for the school management portal")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in human-readable text format")]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Login, logout and session inspection")]
    Auth {
        #[command(subcommand)]
        cmd: commands::auth::AuthCommands,
    },

    #[command(about = "Show where the portal shell sends the current session")]
    Route {
        #[arg(long, help = "Page the shell is mounted on (defaults to none)")]
        from: Option<String>,
    },

    #[command(about = "Check whether the current session may open a page")]
    Open {
        #[arg(help = "Page path, e.g. /admin/teachers")]
        path: String,
    },

    #[command(about = "Authenticated API call")]
    Fetch(commands::fetch::FetchArgs),

    #[command(about = "School lifecycle management (super-admin)")]
    School {
        #[command(subcommand)]
        cmd: commands::school::SchoolCommands,
    },
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
    let ctx = context::CliContext::from_config(crate::config::config())?;

    match cli.command {
        Commands::Auth { cmd } => commands::auth::handle(cmd, &ctx, output_format).await,
        Commands::Route { from } => commands::navigate::route(from, &ctx, output_format),
        Commands::Open { path } => commands::navigate::open(&path, &ctx, output_format),
        Commands::Fetch(args) => commands::fetch::handle(args, &ctx, output_format).await,
        Commands::School { cmd } => commands::school::handle(cmd, &ctx, output_format).await,
    }
}
