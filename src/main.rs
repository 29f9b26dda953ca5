//! VK History Export CLI - main entry point
//!
//! Exports a conversation's message history and helps obtain an access token.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use vk_history_export::auth::{DEFAULT_CLIENT_ID, DEFAULT_SCOPE};
use vk_history_export::commands::{self, ExportArgs};
use vk_history_export::Config;

#[derive(Parser)]
#[command(name = "vk_history_export")]
#[command(about = "Export VK conversation history to JSON or text", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to config.yml (defaults to ./config.yml, then ../config.yml)
    #[arg(long, env = "VK_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download a conversation's history and save it to a file
    Export {
        /// Peer id: user id, -group id, or 2000000000 + chat number
        #[arg(short, long, allow_negative_numbers = true, conflicts_with = "chat")]
        peer: Option<i64>,

        /// Multi-user chat number (converted to a peer id)
        #[arg(short, long)]
        chat: Option<i64>,

        /// Output file path (.txt defaults to the text format)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format: json | text
        #[arg(short, long)]
        format: Option<String>,

        /// Messages per request (1-200)
        #[arg(long)]
        page_size: Option<u32>,

        /// Delay between requests in milliseconds
        #[arg(long)]
        delay_ms: Option<u64>,

        /// Maximum number of messages to fetch
        #[arg(short, long)]
        limit: Option<usize>,

        /// Keep only text messages in the JSON export
        #[arg(long, default_value_t = false)]
        text_only: bool,

        /// Request history oldest-first
        #[arg(long, default_value_t = false)]
        oldest_first: bool,
    },

    /// Print the browser address for obtaining an access token
    AuthUrl {
        /// OAuth application id
        #[arg(long, default_value_t = DEFAULT_CLIENT_ID)]
        client_id: u64,

        /// Requested permissions
        #[arg(long, default_value = DEFAULT_SCOPE)]
        scope: String,
    },

    /// Extract the access token from the blank-page redirect address
    Token {
        /// Full address of the page VK redirected to
        redirect_url: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env for local development
    let _ = dotenvy::dotenv();

    // Initialize logging
    vk_history_export::logging::init()?;

    let cli = Cli::parse();
    execute_command(cli).await
}

async fn execute_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Export {
            peer,
            chat,
            output,
            format,
            page_size,
            delay_ms,
            limit,
            text_only,
            oldest_first,
        } => {
            let config = match cli.config {
                Some(path) => Config::load_from_file(&path)?,
                None => Config::new()?,
            };
            let args = ExportArgs {
                peer,
                chat,
                output,
                format,
                page_size,
                delay_ms,
                limit,
                text_only,
                oldest_first,
            };

            let summary = commands::export_run(config, args).await?;
            for line in commands::export_report(&summary) {
                println!("{}", line);
            }
        }
        Commands::AuthUrl { client_id, scope } => {
            println!("{}", commands::token_auth_url(client_id, &scope)?);
        }
        Commands::Token { redirect_url } => {
            let grant = commands::token_from_redirect(&redirect_url)?;
            println!("VK_ACCESS_TOKEN={}", grant.access_token);
        }
    }

    Ok(())
}
