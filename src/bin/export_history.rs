//! Export a conversation by peer id.
//!
//! Usage: export_history <peer_id> [output]

use clap::Parser;
use std::path::PathBuf;
use vk_history_export::commands::{export_report, export_run, ExportArgs};
use vk_history_export::Config;

#[derive(Parser)]
#[command(name = "export_history")]
#[command(about = "Download VK conversation history by peer id")]
struct Args {
    /// Peer id (user id, or 2000000000 + chat number)
    #[arg(allow_negative_numbers = true)]
    peer_id: i64,

    /// Output file
    #[arg(default_value = "messages.json")]
    output: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    vk_history_export::logging::init()?;

    let args = Args::parse();
    let summary = export_run(
        Config::new()?,
        ExportArgs {
            peer: Some(args.peer_id),
            output: Some(args.output),
            ..Default::default()
        },
    )
    .await?;

    for line in export_report(&summary) {
        println!("{}", line);
    }

    Ok(())
}
