//! Prospect — account discovery, entity embeddings and intent scoring.

use std::path::PathBuf;

use tracing::info;
use tracing_subscriber::EnvFilter;

mod commands;
mod state;

use state::AppContext;

fn resolve_data_dir() -> PathBuf {
    std::env::var("PROSPECT_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let exe_dir = std::env::current_exe()
                .ok()
                .and_then(|p| p.parent().map(|p| p.to_path_buf()));
            if let Some(dir) = exe_dir {
                let parent_data = dir.join("../data");
                if parent_data.exists() {
                    return parent_data;
                }
            }
            PathBuf::from("data")
        })
}

fn print_help() {
    println!("Prospect — account discovery and intent scoring");
    println!();
    println!("Usage: prospect <command> [args]");
    println!();
    println!("Commands:");
    println!("  search <query> [count] [kind]      Run a provider search and store the results");
    println!("  enrich <job-id> <description>      Enrich a completed search job");
    println!("  refresh [kind] [--force]           Regenerate missing or stale embeddings");
    println!("  embed <text>                       Embed text and print keywords");
    println!("  similar <text> [top-k] [--keywords]  Find stored entities similar to text");
    println!("  delete <entity-id>                 Remove an entity and its embedding");
    println!("  score <input.json>                 Score a signal report or structured score");
    println!("  signals <company> <docs.json...>   Detect signals in documents and score them");
    println!("  model [provider] [model]           Show or set the scoring model");
    println!("  stats                              Show store statistics");
    println!("  help                               Show this help message");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    let Some(command) = args.get(1).map(String::as_str) else {
        print_help();
        return Ok(());
    };
    if matches!(command, "--help" | "-h" | "help") {
        print_help();
        return Ok(());
    }
    if !commands::is_known(command) {
        eprintln!("Unknown command: {}. Use 'prospect help' for usage.", command);
        std::process::exit(1);
    }

    let data_dir = resolve_data_dir();
    info!("Data directory: {}", data_dir.display());

    let config = prospect_core::ProspectConfig::from_env(&data_dir)?;
    let ctx = AppContext::new(config)?;

    if let Err(e) = commands::run(&ctx, command, &args[2..]).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
    Ok(())
}
