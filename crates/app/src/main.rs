use std::sync::Arc;

use services::ProgressTracker;
use storage::repository::Storage;

mod cli;
mod commands;
mod config;
mod logging;

use cli::{Args, Command, prepare_sqlite_file, print_usage};
use config::Config;

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env();
    logging::init_tracing(&config.log_level);

    let args = Args::parse(std::env::args().skip(1), &config).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;
    if args.command == Command::Help {
        print_usage();
        return Ok(());
    }

    // Open + migrate SQLite here so core/services stay storage-agnostic.
    prepare_sqlite_file(&args.db_url)?;
    let storage = Storage::sqlite(&args.db_url).await?;
    tracing::debug!(db = %args.db_url, key = %args.storage_key, "storage ready");

    let mut tracker = ProgressTracker::load(Arc::clone(&storage.progress), args.storage_key).await;

    let stdin = std::io::stdin();
    let mut input = stdin.lock();
    let mut out = std::io::stdout().lock();
    commands::execute(args.command, &mut tracker, &mut input, &mut out).await
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
