use clap::Parser;
use dirsync_client::{start_watcher, Debouncer, WorkerOp, WorkerPool};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const RESYNC_PERIOD: Duration = Duration::from_secs(10);

const EXIT_WRONG_ARGS: i32 = 255;
const EXIT_PATH_MISSING: i32 = 254;

/// `<binary> <path> <server_host> <server_port> <key>` — positional
/// only, no flags.
#[derive(Parser)]
#[command(about, version)]
struct Cli {
    path: PathBuf,
    server_host: String,
    server_port: u16,
    key: String,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(EXIT_WRONG_ARGS);
        }
    };

    if !cli.path.is_dir() {
        eprintln!("path does not exist or is not a directory: {}", cli.path.display());
        std::process::exit(EXIT_PATH_MISSING);
    }

    if let Err(err) = run(cli).await {
        tracing::error!(error = ?err, "client exited with an error");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let stopped = Arc::new(AtomicBool::new(false));

    let pool = WorkerPool::spawn(
        cli.path.clone(),
        cli.server_host,
        cli.server_port,
        cli.key,
        stopped.clone(),
    )?;

    let debouncer = Debouncer::new();
    let _watcher = start_watcher(cli.path, pool.clone(), debouncer)?;

    pool.dispatch(WorkerOp::InitialSync);

    let mut resync = tokio::time::interval(RESYNC_PERIOD);
    resync.tick().await; // first tick fires immediately; the dispatch above already covers startup

    loop {
        tokio::select! {
            _ = resync.tick() => {
                if stopped.load(Ordering::Relaxed) {
                    break;
                }
                pool.dispatch(WorkerOp::InitialSync);
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("shutdown signal received");
                stopped.store(true, Ordering::Relaxed);
                break;
            }
        }
    }

    Ok(())
}
