use anyhow::Context;
use clap::Parser;
use dirsync_server::create_app;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// `<binary> <ip> <port> <root>` — positional only, no flags.
#[derive(Parser)]
#[command(about, version)]
struct Cli {
    ip: IpAddr,
    port: u16,
    root: PathBuf,
}

const EXIT_WRONG_ARGS: i32 = 255;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
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

    tokio::fs::create_dir_all(&cli.root)
        .await
        .context("failed to create server root")?;

    let app = create_app(cli.root);
    let addr = SocketAddr::new(cli.ip, cli.port);

    tracing::info!(%addr, "listening");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("failed to bind to address")?;
    axum::serve(listener, app)
        .await
        .context("server error")?;

    Ok(())
}
