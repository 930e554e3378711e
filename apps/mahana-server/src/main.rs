mod cli;
mod config;
mod csv_dump;
mod db;
mod error;
mod routes;
mod state;
mod store;
mod wire;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::net::TcpListener;

async fn bind_listener(addr: &str) -> Result<TcpListener> {
    match TcpListener::bind(addr).await {
        Ok(listener) => Ok(listener),
        Err(err) if err.kind() == std::io::ErrorKind::AddrInUse => {
            anyhow::bail!(
                "Failed to bind mahana-server listener on {addr}: port already in use. Stop the other service using this port or re-run with --port to choose another port.",
            );
        }
        Err(err) => {
            Err(err).with_context(|| format!("failed to bind mahana-server listener on {addr}"))
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = cli::Args::parse();
    let config = config::ServerConfig::from_env()?;
    let pool = db::connect_lazy(&config.database_url)?;

    match args.command {
        cli::Command::Run { host, port } => {
            db::ensure_schema(&pool)
                .await
                .context("ensure database schema")?;

            let state = state::AppState { db: pool };
            let app = routes::router(state);
            let addr = format!("{host}:{port}");
            let listener = bind_listener(&addr).await?;
            tracing::info!(%addr, "listening");
            axum::serve(listener, app).await?;
        }
        cli::Command::Csv { sensor, outfile } => {
            csv_dump::run(&pool, &sensor, &outfile).await?;
        }
    }
    Ok(())
}
