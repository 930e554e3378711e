mod batch;
mod cli;
mod forward;
mod poll;
mod probe;
mod replay;
mod sample;
mod sink;
#[cfg(test)]
mod testutil;

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;

fn init_tracing() -> Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,mahana_monitor=info".into());
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .try_init()
        .map_err(|err| anyhow::anyhow!(err.to_string()))?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing()?;
    let args = cli::Args::parse();

    match args.command {
        cli::Command::Monitor {
            post_url,
            file,
            interval,
            sensor,
            thermal_zone,
            batch_size,
        } => {
            run_monitor(
                post_url,
                file,
                Duration::from_secs(interval),
                sensor,
                thermal_zone,
                batch_size,
            )
            .await
        }
        cli::Command::Pushcsv { input, post_url } => replay::run(&input, post_url).await,
    }
}

async fn run_monitor(
    post_url: Option<Url>,
    file: Option<PathBuf>,
    interval: Duration,
    sensor: String,
    thermal_zone: PathBuf,
    batch_size: usize,
) -> Result<()> {
    let mut sinks = Vec::new();
    if let Some(url) = post_url {
        let threshold = (batch_size > 0).then_some(batch_size);
        sinks.push(sink::Sink::Batch(forward::BatchSink::new(url, threshold)));
    }
    if let Some(path) = &file {
        sinks.push(sink::Sink::File(sink::FileSink::create(path)?));
    }
    if sinks.is_empty() {
        anyhow::bail!("nothing to do: pass --post-url and/or --file");
    }

    let probe: Arc<dyn probe::TemperatureProbe> =
        Arc::new(probe::ThermalZoneProbe::new(thermal_zone));
    let cancel = CancellationToken::new();
    let mut poll_task = tokio::spawn(poll::run(
        probe,
        sensor,
        interval,
        sinks,
        cancel.clone(),
    ));

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            // Buffered-but-unsent readings are dropped on exit.
            tracing::info!("shutdown signal received");
            cancel.cancel();
            (&mut poll_task).await??;
        }
        res = &mut poll_task => res??,
    }

    Ok(())
}
