use crate::{forward, probe};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use url::Url;

#[derive(Parser, Debug)]
#[command(
    name = "mahana-monitor",
    version,
    about = "Temperature poller with buffered batch forwarding"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Poll the sensor and fan readings out to the configured sinks.
    Monitor {
        /// Ingest endpoint to POST batches to, e.g. http://host:8900/api/bedroom
        #[arg(long)]
        post_url: Option<Url>,
        /// CSV file to append readings to
        #[arg(long)]
        file: Option<PathBuf>,
        /// Seconds between sensor reads
        #[arg(long, default_value_t = 10)]
        interval: u64,
        /// Sensor name tag
        #[arg(long, default_value = "temper")]
        sensor: String,
        /// Thermal zone file to read
        #[arg(long, default_value = probe::DEFAULT_THERMAL_ZONE)]
        thermal_zone: PathBuf,
        /// Pending readings required before the periodic flush fires (0 = no threshold)
        #[arg(long, default_value_t = forward::DEFAULT_BATCH_SIZE)]
        batch_size: usize,
    },
    /// Replay a CSV of past readings through the batch forwarder.
    Pushcsv {
        /// CSV with a header row and timestamp,temperature columns
        input: PathBuf,
        /// Ingest endpoint to POST the replayed batch to
        post_url: Url,
    },
}
