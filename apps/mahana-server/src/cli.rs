use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "mahana-server", about = "Temperature ingest and query server")]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Serve the ingest/query API and graph pages.
    Run {
        #[arg(long, default_value = "0.0.0.0")]
        host: String,
        #[arg(long, default_value_t = 8900)]
        port: u16,
    },
    /// Dump a sensor's decimated series to a CSV file.
    Csv {
        /// Sensor name to export.
        sensor: String,
        /// Output file path.
        outfile: PathBuf,
    },
}
