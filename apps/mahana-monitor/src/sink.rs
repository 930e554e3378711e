use crate::forward::BatchSink;
use crate::sample::Sample;
use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::Path;
use std::sync::Mutex;

/// Consumer of samples. The monitor fans every sample out to each configured
/// sink.
pub enum Sink {
    File(FileSink),
    Batch(BatchSink),
}

impl Sink {
    pub fn accept(&self, sample: &Sample) -> Result<()> {
        match self {
            Sink::File(file) => file.accept(sample),
            Sink::Batch(batch) => {
                batch.accept(sample);
                Ok(())
            }
        }
    }
}

/// Append-only CSV writer: one `timestamp,temperature` row per sample,
/// flushed immediately. Failed reads get an empty temperature field so the
/// record of the poll is not lost.
pub struct FileSink {
    writer: Mutex<csv::Writer<fs::File>>,
}

impl FileSink {
    pub fn create(path: &Path) -> Result<Self> {
        let file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("open {}", path.display()))?;
        let writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        Ok(Self {
            writer: Mutex::new(writer),
        })
    }

    fn accept(&self, sample: &Sample) -> Result<()> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| anyhow!("file sink lock poisoned"))?;
        let temperature = sample
            .temperature
            .as_ref()
            .map(|t| t.as_str())
            .unwrap_or_default();
        writer.write_record([sample.taken_at.to_rfc3339().as_str(), temperature])?;
        writer.flush().context("flush file sink")?;
        Ok(())
    }
}
