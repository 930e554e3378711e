use crate::batch::BatchBuffer;
use crate::sample::{Sample, WirePoint};
use anyhow::{Context, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Fixed delay between flush attempts. Retries are unbounded and tied to
/// this tick; there is no backoff. A dead endpoint is an operator problem,
/// not something the worker escalates on its own.
const FORWARD_TICK: Duration = Duration::from_secs(5);

/// Pending readings required before the periodic worker initiates a flush.
pub const DEFAULT_BATCH_SIZE: usize = 6;

/// Network sink: buffers readings and ships them in batches from a lazily
/// started background worker. Cloning shares the same buffer and worker.
#[derive(Clone)]
pub struct BatchSink {
    inner: Arc<Inner>,
}

struct Inner {
    post_url: Url,
    batch_size: Option<usize>,
    buffer: BatchBuffer,
    http: reqwest::Client,
    worker_started: AtomicBool,
    // Held across snapshot, send and drain. The periodic tick and an
    // explicit flush() must never snapshot the same prefix.
    flush_lock: tokio::sync::Mutex<()>,
}

impl BatchSink {
    /// `batch_size: None` means no threshold: every tick flushes whatever
    /// the timer finds.
    pub fn new(post_url: Url, batch_size: Option<usize>) -> Self {
        Self {
            inner: Arc::new(Inner {
                post_url,
                batch_size,
                buffer: BatchBuffer::default(),
                http: reqwest::Client::new(),
                worker_started: AtomicBool::new(false),
                flush_lock: tokio::sync::Mutex::new(()),
            }),
        }
    }

    /// Queues a reading and makes sure the forward worker is running.
    /// Readings without a temperature are never forwarded.
    pub fn accept(&self, sample: &Sample) {
        let Some(temperature) = &sample.temperature else {
            tracing::debug!(sensor = %sample.sensor, "not forwarding sample without a reading");
            return;
        };
        self.ensure_worker();
        self.inner
            .buffer
            .append(WirePoint(sample.taken_at, temperature.clone()));
    }

    pub fn pending(&self) -> usize {
        self.inner.buffer.len()
    }

    /// One-shot flush that skips the threshold check and surfaces the
    /// outcome, unlike the periodic tick which logs and retries. Used by the
    /// CSV replay path so a dead endpoint turns into a non-zero exit.
    pub async fn flush(&self) -> Result<usize> {
        self.inner.flush_once().await
    }

    /// Idempotent: the first accept spawns the worker, later calls are
    /// no-ops. Must be called from within the tokio runtime.
    fn ensure_worker(&self) {
        if self
            .inner
            .worker_started
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            let inner = self.inner.clone();
            tokio::spawn(async move { inner.run_worker().await });
        }
    }
}

impl Inner {
    async fn run_worker(self: Arc<Self>) {
        tracing::debug!(url = %self.post_url, "forward worker started");
        loop {
            tokio::time::sleep(FORWARD_TICK).await;
            if let Some(batch_size) = self.batch_size {
                if self.buffer.len() < batch_size {
                    continue;
                }
            }
            match self.flush_once().await {
                Ok(0) => {}
                Ok(count) => tracing::debug!(count, "forwarded batch"),
                Err(err) => {
                    // Buffer is untouched; the same (possibly grown) batch is
                    // retried on the next tick.
                    tracing::warn!(error = %err, url = %self.post_url, "forward failed, keeping batch for next tick");
                }
            }
        }
    }

    async fn flush_once(&self) -> Result<usize> {
        let _in_flight = self.flush_lock.lock().await;
        let Some(snapshot) = self.buffer.snapshot_for_flush()? else {
            return Ok(0);
        };
        let response = self
            .http
            .post(self.post_url.clone())
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(snapshot.payload)
            .send()
            .await
            .with_context(|| format!("POST {}", self.post_url))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("ingest endpoint returned {status}: {}", body.trim());
        }
        self.buffer.commit_drain(snapshot.count);
        Ok(snapshot.count)
    }
}
