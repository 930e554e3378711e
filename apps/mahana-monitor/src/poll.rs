use crate::probe::TemperatureProbe;
use crate::sample::Sample;
use crate::sink::Sink;
use anyhow::Result;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Runs the fixed-cadence poll loop until cancelled. The sleep happens
/// unconditionally, including after a failed read, so a broken sensor never
/// turns into a hot loop.
pub async fn run(
    probe: Arc<dyn TemperatureProbe>,
    sensor: String,
    interval: Duration,
    sinks: Vec<Sink>,
    cancel: CancellationToken,
) -> Result<()> {
    loop {
        poll_once(probe.as_ref(), &sensor, &sinks)?;
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(interval) => {}
        }
    }
    tracing::info!("poll loop stopped");
    Ok(())
}

/// One poll: timestamp first, then the read. A probe error is logged and
/// recorded as a sample without a temperature; sink failures (e.g. a full
/// disk under the file sink) propagate.
pub fn poll_once(probe: &dyn TemperatureProbe, sensor: &str, sinks: &[Sink]) -> Result<()> {
    let taken_at = Utc::now();
    let temperature = match probe.read() {
        Ok(temperature) => Some(temperature),
        Err(err) => {
            tracing::warn!(error = %err, sensor, "sensor read failed");
            None
        }
    };
    let sample = Sample {
        taken_at,
        temperature,
        sensor: sensor.to_string(),
    };
    for sink in sinks {
        sink.accept(&sample)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forward::BatchSink;
    use crate::sample::{Temperature, WirePoint};
    use crate::sink::FileSink;
    use crate::testutil::spawn_stub_ingest;
    use anyhow::anyhow;
    use std::collections::VecDeque;
    use std::fs;
    use std::sync::Mutex;

    struct ScriptedProbe {
        reads: Mutex<VecDeque<Result<Temperature>>>,
    }

    impl ScriptedProbe {
        fn new(reads: Vec<Result<Temperature>>) -> Self {
            Self {
                reads: Mutex::new(reads.into()),
            }
        }
    }

    impl TemperatureProbe for ScriptedProbe {
        fn read(&self) -> Result<Temperature> {
            self.reads
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(anyhow!("script exhausted")))
        }
    }

    #[tokio::test]
    async fn failed_read_reaches_the_file_but_not_the_network() {
        let mut stub = spawn_stub_ingest("200 OK").await;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("readings.csv");

        let probe = ScriptedProbe::new(vec![
            Ok(Temperature::parse("10.00").unwrap()),
            Err(anyhow!("sensor unplugged")),
            Ok(Temperature::parse("11.00").unwrap()),
        ]);
        let batch = BatchSink::new(stub.url("/api/test"), None);
        let sinks = vec![
            Sink::File(FileSink::create(&path).unwrap()),
            Sink::Batch(batch.clone()),
        ];

        for _ in 0..3 {
            poll_once(&probe, "test", &sinks).unwrap();
        }

        // All three polls hit the file, the failed one with an empty field.
        let contents = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].ends_with(",10.00"));
        assert!(lines[1].ends_with(','));
        assert!(lines[2].ends_with(",11.00"));

        // Only the two real readings are forwarded.
        assert_eq!(batch.flush().await.unwrap(), 2);
        let body = stub.bodies.recv().await.unwrap();
        let decoded: Vec<WirePoint> = serde_json::from_str(&body).unwrap();
        let temps: Vec<&str> = decoded.iter().map(|p| p.1.as_str()).collect();
        assert_eq!(temps, vec!["10.00", "11.00"]);
    }

    #[tokio::test]
    async fn run_stops_when_cancelled() {
        let probe = Arc::new(ScriptedProbe::new(vec![Err(anyhow!("no sensor"))]));
        let cancel = CancellationToken::new();
        cancel.cancel();
        run(
            probe,
            "test".to_string(),
            Duration::from_secs(3600),
            Vec::new(),
            cancel,
        )
        .await
        .unwrap();
    }
}
