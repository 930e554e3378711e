use crate::forward::BatchSink;
use crate::sample::{parse_timestamp, Sample, Temperature};
use anyhow::{anyhow, Context, Result};
use std::path::Path;
use url::Url;

/// Replays a CSV of past readings (header row skipped, columns
/// `timestamp,temperature`) through a thresholdless batch sink, then forces
/// one final flush. Unlike the periodic worker, a failure here propagates so
/// the process can exit non-zero.
pub async fn run(input: &Path, post_url: Url) -> Result<()> {
    let sensor = sensor_from_url(&post_url);
    let sink = BatchSink::new(post_url, None);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(input)
        .with_context(|| format!("open {}", input.display()))?;

    let mut rows = 0usize;
    for record in reader.records() {
        let record = record.context("read csv record")?;
        let raw_ts = record
            .get(0)
            .ok_or_else(|| anyhow!("row {} has no timestamp column", rows + 1))?;
        let taken_at = parse_timestamp(raw_ts)
            .with_context(|| format!("row {} timestamp", rows + 1))?;
        let temperature = match record.get(1).map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(
                Temperature::parse(raw).with_context(|| format!("row {} temperature", rows + 1))?,
            ),
        };
        sink.accept(&Sample {
            taken_at,
            temperature,
            sensor: sensor.clone(),
        });
        rows += 1;
    }

    let sent = sink.flush().await.context("final flush failed")?;
    tracing::info!(rows, sent, "csv replay complete");
    Ok(())
}

/// Tag carried in log output only; it never goes over the wire. A URL with
/// no usable path segment (e.g. bare `http://host/`) tags rows "csv".
fn sensor_from_url(post_url: &Url) -> String {
    post_url
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .unwrap_or("csv")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::WirePoint;
    use crate::testutil::spawn_stub_ingest;
    use std::io::Write;

    #[tokio::test]
    async fn replay_makes_exactly_one_call_after_end_of_input() {
        let mut stub = spawn_stub_ingest("200 OK").await;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "Time,Temperature").unwrap();
        writeln!(file, "2026-08-01 00:00:00,36.60").unwrap();
        writeln!(file, "2026-08-01 00:00:10,36.70").unwrap();
        writeln!(file, "2026-08-01 00:00:20,36.80").unwrap();
        drop(file);

        run(&path, stub.url("/api/bedroom")).await.unwrap();

        let body = stub.bodies.recv().await.unwrap();
        let decoded: Vec<WirePoint> = serde_json::from_str(&body).unwrap();
        assert_eq!(decoded.len(), 3);
        assert_eq!(decoded[0].1.as_str(), "36.60");
        // Everything went out in the single end-of-input flush.
        assert!(stub.bodies.try_recv().is_err());
    }

    #[test]
    fn sensor_tag_comes_from_the_last_path_segment() {
        let tagged = Url::parse("http://host:8900/api/bedroom").unwrap();
        assert_eq!(sensor_from_url(&tagged), "bedroom");

        let trailing = Url::parse("http://host:8900/api/bedroom/").unwrap();
        assert_eq!(sensor_from_url(&trailing), "bedroom");

        let bare = Url::parse("http://host:8900/").unwrap();
        assert_eq!(sensor_from_url(&bare), "csv");
    }

    #[tokio::test]
    async fn replay_surfaces_endpoint_failure() {
        let stub = spawn_stub_ingest("503 Service Unavailable").await;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "Time,Temperature").unwrap();
        writeln!(file, "2026-08-01 00:00:00,36.60").unwrap();
        drop(file);

        let err = run(&path, stub.url("/api/bedroom")).await.unwrap_err();
        assert!(format!("{err:#}").contains("final flush failed"));
    }

    #[tokio::test]
    async fn replay_rejects_unparseable_rows() {
        let stub = spawn_stub_ingest("200 OK").await;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "Time,Temperature").unwrap();
        writeln!(file, "not-a-time,36.60").unwrap();
        drop(file);

        assert!(run(&path, stub.url("/api/bedroom")).await.is_err());
    }
}
