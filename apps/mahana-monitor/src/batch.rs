use crate::sample::WirePoint;
use anyhow::{Context, Result};
use std::sync::{Mutex, MutexGuard};

/// Serialized payload plus the pending count observed when it was taken.
/// The count is what `commit_drain` removes after a successful send.
#[derive(Debug)]
pub struct FlushSnapshot {
    pub payload: String,
    pub count: usize,
}

/// In-memory queue of points waiting to be forwarded, shared between the
/// poll loop (appends) and one forward worker (snapshot + drain).
///
/// The drain protocol is what keeps the buffer correct under a slow network
/// call: a snapshot serializes everything present and remembers the count,
/// and a successful send removes exactly that prefix. Points appended while
/// the request was in flight stay queued for the next tick.
#[derive(Debug, Default)]
pub struct BatchBuffer {
    points: Mutex<Vec<WirePoint>>,
}

impl BatchBuffer {
    pub fn append(&self, point: WirePoint) {
        self.locked().push(point);
    }

    pub fn len(&self) -> usize {
        self.locked().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Serializes the entire current contents under the lock. `None` when
    /// there is nothing pending.
    pub fn snapshot_for_flush(&self) -> Result<Option<FlushSnapshot>> {
        let points = self.locked();
        if points.is_empty() {
            return Ok(None);
        }
        let payload = serde_json::to_string(&*points).context("serialize batch payload")?;
        Ok(Some(FlushSnapshot {
            payload,
            count: points.len(),
        }))
    }

    /// Removes the first `count` points. Anything appended after the
    /// snapshot was taken is preserved, in order.
    pub fn commit_drain(&self, count: usize) {
        let mut points = self.locked();
        let count = count.min(points.len());
        points.drain(..count);
    }

    fn locked(&self) -> MutexGuard<'_, Vec<WirePoint>> {
        // A poisoned lock only means a writer panicked mid-push; the queue
        // itself is still a valid Vec.
        self.points
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::Temperature;
    use chrono::{TimeZone, Utc};

    fn point(n: u32) -> WirePoint {
        WirePoint(
            Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, n).unwrap(),
            Temperature::parse(&format!("{n}.00")).unwrap(),
        )
    }

    #[test]
    fn empty_buffer_has_no_snapshot() {
        let buffer = BatchBuffer::default();
        assert!(buffer.snapshot_for_flush().unwrap().is_none());
    }

    #[test]
    fn snapshot_serializes_everything_present() {
        let buffer = BatchBuffer::default();
        for n in 0..3 {
            buffer.append(point(n));
        }
        let snapshot = buffer.snapshot_for_flush().unwrap().unwrap();
        assert_eq!(snapshot.count, 3);
        let decoded: Vec<WirePoint> = serde_json::from_str(&snapshot.payload).unwrap();
        assert_eq!(decoded, vec![point(0), point(1), point(2)]);
    }

    #[test]
    fn drain_keeps_points_appended_after_snapshot() {
        let buffer = BatchBuffer::default();
        for n in 0..4 {
            buffer.append(point(n));
        }
        let snapshot = buffer.snapshot_for_flush().unwrap().unwrap();
        assert_eq!(snapshot.count, 4);

        // Arrivals while the send is in flight.
        buffer.append(point(4));
        buffer.append(point(5));

        buffer.commit_drain(snapshot.count);
        let remaining = buffer.snapshot_for_flush().unwrap().unwrap();
        assert_eq!(remaining.count, 2);
        let decoded: Vec<WirePoint> = serde_json::from_str(&remaining.payload).unwrap();
        assert_eq!(decoded, vec![point(4), point(5)]);
    }

    #[test]
    fn drain_is_bounded_by_current_length() {
        let buffer = BatchBuffer::default();
        buffer.append(point(0));
        buffer.commit_drain(10);
        assert!(buffer.is_empty());
    }

    #[test]
    fn failed_flush_leaves_buffer_untouched() {
        let buffer = BatchBuffer::default();
        for n in 0..3 {
            buffer.append(point(n));
        }
        // A failed send never calls commit_drain; the next snapshot sees the
        // same points in the same order.
        let again = buffer.snapshot_for_flush().unwrap().unwrap();
        assert_eq!(again.count, 3);
        let decoded: Vec<WirePoint> = serde_json::from_str(&again.payload).unwrap();
        assert_eq!(decoded, vec![point(0), point(1), point(2)]);
    }
}
