//! Rolling history buffer.
//!
//! Fixed-capacity, insertion-ordered store of assessment records. When the
//! buffer is full the oldest record is evicted. This is the only cleanup
//! policy: records never expire by age.

use crate::core::record::AssessmentRecord;
use chrono::{DateTime, Utc};
use std::collections::VecDeque;

/// Default number of records retained.
pub const DEFAULT_HISTORY_CAPACITY: usize = 1000;

/// Bounded FIFO of assessment records.
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    records: VecDeque<AssessmentRecord>,
    capacity: usize,
    evicted: u64,
}

impl Default for HistoryBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

impl HistoryBuffer {
    /// Create an empty buffer. A zero capacity is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            records: VecDeque::with_capacity(capacity),
            capacity,
            evicted: 0,
        }
    }

    /// Append a record, evicting the oldest when at capacity.
    ///
    /// Returns the evicted record, if any. Callers must append in timestamp
    /// order; the ingestor guarantees this for the pipeline.
    pub fn append(&mut self, record: AssessmentRecord) -> Option<AssessmentRecord> {
        debug_assert!(self
            .records
            .back()
            .map_or(true, |last| last.timestamp <= record.timestamp));

        let evicted = if self.records.len() >= self.capacity {
            self.evicted += 1;
            self.records.pop_front()
        } else {
            None
        };
        self.records.push_back(record);
        evicted
    }

    /// Owned copy of the records at or after `since` (all when `None`).
    pub fn snapshot(&self, since: Option<DateTime<Utc>>) -> Vec<AssessmentRecord> {
        match since {
            None => self.records.iter().cloned().collect(),
            Some(cutoff) => {
                // Records are time ordered, so skip the prefix before the cutoff.
                let start = self.records.partition_point(|r| r.timestamp < cutoff);
                self.records.range(start..).cloned().collect()
            }
        }
    }

    /// Owned copy of the last `k` records, oldest first.
    pub fn tail(&self, k: usize) -> Vec<AssessmentRecord> {
        let start = self.records.len().saturating_sub(k);
        self.records.range(start..).cloned().collect()
    }

    pub fn latest(&self) -> Option<&AssessmentRecord> {
        self.records.back()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Alias of [`len`](Self::len).
    pub fn size(&self) -> usize {
        self.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of records evicted since creation or the last clear.
    pub fn evicted(&self) -> u64 {
        self.evicted
    }

    pub fn clear(&mut self) {
        self.records.clear();
        self.evicted = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::types::EmotionLabel;
    use crate::core::record::Scores;
    use chrono::Duration;

    fn record_at(base: DateTime<Utc>, secs: i64) -> AssessmentRecord {
        AssessmentRecord::from_parts(
            base + Duration::seconds(secs),
            EmotionLabel::Neutral,
            0.9,
            Scores::NEUTRAL,
            0.1,
            true,
        )
    }

    #[test]
    fn test_fifo_eviction_keeps_most_recent() {
        let base = Utc::now();
        let mut buffer = HistoryBuffer::new(1000);

        for i in 0..1500 {
            buffer.append(record_at(base, i));
            assert!(buffer.len() <= buffer.capacity());
        }

        assert_eq!(buffer.size(), 1000);
        assert_eq!(buffer.evicted(), 500);

        let records = buffer.snapshot(None);
        assert_eq!(records.first().unwrap().timestamp, base + Duration::seconds(500));
        assert_eq!(records.last().unwrap().timestamp, base + Duration::seconds(1499));
        assert!(records
            .windows(2)
            .all(|pair| pair[0].timestamp <= pair[1].timestamp));
    }

    #[test]
    fn test_append_returns_evicted_record() {
        let base = Utc::now();
        let mut buffer = HistoryBuffer::new(2);
        assert!(buffer.append(record_at(base, 0)).is_none());
        assert!(buffer.append(record_at(base, 1)).is_none());
        let evicted = buffer.append(record_at(base, 2)).unwrap();
        assert_eq!(evicted.timestamp, base);
    }

    #[test]
    fn test_snapshot_since_cutoff_is_inclusive() {
        let base = Utc::now();
        let mut buffer = HistoryBuffer::new(10);
        for i in 0..5 {
            buffer.append(record_at(base, i));
        }

        let recent = buffer.snapshot(Some(base + Duration::seconds(3)));
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].timestamp, base + Duration::seconds(3));

        assert!(buffer.snapshot(Some(base + Duration::seconds(99))).is_empty());
    }

    #[test]
    fn test_snapshot_is_a_copy() {
        let base = Utc::now();
        let mut buffer = HistoryBuffer::new(10);
        buffer.append(record_at(base, 0));

        let snapshot = buffer.snapshot(None);
        buffer.append(record_at(base, 1));
        buffer.clear();

        assert_eq!(snapshot.len(), 1);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_tail() {
        let base = Utc::now();
        let mut buffer = HistoryBuffer::new(10);
        for i in 0..4 {
            buffer.append(record_at(base, i));
        }
        let tail = buffer.tail(2);
        assert_eq!(tail.len(), 2);
        assert_eq!(tail[1].timestamp, base + Duration::seconds(3));
        assert_eq!(buffer.tail(100).len(), 4);
        assert_eq!(buffer.latest().unwrap().timestamp, base + Duration::seconds(3));
    }
}
