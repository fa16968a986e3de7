use std::collections::VecDeque;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::JournalEvent;

/// A journal event as stored, with its metadata flattened out.
#[derive(Debug, Clone, Serialize)]
pub struct JournalRecord {
    pub timestamp: DateTime<Utc>,
    pub event_type: String,
    pub event: JournalEvent,
}

/// Trait for journal storage backends.
pub trait JournalStore: Send + Sync {
    /// Append a record.
    fn append(&self, record: JournalRecord);

    /// The most recent `limit` records, newest first.
    fn recent(&self, limit: usize) -> Vec<JournalRecord>;

    /// Number of records currently held.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory ring buffer store.
///
/// Oldest records are evicted once the capacity is reached.
pub struct MemoryJournalStore {
    capacity: usize,
    records: Mutex<VecDeque<JournalRecord>>,
}

impl MemoryJournalStore {
    /// Default number of records retained.
    pub const DEFAULT_CAPACITY: usize = 1000;

    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            records: Mutex::new(VecDeque::with_capacity(capacity.min(64))),
        }
    }

    pub fn with_default_capacity() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

impl JournalStore for MemoryJournalStore {
    fn append(&self, record: JournalRecord) {
        let mut records = self.records.lock().unwrap();
        if records.len() >= self.capacity {
            records.pop_front();
        }
        records.push_back(record);
    }

    fn recent(&self, limit: usize) -> Vec<JournalRecord> {
        let records = self.records.lock().unwrap();
        records.iter().rev().take(limit).cloned().collect()
    }

    fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }
}
