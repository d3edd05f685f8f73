//! Fixed-capacity error history.

use std::collections::VecDeque;

use super::ErrorRecord;

/// Ring of error records, oldest evicted first.
#[derive(Debug)]
pub struct ErrorHistory {
    records: VecDeque<ErrorRecord>,
    capacity: usize,
}

impl ErrorHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            records: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append, evicting the oldest record when full.
    pub fn push(&mut self, record: ErrorRecord) -> Option<ErrorRecord> {
        let evicted = if self.records.len() == self.capacity {
            self.records.pop_front()
        } else {
            None
        };
        self.records.push_back(record);
        evicted
    }

    /// Up to `limit` records, most recent first.
    pub fn recent(&self, limit: Option<usize>) -> Vec<ErrorRecord> {
        let limit = limit.unwrap_or(self.records.len());
        self.records.iter().rev().take(limit).cloned().collect()
    }

    /// Most recent first.
    pub fn unresolved(&self) -> Vec<ErrorRecord> {
        self.records
            .iter()
            .rev()
            .filter(|r| !r.resolved)
            .cloned()
            .collect()
    }

    /// Most recent unresolved record with a similar message.
    pub fn latest_unresolved_mut(&mut self, message: &str) -> Option<&mut ErrorRecord> {
        self.records
            .iter_mut()
            .rev()
            .find(|r| !r.resolved && r.error.is_similar(message))
    }

    /// Records (oldest first) whose message is similar to `message`.
    pub fn similar<'a>(&'a self, message: &'a str) -> impl Iterator<Item = &'a ErrorRecord> + 'a {
        self.records.iter().filter(move |r| r.error.is_similar(message))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}
