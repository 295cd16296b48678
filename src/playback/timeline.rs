//! Sorted event storage with cursor-based consumption.
//!
//! Entries are kept sorted by time. A cursor tracks the read position so
//! `drain_until` only scans unconsumed entries. Batch insertion defers sorting
//! until the next read.

use std::cmp::Ordering;

/// Anything placed on a timeline at a time in seconds.
pub trait Timed {
    fn time(&self) -> f64;
}

/// A sorted timeline with a read cursor.
#[derive(Debug, Clone)]
pub struct Timeline<T> {
    entries: Vec<T>,
    cursor: usize,
    dirty: bool,
}

fn by_time<T: Timed>(a: &T, b: &T) -> Ordering {
    a.time().total_cmp(&b.time())
}

impl<T: Timed> Timeline<T> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            cursor: 0,
            dirty: false,
        }
    }

    /// Insert one entry after any entries with the same time.
    pub fn insert(&mut self, entry: T) {
        self.ensure_sorted();
        let t = entry.time();
        let pos = self.entries[self.cursor..].partition_point(|e| e.time() <= t) + self.cursor;
        self.entries.insert(pos, entry);
    }

    /// Insert many entries; sorting is deferred to the next read.
    pub fn insert_batch(&mut self, entries: impl IntoIterator<Item = T>) {
        self.entries.extend(entries);
        self.dirty = true;
    }

    /// Remove and return every unconsumed entry with `time < until`, in time order.
    pub fn drain_until(&mut self, until: f64) -> Vec<T>
    where
        T: Clone,
    {
        self.ensure_sorted();
        let start = self.cursor;
        while self.cursor < self.entries.len() && self.entries[self.cursor].time() < until {
            self.cursor += 1;
        }
        let drained = self.entries[start..self.cursor].to_vec();
        self.compact();
        drained
    }

    /// Drop every unconsumed entry with `time >= from`, returning how many went.
    pub fn truncate_from(&mut self, from: f64) -> usize {
        self.ensure_sorted();
        let keep = self.entries[self.cursor..].partition_point(|e| e.time() < from) + self.cursor;
        let dropped = self.entries.len() - keep;
        self.entries.truncate(keep);
        dropped
    }

    /// Number of unconsumed entries.
    pub fn remaining(&self) -> usize {
        self.entries.len().saturating_sub(self.cursor)
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Drop everything and reset the cursor.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = 0;
        self.dirty = false;
    }

    fn ensure_sorted(&mut self) {
        if self.dirty {
            self.entries[self.cursor..].sort_by(by_time);
            self.dirty = false;
        }
    }

    fn compact(&mut self) {
        if self.cursor > 256 && self.cursor * 2 > self.entries.len() {
            self.entries.drain(..self.cursor);
            self.cursor = 0;
        }
    }
}

impl<T: Timed> Default for Timeline<T> {
    fn default() -> Self {
        Self::new()
    }
}
