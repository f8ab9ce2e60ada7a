use std::collections::{BTreeMap, HashSet};

use super::filter::{LogFilter, LogView};
use crate::model::{LogEntry, LogLevel};

/// Log lines of one task view.
///
/// Entries are kept in arrival order, except that an entry older than the
/// newest one is placed at its timestamp position (ties keep arrival order).
/// Growth is unbounded; the owner drops the buffer when the view closes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogBuffer {
    entries: Vec<LogEntry>,
    ids: HashSet<String>,
}

impl LogBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry. Returns `false` when an entry with the same id is
    /// already present, in which case the buffer is unchanged.
    pub fn append(&mut self, entry: LogEntry) -> bool {
        if self.ids.contains(&entry.id) {
            return false;
        }
        self.ids.insert(entry.id.clone());

        let in_order = self
            .entries
            .last()
            .map_or(true, |last| last.timestamp <= entry.timestamp);
        if in_order {
            self.entries.push(entry);
        } else {
            let pos = self
                .entries
                .partition_point(|e| e.timestamp <= entry.timestamp);
            self.entries.insert(pos, entry);
        }
        true
    }

    /// Append many entries, returning how many were new.
    pub fn extend<I>(&mut self, entries: I) -> usize
    where
        I: IntoIterator<Item = LogEntry>,
    {
        let mut added = 0;
        for entry in entries {
            if self.append(entry) {
                added += 1;
            }
        }
        added
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// A lazy view over the entries that match `filter`. The buffer is not
    /// touched; the view can be iterated any number of times.
    pub fn filter(&self, filter: &LogFilter) -> LogView<'_> {
        LogView::new(&self.entries, filter)
    }

    pub fn counts_by_level(&self) -> BTreeMap<LogLevel, usize> {
        let mut counts = BTreeMap::new();
        for entry in &self.entries {
            *counts.entry(entry.level).or_insert(0) += 1;
        }
        counts
    }
}
