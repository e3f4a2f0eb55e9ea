use std::collections::HashMap;

use crate::types::CharId;

/// Character value to every place it occurs on the page.
///
/// Lists keep ingestion order, which follows the analyzer's reading order.
/// The matcher relies on that order to pick the first qualifying neighbour.
#[derive(Debug, Clone, Default)]
pub struct OccurrenceIndex {
    entries: HashMap<String, Vec<CharId>>,
}

impl OccurrenceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, value: &str, id: CharId) {
        match self.entries.get_mut(value) {
            Some(list) => list.push(id),
            None => {
                self.entries.insert(value.to_string(), vec![id]);
            }
        }
    }

    /// Occurrences of `value`, empty when it never appeared on the page.
    pub fn lookup(&self, value: &str) -> &[CharId] {
        self.entries.get(value).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, value: &str) -> bool {
        self.entries.contains_key(value)
    }

    /// Number of distinct values.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of indexed occurrences.
    pub fn occurrences(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }
}
