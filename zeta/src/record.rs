//! Subdomain records produced by the discovery sources.

use std::collections::HashSet;

/// A discovered subdomain plus whatever the source knows about it.
///
/// `metadata` keeps insertion order so reports list fields the way the
/// source emitted them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubdomainRecord {
    /// Fully-qualified subdomain; the dedup key.
    pub name: String,
    /// Source-specific `(label, value)` pairs
    pub metadata: Vec<(String, String)>,
}

impl SubdomainRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            metadata: Vec::new(),
        }
    }

    /// Append a metadata field, builder style.
    pub fn with(mut self, label: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.push((label.into(), value.into()));
        self
    }

    /// Look up a metadata value by label.
    pub fn get(&self, label: &str) -> Option<&str> {
        self.metadata
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, v)| v.as_str())
    }
}

/// Drop records whose name was already seen. First occurrence wins and
/// relative order is preserved.
pub fn dedupe_records(records: Vec<SubdomainRecord>) -> Vec<SubdomainRecord> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|record| seen.insert(record.name.clone()))
        .collect()
}

/// Names of `records`, in order.
pub fn record_names(records: &[SubdomainRecord]) -> Vec<String> {
    records.iter().map(|r| r.name.clone()).collect()
}
