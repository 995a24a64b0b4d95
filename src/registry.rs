//! Run-scoped record of the file extensions seen during one organize pass.
//!
//! Workers insert concurrently; the registry is a pair of sets, so an
//! extension shared by many files is stored once.
use dashmap::DashSet;
use std::collections::BTreeSet;

/// Extensions observed in a run, split by whether a routing rule exists.
#[derive(Debug, Default)]
pub struct ExtensionRegistry {
    known: DashSet<String>,
    undefined: DashSet<String>,
}

impl ExtensionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `extension`. Returns true if this is the first sighting.
    ///
    /// Empty extensions are ignored.
    pub fn record(&self, extension: &str, known: bool) -> bool {
        if extension.is_empty() {
            return false;
        }
        let set = if known { &self.known } else { &self.undefined };
        if set.contains(extension) {
            return false;
        }
        set.insert(extension.to_string())
    }

    /// Sorted snapshot of the routed extensions.
    pub fn known(&self) -> BTreeSet<String> {
        self.known.iter().map(|e| e.key().clone()).collect()
    }

    /// Sorted snapshot of the extensions that fell back to `other files`.
    pub fn undefined(&self) -> BTreeSet<String> {
        self.undefined.iter().map(|e| e.key().clone()).collect()
    }

    /// Total number of distinct extensions.
    pub fn len(&self) -> usize {
        self.known.len() + self.undefined.len()
    }

    pub fn is_empty(&self) -> bool {
        self.known.is_empty() && self.undefined.is_empty()
    }
}
