//! Sequence and partition records.

use std::collections::BTreeMap;

/// A sequence record as read from an input file.
///
/// `extras` holds the remaining columns of tabular inputs, keyed by header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sequence {
    pub id: String,
    pub seq: String,
    pub extras: BTreeMap<String, String>,
}

impl Sequence {
    pub fn new(id: impl Into<String>, seq: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            seq: seq.into(),
            extras: BTreeMap::new(),
        }
    }

    /// Adds an extra field.
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extras.insert(key.into(), value.into());
        self
    }

    pub fn extra(&self, key: &str) -> Option<&str> {
        self.extras.get(key).map(String::as_str)
    }
}

/// A mapping from individual identifier to group (for example species).
pub type Partition = BTreeMap<String, String>;

/// Builds a partition from `(individual, group)` pairs.
pub fn partition_from_pairs<I, K, V>(pairs: I) -> Partition
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    pairs
        .into_iter()
        .map(|(key, value)| (key.into(), value.into()))
        .collect()
}
