//! Per-type source tallies.

use crate::source::{Source, SourceType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Number of sources of each [`SourceType`], indexed by ordinal
///
/// Serialises as a map from type label to count, e.g. `{"STELLAR": 3, ...}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "BTreeMap<SourceType, usize>", from = "BTreeMap<SourceType, usize>")]
pub struct TypeCounts {
    counts: [usize; 6],
}

impl TypeCounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tally the types of already-classified sources
    pub fn from_sources<'a>(sources: impl IntoIterator<Item = &'a Source>) -> Self {
        let mut counts = Self::new();
        for source in sources {
            counts.record(source.source_type);
        }
        counts
    }

    pub fn record(&mut self, source_type: SourceType) {
        self.counts[source_type.ordinal() as usize] += 1;
    }

    pub fn get(&self, source_type: SourceType) -> usize {
        self.counts[source_type.ordinal() as usize]
    }

    pub fn merge(&mut self, other: &TypeCounts) {
        for (mine, theirs) in self.counts.iter_mut().zip(other.counts.iter()) {
            *mine += theirs;
        }
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    /// (type, count) pairs in ordinal order
    pub fn iter(&self) -> impl Iterator<Item = (SourceType, usize)> + '_ {
        SourceType::ALL.iter().map(move |&t| (t, self.get(t)))
    }
}

impl std::iter::Sum for TypeCounts {
    fn sum<I: Iterator<Item = TypeCounts>>(iter: I) -> Self {
        iter.fold(TypeCounts::new(), |mut acc, c| {
            acc.merge(&c);
            acc
        })
    }
}

impl From<TypeCounts> for BTreeMap<SourceType, usize> {
    fn from(counts: TypeCounts) -> Self {
        counts.iter().collect()
    }
}

/// Types missing from the map count as zero
impl From<BTreeMap<SourceType, usize>> for TypeCounts {
    fn from(map: BTreeMap<SourceType, usize>) -> Self {
        let mut counts = TypeCounts::new();
        for (source_type, count) in map {
            counts.counts[source_type.ordinal() as usize] = count;
        }
        counts
    }
}

/// One `TYPE<TAB>count` line per type, in ordinal order
impl fmt::Display for TypeCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (source_type, count) in self.iter() {
            writeln!(f, "{source_type}\t{count}")?;
        }
        Ok(())
    }
}
