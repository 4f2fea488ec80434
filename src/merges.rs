//! Ordered BPE merge table: `(left, right) -> rank`, plus `rank -> merged`.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::Error;

/// One learned merge rule. Rank is its 0-based line number in the codes
/// file; lower rank applies earlier.
pub struct MergeTable {
    ordered: Vec<(String, String)>,
    ranks: HashMap<(String, String), usize>,
}

impl MergeTable {
    /// Parse a codes file: one `LEFT RIGHT` pair per line, line index = rank.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let file = File::open(path.as_ref()).map_err(|e| Error::CodesOpen {
            path: path.as_ref().display().to_string(),
            source: e,
        })?;
        Self::from_reader(BufReader::new(file))
    }

    /// Parse from any line source; used directly by tests and by the
    /// snapshot loader to reuse the same rank-building logic.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, Error> {
        let mut ordered = Vec::new();
        let mut ranks = HashMap::new();

        for line in reader.lines() {
            let line = line.map_err(Error::Io)?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let mut parts = line.split_whitespace();
            let left = parts.next().unwrap_or_default().to_string();
            let right = parts.next().unwrap_or_default().to_string();

            let rank = ordered.len();
            ranks.insert((left.clone(), right.clone()), rank);
            ordered.push((left, right));
        }

        Ok(Self { ordered, ranks })
    }

    /// Build directly from an in-memory list of pairs (rank = index), used
    /// by the compiled-snapshot loader.
    pub(crate) fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut ranks = HashMap::with_capacity(pairs.len());
        for (rank, pair) in pairs.iter().enumerate() {
            ranks.insert(pair.clone(), rank);
        }
        Self {
            ordered: pairs,
            ranks,
        }
    }

    /// Rank of the `(left, right)` merge, or `None` if it was never learned.
    pub fn rank(&self, left: &str, right: &str) -> Option<usize> {
        self.ranks
            .get(&(left.to_string(), right.to_string()))
            .copied()
    }

    /// All merges in rank order.
    pub(crate) fn pairs(&self) -> &[(String, String)] {
        &self.ordered
    }

    /// Number of learned merges.
    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }
}
