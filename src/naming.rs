// Sortable reference ordinals
//
// Downstream tables sort by reference; plain names sort badly (chr10 before
// chr2), so each reference gets a fixed-width, zero-padded ordinal assigned
// by descending length. The unmapped pseudo-reference `*` takes the last
// ordinal.

use crate::defaults::{ORDINAL_WIDTH, UNMAPPED_NAME};
use crate::index::ReferenceLayout;
use std::collections::HashMap;

/// Bijection between reference names (plus `*`) and ordinal strings.
///
/// Layouts reject a reference named `*`, so the sentinel never collides.
#[derive(Debug, Clone)]
pub struct NamingTable {
    /// (name, ordinal) in ordinal order
    entries: Vec<(String, String)>,
    by_name: HashMap<String, usize>,
    by_ordinal: HashMap<String, usize>,
}

impl NamingTable {
    /// Assign ordinals by descending total length; equal lengths keep index order
    pub fn new(layout: &ReferenceLayout) -> Self {
        let mut ids: Vec<usize> = (0..layout.reference_count()).collect();
        // Stable sort keeps first-appearance order among ties
        ids.sort_by(|&a, &b| layout.length(b).cmp(&layout.length(a)));

        let names = ids
            .into_iter()
            .map(|id| layout.names()[id].as_str())
            .chain(std::iter::once(UNMAPPED_NAME));

        let mut entries = Vec::with_capacity(layout.reference_count() + 1);
        let mut by_name = HashMap::with_capacity(layout.reference_count() + 1);
        let mut by_ordinal = HashMap::with_capacity(layout.reference_count() + 1);
        for (i, name) in names.enumerate() {
            let ordinal = format!("{:0width$}", i, width = ORDINAL_WIDTH);
            by_name.insert(name.to_string(), i);
            by_ordinal.insert(ordinal.clone(), i);
            entries.push((name.to_string(), ordinal));
        }

        NamingTable {
            entries,
            by_name,
            by_ordinal,
        }
    }

    /// Ordinal string of `name` (`*` for unmapped)
    pub fn ordinal(&self, name: &str) -> Option<&str> {
        self.by_name
            .get(name)
            .map(|&i| self.entries[i].1.as_str())
    }

    /// Reference name behind an ordinal string
    pub fn name(&self, ordinal: &str) -> Option<&str> {
        self.by_ordinal
            .get(ordinal)
            .map(|&i| self.entries[i].0.as_str())
    }

    pub fn unmapped_ordinal(&self) -> &str {
        // The sentinel is always the final entry
        &self.entries[self.entries.len() - 1].1
    }

    /// `(name, ordinal)` pairs in ordinal order, sentinel last
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, o)| (n.as_str(), o.as_str()))
    }

    /// Number of entries including the sentinel
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
