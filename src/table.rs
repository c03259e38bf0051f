//! Walked table columns.

use std::collections::BTreeMap;
use std::collections::btree_map;

use crate::oid::Oid;
use crate::value::Value;

/// One walked column: row index (the arc below the column root) to value.
///
/// Keys are unique and iterate in ascending index order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OidTable {
    root: Oid,
    entries: BTreeMap<u32, Value>,
}

impl OidTable {
    pub fn new(root: Oid) -> Self {
        Self {
            root,
            entries: BTreeMap::new(),
        }
    }

    /// Build a table from `(index, value)` pairs.
    pub fn from_entries<V: Into<Value>>(
        root: Oid,
        entries: impl IntoIterator<Item = (u32, V)>,
    ) -> Self {
        Self {
            root,
            entries: entries
                .into_iter()
                .map(|(index, value)| (index, value.into()))
                .collect(),
        }
    }

    /// The column this table was walked from.
    pub fn root(&self) -> &Oid {
        &self.root
    }

    /// Insert a row, returning the value it replaced.
    pub fn insert(&mut self, index: u32, value: Value) -> Option<Value> {
        self.entries.insert(index, value)
    }

    pub fn get(&self, index: u32) -> Option<&Value> {
        self.entries.get(&index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn indices(&self) -> impl Iterator<Item = u32> + '_ {
        self.entries.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &Value)> {
        self.entries.iter().map(|(index, value)| (*index, value))
    }
}

impl<'a> IntoIterator for &'a OidTable {
    type Item = (&'a u32, &'a Value);
    type IntoIter = btree_map::Iter<'a, u32, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
