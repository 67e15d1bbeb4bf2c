//! Cell presence model.
//!
//! The set of live cells is a point-in-time snapshot supplied by the caller on
//! every convergence pass; nothing here is persisted.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// What service discovery reports about one live cell.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellPresence {
    pub cell_id: String,
    #[serde(default)]
    pub rep_address: String,
    #[serde(default)]
    pub zone: String,
}

impl CellPresence {
    pub fn new(cell_id: impl Into<String>) -> Self {
        Self {
            cell_id: cell_id.into(),
            ..Default::default()
        }
    }
}

/// Cells currently known to be alive, keyed by cell id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellSet(HashMap<String, CellPresence>);

impl CellSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, presence: CellPresence) {
        self.0.insert(presence.cell_id.clone(), presence);
    }

    pub fn contains(&self, cell_id: &str) -> bool {
        self.0.contains_key(cell_id)
    }

    pub fn get(&self, cell_id: &str) -> Option<&CellPresence> {
        self.0.get(cell_id)
    }

    /// Cell ids in sorted order.
    pub fn cell_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.0.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<CellPresence> for CellSet {
    fn from_iter<I: IntoIterator<Item = CellPresence>>(iter: I) -> Self {
        let mut set = Self::new();
        for presence in iter {
            set.add(presence);
        }
        set
    }
}

impl<'a> FromIterator<&'a str> for CellSet {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        iter.into_iter().map(CellPresence::new).collect()
    }
}
