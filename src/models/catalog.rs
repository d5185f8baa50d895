//! Persisted catalog availability.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Last-known availability per item identifier.
pub type CatalogState = BTreeMap<String, bool>;

/// One persisted row: an identifier and whether it is currently listed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct CatalogEntry {
    pub item_id: String,
    pub in_stock: bool,
}

impl CatalogEntry {
    pub fn in_stock(item_id: impl Into<String>) -> Self {
        Self {
            item_id: item_id.into(),
            in_stock: true,
        }
    }

    pub fn out_of_stock(item_id: impl Into<String>) -> Self {
        Self {
            item_id: item_id.into(),
            in_stock: false,
        }
    }
}

/// Counts for reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CatalogCounts {
    pub total: usize,
    pub in_stock: usize,
    pub out_of_stock: usize,
}

impl CatalogCounts {
    pub fn of(state: &CatalogState) -> Self {
        let in_stock = state.values().filter(|v| **v).count();
        Self {
            total: state.len(),
            in_stock,
            out_of_stock: state.len() - in_stock,
        }
    }
}

/// Apply a batch to a state map: insert if absent, otherwise overwrite the flag.
pub fn apply_batch(state: &mut CatalogState, batch: &[CatalogEntry]) {
    for entry in batch {
        state.insert(entry.item_id.clone(), entry.in_stock);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_batch_upserts() {
        let mut state = CatalogState::from([("1".to_string(), true)]);
        apply_batch(
            &mut state,
            &[CatalogEntry::out_of_stock("1"), CatalogEntry::in_stock("2")],
        );
        assert_eq!(state.get("1"), Some(&false));
        assert_eq!(state.get("2"), Some(&true));
    }

    #[test]
    fn test_counts() {
        let state = CatalogState::from([
            ("1".to_string(), true),
            ("2".to_string(), false),
            ("3".to_string(), true),
        ]);
        let counts = CatalogCounts::of(&state);
        assert_eq!(counts.total, 3);
        assert_eq!(counts.in_stock, 2);
        assert_eq!(counts.out_of_stock, 1);
    }
}
