//! Availability diff between a search snapshot and the stored catalog.
//!
//! Produces the write-set and notify-set for one pass. Nothing here touches
//! storage or the network; the caller commits the plan.
//!
//! Absence is always judged against the *unfiltered* snapshot. An item that
//! is still listed but filtered out of this pass is left exactly as stored.

use std::collections::HashSet;

use crate::models::{CatalogEntry, CatalogState, SnapshotItem};

/// How an identifier's availability moves in a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transition {
    /// New identifier, or previously stored as out of stock
    BecameAvailable,
    /// Stored as in stock but no longer listed
    BecameUnavailable,
    /// Stored as in stock and still listed
    Unchanged,
}

/// One staged upsert and the transition that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedUpsert {
    pub entry: CatalogEntry,
    pub transition: Transition,
}

/// Everything a pass intends to write and announce.
#[derive(Debug, Clone, Default)]
pub struct PassPlan {
    /// Snapshot-order upserts first, then flips to out of stock by id
    pub staged: Vec<StagedUpsert>,
    /// Items to announce, in snapshot order
    pub notify_set: Vec<SnapshotItem>,
}

impl PassPlan {
    /// The upserts to commit as one batch.
    pub fn write_set(&self) -> Vec<CatalogEntry> {
        self.staged.iter().map(|s| s.entry.clone()).collect()
    }

    /// Number of staged upserts with the given transition.
    pub fn count(&self, transition: Transition) -> usize {
        self.staged
            .iter()
            .filter(|s| s.transition == transition)
            .count()
    }

    /// Identifiers of the notify-set, in snapshot order.
    pub fn notify_ids(&self) -> Vec<String> {
        self.notify_set.iter().map(|i| i.id.clone()).collect()
    }
}

/// Compute the plan for one pass.
///
/// `snapshot` is the full fetched listing, `relevant` the subset that passed
/// the name filter (the whole snapshot when no filter is set).
pub fn plan_pass(
    prior: &CatalogState,
    snapshot: &[SnapshotItem],
    relevant: &[&SnapshotItem],
) -> PassPlan {
    let listed: HashSet<&str> = snapshot.iter().map(|i| i.id.as_str()).collect();

    let mut plan = PassPlan::default();
    let mut staged_ids: HashSet<&str> = HashSet::new();

    // Listed and relevant: in stock now
    for item in relevant {
        if !staged_ids.insert(item.id.as_str()) {
            log::debug!("Duplicate listing for {} ignored", item.id);
            continue;
        }

        let was_in_stock = prior.get(&item.id).copied().unwrap_or(false);
        let transition = if was_in_stock {
            Transition::Unchanged
        } else {
            plan.notify_set.push((*item).clone());
            Transition::BecameAvailable
        };

        plan.staged.push(StagedUpsert {
            entry: CatalogEntry::in_stock(&item.id),
            transition,
        });
    }

    // Stored as in stock but no longer listed at all
    for (item_id, in_stock) in prior {
        if *in_stock && !listed.contains(item_id.as_str()) {
            plan.staged.push(StagedUpsert {
                entry: CatalogEntry::out_of_stock(item_id),
                transition: Transition::BecameUnavailable,
            });
        }
    }

    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NameFilter, PriceRange};

    fn make_item(id: &str, name: &str) -> SnapshotItem {
        SnapshotItem {
            id: id.to_string(),
            name: name.to_string(),
            price: PriceRange::new(10.0, 10.0),
            media: Vec::new(),
            detail_token: format!("item-{}", id),
        }
    }

    fn state(entries: &[(&str, bool)]) -> CatalogState {
        entries
            .iter()
            .map(|(id, v)| (id.to_string(), *v))
            .collect()
    }

    fn plan_all(prior: &CatalogState, snapshot: &[SnapshotItem]) -> PassPlan {
        let relevant: Vec<&SnapshotItem> = snapshot.iter().collect();
        plan_pass(prior, snapshot, &relevant)
    }

    fn plan_filtered(prior: &CatalogState, snapshot: &[SnapshotItem], needle: &str) -> PassPlan {
        let filter = NameFilter::new(needle).unwrap();
        let relevant: Vec<&SnapshotItem> =
            snapshot.iter().filter(|i| filter.matches(&i.name)).collect();
        plan_pass(prior, snapshot, &relevant)
    }

    #[test]
    fn test_new_item_from_empty_state() {
        let plan = plan_all(&state(&[]), &[make_item("1", "Red Shoe")]);

        assert_eq!(plan.write_set(), vec![CatalogEntry::in_stock("1")]);
        assert_eq!(plan.notify_ids(), vec!["1"]);
        assert_eq!(plan.count(Transition::BecameAvailable), 1);
    }

    #[test]
    fn test_already_in_stock_is_not_notified() {
        let plan = plan_all(&state(&[("1", true)]), &[make_item("1", "Red Shoe")]);

        assert_eq!(plan.write_set(), vec![CatalogEntry::in_stock("1")]);
        assert!(plan.notify_set.is_empty());
        assert_eq!(plan.count(Transition::Unchanged), 1);
    }

    #[test]
    fn test_missing_item_flips_to_out_of_stock() {
        let plan = plan_all(
            &state(&[("1", true), ("2", true)]),
            &[make_item("1", "Red Shoe")],
        );

        assert_eq!(
            plan.write_set(),
            vec![CatalogEntry::in_stock("1"), CatalogEntry::out_of_stock("2")]
        );
        assert!(plan.notify_set.is_empty());
        assert_eq!(plan.count(Transition::BecameUnavailable), 1);
    }

    #[test]
    fn test_back_in_stock_is_notified() {
        let plan = plan_all(&state(&[("1", false)]), &[make_item("1", "Red Shoe")]);

        assert_eq!(plan.write_set(), vec![CatalogEntry::in_stock("1")]);
        assert_eq!(plan.notify_ids(), vec!["1"]);
    }

    #[test]
    fn test_filtered_out_but_listed_is_untouched() {
        let plan = plan_filtered(
            &state(&[("1", true)]),
            &[make_item("1", "Hat"), make_item("2", "Running Shoe")],
            "shoe",
        );

        assert_eq!(plan.write_set(), vec![CatalogEntry::in_stock("2")]);
        assert_eq!(plan.notify_ids(), vec!["2"]);
        assert_eq!(plan.count(Transition::BecameUnavailable), 0);
    }

    #[test]
    fn test_unlisted_item_flips_despite_filter() {
        let plan = plan_filtered(
            &state(&[("1", true), ("3", true)]),
            &[make_item("1", "Hat"), make_item("2", "Running Shoe")],
            "shoe",
        );

        assert_eq!(
            plan.write_set(),
            vec![CatalogEntry::in_stock("2"), CatalogEntry::out_of_stock("3")]
        );
    }

    #[test]
    fn test_absent_and_already_out_of_stock_not_staged() {
        let plan = plan_all(
            &state(&[("1", false), ("2", true)]),
            &[make_item("2", "Red Shoe")],
        );

        assert_eq!(plan.write_set(), vec![CatalogEntry::in_stock("2")]);
    }

    #[test]
    fn test_duplicate_listing_staged_once() {
        let plan = plan_all(
            &state(&[]),
            &[make_item("1", "Red Shoe"), make_item("1", "Red Shoe (again)")],
        );

        assert_eq!(plan.write_set(), vec![CatalogEntry::in_stock("1")]);
        assert_eq!(plan.notify_set.len(), 1);
        assert_eq!(plan.notify_set[0].name, "Red Shoe");
    }

    #[test]
    fn test_notify_set_keeps_snapshot_order() {
        let plan = plan_all(
            &state(&[("b", true)]),
            &[make_item("c", "C"), make_item("b", "B"), make_item("a", "A")],
        );

        assert_eq!(plan.notify_ids(), vec!["c", "a"]);
    }

    #[test]
    fn test_flips_sorted_by_id() {
        let plan = plan_all(
            &state(&[("z", true), ("m", true), ("keep", true)]),
            &[make_item("keep", "Keep")],
        );

        let flipped: Vec<String> = plan
            .staged
            .iter()
            .filter(|s| s.transition == Transition::BecameUnavailable)
            .map(|s| s.entry.item_id.clone())
            .collect();
        assert_eq!(flipped, vec!["m", "z"]);
    }
}
