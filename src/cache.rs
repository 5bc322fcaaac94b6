//! Per-session store of computed trial balances.
//!
//! Entries are keyed by fiscal year, the account selection and the year
//! source the balance was computed with, so a statement never reads a
//! balance produced under different filters. Writing the same key again
//! replaces the entry.

use crate::engine::{BalanceRequest, TrialBalance};
use crate::schema::{AccountSelection, YearColumn};
use log::debug;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SnapshotKey {
    pub year: i32,
    pub selection: AccountSelection,
    pub year_column: YearColumn,
}

impl SnapshotKey {
    pub fn new(year: i32, selection: AccountSelection, year_column: YearColumn) -> Self {
        Self {
            year,
            selection,
            year_column,
        }
    }

    pub fn of(balance: &TrialBalance) -> Self {
        Self::new(balance.year, balance.selection.clone(), balance.year_column.clone())
    }

    pub fn for_request(request: &BalanceRequest) -> Self {
        Self::new(request.year, request.selection.clone(), request.year_column.clone())
    }
}

#[derive(Debug, Clone, Default)]
pub struct BalanceCache {
    entries: BTreeMap<SnapshotKey, TrialBalance>,
}

impl BalanceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `balance` under its own year, selection and year source,
    /// returning the entry it replaced.
    pub fn put(&mut self, balance: TrialBalance) -> Option<TrialBalance> {
        let key = SnapshotKey::of(&balance);
        debug!("Caching trial balance for {} ({} rows)", key.year, balance.rows.len());
        self.entries.insert(key, balance)
    }

    pub fn get(&self, key: &SnapshotKey) -> Option<&TrialBalance> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &SnapshotKey) -> bool {
        self.get(key).is_some()
    }

    /// Fiscal years with at least one cached balance, ascending.
    pub fn years(&self) -> BTreeSet<i32> {
        self.entries.keys().map(|k| k.year).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::BalanceAmounts;

    fn balance(year: i32, selection: AccountSelection) -> TrialBalance {
        TrialBalance {
            year,
            selection,
            year_column: YearColumn::Derived,
            rows: Vec::new(),
            totals: BalanceAmounts::default(),
        }
    }

    fn key(year: i32, selection: AccountSelection) -> SnapshotKey {
        SnapshotKey::new(year, selection, YearColumn::Derived)
    }

    #[test]
    fn test_put_and_get() {
        let mut cache = BalanceCache::new();
        assert!(cache.get(&key(2024, AccountSelection::all())).is_none());

        assert!(cache.put(balance(2024, AccountSelection::all())).is_none());
        assert!(cache.contains(&key(2024, AccountSelection::all())));
        assert!(!cache.contains(&key(2023, AccountSelection::all())));
        assert!(cache.contains(&SnapshotKey::for_request(&BalanceRequest::new(2024))));
    }

    #[test]
    fn test_put_overwrites_same_key() {
        let mut cache = BalanceCache::new();
        cache.put(balance(2024, AccountSelection::all()));
        let replaced = cache.put(balance(2024, AccountSelection::all()));
        assert!(replaced.is_some());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_different_selection_is_a_miss() {
        let mut cache = BalanceCache::new();
        let bilan_only = AccountSelection::all().with_groups(["Bilan"]);
        cache.put(balance(2024, bilan_only.clone()));

        assert!(cache.get(&key(2024, bilan_only.clone())).is_some());
        assert!(cache.get(&key(2024, AccountSelection::all())).is_none());

        cache.put(balance(2024, AccountSelection::all()));
        cache.put(balance(2023, AccountSelection::all()));
        assert_eq!(cache.len(), 3);
        assert_eq!(cache.years().into_iter().collect::<Vec<_>>(), vec![2023, 2024]);

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_different_year_column_is_a_miss() {
        let mut cache = BalanceCache::new();
        let mut by_exercise = balance(2024, AccountSelection::all());
        by_exercise.year_column = YearColumn::Named("Exercice".to_string());
        cache.put(balance(2024, AccountSelection::all()));
        cache.put(by_exercise);

        // Both live side by side; neither replaced the other.
        assert_eq!(cache.len(), 2);
        let derived = cache.get(&key(2024, AccountSelection::all())).unwrap();
        assert_eq!(derived.year_column, YearColumn::Derived);
        let named = SnapshotKey::new(
            2024,
            AccountSelection::all(),
            YearColumn::Named("Exercice".to_string()),
        );
        assert!(cache.contains(&named));
    }
}
