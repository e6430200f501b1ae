//! Canonical option collection and selection membership
//!
//! `OptionStore` is the single writer for the option list of one picker
//! instance. Remote pages and record merges land here; the selection layer
//! reads and writes membership through the `*_selected` accessors. The
//! store never applies selection policy itself.

use crate::OptionEntry;
use tracing::debug;

/// Outcome of [`OptionStore::remove`], so the caller can rebalance selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovedOption {
    pub entry: OptionEntry,
    /// The removed value was part of the current selection
    pub was_selected: bool,
}

/// Ordered option list plus the ordered set of selected values
///
/// Selected values may temporarily lack a backing entry (programmatic
/// writes, values restored from a persisted form state). Merge operations
/// preserve every selected entry even when a fresh page omits it.
#[derive(Debug, Clone, Default)]
pub struct OptionStore {
    entries: Vec<OptionEntry>,
    selected: Vec<String>,
}

impl OptionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store pre-seeded with a local option universe
    #[must_use]
    pub fn with_options(options: Vec<OptionEntry>) -> Self {
        let mut store = Self::new();
        for option in options {
            store.upsert(option);
        }
        store
    }

    /// Insert `option`, or replace label/description/disabled in place when
    /// the value already exists. Selection membership is never touched.
    ///
    /// Returns `true` when the value was new.
    pub fn upsert(&mut self, option: OptionEntry) -> bool {
        if let Some(existing) = self.entries.iter_mut().find(|e| e.value == option.value) {
            *existing = option;
            false
        } else {
            self.entries.push(option);
            true
        }
    }

    /// Remove an entry; silent when the value does not exist
    ///
    /// The result reports whether the removed value was selected so the
    /// selection layer can rebalance and notify. Membership of a removed
    /// value is dropped here.
    pub fn remove(&mut self, value: &str) -> Option<RemovedOption> {
        let index = self.entries.iter().position(|e| e.value == value)?;
        let entry = self.entries.remove(index);
        let was_selected = self.remove_selected(value);
        Some(RemovedOption {
            entry,
            was_selected,
        })
    }

    #[must_use]
    pub fn find(&self, value: &str) -> Option<&OptionEntry> {
        self.entries.iter().find(|e| e.value == value)
    }

    /// Replace the non-selected portion of the list with a fresh page
    ///
    /// Every currently selected entry survives, even when absent from
    /// `options`, so a selected-but-off-screen item is never lost. A page
    /// entry whose value is already held by a surviving selected entry is
    /// skipped rather than duplicated.
    pub fn replace_unselected(&mut self, options: Vec<OptionEntry>) {
        let dropped = self
            .entries
            .iter()
            .filter(|e| !self.is_selected(&e.value))
            .count();
        if dropped > 0 {
            debug!(dropped, "replacing unselected options");
        }

        let selected = &self.selected;
        self.entries
            .retain(|e| selected.iter().any(|v| v == &e.value));
        self.append_unselected(options);
    }

    /// Append a follow-up page, skipping values already present
    pub fn append_unselected(&mut self, options: Vec<OptionEntry>) {
        for option in options {
            if self.find(&option.value).is_none() {
                self.entries.push(option);
            }
        }
    }

    #[must_use]
    pub fn entries(&self) -> &[OptionEntry] {
        &self.entries
    }

    /// Entries not part of the current selection, in list order
    pub fn unselected(&self) -> impl Iterator<Item = &OptionEntry> {
        self.entries.iter().filter(|e| !self.is_selected(&e.value))
    }

    /// Entries matching a case-insensitive substring query, in list order
    #[must_use]
    pub fn filter(&self, query: &str) -> Vec<&OptionEntry> {
        self.entries.iter().filter(|e| e.matches(query)).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // --- selection membership (written by the selection layer) ---

    #[must_use]
    pub fn selected_values(&self) -> &[String] {
        &self.selected
    }

    #[must_use]
    pub fn is_selected(&self, value: &str) -> bool {
        self.selected.iter().any(|v| v == value)
    }

    /// Selected entries in selection order; values without a backing entry
    /// are skipped
    #[must_use]
    pub fn selected_options(&self) -> Vec<&OptionEntry> {
        self.selected
            .iter()
            .filter_map(|v| self.find(v))
            .collect()
    }

    /// Add to the selection; returns `false` when already present
    pub(crate) fn add_selected(&mut self, value: &str) -> bool {
        if self.is_selected(value) {
            return false;
        }
        self.selected.push(value.to_string());
        true
    }

    /// Drop from the selection; returns `false` when absent
    pub(crate) fn remove_selected(&mut self, value: &str) -> bool {
        let before = self.selected.len();
        self.selected.retain(|v| v != value);
        self.selected.len() != before
    }

    /// Replace the whole selection, deduplicating while preserving order
    pub(crate) fn set_selected(&mut self, values: Vec<String>) {
        self.selected.clear();
        for value in values {
            if !self.is_selected(&value) {
                self.selected.push(value);
            }
        }
    }

    pub(crate) fn clear_selected(&mut self) {
        self.selected.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opt(value: &str, label: &str) -> OptionEntry {
        OptionEntry::new(value, label)
    }

    #[test]
    fn test_upsert_inserts_then_replaces_in_place() {
        let mut store = OptionStore::new();

        assert!(store.upsert(opt("1", "One")));
        assert!(!store.upsert(opt("1", "Uno")));

        assert_eq!(store.len(), 1);
        assert_eq!(store.find("1").unwrap().label, "Uno");
    }

    #[test]
    fn test_upsert_never_touches_selection() {
        let mut store = OptionStore::with_options(vec![opt("1", "One")]);
        store.add_selected("1");

        store.upsert(opt("1", "Uno"));

        assert!(store.is_selected("1"));
        assert_eq!(store.selected_values(), ["1".to_string()]);
    }

    #[test]
    fn test_remove_is_silent_on_missing_value() {
        let mut store = OptionStore::new();
        assert!(store.remove("ghost").is_none());
    }

    #[test]
    fn test_remove_reports_selected_membership() {
        let mut store = OptionStore::with_options(vec![opt("1", "One"), opt("2", "Two")]);
        store.add_selected("1");

        let removed = store.remove("1").unwrap();
        assert!(removed.was_selected);
        assert_eq!(removed.entry.label, "One");
        assert!(!store.is_selected("1"));

        let removed = store.remove("2").unwrap();
        assert!(!removed.was_selected);
    }

    #[test]
    fn test_replace_unselected_preserves_selected_entries() {
        let mut store = OptionStore::with_options(vec![opt("a", "A"), opt("b", "B")]);
        store.add_selected("b");

        store.replace_unselected(vec![opt("c", "C"), opt("d", "D")]);

        let values: Vec<&str> = store.entries().iter().map(|e| e.value.as_str()).collect();
        assert_eq!(values, ["b", "c", "d"]);
        assert!(store.is_selected("b"));
    }

    #[test]
    fn test_replace_unselected_does_not_duplicate_selected_value() {
        let mut store = OptionStore::with_options(vec![opt("a", "A"), opt("b", "B")]);
        store.add_selected("b");

        store.replace_unselected(vec![opt("b", "B"), opt("c", "C")]);

        let values: Vec<&str> = store.entries().iter().map(|e| e.value.as_str()).collect();
        assert_eq!(values, ["b", "c"]);
    }

    #[test]
    fn test_append_unselected_keeps_existing_order() {
        let mut store = OptionStore::with_options(vec![opt("a", "A"), opt("b", "B")]);

        store.append_unselected(vec![opt("c", "C"), opt("a", "A")]);

        let values: Vec<&str> = store.entries().iter().map(|e| e.value.as_str()).collect();
        assert_eq!(values, ["a", "b", "c"]);
    }

    #[test]
    fn test_filter_matches_label_and_description() {
        let store = OptionStore::with_options(vec![
            opt("1", "Alpha"),
            OptionEntry::new("2", "Beta").with_description("second letter"),
            opt("3", "Gamma"),
        ]);

        let hits = store.filter("let");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].value, "2");

        assert_eq!(store.filter("").len(), 3);
    }

    #[test]
    fn test_selected_options_follow_selection_order() {
        let mut store =
            OptionStore::with_options(vec![opt("a", "A"), opt("b", "B"), opt("c", "C")]);
        store.add_selected("c");
        store.add_selected("a");

        let labels: Vec<&str> = store
            .selected_options()
            .iter()
            .map(|e| e.label.as_str())
            .collect();
        assert_eq!(labels, ["C", "A"]);
    }

    #[test]
    fn test_set_selected_dedupes() {
        let mut store = OptionStore::new();
        store.set_selected(vec!["a".into(), "b".into(), "a".into()]);
        assert_eq!(store.selected_values(), ["a".to_string(), "b".to_string()]);
    }
}
