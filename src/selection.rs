//! Selection rules: single/multi modes, count limits, tag creation
//!
//! `Selector` holds the policy; the selected values themselves live in the
//! [`OptionStore`]. Every successful mutation yields a [`SelectOutcome`]
//! telling the engine whether anything changed and whether the open list
//! should close, and the engine turns that into the persisted value update
//! and the single change notification the host form depends on.

use crate::OptionEntry;
use crate::store::OptionStore;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

/// Errors for caller mistakes around tag creation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectionError {
    #[error("tag creation is not enabled for this picker")]
    TaggingDisabled,

    #[error("tag value is empty after trimming")]
    EmptyTag,
}

/// Payload of the "selection changed" notification
///
/// `value` carries the single-mode selection (`None` when empty or in
/// multi mode); `values` always carries the full ordered selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectionChange {
    pub value: Option<String>,
    pub values: Vec<String>,
}

/// Result of one selection mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectOutcome {
    /// Selection changed; `close` asks the engine to close the open list
    Changed { close: bool },
    /// The operation was a no-op; prior selection is untouched
    Unchanged,
}

impl SelectOutcome {
    #[must_use]
    pub const fn changed(&self) -> bool {
        matches!(self, Self::Changed { .. })
    }
}

/// Selection policy for one picker
#[derive(Debug, Clone)]
pub struct Selector {
    multiple: bool,
    max_selections: Option<usize>,
    min_selections: Option<usize>,
    close_on_select: bool,
    taggable: bool,
}

impl Selector {
    #[must_use]
    pub const fn new(
        multiple: bool,
        max_selections: Option<usize>,
        min_selections: Option<usize>,
        close_on_select: bool,
        taggable: bool,
    ) -> Self {
        Self {
            multiple,
            max_selections,
            min_selections,
            close_on_select,
            taggable,
        }
    }

    #[must_use]
    pub const fn multiple(&self) -> bool {
        self.multiple
    }

    /// Select (or, in multi mode, toggle) a value
    ///
    /// Single mode replaces the selection and closes the list. Multi mode
    /// toggles membership: an insertion at `max_selections` is a no-op; a
    /// removal below `min_selections` is a no-op. Disabled and unknown
    /// values are refused.
    pub fn select(&self, store: &mut OptionStore, value: &str) -> SelectOutcome {
        match store.find(value) {
            Some(entry) if entry.disabled => {
                debug!(value, "refusing to select disabled option");
                return SelectOutcome::Unchanged;
            }
            Some(_) => {}
            None => {
                debug!(value, "refusing to select unknown value");
                return SelectOutcome::Unchanged;
            }
        }

        if !self.multiple {
            if store.selected_values() == [value] {
                return SelectOutcome::Unchanged;
            }
            store.set_selected(vec![value.to_string()]);
            return SelectOutcome::Changed { close: true };
        }

        if store.is_selected(value) {
            return self.remove(store, value);
        }

        if let Some(max) = self.max_selections
            && store.selected_values().len() >= max
        {
            debug!(value, max, "selection limit reached");
            return SelectOutcome::Unchanged;
        }

        store.add_selected(value);
        SelectOutcome::Changed {
            close: self.close_on_select,
        }
    }

    /// Remove a value from the selection; no-op when absent or when the
    /// removal would violate `min_selections`
    pub fn deselect(&self, store: &mut OptionStore, value: &str) -> SelectOutcome {
        if !store.is_selected(value) {
            return SelectOutcome::Unchanged;
        }
        self.remove(store, value)
    }

    /// Empty the selection unconditionally (bypasses `min_selections`)
    pub fn clear(&self, store: &mut OptionStore) -> SelectOutcome {
        if store.selected_values().is_empty() {
            return SelectOutcome::Unchanged;
        }
        store.clear_selected();
        SelectOutcome::Changed { close: false }
    }

    /// Promote free text to an option and select it
    ///
    /// Whitespace is trimmed; an existing value is reused rather than
    /// duplicated (a colliding upsert is not an error).
    ///
    /// # Errors
    ///
    /// [`SelectionError::TaggingDisabled`] when tagging is off,
    /// [`SelectionError::EmptyTag`] when nothing is left after trimming.
    pub fn create_tag(
        &self,
        store: &mut OptionStore,
        raw: &str,
    ) -> Result<SelectOutcome, SelectionError> {
        if !self.taggable {
            return Err(SelectionError::TaggingDisabled);
        }
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(SelectionError::EmptyTag);
        }

        if store.find(trimmed).is_none() {
            store.upsert(OptionEntry::new(trimmed, trimmed));
        }
        Ok(self.select(store, trimmed))
    }

    /// Snapshot of the current selection in notification shape
    #[must_use]
    pub fn change(&self, store: &OptionStore) -> SelectionChange {
        let values = store.selected_values().to_vec();
        let value = if self.multiple {
            None
        } else {
            values.first().cloned()
        };
        SelectionChange { value, values }
    }

    fn remove(&self, store: &mut OptionStore, value: &str) -> SelectOutcome {
        if let Some(min) = self.min_selections
            && store.selected_values().len() <= min
        {
            debug!(value, min, "removal would drop below minimum selection");
            return SelectOutcome::Unchanged;
        }
        store.remove_selected(value);
        SelectOutcome::Changed {
            close: if self.multiple {
                self.close_on_select
            } else {
                false
            },
        }
    }
}
