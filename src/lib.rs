//! Pickr - the state engine behind a searchable select field
//!
//! This library implements the data and control flow of a single- or
//! multi-value picker: an option store, debounced local/remote search with
//! stale-response discard, cancellable paginated fetches, selection rules
//! with ad-hoc tag creation, and create/edit record round trips that merge
//! server-owned records back into the option set.
//!
//! The engine is UI-agnostic and runtime-agnostic. Mutating calls on
//! [`engine::Picker`] return [`engine::Command`] values naming the side
//! effects the host must perform (schedule a timer, issue or abort a
//! request, close the dropdown, notify the form). Asynchronous results are
//! fed back in through the `handle_*` entry points, tagged with the tokens
//! the engine handed out, so superseded work is discarded deterministically.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod config;
pub mod engine;
pub mod pagination;
pub mod remote;
pub mod search;
pub mod selection;
pub mod store;
pub mod sync;

pub use crate::config::{PickerConfig, RemoteConfig};
pub use engine::{Command, Picker, PickerValue};
pub use selection::SelectionChange;
pub use store::OptionStore;

/// Error enum, contains all caller-facing failure states of the engine
#[derive(Debug, Error)]
pub enum PickerError {
    /// Selection rule violation
    #[error("Selection error: {0}")]
    Selection(#[from] selection::SelectionError),
    /// Record create/edit misuse
    #[error("Record sync error: {0}")]
    Sync(#[from] sync::SyncError),
    /// Represents a configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ::config::ConfigError),
}

/// One selectable entry: a stable value, its display label and metadata
///
/// Values are unique within one [`store::OptionStore`]; uniqueness is
/// enforced by the store, not assumed of the input. Field names follow the
/// wire shape of the remote option endpoint, so pages deserialize directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionEntry {
    pub value: String,
    pub label: String,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl OptionEntry {
    /// Create an enabled entry with no description
    #[must_use]
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
            disabled: false,
            description: None,
        }
    }

    /// Attach a description
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Mark the entry disabled
    #[must_use]
    pub const fn with_disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    /// Case-insensitive substring match against label and description
    ///
    /// An empty query matches everything.
    #[must_use]
    pub fn matches(&self, query: &str) -> bool {
        if query.is_empty() {
            return true;
        }
        let needle = query.to_lowercase();
        if self.label.to_lowercase().contains(&needle) {
            return true;
        }
        self.description
            .as_ref()
            .is_some_and(|d| d.to_lowercase().contains(&needle))
    }
}
