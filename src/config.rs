//! Configuration for a picker instance
//!
//! Hosts usually build a [`PickerConfig`] in code, but presets can also be
//! declared in TOML and loaded with [`PickerConfig::from_file`], so a form
//! system can ship picker definitions as data.

use config::{Config, ConfigError, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default debounce delay between the last keystroke and a search
pub const DEFAULT_DEBOUNCE_MS: u64 = 300;

/// Default number of options per page (remote request or local reveal)
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// Default distance to the list bottom, in host units, below which the
/// next remote page is requested
pub const DEFAULT_SCROLL_THRESHOLD: f64 = 50.0;

/// Endpoints of a remote-backed picker
///
/// Only `search_url` is required for remote search; the record endpoints
/// are optional and gate the create/edit flows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// `GET ?page=<n>&search=<query>` option source
    pub search_url: String,

    /// `POST` endpoint for creating records
    #[serde(default)]
    pub create_url: Option<String>,

    /// `PUT` endpoint for updating records
    #[serde(default)]
    pub update_url: Option<String>,

    /// `GET ?id=<value>` endpoint pre-filling edit forms
    #[serde(default)]
    pub fetch_url: Option<String>,
}

impl RemoteConfig {
    #[must_use]
    pub fn new(search_url: impl Into<String>) -> Self {
        Self {
            search_url: search_url.into(),
            create_url: None,
            update_url: None,
            fetch_url: None,
        }
    }

    #[must_use]
    pub fn with_create_url(mut self, url: impl Into<String>) -> Self {
        self.create_url = Some(url.into());
        self
    }

    #[must_use]
    pub fn with_update_url(mut self, url: impl Into<String>) -> Self {
        self.update_url = Some(url.into());
        self
    }

    #[must_use]
    pub fn with_fetch_url(mut self, url: impl Into<String>) -> Self {
        self.fetch_url = Some(url.into());
        self
    }
}

/// Behavior of one picker instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PickerConfig {
    /// Multi-value mode
    pub multiple: bool,

    /// Upper bound on selected values (multi mode)
    pub max_selections: Option<usize>,

    /// Lower bound protected by per-value deselection (multi mode)
    pub min_selections: Option<usize>,

    /// Close the list after a successful selection. Unset: single mode
    /// closes, multi mode stays open.
    pub close_on_select: Option<bool>,

    /// Allow promoting free text to new options
    pub taggable: bool,

    /// Debounce delay in milliseconds
    pub debounce_ms: u64,

    /// Minimum query length before a remote request is issued
    pub min_query_len: usize,

    /// Options per remote page / local reveal step
    pub page_size: usize,

    /// Scroll distance to the bottom that triggers the next remote page
    pub scroll_threshold: f64,

    /// Remote endpoints; `None` means a purely local option source
    pub remote: Option<RemoteConfig>,
}

impl Default for PickerConfig {
    fn default() -> Self {
        Self {
            multiple: false,
            max_selections: None,
            min_selections: None,
            close_on_select: None,
            taggable: false,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            min_query_len: 0,
            page_size: DEFAULT_PAGE_SIZE,
            scroll_threshold: DEFAULT_SCROLL_THRESHOLD,
            remote: None,
        }
    }
}

impl PickerConfig {
    /// Load a picker preset from a TOML file
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path).format(FileFormat::Toml))
            .build()?;

        settings.try_deserialize()
    }

    #[must_use]
    pub const fn is_remote(&self) -> bool {
        self.remote.is_some()
    }

    #[must_use]
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Close-on-select with the mode-dependent default applied
    #[must_use]
    pub fn resolved_close_on_select(&self) -> bool {
        self.close_on_select.unwrap_or(!self.multiple)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = PickerConfig::default();

        assert!(!config.multiple);
        assert_eq!(config.debounce(), Duration::from_millis(300));
        assert_eq!(config.min_query_len, 0);
        assert_eq!(config.page_size, DEFAULT_PAGE_SIZE);
        assert!(!config.is_remote());
        assert!(config.resolved_close_on_select());
    }

    #[test]
    fn test_close_on_select_default_depends_on_mode() {
        let multi = PickerConfig {
            multiple: true,
            ..Default::default()
        };
        assert!(!multi.resolved_close_on_select());

        let pinned = PickerConfig {
            multiple: true,
            close_on_select: Some(true),
            ..Default::default()
        };
        assert!(pinned.resolved_close_on_select());
    }

    #[test]
    fn test_from_file_with_partial_settings() {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        writeln!(
            file,
            r#"
multiple = true
max_selections = 3
debounce_ms = 150

[remote]
search_url = "https://api.example.test/options"
create_url = "https://api.example.test/records"
"#
        )
        .unwrap();

        let config = PickerConfig::from_file(file.path()).unwrap();

        assert!(config.multiple);
        assert_eq!(config.max_selections, Some(3));
        assert_eq!(config.debounce(), Duration::from_millis(150));
        // untouched keys keep their defaults
        assert_eq!(config.page_size, DEFAULT_PAGE_SIZE);

        let remote = config.remote.unwrap();
        assert_eq!(remote.search_url, "https://api.example.test/options");
        assert!(remote.update_url.is_none());
    }

    #[test]
    fn test_remote_config_builders() {
        let remote = RemoteConfig::new("/options")
            .with_create_url("/records")
            .with_update_url("/records")
            .with_fetch_url("/records/show");

        assert_eq!(remote.create_url.as_deref(), Some("/records"));
        assert_eq!(remote.fetch_url.as_deref(), Some("/records/show"));
    }

    #[test]
    fn test_config_serializes_to_toml() {
        let config = PickerConfig {
            taggable: true,
            remote: Some(RemoteConfig::new("/options")),
            ..Default::default()
        };

        let rendered = toml::to_string_pretty(&config).unwrap();
        let parsed: PickerConfig = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed, config);
    }
}
