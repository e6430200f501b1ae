//! The picker engine facade
//!
//! One `Picker` owns the option store and the search, pagination,
//! selection and record-sync state for a single logical picker. Hosts
//! construct one per field (no shared registries), call the input methods
//! as the user types, scrolls and clicks, execute the returned [`Command`]
//! values, and feed asynchronous results back through the `handle_*`
//! methods with the tokens the engine handed out.
//!
//! All staleness rules live here and in the sub-modules: a response is
//! merged only when its sequence number is the latest issued, and a reset
//! to the initial option universe supersedes any pending page fetch.

use crate::OptionEntry;
use crate::PickerError;
use crate::config::PickerConfig;
use crate::pagination::{PageMerge, Paginator, ScrollMetrics};
use crate::remote::{
    FetchError, FetchSpec, FormData, RecordData, RecordFields, RecordResponse, RemotePage,
    ValidationFailure,
};
use crate::search::{
    DebounceToken, IssuedFetch, RequestSeq, SearchAction, SearchController, SearchPhase,
};
use crate::selection::{SelectOutcome, SelectionChange, Selector};
use crate::store::OptionStore;
use crate::sync::{OperationKind, PendingOperation, RecordSync, SubmitResult, SyncError};
use std::time::Duration;
use tracing::warn;

/// A side effect the host must perform after an engine call
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Schedule a timer; on expiry call [`Picker::debounce_elapsed`] with
    /// the token. A newer `ScheduleDebounce` invalidates older timers.
    ScheduleDebounce {
        token: DebounceToken,
        delay: Duration,
    },

    /// Issue `GET <url>?page=<page>&search=<search>`; deliver the decoded
    /// body to [`Picker::handle_page_response`] tagged with `seq`
    Fetch(FetchSpec),

    /// Abort the request previously issued under this sequence number, if
    /// the host transport supports aborting
    AbortFetch(RequestSeq),

    /// Issue `POST <url>` with the form fields; deliver to
    /// [`Picker::handle_record_response`]
    CreateRecord { url: String, form: FormData },

    /// Issue `PUT <url>` for `target`; deliver to
    /// [`Picker::handle_record_response`]
    UpdateRecord {
        url: String,
        target: String,
        form: FormData,
    },

    /// Issue `GET <url>?id=<target>`; deliver to
    /// [`Picker::handle_record_fetch`]
    FetchRecord { url: String, target: String },

    /// Close the picker's open surface
    CloseList,

    /// The selection changed; forward to the host form system
    NotifyChange(SelectionChange),

    /// A create/edit submission was rejected; show the messages on the
    /// open form
    ReportValidation(ValidationFailure),
}

/// The persisted external representation of the selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickerValue {
    /// Single mode: the selected value, if any
    Single(Option<String>),
    /// Multi mode: the ordered selected values
    Many(Vec<String>),
}

/// The engine behind one searchable picker
#[derive(Debug)]
pub struct Picker {
    config: PickerConfig,
    store: OptionStore,
    search: SearchController,
    pages: Paginator,
    selector: Selector,
    sync: RecordSync,
    open: bool,
    loaded_initial: bool,
    needs_reload: bool,
    local_query: String,
    persisted: PickerValue,
}

impl Picker {
    #[must_use]
    pub fn new(config: PickerConfig) -> Self {
        Self::with_options(config, Vec::new())
    }

    /// Build a picker pre-seeded with a local option universe
    #[must_use]
    pub fn with_options(config: PickerConfig, options: Vec<OptionEntry>) -> Self {
        let search = SearchController::new(
            config.is_remote(),
            config.debounce(),
            config.min_query_len,
        );
        let pages = Paginator::new(config.page_size, config.scroll_threshold);
        let selector = Selector::new(
            config.multiple,
            config.max_selections,
            config.min_selections,
            config.resolved_close_on_select(),
            config.taggable,
        );
        let persisted = if config.multiple {
            PickerValue::Many(Vec::new())
        } else {
            PickerValue::Single(None)
        };

        Self {
            config,
            store: OptionStore::with_options(options),
            search,
            pages,
            selector,
            sync: RecordSync::new(),
            open: false,
            loaded_initial: false,
            needs_reload: false,
            local_query: String::new(),
            persisted,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &PickerConfig {
        &self.config
    }

    #[must_use]
    pub const fn store(&self) -> &OptionStore {
        &self.store
    }

    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.open
    }

    #[must_use]
    pub const fn search_phase(&self) -> SearchPhase {
        self.search.phase()
    }

    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.pages.is_loading()
    }

    #[must_use]
    pub const fn has_more(&self) -> bool {
        self.pages.has_more()
    }

    // --- surface lifecycle ---

    /// Open the picker's surface
    ///
    /// A remote picker loads the initial unfiltered page on first open,
    /// and again when the surface was last closed with a search active,
    /// so reopening always shows the original option universe.
    pub fn open(&mut self) -> Vec<Command> {
        self.open = true;
        let mut cmds = Vec::new();
        if self.config.is_remote() && (!self.loaded_initial || self.needs_reload) {
            let fetch = self.search.reset_to_initial();
            self.pages.begin_search("");
            self.loaded_initial = true;
            self.needs_reload = false;
            self.push_fetch(&mut cmds, fetch);
        }
        cmds
    }

    /// Close the picker's surface and drop any active query
    pub fn close(&mut self) {
        if self.config.is_remote() && !self.search.query().is_empty() {
            self.needs_reload = true;
        }
        self.open = false;
        self.search.reset();
        self.local_query.clear();
        self.pages.reset_window();
    }

    // --- search ---

    /// The search box content changed
    pub fn set_query(&mut self, text: &str) -> Vec<Command> {
        match self.search.input(text) {
            Some(debounce) => vec![Command::ScheduleDebounce {
                token: debounce.token,
                delay: debounce.delay,
            }],
            None => Vec::new(),
        }
    }

    /// A debounce timer scheduled via [`Command::ScheduleDebounce`] fired
    pub fn debounce_elapsed(&mut self, token: DebounceToken) -> Vec<Command> {
        let mut cmds = Vec::new();
        match self.search.debounce_elapsed(token) {
            None => {}
            Some(SearchAction::FilterLocal { query }) => {
                self.local_query = query;
                self.pages.reset_window();
            }
            Some(SearchAction::Fetch(fetch)) => {
                self.pages.begin_search(&fetch.query);
                self.loaded_initial = true;
                self.push_fetch(&mut cmds, fetch);
            }
        }
        cmds
    }

    /// A fetch issued via [`Command::Fetch`] completed
    ///
    /// Stale responses (sequence superseded) are discarded whole. A failed
    /// current fetch leaves the prior option list untouched.
    pub fn handle_page_response(
        &mut self,
        seq: RequestSeq,
        result: Result<RemotePage, FetchError>,
    ) -> Vec<Command> {
        if !self.search.resolve(seq) {
            return Vec::new();
        }
        match result {
            Ok(page) => match self.pages.apply_page(&page) {
                PageMerge::Replace => self.store.replace_unselected(page.data),
                PageMerge::Append => self.store.append_unselected(page.data),
            },
            Err(error) => {
                warn!(%error, "option fetch failed");
                self.pages.load_failed();
            }
        }
        Vec::new()
    }

    // --- pagination ---

    /// The host's list scrolled
    pub fn handle_scroll(&mut self, metrics: ScrollMetrics) -> Vec<Command> {
        if !self.open {
            return Vec::new();
        }
        if self.config.is_remote() {
            if self.pages.should_load_on_scroll(metrics) {
                return self.begin_next_page();
            }
        } else {
            let total = self.store.filter(&self.local_query).len();
            if self.pages.should_reveal_on_scroll(metrics, total) {
                self.pages.reveal_next(total);
            }
        }
        Vec::new()
    }

    /// Explicit "load more" trigger
    pub fn load_more(&mut self) -> Vec<Command> {
        if self.config.is_remote() {
            self.begin_next_page()
        } else {
            let total = self.store.filter(&self.local_query).len();
            self.pages.reveal_next(total);
            Vec::new()
        }
    }

    fn begin_next_page(&mut self) -> Vec<Command> {
        let mut cmds = Vec::new();
        if let Some(page) = self.pages.try_begin_next() {
            let fetch = self.search.issue_page(page);
            self.push_fetch(&mut cmds, fetch);
        }
        cmds
    }

    // --- selection ---

    pub fn select(&mut self, value: &str) -> Vec<Command> {
        let outcome = self.selector.select(&mut self.store, value);
        self.after_selection(outcome)
    }

    pub fn deselect(&mut self, value: &str) -> Vec<Command> {
        let outcome = self.selector.deselect(&mut self.store, value);
        self.after_selection(outcome)
    }

    pub fn clear(&mut self) -> Vec<Command> {
        let outcome = self.selector.clear(&mut self.store);
        self.after_selection(outcome)
    }

    /// Promote the given free text to an option and select it
    ///
    /// # Errors
    ///
    /// Fails when tagging is disabled or the text is empty after trimming.
    pub fn create_tag(&mut self, raw: &str) -> Result<Vec<Command>, PickerError> {
        let outcome = self.selector.create_tag(&mut self.store, raw)?;
        Ok(self.after_selection(outcome))
    }

    /// Remove an option from the store, rebalancing the selection when the
    /// removed value was selected
    pub fn remove_option(&mut self, value: &str) -> Vec<Command> {
        match self.store.remove(value) {
            Some(removed) if removed.was_selected => {
                self.after_selection(SelectOutcome::Changed { close: false })
            }
            _ => Vec::new(),
        }
    }

    /// Current persisted selection
    #[must_use]
    pub fn value(&self) -> PickerValue {
        self.persisted.clone()
    }

    /// Programmatic write of the selection
    ///
    /// The shape is coerced to the picker's mode (single mode keeps the
    /// first value); count limits are not applied to programmatic writes.
    pub fn set_value(&mut self, value: PickerValue) -> Vec<Command> {
        let values: Vec<String> = match (self.config.multiple, value) {
            (true, PickerValue::Many(values)) => values,
            (true, PickerValue::Single(value)) => value.into_iter().collect(),
            (false, PickerValue::Single(value)) => value.into_iter().collect(),
            (false, PickerValue::Many(values)) => values.into_iter().take(1).collect(),
        };
        self.store.set_selected(values);
        let change = self.selector.change(&self.store);
        self.persisted = self.persisted_from(&change);
        vec![Command::NotifyChange(change)]
    }

    fn after_selection(&mut self, outcome: SelectOutcome) -> Vec<Command> {
        match outcome {
            SelectOutcome::Unchanged => Vec::new(),
            SelectOutcome::Changed { close } => {
                let change = self.selector.change(&self.store);
                self.persisted = self.persisted_from(&change);
                let mut cmds = vec![Command::NotifyChange(change)];
                if close && self.open {
                    self.close();
                    cmds.push(Command::CloseList);
                }
                cmds
            }
        }
    }

    fn persisted_from(&self, change: &SelectionChange) -> PickerValue {
        if self.config.multiple {
            PickerValue::Many(change.values.clone())
        } else {
            PickerValue::Single(change.value.clone())
        }
    }

    // --- record create/edit ---

    /// Open a create dialog, discarding any unsaved operation
    pub fn begin_create(&mut self) {
        self.sync.begin_create();
    }

    /// Open an edit dialog for `target`, discarding any unsaved operation
    ///
    /// When a fetch endpoint is configured the canonical record data is
    /// requested to pre-fill the form; a failed fetch leaves it blank.
    pub fn begin_edit(&mut self, target: &str) -> Vec<Command> {
        self.sync.begin_edit(target);
        match self.config.remote.as_ref().and_then(|r| r.fetch_url.clone()) {
            Some(url) => vec![Command::FetchRecord {
                url,
                target: target.to_string(),
            }],
            None => Vec::new(),
        }
    }

    /// Drop the open create/edit operation (modal cancelled)
    pub fn discard_pending(&mut self) {
        self.sync.discard();
    }

    #[must_use]
    pub fn pending_operation(&self) -> Option<&PendingOperation> {
        self.sync.pending()
    }

    /// Submit the open operation with the given form contents
    ///
    /// # Errors
    ///
    /// Fails when no operation is open or the required endpoint is not
    /// configured. A second submit while one is in flight is dropped and
    /// returns no commands.
    pub fn submit(&mut self, form: FormData) -> Result<Vec<Command>, PickerError> {
        let pending = self
            .sync
            .pending()
            .ok_or(PickerError::Sync(SyncError::NoPendingOperation))?;
        let url = match &pending.kind {
            OperationKind::Create => self
                .config
                .remote
                .as_ref()
                .and_then(|r| r.create_url.clone())
                .ok_or(PickerError::Sync(SyncError::MissingEndpoint("create")))?,
            OperationKind::Edit { .. } => self
                .config
                .remote
                .as_ref()
                .and_then(|r| r.update_url.clone())
                .ok_or(PickerError::Sync(SyncError::MissingEndpoint("update")))?,
        };

        match self.sync.submit(form)? {
            None => Ok(Vec::new()),
            Some(submission) => Ok(vec![match submission.kind {
                OperationKind::Create => Command::CreateRecord {
                    url,
                    form: submission.form,
                },
                OperationKind::Edit { target } => Command::UpdateRecord {
                    url,
                    target,
                    form: submission.form,
                },
            }]),
        }
    }

    /// A create/update issued via [`Command::CreateRecord`] /
    /// [`Command::UpdateRecord`] completed
    pub fn handle_record_response(
        &mut self,
        result: Result<RecordResponse, FetchError>,
    ) -> Vec<Command> {
        let response = match result {
            Ok(response) => response,
            Err(error) => {
                warn!(%error, "record submission failed");
                self.sync.submit_failed();
                return Vec::new();
            }
        };
        match self.sync.resolve(&response) {
            SubmitResult::Saved { kind, record } => self.merge_saved(kind, record),
            SubmitResult::Rejected(failure) => vec![Command::ReportValidation(failure)],
            SubmitResult::Stale => Vec::new(),
        }
    }

    /// A record fetch issued via [`Command::FetchRecord`] completed
    pub fn handle_record_fetch(
        &mut self,
        target: &str,
        result: Result<RecordFields, FetchError>,
    ) -> Vec<Command> {
        match result {
            Ok(fields) => {
                self.sync.prefill(target, fields.data);
            }
            Err(error) => {
                warn!(%error, target, "record fetch failed");
                self.sync.prefill_failed(target);
            }
        }
        Vec::new()
    }

    fn merge_saved(&mut self, kind: OperationKind, record: Option<RecordData>) -> Vec<Command> {
        let Some(record) = record else {
            return Vec::new();
        };
        match kind {
            OperationKind::Create => {
                self.store
                    .upsert(OptionEntry::new(record.value.clone(), record.label));
                let outcome = self.selector.select(&mut self.store, &record.value);
                self.after_selection(outcome)
            }
            OperationKind::Edit { target } => {
                if let Some(existing) = self.store.find(&target) {
                    let mut updated = existing.clone();
                    updated.label = record.label;
                    self.store.upsert(updated);
                }
                Vec::new()
            }
        }
    }

    // --- views ---

    /// Options the host should render, in order
    ///
    /// Remote pickers show what the server returned for the active query;
    /// local pickers show the filtered list cut to the reveal window.
    #[must_use]
    pub fn visible_options(&self) -> Vec<&OptionEntry> {
        if self.config.is_remote() {
            self.store.entries().iter().collect()
        } else {
            let matching = self.store.filter(&self.local_query);
            let window = self.pages.visible_window(matching.len());
            matching.into_iter().take(window).collect()
        }
    }

    /// Selected entries in selection order
    #[must_use]
    pub fn selected_options(&self) -> Vec<&OptionEntry> {
        self.store.selected_options()
    }

    fn push_fetch(&self, cmds: &mut Vec<Command>, fetch: IssuedFetch) {
        let Some(remote) = self.config.remote.as_ref() else {
            return;
        };
        if let Some(previous) = fetch.supersedes {
            cmds.push(Command::AbortFetch(previous));
        }
        cmds.push(Command::Fetch(FetchSpec {
            seq: fetch.seq,
            url: remote.search_url.clone(),
            page: fetch.page,
            search: fetch.query,
        }));
    }
}
