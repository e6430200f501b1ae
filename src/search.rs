//! Debounced query handling and the stale-work discard discipline
//!
//! `SearchController` is a small state machine over
//! `{Idle, Debouncing, Fetching, Settled}`. Keystrokes restart a debounce
//! timer identified by a generation token; expiries carrying a stale token
//! are ignored, which is how "cancel the pending timer" is expressed
//! without the engine owning a clock. Remote fetches are tagged with a
//! monotonically increasing sequence number shared between search and
//! pagination; only the latest issued sequence is ever applied.

use std::time::Duration;
use tracing::debug;

/// Generation counter identifying one scheduled debounce timer
pub type DebounceToken = u64;

/// Monotonically increasing tag for one issued fetch
pub type RequestSeq = u64;

/// Phase of the search machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchPhase {
    #[default]
    Idle,
    /// A keystroke arrived; the debounce timer is running
    Debouncing,
    /// A remote request is in flight
    Fetching,
    /// The latest query has been resolved (locally or remotely)
    Settled,
}

/// Timer the host must schedule after a keystroke
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Debounce {
    pub token: DebounceToken,
    pub delay: Duration,
}

/// A fetch the engine decided to issue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedFetch {
    pub seq: RequestSeq,
    pub query: String,
    pub page: u32,
    /// Sequence number of the request this one supersedes, if one was
    /// still in flight
    pub supersedes: Option<RequestSeq>,
}

/// What a debounce expiry resolved to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchAction {
    /// No remote source: filter the option store synchronously
    FilterLocal { query: String },
    /// Remote source: issue the page-1 request described here
    Fetch(IssuedFetch),
}

/// Debounce + sequencing state for one picker's search box
#[derive(Debug)]
pub struct SearchController {
    phase: SearchPhase,
    query: String,
    remote: bool,
    debounce_delay: Duration,
    min_query_len: usize,
    debounce_gen: DebounceToken,
    seq: RequestSeq,
    in_flight: Option<RequestSeq>,
}

impl SearchController {
    #[must_use]
    pub fn new(remote: bool, debounce_delay: Duration, min_query_len: usize) -> Self {
        Self {
            phase: SearchPhase::Idle,
            query: String::new(),
            remote,
            debounce_delay,
            min_query_len,
            debounce_gen: 0,
            seq: 0,
            in_flight: None,
        }
    }

    #[must_use]
    pub const fn phase(&self) -> SearchPhase {
        self.phase
    }

    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    #[must_use]
    pub const fn in_flight(&self) -> Option<RequestSeq> {
        self.in_flight
    }

    /// Record a keystroke and restart the debounce timer
    ///
    /// Returns the timer the host must schedule. Bumping the generation
    /// invalidates any timer scheduled earlier. An edit that leaves the
    /// text unchanged is ignored.
    pub fn input(&mut self, text: &str) -> Option<Debounce> {
        if text == self.query {
            return None;
        }
        self.query = text.to_string();
        self.debounce_gen += 1;
        self.phase = SearchPhase::Debouncing;
        Some(Debounce {
            token: self.debounce_gen,
            delay: self.debounce_delay,
        })
    }

    /// A debounce timer expired
    ///
    /// Stale tokens (superseded by a later keystroke) resolve to `None`.
    /// A cleared query on a remote picker reloads the initial unfiltered
    /// first page; a non-empty query below the minimum length issues
    /// nothing and leaves the previous result set standing.
    pub fn debounce_elapsed(&mut self, token: DebounceToken) -> Option<SearchAction> {
        if token != self.debounce_gen || self.phase != SearchPhase::Debouncing {
            debug!(token, current = self.debounce_gen, "ignoring stale debounce");
            return None;
        }

        if !self.remote {
            self.phase = SearchPhase::Settled;
            return Some(SearchAction::FilterLocal {
                query: self.query.clone(),
            });
        }

        if !self.query.is_empty() && self.query.chars().count() < self.min_query_len {
            debug!(min = self.min_query_len, "query below minimum length");
            self.phase = SearchPhase::Settled;
            return None;
        }

        let query = self.query.clone();
        Some(SearchAction::Fetch(self.issue(query, 1)))
    }

    /// Issue the initial unfiltered page-1 request, superseding anything
    /// in flight. Used on first open and on reopen after a search.
    pub fn reset_to_initial(&mut self) -> IssuedFetch {
        self.query.clear();
        self.debounce_gen += 1;
        self.issue(String::new(), 1)
    }

    /// Issue a follow-up page request for the current query
    pub fn issue_page(&mut self, page: u32) -> IssuedFetch {
        let query = self.query.clone();
        self.issue(query, page)
    }

    fn issue(&mut self, query: String, page: u32) -> IssuedFetch {
        self.seq += 1;
        let supersedes = self.in_flight.replace(self.seq);
        self.phase = SearchPhase::Fetching;
        IssuedFetch {
            seq: self.seq,
            query,
            page,
            supersedes,
        }
    }

    /// A response (or failure) arrived for `seq`
    ///
    /// Returns `true` when the response belongs to the latest issued
    /// request and must be applied; stale responses are discarded.
    pub fn resolve(&mut self, seq: RequestSeq) -> bool {
        if self.in_flight == Some(seq) {
            self.in_flight = None;
            self.phase = SearchPhase::Settled;
            true
        } else {
            debug!(seq, latest = self.seq, "discarding stale response");
            false
        }
    }

    /// Drop query state without issuing anything (picker closed)
    pub fn reset(&mut self) {
        self.query.clear();
        self.debounce_gen += 1;
        self.phase = SearchPhase::Idle;
    }
}
