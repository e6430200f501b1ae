//! Create/edit round trips against the record endpoints
//!
//! One `RecordSync` tracks at most one pending operation at a time, moving
//! it through `Idle → Submitting → (Succeeded | Failed) → Idle`. Success
//! hands the canonical record back to the engine for merging; failure
//! keeps the operation (and the user's form input) open for correction.

use crate::remote::{FormData, RecordData, RecordResponse, ValidationFailure};
use thiserror::Error;
use tracing::{debug, warn};

/// Guards for caller mistakes around record submission
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SyncError {
    #[error("no create/edit operation is open")]
    NoPendingOperation,

    #[error("no {0} endpoint is configured")]
    MissingEndpoint(&'static str),
}

/// What a pending operation is doing to the record set
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationKind {
    Create,
    Edit { target: String },
}

/// Phase of the open operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncPhase {
    /// Open, editable, nothing in flight
    #[default]
    Idle,
    /// A create/update request is in flight
    Submitting,
    /// The last submission was rejected; `error` holds the payload
    Failed,
}

/// The one open create/edit operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingOperation {
    pub kind: OperationKind,
    /// Last known form contents: pre-filled on edit, captured on submit.
    /// Never cleared on failure.
    pub form: FormData,
    pub phase: SyncPhase,
    /// Validation payload of the last rejected submission
    pub error: Option<ValidationFailure>,
}

impl PendingOperation {
    fn new(kind: OperationKind) -> Self {
        Self {
            kind,
            form: FormData::new(),
            phase: SyncPhase::Idle,
            error: None,
        }
    }

    /// Value identifying the edited record, if this is an edit
    #[must_use]
    pub fn target(&self) -> Option<&str> {
        match &self.kind {
            OperationKind::Edit { target } => Some(target),
            OperationKind::Create => None,
        }
    }
}

/// A submission the engine must turn into a network command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub kind: OperationKind,
    pub form: FormData,
}

/// How an accepted record response resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitResult {
    /// The server accepted and returned the canonical record
    Saved {
        kind: OperationKind,
        record: Option<RecordData>,
    },
    /// Validation failed; the operation stays open
    Rejected(ValidationFailure),
    /// No matching submission is in flight; the response is dropped
    Stale,
}

/// Record round-trip state for one picker
#[derive(Debug, Default)]
pub struct RecordSync {
    pending: Option<PendingOperation>,
}

impl RecordSync {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn pending(&self) -> Option<&PendingOperation> {
        self.pending.as_ref()
    }

    /// Open a create operation, discarding any unsaved one
    pub fn begin_create(&mut self) -> &PendingOperation {
        self.begin(OperationKind::Create)
    }

    /// Open an edit operation for `target`, discarding any unsaved one
    pub fn begin_edit(&mut self, target: &str) -> &PendingOperation {
        self.begin(OperationKind::Edit {
            target: target.to_string(),
        })
    }

    fn begin(&mut self, kind: OperationKind) -> &PendingOperation {
        if let Some(previous) = self.pending.take() {
            debug!(?previous.kind, "discarding unsaved operation");
        }
        self.pending.insert(PendingOperation::new(kind))
    }

    /// Drop the open operation (modal cancelled or closed)
    pub fn discard(&mut self) {
        self.pending = None;
    }

    /// Apply fetched record data to the open edit form
    ///
    /// Ignored when the open operation no longer targets `target`.
    /// Returns whether the data was applied.
    pub fn prefill(&mut self, target: &str, data: FormData) -> bool {
        match &mut self.pending {
            Some(op) if op.target() == Some(target) && op.phase == SyncPhase::Idle => {
                op.form = data;
                true
            }
            _ => {
                debug!(target, "dropping prefill for a closed edit");
                false
            }
        }
    }

    /// The pre-fill fetch failed; the form stays blank and submission is
    /// not blocked
    pub fn prefill_failed(&mut self, target: &str) {
        warn!(target, "record fetch failed, leaving edit form blank");
    }

    /// Capture the form and move to `Submitting`
    ///
    /// A second submit while one is in flight is dropped (returns `None`).
    ///
    /// # Errors
    ///
    /// [`SyncError::NoPendingOperation`] when no operation is open.
    pub fn submit(&mut self, form: FormData) -> Result<Option<Submission>, SyncError> {
        let op = self.pending.as_mut().ok_or(SyncError::NoPendingOperation)?;
        if op.phase == SyncPhase::Submitting {
            debug!("submission already in flight, dropping");
            return Ok(None);
        }
        op.form = form.clone();
        op.phase = SyncPhase::Submitting;
        op.error = None;
        Ok(Some(Submission {
            kind: op.kind.clone(),
            form,
        }))
    }

    /// The in-flight submission failed at the transport level
    ///
    /// The operation stays open and editable; nothing else changes.
    pub fn submit_failed(&mut self) {
        if let Some(op) = self.pending.as_mut()
            && op.phase == SyncPhase::Submitting
        {
            op.phase = SyncPhase::Idle;
        }
    }

    /// Resolve the in-flight submission with the server's answer
    pub fn resolve(&mut self, response: &RecordResponse) -> SubmitResult {
        let Some(op) = self.pending.as_mut() else {
            return SubmitResult::Stale;
        };
        if op.phase != SyncPhase::Submitting {
            debug!("record response without matching submission, dropping");
            return SubmitResult::Stale;
        }

        if let Some(failure) = response.validation_failure() {
            op.phase = SyncPhase::Failed;
            op.error = Some(failure.clone());
            return SubmitResult::Rejected(failure);
        }

        let kind = op.kind.clone();
        if response.data.is_none() {
            warn!(?kind, "successful record response without record data");
        }
        self.pending = None;
        SubmitResult::Saved {
            kind,
            record: response.data.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(pairs: &[(&str, &str)]) -> FormData {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn accepted(value: &str, label: &str) -> RecordResponse {
        RecordResponse {
            success: true,
            data: Some(RecordData {
                value: value.to_string(),
                label: label.to_string(),
            }),
            message: None,
            errors: Default::default(),
        }
    }

    fn rejected(field: &str, msg: &str) -> RecordResponse {
        RecordResponse {
            success: false,
            data: None,
            message: None,
            errors: [(field.to_string(), vec![msg.to_string()])].into(),
        }
    }

    #[test]
    fn test_begin_discards_previous_operation() {
        let mut sync = RecordSync::new();
        sync.begin_create();
        sync.submit(form(&[("name", "A")])).unwrap();

        sync.begin_edit("7");

        let op = sync.pending().unwrap();
        assert_eq!(op.target(), Some("7"));
        assert_eq!(op.phase, SyncPhase::Idle);
        assert!(op.form.is_empty());
    }

    #[test]
    fn test_submit_requires_open_operation() {
        let mut sync = RecordSync::new();
        assert_eq!(
            sync.submit(form(&[])).unwrap_err(),
            SyncError::NoPendingOperation
        );
    }

    #[test]
    fn test_second_submit_in_flight_is_dropped() {
        let mut sync = RecordSync::new();
        sync.begin_create();

        assert!(sync.submit(form(&[("name", "A")])).unwrap().is_some());
        assert!(sync.submit(form(&[("name", "B")])).unwrap().is_none());

        // the captured form is still the first submission's
        assert_eq!(sync.pending().unwrap().form["name"], "A");
    }

    #[test]
    fn test_success_closes_operation_and_returns_record() {
        let mut sync = RecordSync::new();
        sync.begin_create();
        sync.submit(form(&[("name", "X")])).unwrap();

        let result = sync.resolve(&accepted("42", "X"));

        assert_eq!(
            result,
            SubmitResult::Saved {
                kind: OperationKind::Create,
                record: Some(RecordData {
                    value: "42".to_string(),
                    label: "X".to_string(),
                }),
            }
        );
        assert!(sync.pending().is_none());
    }

    #[test]
    fn test_rejection_keeps_operation_and_form_open() {
        let mut sync = RecordSync::new();
        sync.begin_edit("42");
        sync.submit(form(&[("name", "")])).unwrap();

        let result = sync.resolve(&rejected("name", "required"));

        let SubmitResult::Rejected(failure) = result else {
            panic!("expected rejection");
        };
        assert_eq!(failure.errors["name"], vec!["required".to_string()]);

        let op = sync.pending().unwrap();
        assert_eq!(op.phase, SyncPhase::Failed);
        assert_eq!(op.form["name"], "");
        assert!(op.error.is_some());

        // the user may correct and retry
        assert!(sync.submit(form(&[("name", "Y")])).unwrap().is_some());
        assert!(sync.pending().unwrap().error.is_none());
    }

    #[test]
    fn test_response_after_discard_is_stale() {
        let mut sync = RecordSync::new();
        sync.begin_create();
        sync.submit(form(&[])).unwrap();
        sync.discard();

        assert_eq!(sync.resolve(&accepted("1", "One")), SubmitResult::Stale);
    }

    #[test]
    fn test_response_without_submission_is_stale() {
        let mut sync = RecordSync::new();
        sync.begin_create();

        assert_eq!(sync.resolve(&accepted("1", "One")), SubmitResult::Stale);
    }

    #[test]
    fn test_prefill_applies_only_to_matching_idle_edit() {
        let mut sync = RecordSync::new();
        sync.begin_edit("42");

        assert!(sync.prefill("42", form(&[("name", "Ada")])));
        assert_eq!(sync.pending().unwrap().form["name"], "Ada");

        // a late fetch for a different record is dropped
        assert!(!sync.prefill("7", form(&[("name", "Bob")])));

        // once submitting, late prefills no longer overwrite the form
        sync.submit(form(&[("name", "Ada L.")])).unwrap();
        assert!(!sync.prefill("42", form(&[("name", "stale")])));
        assert_eq!(sync.pending().unwrap().form["name"], "Ada L.");
    }

    #[test]
    fn test_transport_failure_reopens_for_retry() {
        let mut sync = RecordSync::new();
        sync.begin_create();
        sync.submit(form(&[("name", "A")])).unwrap();

        sync.submit_failed();

        let op = sync.pending().unwrap();
        assert_eq!(op.phase, SyncPhase::Idle);
        assert_eq!(op.form["name"], "A");
    }
}
