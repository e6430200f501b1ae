//! Wire contracts for the remote option source and record endpoints
//!
//! The engine never performs transport itself. It emits fully-described
//! requests ([`FetchSpec`] and the record commands) and the host feeds the
//! decoded bodies back in. The types here are the JSON contracts, with
//! camelCase field names matching the endpoints.

use crate::OptionEntry;
use crate::search::RequestSeq;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Field name → value map exchanged with the record endpoints
pub type FormData = BTreeMap<String, String>;

/// Field name → error messages, as returned by failed validation
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// One page of the remote option list
///
/// `GET <search_url>?page=<n>&search=<query>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemotePage {
    pub data: Vec<OptionEntry>,
    pub has_more: bool,
    pub current_page: u32,
}

impl RemotePage {
    /// Decode a raw response body
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Decode`] on a malformed payload.
    pub fn from_json(body: &str) -> Result<Self, FetchError> {
        serde_json::from_str(body).map_err(Into::into)
    }
}

/// Canonical record returned by a successful create/update
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordData {
    pub value: String,
    pub label: String,
}

/// Response of the create (`POST`) and update (`PUT`) endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordResponse {
    pub success: bool,
    #[serde(default)]
    pub data: Option<RecordData>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub errors: FieldErrors,
}

impl RecordResponse {
    /// Decode a raw response body
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Decode`] on a malformed payload.
    pub fn from_json(body: &str) -> Result<Self, FetchError> {
        serde_json::from_str(body).map_err(Into::into)
    }

    /// The validation payload of a rejected submission, if this response
    /// is one
    #[must_use]
    pub fn validation_failure(&self) -> Option<ValidationFailure> {
        if self.success {
            return None;
        }
        Some(ValidationFailure {
            message: self.message.clone(),
            errors: self.errors.clone(),
        })
    }
}

/// Response of the record-fetch endpoint used to pre-fill an edit form
///
/// `GET <fetch_url>?id=<value>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordFields {
    pub data: FormData,
}

/// Field-level and general messages of a rejected create/update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationFailure {
    pub message: Option<String>,
    pub errors: FieldErrors,
}

/// One option-list request the host must perform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchSpec {
    pub seq: RequestSeq,
    pub url: String,
    pub page: u32,
    pub search: String,
}

/// Why a request could not be completed by the host
///
/// Handed back into the engine through the `handle_*` entry points; the
/// engine recovers by leaving prior state untouched.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request never completed (connection refused, timeout, abort)
    #[error("request failed: {0}")]
    Transport(String),
    /// The endpoint answered with a non-success status
    #[error("endpoint returned HTTP status {0}")]
    Status(u16),
    /// The body did not match the wire contract
    #[error("malformed response payload: {0}")]
    Decode(#[from] serde_json::Error),
}
