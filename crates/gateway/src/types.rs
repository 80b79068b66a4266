//! Shared value types for the gateway admin console.
//!
//! Unlike the newtype identifiers in [`crate::identifiers`], these types carry
//! request outcomes and request/response bodies. Bodies the console does not
//! interpret are kept as [`serde_json::Value`] and passed through unmodified.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{DocumentId, RequestError};

// ---------------------------------------------------------------------------
// Request outcomes
// ---------------------------------------------------------------------------

/// Successful outcome of a request.
///
/// `data` is `None` when the response declared success but its body could
/// not be parsed as JSON (or was empty); that is not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// Parsed response body.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// HTTP status code (always within `200..=299`).
    pub status: u16,
}

impl Response {
    /// Creates a response carrying a parsed body.
    pub fn with_data(data: Value, status: u16) -> Self {
        Self { data: Some(data), status }
    }

    /// Creates a response with no body.
    pub fn status_only(status: u16) -> Self {
        Self { data: None, status }
    }
}

/// The single terminal result of a request handle.
pub type Outcome = Result<Response, RequestError>;

/// Returns `true` if `status` is in the success range `200..=299`.
pub fn is_success_status(status: u16) -> bool {
    (200..300).contains(&status)
}

// ---------------------------------------------------------------------------

/// Settlement state of a request handle.
///
/// Transitions are one-shot: `Pending` moves to exactly one of the other
/// three states and never changes again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// The request has been issued and has not settled.
    Pending,
    /// The request succeeded.
    Resolved,
    /// The request failed with a transport or application error.
    Failed,
    /// The caller cancelled the request before it settled.
    Canceled,
}

impl Phase {
    /// Returns the terminal phase that corresponds to `outcome`.
    pub fn of(outcome: &Outcome) -> Self {
        match outcome {
            Ok(_) => Self::Resolved,
            Err(RequestError::Canceled) => Self::Canceled,
            Err(_) => Self::Failed,
        }
    }

    /// Returns `true` once the handle has settled.
    pub fn is_final(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

// ---------------------------------------------------------------------------
// Documents
// ---------------------------------------------------------------------------

/// Returns a copy of a document body without its `_id` and `_rev` metadata.
///
/// The revision being replaced is addressed through the URL, so the body of
/// an update must not carry its own copy of either field.
pub fn strip_revision_metadata(doc: &Value) -> Value {
    match doc {
        Value::Object(fields) => Value::Object(
            fields
                .iter()
                .filter(|(k, _)| k.as_str() != "_id" && k.as_str() != "_rev")
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// A binary attachment to upload onto a document revision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// Attachment name; becomes the last path segment of the upload URL.
    pub name: crate::AttachmentName,
    /// MIME type sent as `Content-Type`, if known.
    pub content_type: Option<String>,
    /// Raw attachment bytes.
    pub bytes: Vec<u8>,
}

// ---------------------------------------------------------------------------

/// One page of an `_all_docs` listing.
///
/// Pages are fetched with `limit = page_size + 1`; the extra row, when
/// present, is not part of the page and only supplies the start key of the
/// next page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocsPage {
    /// Rows belonging to this page (at most `page_size`).
    pub rows: Vec<Value>,
    /// Start key for the following page; `None` on the last page.
    pub next_startkey: Option<DocumentId>,
    /// Total number of rows reported by the server, if any.
    pub total_rows: Option<u64>,
}

impl DocsPage {
    /// Splits an `_all_docs` response body into a page of `page_size` rows.
    ///
    /// A body without a `rows` array yields an empty last page.
    pub fn from_all_docs(data: &Value, page_size: usize) -> Self {
        let mut rows = data
            .get("rows")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        let next_startkey = if rows.len() > page_size {
            let extra = rows.split_off(page_size);
            extra.first().and_then(row_key)
        } else {
            None
        };

        Self {
            rows,
            next_startkey,
            total_rows: data.get("total_rows").and_then(Value::as_u64),
        }
    }
}

fn row_key(row: &Value) -> Option<DocumentId> {
    row.get("key")
        .or_else(|| row.get("id"))
        .and_then(Value::as_str)
        .and_then(DocumentId::new)
}

// ---------------------------------------------------------------------------
// Change feed
// ---------------------------------------------------------------------------

/// How the server should deliver a `_changes` response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedMode {
    /// Return the changes available now and close.
    Normal,
    /// Hold the request open until at least one change is available (or
    /// the server-side timeout elapses).
    Longpoll,
}

/// Body of a `POST /{db}/_changes` request.
///
/// Unset fields are omitted so the server applies its own defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChangesParams {
    /// Delivery mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feed: Option<FeedMode>,
    /// Sequence to start after; numeric or opaque string depending on the server.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub since: Option<Value>,
    /// Maximum number of results.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    /// Embed document bodies in the results.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_docs: Option<bool>,
    /// `"all_docs"` to report conflicting revisions, `"main_only"` otherwise.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    /// Omit deleted and removed documents.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_only: Option<bool>,
    /// Server-side filter name (e.g. `"sync_gateway/bychannel"`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    /// Comma-separated channel list for the channel filter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channels: Option<String>,
    /// Heartbeat interval in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heartbeat: Option<u64>,
    /// Server-side longpoll timeout in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
}

/// One batch of results read from the change feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangesBatch {
    /// Change entries, passed through as returned by the server.
    pub results: Vec<Value>,
    /// Sequence to resume from.
    pub last_seq: Value,
    /// When the batch was received.
    #[serde(skip_deserializing, default = "Utc::now")]
    pub received_at: DateTime<Utc>,
}

impl ChangesBatch {
    /// Reads a batch from a `_changes` response body.
    ///
    /// Returns `None` if the body has no `results` array.
    pub fn from_response(data: &Value) -> Option<Self> {
        let results = data.get("results")?.as_array()?.clone();
        Some(Self {
            results,
            last_seq: data.get("last_seq").cloned().unwrap_or(Value::Null),
            received_at: Utc::now(),
        })
    }

    /// Returns `true` if the batch carries no change entries.
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

/// Body of a user create/update request, and the user record returned by
/// the server.
///
/// Fields the console does not model are preserved in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserInfo {
    /// Account name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Password; write-only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Channels granted explicitly by an administrator.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_channels: Option<Vec<String>>,
    /// Roles granted explicitly by an administrator.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_roles: Option<Vec<String>>,
    /// Contact address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Disabled accounts cannot authenticate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disabled: Option<bool>,
    /// Any other fields, passed through unmodified.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
