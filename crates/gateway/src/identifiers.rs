//! Newtype domain identifiers.
//!
//! Every name that the gateway admin API addresses is represented as a
//! distinct newtype wrapping a `String`. This prevents accidentally passing a
//! [`DocumentId`] where a [`RevisionId`] is expected even though both travel
//! as plain path segments or query values on the wire.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Macro for String-wrapped newtypes.
// Generates: struct, new() returning Option<Self>, as_str(), Display, FromStr.
// ---------------------------------------------------------------------------
macro_rules! string_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier, returning `None` if the value is empty.
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let v = value.into();
                if v.is_empty() { None } else { Some(Self(v)) }
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = crate::ConsoleError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s).ok_or(crate::ConsoleError::InvalidIdentifier {
                    kind: stringify!($name),
                    value: s.to_owned(),
                })
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Identifiers, server-side names
// ---------------------------------------------------------------------------

string_id! {
    /// Names a database hosted by the gateway (e.g. `"travel-sample"`).
    DatabaseName
}

string_id! {
    /// Identifies a JSON document within a database.
    DocumentId
}

string_id! {
    /// Names a user account scoped to one database.
    UserName
}

string_id! {
    /// Names an attachment stored on a document.
    AttachmentName
}

string_id! {
    /// Identifies one revision of a document, in `"<generation>-<digest>"` form
    /// (e.g. `"3-a1b2c3"`).
    RevisionId
}

// ---------------------------------------------------------------------------
// Identifiers, UUID-backed (internally generated)
// ---------------------------------------------------------------------------

/// Identifies a single request issued through the request adapter.
///
/// Generated fresh for every handle; recorded on the request span so the
/// settlement, cancellation, and abort events of one request can be
/// correlated in the logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Generates a new random request identifier.
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
