//! Core domain for gwadmin, the gateway admin console.
//!
//! This crate contains every newtype identifier, request outcome type, and
//! error type used throughout the console. Infrastructure crates issue the
//! HTTP requests; they report their results in the types defined here.
//!
//! ## Architectural Layer
//!
//! **Domain types.** This crate has no I/O dependencies. It defines *what*
//! a request outcome looks like; the `request` crate defines *how* one is
//! produced and cancelled.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype identifiers (`DatabaseName`, `DocumentId`, `RequestId`, etc.) |
//! | [`types`] | Outcomes (`Response`, `Phase`) and bodies (`ChangesParams`, `UserInfo`, `DocsPage`, etc.) |
//! | [`errors`] | `RequestError` taxonomy and `ConsoleError` |

pub mod errors;
pub mod identifiers;
pub mod types;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use errors::{ConsoleError, RequestError};
pub use identifiers::{AttachmentName, DatabaseName, DocumentId, RequestId, RevisionId, UserName};
pub use types::{
    is_success_status, strip_revision_metadata, Attachment, ChangesBatch, ChangesParams, DocsPage,
    FeedMode, Outcome, Phase, Response, UserInfo,
};
