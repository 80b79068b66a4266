//! gwadmin gateway admin REST client.
//!
//! [`GatewayClient`] exposes one method per admin endpoint the console uses:
//! databases, documents and revisions, attachments, users, and the change
//! feed. Every method returns a [`request::RequestHandle`] so callers can
//! await or cancel any call the same way. [`ChangesFollower`] tails a change
//! feed with consecutive abortable longpolls.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** URL construction and endpoint selection live here;
//! transport and cancellation live in [`request`]; bodies and outcomes are
//! [`gateway`] types.

pub mod client;
pub mod errors;
pub mod follower;
pub mod path;

pub use client::{ClientSettings, GatewayClient};
pub use errors::{ClientBuildError, FollowError};
pub use follower::{ChangesFollower, FollowOptions};
pub use path::{Query, ServerUrl};
