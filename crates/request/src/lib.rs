//! gwadmin cancellable request adapter.
//!
//! Presents two different HTTP transport styles through one contract:
//!
//! - [`FetchTransport`] / [`fetch`]: a fetch-like call with `(url, options)`.
//!   Has no native abort; a cancelled request runs to completion and its
//!   outcome is discarded.
//! - [`RequestBuilder`]: a chainable builder (`set`, `send`, `end`, `abort`).
//!   Cancelling drops the in-flight request.
//!
//! Both are started through [`wrap`], which returns a [`RequestHandle`]: a
//! future resolving to one [`gateway::Outcome`] plus a `cancel()` method.
//!
//! ## Settlement
//!
//! A handle settles exactly once, as `Resolved`, `Failed` or `Canceled`.
//! A cancellation that happens before the transport's outcome is delivered
//! always wins; a cancellation after settlement changes nothing. Nothing is
//! retried, and every failure is a [`gateway::RequestError`] value.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** All HTTP transport and response interpretation live
//! here. The [`gateway`] crate sees only outcomes.

mod builder;
mod fetch;
mod handle;
mod settlement;
mod transport;

pub use builder::RequestBuilder;
pub use fetch::{fetch, FetchOptions, FetchTransport};
pub use handle::{wrap, Canceller, Promise, RequestHandle};
pub use transport::Transport;

// Re-exported so callers can build URLs and clients without a direct reqwest dependency.
pub use reqwest::{Client, Method, Url};
