//! Chainable request-builder transport with native abort.
//!
//! ```no_run
//! # async fn run(client: reqwest::Client, url: reqwest::Url) {
//! use request::RequestBuilder;
//!
//! let handle = RequestBuilder::post(&client, url)
//!     .set("Content-Type", "application/json")
//!     .send(&serde_json::json!({ "since": 0 }))
//!     .end();
//! handle.cancel();
//! # }
//! ```

use async_trait::async_trait;
use gateway::{Outcome, RequestError};
use reqwest::{Client, Method, Url};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::handle::{wrap, RequestHandle};
use crate::transport::{perform, Transport};

/// Builds a request step by step and starts it with [`RequestBuilder::end`].
///
/// Calling [`RequestBuilder::abort`] (directly, or through the handle's
/// `cancel()`) drops the in-flight request and its connection.
#[derive(Debug)]
pub struct RequestBuilder {
    client: Client,
    method: Method,
    url: Url,
    headers: Vec<(String, String)>,
    body: Option<Result<Vec<u8>, String>>,
    abort: CancellationToken,
}

impl RequestBuilder {
    /// Starts building a request with the given method.
    pub fn new(client: &Client, method: Method, url: Url) -> Self {
        Self {
            client: client.clone(),
            method,
            url,
            headers: Vec::new(),
            body: None,
            abort: CancellationToken::new(),
        }
    }

    /// Starts building a `GET` request.
    pub fn get(client: &Client, url: Url) -> Self {
        Self::new(client, Method::GET, url)
    }

    /// Starts building a `POST` request.
    pub fn post(client: &Client, url: Url) -> Self {
        Self::new(client, Method::POST, url)
    }

    /// Starts building a `PUT` request.
    pub fn put(client: &Client, url: Url) -> Self {
        Self::new(client, Method::PUT, url)
    }

    /// Starts building a `DELETE` request.
    pub fn delete(client: &Client, url: Url) -> Self {
        Self::new(client, Method::DELETE, url)
    }

    /// Sets a request header, replacing an earlier value for the same name.
    pub fn set(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        self.headers.retain(|(n, _)| !n.eq_ignore_ascii_case(&name));
        self.headers.push((name, value.into()));
        self
    }

    /// Sets a JSON body.
    ///
    /// `Content-Type: application/json` is added unless a content type was
    /// already set. A body that fails to serialise is reported as a
    /// transport error when the request starts.
    pub fn send<B: Serialize + ?Sized>(mut self, body: &B) -> Self {
        self.body = Some(serde_json::to_vec(body).map_err(|err| err.to_string()));
        if !self.has_header("content-type") {
            self = self.set("Content-Type", "application/json");
        }
        self
    }

    /// Starts the request and returns its handle.
    pub fn end(self) -> RequestHandle {
        wrap(self)
    }

    /// Drops the request if it is in flight; prevents it from starting
    /// otherwise. Idempotent.
    pub fn abort(&self) {
        if !self.abort.is_cancelled() {
            self.abort.cancel();
            debug!(method = %self.method, url = %self.url, "Request aborted");
        }
    }

    fn has_header(&self, name: &str) -> bool {
        self.headers.iter().any(|(n, _)| n.eq_ignore_ascii_case(name))
    }

    async fn execute(&self) -> Outcome {
        perform(
            &self.client,
            &self.method,
            &self.url,
            &self.headers,
            self.body.as_ref(),
        )
        .await
    }
}

#[async_trait]
impl Transport for RequestBuilder {
    async fn start(&self) -> Outcome {
        tokio::select! {
            biased;
            () = self.abort.cancelled() => Err(RequestError::Canceled),
            outcome = self.execute() => outcome,
        }
    }

    fn abort(&self) {
        RequestBuilder::abort(self);
    }

    fn supports_abort(&self) -> bool {
        true
    }

    fn describe(&self) -> String {
        format!("{} {}", self.method, self.url)
    }
}
