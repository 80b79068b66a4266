//! Fetch-style transport: one call with `(url, options)`, no native abort.

use async_trait::async_trait;
use gateway::Outcome;
use reqwest::{Client, Method, Url};
use serde::Serialize;

use crate::handle::{wrap, RequestHandle};
use crate::transport::{perform, Transport};

/// Method, headers, and body of a fetch-style request.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    method: Method,
    headers: Vec<(String, String)>,
    body: Option<Result<Vec<u8>, String>>,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            method: Method::GET,
            headers: Vec::new(),
            body: None,
        }
    }
}

impl FetchOptions {
    /// Options for a bodiless request with the given method.
    pub fn method(method: Method) -> Self {
        Self {
            method,
            ..Self::default()
        }
    }

    /// Adds a request header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Sets a JSON body and the matching `Content-Type`.
    ///
    /// A body that fails to serialise is reported as a transport error when
    /// the request starts.
    pub fn with_json<B: Serialize + ?Sized>(mut self, body: &B) -> Self {
        self.body = Some(serde_json::to_vec(body).map_err(|err| err.to_string()));
        self.with_header("Content-Type", "application/json")
    }

    /// Sets a raw body.
    pub fn with_bytes(mut self, body: Vec<u8>) -> Self {
        self.body = Some(Ok(body));
        self
    }
}

/// A transport that issues one request and reports the response.
///
/// Has no native abort: after a cancellation the request still runs to
/// completion and its outcome is discarded.
#[derive(Debug, Clone)]
pub struct FetchTransport {
    client: Client,
    url: Url,
    options: FetchOptions,
}

impl FetchTransport {
    /// Creates a transport for `url` with the given options.
    pub fn new(client: Client, url: Url, options: FetchOptions) -> Self {
        Self {
            client,
            url,
            options,
        }
    }
}

#[async_trait]
impl Transport for FetchTransport {
    async fn start(&self) -> Outcome {
        let options = &self.options;
        perform(
            &self.client,
            &options.method,
            &self.url,
            &options.headers,
            options.body.as_ref(),
        )
        .await
    }

    fn describe(&self) -> String {
        format!("{} {}", self.options.method, self.url)
    }
}

/// Issues a fetch-style request and returns its handle.
pub fn fetch(client: &Client, url: Url, options: FetchOptions) -> RequestHandle {
    wrap(FetchTransport::new(client.clone(), url, options))
}
