//! The transport capability interface and the response interpretation
//! shared by every HTTP transport.

use async_trait::async_trait;
use gateway::{is_success_status, Outcome, RequestError, Response};
use reqwest::{Client, Method, Url};
use serde_json::Value;
use tracing::debug;

/// An asynchronous network operation that a [`crate::RequestHandle`] drives.
///
/// Implementations perform exactly one request per [`Transport::start`] call
/// and report its result as an [`Outcome`]. Transports with a native way to
/// drop an in-flight request expose it through [`Transport::abort`]; the
/// default is a transport with no native abort, whose late outcome is simply
/// discarded after a cancellation.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Performs the request and reports its outcome.
    async fn start(&self) -> Outcome;

    /// Drops the in-flight request, if the transport supports it.
    ///
    /// Called at most once per handle, and only when a cancellation wins the
    /// settlement.
    fn abort(&self) {}

    /// Returns `true` if [`Transport::abort`] actually interrupts the request.
    fn supports_abort(&self) -> bool {
        false
    }

    /// Short description for logs, usually `"<METHOD> <url>"`.
    fn describe(&self) -> String;
}

/// Sends one request and interprets the response.
///
/// `body` carries the serialised payload, or the reason serialisation failed;
/// a failed body rejects as a transport error without contacting the server.
pub(crate) async fn perform(
    client: &Client,
    method: &Method,
    url: &Url,
    headers: &[(String, String)],
    body: Option<&Result<Vec<u8>, String>>,
) -> Outcome {
    let mut request = client.request(method.clone(), url.clone());
    for (name, value) in headers {
        request = request.header(name.as_str(), value.as_str());
    }
    match body {
        Some(Ok(bytes)) => request = request.body(bytes.clone()),
        Some(Err(reason)) => {
            return Err(RequestError::Transport {
                message: format!("failed to serialise request body: {reason}"),
            })
        }
        None => {}
    }

    debug!(%method, %url, "Issuing request");
    match request.send().await {
        Ok(response) => interpret(response).await,
        Err(err) => Err(transport_failure(err)),
    }
}

/// Converts a completed HTTP response into an [`Outcome`].
///
/// - `2xx` with a JSON body resolves `{data, status}`.
/// - `2xx` whose body cannot be parsed resolves `{status}` with no data.
/// - Any other status rejects [`RequestError::Application`] with the status
///   reason phrase.
async fn interpret(response: reqwest::Response) -> Outcome {
    let status = response.status();
    let code = status.as_u16();

    if !is_success_status(code) {
        return Err(RequestError::Application {
            message: status.canonical_reason().unwrap_or("Unknown Status").to_owned(),
            status: code,
        });
    }

    match response.json::<Value>().await {
        Ok(data) => Ok(Response::with_data(data, code)),
        Err(err) => {
            debug!(status = code, error = %err, "Response body is not JSON; resolving without data");
            Ok(Response::status_only(code))
        }
    }
}

/// Maps a reqwest failure (connect, DNS, TLS, reset, invalid request) to a
/// transport error.
fn transport_failure(err: reqwest::Error) -> RequestError {
    RequestError::Transport {
        message: err.to_string(),
    }
}
