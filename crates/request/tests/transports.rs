//! Both transports driven against a real HTTP server.

mod support;

use std::time::Duration;

use gateway::{Phase, RequestError, Response};
use request::{fetch, Client, FetchOptions, Method, RequestBuilder};
use serde_json::json;
use support::{serve, Reply};

// ============================================================================
// Fetch-style transport
// ============================================================================

#[tokio::test]
async fn created_with_json_body_resolves_data_and_status() {
    let server = serve(vec![Reply::json(201, "Created", r#"{"ok":true}"#)]).await;

    let outcome = fetch(&Client::new(), server.url("db/"), FetchOptions::default()).await;

    assert_eq!(outcome, Ok(Response::with_data(json!({ "ok": true }), 201)));
}

#[tokio::test]
async fn not_found_without_body_rejects_with_reason_and_status() {
    let server = serve(vec![Reply::json(404, "Not Found", "")]).await;

    let outcome = fetch(&Client::new(), server.url("missing"), FetchOptions::default()).await;

    assert_eq!(
        outcome,
        Err(RequestError::Application {
            message: "Not Found".to_owned(),
            status: 404,
        })
    );
}

#[tokio::test]
async fn unparsable_success_body_resolves_status_only() {
    let server = serve(vec![Reply::json(200, "OK", "<html>not json</html>")]).await;

    let outcome = fetch(&Client::new(), server.url(""), FetchOptions::default()).await;

    assert_eq!(outcome, Ok(Response::status_only(200)));
}

#[tokio::test]
async fn connection_refused_rejects_with_transport_error() {
    // Bind then drop to obtain a port nobody listens on.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let url = reqwest::Url::parse(&format!("http://{addr}/")).unwrap();
    let outcome = fetch(&Client::new(), url, FetchOptions::default()).await;

    match outcome {
        Err(RequestError::Transport { message }) => assert!(!message.is_empty()),
        other => panic!("expected transport error, got {other:?}"),
    }
}

#[tokio::test]
async fn fetch_sends_method_headers_and_body() {
    let mut server = serve(vec![Reply::json(201, "Created", r#"{"id":"x"}"#)]).await;

    let options = FetchOptions::method(Method::POST).with_json(&json!({ "title": "t" }));
    let outcome = fetch(&Client::new(), server.url("db/"), options).await;
    assert!(outcome.is_ok());

    let recorded = server.next_request().await;
    assert_eq!(recorded.method, "POST");
    assert_eq!(recorded.target, "/db/");
    assert_eq!(recorded.header("content-type"), Some("application/json"));
    assert_eq!(recorded.json(), json!({ "title": "t" }));
}

#[tokio::test]
async fn cancel_while_in_flight_rejects_canceled() {
    let mut server = serve(vec![Reply::Hang]).await;

    let handle = fetch(&Client::new(), server.url("db"), FetchOptions::default());
    server.next_request().await;
    handle.cancel();

    assert_eq!(handle.phase(), Phase::Canceled);
    assert_eq!(handle.await, Err(RequestError::Canceled));
}

#[tokio::test]
async fn cancel_leaves_the_fetch_connection_open() {
    let mut server = serve(vec![Reply::Hang]).await;

    let (promise, canceller) =
        fetch(&Client::new(), server.url("db"), FetchOptions::default()).into_parts();
    server.next_request().await;
    canceller.cancel();

    assert_eq!(promise.await, Err(RequestError::Canceled));
    // No native abort: the request keeps running in the background.
    assert_eq!(server.hangup(Duration::from_millis(300)).await, None);
}

#[tokio::test]
async fn cancel_after_settlement_keeps_the_outcome() {
    let server = serve(vec![Reply::json(200, "OK", r#"{"db_name":"db"}"#)]).await;

    let (promise, canceller) =
        fetch(&Client::new(), server.url("db"), FetchOptions::default()).into_parts();
    let outcome = promise.await;
    canceller.cancel();

    assert_eq!(outcome, Ok(Response::with_data(json!({ "db_name": "db" }), 200)));
    assert_eq!(canceller.phase(), Phase::Resolved);
}

// ============================================================================
// Builder-style transport
// ============================================================================

#[tokio::test]
async fn builder_posts_json_and_resolves() {
    let mut server = serve(vec![Reply::json(
        200,
        "OK",
        r#"{"results":[],"last_seq":"5"}"#,
    )])
    .await;

    let outcome = RequestBuilder::post(&Client::new(), server.url("db/_changes"))
        .set("Content-Type", "application/json")
        .send(&json!({ "since": 4, "feed": "normal" }))
        .end()
        .await;

    assert_eq!(
        outcome,
        Ok(Response::with_data(json!({ "results": [], "last_seq": "5" }), 200))
    );
    let recorded = server.next_request().await;
    assert_eq!(recorded.method, "POST");
    assert_eq!(recorded.target, "/db/_changes");
    assert_eq!(recorded.json(), json!({ "since": 4, "feed": "normal" }));
}

#[tokio::test]
async fn builder_error_status_rejects_with_status() {
    let server = serve(vec![Reply::json(401, "Unauthorized", r#"{"error":"Unauthorized"}"#)]).await;

    let outcome = RequestBuilder::get(&Client::new(), server.url("db/_changes"))
        .end()
        .await;

    assert_eq!(
        outcome,
        Err(RequestError::Application {
            message: "Unauthorized".to_owned(),
            status: 401,
        })
    );
}

#[tokio::test]
async fn builder_cancel_immediately_rejects_without_waiting() {
    let server = serve(vec![Reply::Hang]).await;

    let handle = RequestBuilder::post(&Client::new(), server.url("db/_changes"))
        .send(&json!({ "feed": "longpoll" }))
        .end();
    handle.cancel();
    let (promise, _canceller) = handle.into_parts();

    let outcome = tokio::time::timeout(Duration::from_secs(2), promise)
        .await
        .expect("cancel settles without waiting for the server");
    assert_eq!(outcome, Err(RequestError::Canceled));
}

#[tokio::test]
async fn builder_cancel_while_in_flight_rejects_canceled() {
    let mut server = serve(vec![Reply::Hang]).await;

    let (promise, canceller) = RequestBuilder::post(&Client::new(), server.url("db/_changes"))
        .send(&json!({ "feed": "longpoll" }))
        .end()
        .into_parts();
    server.next_request().await;
    canceller.cancel();
    canceller.cancel();

    let outcome = tokio::time::timeout(Duration::from_secs(2), promise)
        .await
        .expect("cancel settles without waiting for the server");
    assert_eq!(outcome, Err(RequestError::Canceled));
    assert_eq!(canceller.phase(), Phase::Canceled);
}

#[tokio::test]
async fn builder_cancel_drops_the_connection() {
    let mut server = serve(vec![Reply::Hang]).await;

    let (promise, canceller) = RequestBuilder::post(&Client::new(), server.url("db/_changes"))
        .send(&json!({ "feed": "longpoll" }))
        .end()
        .into_parts();
    server.next_request().await;
    assert_eq!(server.hangup(Duration::from_millis(100)).await, None);

    canceller.cancel();

    assert_eq!(promise.await, Err(RequestError::Canceled));
    assert_eq!(
        server.hangup(Duration::from_secs(2)).await.as_deref(),
        Some("/db/_changes")
    );
}
