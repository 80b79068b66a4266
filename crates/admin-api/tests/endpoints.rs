//! Endpoint paths, methods, and bodies as seen by the server.

#[path = "../../request/tests/support/mod.rs"]
mod support;

use admin_api::{ClientSettings, GatewayClient, ServerUrl};
use gateway::{
    Attachment, AttachmentName, ChangesParams, DatabaseName, DocsPage, DocumentId, FeedMode,
    RequestError, Response, RevisionId, UserInfo, UserName,
};
use serde_json::json;
use support::{serve, CannedServer, Reply};

fn client(server: &CannedServer) -> GatewayClient {
    let url = ServerUrl::parse(&server.base).unwrap();
    GatewayClient::new(url, &ClientSettings::default()).unwrap()
}

fn db() -> DatabaseName {
    DatabaseName::new("db").unwrap()
}

fn doc() -> DocumentId {
    DocumentId::new("doc1").unwrap()
}

fn rev() -> RevisionId {
    RevisionId::new("1-a").unwrap()
}

// ============================================================================
// Databases
// ============================================================================

#[tokio::test]
async fn fetch_all_databases_lists_names() {
    let mut server = serve(vec![Reply::json(200, "OK", r#"["db","beer"]"#)]).await;

    let client = client(&server);
    assert_eq!(client.server().as_url().as_str(), server.base);
    let outcome = client.fetch_all_databases().await;

    assert_eq!(outcome, Ok(Response::with_data(json!(["db", "beer"]), 200)));
    let recorded = server.next_request().await;
    assert_eq!((recorded.method.as_str(), recorded.target.as_str()), ("GET", "/_all_dbs"));
}

#[tokio::test]
async fn fetch_database_of_unknown_name_rejects_not_found() {
    let mut server = serve(vec![Reply::json(404, "Not Found", r#"{"error":"not_found"}"#)]).await;

    let outcome = client(&server).fetch_database(&DatabaseName::new("nope").unwrap()).await;

    assert_eq!(
        outcome,
        Err(RequestError::Application {
            message: "Not Found".to_owned(),
            status: 404,
        })
    );
    assert_eq!(server.next_request().await.target, "/nope");
}

// ============================================================================
// Documents
// ============================================================================

#[tokio::test]
async fn fetch_docs_requests_one_extra_row_for_paging() {
    let mut server = serve(vec![Reply::json(
        200,
        "OK",
        r#"{"total_rows":3,"rows":[{"key":"k","id":"k"},{"key":"l","id":"l"},{"key":"m","id":"m"}]}"#,
    )])
    .await;

    let startkey = DocumentId::new("k").unwrap();
    let outcome = client(&server).fetch_docs(&db(), 2, Some(&startkey)).await;

    let recorded = server.next_request().await;
    assert_eq!(recorded.method, "GET");
    assert_eq!(
        recorded.target,
        "/db/_all_docs?access=true&channels=true&include_docs=true&limit=3&startkey=k"
    );

    let data = outcome.unwrap().data.unwrap();
    let page = DocsPage::from_all_docs(&data, 2);
    assert_eq!(page.rows.len(), 2);
    assert_eq!(page.next_startkey, DocumentId::new("m"));
}

#[tokio::test]
async fn fetch_doc_and_revision_ask_for_history() {
    let mut server = serve(vec![
        Reply::json(200, "OK", r#"{"_id":"doc1","_rev":"2-b"}"#),
        Reply::json(200, "OK", r#"{"_id":"doc1","_rev":"1-a"}"#),
    ])
    .await;
    let client = client(&server);

    client.fetch_doc(&db(), &doc()).await.unwrap();
    assert_eq!(server.next_request().await.target, "/db/doc1?revs=true");

    client.fetch_revision(&db(), &doc(), &rev()).await.unwrap();
    assert_eq!(server.next_request().await.target, "/db/doc1?revs=true&rev=1-a");
}

#[tokio::test]
async fn create_doc_posts_to_database_root() {
    let mut server = serve(vec![Reply::json(
        201,
        "Created",
        r#"{"id":"generated","ok":true,"rev":"1-x"}"#,
    )])
    .await;

    let outcome = client(&server).create_doc(&db(), &json!({ "type": "beer" })).await;

    assert_eq!(outcome.unwrap().status, 201);
    let recorded = server.next_request().await;
    assert_eq!(recorded.method, "POST");
    assert_eq!(recorded.target, "/db/");
    assert_eq!(recorded.header("content-type"), Some("application/json"));
    assert_eq!(recorded.json(), json!({ "type": "beer" }));
}

#[tokio::test]
async fn update_revision_strips_id_and_rev_from_body() {
    let mut server = serve(vec![Reply::json(201, "Created", r#"{"ok":true,"rev":"2-b"}"#)]).await;

    let body = json!({ "_id": "doc1", "_rev": "1-a", "type": "ale" });
    client(&server).update_revision(&db(), &doc(), &rev(), &body).await.unwrap();

    let recorded = server.next_request().await;
    assert_eq!(recorded.method, "PUT");
    assert_eq!(recorded.target, "/db/doc1?rev=1-a");
    assert_eq!(recorded.json(), json!({ "type": "ale" }));
}

#[tokio::test]
async fn update_of_stale_revision_rejects_conflict() {
    let server = serve(vec![Reply::json(409, "Conflict", r#"{"error":"conflict"}"#)]).await;

    let outcome = client(&server)
        .update_revision(&db(), &doc(), &rev(), &json!({}))
        .await;

    assert_eq!(outcome.unwrap_err().status(), Some(409));
}

#[tokio::test]
async fn upload_attachment_puts_raw_bytes_under_the_document() {
    let mut server = serve(vec![Reply::json(201, "Created", r#"{"ok":true,"rev":"2-c"}"#)]).await;

    let attachment = Attachment {
        name: AttachmentName::new("label.png").unwrap(),
        content_type: Some("image/png".to_owned()),
        bytes: vec![0x89, b'P', b'N', b'G'],
    };
    client(&server)
        .upload_attachment(&db(), &doc(), &rev(), &attachment)
        .await
        .unwrap();

    let recorded = server.next_request().await;
    assert_eq!(recorded.method, "PUT");
    assert_eq!(recorded.target, "/db/doc1/label.png?rev=1-a");
    assert_eq!(recorded.header("content-type"), Some("image/png"));
    assert_eq!(recorded.body, vec![0x89, b'P', b'N', b'G']);
}

#[tokio::test]
async fn delete_doc_addresses_the_revision() {
    let mut server = serve(vec![Reply::json(200, "OK", r#"{"ok":true,"rev":"2-d"}"#)]).await;

    client(&server).delete_doc(&db(), &doc(), &rev()).await.unwrap();

    let recorded = server.next_request().await;
    assert_eq!(recorded.method, "DELETE");
    assert_eq!(recorded.target, "/db/doc1?rev=1-a");
    assert_eq!(recorded.header("content-type"), Some("application/json"));
}

// ============================================================================
// Change feed
// ============================================================================

#[tokio::test]
async fn both_change_feed_transports_post_the_params() {
    let mut server = serve(vec![
        Reply::json(200, "OK", r#"{"results":[],"last_seq":9}"#),
        Reply::json(200, "OK", r#"{"results":[],"last_seq":9}"#),
    ])
    .await;
    let client = client(&server);
    let params = ChangesParams {
        feed: Some(FeedMode::Normal),
        since: Some(json!(9)),
        ..ChangesParams::default()
    };

    let abortable = client.fetch_changes_feed(&db(), &params).await.unwrap();
    let plain = client.poll_changes_feed(&db(), &params).await.unwrap();
    assert_eq!(abortable, plain);

    for _ in 0..2 {
        let recorded = server.next_request().await;
        assert_eq!(recorded.method, "POST");
        assert_eq!(recorded.target, "/db/_changes");
        assert_eq!(recorded.json(), json!({ "feed": "normal", "since": 9 }));
    }
}

#[tokio::test]
async fn cancelled_longpoll_rejects_canceled() {
    let mut server = serve(vec![Reply::Hang]).await;
    let params = ChangesParams {
        feed: Some(FeedMode::Longpoll),
        ..ChangesParams::default()
    };

    let handle = client(&server).fetch_changes_feed(&db(), &params);
    server.next_request().await;
    handle.cancel();

    assert_eq!(handle.await, Err(RequestError::Canceled));
}

// ============================================================================
// Users
// ============================================================================

#[tokio::test]
async fn user_endpoints_use_the_user_collection() {
    let mut server = serve(vec![
        Reply::json(200, "OK", r#"["alice"]"#),
        Reply::json(200, "OK", r#"{"name":"alice","admin_channels":["a"]}"#),
        Reply::json(201, "Created", ""),
        Reply::json(200, "OK", ""),
        Reply::json(200, "OK", ""),
    ])
    .await;
    let client = client(&server);
    let alice = UserName::new("alice").unwrap();
    let info = UserInfo {
        name: Some("alice".to_owned()),
        password: Some("secret".to_owned()),
        admin_channels: Some(vec!["a".to_owned()]),
        ..UserInfo::default()
    };

    assert_eq!(
        client.fetch_users(&db()).await,
        Ok(Response::with_data(json!(["alice"]), 200))
    );
    let user = client.fetch_user(&db(), &alice).await.unwrap().data.unwrap();
    let user: UserInfo = serde_json::from_value(user).unwrap();
    assert_eq!(user.admin_channels, Some(vec!["a".to_owned()]));

    assert_eq!(client.create_user(&db(), &info).await, Ok(Response::status_only(201)));
    assert_eq!(
        client.update_user(&db(), &alice, &info).await,
        Ok(Response::status_only(200))
    );
    assert_eq!(client.delete_user(&db(), &alice).await, Ok(Response::status_only(200)));

    let expected = [
        ("GET", "/db/_user"),
        ("GET", "/db/_user/alice"),
        ("POST", "/db/_user/"),
        ("PUT", "/db/_user/alice"),
        ("DELETE", "/db/_user/alice"),
    ];
    for (method, target) in expected {
        let recorded = server.next_request().await;
        assert_eq!((recorded.method.as_str(), recorded.target.as_str()), (method, target));
        if method == "POST" || method == "PUT" {
            assert_eq!(
                recorded.json(),
                json!({ "name": "alice", "password": "secret", "admin_channels": ["a"] })
            );
        }
    }
}
