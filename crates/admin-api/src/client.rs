//! Every admin REST endpoint the console calls.
//!
//! Each method builds the target URL, picks a transport, and returns the
//! [`RequestHandle`] immediately; the request is already in flight.

use std::time::Duration;

use gateway::{
    strip_revision_metadata, Attachment, ChangesParams, DatabaseName, DocumentId, RevisionId,
    UserInfo, UserName,
};
use request::{fetch, FetchOptions, RequestBuilder, RequestHandle};
use reqwest::{Client, Method, Url};
use serde_json::Value;
use tracing::debug;

use crate::errors::ClientBuildError;
use crate::path::{Query, ServerUrl};

/// Connection settings for [`GatewayClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    /// Whole-request timeout; `None` waits indefinitely.
    pub timeout: Option<Duration>,
    /// `User-Agent` header value.
    pub user_agent: String,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            timeout: Some(Duration::from_secs(60)),
            user_agent: concat!("gwadmin/", env!("CARGO_PKG_VERSION")).to_owned(),
        }
    }
}

/// Client for one gateway admin API.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct GatewayClient {
    http: Client,
    server: ServerUrl,
}

impl GatewayClient {
    /// Creates a client for `server`.
    pub fn new(server: ServerUrl, settings: &ClientSettings) -> Result<Self, ClientBuildError> {
        let mut builder = Client::builder().user_agent(settings.user_agent.as_str());
        if let Some(timeout) = settings.timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build()?,
            server,
        })
    }

    /// Returns the admin API base URL.
    pub fn server(&self) -> &ServerUrl {
        &self.server
    }

    // ------------------------------------------------------------------------
    // Databases
    // ------------------------------------------------------------------------

    /// `GET /_all_dbs`
    pub fn fetch_all_databases(&self) -> RequestHandle {
        self.get(&["_all_dbs"], &Query::new())
    }

    /// `GET /{db}`
    pub fn fetch_database(&self, db: &DatabaseName) -> RequestHandle {
        self.get(&[db.as_str()], &Query::new())
    }

    // ------------------------------------------------------------------------
    // Documents
    // ------------------------------------------------------------------------

    /// `GET /{db}/_all_docs` for one page of `page_size` documents.
    ///
    /// Asks for one extra row so the caller can tell whether a next page
    /// exists; see [`gateway::DocsPage::from_all_docs`].
    pub fn fetch_docs(
        &self,
        db: &DatabaseName,
        page_size: usize,
        startkey: Option<&DocumentId>,
    ) -> RequestHandle {
        let query = Query::new()
            .value("access", true)
            .value("channels", true)
            .value("include_docs", true)
            .value("limit", page_size + 1)
            .optional("startkey", startkey);
        self.get(&[db.as_str(), "_all_docs"], &query)
    }

    /// `GET /{db}/{doc}?revs=true`: the current revision with its history.
    pub fn fetch_doc(&self, db: &DatabaseName, doc: &DocumentId) -> RequestHandle {
        self.get(&[db.as_str(), doc.as_str()], &Query::new().value("revs", true))
    }

    /// `GET /{db}/{doc}?revs=true&rev={rev}`: one specific revision.
    pub fn fetch_revision(
        &self,
        db: &DatabaseName,
        doc: &DocumentId,
        rev: &RevisionId,
    ) -> RequestHandle {
        let query = Query::new().value("revs", true).value("rev", rev);
        self.get(&[db.as_str(), doc.as_str()], &query)
    }

    /// `POST /{db}/`: creates a document; the server assigns the id unless
    /// the body carries `_id`.
    pub fn create_doc(&self, db: &DatabaseName, body: &Value) -> RequestHandle {
        let url = self.url(&[db.as_str(), ""], &Query::new());
        self.send(url, FetchOptions::method(Method::POST).with_json(body))
    }

    /// `PUT /{db}/{doc}?rev={rev}`: replaces revision `rev`.
    ///
    /// `_id` and `_rev` are removed from the body; both are addressed
    /// through the URL.
    pub fn update_revision(
        &self,
        db: &DatabaseName,
        doc: &DocumentId,
        rev: &RevisionId,
        body: &Value,
    ) -> RequestHandle {
        let url = self.url(&[db.as_str(), doc.as_str()], &Query::new().value("rev", rev));
        let body = strip_revision_metadata(body);
        self.send(url, FetchOptions::method(Method::PUT).with_json(&body))
    }

    /// `PUT /{db}/{doc}/{attachment}?rev={rev}` with the raw attachment bytes.
    pub fn upload_attachment(
        &self,
        db: &DatabaseName,
        doc: &DocumentId,
        rev: &RevisionId,
        attachment: &Attachment,
    ) -> RequestHandle {
        let url = self.url(
            &[db.as_str(), doc.as_str(), attachment.name.as_str()],
            &Query::new().value("rev", rev),
        );
        let mut options = FetchOptions::method(Method::PUT);
        if let Some(content_type) = &attachment.content_type {
            options = options.with_header("Content-Type", content_type.as_str());
        }
        self.send(url, options.with_bytes(attachment.bytes.clone()))
    }

    /// `DELETE /{db}/{doc}?rev={rev}`
    pub fn delete_doc(
        &self,
        db: &DatabaseName,
        doc: &DocumentId,
        rev: &RevisionId,
    ) -> RequestHandle {
        let url = self.url(&[db.as_str(), doc.as_str()], &Query::new().value("rev", rev));
        self.send(url, json_without_body(Method::DELETE))
    }

    // ------------------------------------------------------------------------
    // Change feed
    // ------------------------------------------------------------------------

    /// `POST /{db}/_changes` through the abortable builder transport.
    ///
    /// Cancelling the handle drops the connection, which ends a pending
    /// longpoll on the server side as well.
    pub fn fetch_changes_feed(&self, db: &DatabaseName, params: &ChangesParams) -> RequestHandle {
        let url = self.url(&[db.as_str(), "_changes"], &Query::new());
        debug!(%url, since = ?params.since, "Requesting change feed");
        RequestBuilder::post(&self.http, url)
            .set("Content-Type", "application/json")
            .send(params)
            .end()
    }

    /// `POST /{db}/_changes` through the fetch-style transport.
    ///
    /// Cancelling discards the result but leaves the request running until
    /// the server answers; prefer [`GatewayClient::fetch_changes_feed`] for
    /// longpolls.
    pub fn poll_changes_feed(&self, db: &DatabaseName, params: &ChangesParams) -> RequestHandle {
        let url = self.url(&[db.as_str(), "_changes"], &Query::new());
        self.send(url, FetchOptions::method(Method::POST).with_json(params))
    }

    // ------------------------------------------------------------------------
    // Users
    // ------------------------------------------------------------------------

    /// `GET /{db}/_user`: the names of every user of the database.
    pub fn fetch_users(&self, db: &DatabaseName) -> RequestHandle {
        self.get(&[db.as_str(), "_user"], &Query::new())
    }

    /// `GET /{db}/_user/{user}`
    pub fn fetch_user(&self, db: &DatabaseName, user: &UserName) -> RequestHandle {
        self.get(&[db.as_str(), "_user", user.as_str()], &Query::new())
    }

    /// `POST /{db}/_user/`
    pub fn create_user(&self, db: &DatabaseName, info: &UserInfo) -> RequestHandle {
        let url = self.url(&[db.as_str(), "_user", ""], &Query::new());
        self.send(url, FetchOptions::method(Method::POST).with_json(info))
    }

    /// `PUT /{db}/_user/{user}`
    pub fn update_user(&self, db: &DatabaseName, user: &UserName, info: &UserInfo) -> RequestHandle {
        let url = self.url(&[db.as_str(), "_user", user.as_str()], &Query::new());
        self.send(url, FetchOptions::method(Method::PUT).with_json(info))
    }

    /// `DELETE /{db}/_user/{user}`
    pub fn delete_user(&self, db: &DatabaseName, user: &UserName) -> RequestHandle {
        let url = self.url(&[db.as_str(), "_user", user.as_str()], &Query::new());
        self.send(url, json_without_body(Method::DELETE))
    }

    // ------------------------------------------------------------------------

    fn url(&self, segments: &[&str], query: &Query) -> Url {
        self.server.join(segments, query)
    }

    fn get(&self, segments: &[&str], query: &Query) -> RequestHandle {
        self.send(self.url(segments, query), FetchOptions::default())
    }

    fn send(&self, url: Url, options: FetchOptions) -> RequestHandle {
        fetch(&self.http, url, options)
    }
}

fn json_without_body(method: Method) -> FetchOptions {
    FetchOptions::method(method).with_header("Content-Type", "application/json")
}
