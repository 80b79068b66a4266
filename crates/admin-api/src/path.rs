//! Turns a logical target (database, document, query) into a request URL.

use gateway::ConsoleError;
use reqwest::Url;

/// Base URL of the gateway admin API (e.g. `http://localhost:4985/`).
///
/// Validated at construction: the scheme is `http` or `https` and the URL
/// can carry path segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerUrl(Url);

impl ServerUrl {
    /// Parses and validates an admin API base URL.
    pub fn parse(raw: &str) -> Result<Self, ConsoleError> {
        let invalid = |reason: String| ConsoleError::InvalidServerUrl {
            url: raw.to_owned(),
            reason,
        };

        let url = Url::parse(raw).map_err(|err| invalid(err.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
        }
        if url.cannot_be_a_base() {
            return Err(invalid("URL cannot carry a path".to_owned()));
        }
        if url.query().is_some() || url.fragment().is_some() {
            return Err(invalid("URL must not have a query or fragment".to_owned()));
        }
        Ok(Self(url))
    }

    /// Returns the base URL.
    pub fn as_url(&self) -> &Url {
        &self.0
    }

    /// Builds the URL for `segments` below the base, with `query` appended.
    ///
    /// Each segment is percent-encoded as a single path segment. An empty
    /// trailing segment produces a trailing slash (`db/`).
    pub fn join(&self, segments: &[&str], query: &Query) -> Url {
        let mut url = self.0.clone();
        // Cannot fail: `parse` rejected URLs that cannot be a base.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty();
            path.extend(segments);
        }
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &query.0 {
                pairs.append_pair(key, value);
            }
        }
        url
    }
}

impl std::fmt::Display for ServerUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ordered query parameters; unset optional values are left out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query(Vec<(&'static str, String)>);

impl Query {
    /// Creates an empty query.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `key=value`.
    pub fn value(mut self, key: &'static str, value: impl ToString) -> Self {
        self.0.push((key, value.to_string()));
        self
    }

    /// Appends `key=value` if `value` is set.
    pub fn optional(self, key: &'static str, value: Option<impl ToString>) -> Self {
        match value {
            Some(v) => self.value(key, v),
            None => self,
        }
    }

    /// Returns `true` if no parameter was added.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
