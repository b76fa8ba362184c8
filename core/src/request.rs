//! Framework-neutral request context.
//!
//! The engine never touches a real framework request. Hosts (or the
//! `detour-http` adapter) convert their request type into a [`Request`],
//! which carries exactly what resolution needs: the decoded path, the raw
//! query string, and a case-insensitive header map.

use percent_encoding::percent_decode_str;
use std::collections::HashMap;

/// Request context for redirect resolution.
///
/// Holds the decoded request path (percent-escapes resolved), the raw query
/// string (kept verbatim so it can be re-appended unchanged), and headers
/// stored under lowercased names.
///
/// # Example
///
/// ```
/// use detour::Request;
///
/// let req = Request::get("/the/dude?aggression=not_stand");
/// assert_eq!(req.path(), "/the/dude");
/// assert_eq!(req.query(), "aggression=not_stand");
/// ```
#[derive(Debug, Clone, Default)]
pub struct Request {
    path: String,
    query: String,
    headers: HashMap<String, String>,
}

impl Request {
    /// Create a request from an HTTP request target (`path[?query]`).
    ///
    /// The path portion is percent-decoded (lossily, so undecodable byte
    /// sequences cannot panic later stages); the query portion is kept raw.
    #[must_use]
    pub fn get(target: &str) -> Self {
        let (path, query) = split_target(target);
        Self {
            path: decode_path(path),
            query: query.to_string(),
            headers: HashMap::new(),
        }
    }

    /// Create a builder for `Request`.
    #[must_use]
    pub fn builder() -> RequestBuilder {
        RequestBuilder::default()
    }

    /// The decoded request path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The raw query string, without the leading `?`. Empty if absent.
    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Get a header value by name (case-insensitive).
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_lowercase()).map(String::as_str)
    }

    /// The `User-Agent` header, if present.
    #[must_use]
    pub fn user_agent(&self) -> Option<&str> {
        self.header("user-agent")
    }
}

/// Builder for [`Request`].
///
/// Unlike [`Request::get`], `path` is stored as given — use this when the
/// path is already decoded.
#[derive(Debug, Default)]
pub struct RequestBuilder {
    request: Request,
}

impl RequestBuilder {
    /// Set the (already decoded) request path.
    #[must_use]
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.request.path = path.into();
        self
    }

    /// Set the raw query string (no leading `?`).
    #[must_use]
    pub fn query(mut self, query: impl Into<String>) -> Self {
        self.request.query = query.into();
        self
    }

    /// Add a header (name is lowercased for case-insensitive lookup).
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.request
            .headers
            .insert(name.into().to_lowercase(), value.into());
        self
    }

    /// Build the `Request`.
    #[must_use]
    pub fn build(self) -> Request {
        self.request
    }
}

/// Split a request target into path and query portions.
///
/// Returns the full target and `""` if there is no `?`.
#[must_use]
pub fn split_target(target: &str) -> (&str, &str) {
    target.split_once('?').unwrap_or((target, ""))
}

/// Percent-decode a path, lossily replacing invalid UTF-8 sequences.
#[must_use]
pub fn decode_path(path: &str) -> String {
    percent_decode_str(path).decode_utf8_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_splits_path_and_query() {
        let req = Request::get("/take/comfort/?white=russian");
        assert_eq!(req.path(), "/take/comfort/");
        assert_eq!(req.query(), "white=russian");
    }

    #[test]
    fn get_without_query() {
        let req = Request::get("/take/comfort/");
        assert_eq!(req.path(), "/take/comfort/");
        assert_eq!(req.query(), "");
    }

    #[test]
    fn get_decodes_percent_escapes_in_path() {
        let req = Request::get("/%2fexample.com/");
        assert_eq!(req.path(), "//example.com/");
    }

    #[test]
    fn get_keeps_query_raw() {
        let req = Request::get("/p?x=%2f");
        assert_eq!(req.query(), "x=%2f");
    }

    #[test]
    fn invalid_utf8_escapes_decode_lossily() {
        // %C3 alone is an incomplete UTF-8 sequence
        let req = Request::get("/p%C3/x");
        assert!(req.path().starts_with("/p"));
        assert!(req.path().ends_with("/x"));
    }

    #[test]
    fn builder_stores_path_verbatim() {
        let req = Request::builder().path("/a%2fb").build();
        assert_eq!(req.path(), "/a%2fb");
    }

    #[test]
    fn headers_are_case_insensitive() {
        let req = Request::builder()
            .header("User-Agent", "the dude browses")
            .build();
        assert_eq!(req.header("user-agent"), Some("the dude browses"));
        assert_eq!(req.header("USER-AGENT"), Some("the dude browses"));
        assert_eq!(req.user_agent(), Some("the dude browses"));
    }
}
