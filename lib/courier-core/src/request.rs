//! Encoded HTTP requests.
//!
//! A [`Request`] is what the encoding engine produces and what a
//! [`Transport`](crate::Transport) sends. It can also be built by hand:
//!
//! ```
//! use courier_core::{Method, Request};
//! use bytes::Bytes;
//!
//! let url = "https://api.example.com/search".parse().expect("valid URL");
//! let request = Request::<Bytes>::builder(Method::Get, url)
//!     .header("Accept", "application/json")
//!     .query("q", "rust lang")
//!     .build();
//! assert_eq!(request.url().as_str(), "https://api.example.com/search?q=rust%20lang");
//! ```

use std::collections::HashMap;

use bytes::Bytes;
use derive_more::Display;
use url::Url;

use crate::form::encode_pair;
use crate::{Method, PathTemplate};

/// How the transport may use cached responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display)]
pub enum CachePolicy {
    /// Follow the protocol's caching rules.
    #[default]
    #[display("use protocol cache policy")]
    UseProtocolCachePolicy,
    /// Always load from the origin.
    #[display("reload ignoring local cache data")]
    ReloadIgnoringLocalCacheData,
    /// Use cached data of any age, loading only when nothing is cached.
    #[display("return cache data else load")]
    ReturnCacheDataElseLoad,
    /// Use cached data only; never load.
    #[display("return cache data don't load")]
    ReturnCacheDataDontLoad,
}

impl CachePolicy {
    /// The `Cache-Control` request directive matching this policy.
    #[must_use]
    pub const fn cache_control(self) -> Option<&'static str> {
        match self {
            Self::UseProtocolCachePolicy => None,
            Self::ReloadIgnoringLocalCacheData => Some("no-cache"),
            Self::ReturnCacheDataElseLoad => Some("max-stale"),
            Self::ReturnCacheDataDontLoad => Some("only-if-cached"),
        }
    }
}

/// An HTTP request with method, URL, headers, and optional body.
#[derive(Debug, Clone)]
pub struct Request<B = Bytes> {
    method: Method,
    url: Url,
    headers: HashMap<String, String>,
    body: Option<B>,
    cache_policy: CachePolicy,
    path_template: Option<PathTemplate>,
}

impl<B> Request<B> {
    /// Creates a new [`RequestBuilder`].
    #[must_use]
    pub fn builder(method: Method, url: Url) -> RequestBuilder<B> {
        RequestBuilder::new(method, url)
    }

    /// HTTP method.
    #[must_use]
    pub const fn method(&self) -> Method {
        self.method
    }

    /// Request URL.
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Request headers.
    #[must_use]
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Single header value by name, ignoring ASCII case.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(name)
            .or_else(|| {
                self.headers
                    .iter()
                    .find(|(key, _)| key.eq_ignore_ascii_case(name))
                    .map(|(_, value)| value)
            })
            .map(String::as_str)
    }

    /// Request body.
    #[must_use]
    pub const fn body(&self) -> Option<&B> {
        self.body.as_ref()
    }

    /// Cache policy.
    #[must_use]
    pub const fn cache_policy(&self) -> CachePolicy {
        self.cache_policy
    }

    /// The path template the URL was resolved from, if any.
    #[must_use]
    pub const fn path_template(&self) -> Option<&PathTemplate> {
        self.path_template.as_ref()
    }

    /// Consume into (method, url, headers, body).
    #[must_use]
    pub fn into_parts(self) -> (Method, Url, HashMap<String, String>, Option<B>) {
        (self.method, self.url, self.headers, self.body)
    }
}

/// Builder for constructing [`Request`] instances.
#[derive(Debug, Clone)]
pub struct RequestBuilder<B = Bytes> {
    method: Method,
    url: Url,
    headers: HashMap<String, String>,
    body: Option<B>,
    cache_policy: CachePolicy,
    path_template: Option<PathTemplate>,
}

impl<B> RequestBuilder<B> {
    /// Creates a new builder.
    #[must_use]
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HashMap::new(),
            body: None,
            cache_policy: CachePolicy::default(),
            path_template: None,
        }
    }

    /// Sets a header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Sets multiple headers.
    #[must_use]
    pub fn headers(mut self, headers: impl IntoIterator<Item = (String, String)>) -> Self {
        self.headers.extend(headers);
        self
    }

    /// Appends a query parameter to the URL.
    ///
    /// Spaces are encoded as `%20`.
    #[must_use]
    pub fn query(self, name: &str, value: &str) -> Self {
        self.query_pairs([(name.to_string(), value.to_string())])
    }

    /// Appends multiple query parameters to the URL, keeping existing ones.
    #[must_use]
    pub fn query_pairs(mut self, pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        let mut query: Vec<String> = self
            .url
            .query()
            .filter(|existing| !existing.is_empty())
            .map(|existing| vec![existing.to_string()])
            .unwrap_or_default();
        query.extend(pairs.into_iter().map(|(name, value)| encode_pair(&name, &value)));
        if !query.is_empty() {
            self.url.set_query(Some(&query.join("&")));
        }
        self
    }

    /// Sets the request body.
    #[must_use]
    pub fn body(mut self, body: B) -> Self {
        self.body = Some(body);
        self
    }

    /// Sets the cache policy.
    #[must_use]
    pub const fn cache_policy(mut self, cache_policy: CachePolicy) -> Self {
        self.cache_policy = cache_policy;
        self
    }

    /// Records the path template the URL was resolved from.
    #[must_use]
    pub fn path_template(mut self, template: PathTemplate) -> Self {
        self.path_template = Some(template);
        self
    }

    /// Builds the [`Request`].
    #[must_use]
    pub fn build(self) -> Request<B> {
        Request {
            method: self.method,
            url: self.url,
            headers: self.headers,
            body: self.body,
            cache_policy: self.cache_policy,
            path_template: self.path_template,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(text: &str) -> Url {
        Url::parse(text).expect("valid URL")
    }

    #[test]
    fn request_builder_basic() {
        let request = Request::<Bytes>::builder(Method::Get, url("https://api.example.com/users"))
            .header("Accept", "application/json")
            .build();

        assert_eq!(request.method(), Method::Get);
        assert_eq!(request.url().as_str(), "https://api.example.com/users");
        assert_eq!(request.header("accept"), Some("application/json"));
        assert!(request.body().is_none());
        assert_eq!(request.cache_policy(), CachePolicy::UseProtocolCachePolicy);
        assert!(request.path_template().is_none());
    }

    #[test]
    fn query_keeps_existing_items() {
        let request = Request::<Bytes>::builder(Method::Get, url("https://h.test/?a=1"))
            .query("a", "2")
            .query("b", "x y")
            .build();

        assert_eq!(request.url().as_str(), "https://h.test/?a=1&a=2&b=x%20y");
    }

    #[test]
    fn request_builder_with_body() {
        let body = Bytes::from(r#"{"name":"test"}"#);
        let request = Request::builder(Method::Post, url("https://api.example.com/users"))
            .header("Content-Type", "application/json")
            .body(body.clone())
            .cache_policy(CachePolicy::ReloadIgnoringLocalCacheData)
            .path_template(PathTemplate::new("/users"))
            .build();

        assert_eq!(request.method(), Method::Post);
        assert_eq!(request.body(), Some(&body));
        assert_eq!(request.cache_policy().cache_control(), Some("no-cache"));
        assert_eq!(request.path_template().map(PathTemplate::as_str), Some("/users"));
    }
}
