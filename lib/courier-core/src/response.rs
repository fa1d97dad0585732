//! Received HTTP responses.
//!
//! [`Response`] is what a [`Transport`](crate::Transport) returns and what
//! the decoding engine reads. Headers keep their received order and may
//! repeat (several `Set-Cookie` lines, for instance).

use bytes::Bytes;
use url::Url;

use crate::case::header_names_match;
use crate::status::StatusClass;

/// HTTP response with status, headers, body and the URL it came from.
#[derive(Debug, Clone)]
pub struct Response<B = Bytes> {
    status: u16,
    headers: Vec<(String, String)>,
    unreadable: Vec<String>,
    body: B,
    url: Option<Url>,
}

impl<B> Response<B> {
    /// Creates a new response.
    #[must_use]
    pub fn new(status: u16, headers: impl IntoIterator<Item = (String, String)>, body: B) -> Self {
        Self {
            status,
            headers: headers.into_iter().collect(),
            unreadable: Vec::new(),
            body,
            url: None,
        }
    }

    /// Sets the URL the response was received from.
    #[must_use]
    pub fn with_url(mut self, url: Url) -> Self {
        self.url = Some(url);
        self
    }

    /// Records a received header whose value is not text.
    ///
    /// Such values are absent from [`Response::headers`]; decoding a field
    /// that depends on them fails instead of silently seeing nothing.
    #[must_use]
    pub fn with_unreadable_header(mut self, name: impl Into<String>) -> Self {
        self.unreadable.push(name.into());
        self
    }

    /// Whether a header was received with a value that is not text.
    #[must_use]
    pub fn has_unreadable_header(&self, name: &str) -> bool {
        self.unreadable.iter().any(|key| header_names_match(key, name))
    }

    /// HTTP status code.
    #[must_use]
    pub const fn status(&self) -> u16 {
        self.status
    }

    /// Response headers, in received order.
    #[must_use]
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// First value of a header, matching names case-insensitively.
    ///
    /// `Content-Type`, `content-type` and `contentType` all designate the
    /// same header.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.header_all(name).next()
    }

    /// Every value of a header, in received order.
    pub fn header_all<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a str> {
        self.headers
            .iter()
            .filter(move |(key, _)| header_names_match(key, name))
            .map(|(_, value)| value.as_str())
    }

    /// Response body.
    #[must_use]
    pub const fn body(&self) -> &B {
        &self.body
    }

    /// The URL the response was received from.
    #[must_use]
    pub const fn url(&self) -> Option<&Url> {
        self.url.as_ref()
    }

    /// The status class, `None` outside 100..=599.
    #[must_use]
    pub const fn class(&self) -> Option<StatusClass> {
        StatusClass::of(self.status)
    }

    /// Status is 2xx.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        StatusClass::Success.contains(self.status)
    }
}
