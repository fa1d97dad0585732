//! Request encoding engine.
//!
//! A request definition lists its fields, in declaration order, into a
//! [`RequestEncoder`]. Each field type knows its [`FieldRole`] and routes
//! itself into the matching slot; repeated roles merge according to
//! [`FieldRole::merge_rule`]. [`RequestEncoder::finish`] then assembles the
//! URL, headers and body into a [`Request`].
//!
//! Definitions are usually derived:
//!
//! ```ignore
//! #[derive(Request)]
//! struct GetUser {
//!     method: Method,
//!     path: Path,
//!     id: PathParameter<u64>,
//!     verbose: Option<bool>,
//! }
//! ```

use bytes::Bytes;
use serde::Serialize;
use url::Url;

use crate::case::header_names_match;
use crate::format::{EncodedBody, Formatted, encode_body};
use crate::form::encode_pair;
use crate::path_template::validate_parameter_name;
use crate::role::{FieldRole, MergeRule};
use crate::tag::{
    Body, CustomUrl, Header, HeaderValue, Path, PathParameter, PathValue, QueryItem, QueryValue,
    RequestCookies,
};
use crate::{CachePolicy, Error, Method, PathTemplate, Request, Result};

/// A request definition: a value that lists its fields into an encoder.
///
/// Generated by `#[derive(Request)]`.
pub trait EncodeRequest {
    /// Feed every field, in declaration order.
    ///
    /// # Errors
    ///
    /// Propagates the first field that fails to encode.
    fn encode(&self, encoder: &mut RequestEncoder) -> Result<()>;
}

/// A single request field.
///
/// Any [`QueryValue`] without a tag is a query item named after the field.
pub trait EncodeField {
    /// Where this field goes.
    const ROLE: FieldRole;

    /// Route the value into `encoder` under the wire name `name`.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be encoded.
    fn encode_field(&self, name: &str, encoder: &mut RequestEncoder) -> Result<()>;
}

/// Accumulates fields of a request definition.
#[derive(Debug, Clone, Default)]
pub struct RequestEncoder {
    method: Option<Method>,
    path: Option<String>,
    path_parameters: Vec<(String, String)>,
    query_items: Vec<(String, String)>,
    headers: Vec<(String, String)>,
    cookies: Vec<(String, String)>,
    custom_url: Option<String>,
    cache_policy: Option<CachePolicy>,
    body: Option<EncodedBody>,
}

impl RequestEncoder {
    /// An empty encoder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Encode one field under its wire name.
    ///
    /// # Errors
    ///
    /// Returns the field's encoding error.
    pub fn field<F>(&mut self, name: &str, value: &F) -> Result<()>
    where
        F: EncodeField + ?Sized,
    {
        tracing::trace!(field = name, role = %F::ROLE, "encoding field");
        value.encode_field(name, self)
    }

    /// Set the method.
    pub fn method(&mut self, method: Method) {
        merge_single(&mut self.method, FieldRole::Method, method);
    }

    /// Set the path template.
    pub fn path(&mut self, template: &str) {
        merge_single(&mut self.path, FieldRole::Path, template.to_string());
    }

    /// Set a path parameter.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPathParameterName`] if `name` cannot appear in
    /// a `{name}` placeholder.
    pub fn path_parameter(&mut self, name: &str, value: String) -> Result<()> {
        validate_parameter_name(name)?;
        merge_keyed(&mut self.path_parameters, FieldRole::PathParameter, name, value);
        Ok(())
    }

    /// Add a query item.
    pub fn query_item(&mut self, name: &str, value: String) {
        merge_keyed(&mut self.query_items, FieldRole::QueryItem, name, value);
    }

    /// Set a header field.
    pub fn header(&mut self, name: &str, value: String) {
        merge_keyed(&mut self.headers, FieldRole::Header, name, value);
    }

    /// Add a cookie.
    pub fn cookie(&mut self, name: &str, value: String) {
        merge_keyed(&mut self.cookies, FieldRole::Cookies, name, value);
    }

    /// Replace the base URL.
    pub fn custom_url(&mut self, url: &str) {
        merge_single(&mut self.custom_url, FieldRole::CustomUrl, url.to_string());
    }

    /// Set the cache policy.
    pub fn cache_policy(&mut self, policy: CachePolicy) {
        merge_single(&mut self.cache_policy, FieldRole::CachePolicy, policy);
    }

    /// Serialize and set the body.
    ///
    /// A body is serialized only if none was set before.
    ///
    /// # Errors
    ///
    /// Returns the codec error of the body format.
    pub fn body<T>(&mut self, value: &T) -> Result<()>
    where
        T: Serialize + Formatted + ?Sized,
    {
        if self.body.is_some() {
            tracing::trace!(role = %FieldRole::Body, "ignoring repeated field");
            return Ok(());
        }
        self.body = Some(encode_body(value)?);
        Ok(())
    }

    /// Assemble the request against `base_url`.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidCustomUrl`] if the custom URL does not parse
    /// - [`Error::InvalidBaseUrl`] if `base_url` cannot take a path
    /// - [`Error::FailedToCreateUrl`] if the assembled URL has no path
    pub fn finish(self, base_url: &Url) -> Result<Request<Bytes>> {
        let template = self.path.map(PathTemplate::new);
        let path = template
            .as_ref()
            .map(|template| template.resolve(&self.path_parameters))
            .unwrap_or_default();

        let mut url = match self.custom_url {
            Some(custom) => {
                if !path.is_empty() {
                    tracing::debug!(%path, url = %custom, "custom URL replaces the declared path");
                }
                Url::parse(&custom).map_err(|_| Error::InvalidCustomUrl(custom))?
            }
            None => append_path(base_url, &path)?,
        };
        if url.cannot_be_a_base() {
            return Err(Error::FailedToCreateUrl);
        }
        merge_query(&mut url, &self.query_items);

        let mut headers = self.headers;
        if !self.cookies.is_empty() && !has_header(&headers, "Cookie") {
            let cookies: RequestCookies = self
                .cookies
                .into_iter()
                .map(|(name, value)| cookie::Cookie::new(name, value))
                .collect();
            if let Some(value) = cookies.header_value() {
                headers.push(("Cookie".to_string(), value));
            }
        }
        if let Some(body) = &self.body
            && !has_header(&headers, "Content-Type")
        {
            headers.push(("Content-Type".to_string(), body.content_type().to_string()));
        }

        let method = self.method.unwrap_or_default();
        tracing::debug!(%method, %url, "encoded request");

        let mut builder = Request::builder(method, url)
            .headers(headers)
            .cache_policy(self.cache_policy.unwrap_or_default());
        if let Some(template) = template {
            builder = builder.path_template(template);
        }
        if let Some(body) = self.body {
            builder = builder.body(body.bytes);
        }
        Ok(builder.build())
    }
}

/// Encode a request definition against `base_url`.
///
/// # Errors
///
/// Returns the first field error, or a URL assembly error.
pub fn encode_request<R>(definition: &R, base_url: &Url) -> Result<Request<Bytes>>
where
    R: EncodeRequest + ?Sized,
{
    let mut encoder = RequestEncoder::new();
    definition.encode(&mut encoder)?;
    encoder.finish(base_url)
}

fn merge_single<T>(slot: &mut Option<T>, role: FieldRole, value: T) {
    debug_assert_eq!(role.merge_rule(), MergeRule::FirstWins);
    if slot.is_some() {
        tracing::trace!(%role, "ignoring repeated field");
    } else {
        *slot = Some(value);
    }
}

fn merge_keyed(entries: &mut Vec<(String, String)>, role: FieldRole, name: &str, value: String) {
    let existing = entries.iter_mut().find(|(key, _)| match role {
        FieldRole::Header => header_names_match(key, name),
        _ => key == name,
    });
    match (role.merge_rule(), existing) {
        (MergeRule::Overwrite, Some(entry)) => entry.1 = value,
        (MergeRule::FirstWins, Some(_)) => {
            tracing::trace!(%role, name, "ignoring repeated field");
        }
        _ => entries.push((name.to_string(), value)),
    }
}

fn has_header(headers: &[(String, String)], name: &str) -> bool {
    headers.iter().any(|(key, _)| key.eq_ignore_ascii_case(name))
}

/// Append `path`, minus one leading `/`, to the base URL path.
fn append_path(base_url: &Url, path: &str) -> Result<Url> {
    if base_url.cannot_be_a_base() {
        return Err(Error::InvalidBaseUrl);
    }
    let mut url = base_url.clone();
    let relative = path.strip_prefix('/').unwrap_or(path);
    if !relative.is_empty() {
        let base_path = url.path();
        let joined = if base_path.ends_with('/') {
            format!("{base_path}{relative}")
        } else {
            format!("{base_path}/{relative}")
        };
        url.set_path(&joined);
    }
    Ok(url)
}

/// Keep the URL's own query items and append the declared ones.
fn merge_query(url: &mut Url, declared: &[(String, String)]) {
    if declared.is_empty() {
        return;
    }
    let mut pairs: Vec<String> = url
        .query()
        .filter(|query| !query.is_empty())
        .map(|query| vec![query.to_string()])
        .unwrap_or_default();
    pairs.extend(declared.iter().map(|(name, value)| encode_pair(name, value)));
    url.set_query(Some(&pairs.join("&")));
}

// ============================================================================
// Field impls
// ============================================================================

impl<T: QueryValue + ?Sized> EncodeField for T {
    const ROLE: FieldRole = FieldRole::QueryItem;

    fn encode_field(&self, name: &str, encoder: &mut RequestEncoder) -> Result<()> {
        for value in self.query_values() {
            encoder.query_item(name, value);
        }
        Ok(())
    }
}

impl<T: QueryValue> EncodeField for QueryItem<T> {
    const ROLE: FieldRole = FieldRole::QueryItem;

    fn encode_field(&self, name: &str, encoder: &mut RequestEncoder) -> Result<()> {
        let name = self.wire_name(name);
        for value in self.value().query_values() {
            encoder.query_item(name, value);
        }
        Ok(())
    }
}

impl<T: HeaderValue, S> EncodeField for Header<T, S> {
    const ROLE: FieldRole = FieldRole::Header;

    fn encode_field(&self, name: &str, encoder: &mut RequestEncoder) -> Result<()> {
        if let Some(value) = self.value().header_value() {
            encoder.header(self.wire_name(name), value);
        }
        Ok(())
    }
}

impl<T: PathValue> EncodeField for PathParameter<T> {
    const ROLE: FieldRole = FieldRole::PathParameter;

    fn encode_field(&self, name: &str, encoder: &mut RequestEncoder) -> Result<()> {
        let name = self.wire_name(name);
        match self.value().path_value() {
            Some(value) => encoder.path_parameter(name, value),
            None => validate_parameter_name(name),
        }
    }
}

impl EncodeField for Path {
    const ROLE: FieldRole = FieldRole::Path;

    fn encode_field(&self, _name: &str, encoder: &mut RequestEncoder) -> Result<()> {
        encoder.path(self.as_str());
        Ok(())
    }
}

impl EncodeField for CustomUrl {
    const ROLE: FieldRole = FieldRole::CustomUrl;

    fn encode_field(&self, _name: &str, encoder: &mut RequestEncoder) -> Result<()> {
        if let Some(url) = self.as_str() {
            encoder.custom_url(url);
        }
        Ok(())
    }
}

impl EncodeField for RequestCookies {
    const ROLE: FieldRole = FieldRole::Cookies;

    fn encode_field(&self, _name: &str, encoder: &mut RequestEncoder) -> Result<()> {
        for cookie in self.cookies() {
            encoder.cookie(cookie.name(), cookie.value().to_string());
        }
        Ok(())
    }
}

impl EncodeField for CachePolicy {
    const ROLE: FieldRole = FieldRole::CachePolicy;

    fn encode_field(&self, _name: &str, encoder: &mut RequestEncoder) -> Result<()> {
        encoder.cache_policy(*self);
        Ok(())
    }
}

impl<T: Serialize + Formatted> EncodeField for Body<T> {
    const ROLE: FieldRole = FieldRole::Body;

    fn encode_field(&self, _name: &str, encoder: &mut RequestEncoder) -> Result<()> {
        encoder.body(&self.0)
    }
}

impl EncodeField for Method {
    const ROLE: FieldRole = FieldRole::Method;

    fn encode_field(&self, _name: &str, encoder: &mut RequestEncoder) -> Result<()> {
        encoder.method(*self);
        Ok(())
    }
}
