//! Response decoding engine.
//!
//! A response definition reads each of its fields from a
//! [`ResponseDecoder`]. The field type decides where the value comes from:
//!
//! | Field type | Source |
//! |------------|--------|
//! | [`StatusCode`] | the status code |
//! | [`Header<T, S>`](Header) | a header, case-insensitive, parsed by `S` |
//! | [`ResponseBody<T, S>`](ResponseBody) | the body, if `S` accepts the status |
//! | [`ResponseErrorBody<T, S>`](ResponseErrorBody) | the body, if `S` classifies the status as an error |
//! | [`Cookies`] | every `Set-Cookie` header |
//! | anything else | the key of the same name in the JSON body object |

mod header;
mod strategy;

use bytes::Bytes;
use cookie::Cookie;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use url::Url;

pub use self::header::{DefaultHeaderStrategy, FromHeader, HeaderStrategy, LenientHeaderStrategy};
pub use self::strategy::{
    BadRequest, BodyStrategy, DefaultBodyStrategy, DefaultErrorStrategy, ErrorBodyStrategy,
    Forbidden, Gone, NotFound, OptionalContent, Status200, Status201, Status303, Unauthorized,
    UnprocessableEntity,
};
use crate::case::{convert_json_keys, to_snake_case};
use crate::error::{CodingPath, DecodingError};
use crate::format::{Formatted, decode_body};
use crate::tag::{Cookies, Header, ResponseBody, ResponseErrorBody, StatusCode};
use crate::{Error, Response, Result};

/// A response definition: a value built field by field from a decoder.
///
/// Generated by `#[derive(Response)]`.
pub trait DecodeResponse: Sized {
    /// Read every field.
    ///
    /// # Errors
    ///
    /// Returns the first field that fails to decode.
    fn decode(decoder: &mut ResponseDecoder<'_>) -> Result<Self>;
}

/// A single response field.
pub trait DecodeField: Sized {
    /// Read the field with wire name `name`.
    ///
    /// # Errors
    ///
    /// Returns a [`DecodingError`] or [`Error::InvalidResponse`].
    fn decode_field(name: &str, decoder: &mut ResponseDecoder<'_>) -> Result<Self>;
}

/// Read access to a received response.
#[derive(Debug)]
pub struct ResponseDecoder<'a> {
    response: &'a Response<Bytes>,
    body_object: Option<Map<String, Value>>,
}

impl<'a> ResponseDecoder<'a> {
    /// Wrap a response.
    #[must_use]
    pub const fn new(response: &'a Response<Bytes>) -> Self {
        Self {
            response,
            body_object: None,
        }
    }

    /// Decode one field.
    ///
    /// # Errors
    ///
    /// Returns the field's decoding error.
    pub fn field<F: DecodeField>(&mut self, name: &str) -> Result<F> {
        tracing::trace!(field = name, "decoding field");
        F::decode_field(name, self)
    }

    /// Status code.
    #[must_use]
    pub const fn status(&self) -> u16 {
        self.response.status()
    }

    /// First value of a header, matching names case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&'a str> {
        let response: &'a Response<Bytes> = self.response;
        response.header(name)
    }

    /// Raw body bytes.
    #[must_use]
    pub const fn body(&self) -> &'a Bytes {
        self.response.body()
    }

    /// The URL the response came from.
    #[must_use]
    pub const fn url(&self) -> Option<&'a Url> {
        self.response.url()
    }

    /// The underlying response.
    #[must_use]
    pub const fn response(&self) -> &'a Response<Bytes> {
        self.response
    }

    /// The body as a JSON object with `snake_case` keys, parsed once.
    ///
    /// An empty body reads as an empty object.
    fn body_object(&mut self) -> Result<&Map<String, Value>> {
        if self.body_object.is_none() {
            let body = self.response.body();
            let object = if body.is_empty() {
                Map::new()
            } else {
                let value: Value = serde_json::from_slice(body).map_err(|e| {
                    DecodingError::data_corrupted(CodingPath::root(), e.to_string())
                })?;
                match convert_json_keys(value, to_snake_case) {
                    Value::Object(object) => object,
                    other => {
                        return Err(DecodingError::type_mismatch(
                            CodingPath::root(),
                            format!("expected a JSON object body, found {other}"),
                        )
                        .into());
                    }
                }
            };
            self.body_object = Some(object);
        }
        Ok(self.body_object.get_or_insert_default())
    }
}

/// Decode a response definition from a response.
///
/// # Errors
///
/// Returns the first field that fails to decode.
pub fn decode_response<T: DecodeResponse>(response: &Response<Bytes>) -> Result<T> {
    tracing::debug!(status = response.status(), "decoding response");
    let mut decoder = ResponseDecoder::new(response);
    T::decode(&mut decoder)
}

// ============================================================================
// Field impls
// ============================================================================

/// A plain field, read from the JSON body object.
impl<T: DeserializeOwned> DecodeField for T {
    fn decode_field(name: &str, decoder: &mut ResponseDecoder<'_>) -> Result<Self> {
        let key = to_snake_case(name);
        let path = CodingPath::key(name);
        let Some(value) = decoder.body_object()?.get(&key).cloned() else {
            // Types accepting null, such as Option, read a missing key as null.
            return serde_json::from_value(Value::Null)
                .map_err(|_| DecodingError::KeyNotFound { path }.into());
        };
        serde_path_to_error::deserialize(value)
            .map_err(|e| DecodingError::from_json(&e).nested_in(&path).into())
    }
}

impl DecodeField for StatusCode {
    fn decode_field(_name: &str, decoder: &mut ResponseDecoder<'_>) -> Result<Self> {
        Ok(Self::new(decoder.status()))
    }
}

impl<T: FromHeader, S: HeaderStrategy> DecodeField for Header<T, S> {
    fn decode_field(name: &str, decoder: &mut ResponseDecoder<'_>) -> Result<Self> {
        let value = S::decode(CodingPath::key(name), decoder.header(name))?;
        Ok(Self::new(value))
    }
}

impl<T, S> DecodeField for ResponseBody<T, S>
where
    T: DeserializeOwned + Formatted,
    S: BodyStrategy,
{
    fn decode_field(name: &str, decoder: &mut ResponseDecoder<'_>) -> Result<Self> {
        let status = decoder.status();
        if !S::validate(status) {
            tracing::debug!(field = name, status, "status not accepted, body skipped");
            return Ok(Self::new(None));
        }
        let body = decoder.body();
        if body.is_empty() {
            if S::allows_empty_content(status) {
                return Ok(Self::new(None));
            }
            return Err(DecodingError::data_corrupted(
                CodingPath::root(),
                format!("empty body for status {status}"),
            )
            .into());
        }
        decode_body(body).map(|value| Self::new(Some(value)))
    }
}

impl<T, S> DecodeField for ResponseErrorBody<T, S>
where
    T: DeserializeOwned + Formatted,
    S: ErrorBodyStrategy,
{
    fn decode_field(name: &str, decoder: &mut ResponseDecoder<'_>) -> Result<Self> {
        let status = decoder.status();
        let body = decoder.body();
        if !S::is_error(status) || body.is_empty() {
            tracing::trace!(field = name, status, "no error body");
            return Ok(Self::new(None));
        }
        decode_body(body).map(|value| Self::new(Some(value)))
    }
}

impl DecodeField for Cookies {
    fn decode_field(_name: &str, decoder: &mut ResponseDecoder<'_>) -> Result<Self> {
        let url = decoder
            .url()
            .ok_or_else(|| Error::invalid_response("cookies need the response URL"))?;
        if decoder.response().has_unreadable_header("Set-Cookie") {
            return Err(Error::invalid_response("Set-Cookie value is not text"));
        }
        let cookies = decoder
            .response()
            .header_all("Set-Cookie")
            .map(|raw| parse_set_cookie(raw, url))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(cookies))
    }
}

/// Parse one `Set-Cookie` value, defaulting domain and path from `url`.
fn parse_set_cookie(raw: &str, url: &Url) -> Result<Cookie<'static>> {
    let mut cookie = Cookie::parse(raw.to_string())
        .map_err(|e| Error::invalid_response(format!("malformed Set-Cookie '{raw}': {e}")))?;
    if cookie.domain().is_none()
        && let Some(host) = url.host_str()
    {
        cookie.set_domain(host.to_string());
    }
    if cookie.path().is_none() {
        cookie.set_path(default_cookie_path(url.path()));
    }
    Ok(cookie)
}

/// The directory of the request path, `/` at the top.
fn default_cookie_path(path: &str) -> String {
    match path.rsplit_once('/') {
        Some((directory, _)) if !directory.is_empty() => directory.to_string(),
        _ => "/".to_string(),
    }
}
