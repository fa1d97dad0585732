//! Field tags.
//!
//! A tag wraps a value and says where it goes on the HTTP message: query
//! string, header, path, cookie or body. Tags that carry a name accept an
//! optional runtime wire name, which beats the `#[courier(rename)]`
//! attribute, which beats the field name.
//!
//! Request fields: [`QueryItem`], [`Header`], [`PathParameter`], [`Path`],
//! [`CustomUrl`], [`RequestCookies`], [`CachePolicy`](crate::CachePolicy),
//! [`Body`] and [`Method`](crate::Method). An untagged field whose type is a
//! [`QueryValue`] is a query item named after the field.
//!
//! Response fields: [`StatusCode`], [`Header`], [`ResponseBody`],
//! [`ResponseErrorBody`] and [`Cookies`]. An untagged field is read from
//! the JSON body object.

use std::borrow::Cow;
use std::collections::{BTreeSet, HashSet};
use std::hash::BuildHasher;
use std::marker::PhantomData;
use std::ops::Deref;

use cookie::Cookie;

use crate::decode::{DefaultBodyStrategy, DefaultErrorStrategy, DefaultHeaderStrategy};
use crate::status::{HttpStatus, StatusClass};

/// A wire name, usually a string literal.
pub type WireName = Cow<'static, str>;

// ============================================================================
// Value capabilities
// ============================================================================

/// A scalar with a textual wire form.
///
/// `None` means "absent": the field is omitted from the request.
pub trait WireValue {
    /// The wire text, or `None` when absent.
    fn to_wire(&self) -> Option<String>;
}

macro_rules! display_wire_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl WireValue for $ty {
                fn to_wire(&self) -> Option<String> {
                    Some(self.to_string())
                }
            }
        )*
    };
}

display_wire_value!(
    bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64,
);

impl WireValue for str {
    fn to_wire(&self) -> Option<String> {
        Some(self.to_owned())
    }
}

impl WireValue for String {
    fn to_wire(&self) -> Option<String> {
        Some(self.clone())
    }
}

impl WireValue for Cow<'_, str> {
    fn to_wire(&self) -> Option<String> {
        Some(self.clone().into_owned())
    }
}

impl<T: WireValue> WireValue for Option<T> {
    fn to_wire(&self) -> Option<String> {
        self.as_ref().and_then(WireValue::to_wire)
    }
}

impl<T: WireValue + ?Sized> WireValue for &T {
    fn to_wire(&self) -> Option<String> {
        (**self).to_wire()
    }
}

/// A value that becomes zero or more query entries under one name.
///
/// Collections emit one entry per element, never a delimited string.
pub trait QueryValue {
    /// Wire values, in order.
    fn query_values(&self) -> Vec<String>;
}

impl<T: WireValue + ?Sized> QueryValue for T {
    fn query_values(&self) -> Vec<String> {
        self.to_wire().into_iter().collect()
    }
}

impl<T: WireValue> QueryValue for [T] {
    fn query_values(&self) -> Vec<String> {
        self.iter().filter_map(WireValue::to_wire).collect()
    }
}

impl<T: WireValue> QueryValue for Vec<T> {
    fn query_values(&self) -> Vec<String> {
        self.as_slice().query_values()
    }
}

impl<T: WireValue> QueryValue for BTreeSet<T> {
    fn query_values(&self) -> Vec<String> {
        self.iter().filter_map(WireValue::to_wire).collect()
    }
}

impl<T: WireValue, H: BuildHasher> QueryValue for HashSet<T, H> {
    fn query_values(&self) -> Vec<String> {
        self.iter().filter_map(WireValue::to_wire).collect()
    }
}

/// A value that becomes one header field value.
///
/// Collections are combined into a single value joined by `", "`.
pub trait HeaderValue {
    /// The field value, or `None` when absent.
    fn header_value(&self) -> Option<String>;
}

impl<T: WireValue + ?Sized> HeaderValue for T {
    fn header_value(&self) -> Option<String> {
        self.to_wire()
    }
}

impl<T: WireValue> HeaderValue for [T] {
    fn header_value(&self) -> Option<String> {
        join_header_values(self.iter())
    }
}

impl<T: WireValue> HeaderValue for Vec<T> {
    fn header_value(&self) -> Option<String> {
        join_header_values(self.iter())
    }
}

impl<T: WireValue> HeaderValue for BTreeSet<T> {
    fn header_value(&self) -> Option<String> {
        join_header_values(self.iter())
    }
}

fn join_header_values<'a, T: WireValue + 'a>(values: impl Iterator<Item = &'a T>) -> Option<String> {
    let values: Vec<String> = values.filter_map(WireValue::to_wire).collect();
    (!values.is_empty()).then(|| values.join(", "))
}

/// A value substituted into a `{name}` path placeholder.
///
/// `None` is the unset state: the placeholder is left as it is.
pub trait PathValue {
    /// The unencoded segment text, or `None` when unset.
    fn path_value(&self) -> Option<String>;
}

impl<T: WireValue + ?Sized> PathValue for T {
    fn path_value(&self) -> Option<String> {
        self.to_wire()
    }
}

// ============================================================================
// Named request tags
// ============================================================================

macro_rules! named_tag {
    ($(#[$meta:meta])* $tag:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
        pub struct $tag<T> {
            name: Option<WireName>,
            value: T,
        }

        impl<T> $tag<T> {
            /// Wrap a value; the wire name comes from the field.
            #[must_use]
            pub const fn new(value: T) -> Self {
                Self { name: None, value }
            }

            /// Wrap a value with an explicit wire name.
            #[must_use]
            pub fn named(name: impl Into<WireName>, value: T) -> Self {
                Self {
                    name: Some(name.into()),
                    value,
                }
            }

            /// The runtime wire name, if any.
            #[must_use]
            pub fn name(&self) -> Option<&str> {
                self.name.as_deref()
            }

            /// The wire name to use for a field called `field`.
            #[must_use]
            pub fn wire_name<'a>(&'a self, field: &'a str) -> &'a str {
                self.name.as_deref().unwrap_or(field)
            }

            /// The wrapped value.
            #[must_use]
            pub const fn value(&self) -> &T {
                &self.value
            }

            /// Unwrap the value.
            #[must_use]
            pub fn into_inner(self) -> T {
                self.value
            }
        }

        impl<T> From<T> for $tag<T> {
            fn from(value: T) -> Self {
                Self::new(value)
            }
        }

        impl<T> Deref for $tag<T> {
            type Target = T;

            fn deref(&self) -> &T {
                &self.value
            }
        }
    };
}

named_tag! {
    /// A query item.
    ///
    /// ```
    /// use courier_core::QueryItem;
    ///
    /// let page = QueryItem::new(2_u32);
    /// let name = QueryItem::named("custom_name", "This custom name");
    /// assert_eq!(name.wire_name("name"), "custom_name");
    /// assert_eq!(page.wire_name("page"), "page");
    /// ```
    QueryItem
}

named_tag! {
    /// A `{name}` path parameter.
    PathParameter
}

/// A header field.
///
/// On requests the value is a [`HeaderValue`]. On responses it is read with
/// the header strategy `S`, see [`HeaderStrategy`](crate::HeaderStrategy).
pub struct Header<T, S = DefaultHeaderStrategy> {
    name: Option<WireName>,
    value: T,
    strategy: PhantomData<fn() -> S>,
}

impl<T, S> Header<T, S> {
    /// Wrap a value; the wire name comes from the field.
    #[must_use]
    pub const fn new(value: T) -> Self {
        Self {
            name: None,
            value,
            strategy: PhantomData,
        }
    }

    /// Wrap a value with an explicit header name.
    #[must_use]
    pub fn named(name: impl Into<WireName>, value: T) -> Self {
        Self {
            name: Some(name.into()),
            value,
            strategy: PhantomData,
        }
    }

    /// The runtime header name, if any.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The header name to use for a field called `field`.
    #[must_use]
    pub fn wire_name<'a>(&'a self, field: &'a str) -> &'a str {
        self.name.as_deref().unwrap_or(field)
    }

    /// The wrapped value.
    #[must_use]
    pub const fn value(&self) -> &T {
        &self.value
    }

    /// Unwrap the value.
    #[must_use]
    pub fn into_inner(self) -> T {
        self.value
    }
}

impl<T: std::fmt::Debug, S> std::fmt::Debug for Header<T, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Header")
            .field("name", &self.name)
            .field("value", &self.value)
            .finish()
    }
}

impl<T: Clone, S> Clone for Header<T, S> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            value: self.value.clone(),
            strategy: PhantomData,
        }
    }
}

impl<T: PartialEq, S> PartialEq for Header<T, S> {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.value == other.value
    }
}

impl<T: Default, S> Default for Header<T, S> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T, S> From<T> for Header<T, S> {
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

impl<T, S> Deref for Header<T, S> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

// ============================================================================
// Unnamed request tags
// ============================================================================

/// The path template, e.g. `/users/{id}/posts`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Path(WireName);

impl Path {
    /// Create a path template.
    #[must_use]
    pub fn new(template: impl Into<WireName>) -> Self {
        Self(template.into())
    }

    /// The template text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&'static str> for Path {
    fn from(template: &'static str) -> Self {
        Self::new(template)
    }
}

impl From<String> for Path {
    fn from(template: String) -> Self {
        Self::new(template)
    }
}

/// A full URL replacing the client base URL for one request.
///
/// Its own query items are kept and declared query items are appended.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct CustomUrl(Option<String>);

impl CustomUrl {
    /// Override the base URL.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self(Some(url.into()))
    }

    /// No override; the client base URL is used.
    #[must_use]
    pub const fn none() -> Self {
        Self(None)
    }

    /// The URL text, if set.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

impl From<&str> for CustomUrl {
    fn from(url: &str) -> Self {
        Self::new(url)
    }
}

impl From<String> for CustomUrl {
    fn from(url: String) -> Self {
        Self::new(url)
    }
}

impl From<Option<String>> for CustomUrl {
    fn from(url: Option<String>) -> Self {
        Self(url)
    }
}

/// Cookies sent in the `Cookie` header.
///
/// An explicit `Cookie` header field wins over these.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RequestCookies(Vec<Cookie<'static>>);

impl RequestCookies {
    /// No cookies.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Add a cookie.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.push(Cookie::new(name.into(), value.into()));
        self
    }

    /// The cookies, in order.
    #[must_use]
    pub fn cookies(&self) -> &[Cookie<'static>] {
        &self.0
    }

    /// `name=value` pairs joined by `; `.
    #[must_use]
    pub fn header_value(&self) -> Option<String> {
        let pairs: Vec<String> = self
            .0
            .iter()
            .map(|cookie| cookie.stripped().to_string())
            .collect();
        (!pairs.is_empty()).then(|| pairs.join("; "))
    }
}

impl FromIterator<Cookie<'static>> for RequestCookies {
    fn from_iter<I: IntoIterator<Item = Cookie<'static>>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// The request body.
///
/// The body format comes from `T`'s [`Formatted`](crate::Formatted) impl.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Body<T>(pub T);

impl<T> Body<T> {
    /// Wrap a body value.
    #[must_use]
    pub const fn new(value: T) -> Self {
        Self(value)
    }

    /// Unwrap the value.
    #[must_use]
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Deref for Body<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

// ============================================================================
// Response tags
// ============================================================================

/// The numeric response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StatusCode(u16);

impl StatusCode {
    /// Wrap a raw status code.
    #[must_use]
    pub const fn new(code: u16) -> Self {
        Self(code)
    }

    /// The raw code.
    #[must_use]
    pub const fn code(self) -> u16 {
        self.0
    }

    /// The registered status, if any.
    #[must_use]
    pub const fn status(self) -> Option<HttpStatus> {
        HttpStatus::from_u16(self.0)
    }

    /// The status class, if the code lies in 100..=599.
    #[must_use]
    pub const fn class(self) -> Option<StatusClass> {
        StatusClass::of(self.0)
    }
}

impl PartialEq<u16> for StatusCode {
    fn eq(&self, other: &u16) -> bool {
        self.0 == *other
    }
}

impl PartialEq<HttpStatus> for StatusCode {
    fn eq(&self, other: &HttpStatus) -> bool {
        self.0 == other.as_u16()
    }
}

macro_rules! optional_body_tag {
    ($(#[$meta:meta])* $tag:ident, $default:ty) => {
        $(#[$meta])*
        pub struct $tag<T, S = $default> {
            value: Option<T>,
            strategy: PhantomData<fn() -> S>,
        }

        impl<T, S> $tag<T, S> {
            /// Wrap a decoded value.
            #[must_use]
            pub const fn new(value: Option<T>) -> Self {
                Self {
                    value,
                    strategy: PhantomData,
                }
            }

            /// The decoded value, if the body applied to this status.
            #[must_use]
            pub const fn value(&self) -> Option<&T> {
                self.value.as_ref()
            }

            /// Unwrap the value.
            #[must_use]
            pub fn into_inner(self) -> Option<T> {
                self.value
            }

            /// Returns `true` if a value was decoded.
            #[must_use]
            pub const fn is_some(&self) -> bool {
                self.value.is_some()
            }

            /// Returns `true` if no value was decoded.
            #[must_use]
            pub const fn is_none(&self) -> bool {
                self.value.is_none()
            }
        }

        impl<T: std::fmt::Debug, S> std::fmt::Debug for $tag<T, S> {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.debug_tuple(stringify!($tag)).field(&self.value).finish()
            }
        }

        impl<T: Clone, S> Clone for $tag<T, S> {
            fn clone(&self) -> Self {
                Self::new(self.value.clone())
            }
        }

        impl<T: PartialEq, S> PartialEq for $tag<T, S> {
            fn eq(&self, other: &Self) -> bool {
                self.value == other.value
            }
        }

        impl<T, S> Default for $tag<T, S> {
            fn default() -> Self {
                Self::new(None)
            }
        }
    };
}

optional_body_tag! {
    /// A response body, decoded only when the strategy `S` accepts the status.
    ///
    /// See [`BodyStrategy`](crate::BodyStrategy) for the built-in strategies.
    ResponseBody, DefaultBodyStrategy
}

optional_body_tag! {
    /// An error body, decoded only when the strategy `S` classifies the
    /// status as an error.
    ///
    /// See [`ErrorBodyStrategy`](crate::ErrorBodyStrategy).
    ResponseErrorBody, DefaultErrorStrategy
}

/// Cookies set by the response through `Set-Cookie`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Cookies(Vec<Cookie<'static>>);

impl Cookies {
    /// Wrap parsed cookies.
    #[must_use]
    pub const fn new(cookies: Vec<Cookie<'static>>) -> Self {
        Self(cookies)
    }

    /// Find a cookie by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Cookie<'static>> {
        self.0.iter().find(|cookie| cookie.name() == name)
    }

    /// All cookies, in header order.
    pub fn iter(&self) -> impl Iterator<Item = &Cookie<'static>> {
        self.0.iter()
    }

    /// Number of cookies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the response set no cookies.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl IntoIterator for Cookies {
    type Item = Cookie<'static>;
    type IntoIter = std::vec::IntoIter<Cookie<'static>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
