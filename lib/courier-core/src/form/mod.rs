//! `application/x-www-form-urlencoded` codec.
//!
//! Values are flattened to a map of wire names to [`UrlEncodedElement`]s:
//!
//! - nested structs use dotted names (`address.city=Paris`)
//! - sequences of scalars repeat the same name (`tags=a&tags=b`)
//! - sequences of structs are indexed (`items[0].name=pen`)
//! - `None` and unit values are omitted
//!
//! Pairs are emitted sorted by name, so the output is deterministic.
//!
//! ```
//! use courier_core::form::{self, KeyDecoding, KeyEncoding};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, PartialEq, Serialize, Deserialize)]
//! struct Search { query: String, tags: Vec<String> }
//!
//! let search = Search { query: "rust lang".to_string(), tags: vec!["a".into(), "b".into()] };
//! let encoded = form::to_string(&search, KeyEncoding::UseDefaultKeys).expect("encode");
//! assert_eq!(encoded, "query=rust%20lang&tags=a&tags=b");
//!
//! let decoded: Search = form::from_str(&encoded, KeyDecoding::UseDefaultKeys).expect("decode");
//! assert_eq!(decoded, search);
//! ```

mod de;
mod element;
mod ser;

use std::borrow::Cow;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

pub use self::de::{from_elements, from_str, parse};
pub use self::element::{ElementMap, UrlEncodedElement};
pub use self::ser::{serialize_elements, to_elements, to_string};
use crate::case::{to_camel_case, to_snake_case};

/// Characters escaped in query and form components.
///
/// Everything except the RFC 3986 unreserved set, so a space becomes `%20`.
pub(crate) const QUERY_COMPONENT_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// How field names are written on the wire when encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum KeyEncoding {
    /// Use the serialized field names as they are.
    #[default]
    UseDefaultKeys,
    /// Convert `camelCase` names to `snake_case`.
    ConvertToSnakeCase,
}

impl KeyEncoding {
    pub(crate) fn apply<'a>(self, key: &'a str) -> Cow<'a, str> {
        match self {
            Self::UseDefaultKeys => Cow::Borrowed(key),
            Self::ConvertToSnakeCase => Cow::Owned(to_snake_case(key)),
        }
    }
}

/// How wire names are read back when decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum KeyDecoding {
    /// Use the wire names as they are.
    #[default]
    UseDefaultKeys,
    /// Convert `snake_case` wire names to `camelCase`.
    ConvertFromSnakeCase,
}

impl KeyDecoding {
    pub(crate) fn apply(self, key: String) -> String {
        match self {
            Self::UseDefaultKeys => key,
            Self::ConvertFromSnakeCase => key
                .split('.')
                .map(to_camel_case)
                .collect::<Vec<_>>()
                .join("."),
        }
    }
}

/// Percent-encode a single `name=value` pair.
pub(crate) fn encode_pair(name: &str, value: &str) -> String {
    format!(
        "{}={}",
        utf8_percent_encode(name, QUERY_COMPONENT_ENCODE_SET),
        utf8_percent_encode(value, QUERY_COMPONENT_ENCODE_SET)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_encoding_uses_percent_twenty() {
        assert_eq!(encode_pair("custom name", "a&b=c"), "custom%20name=a%26b%3Dc");
        assert_eq!(encode_pair("key", "-._~"), "key=-._~");
    }

    #[test]
    fn key_decoding_converts_each_segment() {
        assert_eq!(
            KeyDecoding::ConvertFromSnakeCase.apply("home_address.zip_code".to_string()),
            "homeAddress.zipCode"
        );
        assert_eq!(
            KeyDecoding::UseDefaultKeys.apply("home_address".to_string()),
            "home_address"
        );
    }
}
