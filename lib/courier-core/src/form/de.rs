use std::collections::BTreeMap;
use std::fmt;

use derive_more::{Display, Error};
use percent_encoding::percent_decode_str;
use serde::de::value::{MapDeserializer, SeqDeserializer};
use serde::de::{self, DeserializeOwned, Deserializer, IntoDeserializer, Unexpected, Visitor};
use serde_path_to_error::Segment;

use super::KeyDecoding;
use super::element::{ElementMap, UrlEncodedElement, push};
use crate::Result;
use crate::error::{CodingPath, DecodingError};

/// Parse a form string into its wire elements.
///
/// Empty input, and empty pieces between `&`, yield no elements. `+`
/// decodes to a space.
///
/// # Errors
///
/// Returns [`DecodingError::DataCorrupted`] when a piece has no `=` or is
/// not valid percent-encoded UTF-8.
pub fn parse(input: &str, keys: KeyDecoding) -> Result<ElementMap> {
    let mut elements = ElementMap::new();
    for piece in input.split('&').filter(|piece| !piece.is_empty()) {
        let Some((name, value)) = piece.split_once('=') else {
            return Err(DecodingError::data_corrupted(CodingPath::root(), "invalid data").into());
        };
        let name = keys.apply(decode_component(name)?);
        let value = decode_component(value)?;
        push(&mut elements, name, value);
    }
    Ok(elements)
}

/// Parse a form string and deserialize it.
///
/// # Errors
///
/// Returns [`crate::Error::Decoding`] with the coding path of the failing field.
pub fn from_str<T: DeserializeOwned>(input: &str, keys: KeyDecoding) -> Result<T> {
    let elements = parse(input, keys)?;
    from_elements(&elements)
}

/// Deserialize already parsed wire elements.
///
/// # Errors
///
/// Same as [`from_str`].
pub fn from_elements<T: DeserializeOwned>(elements: &ElementMap) -> Result<T> {
    let mut tree = Node::build(elements)?;
    loop {
        let error = match serde_path_to_error::deserialize(NodeDeserializer(&tree)) {
            Ok(value) => return Ok(value),
            Err(error) => error,
        };
        // An empty list encodes to no pairs at all, so its key shows up as
        // missing. Mark it absent and retry; absent keys read as empty.
        if let Some(field) = missing_field(error.inner()) {
            match tree.node_at_mut(error.path()) {
                Some(Node::Branch(children)) if !children.contains_key(field) => {
                    children.insert(field.to_string(), Node::Absent(field.to_string()));
                    continue;
                }
                Some(Node::Absent(_)) => {
                    let path = CodingPath::from(error.path());
                    return Err(DecodingError::KeyNotFound { path }.into());
                }
                _ => {}
            }
        }
        return Err(
            DecodingError::classify(CodingPath::from(error.path()), &error.inner().to_string())
                .into(),
        );
    }
}

/// The field name of a serde "missing field" error.
fn missing_field(error: &FormError) -> Option<&str> {
    error.0.strip_prefix("missing field `")?.strip_suffix('`')
}

fn decode_component(raw: &str) -> Result<String> {
    let raw = raw.replace('+', " ");
    percent_decode_str(&raw)
        .decode_utf8()
        .map(|text| text.into_owned())
        .map_err(|e| DecodingError::data_corrupted(CodingPath::root(), e.to_string()).into())
}

// ============================================================================
// Key tree
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
enum KeySegment {
    Key(String),
    Index(usize),
}

/// Split `items[0].name` into `items`, `0`, `name`.
fn key_segments(name: &str) -> Vec<KeySegment> {
    let mut segments = Vec::new();
    for part in name.split('.') {
        let (key, mut rest) = match part.find('[') {
            Some(position) => part.split_at(position),
            None => (part, ""),
        };
        let mut indices = Vec::new();
        while let Some(inner) = rest.strip_prefix('[') {
            let Some((index, tail)) = inner.split_once(']') else {
                break;
            };
            let Ok(index) = index.parse() else {
                break;
            };
            indices.push(KeySegment::Index(index));
            rest = tail;
        }
        if rest.is_empty() {
            segments.push(KeySegment::Key(key.to_string()));
            segments.extend(indices);
        } else {
            segments.push(KeySegment::Key(part.to_string()));
        }
    }
    segments
}

#[derive(Debug)]
enum Node {
    Leaf(UrlEncodedElement),
    Branch(BTreeMap<String, Node>),
    Items(BTreeMap<usize, Node>),
    /// A struct field with no pairs: an empty sequence or `None`, missing
    /// for anything else.
    Absent(String),
}

impl Node {
    fn build(elements: &ElementMap) -> Result<Self> {
        let mut root = Self::Branch(BTreeMap::new());
        for (name, element) in elements {
            if !root.insert(&key_segments(name), element.clone()) {
                return Err(DecodingError::data_corrupted(
                    CodingPath::key(name.as_str()),
                    "conflicting keys",
                )
                .into());
            }
        }
        Ok(root)
    }

    fn for_segment(segment: Option<&KeySegment>) -> Self {
        match segment {
            Some(KeySegment::Index(_)) => Self::Items(BTreeMap::new()),
            _ => Self::Branch(BTreeMap::new()),
        }
    }

    /// The node a deserialization path points at.
    fn node_at_mut(&mut self, path: &serde_path_to_error::Path) -> Option<&mut Self> {
        let mut node = self;
        for segment in path.iter() {
            node = match (node, segment) {
                (Self::Branch(children), Segment::Map { key }) => children.get_mut(key)?,
                (Self::Items(items), Segment::Seq { index }) => items.values_mut().nth(*index)?,
                _ => return None,
            };
        }
        Some(node)
    }

    fn insert(&mut self, segments: &[KeySegment], element: UrlEncodedElement) -> bool {
        let Some((first, rest)) = segments.split_first() else {
            if matches!(self, Self::Branch(children) if children.is_empty()) {
                *self = Self::Leaf(element);
                return true;
            }
            return false;
        };
        let next = rest.first();
        let child = match (self, first) {
            (Self::Branch(children), KeySegment::Key(key)) => children
                .entry(key.clone())
                .or_insert_with(|| Self::for_segment(next)),
            (Self::Items(items), KeySegment::Index(index)) => items
                .entry(*index)
                .or_insert_with(|| Self::for_segment(next)),
            _ => return false,
        };
        child.insert(rest, element)
    }
}

// ============================================================================
// Deserializers
// ============================================================================

#[derive(Debug, Display, Error)]
#[display("{_0}")]
struct FormError(#[error(not(source))] String);

impl de::Error for FormError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Self(msg.to_string())
    }
}

struct NodeDeserializer<'de>(&'de Node);

impl<'de> NodeDeserializer<'de> {
    fn text(&self) -> Option<TextDeserializer<'de>> {
        match self.0 {
            Node::Leaf(UrlEncodedElement::Text(text)) => Some(TextDeserializer(text)),
            _ => None,
        }
    }

    /// The error for a value that cannot be read as `expected`.
    fn mismatch(&self, expected: &dyn de::Expected) -> FormError {
        let unexpected = match self.0 {
            Node::Absent(field) => return missing(field),
            Node::Leaf(UrlEncodedElement::Text(text)) => Unexpected::Str(text),
            Node::Leaf(UrlEncodedElement::List(_)) | Node::Items(_) => Unexpected::Seq,
            Node::Branch(_) => Unexpected::Map,
        };
        de::Error::invalid_type(unexpected, expected)
    }
}

fn missing(field: &str) -> FormError {
    FormError(format!("missing field `{field}`"))
}

impl<'de> IntoDeserializer<'de, FormError> for NodeDeserializer<'de> {
    type Deserializer = Self;

    fn into_deserializer(self) -> Self {
        self
    }
}

macro_rules! forward_to_text {
    ($($method:ident)*) => {
        $(
            fn $method<V: Visitor<'de>>(self, visitor: V) -> std::result::Result<V::Value, FormError> {
                match self.text() {
                    Some(text) => text.$method(visitor),
                    None => Err(self.mismatch(&visitor)),
                }
            }
        )*
    };
}

impl<'de> Deserializer<'de> for NodeDeserializer<'de> {
    type Error = FormError;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> std::result::Result<V::Value, FormError> {
        match self.0 {
            Node::Leaf(UrlEncodedElement::Text(text)) => visitor.visit_borrowed_str(text),
            Node::Leaf(UrlEncodedElement::List(values)) => {
                visit_seq(visitor, values.iter().map(|value| TextDeserializer(value)))
            }
            Node::Items(items) => visit_seq(visitor, items.values().map(NodeDeserializer)),
            Node::Absent(field) => Err(missing(field)),
            Node::Branch(children) => {
                let mut map = MapDeserializer::new(
                    children
                        .iter()
                        .map(|(key, node)| (key.as_str(), NodeDeserializer(node))),
                );
                let value = visitor.visit_map(&mut map)?;
                map.end()?;
                Ok(value)
            }
        }
    }

    forward_to_text! {
        deserialize_bool
        deserialize_i8 deserialize_i16 deserialize_i32 deserialize_i64 deserialize_i128
        deserialize_u8 deserialize_u16 deserialize_u32 deserialize_u64 deserialize_u128
        deserialize_f32 deserialize_f64
        deserialize_char
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> std::result::Result<V::Value, FormError> {
        match self.0 {
            Node::Absent(_) => visitor.visit_none(),
            _ => visitor.visit_some(self),
        }
    }

    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> std::result::Result<V::Value, FormError> {
        match self.0 {
            Node::Leaf(UrlEncodedElement::Text(text)) => {
                visit_seq(visitor, std::iter::once(TextDeserializer(text)))
            }
            Node::Absent(_) => visit_seq(visitor, std::iter::empty::<TextDeserializer<'de>>()),
            Node::Branch(_) => Err(de::Error::invalid_type(Unexpected::Map, &visitor)),
            _ => self.deserialize_any(visitor),
        }
    }

    fn deserialize_tuple<V: Visitor<'de>>(
        self,
        _len: usize,
        visitor: V,
    ) -> std::result::Result<V::Value, FormError> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> std::result::Result<V::Value, FormError> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        name: &'static str,
        variants: &'static [&'static str],
        visitor: V,
    ) -> std::result::Result<V::Value, FormError> {
        match self.text() {
            Some(text) => text.deserialize_enum(name, variants, visitor),
            None => Err(self.mismatch(&visitor)),
        }
    }

    serde::forward_to_deserialize_any! {
        str string bytes byte_buf unit unit_struct tuple_struct map struct
        identifier ignored_any
    }
}

fn visit_seq<'de, V, I>(visitor: V, items: I) -> std::result::Result<V::Value, FormError>
where
    V: Visitor<'de>,
    I: Iterator,
    I::Item: IntoDeserializer<'de, FormError>,
{
    let mut seq = SeqDeserializer::new(items);
    let value = visitor.visit_seq(&mut seq)?;
    seq.end()?;
    Ok(value)
}

/// A single text value, parsed on demand into the requested primitive.
struct TextDeserializer<'de>(&'de str);

impl<'de> IntoDeserializer<'de, FormError> for TextDeserializer<'de> {
    type Deserializer = Self;

    fn into_deserializer(self) -> Self {
        self
    }
}

macro_rules! parse_text {
    ($($method:ident => $visit:ident,)*) => {
        $(
            fn $method<V: Visitor<'de>>(self, visitor: V) -> std::result::Result<V::Value, FormError> {
                match self.0.parse() {
                    Ok(value) => visitor.$visit(value),
                    Err(_) => Err(de::Error::invalid_type(Unexpected::Str(self.0), &visitor)),
                }
            }
        )*
    };
}

impl<'de> Deserializer<'de> for TextDeserializer<'de> {
    type Error = FormError;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> std::result::Result<V::Value, FormError> {
        visitor.visit_borrowed_str(self.0)
    }

    parse_text! {
        deserialize_bool => visit_bool,
        deserialize_i8 => visit_i8,
        deserialize_i16 => visit_i16,
        deserialize_i32 => visit_i32,
        deserialize_i64 => visit_i64,
        deserialize_i128 => visit_i128,
        deserialize_u8 => visit_u8,
        deserialize_u16 => visit_u16,
        deserialize_u32 => visit_u32,
        deserialize_u64 => visit_u64,
        deserialize_u128 => visit_u128,
        deserialize_f32 => visit_f32,
        deserialize_f64 => visit_f64,
        deserialize_char => visit_char,
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> std::result::Result<V::Value, FormError> {
        visitor.visit_some(self)
    }

    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> std::result::Result<V::Value, FormError> {
        visit_seq(visitor, std::iter::once(self))
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> std::result::Result<V::Value, FormError> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> std::result::Result<V::Value, FormError> {
        let variant: de::value::BorrowedStrDeserializer<'de, FormError> =
            de::value::BorrowedStrDeserializer::new(self.0);
        visitor.visit_enum(variant)
    }

    serde::forward_to_deserialize_any! {
        str string bytes byte_buf unit unit_struct tuple tuple_struct map struct
        identifier ignored_any
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    use super::*;
    use crate::form::{KeyEncoding, to_string};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Login {
        username: String,
        remember_me: bool,
        attempts: u32,
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "lowercase")]
    enum Kind {
        Paper,
        Digital,
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Item {
        name: String,
        quantity: u32,
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Address {
        city: String,
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Order {
        kind: Kind,
        address: Address,
        items: Vec<Item>,
        tags: Vec<String>,
        note: Option<String>,
    }

    #[test]
    fn empty_input_is_empty_map() {
        assert!(parse("", KeyDecoding::UseDefaultKeys).expect("parse").is_empty());
        assert!(parse("&&", KeyDecoding::UseDefaultKeys).expect("parse").is_empty());
    }

    #[test]
    fn piece_without_equals_is_invalid_data() {
        let error = parse("a=1&broken", KeyDecoding::UseDefaultKeys).expect_err("invalid");
        assert_invalid_data(&error);
    }

    fn assert_invalid_data(error: &crate::Error) {
        match error.decoding() {
            Some(DecodingError::DataCorrupted { message, .. }) => {
                assert_eq!(message, "invalid data");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn repeated_keys_accumulate_in_order() {
        let elements = parse("tag=b&x=1&tag=a&name=a+b%21", KeyDecoding::UseDefaultKeys)
            .expect("parse");
        assert_eq!(
            elements["tag"],
            UrlEncodedElement::List(vec!["b".to_string(), "a".to_string()])
        );
        assert_eq!(elements["x"], UrlEncodedElement::Text("1".to_string()));
        assert_eq!(elements["name"], UrlEncodedElement::Text("a b!".to_string()));
    }

    #[test]
    fn value_may_contain_equals() {
        let elements = parse("token=a=b", KeyDecoding::UseDefaultKeys).expect("parse");
        assert_eq!(elements["token"], UrlEncodedElement::Text("a=b".to_string()));
    }

    #[test]
    fn snake_case_keys_convert_to_camel_case() {
        let elements = parse("remember_me=true", KeyDecoding::ConvertFromSnakeCase)
            .expect("parse");
        assert!(elements.contains_key("rememberMe"));
    }

    #[test]
    fn simple_round_trip() {
        let login = Login {
            username: "alice smith".to_string(),
            remember_me: true,
            attempts: 3,
        };
        let encoded = to_string(&login, KeyEncoding::UseDefaultKeys).expect("encode");
        let decoded: Login = from_str(&encoded, KeyDecoding::UseDefaultKeys).expect("decode");
        assert_eq!(decoded, login);
    }

    #[test]
    fn nested_round_trip() {
        let order = Order {
            kind: Kind::Paper,
            address: Address {
                city: "Paris".to_string(),
            },
            items: vec![
                Item {
                    name: "pen".to_string(),
                    quantity: 2,
                },
                Item {
                    name: "ink".to_string(),
                    quantity: 1,
                },
            ],
            tags: vec!["a".to_string(), "b".to_string()],
            note: Some("fragile".to_string()),
        };
        let encoded = to_string(&order, KeyEncoding::UseDefaultKeys).expect("encode");
        let decoded: Order = from_str(&encoded, KeyDecoding::UseDefaultKeys).expect("decode");
        assert_eq!(decoded, order);
    }

    #[test]
    fn single_value_fills_a_sequence() {
        #[derive(Debug, Deserialize)]
        struct Tags {
            tags: Vec<u32>,
        }
        let tags: Tags = from_str("tags=7", KeyDecoding::UseDefaultKeys).expect("decode");
        assert_eq!(tags.tags, [7]);
    }

    #[test]
    fn absent_option_is_none() {
        #[derive(Debug, Deserialize)]
        struct Search {
            query: String,
            page: Option<u32>,
        }
        let search: Search = from_str("query=rust", KeyDecoding::UseDefaultKeys).expect("decode");
        assert_eq!(search.query, "rust");
        assert_eq!(search.page, None);
    }

    #[test]
    fn type_mismatch_carries_path() {
        let error = from_str::<Login>(
            "username=a&remember_me=maybe&attempts=1",
            KeyDecoding::UseDefaultKeys,
        )
        .expect_err("bool");
        let decoding = error.decoding().expect("decoding error");
        assert!(matches!(decoding, DecodingError::TypeMismatch { .. }));
        assert_eq!(decoding.path().to_string(), "remember_me");
    }

    #[test]
    fn missing_field_is_key_not_found() {
        let error =
            from_str::<Login>("username=a", KeyDecoding::UseDefaultKeys).expect_err("missing");
        assert!(matches!(
            error.decoding(),
            Some(DecodingError::KeyNotFound { .. })
        ));
    }

    #[test]
    fn missing_scalar_after_absent_list_reports_its_own_key() {
        #[derive(Debug, Deserialize)]
        struct Filter {
            labels: Vec<String>,
            owner: String,
        }
        let error = from_str::<Filter>("", KeyDecoding::UseDefaultKeys).expect_err("missing");
        let decoding = error.decoding().expect("decoding error");
        assert!(matches!(decoding, DecodingError::KeyNotFound { .. }));
        assert_eq!(decoding.path().to_string(), "owner");
    }

    #[test]
    fn empty_list_round_trips() {
        let order = Order {
            kind: Kind::Digital,
            address: Address {
                city: "Lyon".to_string(),
            },
            items: vec![],
            tags: vec![],
            note: None,
        };
        let encoded = to_string(&order, KeyEncoding::UseDefaultKeys).expect("encode");
        assert!(!encoded.contains("tags"));
        let decoded: Order = from_str(&encoded, KeyDecoding::UseDefaultKeys).expect("decode");
        assert_eq!(decoded, order);
    }

    #[test]
    fn empty_input_fills_list_fields() {
        #[derive(Debug, PartialEq, Deserialize)]
        struct OnlyLists {
            ids: Vec<u32>,
            names: Vec<String>,
        }
        let lists: OnlyLists = from_str("", KeyDecoding::UseDefaultKeys).expect("decode");
        assert_eq!(
            lists,
            OnlyLists {
                ids: vec![],
                names: vec![],
            }
        );
    }

    #[test]
    fn conflicting_keys_are_rejected() {
        let error = from_str::<serde_json::Value>("a=1&a.b=2", KeyDecoding::UseDefaultKeys)
            .expect_err("conflict");
        assert!(matches!(
            error.decoding(),
            Some(DecodingError::DataCorrupted { .. })
        ));
    }

    #[test]
    fn key_segments_parse_indices() {
        assert_eq!(
            key_segments("items[0].name"),
            vec![
                KeySegment::Key("items".to_string()),
                KeySegment::Index(0),
                KeySegment::Key("name".to_string()),
            ]
        );
        assert_eq!(
            key_segments("odd[x]"),
            vec![KeySegment::Key("odd[x]".to_string())]
        );
    }
}
