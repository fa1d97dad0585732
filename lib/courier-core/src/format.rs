//! Body formats and their codecs.
//!
//! A body type declares its wire format through [`Formatted`]; request and
//! response engines dispatch on [`Formatted::FORMAT`] to pick the codec.
//! Collections (`Vec<T>`) use the format of their element type.

use bytes::Bytes;
use derive_more::Display;
use serde::Serialize;
use serde::de::{DeserializeOwned, IntoDeserializer};
use serde_json::Value;

use crate::case::{convert_json_keys, to_snake_case};
use crate::error::{CodingPath, DecodingError};
use crate::form::{self, KeyDecoding, KeyEncoding};
use crate::{Error, Result};

/// Wire format of a body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum BodyFormat {
    /// JSON, keys in `snake_case`.
    #[display("JSON")]
    Json,
    /// XML.
    #[display("XML")]
    Xml,
    /// `application/x-www-form-urlencoded`.
    #[display("form")]
    FormUrlEncoded,
    /// Raw text in a declared [`TextEncoding`].
    #[display("plain text")]
    Plain,
}

impl BodyFormat {
    /// The MIME type for this format.
    #[must_use]
    pub const fn mime_type(self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::Xml => "text/xml",
            Self::FormUrlEncoded => "application/x-www-form-urlencoded",
            Self::Plain => "text/plain",
        }
    }

    /// The `Content-Type` a request body of this format is sent with.
    #[must_use]
    pub const fn request_content_type(self) -> &'static str {
        match self {
            // Plain bodies go out as application/json, not text/plain.
            Self::Plain => "application/json",
            other => other.mime_type(),
        }
    }
}

/// Text encodings accepted for plain bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display)]
pub enum TextEncoding {
    /// UTF-8.
    #[default]
    #[display("utf-8")]
    Utf8,
    /// 7-bit ASCII.
    #[display("us-ascii")]
    Ascii,
    /// ISO-8859-1.
    #[display("iso-8859-1")]
    Latin1,
    /// UTF-16, big endian.
    #[display("utf-16be")]
    Utf16Be,
    /// UTF-16, little endian.
    #[display("utf-16le")]
    Utf16Le,
}

impl TextEncoding {
    /// Encode `text`, or `None` if a character is not representable.
    #[must_use]
    pub fn encode(self, text: &str) -> Option<Vec<u8>> {
        match self {
            Self::Utf8 => Some(text.as_bytes().to_vec()),
            Self::Ascii => text.is_ascii().then(|| text.as_bytes().to_vec()),
            Self::Latin1 => text
                .chars()
                .map(|c| u8::try_from(u32::from(c)).ok())
                .collect(),
            Self::Utf16Be => Some(text.encode_utf16().flat_map(u16::to_be_bytes).collect()),
            Self::Utf16Le => Some(text.encode_utf16().flat_map(u16::to_le_bytes).collect()),
        }
    }

    /// Decode `bytes`, or `None` if they are not valid in this encoding.
    #[must_use]
    pub fn decode(self, bytes: &[u8]) -> Option<String> {
        match self {
            Self::Utf8 => std::str::from_utf8(bytes).ok().map(str::to_string),
            Self::Ascii => bytes
                .is_ascii()
                .then(|| bytes.iter().map(|&b| char::from(b)).collect()),
            Self::Latin1 => Some(bytes.iter().map(|&b| char::from(b)).collect()),
            Self::Utf16Be | Self::Utf16Le => {
                if bytes.len() % 2 != 0 {
                    return None;
                }
                let units: Vec<u16> = bytes
                    .chunks_exact(2)
                    .map(|pair| match (self, pair) {
                        (Self::Utf16Be, &[hi, lo]) => u16::from_be_bytes([hi, lo]),
                        (_, &[lo, hi]) => u16::from_le_bytes([lo, hi]),
                        _ => 0,
                    })
                    .collect();
                String::from_utf16(&units).ok()
            }
        }
    }
}

/// Declares the wire format of a body type.
///
/// Usually derived with `#[derive(Body)]`:
///
/// ```ignore
/// #[derive(Serialize, Deserialize, Body)]
/// #[courier(format = "json")]
/// struct User { id: u64, name: String }
/// ```
pub trait Formatted {
    /// The body format.
    const FORMAT: BodyFormat;

    /// Text encoding for [`BodyFormat::Plain`] bodies.
    const TEXT_ENCODING: TextEncoding = TextEncoding::Utf8;
}

impl<T: Formatted> Formatted for Vec<T> {
    const FORMAT: BodyFormat = T::FORMAT;
    const TEXT_ENCODING: TextEncoding = T::TEXT_ENCODING;
}

impl Formatted for String {
    const FORMAT: BodyFormat = BodyFormat::Plain;
}

impl Formatted for str {
    const FORMAT: BodyFormat = BodyFormat::Plain;
}

impl Formatted for Value {
    const FORMAT: BodyFormat = BodyFormat::Json;
}

/// A serialized request body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedBody {
    /// Format the bytes were produced with.
    pub format: BodyFormat,
    /// Serialized bytes.
    pub bytes: Bytes,
}

impl EncodedBody {
    /// The default `Content-Type` for this body.
    #[must_use]
    pub const fn content_type(&self) -> &'static str {
        self.format.request_content_type()
    }
}

/// Serialize a body value with the codec selected by its format.
///
/// # Errors
///
/// Returns [`Error::Serialization`] when the codec fails and
/// [`Error::FailedToEncodePlainText`] when a plain body is not
/// representable in its encoding.
pub fn encode_body<T>(value: &T) -> Result<EncodedBody>
where
    T: Serialize + Formatted + ?Sized,
{
    let bytes = match T::FORMAT {
        BodyFormat::Json => to_json(value)?,
        BodyFormat::Xml => to_xml(value)?,
        BodyFormat::FormUrlEncoded => Bytes::from(form::to_string(
            value,
            KeyEncoding::ConvertToSnakeCase,
        )?),
        BodyFormat::Plain => to_plain(value, T::TEXT_ENCODING)?,
    };
    tracing::trace!(format = %T::FORMAT, len = bytes.len(), "encoded body");
    Ok(EncodedBody {
        format: T::FORMAT,
        bytes,
    })
}

/// Deserialize a body with the codec selected by the target's format.
///
/// # Errors
///
/// Returns [`Error::Decoding`] with the coding path of the failure.
pub fn decode_body<T>(bytes: &[u8]) -> Result<T>
where
    T: DeserializeOwned + Formatted,
{
    tracing::trace!(format = %T::FORMAT, len = bytes.len(), "decoding body");
    match T::FORMAT {
        BodyFormat::Json => from_json(bytes),
        BodyFormat::Xml => from_xml(bytes),
        BodyFormat::FormUrlEncoded => {
            let text = std::str::from_utf8(bytes).map_err(|e| {
                DecodingError::data_corrupted(CodingPath::root(), e.to_string())
            })?;
            form::from_str(text, KeyDecoding::UseDefaultKeys)
        }
        BodyFormat::Plain => from_plain(bytes, T::TEXT_ENCODING),
    }
}

/// Serialize a value to JSON bytes with `snake_case` keys.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
///
/// # Example
///
/// ```
/// use courier_core::to_json;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// #[serde(rename_all = "camelCase")]
/// struct User { user_name: String }
///
/// let user = User { user_name: "Alice".to_string() };
/// let bytes = to_json(&user).expect("serialize");
/// assert_eq!(bytes.as_ref(), br#"{"user_name":"Alice"}"#);
/// ```
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<Bytes> {
    let value = serde_json::to_value(value)
        .map_err(|e| Error::serialization(BodyFormat::Json, e.to_string()))?;
    let value = convert_json_keys(value, to_snake_case);
    serde_json::to_vec(&value)
        .map(Bytes::from)
        .map_err(|e| Error::serialization(BodyFormat::Json, e.to_string()))
}

/// Deserialize JSON bytes with path-aware errors.
///
/// Object keys are normalised to `snake_case` first, so `userName` on the
/// wire fills a `user_name` field.
///
/// # Errors
///
/// Returns [`Error::Decoding`] whose coding path points at the failing
/// field (e.g. `user.address.city`).
///
/// # Example
///
/// ```
/// use courier_core::from_json;
/// use serde::Deserialize;
///
/// #[derive(Debug, PartialEq, Deserialize)]
/// struct User { user_name: String }
///
/// let user: User = from_json(br#"{"userName":"Alice"}"#).expect("deserialize");
/// assert_eq!(user, User { user_name: "Alice".to_string() });
/// ```
pub fn from_json<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let value: Value = serde_json::from_slice(bytes)
        .map_err(|e| DecodingError::data_corrupted(CodingPath::root(), e.to_string()))?;
    let value = convert_json_keys(value, to_snake_case);
    serde_path_to_error::deserialize(value)
        .map_err(|e| DecodingError::from_json(&e).into())
}

/// Serialize a value to XML bytes.
///
/// # Errors
///
/// Returns an error if XML serialization fails.
pub fn to_xml<T: Serialize + ?Sized>(value: &T) -> Result<Bytes> {
    quick_xml::se::to_string(value)
        .map(|s| Bytes::from(s.into_bytes()))
        .map_err(|e| Error::serialization(BodyFormat::Xml, e.to_string()))
}

/// Deserialize XML bytes with path-aware errors.
///
/// # Errors
///
/// Returns [`Error::Decoding`] if the document is malformed or does not match `T`.
pub fn from_xml<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| DecodingError::data_corrupted(CodingPath::root(), e.to_string()))?;
    let mut deserializer = quick_xml::de::Deserializer::from_str(text);
    serde_path_to_error::deserialize(&mut deserializer).map_err(|e| {
        DecodingError::classify(CodingPath::from(e.path()), &e.inner().to_string()).into()
    })
}

/// Serialize a scalar value as text in the given encoding.
///
/// # Errors
///
/// Returns [`Error::Serialization`] if the value is not a string, number
/// or boolean, and [`Error::FailedToEncodePlainText`] if the text cannot
/// be represented in `encoding`.
pub fn to_plain<T: Serialize + ?Sized>(value: &T, encoding: TextEncoding) -> Result<Bytes> {
    let text = match serde_json::to_value(value)
        .map_err(|e| Error::serialization(BodyFormat::Plain, e.to_string()))?
    {
        Value::String(text) => text,
        Value::Number(number) => number.to_string(),
        Value::Bool(flag) => flag.to_string(),
        other => {
            return Err(Error::serialization(
                BodyFormat::Plain,
                format!("expected a string, number or boolean, found {other}"),
            ));
        }
    };
    encoding
        .encode(&text)
        .map(Bytes::from)
        .ok_or(Error::FailedToEncodePlainText(encoding))
}

/// Deserialize text in the given encoding.
///
/// # Errors
///
/// Returns [`Error::Decoding`] if the bytes are not valid in `encoding` or
/// the text does not fit `T`.
pub fn from_plain<T: DeserializeOwned>(bytes: &[u8], encoding: TextEncoding) -> Result<T> {
    let text = encoding.decode(bytes).ok_or_else(|| {
        DecodingError::data_corrupted(CodingPath::root(), format!("body is not valid {encoding}"))
    })?;
    let deserializer: serde::de::value::StringDeserializer<serde::de::value::Error> =
        text.into_deserializer();
    T::deserialize(deserializer)
        .map_err(|e| DecodingError::classify(CodingPath::root(), &e.to_string()).into())
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct User {
        id: u64,
        user_name: String,
    }

    impl Formatted for User {
        const FORMAT: BodyFormat = BodyFormat::Json;
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    #[serde(rename = "note")]
    struct Note {
        title: String,
    }

    impl Formatted for Note {
        const FORMAT: BodyFormat = BodyFormat::Xml;
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Login {
        username: String,
        remember_me: bool,
    }

    impl Formatted for Login {
        const FORMAT: BodyFormat = BodyFormat::FormUrlEncoded;
    }

    struct Latin1Text;

    impl Formatted for Latin1Text {
        const FORMAT: BodyFormat = BodyFormat::Plain;
        const TEXT_ENCODING: TextEncoding = TextEncoding::Latin1;
    }

    #[test]
    fn content_types() {
        assert_eq!(BodyFormat::Json.request_content_type(), "application/json");
        assert_eq!(BodyFormat::Xml.request_content_type(), "text/xml");
        assert_eq!(
            BodyFormat::FormUrlEncoded.request_content_type(),
            "application/x-www-form-urlencoded"
        );
        assert_eq!(BodyFormat::Plain.request_content_type(), "application/json");
        assert_eq!(BodyFormat::Plain.mime_type(), "text/plain");
    }

    #[test]
    fn json_body_uses_snake_case_keys() {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Camel {
            first_name: String,
        }
        impl Formatted for Camel {
            const FORMAT: BodyFormat = BodyFormat::Json;
        }

        let body = encode_body(&Camel {
            first_name: "Ada".to_string(),
        })
        .expect("encode");
        assert_eq!(body.format, BodyFormat::Json);
        assert_eq!(body.bytes.as_ref(), br#"{"first_name":"Ada"}"#);
    }

    #[test]
    fn json_decode_accepts_camel_case_wire_keys() {
        let user: User = decode_body(br#"{"id":1,"userName":"alice"}"#).expect("decode");
        assert_eq!(
            user,
            User {
                id: 1,
                user_name: "alice".to_string()
            }
        );
    }

    #[test]
    fn collection_uses_element_format() {
        assert_eq!(<Vec<User> as Formatted>::FORMAT, BodyFormat::Json);
        let users: Vec<User> = decode_body(br#"[{"id":1,"user_name":"a"}]"#).expect("decode");
        assert_eq!(users.len(), 1);
    }

    #[test]
    fn json_decode_error_has_path() {
        let error = decode_body::<User>(br#"{"id":"x","user_name":"a"}"#).expect_err("mismatch");
        let decoding = error.decoding().expect("decoding error");
        assert_eq!(decoding.path().to_string(), "id");
        assert!(matches!(decoding, DecodingError::TypeMismatch { .. }));
    }

    #[test]
    fn json_decode_garbage_is_data_corrupted() {
        let error = decode_body::<User>(b"not json").expect_err("garbage");
        assert!(matches!(
            error.decoding(),
            Some(DecodingError::DataCorrupted { .. })
        ));
    }

    #[test]
    fn xml_round_trip() {
        let note = Note {
            title: "hello".to_string(),
        };
        let body = encode_body(&note).expect("encode");
        assert_eq!(body.bytes.as_ref(), b"<note><title>hello</title></note>");
        let decoded: Note = decode_body(&body.bytes).expect("decode");
        assert_eq!(decoded, note);
    }

    #[test]
    fn form_body() {
        let login = Login {
            username: "alice".to_string(),
            remember_me: true,
        };
        let body = encode_body(&login).expect("encode");
        assert_eq!(body.bytes.as_ref(), b"remember_me=true&username=alice");
        let decoded: Login = decode_body(&body.bytes).expect("decode");
        assert_eq!(decoded, login);
    }

    #[test]
    fn plain_text_encodings() {
        assert_eq!(
            to_plain("héllo", TextEncoding::Latin1).expect("latin1"),
            Bytes::from_static(b"h\xe9llo")
        );
        assert_eq!(
            to_plain(&42, TextEncoding::Utf8).expect("number"),
            Bytes::from_static(b"42")
        );
        assert_eq!(
            to_plain("hi", TextEncoding::Utf16Be).expect("utf16"),
            Bytes::from_static(&[0, b'h', 0, b'i'])
        );

        let error = to_plain("héllo", TextEncoding::Ascii).expect_err("not ascii");
        assert!(matches!(
            error,
            Error::FailedToEncodePlainText(TextEncoding::Ascii)
        ));
        assert_eq!(Latin1Text::TEXT_ENCODING, TextEncoding::Latin1);
    }

    #[test]
    fn plain_text_decoding() {
        let text: String = from_plain(b"h\xe9llo", TextEncoding::Latin1).expect("latin1");
        assert_eq!(text, "héllo");
        let text: String = from_plain(&[b'h', 0, b'i', 0], TextEncoding::Utf16Le).expect("utf16");
        assert_eq!(text, "hi");
        assert!(from_plain::<String>(&[0xff, 0xfe, 0xfd], TextEncoding::Utf8).is_err());
    }

    #[test]
    fn plain_rejects_structured_values() {
        let error = to_plain(&User {
            id: 1,
            user_name: "a".to_string(),
        }, TextEncoding::Utf8)
        .expect_err("struct");
        assert!(matches!(error, Error::Serialization { format: BodyFormat::Plain, .. }));
    }
}
