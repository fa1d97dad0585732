//! Reading typed values out of header text.

use crate::error::{CodingPath, DecodingError};
use crate::Result;

/// A type that can be parsed from a header field value.
pub trait FromHeader: Sized {
    /// Parse the raw value, or `None` if it is not valid for this type.
    fn parse(raw: &str) -> Option<Self>;

    /// The value used when the header is absent, or `None` if the header
    /// is required.
    fn missing() -> Option<Self> {
        None
    }
}

macro_rules! from_str_header {
    ($($ty:ty),* $(,)?) => {
        $(
            impl FromHeader for $ty {
                fn parse(raw: &str) -> Option<Self> {
                    raw.trim().parse().ok()
                }
            }
        )*
    };
}

from_str_header!(
    bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64,
);

impl FromHeader for String {
    fn parse(raw: &str) -> Option<Self> {
        Some(raw.to_string())
    }
}

impl<T: FromHeader> FromHeader for Option<T> {
    fn parse(raw: &str) -> Option<Self> {
        T::parse(raw).map(Some)
    }

    fn missing() -> Option<Self> {
        Some(None)
    }
}

/// Comma-separated list.
impl<T: FromHeader> FromHeader for Vec<T> {
    fn parse(raw: &str) -> Option<Self> {
        raw.split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(T::parse)
            .collect()
    }

    fn missing() -> Option<Self> {
        Some(Vec::new())
    }
}

/// How a [`Header`](crate::Header) response field turns raw text into `T`.
pub trait HeaderStrategy {
    /// Decode the header found at `path`, `raw` being `None` when absent.
    ///
    /// # Errors
    ///
    /// Returns a [`DecodingError`] when the value is required but absent,
    /// or present but unparseable.
    fn decode<T: FromHeader>(path: CodingPath, raw: Option<&str>) -> Result<T>;
}

/// Absent required headers and unparseable values are errors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DefaultHeaderStrategy;

impl HeaderStrategy for DefaultHeaderStrategy {
    fn decode<T: FromHeader>(path: CodingPath, raw: Option<&str>) -> Result<T> {
        match raw {
            Some(raw) => T::parse(raw).ok_or_else(|| {
                DecodingError::type_mismatch(path, format!("cannot parse header value '{raw}'"))
                    .into()
            }),
            None => T::missing().ok_or_else(|| DecodingError::ValueNotFound { path }.into()),
        }
    }
}

/// Unparseable values are treated as absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LenientHeaderStrategy;

impl HeaderStrategy for LenientHeaderStrategy {
    fn decode<T: FromHeader>(path: CodingPath, raw: Option<&str>) -> Result<T> {
        if let Some(value) = raw.and_then(T::parse) {
            return Ok(value);
        }
        if raw.is_some() {
            tracing::debug!(%path, "ignoring unparseable header value");
        }
        T::missing().ok_or_else(|| DecodingError::ValueNotFound { path }.into())
    }
}

#[cfg(test)]
mod tests {
    use assert2::{check, let_assert};

    use super::*;
    use crate::Error;

    fn path() -> CodingPath {
        CodingPath::key("X-Count")
    }

    #[test]
    fn scalars_parse_from_text() {
        check!(u32::parse(" 42 ") == Some(42));
        check!(bool::parse("true") == Some(true));
        check!(f64::parse("1.5") == Some(1.5));
        check!(String::parse("a, b") == Some("a, b".to_string()));
        check!(u32::parse("x").is_none());
    }

    #[test]
    fn lists_split_on_commas() {
        check!(Vec::<u32>::parse("1, 2,3") == Some(vec![1, 2, 3]));
        check!(Vec::<u32>::parse("1, x").is_none());
        check!(Vec::<u32>::missing() == Some(Vec::new()));
    }

    #[test]
    fn default_strategy() {
        let count: u32 = DefaultHeaderStrategy::decode(path(), Some("7")).expect("decode");
        check!(count == 7);

        let_assert!(
            Err(Error::Decoding(DecodingError::ValueNotFound { path: at })) =
                DefaultHeaderStrategy::decode::<u32>(path(), None)
        );
        check!(at == path());

        let_assert!(
            Err(Error::Decoding(DecodingError::TypeMismatch { .. })) =
                DefaultHeaderStrategy::decode::<u32>(path(), Some("seven"))
        );

        let absent: Option<u32> = DefaultHeaderStrategy::decode(path(), None).expect("decode");
        check!(absent.is_none());
        check!(DefaultHeaderStrategy::decode::<Option<u32>>(path(), Some("seven")).is_err());
    }

    #[test]
    fn lenient_strategy() {
        let value: Option<u32> =
            LenientHeaderStrategy::decode(path(), Some("seven")).expect("decode");
        check!(value.is_none());

        let result = LenientHeaderStrategy::decode::<u32>(path(), Some("seven"));
        check!(matches!(
            result,
            Err(Error::Decoding(DecodingError::ValueNotFound { .. }))
        ));
    }
}
