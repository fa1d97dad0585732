//! Error types for courier.
//!
//! Every engine call either succeeds or fails with exactly one [`Error`].
//! [`Error::stage`] tells whether the failure happened while encoding the
//! request, on the transport, or while decoding the response.

use std::fmt;

use derive_more::{Display, Error, From};

use crate::format::{BodyFormat, TextEncoding};

// ============================================================================
// Coding Path
// ============================================================================

/// A single step in a [`CodingPath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// A named field or map key.
    Key(String),
    /// A position in a sequence.
    Index(usize),
}

/// Location inside a nested value where a decode failed.
///
/// Displayed as `user.addresses[1].city`; the root is displayed as `.`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct CodingPath(Vec<PathSegment>);

impl CodingPath {
    /// The empty (root) path.
    #[must_use]
    pub const fn root() -> Self {
        Self(Vec::new())
    }

    /// A path with a single key segment.
    #[must_use]
    pub fn key(name: impl Into<String>) -> Self {
        Self(vec![PathSegment::Key(name.into())])
    }

    /// Returns a copy extended with a key segment.
    #[must_use]
    pub fn join_key(&self, name: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Key(name.into()));
        Self(segments)
    }

    /// Returns a copy extended with an index segment.
    #[must_use]
    pub fn join_index(&self, index: usize) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Index(index));
        Self(segments)
    }

    /// Returns a copy extended with every segment of `other`.
    #[must_use]
    pub fn join(&self, other: &Self) -> Self {
        let mut segments = self.0.clone();
        segments.extend(other.0.iter().cloned());
        Self(segments)
    }

    /// Path segments from the root.
    #[must_use]
    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    /// Returns `true` for the root path.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for CodingPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str(".");
        }
        for (position, segment) in self.0.iter().enumerate() {
            match segment {
                PathSegment::Key(key) if position == 0 => f.write_str(key)?,
                PathSegment::Key(key) => write!(f, ".{key}")?,
                PathSegment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

impl From<&serde_path_to_error::Path> for CodingPath {
    fn from(path: &serde_path_to_error::Path) -> Self {
        use serde_path_to_error::Segment;

        let segments = path
            .iter()
            .filter_map(|segment| match segment {
                Segment::Seq { index } => Some(PathSegment::Index(*index)),
                Segment::Map { key } => Some(PathSegment::Key(key.clone())),
                Segment::Enum { variant } => Some(PathSegment::Key(variant.clone())),
                Segment::Unknown => None,
            })
            .collect();
        Self(segments)
    }
}

// ============================================================================
// Decoding Error
// ============================================================================

/// Failure while turning response data into a typed value.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum DecodingError {
    /// A required key is absent.
    #[display("key not found at '{path}'")]
    KeyNotFound {
        /// Where the key was expected.
        path: CodingPath,
    },

    /// A value exists but has the wrong shape.
    #[display("type mismatch at '{path}': {message}")]
    TypeMismatch {
        /// Where the mismatch occurred.
        path: CodingPath,
        /// Codec message.
        message: String,
    },

    /// A required value is absent or null.
    #[display("value not found at '{path}'")]
    ValueNotFound {
        /// Where the value was expected.
        path: CodingPath,
    },

    /// The data is not valid for its format.
    #[display("data corrupted at '{path}': {message}")]
    DataCorrupted {
        /// Where the data became unreadable.
        path: CodingPath,
        /// Codec message.
        message: String,
    },
}

impl DecodingError {
    /// The coding path carried by this error.
    #[must_use]
    pub const fn path(&self) -> &CodingPath {
        match self {
            Self::KeyNotFound { path }
            | Self::TypeMismatch { path, .. }
            | Self::ValueNotFound { path }
            | Self::DataCorrupted { path, .. } => path,
        }
    }

    /// The same error with its path nested under `prefix`.
    #[must_use]
    pub fn nested_in(self, prefix: &CodingPath) -> Self {
        match self {
            Self::KeyNotFound { path } => Self::KeyNotFound {
                path: prefix.join(&path),
            },
            Self::TypeMismatch { path, message } => Self::TypeMismatch {
                path: prefix.join(&path),
                message,
            },
            Self::ValueNotFound { path } => Self::ValueNotFound {
                path: prefix.join(&path),
            },
            Self::DataCorrupted { path, message } => Self::DataCorrupted {
                path: prefix.join(&path),
                message,
            },
        }
    }

    /// Create a data-corrupted error.
    #[must_use]
    pub fn data_corrupted(path: CodingPath, message: impl Into<String>) -> Self {
        Self::DataCorrupted {
            path,
            message: message.into(),
        }
    }

    /// Create a type-mismatch error.
    #[must_use]
    pub fn type_mismatch(path: CodingPath, message: impl Into<String>) -> Self {
        Self::TypeMismatch {
            path,
            message: message.into(),
        }
    }

    /// Classify a serde error message raised at `path`.
    ///
    /// serde codecs only expose their failures as text, so the kind is
    /// recovered from the standard serde message prefixes.
    #[must_use]
    pub fn classify(path: CodingPath, message: &str) -> Self {
        if let Some(field) = missing_field_name(message) {
            return Self::KeyNotFound {
                path: path.join_key(field),
            };
        }
        if message.starts_with("invalid type: null") || message.starts_with("invalid type: unit") {
            return Self::ValueNotFound { path };
        }
        if message.starts_with("invalid type") || message.starts_with("invalid length") {
            return Self::type_mismatch(path, message);
        }
        Self::data_corrupted(path, message)
    }

    /// Build from a path-tracked `serde_json` failure.
    #[must_use]
    pub fn from_json(error: &serde_path_to_error::Error<serde_json::Error>) -> Self {
        use serde_json::error::Category;

        let path = CodingPath::from(error.path());
        let inner = error.inner();
        match inner.classify() {
            Category::Data => Self::classify(path, &inner.to_string()),
            Category::Syntax | Category::Eof | Category::Io => {
                Self::data_corrupted(path, inner.to_string())
            }
        }
    }
}

/// Extracts `city` from serde's "missing field `city`" message.
fn missing_field_name(message: &str) -> Option<&str> {
    let rest = message.strip_prefix("missing field `")?;
    rest.split('`').next()
}

// ============================================================================
// Error Type
// ============================================================================

/// Which part of the encode → send → decode pipeline failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum Stage {
    /// Building the HTTP request from a request definition.
    #[display("encode")]
    Encode,
    /// Sending the request or receiving the response.
    #[display("transport")]
    Transport,
    /// Building a response definition from the HTTP response.
    #[display("decode")]
    Decode,
    /// Anything else.
    #[display("unknown")]
    Unknown,
}

/// Main error type for courier operations.
#[derive(Debug, Display, Error, From)]
pub enum Error {
    /// The base URL cannot carry a path (e.g. `mailto:`).
    #[display("invalid base URL")]
    #[from(skip)]
    InvalidBaseUrl,

    /// The custom URL field could not be parsed.
    #[display("invalid custom URL: {_0}")]
    #[from(skip)]
    InvalidCustomUrl(#[error(not(source))] String),

    /// Final URL assembly failed.
    #[display("failed to create URL")]
    #[from(skip)]
    FailedToCreateUrl,

    /// A path parameter name cannot appear in a `{name}` placeholder.
    #[display("invalid path parameter name: {_0}")]
    #[from(skip)]
    InvalidPathParameterName(#[error(not(source))] String),

    /// A plain-text body cannot be represented in its declared encoding.
    #[display("failed to encode plain text as {_0}")]
    #[from(skip)]
    FailedToEncodePlainText(#[error(not(source))] TextEncoding),

    /// A body value could not be serialized.
    #[display("{format} serialization error: {message}")]
    #[from(skip)]
    Serialization {
        /// Body format being produced.
        format: BodyFormat,
        /// Codec message.
        message: String,
    },

    /// The response cannot be decoded at all (missing URL, non-text headers...).
    #[display("invalid response: {_0}")]
    #[from(skip)]
    InvalidResponse(#[error(not(source))] String),

    /// A response field failed to decode.
    #[display("decoding error: {_0}")]
    #[from]
    Decoding(DecodingError),

    /// Network/connection errors.
    #[display("connection error: {_0}")]
    #[from(skip)]
    Connection(#[error(not(source))] String),

    /// TLS/SSL errors.
    #[display("TLS error: {_0}")]
    #[from(skip)]
    Tls(#[error(not(source))] String),

    /// Request timeout.
    #[display("request timeout")]
    #[from(skip)]
    Timeout,

    /// The transport rejected the assembled request.
    #[display("invalid request: {_0}")]
    #[from(skip)]
    InvalidRequest(#[error(not(source))] String),

    /// Catch-all for failures outside the known taxonomy.
    #[display("unknown error: {_0}")]
    #[from(skip)]
    Unknown(#[error(not(source))] String),
}

/// Result type alias using [`crate::Error`].
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a serialization error for the given body format.
    #[must_use]
    pub fn serialization(format: BodyFormat, message: impl Into<String>) -> Self {
        Self::Serialization {
            format,
            message: message.into(),
        }
    }

    /// Create an invalid response error.
    #[must_use]
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse(message.into())
    }

    /// Create a connection error.
    #[must_use]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    /// Create a TLS error.
    #[must_use]
    pub fn tls(message: impl Into<String>) -> Self {
        Self::Tls(message.into())
    }

    /// Create an invalid request error.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Wrap any other failure.
    #[must_use]
    pub fn unknown(error: impl fmt::Display) -> Self {
        Self::Unknown(error.to_string())
    }

    /// The pipeline stage this error belongs to.
    #[must_use]
    pub const fn stage(&self) -> Stage {
        match self {
            Self::InvalidBaseUrl
            | Self::InvalidCustomUrl(_)
            | Self::FailedToCreateUrl
            | Self::InvalidPathParameterName(_)
            | Self::FailedToEncodePlainText(_)
            | Self::Serialization { .. } => Stage::Encode,
            Self::Connection(_) | Self::Tls(_) | Self::Timeout | Self::InvalidRequest(_) => {
                Stage::Transport
            }
            Self::InvalidResponse(_) | Self::Decoding(_) => Stage::Decode,
            Self::Unknown(_) => Stage::Unknown,
        }
    }

    /// The decoding error, if this is one.
    #[must_use]
    pub const fn decoding(&self) -> Option<&DecodingError> {
        match self {
            Self::Decoding(error) => Some(error),
            _ => None,
        }
    }

    /// Returns `true` if this is a timeout error.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }

    /// Returns `true` if this is a connection error.
    #[must_use]
    pub const fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_))
    }
}
