//! Core types and engines for the courier declarative HTTP layer.
//!
//! - [`tag`] - field tags that say where a value goes on the HTTP message
//! - [`encode`] - request encoding engine ([`encode_request`])
//! - [`decode`] - response decoding engine ([`decode_response`]) and the
//!   status-driven body strategies
//! - [`form`] - `application/x-www-form-urlencoded` codec
//! - [`BodyFormat`] and [`Formatted`] - body formats and their codecs
//! - [`HttpStatus`] and [`StatusClass`] - registered status codes
//! - [`Error`] and [`Result`] - error handling
//! - [`Transport`] - the seam to the network

mod case;
mod client;
pub mod decode;
pub mod encode;
mod error;
pub mod form;
mod format;
mod method;
mod path_template;
pub mod prelude;
mod request;
mod response;
mod role;
mod status;
pub mod tag;

pub use case::{header_names_match, normalize_header_name, to_camel_case, to_snake_case};
pub use client::Transport;
pub use decode::{
    BodyStrategy, DecodeField, DecodeResponse, DefaultBodyStrategy, DefaultErrorStrategy,
    DefaultHeaderStrategy, ErrorBodyStrategy, FromHeader, HeaderStrategy, LenientHeaderStrategy,
    ResponseDecoder, decode_response,
};
pub use encode::{EncodeField, EncodeRequest, RequestEncoder, encode_request};
pub use error::{CodingPath, DecodingError, Error, PathSegment, Result, Stage};
pub use format::{
    BodyFormat, EncodedBody, Formatted, TextEncoding, decode_body, encode_body, from_json,
    from_plain, from_xml, to_json, to_plain, to_xml,
};
pub use method::Method;
pub use path_template::{PathTemplate, validate_parameter_name};
pub use request::{CachePolicy, Request, RequestBuilder};
pub use response::Response;
pub use role::{FieldRole, MergeRule};
pub use status::{
    CLIENT_ERROR, HttpStatus, INFORMATIONAL, REDIRECTION, SERVER_ERROR, SUCCESS, StatusClass,
};
pub use tag::{
    Body, Cookies, CustomUrl, Header, HeaderValue, Path, PathParameter, PathValue, QueryItem,
    QueryValue, RequestCookies, ResponseBody, ResponseErrorBody, StatusCode, WireName, WireValue,
};
