//! Declarative HTTP request/response marshalling for Rust.
//!
//! Describe a request's shape and a response's shape as plain structs;
//! courier turns the first into an HTTP request and the second back out of
//! the HTTP response.
//!
//! # Example
//!
//! ```ignore
//! use courier::prelude::*;
//!
//! #[derive(Debug, Deserialize, Body)]
//! pub struct User {
//!     id: u64,
//!     display_name: String,
//! }
//!
//! #[derive(Request)]
//! #[courier(rename_all = "camelCase")]
//! pub struct GetUser {
//!     path: Path,
//!     id: PathParameter<u64>,
//!     include_groups: Option<bool>,
//!     accept: Header<&'static str>,
//! }
//!
//! #[derive(Response)]
//! pub struct UserResponse {
//!     status: StatusCode,
//!     user: ResponseBody<User, Status200>,
//!     error: ResponseErrorBody<Problem>,
//! }
//!
//! let client = Client::hyper("https://api.example.com")?;
//! let response: UserResponse = client
//!     .send(&GetUser {
//!         path: "/users/{id}".into(),
//!         id: PathParameter::new(42),
//!         include_groups: Some(true),
//!         accept: Header::new("application/json"),
//!     })
//!     .await?;
//! ```
//!
//! The same request can be sent with a callback ([`Client::send_with`]) or
//! as a one-item stream ([`Client::send_stream`]).

mod client;
mod config;
mod connector;
pub mod middleware;
pub mod prelude;
mod transport;

pub use client::Client;
pub use config::{ClientConfig, ClientConfigBuilder};
pub use transport::{BoxedService, HyperTransport, HyperTransportBuilder, ServiceFuture};

// Re-export tower for middleware composition
pub use tower;

// Re-export core types
pub use courier_core::{
    BodyFormat, BodyStrategy, CachePolicy, CodingPath, DecodeField, DecodeResponse,
    DecodingError, DefaultBodyStrategy, DefaultErrorStrategy, DefaultHeaderStrategy,
    EncodeField, EncodeRequest, EncodedBody, Error, ErrorBodyStrategy, FieldRole, Formatted,
    FromHeader, HeaderStrategy, HttpStatus, LenientHeaderStrategy, MergeRule, Method,
    PathSegment, PathTemplate, Request, RequestBuilder, RequestEncoder, Response,
    ResponseDecoder, Result, Stage, StatusClass, TextEncoding, Transport, decode_body,
    decode_response, encode_body, encode_request,
};
pub use courier_core::{decode, encode, form, tag};
pub use courier_core::{
    Body, Cookies, CustomUrl, Header, HeaderValue, Path, PathParameter, PathValue,
    QueryItem, QueryValue, RequestCookies, ResponseBody, ResponseErrorBody, StatusCode,
    WireName, WireValue,
};

// Re-export crates for generated and user code
pub use url;

// Re-export macros
pub use courier_macro::{Body, Request, Response};
