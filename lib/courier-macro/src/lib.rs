//! Derive macros for courier request and response definitions.
//!
//! - `#[derive(Request)]` - list a struct's fields into a request encoder
//! - `#[derive(Response)]` - read a struct's fields from a response decoder
//! - `#[derive(Body)]` - declare the wire format of a body type
//!
//! # Example
//!
//! ```ignore
//! use courier::prelude::*;
//!
//! #[derive(Request)]
//! struct GetUser {
//!     method: Method,
//!     path: Path,
//!     id: PathParameter<u64>,
//! }
//!
//! #[derive(Response)]
//! struct UserResponse {
//!     status: StatusCode,
//!     user: ResponseBody<User>,
//! }
//! ```

mod attrs;
mod body_derive;
mod request_derive;
mod response_derive;

use proc_macro::TokenStream;

/// Derive `EncodeRequest` for a struct with named fields.
///
/// Fields are encoded in declaration order. Each field's type decides where
/// it goes (see `courier::tag`); an untagged scalar is a query item.
///
/// # Struct Attributes
///
/// - `#[courier(rename_all = "camelCase")]` - Rename all fields using a case convention
///
/// # Field Attributes
///
/// - `#[courier(rename = "name")]` - Use a different wire name (a tag's runtime name still wins)
/// - `#[courier(skip)]` - Leave the field out of the request
///
/// # Example
///
/// ```ignore
/// #[derive(Request)]
/// struct Search {
///     #[courier(rename = "q")]
///     query: String,
///     page: Option<u32>,
///     accept: Header<&'static str>,
/// }
/// ```
#[proc_macro_derive(Request, attributes(courier))]
pub fn derive_request(input: TokenStream) -> TokenStream {
    request_derive::expand_request_derive(input.into())
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

/// Derive `DecodeResponse` for a struct with named fields.
///
/// # Struct Attributes
///
/// - `#[courier(rename_all = "Train-Case")]` - Rename all fields using a case convention
///
/// # Field Attributes
///
/// - `#[courier(rename = "name")]` - Use a different wire name
/// - `#[courier(skip)]` - Fill the field with `Default::default()`
///
/// # Example
///
/// ```ignore
/// #[derive(Response)]
/// struct UserResponse {
///     status: StatusCode,
///     #[courier(rename = "X-Request-Id")]
///     request_id: Header<Option<String>>,
///     user: ResponseBody<User>,
///     error: ResponseErrorBody<Problem>,
/// }
/// ```
#[proc_macro_derive(Response, attributes(courier))]
pub fn derive_response(input: TokenStream) -> TokenStream {
    response_derive::expand_response_derive(input.into())
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

/// Derive `Formatted` to declare a body type's wire format.
///
/// # Attributes
///
/// - `#[courier(format = "json")]` - One of `json` (default), `xml`, `form`, `plain`
/// - `#[courier(encoding = "utf-8")]` - Text encoding of plain bodies
///
/// # Example
///
/// ```ignore
/// #[derive(Serialize, Deserialize, Body)]
/// #[courier(format = "form")]
/// struct Login {
///     user: String,
///     password: String,
/// }
/// ```
#[proc_macro_derive(Body, attributes(courier))]
pub fn derive_body(input: TokenStream) -> TokenStream {
    body_derive::expand_body_derive(input.into())
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
