//! Prelude module for convenient imports.
//!
//! ```
//! use courier_core::prelude::*;
//! ```

pub use crate::decode::{
    BadRequest, Forbidden, Gone, NotFound, OptionalContent, Status200, Status201, Status303,
    Unauthorized, UnprocessableEntity,
};
pub use crate::{
    Body, BodyFormat, CachePolicy, Cookies, CustomUrl, DecodeResponse, EncodeRequest, Error,
    Formatted, Header, HttpStatus, LenientHeaderStrategy, Method, Path, PathParameter, QueryItem,
    RequestCookies, ResponseBody, ResponseErrorBody, Result, StatusCode, TextEncoding, Transport,
};
