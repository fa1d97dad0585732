//! Status-driven strategies for response bodies.

use crate::status::{CLIENT_ERROR, SUCCESS};

/// Decides, from the status code, whether a [`ResponseBody`](crate::ResponseBody)
/// is decoded.
pub trait BodyStrategy {
    /// Returns `true` if the body should be decoded for `status`.
    fn validate(status: u16) -> bool;

    /// Returns `true` if an empty body is acceptable for `status`.
    ///
    /// An empty body that is not acceptable is a decoding error.
    fn allows_empty_content(status: u16) -> bool {
        let _ = status;
        false
    }
}

/// Decides, from the status code, whether a
/// [`ResponseErrorBody`](crate::ResponseErrorBody) is decoded.
pub trait ErrorBodyStrategy {
    /// Returns `true` if `status` carries this error body.
    fn is_error(status: u16) -> bool;
}

/// Any 2xx status; the body must not be empty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DefaultBodyStrategy;

impl BodyStrategy for DefaultBodyStrategy {
    fn validate(status: u16) -> bool {
        SUCCESS.contains(&status)
    }
}

/// Any 2xx status; `204 No Content` may come without a body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OptionalContent;

impl BodyStrategy for OptionalContent {
    fn validate(status: u16) -> bool {
        SUCCESS.contains(&status)
    }

    fn allows_empty_content(status: u16) -> bool {
        status == 204
    }
}

/// Exactly `200 OK`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Status200;

impl BodyStrategy for Status200 {
    fn validate(status: u16) -> bool {
        status == 200
    }
}

/// Exactly `201 Created`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Status201;

impl BodyStrategy for Status201 {
    fn validate(status: u16) -> bool {
        status == 201
    }
}

/// Exactly `303 See Other`, usually without a body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Status303;

impl BodyStrategy for Status303 {
    fn validate(status: u16) -> bool {
        status == 303
    }

    fn allows_empty_content(_status: u16) -> bool {
        true
    }
}

/// Any status from 400 up, non-standard codes above 599 included.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DefaultErrorStrategy;

impl ErrorBodyStrategy for DefaultErrorStrategy {
    fn is_error(status: u16) -> bool {
        status >= *CLIENT_ERROR.start()
    }
}

macro_rules! exact_error_strategy {
    ($($(#[$meta:meta])* $name:ident = $code:literal;)+) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
            pub struct $name;

            impl ErrorBodyStrategy for $name {
                fn is_error(status: u16) -> bool {
                    status == $code
                }
            }
        )+
    };
}

exact_error_strategy! {
    /// Exactly `400 Bad Request`.
    BadRequest = 400;
    /// Exactly `401 Unauthorized`.
    Unauthorized = 401;
    /// Exactly `403 Forbidden`.
    Forbidden = 403;
    /// Exactly `404 Not Found`.
    NotFound = 404;
    /// Exactly `410 Gone`.
    Gone = 410;
    /// Exactly `422 Unprocessable Entity`.
    UnprocessableEntity = 422;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_strategies() {
        assert!(DefaultBodyStrategy::validate(200));
        assert!(DefaultBodyStrategy::validate(299));
        assert!(!DefaultBodyStrategy::validate(300));
        assert!(!DefaultBodyStrategy::allows_empty_content(204));

        assert!(OptionalContent::validate(204));
        assert!(OptionalContent::allows_empty_content(204));
        assert!(!OptionalContent::allows_empty_content(200));

        assert!(Status200::validate(200));
        assert!(!Status200::validate(201));
        assert!(Status201::validate(201));
        assert!(!Status201::validate(200));

        assert!(Status303::validate(303));
        assert!(Status303::allows_empty_content(303));
        assert!(!Status303::validate(200));
    }

    #[test]
    fn error_strategies() {
        assert!(DefaultErrorStrategy::is_error(400));
        assert!(DefaultErrorStrategy::is_error(503));
        assert!(DefaultErrorStrategy::is_error(600));
        assert!(DefaultErrorStrategy::is_error(999));
        assert!(!DefaultErrorStrategy::is_error(399));
        assert!(!DefaultErrorStrategy::is_error(200));

        assert!(BadRequest::is_error(400));
        assert!(!BadRequest::is_error(401));
        assert!(Unauthorized::is_error(401));
        assert!(Forbidden::is_error(403));
        assert!(NotFound::is_error(404));
        assert!(Gone::is_error(410));
        assert!(UnprocessableEntity::is_error(422));
        assert!(!UnprocessableEntity::is_error(500));
    }
}
