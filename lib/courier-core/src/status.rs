//! HTTP status codes.
//!
//! [`HttpStatus`] is the closed set of registered codes, ordered by numeric
//! value. [`StatusClass`] answers range-membership questions on raw codes
//! (`StatusClass::Success.contains(204)`), which is how strategies classify
//! responses.

use std::ops::RangeInclusive;

use derive_more::Display;

use crate::Error;

macro_rules! http_statuses {
    ($( $(#[$doc:meta])* $variant:ident = $code:literal, $reason:literal; )+) => {
        /// A registered HTTP status code.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[repr(u16)]
        pub enum HttpStatus {
            $( $(#[$doc])* $variant = $code, )+
        }

        impl HttpStatus {
            /// Every registered status, in ascending order.
            pub const ALL: &'static [Self] = &[ $( Self::$variant, )+ ];

            /// Canonical reason phrase.
            #[must_use]
            pub const fn reason(self) -> &'static str {
                match self {
                    $( Self::$variant => $reason, )+
                }
            }

            /// Look up a registered status by its numeric code.
            #[must_use]
            pub const fn from_u16(code: u16) -> Option<Self> {
                match code {
                    $( $code => Some(Self::$variant), )+
                    _ => None,
                }
            }
        }
    };
}

http_statuses! {
    /// 100
    Continue = 100, "Continue";
    /// 101
    SwitchingProtocols = 101, "Switching Protocols";
    /// 102
    Processing = 102, "Processing";
    /// 103
    EarlyHints = 103, "Early Hints";
    /// 200
    Ok = 200, "OK";
    /// 201
    Created = 201, "Created";
    /// 202
    Accepted = 202, "Accepted";
    /// 203
    NonAuthoritativeInformation = 203, "Non-Authoritative Information";
    /// 204
    NoContent = 204, "No Content";
    /// 205
    ResetContent = 205, "Reset Content";
    /// 206
    PartialContent = 206, "Partial Content";
    /// 207
    MultiStatus = 207, "Multi-Status";
    /// 208
    AlreadyReported = 208, "Already Reported";
    /// 226
    ImUsed = 226, "IM Used";
    /// 300
    MultipleChoices = 300, "Multiple Choices";
    /// 301
    MovedPermanently = 301, "Moved Permanently";
    /// 302
    Found = 302, "Found";
    /// 303
    SeeOther = 303, "See Other";
    /// 304
    NotModified = 304, "Not Modified";
    /// 305
    UseProxy = 305, "Use Proxy";
    /// 307
    TemporaryRedirect = 307, "Temporary Redirect";
    /// 308
    PermanentRedirect = 308, "Permanent Redirect";
    /// 400
    BadRequest = 400, "Bad Request";
    /// 401
    Unauthorized = 401, "Unauthorized";
    /// 402
    PaymentRequired = 402, "Payment Required";
    /// 403
    Forbidden = 403, "Forbidden";
    /// 404
    NotFound = 404, "Not Found";
    /// 405
    MethodNotAllowed = 405, "Method Not Allowed";
    /// 406
    NotAcceptable = 406, "Not Acceptable";
    /// 407
    ProxyAuthenticationRequired = 407, "Proxy Authentication Required";
    /// 408
    RequestTimeout = 408, "Request Timeout";
    /// 409
    Conflict = 409, "Conflict";
    /// 410
    Gone = 410, "Gone";
    /// 411
    LengthRequired = 411, "Length Required";
    /// 412
    PreconditionFailed = 412, "Precondition Failed";
    /// 413
    PayloadTooLarge = 413, "Payload Too Large";
    /// 414
    UriTooLong = 414, "URI Too Long";
    /// 415
    UnsupportedMediaType = 415, "Unsupported Media Type";
    /// 416
    RangeNotSatisfiable = 416, "Range Not Satisfiable";
    /// 417
    ExpectationFailed = 417, "Expectation Failed";
    /// 418
    ImATeapot = 418, "I'm a teapot";
    /// 421
    MisdirectedRequest = 421, "Misdirected Request";
    /// 422
    UnprocessableEntity = 422, "Unprocessable Entity";
    /// 423
    Locked = 423, "Locked";
    /// 424
    FailedDependency = 424, "Failed Dependency";
    /// 425
    TooEarly = 425, "Too Early";
    /// 426
    UpgradeRequired = 426, "Upgrade Required";
    /// 428
    PreconditionRequired = 428, "Precondition Required";
    /// 429
    TooManyRequests = 429, "Too Many Requests";
    /// 431
    RequestHeaderFieldsTooLarge = 431, "Request Header Fields Too Large";
    /// 451
    UnavailableForLegalReasons = 451, "Unavailable For Legal Reasons";
    /// 500
    InternalServerError = 500, "Internal Server Error";
    /// 501
    NotImplemented = 501, "Not Implemented";
    /// 502
    BadGateway = 502, "Bad Gateway";
    /// 503
    ServiceUnavailable = 503, "Service Unavailable";
    /// 504
    GatewayTimeout = 504, "Gateway Timeout";
    /// 505
    HttpVersionNotSupported = 505, "HTTP Version Not Supported";
    /// 506
    VariantAlsoNegotiates = 506, "Variant Also Negotiates";
    /// 507
    InsufficientStorage = 507, "Insufficient Storage";
    /// 508
    LoopDetected = 508, "Loop Detected";
    /// 510
    NotExtended = 510, "Not Extended";
    /// 511
    NetworkAuthenticationRequired = 511, "Network Authentication Required";
}

impl HttpStatus {
    /// Numeric code.
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self as u16
    }

    /// The class (1xx..5xx) this status belongs to.
    #[must_use]
    pub const fn class(self) -> StatusClass {
        match StatusClass::of(self.as_u16()) {
            Some(class) => class,
            // Every registered code lies in 100..=599.
            None => StatusClass::ServerError,
        }
    }
}

impl std::fmt::Display for HttpStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.as_u16(), self.reason())
    }
}

impl TryFrom<u16> for HttpStatus {
    type Error = Error;

    fn try_from(code: u16) -> Result<Self, Self::Error> {
        Self::from_u16(code)
            .ok_or_else(|| Error::invalid_response(format!("unregistered HTTP status {code}")))
    }
}

impl From<HttpStatus> for u16 {
    fn from(status: HttpStatus) -> Self {
        status.as_u16()
    }
}

impl From<HttpStatus> for http::StatusCode {
    fn from(status: HttpStatus) -> Self {
        // Registered codes are always within 100..=999.
        Self::from_u16(status.as_u16()).unwrap_or(Self::INTERNAL_SERVER_ERROR)
    }
}

impl PartialEq<u16> for HttpStatus {
    fn eq(&self, other: &u16) -> bool {
        self.as_u16() == *other
    }
}

impl PartialOrd<u16> for HttpStatus {
    fn partial_cmp(&self, other: &u16) -> Option<std::cmp::Ordering> {
        self.as_u16().partial_cmp(other)
    }
}

/// Informational codes, 1xx.
pub const INFORMATIONAL: RangeInclusive<u16> = 100..=199;
/// Success codes, 2xx.
pub const SUCCESS: RangeInclusive<u16> = 200..=299;
/// Redirection codes, 3xx.
pub const REDIRECTION: RangeInclusive<u16> = 300..=399;
/// Client error codes, 4xx.
pub const CLIENT_ERROR: RangeInclusive<u16> = 400..=499;
/// Server error codes, 5xx.
pub const SERVER_ERROR: RangeInclusive<u16> = 500..=599;

/// A status class, i.e. a range of codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum StatusClass {
    /// 1xx
    #[display("1xx")]
    Informational,
    /// 2xx
    #[display("2xx")]
    Success,
    /// 3xx
    #[display("3xx")]
    Redirection,
    /// 4xx
    #[display("4xx")]
    ClientError,
    /// 5xx
    #[display("5xx")]
    ServerError,
}

impl StatusClass {
    /// The inclusive code range of this class.
    #[must_use]
    pub const fn range(self) -> RangeInclusive<u16> {
        match self {
            Self::Informational => INFORMATIONAL,
            Self::Success => SUCCESS,
            Self::Redirection => REDIRECTION,
            Self::ClientError => CLIENT_ERROR,
            Self::ServerError => SERVER_ERROR,
        }
    }

    /// Range membership for a raw code.
    #[must_use]
    pub const fn contains(self, code: u16) -> bool {
        let range = self.range();
        code >= *range.start() && code <= *range.end()
    }

    /// Class of a raw code, if it lies in 100..=599.
    #[must_use]
    pub const fn of(code: u16) -> Option<Self> {
        match code {
            100..=199 => Some(Self::Informational),
            200..=299 => Some(Self::Success),
            300..=399 => Some(Self::Redirection),
            400..=499 => Some(Self::ClientError),
            500..=599 => Some(Self::ServerError),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_ordering_follows_code() {
        assert!(HttpStatus::Ok < HttpStatus::Created);
        assert!(HttpStatus::NotFound > HttpStatus::BadRequest);
        assert!(HttpStatus::NoContent <= HttpStatus::NoContent);
        assert!(HttpStatus::Gone > 400);
        assert!(HttpStatus::Ok == 200);
    }

    #[test]
    fn all_statuses_are_sorted() {
        assert!(HttpStatus::ALL.windows(2).all(|pair| match pair {
            [a, b] => a < b,
            _ => true,
        }));
    }

    #[test]
    fn round_trips_through_u16() {
        for status in HttpStatus::ALL {
            assert_eq!(HttpStatus::from_u16(status.as_u16()), Some(*status));
        }
        assert!(HttpStatus::try_from(299).is_err());
    }

    #[test]
    fn class_membership() {
        assert!(StatusClass::Success.contains(200));
        assert!(StatusClass::Success.contains(299));
        assert!(!StatusClass::Success.contains(300));
        assert!(StatusClass::ClientError.contains(404));
        assert_eq!(StatusClass::of(503), Some(StatusClass::ServerError));
        assert_eq!(StatusClass::of(42), None);
        assert_eq!(HttpStatus::SeeOther.class(), StatusClass::Redirection);
    }

    #[test]
    fn display_and_http_conversion() {
        assert_eq!(HttpStatus::NotFound.to_string(), "404 Not Found");
        assert_eq!(
            http::StatusCode::from(HttpStatus::Created),
            http::StatusCode::CREATED
        );
    }
}
