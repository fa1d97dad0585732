//! Tracing middleware for the transport stack.
//!
//! Every exchange runs inside an `http_request` span keyed by the route
//! template rather than the concrete URL, so `/users/1` and `/users/2` both
//! group under `/users/{id}`.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

use bytes::Bytes;
use tower::{Layer, Service};
use tracing::{Instrument, Level, debug, info, span, warn};

use crate::{Error, Request, Response, Result, StatusClass};

/// How much of each exchange [`Logging`] records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    /// Headers, body sizes and cache policy, at debug level.
    Debug,
    /// URL, status and timing, at info level.
    #[default]
    Info,
}

/// Wraps a transport service in [`Logging`].
///
/// # Example
///
/// ```no_run
/// use courier::HyperTransport;
/// use courier::middleware::LoggingLayer;
///
/// let transport = HyperTransport::builder()
///     .layer(LoggingLayer::debug())
///     .build();
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingLayer {
    level: LogLevel,
}

impl LoggingLayer {
    /// A layer logging summaries at info level.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A layer also logging headers and body sizes at debug level.
    #[must_use]
    pub const fn debug() -> Self {
        Self {
            level: LogLevel::Debug,
        }
    }

    /// The level this layer logs at.
    #[must_use]
    pub const fn level(&self) -> LogLevel {
        self.level
    }
}

impl<S> Layer<S> for LoggingLayer {
    type Service = Logging<S>;

    fn layer(&self, inner: S) -> Self::Service {
        Logging::with_level(inner, self.level)
    }
}

/// Records each request, its outcome and its duration.
#[derive(Debug, Clone)]
pub struct Logging<S> {
    inner: S,
    level: LogLevel,
}

impl<S> Logging<S> {
    /// Log summaries of the exchanges going through `inner`.
    pub const fn new(inner: S) -> Self {
        Self::with_level(inner, LogLevel::Info)
    }

    /// Log the exchanges going through `inner` at `level`.
    pub const fn with_level(inner: S, level: LogLevel) -> Self {
        Self { inner, level }
    }
}

impl<S> Service<Request<Bytes>> for Logging<S>
where
    S: Service<Request<Bytes>, Response = Response<Bytes>, Error = Error> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response<Bytes>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<()>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<Bytes>) -> Self::Future {
        let level = self.level;
        let span = span!(
            Level::INFO,
            "http_request",
            method = %request.method(),
            route = %route(&request),
        );

        // The ready service handles this call; its clone waits for the next one.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        Box::pin(
            async move {
                record_request(level, &request);
                let start = Instant::now();
                let result = inner.call(request).await;
                record_outcome(level, &result, start.elapsed());
                result
            }
            .instrument(span),
        )
    }
}

/// The path template the request was built from, or its URL path.
fn route(request: &Request<Bytes>) -> String {
    request
        .path_template()
        .map_or_else(|| request.url().path().to_string(), ToString::to_string)
}

fn record_request(level: LogLevel, request: &Request<Bytes>) {
    match level {
        LogLevel::Debug => debug!(
            url = %request.url(),
            headers = ?request.headers(),
            body_len = request.body().map_or(0, Bytes::len),
            cache_policy = %request.cache_policy(),
            "sending request"
        ),
        LogLevel::Info => info!(url = %request.url(), "sending request"),
    }
}

fn record_outcome(level: LogLevel, result: &Result<Response<Bytes>>, elapsed: Duration) {
    let elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
    let response = match result {
        Ok(response) => response,
        Err(err) => {
            warn!(error = %err, stage = %err.stage(), elapsed_ms, "request failed");
            return;
        }
    };

    let status = response.status();
    match response.class() {
        Some(StatusClass::Success | StatusClass::Redirection) => {
            info!(status, elapsed_ms, "request completed");
        }
        Some(class) => warn!(status, %class, elapsed_ms, "request completed with an error status"),
        None => warn!(status, elapsed_ms, "request completed with a non-standard status"),
    }
    if level == LogLevel::Debug {
        debug!(
            headers = ?response.headers(),
            body_len = response.body().len(),
            "received response"
        );
    }
}
