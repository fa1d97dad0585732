//! Default transport using hyper-util.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper_rustls::HttpsConnector;
use hyper_util::{
    client::legacy::{Client, connect::HttpConnector},
    rt::TokioExecutor,
};
use tower::Layer;
use tower::util::{BoxCloneService, ServiceExt};
use tower_service::Service;

use crate::middleware::LoggingLayer;
use crate::{
    Error, Request, Response, Result, Transport,
    config::{ClientConfig, ClientConfigBuilder},
    connector::https_connector,
};

/// A layer stack with every layer applied, type-erased.
pub type BoxedService = BoxCloneService<Request<Bytes>, Response<Bytes>, Error>;

/// The future returned by [`BoxedService`] and [`HyperTransport`].
pub type ServiceFuture = Pin<Box<dyn Future<Output = Result<Response<Bytes>>> + Send + 'static>>;

/// The layer stack shared by every clone of a [`HyperTransport`].
///
/// `BoxCloneService` is `Send` but not `Sync`, while [`Transport`] needs
/// both, so the stack sits behind a mutex and each call works on a clone.
#[derive(Clone)]
struct SharedStack(Arc<Mutex<BoxedService>>);

impl SharedStack {
    fn new(stack: BoxedService) -> Self {
        Self(Arc::new(Mutex::new(stack)))
    }

    fn dispatch(&self, request: Request<Bytes>) -> ServiceFuture {
        let stack = self
            .0
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone();
        // `oneshot` waits for `poll_ready`, which readiness-based layers rely on.
        Box::pin(stack.oneshot(request))
    }
}

/// Headers the transport adds when the encoded request lacks them.
fn default_headers<'a>(
    config: &'a ClientConfig,
    request: &Request<Bytes>,
) -> Vec<(http::HeaderName, &'a str)> {
    let mut defaults = Vec::with_capacity(2);
    if request.header("Cache-Control").is_none()
        && let Some(directive) = request.cache_policy().cache_control()
    {
        defaults.push((http::header::CACHE_CONTROL, directive));
    }
    if request.header("User-Agent").is_none()
        && let Some(agent) = config.user_agent.as_deref()
    {
        defaults.push((http::header::USER_AGENT, agent));
    }
    defaults
}

/// Response headers as ordered pairs; repeated headers stay separate.
///
/// Values that are not UTF-8 cannot be paired; their names come back in the
/// second list so decoding can report them.
fn header_pairs(headers: &http::HeaderMap) -> (Vec<(String, String)>, Vec<String>) {
    let mut pairs = Vec::with_capacity(headers.len());
    let mut unreadable = Vec::new();
    for (name, value) in headers {
        match std::str::from_utf8(value.as_bytes()) {
            Ok(text) => pairs.push((name.to_string(), text.to_string())),
            Err(_) => {
                tracing::debug!(header = %name, "response header value is not text");
                unreadable.push(name.to_string());
            }
        }
    }
    (pairs, unreadable)
}

#[allow(clippy::needless_pass_by_value)]
fn classify_hyper_error(err: hyper_util::client::legacy::Error) -> Error {
    let message = err.to_string();
    let lower = message.to_ascii_lowercase();
    let tls = ["ssl", "tls", "certificate"].iter().any(|hint| lower.contains(hint));
    if tls && !err.is_connect() {
        Error::tls(message)
    } else {
        Error::connection(message)
    }
}

/// The innermost service: one hyper round trip, no layers.
#[derive(Clone)]
struct RawHyperTransport {
    inner: Client<HttpsConnector<HttpConnector>, Full<Bytes>>,
    config: ClientConfig,
}

impl RawHyperTransport {
    fn new(config: ClientConfig) -> Self {
        let inner = Client::builder(TokioExecutor::new()).build(https_connector(&config));
        Self { inner, config }
    }

    /// Convert an encoded request, adding the transport's default headers.
    fn build_hyper_request(
        &self,
        request: Request<Bytes>,
    ) -> Result<http::Request<Full<Bytes>>> {
        let defaults = default_headers(&self.config, &request);
        let (method, url, headers, body) = request.into_parts();

        let mut builder = http::Request::builder()
            .method(http::Method::from(method))
            .uri(url.as_str());
        for (name, value) in &headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        for (name, value) in defaults {
            builder = builder.header(name, value);
        }

        builder
            .body(body.map_or_else(Full::default, Full::new))
            .map_err(|e| Error::invalid_request(e.to_string()))
    }

    async fn round_trip(&self, request: Request<Bytes>) -> Result<Response<Bytes>> {
        let url = request.url().clone();
        let hyper_request = self.build_hyper_request(request)?;

        let response = tokio::time::timeout(self.config.timeout, self.inner.request(hyper_request))
            .await
            .map_err(|_| Error::Timeout)?
            .map_err(classify_hyper_error)?;

        let status = response.status().as_u16();
        let (headers, unreadable) = header_pairs(response.headers());
        let body = response
            .into_body()
            .collect()
            .await
            .map_err(|e| Error::connection(e.to_string()))?
            .to_bytes();

        // The response URL feeds cookie domain and path defaults.
        let response = unreadable.into_iter().fold(
            Response::new(status, headers, body).with_url(url),
            |response, name| response.with_unreadable_header(name),
        );
        Ok(response)
    }
}

impl Service<Request<Bytes>> for RawHyperTransport {
    type Response = Response<Bytes>;
    type Error = Error;
    type Future = ServiceFuture;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request<Bytes>) -> Self::Future {
        let transport = self.clone();
        Box::pin(async move { transport.round_trip(request).await })
    }
}

/// Transport using hyper-util with TLS and tower middleware support.
///
/// # Example
///
/// ```no_run
/// use courier::HyperTransport;
/// use std::time::Duration;
///
/// let transport = HyperTransport::builder()
///     .timeout(Duration::from_secs(5))
///     .user_agent("my-app/1.0")
///     .with_logging()
///     .build();
/// ```
#[derive(Clone)]
pub struct HyperTransport {
    stack: SharedStack,
    config: ClientConfig,
}

impl std::fmt::Debug for HyperTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HyperTransport")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl HyperTransport {
    /// Create a new transport with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(ClientConfig::default())
    }

    /// Create a new transport with custom configuration (no middleware).
    #[must_use]
    pub fn with_config(config: ClientConfig) -> Self {
        let raw = RawHyperTransport::new(config.clone());
        Self::with_stack(BoxCloneService::new(raw), config)
    }

    fn with_stack(stack: BoxedService, config: ClientConfig) -> Self {
        Self {
            stack: SharedStack::new(stack),
            config,
        }
    }

    /// Create a new transport builder.
    #[must_use]
    pub fn builder() -> HyperTransportBuilder {
        HyperTransportBuilder::default()
    }

    /// Get the transport configuration.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }
}

impl Default for HyperTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for HyperTransport {
    async fn send(&self, request: Request<Bytes>) -> Result<Response<Bytes>> {
        self.stack.dispatch(request).await
    }
}

impl Service<Request<Bytes>> for HyperTransport {
    type Response = Response<Bytes>;
    type Error = Error;
    type Future = ServiceFuture;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request<Bytes>) -> Self::Future {
        self.stack.dispatch(request)
    }
}

/// Builder for [`HyperTransport`].
#[derive(Default)]
pub struct HyperTransportBuilder {
    config: ClientConfigBuilder,
    layers: Vec<Arc<dyn Fn(BoxedService) -> BoxedService + Send + Sync>>,
}

impl std::fmt::Debug for HyperTransportBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HyperTransportBuilder")
            .field("config", &self.config)
            .field("layers_count", &self.layers.len())
            .finish()
    }
}

impl HyperTransportBuilder {
    /// Set the request timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.timeout(timeout);
        self
    }

    /// Set the connection timeout.
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.connect_timeout(timeout);
        self
    }

    /// Set the `User-Agent` sent when a request does not set one.
    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config = self.config.user_agent(user_agent);
        self
    }

    /// Add a Tower layer to the transport.
    ///
    /// Layers are applied in order: first added = innermost, last added
    /// sees the request first.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use courier::HyperTransport;
    /// use courier::middleware::ConcurrencyLimitLayer;
    ///
    /// let transport = HyperTransport::builder()
    ///     .layer(ConcurrencyLimitLayer::new(8))
    ///     .build();
    /// ```
    #[must_use]
    pub fn layer<L>(mut self, layer: L) -> Self
    where
        L: Layer<BoxedService> + Send + Sync + 'static,
        L::Service: Service<Request<Bytes>, Response = Response<Bytes>, Error = Error>
            + Clone
            + Send
            + 'static,
        <L::Service as Service<Request<Bytes>>>::Future: Send,
    {
        self.layers.push(Arc::new(move |service| {
            BoxCloneService::new(layer.layer(service))
        }));
        self
    }

    /// Add request/response logging.
    #[must_use]
    pub fn with_logging(self) -> Self {
        self.layer(LoggingLayer::new())
    }

    /// Add debug-level logging (includes headers and the route template).
    #[must_use]
    pub fn with_debug_logging(self) -> Self {
        self.layer(LoggingLayer::debug())
    }

    /// Build the transport with all configured middleware.
    #[must_use]
    pub fn build(self) -> HyperTransport {
        let config = self.config.build();
        let raw: BoxedService = BoxCloneService::new(RawHyperTransport::new(config.clone()));
        let stack = self.layers.into_iter().fold(raw, |stack, wrap| wrap(stack));
        HyperTransport::with_stack(stack, config)
    }
}

#[cfg(test)]
mod tests {
    use courier_core::{CachePolicy, Method};

    use super::*;

    fn raw(config: ClientConfig) -> RawHyperTransport {
        RawHyperTransport::new(config)
    }

    fn request(url: &str) -> courier_core::RequestBuilder<Bytes> {
        Request::builder(Method::Post, url.parse().expect("valid URL"))
    }

    #[test]
    fn transport_default() {
        let transport = HyperTransport::new();
        assert_eq!(transport.config().timeout, Duration::from_secs(30));
    }

    #[test]
    fn transport_builder() {
        let transport = HyperTransport::builder()
            .timeout(Duration::from_secs(60))
            .user_agent("courier-tests")
            .with_logging()
            .build();

        assert_eq!(transport.config().timeout, Duration::from_secs(60));
        assert_eq!(transport.config().user_agent.as_deref(), Some("courier-tests"));
    }

    #[test]
    fn transport_is_debug() {
        let debug = format!("{:?}", HyperTransport::new());
        assert!(debug.contains("HyperTransport"));
    }

    #[test]
    fn cache_policy_becomes_cache_control() {
        let request = request("https://example.com/items")
            .cache_policy(CachePolicy::ReloadIgnoringLocalCacheData)
            .body(Bytes::from_static(b"{}"))
            .build();

        let hyper_request = raw(ClientConfig::default())
            .build_hyper_request(request)
            .expect("valid request");

        assert_eq!(hyper_request.method(), http::Method::POST);
        assert_eq!(
            hyper_request.headers().get(http::header::CACHE_CONTROL),
            Some(&http::HeaderValue::from_static("no-cache"))
        );
    }

    #[test]
    fn explicit_headers_win() {
        let request = request("https://example.com/items")
            .header("cache-control", "max-age=0")
            .header("user-agent", "explicit")
            .cache_policy(CachePolicy::ReturnCacheDataDontLoad)
            .build();
        let config = ClientConfig::builder().user_agent("configured").build();

        let hyper_request = raw(config)
            .build_hyper_request(request)
            .expect("valid request");

        let cache_control: Vec<_> = hyper_request
            .headers()
            .get_all(http::header::CACHE_CONTROL)
            .iter()
            .collect();
        assert_eq!(cache_control, [&http::HeaderValue::from_static("max-age=0")]);
        assert_eq!(
            hyper_request.headers().get(http::header::USER_AGENT),
            Some(&http::HeaderValue::from_static("explicit"))
        );
    }

    #[test]
    fn configured_user_agent() {
        let config = ClientConfig::builder().user_agent("courier-tests").build();
        let hyper_request = raw(config)
            .build_hyper_request(request("https://example.com").build())
            .expect("valid request");

        assert_eq!(
            hyper_request.headers().get(http::header::USER_AGENT),
            Some(&http::HeaderValue::from_static("courier-tests"))
        );
        assert!(hyper_request.headers().get(http::header::CACHE_CONTROL).is_none());
    }

    #[test]
    fn repeated_response_headers_are_kept() {
        let mut headers = http::HeaderMap::new();
        headers.append(http::header::SET_COOKIE, http::HeaderValue::from_static("a=1"));
        headers.append(http::header::SET_COOKIE, http::HeaderValue::from_static("b=2"));

        let (pairs, unreadable) = header_pairs(&headers);
        assert_eq!(
            pairs,
            [
                ("set-cookie".to_string(), "a=1".to_string()),
                ("set-cookie".to_string(), "b=2".to_string()),
            ]
        );
        assert!(unreadable.is_empty());
    }

    #[test]
    fn non_text_header_values_are_reported() {
        let mut headers = http::HeaderMap::new();
        headers.append(
            http::header::SET_COOKIE,
            http::HeaderValue::from_bytes(b"a=\xff").expect("opaque header value"),
        );
        headers.append(http::header::SERVER, http::HeaderValue::from_static("test"));

        let (pairs, unreadable) = header_pairs(&headers);

        assert_eq!(pairs, [("server".to_string(), "test".to_string())]);
        assert_eq!(unreadable, ["set-cookie".to_string()]);
    }
}
