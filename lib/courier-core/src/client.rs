//! The transport seam.
//!
//! Encoding and decoding never touch the network: a [`Transport`] takes
//! the encoded [`Request`] and returns the raw [`Response`]. The `courier`
//! crate ships a hyper-based implementation; tests usually plug in their own.

use std::future::Future;
use std::sync::Arc;

use bytes::Bytes;

use crate::{Request, Response, Result};

/// Sends encoded requests.
///
/// Implementations report the URL they received the response from with
/// [`Response::with_url`], so that cookies can default their domain.
///
/// # Example
///
/// ```
/// use bytes::Bytes;
/// use courier_core::{Request, Response, Result, Transport};
///
/// struct Echo;
///
/// impl Transport for Echo {
///     async fn send(&self, request: Request<Bytes>) -> Result<Response<Bytes>> {
///         let url = request.url().clone();
///         let body = request.body().cloned().unwrap_or_default();
///         Ok(Response::new(200, [], body).with_url(url))
///     }
/// }
/// ```
pub trait Transport: Send + Sync {
    /// Send a request and return the response.
    ///
    /// # Errors
    ///
    /// Returns a transport error ([`Error::Connection`](crate::Error::Connection),
    /// [`Error::Tls`](crate::Error::Tls), [`Error::Timeout`](crate::Error::Timeout)
    /// or [`Error::InvalidRequest`](crate::Error::InvalidRequest)).
    fn send(&self, request: Request<Bytes>) -> impl Future<Output = Result<Response<Bytes>>> + Send;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn send(&self, request: Request<Bytes>) -> impl Future<Output = Result<Response<Bytes>>> + Send {
        (**self).send(request)
    }
}

impl<T: Transport + ?Sized> Transport for &T {
    fn send(&self, request: Request<Bytes>) -> impl Future<Output = Result<Response<Bytes>>> + Send {
        (**self).send(request)
    }
}
