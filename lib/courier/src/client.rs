//! The client facade.
//!
//! A [`Client`] pairs a base URL with a [`Transport`] and runs the same
//! pipeline for every calling convention: encode the request definition,
//! send it, decode the response definition.

use std::any::type_name;

use bytes::Bytes;
use futures_core::Stream;
use futures_util::stream;
use tokio::task::JoinHandle;
use tracing::debug;
use url::Url;

use crate::{
    DecodeResponse, EncodeRequest, Error, HyperTransport, Request, Result, Transport,
    decode_response, encode_request,
};

/// Sends request definitions and decodes response definitions.
///
/// # Example
///
/// ```ignore
/// use courier::prelude::*;
///
/// #[derive(Request)]
/// struct GetUser {
///     path: Path,
///     id: PathParameter<u64>,
/// }
///
/// #[derive(Response)]
/// struct UserResponse {
///     status: StatusCode,
///     user: ResponseBody<User>,
/// }
///
/// let client = Client::hyper("https://api.example.com")?;
/// let request = GetUser { path: "/users/{id}".into(), id: PathParameter::new(42) };
/// let response: UserResponse = client.send(&request).await?;
/// ```
#[derive(Debug, Clone)]
pub struct Client<T = HyperTransport> {
    transport: T,
    base_url: Url,
}

impl Client<HyperTransport> {
    /// Create a client using a default [`HyperTransport`].
    pub fn hyper(base_url: impl AsRef<str>) -> Result<Self> {
        Self::new(HyperTransport::new(), base_url)
    }
}

impl<T: Transport> Client<T> {
    /// Create a client sending through `transport`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidBaseUrl`] if `base_url` does not parse or
    /// cannot hold a path.
    pub fn new(transport: T, base_url: impl AsRef<str>) -> Result<Self> {
        let base_url = Url::parse(base_url.as_ref()).map_err(|_| Error::InvalidBaseUrl)?;
        Self::with_url(transport, base_url)
    }

    /// Create a client from an already parsed base URL.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidBaseUrl`] if `base_url` cannot hold a path.
    pub fn with_url(transport: T, base_url: Url) -> Result<Self> {
        if base_url.cannot_be_a_base() {
            return Err(Error::InvalidBaseUrl);
        }
        Ok(Self {
            transport,
            base_url,
        })
    }

    /// The base URL every request is resolved against.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The underlying transport.
    #[must_use]
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Encode a request definition without sending it.
    pub fn encode<R: EncodeRequest + ?Sized>(&self, request: &R) -> Result<Request<Bytes>> {
        encode_request(request, &self.base_url)
    }

    /// Send a request and decode the response.
    ///
    /// # Errors
    ///
    /// Returns the error of whichever stage failed, see [`Error::stage`].
    pub async fn send<R, D>(&self, request: &R) -> Result<D>
    where
        R: EncodeRequest + ?Sized,
        D: DecodeResponse,
    {
        let encoded = self.encode(request)?;
        self.execute(encoded, type_name::<R>()).await
    }

    /// Send a request on the current tokio runtime and hand the outcome to
    /// `callback`.
    ///
    /// Encoding happens before this returns; only the transport send and
    /// decoding run on the spawned task.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn send_with<R, D, F>(&self, request: &R, callback: F) -> JoinHandle<()>
    where
        T: Clone + 'static,
        R: EncodeRequest + ?Sized,
        D: DecodeResponse + Send + 'static,
        F: FnOnce(Result<D>) + Send + 'static,
    {
        let encoded = self.encode(request);
        let client = self.clone();
        let request_type = type_name::<R>();
        tokio::spawn(async move {
            let result = match encoded {
                Ok(encoded) => client.execute(encoded, request_type).await,
                Err(err) => Err(err),
            };
            callback(result);
        })
    }

    /// Send a request as a stream yielding exactly one item.
    pub fn send_stream<'a, R, D>(
        &'a self,
        request: &R,
    ) -> impl Stream<Item = Result<D>> + Send + use<'a, T, R, D>
    where
        R: EncodeRequest + ?Sized,
        D: DecodeResponse + Send,
    {
        let encoded = self.encode(request);
        let request_type = type_name::<R>();
        stream::once(async move { self.execute(encoded?, request_type).await })
    }

    async fn execute<D: DecodeResponse>(
        &self,
        request: Request<Bytes>,
        request_type: &'static str,
    ) -> Result<D> {
        debug!(
            request_type,
            method = %request.method(),
            url = %request.url(),
            "sending request"
        );
        let response = self.transport.send(request).await?;
        debug!(
            status = response.status(),
            response_type = type_name::<D>(),
            "decoding response"
        );
        decode_response(&response)
    }
}

#[cfg(test)]
mod tests {
    use std::pin::pin;
    use std::sync::{Arc, Mutex};

    use assert2::{check, let_assert};
    use futures_util::StreamExt;

    use super::*;
    use crate::{
        BodyFormat, Formatted, Method, Path, PathParameter, RequestEncoder, Response,
        ResponseBody, ResponseDecoder, Stage, StatusCode,
    };

    /// Records requests and answers with a fixed response.
    #[derive(Debug, Clone, Default)]
    struct Recorder {
        sent: Arc<Mutex<Vec<Request<Bytes>>>>,
        status: u16,
        body: &'static str,
    }

    impl Recorder {
        fn answering(status: u16, body: &'static str) -> Self {
            Self {
                status,
                body,
                ..Self::default()
            }
        }

        fn sent_urls(&self) -> Vec<String> {
            self.sent
                .lock()
                .expect("lock")
                .iter()
                .map(|request| request.url().to_string())
                .collect()
        }
    }

    impl Transport for Recorder {
        async fn send(&self, request: Request<Bytes>) -> Result<Response<Bytes>> {
            let url = request.url().clone();
            self.sent.lock().expect("lock").push(request);
            let body = Bytes::from_static(self.body.as_bytes());
            Ok(Response::new(self.status, [], body).with_url(url))
        }
    }

    struct GetItem {
        method: Method,
        path: Path,
        id: PathParameter<u32>,
    }

    impl EncodeRequest for GetItem {
        fn encode(&self, encoder: &mut RequestEncoder) -> Result<()> {
            encoder.field("method", &self.method)?;
            encoder.field("path", &self.path)?;
            encoder.field("id", &self.id)?;
            Ok(())
        }
    }

    fn get_item(id: u32) -> GetItem {
        GetItem {
            method: Method::Get,
            path: Path::new("/items/{id}"),
            id: PathParameter::new(id),
        }
    }

    #[derive(Debug, PartialEq, serde::Deserialize)]
    struct Item {
        name: String,
    }

    impl Formatted for Item {
        const FORMAT: BodyFormat = BodyFormat::Json;
    }

    #[derive(Debug)]
    struct ItemResponse {
        status: StatusCode,
        item: ResponseBody<Item>,
    }

    impl DecodeResponse for ItemResponse {
        fn decode(decoder: &mut ResponseDecoder<'_>) -> Result<Self> {
            Ok(Self {
                status: decoder.field("status")?,
                item: decoder.field("item")?,
            })
        }
    }

    #[test]
    fn rejects_invalid_base_urls() {
        let_assert!(Err(Error::InvalidBaseUrl) = Client::new(Recorder::default(), "not a url"));
        let_assert!(
            Err(Error::InvalidBaseUrl) = Client::new(Recorder::default(), "mailto:someone@example.com")
        );
    }

    #[tokio::test]
    async fn send_runs_the_pipeline() {
        let transport = Recorder::answering(200, r#"{"name":"widget"}"#);
        let client = Client::new(transport.clone(), "https://api.example.com/v1").expect("client");

        let response: ItemResponse = client.send(&get_item(7)).await.expect("response");

        check!(response.status == 200);
        check!(response.item.value() == Some(&Item { name: "widget".to_string() }));
        check!(transport.sent_urls() == ["https://api.example.com/v1/items/7"]);
    }

    #[tokio::test]
    async fn encoding_errors_never_reach_the_transport() {
        struct BadName(PathParameter<u32>);

        impl EncodeRequest for BadName {
            fn encode(&self, encoder: &mut RequestEncoder) -> Result<()> {
                encoder.field("id}", &self.0)
            }
        }

        let transport = Recorder::answering(200, "{}");
        let client = Client::new(transport.clone(), "https://api.example.com").expect("client");

        let result = client.send::<_, ItemResponse>(&BadName(PathParameter::new(1))).await;

        let_assert!(Err(err) = result);
        check!(err.stage() == Stage::Encode);
        check!(transport.sent_urls().is_empty());
    }

    #[tokio::test]
    async fn send_with_hands_the_result_to_the_callback() {
        let transport = Recorder::answering(200, r#"{"name":"gear"}"#);
        let client = Client::new(transport, "https://api.example.com").expect("client");
        let (tx, rx) = tokio::sync::oneshot::channel();

        let handle = client.send_with(&get_item(3), move |result: Result<ItemResponse>| {
            let _ = tx.send(result.map(|response| response.item.into_inner()));
        });
        handle.await.expect("task");

        let item = rx.await.expect("callback ran").expect("response");
        check!(item == Some(Item { name: "gear".to_string() }));
    }

    #[tokio::test]
    async fn send_with_reports_encoding_errors() {
        let transport = Recorder::answering(200, "{}");
        let client = Client::new(transport.clone(), "https://api.example.com").expect("client");
        let (tx, rx) = tokio::sync::oneshot::channel();

        let request = GetItem {
            method: Method::Get,
            path: Path::new("/items/{id}"),
            id: PathParameter::named("item/id", 1),
        };
        client
            .send_with(&request, move |result: Result<ItemResponse>| {
                let _ = tx.send(result.err());
            })
            .await
            .expect("task");

        let_assert!(Some(Error::InvalidPathParameterName(name)) = rx.await.expect("callback ran"));
        check!(name == "item/id");
        check!(transport.sent_urls().is_empty());
    }

    #[tokio::test]
    async fn send_stream_yields_once() {
        let transport = Recorder::answering(404, "");
        let client = Client::new(transport, "https://api.example.com").expect("client");

        let request = get_item(9);
        let mut responses = pin!(client.send_stream::<_, ItemResponse>(&request));

        let_assert!(Some(Ok(response)) = responses.next().await);
        check!(response.status == 404);
        check!(response.item.is_none());
        check!(responses.next().await.is_none());
    }
}
