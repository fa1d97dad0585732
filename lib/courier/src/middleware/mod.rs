//! Tower middleware layers for [`HyperTransport`](crate::HyperTransport).
//!
//! Middleware wraps the transport only: requests reach a layer already
//! encoded, and responses leave it before decoding. Layers are applied in
//! reverse order, the last layer added is the first to process requests.
//!
//! # Available Layers
//!
//! - [`LoggingLayer`] - Logs requests/responses using `tracing`
//! - [`ConcurrencyLimitLayer`] - Limits concurrent requests (tower)
//!
//! # Example
//!
//! ```no_run
//! use courier::HyperTransport;
//! use courier::middleware::{ConcurrencyLimitLayer, LoggingLayer};
//!
//! let transport = HyperTransport::builder()
//!     .layer(ConcurrencyLimitLayer::new(4))
//!     .layer(LoggingLayer::debug())
//!     .build();
//! ```

mod logging;

pub use logging::{LogLevel, Logging, LoggingLayer};

pub use tower::limit::ConcurrencyLimitLayer;
pub use tower::{Layer, ServiceBuilder};
