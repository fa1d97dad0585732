//! Prelude module for convenient imports.
//!
//! This module re-exports the tags, strategies and derive macros needed to
//! declare requests and responses:
//!
//! ```ignore
//! use courier::prelude::*;
//! ```

pub use courier_core::prelude::*;

pub use crate::{Body, Client, HyperTransport, Request, Response};
pub use serde::{Deserialize, Serialize};
