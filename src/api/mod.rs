//! Eyeris API access layer.
//!
//! This module owns everything that touches the network: the token-bucket
//! rate limiter, the retrying request executor, and the endpoint wrappers.
//! Nothing above this layer inspects HTTP status codes.

pub mod client;
pub mod error;
pub mod executor;
pub mod limiter;
pub mod transport;

pub use client::EyerisClient;
pub use error::ApiError;
pub use executor::RequestExecutor;
pub use limiter::RateLimiter;
pub use transport::{ApiRequest, HttpTransport, Method, RawResponse, Transport, TransportError};
