//! Failure taxonomy for Eyeris API calls.

use thiserror::Error;

/// Terminal failure of one API operation.
///
/// Transient conditions (429, transport hiccups) are retried inside the
/// executor and only surface here once the retry budget is spent.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// Non-2xx response that is not retryable.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Connection-level failure (refused, timeout, DNS) on the final attempt.
    #[error("{0}")]
    Transport(String),

    /// A 2xx response whose body did not match the declared payload shape.
    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// Submission succeeded but lacked the correlation ids needed to poll.
    #[error("Invalid analysis response")]
    InvalidAnalysisResponse,

    /// Retry budget exhausted without a definitive answer.
    #[error("Max retries reached")]
    RetriesExhausted,

    /// Token endpoint answered 200 without an access token.
    #[error("No token received")]
    MissingToken,

    /// A device pipeline fault that escaped per-kind containment.
    #[error("Analysis task failed: {0}")]
    Fault(String),
}
