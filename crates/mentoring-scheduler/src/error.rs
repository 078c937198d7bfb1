//! Error types for the scheduler client.

use thiserror::Error;

use crate::Endpoint;

/// Errors that can occur when talking to the scheduler service.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// The request never reached the scheduler, or its reply could not be read.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The scheduler answered with `success: false`.
    ///
    /// `body` is the full response body exactly as the scheduler sent it.
    #[error("scheduler rejected {endpoint} request: {body}")]
    Rejected {
        endpoint: Endpoint,
        body: serde_json::Value,
    },
}

impl SchedulerError {
    /// Whether the failure happened before the scheduler could answer.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Whether the scheduler explicitly declined the request.
    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }

    /// The `errorBody` member of a rejection, if present.
    pub fn error_body(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Rejected { body, .. } => body.get("errorBody"),
            Self::Transport(_) => None,
        }
    }
}

/// Failures on the way to or from the scheduler.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Request body could not be serialized.
    #[error("failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),

    /// HTTP request failed (connect, timeout, read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The scheduler replied with something other than `{success, ...}`.
    #[error("malformed response ({status}): {reason}")]
    MalformedResponse { status: u16, reason: String },
}

impl TransportError {
    /// Whether the request ran out of time.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Http(e) if e.is_timeout())
    }
}
