//! Error types surfaced by the gateway and the view router.

use thiserror::Error;

/// Fallback text when a failed response carries no usable `message`.
pub const GENERIC_FAILURE: &str = "Request failed.";
/// Shown when the service could not be reached at all.
pub const UNREACHABLE: &str = "Could not reach the catalog service.";
/// Shown when a success response does not have the expected shape.
pub const MALFORMED: &str = "Unexpected response from the catalog service.";

/// The single normalized failure every network call resolves to.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ApiError {
    pub message: String,
    /// HTTP status when the service answered; `None` for transport and
    /// decoding failures.
    pub status: Option<u16>,
}

impl ApiError {
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: Some(status),
        }
    }

    pub fn unreachable() -> Self {
        Self {
            message: UNREACHABLE.to_string(),
            status: None,
        }
    }

    pub fn malformed() -> Self {
        Self {
            message: MALFORMED.to_string(),
            status: None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status == Some(401)
    }
}

/// Failures below the HTTP layer: DNS, refused connections, timeouts.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("http transport failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("transport failed: {0}")]
    Other(String),
}

/// A role-gated transition or action was refused before any network call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AccessDenied {
    #[error("Admin access only.")]
    AdminOnly,
}
