//! Gateway error taxonomy.
//!
//! Every failure that can surface from a tool call is one of these variants.
//! The dispatcher renders them into the uniform `{success:false, error}`
//! envelope; nothing propagates to the caller as an uncaught fault.

use thiserror::Error;

use crate::store::StoreError;

/// Errors surfaced by tool dispatch.
///
/// The `Display` impl is the exact error string rendered in the response
/// envelope, so messages are written for the calling agent: specific for
/// validation and not-found, deliberately generic for upstream failures.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Malformed or missing tool arguments. Names the first violated
    /// field/constraint.
    #[error("{0}")]
    Validation(String),

    /// Unrecognized tool name.
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// A session-required tool was called without a resolvable session.
    #[error("Authentication required")]
    AuthenticationRequired,

    /// Requested product or category is absent.
    #[error("{0}")]
    NotFound(String),

    /// The upstream store was unreachable or rejected the request. The
    /// message never leaks upstream internals.
    #[error("Upstream store request failed")]
    Upstream(#[source] StoreError),
}

impl From<StoreError> for GatewayError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => Self::NotFound(what),
            other => Self::Upstream(other),
        }
    }
}

/// Result type alias for `GatewayError`.
pub type Result<T> = std::result::Result<T, GatewayError>;
