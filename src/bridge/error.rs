use thiserror::Error;

use super::service::{RpcStatus, StatusCode};

/// Result type for bridge operations.
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Errors raised while turning a resource call into an RPC invocation.
///
/// None of these are transient; they describe a mismatch between the call
/// and the registered services and are never retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BridgeError {
    #[error("unsupported HTTP method: {0}")]
    UnsupportedVerb(String),

    #[error("no method '{method}' registered on service '{service}'")]
    MethodNotFound { service: String, method: String },

    #[error("{service}.{method} cannot be bridged: {reason}")]
    UnexpectedReturnShape {
        service: String,
        method: String,
        reason: String,
    },

    /// The request could not be built from the call arguments.
    #[error("cannot build request: {0}")]
    Invocation(String),

    #[error("no entity matches resource '{0}'")]
    EntityNotFound(String),

    #[error("malformed call: {0}")]
    MalformedCall(String),

    /// The RPC method itself failed.
    #[error(transparent)]
    Rpc(#[from] RpcStatus),
}

impl BridgeError {
    /// Status code for the resource-oriented response.
    pub fn http_status(&self) -> u16 {
        match self {
            BridgeError::UnsupportedVerb(_) => 405,
            BridgeError::MethodNotFound { .. } => 501,
            BridgeError::UnexpectedReturnShape { .. } => 500,
            BridgeError::Invocation(_) | BridgeError::MalformedCall(_) => 400,
            BridgeError::EntityNotFound(_) => 404,
            BridgeError::Rpc(status) => match status.code {
                StatusCode::InvalidArgument => 400,
                StatusCode::PermissionDenied => 403,
                StatusCode::NotFound => 404,
                StatusCode::AlreadyExists => 409,
                StatusCode::FailedPrecondition => 412,
                StatusCode::Unimplemented => 501,
                StatusCode::Unavailable => 503,
                StatusCode::Internal => 500,
            },
        }
    }
}
