//! Error types for sockwire.

use thiserror::Error;

use crate::protocol::AckId;

/// Boxed error returned by application handlers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Main error type for all sockwire operations.
#[derive(Debug, Error)]
pub enum SockwireError {
    /// Handler shape is not allowed for the name it was registered under.
    #[error("invalid handler shape for '{method}': {reason}")]
    InvalidHandlerShape {
        /// Name the handler was registered under.
        method: String,
        /// What is wrong with the shape.
        reason: &'static str,
    },

    /// No handler registered for the given method.
    #[error("method '{0}' not found")]
    MethodNotFound(String),

    /// Inbound message names a reserved lifecycle event.
    #[error("method '{0}' is reserved for lifecycle events")]
    ReservedMethod(String),

    /// Payload does not match the handler's argument type.
    #[error("payload decode error: {0}")]
    PayloadDecode(String),

    /// The handler itself returned an error.
    #[error("handler failed: {0}")]
    HandlerExecution(#[source] BoxError),

    /// Ack response for an id nobody is waiting on.
    #[error("waiter not found for ack id {0}")]
    WaiterNotFound(AckId),

    /// No ack response arrived in time.
    #[error("timed out waiting for ack id {0}")]
    AwaitTimeout(AckId),

    /// A waiter for this ack id is already outstanding.
    #[error("ack id {0} is already awaiting a response")]
    AckIdInUse(AckId),

    /// Malformed message (missing method or ack id).
    #[error("protocol error: {0}")]
    Protocol(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// MsgPack serialization error.
    #[error("MsgPack encode error: {0}")]
    MsgPackEncode(#[from] rmp_serde::encode::Error),

    /// MsgPack deserialization error.
    #[error("MsgPack decode error: {0}")]
    MsgPackDecode(#[from] rmp_serde::decode::Error),

    /// Connection closed (outbound queue gone or waiters cleared).
    #[error("connection closed")]
    ConnectionClosed,
}

/// Result type alias using SockwireError.
pub type Result<T> = std::result::Result<T, SockwireError>;
