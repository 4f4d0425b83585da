//! Decoded protocol message.
//!
//! # Example
//!
//! ```
//! use sockwire::protocol::{Message, MessageKind};
//! use bytes::Bytes;
//!
//! let msg = Message::ack_request("echo", 7, Bytes::from_static(br#"{"text":"hi"}"#));
//! assert_eq!(msg.kind, MessageKind::AckRequest);
//! assert_eq!(msg.method(), Some("echo"));
//! assert_eq!(msg.ack_id, Some(7));
//! ```

use bytes::Bytes;

use crate::error::{Result, SockwireError};

/// Correlation id linking an ack request to its response.
pub type AckId = u64;

/// Message type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// Fire-and-forget event.
    Emit,
    /// Event expecting a correlated reply.
    AckRequest,
    /// Reply to an ack request.
    AckResponse,
}

/// A decoded message as delivered by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Message type.
    pub kind: MessageKind,
    /// Method name (Emit and AckRequest only).
    pub method: Option<String>,
    /// Correlation id (AckRequest and AckResponse only).
    pub ack_id: Option<AckId>,
    /// Encoded arguments or result.
    pub payload: Bytes,
}

impl Message {
    /// Create an emit message.
    pub fn emit(method: impl Into<String>, payload: Bytes) -> Self {
        Self {
            kind: MessageKind::Emit,
            method: Some(method.into()),
            ack_id: None,
            payload,
        }
    }

    /// Create an ack request message.
    pub fn ack_request(method: impl Into<String>, ack_id: AckId, payload: Bytes) -> Self {
        Self {
            kind: MessageKind::AckRequest,
            method: Some(method.into()),
            ack_id: Some(ack_id),
            payload,
        }
    }

    /// Create an ack response message.
    pub fn ack_response(ack_id: AckId, payload: Bytes) -> Self {
        Self {
            kind: MessageKind::AckResponse,
            method: None,
            ack_id: Some(ack_id),
            payload,
        }
    }

    /// Get the method name, if any.
    #[inline]
    pub fn method(&self) -> Option<&str> {
        self.method.as_deref()
    }

    /// Get the payload bytes.
    #[inline]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Check that the fields required by this kind are present.
    pub fn validate(&self) -> Result<()> {
        match self.kind {
            MessageKind::Emit => {
                self.require_method()?;
            }
            MessageKind::AckRequest => {
                self.require_method()?;
                self.require_ack_id()?;
            }
            MessageKind::AckResponse => {
                self.require_ack_id()?;
            }
        }
        Ok(())
    }

    pub(crate) fn require_method(&self) -> Result<&str> {
        match self.method() {
            Some(name) if !name.is_empty() => Ok(name),
            _ => Err(SockwireError::Protocol(format!(
                "{:?} message without method name",
                self.kind
            ))),
        }
    }

    pub(crate) fn require_ack_id(&self) -> Result<AckId> {
        self.ack_id.ok_or_else(|| {
            SockwireError::Protocol(format!("{:?} message without ack id", self.kind))
        })
    }
}
