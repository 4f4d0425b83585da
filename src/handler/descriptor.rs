//! Handler descriptor: resolved metadata for one registered handler.

use std::fmt;

use bytes::Bytes;

use super::adapter::{BoxFuture, Handler, IntoHandler};
use crate::channel::Channel;
use crate::codec::PayloadFormat;
use crate::error::Result;

/// Argument and result presence of a handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandlerShape {
    /// Payload is decoded and passed to the handler.
    pub accepts_arguments: bool,
    /// Handler's value is sent back to ack requests.
    pub produces_result: bool,
}

/// A registered handler. Immutable once built.
pub struct HandlerDescriptor {
    name: String,
    shape: HandlerShape,
    argument_type: Option<&'static str>,
    handler: Box<dyn Handler>,
}

impl HandlerDescriptor {
    /// Build a descriptor, resolving the handler's shape from its signature.
    pub fn new<M, H>(name: impl Into<String>, handler: H) -> Self
    where
        H: IntoHandler<M>,
    {
        Self {
            name: name.into(),
            shape: HandlerShape {
                accepts_arguments: H::ACCEPTS_ARGUMENTS,
                produces_result: H::PRODUCES_RESULT,
            },
            argument_type: H::argument_type(),
            handler: handler.into_handler(),
        }
    }

    /// Name the handler is registered under.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Resolved shape.
    #[inline]
    pub fn shape(&self) -> HandlerShape {
        self.shape
    }

    /// Whether the payload is decoded and passed to the handler.
    #[inline]
    pub fn accepts_arguments(&self) -> bool {
        self.shape.accepts_arguments
    }

    /// Whether the handler's value is sent back to ack requests.
    #[inline]
    pub fn produces_result(&self) -> bool {
        self.shape.produces_result
    }

    /// Rust type the payload is decoded into, if the handler takes arguments.
    #[inline]
    pub fn argument_type(&self) -> Option<&'static str> {
        self.argument_type
    }

    /// Decode `payload` (when the handler takes arguments), call the handler
    /// and return its encoded result (when it produces one).
    ///
    /// Decoding happens before this returns, so the future does not borrow
    /// `payload`.
    pub fn invoke(
        &self,
        channel: Channel,
        payload: &[u8],
        format: PayloadFormat,
    ) -> BoxFuture<'static, Result<Option<Bytes>>> {
        self.handler.call(channel, payload, format)
    }
}

impl fmt::Debug for HandlerDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerDescriptor")
            .field("name", &self.name)
            .field("shape", &self.shape)
            .field("argument_type", &self.argument_type)
            .finish_non_exhaustive()
    }
}
