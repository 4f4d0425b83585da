//! Message dispatcher.
//!
//! Routes each decoded [`Message`] by kind:
//! - **Emit**: call the handler, discard any result
//! - **AckRequest**: call the handler, send its result back as an
//!   AckResponse carrying the same ack id
//! - **AckResponse**: hand the payload to the channel's waiter
//!
//! Every failure is local to the message. It is logged and the message is
//! dropped; nothing is retried and the connection stays up.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::channel::Channel;
use crate::config::Config;
use crate::error::{Result, SockwireError};
use crate::handler::{HandlerDescriptor, IntoHandler, MethodRegistry};
use crate::protocol::{AckId, LifecycleEvent, Message, MessageKind};

/// What happened to a dispatched message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Emit handled.
    Handled,
    /// Ack request handled and a response sent.
    Replied(AckId),
    /// Ack request for a handler without a result; nothing sent.
    Unanswered(AckId),
    /// Ack response delivered to its waiter.
    Delivered(AckId),
}

/// Routes inbound messages to registered handlers.
///
/// Cheap to clone; clones share the same registry. Each dispatcher owns its
/// own registry, so independent instances can coexist in one process.
#[derive(Clone, Default)]
pub struct Dispatcher {
    registry: Arc<MethodRegistry>,
    config: Config,
}

impl Dispatcher {
    /// Create a dispatcher with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a dispatcher with the given configuration.
    pub fn with_config(config: Config) -> Self {
        Self {
            registry: Arc::new(MethodRegistry::new()),
            config,
        }
    }

    /// Get the configuration.
    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the method registry.
    #[inline]
    pub fn registry(&self) -> &MethodRegistry {
        &self.registry
    }

    /// Register a handler under `method`.
    ///
    /// See [`crate::handler`] for the accepted signatures. A handler under a
    /// reserved lifecycle name is installed as a lifecycle callback.
    pub fn on<M, H>(&self, method: &str, handler: H) -> Result<()>
    where
        H: IntoHandler<M>,
    {
        self.registry
            .register(HandlerDescriptor::new(method, handler))
    }

    /// Install the connection-established callback.
    pub fn on_connection<F>(&self, handler: F)
    where
        F: Fn(&Channel) + Send + Sync + 'static,
    {
        self.registry
            .set_system_handler(LifecycleEvent::Connection, Arc::new(handler));
    }

    /// Install the connection-closed callback.
    pub fn on_disconnection<F>(&self, handler: F)
    where
        F: Fn(&Channel) + Send + Sync + 'static,
    {
        self.registry
            .set_system_handler(LifecycleEvent::Disconnection, Arc::new(handler));
    }

    /// Create a channel configured like this dispatcher.
    pub fn channel(&self, id: impl Into<String>) -> (Channel, mpsc::Receiver<Message>) {
        Channel::new(id, &self.config)
    }

    /// Dispatch one message and report what happened.
    pub async fn dispatch(&self, channel: &Channel, message: Message) -> Result<Outcome> {
        match message.kind {
            MessageKind::Emit => {
                let handler = self.find_method(message.require_method()?)?;
                handler
                    .invoke(channel.clone(), &message.payload, channel.format())
                    .await?;
                Ok(Outcome::Handled)
            }
            MessageKind::AckRequest => {
                let handler = self.find_method(message.require_method()?)?;
                let ack_id = message.require_ack_id()?;

                if !handler.produces_result() {
                    return Ok(Outcome::Unanswered(ack_id));
                }

                let result = handler
                    .invoke(channel.clone(), &message.payload, channel.format())
                    .await?;
                let Some(payload) = result else {
                    return Ok(Outcome::Unanswered(ack_id));
                };

                channel.send(Message::ack_response(ack_id, payload)).await?;
                Ok(Outcome::Replied(ack_id))
            }
            MessageKind::AckResponse => {
                let ack_id = message.require_ack_id()?;
                if channel.waiters().fulfill(ack_id, message.payload) {
                    Ok(Outcome::Delivered(ack_id))
                } else {
                    Err(SockwireError::WaiterNotFound(ack_id))
                }
            }
        }
    }

    /// Dispatch one message, logging instead of returning failures.
    ///
    /// This is the entry point for the transport's read loop.
    pub async fn process_incoming_message(&self, channel: &Channel, message: Message) {
        let kind = message.kind;
        let method = message.method.clone().unwrap_or_default();

        match self.dispatch(channel, message).await {
            Ok(Outcome::Unanswered(ack_id)) => {
                tracing::debug!(
                    "Method '{}' produces no result, ack request {} left unanswered",
                    method,
                    ack_id
                );
            }
            Ok(_) => {}
            Err(SockwireError::MethodNotFound(name)) => {
                tracing::warn!("Method '{}' not found (channel {})", name, channel.id());
            }
            Err(SockwireError::WaiterNotFound(ack_id)) => {
                tracing::warn!(
                    "Waiter not found for ack id {} (channel {})",
                    ack_id,
                    channel.id()
                );
            }
            Err(e) => {
                tracing::error!(
                    "Dropped {:?} for method '{}' on channel {}: {}",
                    kind,
                    method,
                    channel.id(),
                    e
                );
            }
        }
    }

    /// Fire a lifecycle event: the system callback first, then the handler
    /// registered under the event's reserved name.
    pub async fn call_loop_event(&self, channel: &Channel, event: LifecycleEvent) {
        if let Some(system) = self.registry.system_handler(event) {
            system(channel);
        }

        let Some(handler) = self.registry.lifecycle_handler(event) else {
            return;
        };

        if let Err(e) = handler
            .invoke(channel.clone(), &[], channel.format())
            .await
        {
            tracing::error!(
                "Lifecycle handler '{}' failed on channel {}: {}",
                event,
                channel.id(),
                e
            );
        }
    }

    fn find_method(&self, name: &str) -> Result<Arc<HandlerDescriptor>> {
        if LifecycleEvent::is_reserved(name) {
            return Err(SockwireError::ReservedMethod(name.to_string()));
        }
        self.registry
            .lookup(name)
            .ok_or_else(|| SockwireError::MethodNotFound(name.to_string()))
    }
}
