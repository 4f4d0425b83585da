//! Method registry mapping names to handler descriptors.
//!
//! Lookups take a read lock and clone an `Arc`, so concurrent dispatches
//! never block each other and no lock is held while a handler runs.
//! Registration takes the write lock.
//!
//! Names reserved for lifecycle events (`connection`, `disconnection`,
//! `error`) are stored apart from routed methods: a handler registered
//! under one of them becomes a lifecycle callback and is never reachable
//! from an inbound message.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use super::HandlerDescriptor;
use crate::channel::Channel;
use crate::error::{Result, SockwireError};
use crate::protocol::LifecycleEvent;

/// Callback installed directly for a lifecycle event.
pub type SystemHandler = Arc<dyn Fn(&Channel) + Send + Sync + 'static>;

/// Registry of routed methods and lifecycle callbacks.
#[derive(Default)]
pub struct MethodRegistry {
    /// Routed methods by name.
    methods: RwLock<HashMap<String, Arc<HandlerDescriptor>>>,
    /// Handlers registered under reserved names.
    lifecycle: RwLock<HashMap<LifecycleEvent, Arc<HandlerDescriptor>>>,
    /// One system callback per lifecycle event.
    system: RwLock<HashMap<LifecycleEvent, SystemHandler>>,
}

impl MethodRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler, replacing any previous one under the same name.
    ///
    /// Handlers under reserved names are called with no arguments and
    /// nothing is sent back, so they must not take arguments or return a
    /// [`Reply`](super::Reply).
    pub fn register(&self, descriptor: HandlerDescriptor) -> Result<()> {
        let Some(event) = LifecycleEvent::from_name(descriptor.name()) else {
            tracing::debug!(
                "Registered method '{}' (args: {:?}, result: {})",
                descriptor.name(),
                descriptor.argument_type(),
                descriptor.produces_result()
            );
            self.methods
                .write()
                .insert(descriptor.name().to_string(), Arc::new(descriptor));
            return Ok(());
        };

        if descriptor.accepts_arguments() {
            return Err(SockwireError::InvalidHandlerShape {
                method: descriptor.name().to_string(),
                reason: "lifecycle handlers take no arguments",
            });
        }
        if descriptor.produces_result() {
            return Err(SockwireError::InvalidHandlerShape {
                method: descriptor.name().to_string(),
                reason: "lifecycle handlers cannot return a reply",
            });
        }

        tracing::debug!("Registered lifecycle handler for '{}'", event);
        self.lifecycle.write().insert(event, Arc::new(descriptor));
        Ok(())
    }

    /// Find a routed method.
    pub fn lookup(&self, name: &str) -> Option<Arc<HandlerDescriptor>> {
        self.methods.read().get(name).cloned()
    }

    /// Whether a routed method is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.methods.read().contains_key(name)
    }

    /// Names of all routed methods, in no particular order.
    pub fn method_names(&self) -> Vec<String> {
        self.methods.read().keys().cloned().collect()
    }

    /// Number of routed methods.
    pub fn len(&self) -> usize {
        self.methods.read().len()
    }

    /// Whether no methods are routed.
    pub fn is_empty(&self) -> bool {
        self.methods.read().is_empty()
    }

    /// Handler registered under the event's reserved name.
    pub fn lifecycle_handler(&self, event: LifecycleEvent) -> Option<Arc<HandlerDescriptor>> {
        self.lifecycle.read().get(&event).cloned()
    }

    /// Install the system callback for `event`, replacing any previous one.
    pub fn set_system_handler(&self, event: LifecycleEvent, handler: SystemHandler) {
        self.system.write().insert(event, handler);
    }

    /// System callback for `event`.
    pub fn system_handler(&self, event: LifecycleEvent) -> Option<SystemHandler> {
        self.system.read().get(&event).cloned()
    }
}
