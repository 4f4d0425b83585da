//! Reserved lifecycle event names.
//!
//! Handlers registered under these names are lifecycle callbacks. They are
//! never reachable from an inbound emit or ack request.

use std::fmt;

/// Fired once when a connection is established.
pub const ON_CONNECTION: &str = "connection";

/// Fired once when a connection is closed.
pub const ON_DISCONNECTION: &str = "disconnection";

/// Fired by the transport when the connection reports an error.
pub const ON_ERROR: &str = "error";

/// Lifecycle pseudo-events dispatched outside the message-kind switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleEvent {
    /// Connection established.
    Connection,
    /// Connection closed.
    Disconnection,
    /// Connection-level error.
    Error,
}

impl LifecycleEvent {
    /// All lifecycle events.
    pub const ALL: [LifecycleEvent; 3] = [
        LifecycleEvent::Connection,
        LifecycleEvent::Disconnection,
        LifecycleEvent::Error,
    ];

    /// Reserved method name for this event.
    pub const fn name(self) -> &'static str {
        match self {
            LifecycleEvent::Connection => ON_CONNECTION,
            LifecycleEvent::Disconnection => ON_DISCONNECTION,
            LifecycleEvent::Error => ON_ERROR,
        }
    }

    /// Resolve a method name to a lifecycle event, if it is reserved.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|event| event.name() == name)
    }

    /// Whether `name` is reserved for a lifecycle event.
    #[inline]
    pub fn is_reserved(name: &str) -> bool {
        Self::from_name(name).is_some()
    }
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
