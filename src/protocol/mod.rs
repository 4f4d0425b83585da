//! Protocol module - decoded message model and reserved event names.
//!
//! The transport hands the dispatcher already-decoded [`Message`] values;
//! wire framing is not handled here.

mod events;
mod message;

pub use events::{LifecycleEvent, ON_CONNECTION, ON_DISCONNECTION, ON_ERROR};
pub use message::{AckId, Message, MessageKind};
