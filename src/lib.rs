//! # sockwire
//!
//! Event dispatch and acknowledgment core for socket.io-style protocols.
//!
//! The transport decodes frames into [`Message`](protocol::Message) values
//! and hands them to a [`Dispatcher`], which routes them by kind:
//!
//! - **Emit** - fire-and-forget call of a named handler
//! - **Ack request** - call of a named handler whose result is sent back
//! - **Ack response** - reply delivered to the caller waiting on its ack id
//!
//! ## Example
//!
//! ```ignore
//! use sockwire::{Channel, Dispatcher, Reply, Session};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let dispatcher = Dispatcher::new();
//!
//!     dispatcher.on("echo", |_ch: Channel, text: String| async move {
//!         Ok(Reply(text))
//!     })?;
//!     dispatcher.on_connection(|ch| tracing::info!("{} connected", ch.id()));
//!
//!     // Per connection: the transport feeds `inbound_tx` and drains `outbound`.
//!     let (channel, outbound) = dispatcher.channel("sid-1");
//!     let (inbound_tx, inbound) = tokio::sync::mpsc::channel(1024);
//!     Session::new(dispatcher.clone(), channel, inbound).spawn();
//!     Ok(())
//! }
//! ```

pub mod ack;
pub mod codec;
pub mod error;
pub mod handler;
pub mod protocol;

mod channel;
mod config;
mod dispatcher;
mod session;

pub use channel::Channel;
pub use config::{
    Config, DEFAULT_ACK_TIMEOUT, DEFAULT_HANDLER_QUEUE_CAPACITY, DEFAULT_OUTBOUND_CAPACITY,
    MAX_QUEUE_CAPACITY,
};
pub use dispatcher::{Dispatcher, Outcome};
pub use error::{BoxError, Result, SockwireError};
pub use handler::{HandlerResult, Reply};
pub use session::Session;
