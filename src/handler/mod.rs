//! Handler module - registration and invocation of application handlers.
//!
//! Provides:
//! - [`MethodRegistry`] - maps method names to handler descriptors
//! - [`HandlerDescriptor`] - resolved shape of one handler
//! - [`IntoHandler`] / [`Reply`] - the supported handler signatures
//!
//! # Example
//!
//! ```ignore
//! use sockwire::handler::{HandlerDescriptor, MethodRegistry, Reply};
//! use sockwire::Channel;
//!
//! let registry = MethodRegistry::new();
//!
//! // Emit handler: takes arguments, returns nothing
//! registry.register(HandlerDescriptor::new("chat", |_ch: Channel, text: String| async move {
//!     println!("{}", text);
//!     Ok(())
//! }))?;
//!
//! // Ack handler: returns a reply
//! registry.register(HandlerDescriptor::new("echo", |_ch: Channel, text: String| async move {
//!     Ok(Reply(text))
//! }))?;
//! ```

mod adapter;
mod descriptor;
mod registry;

pub use adapter::{
    BoxFuture, Handler, HandlerOutput, HandlerResult, IntoHandler, NoArgs, Reply, WithArgs,
};
pub use descriptor::{HandlerDescriptor, HandlerShape};
pub use registry::{MethodRegistry, SystemHandler};
