//! Per-connection read loop.
//!
//! A [`Session`] drives one connection:
//! 1. Fire `connection`
//! 2. Read inbound messages. Ack responses are delivered inline; emits and
//!    ack requests go to a bounded queue drained by one worker task, which
//!    awaits each handler in arrival order
//! 3. When the inbound queue ends, fail outstanding acks, let the worker
//!    finish what is queued, then fire `disconnection`
//!
//! A full handler queue stops the read loop until the worker catches up, so
//! a slow peer is slowed down rather than losing messages.
//!
//! # Example
//!
//! ```ignore
//! let (channel, outbound) = dispatcher.channel(session_id);
//! let (inbound_tx, inbound) = tokio::sync::mpsc::channel(1024);
//! // transport: decode frames into inbound_tx, write `outbound` to the wire
//! Session::new(dispatcher.clone(), channel, inbound).spawn();
//! ```

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::channel::Channel;
use crate::dispatcher::Dispatcher;
use crate::protocol::{LifecycleEvent, Message, MessageKind};

/// One connection's dispatch loop.
pub struct Session {
    dispatcher: Dispatcher,
    channel: Channel,
    inbound: mpsc::Receiver<Message>,
}

impl Session {
    /// Create a session over decoded inbound messages.
    pub fn new(dispatcher: Dispatcher, channel: Channel, inbound: mpsc::Receiver<Message>) -> Self {
        Self {
            dispatcher,
            channel,
            inbound,
        }
    }

    /// The connection this session serves.
    #[inline]
    pub fn channel(&self) -> &Channel {
        &self.channel
    }

    /// Run until the inbound queue is closed.
    pub async fn run(mut self) {
        tracing::debug!("Session {} started", self.channel.id());
        self.dispatcher
            .call_loop_event(&self.channel, LifecycleEvent::Connection)
            .await;

        let (work_tx, work_rx) = mpsc::channel(self.dispatcher.config().handler_queue_capacity);
        let worker = tokio::spawn(handler_worker(
            self.dispatcher.clone(),
            self.channel.clone(),
            work_rx,
        ));

        while let Some(message) = self.inbound.recv().await {
            // Responses only touch the waiter map. Delivering them here lets a
            // handler on the worker await an ack from the peer.
            if message.kind == MessageKind::AckResponse {
                self.dispatcher
                    .process_incoming_message(&self.channel, message)
                    .await;
                continue;
            }

            if work_tx.send(message).await.is_err() {
                tracing::error!(
                    "Handler worker for channel {} stopped, ending session",
                    self.channel.id()
                );
                break;
            }
        }

        // No response can arrive any more.
        self.channel.close();

        drop(work_tx);
        if let Err(e) = worker.await {
            tracing::error!(
                "Handler worker for channel {} failed: {}",
                self.channel.id(),
                e
            );
        }

        self.dispatcher
            .call_loop_event(&self.channel, LifecycleEvent::Disconnection)
            .await;
        tracing::debug!("Session {} closed", self.channel.id());
    }

    /// Run the session on a new task.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }
}

/// Await each queued handler in turn.
async fn handler_worker(
    dispatcher: Dispatcher,
    channel: Channel,
    mut queue: mpsc::Receiver<Message>,
) {
    while let Some(message) = queue.recv().await {
        dispatcher.process_incoming_message(&channel, message).await;
    }
}
