//! Connection context passed to every handler.
//!
//! A [`Channel`] identifies the peer and owns the connection's outbound
//! queue, ack id counter and [`Waiters`]. The transport drains the receiver
//! returned by [`Channel::new`] and writes each [`Message`] to the wire.
//!
//! # Example
//!
//! ```ignore
//! dispatcher.on("join", |ch: Channel, room: String| async move {
//!     ch.emit("joined", &room).await?;
//!     let members: Vec<String> = ch.ack("members", &room).await?;
//!     tracing::info!("{} members in {}", members.len(), room);
//!     Ok(())
//! })?;
//! ```

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::mpsc;

use crate::ack::Waiters;
use crate::codec::PayloadFormat;
use crate::config::Config;
use crate::error::{Result, SockwireError};
use crate::protocol::{AckId, Message};

/// Handle to one peer connection.
///
/// `Channel` is `Clone` and can be moved into spawned tasks; all clones
/// share the same outbound queue and waiter registry.
#[derive(Clone)]
pub struct Channel {
    inner: Arc<ChannelInner>,
}

struct ChannelInner {
    /// Peer identity (session id assigned by the transport).
    id: String,
    /// Outbound message queue.
    tx: mpsc::Sender<Message>,
    /// Outstanding ack requests.
    waiters: Waiters,
    /// Next ack id to assign.
    next_ack_id: AtomicU64,
    /// Set once the inbound side has ended.
    closed: AtomicBool,
    /// Payload encoding.
    format: PayloadFormat,
    /// Timeout used by `ack`.
    ack_timeout: Duration,
}

impl Channel {
    /// Create a channel and the receiver the transport drains.
    pub fn new(id: impl Into<String>, config: &Config) -> (Self, mpsc::Receiver<Message>) {
        let (tx, rx) = mpsc::channel(config.outbound_capacity);
        let channel = Self {
            inner: Arc::new(ChannelInner {
                id: id.into(),
                tx,
                waiters: Waiters::new(),
                next_ack_id: AtomicU64::new(1),
                closed: AtomicBool::new(false),
                format: config.format,
                ack_timeout: config.ack_timeout,
            }),
        };
        (channel, rx)
    }

    /// Peer identity.
    #[inline]
    pub fn id(&self) -> &str {
        &self.inner.id
    }

    /// Payload format used on this connection.
    #[inline]
    pub fn format(&self) -> PayloadFormat {
        self.inner.format
    }

    /// Default timeout used by [`ack`](Self::ack).
    #[inline]
    pub fn ack_timeout(&self) -> Duration {
        self.inner.ack_timeout
    }

    /// Outstanding ack requests on this connection.
    #[inline]
    pub fn waiters(&self) -> &Waiters {
        &self.inner.waiters
    }

    /// Whether the connection is open in both directions.
    pub fn is_connected(&self) -> bool {
        !self.inner.closed.load(Ordering::SeqCst) && !self.inner.tx.is_closed()
    }

    /// Queue a message for the transport.
    pub async fn send(&self, message: Message) -> Result<()> {
        self.inner
            .tx
            .send(message)
            .await
            .map_err(|_| SockwireError::ConnectionClosed)
    }

    /// Emit a fire-and-forget event.
    pub async fn emit<T: Serialize>(&self, method: &str, args: &T) -> Result<()> {
        let payload = self.inner.format.encode(args)?;
        self.send(Message::emit(method, payload)).await
    }

    /// Send an ack request and wait for the reply using the default timeout.
    pub async fn ack<T, R>(&self, method: &str, args: &T) -> Result<R>
    where
        T: Serialize,
        R: DeserializeOwned,
    {
        self.ack_with_timeout(method, args, self.inner.ack_timeout)
            .await
    }

    /// Send an ack request and wait for the reply.
    ///
    /// The waiter is registered before the request is queued. On timeout
    /// the slot is released and a late reply is discarded. Fails with
    /// [`SockwireError::ConnectionClosed`] once the channel is closed, since
    /// no reply can arrive.
    pub async fn ack_with_timeout<T, R>(
        &self,
        method: &str,
        args: &T,
        timeout: Duration,
    ) -> Result<R>
    where
        T: Serialize,
        R: DeserializeOwned,
    {
        let payload = self.inner.format.encode(args)?;
        let ack_id = self.next_ack_id();

        let waiter = self.inner.waiters.register(ack_id)?;
        // Checked after registering: a concurrent close either sees this
        // slot and clears it, or is seen here.
        if self.inner.closed.load(Ordering::SeqCst) {
            return Err(SockwireError::ConnectionClosed);
        }
        self.send(Message::ack_request(method, ack_id, payload))
            .await?;

        let reply = waiter.wait(timeout).await?;
        self.inner.format.decode(&reply)
    }

    /// Allocate the next ack id for this connection.
    #[inline]
    pub fn next_ack_id(&self) -> AckId {
        self.inner.next_ack_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Release every outstanding waiter and refuse new ack requests. Called
    /// when the connection's inbound side ends. Emits and replies can still
    /// be queued.
    pub fn close(&self) {
        self.inner.closed.store(true, Ordering::SeqCst);
        self.inner.waiters.clear();
    }
}

impl fmt::Debug for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Channel")
            .field("id", &self.inner.id)
            .field("format", &self.inner.format)
            .field("pending_acks", &self.inner.waiters.len())
            .finish()
    }
}
