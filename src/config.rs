//! Dispatcher and channel configuration.

use std::time::Duration;

use tokio::sync::Semaphore;

use crate::codec::PayloadFormat;

/// Default time a caller waits for an ack response.
pub const DEFAULT_ACK_TIMEOUT: Duration = Duration::from_secs(30);

/// Default capacity of a channel's outbound queue.
pub const DEFAULT_OUTBOUND_CAPACITY: usize = 1024;

/// Default number of emits and ack requests a session queues for its
/// handler worker before it stops reading.
pub const DEFAULT_HANDLER_QUEUE_CAPACITY: usize = 256;

/// Largest capacity a tokio bounded queue accepts.
pub const MAX_QUEUE_CAPACITY: usize = Semaphore::MAX_PERMITS;

/// Settings shared by a dispatcher and the channels it creates.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use sockwire::codec::PayloadFormat;
/// use sockwire::Config;
///
/// let config = Config::new()
///     .format(PayloadFormat::MsgPack)
///     .ack_timeout(Duration::from_secs(5))
///     .outbound_capacity(64);
///
/// assert_eq!(config.ack_timeout, Duration::from_secs(5));
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Payload encoding for arguments and results.
    pub format: PayloadFormat,
    /// Timeout used by `Channel::ack`.
    pub ack_timeout: Duration,
    /// Outbound queue capacity per channel.
    pub outbound_capacity: usize,
    /// Messages a session queues for its handler worker.
    pub handler_queue_capacity: usize,
}

impl Config {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the payload format.
    pub fn format(mut self, format: PayloadFormat) -> Self {
        self.format = format;
        self
    }

    /// Set the default ack timeout.
    pub fn ack_timeout(mut self, timeout: Duration) -> Self {
        self.ack_timeout = timeout;
        self
    }

    /// Set the outbound queue capacity (clamped to `1..=MAX_QUEUE_CAPACITY`).
    pub fn outbound_capacity(mut self, capacity: usize) -> Self {
        self.outbound_capacity = capacity.clamp(1, MAX_QUEUE_CAPACITY);
        self
    }

    /// Set the per-session handler queue capacity (clamped to
    /// `1..=MAX_QUEUE_CAPACITY`).
    ///
    /// When the queue is full the session stops reading inbound messages
    /// until the worker catches up. Nothing is dropped.
    pub fn handler_queue_capacity(mut self, capacity: usize) -> Self {
        self.handler_queue_capacity = capacity.clamp(1, MAX_QUEUE_CAPACITY);
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            format: PayloadFormat::default(),
            ack_timeout: DEFAULT_ACK_TIMEOUT,
            outbound_capacity: DEFAULT_OUTBOUND_CAPACITY,
            handler_queue_capacity: DEFAULT_HANDLER_QUEUE_CAPACITY,
        }
    }
}
