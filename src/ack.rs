//! Waiter registry for ack correlation.
//!
//! Every outbound ack request registers a one-shot slot under its ack id
//! before the request is written. The dispatcher fulfills the slot when the
//! matching ack response arrives.
//!
//! ```text
//! Channel::ack ── register(id) ──► Waiters ◄── fulfill(id) ── Dispatcher
//!      │                              │
//!      └──── Waiter::wait(timeout) ◄──┘ oneshot
//! ```
//!
//! An entry leaves the map exactly once: on fulfill, on timeout, when the
//! `Waiter` is dropped, or when the registry is cleared on disconnect.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use parking_lot::Mutex;
use tokio::sync::oneshot;

use crate::error::{Result, SockwireError};
use crate::protocol::AckId;

/// Outstanding slots keyed by ack id. Each slot carries a token so a stale
/// `Waiter` for a reused id never releases a newer slot.
#[derive(Default)]
struct PendingMap {
    slots: HashMap<AckId, Slot>,
    next_token: u64,
}

struct Slot {
    token: u64,
    tx: oneshot::Sender<Bytes>,
}

impl PendingMap {
    fn release(&mut self, ack_id: AckId, token: u64) {
        if self.slots.get(&ack_id).is_some_and(|slot| slot.token == token) {
            self.slots.remove(&ack_id);
        }
    }
}

/// Registry of outstanding ack requests for one connection.
///
/// Cheap to clone; clones share the same map.
#[derive(Clone, Default)]
pub struct Waiters {
    pending: Arc<Mutex<PendingMap>>,
}

impl Waiters {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a slot for `ack_id`.
    ///
    /// Must be called before the ack request is sent, otherwise a fast
    /// response could arrive before the slot exists.
    pub fn register(&self, ack_id: AckId) -> Result<Waiter> {
        let (tx, rx) = oneshot::channel();

        let mut pending = self.pending.lock();
        if pending.slots.contains_key(&ack_id) {
            return Err(SockwireError::AckIdInUse(ack_id));
        }
        let token = pending.next_token;
        pending.next_token = pending.next_token.wrapping_add(1);
        pending.slots.insert(ack_id, Slot { token, tx });

        Ok(Waiter {
            ack_id,
            token,
            rx,
            pending: self.pending.clone(),
        })
    }

    /// Deliver `payload` to the waiter for `ack_id`.
    ///
    /// Returns `false` if nobody is waiting on that id (unknown, duplicate,
    /// timed out or cancelled).
    pub fn fulfill(&self, ack_id: AckId, payload: Bytes) -> bool {
        let slot = self.pending.lock().slots.remove(&ack_id);

        let Some(slot) = slot else {
            tracing::debug!("No waiter for ack id {}", ack_id);
            return false;
        };

        if slot.tx.send(payload).is_err() {
            // Receiver dropped between removal and send.
            tracing::debug!("Waiter for ack id {} went away before delivery", ack_id);
            return false;
        }
        true
    }

    /// Whether a waiter is outstanding for `ack_id`.
    pub fn contains(&self, ack_id: AckId) -> bool {
        self.pending.lock().slots.contains_key(&ack_id)
    }

    /// Number of outstanding waiters.
    pub fn len(&self) -> usize {
        self.pending.lock().slots.len()
    }

    /// Whether no waiters are outstanding.
    pub fn is_empty(&self) -> bool {
        self.pending.lock().slots.is_empty()
    }

    /// Drop every outstanding slot. Pending `wait` calls fail with
    /// [`SockwireError::ConnectionClosed`].
    pub fn clear(&self) {
        let drained = std::mem::take(&mut self.pending.lock().slots);
        if !drained.is_empty() {
            tracing::debug!("Cancelled {} outstanding ack waiters", drained.len());
        }
    }
}

/// Caller side of a registered slot.
///
/// Dropping a `Waiter` removes its entry, so an abandoned request does not
/// leak its slot.
pub struct Waiter {
    ack_id: AckId,
    token: u64,
    rx: oneshot::Receiver<Bytes>,
    pending: Arc<Mutex<PendingMap>>,
}

impl Waiter {
    /// The ack id this waiter is registered under.
    #[inline]
    pub fn ack_id(&self) -> AckId {
        self.ack_id
    }

    /// Wait for the response payload.
    ///
    /// Suspends only the calling task. On timeout the entry is removed and
    /// a later response for the same id is treated as unknown.
    pub async fn wait(mut self, timeout: Duration) -> Result<Bytes> {
        match tokio::time::timeout(timeout, &mut self.rx).await {
            Ok(Ok(payload)) => Ok(payload),
            Ok(Err(_)) => Err(SockwireError::ConnectionClosed),
            Err(_) => {
                self.pending.lock().release(self.ack_id, self.token);
                Err(SockwireError::AwaitTimeout(self.ack_id))
            }
        }
    }
}

impl Drop for Waiter {
    fn drop(&mut self) {
        self.pending.lock().release(self.ack_id, self.token);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHORT: Duration = Duration::from_millis(20);
    const LONG: Duration = Duration::from_secs(5);

    #[tokio::test]
    async fn test_fulfill_unblocks_wait() {
        let waiters = Waiters::new();
        let waiter = waiters.register(1).unwrap();
        assert!(waiters.contains(1));

        let task = tokio::spawn(waiter.wait(LONG));
        assert!(waiters.fulfill(1, Bytes::from_static(b"reply")));

        let payload = task.await.unwrap().unwrap();
        assert_eq!(&payload[..], b"reply");
        assert!(waiters.is_empty());
    }

    #[tokio::test]
    async fn test_second_fulfill_is_noop() {
        let waiters = Waiters::new();
        let waiter = waiters.register(5).unwrap();

        assert!(waiters.fulfill(5, Bytes::from_static(b"first")));
        assert!(!waiters.fulfill(5, Bytes::from_static(b"second")));

        let payload = waiter.wait(LONG).await.unwrap();
        assert_eq!(&payload[..], b"first");
    }

    #[tokio::test]
    async fn test_timeout_removes_entry() {
        let waiters = Waiters::new();
        let waiter = waiters.register(3).unwrap();

        let result = waiter.wait(SHORT).await;
        assert!(matches!(result, Err(SockwireError::AwaitTimeout(3))));
        assert!(!waiters.contains(3));

        // Late response is discarded.
        assert!(!waiters.fulfill(3, Bytes::from_static(b"late")));
    }

    #[test]
    fn test_unknown_id_not_found() {
        let waiters = Waiters::new();
        assert!(!waiters.fulfill(42, Bytes::new()));
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let waiters = Waiters::new();
        let _first = waiters.register(8).unwrap();

        assert!(matches!(
            waiters.register(8),
            Err(SockwireError::AckIdInUse(8))
        ));
        assert_eq!(waiters.len(), 1);
    }

    #[test]
    fn test_dropped_waiter_removes_entry() {
        let waiters = Waiters::new();
        let waiter = waiters.register(11).unwrap();
        assert_eq!(waiters.len(), 1);

        drop(waiter);
        assert!(waiters.is_empty());
        assert!(!waiters.fulfill(11, Bytes::new()));
    }

    #[tokio::test]
    async fn test_stale_waiter_keeps_reused_slot() {
        let waiters = Waiters::new();
        let first = waiters.register(1).unwrap();
        assert!(waiters.fulfill(1, Bytes::from_static(b"a")));

        // Id 1 is free again once fulfilled.
        let second = waiters.register(1).unwrap();
        drop(first);
        assert!(waiters.contains(1));

        assert!(waiters.fulfill(1, Bytes::from_static(b"b")));
        assert_eq!(&second.wait(LONG).await.unwrap()[..], b"b");
    }

    #[tokio::test]
    async fn test_stale_wait_keeps_reused_slot() {
        let waiters = Waiters::new();
        let first = waiters.register(4).unwrap();
        assert!(waiters.fulfill(4, Bytes::from_static(b"a")));
        let second = waiters.register(4).unwrap();

        // Already delivered, so this completes without touching the new slot.
        assert_eq!(&first.wait(SHORT).await.unwrap()[..], b"a");
        assert!(waiters.contains(4));
        drop(second);
        assert!(waiters.is_empty());
    }

    #[tokio::test]
    async fn test_clear_fails_pending_waits() {
        let waiters = Waiters::new();
        let a = waiters.register(1).unwrap();
        let b = waiters.register(2).unwrap();

        waiters.clear();
        assert!(waiters.is_empty());

        assert!(matches!(
            a.wait(LONG).await,
            Err(SockwireError::ConnectionClosed)
        ));
        assert!(matches!(
            b.wait(LONG).await,
            Err(SockwireError::ConnectionClosed)
        ));
    }

    #[tokio::test]
    async fn test_independent_ids() {
        let waiters = Waiters::new();
        let one = waiters.register(1).unwrap();
        let two = waiters.register(2).unwrap();

        assert!(waiters.fulfill(2, Bytes::from_static(b"two")));
        assert!(waiters.fulfill(1, Bytes::from_static(b"one")));

        assert_eq!(&one.wait(LONG).await.unwrap()[..], b"one");
        assert_eq!(&two.wait(LONG).await.unwrap()[..], b"two");
    }
}
