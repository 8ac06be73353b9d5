//! Subscriber fan-out.
//!
//! Grounded in the teacher's `BroadcastMessage` (`Arc`-wrapped payloads so
//! broadcasting to N subscribers clones a pointer, not the message) and its
//! policy of silently dropping dead sockets. Unlike the teacher this crate
//! carries only the JSON encoding `spec.md` §6 fixes — no MessagePack/rkyv
//! serialization cache, since there is only ever one wire format to produce.

use std::sync::Arc;
use tokio::sync::mpsc;

/// One subscriber's outbound channel, identified by an opaque id so it can
/// be removed from the set without comparing sender equality.
struct Subscriber<T> {
    id: u64,
    tx: mpsc::UnboundedSender<Arc<T>>,
}

/// A set of write-only sinks attached to an actor. `broadcast` enqueues the
/// message once per live subscriber and prunes any that have hung up.
pub struct Fanout<T> {
    subscribers: Vec<Subscriber<T>>,
    next_id: u64,
}

impl<T> Default for Fanout<T> {
    fn default() -> Self {
        Self {
            subscribers: Vec::new(),
            next_id: 0,
        }
    }
}

impl<T> Fanout<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a new subscriber, returning its id (for `unsubscribe`) and the
    /// receiving half of its channel.
    pub fn subscribe(&mut self) -> (u64, mpsc::UnboundedReceiver<Arc<T>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = self.next_id;
        self.next_id += 1;
        self.subscribers.push(Subscriber { id, tx });
        (id, rx)
    }

    pub fn unsubscribe(&mut self, id: u64) {
        self.subscribers.retain(|s| s.id != id);
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Send `message` to every live subscriber; drop any whose receiver has
    /// gone away. Never fails the caller — per `spec.md` §7, "broadcast
    /// failures are swallowed per-subscriber".
    pub fn broadcast(&mut self, message: T) {
        let message = Arc::new(message);
        self.subscribers
            .retain(|s| s.tx.send(message.clone()).is_ok());
    }
}
