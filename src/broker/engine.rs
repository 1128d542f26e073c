//! Broker engine
//!
//! This module contains the in-memory broker responsible for:
//! - mapping room keys to the inboxes of their current subscribers
//! - stamping and fanning out published messages
//! - creating rooms on first subscribe and reaping them when they empty
//!
//! Concurrency and usage notes:
//! - `Broker` is a cheap `Clone` handle over one shared registry. Construct it
//!   once at startup and hand a clone to every transport handler.
//! - A single mutex guards the whole room map. Publish delivers while holding
//!   it, so two publishes to one room never interleave inside different
//!   inboxes in different orders.
//! - Delivery uses `try_send`: a full inbox loses that one message and the
//!   publisher moves on. The lock is never held across an `.await`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::broker::message::Message;
use crate::broker::room::{Room, SubscriberId};
use crate::broker::subscriber::{Subscriber, Unsubscribe};
use crate::config::BrokerSettings;

#[derive(Debug, Default)]
struct Registry {
    rooms: HashMap<String, Room>,
    last_timestamp: i64,
}

/// Outcome of one publish call. Informational only: subscribers never
/// acknowledge anything.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub message: Arc<Message>,
    pub delivered: usize,
    pub dropped: usize,
}

#[derive(Debug, Clone)]
pub struct Broker {
    registry: Arc<Mutex<Registry>>,
    inbox_capacity: usize,
}

impl Broker {
    /// Inbox size used when no configuration is supplied.
    pub const DEFAULT_INBOX_CAPACITY: usize = 256;
}

impl Default for Broker {
    fn default() -> Self {
        Self::with_inbox_capacity(Self::DEFAULT_INBOX_CAPACITY)
    }
}

impl Broker {
    pub fn new(settings: &BrokerSettings) -> Self {
        Self::with_inbox_capacity(settings.inbox_capacity)
    }

    /// Build a broker whose subscriber inboxes hold up to `capacity` pending
    /// messages. A capacity of zero is raised to one.
    pub fn with_inbox_capacity(capacity: usize) -> Self {
        Self {
            registry: Arc::new(Mutex::new(Registry::default())),
            inbox_capacity: capacity.max(1),
        }
    }

    pub fn inbox_capacity(&self) -> usize {
        self.inbox_capacity
    }

    // A panic while holding the lock cannot leave a room half-updated: every
    // mutation below is a single map insert or remove.
    fn lock(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a new subscriber on `room`, creating the room if needed.
    pub fn subscribe(&self, room: &str) -> (Subscriber, Unsubscribe) {
        let id: SubscriberId = Uuid::new_v4().to_string();
        let (tx, rx) = mpsc::channel(self.inbox_capacity);

        let listeners = {
            let mut registry = self.lock();
            let entry = registry
                .rooms
                .entry(room.to_string())
                .or_insert_with(|| Room::new(room));
            entry.subscribe(id.clone(), tx);
            entry.len()
        };
        debug!(room, subscriber = %id, listeners, "subscribed");

        (
            Subscriber::new(id.clone(), room, rx),
            Unsubscribe::new(self.clone(), room, id),
        )
    }

    /// Remove one subscriber and reap its room if it is now empty.
    pub(crate) fn remove_subscriber(&self, room: &str, id: &SubscriberId) -> bool {
        let mut registry = self.lock();
        let Some(entry) = registry.rooms.get_mut(room) else {
            return false;
        };

        let removed = entry.unsubscribe(id);
        if entry.is_empty() {
            registry.rooms.remove(room);
            debug!(room, "room empty, removed");
        }
        drop(registry);

        if removed {
            debug!(room, subscriber = %id, "unsubscribed");
        }
        removed
    }

    /// Stamp a message and hand it to every current subscriber of `room`.
    ///
    /// Publishing to a room nobody listens on is a no-op. A subscriber whose
    /// inbox is full misses this message; nobody else is affected and the
    /// call never blocks. A subscriber whose inbox was dropped is removed.
    pub fn publish(
        &self,
        room: &str,
        name: impl Into<String>,
        message: impl Into<String>,
    ) -> Delivery {
        let name = name.into();
        let message = message.into();

        let mut registry = self.lock();

        let timestamp = chrono::Utc::now()
            .timestamp_millis()
            .max(registry.last_timestamp);
        registry.last_timestamp = timestamp;

        let message = Arc::new(Message {
            name,
            message,
            timestamp,
        });
        let mut delivery = Delivery {
            message: Arc::clone(&message),
            delivered: 0,
            dropped: 0,
        };

        let Some(entry) = registry.rooms.get_mut(room) else {
            debug!(room, "no subscribers, message discarded");
            return delivery;
        };

        let mut closed = Vec::new();
        for (sub_id, inbox) in &entry.subscribers {
            match inbox.try_send(Arc::clone(&message)) {
                Ok(()) => delivery.delivered += 1,
                Err(TrySendError::Full(_)) => {
                    delivery.dropped += 1;
                    warn!(room, subscriber = %sub_id, "inbox full, message dropped");
                }
                Err(TrySendError::Closed(_)) => {
                    delivery.dropped += 1;
                    closed.push(sub_id.clone());
                }
            }
        }

        // Nobody reads a closed inbox again; forget it so the room can be reaped.
        for sub_id in &closed {
            entry.unsubscribe(sub_id);
            debug!(room, subscriber = %sub_id, "inbox closed, subscriber removed");
        }
        if entry.is_empty() {
            registry.rooms.remove(room);
            debug!(room, "room empty, removed");
        }

        delivery
    }

    /// Number of rooms that currently have at least one subscriber.
    pub fn room_count(&self) -> usize {
        self.lock().rooms.len()
    }

    /// Number of subscribers currently registered on `room`.
    pub fn subscriber_count(&self, room: &str) -> usize {
        self.lock().rooms.get(room).map_or(0, Room::len)
    }
}
