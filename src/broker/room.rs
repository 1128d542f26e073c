//! Room membership
//!
//! A `Room` holds the inbox senders of every subscriber currently listening
//! on one room key. Rooms are created by the broker on first subscribe and
//! dropped when their last subscriber leaves.
//!
//! Concurrency note: callers must synchronize access to `Room` (the broker
//! keeps every room behind its registry lock).

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::broker::message::Message;

pub type SubscriberId = String;

/// Sending half of a subscriber's inbox, as held by the broker.
pub type InboxSender = mpsc::Sender<Arc<Message>>;

#[derive(Debug, Default)]
pub struct Room {
    pub name: String,
    pub subscribers: HashMap<SubscriberId, InboxSender>,
}

impl Room {
    /// Create an empty room with the given key.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            subscribers: HashMap::new(),
        }
    }

    /// Register a subscriber's inbox. Re-using an id replaces the old inbox.
    pub fn subscribe(&mut self, id: SubscriberId, inbox: InboxSender) {
        self.subscribers.insert(id, inbox);
    }

    /// Remove a subscriber. Returns whether it was present.
    pub fn unsubscribe(&mut self, id: &SubscriberId) -> bool {
        self.subscribers.remove(id).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }
}
