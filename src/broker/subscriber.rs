//! Subscriber handles
//!
//! `Broker::subscribe` hands out two values:
//! - a `Subscriber`, which owns the receiving half of the inbox and is read by
//!   exactly one stream session
//! - an `Unsubscribe` handle, which removes the subscriber from its room
//!
//! The handle is `Clone` so that several disconnect paths (peer close, write
//! failure, task drop) can each hold one. Only the first call has an effect;
//! concurrent callers wait for that first removal to finish, so once any call
//! returns the broker no longer sees the subscriber.

use std::sync::{Arc, Once};

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;

use crate::broker::engine::Broker;
use crate::broker::message::Message;
use crate::broker::room::SubscriberId;

#[derive(Debug)]
pub struct Subscriber {
    id: SubscriberId,
    room: String,
    inbox: mpsc::Receiver<Arc<Message>>,
}

impl Subscriber {
    pub(crate) fn new(id: SubscriberId, room: &str, inbox: mpsc::Receiver<Arc<Message>>) -> Self {
        Self {
            id,
            room: room.to_string(),
            inbox,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn room(&self) -> &str {
        &self.room
    }

    /// Wait for the next message in FIFO order.
    ///
    /// Returns `None` once the subscriber has been unsubscribed and every
    /// message enqueued before that has been drained.
    pub async fn recv(&mut self) -> Option<Arc<Message>> {
        self.inbox.recv().await
    }

    /// Take the next message if one is already waiting.
    pub fn try_recv(&mut self) -> Option<Arc<Message>> {
        match self.inbox.try_recv() {
            Ok(message) => Some(message),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Unsubscribe {
    broker: Broker,
    room: String,
    id: SubscriberId,
    once: Arc<Once>,
}

impl Unsubscribe {
    pub(crate) fn new(broker: Broker, room: &str, id: SubscriberId) -> Self {
        Self {
            broker,
            room: room.to_string(),
            id,
            once: Arc::new(Once::new()),
        }
    }

    /// Remove the subscriber from its room. Repeated calls are no-ops.
    pub fn unsubscribe(&self) {
        self.once.call_once(|| {
            self.broker.remove_subscriber(&self.room, &self.id);
        });
    }

    pub fn is_unsubscribed(&self) -> bool {
        self.once.is_completed()
    }
}
