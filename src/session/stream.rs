use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;

use futures::Stream;
use futures_util::{Sink, SinkExt};
use tracing::{debug, info};

use crate::broker::{Broker, Message, Subscriber, Unsubscribe};

/// Why `StreamSession::run` returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The transport reported that the peer went away.
    Disconnected,
    /// Writing a frame to the peer failed.
    SinkClosed,
    /// The subscriber was removed from the broker by someone else.
    BrokerClosed,
}

/// One listener's subscription plus the loop that feeds its peer.
///
/// Dropping the session unsubscribes it, so cleanup also happens when the
/// owning task is cancelled or the transport drops a response stream.
#[derive(Debug)]
pub struct StreamSession {
    subscriber: Subscriber,
    unsubscribe: Unsubscribe,
}

impl StreamSession {
    /// Subscribe to `room` and return the session that owns the subscription.
    pub fn open(broker: &Broker, room: &str) -> Self {
        let (subscriber, unsubscribe) = broker.subscribe(room);
        info!(room, subscriber = subscriber.id(), "stream opened");
        Self {
            subscriber,
            unsubscribe,
        }
    }

    pub fn room(&self) -> &str {
        self.subscriber.room()
    }

    pub fn subscriber_id(&self) -> &str {
        self.subscriber.id()
    }

    /// A handle that ends this session's subscription from outside the loop.
    pub fn unsubscribe_handle(&self) -> Unsubscribe {
        self.unsubscribe.clone()
    }

    /// Forward inbox messages to `sink` until `disconnected` resolves, a
    /// write fails, or the subscription is removed.
    ///
    /// Each message is written as one JSON frame and flushed before the next
    /// one is taken from the inbox.
    pub async fn run<S, D>(mut self, mut sink: S, disconnected: D) -> SessionEnd
    where
        S: Sink<String> + Unpin,
        S::Error: Display,
        D: Future<Output = ()>,
    {
        tokio::pin!(disconnected);

        let end = loop {
            tokio::select! {
                biased;

                () = &mut disconnected => break SessionEnd::Disconnected,

                next = self.subscriber.recv() => {
                    let Some(message) = next else {
                        break SessionEnd::BrokerClosed;
                    };
                    if let Err(e) = sink.send(message.to_frame()).await {
                        debug!(
                            room = self.room(),
                            subscriber = self.subscriber_id(),
                            error = %e,
                            "write to peer failed"
                        );
                        break SessionEnd::SinkClosed;
                    }
                }
            }
        };

        debug!(
            room = self.room(),
            subscriber = self.subscriber_id(),
            ?end,
            "stream loop finished"
        );
        end
    }

    /// Turn the session into a stream of messages for pull-based transports.
    ///
    /// The stream ends if the subscription is removed from outside; dropping
    /// it unsubscribes.
    pub fn into_stream(self) -> impl Stream<Item = Arc<Message>> + Send + 'static {
        futures::stream::unfold(self, |mut session| async move {
            let message = session.subscriber.recv().await?;
            Some((message, session))
        })
    }
}

impl Drop for StreamSession {
    fn drop(&mut self) {
        self.unsubscribe.unsubscribe();
        info!(
            room = self.subscriber.room(),
            subscriber = self.subscriber.id(),
            "stream closed"
        );
    }
}
