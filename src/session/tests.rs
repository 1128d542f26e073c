use super::{SessionEnd, StreamSession};
use crate::broker::{Broker, Message};
use futures::channel::mpsc;
use futures_util::StreamExt;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(2);

fn disconnect_signal() -> (oneshot::Sender<()>, impl Future<Output = ()>) {
    let (tx, rx) = oneshot::channel::<()>();
    (tx, async move {
        let _ = rx.await;
    })
}

#[tokio::test]
async fn test_open_registers_subscriber() {
    let broker = Broker::default();
    let session = StreamSession::open(&broker, "lobby");
    assert_eq!(session.room(), "lobby");
    assert_eq!(broker.subscriber_count("lobby"), 1);

    drop(session);
    assert_eq!(broker.subscriber_count("lobby"), 0);
    assert_eq!(broker.room_count(), 0);
}

#[tokio::test]
async fn test_forwards_frames_in_order_until_disconnect() {
    let broker = Broker::default();
    let session = StreamSession::open(&broker, "lobby");
    let (frames_tx, mut frames_rx) = mpsc::unbounded::<String>();
    let (disconnect, disconnected) = disconnect_signal();

    let task = tokio::spawn(session.run(frames_tx, disconnected));

    broker.publish("lobby", "alice", "one");
    broker.publish("lobby", "bob", "two");
    broker.publish("other", "carol", "not for lobby");

    let first: Message = serde_json::from_str(&frames_rx.next().await.unwrap()).unwrap();
    let second: Message = serde_json::from_str(&frames_rx.next().await.unwrap()).unwrap();
    assert_eq!((first.name.as_str(), first.message.as_str()), ("alice", "one"));
    assert_eq!((second.name.as_str(), second.message.as_str()), ("bob", "two"));
    assert!(second.timestamp >= first.timestamp);

    disconnect.send(()).unwrap();
    let end = timeout(WAIT, task).await.unwrap().unwrap();
    assert_eq!(end, SessionEnd::Disconnected);
    assert_eq!(broker.subscriber_count("lobby"), 0);

    // Nothing else was written, and the frame channel is now closed.
    assert!(frames_rx.next().await.is_none());
}

#[tokio::test]
async fn test_no_delivery_after_disconnect() {
    let broker = Broker::default();
    let session = StreamSession::open(&broker, "lobby");
    let (frames_tx, mut frames_rx) = mpsc::unbounded::<String>();
    let (disconnect, disconnected) = disconnect_signal();

    let task = tokio::spawn(session.run(frames_tx, disconnected));
    disconnect.send(()).unwrap();
    timeout(WAIT, task).await.unwrap().unwrap();

    let delivery = broker.publish("lobby", "alice", "late");
    assert_eq!(delivery.delivered, 0);
    assert!(frames_rx.next().await.is_none());
}

#[tokio::test]
async fn test_write_failure_ends_session() {
    let broker = Broker::default();
    let session = StreamSession::open(&broker, "lobby");
    let (frames_tx, frames_rx) = mpsc::unbounded::<String>();
    drop(frames_rx);

    let task = tokio::spawn(session.run(frames_tx, std::future::pending()));
    broker.publish("lobby", "alice", "into the void");

    let end = timeout(WAIT, task).await.unwrap().unwrap();
    assert_eq!(end, SessionEnd::SinkClosed);
    assert_eq!(broker.subscriber_count("lobby"), 0);
}

#[tokio::test]
async fn test_external_unsubscribe_ends_session() {
    let broker = Broker::default();
    let session = StreamSession::open(&broker, "lobby");
    let handle = session.unsubscribe_handle();
    let (frames_tx, _frames_rx) = mpsc::unbounded::<String>();

    let task = tokio::spawn(session.run(frames_tx, std::future::pending()));
    handle.unsubscribe();

    let end = timeout(WAIT, task).await.unwrap().unwrap();
    assert_eq!(end, SessionEnd::BrokerClosed);

    // The session's own cleanup ran as a no-op on top of ours.
    handle.unsubscribe();
    assert_eq!(broker.room_count(), 0);
}

#[tokio::test]
async fn test_aborted_task_unsubscribes() {
    let broker = Broker::default();
    let session = StreamSession::open(&broker, "lobby");
    let (frames_tx, _frames_rx) = mpsc::unbounded::<String>();

    let task = tokio::spawn(session.run(frames_tx, std::future::pending()));
    task.abort();
    assert!(task.await.unwrap_err().is_cancelled());

    assert_eq!(broker.subscriber_count("lobby"), 0);
}

#[tokio::test]
async fn test_two_sessions_receive_identical_frames() {
    let broker = Broker::default();
    let (tx_a, mut rx_a) = mpsc::unbounded::<String>();
    let (tx_b, mut rx_b) = mpsc::unbounded::<String>();

    let a = tokio::spawn(StreamSession::open(&broker, "lobby").run(tx_a, std::future::pending()));
    let b = tokio::spawn(StreamSession::open(&broker, "lobby").run(tx_b, std::future::pending()));

    broker.publish("lobby", "alice", "hi");

    let frame_a = timeout(WAIT, rx_a.next()).await.unwrap().unwrap();
    let frame_b = timeout(WAIT, rx_b.next()).await.unwrap().unwrap();
    assert_eq!(frame_a, frame_b);

    a.abort();
    b.abort();
}

#[tokio::test]
async fn test_into_stream_yields_and_cleans_up() {
    let broker = Broker::default();
    let mut stream = Box::pin(StreamSession::open(&broker, "lobby").into_stream());

    broker.publish("lobby", "alice", "hi");
    broker.publish("lobby", "alice", "again");

    assert_eq!(stream.next().await.unwrap().message, "hi");
    assert_eq!(stream.next().await.unwrap().message, "again");
    assert_eq!(broker.subscriber_count("lobby"), 1);

    drop(stream);
    assert_eq!(broker.subscriber_count("lobby"), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_cloned_handles_race_session_teardown() {
    let broker = Broker::default();

    for round in 0..50 {
        let session = StreamSession::open(&broker, "lobby");
        let handles: Vec<_> = (0..6).map(|_| session.unsubscribe_handle()).collect();
        let (frames_tx, _frames_rx) = mpsc::unbounded::<String>();
        let runner = tokio::spawn(session.run(frames_tx, std::future::pending()));

        let mut tasks = Vec::new();
        for handle in handles.iter().cloned() {
            tasks.push(tokio::spawn(async move { handle.unsubscribe() }));
        }
        let publisher = {
            let broker = broker.clone();
            tokio::spawn(async move {
                for i in 0..10 {
                    broker.publish("lobby", "alice", i.to_string());
                    tokio::task::yield_now().await;
                }
            })
        };
        // Half the rounds tear the session down by abort, the rest let the
        // handles end it.
        if round % 2 == 0 {
            runner.abort();
        }

        timeout(WAIT, async {
            for task in tasks {
                task.await.unwrap();
            }
            publisher.await.unwrap();
            let _ = runner.await;
        })
        .await
        .expect("session teardown should not hang");

        assert!(handles.iter().all(|h| h.is_unsubscribed()));
        assert_eq!(broker.subscriber_count("lobby"), 0);
        assert_eq!(broker.room_count(), 0);
    }
}
