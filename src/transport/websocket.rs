//! WebSocket transport
//!
//! This file implements a minimal WebSocket server that attaches each
//! connection to one room. Responsibilities:
//! - Accept TCP/WebSocket connections; the request path names the room
//!   (`ws://host:port/lobby`). The key is one percent-decoded path segment,
//!   the same key the HTTP routes extract, so both transports share rooms.
//!   Any other path is refused with `400 Bad Request`
//! - Run a `StreamSession` for the connection, writing every message of the
//!   room as one JSON text frame
//! - Publish client text frames of the form `{"name": .., "message": ..}`
//!   into the same room
//!
//! A Close frame, a read error or a failed write ends the session, which
//! unsubscribes it from the broker.

use std::borrow::Cow;

use futures::future;
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::accept_hdr_async;
use tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tungstenite::http::StatusCode;
use tungstenite::protocol::Message as WsMessage;
use tracing::{debug, info, warn};

use crate::broker::Broker;
use crate::session::StreamSession;
use crate::transport::message::PublishRequest;
use crate::utils::RelayError;

pub async fn start_websocket_server(addr: String, broker: Broker) -> Result<(), RelayError> {
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|source| RelayError::Bind {
            addr: addr.clone(),
            source,
        })?;

    info!("WebSocket server listening on ws://{addr}");

    serve_websocket(listener, broker).await;
    Ok(())
}

/// Accept connections on an already bound listener for as long as the task runs.
pub async fn serve_websocket(listener: TcpListener, broker: Broker) {
    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                warn!("WebSocket accept error: {e}");
                continue;
            }
        };

        let broker = broker.clone();
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, broker).await {
                warn!(%peer, "WebSocket connection error: {e}");
            }
        });
    }
}

/// Room key for a request path such as `/lobby` or `/my%20room/`.
///
/// Returns `None` unless the path is exactly one non-empty segment that
/// decodes to valid UTF-8.
pub fn room_from_path(path: &str) -> Option<String> {
    let segment = path.strip_prefix('/')?;
    let segment = segment.strip_suffix('/').unwrap_or(segment);
    if segment.is_empty() || segment.contains('/') {
        return None;
    }
    urlencoding::decode(segment).ok().map(Cow::into_owned)
}

fn bad_request(reason: &str) -> ErrorResponse {
    let mut response = ErrorResponse::new(Some(reason.to_string()));
    *response.status_mut() = StatusCode::BAD_REQUEST;
    response
}

async fn handle_connection(stream: TcpStream, broker: Broker) -> Result<(), RelayError> {
    let mut room = String::new();
    let ws_stream = accept_hdr_async(
        stream,
        |req: &Request, resp: Response| -> Result<Response, ErrorResponse> {
            match room_from_path(req.uri().path()) {
                Some(key) => {
                    room = key;
                    Ok(resp)
                }
                None => Err(bad_request("path must name exactly one room")),
            }
        },
    )
    .await?;

    let (ws_sender, mut ws_receiver) = ws_stream.split();
    let session = StreamSession::open(&broker, &room);
    let client_id = session.subscriber_id().to_string();

    let sink = ws_sender.with(|frame: String| {
        future::ready(Ok::<_, tungstenite::Error>(WsMessage::text(frame)))
    });

    // Resolves when the peer closes or the socket fails; publishes whatever
    // the peer sends in the meantime.
    let disconnected = {
        let client_id = client_id.clone();
        let room = room.clone();
        async move {
            while let Some(frame) = ws_receiver.next().await {
                match frame {
                    Ok(WsMessage::Text(text)) => {
                        match serde_json::from_str::<PublishRequest>(&text) {
                            Ok(request) => {
                                let delivery =
                                    broker.publish(&room, request.name, request.message);
                                debug!(
                                    room,
                                    client = %client_id,
                                    delivered = delivery.delivered,
                                    "published from websocket"
                                );
                            }
                            Err(err) => {
                                warn!(
                                    "Invalid client message from {client_id}: {err} | {}",
                                    text.chars().take(100).collect::<String>()
                                );
                            }
                        }
                    }
                    Ok(WsMessage::Close(_)) => break,
                    Ok(_) => {}
                    Err(e) => {
                        debug!(client = %client_id, "read error: {e}");
                        break;
                    }
                }
            }
        }
    };

    let end = session.run(sink, disconnected).await;
    info!(room, client = %client_id, ?end, "connection closed");
    Ok(())
}
