//! HTTP transport
//!
//! Two routes, matching the browser client:
//! - `POST /{room}/send` takes `name` and `message` as a urlencoded or
//!   multipart form and publishes them into the room
//! - `GET /{room}/messages` keeps the response open as an event stream; each
//!   published message arrives as one SSE event named `data` carrying the
//!   message JSON
//!
//! A stream session lives exactly as long as its response body. When the
//! client goes away the body is dropped, and with it the subscription.

use std::convert::Infallible;
use std::time::Duration;

use axum::extract::{FromRequest, Multipart, Path, Request, State};
use axum::http::header;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use futures::Stream;
use futures_util::StreamExt;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::broker::Broker;
use crate::config::ServerSettings;
use crate::session::StreamSession;
use crate::transport::message::{PublishRequest, SendResponse};
use crate::utils::RelayError;

/// SSE event name the browser client listens for.
pub const EVENT_NAME: &str = "data";

#[derive(Debug, Clone)]
pub struct AppState {
    pub broker: Broker,
    pub keep_alive: Duration,
}

/// Build the HTTP routes around `broker`.
pub fn router(broker: Broker, settings: &ServerSettings) -> Router {
    let state = AppState {
        broker,
        keep_alive: Duration::from_secs(settings.keep_alive_secs.max(1)),
    };

    let router = Router::new()
        .route("/{room}/send", post(send_message))
        .route("/{room}/messages", get(stream_messages))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if settings.allow_all_origins {
        router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
    } else {
        router
    }
}

pub async fn start_http_server(
    addr: String,
    broker: Broker,
    settings: ServerSettings,
) -> Result<(), RelayError> {
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|source| RelayError::Bind {
            addr: addr.clone(),
            source,
        })?;

    info!("HTTP server listening on http://{addr}");

    axum::serve(listener, router(broker, &settings)).await?;
    Ok(())
}

async fn send_message(
    State(state): State<AppState>,
    Path(room): Path<String>,
    request: PublishRequest,
) -> Json<SendResponse> {
    let delivery = state
        .broker
        .publish(&room, request.name, request.message);
    info!(
        room,
        delivered = delivery.delivered,
        dropped = delivery.dropped,
        "message published"
    );
    Json(SendResponse::sent())
}

async fn stream_messages(
    State(state): State<AppState>,
    Path(room): Path<String>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let session = StreamSession::open(&state.broker, &room);

    let events = session.into_stream().map(|message| {
        Ok(Event::default()
            .event(EVENT_NAME)
            .data(message.to_frame()))
    });

    Sse::new(events).keep_alive(KeepAlive::new().interval(state.keep_alive))
}

impl<S> FromRequest<S> for PublishRequest
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("multipart/form-data"));

        if !is_multipart {
            let Form(request) = Form::<PublishRequest>::from_request(req, state)
                .await
                .map_err(IntoResponse::into_response)?;
            return Ok(request);
        }

        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(IntoResponse::into_response)?;

        let mut request = PublishRequest::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(IntoResponse::into_response)?
        {
            let name = field.name().map(str::to_owned);
            let text = field.text().await.map_err(IntoResponse::into_response)?;
            match name.as_deref() {
                Some("name") => request.name = text,
                Some("message") => request.message = text,
                _ => {}
            }
        }
        Ok(request)
    }
}
