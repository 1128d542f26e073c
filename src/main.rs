//! CLI for roomcast
//!
//! Subcommands:
//! - `server`: run the HTTP/SSE and WebSocket transports
//! - `client`: join a room over WebSocket and print what arrives (useful for
//!   smoke tests)

use clap::Parser;
use roomcast::broker::Broker;
use roomcast::config::load_config;
use roomcast::transport::{start_http_server, start_websocket_server};
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "roomcast")]
enum Command {
    /// Start the relay
    Server,
    /// Join a room and print every message it receives
    Client {
        /// Room URL to connect to
        #[arg(long, default_value = "ws://127.0.0.1:8081/lobby")]
        url: String,
        /// Sender name used with --message
        #[arg(long, default_value = "cli")]
        name: String,
        /// Publish this message once after joining
        #[arg(long)]
        message: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    let cmd = Command::parse();

    let _ = dotenvy::dotenv();
    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            roomcast::utils::logging::init("info");
            error!("{e}");
            return;
        }
    };
    roomcast::utils::logging::init(&config.log.level);

    match cmd {
        Command::Server => {
            if let Err(e) = run_server(config).await {
                error!("Server failed: {e}");
            }
        }
        Command::Client { url, name, message } => {
            if let Err(e) = run_client(&url, &name, message).await {
                error!("Client failed: {e}");
            }
        }
    }
}

async fn run_server(
    config: roomcast::config::Settings,
) -> Result<(), Box<dyn std::error::Error>> {
    let http_addr = format!("{}:{}", config.server.host, config.server.port);
    let ws_addr = format!("{}:{}", config.server.host, config.server.ws_port);
    let broker = Broker::new(&config.broker);

    tokio::select! {
        res = start_http_server(http_addr, broker.clone(), config.server.clone()) => {
            res?;
            error!("HTTP server exited unexpectedly.");
        }
        res = start_websocket_server(ws_addr, broker) => {
            res?;
            error!("WebSocket server exited unexpectedly.");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received. Exiting gracefully.");
        }
    }

    Ok(())
}

async fn run_client(
    url: &str,
    name: &str,
    message: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    use futures_util::{SinkExt, StreamExt};
    use serde_json::json;
    use tokio_tungstenite::connect_async;
    use tokio_tungstenite::tungstenite::Message as WsMessage;

    let (mut ws_stream, _response) = connect_async(url).await?;
    info!("Connected to {url}");

    if let Some(message) = message {
        let publish = json!({ "name": name, "message": message });
        ws_stream
            .send(WsMessage::Text(publish.to_string().into()))
            .await?;
    }

    while let Some(frame) = ws_stream.next().await {
        match frame? {
            WsMessage::Text(text) => println!("{text}"),
            WsMessage::Close(_) => break,
            _ => {}
        }
    }

    Ok(())
}
