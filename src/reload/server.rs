//! WebSocket broadcast implementation of the live-reload notifier

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
    routing::get,
    Router,
};
use colored::Colorize;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast;
use tower_http::cors::CorsLayer;
use tracing::{debug, info};

use super::{LiveReload, ReloadMessage, ReloadOptions};

/// Live-reload endpoint
///
/// Clients connect to `ws://<host>:<port>/livereload` and receive one
/// message per rebuild.
pub struct ReloadServer {
    host: String,
    port: u16,
    tx: broadcast::Sender<ReloadMessage>,
}

impl ReloadServer {
    pub fn new(host: &str, port: u16) -> Self {
        let (tx, _) = broadcast::channel(100);
        Self {
            host: host.to_string(),
            port,
            tx,
        }
    }

    /// Address clients connect to.
    pub fn endpoint(&self) -> String {
        format!("ws://{}:{}/livereload", self.host, self.port)
    }

    /// Subscribe to the messages this server broadcasts.
    pub fn subscribe(&self) -> broadcast::Receiver<ReloadMessage> {
        self.tx.subscribe()
    }

    /// Serve the reload endpoint until the process exits.
    pub async fn serve(self: Arc<Self>) -> Result<()> {
        let addr: SocketAddr = format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid reload address {}:{}", self.host, self.port))?;

        let app = Router::new()
            .route("/livereload", get(reload_websocket))
            .layer(CorsLayer::permissive())
            .with_state(self.tx.clone());

        info!("Live-reload endpoint on {}", self.endpoint());

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to bind reload endpoint on {addr}"))?;
        axum::serve(listener, app).await?;

        Ok(())
    }
}

#[async_trait]
impl LiveReload for ReloadServer {
    async fn notify(&self, bundle: &Path, options: &ReloadOptions) -> Result<()> {
        let message = ReloadMessage::BundleUpdate {
            path: bundle.display().to_string(),
            public_url: options.public_url.clone(),
        };

        // Send-to-nobody is fine; clients come and go.
        match self.tx.send(message) {
            Ok(n) => debug!("notified {n} reload client(s)"),
            Err(_) => debug!("no reload clients connected"),
        }

        Ok(())
    }

    fn print_command_tips(&self) {
        eprintln!();
        eprintln!("  {} save a source file to rebuild", "→".dimmed());
        eprintln!(
            "  {} press {} to stop watching",
            "→".dimmed(),
            "Ctrl+C".yellow()
        );
    }
}

/// Handle WebSocket upgrade for the reload endpoint
async fn reload_websocket(
    ws: WebSocketUpgrade,
    State(tx): State<broadcast::Sender<ReloadMessage>>,
) -> Response {
    ws.on_upgrade(|socket| handle_reload_socket(socket, tx))
}

/// Handle one reload client connection
async fn handle_reload_socket(socket: WebSocket, tx: broadcast::Sender<ReloadMessage>) {
    let (mut sender, mut receiver) = socket.split();
    let mut rx = tx.subscribe();

    if let Ok(json) = serde_json::to_string(&ReloadMessage::Connected) {
        let _ = sender.send(Message::Text(json)).await;
    }

    debug!("reload client connected");

    let send_task = tokio::spawn(async move {
        while let Ok(message) = rx.recv().await {
            if let Ok(json) = serde_json::to_string(&message) {
                if sender.send(Message::Text(json)).await.is_err() {
                    break;
                }
            }
        }
    });

    let recv_task = tokio::spawn(async move {
        while let Some(Ok(message)) = receiver.next().await {
            match message {
                Message::Close(_) => {
                    debug!("reload client disconnected");
                    break;
                }
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = send_task => {},
        _ = recv_task => {},
    }

    debug!("reload connection closed");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn notify_without_clients_is_not_an_error() {
        let server = ReloadServer::new("localhost", 35729);
        let result = server
            .notify(Path::new("/app/dist/bundle.js"), &ReloadOptions::default())
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn notify_broadcasts_the_bundle_path() {
        let server = ReloadServer::new("localhost", 35729);
        let mut rx = server.subscribe();

        let options = ReloadOptions {
            public_url: Some("http://localhost:8100/".to_string()),
        };
        server
            .notify(Path::new("/app/dist/bundle.js"), &options)
            .await
            .unwrap();

        match rx.recv().await.unwrap() {
            ReloadMessage::BundleUpdate { path, public_url } => {
                assert_eq!(path, "/app/dist/bundle.js");
                assert_eq!(public_url.as_deref(), Some("http://localhost:8100/"));
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }
}
