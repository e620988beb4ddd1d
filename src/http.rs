//! Status server: static files plus a WebSocket status feed.
//!
//! `/ws` pushes a [`StatusSnapshot`](zybot_proto::StatusSnapshot) as JSON on
//! connect and then on every broadcast tick. Any other path is served from
//! the static directory (`/` maps to `index.html`).

use crate::bot::BotHandle;
use crate::config::WebConfig;
use crate::telemetry::spans;
use axum::Router;
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::http::{StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use std::net::SocketAddr;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, watch};
use tracing::{Instrument, debug, error, info, warn};

const FEED_CAPACITY: usize = 16;

#[derive(Clone)]
struct AppState {
    bot: BotHandle,
    feed: broadcast::Sender<String>,
    static_dir: Arc<PathBuf>,
    shutdown: watch::Receiver<bool>,
}

/// Bound, not yet serving, status server.
pub struct StatusServer {
    listener: TcpListener,
    bot: BotHandle,
    static_dir: PathBuf,
    interval: Duration,
}

impl StatusServer {
    /// Bind the listener. Failure here is fatal for the caller.
    pub async fn bind(config: &WebConfig, bot: BotHandle) -> std::io::Result<Self> {
        let listener = TcpListener::bind(&config.address).await?;
        info!(
            address = %listener.local_addr()?,
            static_dir = %config.static_dir,
            "Status server bound"
        );
        Ok(Self {
            listener,
            bot,
            static_dir: PathBuf::from(&config.static_dir),
            interval: config.broadcast_interval(),
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Serve until `shutdown` turns true.
    pub async fn serve(self, shutdown: watch::Receiver<bool>) -> std::io::Result<()> {
        let (feed, _) = broadcast::channel(FEED_CAPACITY);
        let state = AppState {
            bot: self.bot,
            feed,
            static_dir: Arc::new(self.static_dir),
            shutdown: shutdown.clone(),
        };

        tokio::spawn(broadcast_status(state.clone(), self.interval));

        let app = Router::new()
            .route("/ws", get(ws_upgrade))
            .fallback(get(static_file))
            .with_state(state);

        let mut signal = shutdown;
        axum::serve(self.listener, app)
            .with_graceful_shutdown(async move {
                wait_for_shutdown(&mut signal).await;
                info!("Status server shutting down");
            })
            .await
    }
}

async fn wait_for_shutdown(signal: &mut watch::Receiver<bool>) {
    while !*signal.borrow() {
        if signal.changed().await.is_err() {
            return;
        }
    }
}

fn status_json(bot: &BotHandle) -> Option<String> {
    match serde_json::to_string(&bot.status()) {
        Ok(json) => Some(json),
        Err(e) => {
            error!(error = %e, "Failed to encode status");
            None
        }
    }
}

/// Push the status to every subscriber on a fixed interval.
async fn broadcast_status(state: AppState, every: Duration) {
    let mut ticker = tokio::time::interval(every);
    let mut shutdown = state.shutdown.clone();
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if state.feed.receiver_count() == 0 {
                    continue;
                }
                if let Some(json) = status_json(&state.bot) {
                    let _ = state.feed.send(json);
                }
            }
            _ = wait_for_shutdown(&mut shutdown) => break,
        }
    }
    debug!("Status broadcaster stopped");
}

async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| {
        let id = uuid::Uuid::new_v4();
        status_client(socket, state).instrument(spans::status_client(&id))
    })
}

async fn status_client(mut socket: WebSocket, state: AppState) {
    info!("Status client connected");
    let mut feed = state.feed.subscribe();
    let mut shutdown = state.shutdown.clone();

    if let Some(json) = status_json(&state.bot)
        && socket.send(Message::Text(json)).await.is_err()
    {
        return;
    }

    loop {
        tokio::select! {
            update = feed.recv() => match update {
                Ok(json) => {
                    if socket.send(Message::Text(json)).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!(skipped, "Status client lagging");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Close(_))) | None => break,
                Some(Err(e)) => {
                    debug!(error = %e, "Status client read failed");
                    break;
                }
                Some(Ok(_)) => {}
            },
            _ = wait_for_shutdown(&mut shutdown) => {
                let _ = socket.send(Message::Close(None)).await;
                break;
            }
        }
    }
    info!("Status client disconnected");
}

async fn static_file(State(state): State<AppState>, uri: Uri) -> Response {
    let Some(path) = resolve(&state.static_dir, uri.path()) else {
        warn!(path = uri.path(), "Rejected static path");
        return not_found();
    };

    match tokio::fs::read(&path).await {
        Ok(body) => ([(header::CONTENT_TYPE, content_type(&path))], body).into_response(),
        Err(e) => {
            debug!(path = %path.display(), error = %e, "Static file not found");
            not_found()
        }
    }
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "404 Not Found").into_response()
}

/// Map a request path into `root`. Anything but plain file-name components
/// is rejected.
fn resolve(root: &Path, request: &str) -> Option<PathBuf> {
    let relative = request.trim_start_matches('/');
    let relative = if relative.is_empty() {
        "index.html"
    } else {
        relative
    };

    let relative = Path::new(relative);
    if !relative
        .components()
        .all(|c| matches!(c, Component::Normal(_)))
    {
        return None;
    }
    Some(root.join(relative))
}

fn content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("html") => "text/html",
        Some("js") => "text/javascript",
        Some("css") => "text/css",
        Some("ico") => "image/x-icon",
        Some("svg") => "image/svg+xml",
        _ => "text/plain",
    }
}
