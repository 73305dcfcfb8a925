//! Websocket server for subscriber connections
//!
//! The channel is server-to-client only: each connection receives the
//! published state as a greeting and then one JSON message per poll cycle.
//! Inbound frames are read only to detect disconnection. On process
//! shutdown every connection task closes its socket, so the graceful drain
//! actually completes instead of waiting on clients that never hang up.

mod hub;

pub use hub::{Hub, Subscription};

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::watch;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

/// Shared application state
#[derive(Clone)]
struct AppState {
    hub: Arc<Hub>,
    shutdown: watch::Receiver<bool>,
}

/// Build the subscriber router. Connection tasks close their sockets once
/// `shutdown` flips to true (or its sender goes away).
pub fn router(hub: Arc<Hub>, shutdown: watch::Receiver<bool>) -> Router {
    Router::new()
        .route("/", get(ws_handler))
        .with_state(AppState { hub, shutdown })
        .layer(TraceLayer::new_for_http())
}

/// Bind and serve until ctrl-c, then close all subscriber connections.
pub async fn serve(port: u16, hub: Arc<Hub>) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "subscriber server listening");

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    axum::serve(listener, router(hub, shutdown_rx))
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            // An upgraded websocket never finishes on its own; tell every
            // connection task to hang up so the drain can complete.
            let _ = shutdown_tx.send(true);
        })
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        warn!("could not install ctrl-c handler; running until killed");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received, closing subscriber connections");
}

/// Resolves once process shutdown is requested. A dropped sender counts
/// too: it only happens when the accept loop is already gone.
async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    let _ = shutdown.wait_for(|stopped| *stopped).await;
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| serve_subscriber(socket, state.hub, state.shutdown))
}

/// Per-connection task: greet, then forward published snapshots until the
/// subscriber goes away or the process shuts down.
async fn serve_subscriber(mut socket: WebSocket, hub: Arc<Hub>, mut shutdown: watch::Receiver<bool>) {
    let mut subscription = hub.subscribe().await;
    debug!(subscribers = hub.subscriber_count(), "subscriber connected");

    if send_snapshot(&mut socket, &subscription.greeting).await.is_err() {
        return;
    }

    loop {
        tokio::select! {
            update = subscription.updates.recv() => match update {
                Ok(snapshot) => {
                    if send_snapshot(&mut socket, &snapshot).await.is_err() {
                        break;
                    }
                }
                // A lagged receiver resynchronizes on the next publish.
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "subscriber lagged behind the fan-out");
                }
                Err(RecvError::Closed) => break,
            },
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                // No subscriber-to-server messages are interpreted.
                Some(Ok(_)) => {}
            },
            () = shutdown_requested(&mut shutdown) => {
                let _ = socket.send(Message::Close(None)).await;
                break;
            }
        }
    }

    drop(subscription);
    debug!(subscribers = hub.subscriber_count(), "subscriber disconnected");
}

async fn send_snapshot(
    socket: &mut WebSocket,
    snapshot: &crate::models::Snapshot,
) -> Result<(), ()> {
    let text = snapshot.to_json().map_err(|err| {
        warn!(error = %err, "could not serialize snapshot for a subscriber");
    })?;

    socket
        .send(Message::Text(text.into()))
        .await
        .map_err(|_| ())
}
