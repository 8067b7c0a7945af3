use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::IntoResponse,
};
use futures::{sink::SinkExt, stream::StreamExt};
use serde::Deserialize;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    token: Option<String>,
}

/// WebSocket upgrade handler. The token identifies the account whose
/// private event channel this session subscribes to.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<WsQuery>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let token: Option<Uuid> = params.token.as_deref().and_then(|raw| raw.parse().ok());
    let Some(token) = token else {
        tracing::warn!("WebSocket connection rejected: missing or malformed token");
        return axum::http::StatusCode::UNAUTHORIZED.into_response();
    };

    let account = match state.store.find_by_token(token).await {
        Ok(Some(account)) => account,
        Ok(None) => {
            tracing::warn!("WebSocket connection rejected: unknown token");
            return axum::http::StatusCode::UNAUTHORIZED.into_response();
        }
        Err(err) => {
            tracing::error!("WebSocket auth lookup failed: {}", err);
            return axum::http::StatusCode::SERVICE_UNAVAILABLE.into_response();
        }
    };

    ws.on_upgrade(move |socket| handle_socket(socket, state, account.id))
}

async fn handle_socket(socket: WebSocket, state: AppState, account_id: Uuid) {
    let (mut sender, mut receiver) = socket.split();

    let mut rx = state.publisher.subscribe(account_id);

    // Drain the client side; inbound frames carry nothing we act on,
    // we only need to notice the close.
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => {
                    tracing::debug!("ignoring inbound frame: {}", text);
                }
                Message::Close(_) => {
                    tracing::info!("client closed connection");
                    break;
                }
                _ => {}
            }
        }
    });

    // Push wallet events out as text frames, pinging every 30s in between.
    let mut send_task = tokio::spawn(async move {
        let mut heartbeat = tokio::time::interval(tokio::time::Duration::from_secs(30));

        loop {
            tokio::select! {
                _ = heartbeat.tick() => {
                    if sender.send(Message::Ping(vec![])).await.is_err() {
                        break;
                    }
                }
                result = rx.recv() => {
                    match result {
                        Ok(event) => {
                            let json = match serde_json::to_string(&event) {
                                Ok(json) => json,
                                Err(err) => {
                                    tracing::error!("event serialization failed: {}", err);
                                    continue;
                                }
                            };
                            if sender.send(Message::Text(json)).await.is_err() {
                                break;
                            }
                        }
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            // Anything skipped is still on the statement.
                            tracing::warn!(account = %account_id, skipped, "session lagged behind the event stream");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }
            }
        }
    });

    // Either half stopping ends the session.
    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    }

    tracing::info!(account = %account_id, "WebSocket session ended");
}
