use crate::game_manager::AppState;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use futures::{sink::SinkExt, stream::StreamExt};
use serde::Deserialize;
use shared::ClientMessage;
use std::sync::Arc;
use tokio::sync::mpsc;

#[derive(Deserialize)]
pub struct ConnectParams {
    /// Authenticated caller id. Credential validation happens upstream;
    /// by the time the upgrade reaches us the id is trusted.
    user: Option<String>,
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<ConnectParams>,
    State(state): State<Arc<AppState>>,
) -> Response {
    let Some(user_id) = params.user.filter(|id| !id.trim().is_empty()) else {
        // Unauthenticated upgrades are rejected before any read loop starts.
        return StatusCode::UNAUTHORIZED.into_response();
    };
    ws.on_upgrade(move |socket| handle_socket(socket, state, user_id))
        .into_response()
}

/// Snapshot of currently online user ids, the polling fallback for
/// clients without a live socket.
pub async fn online_users(State(state): State<Arc<AppState>>) -> Json<Vec<String>> {
    Json(state.sessions.iter().map(|e| e.key().clone()).collect())
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, user_id: String) {
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    // Writer task: the only place this connection touches the socket for
    // sends, so registry locks are never held across socket I/O.
    let writer = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if sender.send(Message::Text(frame)).await.is_err() {
                break;
            }
        }
    });

    state.add_session(user_id.clone(), tx.clone()).await;

    while let Some(Ok(msg)) = receiver.next().await {
        if let Message::Text(text) = msg {
            if !state.check_rate_limit(&user_id) {
                tracing::debug!(player_id = %user_id, "Rate limit hit, dropping frame");
                continue;
            }
            match serde_json::from_str::<ClientMessage>(&text) {
                Ok(cmd) => state.dispatch(user_id.clone(), cmd).await,
                Err(e) => {
                    // Malformed frames are dropped; the connection stays open.
                    tracing::warn!(player_id = %user_id, error = %e, "Unroutable message");
                }
            }
        }
    }

    // Identify ourselves by our writer channel so a late close of this
    // socket cannot tear down a session a reconnect has since replaced.
    state.remove_session(&user_id, &tx).await;
    writer.abort();
}
