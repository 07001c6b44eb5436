use axum::{
    extract::{
        ws::{WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};

use crate::chat::registry::ConnectionId;
use crate::state::AppState;
use crate::ws::actor;

/// GET /ws
/// WebSocket upgrade endpoint. There is no handshake auth: identity is
/// established in-band by the join request. A fresh connection id is
/// assigned here, before any chat event fires.
pub async fn ws_upgrade(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    let conn = ConnectionId::generate();
    tracing::info!(connection = %conn, "WebSocket connection accepted");
    ws.on_upgrade(move |socket| handle_connection(socket, state, conn))
}

/// Handle an upgraded WebSocket connection by spawning the actor.
async fn handle_connection(socket: WebSocket, state: AppState, conn: ConnectionId) {
    actor::run_connection(socket, state, conn).await;
}
