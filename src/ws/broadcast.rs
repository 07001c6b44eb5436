//! EventSink implementation over live WebSocket connections.

use std::sync::Arc;

use axum::extract::ws::Message;

use crate::chat::coordinator::{Audience, EventSink, RoomEvent};
use crate::chat::registry::{ConnectionId, PresenceRegistry};
use crate::ws::ConnectionRegistry;

/// Publishes room events to WebSocket clients. Room membership is resolved
/// against the presence registry at publish time, so events emitted after a
/// removal reach only the remaining members. Sends are fire-and-forget.
#[derive(Clone)]
pub struct WsEventSink {
    connections: ConnectionRegistry,
    registry: Arc<PresenceRegistry>,
}

impl WsEventSink {
    pub fn new(connections: ConnectionRegistry, registry: Arc<PresenceRegistry>) -> Self {
        Self {
            connections,
            registry,
        }
    }

    fn send_to(&self, conn: ConnectionId, frame: &str) {
        if let Some(sender) = self.connections.get(&conn) {
            let _ = sender.send(Message::Text(frame.to_owned().into()));
        }
    }
}

impl EventSink for WsEventSink {
    fn publish(&self, audience: Audience, event: &RoomEvent) {
        let frame = match serde_json::to_string(event) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::error!(error = %e, "Failed to encode room event");
                return;
            }
        };

        match audience {
            Audience::Sender(conn) => self.send_to(conn, &frame),
            Audience::RoomExcludingSender { room, sender } => {
                for user in self.registry.users_in_room(&room) {
                    if user.id != sender {
                        self.send_to(user.id, &frame);
                    }
                }
            }
            Audience::Room { room } => {
                for user in self.registry.users_in_room(&room) {
                    self.send_to(user.id, &frame);
                }
            }
        }
    }
}
