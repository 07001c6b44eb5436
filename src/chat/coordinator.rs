//! Room broadcast coordinator: the event sequence and audience for join,
//! message-send, location-share, and disconnect.

use std::sync::Arc;

use serde::Serialize;

use crate::chat::error::ChatError;
use crate::chat::filter::ProfanityFilter;
use crate::chat::message::{location_url, LocationMessage, Message, ADMIN_USERNAME};
use crate::chat::registry::{ConnectionId, PresenceRegistry, RoomSnapshot};

/// Recipients of a single published event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Audience {
    /// The originating connection only.
    Sender(ConnectionId),
    /// Every live member of the room except the originating connection.
    RoomExcludingSender { room: String, sender: ConnectionId },
    /// Every live member of the room, sender included.
    Room { room: String },
}

/// Events fanned out to room members. Serialized as tagged JSON frames.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RoomEvent {
    Message(Message),
    LocationMessage(LocationMessage),
    RoomData(RoomSnapshot),
}

/// Transport seam. The coordinator publishes room events through this and
/// never touches sockets directly; deliveries are fire-and-forget.
pub trait EventSink {
    fn publish(&self, audience: Audience, event: &RoomEvent);
}

/// Orchestrates the relay protocol over the presence registry and the
/// message factory. The registry lock is never held across a publish or a
/// filter call.
pub struct Coordinator {
    registry: Arc<PresenceRegistry>,
    filter: Box<dyn ProfanityFilter>,
}

impl Coordinator {
    pub fn new(registry: Arc<PresenceRegistry>, filter: Box<dyn ProfanityFilter>) -> Self {
        Self { registry, filter }
    }

    pub fn registry(&self) -> &Arc<PresenceRegistry> {
        &self.registry
    }

    /// Join `conn` to a room under a display name.
    ///
    /// On success the welcome, the join announcement, and the refreshed
    /// snapshot go out in that order. On failure nothing is published and
    /// the registry is unchanged.
    pub fn join(
        &self,
        sink: &dyn EventSink,
        conn: ConnectionId,
        username: &str,
        room: &str,
    ) -> Result<(), ChatError> {
        let user = self.registry.add_user(conn, username, room)?;

        tracing::info!(
            connection = %conn,
            username = %user.username,
            room = %user.room,
            "User joined room"
        );

        sink.publish(
            Audience::Sender(conn),
            &RoomEvent::Message(Message::new(ADMIN_USERNAME, "Welcome!")),
        );
        sink.publish(
            Audience::RoomExcludingSender {
                room: user.room.clone(),
                sender: conn,
            },
            &RoomEvent::Message(Message::new(
                ADMIN_USERNAME,
                format!("{} has joined!", user.username),
            )),
        );
        sink.publish(
            Audience::Room {
                room: user.room.clone(),
            },
            &RoomEvent::RoomData(self.registry.room_snapshot(&user.room)),
        );

        Ok(())
    }

    /// Relay a text message to the sender's whole room.
    pub fn send_message(
        &self,
        sink: &dyn EventSink,
        conn: ConnectionId,
        text: &str,
    ) -> Result<(), ChatError> {
        let user = self.registry.get_user(conn).ok_or(ChatError::NotJoined)?;

        if self.filter.is_profane(text) {
            return Err(ChatError::Profanity);
        }

        sink.publish(
            Audience::Room { room: user.room },
            &RoomEvent::Message(Message::new(user.username, text)),
        );

        Ok(())
    }

    /// Relay a shared location to the sender's whole room.
    pub fn send_location(
        &self,
        sink: &dyn EventSink,
        conn: ConnectionId,
        latitude: f64,
        longitude: f64,
    ) -> Result<(), ChatError> {
        let user = self.registry.get_user(conn).ok_or(ChatError::NotJoined)?;

        sink.publish(
            Audience::Room { room: user.room },
            &RoomEvent::LocationMessage(LocationMessage::new(
                user.username,
                location_url(latitude, longitude),
            )),
        );

        Ok(())
    }

    /// Transport-reported disconnect. Idempotent: connections that never
    /// joined (or were already removed) are a silent no-op.
    pub fn disconnect(&self, sink: &dyn EventSink, conn: ConnectionId) {
        let Some(user) = self.registry.remove_user(conn) else {
            return;
        };

        tracing::info!(
            connection = %conn,
            username = %user.username,
            room = %user.room,
            "User left room"
        );

        // The user is already out of the registry, so both publishes below
        // resolve to the remaining members only.
        sink.publish(
            Audience::Room {
                room: user.room.clone(),
            },
            &RoomEvent::Message(Message::new(
                ADMIN_USERNAME,
                format!("{} has left!", user.username),
            )),
        );
        sink.publish(
            Audience::Room {
                room: user.room.clone(),
            },
            &RoomEvent::RoomData(self.registry.room_snapshot(&user.room)),
        );
    }
}
