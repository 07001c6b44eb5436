use axum::extract::ws::Message;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::chat::registry::ConnectionId;
use crate::state::AppState;
use crate::ws::broadcast::WsEventSink;

/// Inbound request frame: a request id echoed back on the ack, plus the
/// event payload flattened alongside it.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientEnvelope {
    #[serde(default)]
    pub request_id: String,
    #[serde(flatten)]
    pub event: ClientEvent,
}

/// Client-initiated chat events. Disconnects are transport-level (close
/// frame or stream end) and never arrive here.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientEvent {
    Join { username: String, room: String },
    SendMessage { text: String },
    SendLocation { latitude: f64, longitude: f64 },
}

/// Outbound reply frames. Every request gets exactly one ack; `error` is
/// absent on success.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
enum ResponseFrame {
    Ack {
        request_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
}

/// Handle one incoming text frame.
/// Decodes the envelope, dispatches to the coordinator, sends the ack.
pub fn handle_text_message(
    text: &str,
    tx: &mpsc::UnboundedSender<Message>,
    state: &AppState,
    conn: ConnectionId,
) {
    let envelope: ClientEnvelope = match serde_json::from_str(text) {
        Ok(envelope) => envelope,
        Err(e) => {
            tracing::warn!(
                connection = %conn,
                error = %e,
                "Failed to decode request frame"
            );
            send_ack(tx, "", Some("Invalid request!".to_string()));
            return;
        }
    };

    let sink = WsEventSink::new(
        state.connections.clone(),
        state.coordinator.registry().clone(),
    );

    let result = match envelope.event {
        ClientEvent::Join { username, room } => {
            state.coordinator.join(&sink, conn, &username, &room)
        }
        ClientEvent::SendMessage { text } => state.coordinator.send_message(&sink, conn, &text),
        ClientEvent::SendLocation {
            latitude,
            longitude,
        } => state
            .coordinator
            .send_location(&sink, conn, latitude, longitude),
    };

    send_ack(
        tx,
        &envelope.request_id,
        result.err().map(|e| e.to_string()),
    );
}

/// Send the ack frame for a request.
fn send_ack(tx: &mpsc::UnboundedSender<Message>, request_id: &str, error: Option<String>) {
    let frame = ResponseFrame::Ack {
        request_id: request_id.to_string(),
        error,
    };
    match serde_json::to_string(&frame) {
        Ok(json) => {
            let _ = tx.send(Message::Text(json.into()));
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode ack frame");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_frame_decodes() {
        let envelope: ClientEnvelope = serde_json::from_str(
            r#"{"requestId":"1","type":"join","username":"Alice","room":"Den"}"#,
        )
        .unwrap();

        assert_eq!(envelope.request_id, "1");
        match envelope.event {
            ClientEvent::Join { username, room } => {
                assert_eq!(username, "Alice");
                assert_eq!(room, "Den");
            }
            other => panic!("Expected join, got: {:?}", other),
        }
    }

    #[test]
    fn request_id_defaults_to_empty() {
        let envelope: ClientEnvelope =
            serde_json::from_str(r#"{"type":"sendMessage","text":"hi"}"#).unwrap();
        assert_eq!(envelope.request_id, "");
    }

    #[test]
    fn send_location_frame_decodes() {
        let envelope: ClientEnvelope = serde_json::from_str(
            r#"{"requestId":"3","type":"sendLocation","latitude":51.5,"longitude":-0.1}"#,
        )
        .unwrap();

        match envelope.event {
            ClientEvent::SendLocation {
                latitude,
                longitude,
            } => {
                assert_eq!(latitude, 51.5);
                assert_eq!(longitude, -0.1);
            }
            other => panic!("Expected sendLocation, got: {:?}", other),
        }
    }

    #[test]
    fn unknown_event_type_is_rejected() {
        let result: Result<ClientEnvelope, _> =
            serde_json::from_str(r#"{"requestId":"9","type":"shout","text":"HI"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn ack_serialization_omits_error_on_success() {
        let frame = ResponseFrame::Ack {
            request_id: "7".to_string(),
            error: None,
        };
        assert_eq!(
            serde_json::to_string(&frame).unwrap(),
            r#"{"type":"ack","requestId":"7"}"#
        );

        let frame = ResponseFrame::Ack {
            request_id: "8".to_string(),
            error: Some("Username is in use!".to_string()),
        };
        assert_eq!(
            serde_json::to_string(&frame).unwrap(),
            r#"{"type":"ack","requestId":"8","error":"Username is in use!"}"#
        );
    }
}
