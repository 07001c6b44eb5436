//! Message value objects, constructed fresh per event and never stored.

use chrono::Utc;
use serde::Serialize;

/// Reserved author name for system messages (welcome, join/leave notices).
pub const ADMIN_USERNAME: &str = "Admin";

/// A chat message stamped with its creation time (ms since epoch).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub username: String,
    pub text: String,
    pub created_at: i64,
}

impl Message {
    pub fn new(username: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            text: text.into(),
            created_at: Utc::now().timestamp_millis(),
        }
    }
}

/// A shared-location message carrying a pre-formatted maps URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationMessage {
    pub username: String,
    pub url: String,
    pub created_at: i64,
}

impl LocationMessage {
    pub fn new(username: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            url: url.into(),
            created_at: Utc::now().timestamp_millis(),
        }
    }
}

/// Format the maps URL shared for a raw coordinate pair.
pub fn location_url(latitude: f64, longitude: f64) -> String {
    format!("https://google.com/maps?q={latitude},{longitude}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_is_stamped_with_epoch_millis() {
        let before = Utc::now().timestamp_millis();
        let message = Message::new("alice", "hello");
        let after = Utc::now().timestamp_millis();

        assert_eq!(message.username, "alice");
        assert_eq!(message.text, "hello");
        assert!(message.created_at >= before && message.created_at <= after);
    }

    #[test]
    fn location_message_carries_the_url() {
        let message = LocationMessage::new("bob", "https://google.com/maps?q=0,0");
        assert_eq!(message.username, "bob");
        assert_eq!(message.url, "https://google.com/maps?q=0,0");
    }

    #[test]
    fn location_url_format() {
        assert_eq!(
            location_url(51.5, -0.1),
            "https://google.com/maps?q=51.5,-0.1"
        );
    }
}
