use std::sync::Arc;

use crate::chat::coordinator::Coordinator;
use crate::chat::filter::WordListFilter;
use crate::chat::registry::PresenceRegistry;
use crate::config::Config;
use crate::ws::{new_connection_registry, ConnectionRegistry};

/// Shared application state passed to all handlers via axum State extractor.
#[derive(Clone)]
pub struct AppState {
    /// Active WebSocket connections keyed by connection id
    pub connections: ConnectionRegistry,
    /// Room broadcast coordinator (owns the presence registry)
    pub coordinator: Arc<Coordinator>,
}

impl AppState {
    /// Build the state from config: one registry, one coordinator, and a
    /// profanity filter extended with config-provided words.
    pub fn new(config: &Config) -> Self {
        let chat_config = config.chat.clone().unwrap_or_default();
        let filter = WordListFilter::with_extra_words(&chat_config.banned_words);

        let registry = Arc::new(PresenceRegistry::new());
        let coordinator = Arc::new(Coordinator::new(registry, Box::new(filter)));

        Self {
            connections: new_connection_registry(),
            coordinator,
        }
    }
}
