//! In-memory presence registry: connection id -> (username, room).
//!
//! The registry is the single piece of shared mutable state in the relay.
//! All mutation goes through the internal mutex so the uniqueness check and
//! insert run as one critical section.

use std::fmt;
use std::sync::Mutex;

use serde::Serialize;
use uuid::Uuid;

use crate::chat::error::ChatError;

/// Opaque per-connection identifier, assigned by the transport layer before
/// any chat event fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A live room membership. Owned exclusively by the registry; callers
/// receive clones. Username and room are stored in normalized form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: ConnectionId,
    pub username: String,
    pub room: String,
}

/// One entry in a roomData snapshot. Serialized directly to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoomUser {
    pub username: String,
}

/// Membership snapshot for one room. Never stored — recomputed from the
/// registry on every membership-changing event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoomSnapshot {
    pub room: String,
    pub users: Vec<RoomUser>,
}

/// Normalization applied everywhere a name is compared or displayed:
/// trim surrounding whitespace, then case-fold. Only the normalized form
/// exists downstream of a successful join.
fn normalize(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// The presence registry. Backing store is an insertion-ordered Vec, which
/// is the order roomData listings are rendered in by clients.
pub struct PresenceRegistry {
    users: Mutex<Vec<User>>,
}

impl Default for PresenceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl PresenceRegistry {
    pub fn new() -> Self {
        Self {
            users: Mutex::new(Vec::new()),
        }
    }

    /// Insert a membership for `id`.
    ///
    /// Fails without touching the registry if either name normalizes to
    /// empty, the connection already has a membership, or the (room,
    /// username) pair is taken by another live user.
    pub fn add_user(
        &self,
        id: ConnectionId,
        raw_username: &str,
        raw_room: &str,
    ) -> Result<User, ChatError> {
        let username = normalize(raw_username);
        let room = normalize(raw_room);

        if username.is_empty() || room.is_empty() {
            return Err(ChatError::Validation);
        }

        let mut users = self.users.lock().expect("presence registry lock");

        if users.iter().any(|user| user.id == id) {
            return Err(ChatError::AlreadyJoined);
        }

        if users
            .iter()
            .any(|user| user.room == room && user.username == username)
        {
            return Err(ChatError::NameConflict);
        }

        let user = User { id, username, room };
        users.push(user.clone());
        Ok(user)
    }

    /// Remove and return the membership for `id`. Unknown ids are a silent
    /// no-op, which keeps re-reported disconnects idempotent.
    pub fn remove_user(&self, id: ConnectionId) -> Option<User> {
        let mut users = self.users.lock().expect("presence registry lock");
        let index = users.iter().position(|user| user.id == id)?;
        Some(users.remove(index))
    }

    /// Pure lookup, no mutation.
    pub fn get_user(&self, id: ConnectionId) -> Option<User> {
        let users = self.users.lock().expect("presence registry lock");
        users.iter().find(|user| user.id == id).cloned()
    }

    /// All live users whose room matches `raw_room` after normalization,
    /// in join order.
    pub fn users_in_room(&self, raw_room: &str) -> Vec<User> {
        let room = normalize(raw_room);
        let users = self.users.lock().expect("presence registry lock");
        users
            .iter()
            .filter(|user| user.room == room)
            .cloned()
            .collect()
    }

    /// Derived snapshot of one room's membership.
    pub fn room_snapshot(&self, raw_room: &str) -> RoomSnapshot {
        RoomSnapshot {
            room: normalize(raw_room),
            users: self
                .users_in_room(raw_room)
                .into_iter()
                .map(|user| RoomUser {
                    username: user.username,
                })
                .collect(),
        }
    }

    /// Number of live memberships across all rooms.
    pub fn len(&self) -> usize {
        self.users.lock().expect("presence registry lock").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn add_user_normalizes_and_returns_the_stored_form() {
        let registry = PresenceRegistry::new();
        let id = ConnectionId::generate();

        let user = registry.add_user(id, "  Alice ", " The Den ").unwrap();
        assert_eq!(user.username, "alice");
        assert_eq!(user.room, "the den");
        assert_eq!(registry.get_user(id), Some(user));
    }

    #[test]
    fn add_user_rejects_empty_names() {
        let registry = PresenceRegistry::new();

        let err = registry
            .add_user(ConnectionId::generate(), "   ", "den")
            .unwrap_err();
        assert_eq!(err, ChatError::Validation);

        let err = registry
            .add_user(ConnectionId::generate(), "alice", "")
            .unwrap_err();
        assert_eq!(err, ChatError::Validation);

        assert!(registry.is_empty());
    }

    #[test]
    fn duplicate_name_in_room_is_rejected_and_registry_is_unchanged() {
        let registry = PresenceRegistry::new();
        registry
            .add_user(ConnectionId::generate(), "Alice", "Den")
            .unwrap();

        let err = registry
            .add_user(ConnectionId::generate(), "alice", " den ")
            .unwrap_err();
        assert_eq!(err, ChatError::NameConflict);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn same_name_in_different_rooms_is_allowed() {
        let registry = PresenceRegistry::new();
        registry
            .add_user(ConnectionId::generate(), "alice", "den")
            .unwrap();
        registry
            .add_user(ConnectionId::generate(), "alice", "lobby")
            .unwrap();
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn second_join_for_the_same_connection_is_rejected() {
        let registry = PresenceRegistry::new();
        let id = ConnectionId::generate();
        registry.add_user(id, "alice", "den").unwrap();

        let err = registry.add_user(id, "alice2", "lobby").unwrap_err();
        assert_eq!(err, ChatError::AlreadyJoined);

        // The original membership is intact.
        assert_eq!(registry.get_user(id).unwrap().username, "alice");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn remove_user_is_idempotent() {
        let registry = PresenceRegistry::new();
        let id = ConnectionId::generate();
        registry.add_user(id, "alice", "den").unwrap();

        let removed = registry.remove_user(id).unwrap();
        assert_eq!(removed.username, "alice");
        assert_eq!(registry.remove_user(id), None);
        assert_eq!(registry.get_user(id), None);
    }

    #[test]
    fn users_in_room_normalizes_the_query_and_keeps_join_order() {
        let registry = PresenceRegistry::new();
        registry
            .add_user(ConnectionId::generate(), "carol", "den")
            .unwrap();
        registry
            .add_user(ConnectionId::generate(), "alice", "den")
            .unwrap();
        registry
            .add_user(ConnectionId::generate(), "bob", "lobby")
            .unwrap();

        let names: Vec<String> = registry
            .users_in_room("  DEN ")
            .into_iter()
            .map(|user| user.username)
            .collect();
        assert_eq!(names, vec!["carol", "alice"]);

        assert!(registry.users_in_room("attic").is_empty());
    }

    #[test]
    fn room_snapshot_reflects_current_membership() {
        let registry = PresenceRegistry::new();
        let a = ConnectionId::generate();
        registry.add_user(a, "a", "x").unwrap();
        registry.add_user(ConnectionId::generate(), "b", "x").unwrap();

        registry.remove_user(a);

        let snapshot = registry.room_snapshot("X");
        assert_eq!(snapshot.room, "x");
        assert_eq!(
            snapshot.users,
            vec![RoomUser {
                username: "b".to_string()
            }]
        );
    }

    #[test]
    fn concurrent_joins_with_colliding_names_admit_exactly_one() {
        let registry = Arc::new(PresenceRegistry::new());

        let handles: Vec<_> = (0..32)
            .map(|_| {
                let registry = registry.clone();
                std::thread::spawn(move || {
                    registry
                        .add_user(ConnectionId::generate(), "Alice", "Den")
                        .is_ok()
                })
            })
            .collect();

        let successes = handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .filter(|&ok| ok)
            .count();

        assert_eq!(successes, 1);
        assert_eq!(registry.len(), 1);
    }
}
