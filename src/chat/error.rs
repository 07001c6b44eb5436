use thiserror::Error;

/// Per-request recoverable errors, reported back to the requester as the
/// ack error string. None of these are fatal to the process and none leave
/// partial state behind.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ChatError {
    /// Username or room normalized to empty on join.
    #[error("Username and room are required!")]
    Validation,

    /// Another live user already holds this name in the room.
    #[error("Username is in use!")]
    NameConflict,

    /// The connection already has a live room membership.
    #[error("Already in a room!")]
    AlreadyJoined,

    /// Message rejected by the profanity filter.
    #[error("Profanity is not allowed!")]
    Profanity,

    /// sendMessage/sendLocation from a connection that never joined.
    #[error("You must join a room first!")]
    NotJoined,
}
