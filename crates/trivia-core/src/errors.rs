//! Error taxonomy for the orchestrator.
//!
//! Only [`TriviaError::GameNotFound`] and [`TriviaError::DuplicateName`] are
//! surfaced to the requesting connection as `error` events. The rest are
//! silent no-ops: a non-host pressing a host button, or a timer firing after
//! cancellation, are expected races with stale client UI and must not
//! produce user-visible errors.

use thiserror::Error;

/// Errors raised by session operations.
#[derive(Debug, Error)]
pub enum TriviaError {
    /// No live session has this code.
    #[error("Game not found")]
    GameNotFound(String),

    /// The display name is already attached to a live connection in this game.
    #[error("Name '{0}' is already taken in this game")]
    DuplicateName(String),

    /// A reconnect named a player the session no longer has.
    #[error("Player '{0}' not found in this game")]
    PlayerNotFound(String),

    /// A host-only action arrived from a connection that is not the host,
    /// or an action referenced an identity the session no longer knows.
    #[error("not authorized for this action")]
    Unauthorized,

    /// The event refers to a question index or timer that has already closed.
    #[error("stale event")]
    Stale,
}

impl TriviaError {
    /// Whether this error is swallowed rather than surfaced to the client.
    pub fn is_silent(&self) -> bool {
        matches!(self, Self::Unauthorized | Self::Stale)
    }
}
