//! Branded identifier newtypes.
//!
//! Three distinct identities flow through the orchestrator and must never be
//! confused with one another:
//!
//! - [`GameCode`]: the short code players type to find a game. Stable for the
//!   session's lifetime.
//! - [`ConnectionId`]: one live transport connection. Ephemeral — a reconnect
//!   produces a fresh one, and the session rebinds to it.
//! - [`PlayerName`]: the display name a player joined under. The stable
//!   business key for roster membership; uniqueness is case-insensitive.

use serde::{Deserialize, Serialize};

/// Short opaque code identifying a live game session.
///
/// Generated as uppercase alphanumerics; inbound codes are normalized to
/// uppercase before lookup so players can type them in any case.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameCode(String);

const CODE_CHARSET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

impl GameCode {
    /// Generate a fresh random code of [`crate::constants::GAME_CODE_LEN`] characters.
    ///
    /// Uniqueness against live sessions is the registry's job; this is just
    /// the raw draw.
    pub fn generate() -> Self {
        use rand::Rng;
        let mut rng = rand::rng();
        let code: String = (0..crate::constants::GAME_CODE_LEN)
            .map(|_| CODE_CHARSET[rng.random_range(0..CODE_CHARSET.len())] as char)
            .collect();
        Self(code)
    }

    /// Normalize an inbound code: trimmed and uppercased.
    pub fn normalize(raw: &str) -> Self {
        Self(raw.trim().to_uppercase())
    }

    /// The code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for GameCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One live transport connection.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(String);

impl ConnectionId {
    /// Allocate a fresh connection ID (UUID v7, time-ordered).
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7().to_string())
    }

    /// The ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<String> for ConnectionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A player's display name.
///
/// Preserves the form the player typed for display, but compares and keys
/// case-insensitively: "Ana" and "ana" are the same roster slot.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerName(String);

impl PlayerName {
    /// Wrap a raw display name, trimming surrounding whitespace.
    pub fn new(raw: &str) -> Self {
        Self(raw.trim().to_string())
    }

    /// The display form.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-folded key used for uniqueness and reconnect matching.
    pub fn key(&self) -> String {
        self.0.to_lowercase()
    }

    /// Case-insensitive name match.
    pub fn matches(&self, other: &PlayerName) -> bool {
        self.key() == other.key()
    }
}

impl PartialEq for PlayerName {
    fn eq(&self, other: &Self) -> bool {
        self.matches(other)
    }
}

impl Eq for PlayerName {}

impl std::fmt::Display for PlayerName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
