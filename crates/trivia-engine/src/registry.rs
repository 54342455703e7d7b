//! Live sessions keyed by game code.
//!
//! The registry is the only process-wide game state. The [`crate::engine::Engine`]
//! wraps it in a single mutex so every mutation runs to completion before the
//! next; the registry itself is plain data.

use std::collections::HashMap;

use metrics::gauge;
use tracing::info;

use trivia_core::ids::{ConnectionId, GameCode};

use crate::question::QuestionBank;
use crate::session::Session;

/// Creates, looks up, and destroys [`Session`]s.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: HashMap<GameCode, Session>,
}

impl SessionRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session with a fresh collision-checked code.
    pub fn create(
        &mut self,
        host: ConnectionId,
        bank: QuestionBank,
        question_secs: u64,
    ) -> &mut Session {
        let code = loop {
            let candidate = GameCode::generate();
            if !self.sessions.contains_key(&candidate) {
                break candidate;
            }
        };
        info!(code = %code, "game created");
        gauge!("games_active").set((self.sessions.len() + 1) as f64);
        let session = Session::new(code.clone(), host, bank, question_secs);
        self.sessions.entry(code).or_insert(session)
    }

    /// Look up a live session.
    pub fn get(&self, code: &GameCode) -> Option<&Session> {
        self.sessions.get(code)
    }

    /// Look up a live session mutably.
    pub fn get_mut(&mut self, code: &GameCode) -> Option<&mut Session> {
        self.sessions.get_mut(code)
    }

    /// Remove a session, cancelling its timers. Idempotent.
    pub fn destroy(&mut self, code: &GameCode) -> bool {
        let removed = match self.sessions.remove(code) {
            Some(mut session) => {
                session.cancel_timers();
                info!(code = %code, "game destroyed");
                true
            }
            None => false,
        };
        gauge!("games_active").set(self.sessions.len() as f64);
        removed
    }

    /// Iterate all live sessions mutably (disconnect scans).
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Session> {
        self.sessions.values_mut()
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether no sessions are live.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
