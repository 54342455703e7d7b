//! # trivia-engine
//!
//! The session orchestrator: everything between the transport boundary and
//! the wire-event vocabulary.
//!
//! - **[`session::Session`]**: per-game state machine (lobby → question →
//!   leaderboard → game over), roster, answer bookkeeping
//! - **[`registry::SessionRegistry`]**: live sessions keyed by game code
//! - **[`engine::Engine`]**: routes inbound events and timer firings through
//!   one lock, spawns question/advance/grace timers
//! - **[`broadcast`]**: the [`broadcast::Transport`] seam and per-session
//!   channel naming the engine fans out through
//! - **[`projection`]**: leaderboard and monitor read models
//!
//! ## Concurrency model
//!
//! Every mutation — inbound event or timer firing — runs to completion under
//! the registry lock, so no two mutations to a session ever interleave.
//! Timer tasks carry only a game code and an epoch number; they re-read live
//! state at fire time and stand down if the epoch moved on.

#![deny(unsafe_code)]

pub mod broadcast;
pub mod engine;
pub mod projection;
pub mod question;
pub mod registry;
pub mod session;
