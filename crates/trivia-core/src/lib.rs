//! # trivia-core
//!
//! Foundation types for the trivia session orchestrator.
//!
//! This crate provides the shared vocabulary the engine and server crates
//! depend on:
//!
//! - **Branded IDs**: [`ids::GameCode`], [`ids::ConnectionId`], [`ids::PlayerName`]
//! - **Wire events**: [`events::ClientEvent`] (connection → orchestrator) and
//!   [`events::ServerEvent`] (orchestrator → connections), a closed tagged set
//! - **Scoring**: [`scoring::score`], the pure time-decay point function
//! - **Errors**: [`errors::TriviaError`] hierarchy via `thiserror`
//! - **Constants**: question/grace/leaderboard windows in [`constants`]
//!
//! ## Crate Position
//!
//! Foundation crate. Depended on by `trivia-engine` and `trivia-server`.

#![deny(unsafe_code)]

pub mod constants;
pub mod errors;
pub mod events;
pub mod ids;
pub mod scoring;
