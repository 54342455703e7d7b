//! WebSocket server for live trivia sessions.
//!
//! Wires the session engine to the outside world:
//!
//! | Module | Purpose |
//! |--------|---------|
//! | `config` | Bind address and tunables |
//! | `connection` | Per-client send handle with drop accounting |
//! | `transport` | Channel-subscription fan-out behind the engine's transport seam |
//! | `ws` | WebSocket upgrade, read/write loops, event dispatch |
//! | `server` | Axum router, `/health`, listener lifecycle |
//! | `shutdown` | Graceful shutdown token |

#![deny(unsafe_code)]

pub mod config;
pub mod connection;
pub mod health;
pub mod server;
pub mod shutdown;
pub mod transport;
pub mod ws;
