//! The broadcast seam between the engine and the transport.
//!
//! Each session owns three logical channels:
//!
//! | Channel | Subscribers |
//! |---------|-------------|
//! | `participants:<code>` | host + players |
//! | `host:<code>` | host only |
//! | `monitors:<code>` | read-only spectators |
//!
//! The engine never routes ad hoc — every outbound event goes through
//! [`Broadcaster`], which names the channel and hands the event to the
//! [`Transport`] implementation (the WebSocket server in production, a
//! recording fake in tests).

use std::sync::Arc;

use trivia_core::events::ServerEvent;
use trivia_core::ids::{ConnectionId, GameCode};

/// One of a session's three logical channels.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Host + players.
    Participants(GameCode),
    /// Host only.
    Host(GameCode),
    /// Read-only spectators.
    Monitors(GameCode),
}

impl Channel {
    /// The channel's wire name.
    pub fn name(&self) -> String {
        match self {
            Self::Participants(code) => format!("participants:{code}"),
            Self::Host(code) => format!("host:{code}"),
            Self::Monitors(code) => format!("monitors:{code}"),
        }
    }
}

/// The publish/subscribe primitive the orchestrator fans out through.
///
/// Implementations must be non-blocking: the engine publishes while holding
/// its registry lock, so sends buffer or drop, never wait.
pub trait Transport: Send + Sync + 'static {
    /// Deliver an event to every connection subscribed to `channel`.
    fn publish(&self, channel: &Channel, event: &ServerEvent);

    /// Deliver an event to a single connection.
    fn send(&self, connection: &ConnectionId, event: &ServerEvent);

    /// Add a connection to a channel's subscriber set.
    fn subscribe(&self, connection: &ConnectionId, channel: &Channel);

    /// Remove a connection from a channel's subscriber set.
    fn unsubscribe(&self, connection: &ConnectionId, channel: &Channel);
}

/// Session-aware wrapper over the transport.
#[derive(Clone)]
pub struct Broadcaster {
    transport: Arc<dyn Transport>,
}

impl Broadcaster {
    /// Wrap a transport.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Notify host + players.
    pub fn participants(&self, code: &GameCode, event: &ServerEvent) {
        self.transport
            .publish(&Channel::Participants(code.clone()), event);
    }

    /// Notify the host only.
    pub fn host(&self, code: &GameCode, event: &ServerEvent) {
        self.transport.publish(&Channel::Host(code.clone()), event);
    }

    /// Notify monitors.
    pub fn monitors(&self, code: &GameCode, event: &ServerEvent) {
        self.transport
            .publish(&Channel::Monitors(code.clone()), event);
    }

    /// Direct reply to one connection.
    pub fn reply(&self, connection: &ConnectionId, event: &ServerEvent) {
        self.transport.send(connection, event);
    }

    /// Surface an error to one connection.
    pub fn error(&self, connection: &ConnectionId, message: &str) {
        self.transport.send(
            connection,
            &ServerEvent::Error {
                message: message.to_string(),
            },
        );
    }

    /// Subscribe a connection as the session's host (participant + host channels).
    pub fn subscribe_host(&self, connection: &ConnectionId, code: &GameCode) {
        self.transport
            .subscribe(connection, &Channel::Participants(code.clone()));
        self.transport
            .subscribe(connection, &Channel::Host(code.clone()));
    }

    /// Subscribe a connection as a player.
    pub fn subscribe_player(&self, connection: &ConnectionId, code: &GameCode) {
        self.transport
            .subscribe(connection, &Channel::Participants(code.clone()));
    }

    /// Subscribe a connection as a monitor.
    pub fn subscribe_monitor(&self, connection: &ConnectionId, code: &GameCode) {
        self.transport
            .subscribe(connection, &Channel::Monitors(code.clone()));
    }
}
