//! Event fan-out to connected WebSocket clients.
//!
//! [`ConnectionTable`] is the production implementation of the engine's
//! transport seam. It keeps two maps: live connections by ID, and channel
//! subscriber sets by channel name. Publishing serializes the event once and
//! hands the same `Arc<String>` to every recipient's write task.
//!
//! All methods are synchronous and non-blocking: the engine publishes while
//! holding its registry lock, so a slow client costs a dropped message and a
//! counter bump, never a wait.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use metrics::counter;
use parking_lot::RwLock;
use tracing::{debug, warn};

use trivia_core::events::ServerEvent;
use trivia_core::ids::ConnectionId;
use trivia_engine::broadcast::{Channel, Transport};

use crate::connection::ClientConnection;

/// Maximum total lifetime message drops before forcibly evicting a slow client.
const MAX_TOTAL_DROPS: u64 = 100;

/// Connected clients and their channel subscriptions.
#[derive(Default)]
pub struct ConnectionTable {
    /// Connected clients indexed by connection ID.
    connections: RwLock<HashMap<ConnectionId, Arc<ClientConnection>>>,
    /// Subscriber sets indexed by channel name.
    channels: RwLock<HashMap<String, HashSet<ConnectionId>>>,
    /// Atomic counter tracking total connections (avoids locking for count queries).
    active_count: AtomicUsize,
}

impl ConnectionTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a connection.
    pub fn add(&self, connection: Arc<ClientConnection>) {
        let mut conns = self.connections.write();
        if conns.insert(connection.id.clone(), connection).is_none() {
            let _ = self.active_count.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Remove a connection and every subscription it holds.
    pub fn remove(&self, connection_id: &ConnectionId) {
        {
            let mut conns = self.connections.write();
            if conns.remove(connection_id).is_some() {
                let _ = self.active_count.fetch_sub(1, Ordering::Relaxed);
            }
        }
        let mut channels = self.channels.write();
        channels.retain(|_, subscribers| {
            let _ = subscribers.remove(connection_id);
            !subscribers.is_empty()
        });
    }

    /// Number of active connections.
    pub fn connection_count(&self) -> usize {
        self.active_count.load(Ordering::Relaxed)
    }

    /// Number of subscribers on a channel.
    pub fn subscriber_count(&self, channel: &Channel) -> usize {
        self.channels
            .read()
            .get(&channel.name())
            .map_or(0, HashSet::len)
    }

    fn serialize(event: &ServerEvent) -> Option<Arc<String>> {
        match serde_json::to_string(event) {
            Ok(json) => Some(Arc::new(json)),
            Err(e) => {
                warn!(event_type = event.event_type(), error = %e, "failed to serialize event");
                None
            }
        }
    }

    /// Send to one connection, tracking drops. Returns the ID when the
    /// client has exceeded its lifetime drop budget.
    fn send_tracked(
        conn: &ClientConnection,
        json: Arc<String>,
        label: &str,
    ) -> Option<ConnectionId> {
        if conn.send(json) {
            return None;
        }
        counter!("ws_broadcast_drops_total").increment(1);
        let drops = conn.drop_count();
        if drops >= MAX_TOTAL_DROPS {
            warn!(conn_id = %conn.id, label, drops, "disconnecting slow client");
            Some(conn.id.clone())
        } else {
            warn!(conn_id = %conn.id, label, total_drops = drops, "failed to send event to client (channel full)");
            None
        }
    }
}

impl Transport for ConnectionTable {
    fn publish(&self, channel: &Channel, event: &ServerEvent) {
        let Some(json) = Self::serialize(event) else {
            return;
        };
        let name = channel.name();
        let mut to_evict = Vec::new();
        {
            let channels = self.channels.read();
            let Some(subscribers) = channels.get(&name) else {
                return;
            };
            let conns = self.connections.read();
            let mut recipients = 0u32;
            for id in subscribers {
                if let Some(conn) = conns.get(id) {
                    recipients += 1;
                    if let Some(slow) = Self::send_tracked(conn, Arc::clone(&json), &name) {
                        to_evict.push(slow);
                    }
                }
            }
            debug!(
                event_type = event.event_type(),
                channel = %name,
                recipients,
                "broadcast event"
            );
        }
        for id in &to_evict {
            self.remove(id);
        }
    }

    fn send(&self, connection: &ConnectionId, event: &ServerEvent) {
        let Some(json) = Self::serialize(event) else {
            return;
        };
        let slow = {
            let conns = self.connections.read();
            conns
                .get(connection)
                .and_then(|conn| Self::send_tracked(conn, json, "direct"))
        };
        if let Some(id) = slow {
            self.remove(&id);
        }
    }

    fn subscribe(&self, connection: &ConnectionId, channel: &Channel) {
        let mut channels = self.channels.write();
        let _ = channels
            .entry(channel.name())
            .or_default()
            .insert(connection.clone());
    }

    fn unsubscribe(&self, connection: &ConnectionId, channel: &Channel) {
        let mut channels = self.channels.write();
        if let Some(subscribers) = channels.get_mut(&channel.name()) {
            let _ = subscribers.remove(connection);
            if subscribers.is_empty() {
                let _ = channels.remove(&channel.name());
            }
        }
    }
}
