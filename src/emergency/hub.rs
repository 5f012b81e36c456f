//! Realtime broadcast hub: the process-wide set of live client
//! connections and best-effort fan-out of state-change events.
//!
//! Every connected client receives every event; there is no per-
//! connection patient filtering. Delivery is best-effort: a failed send
//! never surfaces to the triggering caller, and the failing connection
//! is unregistered on the spot so stale senders cannot accumulate.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use tokio::sync::mpsc;

use super::events::BroadcastEvent;

/// Per-connection outbound buffer. `try_send` keeps fan-out non-blocking;
/// a client that falls this far behind is treated as disconnected.
pub const CONNECTION_BUFFER: usize = 64;

pub struct BroadcastHub {
    connections: Mutex<HashMap<u64, mpsc::Sender<String>>>,
    next_id: AtomicU64,
}

impl BroadcastHub {
    pub fn new() -> Self {
        Self {
            connections: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Track a connection after handshake acceptance. Returns the id to
    /// pass to `unregister` from the connection's own receive loop.
    pub fn register(&self, tx: mpsc::Sender<String>) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.lock().insert(id, tx);
        tracing::debug!(conn_id = id, "connection registered");
        id
    }

    pub fn unregister(&self, id: u64) {
        if self.lock().remove(&id).is_some() {
            tracing::debug!(conn_id = id, "connection unregistered");
        }
    }

    pub fn connection_count(&self) -> usize {
        self.lock().len()
    }

    /// Serialize `event` once and push it to every tracked connection.
    /// Returns the number of connections the payload was handed to.
    /// Zero connections is a silent success.
    pub fn broadcast(&self, event: &BroadcastEvent) -> usize {
        let payload = match serde_json::to_string(event) {
            Ok(p) => p,
            Err(e) => {
                tracing::error!(error = %e, "event serialization failed, dropping broadcast");
                return 0;
            }
        };

        let mut connections = self.lock();
        let mut dead = Vec::new();
        let mut delivered = 0;

        for (&id, tx) in connections.iter() {
            match tx.try_send(payload.clone()) {
                Ok(()) => delivered += 1,
                Err(_) => dead.push(id),
            }
        }

        // A failed send is an implicit disconnect
        for id in dead {
            connections.remove(&id);
            tracing::warn!(conn_id = id, "send failed, dropping connection");
        }

        delivered
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<u64, mpsc::Sender<String>>> {
        // A poisoned registry only means a panic mid-insert/remove;
        // the map itself stays usable.
        self.connections.lock().unwrap_or_else(|p| p.into_inner())
    }
}

impl Default for BroadcastHub {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emergency::events::PatientSnapshot;
    use crate::models::PatientStatusKind;
    use chrono::Utc;

    fn event() -> BroadcastEvent {
        BroadcastEvent::status_update(
            PatientStatusKind::Alert,
            PatientSnapshot {
                user_id: 1,
                user_name: "P".into(),
                user_phone: "1231231234".into(),
                blood_group: "O+".into(),
                address: None,
                health_issues: None,
                nominee_phone: None,
            },
            Utc::now(),
        )
    }

    #[test]
    fn broadcast_with_zero_connections_is_silent_success() {
        let hub = BroadcastHub::new();
        assert_eq!(hub.broadcast(&event()), 0);
    }

    #[tokio::test]
    async fn broadcast_reaches_every_connection() {
        let hub = BroadcastHub::new();
        let (tx1, mut rx1) = mpsc::channel(CONNECTION_BUFFER);
        let (tx2, mut rx2) = mpsc::channel(CONNECTION_BUFFER);
        hub.register(tx1);
        hub.register(tx2);

        assert_eq!(hub.broadcast(&event()), 2);

        let p1 = rx1.recv().await.unwrap();
        let p2 = rx2.recv().await.unwrap();
        assert_eq!(p1, p2, "payload is serialized once and shared");
        let json: serde_json::Value = serde_json::from_str(&p1).unwrap();
        assert_eq!(json["type"], "STATUS_UPDATE");
    }

    #[tokio::test]
    async fn failed_send_unregisters_only_that_connection() {
        let hub = BroadcastHub::new();
        let (dead_tx, dead_rx) = mpsc::channel(CONNECTION_BUFFER);
        let (live_tx, mut live_rx) = mpsc::channel(CONNECTION_BUFFER);
        hub.register(dead_tx);
        hub.register(live_tx);
        drop(dead_rx); // receiver gone → send fails

        assert_eq!(hub.broadcast(&event()), 1);
        assert!(live_rx.recv().await.is_some());
        assert_eq!(hub.connection_count(), 1, "dead connection was dropped");

        // Future registrations still work after a failure
        let (tx3, mut rx3) = mpsc::channel(CONNECTION_BUFFER);
        hub.register(tx3);
        assert_eq!(hub.broadcast(&event()), 2);
        assert!(rx3.recv().await.is_some());
    }

    #[tokio::test]
    async fn unregister_stops_delivery() {
        let hub = BroadcastHub::new();
        let (tx, mut rx) = mpsc::channel(CONNECTION_BUFFER);
        let id = hub.register(tx);
        hub.unregister(id);

        assert_eq!(hub.broadcast(&event()), 0);
        assert!(rx.recv().await.is_none(), "sender dropped on unregister");
    }
}
