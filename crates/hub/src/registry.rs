//! Live connection registry.
//!
//! The registry is one of the two pieces of shared mutable state in the
//! hub (the other is [`crate::History`]). Every per-connection task
//! registers itself on accept and deregisters on exit; broadcast iterates
//! a snapshot taken under the lock, so concurrent add/remove never
//! invalidates an in-flight fan-out.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::{Mutex, mpsc};
use tokio_tungstenite::tungstenite;
use tracing::{debug, warn};

use tradelink_protocol::Envelope;
use tradelink_protocol::constants::WS_SEND_TIMEOUT;

/// Identity of one live connection, assigned at accept time.
///
/// Broadcast exclusion is keyed on this, not on the envelope's `source`
/// field: a sender's own handle is skipped even before it has declared
/// any identity via handshake.
pub type ConnId = u64;

struct Peer {
    tx: mpsc::Sender<tungstenite::Message>,
    /// Advisory identity from the peer's last non-empty `source`.
    /// Never used for routing; all non-ack traffic is broadcast.
    source: Option<String>,
    remote_addr: String,
}

/// Set of live peer handles, keyed by connection id.
#[derive(Default)]
pub struct Registry {
    peers: Mutex<HashMap<ConnId, Peer>>,
    next_id: AtomicU64,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new connection and returns its id.
    pub async fn register(
        &self,
        tx: mpsc::Sender<tungstenite::Message>,
        remote_addr: String,
    ) -> ConnId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.peers.lock().await.insert(
            id,
            Peer {
                tx,
                source: None,
                remote_addr,
            },
        );
        id
    }

    /// Removes a connection. Idempotent: the read loop and a failed
    /// broadcast send may both try to remove the same handle.
    pub async fn remove(&self, id: ConnId) -> bool {
        self.peers.lock().await.remove(&id).is_some()
    }

    /// Records the advisory source identity for a connection.
    pub async fn set_source(&self, id: ConnId, source: &str) {
        if let Some(peer) = self.peers.lock().await.get_mut(&id) {
            peer.source = Some(source.to_string());
        }
    }

    /// Number of currently registered connections.
    pub async fn len(&self) -> usize {
        self.peers.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.peers.lock().await.is_empty()
    }

    /// Fans an envelope out to every registered handle except `exclude`.
    ///
    /// Failures are isolated per recipient: a handle whose send fails or
    /// times out is removed and delivery continues to the rest. Returns
    /// the number of peers the message was handed to.
    pub async fn broadcast(&self, envelope: Envelope, exclude: ConnId) -> usize {
        let json = match envelope.encode() {
            Ok(j) => j,
            Err(e) => {
                warn!(kind = envelope.body.kind(), "broadcast encode failed: {e}");
                return 0;
            }
        };

        // Snapshot under the lock, send outside it.
        let targets: Vec<(ConnId, mpsc::Sender<tungstenite::Message>, String)> = {
            let peers = self.peers.lock().await;
            peers
                .iter()
                .filter(|(id, _)| **id != exclude)
                .map(|(id, p)| (*id, p.tx.clone(), p.remote_addr.clone()))
                .collect()
        };

        let mut delivered = 0;
        let mut dead = Vec::new();
        for (id, tx, addr) in targets {
            let msg = tungstenite::Message::Text(json.clone().into());
            match tokio::time::timeout(WS_SEND_TIMEOUT, tx.send(msg)).await {
                Ok(Ok(())) => delivered += 1,
                Ok(Err(_)) => {
                    debug!(conn = id, %addr, "peer gone, dropping from registry");
                    dead.push(id);
                }
                Err(_) => {
                    warn!(conn = id, %addr, "send timed out, dropping from registry");
                    dead.push(id);
                }
            }
        }

        if !dead.is_empty() {
            let mut peers = self.peers.lock().await;
            for id in dead {
                peers.remove(&id);
            }
        }

        delivered
    }
}
