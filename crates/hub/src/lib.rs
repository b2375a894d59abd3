//! WebSocket broadcast hub for agent-to-agent coordination.
//!
//! Accepts unbounded concurrent agent connections, classifies each
//! incoming envelope, replies directly where the protocol calls for it,
//! and fans broadcast-eligible messages out to every other connected
//! peer. Best-effort only: no persistence, no delivery guarantees, no
//! authentication.

mod history;
mod registry;
mod router;
mod server;

pub use history::{History, HistoryEntry};
pub use registry::{ConnId, Registry};
pub use router::{classify_and_respond, should_broadcast};
pub use server::{HubConfig, HubServer};

/// Errors produced by the hub server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
