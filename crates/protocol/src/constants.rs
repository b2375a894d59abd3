//! Protocol constants shared by the hub and the client.

use std::time::Duration;

/// Default TCP port the hub listens on.
pub const DEFAULT_HUB_PORT: u16 = 8765;

/// Default WebSocket endpoint for clients.
pub const DEFAULT_HUB_URL: &str = "ws://localhost:8765";

/// Capabilities advertised in every `handshake_response`.
pub const HUB_CAPABILITIES: [&str; 3] = ["trade_signals", "security_alerts", "market_data"];

/// Maximum size of a single WebSocket message, in bytes.
pub const WS_MAX_MESSAGE_SIZE: usize = 1024 * 1024;

/// Per-connection outbound queue depth.
pub const SEND_BUFFER_SIZE: usize = 256;

/// Upper bound on handing a message to a peer's write queue. A peer that
/// cannot drain its queue within this window is treated as disconnected so
/// one slow peer never stalls the broadcast fan-out.
pub const WS_SEND_TIMEOUT: Duration = Duration::from_secs(5);

/// Keepalive ping interval on the client connection.
pub const WS_PING_PERIOD: Duration = Duration::from_secs(30);

/// Retention cap for the hub history and client sent/received buffers.
///
/// The buffers exist only for local introspection; older entries are
/// evicted once the cap is reached.
pub const HISTORY_CAP: usize = 1000;

/// Current epoch time as fractional seconds, the wire timestamp format.
pub fn epoch_now() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}
