//! Agent-side client for the TradeLink hub.
//!
//! Owns exactly one outbound WebSocket connection: handshake on connect,
//! a background receive loop for the connection's lifetime, typed send
//! helpers, and dispatch of incoming messages to a [`Handler`].
//!
//! Every network operation reports failure as a boolean result; nothing
//! here panics a caller's monitoring loop. There is no automatic
//! reconnection: once the transport drops, sends return `false` until
//! `connect` is called again.

mod client;
mod handler;
mod pumps;

pub use client::A2AClient;
pub use handler::{Handler, HandlerFuture, LogHandler};
