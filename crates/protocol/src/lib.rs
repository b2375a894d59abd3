//! Wire protocol for the TradeLink agent-to-agent hub.
//!
//! Every message on the wire is a single JSON object: a type tag, the
//! sending agent's id, a numeric timestamp, and type-specific fields.
//! The hub never inspects payloads beyond the top-level shape.

pub mod constants;
pub mod envelope;
pub mod signals;

pub use constants::HUB_CAPABILITIES;
pub use envelope::{Body, Envelope};
pub use signals::{MarketDataQuery, SecurityAlert, TradeSignal};
