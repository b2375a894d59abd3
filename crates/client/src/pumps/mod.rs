//! Background tasks owning the two halves of the WebSocket.

pub(crate) mod ping;
pub(crate) mod read;
pub(crate) mod write;
