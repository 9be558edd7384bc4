//! Network module.
//!
//! Contains the Transport abstraction, the in-process transport, and the
//! line-delimited JSON gateway used by the binary.

pub mod gateway;
pub mod local;
pub mod transport;

pub use local::{LocalTransport, OutboundFrame, Response};
pub use transport::{GatewayEvent, RegisteredCommand, Transport, TransportError};
