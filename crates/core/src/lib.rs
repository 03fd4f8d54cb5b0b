//! Anycast service-discovery and delivery protocol, composed on top of a
//! network-wide flood primitive and a routed mesh-unicast primitive.
//!
//! A client [`send`](Connection::send)s a payload to an [`AnycastAddress`];
//! this crate floods a service-discovery request, waits for the first
//! server to reply, and then delivers the payload directly to that server
//! over the mesh — caching the mapping so a later send to the same address
//! skips straight to delivery.

mod connection;
pub mod error;
mod handler;
pub mod primitives;
mod state;
mod status;

use std::time::Duration;

pub use codec::NodeAddress;
pub use connection::{Connection, ConnectionOptions};
pub use error::{ListenError, SendError, TimeoutReason};
pub use handler::ConnectionHandler;
pub use primitives::{FloodDecision, FloodEvent, FloodHandle, FloodLayer, MeshEvent, MeshHandle, MeshLayer};

/// Shared expiry for both the pending-send buffer and the server cache.
pub const TIMEOUT: Duration = Duration::from_secs(10);
