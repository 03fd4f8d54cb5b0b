use codec::AnycastAddress;

use crate::{NodeAddress, TimeoutReason};

/// Application callbacks dispatched by a [`crate::Connection`].
///
/// Grounded on `crates/service/src/lib.rs`'s `ServiceHandler` trait: every
/// method has a no-op default, so an embedder implements only the
/// callbacks it cares about.
#[allow(unused_variables)]
pub trait ConnectionHandler: Send + 'static {
    /// A `DATA` packet arrived for an address this node serves.
    fn recv(&mut self, originator: NodeAddress, address: AnycastAddress, payload: &[u8]) {}

    /// The `DATA` packet carrying a prior `send` was handed off by the mesh
    /// layer to the resolved server.
    fn sent(&mut self, address: AnycastAddress, payload: &[u8]) {}

    /// A pending send could not be completed.
    fn timedout(&mut self, address: AnycastAddress, reason: TimeoutReason) {}
}
