use anycast_core::{ConnectionHandler, NodeAddress, TimeoutReason};
use codec::AnycastAddress;

/// Demo [`ConnectionHandler`] that just logs every callback.
///
/// Grounded on `examples/mycrl-turn-rs/src/observer.rs`'s pattern of a
/// handler struct that implements the crate's callback trait and logs at
/// `info` level for each significant event.
pub struct LoggingHandler {
    pub node: NodeAddress,
}

impl ConnectionHandler for LoggingHandler {
    fn recv(&mut self, originator: NodeAddress, address: AnycastAddress, payload: &[u8]) {
        log::info!(
            "node={node}: recv address={address} from={originator} payload={payload:?}",
            node = self.node,
        );
    }

    fn sent(&mut self, address: AnycastAddress, payload: &[u8]) {
        log::info!(
            "node={node}: sent address={address} payload={payload:?}",
            node = self.node,
        );
    }

    fn timedout(&mut self, address: AnycastAddress, reason: TimeoutReason) {
        log::warn!(
            "node={node}: timedout address={address} reason={reason:?}",
            node = self.node,
        );
    }
}
