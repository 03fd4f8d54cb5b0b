//! The two lower-layer collaborators this crate composes.
//!
//! Neither primitive is implemented here — see `anycast-sim` for an
//! in-process simulation used by the test suite and demo binary. A real
//! embedding wires these traits to the host's flood/mesh stack.

use codec::AnycastAddress;
use tokio::sync::mpsc;

use crate::NodeAddress;

/// What a [`FloodLayer`] observer does with a received flood: consume it
/// locally (this node serves the requested address) or let the primitive
/// keep propagating it outward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloodDecision {
    Consume,
    Propagate,
}

#[derive(Debug, Clone)]
pub enum FloodEvent {
    Recv {
        originator: NodeAddress,
        seq: u8,
        address: AnycastAddress,
    },
    Sent,
}

/// A handle to an open flood connection, obtained from [`FloodLayer::open`].
pub trait FloodHandle: Send {
    /// Flood a request for `address`, tagged with sequence number `seq`.
    fn send(&self, seq: u8, address: AnycastAddress);

    /// Tell the primitive whether the flood identified by `(originator, seq)`
    /// was consumed locally or should keep propagating. Because flood
    /// receipt is delivered asynchronously as a [`FloodEvent`] rather than
    /// through a direct callback return value, the decision is reported
    /// back out-of-band through this method instead.
    fn resolve(&self, originator: NodeAddress, seq: u8, decision: FloodDecision);
}

/// Network-wide controlled broadcast of a one-byte anycast address.
pub trait FloodLayer: Send + Sync {
    fn open(&self, channel: u8, events: mpsc::UnboundedSender<FloodEvent>) -> Box<dyn FloodHandle>;
}

/// `Sent` and `Timedout` echo back the bytes that were handed to
/// [`MeshHandle::send`], rather than just the destination, so the owning
/// connection can tell a confirmed/timed-out `DATA` delivery apart from a
/// `RESPONSE` one without keeping a separate correlation table alive past
/// the point where the pending entry itself was freed.
#[derive(Debug, Clone)]
pub enum MeshEvent {
    Recv { from: NodeAddress, bytes: Vec<u8> },
    Sent { dest: NodeAddress, bytes: Vec<u8> },
    Timedout { dest: NodeAddress, bytes: Vec<u8> },
}

/// A handle to an open mesh connection, obtained from [`MeshLayer::open`].
pub trait MeshHandle: Send {
    fn send(&self, dest: NodeAddress, bytes: Vec<u8>);
}

/// Routed, multi-hop unicast between two node addresses.
pub trait MeshLayer: Send + Sync {
    fn open(&self, channel: u8, events: mpsc::UnboundedSender<MeshEvent>) -> Box<dyn MeshHandle>;
}
