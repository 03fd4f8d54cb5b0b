//! An in-process simulated network implementing the flood and mesh
//! primitives `anycast-core` composes.
//!
//! Grounded on `examples/mycrl-turn-rs/testing/` (a standalone in-process
//! harness crate used by the teacher's integration tests) and
//! `crates/service/tests/turn.rs`'s pattern of wiring a full service
//! in-process instead of binding real sockets.

mod network;

pub use network::{Network, NetworkNode};
