pub mod arena;
pub mod bind;
pub mod cache;
pub mod pending;

/// Capacity shared by the bind table, pending-send buffer, and server cache.
pub const CAPACITY: usize = 5;
