use codec::AnycastAddress;

use crate::NodeAddress;

use super::arena::{Arena, SlotId};

/// A learned `address -> node` mapping, with an expiry timer owned by the
/// connection actor (see `crate::connection`).
#[derive(Debug, Clone, Copy)]
pub struct CacheEntry {
    pub address: AnycastAddress,
    pub node: NodeAddress,
}

/// The outcome of [`ServerCache::record`], telling the caller which timer to
/// arm or refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// A brand new entry was allocated at `id`; arm a fresh timer for it.
    Inserted(SlotId),
    /// An existing entry for the same node was found; refresh its timer.
    Refreshed(SlotId),
    /// The cache was full and the address was already mapped to a different
    /// node; the stale mapping is kept and the newer observation is dropped.
    Dropped,
}

#[derive(Default)]
pub struct ServerCache {
    arena: Arena<CacheEntry>,
}

impl ServerCache {
    pub fn lookup(&self, address: AnycastAddress) -> Option<NodeAddress> {
        self.arena
            .iter()
            .find(|(_, e)| e.address == address)
            .map(|(_, e)| e.node)
    }

    /// Record an observed `(address, node)` response.
    ///
    /// If an entry for `address` already maps to `node`, its timer should be
    /// refreshed. If it maps to a different node, a new entry is allocated
    /// for the newer mapping rather than overwriting in place, letting the
    /// older one age out on its own timer; if the cache has no free slot the
    /// older mapping is left untouched.
    pub fn record(&mut self, address: AnycastAddress, node: NodeAddress) -> RecordOutcome {
        if let Some(id) = self.arena.find(|e| e.address == address && e.node == node) {
            return RecordOutcome::Refreshed(id);
        }

        match self.arena.insert(CacheEntry { address, node }) {
            Ok(id) => RecordOutcome::Inserted(id),
            Err(_) => RecordOutcome::Dropped,
        }
    }

    pub fn expire(&mut self, id: SlotId) -> Option<CacheEntry> {
        self.arena.remove(id)
    }

    pub fn drain(&mut self) -> Vec<CacheEntry> {
        self.arena.drain()
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(v: u8) -> AnycastAddress {
        AnycastAddress::new(v).unwrap()
    }

    #[test]
    fn same_node_refreshes_rather_than_duplicates() {
        let mut cache = ServerCache::default();
        let first = cache.record(addr(1), NodeAddress(10));
        let second = cache.record(addr(1), NodeAddress(10));
        assert!(matches!(first, RecordOutcome::Inserted(_)));
        assert!(matches!(second, RecordOutcome::Refreshed(id) if matches!(first, RecordOutcome::Inserted(fid) if fid == id)));
    }

    #[test]
    fn different_node_allocates_new_entry() {
        let mut cache = ServerCache::default();
        cache.record(addr(1), NodeAddress(10));
        let second = cache.record(addr(1), NodeAddress(20));
        assert!(matches!(second, RecordOutcome::Inserted(_)));
        // Both mappings are observable until the older one expires.
        assert_eq!(cache.lookup(addr(1)), Some(NodeAddress(10)));
    }
}
