use codec::AnycastAddress;

use crate::NodeAddress;

use super::arena::{Arena, SlotId};

/// An outstanding client request awaiting a server reply.
///
/// `owner` from the data model (the connection this entry belongs to) is
/// implicit here: every `Connection` actor owns exactly one `PendingBuffer`.
#[derive(Debug, Clone)]
pub struct PendingEntry {
    pub seq: u8,
    pub address: AnycastAddress,
    pub payload: Vec<u8>,
}

#[derive(Default)]
pub struct PendingBuffer {
    arena: Arena<PendingEntry>,
}

impl PendingBuffer {
    pub fn insert(&mut self, entry: PendingEntry) -> Result<SlotId, PendingEntry> {
        self.arena.insert(entry)
    }

    /// Remove and return the entry matching `(address, seq)`, observed in a
    /// response from `_node` (kept for symmetry with the cache's `record`,
    /// which does use the responder's node address), along with the slot it
    /// occupied so the caller can abort that slot's expiry timer.
    pub fn take(
        &mut self,
        address: AnycastAddress,
        seq: u8,
        _node: NodeAddress,
    ) -> Option<(SlotId, PendingEntry)> {
        let id = self
            .arena
            .find(|e| e.address == address && e.seq == seq)?;

        self.arena.remove(id).map(|entry| (id, entry))
    }

    pub fn expire(&mut self, id: SlotId) -> Option<PendingEntry> {
        self.arena.remove(id)
    }

    pub fn is_full(&self) -> bool {
        self.arena.is_full()
    }

    pub fn drain(&mut self) -> Vec<PendingEntry> {
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
    fn take_matches_on_address_and_seq_only() {
        let mut buf = PendingBuffer::default();
        buf.insert(PendingEntry {
            seq: 5,
            address: addr(9),
            payload: vec![],
        })
        .unwrap();

        assert!(buf.take(addr(9), 6, NodeAddress(1)).is_none());
        let (_, entry) = buf.take(addr(9), 5, NodeAddress(1)).unwrap();
        assert_eq!(entry.seq, 5);
        assert!(buf.is_empty());
    }
}
