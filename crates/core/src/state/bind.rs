use codec::AnycastAddress;

use super::CAPACITY;

/// Addresses this connection serves.
///
/// Grounded on `crates/turn/src/router/channels.rs`'s small bounded-array
/// tables; no expiry applies here, so a plain fixed array suffices.
#[derive(Default)]
pub struct BindTable {
    addrs: [Option<AnycastAddress>; CAPACITY],
}

impl BindTable {
    pub fn add(&mut self, address: AnycastAddress) -> Result<(), ()> {
        if self.contains(address) {
            return Ok(());
        }

        for slot in self.addrs.iter_mut() {
            if slot.is_none() {
                *slot = Some(address);
                return Ok(());
            }
        }

        Err(())
    }

    pub fn contains(&self, address: AnycastAddress) -> bool {
        self.addrs.iter().flatten().any(|a| *a == address)
    }

    pub fn drain(&mut self) -> Vec<AnycastAddress> {
        self.addrs
            .iter_mut()
            .filter_map(|slot| slot.take())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.addrs.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(v: u8) -> AnycastAddress {
        AnycastAddress::new(v).unwrap()
    }

    #[test]
    fn rejects_duplicates_as_noop() {
        let mut table = BindTable::default();
        assert!(table.add(addr(1)).is_ok());
        assert!(table.add(addr(1)).is_ok());
        assert_eq!(table.drain().len(), 1);
    }

    #[test]
    fn fills_up_to_capacity() {
        let mut table = BindTable::default();
        for v in 1..=CAPACITY as u8 {
            table.add(addr(v)).unwrap();
        }

        assert!(table.add(addr(200)).is_err());
    }
}
