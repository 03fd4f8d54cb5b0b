//! A fixed-capacity slot array addressed by index, with a generation counter
//! per slot.
//!
//! Grounded on `crates/turn/src/router/channels.rs`'s `Channel { timer:
//! Instant, bound: [Option<SocketAddr>; 2] }` fixed-size-array-plus-timer
//! shape. The generation counter is this project's addition: a per-entry
//! timer is spawned as its own task (see `crate::connection`) and fires
//! later, asynchronously, into the same actor queue as everything else. If
//! the slot has since been freed and reused, the timer's captured
//! generation no longer matches the slot's current generation and the
//! expiry is a no-op — this is the "index plus generation" resolution to
//! the close-versus-timer race from the design notes, used in place of (or
//! alongside) best-effort task cancellation.

use super::CAPACITY;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotId {
    pub index: usize,
    pub generation: u64,
}

struct Slot<T> {
    value: Option<T>,
    generation: u64,
}

pub struct Arena<T> {
    slots: [Slot<T>; CAPACITY],
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self {
            slots: std::array::from_fn(|_| Slot {
                value: None,
                generation: 0,
            }),
        }
    }
}

impl<T> Arena<T> {
    /// Insert `value` into the first free slot, returning its [`SlotId`].
    /// Returns `None` (and the value back) if the arena is full.
    pub fn insert(&mut self, value: T) -> Result<SlotId, T> {
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.value.is_none() {
                slot.value = Some(value);
                return Ok(SlotId {
                    index,
                    generation: slot.generation,
                });
            }
        }

        Err(value)
    }

    pub fn get(&self, id: SlotId) -> Option<&T> {
        let slot = &self.slots[id.index];
        if slot.generation != id.generation {
            return None;
        }

        slot.value.as_ref()
    }

    pub fn get_mut(&mut self, id: SlotId) -> Option<&mut T> {
        let slot = &mut self.slots[id.index];
        if slot.generation != id.generation {
            return None;
        }

        slot.value.as_mut()
    }

    /// Remove the entry at `id` if its generation still matches, bumping the
    /// slot's generation so any timer holding a stale [`SlotId`] becomes a
    /// no-op on arrival.
    pub fn remove(&mut self, id: SlotId) -> Option<T> {
        let slot = &mut self.slots[id.index];
        if slot.generation != id.generation {
            return None;
        }

        slot.generation = slot.generation.wrapping_add(1);
        slot.value.take()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SlotId, &T)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.value.as_ref().map(|value| {
                (
                    SlotId {
                        index,
                        generation: slot.generation,
                    },
                    value,
                )
            })
        })
    }

    pub fn find(&self, mut predicate: impl FnMut(&T) -> bool) -> Option<SlotId> {
        self.iter()
            .find(|(_, value)| predicate(value))
            .map(|(id, _)| id)
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.value.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_full(&self) -> bool {
        self.len() == CAPACITY
    }

    pub fn drain(&mut self) -> Vec<T> {
        self.slots
            .iter_mut()
            .filter_map(|slot| {
                slot.generation = slot.generation.wrapping_add(1);
                slot.value.take()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stale_generation_after_removal_is_inert() {
        let mut arena: Arena<u32> = Arena::default();
        let id = arena.insert(7).unwrap();
        assert_eq!(arena.remove(id), Some(7));
        assert_eq!(arena.get(id), None);
        assert_eq!(arena.remove(id), None);
    }

    #[test]
    fn reused_slot_gets_fresh_generation() {
        let mut arena: Arena<u32> = Arena::default();
        let first = arena.insert(1).unwrap();
        arena.remove(first).unwrap();
        let second = arena.insert(2).unwrap();
        assert_eq!(second.index, first.index);
        assert_ne!(second.generation, first.generation);
        assert_eq!(arena.get(first), None);
        assert_eq!(arena.get(second), Some(&2));
    }

    #[test]
    fn full_arena_rejects_insert() {
        let mut arena: Arena<u32> = Arena::default();
        for i in 0..CAPACITY as u32 {
            arena.insert(i).unwrap();
        }

        assert_eq!(arena.insert(99), Err(99));
    }
}
