/*
 * Created on Mon Jul 28 2026
 *
 * This file is a part of Skytable
 * Skytable (formerly known as TerrabaseDB or Skybase) is a free and open-source
 * NoSQL database written by Sayan Nandan ("the Author") with the
 * vision to provide flexibility in data modelling without compromising
 * on performance, queryability or scalability.
 *
 * Copyright (c) 2021, Sayan Nandan <ohsayan@outlook.com>
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU Affero General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU Affero General Public License for more details.
 *
 * You should have received a copy of the GNU Affero General Public License
 * along with this program. If not, see <https://www.gnu.org/licenses/>.
 *
*/

//! The reference storage variant: slots hold borrowed handles to
//! externally-owned keys and values. Comparison, hashing, and destruction
//! are supplied by the caller through [`RefCallbacks`] rather than the
//! `Eq`/`Hash`/`Drop` traits a plain `HashMap<K, V>` would ask for, because
//! ownership of `K`/`V` genuinely lives outside the table: the table never
//! allocates or frees a key or value, only the slot bookkeeping around
//! them.

use std::ptr::NonNull;

use crate::error::{EngineError, EngineResult};
use crate::group::{self, h1_h2};
use crate::hash::{mix_with_seed, HashStrategy};
use crate::iter::SlotCursor;
use crate::probe::ProbeKind;
use crate::raw::ControlBlock;

/// The capability set a caller must supply to use the reference variant:
/// key comparison, key hashing, and pair destruction. Kept as a trait
/// rather than three separate closures so one implementor can share state
/// (a destructor counter, for instance) across all three methods.
pub trait RefCallbacks<K: ?Sized, V: ?Sized> {
    /// Returns whether `a` and `b` denote the same logical key.
    fn compare(&self, a: &K, b: &K) -> bool;
    /// Hashes `key`. The table mixes this with a per-instance seed before
    /// splitting it into `H1`/`H2`.
    fn hash(&self, key: &K) -> u64;
    /// Called once per live slot, on delete and on free. The table has
    /// already unlinked the slot by the time this runs.
    fn destroy(&mut self, key: NonNull<K>, value: NonNull<V>);
}

struct Slot<K, V> {
    key: NonNull<K>,
    value: NonNull<V>,
}

// Derived impls would add spurious `K: Copy, V: Copy` bounds; a slot only
// ever copies the pointers, never the pointees.
impl<K, V> Clone for Slot<K, V> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<K, V> Copy for Slot<K, V> {}

/// A hash table over borrowed `(K, V)` handles, backed by caller-supplied
/// [`RefCallbacks`].
pub struct RefTable<K, V, C: RefCallbacks<K, V>> {
    ctrl: ControlBlock,
    slots: Vec<Option<Slot<K, V>>>,
    callbacks: C,
    seed: u64,
    hash_strategy: HashStrategy,
    cursor: SlotCursor,
}

unsafe impl<K, V, C: RefCallbacks<K, V> + Send> Send for RefTable<K, V, C> {}

impl<K, V, C: RefCallbacks<K, V>> RefTable<K, V, C> {
    /// Creates a table sized for at least `requested` entries, using the
    /// default probing discipline and a process-seeded non-cryptographic
    /// hash mix.
    pub fn create(requested: usize, callbacks: C) -> EngineResult<Self> {
        Self::create_with(requested, callbacks, ProbeKind::Linear, HashStrategy::Fast, random_seed())
    }

    /// As [`RefTable::create`], but lets the caller pin the probing
    /// discipline, the hash-mixing strategy, and the seed explicitly
    /// (deterministic tests want a fixed seed; production callers usually
    /// want [`RefTable::create`]'s random one).
    pub fn create_with(
        requested: usize,
        callbacks: C,
        probe_kind: ProbeKind,
        hash_strategy: HashStrategy,
        seed: u64,
    ) -> EngineResult<Self> {
        let ctrl = ControlBlock::with_capacity(requested, probe_kind)?;
        let capacity = ctrl.capacity();
        log::trace!("created reference table: capacity={}", capacity);
        Ok(Self {
            ctrl,
            slots: vec![None; capacity],
            callbacks,
            seed,
            hash_strategy,
            cursor: SlotCursor::invalid(),
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.ctrl.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ctrl.len() == 0
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.ctrl.capacity()
    }

    #[inline]
    pub fn load_factor(&self) -> f64 {
        self.ctrl.len() as f64 / self.ctrl.capacity() as f64
    }

    fn hash_key(&self, key: &K) -> u64 {
        mix_with_seed(self.hash_strategy, self.seed, self.callbacks.hash(key))
    }

    fn find_slot(&self, key: &K) -> Option<usize> {
        let (h1, h2) = h1_h2(self.hash_key(key));
        let mut probe = self.ctrl.probe_from(h1);
        loop {
            let group_idx = probe.advance();
            let group = unsafe { self.ctrl.load_group(group_idx) };
            let mut candidates = group.match_byte(h2);
            while let Some(offset) = candidates.remove_lowest_bit() {
                let slot = group_idx * group::WIDTH + offset;
                if let Some(entry) = &self.slots[slot] {
                    if self.callbacks.compare(unsafe { entry.key.as_ref() }, key) {
                        return Some(slot);
                    }
                }
            }
            if group.match_empty().any_bit_set() {
                return None;
            }
        }
    }

    fn place_slot(&self, h1: u64) -> usize {
        let mut probe = self.ctrl.probe_from(h1);
        loop {
            let group_idx = probe.advance();
            let group = unsafe { self.ctrl.load_group(group_idx) };
            let mut free = group.match_empty_or_deleted();
            if let Some(offset) = free.remove_lowest_bit() {
                return group_idx * group::WIDTH + offset;
            }
        }
    }

    /// Looks up `key`, returning the stored value handle.
    pub fn search(&self, key: &K) -> Option<NonNull<V>> {
        self.find_slot(key).map(|slot| self.slots[slot].unwrap().value)
    }

    /// Inserts `(key, value)` only if `key` is absent. Returns the existing
    /// value handle if the key was already present.
    pub fn insert(&mut self, key: NonNull<K>, value: NonNull<V>) -> EngineResult<Option<NonNull<V>>> {
        if let Some(slot) = self.find_slot(unsafe { key.as_ref() }) {
            return Ok(Some(self.slots[slot].unwrap().value));
        }
        self.grow_if_needed()?;
        let (h1, h2) = h1_h2(self.hash_key(unsafe { key.as_ref() }));
        let slot = self.place_slot(h1);
        self.slots[slot] = Some(Slot { key, value });
        self.ctrl.record_insert(slot, h2);
        Ok(None)
    }

    /// Inserts `(key, value)`. If `key` is already present, the previous
    /// pair is destroyed via [`RefCallbacks::destroy`] and replaced.
    pub fn emplace(&mut self, key: NonNull<K>, value: NonNull<V>) -> EngineResult<()> {
        if let Some(slot) = self.find_slot(unsafe { key.as_ref() }) {
            let old = self.slots[slot].take().unwrap();
            self.callbacks.destroy(old.key, old.value);
            self.slots[slot] = Some(Slot { key, value });
            return Ok(());
        }
        self.grow_if_needed()?;
        let (h1, h2) = h1_h2(self.hash_key(unsafe { key.as_ref() }));
        let slot = self.place_slot(h1);
        self.slots[slot] = Some(Slot { key, value });
        self.ctrl.record_insert(slot, h2);
        Ok(())
    }

    /// Removes `key`, destroying its pair via [`RefCallbacks::destroy`].
    pub fn delete(&mut self, key: &K) -> EngineResult<()> {
        let slot = self.find_slot(key).ok_or(EngineError::EntryNotExists)?;
        let entry = self.slots[slot].take().unwrap();
        self.ctrl.erase_meta(slot);
        self.cursor = SlotCursor::invalid();
        self.callbacks.destroy(entry.key, entry.value);
        self.shrink_if_needed()?;
        Ok(())
    }

    fn grow_if_needed(&mut self) -> EngineResult<()> {
        if self.ctrl.should_grow() {
            self.resize_to(self.ctrl.capacity() * 2)?;
        }
        Ok(())
    }

    fn shrink_if_needed(&mut self) -> EngineResult<()> {
        if self.ctrl.should_shrink() {
            self.resize_to(self.ctrl.capacity() / 2)?;
        }
        Ok(())
    }

    fn resize_to(&mut self, new_capacity: usize) -> EngineResult<()> {
        log::debug!(
            "resizing reference table: {} -> {} (len={})",
            self.ctrl.capacity(),
            new_capacity,
            self.ctrl.len()
        );
        let old_group_count = self.ctrl.group_count();
        let old_ctrl = self.ctrl.replace_with_capacity(new_capacity)?;
        let old_slots = std::mem::replace(&mut self.slots, vec![None; new_capacity]);

        for group_idx in 0..old_group_count {
            let mut live = unsafe { old_ctrl.live_mask(group_idx) };
            while let Some(offset) = live.remove_lowest_bit() {
                let old_slot = group_idx * group::WIDTH + offset;
                let entry = old_slots[old_slot].unwrap();
                let (h1, h2) = h1_h2(self.hash_key(unsafe { entry.key.as_ref() }));
                let new_slot = self.place_slot(h1);
                self.slots[new_slot] = Some(entry);
                self.ctrl.record_insert(new_slot, h2);
            }
        }
        Ok(())
    }

    /// Starts (or restarts) forward iteration.
    pub fn iter_start(&mut self) -> Option<(NonNull<K>, NonNull<V>)> {
        self.cursor = SlotCursor::start(&self.ctrl);
        self.yield_current()
    }

    pub fn iter_next(&mut self) -> Option<(NonNull<K>, NonNull<V>)> {
        self.cursor.advance_forward(&self.ctrl);
        self.yield_current()
    }

    pub fn iter_end(&mut self) -> Option<(NonNull<K>, NonNull<V>)> {
        self.cursor = SlotCursor::end(&self.ctrl);
        self.yield_current()
    }

    pub fn iter_prev(&mut self) -> Option<(NonNull<K>, NonNull<V>)> {
        self.cursor.advance_backward(&self.ctrl);
        self.yield_current()
    }

    fn yield_current(&self) -> Option<(NonNull<K>, NonNull<V>)> {
        let slot = self.cursor.current_slot()?;
        self.slots[slot].map(|s| (s.key, s.value))
    }
}

impl<K, V, C: RefCallbacks<K, V>> Drop for RefTable<K, V, C> {
    fn drop(&mut self) {
        for slot in self.slots.iter_mut() {
            if let Some(entry) = slot.take() {
                self.callbacks.destroy(entry.key, entry.value);
            }
        }
    }
}

/// A coarse per-process seed: xors the address of a thread-local stack
/// variable (which ASLR randomizes) with the current time, mirroring the
/// "process-seeded" requirement without pulling in a full RNG crate for
/// this single one-shot use. Callers who need a reproducible seed should
/// use [`RefTable::create_with`] directly.
fn random_seed() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    let marker = 0u8;
    let addr = &marker as *const u8 as u64;
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0);
    addr ^ nanos.rotate_left(17)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct IntCallbacks {
        destroyed: Rc<RefCell<usize>>,
    }

    impl RefCallbacks<i64, i64> for IntCallbacks {
        fn compare(&self, a: &i64, b: &i64) -> bool {
            a == b
        }
        fn hash(&self, key: &i64) -> u64 {
            crate::hash::hash_u64(*key as u64)
        }
        fn destroy(&mut self, key: NonNull<i64>, value: NonNull<i64>) {
            *self.destroyed.borrow_mut() += 1;
            unsafe {
                drop(Box::from_raw(key.as_ptr()));
                drop(Box::from_raw(value.as_ptr()));
            }
        }
    }

    #[test]
    fn insert_then_free_runs_destructor_for_every_entry() {
        let destroyed = Rc::new(RefCell::new(0));
        let callbacks = IntCallbacks {
            destroyed: destroyed.clone(),
        };
        let mut table = RefTable::create_with(32, callbacks, ProbeKind::Linear, HashStrategy::Fast, 42).unwrap();
        for i in 0..10i64 {
            let key = NonNull::new(Box::into_raw(Box::new(i))).unwrap();
            let value = NonNull::new(Box::into_raw(Box::new(i * 2))).unwrap();
            assert!(table.insert(key, value).unwrap().is_none());
        }
        assert_eq!(table.len(), 10);
        drop(table);
        assert_eq!(*destroyed.borrow(), 10);
    }

    #[test]
    fn search_finds_value_via_callback_comparator() {
        let destroyed = Rc::new(RefCell::new(0));
        let callbacks = IntCallbacks {
            destroyed: destroyed.clone(),
        };
        let mut table = RefTable::create_with(32, callbacks, ProbeKind::Linear, HashStrategy::Fast, 7).unwrap();
        let key = NonNull::new(Box::into_raw(Box::new(5i64))).unwrap();
        let value = NonNull::new(Box::into_raw(Box::new(500i64))).unwrap();
        table.insert(key, value).unwrap();
        let found = table.search(&5i64).unwrap();
        assert_eq!(unsafe { *found.as_ref() }, 500);
    }
}
