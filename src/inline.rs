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

//! The inline storage variant: keys and values are copied byte-for-byte
//! into a table the engine owns outright. Sizes are fixed at construction
//! time but are runtime values, not Rust generic parameters — this mirrors
//! a C library's `(entry_sz, key_sz)` constructor contract, which is the
//! point of this variant (embedding, FFI, or plain-old-data workloads where
//! a generic `HashMap<K, V>` isn't the right shape).

use std::alloc::{self, Layout};
use std::ptr::NonNull;

use crate::error::{EngineError, EngineResult};
use crate::group::{self, h1_h2};
use crate::hash::{hash_inline_key, KeyKind};
use crate::iter::SlotCursor;
use crate::probe::ProbeKind;
use crate::raw::ControlBlock;

/// A hash table that owns fixed-size byte blobs for both key and value.
pub struct InlineTable {
    ctrl: ControlBlock,
    slots: NonNull<u8>,
    key_size: usize,
    value_size: usize,
    key_kind: KeyKind,
    cursor: SlotCursor,
}

unsafe impl Send for InlineTable {}

impl InlineTable {
    #[inline]
    fn slot_stride(&self) -> usize {
        self.key_size + self.value_size
    }

    /// Computes the slot-array layout for `capacity * stride` bytes. A
    /// size that overflows `usize` or exceeds `isize::MAX` is this crate's
    /// only catchable allocation-failure case on create/resize (Rust's
    /// global allocator aborts the process on true OOM, so capacity
    /// overflow is the failure the error model can actually report).
    fn slots_layout(capacity: usize, stride: usize, on_overflow: EngineError) -> EngineResult<Layout> {
        let size = capacity.checked_mul(stride).ok_or(on_overflow)?;
        Layout::array::<u8>(size).map_err(|_| on_overflow)
    }

    /// Creates a table sized for at least `requested` entries, with keys
    /// and values of the given fixed byte widths.
    pub fn create(requested: usize, key_size: usize, value_size: usize) -> EngineResult<Self> {
        Self::create_with(requested, key_size, value_size, KeyKind::Generic, ProbeKind::Linear)
    }

    /// As [`InlineTable::create`], but lets the caller pin a fast-path key
    /// interpretation and a probing discipline up front.
    pub fn create_with(
        requested: usize,
        key_size: usize,
        value_size: usize,
        key_kind: KeyKind,
        probe_kind: ProbeKind,
    ) -> EngineResult<Self> {
        if key_size == 0 {
            return Err(EngineError::InvalidArgument);
        }
        let ctrl = ControlBlock::with_capacity(requested, probe_kind)?;
        let stride = key_size + value_size;
        let layout = Self::slots_layout(ctrl.capacity(), stride, EngineError::CreateAllocFailure)?;
        let ptr = if layout.size() == 0 {
            NonNull::dangling()
        } else {
            NonNull::new(unsafe { alloc::alloc_zeroed(layout) })
                .ok_or(EngineError::CreateAllocFailure)?
        };
        log::trace!(
            "created inline table: capacity={} key_size={} value_size={}",
            ctrl.capacity(),
            key_size,
            value_size
        );
        Ok(Self {
            ctrl,
            slots: ptr,
            key_size,
            value_size,
            key_kind,
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

    #[inline]
    unsafe fn key_at(&self, slot: usize) -> &[u8] {
        let base = self.slots.as_ptr().add(slot * self.slot_stride());
        std::slice::from_raw_parts(base, self.key_size)
    }

    #[inline]
    unsafe fn value_at(&self, slot: usize) -> &[u8] {
        let base = self.slots.as_ptr().add(slot * self.slot_stride() + self.key_size);
        std::slice::from_raw_parts(base, self.value_size)
    }

    #[inline]
    unsafe fn value_at_mut(&mut self, slot: usize) -> &mut [u8] {
        let base = self
            .slots
            .as_ptr()
            .add(slot * self.slot_stride() + self.key_size);
        std::slice::from_raw_parts_mut(base, self.value_size)
    }

    #[inline]
    unsafe fn write_slot(&mut self, slot: usize, key: &[u8], value: &[u8]) {
        let base = self.slots.as_ptr().add(slot * self.slot_stride());
        std::ptr::copy_nonoverlapping(key.as_ptr(), base, self.key_size);
        std::ptr::copy_nonoverlapping(value.as_ptr(), base.add(self.key_size), self.value_size);
    }

    fn hash_key(&self, key: &[u8]) -> u64 {
        hash_inline_key(self.key_kind, key)
    }

    /// Returns the slot index holding `key`, scanning groups along the
    /// probe sequence until one with an `EMPTY` byte is found.
    fn find_slot(&self, key: &[u8]) -> Option<usize> {
        let (h1, h2) = h1_h2(self.hash_key(key));
        let mut probe = self.ctrl.probe_from(h1);
        loop {
            let group_idx = probe.advance();
            let group = unsafe { self.ctrl.load_group(group_idx) };
            let mut candidates = group.match_byte(h2);
            while let Some(offset) = candidates.remove_lowest_bit() {
                let slot = group_idx * group::WIDTH + offset;
                if unsafe { self.key_at(slot) } == key {
                    return Some(slot);
                }
            }
            if group.match_empty().any_bit_set() {
                return None;
            }
        }
    }

    /// Looks up `key`, returning a reference to the stored value bytes.
    pub fn search(&self, key: &[u8]) -> Option<&[u8]> {
        if key.len() != self.key_size {
            return None;
        }
        self.find_slot(key).map(|slot| unsafe { self.value_at(slot) })
    }

    /// Finds an empty-or-deleted slot for `key` along its probe sequence,
    /// without checking whether the key is already present. Only safe to
    /// call when the caller already knows the key is absent (after a
    /// failed [`InlineTable::find_slot`], or during resize re-insertion).
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

    /// Inserts `(key, value)` only if `key` is absent. Returns the existing
    /// value bytes if the key was already present.
    pub fn insert(&mut self, key: &[u8], value: &[u8]) -> EngineResult<Option<Vec<u8>>> {
        if key.len() != self.key_size || value.len() != self.value_size {
            return Err(EngineError::InvalidArgument);
        }
        if let Some(slot) = self.find_slot(key) {
            return Ok(Some(unsafe { self.value_at(slot) }.to_vec()));
        }
        self.grow_if_needed()?;
        let (h1, h2) = h1_h2(self.hash_key(key));
        let slot = self.place_slot(h1);
        unsafe { self.write_slot(slot, key, value) };
        self.ctrl.record_insert(slot, h2);
        Ok(None)
    }

    /// Inserts `(key, value)`, overwriting any existing value for `key`.
    pub fn emplace(&mut self, key: &[u8], value: &[u8]) -> EngineResult<()> {
        if key.len() != self.key_size || value.len() != self.value_size {
            return Err(EngineError::InvalidArgument);
        }
        if let Some(slot) = self.find_slot(key) {
            unsafe { self.value_at_mut(slot).copy_from_slice(value) };
            return Ok(());
        }
        self.grow_if_needed()?;
        let (h1, h2) = h1_h2(self.hash_key(key));
        let slot = self.place_slot(h1);
        unsafe { self.write_slot(slot, key, value) };
        self.ctrl.record_insert(slot, h2);
        Ok(())
    }

    /// Removes `key`, if present.
    pub fn delete(&mut self, key: &[u8]) -> EngineResult<()> {
        if key.len() != self.key_size {
            return Err(EngineError::InvalidArgument);
        }
        let slot = self.find_slot(key).ok_or(EngineError::EntryNotExists)?;
        self.ctrl.erase_meta(slot);
        self.cursor = SlotCursor::invalid();
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
            "resizing inline table: {} -> {} (len={})",
            self.ctrl.capacity(),
            new_capacity,
            self.ctrl.len()
        );
        let stride = self.slot_stride();
        let old_capacity = self.ctrl.capacity();
        let old_group_count = self.ctrl.group_count();
        let new_layout = Self::slots_layout(new_capacity, stride, EngineError::RehashAllocFailure)?;
        let new_slots = if new_layout.size() == 0 {
            NonNull::dangling()
        } else {
            NonNull::new(unsafe { alloc::alloc_zeroed(new_layout) })
                .ok_or(EngineError::RehashAllocFailure)?
        };

        let old_ctrl = match self.ctrl.replace_with_capacity(new_capacity) {
            Ok(old) => old,
            Err(e) => {
                if new_layout.size() != 0 {
                    unsafe { alloc::dealloc(new_slots.as_ptr(), new_layout) };
                }
                return Err(e);
            }
        };
        let old_slots = std::mem::replace(&mut self.slots, new_slots);

        for group_idx in 0..old_group_count {
            let mut live = unsafe { old_ctrl.live_mask(group_idx) };
            while let Some(offset) = live.remove_lowest_bit() {
                let old_slot = group_idx * group::WIDTH + offset;
                let key = unsafe {
                    std::slice::from_raw_parts(old_slots.as_ptr().add(old_slot * stride), self.key_size)
                }
                .to_vec();
                let value = unsafe {
                    std::slice::from_raw_parts(
                        old_slots.as_ptr().add(old_slot * stride + self.key_size),
                        self.value_size,
                    )
                }
                .to_vec();
                let (h1, h2) = h1_h2(self.hash_key(&key));
                let new_slot = self.place_slot(h1);
                unsafe { self.write_slot(new_slot, &key, &value) };
                self.ctrl.record_insert(new_slot, h2);
            }
        }

        if old_capacity.checked_mul(stride).map(|n| n != 0).unwrap_or(false) {
            unsafe {
                alloc::dealloc(
                    old_slots.as_ptr(),
                    Layout::array::<u8>(old_capacity * stride).unwrap(),
                )
            };
        }
        Ok(())
    }

    /// Starts (or restarts) forward iteration, returning the first
    /// `(key, value)` pair if any entry is live.
    pub fn iter_start(&mut self) -> Option<(&[u8], &[u8])> {
        self.cursor = SlotCursor::start(&self.ctrl);
        self.yield_current()
    }

    /// Advances forward iteration.
    pub fn iter_next(&mut self) -> Option<(&[u8], &[u8])> {
        self.cursor.advance_forward(&self.ctrl);
        self.yield_current()
    }

    /// Starts (or restarts) backward iteration from the last live slot.
    pub fn iter_end(&mut self) -> Option<(&[u8], &[u8])> {
        self.cursor = SlotCursor::end(&self.ctrl);
        self.yield_current()
    }

    /// Advances backward iteration.
    pub fn iter_prev(&mut self) -> Option<(&[u8], &[u8])> {
        self.cursor.advance_backward(&self.ctrl);
        self.yield_current()
    }

    fn yield_current(&self) -> Option<(&[u8], &[u8])> {
        let slot = self.cursor.current_slot()?;
        Some(unsafe { (self.key_at(slot), self.value_at(slot)) })
    }
}

impl Drop for InlineTable {
    fn drop(&mut self) {
        let stride = self.slot_stride();
        let size = self.ctrl.capacity() * stride;
        if size != 0 {
            unsafe {
                alloc::dealloc(self.slots.as_ptr(), Layout::array::<u8>(size).unwrap());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(requested: usize) -> InlineTable {
        InlineTable::create(requested, 4, 4).unwrap()
    }

    #[test]
    fn create_rounds_capacity_to_32() {
        let table = t(10);
        assert_eq!(table.capacity(), 32);
    }

    #[test]
    fn insert_then_search_round_trips() {
        let mut table = t(4);
        for k in 0i32..40 {
            let key = k.to_ne_bytes();
            let val = (k * 100).to_ne_bytes();
            assert!(table.insert(&key, &val).unwrap().is_none());
        }
        assert_eq!(table.len(), 40);
        assert!(table.capacity() > 32);
        let found = table.search(&17i32.to_ne_bytes()).unwrap();
        assert_eq!(i32::from_ne_bytes(found.try_into().unwrap()), 1700);
    }

    #[test]
    fn insert_existing_key_returns_old_value_and_does_not_duplicate() {
        let mut table = t(32);
        table.insert(&1i32.to_ne_bytes(), &10i32.to_ne_bytes()).unwrap();
        let old = table.insert(&1i32.to_ne_bytes(), &20i32.to_ne_bytes()).unwrap();
        assert_eq!(i32::from_ne_bytes(old.unwrap().try_into().unwrap()), 10);
        assert_eq!(table.len(), 1);
        let found = table.search(&1i32.to_ne_bytes()).unwrap();
        assert_eq!(i32::from_ne_bytes(found.try_into().unwrap()), 10);
    }

    #[test]
    fn emplace_overwrites_existing_value() {
        let mut table = t(32);
        table.emplace(&1i32.to_ne_bytes(), &10i32.to_ne_bytes()).unwrap();
        table.emplace(&1i32.to_ne_bytes(), &20i32.to_ne_bytes()).unwrap();
        assert_eq!(table.len(), 1);
        let found = table.search(&1i32.to_ne_bytes()).unwrap();
        assert_eq!(i32::from_ne_bytes(found.try_into().unwrap()), 20);
    }

    #[test]
    fn delete_then_search_returns_none_and_shrinks_when_sparse() {
        let mut table = t(4);
        for k in 0i32..200 {
            table.insert(&k.to_ne_bytes(), &k.to_ne_bytes()).unwrap();
        }
        let grown_capacity = table.capacity();
        for k in 0i32..180 {
            table.delete(&k.to_ne_bytes()).unwrap();
        }
        assert!(table.capacity() < grown_capacity);
        assert!(table.capacity().is_power_of_two());
        assert!(table.capacity() >= 32);
        for k in 180i32..200 {
            let found = table.search(&k.to_ne_bytes()).unwrap();
            assert_eq!(i32::from_ne_bytes(found.try_into().unwrap()), k);
        }
    }

    #[test]
    fn delete_missing_key_is_not_exists() {
        let mut table = t(32);
        for k in 0i32..1000 {
            table.insert(&k.to_ne_bytes(), &k.to_ne_bytes()).unwrap();
        }
        assert!(table.search(&(-1i32).to_ne_bytes()).is_none());
        assert_eq!(
            table.delete(&(-1i32).to_ne_bytes()).unwrap_err(),
            EngineError::EntryNotExists
        );
    }

    #[test]
    fn iteration_yields_every_live_key_exactly_once() {
        let mut table = t(4);
        for k in 0i32..100 {
            table.insert(&k.to_ne_bytes(), &k.to_ne_bytes()).unwrap();
        }
        for k in (0i32..100).step_by(2) {
            table.delete(&k.to_ne_bytes()).unwrap();
        }
        let mut seen = Vec::new();
        let mut cur = table.iter_start();
        while let Some((k, _)) = cur {
            seen.push(i32::from_ne_bytes(k.try_into().unwrap()));
            cur = table.iter_next();
        }
        seen.sort_unstable();
        let expected: Vec<i32> = (0..100).filter(|k| k % 2 != 0).collect();
        assert_eq!(seen, expected);
    }
}
