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

//! The metadata half of the engine, shared by the inline and reference
//! storage variants. Everything here deals only in group/slot indices and
//! control bytes; neither variant's key or value type is visible from this
//! module, which is what lets both reuse it as a private inner core instead
//! of duplicating the probe/group-scan machinery.

use std::alloc::{self, Layout};
use std::ptr::NonNull;

use crate::error::EngineError;
use crate::group::{self, Group, DELETED, EMPTY};
use crate::layout::{self, METADATA_ALIGN};
use crate::probe::{ProbeKind, ProbeSequence};

/// Owns the control-byte array and the bookkeeping (capacity, live count,
/// probing discipline) common to both storage variants. Does not own slot
/// storage; callers pair a `ControlBlock` with their own slot array of the
/// same `capacity`.
pub(crate) struct ControlBlock {
    ctrl: NonNull<u8>,
    capacity: usize,
    len: usize,
    probe_kind: ProbeKind,
}

unsafe impl Send for ControlBlock {}
unsafe impl Sync for ControlBlock {}

fn ctrl_layout(capacity: usize) -> Layout {
    Layout::from_size_align(capacity, METADATA_ALIGN)
        .expect("capacity overflow computing control array layout")
}

impl ControlBlock {
    /// Allocates a control array for `requested` slots (rounded up per
    /// [`layout::round_capacity`]) filled with `EMPTY`.
    pub(crate) fn with_capacity(requested: usize, probe_kind: ProbeKind) -> Result<Self, EngineError> {
        let capacity = layout::round_capacity(requested);
        let layout = ctrl_layout(capacity);
        let ptr = unsafe { alloc::alloc(layout) };
        let ctrl = NonNull::new(ptr).ok_or(EngineError::CreateAllocFailure)?;
        unsafe { ptr.write_bytes(EMPTY, capacity) };
        Ok(Self {
            ctrl,
            capacity,
            len: 0,
            probe_kind,
        })
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub(crate) fn group_count(&self) -> usize {
        layout::group_count(self.capacity)
    }

    #[inline]
    pub(crate) fn probe_from(&self, h1: u64) -> ProbeSequence {
        ProbeSequence::new(self.probe_kind, self.group_count(), h1 as usize)
    }

    #[inline]
    pub(crate) fn should_grow(&self) -> bool {
        layout::should_grow(self.len, self.capacity)
    }

    #[inline]
    pub(crate) fn should_shrink(&self) -> bool {
        layout::should_shrink(self.len, self.capacity)
    }

    /// Loads the group of control bytes starting at slot `group_idx * 16`.
    #[inline]
    pub(crate) unsafe fn load_group(&self, group_idx: usize) -> Group {
        Group::load(self.ctrl.as_ptr().add(group_idx * group::WIDTH))
    }

    #[inline]
    pub(crate) unsafe fn ctrl_at(&self, slot: usize) -> u8 {
        *self.ctrl.as_ptr().add(slot)
    }

    #[inline]
    pub(crate) unsafe fn set_ctrl(&mut self, slot: usize, value: u8) {
        *self.ctrl.as_ptr().add(slot) = value;
    }

    /// Marks `slot` as deleted, choosing `EMPTY` if the slot's group already
    /// contains an `EMPTY` byte (safe: the probe-invariant for this group is
    /// already bounded by that byte) or `DELETED` otherwise, so a chain
    /// crossing this group is not broken.
    pub(crate) fn erase_meta(&mut self, slot: usize) {
        let group_idx = slot / group::WIDTH;
        let group = unsafe { self.load_group(group_idx) };
        let new_ctrl = if group.match_empty().any_bit_set() {
            EMPTY
        } else {
            DELETED
        };
        unsafe { self.set_ctrl(slot, new_ctrl) };
        self.len -= 1;
    }

    /// Records a live insertion of fingerprint `h2` at `slot`.
    pub(crate) fn record_insert(&mut self, slot: usize, h2: u8) {
        unsafe { self.set_ctrl(slot, h2) };
        self.len += 1;
    }

    /// Replaces this control block with a freshly allocated, all-`EMPTY`
    /// one of the given capacity, returning the old one so the caller can
    /// walk it while re-inserting into the new slot storage.
    pub(crate) fn replace_with_capacity(
        &mut self,
        new_capacity: usize,
    ) -> Result<ControlBlock, EngineError> {
        let fresh = ControlBlock {
            ctrl: {
                let layout = ctrl_layout(new_capacity);
                let ptr = unsafe { alloc::alloc(layout) };
                let ctrl = NonNull::new(ptr).ok_or(EngineError::RehashAllocFailure)?;
                unsafe { ptr.write_bytes(EMPTY, new_capacity) };
                ctrl
            },
            capacity: new_capacity,
            len: 0,
            probe_kind: self.probe_kind,
        };
        Ok(std::mem::replace(self, fresh))
    }

    /// Iterates the control bytes of `group_idx`, returning a mask of live
    /// slots (complement of empty-or-deleted).
    #[inline]
    pub(crate) unsafe fn live_mask(&self, group_idx: usize) -> crate::bitmask::Bitmask {
        self.load_group(group_idx).match_full()
    }
}

impl Drop for ControlBlock {
    fn drop(&mut self) {
        unsafe { alloc::dealloc(self.ctrl.as_ptr(), ctrl_layout(self.capacity)) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_block_starts_all_empty_and_rounds_capacity() {
        let cb = ControlBlock::with_capacity(10, ProbeKind::Linear).unwrap();
        assert_eq!(cb.capacity(), 32);
        assert_eq!(cb.len(), 0);
        for g in 0..cb.group_count() {
            assert_eq!(unsafe { cb.live_mask(g) }.as_word(), 0);
        }
    }

    #[test]
    fn record_insert_and_erase_track_len() {
        let mut cb = ControlBlock::with_capacity(32, ProbeKind::Linear).unwrap();
        cb.record_insert(5, 0x10);
        assert_eq!(cb.len(), 1);
        assert_eq!(unsafe { cb.ctrl_at(5) }, 0x10);
        cb.erase_meta(5);
        assert_eq!(cb.len(), 0);
        // group 0 had no empties beyond the one we just freed, so it should
        // be marked EMPTY, not DELETED, since the rest of the group was
        // already empty.
        assert_eq!(unsafe { cb.ctrl_at(5) }, EMPTY);
    }
}
