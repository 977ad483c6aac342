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

//! Group-oriented iteration cursor shared by both storage variants.
//!
//! A cursor is `{state, group index, residual mask}`. Forward iteration
//! walks groups upward, backward iteration walks them downward; either
//! direction rescans a group's live mask only when its residual is
//! exhausted. Any mutation (insert/delete/resize) invalidates a cursor; the
//! owning table resets its cursor to [`SlotCursor::invalid`] whenever it
//! mutates, so a caller who keeps iterating after a mutation simply sees
//! iteration stop rather than reading stale bits.

use crate::bitmask::Bitmask;
use crate::group::WIDTH;
use crate::raw::ControlBlock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Invalid,
    Active,
}

/// Forward/backward walk state over live slots, one group at a time.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SlotCursor {
    state: State,
    group: usize,
    residual: Bitmask,
}

impl SlotCursor {
    pub(crate) fn invalid() -> Self {
        Self {
            state: State::Invalid,
            group: 0,
            residual: Bitmask::empty(),
        }
    }

    /// Positions at the first live slot, scanning groups forward from 0.
    pub(crate) fn start(ctrl: &ControlBlock) -> Self {
        let mut cursor = Self::invalid();
        let group_count = ctrl.group_count();
        let mut g = 0;
        while g < group_count {
            let mask = unsafe { ctrl.live_mask(g) };
            if mask.any_bit_set() {
                cursor.state = State::Active;
                cursor.group = g;
                cursor.residual = mask;
                return cursor;
            }
            g += 1;
        }
        cursor
    }

    /// Positions at the last live slot, scanning groups backward from the
    /// final group.
    pub(crate) fn end(ctrl: &ControlBlock) -> Self {
        let mut cursor = Self::invalid();
        let group_count = ctrl.group_count();
        if group_count == 0 {
            return cursor;
        }
        let mut g = group_count;
        while g > 0 {
            g -= 1;
            let mask = unsafe { ctrl.live_mask(g) };
            if mask.any_bit_set() {
                cursor.state = State::Active;
                cursor.group = g;
                cursor.residual = mask;
                return cursor;
            }
        }
        cursor
    }

    /// The currently-selected live slot index, if the cursor is active.
    pub(crate) fn current_slot(&self) -> Option<usize> {
        if self.state != State::Active {
            return None;
        }
        self.residual.lowest_set_bit().map(|offset| self.group * WIDTH + offset)
    }

    /// Consumes the current slot and advances to the next live one,
    /// walking groups forward as the residual empties.
    pub(crate) fn advance_forward(&mut self, ctrl: &ControlBlock) {
        if self.state != State::Active {
            return;
        }
        self.residual.remove_lowest_bit();
        if self.residual.any_bit_set() {
            return;
        }
        let group_count = ctrl.group_count();
        let mut g = self.group + 1;
        while g < group_count {
            let mask = unsafe { ctrl.live_mask(g) };
            if mask.any_bit_set() {
                self.group = g;
                self.residual = mask;
                return;
            }
            g += 1;
        }
        self.state = State::Invalid;
    }

    /// Consumes the current slot and advances to the previous live one,
    /// walking groups backward as the residual empties.
    pub(crate) fn advance_backward(&mut self, ctrl: &ControlBlock) {
        if self.state != State::Active {
            return;
        }
        self.residual.remove_lowest_bit();
        if self.residual.any_bit_set() {
            return;
        }
        let mut g = self.group;
        while g > 0 {
            g -= 1;
            let mask = unsafe { ctrl.live_mask(g) };
            if mask.any_bit_set() {
                self.group = g;
                self.residual = mask;
                return;
            }
        }
        self.state = State::Invalid;
    }
}
