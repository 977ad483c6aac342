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

#[cfg(target_arch = "x86")]
use core::arch::x86;
#[cfg(target_arch = "x86_64")]
use core::arch::x86_64 as x86;

use super::control_bytes::EMPTY;
use super::WIDTH;
use crate::bitmask::Bitmask;

/// A group of 16 control bytes held in a single SSE2 vector register.
#[derive(Copy, Clone)]
pub struct Group(x86::__m128i);

#[cfg(target_endian = "big")]
#[inline]
fn reverse(mask: u16) -> u16 {
    mask.reverse_bits()
}

#[cfg(target_endian = "little")]
#[inline]
fn reverse(mask: u16) -> u16 {
    // movemask already numbers lane 0 as the low bit on little-endian hosts.
    mask
}

impl Group {
    pub const WIDTH: usize = WIDTH;

    /// Loads a group of control bytes starting at `ptr`. `ptr` does not need
    /// to be aligned, but the caller must guarantee `WIDTH` readable bytes.
    #[inline]
    pub unsafe fn load(ptr: *const u8) -> Self {
        Group(x86::_mm_loadu_si128(ptr as *const _))
    }

    /// Returns a mask of slots whose control byte equals `byte` exactly.
    #[inline]
    pub fn match_byte(&self, byte: u8) -> Bitmask {
        unsafe {
            let cmp = x86::_mm_cmpeq_epi8(self.0, x86::_mm_set1_epi8(byte as i8));
            Bitmask(reverse(x86::_mm_movemask_epi8(cmp) as u16))
        }
    }

    /// Returns a mask of `EMPTY` slots.
    #[inline]
    pub fn match_empty(&self) -> Bitmask {
        self.match_byte(EMPTY)
    }

    /// Returns a mask of slots that are `EMPTY` or `DELETED` (high bit set).
    #[inline]
    pub fn match_empty_or_deleted(&self) -> Bitmask {
        unsafe {
            // A byte is EMPTY or DELETED iff its high bit is set, i.e. iff the
            // byte is negative when read as i8 - exactly what movemask
            // extracts (the sign bit of each lane), so no comparison needed.
            Bitmask(reverse(x86::_mm_movemask_epi8(self.0) as u16))
        }
    }

    /// Returns a mask of live (full) slots: the complement of
    /// [`Group::match_empty_or_deleted`].
    #[inline]
    pub fn match_full(&self) -> Bitmask {
        Bitmask(!self.match_empty_or_deleted().as_word())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group::control_bytes::{DELETED, EMPTY as E};

    #[test]
    fn match_byte_finds_fingerprint() {
        let mut meta = [E; Group::WIDTH];
        meta[4] = 0x2a;
        meta[11] = 0x2a;
        let g = unsafe { Group::load(meta.as_ptr()) };
        let hits: Vec<usize> = g.match_byte(0x2a).into_iter().collect();
        assert_eq!(hits, vec![4, 11]);
    }

    #[test]
    fn match_empty_sees_every_empty_slot() {
        let meta = [E; Group::WIDTH];
        let g = unsafe { Group::load(meta.as_ptr()) };
        assert_eq!(g.match_empty().as_word(), 0xFFFF);
        assert_eq!(g.match_full().as_word(), 0);
    }

    #[test]
    fn high_bit_mask_matches_deleted_and_empty_only() {
        let mut meta = [0x05u8; Group::WIDTH];
        meta[2] = DELETED;
        meta[9] = E;
        let g = unsafe { Group::load(meta.as_ptr()) };
        let hits: Vec<usize> = g.match_empty_or_deleted().into_iter().collect();
        assert_eq!(hits, vec![2, 9]);
    }
}
