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

//! SWAR (SIMD-within-a-register) fallback for hosts without a 128-bit byte
//! compare. Unlike a `usize`-width word that shrinks the group on 32-bit
//! targets, this backend always treats a group as two 64-bit halves so the
//! produced mask is bit-for-bit identical to the SSE2 backend on every
//! platform, independent of pointer width.

use super::control_bytes::EMPTY;
use super::WIDTH;
use crate::bitmask::Bitmask;

const LO: u64 = 0x0101_0101_0101_0101;
const HI: u64 = 0x8080_8080_8080_8080;

/// A group of 16 control bytes held as two 64-bit SWAR halves.
#[derive(Copy, Clone)]
pub struct Group([u64; 2]);

#[inline]
fn repeat(byte: u8) -> u64 {
    u64::from_ne_bytes([byte; 8])
}

/// For each byte lane, yields `0x80` if the lane's byte equals zero once
/// XORed against the needle, else `0x00`. Classic "has zero byte" trick.
#[inline]
fn half_eq_mask(word: u64, needle: u64) -> u64 {
    let x = word ^ needle;
    x.wrapping_sub(LO) & !x & HI
}

/// For each byte lane, yields `0x80` if the lane's high bit is set, else
/// `0x00`.
#[inline]
fn half_high_bit_mask(word: u64) -> u64 {
    word & HI
}

/// Converts an 8-lane `0x80`/`0x00` mask into an 8-bit packed mask in lane
/// order (lane 0 -> bit 0). Must invert `load`'s `from_ne_bytes` with
/// `to_ne_bytes`, not `to_le_bytes` - on a big-endian host the native-endian
/// load puts memory byte `j` at integer significance `2^(8*(7-j))`, and only
/// `to_ne_bytes` maps that back to output byte (and therefore bit) `j`.
#[inline]
fn pack_half(mask: u64) -> u8 {
    let mut out = 0u8;
    let bytes = mask.to_ne_bytes();
    for (i, b) in bytes.iter().enumerate() {
        if *b != 0 {
            out |= 1 << i;
        }
    }
    out
}

impl Group {
    pub const WIDTH: usize = WIDTH;

    #[inline]
    pub unsafe fn load(ptr: *const u8) -> Self {
        let mut lo = [0u8; 8];
        let mut hi = [0u8; 8];
        core::ptr::copy_nonoverlapping(ptr, lo.as_mut_ptr(), 8);
        core::ptr::copy_nonoverlapping(ptr.add(8), hi.as_mut_ptr(), 8);
        Group([u64::from_ne_bytes(lo), u64::from_ne_bytes(hi)])
    }

    #[inline]
    pub fn match_byte(&self, byte: u8) -> Bitmask {
        let needle = repeat(byte);
        let lo = pack_half(half_eq_mask(self.0[0], needle));
        let hi = pack_half(half_eq_mask(self.0[1], needle));
        // Scalar path needs no endianness fixup: the mask is built directly
        // in slot order above, unlike the movemask-derived SIMD path.
        Bitmask(u16::from(lo) | (u16::from(hi) << 8))
    }

    #[inline]
    pub fn match_empty(&self) -> Bitmask {
        self.match_byte(EMPTY)
    }

    #[inline]
    pub fn match_empty_or_deleted(&self) -> Bitmask {
        let lo = pack_half(half_high_bit_mask(self.0[0]));
        let hi = pack_half(half_high_bit_mask(self.0[1]));
        Bitmask(u16::from(lo) | (u16::from(hi) << 8))
    }

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
