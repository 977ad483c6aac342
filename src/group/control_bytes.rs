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

//! Metadata byte states and the H1/H2 hash split.

/// Slot has never held an entry, or was vacated by a delete that could
/// downgrade it straight to empty (see [`crate::group::control_bytes`]
/// delete-path notes in the engine). Probing along a chain always stops at
/// the first `EMPTY` byte it crosses.
pub const EMPTY: u8 = 0xFF;

/// Slot held an entry that was deleted, but downgrading it to `EMPTY` would
/// have broken a probe chain passing through this group. Probing treats a
/// tombstone exactly like a live-but-mismatched slot: keep scanning.
pub const DELETED: u8 = 0x80;

/// Mask for the 7 fingerprint bits of a live control byte.
pub const H2_MASK: u64 = 0x7F;

/// Number of bits of the hash consumed by the `H2` fingerprint; the rest
/// become `H1`.
pub const H1_SHIFT: u32 = 7;

/// Minimum number of slots a table may have. Equal to two groups; below
/// this the load-factor math and the probe-invariant's termination
/// guarantee both break down.
pub const MIN_CAPACITY: usize = 32;

/// Splits a 64-bit hash into `(h1, h2)`: `h1` selects the home group, `h2`
/// (0..=0x7F) becomes the control byte stored for a live slot.
#[inline]
pub fn h1_h2(hash: u64) -> (u64, u8) {
    (hash >> H1_SHIFT, (hash & H2_MASK) as u8)
}
