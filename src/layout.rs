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

//! Capacity rounding and load-factor thresholds.
//!
//! Capacity is always a power of two and at least [`MIN_CAPACITY`] (two
//! groups of 16). Grow triggers past ~85% load, shrink below ~40%.

use crate::group::{MIN_CAPACITY, WIDTH};

/// Rounds `requested` up to the next power of two, floored at
/// [`MIN_CAPACITY`].
pub fn round_capacity(requested: usize) -> usize {
    let requested = requested.max(MIN_CAPACITY);
    requested.next_power_of_two()
}

/// Number of groups for a given capacity. `capacity` must be a multiple of
/// [`WIDTH`] (guaranteed by [`round_capacity`]).
#[inline]
pub fn group_count(capacity: usize) -> usize {
    debug_assert_eq!(capacity % WIDTH, 0);
    capacity / WIDTH
}

/// Grow threshold: `capacity - capacity/8`, i.e. exactly 87.5% rounded down,
/// the same integer approximation of "85%" the original C macro
/// `EXACTLY_85_PERCENT` uses.
#[inline]
pub fn grow_threshold(capacity: usize) -> usize {
    capacity - (capacity >> 3)
}

/// Shrink threshold: `capacity * 409 / 1024`, an integer approximation of
/// 40% (`APPROX_40_PERCENT` in the original source).
#[inline]
pub fn shrink_threshold(capacity: usize) -> usize {
    (capacity * 409) >> 10
}

/// Whether `entries` at `capacity` calls for a grow to double capacity.
#[inline]
pub fn should_grow(entries: usize, capacity: usize) -> bool {
    entries > grow_threshold(capacity)
}

/// Whether `entries` at `capacity` calls for a shrink to half capacity,
/// bounded below by [`MIN_CAPACITY`].
#[inline]
pub fn should_shrink(entries: usize, capacity: usize) -> bool {
    capacity > MIN_CAPACITY && entries < shrink_threshold(capacity)
}

/// Metadata arrays are allocated at this alignment: large enough for a
/// 128-bit SIMD load, and a multiple of the group width, which matters on
/// platforms whose allocator demands `size % align == 0`.
pub const METADATA_ALIGN: usize = 32;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_small_request_up_to_floor() {
        assert_eq!(round_capacity(10), 32);
        assert_eq!(round_capacity(0), 32);
        assert_eq!(round_capacity(4), 32);
    }

    #[test]
    fn rounds_to_next_power_of_two_above_floor() {
        assert_eq!(round_capacity(33), 64);
        assert_eq!(round_capacity(64), 64);
        assert_eq!(round_capacity(65), 128);
    }

    #[test]
    fn grow_and_shrink_thresholds_bracket_load_factor() {
        assert_eq!(grow_threshold(32), 28);
        assert!(should_grow(29, 32));
        assert!(!should_grow(28, 32));
        assert_eq!(shrink_threshold(64), 25);
        assert!(should_shrink(24, 64));
        assert!(!should_shrink(25, 64));
        assert!(!should_shrink(5, 32));
    }
}
