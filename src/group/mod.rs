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

//! Group-wide metadata scan primitives.
//!
//! A group is a fixed run of [`WIDTH`] contiguous metadata bytes. Every
//! lookup, insert, and delete boils down to one or two of these scans per
//! group visited. Two backends exist: a 128-bit SIMD backend used whenever
//! the target supports it, and a scalar SWAR backend that produces a
//! bit-for-bit identical mask everywhere else. Unlike the word-size-carrying
//! scalar backend this crate's teacher uses internally, the width here is
//! pinned at 16 on every platform, matching the table's fixed group size.

mod control_bytes;
pub use control_bytes::*;

// The scalar backend is portable and always compiled, both as the fallback
// `Group` on targets without a 128-bit compare and so the cross-check test
// below has something to compare the dispatched backend against.
pub(crate) mod generic;

cfg_if::cfg_if! {
    if #[cfg(all(
        target_feature = "sse2",
        any(target_arch = "x86", target_arch = "x86_64"),
    ))] {
        mod sse2;
        pub use sse2::Group;
    } else {
        pub use generic::Group;
    }
}

/// The number of slots scanned together as a single group.
pub const WIDTH: usize = 16;

#[cfg(test)]
mod tests {
    use super::generic::Group as GenericGroup;
    use super::*;

    // The SIMD backend (when compiled on this host) and the generic backend
    // must always agree bit-for-bit; this runs the generic path directly
    // even when the crate as a whole picked the SIMD `Group` above.
    #[test]
    fn generic_and_dispatched_backend_agree() {
        let mut meta = [EMPTY; WIDTH];
        meta[3] = 0x05;
        meta[9] = DELETED;
        meta[15] = 0x05;

        let dispatched = unsafe { Group::load(meta.as_ptr()) };
        let generic = unsafe { GenericGroup::load(meta.as_ptr()) };

        assert_eq!(
            dispatched.match_byte(0x05).as_word(),
            generic.match_byte(0x05).as_word()
        );
        assert_eq!(
            dispatched.match_empty().as_word(),
            generic.match_empty().as_word()
        );
        assert_eq!(
            dispatched.match_empty_or_deleted().as_word(),
            generic.match_empty_or_deleted().as_word()
        );
        assert_eq!(dispatched.match_full().as_word(), generic.match_full().as_word());
    }
}
