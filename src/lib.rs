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

//! An open-addressed, SIMD-accelerated hash table engine in the Swiss-table
//! family.
//!
//! Entries live in groups of 16 slots, each with a companion control byte;
//! lookups, insertions, and deletions scan a whole group at a time with a
//! 128-bit compare where the target supports it, falling back to an
//! identical scalar scan otherwise. Two storage disciplines sit on top of
//! the shared group-scan core:
//!
//! - [`InlineTable`] copies fixed-size key/value byte blobs into memory the
//!   table owns, for workloads that want a C-library-style `(key_sz,
//!   value_sz)` contract rather than a generic Rust type.
//! - [`RefTable`] holds borrowed handles to externally-owned keys and
//!   values, driven by caller-supplied [`RefCallbacks`].
//!
//! Both variants are single-threaded: wrap a table in your own
//! synchronization if it needs to cross threads.

mod bitmask;
mod error;
mod group;
mod hash;
mod inline;
mod iter;
mod layout;
mod probe;
mod raw;
mod refmap;

pub use bitmask::{Bitmask, BitmaskIterator};
pub use error::{EngineError, EngineResult};
pub use hash::{HashStrategy, KeyKind};
pub use inline::InlineTable;
pub use probe::ProbeKind;
pub use refmap::{RefCallbacks, RefTable};

#[cfg(test)]
mod integration_tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::collections::HashMap;

    /// Drives several thousand mixed insert/emplace/delete operations
    /// against both the inline engine and a `HashMap` oracle, checking they
    /// stay in agreement after every operation and across every resize
    /// boundary crossed.
    #[test]
    fn inline_table_matches_hashmap_oracle_under_random_ops() {
        let mut rng = StdRng::seed_from_u64(0xC0FFEE);
        let mut table = InlineTable::create(4, 4, 4).unwrap();
        let mut oracle: HashMap<i32, i32> = HashMap::new();

        for _ in 0..6000 {
            let key = rng.gen_range(0..500);
            let value = rng.gen_range(0..i32::MAX);
            match rng.gen_range(0..3) {
                0 => {
                    let prev = table.insert(&key.to_ne_bytes(), &value.to_ne_bytes()).unwrap();
                    let expected = oracle.get(&key).map(|v| v.to_ne_bytes().to_vec());
                    assert_eq!(prev, expected);
                    oracle.entry(key).or_insert(value);
                }
                1 => {
                    table.emplace(&key.to_ne_bytes(), &value.to_ne_bytes()).unwrap();
                    oracle.insert(key, value);
                }
                _ => {
                    let result = table.delete(&key.to_ne_bytes());
                    if oracle.remove(&key).is_some() {
                        assert!(result.is_ok());
                    } else {
                        assert_eq!(result.unwrap_err(), EngineError::EntryNotExists);
                    }
                }
            }
            assert_eq!(table.len(), oracle.len());
            assert!(table.capacity().is_power_of_two());
            assert!(table.capacity() >= 32);
        }

        for (k, v) in &oracle {
            let found = table.search(&k.to_ne_bytes()).unwrap();
            assert_eq!(i32::from_ne_bytes(found.try_into().unwrap()), *v);
        }
    }
}
