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

//! Error codes returned by the fallible entry points of the engine.
//!
//! Absence on search and "entry already present" on insert are not modelled
//! here; those are ordinary return values (`Option`/existing-value), not
//! errors. This mirrors the distinction the original C contract draws
//! between `HASH_*` status codes and plain NULL/non-NULL returns.

use core::fmt;

/// Failure modes for table construction and mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum EngineError {
    /// A caller supplied a zero size, a null pointer where one is disallowed,
    /// or otherwise malformed construction arguments.
    InvalidArgument = 2,
    /// Allocation of the slot or metadata array failed while creating a table.
    CreateAllocFailure = 3,
    /// Allocation of the slot or metadata array failed while growing or
    /// shrinking an existing table. The table is left at its pre-resize
    /// capacity and remains fully usable.
    RehashAllocFailure = 4,
    /// The requested key does not exist in the table (delete-only).
    EntryNotExists = 5,
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Self::InvalidArgument => "invalid argument",
            Self::CreateAllocFailure => "allocation failed while creating table",
            Self::RehashAllocFailure => "allocation failed while resizing table",
            Self::EntryNotExists => "entry does not exist",
        };
        f.write_str(msg)
    }
}

impl std::error::Error for EngineError {}

pub type EngineResult<T> = Result<T, EngineError>;
