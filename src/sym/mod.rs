// String internment
//
//  Copyright (C) 2014-2022 Ryan Specialty Group, LLC.
//
//  This file is part of Dervish.
//
//  This program is free software: you can redistribute it and/or modify
//  it under the terms of the GNU General Public License as published by
//  the Free Software Foundation, either version 3 of the License, or
//  (at your option) any later version.
//
//  This program is distributed in the hope that it will be useful,
//  but WITHOUT ANY WARRANTY; without even the implied warranty of
//  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
//  GNU General Public License for more details.
//
//  You should have received a copy of the GNU General Public License
//  along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! String internment system.
//!
//! Interned strings are represented by [`SymbolId`],
//!   which is a cheap [`Copy`] integer that compares equal if and only if
//!   the strings it represents are equal.
//! Names,
//!   attribute values,
//!   text runs,
//!   and file paths are all interned.
//! This is what allows grammar expressions to be small [`Copy`] values
//!   that can be hashed and compared cheaply,
//!     which the expression pool relies upon for hash-consing
//!     (see [`crate::expr`]).
//!
//! Global Interner
//! ===============
//! Symbols are so pervasive that passing an interner around would be a
//!   burden.
//! A global, thread-local interner is therefore provided,
//!   accessible via the [`GlobalSymbolIntern`] and [`GlobalSymbolResolve`]
//!   traits:
//!
//! ```
//! use dervish::sym::{GlobalSymbolIntern, GlobalSymbolResolve};
//!
//! let foo = "foo".intern();
//!
//! assert_eq!(foo, "foo".intern());
//! assert_ne!(foo, "bar".intern());
//! assert_eq!("foo", foo.lookup_str());
//! ```
//!
//! Symbols are never freed;
//!   the interner lives as long as the thread.
//! Since [`SymbolId`]s are only meaningful to the thread that produced
//!   them,
//!     they must not be sent across threads.

mod interner;
mod symbol;

pub use interner::{ArenaInterner, DefaultInterner, Interner};
pub use symbol::{
    GlobalSymbolIntern, GlobalSymbolInternBytes, GlobalSymbolResolve,
    SymbolId,
};
