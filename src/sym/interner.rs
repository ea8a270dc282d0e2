// String interners
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

//! Interners used to intern values as symbols.
//!
//! See the [parent module](super) for more information.
//!
//! Using Interners Directly (Without Global State)
//! ===============================================
//! Please do not do this unless you have a compelling use case;
//!   symbols from different interners are indistinguishable from one
//!   another and mixing them will silently produce garbage.
//!
//! ```
//! use dervish::sym::{DefaultInterner, Interner};
//!
//! // Interners employ interior mutability and so do not need to be
//! // declared `mut`
//! let interner = DefaultInterner::new();
//!
//! let (ia, ib, ic) = (
//!     interner.intern("foo"),
//!     interner.intern(&"foo".to_string()),
//!     interner.intern("foobar"),
//! );
//!
//! assert_eq!(ia, ib);
//! assert_ne!(ia, ic);
//!
//! assert_eq!(2, interner.len());
//! assert_eq!("foo", interner.index_lookup(ia).unwrap());
//! ```

use super::SymbolId;
use crate::global;
use bumpalo::Bump;
use fxhash::FxBuildHasher;
use std::cell::RefCell;
use std::collections::HashMap;
use std::hash::BuildHasher;
use std::str::Utf8Error;

/// Create, store, compare, and retrieve interned values.
///
/// Interners accept string slices and produce values of type [`SymbolId`].
/// The same [`SymbolId`] will always be returned for a given string,
///   allowing symbols to be compared for equality cheaply by comparing
///   integers.
/// Symbol locations in memory are fixed for the lifetime of the interner.
pub trait Interner<'i> {
    /// Intern a string slice or return an existing [`SymbolId`].
    fn intern(&self, value: &str) -> SymbolId;

    /// Retrieve an existing intern for the provided string slice without
    ///   interning it.
    fn intern_soft(&self, value: &str) -> Option<SymbolId>;

    /// Determine whether the given value has already been interned.
    fn contains(&self, value: &str) -> bool {
        self.intern_soft(value).is_some()
    }

    /// Number of interned strings in this interner's pool.
    fn len(&self) -> usize;

    /// Look up a symbol's string value by its [`SymbolId`].
    ///
    /// If the index was not produced by this interner,
    ///   the result is [`None`].
    fn index_lookup(&'i self, index: SymbolId) -> Option<&'i str>;

    /// Intern a slice of bytes,
    ///   failing if it is not valid UTF-8.
    ///
    /// If the slice has already been interned,
    ///   then the UTF-8 check still occurs;
    ///     we do not want a non-UTF-8 slice to sneak by simply because
    ///     its bytes happen to hash to an existing entry.
    fn intern_utf8<'a>(
        &self,
        value: &'a [u8],
    ) -> Result<SymbolId, (Utf8Error, &'a [u8])> {
        std::str::from_utf8(value)
            .map(|s| self.intern(s))
            .map_err(|e| (e, value))
    }
}

/// An interner backed by an [arena](bumpalo).
///
/// Since all symbols exist until the interner itself is freed,
///   an arena is a much more efficient and appropriate memory allocation
///   strategy.
/// This also provides a stable location in memory for symbol data.
pub struct ArenaInterner<'i, S = FxBuildHasher>
where
    S: BuildHasher + Default,
{
    /// Storage for interned strings.
    arena: Bump,

    /// Interned strings by [`SymbolId`].
    ///
    /// The first index is always populated during initialization to
    ///   ensure that [`SymbolId`] will never be `0`.
    strings: RefCell<Vec<&'i str>>,

    /// Map of interned strings to their respective [`SymbolId`].
    map: RefCell<HashMap<&'i str, SymbolId, S>>,
}

impl<'i, S> ArenaInterner<'i, S>
where
    S: BuildHasher + Default,
{
    #[inline]
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Initialize a new interner with an initial capacity for the
    ///   underlying [`HashMap`].
    ///
    /// The given `capacity` has no effect on arena allocation.
    pub fn with_capacity(capacity: usize) -> Self {
        let mut strings = Vec::<_>::with_capacity(capacity + 1);

        // The first index is not used since SymbolId cannot be 0.
        strings.push("");

        Self {
            arena: Bump::new(),
            strings: RefCell::new(strings),
            map: RefCell::new(HashMap::with_capacity_and_hasher(
                capacity,
                Default::default(),
            )),
        }
    }

    fn copy_slice_into_arena(&self, value: &str) -> &'i str {
        // SAFETY: The arena lives as long as `self`,
        //   and strings are never removed from it;
        //     `'i` cannot outlive the interner for the global interners,
        //     which are never freed.
        unsafe { &*(self.arena.alloc_str(value) as *const str) }
    }
}

impl<'i, S> Default for ArenaInterner<'i, S>
where
    S: BuildHasher + Default,
{
    fn default() -> Self {
        Self::with_capacity(global::INIT_GLOBAL_INTERNER_CAPACITY)
    }
}

impl<'i, S> Interner<'i> for ArenaInterner<'i, S>
where
    S: BuildHasher + Default,
{
    fn intern(&self, value: &str) -> SymbolId {
        let mut map = self.map.borrow_mut();

        if let Some(sym) = map.get(value) {
            return *sym;
        }

        let mut syms = self.strings.borrow_mut();

        let id = SymbolId::from_index(syms.len())
            .expect("internal error: SymbolId range exhausted");
        let clone = self.copy_slice_into_arena(value);

        map.insert(clone, id);
        syms.push(clone);

        id
    }

    #[inline]
    fn intern_soft(&self, value: &str) -> Option<SymbolId> {
        self.map.borrow().get(value).copied()
    }

    #[inline]
    fn len(&self) -> usize {
        self.map.borrow().len()
    }

    fn index_lookup(&'i self, index: SymbolId) -> Option<&'i str> {
        self.strings.borrow().get(index.as_usize()).copied()
    }
}

/// Recommended [`Interner`] and configuration.
///
/// This uses the [Fx Hash][fxhash] hashing function,
///   with the assumption that denial-of-service attacks against the hash
///   function are not a concern for a validator.
pub type DefaultInterner<'i> = ArenaInterner<'i, FxBuildHasher>;
