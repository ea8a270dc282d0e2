// Symbol representation for interned strings
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

//! Symbol objects representing interned strings.
//!
//! See the [parent module](super) for more information.

use super::{DefaultInterner, Interner};
use crate::global;
use std::convert::TryFrom;
use std::fmt::{Debug, Display};
use std::str::Utf8Error;
use std::thread::LocalKey;

/// Unique symbol identifier produced by an [`Interner`].
///
/// This newtype helps to prevent other indexes from being used where a
///   symbol index is expected.
///
/// The index `0` is never valid,
///   which allows us to have `Option<SymbolId>` at no space cost.
///
/// Symbols allocated using the global interner will automatically resolve
///   to strings via [`Display`].
/// _This should be done at the last moment_ before outputting,
///   such as before displaying an error to the user.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SymbolId(global::NonZeroSymSize);
assert_eq_size!(Option<SymbolId>, SymbolId);

impl SymbolId {
    /// Construct a symbol from an interner index.
    ///
    /// This produces [`None`] if the index is `0` or cannot be represented
    ///   by [`global::SymSize`].
    pub(super) fn from_index(index: usize) -> Option<Self> {
        global::SymSize::try_from(index)
            .ok()
            .and_then(global::NonZeroSymSize::new)
            .map(Self)
    }

    pub fn as_usize(self) -> usize {
        self.0.get() as usize
    }
}

type StaticInterner = DefaultInterner<'static>;

thread_local! {
    static INTERNER: StaticInterner = StaticInterner::default();
}

/// Acquire a static reference to the global interner.
///
/// The global interner is static and thread-local.
/// It is created using the [`thread_local!`] macro,
///   which produces a [`LocalKey`] that provides access with a lifetime
///     that cannot exceed that of the closure.
/// This is a problem,
///   because we must return a value from the interner's storage.
///
/// This function transmutes the lifetime of [`LocalKey`] back to
///   `'static`.
/// This is expected to be safe because the thread-local storage is never
///   deallocated before the thread exits,
///     and the storage is only accessible to one thread.
fn with_static_interner<F, R>(key: &'static LocalKey<StaticInterner>, f: F) -> R
where
    F: FnOnce(&'static StaticInterner) -> R,
{
    key.with(|interner| {
        f(unsafe {
            std::mem::transmute::<&StaticInterner, &'static StaticInterner>(
                interner,
            )
        })
    })
}

/// Resolve a [`SymbolId`] to the string value it represents using the
///   global interner.
///
/// This exists as its own trait
///   (rather than simply adding to [`SymbolId`])
///   to make it easy to see what systems rely on global state.
pub trait GlobalSymbolResolve {
    /// Resolve a [`SymbolId`] allocated using the global interner.
    ///
    /// Panics
    /// ======
    /// This will panic if the symbol cannot be found,
    ///   which would represent a bug in the program
    ///     (e.g. a symbol sent from another thread).
    fn lookup_str(&self) -> &'static str;

    /// Attempt to resolve a [`SymbolId`] allocated using the global
    ///   interner.
    ///
    /// Unlike [`GlobalSymbolResolve::lookup_str`],
    ///   this cannot panic.
    fn try_lookup_str(&self) -> Option<&'static str>;
}

impl GlobalSymbolResolve for SymbolId {
    fn lookup_str(&self) -> &'static str {
        self.try_lookup_str().unwrap_or_else(|| {
            panic!(
                "internal error: failed to resolve SymbolId({}) using \
                   global interner",
                self.0
            )
        })
    }

    fn try_lookup_str(&self) -> Option<&'static str> {
        with_static_interner(&INTERNER, |interner| {
            interner.index_lookup(*self)
        })
    }
}

impl Display for SymbolId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.lookup_str())
    }
}

impl Debug for SymbolId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // This may be called during a panic,
        //   and we don't want to panic yet again if we cannot find the
        //   symbol.
        write!(
            f,
            "SymbolId({} {:?})",
            self.0,
            self.try_lookup_str().unwrap_or("<#!UNKNOWN_SYMBOL>")
        )
    }
}

/// Intern a string using the global interner.
///
/// This provides a convenient API that creates the appearance that string
///   interning is a core Rust language feature
///   (e.g. `"foo".intern()`).
pub trait GlobalSymbolIntern {
    fn intern(self) -> SymbolId;
}

/// Intern a byte slice using the global interner,
///   failing if the slice is not valid UTF-8.
pub trait GlobalSymbolInternBytes
where
    Self: Sized,
{
    fn intern_utf8(self) -> Result<SymbolId, (Utf8Error, Self)>;
}

impl GlobalSymbolIntern for &str {
    fn intern(self) -> SymbolId {
        with_static_interner(&INTERNER, |interner| interner.intern(self))
    }
}

impl GlobalSymbolInternBytes for &[u8] {
    fn intern_utf8(self) -> Result<SymbolId, (Utf8Error, Self)> {
        with_static_interner(&INTERNER, |interner| interner.intern_utf8(self))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn copy_compares_equal() {
        let sym = "copy".intern();
        let cpy = sym;

        assert_eq!(sym, cpy);
    }

    #[test]
    fn str_intern_uses_global_interner() {
        // This creates the illusion of a core Rust language feature
        let sym = "foo".intern();

        assert_eq!("foo", sym.lookup_str());
        assert_eq!(sym, "foo".intern());

        INTERNER.with(|interner| {
            assert_eq!(
                sym,
                interner.intern("foo"),
                "GlobalSymbolIntern<&str>::intern must use the global interner"
            );
        });
    }

    #[test]
    fn bytes_intern_to_same_symbol_as_str() {
        let sym = b"bytes".as_slice().intern_utf8().unwrap();

        assert_eq!("bytes".intern(), sym);
    }

    #[test]
    fn display_resolves_string() {
        assert_eq!("display me", "display me".intern().to_string());
    }
}
