// Display formatting utilities
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

//! Typed formatting helpers.
//!
//! These types create composable formatters for use with [`Display`].
//! Whereas [`Display`] operates on data owned by the type implementing it,
//!   these formatters compose into functions that operate on data provided
//!   _to_ it.
//!
//! There are two types of wrappers:
//!
//!   - [`DisplayWrapper`] formats objects as atoms; and
//!   - [`ListDisplayWrapper`] maps a [`DisplayWrapper`] to each of its
//!       items and joins them into an English list.
//!
//! ```
//! # use dervish::fmt::*;
//! assert_eq!(TtQuote::wrap("foo").to_string(), "`foo`");
//!
//! assert_eq!(
//!     OrConjList::<TtQuote>::wrap(&["a", "b", "c"]).to_string(),
//!     "`a`, `b`, or `c`",
//! );
//!
//! assert_eq!(
//!     AndConjList::<Raw>::wrap(&["toil", "trouble"]).to_string(),
//!     "toil and trouble",
//! );
//! ```

use std::{
    fmt::{Display, Formatter, Result},
    marker::PhantomData,
};

/// Wrapper for a [`Display`]-able type.
pub trait DisplayWrapper {
    /// Transform inner data and output using the provided [`Formatter`].
    fn fmt<T: Display>(inner: T, f: &mut Formatter) -> Result;

    /// Associate data with a [`DisplayWrapper`] for rendering using
    ///   [`Display`].
    fn wrap<T: Display>(inner: T) -> Wrap<Self, T> {
        Wrap {
            inner,
            _phantom: Default::default(),
        }
    }
}

/// Wrapper with associated data.
pub struct Wrap<W: DisplayWrapper + ?Sized, T: Display> {
    inner: T,
    _phantom: PhantomData<W>,
}

impl<W: DisplayWrapper, T: Display> Display for Wrap<W, T> {
    fn fmt(&self, f: &mut Formatter) -> Result {
        W::fmt(&self.inner, f)
    }
}

/// Echo data as-is without any wrapping.
pub struct Raw;

impl DisplayWrapper for Raw {
    fn fmt<T: Display>(inner: T, f: &mut Formatter) -> Result {
        inner.fmt(f)
    }
}

/// Quote text that would conventionally be typeset in a monospace font.
///
/// This is the convention used for names and literals in error messages,
///   e.g. "unexpected element `foo`".
pub struct TtQuote;

impl DisplayWrapper for TtQuote {
    fn fmt<T: Display>(inner: T, f: &mut Formatter) -> Result {
        write!(f, "`{inner}`")
    }
}

/// Wrap each item of a list in `W` and join them into an English list
///   using a conjunction.
pub trait ListDisplayWrapper {
    /// Conjunction preceding the final item.
    const CONJ: &'static str;

    /// Per-item wrapper.
    type Item: DisplayWrapper;

    fn fmt<T: Display>(list: &[T], f: &mut Formatter) -> Result {
        let n = list.len();

        for (i, item) in list.iter().enumerate() {
            match (i, n) {
                (0, _) => (),
                (_, 2) => write!(f, " {} ", Self::CONJ)?,
                (i, n) if i == n - 1 => write!(f, ", {} ", Self::CONJ)?,
                _ => f.write_str(", ")?,
            }

            <Self::Item as DisplayWrapper>::fmt(item, f)?;
        }

        Ok(())
    }

    fn wrap<T: Display>(list: &[T]) -> ListWrap<'_, Self, T> {
        ListWrap {
            list,
            _phantom: Default::default(),
        }
    }
}

/// A list with an associated [`ListDisplayWrapper`].
pub struct ListWrap<'a, W: ListDisplayWrapper + ?Sized, T: Display> {
    list: &'a [T],
    _phantom: PhantomData<W>,
}

impl<'a, W: ListDisplayWrapper, T: Display> Display for ListWrap<'a, W, T> {
    fn fmt(&self, f: &mut Formatter) -> Result {
        W::fmt(self.list, f)
    }
}

/// Disjunctive list (`a, b, or c`).
pub struct OrConjList<W: DisplayWrapper>(PhantomData<W>);

impl<W: DisplayWrapper> ListDisplayWrapper for OrConjList<W> {
    const CONJ: &'static str = "or";
    type Item = W;
}

/// Conjunctive list (`a, b, and c`).
pub struct AndConjList<W: DisplayWrapper>(PhantomData<W>);

impl<W: DisplayWrapper> ListDisplayWrapper for AndConjList<W> {
    const CONJ: &'static str = "and";
    type Item = W;
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn conj_list_lengths() {
        let empty: [&str; 0] = [];

        assert_eq!("", OrConjList::<Raw>::wrap(&empty).to_string());
        assert_eq!("a", OrConjList::<Raw>::wrap(&["a"]).to_string());
        assert_eq!("a or b", OrConjList::<Raw>::wrap(&["a", "b"]).to_string());
        assert_eq!(
            "a, b, and c",
            AndConjList::<Raw>::wrap(&["a", "b", "c"]).to_string()
        );
    }

    #[test]
    fn quoted_items() {
        assert_eq!(
            "`x` and `y`",
            AndConjList::<TtQuote>::wrap(&["x", "y"]).to_string()
        );
    }
}
