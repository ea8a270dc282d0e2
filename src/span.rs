// Source spans
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

//! Mapping to source input byte intervals.
//!
//! A [`Span`] is a byte interval within some [`Context`],
//!   which is usually the path of a source file.
//! Every token produced by the [XIR reader](crate::xir::reader) carries a
//!   span,
//!     and every validity error carries the span of the token that caused
//!     it,
//!       so that the [diagnostic system](crate::diagnose) can point the
//!       user at the offending source text.
//!
//! Spans are small and [`Copy`];
//!   the context is an interned path.
//! Resolving a span into lines and columns is expensive and is deferred
//!   until a diagnostic is actually rendered.

use crate::{
    global,
    sym::{GlobalSymbolResolve, SymbolId},
};
use std::{convert::TryInto, fmt::Display, path::Path};

/// Size of a [`Span`]'s `offset` field.
pub type SpanOffsetSize = global::SourceFileSize;

/// Size of a [`Span`]'s `len` field.
pub type SpanLenSize = global::FrontendTokenLength;

/// Description of a source location and byte interval for some object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    /// Context onto which byte offsets are mapped,
    ///   such as a source file.
    ctx: Context,

    /// Starting 0-indexed byte position, inclusive.
    offset: SpanOffsetSize,

    /// Token length (ending byte offset - `offset`).
    len: SpanLenSize,
}

impl Span {
    pub fn new<C: Into<Context>>(
        offset: SpanOffsetSize,
        len: SpanLenSize,
        ctx: C,
    ) -> Self {
        Self {
            ctx: ctx.into(),
            offset,
            len,
        }
    }

    pub fn offset(&self) -> SpanOffsetSize {
        self.offset
    }

    pub fn len(&self) -> SpanLenSize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn context(&self) -> Context {
        self.ctx
    }

    /// Offset of the byte immediately following the span.
    pub fn end_offset(&self) -> SpanOffsetSize {
        self.offset.saturating_add(self.len)
    }

    /// Produce a span covering both `self` and `other`.
    ///
    /// If the spans are in different contexts,
    ///   there is nothing sensible to produce and the result is [`None`].
    pub fn merge(self, other: Span) -> Option<Span> {
        if self.ctx != other.ctx {
            return None;
        }

        let start = self.offset.min(other.offset);
        let end = self.end_offset().max(other.end_offset());

        Some(Span::new(start, end - start, self.ctx))
    }
}

impl Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{} offset {}-{}]",
            self.ctx,
            self.offset,
            self.end_offset()
        )
    }
}

/// A placeholder span indicating that a span is expected but is not
///   known.
pub const UNKNOWN_SPAN: Span = UNKNOWN_CONTEXT.span(0, 0);

/// Context for byte offsets (e.g. a source file).
///
/// A context is lifetime-free and [`Copy`]-able,
///   with the assumption that an interned path will only need to be
///   resolved to its underlying value in a diagnostic context.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub struct Context(Option<SymbolId>);

impl Context {
    /// Produce a [`Span`] within the given context.
    #[inline]
    pub const fn span(self, offset: SpanOffsetSize, len: SpanLenSize) -> Span {
        Span {
            ctx: self,
            offset,
            len,
        }
    }

    /// Attempt to produce a [`Span`] of the given length at the given
    ///   offset,
    ///     otherwise fall back to a `(0,0)` (ZZ) span.
    ///
    /// If the offset cannot be stored,
    ///   then the length will always be `0` even if it could otherwise be
    ///   represented;
    ///     `(0,0)` indicates no span,
    ///       whereas `(0,N)` would indicate a span of length `N` at
    ///       offset `0`,
    ///         which would not be true.
    ///
    /// Spans are intended to be informative;
    ///   for very large files it is better to provide _some_ information
    ///   than to bail out with an error.
    #[inline]
    pub fn span_or_zz(self, offset: usize, len: usize) -> Span {
        match offset.try_into() {
            Ok(offset) => self.span(offset, len.try_into().unwrap_or(0)),
            Err(_) => self.span(0, 0),
        }
    }

    /// The interned path of this context,
    ///   if known.
    pub fn path_sym(&self) -> Option<SymbolId> {
        self.0
    }
}

/// A placeholder context indicating that a context is expected but is not
///   known.
pub const UNKNOWN_CONTEXT: Context = Context(None);

impl From<SymbolId> for Context {
    fn from(sym: SymbolId) -> Self {
        Self(Some(sym))
    }
}

impl Display for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            Some(sym) => sym.fmt(f),
            None => f.write_str("<unknown>"),
        }
    }
}

impl AsRef<Path> for Context {
    fn as_ref(&self) -> &Path {
        Path::new(self.0.map(|sym| sym.lookup_str()).unwrap_or(""))
    }
}

#[cfg(test)]
pub mod dummy {
    //! Spans for use in tests.

    use super::*;

    pub const DUMMY_CONTEXT: Context = UNKNOWN_CONTEXT;
    pub const DUMMY_SPAN: Span = DUMMY_CONTEXT.span(0, 0);
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::sym::GlobalSymbolIntern;

    #[test]
    fn span_accessors() {
        let ctx: Context = "foo.xml".intern().into();
        let span = ctx.span(10, 5);

        assert_eq!(10, span.offset());
        assert_eq!(5, span.len());
        assert_eq!(15, span.end_offset());
        assert_eq!(ctx, span.context());
    }

    #[test]
    fn span_or_zz_falls_back_on_overflow() {
        let ctx: Context = "zz.xml".intern().into();

        assert_eq!(ctx.span(1, 2), ctx.span_or_zz(1, 2));

        if usize::BITS > SpanOffsetSize::BITS {
            assert_eq!(ctx.span(0, 0), ctx.span_or_zz(usize::MAX, 2));
            assert_eq!(ctx.span(1, 0), ctx.span_or_zz(1, usize::MAX));
        }
    }

    #[test]
    fn merge_spans_in_same_context() {
        let ctx: Context = "merge.xml".intern().into();

        assert_eq!(
            Some(ctx.span(2, 8)),
            ctx.span(2, 3).merge(ctx.span(7, 3))
        );
        assert_eq!(None, ctx.span(2, 3).merge(UNKNOWN_CONTEXT.span(7, 3)));
    }

    #[test]
    fn display_includes_context_and_interval() {
        let ctx: Context = "disp.xml".intern().into();

        assert_eq!("[disp.xml offset 1-4]", ctx.span(1, 3).to_string());
        assert_eq!("[<unknown> offset 0-0]", UNKNOWN_SPAN.to_string());
    }
}
