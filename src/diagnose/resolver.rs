// Span resolution
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

//! Resolve [`Span`]s into line:column source locations.
//!
//! A [`Span`] contains a [`Context`] and raw byte offsets gathered during
//!   parsing.
//! These byte offsets are used to go back and read the source referred to
//!   by a [`Context`] to resolve the byte offsets to line and column
//!   numbers.
//! This is not done during parsing because this information is only useful
//!   in a diagnostic context,
//!     which is not the typical happy path of the validator.
//!
//! A downside to this approach is that a [`Context`] must reference a
//!   location that may be read a second time;
//!     if it cannot,
//!       resolution fails and the reporter falls back to raw offsets.

use crate::span::{Context, Span};
use std::{
    error::Error,
    fmt::Display,
    fs,
    io::{self, BufRead, BufReader, Seek},
    num::NonZeroU32,
};
use unicode_width::UnicodeWidthChar;

/// Resolves [`Span`]s into line:column source locations.
pub trait SpanResolver {
    /// Attempt to resolve the provided [`Span`] into its source location.
    fn resolve(&mut self, span: Span)
        -> Result<ResolvedSpan, SpanResolverError>;
}

/// A [`Span`] resolved to the first source line on which it begins.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct ResolvedSpan {
    /// The original [`Span`] whose resolution was requested.
    pub span: Span,

    /// 1-indexed line number of the start of the span.
    pub line_num: NonZeroU32,

    /// Columns of the span relative to the beginning of the line.
    ///
    /// This may be [`None`] if the line is not valid UTF-8.
    pub column: Option<Column>,

    /// Source text of the line _excluding_ the newline.
    pub text: String,
}

/// Source column offsets.
///
/// A "column" is somewhat loosely defined as a terminal cell.
/// Certain unicode characters occupy more than one cell,
///   while others occupy none.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Column {
    /// A range of 1-indexed columns, inclusive.
    Endpoints(NonZeroU32, NonZeroU32),

    /// Immediately before a column.
    ///
    /// This is caused by a zero-length [`Span`].
    Before(NonZeroU32),
}

impl Column {
    /// First column of the range.
    pub fn start(&self) -> NonZeroU32 {
        match self {
            Self::Endpoints(at, _) | Self::Before(at) => *at,
        }
    }

    /// Number of columns covered,
    ///   which is at least one so that a marker is always visible.
    pub fn width(&self) -> u32 {
        match self {
            Self::Endpoints(start, end) => end.get() - start.get() + 1,
            Self::Before(_) => 1,
        }
    }
}

impl Display for Column {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Coerces to a single column number.
        Display::fmt(&self.start(), f)
    }
}

/// Resolve a [`Span`] using any generic [`BufRead`].
///
/// The reader is rewound for every resolution.
/// This is heavy-handed,
///   but avoids maintaining a line cache that may never be needed;
///     diagnostics are rare.
pub struct BufSpanResolver<R: BufRead + Seek> {
    reader: R,
    ctx: Context,
}

impl<R: BufRead + Seek> BufSpanResolver<R> {
    pub fn new(reader: R, ctx: Context) -> Self {
        Self { reader, ctx }
    }
}

impl<R: BufRead + Seek> SpanResolver for BufSpanResolver<R> {
    fn resolve(
        &mut self,
        span: Span,
    ) -> Result<ResolvedSpan, SpanResolverError> {
        if self.ctx != span.context() {
            return Err(SpanResolverError::ContextMismatch {
                given: span.context(),
                expected: self.ctx,
            });
        }

        self.reader.rewind()?;

        let offset = span.offset() as usize;
        let mut line_num = NonZeroU32::MIN;
        let mut line_start = 0usize;
        let mut buf = Vec::with_capacity(128);

        loop {
            buf.clear();

            let nread = self.reader.read_until(b'\n', &mut buf)?;
            if nread == 0 {
                return Err(SpanResolverError::OutOfRange(line_start));
            }

            let line_end = line_start + nread;

            // A span beginning at EOF still belongs to the last line.
            let is_last = buf.last() != Some(&b'\n');

            if offset < line_end || (is_last && offset == line_end) {
                if buf.last() == Some(&b'\n') {
                    buf.pop();
                }
                if buf.last() == Some(&b'\r') {
                    buf.pop();
                }

                let rel = offset - line_start;
                let len = span.len() as usize;

                return Ok(match String::from_utf8(buf) {
                    Ok(text) => ResolvedSpan {
                        span,
                        line_num,
                        column: column_for(&text, rel, len),
                        text,
                    },
                    Err(e) => ResolvedSpan {
                        span,
                        line_num,
                        column: None,
                        text: String::from_utf8_lossy(e.as_bytes())
                            .into_owned(),
                    },
                });
            }

            line_start = line_end;

            // Saturating add will handle billions of lines,
            //   which is not expected to happen,
            //   but avoids a panic at the cost of inaccurate information.
            line_num = line_num.saturating_add(1);
        }
    }
}

/// Calculate the display columns of the byte interval `[rel, rel+len)`
///   within `line`.
///
/// Bytes that do not fall on character boundaries are attributed to the
///   character containing them.
fn column_for(line: &str, rel: usize, len: usize) -> Option<Column> {
    let mut col = 1u32;
    let mut start = None;
    let mut end = None;
    let rel_end = rel + len;

    for (pos, ch) in line.char_indices() {
        let width = ch.width().unwrap_or(0) as u32;

        if start.is_none() && pos + ch.len_utf8() > rel {
            start = Some(col);
        }

        if len > 0 && pos < rel_end {
            end = Some(col + width.max(1) - 1);
        }

        col += width;
    }

    let start = NonZeroU32::new(start.unwrap_or(col))?;

    Some(match end.and_then(NonZeroU32::new) {
        Some(end) if len > 0 && end >= start => Column::Endpoints(start, end),
        _ => Column::Before(start),
    })
}

/// Resolve spans by reading their [`Context`] from the filesystem.
///
/// Each resolution opens the file anew;
///   this is intended only for the rare event of a diagnostic report.
#[derive(Debug, Default)]
pub struct FsSpanResolver;

impl SpanResolver for FsSpanResolver {
    fn resolve(
        &mut self,
        span: Span,
    ) -> Result<ResolvedSpan, SpanResolverError> {
        let ctx = span.context();
        let file = fs::File::open(&ctx)?;

        BufSpanResolver::new(BufReader::new(file), ctx).resolve(span)
    }
}

/// Error attempting to resolve a [`Span`].
#[derive(Debug, PartialEq, Eq)]
pub enum SpanResolverError {
    Io(io::ErrorKind),

    /// The span lies beyond the end of the source;
    ///   the given offset is the number of bytes that were read.
    OutOfRange(usize),

    /// The resolver was asked to resolve a span from a context other than
    ///   the one it is reading.
    ContextMismatch { given: Context, expected: Context },
}

impl Display for SpanResolverError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(kind) => write!(f, "I/O error: {kind:?}"),
            Self::OutOfRange(eof_pos) => {
                write!(f, "span exceeds context size of {eof_pos} bytes")
            }
            Self::ContextMismatch { given, expected } => write!(
                f,
                "attempted to read context {given} using resolver \
                   for context {expected}"
            ),
        }
    }
}

impl Error for SpanResolverError {}

impl From<io::Error> for SpanResolverError {
    fn from(e: io::Error) -> Self {
        Self::Io(e.kind())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::sym::GlobalSymbolIntern;
    use std::io::Cursor;

    fn sut(src: &str) -> (BufSpanResolver<Cursor<Vec<u8>>>, Context) {
        let ctx: Context = "resolver.xml".intern().into();
        (BufSpanResolver::new(Cursor::new(src.into()), ctx), ctx)
    }

    fn nz(n: u32) -> NonZeroU32 {
        NonZeroU32::new(n).unwrap()
    }

    #[test]
    fn resolves_first_line() {
        let (mut sut, ctx) = sut("<foo bar=\"baz\"/>\n<next/>\n");
        let rspan = sut.resolve(ctx.span(1, 3)).unwrap();

        assert_eq!(nz(1), rspan.line_num);
        assert_eq!(Some(Column::Endpoints(nz(2), nz(4))), rspan.column);
        assert_eq!("<foo bar=\"baz\"/>", rspan.text);
    }

    #[test]
    fn resolves_later_line_and_strips_crlf() {
        let (mut sut, ctx) = sut("<a>\r\n  <b/>\r\n</a>");
        let rspan = sut.resolve(ctx.span(7, 4)).unwrap();

        assert_eq!(nz(2), rspan.line_num);
        assert_eq!(Some(Column::Endpoints(nz(3), nz(6))), rspan.column);
        assert_eq!("  <b/>", rspan.text);
    }

    #[test]
    fn zero_length_span_is_before_column() {
        let (mut sut, ctx) = sut("abc");
        let rspan = sut.resolve(ctx.span(3, 0)).unwrap();

        assert_eq!(Some(Column::Before(nz(4))), rspan.column);
    }

    #[test]
    fn wide_characters_occupy_two_columns() {
        // Each of these characters is three bytes and two columns wide.
        let (mut sut, ctx) = sut("日本<x/>");
        let rspan = sut.resolve(ctx.span(6, 4)).unwrap();

        assert_eq!(Some(Column::Endpoints(nz(5), nz(8))), rspan.column);
    }

    #[test]
    fn span_beyond_eof_is_out_of_range() {
        let (mut sut, ctx) = sut("short\n");

        assert_eq!(
            Err(SpanResolverError::OutOfRange(6)),
            sut.resolve(ctx.span(100, 1))
        );
    }

    #[test]
    fn context_mismatch() {
        let (mut sut, ctx) = sut("x");
        let other: Context = "other.xml".intern().into();

        assert_eq!(
            Err(SpanResolverError::ContextMismatch {
                given: other,
                expected: ctx
            }),
            sut.resolve(other.span(0, 1))
        );
    }
}
