// Diagnostic system rendering
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

//! Rendering of diagnostic information.

// NB: `write!` together with `\n` is preferred to `writeln!` so that there
//   is only a single sequence of characters to search for while tracking
//   down newlines,
//     rather than using both.

use super::{
    resolver::{ResolvedSpan, SpanResolver, SpanResolverError},
    AnnotatedSpan, Diagnostic, Label, Level,
};
use crate::span::Span;
use std::fmt::{self, Display};

pub trait Reporter {
    /// Render diagnostic report.
    ///
    /// The provided [`Report`] implements [`Display`].
    ///
    /// This method _does not return [`Result`]_ and should never fail.
    /// Errors encountered while resolving spans are absorbed into the
    ///   report itself,
    ///     so that the diagnostic that was requested is never masked by
    ///     our own failure.
    fn render<'d, D: Diagnostic>(&mut self, diagnostic: &'d D)
        -> Report<'d, D>;

    /// Number of reports rendered with a [`Level::Error`] or worse.
    fn error_count(&self) -> usize;

    /// Whether any rendered report was an error.
    fn has_errors(&self) -> bool {
        self.error_count() > 0
    }
}

/// Render diagnostic report in a highly visual way.
///
/// This report is modeled after Rust's default error reporting,
///   including the line of source code associated with each span and an
///   underline marking the span itself.
pub struct VisualReporter<R: SpanResolver> {
    resolver: R,
    error_count: usize,
}

impl<R: SpanResolver> VisualReporter<R> {
    pub fn new(resolver: R) -> Self {
        Self {
            resolver,
            error_count: 0,
        }
    }
}

impl<R: SpanResolver> Reporter for VisualReporter<R> {
    fn render<'d, D: Diagnostic>(
        &mut self,
        diagnostic: &'d D,
    ) -> Report<'d, D> {
        let mut report = Report::empty(diagnostic);

        for AnnotatedSpan(span, level, olabel) in diagnostic.describe() {
            let section = match self.resolver.resolve(span) {
                Ok(rspan) => Section::Resolved(rspan),
                Err(e) => Section::Unresolved(span, e),
            };

            report.push(section, level, olabel);
        }

        if report.level() <= Level::Error {
            self.error_count += 1;
        }

        report
    }

    fn error_count(&self) -> usize {
        self.error_count
    }
}

/// A rendered diagnostic.
#[derive(Debug)]
pub struct Report<'d, D: Diagnostic> {
    diagnostic: &'d D,
    secs: Vec<(Section, Vec<SpanLabel<'d>>)>,
    level: Option<Level>,
}

impl<'d, D: Diagnostic> Report<'d, D> {
    fn empty(diagnostic: &'d D) -> Self {
        Self {
            diagnostic,
            secs: Vec::new(),
            level: None,
        }
    }

    /// The most severe level of any span in this report.
    ///
    /// A report without spans is an error.
    pub fn level(&self) -> Level {
        self.level.unwrap_or_default()
    }

    /// Add a labeled section,
    ///   squashing it into the previous section if both describe the same
    ///   [`Span`].
    fn push(
        &mut self,
        section: Section,
        level: Level,
        olabel: Option<Label<'d>>,
    ) {
        self.level = Some(self.level.map_or(level, |prev| prev.min(level)));

        let label = olabel.map(|label| SpanLabel(level, label));

        match self.secs.last_mut() {
            Some((prev, labels)) if prev.span() == section.span() => {
                labels.extend(label);
            }
            _ => self.secs.push((section, label.into_iter().collect())),
        }
    }
}

impl<'d, D: Diagnostic> Display for Report<'d, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}\n", self.level(), self.diagnostic)?;

        for (sec, labels) in &self.secs {
            sec.fmt(f)?;

            for label in labels {
                write!(f, "   = {label}\n")?;
            }
        }

        Ok(())
    }
}

/// A [`Span`] that may have been resolved.
///
/// The span will remain unresolved if an error occurred,
///   in which case the error will be rendered alongside raw offsets so
///   that the user is still able to locate the problem.
#[derive(Debug)]
enum Section {
    Resolved(ResolvedSpan),
    Unresolved(Span, SpanResolverError),
}

impl Section {
    fn span(&self) -> Span {
        match self {
            Self::Resolved(rspan) => rspan.span,
            Self::Unresolved(span, _) => *span,
        }
    }
}

impl Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resolved(rspan) => {
                let line = rspan.line_num.to_string();
                let gutter = " ".repeat(line.len());
                let ctx = rspan.span.context();

                match rspan.column {
                    Some(col) => write!(
                        f,
                        "{gutter}--> {ctx}:{line}:{col}\n\
                         {gutter} |\n\
                         {line} | {text}\n\
                         {gutter} | {pad}{marks}\n",
                        text = rspan.text,
                        pad = " ".repeat(col.start().get() as usize - 1),
                        marks = "^".repeat(col.width() as usize),
                    ),

                    // Without columns we can still show the line,
                    //   but cannot underline anything within it.
                    None => write!(
                        f,
                        "{gutter}--> {ctx}:{line}\n\
                         {gutter} |\n\
                         {line} | {text}\n\
                         {gutter} = help: unable to calculate columns \
                            because the line is not valid UTF-8\n",
                        text = rspan.text,
                    ),
                }
            }

            Self::Unresolved(span, e) => write!(
                f,
                " --> {ctx} offset {start}--{end}\n\
                 \x20  = help: an error occurred while trying to look up \
                    information about this span: {e}\n",
                ctx = span.context(),
                start = span.offset(),
                end = span.end_offset(),
            ),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
struct SpanLabel<'l>(Level, Label<'l>);

impl<'l> Display for SpanLabel<'l> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self(level, label) = self;
        write!(f, "{level}: {label}")
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        diagnose::{Annotate, BufSpanResolver},
        span::Context,
        sym::GlobalSymbolIntern,
    };
    use std::{error::Error, io::Cursor};

    #[derive(Debug)]
    struct StubError(Vec<AnnotatedSpan<'static>>);

    impl Display for StubError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("stub error")
        }
    }

    impl Error for StubError {}

    impl Diagnostic for StubError {
        fn describe(&self) -> Vec<AnnotatedSpan> {
            self.0.clone()
        }
    }

    fn reporter(
        src: &str,
    ) -> (VisualReporter<BufSpanResolver<Cursor<Vec<u8>>>>, Context) {
        let ctx: Context = "doc.xml".intern().into();
        let resolver = BufSpanResolver::new(Cursor::new(src.into()), ctx);

        (VisualReporter::new(resolver), ctx)
    }

    #[test]
    fn renders_source_line_with_underline() {
        let (mut sut, ctx) = reporter("<Foo id=\"x\"><Baz/></Foo>\n");
        let err =
            StubError(vec![ctx.span(12, 4).error("element not allowed here")]);

        assert_eq!(
            "error: stub error\n\
             \x20--> doc.xml:1:13\n\
             \x20 |\n\
             1 | <Foo id=\"x\"><Baz/></Foo>\n\
             \x20 |             ^^^^\n\
             \x20  = error: element not allowed here\n",
            sut.render(&err).to_string()
        );

        assert!(sut.has_errors());
    }

    #[test]
    fn squashes_adjacent_labels_for_same_span() {
        let (mut sut, ctx) = reporter("<a/>");
        let span = ctx.span(0, 4);
        let err = StubError(span.error("first").with_help("second"));

        let rendered = sut.render(&err).to_string();

        assert_eq!(1, rendered.matches("-->").count());
        assert!(rendered.contains("= error: first\n"));
        assert!(rendered.contains("= help: second\n"));
    }

    #[test]
    fn unresolved_span_falls_back_to_offsets() {
        let (mut sut, _) = reporter("<a/>");
        let other: Context = "elsewhere.xml".intern().into();
        let err = StubError(vec![other.span(5, 2).mark_error()]);

        let rendered = sut.render(&err).to_string();

        assert!(
            rendered.contains(" --> elsewhere.xml offset 5--7\n"),
            "unexpected rendering: {rendered}"
        );
    }

    #[test]
    fn note_only_report_is_not_an_error() {
        let (mut sut, ctx) = reporter("<a/>");
        let err = StubError(vec![ctx.span(0, 1).note("just a note")]);

        let report = sut.render(&err);

        assert_eq!(Level::Note, report.level());
        assert!(!sut.has_errors());
    }
}
