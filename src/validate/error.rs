// Validation errors
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

//! Errors arising from validation.
//!
//! There are two distinct classes of error:
//!
//!   - [`ValidityError`]s describe where a document diverges from its
//!       grammar.
//!     They are reported to the caller as they are found and validation
//!       continues afterward.
//!   - [`Error`]s prevent validation from continuing at all,
//!       such as malformed input.

use crate::{
    diagnose::{Annotate, AnnotatedSpan, Diagnostic},
    fmt::{DisplayWrapper, ListDisplayWrapper, OrConjList, TtQuote},
    span::Span,
    xir::{self, ExpName},
};
use std::fmt::Display;

/// The kind of a [`ValidityError`],
///   without any of its data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    UnexpectedElement,
    InvalidText,
    MissingAttribute,
    BadAttribute,
    ContentModelIncomplete,
}

/// A place where the document diverges from the grammar.
///
/// Names of expected elements and attributes are rendered into strings at
///   the time of the error,
///     since the expressions that they were derived from do not outlive
///     validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidityError {
    /// The element is not permitted at this position.
    ///
    /// Its subtree is skipped.
    UnexpectedElement {
        name: ExpName,
        span: Span,
        expected: Vec<String>,
    },

    /// Non-whitespace text where none is permitted,
    ///   or text that is not a valid value.
    ///
    /// The text is ignored.
    InvalidText {
        parent: Option<ExpName>,
        span: Span,
    },

    /// The element omits attributes that it requires.
    MissingAttribute {
        element: ExpName,
        span: Span,
        required: Vec<String>,
    },

    /// The attribute is not permitted on its element,
    ///   or its value is invalid.
    ///
    /// The attribute is ignored.
    BadAttribute {
        name: ExpName,
        element: ExpName,
        span: Span,
    },

    /// The content of an element ended before satisfying its content
    ///   model.
    ///
    /// If `element` is [`None`],
    ///   then it is the document itself that is incomplete.
    ContentModelIncomplete {
        element: Option<ExpName>,
        span: Span,
        expected: Vec<String>,
    },
}

impl ValidityError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnexpectedElement { .. } => ErrorKind::UnexpectedElement,
            Self::InvalidText { .. } => ErrorKind::InvalidText,
            Self::MissingAttribute { .. } => ErrorKind::MissingAttribute,
            Self::BadAttribute { .. } => ErrorKind::BadAttribute,
            Self::ContentModelIncomplete { .. } => {
                ErrorKind::ContentModelIncomplete
            }
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Self::UnexpectedElement { span, .. }
            | Self::InvalidText { span, .. }
            | Self::MissingAttribute { span, .. }
            | Self::BadAttribute { span, .. }
            | Self::ContentModelIncomplete { span, .. } => *span,
        }
    }
}

impl Display for ValidityError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnexpectedElement { name, .. } => {
                write!(f, "unexpected element {}", TtQuote::wrap(name))
            }
            Self::InvalidText {
                parent: Some(parent),
                ..
            } => {
                write!(f, "invalid text in element {}", TtQuote::wrap(parent))
            }
            Self::InvalidText { parent: None, .. } => {
                write!(f, "text is not permitted outside of the root element")
            }
            Self::MissingAttribute { element, .. } => write!(
                f,
                "element {} is missing a required attribute",
                TtQuote::wrap(element)
            ),
            Self::BadAttribute { name, element, .. } => write!(
                f,
                "unexpected or invalid attribute {} on element {}",
                TtQuote::wrap(name),
                TtQuote::wrap(element)
            ),
            Self::ContentModelIncomplete {
                element: Some(element),
                ..
            } => write!(
                f,
                "content of element {} is incomplete",
                TtQuote::wrap(element)
            ),
            Self::ContentModelIncomplete { element: None, .. } => {
                write!(f, "document is incomplete")
            }
        }
    }
}

impl std::error::Error for ValidityError {}

impl Diagnostic for ValidityError {
    fn describe(&self) -> Vec<AnnotatedSpan> {
        match self {
            Self::UnexpectedElement { span, expected, .. } => {
                help_expecting(span.error("element not allowed here"), expected)
            }

            Self::InvalidText { span, .. } => {
                span.error("text not allowed here").into()
            }

            Self::MissingAttribute { span, required, .. } => {
                let err = span.error("missing attribute");

                match required.as_slice() {
                    [] => err.into(),
                    names => err.with_help(format!(
                        "required attributes include {}",
                        OrConjList::<TtQuote>::wrap(names)
                    )),
                }
            }

            Self::BadAttribute { span, .. } => {
                span.error("attribute not allowed here").into()
            }

            Self::ContentModelIncomplete { span, expected, .. } => {
                help_expecting(span.error("expected more content"), expected)
            }
        }
    }
}

fn help_expecting<'l>(
    err: AnnotatedSpan<'l>,
    expected: &[String],
) -> Vec<AnnotatedSpan<'l>> {
    match expected {
        [] => err.into(),
        names => err.with_help(format!(
            "expecting {}",
            OrConjList::<TtQuote>::wrap(names)
        )),
    }
}

/// Errors that halt validation.
#[derive(Debug, PartialEq)]
pub enum Error {
    /// The document could not be read.
    Xir(xir::Error),

    /// A closing tag was encountered with no open element.
    UnbalancedClose(Span),

    /// An attribute or end of attributes was encountered outside of an
    ///   opening tag.
    UnexpectedAttr(Span),

    /// Input ended while elements remained open.
    UnexpectedEof(Span),
}

impl From<xir::Error> for Error {
    fn from(e: xir::Error) -> Self {
        Self::Xir(e)
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Xir(e) => e.fmt(f),
            Self::UnbalancedClose(_) => {
                write!(f, "closing tag without a matching opening tag")
            }
            Self::UnexpectedAttr(_) => {
                write!(f, "attribute outside of an opening tag")
            }
            Self::UnexpectedEof(_) => {
                write!(f, "unexpected end of input with open elements")
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Xir(e) => Some(e),
            _ => None,
        }
    }
}

impl Diagnostic for Error {
    fn describe(&self) -> Vec<AnnotatedSpan> {
        match self {
            Self::Xir(e) => e.describe(),
            Self::UnbalancedClose(span) | Self::UnexpectedAttr(span) => {
                span.mark_error().into()
            }
            Self::UnexpectedEof(span) => span
                .error("this element was never closed")
                .with_help("the document may be truncated"),
        }
    }
}
