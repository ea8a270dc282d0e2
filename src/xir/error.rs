// XIR error information
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

//! XIR error information.

use crate::{
    diagnose::{Annotate, AnnotatedSpan, Diagnostic},
    fmt::{DisplayWrapper, TtQuote},
    span::Span,
    sym::SymbolId,
};
use std::{fmt::Display, str::Utf8Error};

/// Error attempting to produce a XIR object.
#[derive(Debug, PartialEq, Eq)]
pub enum Error {
    /// Provided name is not a valid QName.
    InvalidQName(SymbolId, Span),

    /// A UTF-8 error together with the byte slice that caused it.
    ///
    /// By storing the raw bytes instead of a string,
    ///   we allow the displayer to determine how to handle invalid UTF-8
    ///   encodings.
    InvalidUtf8(Utf8Error, Vec<u8>, Span),

    /// XML 1.0 only.
    ///
    /// Other versions are not widely in use
    ///   (only 1.1 exists at the time of writing)
    ///   and providing that is either in error,
    ///     copy/paste,
    ///     or the user is expecting something they're not going to get.
    UnsupportedXmlVersion(SymbolId, Span),

    /// We expect UTF-8 encoding for everything,
    ///   which should not be an unreasonable expectation.
    UnsupportedEncoding(SymbolId, Span),

    /// A namespace prefix was used without having been declared by any
    ///   enclosing element.
    UndeclaredPrefix(SymbolId, Span),

    /// An error from the underlying XML parser,
    ///   rendered to a string.
    ///
    /// `quick-xml` errors are neither [`Clone`] nor [`PartialEq`],
    ///   and we have no use for them beyond presenting them to the user.
    QuickXml(String, Span),
}

impl Error {
    /// Produce a closure that will attach a [`Span`] to a
    ///   [`SpanlessError`].
    ///
    /// This is intended for use with [`Result::map_err`].
    pub fn from_with_span<E: Into<SpanlessError>>(
        span: Span,
    ) -> impl FnOnce(E) -> Self {
        move |e| e.into().with_span(span)
    }

    pub fn span(&self) -> Span {
        match self {
            Self::InvalidQName(_, span)
            | Self::InvalidUtf8(_, _, span)
            | Self::UnsupportedXmlVersion(_, span)
            | Self::UnsupportedEncoding(_, span)
            | Self::UndeclaredPrefix(_, span)
            | Self::QuickXml(_, span) => *span,
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidQName(qname, _) => {
                write!(f, "invalid QName {}", TtQuote::wrap(qname))
            }
            Self::InvalidUtf8(inner, bytes, _) => {
                write!(
                    f,
                    "{inner} for string {}",
                    TtQuote::wrap(String::from_utf8_lossy(bytes))
                )
            }
            Self::UnsupportedXmlVersion(ver, _) => {
                write!(
                    f,
                    "expected XML version `1.0`, \
                       but found unsupported version {}",
                    TtQuote::wrap(ver)
                )
            }
            Self::UnsupportedEncoding(enc, _) => {
                write!(
                    f,
                    "expected `utf-8` or `UTF-8` encoding, \
                       but found unsupported encoding {}",
                    TtQuote::wrap(enc)
                )
            }
            Self::UndeclaredPrefix(prefix, _) => {
                write!(
                    f,
                    "undeclared namespace prefix {}",
                    TtQuote::wrap(prefix)
                )
            }
            Self::QuickXml(msg, _) => write!(f, "malformed XML: {msg}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidUtf8(err, ..) => Some(err),
            _ => None,
        }
    }
}

impl Diagnostic for Error {
    fn describe(&self) -> Vec<AnnotatedSpan> {
        match self {
            Self::InvalidQName(_, span) => span.mark_error().into(),
            Self::InvalidUtf8(_, _, span) => span
                .error("this text is not valid UTF-8")
                .with_help("all input must be encoded as UTF-8"),
            Self::UnsupportedXmlVersion(_, span) => span
                .error("unsupported version")
                .with_help("use version `1.0`"),
            Self::UnsupportedEncoding(_, span) => span
                .error("unsupported encoding")
                .with_help("use `UTF-8` or remove the encoding declaration"),
            Self::UndeclaredPrefix(prefix, span) => span
                .error("undeclared prefix")
                .with_help(format!(
                    "declare the prefix using `xmlns:{prefix}` on this \
                       element or one of its ancestors"
                )),
            Self::QuickXml(_, span) => span.mark_error().into(),
        }
    }
}

/// An [`Error`] that requires its [`Span`] to be filled in by the caller.
///
/// These errors should not be converted automatically,
///   since spans are intended to be clear and accurate;
///     [`SpanlessError::with_span`] must be used explicitly.
#[derive(Debug, PartialEq, Eq)]
pub enum SpanlessError {
    InvalidQName(SymbolId),
    InvalidUtf8(Utf8Error, Vec<u8>),
}

impl SpanlessError {
    pub fn with_span(self, span: Span) -> Error {
        match self {
            Self::InvalidQName(qname) => Error::InvalidQName(qname, span),
            Self::InvalidUtf8(err, bytes) => {
                Error::InvalidUtf8(err, bytes, span)
            }
        }
    }
}

impl Display for SpanlessError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidQName(qname) => {
                write!(f, "invalid QName {}", TtQuote::wrap(qname))
            }
            Self::InvalidUtf8(inner, bytes) => write!(
                f,
                "{inner} for string {}",
                TtQuote::wrap(String::from_utf8_lossy(bytes))
            ),
        }
    }
}

impl std::error::Error for SpanlessError {}

impl<'a> From<(Utf8Error, &'a [u8])> for SpanlessError {
    fn from((err, bytes): (Utf8Error, &'a [u8])) -> Self {
        Self::InvalidUtf8(err, bytes.to_owned())
    }
}
