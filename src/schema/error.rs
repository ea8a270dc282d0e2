// Schema loading errors
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

//! Errors loading a schema.

use crate::{
    datatype::DatatypeError,
    diagnose::{Annotate, AnnotatedSpan, Diagnostic},
    fmt::{DisplayWrapper, TtQuote},
    span::Span,
    sym::SymbolId,
    xir,
};
use std::fmt::Display;

#[derive(Debug, PartialEq)]
pub enum SchemaError {
    /// The schema could not be read.
    Xir(xir::Error),

    /// The schema contains no elements at all.
    EmptySchema(Span),

    /// An element that is not a known pattern in a pattern context.
    UnknownPattern(SymbolId, Span),

    /// An element that is not a known name class in a name class context.
    UnknownNameClass(SymbolId, Span),

    /// A construct that is recognized but not supported.
    Unsupported(SymbolId, Span),

    /// An element is missing an attribute that it requires.
    MissingAttr(&'static str, SymbolId, Span),

    /// An `element` or `attribute` has neither a `name` attribute nor a
    ///   name class.
    MissingNameClass(Span),

    /// Non-whitespace text where only patterns are permitted.
    UnexpectedText(Span),

    /// A `grammar` with no `start`.
    MissingStart(Span),

    /// A `combine` attribute with a value other than `choice` or
    ///   `interleave`.
    InvalidCombine(SymbolId, Span),

    /// Definitions of the same name disagree on how to combine.
    ConflictingCombine(SymbolId, Span),

    /// More than one definition of the same name omits `combine`.
    DuplicateDefine(SymbolId, Span),

    /// A reference to a name that is never defined.
    UndefinedRef(SymbolId, Span),

    /// A definition refers to itself without passing through an element.
    UnguardedRecursion(SymbolId, Span),

    /// A datatype could not be resolved.
    Datatype(DatatypeError, Span),
}

impl From<xir::Error> for SchemaError {
    fn from(e: xir::Error) -> Self {
        Self::Xir(e)
    }
}

impl Display for SchemaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use SchemaError::*;

        match self {
            Xir(e) => e.fmt(f),
            EmptySchema(_) => write!(f, "schema contains no elements"),
            UnknownPattern(name, _) => {
                write!(f, "unknown pattern {}", TtQuote::wrap(name))
            }
            UnknownNameClass(name, _) => {
                write!(f, "unknown name class {}", TtQuote::wrap(name))
            }
            Unsupported(name, _) => {
                write!(f, "{} is not supported", TtQuote::wrap(name))
            }
            MissingAttr(attr, ele, _) => write!(
                f,
                "{} requires attribute {}",
                TtQuote::wrap(ele),
                TtQuote::wrap(attr)
            ),
            MissingNameClass(_) => write!(f, "missing name"),
            UnexpectedText(_) => write!(f, "unexpected text"),
            MissingStart(_) => write!(f, "grammar has no `start`"),
            InvalidCombine(value, _) => {
                write!(f, "invalid combine method {}", TtQuote::wrap(value))
            }
            ConflictingCombine(name, _) => write!(
                f,
                "conflicting combine methods for {}",
                TtQuote::wrap(name)
            ),
            DuplicateDefine(name, _) => write!(
                f,
                "{} is defined more than once without `combine`",
                TtQuote::wrap(name)
            ),
            UndefinedRef(name, _) => {
                write!(f, "reference to undefined {}", TtQuote::wrap(name))
            }
            UnguardedRecursion(name, _) => write!(
                f,
                "{} refers to itself outside of any element",
                TtQuote::wrap(name)
            ),
            Datatype(e, _) => e.fmt(f),
        }
    }
}

impl std::error::Error for SchemaError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Xir(e) => Some(e),
            Self::Datatype(e, _) => Some(e),
            _ => None,
        }
    }
}

impl Diagnostic for SchemaError {
    fn describe(&self) -> Vec<AnnotatedSpan> {
        use SchemaError::*;

        match self {
            Xir(e) => e.describe(),

            EmptySchema(span) => span.mark_error().into(),

            UnknownPattern(_, span) | UnknownNameClass(_, span) => {
                span.error("not recognized here").into()
            }

            Unsupported(_, span) => span
                .error("unsupported construct")
                .with_help("the schema must be a single self-contained file"),

            MissingAttr(attr, _, span) => {
                span.error(format!("missing @{attr}")).into()
            }

            MissingNameClass(span) => span
                .error("no name given")
                .with_help("provide @name or a name class as the first child"),

            UnexpectedText(span) => span.error("text not allowed here").into(),

            MissingStart(span) => span
                .error("this grammar has no start pattern")
                .with_help("add a `start` element"),

            InvalidCombine(_, span) => span
                .error("invalid combine")
                .with_help("expected `choice` or `interleave`"),

            ConflictingCombine(_, span) => {
                span.error("combine differs from a previous definition").into()
            }

            DuplicateDefine(_, span) => span
                .error("duplicate definition")
                .with_help("use `combine` to extend an existing definition"),

            UndefinedRef(_, span) => span.error("not defined").into(),

            UnguardedRecursion(_, span) => span
                .error("recursive definition")
                .with_help("recursive references must occur within `element`"),

            Datatype(_, span) => span.error("invalid datatype").into(),
        }
    }
}
