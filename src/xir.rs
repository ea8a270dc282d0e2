// XML IR (XIR)
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

//! Intermediate representation (IR) of an XML document.
//!
//! XIR is a flat stream of [`Token`]s serving as an abstraction layer atop
//!   of whatever XML library is used (e.g. `quick_xml`).
//! XIR is _not_ intended to be comprehensive,
//!   or even general-purpose---it
//!     exists to provide the validator and schema loader with exactly the
//!     events that they consume.
//!
//! To parse an entire XML document,
//!   see [`reader`].
//! Names in XIR are _unresolved_ [`QName`]s;
//!   namespace resolution is the responsibility of the consumer
//!   (see [`ns`]).
//!
//! _Note:_ XIR refers to "opening" and "closing" tags,
//!   as opposed to "start" and "end" as used in the XML specification.

use crate::span::Span;
use crate::sym::{GlobalSymbolIntern, GlobalSymbolInternBytes, SymbolId};
use memchr::memchr;
use std::convert::TryFrom;
use std::fmt::Display;

mod error;
pub use error::{Error, SpanlessError};

pub mod ns;
pub mod reader;

pub use ns::{ExpName, NsStack};
pub use reader::XmlXirReader;

/// A qualified name (namespace prefix and local name).
///
/// Neither component may contain a colon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QName(Option<SymbolId>, SymbolId);

// Since we implement Copy, ensure size matches our expectations:
const_assert!(std::mem::size_of::<QName>() <= std::mem::size_of::<usize>());

impl QName {
    /// Create a new name from a local name only.
    pub fn new_local(local_name: SymbolId) -> Self {
        Self(None, local_name)
    }

    /// Namespace prefix,
    ///   if any.
    pub fn prefix(&self) -> Option<SymbolId> {
        self.0
    }

    /// Local part of a name (name without prefix).
    pub fn local_name(&self) -> SymbolId {
        self.1
    }
}

impl TryFrom<&[u8]> for QName {
    type Error = SpanlessError;

    /// Attempt to parse a byte slice into a [`QName`].
    ///
    /// The byte slice must represent a valid QName in UTF-8.
    /// If a colon is present,
    ///   it delimits the namespace prefix and local part,
    ///   and therefore must not be in the first or last byte position.
    fn try_from(name: &[u8]) -> Result<Self, Self::Error> {
        if name.is_empty() {
            return Err(SpanlessError::InvalidQName("".intern()));
        }

        match memchr(b':', name) {
            // Leading colon means we're missing a prefix, trailing means
            //   that we have no local part.
            Some(pos) if pos == 0 || pos == name.len() - 1 => {
                Err(SpanlessError::InvalidQName(name.intern_utf8()?))
            }

            // There is _at least_ one colon in the string.
            // The prefix is before the first colon and so cannot itself
            //   contain one,
            //     but there could be a _second_ colon in the local part.
            Some(pos) => match memchr(b':', &name[(pos + 1)..]) {
                Some(_) => {
                    Err(SpanlessError::InvalidQName(name.intern_utf8()?))
                }
                None => Ok(Self(
                    Some(name[..pos].intern_utf8()?),
                    name[(pos + 1)..].intern_utf8()?,
                )),
            },

            // There are no colons in the string, so the entire string is
            //   the local part.
            None => Ok(Self(None, name.intern_utf8()?)),
        }
    }
}

impl TryFrom<&str> for QName {
    type Error = SpanlessError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        value.as_bytes().try_into()
    }
}

impl TryFrom<(&str, &str)> for QName {
    type Error = SpanlessError;

    fn try_from((prefix, local): (&str, &str)) -> Result<Self, Self::Error> {
        match (prefix.contains(':'), local.contains(':')) {
            (false, false) if !prefix.is_empty() && !local.is_empty() => {
                Ok(Self(Some(prefix.intern()), local.intern()))
            }
            _ => Err(SpanlessError::InvalidQName(
                format!("{prefix}:{local}").as_str().intern(),
            )),
        }
    }
}

impl Display for QName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QName(Some(prefix), local) => write!(f, "{}:{}", prefix, local),
            QName(None, local) => local.fmt(f),
        }
    }
}

/// Lightly-structured XML tokens with associated [`Span`]s.
///
/// This is a streamable IR for XML.
/// Every [`Token::Open`] is followed by zero or more [`Token::Attr`]s and
///   then exactly one [`Token::AttrEnd`],
///     so that consumers know when they have seen every attribute of an
///     element without having to look ahead to the next node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Opening tag of an element.
    Open(QName, Span),

    /// Element attribute name and (unescaped) value.
    Attr(QName, SymbolId, Span),

    /// End of the attribute list of the most recently opened element.
    AttrEnd(Span),

    /// Closing tag of an element.
    ///
    /// If the name is [`None`],
    ///   then the tag is self-closing.
    Close(Option<QName>, Span),

    /// Character data as part of an element,
    ///   unescaped.
    ///
    /// CDATA sections are also represented as text.
    Text(SymbolId, Span),

    /// Comment node.
    Comment(SymbolId, Span),
}

impl Token {
    /// Retrieve the [`Span`] associated with a given [`Token`].
    ///
    /// Every token has an associated span.
    pub fn span(&self) -> Span {
        use Token::*;

        match self {
            Open(_, span)
            | Attr(_, _, span)
            | AttrEnd(span)
            | Close(_, span)
            | Text(_, span)
            | Comment(_, span) => *span,
        }
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // _Do not_ render large amounts of text here;
        //   the diagnostic system will quote source lines to provide the
        //   necessary context.
        match self {
            Self::Open(qname, _) => write!(f, "`<{}>`", qname),
            Self::Close(Some(qname), _) => write!(f, "`</{}>`", qname),
            // Its context is contained within the Open,
            //   and hopefully any user-visible errors will display that
            //   instead.
            Self::Close(None, _) => write!(f, "`/>`"),
            Self::Attr(qname, value, _) => {
                write!(f, "attribute `@{}=\"{}\"`", qname, value)
            }
            Self::AttrEnd(_) => write!(f, "end of attributes"),
            Self::Comment(..) => write!(f, "comment"),
            Self::Text(..) => write!(f, "text"),
        }
    }
}
