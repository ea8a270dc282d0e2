// Datatype libraries
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

//! Datatypes deciding the validity and equality of literals.
//!
//! `data` and `value` expressions do not interpret literals themselves;
//!   they defer to a [`Datatype`],
//!     which is obtained by name from a [`DatatypeLibrary`] while the
//!     grammar is being constructed.
//! A datatype answers three questions:
//!
//!   1. Is this literal a member of the lexical space
//!        ([`Datatype::is_valid`])?
//!   2. What value does this literal denote
//!        ([`Datatype::create_value`])?
//!   3. Do these two values compare equal
//!        ([`Datatype::same_value`])?
//!
//! The last two together allow `<value type="integer">1</value>` to
//!   match the literal `" +01 "`.
//!
//! [`StdDatatypes`] provides the two libraries that virtually every
//!   schema uses:
//!     the RELAX NG built-in library
//!       (the empty URI;
//!         `string` and `token`)
//!     and a subset of XML Schema datatypes
//!       (see [`xsd`]).

use crate::{
    fmt::{DisplayWrapper, TtQuote},
    sym::{GlobalSymbolResolve, SymbolId},
};
use std::{error::Error, fmt::Debug, fmt::Display, rc::Rc};

pub mod xsd;

pub use xsd::{XsdDatatype, XSD_DATATYPES_URI};

/// The value denoted by a literal.
///
/// Values are compared by [`Datatype::same_value`],
///   which defaults to [`DataValue::same`].
#[derive(Debug, Clone, PartialEq)]
pub enum DataValue {
    /// A string after whitespace normalization.
    Str(String),

    Int(i128),

    /// A decimal in canonical form:
    ///   no leading zeros in the integer part,
    ///   no trailing zeros in the fractional part,
    ///   and no sign on zero.
    Decimal(String),

    Float(f64),
    Bool(bool),

    /// A whitespace-separated list of values.
    List(Vec<DataValue>),
}

impl DataValue {
    /// Value equality.
    ///
    /// This differs from [`PartialEq`] only in that `NaN` is equal to
    ///   itself,
    ///     which is how XML Schema defines equality for floating point
    ///     values.
    pub fn same(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Float(a), Self::Float(b)) => {
                (a.is_nan() && b.is_nan()) || a == b
            }
            (Self::List(a), Self::List(b)) => {
                a.len() == b.len()
                    && a.iter().zip(b.iter()).all(|(x, y)| x.same(y))
            }
            (a, b) => a == b,
        }
    }
}

/// A datatype from a [`DatatypeLibrary`].
pub trait Datatype: Debug {
    /// Name of the datatype for display.
    fn name(&self) -> &str;

    /// Whether `lit` is a member of the lexical space of this datatype.
    fn is_valid(&self, lit: &str) -> bool {
        self.create_value(lit).is_some()
    }

    /// Interpret `lit`,
    ///   producing [`None`] if it is not valid.
    fn create_value(&self, lit: &str) -> Option<DataValue>;

    /// Whether two values produced by [`Datatype::create_value`] are
    ///   equal.
    fn same_value(&self, a: &DataValue, b: &DataValue) -> bool {
        a.same(b)
    }
}

/// A source of [`Datatype`]s.
pub trait DatatypeLibrary {
    /// Resolve the datatype `name` of the library identified by
    ///   `library`,
    ///     restricted by the facets `params`.
    fn resolve(
        &self,
        library: SymbolId,
        name: SymbolId,
        params: &[(SymbolId, SymbolId)],
    ) -> Result<Rc<dyn Datatype>, DatatypeError>;
}

/// Whitespace normalization applied to a literal before it is
///   interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WhiteSpace {
    /// Leave the literal as-is.
    Preserve,

    /// Replace each tab,
    ///   newline,
    ///   and carriage return with a space.
    Replace,

    /// Replace as [`WhiteSpace::Replace`],
    ///   then collapse runs of spaces and strip leading and trailing
    ///   spaces.
    Collapse,
}

impl WhiteSpace {
    pub fn normalize(self, lit: &str) -> String {
        match self {
            Self::Preserve => lit.to_string(),
            Self::Replace => lit
                .chars()
                .map(|c| if is_xml_space(c) { ' ' } else { c })
                .collect(),
            Self::Collapse => collapse(lit),
        }
    }
}

/// Whitespace as defined by XML
///   (space, tab, carriage return, and newline).
pub fn is_xml_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n')
}

/// Whether `lit` consists entirely of XML whitespace.
///
/// The empty string is whitespace-only.
pub fn is_xml_blank(lit: &str) -> bool {
    lit.chars().all(is_xml_space)
}

fn collapse(lit: &str) -> String {
    lit.split(is_xml_space)
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// A datatype of the RELAX NG built-in library.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinDatatype {
    /// Any string,
    ///   compared without normalization.
    String,

    /// Any string,
    ///   compared after collapsing whitespace.
    Token,
}

impl Datatype for BuiltinDatatype {
    fn name(&self) -> &str {
        match self {
            Self::String => "string",
            Self::Token => "token",
        }
    }

    fn is_valid(&self, _lit: &str) -> bool {
        true
    }

    fn create_value(&self, lit: &str) -> Option<DataValue> {
        Some(DataValue::Str(match self {
            Self::String => WhiteSpace::Preserve.normalize(lit),
            Self::Token => WhiteSpace::Collapse.normalize(lit),
        }))
    }
}

/// The built-in library and XML Schema datatypes.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdDatatypes;

impl DatatypeLibrary for StdDatatypes {
    fn resolve(
        &self,
        library: SymbolId,
        name: SymbolId,
        params: &[(SymbolId, SymbolId)],
    ) -> Result<Rc<dyn Datatype>, DatatypeError> {
        match library.lookup_str() {
            "" => {
                let dt = match name.lookup_str() {
                    "string" => BuiltinDatatype::String,
                    "token" => BuiltinDatatype::Token,
                    _ => return Err(DatatypeError::UnknownType(library, name)),
                };

                // Built-in datatypes have no facets.
                match params.first() {
                    Some((param, _)) => {
                        Err(DatatypeError::UnsupportedParam(name, *param))
                    }
                    None => Ok(Rc::new(dt)),
                }
            }

            XSD_DATATYPES_URI => XsdDatatype::resolve(name, params)
                .map(|dt| Rc::new(dt) as Rc<dyn Datatype>),

            _ => Err(DatatypeError::UnknownLibrary(library)),
        }
    }
}

/// Failure to resolve a datatype.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatatypeError {
    /// No library is known by this URI.
    UnknownLibrary(SymbolId),

    /// The library does not provide a datatype of this name.
    UnknownType(SymbolId, SymbolId),

    /// The datatype does not accept the given parameter.
    UnsupportedParam(SymbolId, SymbolId),

    /// The parameter value could not be interpreted.
    BadParam(SymbolId, SymbolId),
}

impl Display for DatatypeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownLibrary(uri) => {
                write!(f, "unknown datatype library {}", TtQuote::wrap(uri))
            }
            Self::UnknownType(uri, name) => match uri.lookup_str() {
                "" => write!(
                    f,
                    "unknown built-in datatype {}",
                    TtQuote::wrap(name)
                ),
                _ => write!(
                    f,
                    "unknown datatype {} in library {}",
                    TtQuote::wrap(name),
                    TtQuote::wrap(uri)
                ),
            },
            Self::UnsupportedParam(name, param) => write!(
                f,
                "datatype {} does not support parameter {}",
                TtQuote::wrap(name),
                TtQuote::wrap(param)
            ),
            Self::BadParam(param, value) => write!(
                f,
                "invalid value {} for parameter {}",
                TtQuote::wrap(value),
                TtQuote::wrap(param)
            ),
        }
    }
}

impl Error for DatatypeError {}
