// XML Schema datatypes
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

//! A subset of XML Schema Part 2 datatypes.
//!
//! Only the datatypes and facets that commonly appear in RELAX NG schemas
//!   are supported.
//! Notably,
//!   the `pattern` facet and the date and time types are not,
//!   and are reported as errors when the grammar is loaded rather than
//!   being silently ignored.
//!
//! Integer types are represented as [`i128`],
//!   which bounds `integer` and its unbounded derivations.
//! `ID` and `IDREF` are validated lexically as `NCName`s;
//!   uniqueness and referential integrity are not checked.

use super::{DataValue, Datatype, DatatypeError, WhiteSpace};
use crate::sym::{GlobalSymbolIntern, GlobalSymbolResolve, SymbolId};

/// Library URI of the XML Schema datatypes.
pub const XSD_DATATYPES_URI: &str =
    "http://www.w3.org/2001/XMLSchema-datatypes";

/// Primitive (or derived, but structurally distinct) kind of an
///   [`XsdDatatype`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    String,
    NormalizedString,
    Token,
    Boolean,
    Decimal,
    Integer,
    Double,
    Float,
    NcName,
    Name,
    NmToken,
    NmTokens,
    IdRefs,
    AnyUri,
    Language,
}

impl Kind {
    fn white_space(self) -> WhiteSpace {
        match self {
            Self::String => WhiteSpace::Preserve,
            Self::NormalizedString => WhiteSpace::Replace,
            _ => WhiteSpace::Collapse,
        }
    }

    /// Whether length facets apply,
    ///   and if so whether they count list items rather than characters.
    fn length_unit(self) -> Option<LengthUnit> {
        match self {
            Self::NmTokens | Self::IdRefs => Some(LengthUnit::Items),
            Self::Boolean
            | Self::Decimal
            | Self::Integer
            | Self::Double
            | Self::Float => None,
            _ => Some(LengthUnit::Chars),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LengthUnit {
    Chars,
    Items,
}

/// Constraining facets.
///
/// Exclusive bounds are stored as the equivalent inclusive bound.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Facets {
    min_len: Option<usize>,
    max_len: Option<usize>,
    min: Option<i128>,
    max: Option<i128>,
}

impl Facets {
    fn check_len(&self, len: usize) -> bool {
        self.min_len.map_or(true, |min| len >= min)
            && self.max_len.map_or(true, |max| len <= max)
    }

    fn check_range(&self, n: i128) -> bool {
        self.min.map_or(true, |min| n >= min)
            && self.max.map_or(true, |max| n <= max)
    }

    /// Narrow the range,
    ///   never widening the bounds inherent to the type.
    fn narrow(&mut self, min: Option<i128>, max: Option<i128>) {
        if let Some(new) = min {
            self.min = Some(self.min.map_or(new, |old| old.max(new)));
        }

        if let Some(new) = max {
            self.max = Some(self.max.map_or(new, |old| old.min(new)));
        }
    }
}

/// An XML Schema datatype,
///   possibly restricted by facets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XsdDatatype {
    name: &'static str,
    kind: Kind,
    facets: Facets,
}

impl XsdDatatype {
    /// Resolve a datatype by its local name,
    ///   applying `params` as facets.
    pub fn resolve(
        name: SymbolId,
        params: &[(SymbolId, SymbolId)],
    ) -> Result<Self, DatatypeError> {
        let mut dt = Self::by_name(name).ok_or_else(|| {
            DatatypeError::UnknownType(XSD_DATATYPES_URI.intern(), name)
        })?;

        for (param, value) in params {
            dt.apply_param(name, *param, *value)?;
        }

        Ok(dt)
    }

    fn by_name(name: SymbolId) -> Option<Self> {
        use Kind::*;

        fn bound<N: Into<i128>>(n: N) -> Option<i128> {
            Some(n.into())
        }

        let (name, kind, min, max): (_, _, Option<i128>, Option<i128>) =
            match name.lookup_str() {
                "string" => ("string", String, None, None),
                "normalizedString" => {
                    ("normalizedString", NormalizedString, None, None)
                }
                "token" => ("token", Token, None, None),
                "boolean" => ("boolean", Boolean, None, None),
                "decimal" => ("decimal", Decimal, None, None),
                "integer" => ("integer", Integer, None, None),
                "long" => ("long", Integer, bound(i64::MIN), bound(i64::MAX)),
                "int" => ("int", Integer, bound(i32::MIN), bound(i32::MAX)),
                "short" => ("short", Integer, bound(i16::MIN), bound(i16::MAX)),
                "byte" => ("byte", Integer, bound(i8::MIN), bound(i8::MAX)),
                "nonNegativeInteger" => {
                    ("nonNegativeInteger", Integer, Some(0), None)
                }
                "positiveInteger" => {
                    ("positiveInteger", Integer, Some(1), None)
                }
                "nonPositiveInteger" => {
                    ("nonPositiveInteger", Integer, None, Some(0))
                }
                "negativeInteger" => {
                    ("negativeInteger", Integer, None, Some(-1))
                }
                "unsignedLong" => {
                    ("unsignedLong", Integer, Some(0), bound(u64::MAX))
                }
                "unsignedInt" => {
                    ("unsignedInt", Integer, Some(0), bound(u32::MAX))
                }
                "unsignedShort" => {
                    ("unsignedShort", Integer, Some(0), bound(u16::MAX))
                }
                "unsignedByte" => {
                    ("unsignedByte", Integer, Some(0), bound(u8::MAX))
                }
                "double" => ("double", Double, None, None),
                "float" => ("float", Float, None, None),
                "NCName" => ("NCName", NcName, None, None),
                "ID" => ("ID", NcName, None, None),
                "IDREF" => ("IDREF", NcName, None, None),
                "ENTITY" => ("ENTITY", NcName, None, None),
                "IDREFS" => ("IDREFS", IdRefs, None, None),
                "Name" => ("Name", Name, None, None),
                "NMTOKEN" => ("NMTOKEN", NmToken, None, None),
                "NMTOKENS" => ("NMTOKENS", NmTokens, None, None),
                "anyURI" => ("anyURI", AnyUri, None, None),
                "language" => ("language", Language, None, None),
                _ => return None,
            };

        Some(Self {
            name,
            kind,
            facets: Facets {
                min,
                max,
                ..Default::default()
            },
        })
    }

    fn apply_param(
        &mut self,
        name: SymbolId,
        param: SymbolId,
        value: SymbolId,
    ) -> Result<(), DatatypeError> {
        let unsupported = || DatatypeError::UnsupportedParam(name, param);
        let bad = || DatatypeError::BadParam(param, value);

        let lit = value.lookup_str().trim();

        match (param.lookup_str(), self.kind) {
            ("length" | "minLength" | "maxLength", kind)
                if kind.length_unit().is_some() =>
            {
                let n: usize = lit.parse().map_err(|_| bad())?;

                match param.lookup_str() {
                    "length" => {
                        self.facets.min_len = Some(n);
                        self.facets.max_len = Some(n);
                    }
                    "minLength" => self.facets.min_len = Some(n),
                    _ => self.facets.max_len = Some(n),
                }
            }

            (
                "minInclusive" | "maxInclusive" | "minExclusive"
                | "maxExclusive",
                Kind::Integer,
            ) => {
                let n = parse_integer(lit).ok_or_else(bad)?;

                match param.lookup_str() {
                    "minInclusive" => self.facets.narrow(Some(n), None),
                    "maxInclusive" => self.facets.narrow(None, Some(n)),
                    "minExclusive" => self
                        .facets
                        .narrow(Some(n.checked_add(1).ok_or_else(bad)?), None),
                    _ => self
                        .facets
                        .narrow(None, Some(n.checked_sub(1).ok_or_else(bad)?)),
                }
            }

            _ => return Err(unsupported()),
        }

        Ok(())
    }

    fn value_of(&self, norm: &str) -> Option<DataValue> {
        use Kind::*;

        match self.kind {
            String | NormalizedString | Token | AnyUri => {
                Some(DataValue::Str(norm.to_string()))
            }
            Boolean => match norm {
                "true" | "1" => Some(DataValue::Bool(true)),
                "false" | "0" => Some(DataValue::Bool(false)),
                _ => None,
            },
            Decimal => parse_decimal(norm).map(DataValue::Decimal),
            Integer => parse_integer(norm)
                .filter(|n| self.facets.check_range(*n))
                .map(DataValue::Int),
            Double => parse_float(norm).map(DataValue::Float),
            Float => {
                // Round through single precision so that values that are
                //   distinct doubles but equal floats compare equal.
                parse_float(norm).map(|f| DataValue::Float(f as f32 as f64))
            }
            NcName => is_ncname(norm).then(|| DataValue::Str(norm.into())),
            Name => is_name(norm).then(|| DataValue::Str(norm.into())),
            NmToken => is_nmtoken(norm).then(|| DataValue::Str(norm.into())),
            NmTokens | IdRefs => {
                let check = match self.kind {
                    NmTokens => is_nmtoken,
                    _ => is_ncname,
                };

                let items = norm
                    .split(' ')
                    .filter(|s| !s.is_empty())
                    .map(|s| check(s).then(|| DataValue::Str(s.into())))
                    .collect::<Option<Vec<_>>>()?;

                (!items.is_empty()).then_some(DataValue::List(items))
            }
            Language => is_language(norm).then(|| DataValue::Str(norm.into())),
        }
    }
}

impl Datatype for XsdDatatype {
    fn name(&self) -> &str {
        self.name
    }

    fn create_value(&self, lit: &str) -> Option<DataValue> {
        let norm = self.kind.white_space().normalize(lit);
        let value = self.value_of(&norm)?;

        let len = match (self.kind.length_unit(), &value) {
            (Some(LengthUnit::Items), DataValue::List(items)) => {
                Some(items.len())
            }
            (Some(_), _) => Some(norm.chars().count()),
            (None, _) => None,
        };

        match len {
            Some(len) if !self.facets.check_len(len) => None,
            _ => Some(value),
        }
    }
}

fn parse_integer(lit: &str) -> Option<i128> {
    let (digits, unsigned) = match lit.as_bytes().first() {
        Some(b'+') => (&lit[1..], &lit[1..]),
        Some(b'-') => (lit, &lit[1..]),
        _ => (lit, lit),
    };

    if unsigned.is_empty() || !unsigned.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    digits.parse().ok()
}

/// Parse a decimal into canonical form.
fn parse_decimal(lit: &str) -> Option<String> {
    let (neg, unsigned) = match lit.as_bytes().first() {
        Some(b'-') => (true, &lit[1..]),
        Some(b'+') => (false, &lit[1..]),
        _ => (false, lit),
    };

    let (int, frac) = unsigned.split_once('.').unwrap_or((unsigned, ""));

    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());

    if (int.is_empty() && frac.is_empty())
        || !all_digits(int)
        || !all_digits(frac)
    {
        return None;
    }

    let int = int.trim_start_matches('0');
    let frac = frac.trim_end_matches('0');

    let mut canon = String::with_capacity(int.len() + frac.len() + 3);

    if neg && !(int.is_empty() && frac.is_empty()) {
        canon.push('-');
    }

    canon.push_str(if int.is_empty() { "0" } else { int });

    if !frac.is_empty() {
        canon.push('.');
        canon.push_str(frac);
    }

    Some(canon)
}

/// Parse an XML Schema floating point literal.
///
/// Rust's own float parser accepts spellings that XML Schema does not
///   (e.g. `inf` and `infinity`),
///     so the lexical form is checked first.
fn parse_float(lit: &str) -> Option<f64> {
    match lit {
        "INF" | "+INF" => return Some(f64::INFINITY),
        "-INF" => return Some(f64::NEG_INFINITY),
        "NaN" => return Some(f64::NAN),
        _ => (),
    }

    let (mantissa, exp) = match lit.find(['e', 'E']) {
        Some(pos) => (&lit[..pos], Some(&lit[pos + 1..])),
        None => (lit, None),
    };

    let exp_ok = exp.map_or(true, |e| parse_integer(e).is_some());

    match (parse_decimal(mantissa), exp_ok) {
        (Some(_), true) => lit.parse().ok(),
        _ => None,
    }
}

fn is_name_start_char(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '.' | '-' | '_' | '\u{B7}')
}

fn is_ncname(s: &str) -> bool {
    let mut chars = s.chars();

    chars.next().map_or(false, is_name_start_char) && chars.all(is_name_char)
}

fn is_name(s: &str) -> bool {
    let mut chars = s.chars();

    chars
        .next()
        .map_or(false, |c| is_name_start_char(c) || c == ':')
        && chars.all(|c| is_name_char(c) || c == ':')
}

fn is_nmtoken(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| is_name_char(c) || c == ':')
}

/// `[a-zA-Z]{1,8}(-[a-zA-Z0-9]{1,8})*`
fn is_language(s: &str) -> bool {
    let mut parts = s.split('-');

    let valid_part = |part: &str, alpha_only: bool| {
        (1..=8).contains(&part.len())
            && part.bytes().all(|b| {
                b.is_ascii_alphabetic() || (!alpha_only && b.is_ascii_digit())
            })
    };

    parts.next().map_or(false, |first| valid_part(first, true))
        && parts.all(|part| valid_part(part, false))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn decimal_canonical_form() {
        assert_eq!(Some("1.5".into()), parse_decimal("001.500"));
        assert_eq!(Some("0".into()), parse_decimal("-0.0"));
        assert_eq!(Some("0.25".into()), parse_decimal(".25"));
        assert_eq!(Some("-3".into()), parse_decimal("-3."));
        assert_eq!(None, parse_decimal("."));
        assert_eq!(None, parse_decimal("1e3"));
        assert_eq!(None, parse_decimal(""));
    }

    #[test]
    fn float_lexical_space() {
        assert_eq!(Some(1000.0), parse_float("1e3"));
        assert_eq!(Some(f64::NEG_INFINITY), parse_float("-INF"));
        assert_eq!(None, parse_float("inf"));
        assert_eq!(None, parse_float("infinity"));
        assert_eq!(None, parse_float("1e"));
        assert!(parse_float("NaN").map_or(false, f64::is_nan));
    }

    #[test]
    fn names() {
        assert!(is_ncname("_foo-bar.1"));
        assert!(!is_ncname("1foo"));
        assert!(!is_ncname("a:b"));
        assert!(is_name("a:b"));
        assert!(is_nmtoken("1foo"));
        assert!(!is_nmtoken(""));
    }

    #[test]
    fn language_tags() {
        assert!(is_language("en"));
        assert!(is_language("en-US"));
        assert!(is_language("x-klingon1"));
        assert!(!is_language("en_US"));
        assert!(!is_language("toolonglang"));
        assert!(!is_language("1en"));
    }
}
