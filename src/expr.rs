// Regular tree expressions
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

//! Regular tree expressions.
//!
//! A grammar is an [`Expr`] DAG describing what a document may contain.
//! Leaves match a single unit of input
//!   (an element, an attribute, a run of text, a datatype literal),
//!   and composites combine expressions by sequence ([`Expr::Group`]),
//!     alternation ([`Expr::Choice`]),
//!     interleaving ([`Expr::Interleave`]),
//!     and repetition ([`Expr::OneOrMore`]).
//!
//! Expressions are never referenced directly;
//!   they are stored in an [`ExprPool`] and addressed by [`ExprId`].
//! The pool is hash-consed:
//!   interning an expression that is structurally equal to one already in
//!   the pool yields the existing [`ExprId`],
//!     and so two expressions are equal if and only if their ids are.
//! This is what keeps derivation from growing without bound
//!   (see [`crate::deriv`]),
//!     since the residuals of a grammar are drawn from a finite set of
//!     distinct expressions that the pool will eventually contain.
//!
//! Expressions must be constructed using the normalizing constructors
//!   of [`ExprPool`]
//!     (e.g. [`ExprPool::choice`]; see [`build`]),
//!   which simplify as they construct.
//!
//! Recursion
//! =========
//! A grammar may refer to itself through an [`Expr::Ref`],
//!   whose body is bound separately via [`ExprPool::bind_ref`].
//! This allows references to be created before the expression they refer
//!   to exists,
//!     which is necessary for both forward references and recursion.
//! Only recursion that passes through an [`Expr::Element`] is
//!   permitted;
//!     this is checked when a [`Grammar`](crate::grammar::Grammar) is
//!     created.

use crate::{
    global,
    sym::{GlobalSymbolResolve, SymbolId},
    xir::ExpName,
};
use std::fmt::Display;

mod build;
mod pool;

pub use pool::{ExprDisplay, ExprPool};

/// Handle to an [`Expr`] within an [`ExprPool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ExprId(global::ExprSize);

impl ExprId {
    /// Matches only the empty sequence.
    pub const EMPTY: Self = Self(0);

    /// Matches nothing at all.
    pub const NOT_ALLOWED: Self = Self(1);

    /// Matches a single run of text.
    pub const TEXT: Self = Self(2);

    fn from_index(index: usize) -> Self {
        Self(
            global::ExprSize::try_from(index)
                .expect("internal error: ExprId range exhausted"),
        )
    }

    pub fn as_usize(self) -> usize {
        self.0 as usize
    }
}

/// Handle to a [`NameClass`] within an [`ExprPool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NameClassId(u32);

/// Handle to a [`Datatype`](crate::datatype::Datatype) registered with
///   an [`ExprPool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DatatypeId(u32);

/// Handle to a named reference within an [`ExprPool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RefId(u32);

impl RefId {
    pub fn as_usize(self) -> usize {
        self.0 as usize
    }
}

/// A regular tree expression.
///
/// Operands are [`ExprId`]s into the [`ExprPool`] that owns the
///   expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Expr {
    /// The empty sequence.
    Empty,

    /// Nothing;
    ///   the annihilator of sequence and interleaving and the identity of
    ///   choice.
    NotAllowed,

    /// A single run of text.
    ///
    /// This is _not_ nullable;
    ///   an element containing no text at all is treated as containing
    ///   an empty run by the validator.
    Text,

    /// An element whose name matches the name class and whose
    ///   attributes and children match the content expression.
    Element(NameClassId, ExprId),

    /// An attribute whose name matches the name class and whose value
    ///   matches the value expression.
    Attribute(NameClassId, ExprId),

    /// A literal valid according to the datatype that does not match the
    ///   optional exception.
    Data(DatatypeId, Option<ExprId>),

    /// A literal equal to the given literal according to the datatype.
    Value(DatatypeId, SymbolId),

    /// Whitespace-separated tokens matching the body in order.
    List(ExprId),

    /// The first expression followed by the second.
    Group(ExprId, ExprId),

    Choice(ExprId, ExprId),

    /// Both expressions,
    ///   with their input arbitrarily interleaved.
    Interleave(ExprId, ExprId),

    OneOrMore(ExprId),

    /// The expression interleaved with any amount of text.
    Mixed(ExprId),

    /// A named reference,
    ///   bound lazily.
    Ref(RefId),
}

/// A predicate over expanded names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NameClass {
    /// Exactly this name.
    Name(ExpName),

    /// Any name not matching the optional exception.
    AnyName(Option<NameClassId>),

    /// Any name in the given namespace not matching the optional
    ///   exception.
    NsName(SymbolId, Option<NameClassId>),

    Choice(NameClassId, NameClassId),
}

/// A named reference and its body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefDef {
    pub name: SymbolId,
    pub body: Option<ExprId>,
}

/// Rendering of a [`NameClass`],
///   requiring its pool to render nested classes.
pub struct NameClassDisplay<'p> {
    pool: &'p ExprPool,
    nc: NameClassId,
}

impl<'p> NameClassDisplay<'p> {
    pub(crate) fn new(pool: &'p ExprPool, nc: NameClassId) -> Self {
        Self { pool, nc }
    }
}

impl<'p> Display for NameClassDisplay<'p> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let pool = self.pool;
        let sub = |nc| NameClassDisplay::new(pool, nc);

        match pool.name_class(self.nc) {
            NameClass::Name(name) => name.fmt(f),
            NameClass::AnyName(None) => write!(f, "*"),
            NameClass::AnyName(Some(except)) => {
                write!(f, "* - ({})", sub(except))
            }
            NameClass::NsName(ns, except) => {
                match ns.lookup_str() {
                    "" => write!(f, "{{}}*")?,
                    uri => write!(f, "{{{uri}}}*")?,
                }

                match except {
                    Some(except) => write!(f, " - ({})", sub(except)),
                    None => Ok(()),
                }
            }
            NameClass::Choice(a, b) => write!(f, "{} | {}", sub(a), sub(b)),
        }
    }
}

#[cfg(test)]
mod test;
