// Normalizing expression constructors
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

//! Normalizing constructors for [`Expr`].
//!
//! Every expression,
//!   whether part of the original grammar or a residual computed during
//!   validation,
//!   is constructed through these methods.
//! They apply the algebraic identities of the expression language so
//!   that equivalent expressions tend to share a single [`ExprId`]:
//!
//!   - [`Expr::NotAllowed`] annihilates sequence,
//!       interleaving,
//!       and repetition,
//!     and is the identity of choice;
//!   - [`Expr::Empty`] is the identity of sequence and interleaving;
//!   - choices are flattened,
//!       deduplicated,
//!       and ordered,
//!     so that choice is idempotent,
//!       commutative,
//!       and associative up to identity.
//!
//! The last of these is what bounds the growth of the pool during
//!   validation:
//!     derivation produces choices of residuals,
//!       and without it the same alternatives would accumulate in
//!       ever-deeper nestings.
//!
//! No simplification depends on nullability,
//!   since references may be unbound while a grammar is being
//!   constructed.

use super::{DatatypeId, Expr, ExprId, ExprPool, NameClassId, RefId};
use crate::sym::SymbolId;

impl ExprPool {
    pub fn empty(&self) -> ExprId {
        ExprId::EMPTY
    }

    pub fn not_allowed(&self) -> ExprId {
        ExprId::NOT_ALLOWED
    }

    pub fn text(&self) -> ExprId {
        ExprId::TEXT
    }

    pub fn element(&self, nc: NameClassId, content: ExprId) -> ExprId {
        self.intern(Expr::Element(nc, content))
    }

    pub fn attribute(&self, nc: NameClassId, value: ExprId) -> ExprId {
        self.intern(Expr::Attribute(nc, value))
    }

    /// A literal valid for `dt`,
    ///   excluding literals matching `except`.
    ///
    /// An exception of [`Expr::NotAllowed`] excludes nothing.
    pub fn data(&self, dt: DatatypeId, except: Option<ExprId>) -> ExprId {
        let except = except.filter(|e| *e != ExprId::NOT_ALLOWED);
        self.intern(Expr::Data(dt, except))
    }

    pub fn value(&self, dt: DatatypeId, lit: SymbolId) -> ExprId {
        self.intern(Expr::Value(dt, lit))
    }

    pub fn list(&self, body: ExprId) -> ExprId {
        match body {
            ExprId::NOT_ALLOWED => ExprId::NOT_ALLOWED,
            _ => self.intern(Expr::List(body)),
        }
    }

    pub fn reference(&self, r: RefId) -> ExprId {
        self.intern(Expr::Ref(r))
    }

    /// `a` followed by `b`.
    pub fn sequence(&self, a: ExprId, b: ExprId) -> ExprId {
        match (a, b) {
            (ExprId::NOT_ALLOWED, _) | (_, ExprId::NOT_ALLOWED) => {
                ExprId::NOT_ALLOWED
            }
            (ExprId::EMPTY, x) | (x, ExprId::EMPTY) => x,
            _ => self.intern(Expr::Group(a, b)),
        }
    }

    pub fn interleave(&self, a: ExprId, b: ExprId) -> ExprId {
        match (a, b) {
            (ExprId::NOT_ALLOWED, _) | (_, ExprId::NOT_ALLOWED) => {
                ExprId::NOT_ALLOWED
            }
            (ExprId::EMPTY, x) | (x, ExprId::EMPTY) => x,
            _ => self.intern(Expr::Interleave(a, b)),
        }
    }

    /// Either `a` or `b`.
    ///
    /// The result is a right-nested chain of the distinct,
    ///   non-[`Expr::NotAllowed`] choice leaves of both operands,
    ///   ordered by [`ExprId`].
    pub fn choice(&self, a: ExprId, b: ExprId) -> ExprId {
        match (a, b) {
            (ExprId::NOT_ALLOWED, x) | (x, ExprId::NOT_ALLOWED) => return x,
            _ if a == b => return a,
            _ => (),
        }

        let mut leaves = Vec::new();
        self.choice_leaves(a, &mut leaves);
        self.choice_leaves(b, &mut leaves);

        leaves.sort_unstable();
        leaves.dedup();

        let mut rest = leaves.into_iter().rev();

        match rest.next() {
            None => ExprId::NOT_ALLOWED,
            Some(last) => rest.fold(last, |acc, leaf| {
                self.intern(Expr::Choice(leaf, acc))
            }),
        }
    }

    fn choice_leaves(&self, id: ExprId, dest: &mut Vec<ExprId>) {
        match self.get(id) {
            Expr::Choice(a, b) => {
                self.choice_leaves(a, dest);
                self.choice_leaves(b, dest);
            }
            Expr::NotAllowed => (),
            _ => dest.push(id),
        }
    }

    /// Choice over every expression of `ids`.
    ///
    /// The empty choice is [`Expr::NotAllowed`].
    pub fn choice_all<I: IntoIterator<Item = ExprId>>(&self, ids: I) -> ExprId {
        ids.into_iter()
            .fold(ExprId::NOT_ALLOWED, |acc, id| self.choice(acc, id))
    }

    pub fn one_or_more(&self, a: ExprId) -> ExprId {
        match self.get(a) {
            Expr::NotAllowed | Expr::Empty | Expr::OneOrMore(_) => a,
            _ => self.intern(Expr::OneOrMore(a)),
        }
    }

    pub fn zero_or_more(&self, a: ExprId) -> ExprId {
        let more = self.one_or_more(a);
        self.choice(more, ExprId::EMPTY)
    }

    pub fn optional(&self, a: ExprId) -> ExprId {
        self.choice(a, ExprId::EMPTY)
    }

    /// `a` interleaved with any amount of text.
    pub fn mixed(&self, a: ExprId) -> ExprId {
        match self.get(a) {
            Expr::NotAllowed | Expr::Mixed(_) => a,
            _ => self.intern(Expr::Mixed(a)),
        }
    }
}
