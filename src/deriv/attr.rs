// Attribute extraction and pruning
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

//! Attribute extraction and pruning.
//!
//! Attributes are unordered,
//!   and so cannot be consumed by ordinary residuals,
//!     which respect the order of [`Expr::Group`].
//! Instead,
//!   each attribute is _fed_ to the content expression of its element,
//!   removing one matching [`Expr::Attribute`] leaf wherever it may occur
//!     irrespective of the order of its siblings.
//! Once every attribute has been fed,
//!   the expression is _pruned_:
//!     any attribute leaf that remains was not provided,
//!     and so is replaced with [`Expr::NotAllowed`].
//! If the result is [`Expr::NotAllowed`],
//!   then a required attribute is missing.

use super::{Deriver, Memo, Token};
use crate::{
    expr::{Expr, ExprId, ExprPool, NameClassId},
    xir::ExpName,
};

impl<'p> Deriver<'p> {
    /// Consume the attribute `name`=`value` from `e`.
    ///
    /// The result is [`Expr::NotAllowed`] if `e` does not permit the
    ///   attribute.
    pub fn feed(&self, e: ExprId, name: ExpName, value: &str) -> ExprId {
        let tok = Token::Attribute(name, value);
        self.feed_memo(e, tok, false, &mut Memo::default())
    }

    /// Consume an attribute `name` from `e` without regard to its value.
    ///
    /// This discharges an attribute whose value has already been
    ///   reported as invalid,
    ///     so that it is not also reported as missing.
    pub fn feed_name(&self, e: ExprId, name: ExpName) -> ExprId {
        let tok = Token::Attribute(name, "");
        self.feed_memo(e, tok, true, &mut Memo::default())
    }

    fn feed_memo(
        &self,
        e: ExprId,
        tok: Token,
        lax: bool,
        memo: &mut Memo,
    ) -> ExprId {
        if let Some(result) = memo.get(&e) {
            return *result;
        }

        let pool = self.pool;

        let result = match pool.get(e) {
            Expr::Attribute(nc, _) if lax && matches_name(tok, nc, pool) => {
                ExprId::EMPTY
            }
            Expr::Attribute(..) if !lax && self.accepts(tok, e) => {
                ExprId::EMPTY
            }

            Expr::Group(a, b) => {
                let fa = self.feed_memo(a, tok, lax, memo);
                let fb = self.feed_memo(b, tok, lax, memo);

                match (fa, fb) {
                    (ExprId::NOT_ALLOWED, _) => pool.sequence(a, fb),
                    (_, ExprId::NOT_ALLOWED) => pool.sequence(fa, b),
                    _ => {
                        pool.choice(pool.sequence(a, fb), pool.sequence(fa, b))
                    }
                }
            }

            Expr::Interleave(a, b) => {
                let fa = self.feed_memo(a, tok, lax, memo);
                let fb = self.feed_memo(b, tok, lax, memo);

                match (fa, fb) {
                    (ExprId::NOT_ALLOWED, _) => pool.interleave(a, fb),
                    (_, ExprId::NOT_ALLOWED) => pool.interleave(fa, b),
                    _ => pool.choice(
                        pool.interleave(a, fb),
                        pool.interleave(fa, b),
                    ),
                }
            }

            Expr::Choice(a, b) => {
                let fa = self.feed_memo(a, tok, lax, memo);
                let fb = self.feed_memo(b, tok, lax, memo);
                pool.choice(fa, fb)
            }

            Expr::OneOrMore(a) => {
                let fa = self.feed_memo(a, tok, lax, memo);
                pool.sequence(fa, pool.choice(e, ExprId::EMPTY))
            }

            Expr::Mixed(a) => {
                let fa = self.feed_memo(a, tok, lax, memo);
                pool.mixed(fa)
            }

            Expr::Ref(r) => match pool.ref_body(r) {
                Some(body) => self.feed_memo(body, tok, lax, memo),
                None => ExprId::NOT_ALLOWED,
            },

            Expr::Attribute(..)
            | Expr::Empty
            | Expr::NotAllowed
            | Expr::Text
            | Expr::Element(..)
            | Expr::Data(..)
            | Expr::Value(..)
            | Expr::List(..) => ExprId::NOT_ALLOWED,
        };

        memo.insert(e, result);
        result
    }

    /// Replace every remaining attribute leaf with [`Expr::NotAllowed`].
    ///
    /// This is to be applied after all attributes of an element have been
    ///   [fed](Self::feed).
    pub fn prune(&mut self, e: ExprId) -> ExprId {
        let mut memo = std::mem::take(&mut self.prune_memo);
        let result = self.prune_with(e, ExprId::NOT_ALLOWED, &mut memo);

        self.prune_memo = memo;
        result
    }

    /// Replace every remaining attribute leaf with [`Expr::Empty`],
    ///   as if each missing attribute had been provided.
    ///
    /// This allows validation of the content of an element to continue
    ///   after a missing attribute has been reported.
    pub fn prune_lenient(&mut self, e: ExprId) -> ExprId {
        let mut memo = std::mem::take(&mut self.lenient_memo);
        let result = self.prune_with(e, ExprId::EMPTY, &mut memo);

        self.lenient_memo = memo;
        result
    }

    fn prune_with(&self, e: ExprId, attr: ExprId, memo: &mut Memo) -> ExprId {
        if let Some(result) = memo.get(&e) {
            return *result;
        }

        let pool = self.pool;

        let result = match pool.get(e) {
            Expr::Attribute(..) => attr,

            Expr::Group(a, b) => {
                let pa = self.prune_with(a, attr, memo);
                let pb = self.prune_with(b, attr, memo);
                pool.sequence(pa, pb)
            }

            Expr::Interleave(a, b) => {
                let pa = self.prune_with(a, attr, memo);
                let pb = self.prune_with(b, attr, memo);
                pool.interleave(pa, pb)
            }

            Expr::Choice(a, b) => {
                let pa = self.prune_with(a, attr, memo);
                let pb = self.prune_with(b, attr, memo);
                pool.choice(pa, pb)
            }

            Expr::OneOrMore(a) => {
                let pa = self.prune_with(a, attr, memo);
                pool.one_or_more(pa)
            }

            Expr::Mixed(a) => {
                let pa = self.prune_with(a, attr, memo);
                pool.mixed(pa)
            }

            Expr::Ref(r) => match pool.ref_body(r) {
                Some(body) => self.prune_with(body, attr, memo),
                None => ExprId::NOT_ALLOWED,
            },

            // Attributes of child elements belong to those elements.
            Expr::Empty
            | Expr::NotAllowed
            | Expr::Text
            | Expr::Element(..)
            | Expr::Data(..)
            | Expr::Value(..)
            | Expr::List(..) => e,
        };

        memo.insert(e, result);
        result
    }

    /// Name classes of the attributes that `e` cannot do without.
    ///
    /// This is used to describe a missing attribute,
    ///   and so is intended to be applied to an expression that failed
    ///   to [`prune`](Self::prune).
    /// Attributes that are only one of several satisfiable alternatives
    ///   are not required.
    pub fn required_attrs(&mut self, e: ExprId) -> Vec<NameClassId> {
        let mut found = Vec::new();
        self.required_attrs_into(e, &mut found);
        found
    }

    fn required_attrs_into(&mut self, e: ExprId, dest: &mut Vec<NameClassId>) {
        let pool = self.pool;

        match pool.get(e) {
            Expr::Attribute(nc, _) if !dest.contains(&nc) => dest.push(nc),

            Expr::Group(a, b) | Expr::Interleave(a, b) => {
                self.required_attrs_into(a, dest);
                self.required_attrs_into(b, dest);
            }

            Expr::Choice(a, b) => {
                let satisfiable = self.prune(a) != ExprId::NOT_ALLOWED
                    || self.prune(b) != ExprId::NOT_ALLOWED;

                if !satisfiable {
                    self.required_attrs_into(a, dest);
                    self.required_attrs_into(b, dest);
                }
            }

            Expr::OneOrMore(a) | Expr::Mixed(a) => {
                self.required_attrs_into(a, dest)
            }

            Expr::Ref(r) => {
                if let Some(body) = pool.ref_body(r) {
                    self.required_attrs_into(body, dest)
                }
            }

            _ => (),
        }
    }
}

/// Whether `tok` is an attribute whose name is matched by `nc`.
fn matches_name(tok: Token, nc: NameClassId, pool: &ExprPool) -> bool {
    matches!(tok, Token::Attribute(name, _) if pool.name_matches(nc, name))
}
