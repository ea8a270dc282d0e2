// Residuals of regular tree expressions
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

//! Brzozowski derivatives over regular tree expressions.
//!
//! The _residual_ of an expression `e` with respect to a [`Token`] `t`
//!   is the expression matching everything that may follow `t` for the
//!   input as a whole to match `e`.
//! Validation is therefore little more than replacing the current
//!   expression with its residual for each token consumed,
//!     and checking at the end that the final expression is nullable.
//!
//! The engine is split by concern:
//!
//!   - this module computes [residuals](Deriver::residual) for text and
//!       element tokens;
//!   - [`token`] decides whether a token satisfies a leaf expression;
//!   - [`attr`] extracts attributes from an element's content
//!       expression,
//!         since attributes are unordered and are consumed all at once
//!         before any content;
//!   - [`collect`] determines which element expressions an element name
//!       may match,
//!         which is necessary because an element's content must be
//!         validated before we know whether it matched.
//!
//! Every expression produced here is constructed through the normalizing
//!   constructors of [`ExprPool`],
//!     which is what keeps the number of distinct residuals bounded.

use crate::{
    datatype::is_xml_blank,
    expr::{Expr, ExprId, ExprPool},
};
use fxhash::FxHashMap;

pub mod attr;
pub mod collect;
pub mod token;

pub use token::Token;

/// Residual computation against an [`ExprPool`].
///
/// The results of pruning are memoized for the lifetime of the
///   [`Deriver`],
///     since they depend only on the expression being pruned.
/// Residuals depend on the token and are memoized only for the duration
///   of a single computation.
pub struct Deriver<'p> {
    pool: &'p ExprPool,
    prune_memo: FxHashMap<ExprId, ExprId>,
    lenient_memo: FxHashMap<ExprId, ExprId>,
}

type Memo = FxHashMap<ExprId, ExprId>;

impl<'p> Deriver<'p> {
    pub fn new(pool: &'p ExprPool) -> Self {
        Self {
            pool,
            prune_memo: Default::default(),
            lenient_memo: Default::default(),
        }
    }

    pub fn pool(&self) -> &'p ExprPool {
        self.pool
    }

    /// Residual of `e` with respect to `tok`.
    ///
    /// A token followed by any input matching the residual is accepted
    ///   by `e`.
    /// A residual of [`Expr::NotAllowed`] means that `e` does not accept
    ///   the token at all.
    pub fn residual(&self, e: ExprId, tok: Token) -> ExprId {
        self.residual_memo(e, tok, &mut Memo::default())
    }

    fn residual_memo(&self, e: ExprId, tok: Token, memo: &mut Memo) -> ExprId {
        if let Some(result) = memo.get(&e) {
            return *result;
        }

        let pool = self.pool;

        let result = match pool.get(e) {
            Expr::Empty | Expr::NotAllowed => ExprId::NOT_ALLOWED,

            Expr::Text
            | Expr::Element(..)
            | Expr::Attribute(..)
            | Expr::Data(..)
            | Expr::Value(..)
            | Expr::List(..) => {
                if self.accepts(tok, e) {
                    ExprId::EMPTY
                } else {
                    ExprId::NOT_ALLOWED
                }
            }

            Expr::Group(a, b) => {
                let da = self.residual_memo(a, tok, memo);
                let first = pool.sequence(da, b);

                if pool.nullable(a) {
                    let db = self.residual_memo(b, tok, memo);
                    pool.choice(first, db)
                } else {
                    first
                }
            }

            Expr::Choice(a, b) => {
                let da = self.residual_memo(a, tok, memo);
                let db = self.residual_memo(b, tok, memo);
                pool.choice(da, db)
            }

            Expr::Interleave(a, b) => {
                let da = self.residual_memo(a, tok, memo);
                let db = self.residual_memo(b, tok, memo);

                let left = pool.interleave(a, db);
                let right = pool.interleave(da, b);
                pool.choice(left, right)
            }

            Expr::OneOrMore(a) => {
                let da = self.residual_memo(a, tok, memo);
                pool.sequence(da, pool.choice(e, ExprId::EMPTY))
            }

            // Mixed content absorbs any amount of text.
            Expr::Mixed(_) if matches!(tok, Token::Literal(_)) => e,

            Expr::Mixed(a) => {
                let da = self.residual_memo(a, tok, memo);
                pool.mixed(da)
            }

            Expr::Ref(r) => match pool.ref_body(r) {
                Some(body) => self.residual_memo(body, tok, memo),
                None => ExprId::NOT_ALLOWED,
            },
        };

        memo.insert(e, result);
        result
    }

    /// Residual of `e` with respect to a run of text.
    ///
    /// Text consisting only of whitespace may be treated as though it did
    ///   not occur,
    ///     so the result is the choice of `e` and its residual.
    pub fn text_residual(&self, e: ExprId, text: &str) -> ExprId {
        let residual = self.residual(e, Token::Literal(text));

        if is_xml_blank(text) {
            self.pool.choice(e, residual)
        } else {
            residual
        }
    }
}
