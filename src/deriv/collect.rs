// Element candidate collection
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

//! Element expressions that may match the next element.
//!
//! When an element opens,
//!   we know only its name and attributes,
//!     but whether it satisfies a given [`Expr::Element`] depends also on
//!     its content.
//! We therefore collect every element expression that could legally
//!   appear next and whose name class admits the name,
//!     validate the content against all of them at once,
//!     and derive by an [`Token::Element`](super::Token::Element)
//!       carrying those candidates that the content satisfied.

use super::Deriver;
use crate::{
    expr::{Expr, ExprId, NameClassId},
    xir::ExpName,
};
use fxhash::FxHashSet;

impl<'p> Deriver<'p> {
    /// Element expressions reachable as the next token of `e` whose name
    ///   class matches `name`.
    ///
    /// The result is in order of discovery and contains no duplicates.
    /// An empty result means that `e` does not permit an element named
    ///   `name` here.
    pub fn collect(&self, e: ExprId, name: ExpName) -> Vec<ExprId> {
        let pool = self.pool;
        let mut found = Vec::new();

        self.walk_first(e, |id, nc, _| {
            if pool.name_matches(nc, name) && !found.contains(&id) {
                found.push(id);
            }
        });

        found
    }

    /// Name classes of every element that could legally appear next
    ///   in `e`.
    ///
    /// This is used to describe what was expected in place of an
    ///   unexpected element.
    pub fn expected(&self, e: ExprId) -> Vec<NameClassId> {
        let mut found = Vec::new();

        self.walk_first(e, |_, nc, _| {
            if !found.contains(&nc) {
                found.push(nc);
            }
        });

        found
    }

    /// Visit each [`Expr::Element`] that may begin `e`.
    ///
    /// The second operand of a [`Expr::Group`] is entered only if the
    ///   first is nullable.
    /// Both operands of an [`Expr::Interleave`] are always entered.
    fn walk_first<F>(&self, e: ExprId, mut f: F)
    where
        F: FnMut(ExprId, NameClassId, ExprId),
    {
        let pool = self.pool;
        let mut seen = FxHashSet::default();
        let mut stack = vec![e];

        while let Some(id) = stack.pop() {
            if !seen.insert(id) {
                continue;
            }

            match pool.get(id) {
                Expr::Element(nc, content) => f(id, nc, content),

                Expr::Group(a, b) => {
                    if pool.nullable(a) {
                        stack.push(b);
                    }
                    stack.push(a);
                }

                Expr::Choice(a, b) | Expr::Interleave(a, b) => {
                    stack.push(b);
                    stack.push(a);
                }

                Expr::OneOrMore(a) | Expr::Mixed(a) => stack.push(a),

                Expr::Ref(r) => stack.extend(pool.ref_body(r)),

                Expr::Empty
                | Expr::NotAllowed
                | Expr::Text
                | Expr::Attribute(..)
                | Expr::Data(..)
                | Expr::Value(..)
                | Expr::List(..) => (),
            }
        }
    }
}
