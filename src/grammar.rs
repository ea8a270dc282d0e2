// Compiled grammars
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

//! A complete grammar ready for validation.
//!
//! A [`Grammar`] pairs an [`ExprPool`] with the expression that a
//!   document must match.
//! Creating a grammar checks that every reference in the pool is bound
//!   and that no reference can reach itself without first passing
//!   through an [`Expr::Element`].
//! The latter ensures that nullability and derivation,
//!   which recurse through references but never into the content of an
//!   element,
//!   always terminate.

use crate::{
    expr::{Expr, ExprId, ExprPool, RefId},
    fmt::{DisplayWrapper, TtQuote},
    sym::SymbolId,
};
use fixedbitset::FixedBitSet;
use fxhash::FxHashSet;
use std::{error::Error, fmt::Display};

#[derive(Debug)]
pub struct Grammar {
    pool: ExprPool,
    start: ExprId,
}

impl Grammar {
    pub fn new(pool: ExprPool, start: ExprId) -> Result<Self, GrammarError> {
        if let Some(r) = pool.ref_ids().find(|r| pool.ref_body(*r).is_none())
        {
            return Err(GrammarError::UnboundRef(pool.ref_def(r).name));
        }

        check_recursion(&pool)?;

        Ok(Self { pool, start })
    }

    pub fn pool(&self) -> &ExprPool {
        &self.pool
    }

    /// The expression that the document must match.
    pub fn start(&self) -> ExprId {
        self.start
    }
}

/// Detect reference cycles that do not pass through an element.
///
/// This is a depth-first search over the graph whose edges connect each
///   reference to the references reachable from its body without entering
///   an element.
/// A reference reached again while still on the DFS stack closes a
///   cycle.
fn check_recursion(pool: &ExprPool) -> Result<(), GrammarError> {
    let edges = pool
        .ref_ids()
        .map(|r| unguarded_refs(pool, r))
        .collect::<Vec<_>>();

    let mut visited = FixedBitSet::with_capacity(edges.len());
    let mut finished = FixedBitSet::with_capacity(edges.len());
    let mut stack: Vec<(RefId, usize)> = Vec::new();

    for root in pool.ref_ids() {
        if visited.put(root.as_usize()) {
            continue;
        }

        stack.push((root, 0));

        while let Some((r, next_edge)) = stack.last_mut() {
            match edges[r.as_usize()].get(*next_edge) {
                Some(&target) => {
                    *next_edge += 1;

                    if !visited.put(target.as_usize()) {
                        stack.push((target, 0));
                    } else if !finished.contains(target.as_usize()) {
                        return Err(GrammarError::UnguardedRecursion(
                            pool.ref_def(target).name,
                        ));
                    }
                }
                None => {
                    finished.insert(r.as_usize());
                    stack.pop();
                }
            }
        }
    }

    Ok(())
}

/// References reachable from the body of `r` without entering an
///   element.
fn unguarded_refs(pool: &ExprPool, r: RefId) -> Vec<RefId> {
    let mut found = Vec::new();
    let mut seen = FxHashSet::default();
    let mut stack = Vec::from_iter(pool.ref_body(r));

    while let Some(id) = stack.pop() {
        if !seen.insert(id) {
            continue;
        }

        match pool.get(id) {
            Expr::Empty
            | Expr::NotAllowed
            | Expr::Text
            | Expr::Element(..)
            | Expr::Value(..)
            | Expr::Data(_, None) => (),

            Expr::Attribute(_, a)
            | Expr::Data(_, Some(a))
            | Expr::List(a)
            | Expr::OneOrMore(a)
            | Expr::Mixed(a) => stack.push(a),

            Expr::Group(a, b) | Expr::Choice(a, b) | Expr::Interleave(a, b) => {
                stack.push(a);
                stack.push(b);
            }

            Expr::Ref(target) => found.push(target),
        }
    }

    found
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrammarError {
    /// A reference was never given a body.
    UnboundRef(SymbolId),

    /// A reference can reach itself without passing through an element.
    UnguardedRecursion(SymbolId),
}

impl Display for GrammarError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnboundRef(name) => {
                write!(f, "reference to undefined {}", TtQuote::wrap(name))
            }
            Self::UnguardedRecursion(name) => write!(
                f,
                "{} refers to itself outside of any element",
                TtQuote::wrap(name)
            ),
        }
    }
}

impl Error for GrammarError {}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{sym::GlobalSymbolIntern, xir::ExpName};

    fn ele(pool: &ExprPool, name: &str, content: ExprId) -> ExprId {
        let nc = pool.name(ExpName::local(name.intern()));
        pool.element(nc, content)
    }

    #[test]
    fn grammar_without_refs() {
        let pool = ExprPool::new();
        let start = ele(&pool, "root", ExprId::EMPTY);

        let sut = Grammar::new(pool, start).expect("grammar should be valid");

        assert_eq!(start, sut.start());
    }

    #[test]
    fn unbound_ref_rejected() {
        let pool = ExprPool::new();
        let r = pool.new_ref("missing".intern());
        let start = ele(&pool, "root", pool.reference(r));

        assert_eq!(
            GrammarError::UnboundRef("missing".intern()),
            Grammar::new(pool, start).unwrap_err(),
        );
    }

    #[test]
    fn recursion_through_element_accepted() {
        let pool = ExprPool::new();
        let r = pool.new_ref("tree".intern());
        let rexpr = pool.reference(r);

        pool.bind_ref(r, ele(&pool, "node", pool.zero_or_more(rexpr)))
            .unwrap();

        assert!(Grammar::new(pool, rexpr).is_ok());
    }

    #[test]
    fn direct_unguarded_recursion_rejected() {
        let pool = ExprPool::new();
        let r = pool.new_ref("loop".intern());
        let rexpr = pool.reference(r);

        // loop = empty | (text, loop)
        let more = pool.sequence(ExprId::TEXT, rexpr);
        pool.bind_ref(r, pool.choice(ExprId::EMPTY, more)).unwrap();

        assert_eq!(
            GrammarError::UnguardedRecursion("loop".intern()),
            Grammar::new(pool, rexpr).unwrap_err(),
        );
    }

    #[test]
    fn indirect_unguarded_recursion_rejected() {
        let pool = ExprPool::new();
        let a = pool.new_ref("a".intern());
        let b = pool.new_ref("b".intern());

        pool.bind_ref(a, pool.optional(pool.reference(b))).unwrap();
        pool.bind_ref(b, pool.one_or_more(pool.reference(a))).unwrap();

        let start = ele(&pool, "root", pool.reference(a));

        assert!(matches!(
            Grammar::new(pool, start),
            Err(GrammarError::UnguardedRecursion(_))
        ));
    }

    #[test]
    fn shared_non_recursive_ref_accepted() {
        let pool = ExprPool::new();
        let leaf = pool.new_ref("leaf".intern());
        let lexpr = pool.reference(leaf);

        pool.bind_ref(leaf, ExprId::TEXT).unwrap();

        // Two paths to the same reference is not a cycle.
        let start = pool.interleave(
            ele(&pool, "a", lexpr),
            pool.sequence(lexpr, pool.optional(lexpr)),
        );

        assert!(Grammar::new(pool, start).is_ok());
    }
}
