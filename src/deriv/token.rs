// Tokens consumed by residual computation
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

//! Units of input consumed by the residual engine.

use super::Deriver;
use crate::{
    datatype::{is_xml_blank, is_xml_space},
    expr::{Expr, ExprId},
    sym::GlobalSymbolResolve,
    xir::ExpName,
};
use std::fmt::Display;

/// A single unit of input.
///
/// Tokens are cheap to copy and borrow their data from the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    /// A run of text,
    ///   or a single word of a list.
    Literal(&'a str),

    /// A complete element,
    ///   represented by the [`Expr::Element`] expressions that it was
    ///   found to match.
    ///
    /// An element cannot be represented by its name alone,
    ///   since whether it matches an element expression depends also on
    ///   its attributes and content;
    ///     those are validated before this token is produced.
    Element(&'a [ExprId]),

    /// An attribute name and its value.
    Attribute(ExpName, &'a str),
}

impl<'a> Display for Token<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Literal(lit) => write!(f, "literal {lit:?}"),
            Self::Element(cands) => {
                write!(f, "element matching {} candidate(s)", cands.len())
            }
            Self::Attribute(name, value) => {
                write!(f, "attribute `@{name}={value:?}`")
            }
        }
    }
}

impl<'p> Deriver<'p> {
    /// Whether `tok` satisfies the leaf expression `leaf`.
    ///
    /// Composite expressions are never satisfied by a single token;
    ///   their residuals are computed structurally.
    pub fn accepts(&self, tok: Token, leaf: ExprId) -> bool {
        let pool = self.pool;

        match (tok, pool.get(leaf)) {
            (Token::Literal(_), Expr::Text) => true,

            (Token::Literal(lit), Expr::Data(dt, except)) => {
                pool.datatype(dt).is_valid(lit)
                    && except.map_or(true, |except| {
                        !pool.nullable(self.residual(except, tok))
                    })
            }

            (Token::Literal(lit), Expr::Value(dt, expected)) => {
                let dt = pool.datatype(dt);
                let expected = expected.lookup_str();

                match (dt.create_value(lit), dt.create_value(expected)) {
                    (Some(given), Some(expected)) => {
                        dt.same_value(&given, &expected)
                    }
                    _ => false,
                }
            }

            (Token::Literal(lit), Expr::List(body)) => {
                self.accepts_list(lit, body)
            }

            (Token::Element(cands), Expr::Element(..)) => {
                cands.contains(&leaf)
            }

            (Token::Attribute(name, value), Expr::Attribute(nc, vexpr)) => {
                pool.name_matches(nc, name)
                    && ((is_xml_blank(value) && pool.nullable(vexpr))
                        || pool.nullable(
                            self.residual(vexpr, Token::Literal(value)),
                        ))
            }

            _ => false,
        }
    }

    /// Whether the words of `lit` match `body` in order.
    fn accepts_list(&self, lit: &str, body: ExprId) -> bool {
        let mut cur = body;

        for word in lit.split(is_xml_space).filter(|w| !w.is_empty()) {
            cur = self.residual(cur, Token::Literal(word));

            if cur == ExprId::NOT_ALLOWED {
                return false;
            }
        }

        self.pool.nullable(cur)
    }
}
