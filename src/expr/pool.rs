// Hash-consed expression pool
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

//! Storage for expressions.
//!
//! The pool is append-only:
//!   expressions are never removed or modified once interned,
//!     with the exception of binding the body of a reference,
//!     which may happen only once.
//! Interior mutability allows residuals to be interned through a shared
//!   reference while a [`Grammar`](crate::grammar::Grammar) holding the
//!   pool is borrowed by a validator;
//!     consequently,
//!       the pool cannot be shared between threads.

use super::{
    DatatypeId, Expr, ExprId, NameClass, NameClassDisplay, NameClassId,
    RefDef, RefId,
};
use crate::{datatype::Datatype, global, sym::SymbolId, xir::ExpName};
use fxhash::FxHashMap;
use std::{cell::RefCell, fmt::Display, rc::Rc};

/// Hash-consed store of [`Expr`]s and the name classes,
///   datatypes,
///   and references that they refer to.
pub struct ExprPool {
    exprs: RefCell<Vec<Expr>>,
    index: RefCell<FxHashMap<Expr, ExprId>>,

    /// Nullability of each expression by [`ExprId`],
    ///   written at most once.
    nullable: RefCell<Vec<Option<bool>>>,

    name_classes: RefCell<Vec<NameClass>>,
    nc_index: RefCell<FxHashMap<NameClass, NameClassId>>,

    datatypes: RefCell<Vec<Rc<dyn Datatype>>>,
    refs: RefCell<Vec<RefDef>>,
}

impl Default for ExprPool {
    fn default() -> Self {
        Self::new()
    }
}

impl ExprPool {
    pub fn new() -> Self {
        let cap = global::INIT_EXPR_POOL_CAPACITY;

        let pool = Self {
            exprs: RefCell::new(Vec::with_capacity(cap)),
            index: RefCell::new(FxHashMap::with_capacity_and_hasher(
                cap,
                Default::default(),
            )),
            nullable: RefCell::new(Vec::with_capacity(cap)),
            name_classes: Default::default(),
            nc_index: Default::default(),
            datatypes: Default::default(),
            refs: Default::default(),
        };

        // These must be interned in the same order as the constants of
        //   `ExprId`.
        pool.intern(Expr::Empty);
        pool.intern(Expr::NotAllowed);
        pool.intern(Expr::Text);

        pool
    }

    /// Retrieve the expression identified by `id`.
    ///
    /// Panics
    /// ======
    /// Will panic if `id` was not produced by this pool.
    pub fn get(&self, id: ExprId) -> Expr {
        self.exprs.borrow()[id.as_usize()]
    }

    /// Number of distinct expressions in the pool.
    pub fn len(&self) -> usize {
        self.exprs.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        // The constants are always present.
        false
    }

    /// Intern `expr` without simplification.
    ///
    /// Outside of this module,
    ///   only the normalizing constructors may call this.
    pub(super) fn intern(&self, expr: Expr) -> ExprId {
        if let Some(id) = self.index.borrow().get(&expr) {
            return *id;
        }

        let mut exprs = self.exprs.borrow_mut();
        let id = ExprId::from_index(exprs.len());

        exprs.push(expr);
        self.nullable.borrow_mut().push(None);
        self.index.borrow_mut().insert(expr, id);

        id
    }

    pub fn name_class(&self, id: NameClassId) -> NameClass {
        self.name_classes.borrow()[id.0 as usize]
    }

    pub fn intern_name_class(&self, nc: NameClass) -> NameClassId {
        if let Some(id) = self.nc_index.borrow().get(&nc) {
            return *id;
        }

        let mut ncs = self.name_classes.borrow_mut();
        let id = NameClassId(ncs.len() as u32);

        ncs.push(nc);
        self.nc_index.borrow_mut().insert(nc, id);

        id
    }

    /// Intern a name class matching exactly `name`.
    pub fn name(&self, name: ExpName) -> NameClassId {
        self.intern_name_class(NameClass::Name(name))
    }

    /// Whether `name` is a member of the name class `nc`.
    pub fn name_matches(&self, nc: NameClassId, name: ExpName) -> bool {
        let excluded = |except: Option<NameClassId>| {
            except.map_or(false, |except| self.name_matches(except, name))
        };

        match self.name_class(nc) {
            NameClass::Name(expected) => expected == name,
            NameClass::AnyName(except) => !excluded(except),
            NameClass::NsName(ns, except) => {
                ns == name.ns && !excluded(except)
            }
            NameClass::Choice(a, b) => {
                self.name_matches(a, name) || self.name_matches(b, name)
            }
        }
    }

    /// Render a name class for display.
    pub fn display_name_class(
        &self,
        nc: NameClassId,
    ) -> NameClassDisplay<'_> {
        NameClassDisplay::new(self, nc)
    }

    /// Register a datatype for use by [`Expr::Data`] and [`Expr::Value`].
    ///
    /// Datatypes are not deduplicated,
    ///   since they cannot be compared;
    ///     callers that resolve the same datatype repeatedly should
    ///     cache the resulting [`DatatypeId`].
    pub fn register_datatype(&self, dt: Rc<dyn Datatype>) -> DatatypeId {
        let mut dts = self.datatypes.borrow_mut();
        let id = DatatypeId(dts.len() as u32);

        dts.push(dt);
        id
    }

    pub fn datatype(&self, id: DatatypeId) -> Rc<dyn Datatype> {
        self.datatypes.borrow()[id.0 as usize].clone()
    }

    /// Allocate a new,
    ///   unbound,
    ///   reference named `name`.
    ///
    /// Names are for display only;
    ///   two references with the same name are distinct.
    pub fn new_ref(&self, name: SymbolId) -> RefId {
        let mut refs = self.refs.borrow_mut();
        let id = RefId(refs.len() as u32);

        refs.push(RefDef { name, body: None });
        id
    }

    /// Bind the body of a reference.
    ///
    /// A reference may be bound only once;
    ///   an attempt to rebind yields the existing body as an error.
    pub fn bind_ref(&self, r: RefId, body: ExprId) -> Result<(), ExprId> {
        let mut refs = self.refs.borrow_mut();
        let def = &mut refs[r.as_usize()];

        match def.body {
            Some(existing) => Err(existing),
            None => {
                def.body = Some(body);
                Ok(())
            }
        }
    }

    pub fn ref_def(&self, r: RefId) -> RefDef {
        self.refs.borrow()[r.as_usize()]
    }

    pub fn ref_body(&self, r: RefId) -> Option<ExprId> {
        self.ref_def(r).body
    }

    /// Number of references allocated.
    pub fn ref_count(&self) -> usize {
        self.refs.borrow().len()
    }

    /// Every reference allocated,
    ///   in order of allocation.
    pub fn ref_ids(&self) -> impl Iterator<Item = RefId> {
        (0..self.ref_count() as u32).map(RefId)
    }

    /// Whether `id` matches the empty sequence.
    ///
    /// Unbound references are not nullable.
    pub fn nullable(&self, id: ExprId) -> bool {
        self.try_nullable(id).unwrap_or(false)
    }

    /// Nullability,
    ///   or [`None`] if it depends on an unbound reference.
    ///
    /// Only definite results are memoized,
    ///   so that binding a reference later cannot leave a stale entry.
    /// This terminates only for grammars without unguarded recursion;
    ///   see [`Grammar`](crate::grammar::Grammar).
    fn try_nullable(&self, id: ExprId) -> Option<bool> {
        if let Some(known) = self.nullable.borrow()[id.as_usize()] {
            return Some(known);
        }

        let result = match self.get(id) {
            Expr::Empty => Some(true),
            Expr::NotAllowed
            | Expr::Text
            | Expr::Element(..)
            | Expr::Attribute(..)
            | Expr::Data(..)
            | Expr::Value(..)
            | Expr::List(..) => Some(false),

            Expr::Group(a, b) | Expr::Interleave(a, b) => {
                match (self.try_nullable(a), self.try_nullable(b)) {
                    (Some(false), _) | (_, Some(false)) => Some(false),
                    (Some(true), Some(true)) => Some(true),
                    _ => None,
                }
            }

            Expr::Choice(a, b) => {
                match (self.try_nullable(a), self.try_nullable(b)) {
                    (Some(true), _) | (_, Some(true)) => Some(true),
                    (Some(false), Some(false)) => Some(false),
                    _ => None,
                }
            }

            Expr::OneOrMore(a) | Expr::Mixed(a) => self.try_nullable(a),

            Expr::Ref(r) => {
                self.ref_body(r).and_then(|body| self.try_nullable(body))
            }
        };

        if let Some(known) = result {
            self.nullable.borrow_mut()[id.as_usize()] = Some(known);
        }

        result
    }

    /// Render an expression for display.
    ///
    /// References are rendered by name only,
    ///   so the output is finite even for recursive grammars.
    pub fn display(&self, id: ExprId) -> ExprDisplay<'_> {
        ExprDisplay { pool: self, id }
    }
}

impl std::fmt::Debug for ExprPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExprPool")
            .field("exprs", &self.exprs.borrow().len())
            .field("name_classes", &self.name_classes.borrow().len())
            .field("datatypes", &self.datatypes.borrow().len())
            .field("refs", &self.refs.borrow().len())
            .finish()
    }
}

/// Rendering of an [`Expr`] in a notation resembling the RELAX NG
///   compact syntax.
pub struct ExprDisplay<'p> {
    pool: &'p ExprPool,
    id: ExprId,
}

impl<'p> ExprDisplay<'p> {
    fn sub(&self, id: ExprId) -> Self {
        Self {
            pool: self.pool,
            id,
        }
    }

    /// Render an operand,
    ///   parenthesizing binary expressions.
    fn operand(
        &self,
        id: ExprId,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        match self.pool.get(id) {
            Expr::Group(..) | Expr::Choice(..) | Expr::Interleave(..) => {
                write!(f, "({})", self.sub(id))
            }
            _ => self.sub(id).fmt(f),
        }
    }
}

impl<'p> Display for ExprDisplay<'p> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let pool = self.pool;

        match pool.get(self.id) {
            Expr::Empty => write!(f, "empty"),
            Expr::NotAllowed => write!(f, "notAllowed"),
            Expr::Text => write!(f, "text"),
            Expr::Element(nc, content) => write!(
                f,
                "element {} {{ {} }}",
                pool.display_name_class(nc),
                self.sub(content)
            ),
            Expr::Attribute(nc, value) => write!(
                f,
                "attribute {} {{ {} }}",
                pool.display_name_class(nc),
                self.sub(value)
            ),
            Expr::Data(dt, None) => {
                write!(f, "{}", pool.datatype(dt).name())
            }
            Expr::Data(dt, Some(except)) => {
                write!(f, "{} - ", pool.datatype(dt).name())?;
                self.operand(except, f)
            }
            Expr::Value(dt, lit) => {
                write!(f, "{} {:?}", pool.datatype(dt).name(), lit.to_string())
            }
            Expr::List(body) => write!(f, "list {{ {} }}", self.sub(body)),
            Expr::Group(a, b) => {
                self.operand(a, f)?;
                write!(f, ", ")?;
                self.operand(b, f)
            }
            Expr::Choice(a, b) => {
                self.operand(a, f)?;
                write!(f, " | ")?;
                self.operand(b, f)
            }
            Expr::Interleave(a, b) => {
                self.operand(a, f)?;
                write!(f, " & ")?;
                self.operand(b, f)
            }
            Expr::OneOrMore(a) => {
                self.operand(a, f)?;
                write!(f, "+")
            }
            Expr::Mixed(a) => write!(f, "mixed {{ {} }}", self.sub(a)),
            Expr::Ref(r) => pool.ref_def(r).name.fmt(f),
        }
    }
}
