// Compilation of RELAX NG schema trees
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

//! Compilation of a schema tree into an expression pool.
//!
//! Every `define` is given a [`RefId`] the first time that its name is
//!   seen,
//!     whether by a `ref` or by the `define` itself,
//!     and its body is bound only once the entire grammar has been read.
//! Forward references and recursion therefore require no special
//!   treatment.
//!
//! The `ns` and `datatypeLibrary` attributes are inherited by descendants,
//!   and are carried through compilation as a [`Scope`].

use super::{Child, Node, SchemaError, RELAX_NG_URI};
use crate::{
    datatype::{is_xml_blank, DatatypeLibrary},
    expr::{DatatypeId, ExprId, ExprPool, NameClass, NameClassId, RefId},
    grammar::{Grammar, GrammarError},
    span::Span,
    sym::{GlobalSymbolIntern, GlobalSymbolResolve, SymbolId},
    xir::ExpName,
};
use fxhash::FxHashMap;

/// Attributes inherited from ancestors.
#[derive(Debug, Clone, Copy)]
struct Scope {
    ns: SymbolId,
    datatype_library: SymbolId,
}

impl Scope {
    fn inherit(self, node: &Node) -> Self {
        Self {
            ns: node.attr("ns").map_or(self.ns, |(ns, _)| ns.intern()),
            datatype_library: node
                .attr("datatypeLibrary")
                .map_or(self.datatype_library, |(lib, _)| lib.intern()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combine {
    Choice,
    Interleave,
}

/// Bodies contributed to a single `start` or `define`.
#[derive(Debug, Default)]
struct Component {
    bodies: Vec<ExprId>,
    combine: Option<Combine>,

    /// Whether a body without `combine` has been seen.
    has_plain: bool,

    /// Span of the first definition.
    span: Option<Span>,
}

impl Component {
    fn add(
        &mut self,
        name: SymbolId,
        body: ExprId,
        combine: Option<Combine>,
        span: Span,
    ) -> Result<(), SchemaError> {
        match (self.combine, combine) {
            (Some(prev), Some(given)) if prev != given => {
                return Err(SchemaError::ConflictingCombine(name, span));
            }
            (_, None) if self.has_plain => {
                return Err(SchemaError::DuplicateDefine(name, span));
            }
            (_, None) => self.has_plain = true,
            (_, Some(_)) => self.combine = combine,
        }

        self.bodies.push(body);
        self.span.get_or_insert(span);

        Ok(())
    }

    fn finish(&self, pool: &ExprPool) -> ExprId {
        match self.combine {
            Some(Combine::Interleave) => self
                .bodies
                .iter()
                .fold(ExprId::EMPTY, |acc, body| pool.interleave(acc, *body)),
            _ => pool.choice_all(self.bodies.iter().copied()),
        }
    }
}

#[derive(Debug)]
struct Define {
    r: RefId,
    component: Component,

    /// Span of the first reference.
    first_ref: Option<Span>,
}

type DatatypeKey = (SymbolId, SymbolId, Vec<(SymbolId, SymbolId)>);

pub(super) struct Compiler<'l> {
    pool: ExprPool,
    lib: &'l dyn DatatypeLibrary,
    rng: SymbolId,
    start: Component,
    defines: FxHashMap<SymbolId, Define>,
    datatypes: FxHashMap<DatatypeKey, DatatypeId>,
}

impl<'l> Compiler<'l> {
    pub(super) fn new(lib: &'l dyn DatatypeLibrary) -> Self {
        Self {
            pool: ExprPool::new(),
            lib,
            rng: RELAX_NG_URI.intern(),
            start: Component::default(),
            defines: Default::default(),
            datatypes: Default::default(),
        }
    }

    pub(super) fn compile(
        mut self,
        root: &Node,
    ) -> Result<Grammar, SchemaError> {
        let scope = Scope {
            ns: "".intern(),
            datatype_library: "".intern(),
        };

        let start = match self.local_name(root) {
            Some("grammar") => {
                self.grammar_content(root, scope)?;

                if self.start.bodies.is_empty() {
                    return Err(SchemaError::MissingStart(root.span));
                }

                self.start.finish(&self.pool)
            }
            _ => self.pattern(root, scope)?,
        };

        self.bind_defines()?;

        let Self { pool, defines, .. } = self;

        Grammar::new(pool, start).map_err(|e| match e {
            GrammarError::UnboundRef(name) => SchemaError::UndefinedRef(
                name,
                defines
                    .get(&name)
                    .and_then(|def| def.first_ref)
                    .unwrap_or(root.span),
            ),
            GrammarError::UnguardedRecursion(name) => {
                SchemaError::UnguardedRecursion(
                    name,
                    defines
                        .get(&name)
                        .and_then(|def| def.component.span)
                        .unwrap_or(root.span),
                )
            }
        })
    }

    /// Local name of a RELAX NG element,
    ///   or [`None`] if the element is foreign.
    fn local_name(&self, node: &Node) -> Option<&'static str> {
        (node.name.ns == self.rng).then(|| node.name.local.lookup_str())
    }

    fn children<'n>(&self, node: &'n Node) -> Vec<&'n Node> {
        node.children_in(self.rng).collect()
    }

    /// Ensure that `node` contains no text other than whitespace.
    fn check_text(&self, node: &Node) -> Result<(), SchemaError> {
        node.children.iter().try_for_each(|child| match child {
            Child::Text(text, span) if !is_xml_blank(text.lookup_str()) => {
                Err(SchemaError::UnexpectedText(*span))
            }
            _ => Ok(()),
        })
    }

    /// Contents of `grammar` and `div`.
    fn grammar_content(
        &mut self,
        node: &Node,
        scope: Scope,
    ) -> Result<(), SchemaError> {
        let scope = scope.inherit(node);
        self.check_text(node)?;

        for child in self.children(node) {
            let cscope = scope.inherit(child);

            match self.local_name(child) {
                Some("start") => {
                    let combine = combine_of(child)?;
                    let body = self.group(child, cscope)?;

                    self.start.add(
                        "start".intern(),
                        body,
                        combine,
                        child.span,
                    )?;
                }

                Some("define") => {
                    let name = required_attr(child, "name")?;
                    let combine = combine_of(child)?;
                    let body = self.group(child, cscope)?;

                    self.define(name).component.add(
                        name,
                        body,
                        combine,
                        child.span,
                    )?;
                }

                Some("div") => self.grammar_content(child, scope)?,

                Some("include") => {
                    return Err(SchemaError::Unsupported(
                        child.name.local,
                        child.span,
                    ))
                }

                _ => {
                    return Err(SchemaError::UnknownPattern(
                        child.name.local,
                        child.span,
                    ))
                }
            }
        }

        Ok(())
    }

    fn define(&mut self, name: SymbolId) -> &mut Define {
        let pool = &self.pool;

        self.defines.entry(name).or_insert_with(|| Define {
            r: pool.new_ref(name),
            component: Component::default(),
            first_ref: None,
        })
    }

    fn bind_defines(&self) -> Result<(), SchemaError> {
        let mut defines = self.defines.iter().collect::<Vec<_>>();
        defines.sort_by_key(|(_, def)| def.r);

        for (name, def) in defines {
            if def.component.bodies.is_empty() {
                return Err(SchemaError::UndefinedRef(
                    *name,
                    def.first_ref.unwrap_or(crate::span::UNKNOWN_SPAN),
                ));
            }

            let body = def.component.finish(&self.pool);

            // Each reference is bound exactly once here.
            let _ = self.pool.bind_ref(def.r, body);
        }

        Ok(())
    }

    /// Compile each pattern child of `node` and combine them in sequence.
    fn group(
        &mut self,
        node: &Node,
        scope: Scope,
    ) -> Result<ExprId, SchemaError> {
        let items = self.patterns(&self.children(node), scope)?;
        Ok(self.seq(&items))
    }

    fn patterns(
        &mut self,
        nodes: &[&Node],
        scope: Scope,
    ) -> Result<Vec<ExprId>, SchemaError> {
        nodes.iter().map(|node| self.pattern(node, scope)).collect()
    }

    fn seq(&self, items: &[ExprId]) -> ExprId {
        items
            .iter()
            .fold(ExprId::EMPTY, |acc, item| self.pool.sequence(acc, *item))
    }

    fn pattern(
        &mut self,
        node: &Node,
        scope: Scope,
    ) -> Result<ExprId, SchemaError> {
        let scope = scope.inherit(node);
        let local = self.local_name(node);

        if local != Some("value") {
            self.check_text(node)?;
        }

        Ok(match local {
            Some("element") => {
                let (nc, rest) = self.name_class_of(node, scope, false)?;
                let content = self.patterns(&rest, scope)?;
                self.pool.element(nc, self.seq(&content))
            }

            Some("attribute") => {
                let (nc, rest) = self.name_class_of(node, scope, true)?;
                let value = match self.patterns(&rest, scope)?.as_slice() {
                    [] => ExprId::TEXT,
                    items => self.seq(items),
                };
                self.pool.attribute(nc, value)
            }

            Some("group") => self.group(node, scope)?,

            Some("interleave") => {
                let items = self.patterns(&self.children(node), scope)?;
                items.iter().fold(ExprId::EMPTY, |acc, item| {
                    self.pool.interleave(acc, *item)
                })
            }

            Some("choice") => {
                let items = self.patterns(&self.children(node), scope)?;
                self.pool.choice_all(items)
            }

            Some("optional") => {
                let body = self.group(node, scope)?;
                self.pool.optional(body)
            }

            Some("zeroOrMore") => {
                let body = self.group(node, scope)?;
                self.pool.zero_or_more(body)
            }

            Some("oneOrMore") => {
                let body = self.group(node, scope)?;
                self.pool.one_or_more(body)
            }

            Some("mixed") => {
                let body = self.group(node, scope)?;
                self.pool.mixed(body)
            }

            Some("list") => {
                let body = self.group(node, scope)?;
                self.pool.list(body)
            }

            Some("empty") => ExprId::EMPTY,
            Some("text") => ExprId::TEXT,
            Some("notAllowed") => ExprId::NOT_ALLOWED,

            Some("data") => self.data(node, scope)?,
            Some("value") => self.value(node, scope)?,

            Some("ref") => {
                let name = required_attr(node, "name")?;
                let def = self.define(name);
                def.first_ref.get_or_insert(node.span);

                let r = def.r;
                self.pool.reference(r)
            }

            Some("grammar" | "parentRef" | "externalRef" | "include") => {
                return Err(SchemaError::Unsupported(
                    node.name.local,
                    node.span,
                ))
            }

            _ => {
                return Err(SchemaError::UnknownPattern(
                    node.name.local,
                    node.span,
                ))
            }
        })
    }

    /// Name class of an `element` or `attribute`,
    ///   along with the children that remain to be compiled as its
    ///   content.
    fn name_class_of<'n>(
        &mut self,
        node: &'n Node,
        scope: Scope,
        is_attr: bool,
    ) -> Result<(NameClassId, Vec<&'n Node>), SchemaError> {
        let children = self.children(node);

        match node.attr("name") {
            Some((name, _)) => {
                // Unlike other names,
                //   the `name` attribute of an `attribute` is not subject
                //   to an inherited `ns`.
                let ns = match (is_attr, node.attr("ns")) {
                    (true, Some((ns, _))) => ns.intern(),
                    (true, None) => "".intern(),
                    (false, _) => scope.ns,
                };

                let name = qualify(node, name, ns);
                Ok((self.pool.name(name), children))
            }

            None => match children.split_first() {
                Some((first, rest)) => {
                    Ok((self.name_class(first, scope)?, rest.to_vec()))
                }
                None => Err(SchemaError::MissingNameClass(node.span)),
            },
        }
    }

    fn name_class(
        &mut self,
        node: &Node,
        scope: Scope,
    ) -> Result<NameClassId, SchemaError> {
        let scope = scope.inherit(node);

        match self.local_name(node) {
            Some("name") => {
                let name = qualify(node, &node.text(), scope.ns);
                Ok(self.pool.name(name))
            }

            Some("anyName") => {
                self.check_text(node)?;
                let except = self.except_name_class(node, scope)?;
                Ok(self.pool.intern_name_class(NameClass::AnyName(except)))
            }

            Some("nsName") => {
                self.check_text(node)?;
                let except = self.except_name_class(node, scope)?;
                Ok(self
                    .pool
                    .intern_name_class(NameClass::NsName(scope.ns, except)))
            }

            Some("choice") => {
                self.check_text(node)?;
                self.name_class_choice(node, scope)
            }

            _ => Err(SchemaError::UnknownNameClass(
                node.name.local,
                node.span,
            )),
        }
    }

    /// Choice of the name classes that are children of `node`.
    fn name_class_choice(
        &mut self,
        node: &Node,
        scope: Scope,
    ) -> Result<NameClassId, SchemaError> {
        let mut result = None;

        for child in self.children(node) {
            let nc = self.name_class(child, scope)?;

            result = Some(match result {
                None => nc,
                Some(prev) => {
                    self.pool.intern_name_class(NameClass::Choice(prev, nc))
                }
            });
        }

        result.ok_or(SchemaError::MissingNameClass(node.span))
    }

    fn except_name_class(
        &mut self,
        node: &Node,
        scope: Scope,
    ) -> Result<Option<NameClassId>, SchemaError> {
        match self.children(node).as_slice() {
            [] => Ok(None),
            [except] if self.local_name(except) == Some("except") => {
                let scope = scope.inherit(except);
                self.name_class_choice(except, scope).map(Some)
            }
            [other, ..] => Err(SchemaError::UnknownNameClass(
                other.name.local,
                other.span,
            )),
        }
    }

    fn data(
        &mut self,
        node: &Node,
        scope: Scope,
    ) -> Result<ExprId, SchemaError> {
        let type_name = required_attr(node, "type")?;
        let mut params = Vec::new();
        let mut except = None;

        for child in self.children(node) {
            match self.local_name(child) {
                Some("param") if except.is_none() => {
                    let name = required_attr(child, "name")?;
                    params.push((name, child.text().intern()));
                }

                Some("except") => {
                    let items = self.patterns(
                        &self.children(child),
                        scope.inherit(child),
                    )?;
                    except = Some(self.pool.choice_all(items));
                }

                _ => {
                    return Err(SchemaError::UnknownPattern(
                        child.name.local,
                        child.span,
                    ))
                }
            }
        }

        let dt = self.datatype(
            scope.datatype_library,
            type_name,
            params,
            node.span,
        )?;

        Ok(self.pool.data(dt, except))
    }

    fn value(
        &mut self,
        node: &Node,
        scope: Scope,
    ) -> Result<ExprId, SchemaError> {
        // Without a type,
        //   a value is a `token` from the built-in library.
        let (lib, type_name) = match node.attr("type") {
            Some((type_name, _)) => {
                (scope.datatype_library, type_name.trim().intern())
            }
            None => ("".intern(), "token".intern()),
        };

        let dt = self.datatype(lib, type_name, vec![], node.span)?;
        Ok(self.pool.value(dt, node.text().intern()))
    }

    /// Resolve a datatype,
    ///   registering it with the pool only once for any combination of
    ///   library, name, and parameters.
    fn datatype(
        &mut self,
        lib: SymbolId,
        name: SymbolId,
        params: Vec<(SymbolId, SymbolId)>,
        span: Span,
    ) -> Result<DatatypeId, SchemaError> {
        let key = (lib, name, params);

        if let Some(id) = self.datatypes.get(&key) {
            return Ok(*id);
        }

        let dt = self
            .lib
            .resolve(lib, name, &key.2)
            .map_err(|e| SchemaError::Datatype(e, span))?;

        let id = self.pool.register_datatype(dt);
        self.datatypes.insert(key, id);

        Ok(id)
    }
}

/// Value of a required unqualified attribute,
///   with surrounding whitespace removed.
fn required_attr(
    node: &Node,
    local: &'static str,
) -> Result<SymbolId, SchemaError> {
    node.attr(local)
        .map(|(value, _)| value.trim().intern())
        .ok_or(SchemaError::MissingAttr(local, node.name.local, node.span))
}

fn combine_of(node: &Node) -> Result<Option<Combine>, SchemaError> {
    match node.attr("combine") {
        None => Ok(None),
        Some((value, span)) => match value.trim() {
            "choice" => Ok(Some(Combine::Choice)),
            "interleave" => Ok(Some(Combine::Interleave)),
            other => Err(SchemaError::InvalidCombine(other.intern(), span)),
        },
    }
}

/// Expand a QName held by `node`,
///   using `default_ns` if it has no prefix.
fn qualify(node: &Node, qname: &str, default_ns: SymbolId) -> ExpName {
    match qname.trim().split_once(':') {
        Some((_, local)) => {
            ExpName::new(node.prefix_ns.unwrap_or(default_ns), local.intern())
        }
        None => ExpName::new(default_ns, qname.trim().intern()),
    }
}
