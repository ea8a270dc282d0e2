// RELAX NG schema loading
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

//! Loading of [`Grammar`]s from the XML syntax of RELAX NG.
//!
//! Loading happens in two passes:
//!
//!   1. The schema document is read into a small tree of [`Node`]s,
//!        resolving the namespaces of element and attribute names along
//!        the way;
//!          this is the only time that namespace declarations are in
//!          scope.
//!   2. The tree is [compiled](compile) into an [`ExprPool`],
//!        resolving references between definitions.
//!
//! The schema must be self-contained:
//!   `include`, `externalRef`, `parentRef`,
//!     and nested `grammar`s are not supported.
//! Elements and attributes in foreign namespaces are ignored,
//!   which permits annotations.
//!
//! [`ExprPool`]: crate::expr::ExprPool

mod compile;
mod error;

pub use error::SchemaError;

use crate::{
    datatype::DatatypeLibrary,
    grammar::Grammar,
    span::{Context, Span, UNKNOWN_SPAN},
    sym::{GlobalSymbolIntern, GlobalSymbolResolve, SymbolId},
    xir::{
        self, ns::ns_decl_prefix, ExpName, NsStack, QName,
        Token as XirToken, XmlXirReader,
    },
};
use std::io::BufRead;

/// Namespace of RELAX NG schema elements.
pub const RELAX_NG_URI: &str = "http://relaxng.org/ns/structure/1.0";

/// Load a grammar from a RELAX NG schema document.
///
/// Datatypes referenced by the schema are resolved using `lib`.
pub fn load<B: BufRead>(
    reader: B,
    ctx: Context,
    lib: &dyn DatatypeLibrary,
) -> Result<Grammar, SchemaError> {
    load_tokens(XmlXirReader::new(reader, ctx), lib)
}

/// Load a grammar from a XIR token stream.
pub fn load_tokens<I>(
    toks: I,
    lib: &dyn DatatypeLibrary,
) -> Result<Grammar, SchemaError>
where
    I: IntoIterator<Item = Result<XirToken, xir::Error>>,
{
    let root = read_tree(toks)?;
    compile::Compiler::new(lib).compile(&root)
}

/// A schema element with resolved names.
#[derive(Debug, PartialEq)]
struct Node {
    name: ExpName,
    span: Span,

    /// Attributes other than namespace declarations.
    attrs: Vec<(ExpName, SymbolId, Span)>,

    children: Vec<Child>,

    /// Namespace bound to the prefix of a QName held by this element,
    ///   either in its `name` attribute or as its text.
    prefix_ns: Option<SymbolId>,
}

#[derive(Debug, PartialEq)]
enum Child {
    Node(Node),
    Text(SymbolId, Span),
}

impl Node {
    /// Value of the unqualified attribute `local`,
    ///   if present.
    fn attr(&self, local: &str) -> Option<(&'static str, Span)> {
        self.attrs
            .iter()
            .find(|(name, ..)| {
                name.ns.lookup_str().is_empty()
                    && name.local.lookup_str() == local
            })
            .map(|(_, value, span)| (value.lookup_str(), *span))
    }

    /// Child elements in the namespace `ns`.
    fn children_in(&self, ns: SymbolId) -> impl Iterator<Item = &Node> {
        self.children.iter().filter_map(move |child| match child {
            Child::Node(node) if node.name.ns == ns => Some(node),
            _ => None,
        })
    }

    /// Concatenation of all text children.
    fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|child| match child {
                Child::Text(text, _) => Some(text.lookup_str()),
                Child::Node(_) => None,
            })
            .collect()
    }
}

/// Read a token stream into a tree.
fn read_tree<I>(toks: I) -> Result<Node, SchemaError>
where
    I: IntoIterator<Item = Result<XirToken, xir::Error>>,
{
    let rng = RELAX_NG_URI.intern();
    let mut ns = NsStack::new();
    let mut stack: Vec<Node> = Vec::new();
    let mut open: Option<(QName, Span, Vec<(QName, SymbolId, Span)>)> = None;
    let mut last_span = UNKNOWN_SPAN;

    for tok in toks {
        let tok = tok?;
        last_span = tok.span();

        match tok {
            XirToken::Open(qname, span) => open = Some((qname, span, vec![])),

            XirToken::Attr(name, value, span) => {
                if let Some((_, _, attrs)) = open.as_mut() {
                    attrs.push((name, value, span));
                }
            }

            XirToken::AttrEnd(_) => {
                if let Some((qname, span, raw)) = open.take() {
                    stack.push(open_node(&mut ns, qname, span, raw)?);
                }
            }

            XirToken::Close(_, _) => {
                let mut node = match stack.pop() {
                    Some(node) => node,
                    None => continue,
                };

                if node.name == ExpName::new(rng, "name".intern()) {
                    node.prefix_ns =
                        resolve_prefix(&ns, &node.text(), node.span)?;
                }

                ns.pop_scope();

                match stack.last_mut() {
                    Some(parent) => parent.children.push(Child::Node(node)),
                    None => return Ok(node),
                }
            }

            XirToken::Text(text, span) => {
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(Child::Text(text, span));
                }
            }

            XirToken::Comment(..) => (),
        }
    }

    Err(SchemaError::EmptySchema(last_span))
}

/// Create a [`Node`] once all attributes of an element are known.
fn open_node(
    ns: &mut NsStack,
    qname: QName,
    span: Span,
    raw: Vec<(QName, SymbolId, Span)>,
) -> Result<Node, SchemaError> {
    ns.push_scope();

    for (name, value, _) in raw.iter() {
        if let Some(prefix) = ns_decl_prefix(*name) {
            ns.declare(prefix, *value);
        }
    }

    let mut attrs = Vec::with_capacity(raw.len());

    for (name, value, attr_span) in raw {
        if ns_decl_prefix(name).is_none() {
            attrs.push((ns.resolve_attr(name, attr_span)?, value, attr_span));
        }
    }

    let mut node = Node {
        name: ns.resolve_element(qname, span)?,
        span,
        attrs,
        children: Vec::new(),
        prefix_ns: None,
    };

    if let Some((name, name_span)) = node.attr("name") {
        node.prefix_ns = resolve_prefix(ns, name, name_span)?;
    }

    Ok(node)
}

/// Resolve the prefix of the QName `name`,
///   if it has one.
fn resolve_prefix(
    ns: &NsStack,
    name: &str,
    span: Span,
) -> Result<Option<SymbolId>, SchemaError> {
    let name = name.trim();

    if !name.contains(':') {
        return Ok(None);
    }

    let qname = QName::try_from(name)
        .map_err(xir::Error::from_with_span(span))?;

    Ok(Some(ns.resolve_attr(qname, span)?.ns))
}

#[cfg(test)]
mod test;
