// XML namespace resolution
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

//! Namespace scopes and expanded names.
//!
//! XIR does not resolve namespaces;
//!   a [`QName`] contains only the prefix as it appeared in the source.
//! Consumers that care about namespaces maintain an [`NsStack`],
//!   opening a scope for each element,
//!   declaring each `xmlns` attribute into that scope,
//!   and resolving names into [`ExpName`]s once all of the element's
//!     attributes have been seen.

use super::{Error, QName};
use crate::{
    span::Span,
    sym::{GlobalSymbolIntern, GlobalSymbolResolve, SymbolId},
};
use std::fmt::Display;

/// Namespace URI bound to the `xml` prefix by definition.
pub const XML_NS_URI: &str = "http://www.w3.org/XML/1998/namespace";

/// An expanded name:
///   namespace URI and local name.
///
/// The absence of a namespace is represented by the empty string,
///   which is how it is also represented in schemas
///   (e.g. `ns=""`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExpName {
    pub ns: SymbolId,
    pub local: SymbolId,
}

impl ExpName {
    pub fn new(ns: SymbolId, local: SymbolId) -> Self {
        Self { ns, local }
    }

    /// A name in no namespace.
    pub fn local(local: SymbolId) -> Self {
        Self::new("".intern(), local)
    }
}

impl Display for ExpName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.ns.lookup_str() {
            "" => self.local.fmt(f),
            ns => write!(f, "{{{ns}}}{}", self.local),
        }
    }
}

/// Whether an attribute name is a namespace declaration,
///   returning the prefix being declared
///   ([`None`] for the default namespace).
pub fn ns_decl_prefix(name: QName) -> Option<Option<SymbolId>> {
    match (name.prefix().map(|p| p.lookup_str()), name.local_name()) {
        (None, local) if local.lookup_str() == "xmlns" => Some(None),
        (Some("xmlns"), local) => Some(Some(local)),
        _ => None,
    }
}

/// Stack of namespace scopes.
///
/// Each scope holds the declarations made by a single element;
///   lookups search from the innermost scope outward,
///     so that inner declarations shadow outer ones.
#[derive(Debug)]
pub struct NsStack {
    /// Declarations of every open scope,
    ///   in order of declaration.
    decls: Vec<(Option<SymbolId>, SymbolId)>,

    /// Length of `decls` at the time each open scope was entered.
    scopes: Vec<usize>,

    xml_prefix: SymbolId,
    xml_ns: SymbolId,
    no_ns: SymbolId,
}

impl Default for NsStack {
    fn default() -> Self {
        Self {
            decls: Vec::new(),
            scopes: Vec::new(),
            xml_prefix: "xml".intern(),
            xml_ns: XML_NS_URI.intern(),
            no_ns: "".intern(),
        }
    }
}

impl NsStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter a new scope for an element.
    pub fn push_scope(&mut self) {
        self.scopes.push(self.decls.len());
    }

    /// Leave the innermost scope,
    ///   discarding its declarations.
    pub fn pop_scope(&mut self) {
        if let Some(len) = self.scopes.pop() {
            self.decls.truncate(len);
        }
    }

    /// Number of open scopes.
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Declare `prefix` (or the default namespace if [`None`]) in the
    ///   innermost scope.
    ///
    /// Declaring the default namespace as the empty string undeclares it.
    pub fn declare(&mut self, prefix: Option<SymbolId>, uri: SymbolId) {
        self.decls.push((prefix, uri));
    }

    fn lookup(&self, prefix: Option<SymbolId>) -> Option<SymbolId> {
        if prefix == Some(self.xml_prefix) {
            return Some(self.xml_ns);
        }

        self.decls
            .iter()
            .rev()
            .find(|(p, _)| *p == prefix)
            .map(|(_, uri)| *uri)
    }

    /// Resolve an element name,
    ///   which is subject to the default namespace.
    pub fn resolve_element(
        &self,
        name: QName,
        span: Span,
    ) -> Result<ExpName, Error> {
        match name.prefix() {
            None => Ok(ExpName::new(
                self.lookup(None).unwrap_or(self.no_ns),
                name.local_name(),
            )),
            Some(_) => self.resolve_prefixed(name, span),
        }
    }

    /// Resolve an attribute name.
    ///
    /// Unprefixed attributes are in no namespace regardless of the default
    ///   namespace.
    pub fn resolve_attr(
        &self,
        name: QName,
        span: Span,
    ) -> Result<ExpName, Error> {
        match name.prefix() {
            None => Ok(ExpName::new(self.no_ns, name.local_name())),
            Some(_) => self.resolve_prefixed(name, span),
        }
    }

    fn resolve_prefixed(
        &self,
        name: QName,
        span: Span,
    ) -> Result<ExpName, Error> {
        let prefix = name.prefix();

        match self.lookup(prefix) {
            Some(uri) if uri != self.no_ns => {
                Ok(ExpName::new(uri, name.local_name()))
            }
            _ => Err(Error::UndeclaredPrefix(
                prefix.unwrap_or(self.no_ns),
                span,
            )),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::span::dummy::DUMMY_SPAN;

    fn qname(s: &str) -> QName {
        QName::try_from(s).unwrap()
    }

    #[test]
    fn recognizes_namespace_declarations() {
        assert_eq!(Some(None), ns_decl_prefix(qname("xmlns")));
        assert_eq!(Some(Some("x".intern())), ns_decl_prefix(qname("xmlns:x")));
        assert_eq!(None, ns_decl_prefix(qname("x:xmlns")));
        assert_eq!(None, ns_decl_prefix(qname("id")));
    }

    #[test]
    fn default_namespace_applies_to_elements_only() {
        let mut sut = NsStack::new();
        sut.push_scope();
        sut.declare(None, "urn:default".intern());

        assert_eq!(
            Ok(ExpName::new("urn:default".intern(), "foo".intern())),
            sut.resolve_element(qname("foo"), DUMMY_SPAN)
        );

        assert_eq!(
            Ok(ExpName::local("foo".intern())),
            sut.resolve_attr(qname("foo"), DUMMY_SPAN)
        );
    }

    #[test]
    fn inner_scope_shadows_and_is_discarded_on_pop() {
        let mut sut = NsStack::new();

        sut.push_scope();
        sut.declare(Some("p".intern()), "urn:outer".intern());

        sut.push_scope();
        sut.declare(Some("p".intern()), "urn:inner".intern());

        assert_eq!(
            Ok(ExpName::new("urn:inner".intern(), "a".intern())),
            sut.resolve_attr(qname("p:a"), DUMMY_SPAN)
        );

        sut.pop_scope();

        assert_eq!(
            Ok(ExpName::new("urn:outer".intern(), "a".intern())),
            sut.resolve_attr(qname("p:a"), DUMMY_SPAN)
        );
        assert_eq!(1, sut.depth());
    }

    #[test]
    fn xml_prefix_is_predeclared() {
        let sut = NsStack::new();

        assert_eq!(
            Ok(ExpName::new(XML_NS_URI.intern(), "lang".intern())),
            sut.resolve_attr(qname("xml:lang"), DUMMY_SPAN)
        );
    }

    #[test]
    fn undeclared_prefix_is_an_error() {
        let sut = NsStack::new();

        assert_eq!(
            Err(Error::UndeclaredPrefix("nope".intern(), DUMMY_SPAN)),
            sut.resolve_element(qname("nope:foo"), DUMMY_SPAN)
        );
    }

    #[test]
    fn empty_default_namespace_undeclares() {
        let mut sut = NsStack::new();
        sut.push_scope();
        sut.declare(None, "urn:x".intern());
        sut.push_scope();
        sut.declare(None, "".intern());

        assert_eq!(
            Ok(ExpName::local("foo".intern())),
            sut.resolve_element(qname("foo"), DUMMY_SPAN)
        );
    }
}
