// Tests for regular tree expressions
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

use super::*;
use crate::{datatype::BuiltinDatatype, sym::GlobalSymbolIntern};
use std::rc::Rc;

type Sut = ExprPool;

fn ele(pool: &Sut, name: &str, content: ExprId) -> ExprId {
    let nc = pool.name(ExpName::local(name.intern()));
    pool.element(nc, content)
}

fn att(pool: &Sut, name: &str, value: ExprId) -> ExprId {
    let nc = pool.name(ExpName::local(name.intern()));
    pool.attribute(nc, value)
}

#[test]
fn constants_are_preinterned() {
    let sut = Sut::new();

    assert_eq!(Expr::Empty, sut.get(ExprId::EMPTY));
    assert_eq!(Expr::NotAllowed, sut.get(ExprId::NOT_ALLOWED));
    assert_eq!(Expr::Text, sut.get(ExprId::TEXT));
    assert_eq!(3, sut.len());
}

#[test]
fn structurally_equal_expressions_share_ids() {
    let sut = Sut::new();

    let a = ele(&sut, "a", ExprId::EMPTY);
    let b = ele(&sut, "a", ExprId::EMPTY);
    let c = ele(&sut, "c", ExprId::EMPTY);

    assert_eq!(a, b);
    assert_ne!(a, c);
    assert_eq!(sut.sequence(a, c), sut.sequence(b, c));
}

#[test]
fn nullable_per_kind() {
    let sut = Sut::new();
    let dt = sut.register_datatype(Rc::new(BuiltinDatatype::Token));

    let a = ele(&sut, "a", ExprId::EMPTY);
    let b = ele(&sut, "b", ExprId::EMPTY);
    let at = att(&sut, "at", ExprId::TEXT);

    let cases = [
        (ExprId::EMPTY, true, "empty"),
        (ExprId::NOT_ALLOWED, false, "notAllowed"),
        (ExprId::TEXT, false, "text"),
        (a, false, "element"),
        (at, false, "attribute"),
        (sut.data(dt, None), false, "data"),
        (sut.value(dt, "x".intern()), false, "value"),
        (sut.list(ExprId::EMPTY), false, "list"),
        (sut.sequence(a, b), false, "group"),
        (sut.sequence(sut.optional(a), sut.optional(b)), true, "group?"),
        (sut.interleave(a, sut.optional(b)), false, "interleave"),
        (
            sut.interleave(sut.optional(a), sut.optional(b)),
            true,
            "interleave?",
        ),
        (sut.choice(a, b), false, "choice"),
        (sut.choice(a, ExprId::EMPTY), true, "choice?"),
        (sut.one_or_more(a), false, "oneOrMore"),
        (sut.zero_or_more(a), true, "zeroOrMore"),
        (sut.mixed(a), false, "mixed"),
        (sut.mixed(sut.optional(a)), true, "mixed?"),
    ];

    for (id, expected, desc) in cases {
        assert_eq!(
            expected,
            sut.nullable(id),
            "unexpected nullability for {desc}: {}",
            sut.display(id)
        );
    }
}

#[test]
fn not_allowed_annihilates() {
    let sut = Sut::new();
    let a = ele(&sut, "a", ExprId::EMPTY);
    let na = ExprId::NOT_ALLOWED;

    assert_eq!(na, sut.sequence(na, a));
    assert_eq!(na, sut.sequence(a, na));
    assert_eq!(na, sut.interleave(na, a));
    assert_eq!(na, sut.interleave(a, na));
    assert_eq!(na, sut.one_or_more(na));
    assert_eq!(na, sut.mixed(na));
    assert_eq!(na, sut.list(na));
    assert_eq!(a, sut.choice(na, a));
    assert_eq!(a, sut.choice(a, na));
}

#[test]
fn empty_is_identity_of_sequence_and_interleave() {
    let sut = Sut::new();
    let a = ele(&sut, "a", ExprId::EMPTY);

    assert_eq!(a, sut.sequence(ExprId::EMPTY, a));
    assert_eq!(a, sut.sequence(a, ExprId::EMPTY));
    assert_eq!(a, sut.interleave(ExprId::EMPTY, a));
    assert_eq!(a, sut.interleave(a, ExprId::EMPTY));
}

#[test]
fn repetition_identities() {
    let sut = Sut::new();
    let a = ele(&sut, "a", ExprId::EMPTY);
    let more = sut.one_or_more(a);

    assert_eq!(ExprId::EMPTY, sut.one_or_more(ExprId::EMPTY));
    assert_eq!(more, sut.one_or_more(more));
    assert_eq!(sut.mixed(a), sut.mixed(sut.mixed(a)));
    assert_eq!(
        sut.choice(more, ExprId::EMPTY),
        sut.zero_or_more(a),
    );
}

#[test]
fn choice_is_idempotent_commutative_and_associative() {
    let sut = Sut::new();
    let a = ele(&sut, "a", ExprId::EMPTY);
    let b = ele(&sut, "b", ExprId::EMPTY);
    let c = ele(&sut, "c", ExprId::EMPTY);

    assert_eq!(a, sut.choice(a, a));
    assert_eq!(sut.choice(a, b), sut.choice(b, a));
    assert_eq!(
        sut.choice(sut.choice(a, b), c),
        sut.choice(a, sut.choice(b, c)),
    );

    let abc = sut.choice(sut.choice(a, b), c);
    assert_eq!(abc, sut.choice(abc, b), "leaf already present");
    assert_eq!(abc, sut.choice(sut.choice(c, a), sut.choice(b, a)));
}

#[test]
fn choice_all_of_nothing_is_not_allowed() {
    let sut = Sut::new();

    assert_eq!(ExprId::NOT_ALLOWED, sut.choice_all(Vec::<ExprId>::new()));

    let a = ele(&sut, "a", ExprId::EMPTY);
    assert_eq!(a, sut.choice_all([a, ExprId::NOT_ALLOWED, a]));
}

#[test]
fn data_except_not_allowed_is_plain_data() {
    let sut = Sut::new();
    let dt = sut.register_datatype(Rc::new(BuiltinDatatype::Token));

    assert_eq!(
        sut.data(dt, None),
        sut.data(dt, Some(ExprId::NOT_ALLOWED))
    );
}

#[test]
fn name_class_matching() {
    let sut = Sut::new();
    let ns = "urn:x".intern();

    let foo = ExpName::local("foo".intern());
    let xfoo = ExpName::new(ns, "foo".intern());
    let xbar = ExpName::new(ns, "bar".intern());

    let name_foo = sut.name(foo);
    let name_xbar = sut.name(xbar);
    let any = sut.intern_name_class(NameClass::AnyName(None));
    let any_but_foo =
        sut.intern_name_class(NameClass::AnyName(Some(name_foo)));
    let in_ns = sut.intern_name_class(NameClass::NsName(ns, None));
    let in_ns_but_bar =
        sut.intern_name_class(NameClass::NsName(ns, Some(name_xbar)));
    let either = sut.intern_name_class(NameClass::Choice(name_foo, in_ns));

    assert!(sut.name_matches(name_foo, foo));
    assert!(!sut.name_matches(name_foo, xfoo), "namespace must match");

    assert!(sut.name_matches(any, xbar));
    assert!(!sut.name_matches(any_but_foo, foo));
    assert!(sut.name_matches(any_but_foo, xfoo));

    assert!(sut.name_matches(in_ns, xfoo));
    assert!(!sut.name_matches(in_ns, foo));
    assert!(sut.name_matches(in_ns_but_bar, xfoo));
    assert!(!sut.name_matches(in_ns_but_bar, xbar));

    assert!(sut.name_matches(either, foo));
    assert!(sut.name_matches(either, xbar));
}

#[test]
fn nullable_through_references() {
    let sut = Sut::new();
    let r = sut.new_ref("r".intern());
    let rexpr = sut.reference(r);
    let wrapped = sut.choice(rexpr, ExprId::TEXT);

    // Unbound references are not nullable,
    //   and that must not be remembered once bound.
    assert!(!sut.nullable(rexpr));
    assert!(!sut.nullable(wrapped));

    assert_eq!(Ok(()), sut.bind_ref(r, ExprId::EMPTY));

    assert!(sut.nullable(rexpr));
    assert!(sut.nullable(wrapped));
}

#[test]
fn references_bind_once() {
    let sut = Sut::new();
    let r = sut.new_ref("r".intern());

    assert_eq!(None, sut.ref_body(r));
    assert_eq!(Ok(()), sut.bind_ref(r, ExprId::TEXT));
    assert_eq!(Err(ExprId::TEXT), sut.bind_ref(r, ExprId::EMPTY));
    assert_eq!(Some(ExprId::TEXT), sut.ref_body(r));
    assert_eq!(1, sut.ref_count());
}

#[test]
fn recursion_through_element_terminates() {
    let sut = Sut::new();
    let r = sut.new_ref("tree".intern());

    // tree = element node { tree* }
    let body = ele(&sut, "node", sut.zero_or_more(sut.reference(r)));
    sut.bind_ref(r, body).unwrap();

    assert!(!sut.nullable(sut.reference(r)));
    assert_eq!("tree", sut.display(sut.reference(r)).to_string());
    assert_eq!(
        "element node { empty | tree+ }",
        sut.display(body).to_string(),
    );
}

#[test]
fn display_parenthesizes_operands() {
    let sut = Sut::new();
    let a = ele(&sut, "a", ExprId::EMPTY);
    let b = ele(&sut, "b", ExprId::TEXT);
    let at = att(&sut, "id", ExprId::TEXT);

    let expr = sut.sequence(sut.choice(a, b), sut.one_or_more(at));

    assert_eq!(
        "(element a { empty } | element b { text }), \
           attribute id { text }+",
        sut.display(expr).to_string(),
    );
}
