// Tests for schema loading
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
use crate::{
    datatype::StdDatatypes,
    span::dummy::DUMMY_CONTEXT,
    validate::{validate, ErrorKind},
};

fn load_str(schema: &str) -> Result<Grammar, SchemaError> {
    load(schema.as_bytes(), DUMMY_CONTEXT, &StdDatatypes)
}

fn loaded(schema: &str) -> Grammar {
    load_str(schema).unwrap_or_else(|e| panic!("schema failed: {e}"))
}

/// Validate `doc` against `grammar`,
///   returning the kinds of errors reported.
fn errors(grammar: &Grammar, doc: &str) -> Vec<ErrorKind> {
    let reader = XmlXirReader::new(doc.as_bytes(), DUMMY_CONTEXT);
    let mut errs = Vec::new();

    validate(grammar, reader, |e| errs.push(e.kind()))
        .expect("validation should not fail");

    errs
}

fn accepts(grammar: &Grammar, doc: &str) -> bool {
    errors(grammar, doc).is_empty()
}

/// Wrap `body` in a RELAX NG `grammar` with the XSD library.
fn rng(body: &str) -> String {
    format!(
        "<grammar xmlns=\"{RELAX_NG_URI}\" \
           datatypeLibrary=\"http://www.w3.org/2001/XMLSchema-datatypes\">\
         {body}</grammar>"
    )
}

#[test]
fn simple_element_pattern() {
    let g = loaded(&format!(
        r#"<element name="foo" xmlns="{RELAX_NG_URI}">
             <attribute name="id"/>
             <element name="bar"><empty/></element>
           </element>"#
    ));

    assert!(accepts(&g, r#"<foo id="1"><bar/></foo>"#));
    assert_eq!(
        vec![ErrorKind::MissingAttribute],
        errors(&g, "<foo><bar/></foo>"),
    );
    assert_eq!(
        vec![ErrorKind::ContentModelIncomplete],
        errors(&g, r#"<foo id="1"></foo>"#),
    );
}

#[test]
fn grammar_with_defines_and_refs() {
    let g = loaded(&rng(
        r#"<start><ref name="doc"/></start>
           <define name="doc">
             <element name="doc">
               <zeroOrMore><ref name="item"/></zeroOrMore>
             </element>
           </define>
           <define name="item">
             <element name="item"><text/></element>
           </define>"#,
    ));

    assert!(accepts(&g, "<doc/>"));
    assert!(accepts(&g, "<doc><item>a</item><item>b</item></doc>"));
    assert_eq!(
        vec![ErrorKind::UnexpectedElement],
        errors(&g, "<doc><x/></doc>"),
    );
}

#[test]
fn forward_and_recursive_refs() {
    let g = loaded(&rng(
        r#"<start><ref name="node"/></start>
           <define name="node">
             <element name="node">
               <zeroOrMore><ref name="node"/></zeroOrMore>
             </element>
           </define>"#,
    ));

    assert!(accepts(&g, "<node><node><node/></node><node/></node>"));
}

#[test]
fn define_combine_choice() {
    let g = loaded(&rng(
        r#"<start><ref name="v"/></start>
           <define name="v"><element name="a"><empty/></element></define>
           <define name="v" combine="choice">
             <element name="b"><empty/></element>
           </define>"#,
    ));

    assert!(accepts(&g, "<a/>"));
    assert!(accepts(&g, "<b/>"));
}

#[test]
fn define_combine_interleave() {
    let g = loaded(&rng(
        r#"<start>
             <element name="r"><ref name="attrs"/></element>
           </start>
           <define name="attrs" combine="interleave">
             <attribute name="x"/>
           </define>
           <define name="attrs" combine="interleave">
             <attribute name="y"/>
           </define>"#,
    ));

    assert!(accepts(&g, r#"<r y="2" x="1"/>"#));
    assert_eq!(vec![ErrorKind::MissingAttribute], errors(&g, r#"<r x="1"/>"#));
}

#[test]
fn start_combine_choice() {
    let g = loaded(&rng(
        r#"<start combine="choice">
             <element name="a"><empty/></element>
           </start>
           <start combine="choice">
             <element name="b"><empty/></element>
           </start>"#,
    ));

    assert!(accepts(&g, "<a/>"));
    assert!(accepts(&g, "<b/>"));
}

#[test]
fn div_contents_belong_to_grammar() {
    let g = loaded(&rng(
        r#"<start><ref name="a"/></start>
           <div>
             <define name="a"><element name="a"><empty/></element></define>
           </div>"#,
    ));

    assert!(accepts(&g, "<a/>"));
}

#[test]
fn ns_attribute_inherited_by_element_names() {
    let g = loaded(&format!(
        r#"<element name="root" ns="urn:x" xmlns="{RELAX_NG_URI}">
             <element name="child"><empty/></element>
             <attribute name="plain"/>
           </element>"#
    ));

    assert!(accepts(&g, r#"<root xmlns="urn:x" plain="1"><child/></root>"#));

    // Attribute names do not inherit the namespace.
    assert!(!accepts(
        &g,
        r#"<x:root xmlns:x="urn:x" x:plain="1"><x:child/></x:root>"#,
    ));

    assert_eq!(vec![ErrorKind::UnexpectedElement], errors(&g, "<root/>"));
}

#[test]
fn prefixed_name_resolved_in_schema() {
    let g = loaded(&format!(
        r#"<element name="s:root" xmlns="{RELAX_NG_URI}" xmlns:s="urn:s">
             <attribute><name>s:attr</name></attribute>
           </element>"#
    ));

    assert!(accepts(&g, r#"<d:root xmlns:d="urn:s" d:attr="1"/>"#));
    assert!(!accepts(&g, r#"<root attr="1"/>"#));
}

#[test]
fn name_classes() {
    let g = loaded(&format!(
        r#"<element xmlns="{RELAX_NG_URI}">
             <choice><name>a</name><name>b</name></choice>
             <zeroOrMore>
               <element>
                 <anyName><except><name>bad</name></except></anyName>
                 <empty/>
               </element>
             </zeroOrMore>
             <zeroOrMore>
               <attribute><nsName ns="urn:any"/></attribute>
             </zeroOrMore>
           </element>"#
    ));

    assert!(accepts(&g, "<a><x/><y/></a>"));
    assert!(accepts(&g, r#"<b xmlns:p="urn:any" p:q="1" p:r="2"/>"#));
    assert_eq!(vec![ErrorKind::UnexpectedElement], errors(&g, "<a><bad/></a>"));
    assert_eq!(vec![ErrorKind::UnexpectedElement], errors(&g, "<c/>"));
}

#[test]
fn datatypes_with_params_and_except() {
    let g = loaded(&rng(
        r#"<start>
             <element name="n">
               <data type="integer">
                 <param name="minInclusive">1</param>
                 <param name="maxInclusive">10</param>
                 <except><value type="integer">5</value></except>
               </data>
             </element>
           </start>"#,
    ));

    assert!(accepts(&g, "<n>1</n>"));
    assert!(accepts(&g, "<n> 10 </n>"));
    assert_eq!(vec![ErrorKind::InvalidText], errors(&g, "<n>11</n>"));
    assert_eq!(vec![ErrorKind::InvalidText], errors(&g, "<n>5</n>"));
    assert_eq!(vec![ErrorKind::InvalidText], errors(&g, "<n>x</n>"));
}

#[test]
fn value_defaults_to_builtin_token() {
    let g = loaded(&format!(
        r#"<element name="v" xmlns="{RELAX_NG_URI}">
             <choice><value>yes</value><value>no</value></choice>
           </element>"#
    ));

    assert!(accepts(&g, "<v>yes</v>"));
    assert!(accepts(&g, "<v>  no </v>"));
    assert_eq!(vec![ErrorKind::InvalidText], errors(&g, "<v>maybe</v>"));
}

#[test]
fn list_of_tokens() {
    let g = loaded(&rng(
        r#"<start>
             <element name="l">
               <list><oneOrMore><data type="int"/></oneOrMore></list>
             </element>
           </start>"#,
    ));

    assert!(accepts(&g, "<l>1 2\n3</l>"));
    assert_eq!(vec![ErrorKind::InvalidText], errors(&g, "<l>1 two</l>"));
}

#[test]
fn mixed_and_optional() {
    let g = loaded(&format!(
        r#"<element name="p" xmlns="{RELAX_NG_URI}">
             <mixed>
               <optional><element name="b"><text/></element></optional>
             </mixed>
           </element>"#
    ));

    assert!(accepts(&g, "<p>one <b>two</b> three</p>"));
    assert!(accepts(&g, "<p>just text</p>"));
}

#[test]
fn foreign_annotations_ignored() {
    let g = loaded(&format!(
        r#"<element name="a" xmlns="{RELAX_NG_URI}" xmlns:doc="urn:doc">
             <doc:documentation>An element.</doc:documentation>
             <empty/>
           </element>"#
    ));

    assert!(accepts(&g, "<a/>"));
}

#[test]
fn include_unsupported() {
    let result = load_str(&rng(r#"<include href="other.rng"/>"#));
    assert!(matches!(result, Err(SchemaError::Unsupported(..))));
}

#[test]
fn external_ref_unsupported() {
    let result = load_str(&format!(
        r#"<externalRef href="x.rng" xmlns="{RELAX_NG_URI}"/>"#
    ));
    assert!(matches!(result, Err(SchemaError::Unsupported(..))));
}

#[test]
fn undefined_ref() {
    let result = load_str(&rng(r#"<start><ref name="missing"/></start>"#));

    match result {
        Err(SchemaError::UndefinedRef(name, _)) => {
            assert_eq!("missing", name.lookup_str());
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn unguarded_recursion() {
    let result = load_str(&rng(
        r#"<start><element name="a"><ref name="r"/></element></start>
           <define name="r"><optional><ref name="r"/></optional></define>"#,
    ));

    assert!(matches!(result, Err(SchemaError::UnguardedRecursion(..))));
}

#[test]
fn duplicate_define_without_combine() {
    let result = load_str(&rng(
        r#"<start><ref name="a"/></start>
           <define name="a"><element name="a"><empty/></element></define>
           <define name="a"><element name="b"><empty/></element></define>"#,
    ));

    assert!(matches!(result, Err(SchemaError::DuplicateDefine(..))));
}

#[test]
fn conflicting_combine() {
    let result = load_str(&rng(
        r#"<start><ref name="a"/></start>
           <define name="a" combine="choice"><empty/></define>
           <define name="a" combine="interleave"><empty/></define>"#,
    ));

    assert!(matches!(result, Err(SchemaError::ConflictingCombine(..))));
}

#[test]
fn invalid_combine() {
    let result = load_str(&rng(
        r#"<start combine="sequence">
             <element name="a"><empty/></element>
           </start>"#,
    ));

    assert!(matches!(result, Err(SchemaError::InvalidCombine(..))));
}

#[test]
fn grammar_without_start() {
    let result = load_str(&rng(r#"<define name="a"><empty/></define>"#));
    assert!(matches!(result, Err(SchemaError::MissingStart(..))));
}

#[test]
fn unknown_pattern() {
    let result = load_str(&format!(
        r#"<element name="a" xmlns="{RELAX_NG_URI}"><sequence/></element>"#
    ));
    assert!(matches!(result, Err(SchemaError::UnknownPattern(..))));
}

#[test]
fn unknown_datatype() {
    let result = load_str(&rng(
        r#"<start><element name="a"><data type="nope"/></element></start>"#,
    ));
    assert!(matches!(result, Err(SchemaError::Datatype(..))));
}

#[test]
fn element_without_name() {
    let result = load_str(&format!(
        r#"<element xmlns="{RELAX_NG_URI}"/>"#
    ));
    assert!(matches!(result, Err(SchemaError::MissingNameClass(..))));
}

#[test]
fn text_in_pattern_rejected() {
    let result = load_str(&format!(
        r#"<element name="a" xmlns="{RELAX_NG_URI}">oops<empty/></element>"#
    ));
    assert!(matches!(result, Err(SchemaError::UnexpectedText(..))));
}

#[test]
fn empty_input() {
    assert!(matches!(load_str(""), Err(SchemaError::EmptySchema(..))));
}

#[test]
fn undeclared_prefix_in_schema() {
    let result = load_str(&format!(
        r#"<element name="q:a" xmlns="{RELAX_NG_URI}"><empty/></element>"#
    ));
    assert!(matches!(result, Err(SchemaError::Xir(..))));
}
