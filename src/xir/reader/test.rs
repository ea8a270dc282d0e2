// Tests for XIR reader
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
    span::{dummy::DUMMY_CONTEXT, Span},
    sym::GlobalSymbolIntern,
};

/// These tests use [`quick_xml`] directly,
///   rather than mocking it,
///   because parsing XML isn't a simple matter and we want to be sure that
///     our assumptions of how `quick_xml` performs its parsing is accurate.
/// Consequently,
///   these act more like integration tests than unit tests.
///
/// This means that `quick_xml` breakages will break these tests,
///   and that is (unlike with unit tests) exactly what we want to happen
///   here.
type Sut<B> = XmlXirReader<B>;

macro_rules! new_sut {
    ($sut:ident = $data:expr) => {
        new_sut!(b $sut = $data.as_bytes())
    };

    (b $sut:ident = $data:expr) => {
        let $sut = Sut::new($data, DUMMY_CONTEXT);
    };
}

/// Spans are tested separately;
///   most tests are concerned only with the tokens themselves.
const S: Span = DUMMY_CONTEXT.span(0, 0);

fn despan(toks: Vec<Token>) -> Vec<Token> {
    toks.into_iter()
        .map(|tok| match tok {
            Token::Open(name, _) => Token::Open(name, S),
            Token::Attr(name, value, _) => Token::Attr(name, value, S),
            Token::AttrEnd(_) => Token::AttrEnd(S),
            Token::Close(name, _) => Token::Close(name, S),
            Token::Text(text, _) => Token::Text(text, S),
            Token::Comment(text, _) => Token::Comment(text, S),
        })
        .collect()
}

fn qname(s: &str) -> QName {
    QName::try_from(s).unwrap()
}

#[test]
fn empty_node_without_prefix_or_attributes() {
    new_sut!(sut = "<empty-node />");

    let result = sut.collect::<Result<Vec<_>>>();

    assert_eq!(
        despan(result.expect("parsing failed")),
        vec![
            Token::Open(qname("empty-node"), S),
            Token::AttrEnd(S),
            Token::Close(None, S),
        ],
    );
}

// Resolving namespaces is not the concern of XIR.
#[test]
fn does_not_resolve_xmlns() {
    new_sut!(sut = r#"<x:no-ns xmlns:x="noresolve" />"#);

    let result = sut.collect::<Result<Vec<_>>>();

    assert_eq!(
        despan(result.expect("parsing failed")),
        vec![
            Token::Open(qname("x:no-ns"), S),
            // Since we didn't parse @xmlns, it's still an attribute.
            Token::Attr(qname("xmlns:x"), "noresolve".intern(), S),
            Token::AttrEnd(S),
            Token::Close(None, S),
        ],
    );
}

// The order of attributes must be retained.
#[test]
fn multiple_attrs_ordered_and_unescaped() {
    new_sut!(sut = r#"<ele foo="a" bar="b&amp;c" b:baz='c' />"#);

    let result = sut.collect::<Result<Vec<_>>>();

    assert_eq!(
        despan(result.expect("parsing failed")),
        vec![
            Token::Open(qname("ele"), S),
            Token::Attr(qname("foo"), "a".intern(), S),
            Token::Attr(qname("bar"), "b&c".intern(), S),
            Token::Attr(qname("b:baz"), "c".intern(), S),
            Token::AttrEnd(S),
            Token::Close(None, S),
        ],
    );
}

#[test]
fn child_text_and_closing_tags() {
    new_sut!(sut = "<root><child>a &lt; b</child>\n</root>");

    let result = sut.collect::<Result<Vec<_>>>();

    assert_eq!(
        despan(result.expect("parsing failed")),
        vec![
            Token::Open(qname("root"), S),
            Token::AttrEnd(S),
            Token::Open(qname("child"), S),
            Token::AttrEnd(S),
            Token::Text("a < b".intern(), S),
            Token::Close(Some(qname("child")), S),
            Token::Text("\n".intern(), S),
            Token::Close(Some(qname("root")), S),
        ],
    );
}

#[test]
fn cdata_is_verbatim_text_and_comments_are_kept() {
    new_sut!(sut = "<a><![CDATA[<&>]]><!-- note --></a>");

    let result = sut.collect::<Result<Vec<_>>>();

    assert_eq!(
        despan(result.expect("parsing failed")),
        vec![
            Token::Open(qname("a"), S),
            Token::AttrEnd(S),
            Token::Text("<&>".intern(), S),
            Token::Comment(" note ".intern(), S),
            Token::Close(Some(qname("a")), S),
        ],
    );
}

#[test]
fn skips_declaration_and_processing_instructions() {
    new_sut!(sut = r#"<?xml version="1.0" encoding="utf-8"?><?pi x?><a/>"#);

    let result = sut.collect::<Result<Vec<_>>>();

    assert_eq!(
        despan(result.expect("parsing failed")),
        vec![
            Token::Open(qname("a"), S),
            Token::AttrEnd(S),
            Token::Close(None, S),
        ],
    );
}

#[test]
fn token_spans() {
    new_sut!(sut = r#"<a foo="bar">x</a>"#);

    let result = sut.collect::<Result<Vec<_>>>();
    let c = DUMMY_CONTEXT;

    assert_eq!(
        result.expect("parsing failed"),
        vec![
            // <a
            Token::Open(qname("a"), c.span(0, 2)),
            // foo="bar"
            Token::Attr(qname("foo"), "bar".intern(), c.span(3, 9)),
            // >
            Token::AttrEnd(c.span(12, 1)),
            Token::Text("x".intern(), c.span(13, 1)),
            // </a>
            Token::Close(Some(qname("a")), c.span(14, 4)),
        ],
    );
}

#[test]
fn unsupported_xml_version() {
    new_sut!(sut = r#"<?xml version="1.1"?><a/>"#);

    let result = sut.collect::<Result<Vec<_>>>();

    assert!(
        matches!(
            result,
            Err(Error::UnsupportedXmlVersion(ver, _)) if ver == "1.1".intern()
        ),
        "expected unsupported version error, got {result:?}"
    );
}

#[test]
fn unsupported_encoding() {
    new_sut!(sut = r#"<?xml version="1.0" encoding="latin-1"?><a/>"#);

    let result = sut.collect::<Result<Vec<_>>>();

    assert!(
        matches!(
            result,
            Err(Error::UnsupportedEncoding(enc, _))
                if enc == "latin-1".intern()
        ),
        "expected unsupported encoding error, got {result:?}"
    );
}

#[test]
fn prefix_with_empty_local_name_invalid_qname() {
    // No local name (trailing colon).
    new_sut!(sut = r#"<x: xmlns:x="testns" />"#);

    let result = sut.collect::<Result<Vec<_>>>();

    assert!(
        matches!(
            result,
            Err(Error::InvalidQName(name, _)) if name == "x:".intern()
        ),
        "expected invalid QName error, got {result:?}"
    );
}

#[test]
fn mismatched_end_tag_is_an_error_and_ends_stream() {
    new_sut!(sut = "<a></b><c/>");

    let mut sut = sut;

    assert!(matches!(sut.next(), Some(Ok(Token::Open(..)))));
    assert!(matches!(sut.next(), Some(Ok(Token::AttrEnd(..)))));
    assert!(matches!(sut.next(), Some(Err(Error::QuickXml(..)))));
    assert_eq!(None, sut.next());
}

#[test]
fn invalid_utf8_text() {
    // 0xC0 is a UTF-8 lead byte without a continuation.
    let data: &[u8] = b"<a>\xC0</a>";
    new_sut!(b sut = data);

    let result = sut.collect::<Result<Vec<_>>>();

    assert!(result.is_err(), "expected error, got {result:?}");
}
