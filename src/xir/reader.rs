// XIR reader
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

//! Parse XML files into a XIR [`Token`] stream.
//!
//! This uses [`quick_xml`] as the parser.

use super::{Error, QName, Token};
use crate::{
    span::{Context, Span},
    sym::{GlobalSymbolIntern, GlobalSymbolInternBytes},
};
use quick_xml::{
    self,
    events::{BytesDecl, BytesStart, Event as QuickXmlEvent},
};
use std::{borrow::Cow, collections::VecDeque, io::BufRead, result};

pub type Result<T> = result::Result<T, Error>;

/// Parse XML into a XIR [`Token`] stream.
///
/// This reader is intended to be used as an [`Iterator`].
///
/// The underlying reader produces events in chunks that are far too
///   large for XIR,
///     so most [`Token`]s retrieved via this call are buffered.
/// Parsing takes place when that buffer is exhausted and the next event
///   is requested from the underlying reader
///     (see [`XmlXirReader::refill_buf`]).
/// Errors can only occur during parsing,
///   and will never occur on buffered tokens.
///
/// [`None`] is returned on EOF and after the first error,
///   since `quick-xml` cannot reliably recover from malformed input.
pub struct XmlXirReader<B: BufRead> {
    /// Inner parser.
    reader: quick_xml::Reader<B>,

    /// Parsing context for reader.
    ctx: Context,

    /// Buffer for [`quick_xml::Reader`].
    readbuf: Vec<u8>,

    /// [`Token`] buffer populated upon receiving a new event from
    ///   `reader`.
    ///
    /// This buffer serves [`Iterator::next`] requests until it is
    ///   depleted,
    ///     after which [`XmlXirReader::refill_buf`] requests another token
    ///     from `reader`.
    tokbuf: VecDeque<Token>,

    /// Whether parsing has finished,
    ///   either by reaching EOF or by failing.
    done: bool,
}

impl<B: BufRead> XmlXirReader<B> {
    pub fn new(reader: B, ctx: Context) -> Self {
        let mut reader = quick_xml::Reader::from_reader(reader);

        // Text is significant to validation,
        //   including whitespace.
        reader.config_mut().trim_text(false);

        // Mismatched end tags are a well-formedness error;
        //   nothing downstream is prepared to recover from them.
        reader.config_mut().check_end_names = true;

        Self {
            reader,
            ctx,
            readbuf: Vec::new(),
            // This capacity is largely arbitrary,
            //   but [`Token`]s are small enough that it likely does not
            //   matter much.
            tokbuf: VecDeque::with_capacity(32),
            done: false,
        }
    }

    /// Parse using the underlying [`quick_xml::Reader`] and populate the
    ///   [`Token`] buffer.
    ///
    /// This is intended to be invoked once the buffer has been depleted by
    ///   [`XmlXirReader::next`].
    /// Events that do not produce tokens
    ///   (declarations, processing instructions, doctypes)
    ///   are skipped.
    pub fn refill_buf(&mut self) -> Option<Result<Token>> {
        loop {
            // Clear any previous buffer to free unneeded data.
            self.tokbuf.clear();
            self.readbuf.clear();

            let ctx = self.ctx;
            let prev_pos = self.reader.buffer_position() as usize;

            let ev = match self.reader.read_event_into(&mut self.readbuf) {
                Ok(ev) => ev,
                Err(inner) => {
                    let pos = self.reader.error_position() as usize;
                    let span = ctx.span_or_zz(pos, 0);

                    return Some(Err(Error::QuickXml(inner.to_string(), span)));
                }
            };

            let new_pos = self.reader.buffer_position() as usize;
            let ev_len = new_pos.saturating_sub(prev_pos);

            return Some(match ev {
                // This is the only time we'll consider the iterator to be
                //   done.
                QuickXmlEvent::Eof => return None,

                QuickXmlEvent::Empty(ele) => {
                    let tokbuf = &mut self.tokbuf;

                    Self::parse_element_open(tokbuf, ele, prev_pos, ctx).map(
                        |open| {
                            // `<tag ... />`
                            //           ||
                            let span = ctx.span_or_zz(new_pos - 2, 2);

                            tokbuf.push_back(Token::AttrEnd(span));
                            tokbuf.push_back(Token::Close(None, span));

                            open
                        },
                    )
                }

                QuickXmlEvent::Start(ele) => {
                    let tokbuf = &mut self.tokbuf;

                    Self::parse_element_open(tokbuf, ele, prev_pos, ctx).map(
                        |open| {
                            // `<tag ...>`
                            //          |
                            let span = ctx.span_or_zz(new_pos - 1, 1);
                            tokbuf.push_back(Token::AttrEnd(span));

                            open
                        },
                    )
                }

                QuickXmlEvent::End(ele) => {
                    // </foo>
                    // |----|
                    let span = ctx.span_or_zz(prev_pos, ev_len);

                    QName::try_from(ele.name().as_ref())
                        .map_err(Error::from_with_span(span))
                        .map(|qname| Token::Close(Some(qname), span))
                }

                QuickXmlEvent::Text(bytes) if bytes.is_empty() => continue,

                QuickXmlEvent::Text(bytes) => {
                    // <text>foo bar</text>
                    //       |-----|
                    let span = ctx.span_or_zz(prev_pos, ev_len);

                    bytes
                        .unescape()
                        .map_err(|e| Error::QuickXml(e.to_string(), span))
                        .map(|unesc| Token::Text(unesc.intern(), span))
                }

                // CDATA is not escaped and so is taken verbatim as text.
                QuickXmlEvent::CData(bytes) => {
                    // <![CDATA[foo]]>
                    // |-------------|
                    let span = ctx.span_or_zz(prev_pos, ev_len);

                    (&*bytes)
                        .intern_utf8()
                        .map_err(Error::from_with_span(span))
                        .map(|sym| Token::Text(sym, span))
                }

                // Comments are _not_ returned escaped.
                QuickXmlEvent::Comment(bytes) => {
                    // <!-- foo -->
                    // |----------|
                    let span = ctx.span_or_zz(prev_pos, ev_len);

                    (&*bytes)
                        .intern_utf8()
                        .map_err(Error::from_with_span(span))
                        .map(|comment| Token::Comment(comment, span))
                }

                QuickXmlEvent::Decl(decl) => {
                    let span = ctx.span_or_zz(prev_pos, ev_len);

                    match Self::validate_decl(&decl, span) {
                        Err(e) => Err(e),
                        Ok(()) => continue,
                    }
                }

                // We do not support processing instructions or doctypes;
                //   they have no bearing on validation.
                QuickXmlEvent::PI(..) | QuickXmlEvent::DocType(..) => continue,
            });
        }
    }

    /// Validate that an XML declaration contains expected values.
    ///
    /// A declaration looks like `<?xml version="1.0" encoding="utf-8"?>`,
    ///   where `@encoding` is optional but `@version` is not.
    /// It may also contain `@standalone`,
    ///   but we do not check for that.
    ///
    /// We expect version 1.0 and UTF-8 encoding.
    /// Failing when these expectations are violated helps to ensure that
    ///   people unfamiliar with the system do not have expectations that
    ///   are going to be unmet,
    ///     which may result in subtle (or even serious) problems.
    ///
    /// Errors are reported on the span of the entire declaration.
    fn validate_decl(decl: &BytesDecl, span: Span) -> Result<()> {
        let ver = decl
            .version()
            .map_err(|e| Error::QuickXml(e.to_string(), span))?;

        if &ver[..] != b"1.0" {
            Err(Error::UnsupportedXmlVersion(
                (&ver[..])
                    .intern_utf8()
                    .map_err(Error::from_with_span(span))?,
                span,
            ))?
        }

        if let Some(enc) = decl.encoding() {
            let enc = enc.map_err(|e| Error::QuickXml(e.to_string(), span))?;

            match &enc[..] {
                b"utf-8" | b"UTF-8" => (),
                invalid => Err(Error::UnsupportedEncoding(
                    invalid.intern_utf8().map_err(Error::from_with_span(span))?,
                    span,
                ))?,
            }
        }

        Ok(())
    }

    /// Parse opening element and its attributes into a XIR [`Token`]
    ///   stream.
    ///
    /// The opening element is returned rather than being added to the token
    ///   buffer,
    ///     since the intent is to provide that token immediately.
    /// Attributes are added to the token buffer;
    ///   the caller is responsible for adding [`Token::AttrEnd`].
    fn parse_element_open(
        tokbuf: &mut VecDeque<Token>,
        ele: BytesStart,
        pos: usize,
        ctx: Context,
    ) -> Result<Token> {
        let name = ele.name();
        let len = name.as_ref().len();

        // <tag ...
        // |--|  name + '<'
        let span = ctx.span_or_zz(pos, len + 1);

        let qname = QName::try_from(name.as_ref())
            .map_err(Error::from_with_span(ctx.span_or_zz(pos + 1, len)))?;

        // `ele` begins immediately after the opening `<`.
        let ele_ptr = ele.as_ptr() as usize;
        let ele_pos = pos + 1;

        for result in ele.attributes() {
            let attr = result.map_err(|e| {
                Error::QuickXml(e.to_string(), ctx.span_or_zz(pos, len + 1))
            })?;

            let key = attr.key.as_ref();
            let key_offset = key.as_ptr() as usize - ele_ptr;

            // Attribute values borrow from the element buffer,
            //   and so pointer arithmetic gives us their offsets;
            //     an owned value
            //       (which should not happen for values read directly
            //         from the source)
            //       falls back to the span of the key.
            let attr_len = match &attr.value {
                Cow::Borrowed(b) => {
                    // key="value"
                    // |---------|  through the closing quote
                    (b.as_ptr() as usize + b.len() + 1)
                        .saturating_sub(key.as_ptr() as usize)
                }
                Cow::Owned(_) => key.len(),
            };

            let attr_span = ctx.span_or_zz(ele_pos + key_offset, attr_len);

            let name = QName::try_from(key)
                .map_err(Error::from_with_span(attr_span))?;

            let value = attr
                .unescape_value()
                .map_err(|e| Error::QuickXml(e.to_string(), attr_span))?;

            tokbuf.push_back(Token::Attr(
                name,
                value.intern(),
                attr_span,
            ));
        }

        // The first token will be immediately returned
        //   via the Iterator.
        Ok(Token::Open(qname, span))
    }
}

impl<B: BufRead> Iterator for XmlXirReader<B> {
    type Item = Result<Token>;

    /// Produce the next XIR [`Token`] from the input.
    ///
    /// For more information on how this reader operates,
    ///   see [`XmlXirReader`].
    fn next(&mut self) -> Option<Self::Item> {
        if let Some(tok) = self.tokbuf.pop_front() {
            return Some(Ok(tok));
        }

        if self.done {
            return None;
        }

        let result = self.refill_buf();

        match &result {
            None | Some(Err(_)) => self.done = true,
            Some(Ok(_)) => (),
        }

        result
    }
}

#[cfg(test)]
mod test;
