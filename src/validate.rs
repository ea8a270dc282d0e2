// Validation of XIR token streams
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

//! Validation of a XIR token stream against a [`Grammar`].
//!
//! The [`Validator`] consumes one [`XirToken`] at a time and maintains a
//!   stack of open elements.
//! The state of each open element is the expression that its remaining
//!   content must match;
//!     validation of an element proceeds as follows:
//!
//!   1. When its attributes are complete,
//!        the element expressions of the parent that admit its name are
//!        [collected](Deriver::collect) as _candidates_.
//!      Their content expressions are combined by choice.
//!   2. Each attribute is [fed](Deriver::feed) to the combined expression,
//!        and to the content expression of each candidate individually.
//!      The remaining attribute leaves are then [pruned](Deriver::prune).
//!   3. Runs of text and child elements are consumed in order by
//!        [residual](Deriver::residual).
//!   4. When the element closes,
//!        its combined expression must be nullable.
//!      The candidates whose own expressions are nullable are those that
//!        the element actually matched,
//!          and the parent derives by an [`Token::Element`] holding them.
//!
//! Tracking candidates individually allows for grammars in which more
//!   than one element expression with the same name may appear at the
//!   same position but with different content.
//!
//! Divergence from the grammar produces a [`ValidityError`],
//!   which is reported through a callback,
//!     after which validation recovers and continues.
//! Only malformed input produces an [`Error`],
//!   which halts validation.

mod error;
pub mod trace;

pub use error::{Error, ErrorKind, ValidityError};

use crate::{
    datatype::is_xml_blank,
    deriv::{Deriver, Token},
    expr::{Expr, ExprId, ExprPool},
    fmt::{DisplayWrapper, TtQuote},
    grammar::Grammar,
    span::{Span, UNKNOWN_SPAN},
    sym::{GlobalSymbolResolve, SymbolId},
    xir::{self, ns::ns_decl_prefix, ExpName, NsStack, QName, Token as XirToken},
};
use std::fmt::Display;
use trace::ValidatorTrace;

#[cfg(any(test, feature = "validate-trace-stderr"))]
pub type DefaultTrace = trace::HumanReadableTrace;

#[cfg(not(any(test, feature = "validate-trace-stderr")))]
pub type DefaultTrace = trace::VoidTrace;

/// Validate a complete token stream against `grammar`.
///
/// Each [`ValidityError`] is provided to `report` as it is found.
/// The result is whether the document is valid.
pub fn validate<I, R>(
    grammar: &Grammar,
    toks: I,
    mut report: R,
) -> Result<bool, Error>
where
    I: IntoIterator<Item = Result<XirToken, xir::Error>>,
    R: FnMut(ValidityError),
{
    let mut validator = Validator::new(grammar);

    for tok in toks {
        validator.feed(tok?, &mut report)?;
    }

    validator.finalize(&mut report)
}

/// Streaming validator.
///
/// Tokens are provided using [`Validator::feed`] and the end of input is
///   signaled using [`Validator::finalize`].
/// To stop validating early,
///   simply stop feeding tokens.
pub struct Validator<'g, T: ValidatorTrace = DefaultTrace> {
    grammar: &'g Grammar,
    deriver: Deriver<'g>,
    ns: NsStack,

    /// Open elements.
    stack: Vec<Frame>,

    /// Element whose attributes are being read.
    pending: Option<Pending>,

    /// What remains of the document outside of any element.
    doc: ExprId,

    /// Span of the most recent token,
    ///   for errors at the end of input.
    last_span: Span,

    error_count: usize,

    /// Errors reported for the current token,
    ///   retained only for tracing.
    reported: Vec<ValidityError>,

    trace: T,
}

#[derive(Debug)]
struct Pending {
    qname: QName,
    span: Span,
    attrs: Vec<(QName, SymbolId, Span)>,
}

/// State of an open element.
#[derive(Debug)]
struct Frame {
    name: ExpName,
    span: Span,
    state: FrameState,

    /// Text accumulated since the last child element.
    text: String,
    text_span: Option<Span>,

    /// Whether any child element has been opened.
    has_children: bool,

    /// Whether an error has already been reported for the content of
    ///   this element.
    ///
    /// Incomplete content is not reported in addition,
    ///   since it is most likely a consequence of the first error.
    recovering: bool,
}

#[derive(Debug)]
enum FrameState {
    Validating {
        cands: Vec<ExprId>,
        combined: ExprId,
        per: Vec<ExprId>,
    },

    /// The element was unexpected and its content is ignored.
    Skipping,
}

impl Frame {
    fn new(name: ExpName, span: Span, state: FrameState) -> Self {
        Self {
            name,
            span,
            state,
            text: String::new(),
            text_span: None,
            has_children: false,
            recovering: false,
        }
    }

    fn skipping(name: ExpName, span: Span) -> Self {
        Self::new(name, span, FrameState::Skipping)
    }

    fn combined(&self) -> Option<ExprId> {
        match self.state {
            FrameState::Validating { combined, .. } => Some(combined),
            FrameState::Skipping => None,
        }
    }

    fn push_text(&mut self, text: &str, span: Span) {
        if let FrameState::Skipping = self.state {
            return;
        }

        self.text.push_str(text);
        self.text_span = Some(match self.text_span {
            Some(prev) => prev.merge(span).unwrap_or(prev),
            None => span,
        });
    }

    /// Consume the accumulated text run,
    ///   if any.
    ///
    /// Invalid text is ignored after producing an error.
    fn flush_text(&mut self, deriver: &Deriver) -> Option<ValidityError> {
        let span = self.text_span.take()?;
        let text = std::mem::take(&mut self.text);

        match &mut self.state {
            FrameState::Validating { combined, per, .. } => {
                let after = deriver.text_residual(*combined, &text);

                // Content that permits nothing is left for the close of
                //   the element to report.
                if after == ExprId::NOT_ALLOWED && is_xml_blank(&text) {
                    return None;
                }

                if after == ExprId::NOT_ALLOWED {
                    self.recovering = true;

                    return Some(ValidityError::InvalidText {
                        parent: Some(self.name),
                        span,
                    });
                }

                *combined = after;

                for p in per.iter_mut() {
                    *p = deriver.text_residual(*p, &text);
                }

                None
            }

            FrameState::Skipping => None,
        }
    }
}

impl<'g> Validator<'g, DefaultTrace> {
    pub fn new(grammar: &'g Grammar) -> Self {
        Self::with_trace(grammar)
    }
}

impl<'g, T: ValidatorTrace> Validator<'g, T> {
    /// Create a validator using the trace `T`.
    pub fn with_trace(grammar: &'g Grammar) -> Self {
        Self {
            grammar,
            deriver: Deriver::new(grammar.pool()),
            ns: NsStack::new(),
            stack: Vec::new(),
            pending: None,
            doc: grammar.start(),
            last_span: UNKNOWN_SPAN,
            error_count: 0,
            reported: Vec::new(),
            trace: T::default(),
        }
    }

    /// Number of [`ValidityError`]s reported thus far.
    pub fn error_count(&self) -> usize {
        self.error_count
    }

    /// Consume a single token.
    ///
    /// Any [`ValidityError`]s found are provided to `report`.
    pub fn feed<R: FnMut(ValidityError)>(
        &mut self,
        tok: XirToken,
        report: &mut R,
    ) -> Result<(), Error> {
        let mut trace = std::mem::take(&mut self.trace);
        trace.trace_tok_begin(&*self, &tok);

        self.reported.clear();
        self.last_span = tok.span();

        let result = self.feed_tok(tok, report);

        trace.trace_tok_end(&*self, &self.reported, result.as_ref().err());
        self.trace = trace;

        result
    }

    fn feed_tok<R: FnMut(ValidityError)>(
        &mut self,
        tok: XirToken,
        report: &mut R,
    ) -> Result<(), Error> {
        match tok {
            XirToken::Open(qname, span) => {
                if let Some(pending) = self.pending.take() {
                    self.open(pending, report)?;
                }

                self.pending = Some(Pending {
                    qname,
                    span,
                    attrs: Vec::new(),
                });

                Ok(())
            }

            XirToken::Attr(name, value, span) => match &mut self.pending {
                Some(pending) => {
                    pending.attrs.push((name, value, span));
                    Ok(())
                }
                None => Err(Error::UnexpectedAttr(span)),
            },

            XirToken::AttrEnd(span) => match self.pending.take() {
                Some(pending) => self.open(pending, report),
                None => Err(Error::UnexpectedAttr(span)),
            },

            XirToken::Close(_, span) => {
                if let Some(pending) = self.pending.take() {
                    self.open(pending, report)?;
                }

                self.close(span, report)
            }

            XirToken::Text(text, span) => {
                self.text(text.lookup_str(), span, report);
                Ok(())
            }

            XirToken::Comment(..) => Ok(()),
        }
    }

    /// Signal the end of input.
    ///
    /// The result is whether the document was valid.
    pub fn finalize<R: FnMut(ValidityError)>(
        mut self,
        report: &mut R,
    ) -> Result<bool, Error> {
        if let Some(pending) = &self.pending {
            return Err(Error::UnexpectedEof(pending.span));
        }

        if let Some(frame) = self.stack.last() {
            return Err(Error::UnexpectedEof(frame.span));
        }

        if !self.pool().nullable(self.doc) {
            let expected = self.expected_names(self.doc);

            self.report(
                ValidityError::ContentModelIncomplete {
                    element: None,
                    span: self.last_span,
                    expected,
                },
                report,
            );
        }

        Ok(self.error_count == 0)
    }

    fn pool(&self) -> &'g ExprPool {
        self.grammar.pool()
    }

    fn report<R: FnMut(ValidityError)>(
        &mut self,
        err: ValidityError,
        report: &mut R,
    ) {
        self.error_count += 1;

        if T::WANTS_ERRORS {
            self.reported.push(err.clone());
        }

        report(err);
    }

    /// Begin an element once all of its attributes are known.
    fn open<R: FnMut(ValidityError)>(
        &mut self,
        pending: Pending,
        report: &mut R,
    ) -> Result<(), Error> {
        let Pending { qname, span, attrs } = pending;

        self.ns.push_scope();

        for (name, value, _) in attrs.iter() {
            if let Some(prefix) = ns_decl_prefix(*name) {
                self.ns.declare(prefix, *value);
            }
        }

        let name = self.ns.resolve_element(qname, span)?;

        let (parent, text_err) = match self.stack.last_mut() {
            None => (Some(self.doc), None),
            Some(frame) => {
                frame.has_children = true;
                let err = frame.flush_text(&self.deriver);
                (frame.combined(), err)
            }
        };

        if let Some(err) = text_err {
            self.report(err, report);
        }

        let frame = match parent {
            None => Frame::skipping(name, span),
            Some(parent) => self.start(parent, name, span, &attrs, report)?,
        };

        self.stack.push(frame);
        Ok(())
    }

    /// Determine candidates for an element and consume its attributes.
    fn start<R: FnMut(ValidityError)>(
        &mut self,
        parent: ExprId,
        name: ExpName,
        span: Span,
        attrs: &[(QName, SymbolId, Span)],
        report: &mut R,
    ) -> Result<Frame, Error> {
        let pool = self.pool();
        let cands = self.deriver.collect(parent, name);

        if cands.is_empty() {
            if let Some(frame) = self.stack.last_mut() {
                frame.recovering = true;
            }

            let expected = self.expected_names(parent);
            self.report(
                ValidityError::UnexpectedElement {
                    name,
                    span,
                    expected,
                },
                report,
            );

            return Ok(Frame::skipping(name, span));
        }

        let mut per = cands
            .iter()
            .map(|cand| element_content(pool, *cand))
            .collect::<Vec<_>>();
        let mut combined = pool.choice_all(per.iter().copied());

        for &(qname, value, attr_span) in attrs {
            if ns_decl_prefix(qname).is_some() {
                continue;
            }

            let attr_name = self.ns.resolve_attr(qname, attr_span)?;
            let value = value.lookup_str();
            let fed = self.deriver.feed(combined, attr_name, value);

            if fed != ExprId::NOT_ALLOWED {
                combined = fed;

                for p in per.iter_mut() {
                    *p = self.deriver.feed(*p, attr_name, value);
                }

                continue;
            }

            self.report(
                ValidityError::BadAttribute {
                    name: attr_name,
                    element: name,
                    span: attr_span,
                },
                report,
            );

            // A declared attribute with a bad value is still present.
            let discharged = self.deriver.feed_name(combined, attr_name);

            if discharged != ExprId::NOT_ALLOWED {
                combined = discharged;

                for p in per.iter_mut() {
                    *p = self.deriver.feed_name(*p, attr_name);
                }
            }
        }

        match self.deriver.prune(combined) {
            ExprId::NOT_ALLOWED => {
                let required = self
                    .deriver
                    .required_attrs(combined)
                    .into_iter()
                    .map(|nc| pool.display_name_class(nc).to_string())
                    .collect::<Vec<_>>();

                // Content that can never be satisfied is reported when the
                //   element closes.
                if !required.is_empty() {
                    self.report(
                        ValidityError::MissingAttribute {
                            element: name,
                            span,
                            required,
                        },
                        report,
                    );
                }

                combined = self.deriver.prune_lenient(combined);

                for p in per.iter_mut() {
                    *p = self.deriver.prune_lenient(*p);
                }
            }

            pruned => {
                combined = pruned;

                for p in per.iter_mut() {
                    *p = self.deriver.prune(*p);
                }
            }
        }

        Ok(Frame::new(
            name,
            span,
            FrameState::Validating {
                cands,
                combined,
                per,
            },
        ))
    }

    fn close<R: FnMut(ValidityError)>(
        &mut self,
        span: Span,
        report: &mut R,
    ) -> Result<(), Error> {
        let mut frame = self.stack.pop().ok_or(Error::UnbalancedClose(span))?;
        self.ns.pop_scope();

        // An element with no content holds a single empty run of text.
        if !frame.has_children && frame.text_span.is_none() {
            frame.text_span = Some(span);
        }

        if let Some(err) = frame.flush_text(&self.deriver) {
            self.report(err, report);
        }

        let (cands, combined, per) = match frame.state {
            FrameState::Validating {
                cands,
                combined,
                per,
            } => (cands, combined, per),

            // The error was reported when the element opened.
            FrameState::Skipping => {
                if self.stack.is_empty() {
                    self.doc = ExprId::EMPTY;
                }

                return Ok(());
            }
        };

        let pool = self.pool();

        let matched = if pool.nullable(combined) {
            let real = cands
                .iter()
                .zip(per.iter())
                .filter(|(_, p)| pool.nullable(**p))
                .map(|(cand, _)| *cand)
                .collect::<Vec<_>>();

            if real.is_empty() {
                cands
            } else {
                real
            }
        } else if frame.recovering {
            cands
        } else {
            let expected = self.expected_names(combined);
            self.report(
                ValidityError::ContentModelIncomplete {
                    element: Some(frame.name),
                    span,
                    expected,
                },
                report,
            );

            cands
        };

        let tok = Token::Element(&matched);

        match self.stack.last_mut() {
            Some(Frame {
                state: FrameState::Validating { combined, per, .. },
                ..
            }) => {
                *combined = self.deriver.residual(*combined, tok);

                for p in per.iter_mut() {
                    *p = self.deriver.residual(*p, tok);
                }
            }

            // Children of skipped elements are themselves skipped.
            Some(_) => (),

            None => self.doc = self.deriver.residual(self.doc, tok),
        }

        Ok(())
    }

    fn text<R: FnMut(ValidityError)>(
        &mut self,
        text: &str,
        span: Span,
        report: &mut R,
    ) {
        match self.stack.last_mut() {
            Some(frame) => frame.push_text(text, span),

            None if is_xml_blank(text) => (),

            None => self.report(
                ValidityError::InvalidText { parent: None, span },
                report,
            ),
        }
    }

    fn expected_names(&self, e: ExprId) -> Vec<String> {
        let pool = self.pool();

        self.deriver
            .expected(e)
            .into_iter()
            .map(|nc| pool.display_name_class(nc).to_string())
            .collect()
    }
}

fn element_content(pool: &ExprPool, ele: ExprId) -> ExprId {
    match pool.get(ele) {
        Expr::Element(_, content) => content,
        _ => ExprId::NOT_ALLOWED,
    }
}

impl<'g, T: ValidatorTrace> Display for Validator<'g, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let pool = self.pool();

        match (&self.pending, self.stack.last()) {
            (Some(pending), _) => write!(
                f,
                "reading attributes of {}",
                TtQuote::wrap(pending.qname)
            ),

            (None, None) => write!(
                f,
                "outside of any element expecting {}",
                pool.display(self.doc)
            ),

            (None, Some(frame)) => match &frame.state {
                FrameState::Skipping => write!(
                    f,
                    "skipping content of unexpected element {}",
                    TtQuote::wrap(frame.name)
                ),
                FrameState::Validating {
                    cands, combined, ..
                } => write!(
                    f,
                    "in element {} at depth {} ({} candidate(s)) \
                       expecting {}",
                    TtQuote::wrap(frame.name),
                    self.stack.len(),
                    cands.len(),
                    pool.display(*combined),
                ),
            },
        }
    }
}
