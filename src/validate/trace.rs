// Validator tracing
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

//! Tracing for validation.
//!
//! This provides human-readable traces on standard error any time a token
//!   is fed to the [`Validator`](super::Validator).
//! These traces are provided automatically when `cfg(test)`,
//!   which means that they are automatically included in the output of any
//!   test failure.
//!
//! Outside of tests,
//!   this can be enabled at build time using the
//!   `validate-trace-stderr` feature flag
//!     (`cargo build --features validate-trace-stderr`).
//!
//! _These traces are not meant to be machine-readable!_
//! Do not try to parse them,
//!   since the format is subject to change without notice.

use super::{Error, ValidityError};
use crate::xir::Token as XirToken;
use std::fmt::Display;

pub trait ValidatorTrace: Default {
    /// Whether this trace makes use of reported errors.
    ///
    /// This allows the validator to avoid retaining errors for traces
    ///   that would discard them.
    const WANTS_ERRORS: bool = true;

    /// Output the upper portion of a token trace,
    ///   describing the state of the validator and the token that it
    ///   received.
    ///
    /// There is no means to return an error and a failure to output the
    ///   trace should not interrupt processing.
    fn trace_tok_begin<S: Display>(&mut self, st_orig: &S, tok: &XirToken);

    /// Output the lower portion of a token trace,
    ///   describing the resulting state and anything reported while
    ///   processing the token.
    fn trace_tok_end<S: Display>(
        &mut self,
        st_new: &S,
        reported: &[ValidityError],
        err: Option<&Error>,
    );
}

/// Perform no tracing.
///
/// This should be used by default for non-test builds,
///   since tracing renders expressions for every token.
#[derive(Debug, PartialEq, Default)]
pub struct VoidTrace;

impl ValidatorTrace for VoidTrace {
    const WANTS_ERRORS: bool = false;

    fn trace_tok_begin<S: Display>(&mut self, _st_orig: &S, _tok: &XirToken) {
        // Do nothing at all.
    }

    fn trace_tok_end<S: Display>(
        &mut self,
        _st_new: &S,
        _reported: &[ValidityError],
        _err: Option<&Error>,
    ) {
        // Do nothing at all.
    }
}

/// Human-readable [`ValidatorTrace`].
///
/// See [module-level](self) documentation for more information.
#[derive(Debug, PartialEq, Default)]
pub struct HumanReadableTrace;

impl ValidatorTrace for HumanReadableTrace {
    fn trace_tok_begin<S: Display>(&mut self, st_orig: &S, tok: &XirToken) {
        eprint!(
            "\
[Validator::feed]
| ==> Validator before tok:
|  |  {st_orig}
|
| ==> XIR tok: {tok}
|  |  {tok:?}
|\n",
        );
    }

    fn trace_tok_end<S: Display>(
        &mut self,
        st_new: &S,
        reported: &[ValidityError],
        err: Option<&Error>,
    ) {
        eprint!(
            "\
| ==> Validator after tok:
|  |  {st_new}\n",
        );

        for verr in reported {
            eprint!(
                "\
|
| ==> invalid: {verr}.
|  |  {verr:?}\n",
            );
        }

        if let Some(err) = err {
            eprint!(
                "\
|
| ==> !!! error: {err}.
|  |  {err:?}\n",
            );
        }

        #[allow(unused_variables)]
        let cfg = ""; // so that this compiles without matching cfg
        #[cfg(feature = "validate-trace-stderr")]
        #[allow(unused_variables)]
        let cfg = "feature = \"validate-trace-stderr\"";
        #[cfg(test)] // takes precedence if both are set
        let cfg = "test";
        eprint!(
            "= note: this trace was output as a debugging aid \
                because `cfg({cfg})`.\n\n",
        );
    }
}
