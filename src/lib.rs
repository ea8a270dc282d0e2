// Dervish library
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

//! Derivative-based validation of XML documents against regular tree
//!   grammars.
//!
//! A grammar is a pool of [expressions](expr) describing elements,
//!   attributes, text, data, lists, and their compositions by sequence,
//!   choice, interleaving, and repetition.
//! Validation proceeds one token at a time:
//!   the expression describing what may follow is replaced by its
//!   [residual](deriv) with respect to each token consumed,
//!     and the document is valid if the final residual accepts the empty
//!     sequence.
//!
//! The major subsystems, from the leaves up, are:
//!
//!   - [`sym`] and [`span`], providing interned strings and source
//!       locations;
//!   - [`xir`], reading XML into a flat token stream;
//!   - [`expr`], the expression algebra and its normalizing builder;
//!   - [`datatype`], the libraries of datatypes used by `data` and
//!       `value` expressions;
//!   - [`deriv`], computing residuals;
//!   - [`validate`], driving residual computation from a token stream;
//!   - [`schema`], loading grammars from the RELAX NG XML syntax; and
//!   - [`diagnose`], rendering errors for humans.

// We build docs for private items.
#![allow(rustdoc::private_intra_doc_links)]

pub mod global;

#[macro_use]
extern crate static_assertions;

pub mod datatype;
pub mod deriv;
pub mod diagnose;
pub mod expr;
pub mod fmt;
pub mod grammar;
pub mod schema;
pub mod span;
pub mod sym;
pub mod validate;
pub mod xir;
