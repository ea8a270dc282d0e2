// Global constants across the entire crate
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

//! System-wide static configuration.
//!
//! This module provides a system-wide configuration.
//! Subsystems should reference these values rather than defining their own
//!   and risk incompatibilities or maintenance issues as requirements
//!   change.
//!
//! By convention,
//!   import this entire module rather than individual members and reference
//!   them as `global::foo` to emphasize their nature and risk.

use std::num;

/// A size capable of representing every interned string.
///
/// Interned strings include element and attribute names,
///   attribute values,
///   text runs,
///   and file paths;
///     documents with a great deal of unique text will consume symbols
///     quickly.
pub type SymSize = u32;

/// A non-zero equivalent of [`SymSize`];
pub type NonZeroSymSize = num::NonZeroU32;

/// A size capable of representing every expression in a grammar,
///   _including_ every expression derived from it during validation.
///
/// Derived expressions are hash-consed,
///   so the pool grows with the number of _distinct_ residuals rather than
///   the number of tokens validated.
pub type ExprSize = u32;

/// Size of the byte offset component of a [`Span`](crate::span::Span).
///
/// This determines the maximum size of a source file.
pub type SourceFileSize = u32;

/// Size of the length component of a [`Span`](crate::span::Span).
pub type FrontendTokenLength = u32;

/// Initial capacity of the global string interner.
///
/// This is largely arbitrary;
///   it avoids reallocation of the interner's hash table while loading
///   small schemas and documents.
pub const INIT_GLOBAL_INTERNER_CAPACITY: usize = 1024;

/// Initial capacity of an expression pool.
pub const INIT_EXPR_POOL_CAPACITY: usize = 256;
