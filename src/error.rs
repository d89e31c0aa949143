// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Error types for decimal parsing, balancing, expression evaluation and
//! ledger parsing.

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced when reading a [`FixedDecimal`](crate::FixedDecimal) from text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecimalError {
    /// Empty input or a character that is not a digit.
    #[error("invalid decimal syntax: {0:?}")]
    Syntax(String),

    /// Integer part does not fit once scaled to thousandths.
    #[error("decimal value out of range: {0:?}")]
    Overflow(String),
}

/// Reasons a transaction cannot be balanced.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceError {
    /// A transaction needs at least two postings.
    #[error("need at least two postings")]
    InsufficientPostings,

    /// Explicit amounts do not sum to zero and no posting is left open.
    #[error("no empty account to place extra balance")]
    Unbalanced,

    /// Explicit amounts do not sum to zero and several postings are open.
    #[error("more than one account empty")]
    AmbiguousBalance,
}

/// Failures while evaluating an inline amount expression.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExprError {
    #[error("unexpected character {found:?} at offset {offset}")]
    UnexpectedChar { found: char, offset: usize },

    #[error("unexpected end of expression")]
    UnexpectedEnd,

    #[error("unexpected trailing input at offset {0}")]
    TrailingInput(usize),

    #[error("unbalanced parenthesis")]
    UnbalancedParen,

    #[error("division by zero")]
    DivisionByZero,

    /// A power with no real result, such as a negative base raised to a fraction.
    #[error("power has no real result")]
    InvalidPower,

    #[error("result out of range")]
    Overflow,

    #[error(transparent)]
    Number(#[from] DecimalError),
}

/// What went wrong at a given ledger location.
#[derive(Error, Debug)]
pub enum ParseErrorKind {
    /// Malformed date, payee or posting line.
    #[error("unable to parse transaction: {0}")]
    Syntax(String),

    #[error("unable to parse transaction: {0}")]
    Decimal(#[from] DecimalError),

    #[error("unable to parse transaction: {0}")]
    Expression(#[from] ExprError),

    #[error("unable to parse transaction: {0}")]
    Balance(#[from] BalanceError),

    /// An `include` pattern matched no files.
    #[error("include pattern {pattern:?} matched no files")]
    IncludeNotFound { pattern: String },

    /// An `include` pattern is not a valid glob.
    #[error("invalid include pattern {pattern:?}: {message}")]
    InvalidPattern { pattern: String, message: String },

    /// A file includes itself, directly or through other files.
    #[error("include cycle detected at {}", path.display())]
    IncludeCycle { path: PathBuf },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// A ledger parsing failure with its source location.
///
/// Displays as `<file>:<line>: <cause>`. Line numbers are 1-based.
#[derive(Error, Debug)]
#[error("{file}:{line}: {kind}")]
pub struct ParseError {
    pub file: String,
    pub line: usize,
    #[source]
    pub kind: ParseErrorKind,
}

impl ParseError {
    pub fn new(file: impl Into<String>, line: usize, kind: impl Into<ParseErrorKind>) -> Self {
        Self {
            file: file.into(),
            line,
            kind: kind.into(),
        }
    }
}
