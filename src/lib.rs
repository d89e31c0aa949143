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

//! # Ledger
//!
//! Plain-text double-entry accounting: parse ledger files into balanced
//! transactions, then report hierarchical account balances, optionally
//! grouped by calendar period.
//!
//! ## Core Components
//!
//! - [`FixedDecimal`]: exact amounts with three fractional digits
//! - [`LedgerParser`]: reads ledger text, following `include` directives
//! - [`balance_transaction`]: infers the one missing amount of a transaction
//! - [`balances`]: rolls posting amounts up the account hierarchy
//! - [`balances_by_period`]: the same, per day, week, month, ...
//!
//! ## Example
//!
//! ```
//! use ledger_rs::{balances, parse_ledger, FixedDecimal};
//!
//! let ledger = "\
//! 1970/01/01 Payee
//! \tExpense:test  (123 * 3)
//! \tAssets
//! ";
//!
//! let transactions = parse_ledger("inline", ledger.as_bytes()).unwrap();
//! let postings = transactions[0].postings();
//! assert_eq!(postings[0].balance, FixedDecimal::from_int(369));
//! assert_eq!(postings[1].balance, FixedDecimal::from_int(-369));
//!
//! let assets = balances(&transactions, &["Assets"]);
//! assert_eq!(assets[0].balance.to_string(), "-369.000");
//! ```
//!
//! ## Concurrency
//!
//! Files matched by one `include` glob are parsed on separate threads; the
//! order in which their transactions arrive is not defined. Use
//! [`ParseOptions::parallel_includes`] to parse them one after another in
//! path order.

pub mod account;
pub mod balance;
pub mod decimal;
pub mod error;
pub mod expr;
pub mod parser;
pub mod period;
pub mod source;
mod transaction;

pub use account::{Account, balances};
pub use balance::balance_transaction;
pub use decimal::FixedDecimal;
pub use error::{BalanceError, DecimalError, ExprError, ParseError, ParseErrorKind};
pub use parser::{
    LedgerParser, LedgerStream, ParseOptions, TransactionSink, parse_ledger, parse_ledger_file,
    parse_ledger_file_streaming, parse_ledger_streaming,
};
pub use period::{
    Period, PeriodBucket, RangeType, balances_by_period, date_boundaries, transactions_by_period,
    transactions_in_range,
};
pub use transaction::{DraftPosting, DraftTransaction, Posting, Transaction};
