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

//! Transaction balancing.
//!
//! Explicit amounts are summed and at most one posting may be left without an
//! amount; that posting receives whatever brings the total back to zero.
//!
//! # Example
//!
//! ```
//! use chrono::NaiveDate;
//! use ledger_rs::{balance_transaction, DraftTransaction, FixedDecimal};
//!
//! let draft = DraftTransaction::new(NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(), "Grocer")
//!     .posting("Expenses:Food", Some(FixedDecimal::from_int(42)))
//!     .posting("Assets:Cash", None);
//!
//! let txn = balance_transaction(draft).unwrap();
//! assert_eq!(txn.postings()[1].balance, FixedDecimal::from_int(-42));
//! ```

use crate::decimal::FixedDecimal;
use crate::error::BalanceError;
use crate::transaction::{DraftTransaction, Posting, Transaction};

/// Balances a draft into a [`Transaction`].
///
/// Rules, applied in order:
///
/// | Situation | Outcome |
/// |-----------|---------|
/// | fewer than two postings | [`BalanceError::InsufficientPostings`] |
/// | explicit amounts sum to zero | accepted, open postings become zero |
/// | non-zero sum, one open posting | open posting receives the negated sum |
/// | non-zero sum, no open posting | [`BalanceError::Unbalanced`] |
/// | non-zero sum, several open postings | [`BalanceError::AmbiguousBalance`] |
///
/// Balancing an already balanced transaction changes nothing.
///
/// # Errors
///
/// See the table above.
pub fn balance_transaction(draft: DraftTransaction) -> Result<Transaction, BalanceError> {
    if draft.postings.len() < 2 {
        return Err(BalanceError::InsufficientPostings);
    }

    let sum: FixedDecimal = draft.postings.iter().filter_map(|p| p.amount).sum();
    let open = draft.postings.iter().filter(|p| p.amount.is_none()).count();

    let fill = match (sum.is_zero(), open) {
        (true, _) => FixedDecimal::ZERO,
        (false, 1) => -sum,
        (false, 0) => return Err(BalanceError::Unbalanced),
        (false, _) => return Err(BalanceError::AmbiguousBalance),
    };

    let postings = draft
        .postings
        .into_iter()
        .map(|p| Posting {
            name: p.name,
            balance: p.amount.unwrap_or(fill),
            comment: p.comment,
        })
        .collect();

    Ok(Transaction {
        date: draft.date,
        payee: draft.payee,
        payee_comment: draft.payee_comment,
        postings,
        comments: draft.comments,
    })
}
