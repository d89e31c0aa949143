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

//! Transactions and postings.
//!
//! A transaction goes through two states:
//! - [`DraftTransaction`]: postings as written, some possibly without an amount.
//! - [`Transaction`]: balanced, every posting has an amount and they sum to zero.
//!
//! The only way from the first to the second is
//! [`balance_transaction`](crate::balance_transaction).

use crate::decimal::FixedDecimal;
use chrono::NaiveDate;
use serde::Serialize;

/// One account change inside a balanced transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Posting {
    /// Colon-delimited account path, e.g. `Assets:Bank:Checking`.
    pub name: String,
    pub balance: FixedDecimal,
    pub comment: Option<String>,
}

/// A balanced transaction: posting balances sum to zero.
///
/// Fields are read-only; build one through
/// [`balance_transaction`](crate::balance_transaction).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transaction {
    pub(crate) date: NaiveDate,
    pub(crate) payee: String,
    pub(crate) payee_comment: Option<String>,
    pub(crate) postings: Vec<Posting>,
    pub(crate) comments: Vec<String>,
}

impl Transaction {
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn payee(&self) -> &str {
        &self.payee
    }

    pub fn payee_comment(&self) -> Option<&str> {
        self.payee_comment.as_deref()
    }

    pub fn postings(&self) -> &[Posting] {
        &self.postings
    }

    /// Free-standing comment lines attached to this transaction.
    pub fn comments(&self) -> &[String] {
        &self.comments
    }

    /// Turns the transaction back into a draft with every amount explicit.
    pub fn into_draft(self) -> DraftTransaction {
        DraftTransaction {
            date: self.date,
            payee: self.payee,
            payee_comment: self.payee_comment,
            postings: self
                .postings
                .into_iter()
                .map(|p| DraftPosting {
                    name: p.name,
                    amount: Some(p.balance),
                    comment: p.comment,
                })
                .collect(),
            comments: self.comments,
        }
    }
}

/// A posting as written in the ledger.
///
/// `amount` is `None` when the line carries no amount at all, which is not
/// the same as an explicit `0`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftPosting {
    pub name: String,
    pub amount: Option<FixedDecimal>,
    pub comment: Option<String>,
}

impl DraftPosting {
    pub fn new(name: impl Into<String>, amount: Option<FixedDecimal>) -> Self {
        Self {
            name: name.into(),
            amount,
            comment: None,
        }
    }
}

/// A transaction whose postings have not been balanced yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftTransaction {
    pub date: NaiveDate,
    pub payee: String,
    pub payee_comment: Option<String>,
    pub postings: Vec<DraftPosting>,
    pub comments: Vec<String>,
}

impl DraftTransaction {
    pub fn new(date: NaiveDate, payee: impl Into<String>) -> Self {
        Self {
            date,
            payee: payee.into(),
            payee_comment: None,
            postings: Vec::new(),
            comments: Vec::new(),
        }
    }

    /// Appends a posting, builder style.
    pub fn posting(mut self, name: impl Into<String>, amount: Option<FixedDecimal>) -> Self {
        self.postings.push(DraftPosting::new(name, amount));
        self
    }
}
