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

//! Hierarchical account balances.
//!
//! Account names are colon-delimited paths. A posting to
//! `Assets:Bank:Checking` counts towards `Assets`, `Assets:Bank` and
//! `Assets:Bank:Checking`.
//!
//! # Example
//!
//! ```
//! use ledger_rs::{balances, parse_ledger};
//!
//! let ledger = "2024/01/01 Salary\n    Assets:Bank  100\n    Income:Job\n";
//! let transactions = parse_ledger("inline", ledger.as_bytes()).unwrap();
//!
//! let accounts = balances(&transactions, &["Assets"]);
//! assert_eq!(accounts.len(), 2);
//! assert_eq!(accounts[0].name, "Assets");
//! assert_eq!(accounts[1].name, "Assets:Bank");
//! assert_eq!(accounts[1].balance.to_string(), "100.000");
//! ```

use crate::decimal::FixedDecimal;
use crate::transaction::Transaction;
use serde::Serialize;
use std::collections::BTreeMap;

/// Separator between the levels of an account path.
pub const ACCOUNT_SEPARATOR: char = ':';

/// Aggregated balance of one account path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Account {
    pub name: String,
    pub balance: FixedDecimal,
}

impl Account {
    pub fn new(name: impl Into<String>, balance: FixedDecimal) -> Self {
        Self {
            name: name.into(),
            balance,
        }
    }

    /// Number of path levels: `Assets` is 1, `Assets:Bank` is 2.
    pub fn depth(&self) -> usize {
        self.name.split(ACCOUNT_SEPARATOR).count()
    }

    /// Last path segment.
    pub fn leaf_name(&self) -> &str {
        self.name
            .rsplit(ACCOUNT_SEPARATOR)
            .next()
            .unwrap_or(&self.name)
    }

    /// Path of the enclosing account, `None` at the top level.
    pub fn parent(&self) -> Option<&str> {
        self.name
            .rsplit_once(ACCOUNT_SEPARATOR)
            .map(|(parent, _)| parent)
    }
}

/// Sums posting balances into every ancestor of each account path.
///
/// Only postings whose account name contains at least one of `filters` are
/// counted; an empty filter list counts everything. The result is sorted by
/// name and holds one entry per path prefix actually observed.
pub fn balances<S: AsRef<str>>(transactions: &[Transaction], filters: &[S]) -> Vec<Account> {
    accumulate(transactions.iter(), filters)
}

/// [`balances`] over any selection of transactions.
pub(crate) fn accumulate<'a, S: AsRef<str>>(
    transactions: impl Iterator<Item = &'a Transaction>,
    filters: &[S],
) -> Vec<Account> {
    let mut totals: BTreeMap<&str, FixedDecimal> = BTreeMap::new();

    let postings = transactions.flat_map(|t| t.postings());
    for posting in postings.filter(|p| matches_filters(&p.name, filters)) {
        for prefix in prefixes(&posting.name) {
            *totals.entry(prefix).or_default() += posting.balance;
        }
    }

    totals
        .into_iter()
        .map(|(name, balance)| Account::new(name, balance))
        .collect()
}

fn matches_filters<S: AsRef<str>>(name: &str, filters: &[S]) -> bool {
    filters.is_empty() || filters.iter().any(|f| name.contains(f.as_ref()))
}

/// `A:B:C` yields `A`, `A:B`, `A:B:C`.
fn prefixes(name: &str) -> impl Iterator<Item = &str> {
    name.match_indices(ACCOUNT_SEPARATOR)
        .map(|(idx, _)| &name[..idx])
        .chain(std::iter::once(name))
}
