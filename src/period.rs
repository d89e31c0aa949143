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

//! Calendar periods and reporting windows.
//!
//! Boundaries are aligned to the calendar (weeks start on Sunday, quarters
//! in January, April, July and October) and advanced by calendar steps, so
//! a month is always a month whatever its length.
//!
//! Two ways of slicing a ledger over those boundaries:
//! - [`RangeType::Partition`]: consecutive, non-overlapping windows.
//! - [`RangeType::Snapshot`]: every window starts at the first boundary, giving
//!   running totals through each boundary.
//!
//! # Example
//!
//! ```
//! use chrono::NaiveDate;
//! use ledger_rs::{date_boundaries, Period};
//!
//! let day = |m, d| NaiveDate::from_ymd_opt(2019, m, d).unwrap();
//! assert_eq!(
//!     date_boundaries(Period::Quarter, day(4, 23), day(5, 23)),
//!     [day(4, 1), day(7, 1)]
//! );
//! ```

use crate::account::{self, Account};
use crate::transaction::Transaction;
use chrono::{Datelike, Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Length of a reporting window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Period {
    Day,
    /// Seven days starting on Sunday.
    Week,
    /// Fourteen days starting on Sunday.
    BiWeek,
    Month,
    /// Two months starting in an odd month.
    BiMonth,
    Quarter,
    /// Six months starting in January or July.
    SemiYear,
    Year,
    /// One window covering the whole requested range.
    All,
}

impl Period {
    /// Looks a period up by name, case-insensitively.
    ///
    /// Accepts `daily`, `weekly`, `biweekly`, `monthly`, `bimonthly`,
    /// `quarterly`, `semiyearly`, `yearly` and their singular forms (`day`,
    /// `week`, ...). Anything else is [`Period::All`].
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "daily" | "day" => Self::Day,
            "weekly" | "week" => Self::Week,
            "biweekly" | "biweek" => Self::BiWeek,
            "monthly" | "month" => Self::Month,
            "bimonthly" | "bimonth" => Self::BiMonth,
            "quarterly" | "quarter" => Self::Quarter,
            "semiyearly" | "semiyear" => Self::SemiYear,
            "yearly" | "year" => Self::Year,
            _ => Self::All,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Day => "daily",
            Self::Week => "weekly",
            Self::BiWeek => "biweekly",
            Self::Month => "monthly",
            Self::BiMonth => "bimonthly",
            Self::Quarter => "quarterly",
            Self::SemiYear => "semiyearly",
            Self::Year => "yearly",
            Self::All => "all",
        }
    }

    /// Latest period boundary on or before `date`.
    fn align(self, date: NaiveDate) -> Option<NaiveDate> {
        let first_month_of_block = |months: u32| (date.month0() / months) * months + 1;
        match self {
            Self::Day | Self::All => Some(date),
            Self::Week | Self::BiWeek => {
                date.checked_sub_days(Days::new(u64::from(date.weekday().num_days_from_sunday())))
            }
            Self::Month => NaiveDate::from_ymd_opt(date.year(), date.month(), 1),
            Self::BiMonth => NaiveDate::from_ymd_opt(date.year(), first_month_of_block(2), 1),
            Self::Quarter => NaiveDate::from_ymd_opt(date.year(), first_month_of_block(3), 1),
            Self::SemiYear => NaiveDate::from_ymd_opt(date.year(), first_month_of_block(6), 1),
            Self::Year => NaiveDate::from_ymd_opt(date.year(), 1, 1),
        }
    }

    /// Next boundary after an aligned `date`; `None` for [`Period::All`].
    fn advance(self, date: NaiveDate) -> Option<NaiveDate> {
        match self {
            Self::Day => date.checked_add_days(Days::new(1)),
            Self::Week => date.checked_add_days(Days::new(7)),
            Self::BiWeek => date.checked_add_days(Days::new(14)),
            Self::Month => date.checked_add_months(Months::new(1)),
            Self::BiMonth => date.checked_add_months(Months::new(2)),
            Self::Quarter => date.checked_add_months(Months::new(3)),
            Self::SemiYear => date.checked_add_months(Months::new(6)),
            Self::Year => date.checked_add_months(Months::new(12)),
            Self::All => None,
        }
    }
}

impl From<&str> for Period {
    fn from(name: &str) -> Self {
        Self::from_name(name)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How windows relate to each other.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RangeType {
    /// Each window covers only its own interval.
    #[default]
    Partition,
    /// Each window runs from the first boundary to its own end.
    Snapshot,
}

impl FromStr for RangeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "partition" => Ok(Self::Partition),
            "snapshot" => Ok(Self::Snapshot),
            other => Err(format!("unknown range type {other:?}")),
        }
    }
}

/// One reporting window and what fell into it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeriodBucket<T> {
    /// First day of the window.
    pub start: NaiveDate,
    /// Last day of the window, inclusive.
    pub end: NaiveDate,
    pub items: T,
}

/// Period boundaries covering `[start, end)`.
///
/// The first boundary is `start` aligned down to the period; boundaries are
/// then added one calendar step at a time until one reaches `end`. The list
/// always holds at least two dates. [`Period::All`] yields exactly
/// `[start, end]`.
pub fn date_boundaries(period: Period, start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    let Some(mut boundary) = period.align(start).filter(|_| period != Period::All) else {
        return vec![start, end];
    };

    let mut boundaries = vec![boundary];
    while let Some(next) = period.advance(boundary) {
        boundaries.push(next);
        boundary = next;
        if boundary >= end {
            break;
        }
    }
    boundaries
}

/// Transactions dated in `[start, end)`.
pub fn transactions_in_range(
    transactions: &[Transaction],
    start: NaiveDate,
    end: NaiveDate,
) -> Vec<Transaction> {
    in_range(transactions, start, end).cloned().collect()
}

/// Groups transactions into period windows.
///
/// Windows span from the earliest to the latest transaction date; the input
/// does not need to be sorted. No transactions, no windows.
pub fn transactions_by_period(
    transactions: &[Transaction],
    period: Period,
    range: RangeType,
) -> Vec<PeriodBucket<Vec<Transaction>>> {
    windows(transactions, period, range, |start, end| {
        transactions_in_range(transactions, start, end)
    })
}

/// Hierarchical balances per period window.
///
/// With [`RangeType::Snapshot`] each window holds running totals; with
/// [`RangeType::Partition`] only the changes inside the window.
pub fn balances_by_period(
    transactions: &[Transaction],
    period: Period,
    range: RangeType,
) -> Vec<PeriodBucket<Vec<Account>>> {
    windows(transactions, period, range, |start, end| {
        account::accumulate(in_range(transactions, start, end), NO_FILTERS)
    })
}

const NO_FILTERS: &[&str] = &[];

fn in_range(
    transactions: &[Transaction],
    start: NaiveDate,
    end: NaiveDate,
) -> impl Iterator<Item = &Transaction> {
    transactions
        .iter()
        .filter(move |t| t.date() >= start && t.date() < end)
}

fn windows<T>(
    transactions: &[Transaction],
    period: Period,
    range: RangeType,
    mut collect: impl FnMut(NaiveDate, NaiveDate) -> T,
) -> Vec<PeriodBucket<T>> {
    let dates = transactions.iter().map(Transaction::date);
    let (Some(first), Some(last)) = (dates.clone().min(), dates.max()) else {
        return Vec::new();
    };
    let end = last.succ_opt().unwrap_or(last);

    let boundaries = date_boundaries(period, first, end);
    boundaries
        .windows(2)
        .map(|pair| {
            let start = match range {
                RangeType::Partition => pair[0],
                RangeType::Snapshot => boundaries[0],
            };
            PeriodBucket {
                start,
                end: pair[1].pred_opt().unwrap_or(pair[1]),
                items: collect(start, pair[1]),
            }
        })
        .collect()
}
