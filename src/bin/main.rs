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

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use csv::Writer;
use ledger_rs::{
    Account, LedgerParser, ParseOptions, Period, RangeType, Transaction, balances,
    parse_ledger_file_streaming, transactions_by_period,
};
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

/// Ledger - Plain-text double-entry accounting
///
/// Reads a ledger file (and everything it includes) and writes CSV to stdout.
/// Diagnostics go to stderr; set RUST_LOG to see more of them.
#[derive(Parser, Debug)]
#[command(name = "ledger-rs")]
#[command(about = "Balances and reports for plain-text ledgers", long_about = None)]
struct Args {
    /// Ledger file to read
    #[arg(short, long, value_name = "FILE", env = "LEDGER_FILE")]
    file: PathBuf,

    /// Parse the files matched by one include one after another
    #[arg(long)]
    sequential: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Hierarchical account balances: account,balance
    Balance {
        /// daily, weekly, biweekly, monthly, bimonthly, quarterly, semiyearly
        /// or yearly; anything else is one window over the whole ledger
        #[arg(short, long)]
        period: Option<String>,

        /// How period windows relate to each other
        #[arg(short, long, value_enum, default_value_t = RangeArg::Partition)]
        range: RangeArg,

        /// Only count accounts whose name contains one of these
        filters: Vec<String>,
    },
    /// Every posting: date,payee,account,amount
    Print,
    /// Reports parse errors and exits with their count
    Lint,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum RangeArg {
    Partition,
    Snapshot,
}

impl From<RangeArg> for RangeType {
    fn from(arg: RangeArg) -> Self {
        match arg {
            RangeArg::Partition => RangeType::Partition,
            RangeArg::Snapshot => RangeType::Snapshot,
        }
    }
}

fn main() {
    let args = Args::parse();
    init_tracing();

    if let Command::Lint = args.command {
        process::exit(lint(args.file));
    }

    let options = ParseOptions {
        parallel_includes: !args.sequential,
        ..ParseOptions::default()
    };
    let mut transactions = match LedgerParser::with_options(options).parse_file(&args.file) {
        Ok(transactions) => transactions,
        Err(e) => {
            eprintln!("Error reading ledger: {}", e);
            process::exit(1);
        }
    };
    // Included files may arrive in any order.
    transactions.sort_by_key(Transaction::date);

    let stdout = std::io::stdout().lock();
    let written = match args.command {
        Command::Balance {
            period: None,
            filters,
            ..
        } => write_balances(&balances(&transactions, &filters), stdout),
        Command::Balance {
            period: Some(period),
            range,
            filters,
        } => write_period_balances(
            &transactions,
            Period::from_name(&period),
            range.into(),
            &filters,
            stdout,
        ),
        Command::Print => write_postings(&transactions, stdout),
        Command::Lint => Ok(()),
    };

    if let Err(e) = written {
        eprintln!("Error writing output: {}", e);
        process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ledger_rs=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Streams the ledger, printing the error if any. Returns the error count.
fn lint(file: PathBuf) -> i32 {
    let mut read = 0usize;
    let mut errors = 0;
    for item in parse_ledger_file_streaming(file) {
        match item {
            Ok(_) => read += 1,
            Err(e) => {
                eprintln!("{}", e);
                errors += 1;
            }
        }
    }
    eprintln!("{} transactions read", read);
    errors
}

#[derive(Debug, Serialize)]
struct BalanceRow<'a> {
    account: &'a str,
    balance: String,
}

#[derive(Debug, Serialize)]
struct PeriodBalanceRow<'a> {
    start: NaiveDate,
    end: NaiveDate,
    account: &'a str,
    balance: String,
}

#[derive(Debug, Serialize)]
struct PostingRow<'a> {
    date: NaiveDate,
    payee: &'a str,
    account: &'a str,
    amount: String,
}

/// Writes `account,balance` rows, balances rounded to two decimals.
///
/// # Errors
///
/// Returns a CSV error if writing fails.
pub fn write_balances<W: Write>(accounts: &[Account], writer: W) -> Result<(), csv::Error> {
    let mut wtr = Writer::from_writer(writer);
    for account in accounts {
        wtr.serialize(BalanceRow {
            account: &account.name,
            balance: account.balance.fixed_bank_string(),
        })?;
    }
    wtr.flush()?;
    Ok(())
}

/// Writes `start,end,account,balance` rows, one block per period window.
///
/// # Errors
///
/// Returns a CSV error if writing fails.
pub fn write_period_balances<W: Write>(
    transactions: &[Transaction],
    period: Period,
    range: RangeType,
    filters: &[String],
    writer: W,
) -> Result<(), csv::Error> {
    let mut wtr = Writer::from_writer(writer);
    for bucket in transactions_by_period(transactions, period, range) {
        for account in balances(&bucket.items, filters) {
            wtr.serialize(PeriodBalanceRow {
                start: bucket.start,
                end: bucket.end,
                account: &account.name,
                balance: account.balance.fixed_bank_string(),
            })?;
        }
    }
    wtr.flush()?;
    Ok(())
}

/// Writes one `date,payee,account,amount` row per posting.
///
/// # Errors
///
/// Returns a CSV error if writing fails.
pub fn write_postings<W: Write>(transactions: &[Transaction], writer: W) -> Result<(), csv::Error> {
    let mut wtr = Writer::from_writer(writer);
    for transaction in transactions {
        for posting in transaction.postings() {
            wtr.serialize(PostingRow {
                date: transaction.date(),
                payee: transaction.payee(),
                account: &posting.name,
                amount: posting.balance.fixed_bank_string(),
            })?;
        }
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_rs::parse_ledger;

    const LEDGER: &str = "\
2024/01/05 Grocer
    Expenses:Food   42.10
    Assets:Cash

2024/02/01 Salary
    Assets:Bank   1000
    Income:Job
";

    fn output(write: impl FnOnce(&mut Vec<u8>) -> Result<(), csv::Error>) -> String {
        let mut out = Vec::new();
        write(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn balance_rows() {
        let transactions = parse_ledger("inline", LEDGER.as_bytes()).unwrap();
        let accounts = balances(&transactions, &["Assets"]);

        let csv = output(|w| write_balances(&accounts, w));
        assert_eq!(
            csv,
            "account,balance\nAssets,957.90\nAssets:Bank,1000.00\nAssets:Cash,-42.10\n"
        );
    }

    #[test]
    fn period_balance_rows() {
        let transactions = parse_ledger("inline", LEDGER.as_bytes()).unwrap();
        let filters = vec!["Income".to_string()];

        let csv = output(|w| {
            write_period_balances(&transactions, Period::Month, RangeType::Snapshot, &filters, w)
        });
        assert_eq!(
            csv,
            "start,end,account,balance\n\
             2024-01-01,2024-02-29,Income,-1000.00\n\
             2024-01-01,2024-02-29,Income:Job,-1000.00\n"
        );
    }

    #[test]
    fn posting_rows() {
        let transactions = parse_ledger("inline", LEDGER.as_bytes()).unwrap();

        let csv = output(|w| write_postings(&transactions, w));
        let lines: Vec<_> = csv.lines().collect();
        assert_eq!(lines[0], "date,payee,account,amount");
        assert_eq!(lines[1], "2024-01-05,Grocer,Expenses:Food,42.10");
        assert_eq!(lines[2], "2024-01-05,Grocer,Assets:Cash,-42.10");
        assert_eq!(lines.len(), 5);
    }

    #[test]
    fn range_argument_maps_to_library_type() {
        assert_eq!(RangeType::from(RangeArg::Snapshot), RangeType::Snapshot);
        assert_eq!(RangeType::from(RangeArg::Partition), RangeType::Partition);
    }
}
