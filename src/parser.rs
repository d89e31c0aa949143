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

//! Ledger file parsing.
//!
//! The parser is a line state machine with three contexts:
//! - top level: blank lines, comments, `account` / `include` directives and
//!   `<date> <payee>` lines that open a transaction;
//! - posting collection: one posting per line until a blank line;
//! - account declaration: ignored until a blank line.
//!
//! ```text
//! 2024/01/05 Grocer          ; weekly shopping
//!     Expenses:Food     42.10
//!     Expenses:Drinks   (3 * 2.5)   ; three coffees
//!     Assets:Cash
//!
//! include accounts/*.ledger
//! ```
//!
//! # Includes
//!
//! `include <glob>` is resolved against the directory of the including file.
//! When several files match they are parsed on separate threads and merged
//! into the same output; the relative order of transactions coming from
//! different files is not guaranteed. Sort by date afterwards if order
//! matters.
//!
//! # Consumption modes
//!
//! - [`parse_ledger`] / [`parse_ledger_file`] collect everything and fail on
//!   the first error.
//! - [`parse_ledger_streaming`] / [`parse_ledger_file_streaming`] return a
//!   [`LedgerStream`] yielding transactions as they are completed, followed
//!   by at most one error.

use crate::balance::balance_transaction;
use crate::decimal::FixedDecimal;
use crate::error::{ExprError, ParseError, ParseErrorKind};
use crate::expr;
use crate::source::LineSource;
use crate::transaction::{DraftPosting, DraftTransaction, Transaction};
use chrono::NaiveDate;
use crossbeam::channel::{self, Receiver, Sender};
use parking_lot::Mutex;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::mem;
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};
use tracing::{debug, trace, warn};

/// Date layouts tried, in order, when the remembered one stops matching.
const DATE_LAYOUTS: &[&str] = &[
    "%Y/%m/%d", "%Y-%m-%d", "%Y.%m.%d", "%m/%d/%Y", "%d.%m.%Y", "%Y%m%d", "%m-%d-%Y",
];

/// Parser tuning knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Parse the files matched by one `include` concurrently.
    pub parallel_includes: bool,
    /// Transactions buffered between the streaming parser and its reader.
    pub channel_capacity: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            parallel_includes: true,
            channel_capacity: 64,
        }
    }
}

/// Receives transactions as the parser completes them.
///
/// Must be shareable across threads: included files may feed the same sink
/// concurrently.
pub trait TransactionSink: Sync {
    fn accept(&self, transaction: Transaction);
}

impl TransactionSink for Mutex<Vec<Transaction>> {
    fn accept(&self, transaction: Transaction) {
        self.lock().push(transaction);
    }
}

impl TransactionSink for Sender<Result<Transaction, ParseError>> {
    fn accept(&self, transaction: Transaction) {
        // The reader may have gone away; the parse still runs to the end.
        let _ = self.send(Ok(transaction));
    }
}

/// Parses ledger text from any reader.
///
/// `name` is used in error messages and relative `include` patterns are
/// resolved against its parent directory.
///
/// # Errors
///
/// Returns the first [`ParseError`] encountered; no partial result.
pub fn parse_ledger<R: Read>(name: &str, reader: R) -> Result<Vec<Transaction>, ParseError> {
    LedgerParser::new().parse(name, reader)
}

/// Parses a ledger file and everything it includes.
///
/// # Errors
///
/// Returns the first [`ParseError`] encountered; no partial result.
pub fn parse_ledger_file(path: impl AsRef<Path>) -> Result<Vec<Transaction>, ParseError> {
    LedgerParser::new().parse_file(path.as_ref())
}

/// Parses on a background thread, yielding transactions as they complete.
pub fn parse_ledger_streaming<R>(name: impl Into<String>, reader: R) -> LedgerStream
where
    R: Read + Send + 'static,
{
    let name = name.into();
    LedgerParser::new().stream(move |parser, sink| parser.parse_into(&name, reader, sink))
}

/// Streaming counterpart of [`parse_ledger_file`].
pub fn parse_ledger_file_streaming(path: impl Into<PathBuf>) -> LedgerStream {
    let path = path.into();
    LedgerParser::new().stream(move |parser, sink| parser.parse_file_into(&path, sink))
}

/// Stateful ledger parser.
///
/// Holds the per-parse state: the last date layout that matched and the
/// chain of files currently being included. Both are reset by every
/// top-level `parse*` call, so a parser can be reused.
#[derive(Debug, Clone, Default)]
pub struct LedgerParser {
    options: ParseOptions,
    date_layout: Option<&'static str>,
    include_chain: Vec<PathBuf>,
}

impl LedgerParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ParseOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    /// Buffered parse of any reader.
    ///
    /// # Errors
    ///
    /// Returns the first [`ParseError`] encountered.
    pub fn parse<R: Read>(&mut self, name: &str, reader: R) -> Result<Vec<Transaction>, ParseError> {
        let collected = Mutex::new(Vec::new());
        self.parse_into(name, reader, &collected)?;
        Ok(collected.into_inner())
    }

    /// Buffered parse of a file.
    ///
    /// # Errors
    ///
    /// Returns the first [`ParseError`] encountered.
    pub fn parse_file(&mut self, path: &Path) -> Result<Vec<Transaction>, ParseError> {
        let collected = Mutex::new(Vec::new());
        self.parse_file_into(path, &collected)?;
        Ok(collected.into_inner())
    }

    /// Parses a reader, handing each transaction to `sink`.
    ///
    /// # Errors
    ///
    /// Returns the first [`ParseError`] encountered. Transactions completed
    /// before the error have already reached the sink.
    pub fn parse_into<R: Read>(
        &mut self,
        name: &str,
        reader: R,
        sink: &dyn TransactionSink,
    ) -> Result<(), ParseError> {
        self.reset();
        let base_dir = Path::new(name).parent().unwrap_or(Path::new("")).to_path_buf();
        self.parse_source(LineSource::new(name, BufReader::new(reader)), &base_dir, sink)
    }

    /// Parses a file, handing each transaction to `sink`.
    ///
    /// # Errors
    ///
    /// Same as [`parse_into`](Self::parse_into).
    pub fn parse_file_into(&mut self, path: &Path, sink: &dyn TransactionSink) -> Result<(), ParseError> {
        self.reset();
        self.parse_path(path, sink)
    }

    fn reset(&mut self) {
        self.date_layout = None;
        self.include_chain.clear();
    }

    fn stream<F>(mut self, run: F) -> LedgerStream
    where
        F: FnOnce(&mut Self, &dyn TransactionSink) -> Result<(), ParseError> + Send + 'static,
    {
        let (sender, receiver) = channel::bounded(self.options.channel_capacity);
        let handle = thread::spawn(move || {
            if let Err(e) = run(&mut self, &sender) {
                let _ = sender.send(Err(e));
            }
        });
        LedgerStream {
            receiver,
            producer: Some(handle),
        }
    }

    fn parse_path(&mut self, path: &Path, sink: &dyn TransactionSink) -> Result<(), ParseError> {
        let name = path.display().to_string();
        let file = File::open(path).map_err(|e| ParseError::new(name.as_str(), 0, e))?;
        if let Ok(canonical) = path.canonicalize() {
            self.include_chain.push(canonical);
        }
        let base_dir = path.parent().unwrap_or(Path::new("")).to_path_buf();
        self.parse_source(LineSource::new(name, BufReader::new(file)), &base_dir, sink)
    }

    fn parse_source<R: BufRead>(
        &mut self,
        mut source: LineSource<R>,
        base_dir: &Path,
        sink: &dyn TransactionSink,
    ) -> Result<(), ParseError> {
        let name = source.name().to_string();
        let mut state = FileState::new(&name, sink);

        while let Some((line_no, line)) = source.next_line()? {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                state.close_block()?;
                continue;
            }

            if matches!(state.context, Context::TopLevel) {
                state.context = self.top_level(trimmed, line_no, base_dir, &mut state)?;
                continue;
            }
            if let Context::Postings(pending) = &mut state.context {
                if let Some(comment) = trimmed.strip_prefix(';') {
                    pending.draft.comments.push(comment.trim().to_string());
                } else {
                    let posting = parse_posting(trimmed)
                        .map_err(|kind| ParseError::new(name.as_str(), line_no, kind))?;
                    pending.draft.postings.push(posting);
                }
            }
        }
        state.close_block()?;

        debug!(file = %name, transactions = state.emitted, "parsed ledger source");
        Ok(())
    }

    fn top_level(
        &mut self,
        line: &str,
        line_no: usize,
        base_dir: &Path,
        state: &mut FileState<'_>,
    ) -> Result<Context, ParseError> {
        if let Some(comment) = line.strip_prefix(';') {
            state.comments.push(comment.trim().to_string());
            return Ok(Context::TopLevel);
        }
        if line.starts_with(['#', '%', '|', '*']) {
            return Ok(Context::TopLevel);
        }

        let (token, rest) = line
            .split_once(char::is_whitespace)
            .map_or((line, ""), |(token, rest)| (token, rest.trim()));

        match token {
            "account" => Ok(Context::AccountDeclaration),
            "include" => {
                self.include(rest, line_no, base_dir, state)?;
                Ok(Context::TopLevel)
            }
            _ => {
                let date = self.parse_date(token).ok_or_else(|| {
                    state.error(line_no, ParseErrorKind::Syntax(format!("unable to parse date {token:?}")))
                })?;
                let (payee, payee_comment) = split_comment(rest);
                if payee.is_empty() {
                    return Err(state.error(line_no, ParseErrorKind::Syntax("missing payee".to_string())));
                }
                let mut draft = DraftTransaction::new(date, payee);
                draft.payee_comment = payee_comment;
                draft.comments = mem::take(&mut state.comments);
                Ok(Context::Postings(PendingTransaction { line: line_no, draft }))
            }
        }
    }

    /// Tries the remembered layout, then detects a new one.
    fn parse_date(&mut self, token: &str) -> Option<NaiveDate> {
        if let Some(layout) = self.date_layout {
            if let Ok(date) = NaiveDate::parse_from_str(token, layout) {
                return Some(date);
            }
        }
        for &layout in DATE_LAYOUTS {
            if Some(layout) == self.date_layout {
                continue;
            }
            if let Ok(date) = NaiveDate::parse_from_str(token, layout) {
                debug!(layout, "switching date layout");
                self.date_layout = Some(layout);
                return Some(date);
            }
        }
        None
    }

    /// Parses every file matched by an `include` pattern.
    ///
    /// Failures of the directive itself are located at the `include` line;
    /// failures inside an included file keep that file's own location.
    fn include(
        &self,
        pattern: &str,
        line_no: usize,
        base_dir: &Path,
        state: &FileState<'_>,
    ) -> Result<(), ParseError> {
        let pattern = pattern.trim().trim_matches('"');
        let files = resolve_include(pattern, base_dir).map_err(|kind| state.error(line_no, kind))?;

        for file in &files {
            let canonical = file.canonicalize().map_err(|e| state.error(line_no, e))?;
            if self.include_chain.contains(&canonical) {
                return Err(state.error(line_no, ParseErrorKind::IncludeCycle { path: file.clone() }));
            }
        }
        debug!(pattern, matches = files.len(), "resolved include");

        let sink = state.sink;
        if files.len() == 1 || !self.options.parallel_includes {
            for file in &files {
                self.child().parse_path(file, sink)?;
            }
            return Ok(());
        }

        let outcomes = crossbeam::thread::scope(|scope| {
            let handles: Vec<_> = files
                .iter()
                .map(|file| {
                    let mut child = self.child();
                    scope.spawn(move |_| child.parse_path(file, sink))
                })
                .collect();
            handles.into_iter().map(|h| h.join()).collect::<Vec<_>>()
        })
        .unwrap_or_else(|payload| std::panic::resume_unwind(payload));

        // Every worker has finished; report the first failure in match order.
        let mut first_error = None;
        for outcome in outcomes {
            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    warn!(error = %e, "included file failed");
                    first_error.get_or_insert(e);
                }
                Err(payload) => std::panic::resume_unwind(payload),
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Parser for an included file: same options, inherited date layout and
    /// include chain.
    fn child(&self) -> Self {
        self.clone()
    }
}

fn resolve_include(pattern: &str, base_dir: &Path) -> Result<Vec<PathBuf>, ParseErrorKind> {
    let full = if Path::new(pattern).is_absolute() {
        PathBuf::from(pattern)
    } else {
        base_dir.join(pattern)
    };

    let entries = glob::glob(&full.to_string_lossy()).map_err(|e| ParseErrorKind::InvalidPattern {
        pattern: pattern.to_string(),
        message: e.to_string(),
    })?;
    let mut files = entries
        .map(|entry| entry.map_err(|e| ParseErrorKind::Io(e.into_error())))
        .collect::<Result<Vec<_>, _>>()?;
    files.retain(|path| path.is_file());
    files.sort();

    if files.is_empty() {
        return Err(ParseErrorKind::IncludeNotFound {
            pattern: pattern.to_string(),
        });
    }
    Ok(files)
}

/// Parses one posting line (already trimmed, not a comment).
fn parse_posting(line: &str) -> Result<DraftPosting, ParseErrorKind> {
    let (body, comment) = split_comment(line);
    if body.is_empty() {
        return Err(ParseErrorKind::Syntax("missing account name".to_string()));
    }

    let explicit = body.rsplit_once(char::is_whitespace).and_then(|(name, token)| {
        let name = name.trim();
        let amount = FixedDecimal::from_string(token).ok()?;
        (!name.is_empty()).then_some((name, amount))
    });

    let (name, amount) = match explicit {
        Some((name, amount)) => (name, Some(amount)),
        None => match body.find('(') {
            Some(open) => {
                let close = body
                    .rfind(')')
                    .filter(|&close| close > open)
                    .ok_or(ExprError::UnbalancedParen)?;
                if !body[close + 1..].trim().is_empty() {
                    return Err(ParseErrorKind::Syntax(
                        "unexpected text after amount expression".to_string(),
                    ));
                }
                let name = body[..open].trim();
                if name.is_empty() {
                    return Err(ParseErrorKind::Syntax("missing account name".to_string()));
                }
                (name, Some(expr::evaluate(&body[open + 1..close])?))
            }
            None => (body, None),
        },
    };

    Ok(DraftPosting {
        name: name.to_string(),
        amount,
        comment,
    })
}

/// Splits `text ; comment` into trimmed parts.
fn split_comment(line: &str) -> (&str, Option<String>) {
    match line.split_once(';') {
        Some((body, comment)) => (body.trim(), Some(comment.trim().to_string())),
        None => (line.trim(), None),
    }
}

enum Context {
    TopLevel,
    Postings(PendingTransaction),
    AccountDeclaration,
}

struct PendingTransaction {
    /// Line of the `<date> <payee>` header.
    line: usize,
    draft: DraftTransaction,
}

/// State scoped to one input file.
struct FileState<'a> {
    name: &'a str,
    sink: &'a dyn TransactionSink,
    context: Context,
    /// Free-standing comments waiting for the next transaction.
    comments: Vec<String>,
    emitted: usize,
}

impl<'a> FileState<'a> {
    fn new(name: &'a str, sink: &'a dyn TransactionSink) -> Self {
        Self {
            name,
            sink,
            context: Context::TopLevel,
            comments: Vec::new(),
            emitted: 0,
        }
    }

    fn error(&self, line: usize, kind: impl Into<ParseErrorKind>) -> ParseError {
        ParseError::new(self.name, line, kind)
    }

    /// Ends the current block; an open transaction is balanced and emitted.
    fn close_block(&mut self) -> Result<(), ParseError> {
        if let Context::Postings(pending) = mem::replace(&mut self.context, Context::TopLevel) {
            let transaction =
                balance_transaction(pending.draft).map_err(|e| self.error(pending.line, e))?;
            trace!(file = self.name, line = pending.line, payee = transaction.payee(), "transaction");
            self.sink.accept(transaction);
            self.emitted += 1;
        }
        Ok(())
    }
}

/// Transactions produced by a background parse.
///
/// Iteration yields `Ok` for each completed transaction and ends after the
/// input is exhausted or right after the first `Err`. Dropping the stream
/// early leaves the producer to finish on its own.
pub struct LedgerStream {
    receiver: Receiver<Result<Transaction, ParseError>>,
    producer: Option<JoinHandle<()>>,
}

impl Iterator for LedgerStream {
    type Item = Result<Transaction, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.receiver.recv() {
            Ok(item) => Some(item),
            Err(_) => {
                // Sender gone: the producer is done. Surface a panic if it had one.
                if let Some(Err(payload)) = self.producer.take().map(JoinHandle::join) {
                    std::panic::resume_unwind(payload);
                }
                None
            }
        }
    }
}
