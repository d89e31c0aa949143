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

//! Line-by-line reading of a named ledger input.

use crate::error::{ParseError, ParseErrorKind};
use std::io::BufRead;

/// Sequential line reader that remembers where it is.
///
/// Yields `(line_number, text)` pairs with 1-based numbers and the line
/// terminator (`\n` or `\r\n`) removed.
pub struct LineSource<R> {
    name: String,
    reader: R,
    line: usize,
    buf: String,
}

impl<R: BufRead> LineSource<R> {
    pub fn new(name: impl Into<String>, reader: R) -> Self {
        Self {
            name: name.into(),
            reader,
            line: 0,
            buf: String::new(),
        }
    }

    /// Name used in error messages, usually the file path.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of the last line returned, 0 before the first read.
    pub fn line_number(&self) -> usize {
        self.line
    }

    /// Reads the next line, or `None` at end of input.
    ///
    /// # Errors
    ///
    /// Returns [`ParseErrorKind::Io`] located at the line being read when the
    /// underlying reader fails or the bytes are not UTF-8.
    pub fn next_line(&mut self) -> Result<Option<(usize, &str)>, ParseError> {
        self.buf.clear();
        let read = self
            .reader
            .read_line(&mut self.buf)
            .map_err(|e| ParseError::new(self.name.as_str(), self.line + 1, ParseErrorKind::Io(e)))?;
        if read == 0 {
            return Ok(None);
        }
        self.line += 1;

        let text = self.buf.strip_suffix('\n').unwrap_or(&self.buf);
        let text = text.strip_suffix('\r').unwrap_or(text);
        Ok(Some((self.line, text)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn numbers_lines_from_one() {
        let mut source = LineSource::new("mem", Cursor::new("a\nb\r\n\nc"));

        assert_eq!(source.next_line().unwrap(), Some((1, "a")));
        assert_eq!(source.next_line().unwrap(), Some((2, "b")));
        assert_eq!(source.next_line().unwrap(), Some((3, "")));
        assert_eq!(source.next_line().unwrap(), Some((4, "c")));
        assert_eq!(source.next_line().unwrap(), None);
        assert_eq!(source.line_number(), 4);
        assert_eq!(source.name(), "mem");
    }

    #[test]
    fn invalid_utf8_is_an_io_error() {
        let bytes: &[u8] = b"ok\n\xff\xfe\n";
        let mut source = LineSource::new("bad.ledger", Cursor::new(bytes));

        assert!(source.next_line().unwrap().is_some());
        let err = source.next_line().unwrap_err();
        assert_eq!(err.line, 2);
        assert!(matches!(err.kind, ParseErrorKind::Io(_)));
    }
}
