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

//! Inline arithmetic in posting amounts.
//!
//! A posting may carry `(expression)` instead of a literal amount. The
//! grammar, loosest binding first:
//!
//! ```text
//! expr   := term (('+' | '-') term)*
//! term   := unary (('*' | '/') unary)*
//! unary  := ('-' | '+') unary | power
//! power  := atom ('^' unary)?
//! atom   := number | '(' expr ')'
//! ```
//!
//! All arithmetic happens in [`FixedDecimal`].

use crate::decimal::{FixedDecimal, SCALE};
use crate::error::ExprError;

/// Evaluates an arithmetic expression.
///
/// # Example
///
/// ```
/// use ledger_rs::expr::evaluate;
///
/// assert_eq!(evaluate("123 * 3").unwrap().to_string(), "369.000");
/// assert_eq!(evaluate("2 ^ 3 ^ 2").unwrap().to_string(), "512.000");
/// ```
///
/// # Errors
///
/// Returns an [`ExprError`] for malformed input, division by zero, a power
/// with no real result or a value out of range.
pub fn evaluate(input: &str) -> Result<FixedDecimal, ExprError> {
    let mut parser = ExprParser { input, pos: 0 };
    let value = parser.expr()?;
    parser.skip_whitespace();
    match parser.peek() {
        None => Ok(value),
        Some(')') => Err(ExprError::UnbalancedParen),
        Some(_) => Err(ExprError::TrailingInput(parser.pos)),
    }
}

struct ExprParser<'a> {
    input: &'a str,
    pos: usize,
}

impl ExprParser<'_> {
    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek().filter(|c| c.is_whitespace()) {
            self.pos += c.len_utf8();
        }
    }

    /// Consumes `op` if it is the next non-blank character.
    fn eat(&mut self, op: char) -> bool {
        self.skip_whitespace();
        if self.peek() == Some(op) {
            self.pos += op.len_utf8();
            true
        } else {
            false
        }
    }

    fn expr(&mut self) -> Result<FixedDecimal, ExprError> {
        let mut value = self.term()?;
        loop {
            if self.eat('+') {
                value += self.term()?;
            } else if self.eat('-') {
                value -= self.term()?;
            } else {
                return Ok(value);
            }
        }
    }

    fn term(&mut self) -> Result<FixedDecimal, ExprError> {
        let mut value = self.unary()?;
        loop {
            if self.eat('*') {
                value = value * self.unary()?;
            } else if self.eat('/') {
                let divisor = self.unary()?;
                value = value.checked_div(divisor).ok_or(ExprError::DivisionByZero)?;
            } else {
                return Ok(value);
            }
        }
    }

    fn unary(&mut self) -> Result<FixedDecimal, ExprError> {
        if self.eat('-') {
            return Ok(-self.unary()?);
        }
        if self.eat('+') {
            return self.unary();
        }
        self.power()
    }

    fn power(&mut self) -> Result<FixedDecimal, ExprError> {
        let base = self.atom()?;
        if self.eat('^') {
            // Right associative: 2 ^ 3 ^ 2 == 2 ^ 9.
            let exponent = self.unary()?;
            return pow(base, exponent);
        }
        Ok(base)
    }

    fn atom(&mut self) -> Result<FixedDecimal, ExprError> {
        self.skip_whitespace();
        match self.peek() {
            None => Err(ExprError::UnexpectedEnd),
            Some('(') => {
                self.pos += 1;
                let value = self.expr()?;
                if self.eat(')') {
                    Ok(value)
                } else {
                    Err(ExprError::UnbalancedParen)
                }
            }
            Some(c) if c.is_ascii_digit() || c == '.' => {
                let start = self.pos;
                while let Some(c) = self.peek().filter(|c| c.is_ascii_digit() || *c == '.') {
                    self.pos += c.len_utf8();
                }
                Ok(FixedDecimal::from_string(&self.input[start..self.pos])?)
            }
            Some(c) => Err(ExprError::UnexpectedChar {
                found: c,
                offset: self.pos,
            }),
        }
    }
}

fn pow(base: FixedDecimal, exponent: FixedDecimal) -> Result<FixedDecimal, ExprError> {
    if exponent.raw() % SCALE != 0 {
        let value = base.to_f64().powf(exponent.to_f64());
        if !value.is_finite() {
            return Err(ExprError::InvalidPower);
        }
        if (value * SCALE as f64).abs() >= i64::MAX as f64 {
            return Err(ExprError::Overflow);
        }
        return Ok(FixedDecimal::from_float(value));
    }

    let whole = exponent.raw() / SCALE;
    let magnitude = whole.unsigned_abs();
    let one = FixedDecimal::from_int(1);
    let result = match base.raw() {
        _ if magnitude == 0 => one,
        // 0, 1 and -1 stay put under multiplication.
        0 => FixedDecimal::ZERO,
        SCALE => one,
        raw if raw == -SCALE && magnitude % 2 == 1 => -one,
        raw if raw == -SCALE => one,
        _ => powi(base, magnitude)?,
    };

    if whole >= 0 {
        return Ok(result);
    }
    if result.is_zero() {
        return Err(ExprError::DivisionByZero);
    }
    one.checked_div(result).ok_or(ExprError::Overflow)
}

/// Exponentiation by squaring; at most one step per bit of `exponent`.
fn powi(base: FixedDecimal, mut exponent: u64) -> Result<FixedDecimal, ExprError> {
    let mut result = FixedDecimal::from_int(1);
    let mut factor = base;
    loop {
        if exponent & 1 == 1 {
            result = result.checked_mul(factor).ok_or(ExprError::Overflow)?;
        }
        exponent >>= 1;
        if exponent == 0 || result.is_zero() {
            return Ok(result);
        }
        factor = factor.checked_mul(factor).ok_or(ExprError::Overflow)?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(s: &str) -> String {
        evaluate(s).unwrap().to_string()
    }

    #[test]
    fn honours_precedence() {
        assert_eq!(eval("1 + 2 * 3"), "7.000");
        assert_eq!(eval("(1 + 2) * 3"), "9.000");
        assert_eq!(eval("10 - 4 - 3"), "3.000");
        assert_eq!(eval("-2 ^ 2"), "-4.000");
        assert_eq!(eval("2 * -3"), "-6.000");
    }

    #[test]
    fn power_is_right_associative() {
        assert_eq!(eval("2^3^2"), "512.000");
        assert_eq!(eval("2 ^ -1"), "0.500");
        assert_eq!(eval("5 ^ 0"), "1.000");
    }

    #[test]
    fn fractional_exponent() {
        assert_eq!(eval("9 ^ 0.5"), "3.000");
    }

    #[test]
    fn huge_exponents_finish() {
        assert_eq!(eval("1 ^ 100000000000"), "1.000");
        assert_eq!(eval("(0 - 1) ^ 100000000001"), "-1.000");
        assert_eq!(eval("(0 - 1) ^ 100000000000"), "1.000");
        assert_eq!(eval("0 ^ 100000000000"), "0.000");
        assert_eq!(eval("0.5 ^ 100000000000"), "0.000");
        assert_eq!(eval("0 ^ 0"), "1.000");
        assert_eq!(evaluate("2 ^ 100000000000"), Err(ExprError::Overflow));
        assert_eq!(evaluate("0 ^ -3"), Err(ExprError::DivisionByZero));
    }

    #[test]
    fn squaring_matches_repeated_multiplication() {
        assert_eq!(eval("2 ^ 10"), "1024.000");
        assert_eq!(eval("3 ^ 5"), "243.000");
        assert_eq!(eval("10 ^ 15"), "1000000000000000.000");
        assert_eq!(eval("(0 - 2) ^ 3"), "-8.000");
        assert_eq!(eval("2 ^ -2"), "0.250");
        assert_eq!(evaluate("10 ^ 16"), Err(ExprError::Overflow));
    }

    #[test]
    fn powers_without_real_result_fail() {
        assert_eq!(evaluate("(0 - 4) ^ 0.5"), Err(ExprError::InvalidPower));
        assert_eq!(evaluate("(0 - 8) ^ 1.5"), Err(ExprError::InvalidPower));
        assert_eq!(evaluate("0 ^ -0.5"), Err(ExprError::InvalidPower));
        assert_eq!(evaluate("1000000 ^ 3.5"), Err(ExprError::Overflow));
    }

    #[test]
    fn decimal_operands() {
        assert_eq!(eval("12.50 / 4"), "3.125");
        assert_eq!(eval(".5 + .25"), "0.750");
    }

    #[test]
    fn reports_errors() {
        assert_eq!(evaluate("1 / 0"), Err(ExprError::DivisionByZero));
        assert_eq!(evaluate("(1 + 2"), Err(ExprError::UnbalancedParen));
        assert_eq!(evaluate("1 + 2)"), Err(ExprError::UnbalancedParen));
        assert_eq!(evaluate("1 +"), Err(ExprError::UnexpectedEnd));
        assert_eq!(evaluate(""), Err(ExprError::UnexpectedEnd));
        assert_eq!(evaluate("1 2"), Err(ExprError::TrailingInput(2)));
        assert_eq!(
            evaluate("1 + x"),
            Err(ExprError::UnexpectedChar { found: 'x', offset: 4 })
        );
        assert!(matches!(evaluate("1.2.3"), Err(ExprError::Number(_))));
    }
}
