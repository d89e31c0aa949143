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

//! Fixed-point decimal arithmetic.
//!
//! Every monetary value in a ledger is a [`FixedDecimal`]: a signed integer
//! counting thousandths. Precision never changes, so addition and subtraction
//! are exact, multiplication truncates back to three digits and division
//! scales the dividend before dividing.
//!
//! Values close to ±9×10^15 units overflow the underlying `i64`; they are
//! outside the supported range.
//!
//! # Example
//!
//! ```
//! use ledger_rs::FixedDecimal;
//!
//! let price: FixedDecimal = "12.345".parse().unwrap();
//! let qty = FixedDecimal::from_int(3);
//! assert_eq!((price * qty).to_string(), "37.035");
//! assert_eq!((price * qty).fixed_bank_string(), "37.04");
//! ```

use crate::error::DecimalError;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};
use std::str::FromStr;

/// Number of fractional digits carried by every value.
pub const SCALE_DIGITS: u32 = 3;

/// Multiplier between whole units and the raw representation.
pub const SCALE: i64 = 1000;

/// A signed decimal with exactly three fractional digits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FixedDecimal(i64);

impl FixedDecimal {
    pub const ZERO: Self = Self(0);

    /// Builds a value from its raw count of thousandths.
    pub const fn from_raw(raw: i64) -> Self {
        Self(raw)
    }

    /// Raw count of thousandths.
    pub const fn raw(self) -> i64 {
        self.0
    }

    pub const fn from_int(value: i64) -> Self {
        Self(value * SCALE)
    }

    /// Converts a float, rounding to the nearest thousandth.
    pub fn from_float(value: f64) -> Self {
        Self((value * SCALE as f64).round() as i64)
    }

    /// Parses `[+-]digits[.digits]`.
    ///
    /// Fractional digits past the third are truncated, shorter fractions are
    /// zero-padded. Either side of the point may be empty (`".50"`, `"3."`)
    /// but not both.
    ///
    /// # Errors
    ///
    /// - [`DecimalError::Syntax`] for empty input or any non-digit character.
    /// - [`DecimalError::Overflow`] when the scaled integer part exceeds `i64`.
    pub fn from_string(input: &str) -> Result<Self, DecimalError> {
        let syntax = || DecimalError::Syntax(input.to_string());
        let overflow = || DecimalError::Overflow(input.to_string());

        let (negative, body) = match input.as_bytes().first() {
            None => return Err(syntax()),
            Some(b'-') => (true, &input[1..]),
            Some(b'+') => (false, &input[1..]),
            Some(_) => (false, input),
        };
        let (int_part, frac_part) = body.split_once('.').unwrap_or((body, ""));

        if int_part.is_empty() && frac_part.is_empty() {
            return Err(syntax());
        }
        let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
        if !all_digits(int_part) || !all_digits(frac_part) {
            return Err(syntax());
        }

        let whole: i64 = if int_part.is_empty() {
            0
        } else {
            int_part.parse().map_err(|_| overflow())?
        };

        let mut frac = 0i64;
        let mut digits = frac_part.bytes();
        for _ in 0..SCALE_DIGITS {
            let digit = digits.next().map_or(0, |b| i64::from(b - b'0'));
            frac = frac * 10 + digit;
        }

        let raw = whole
            .checked_mul(SCALE)
            .and_then(|scaled| scaled.checked_add(frac))
            .ok_or_else(overflow)?;

        Ok(Self(if negative { -raw } else { raw }))
    }

    pub fn to_f64(self) -> f64 {
        self.0 as f64 / SCALE as f64
    }

    pub const fn abs(self) -> Self {
        Self(self.0.abs())
    }

    /// `-1`, `0` or `1`.
    pub const fn sign(self) -> i64 {
        self.0.signum()
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Multiplication that returns `None` when the product leaves the `i64` range.
    pub fn checked_mul(self, rhs: Self) -> Option<Self> {
        let product = i128::from(self.0) * i128::from(rhs.0) / i128::from(SCALE);
        i64::try_from(product).ok().map(Self)
    }

    /// Division that returns `None` instead of panicking on a zero divisor.
    pub fn checked_div(self, rhs: Self) -> Option<Self> {
        if rhs.is_zero() {
            return None;
        }
        let quotient = i128::from(self.0) * i128::from(SCALE) / i128::from(rhs.0);
        i64::try_from(quotient).ok().map(Self)
    }

    /// Whole units with the fraction dropped: `-1.999` becomes `"-1"`.
    pub fn truncate_string(self) -> String {
        (self.0 / SCALE).to_string()
    }

    /// Whole units, rounding half away from zero: `2.5` becomes `"3"`.
    pub fn round_string(self) -> String {
        let magnitude = self.0.unsigned_abs();
        let whole = (magnitude + SCALE.unsigned_abs() / 2) / SCALE.unsigned_abs();
        if whole == 0 {
            return "0".to_string();
        }
        format!("{}{}", self.sign_prefix(), whole)
    }

    /// Two decimal places using banker's rounding.
    ///
    /// A dropped digit of exactly 5 rounds to the even cent; anything else
    /// rounds half away from zero. `0.125` gives `"0.12"`, `0.135` gives
    /// `"0.14"`.
    pub fn fixed_bank_string(self) -> String {
        let magnitude = self.0.unsigned_abs();
        let mut cents = magnitude / 10;
        let dropped = magnitude % 10;
        if dropped > 5 || (dropped == 5 && cents % 2 == 1) {
            cents += 1;
        }
        let sign = if cents == 0 { "" } else { self.sign_prefix() };
        format!("{sign}{}.{:02}", cents / 100, cents % 100)
    }

    fn sign_prefix(self) -> &'static str {
        if self.0 < 0 { "-" } else { "" }
    }
}

impl fmt::Display for FixedDecimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let magnitude = self.0.unsigned_abs();
        let scale = SCALE.unsigned_abs();
        write!(
            f,
            "{}{}.{:03}",
            self.sign_prefix(),
            magnitude / scale,
            magnitude % scale
        )
    }
}

impl FromStr for FixedDecimal {
    type Err = DecimalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_string(s)
    }
}

impl From<i64> for FixedDecimal {
    fn from(value: i64) -> Self {
        Self::from_int(value)
    }
}

impl Add for FixedDecimal {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for FixedDecimal {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for FixedDecimal {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl SubAssign for FixedDecimal {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl Mul for FixedDecimal {
    type Output = Self;

    /// Raw product divided by the scale, truncating toward zero.
    fn mul(self, rhs: Self) -> Self {
        let product = i128::from(self.0) * i128::from(rhs.0) / i128::from(SCALE);
        Self(product as i64)
    }
}

impl Div for FixedDecimal {
    type Output = Self;

    /// Scales the dividend before dividing.
    ///
    /// # Panics
    ///
    /// Panics if `rhs` is zero, like integer division.
    fn div(self, rhs: Self) -> Self {
        let quotient = i128::from(self.0) * i128::from(SCALE) / i128::from(rhs.0);
        Self(quotient as i64)
    }
}

impl Neg for FixedDecimal {
    type Output = Self;

    fn neg(self) -> Self {
        Self(-self.0)
    }
}

impl Sum for FixedDecimal {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a FixedDecimal> for FixedDecimal {
    fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

impl From<FixedDecimal> for Decimal {
    fn from(value: FixedDecimal) -> Self {
        Decimal::new(value.0, SCALE_DIGITS)
    }
}

impl TryFrom<Decimal> for FixedDecimal {
    type Error = DecimalError;

    /// Truncates anything past the third fractional digit.
    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        let truncated = value.round_dp_with_strategy(SCALE_DIGITS, RoundingStrategy::ToZero);
        let factor = 10i128.pow(SCALE_DIGITS - truncated.scale());
        truncated
            .mantissa()
            .checked_mul(factor)
            .and_then(|raw| i64::try_from(raw).ok())
            .map(Self)
            .ok_or_else(|| DecimalError::Overflow(value.to_string()))
    }
}

impl Serialize for FixedDecimal {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FixedDecimal {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct FixedDecimalVisitor;

        impl Visitor<'_> for FixedDecimalVisitor {
            type Value = FixedDecimal;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a decimal string with at most three fractional digits")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<FixedDecimal, E> {
                FixedDecimal::from_string(v).map_err(E::custom)
            }
        }

        deserializer.deserialize_str(FixedDecimalVisitor)
    }
}
