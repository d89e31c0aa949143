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

//! FixedDecimal public API integration tests.

use ledger_rs::{DecimalError, FixedDecimal};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// === Helper Functions ===

fn d(s: &str) -> FixedDecimal {
    s.parse().unwrap()
}

// === Parsing ===

#[test]
fn parses_signed_values() {
    assert_eq!(d("12.5").raw(), 12_500);
    assert_eq!(d("-12.5").raw(), -12_500);
    assert_eq!(d("+7").raw(), 7_000);
    assert_eq!(d("-0.001").raw(), -1);
}

#[test]
fn fraction_is_padded_or_truncated() {
    assert_eq!(d(".50"), FixedDecimal::from_raw(500));
    assert_eq!(d("3."), FixedDecimal::from_int(3));
    assert_eq!(d("1.23456"), FixedDecimal::from_raw(1_234));
    assert_eq!(d("-1.23999"), FixedDecimal::from_raw(-1_239));
}

#[test]
fn rejects_empty_and_garbage() {
    assert!(matches!(FixedDecimal::from_string(""), Err(DecimalError::Syntax(_))));
    assert!(matches!(FixedDecimal::from_string("."), Err(DecimalError::Syntax(_))));
    assert!(matches!(FixedDecimal::from_string("-"), Err(DecimalError::Syntax(_))));
    assert!(matches!(FixedDecimal::from_string("1,000"), Err(DecimalError::Syntax(_))));
    assert!(matches!(FixedDecimal::from_string("1.2.3"), Err(DecimalError::Syntax(_))));
    assert!(matches!(FixedDecimal::from_string("$5"), Err(DecimalError::Syntax(_))));
}

#[test]
fn rejects_oversized_integers() {
    assert_eq!(
        FixedDecimal::from_string("100000000000000000"),
        Err(DecimalError::Overflow("100000000000000000".to_string()))
    );
    assert!(matches!(
        FixedDecimal::from_string("99999999999999999999"),
        Err(DecimalError::Overflow(_))
    ));
}

// === Arithmetic ===

#[test]
fn add_and_subtract_are_exact() {
    assert_eq!(d("0.1") + d("0.2"), d("0.3"));
    assert_eq!(d("1") - d("1.001"), d("-0.001"));

    let mut total = FixedDecimal::ZERO;
    total += d("10.5");
    total -= d("0.5");
    assert_eq!(total, FixedDecimal::from_int(10));
}

#[test]
fn multiplication_truncates_toward_zero() {
    assert_eq!(d("0.001") * d("0.5"), FixedDecimal::ZERO);
    assert_eq!(d("1.005") * d("1.5"), d("1.507"));
    assert_eq!(d("-1.005") * d("1.5"), d("-1.507"));
}

#[test]
fn division_scales_the_dividend() {
    assert_eq!(d("1") / d("3"), d("0.333"));
    assert_eq!(d("-2") / d("3"), d("-0.666"));
    assert_eq!(d("10") / d("0.5"), d("20"));
    assert_eq!(d("1").checked_div(FixedDecimal::ZERO), None);
}

#[test]
fn sums_owned_and_borrowed() {
    let values = [d("1.5"), d("2.25"), d("-0.75")];
    let owned: FixedDecimal = values.iter().copied().sum();
    let borrowed: FixedDecimal = values.iter().sum();
    assert_eq!(owned, d("3"));
    assert_eq!(owned, borrowed);
}

#[test]
fn sign_and_abs() {
    assert_eq!(d("-4.2").sign(), -1);
    assert_eq!(FixedDecimal::ZERO.sign(), 0);
    assert_eq!(d("4.2").sign(), 1);
    assert_eq!(d("-4.2").abs(), d("4.2"));
    assert_eq!(-d("4.2"), d("-4.2"));
}

// === Formatting ===

#[test]
fn display_keeps_three_digits() {
    assert_eq!(d("-492").to_string(), "-492.000");
    assert_eq!(d("-0.5").to_string(), "-0.500");
    assert_eq!(d("0.007").to_string(), "0.007");
}

#[test]
fn string_conversions() {
    assert_eq!(d("-1.999").truncate_string(), "-1");
    assert_eq!(d("2.5").round_string(), "3");
    assert_eq!(d("-2.5").round_string(), "-3");
    assert_eq!(d("-0.4").round_string(), "0");
    assert_eq!(d("0.125").fixed_bank_string(), "0.12");
    assert_eq!(d("0.135").fixed_bank_string(), "0.14");
    assert_eq!(d("-492").fixed_bank_string(), "-492.00");
    assert_eq!(d("-0.004").fixed_bank_string(), "0.00");
}

#[test]
fn float_conversions() {
    assert_eq!(FixedDecimal::from_float(1.0006), d("1.001"));
    assert_eq!(FixedDecimal::from_float(-2.0006), d("-2.001"));
    assert!((d("3.25").to_f64() - 3.25).abs() < f64::EPSILON);
}

// === rust_decimal and serde ===

#[test]
fn converts_to_and_from_decimal() {
    assert_eq!(Decimal::from(d("-12.345")), dec!(-12.345));
    assert_eq!(FixedDecimal::try_from(dec!(12.3456)), Ok(d("12.345")));
    assert_eq!(FixedDecimal::try_from(dec!(-0.0009)), Ok(FixedDecimal::ZERO));
    assert_eq!(FixedDecimal::try_from(dec!(7)), Ok(FixedDecimal::from_int(7)));
    assert!(matches!(
        FixedDecimal::try_from(dec!(100000000000000000)),
        Err(DecimalError::Overflow(_))
    ));
}

#[test]
fn serializes_as_string() {
    let json = serde_json::to_string(&d("-369")).unwrap();
    assert_eq!(json, r#""-369.000""#);

    let back: FixedDecimal = serde_json::from_str(&json).unwrap();
    assert_eq!(back, d("-369"));

    assert!(serde_json::from_str::<FixedDecimal>(r#""abc""#).is_err());
}
