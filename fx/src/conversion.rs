//! Amount parsing, conversion and display formatting.
//!
//! The engine is a set of pure functions. Given the same amount text, rates
//! and target it always produces the same answer and never panics.
//!
//! # Rules
//!
//! - Amounts use `.` as the decimal separator regardless of locale. Surrounding
//!   whitespace, a leading sign and an `e` exponent are accepted.
//! - A target missing from the rate map converts at `1.0`.
//! - Results are rounded to two places, half away from zero
//!   (`0.125 -> 0.13`, `-0.125 -> -0.13`).

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use ratecalc_common::CurrencyCode;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ConversionError, ConversionResult, InvalidAmount};

/// Fractional digits in a displayed result.
pub const RESULT_DECIMAL_PLACES: u32 = 2;

/// Rate used when the target has no entry.
pub const MISSING_RATE: f64 = 1.0;

/// Convert `amount_text` into `target` using `rates`, formatted for display.
pub fn convert(
    amount_text: &str,
    rates: &BTreeMap<CurrencyCode, f64>,
    target: &CurrencyCode,
) -> ConversionResult<String> {
    let amount = parse_amount(amount_text)?;
    let rate = lookup_rate(rates, target);
    let rate = rate_to_decimal(rate)
        .ok_or_else(|| ConversionError::invalid(amount_text, InvalidAmount::OutOfRange))?;

    let value = amount
        .checked_mul(rate)
        .ok_or_else(|| ConversionError::invalid(amount_text, InvalidAmount::OutOfRange))?;

    Ok(format_amount(value))
}

/// Rate for `target`, or [`MISSING_RATE`] when the table has none.
pub fn lookup_rate(rates: &BTreeMap<CurrencyCode, f64>, target: &CurrencyCode) -> f64 {
    match rates.get(target) {
        Some(rate) => *rate,
        None => {
            debug!(target = %target, "No rate for target, converting at 1.0");
            MISSING_RATE
        }
    }
}

/// Parse a user-entered amount.
pub fn parse_amount(text: &str) -> ConversionResult<Decimal> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ConversionError::invalid(text, InvalidAmount::Empty));
    }

    let literal = DecimalLiteral::scan(trimmed)
        .ok_or_else(|| ConversionError::invalid(text, InvalidAmount::Malformed))?;

    literal
        .to_decimal()
        .ok_or_else(|| ConversionError::invalid(text, InvalidAmount::OutOfRange))
}

/// Round half away from zero to two places and render with exactly two digits.
pub fn format_amount(value: Decimal) -> String {
    let mut rounded =
        value.round_dp_with_strategy(RESULT_DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(RESULT_DECIMAL_PLACES);
    if rounded.is_zero() {
        rounded.set_sign_positive(true);
    }
    rounded.to_string()
}

/// f64 rates go through their shortest round-trip text so `1.08` stays `1.08`.
fn rate_to_decimal(rate: f64) -> Option<Decimal> {
    if !rate.is_finite() {
        return None;
    }
    Decimal::from_str(&rate.to_string()).ok()
}

/// A validated `[+-]digits[.digits][e[+-]digits]` literal.
struct DecimalLiteral<'a> {
    negative: bool,
    integer: &'a str,
    fraction: &'a str,
    exponent: Option<&'a str>,
}

impl<'a> DecimalLiteral<'a> {
    fn scan(text: &'a str) -> Option<Self> {
        let (negative, rest) = match text.as_bytes().first()? {
            b'-' => (true, &text[1..]),
            b'+' => (false, &text[1..]),
            _ => (false, text),
        };

        let (mantissa, exponent) = match rest.find(['e', 'E']) {
            Some(idx) => (&rest[..idx], Some(&rest[idx + 1..])),
            None => (rest, None),
        };

        let (integer, fraction) = match mantissa.split_once('.') {
            Some((int, frac)) => (int, frac),
            None => (mantissa, ""),
        };

        let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
        if integer.is_empty() && fraction.is_empty() {
            return None;
        }
        if !all_digits(integer) || !all_digits(fraction) {
            return None;
        }

        if let Some(exp) = exponent {
            let digits = exp.strip_prefix(['+', '-']).unwrap_or(exp);
            if digits.is_empty() || !all_digits(digits) {
                return None;
            }
        }

        Some(Self {
            negative,
            integer,
            fraction,
            exponent,
        })
    }

    fn to_decimal(&self) -> Option<Decimal> {
        let mut canonical = String::with_capacity(self.integer.len() + self.fraction.len() + 3);
        if self.negative {
            canonical.push('-');
        }
        canonical.push_str(if self.integer.is_empty() { "0" } else { self.integer });
        if !self.fraction.is_empty() {
            canonical.push('.');
            canonical.push_str(self.fraction);
        }

        let mantissa = Decimal::from_str(&canonical).ok()?;
        match self.exponent {
            None => Some(mantissa),
            Some(_) if mantissa.is_zero() => Some(Decimal::ZERO),
            Some(exp) => scale_by_power_of_ten(mantissa, parse_exponent(exp)),
        }
    }
}

/// Exponent beyond which any non-zero mantissa leaves `Decimal` range.
const MAX_EXPONENT: i32 = 2 * Decimal::MAX_SCALE as i32 + 1;

/// Parse an exponent, saturating at `±(MAX_EXPONENT + 1)`.
///
/// Digits past what `i32` holds still mean "very large", so only the sign
/// of an overlong exponent matters.
fn parse_exponent(text: &str) -> i32 {
    let limit = MAX_EXPONENT + 1;
    match text.parse::<i32>() {
        Ok(exp) => exp.clamp(-limit, limit),
        Err(_) if text.starts_with('-') => -limit,
        Err(_) => limit,
    }
}

fn scale_by_power_of_ten(mut value: Decimal, exp: i32) -> Option<Decimal> {
    if exp > MAX_EXPONENT {
        return None;
    }

    let ten = Decimal::TEN;
    if exp >= 0 {
        for _ in 0..exp {
            value = value.checked_mul(ten)?;
        }
    } else {
        for _ in 0..exp.unsigned_abs().min(MAX_EXPONENT as u32) {
            value = value.checked_div(ten)?;
        }
    }
    Some(value)
}

/// A computed result together with what produced it.
///
/// Renders as `"<amount> <base> = <result> <target>"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionSummary {
    pub amount_text: String,
    pub base: CurrencyCode,
    pub result: String,
    pub target: CurrencyCode,
}

impl ConversionSummary {
    /// Run a conversion and capture its inputs alongside the result.
    pub fn compute(
        amount_text: &str,
        base: &CurrencyCode,
        rates: &BTreeMap<CurrencyCode, f64>,
        target: &CurrencyCode,
    ) -> ConversionResult<Self> {
        let result = convert(amount_text, rates, target)?;
        Ok(Self {
            amount_text: amount_text.trim().to_string(),
            base: base.clone(),
            result,
            target: target.clone(),
        })
    }
}

impl fmt::Display for ConversionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} = {} {}",
            self.amount_text, self.base, self.result, self.target
        )
    }
}
