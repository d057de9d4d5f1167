// Amount formatters
//
// Abbreviates amounts into crore / lakh / thousand units and renders
// everything else with South-Asian digit grouping (12,34,567).

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// 1 crore = 1,00,00,000
pub const CRORE: i64 = 10_000_000;

/// 1 lakh = 1,00,000
pub const LAKH: i64 = 100_000;

pub const THOUSAND: i64 = 1_000;

/// Default display prefix (Indian rupee sign)
pub const DEFAULT_PREFIX: &str = "₹";

/// Rendered in place of an amount that is NaN or infinite
pub const PLACEHOLDER: &str = "—";

/// Abbreviation tiers, checked top to bottom. First match wins.
const TIERS: [(i64, &str); 3] = [(CRORE, " Cr"), (LAKH, " L"), (THOUSAND, " K")];

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum FormatError {
    #[error("amount is not a finite number: {0}")]
    NonFinite(f64),
}

/// Rounding applied to the 2-decimal abbreviated value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Rounding {
    /// Midpoints round away from zero: 1.225 -> 1.23
    #[default]
    HalfUp,
    /// Midpoints round to the even neighbour: 1.225 -> 1.22
    HalfEven,
}

impl Rounding {
    fn strategy(self) -> RoundingStrategy {
        match self {
            Rounding::HalfUp => RoundingStrategy::MidpointAwayFromZero,
            Rounding::HalfEven => RoundingStrategy::MidpointNearestEven,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Rounding::HalfUp => "half-up",
            Rounding::HalfEven => "half-even",
        }
    }
}

impl fmt::Display for Rounding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Rounding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "half-up" => Ok(Rounding::HalfUp),
            "half-even" => Ok(Rounding::HalfEven),
            other => Err(format!("unknown rounding mode '{}' (expected half-up or half-even)", other)),
        }
    }
}

/// Prefix + rounding mode used to render amounts for display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Formatter {
    prefix: String,
    rounding: Rounding,
}

impl Default for Formatter {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX)
    }
}

impl Formatter {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            rounding: Rounding::default(),
        }
    }

    pub fn with_rounding(mut self, rounding: Rounding) -> Self {
        self.rounding = rounding;
        self
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn rounding(&self) -> Rounding {
        self.rounding
    }

    /// Prefix followed by the abbreviated magnitude.
    ///
    /// Fails only for NaN and infinities.
    pub fn try_format(&self, amount: f64) -> Result<String, FormatError> {
        let magnitude = abbreviate(amount, self.rounding)?;
        Ok(format!("{}{}", self.prefix, magnitude))
    }

    /// Like [`Formatter::try_format`], but renders [`PLACEHOLDER`] for non-finite input.
    pub fn format(&self, amount: f64) -> String {
        self.try_format(amount).unwrap_or_else(|err| {
            tracing::warn!(%err, "rendering placeholder for amount");
            format!("{}{}", self.prefix, PLACEHOLDER)
        })
    }

    /// Prefix followed by the grouped amount with exactly two decimals (12,34,567.80).
    pub fn format_full(&self, amount: f64) -> String {
        if !amount.is_finite() {
            return format!("{}{}", self.prefix, PLACEHOLDER);
        }
        format!("{}{}", self.prefix, group_fixed(amount, self.rounding))
    }
}

/// Abbreviated magnitude without a prefix: "1.23 Cr", "4.50 K", "999", "-5,000".
///
/// Negative amounts never reach a tier since every tier is a positive lower bound.
pub fn abbreviate(amount: f64, rounding: Rounding) -> Result<String, FormatError> {
    if !amount.is_finite() {
        return Err(FormatError::NonFinite(amount));
    }

    for (unit, suffix) in TIERS {
        if amount >= unit as f64 {
            return Ok(format!("{}{}", scale_to_unit(amount, unit, rounding), suffix));
        }
    }

    Ok(group_indian(amount))
}

/// Abbreviated magnitude with half-up rounding and no prefix
pub fn format_magnitude(amount: f64) -> String {
    Formatter::new("").format(amount)
}

/// Abbreviated amount with the default rupee prefix
pub fn format_currency(amount: f64) -> String {
    Formatter::default().format(amount)
}

/// Full amount with the default rupee prefix and two decimals
pub fn format_full_currency(amount: f64) -> String {
    Formatter::default().format_full(amount)
}

/// Render a finite number with South-Asian digit grouping.
///
/// At most three fractional digits are kept, trailing zeros trimmed.
///
/// # Examples
/// ```
/// use ledger_desk::format::group_indian;
/// assert_eq!(group_indian(1234567.0), "12,34,567");
/// assert_eq!(group_indian(-5000.0), "-5,000");
/// assert_eq!(group_indian(999.5), "999.5");
/// ```
pub fn group_indian(amount: f64) -> String {
    let magnitude = match Decimal::from_f64(amount.abs()) {
        Some(d) => d
            .round_dp_with_strategy(3, RoundingStrategy::MidpointAwayFromZero)
            .normalize()
            .to_string(),
        None => format!("{:.0}", amount.abs()),
    };
    with_sign(amount, &magnitude)
}

fn group_fixed(amount: f64, rounding: Rounding) -> String {
    let magnitude = match Decimal::from_f64(amount.abs()) {
        Some(d) => {
            let mut rounded = d.round_dp_with_strategy(2, rounding.strategy());
            rounded.rescale(2);
            rounded.to_string()
        }
        None => format!("{:.2}", amount.abs()),
    };
    with_sign(amount, &magnitude)
}

fn scale_to_unit(amount: f64, unit: i64, rounding: Rounding) -> String {
    match Decimal::from_f64(amount) {
        Some(d) => {
            let mut scaled = (d / Decimal::from(unit)).round_dp_with_strategy(2, rounding.strategy());
            scaled.rescale(2);
            scaled.to_string()
        }
        // Beyond the Decimal range (~7.9e28); binary rounding is all that is left.
        None => format!("{:.2}", amount / unit as f64),
    }
}

/// Group the integer part of an unsigned decimal string and re-attach the sign.
fn with_sign(amount: f64, magnitude: &str) -> String {
    let (int_part, frac_part) = match magnitude.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (magnitude, None),
    };

    let is_zero = magnitude.chars().all(|c| c == '0' || c == '.');

    let mut out = String::with_capacity(magnitude.len() + 8);
    if amount < 0.0 && !is_zero {
        out.push('-');
    }
    out.push_str(&group_digits(int_part));
    if let Some(frac) = frac_part {
        out.push('.');
        out.push_str(frac);
    }
    out
}

/// "1234567" -> "12,34,567": last three digits, then pairs.
fn group_digits(digits: &str) -> String {
    if digits.len() <= 3 {
        return digits.to_string();
    }

    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut groups = Vec::with_capacity(head.len() / 2 + 1);
    let mut end = head.len();
    while end > 0 {
        let start = end.saturating_sub(2);
        groups.push(&head[start..end]);
        end = start;
    }
    groups.reverse();

    format!("{},{}", groups.join(","), tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abbreviation_tiers() {
        assert_eq!(format_magnitude(12_345_678.0), "1.23 Cr");
        assert_eq!(format_magnitude(1_250_000.0), "12.50 L");
        assert_eq!(format_magnitude(125_000.0), "1.25 L");
        assert_eq!(format_magnitude(4_500.0), "4.50 K");
        assert_eq!(format_magnitude(999.0), "999");
    }

    #[test]
    fn test_zero_and_negative_fall_through() {
        assert_eq!(format_magnitude(0.0), "0");
        assert_eq!(format_magnitude(-0.0), "0");
        assert_eq!(format_magnitude(-5_000.0), "-5,000");
        assert_eq!(format_magnitude(-12_345_678.0), "-1,23,45,678");
    }

    #[test]
    fn test_tier_lower_bounds() {
        let below = format_magnitude(9_999_999.0);
        assert!(!below.ends_with(" Cr"), "got {}", below);
        assert_eq!(below, "100.00 L");

        assert_eq!(format_magnitude(10_000_000.0), "1.00 Cr");
        assert_eq!(format_magnitude(100_000.0), "1.00 L");
        assert_eq!(format_magnitude(99_999.0), "100.00 K");
        assert_eq!(format_magnitude(1_000.0), "1.00 K");
    }

    #[test]
    fn test_no_unit_above_crore() {
        assert_eq!(format_magnitude(120_000_000.0), "12.00 Cr");
        assert_eq!(format_magnitude(1_000_000_000_000.0), "100000.00 Cr");
    }

    #[test]
    fn test_small_integers_are_plain() {
        for n in 0..1000 {
            assert_eq!(format_magnitude(n as f64), n.to_string());
        }
    }

    #[test]
    fn test_rounding_mode_at_midpoint() {
        let half_up = Formatter::new("").with_rounding(Rounding::HalfUp);
        let half_even = Formatter::new("").with_rounding(Rounding::HalfEven);

        // 12,250,000 / 1 crore = 1.225 exactly
        assert_eq!(half_up.format(12_250_000.0), "1.23 Cr");
        assert_eq!(half_even.format(12_250_000.0), "1.22 Cr");

        assert_eq!(half_up.format(1_225.0), "1.23 K");
        assert_eq!(half_even.format(1_225.0), "1.22 K");

        // 1.2345 is not a two-decimal midpoint
        assert_eq!(half_up.format(12_345_000.0), "1.23 Cr");
        assert_eq!(half_even.format(12_345_000.0), "1.23 Cr");
    }

    #[test]
    fn test_prefix() {
        assert_eq!(format_currency(4_500.0), "₹4.50 K");
        assert_eq!(format_currency(-5_000.0), "₹-5,000");
        assert_eq!(Formatter::new("Rs. ").format(250.0), "Rs. 250");
    }

    #[test]
    fn test_non_finite_input() {
        let formatter = Formatter::default();
        assert_eq!(
            formatter.try_format(f64::NAN).unwrap_err().to_string(),
            "amount is not a finite number: NaN"
        );
        assert!(matches!(
            formatter.try_format(f64::INFINITY),
            Err(FormatError::NonFinite(_))
        ));
        assert!(abbreviate(f64::NEG_INFINITY, Rounding::HalfUp).is_err());
        assert_eq!(formatter.format(f64::NAN), "₹—");
        assert_eq!(formatter.format_full(f64::INFINITY), "₹—");
    }

    #[test]
    fn test_group_indian() {
        assert_eq!(group_indian(1_234_567.0), "12,34,567");
        assert_eq!(group_indian(123_456_789.0), "12,34,56,789");
        assert_eq!(group_indian(-1_234_567.0), "-12,34,567");
        assert_eq!(group_indian(1_000.0), "1,000");
        assert_eq!(group_indian(12.5), "12.5");
        assert_eq!(group_indian(0.1234), "0.123");
        assert_eq!(group_indian(-0.0001), "0");
    }

    #[test]
    fn test_format_full() {
        assert_eq!(format_full_currency(1_234_567.8), "₹12,34,567.80");
        assert_eq!(format_full_currency(-45.0), "₹-45.00");
        assert_eq!(format_full_currency(0.0), "₹0.00");
    }

    #[test]
    fn test_rounding_from_str() {
        assert_eq!("half-up".parse::<Rounding>().unwrap(), Rounding::HalfUp);
        assert_eq!("HALF_EVEN".parse::<Rounding>().unwrap(), Rounding::HalfEven);
        assert!("bankers".parse::<Rounding>().is_err());
    }
}
