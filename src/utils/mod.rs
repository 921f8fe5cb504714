//! Currency parsing and formatting
//!
//! Money enters the program as text typed into a masked input ("R$ 1.234,56")
//! and leaves it as pt-BR formatted text. Everything in between is `Decimal`.

use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

/// Round a monetary value to cents, half away from zero.
pub fn round_cents(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Parse masked currency input.
///
/// Every non-digit character is dropped and the remaining digits are read as
/// an integer number of cents, so `"R$ 1.234,56"` and `"123456"` both give
/// `1234.56`. Input without digits, or with more digits than a `Decimal`
/// mantissa holds, gives `None`.
///
/// # Examples
/// ```
/// use saldo::utils::parse_currency_input;
/// use rust_decimal_macros::dec;
///
/// assert_eq!(parse_currency_input("R$ 1.234,56"), Some(dec!(1234.56)));
/// assert_eq!(parse_currency_input("R$ "), None);
/// ```
pub fn parse_currency_input(text: &str) -> Option<Decimal> {
    let digits: String = text.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }

    let cents: i128 = digits.parse().ok()?;
    Decimal::try_from_i128_with_scale(cents, 2).ok()
}

/// Masked input for arithmetic: a missing value counts as zero.
pub fn parse_currency_or_zero(text: &str) -> Decimal {
    parse_currency_input(text).unwrap_or(Decimal::ZERO)
}

/// Parse an amount given on the command line or in an import file.
///
/// Plain decimal text (`5000`, `5000.5`, `5000.50`) is taken literally with
/// `.` as the decimal point. Anything else is treated as masked input, which
/// accepts pt-BR formatted values such as `5.000,00` or `R$ 5.000,00`.
/// Negative amounts and more than two fractional digits are rejected.
pub fn parse_amount_arg(text: &str) -> Option<Decimal> {
    let trimmed = text.trim();
    if trimmed.starts_with('-') {
        return None;
    }

    match Decimal::from_str(trimmed) {
        Ok(value) if value.normalize().scale() <= 2 => Some(value),
        Ok(_) => None,
        Err(_) => parse_currency_input(trimmed),
    }
}

/// Format as Brazilian Real, right-aligned to `width` (0 for no padding).
///
/// Uses Brazilian locale conventions:
/// - Thousands separator: `.` (period)
/// - Decimal separator: `,` (comma)
/// - Negative sign ahead of the symbol: `-R$ 10,00`
///
/// The value is rounded to cents (half away from zero) before rendering.
///
/// # Examples
/// ```
/// use saldo::utils::format_currency_aligned;
/// use rust_decimal_macros::dec;
///
/// assert_eq!(format_currency_aligned(dec!(1234.56), 0), "R$ 1.234,56");
/// assert_eq!(format_currency_aligned(dec!(1234), 15), "    R$ 1.234,00");
/// ```
pub fn format_currency_aligned(value: Decimal, width: usize) -> String {
    let rounded = round_cents(value);
    let is_negative = rounded < Decimal::ZERO;

    let formatted = format!("{:.2}", rounded.abs());
    let (integer_part, decimal_part) = formatted.split_once('.').unwrap_or((&formatted, "00"));

    // Add thousands separators (.) to integer part
    let with_separators: String = integer_part
        .chars()
        .rev()
        .enumerate()
        .flat_map(|(i, c)| {
            if i > 0 && i % 3 == 0 {
                vec!['.', c]
            } else {
                vec![c]
            }
        })
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();

    let sign = if is_negative { "-" } else { "" };
    let result = format!("{}R$ {},{}", sign, with_separators, decimal_part);

    if width > 0 && result.chars().count() < width {
        format!("{:>width$}", result, width = width)
    } else {
        result
    }
}

/// Format as Brazilian Real with symbol: "R$ 1.234,56"
///
/// # Examples
/// ```
/// use saldo::utils::format_currency;
/// use rust_decimal_macros::dec;
///
/// assert_eq!(format_currency(dec!(1234.56)), "R$ 1.234,56");
/// assert_eq!(format_currency(dec!(-500)), "-R$ 500,00");
/// ```
pub fn format_currency(value: Decimal) -> String {
    format_currency_aligned(value, 0)
}

/// Format a fraction as a percentage with one decimal: 0.275 -> "27,5%"
pub fn format_percent(fraction: Decimal) -> String {
    let pct = (fraction * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero);
    format!("{:.1}%", pct).replace('.', ",")
}
