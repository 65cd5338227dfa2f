//! Exact conversion between human-entered decimal strings and integer
//! base-unit token amounts.
//!
//! Every quantity that reaches the chain is a `U256` in the token's
//! smallest denomination. Conversion happens here and only here, with
//! integer arithmetic throughout: a floating-point detour at this layer
//! silently corrupts transfer amounts, so none exists.
//!
//! Key properties:
//! - **Lossless parsing**: `to_base_units("1.5", 6)` is exactly
//!   `1_500_000`; inputs with more fractional digits than the token
//!   carries are rejected, never truncated.
//! - **Truncating display**: `from_base_units` cuts the fraction at the
//!   requested display width and never rounds up.

use alloy::primitives::U256;

/// Why a decimal string could not be converted to base units.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AmountError {
    #[error("amount is empty")]
    Empty,
    #[error("amount must not be negative")]
    Negative,
    #[error("amount contains a non-digit character: {0:?}")]
    InvalidDigit(char),
    #[error("amount has {got} fractional digits but the token only carries {max}")]
    TooManyFractionalDigits { got: usize, max: u8 },
    #[error("amount does not fit in 256 bits")]
    Overflow,
    #[error("amount must be greater than zero")]
    Zero,
}

/// Parse a non-negative decimal string into base units for a token with
/// the given decimal precision.
///
/// Accepts `"100"`, `"100.25"`, `".5"` and `"5."`; rejects empty input,
/// signs, non-digit characters, and fractions finer than `decimals`.
pub fn to_base_units(input: &str, decimals: u8) -> Result<U256, AmountError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(AmountError::Empty);
    }

    if trimmed.starts_with('-') {
        return Err(AmountError::Negative);
    }

    let (integer_part, fraction_part) = match trimmed.split_once('.') {
        Some((integer, fraction)) => (integer, fraction),
        None => (trimmed, ""),
    };

    // "." alone carries no digits at all
    if integer_part.is_empty() && fraction_part.is_empty() {
        return Err(AmountError::Empty);
    }

    if fraction_part.len() > usize::from(decimals) {
        return Err(AmountError::TooManyFractionalDigits {
            got: fraction_part.len(),
            max: decimals,
        });
    }

    let scale = pow10(decimals)?;

    let integer = parse_digits(integer_part)?;
    let fraction = parse_digits(fraction_part)?;

    // Scale the fraction up to `decimals` digits: "25" at 6 decimals
    // contributes 250_000.
    let fraction_scale = pow10(decimals - fraction_part.len() as u8)?;
    let fraction_scaled = fraction
        .checked_mul(fraction_scale)
        .ok_or(AmountError::Overflow)?;

    integer
        .checked_mul(scale)
        .and_then(|scaled| scaled.checked_add(fraction_scaled))
        .ok_or(AmountError::Overflow)
}

/// Format a base-unit amount as a decimal string, truncating (never
/// rounding) the fraction to `display_decimals` digits.
///
/// With `display_decimals == 0` only the integer part is produced; a
/// shorter token precision than the requested display width is padded
/// with zeros on the right.
pub fn from_base_units(value: U256, decimals: u8, display_decimals: u8) -> String {
    if decimals == 0 || display_decimals == 0 {
        let integer = if decimals == 0 {
            value
        } else {
            // pow10 over a u8 range only fails past 10^77; a token with
            // that precision cannot exist on a 256-bit ledger.
            value / pow10(decimals).unwrap_or(U256::MAX)
        };
        return integer.to_string();
    }

    let scale = pow10(decimals).unwrap_or(U256::MAX);
    let integer = value / scale;
    let remainder = value % scale;

    // Zero-pad the remainder out to the token's full precision, then cut
    // at the display width.
    let mut fraction = zero_padded(remainder, usize::from(decimals));
    fraction.truncate(usize::from(display_decimals));

    let padding = usize::from(display_decimals).saturating_sub(fraction.len());
    fraction.extend(std::iter::repeat_n('0', padding));

    format!("{integer}.{fraction}")
}

/// Format an oracle price quoted in whole USD cents: `1234` → `"12.34"`.
pub fn format_usd_cents(cents: U256) -> String {
    let dollars = cents / U256::from(100);
    let remainder = cents % U256::from(100);
    format!("{dollars}.{}", zero_padded(remainder, 2))
}

/// Decimal digits of `value`, left-padded with zeros to `width`.
fn zero_padded(value: U256, width: usize) -> String {
    let digits = value.to_string();
    let mut padded = "0".repeat(width.saturating_sub(digits.len()));
    padded.push_str(&digits);
    padded
}

fn parse_digits(digits: &str) -> Result<U256, AmountError> {
    let mut value = U256::ZERO;

    for ch in digits.chars() {
        let digit = ch.to_digit(10).ok_or(AmountError::InvalidDigit(ch))?;
        value = value
            .checked_mul(U256::from(10))
            .and_then(|shifted| shifted.checked_add(U256::from(digit)))
            .ok_or(AmountError::Overflow)?;
    }

    Ok(value)
}

fn pow10(exponent: u8) -> Result<U256, AmountError> {
    U256::from(10)
        .checked_pow(U256::from(exponent))
        .ok_or(AmountError::Overflow)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn parses_whole_number() {
        assert_eq!(to_base_units("100", 2).unwrap(), U256::from(10_000));
    }

    #[test]
    fn parses_usdt_amount_with_two_decimals() {
        assert_eq!(to_base_units("100.00", 2).unwrap(), U256::from(10_000));
    }

    #[test]
    fn parses_fraction_shorter_than_precision() {
        assert_eq!(to_base_units("1.5", 6).unwrap(), U256::from(1_500_000));
    }

    #[test]
    fn parses_bare_fraction() {
        assert_eq!(to_base_units(".5", 2).unwrap(), U256::from(50));
    }

    #[test]
    fn parses_trailing_dot() {
        assert_eq!(to_base_units("5.", 2).unwrap(), U256::from(500));
    }

    #[test]
    fn parses_zero() {
        assert_eq!(to_base_units("0", 18).unwrap(), U256::ZERO);
    }

    #[test]
    fn trims_surrounding_whitespace() {
        assert_eq!(to_base_units(" 42 ", 0).unwrap(), U256::from(42));
    }

    #[test]
    fn rejects_empty_input() {
        assert_eq!(to_base_units("", 2), Err(AmountError::Empty));
        assert_eq!(to_base_units("   ", 2), Err(AmountError::Empty));
        assert_eq!(to_base_units(".", 2), Err(AmountError::Empty));
    }

    #[test]
    fn rejects_negative_input() {
        assert_eq!(to_base_units("-1", 2), Err(AmountError::Negative));
    }

    #[test]
    fn rejects_non_digit_characters() {
        assert_eq!(to_base_units("12a", 2), Err(AmountError::InvalidDigit('a')));
        assert_eq!(to_base_units("1,5", 2), Err(AmountError::InvalidDigit(',')));
        assert_eq!(to_base_units("+1", 2), Err(AmountError::InvalidDigit('+')));
    }

    #[test]
    fn rejects_excess_fractional_digits() {
        assert_eq!(
            to_base_units("1.234", 2),
            Err(AmountError::TooManyFractionalDigits { got: 3, max: 2 })
        );
    }

    #[test]
    fn rejects_overflow() {
        // 10^78 exceeds 256 bits
        let huge = format!("1{}", "0".repeat(78));
        assert_eq!(to_base_units(&huge, 0), Err(AmountError::Overflow));
    }

    #[test]
    fn formats_with_full_precision() {
        assert_eq!(from_base_units(U256::from(10_000), 2, 2), "100.00");
    }

    #[test]
    fn formats_truncating_not_rounding() {
        // 1.999999 at 6 decimals shown with 2 digits must be 1.99
        assert_eq!(from_base_units(U256::from(1_999_999), 6, 2), "1.99");
    }

    #[test]
    fn formats_integer_only_display() {
        assert_eq!(from_base_units(U256::from(1_999_999), 6, 0), "1");
    }

    #[test]
    fn formats_zero_decimal_token() {
        assert_eq!(from_base_units(U256::from(7), 0, 0), "7");
    }

    #[test]
    fn formats_small_fraction_with_leading_zeros() {
        assert_eq!(from_base_units(U256::from(42), 6, 6), "0.000042");
    }

    #[test]
    fn pads_display_wider_than_precision() {
        assert_eq!(from_base_units(U256::from(150), 2, 4), "1.5000");
    }

    #[test]
    fn formats_usd_cents() {
        assert_eq!(format_usd_cents(U256::from(1234)), "12.34");
        assert_eq!(format_usd_cents(U256::from(100)), "1.00");
        assert_eq!(format_usd_cents(U256::from(5)), "0.05");
        assert_eq!(format_usd_cents(U256::ZERO), "0.00");
    }

    proptest! {
        #[test]
        fn round_trip_preserves_value(
            integer in 0u64..1_000_000,
            fraction in 0u32..1_000_000,
            decimals in 6u8..=18,
        ) {
            let input = format!("{integer}.{fraction:06}");
            let units = to_base_units(&input, decimals).unwrap();
            let formatted = from_base_units(units, decimals, decimals);
            let reparsed = to_base_units(&formatted, decimals).unwrap();
            prop_assert_eq!(units, reparsed);
        }

        #[test]
        fn round_trip_reproduces_input_modulo_trailing_zeros(
            integer in 0u64..1_000_000,
            fraction in 0u32..100,
        ) {
            let input = format!("{integer}.{fraction:02}");
            let units = to_base_units(&input, 2).unwrap();
            prop_assert_eq!(from_base_units(units, 2, 2), input);
        }

        #[test]
        fn parsed_value_scales_with_precision(raw in 0u64..1_000_000_000) {
            let input = raw.to_string();
            let at_two = to_base_units(&input, 2).unwrap();
            let at_zero = to_base_units(&input, 0).unwrap();
            prop_assert_eq!(at_two, at_zero * U256::from(100));
        }
    }
}
