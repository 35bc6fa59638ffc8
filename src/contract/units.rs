//! Conversion between human decimal amounts and on-chain base units.
//!
//! Amounts never pass through floating point: input strings are checked
//! for shape, then converted by `alloy`'s unit parser into `U256`.

use alloy::primitives::utils::{format_units, parse_units};
use alloy::primitives::U256;

use crate::error::{ClientError, ClientResult};

/// Parse a strictly positive decimal amount into base units.
///
/// Accepts `123`, `1.5`, `0.000001`; rejects signs, exponents, empty
/// input, zero, and more fractional digits than `decimals`.
pub fn parse_amount(input: &str, decimals: u8) -> ClientResult<U256> {
    let trimmed = input.trim();
    let invalid = |reason: &str| {
        ClientError::SubmissionFailure(format!("invalid amount '{}': {}", input, reason))
    };

    if trimmed.is_empty() {
        return Err(invalid("empty"));
    }

    let (whole, fraction) = match trimmed.split_once('.') {
        Some((w, f)) => (w, Some(f)),
        None => (trimmed, None),
    };
    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());

    if !all_digits(whole) || !fraction.map_or(true, all_digits) {
        return Err(invalid("not a plain decimal number"));
    }
    if whole.is_empty() && fraction.map_or(true, str::is_empty) {
        return Err(invalid("no digits"));
    }
    if fraction.map_or(0, str::len) > decimals as usize {
        return Err(invalid("too many decimal places"));
    }

    let whole = if whole.is_empty() { "0" } else { whole };
    let normalized = match fraction {
        Some(f) if !f.is_empty() => format!("{}.{}", whole, f),
        _ => whole.to_string(),
    };

    let value = parse_units(&normalized, decimals)
        .map_err(|e| invalid(&e.to_string()))?
        .get_absolute();

    if value.is_zero() {
        return Err(invalid("must be greater than zero"));
    }
    Ok(value)
}

/// Format base units as an exact decimal string with trailing zeros trimmed.
pub fn format_amount(amount: U256, decimals: u8) -> String {
    match format_units(amount, decimals) {
        Ok(formatted) if formatted.contains('.') => {
            let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
            trimmed.to_string()
        }
        Ok(formatted) => formatted,
        Err(_) => amount.to_string(),
    }
}
