use thiserror::Error;

/// Money is held as integer cents so the balance formula stays exact.
/// 1 unit = 100 cents, so 50.00 = 5000 cents.
pub type Cents = i64;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseCentsError {
    #[error("invalid money format")]
    InvalidFormat,

    #[error("amount out of range")]
    OutOfRange,
}

/// Format cents as a human-readable amount.
/// Example: 5000 -> "50.00", -1234 -> "-12.34"
pub fn format_cents(cents: Cents) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs_cents = cents.unsigned_abs();
    format!("{}{}.{:02}", sign, abs_cents / 100, abs_cents % 100)
}

/// Parse decimal text into cents.
/// Example: "50.00" -> 5000, "12.5" -> 1250, "100" -> 10000.
/// Digits past the second decimal place are truncated.
pub fn parse_cents(input: &str) -> Result<Cents, ParseCentsError> {
    let input = input.trim();
    let (negative, digits) = match input.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, input.strip_prefix('+').unwrap_or(input)),
    };

    let (units_str, decimal_str) = match digits.split_once('.') {
        Some((units, decimal)) => (units, decimal),
        None => (digits, ""),
    };

    if units_str.is_empty() && decimal_str.is_empty() {
        return Err(ParseCentsError::InvalidFormat);
    }
    if !is_digits(units_str) || !is_digits(decimal_str) {
        return Err(ParseCentsError::InvalidFormat);
    }

    let units: i64 = if units_str.is_empty() {
        0
    } else {
        units_str.parse().map_err(|_| ParseCentsError::OutOfRange)?
    };

    let decimal_cents: i64 = match decimal_str.len() {
        0 => 0,
        // "5" means 50 cents
        1 => i64::from(decimal_str.as_bytes()[0] - b'0') * 10,
        _ => {
            let bytes = decimal_str.as_bytes();
            i64::from(bytes[0] - b'0') * 10 + i64::from(bytes[1] - b'0')
        }
    };

    let cents = units
        .checked_mul(100)
        .and_then(|c| c.checked_add(decimal_cents))
        .ok_or(ParseCentsError::OutOfRange)?;

    Ok(if negative { -cents } else { cents })
}

/// Convert a floating point amount (as found in JSON payloads) into cents,
/// rounding to the nearest cent. Non-finite or out-of-range values are rejected.
pub fn cents_from_f64(amount: f64) -> Result<Cents, ParseCentsError> {
    if !amount.is_finite() {
        return Err(ParseCentsError::InvalidFormat);
    }
    let cents = (amount * 100.0).round();
    if cents.abs() >= i64::MAX as f64 {
        return Err(ParseCentsError::OutOfRange);
    }
    Ok(cents as Cents)
}

fn is_digits(s: &str) -> bool {
    s.bytes().all(|b| b.is_ascii_digit())
}
