use thiserror::Error;

/// Amounts are stored as integer minor units (cents). No currency is attached.
pub type Cents = i64;

/// Format minor units as a decimal string.
/// Example: 5000 -> "50.00", -1234 -> "-12.34"
pub fn format_cents(cents: Cents) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{}{}.{:02}", sign, abs / 100, abs % 100)
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseAmountError {
    #[error("amount is empty")]
    Empty,

    #[error("invalid amount format: {0}")]
    InvalidFormat(String),

    #[error("amount has more than two decimal places: {0}")]
    TooPrecise(String),

    #[error("amount is too large: {0}")]
    Overflow(String),
}

/// Parse a user supplied amount such as "50", "50.5" or "50.05" into cents.
///
/// Signs are rejected here; whether a zero amount is acceptable is decided by
/// the service layer.
pub fn parse_cents(input: &str) -> Result<Cents, ParseAmountError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ParseAmountError::Empty);
    }

    let invalid = || ParseAmountError::InvalidFormat(input.to_string());
    let overflow = || ParseAmountError::Overflow(input.to_string());

    let (units, fraction) = match input.split_once('.') {
        Some((units, fraction)) => (units, fraction),
        None => (input, ""),
    };

    if units.is_empty() && fraction.is_empty() {
        return Err(invalid());
    }
    if !units.chars().all(|c| c.is_ascii_digit()) || !fraction.chars().all(|c| c.is_ascii_digit())
    {
        return Err(invalid());
    }
    if fraction.len() > 2 {
        return Err(ParseAmountError::TooPrecise(input.to_string()));
    }

    let units: Cents = if units.is_empty() {
        0
    } else {
        units.parse().map_err(|_| overflow())?
    };
    let fraction: Cents = match fraction.len() {
        0 => 0,
        1 => fraction.parse::<Cents>().map_err(|_| invalid())? * 10,
        _ => fraction.parse().map_err(|_| invalid())?,
    };

    units
        .checked_mul(100)
        .and_then(|c| c.checked_add(fraction))
        .ok_or_else(overflow)
}
