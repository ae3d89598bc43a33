//! Brazilian monetary-format parsing
//!
//! Converts strings like `"R$ 1.234,56"` into minor-unit integers using
//! integer arithmetic only. The separator roles are detected from their
//! relative positions: whichever of `,` and `.` appears last is the decimal
//! separator, the other is the thousands separator.

use fisiopay_domain::Money;

/// Parse a monetary amount into minor units (centavos)
///
/// Accepts `1.234,56`, `1234,56`, `1,234.56`, `1234.56`, with an optional
/// leading currency symbol and sign. Fractional digits beyond two are
/// rounded half-up. Returns `None` when the input carries no digits.
///
/// # Examples
///
/// ```
/// use fisiopay_extractor::parse_brazilian_amount;
/// use fisiopay_domain::Money;
///
/// assert_eq!(parse_brazilian_amount("1.234,56"), Some(Money::from_cents(123456)));
/// assert_eq!(parse_brazilian_amount("R$ 0,00"), Some(Money::from_cents(0)));
/// ```
pub fn parse_brazilian_amount(raw: &str) -> Option<Money> {
    // Keep digits, separators and the sign; currency symbols and spaces go
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | '-'))
        .collect();

    let negative = cleaned.starts_with('-');
    let cleaned = cleaned.trim_matches('-');
    if !cleaned.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    let last_comma = cleaned.rfind(',');
    let last_dot = cleaned.rfind('.');

    // Decimal separator is whichever comes last; the other one groups thousands
    let decimal_pos = match (last_comma, last_dot) {
        (Some(c), Some(d)) => Some(c.max(d)),
        (Some(c), None) => Some(c),
        (None, Some(d)) => Some(d),
        (None, None) => None,
    };

    let (int_raw, frac_raw) = match decimal_pos {
        Some(pos) => (&cleaned[..pos], &cleaned[pos + 1..]),
        None => (cleaned, ""),
    };

    let int_digits: String = int_raw.chars().filter(|c| c.is_ascii_digit()).collect();
    let frac_digits: String = frac_raw.chars().filter(|c| c.is_ascii_digit()).collect();

    let int_part: i64 = if int_digits.is_empty() {
        0
    } else {
        int_digits.parse().ok()?
    };

    // Scale the fraction to exactly two digits, rounding half-up on the third
    let cents_part: i64 = match frac_digits.len() {
        0 => 0,
        1 => frac_digits.parse::<i64>().ok()? * 10,
        2 => frac_digits.parse::<i64>().ok()?,
        _ => {
            let head: i64 = frac_digits[..2].parse().ok()?;
            let next = frac_digits.as_bytes()[2] - b'0';
            head + i64::from(next >= 5)
        }
    };

    let cents = int_part.checked_mul(100)?.checked_add(cents_part)?;
    Some(Money::from_cents(if negative { -cents } else { cents }))
}
