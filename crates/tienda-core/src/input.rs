//! # Input Normalization
//!
//! Turns the free-text numeric fields of the cart (tax rate, global
//! discount, manual unit price) into validated numbers.
//!
//! ## Normalization Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Free-text → Number                                 │
//! │                                                                         │
//! │  "20"   "8,25"   ""   "abc"   "-5"   "150"                              │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  parse_hundredths ── decimal with '.' or ',' ── rounded to 2 places     │
//! │     │                                                                   │
//! │     ├── strict (parse_amount)     → Err(InvalidNumber) on bad input    │
//! │     │    used for: manual prices, explicit discount entry              │
//! │     │                                                                   │
//! │     └── lenient (normalize_*)     → 0 on bad/empty/negative input      │
//! │          used for: totals computation, which never fails               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use tienda_core::input::{normalize_discount, normalize_tax_rate, parse_amount};
//!
//! assert_eq!(normalize_tax_rate("8.25").bps(), 825);
//! assert_eq!(normalize_discount("abc").cents(), 0);
//! assert_eq!(parse_amount("price", "12,5").unwrap().cents(), 1250);
//! assert!(parse_amount("price", "-1").is_err());
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{PriceEntry, TaxRate};
use crate::{MAX_ITEM_QUANTITY, MAX_PRICE_CENTS};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Parses a decimal string into hundredths (cents, or basis points when the
/// text is a percentage).
///
/// ## Rules
/// - Surrounding whitespace is ignored
/// - Optional leading `+` or `-`
/// - At most one decimal separator, `.` or `,`
/// - Digits past the second decimal are rounded half away from zero
/// - Anything else (empty, letters, overflow) yields `None`
pub fn parse_hundredths(text: &str) -> Option<i64> {
    let text = text.trim();
    let (negative, body) = match text.as_bytes().first()? {
        b'-' => (true, &text[1..]),
        b'+' => (false, &text[1..]),
        _ => (false, text),
    };

    let mut parts = body.splitn(2, ['.', ',']);
    let whole = parts.next().unwrap_or("");
    let fraction = parts.next().unwrap_or("");

    if whole.is_empty() && fraction.is_empty() {
        return None;
    }
    if !whole.bytes().all(|b| b.is_ascii_digit()) || !fraction.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }

    let mut value: i64 = 0;
    for digit in whole.bytes() {
        value = value.checked_mul(10)?.checked_add((digit - b'0') as i64)?;
    }

    let mut digits = fraction.bytes().map(|b| (b - b'0') as i64);
    for _ in 0..2 {
        value = value.checked_mul(10)?.checked_add(digits.next().unwrap_or(0))?;
    }
    if digits.next().is_some_and(|d| d >= 5) {
        value = value.checked_add(1)?;
    }

    Some(if negative { -value } else { value })
}

// =============================================================================
// Strict Parsers
// =============================================================================

/// Parses a non-negative money amount, rejecting anything unusable.
///
/// ## Errors
/// `InvalidNumber` for empty, malformed or negative input. The caller keeps
/// its previous state.
pub fn parse_amount(field: &str, text: &str) -> ValidationResult<Money> {
    match parse_hundredths(text) {
        Some(cents) if cents >= 0 => Ok(Money::from_cents(cents)),
        _ => Err(ValidationError::InvalidNumber {
            field: field.to_string(),
            input: text.to_string(),
        }),
    }
}

/// Accepts an optional amount: blank text means "no amount".
pub fn parse_optional_amount(field: &str, text: &str) -> ValidationResult<Option<Money>> {
    if text.trim().is_empty() {
        return Ok(None);
    }
    parse_amount(field, text).map(Some)
}

/// Validates a line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed [`MAX_ITEM_QUANTITY`]
///
/// ```rust
/// use tienda_core::input::validate_quantity;
///
/// assert!(validate_quantity(5).is_ok());
/// assert!(validate_quantity(0).is_err());
/// assert!(validate_quantity(1_000).is_err());
/// ```
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if !(1..=MAX_ITEM_QUANTITY).contains(&qty) {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }
    Ok(())
}

/// Validates the amounts of a catalog price entry.
///
/// Every field must lie in `[0, MAX_PRICE_CENTS]`. Whether the margins
/// make sense together (`min_margin ≤ max_margin ≤ list_price`) is the
/// catalog owner's concern; the engine tolerates inverted margins.
pub fn validate_price_entry(field: &str, entry: &PriceEntry) -> ValidationResult<()> {
    let amounts = [entry.list_price, entry.max_margin, entry.min_margin];
    if amounts
        .iter()
        .any(|amount| !(0..=MAX_PRICE_CENTS).contains(&amount.cents()))
    {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_PRICE_CENTS,
        });
    }
    Ok(())
}

// =============================================================================
// Lenient Normalizers
// =============================================================================

/// Normalizes the global-discount field: unusable or negative → zero.
pub fn normalize_discount(text: &str) -> Money {
    parse_hundredths(text)
        .map(Money::from_cents)
        .unwrap_or(Money::ZERO)
        .non_negative()
}

/// Normalizes the tax-rate percentage field into basis points.
///
/// Unusable or negative input means no tax. Rates of 100% or more are kept
/// as-is; the gross-up neutralizes them.
pub fn normalize_tax_rate(text: &str) -> TaxRate {
    let bps = parse_hundredths(text).unwrap_or(0).clamp(0, u32::MAX as i64);
    TaxRate::from_bps(bps as u32)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hundredths_accepts_decimal_forms() {
        assert_eq!(parse_hundredths("12"), Some(1200));
        assert_eq!(parse_hundredths(" 12.5 "), Some(1250));
        assert_eq!(parse_hundredths("12,50"), Some(1250));
        assert_eq!(parse_hundredths(".5"), Some(50));
        assert_eq!(parse_hundredths("3."), Some(300));
        assert_eq!(parse_hundredths("+7"), Some(700));
        assert_eq!(parse_hundredths("-5.5"), Some(-550));
    }

    #[test]
    fn test_parse_hundredths_rounds_extra_decimals() {
        assert_eq!(parse_hundredths("1.005"), Some(101));
        assert_eq!(parse_hundredths("1.0049"), Some(100));
        assert_eq!(parse_hundredths("-1.005"), Some(-101));
    }

    #[test]
    fn test_parse_hundredths_rejects_garbage() {
        assert_eq!(parse_hundredths(""), None);
        assert_eq!(parse_hundredths("   "), None);
        assert_eq!(parse_hundredths("abc"), None);
        assert_eq!(parse_hundredths("1.2.3"), None);
        assert_eq!(parse_hundredths("1,000.50"), None);
        assert_eq!(parse_hundredths("-"), None);
        assert_eq!(parse_hundredths("."), None);
        assert_eq!(parse_hundredths("1e3"), None);
        assert_eq!(parse_hundredths("NaN"), None);
        assert_eq!(parse_hundredths("99999999999999999999"), None);
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("price", "80").unwrap(), Money::from_units(80));
        assert_eq!(parse_amount("price", "0").unwrap(), Money::ZERO);

        let err = parse_amount("price", "-1").unwrap_err();
        assert_eq!(
            err,
            ValidationError::InvalidNumber {
                field: "price".to_string(),
                input: "-1".to_string(),
            }
        );
        assert!(parse_amount("price", "").is_err());
    }

    #[test]
    fn test_validate_quantity_bounds() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(MAX_ITEM_QUANTITY).is_ok());
        assert!(validate_quantity(-3).is_err());
        assert_eq!(
            validate_quantity(1_000_000_000_000_000),
            Err(ValidationError::OutOfRange {
                field: "quantity".to_string(),
                min: 1,
                max: MAX_ITEM_QUANTITY,
            })
        );
    }

    #[test]
    fn test_validate_price_entry_bounds() {
        let ok = PriceEntry::new(Money::from_units(100), Money::from_units(30), Money::ZERO);
        assert!(validate_price_entry("prices.retail", &ok).is_ok());

        let negative = PriceEntry::new(Money::from_cents(-1), Money::ZERO, Money::ZERO);
        assert!(validate_price_entry("prices.retail", &negative).is_err());

        let huge = PriceEntry::new(Money::from_cents(i64::MAX), Money::ZERO, Money::ZERO);
        assert!(validate_price_entry("prices.retail", &huge).is_err());
    }

    #[test]
    fn test_parse_optional_amount() {
        assert_eq!(parse_optional_amount("discount", "  ").unwrap(), None);
        assert_eq!(
            parse_optional_amount("discount", "10").unwrap(),
            Some(Money::from_units(10))
        );
        assert!(parse_optional_amount("discount", "x").is_err());
    }

    #[test]
    fn test_normalize_discount() {
        assert_eq!(normalize_discount(""), Money::ZERO);
        assert_eq!(normalize_discount("abc"), Money::ZERO);
        assert_eq!(normalize_discount("-20"), Money::ZERO);
        assert_eq!(normalize_discount("15.75"), Money::from_cents(1_575));
    }

    #[test]
    fn test_normalize_tax_rate() {
        assert_eq!(normalize_tax_rate("20").bps(), 2_000);
        assert_eq!(normalize_tax_rate("8.25").bps(), 825);
        assert_eq!(normalize_tax_rate("").bps(), 0);
        assert_eq!(normalize_tax_rate("-3").bps(), 0);
        assert_eq!(normalize_tax_rate("150").bps(), 15_000);
    }
}
