//! Price parsing and discount math.
//!
//! Retail price text is noisy: `"$1,299.00"`, `"Now $49.99"`, split
//! whole/fraction renderings, stray whitespace. [`parse_price`] strips
//! everything that is not a digit or a decimal point and parses what is
//! left, so extractors can feed it raw node text without pre-cleaning.

/// Discount percentage at or above which a deal is flagged as featured.
pub const FEATURED_PERCENT_THRESHOLD: f64 = 20.0;

/// Rounds to 2 fractional digits, half-up at the cent.
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Parses a price out of arbitrary text. Returns `None` unless the result
/// is a finite, strictly positive number. `"$0.00"` and `"free"` are not
/// prices.
#[must_use]
pub fn parse_price(text: &str) -> Option<f64> {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    let price = cleaned.parse::<f64>().ok()?;
    if !price.is_finite() || price <= 0.0 {
        return None;
    }
    Some(round2(price))
}

/// Computes savings for a current/original price pair.
///
/// Returns `None` when there is no original price or it does not exceed
/// the current price — zero or negative savings are never reported.
#[must_use]
pub fn calculate_savings(
    current_price: f64,
    original_price: Option<f64>,
) -> Option<crate::Savings> {
    let original = original_price?;
    if original <= current_price {
        return None;
    }
    let amount = round2(original - current_price);
    let percent = round2(amount / original * 100.0);
    Some(crate::Savings { amount, percent })
}

/// Featured-flag policy: a deal is featured iff its savings percent meets
/// [`FEATURED_PERCENT_THRESHOLD`]. Evaluated per deal at upsert time.
#[must_use]
pub fn is_featured_discount(savings: Option<&crate::Savings>) -> bool {
    savings.is_some_and(|s| s.percent >= FEATURED_PERCENT_THRESHOLD)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_dollar_amounts() {
        assert_eq!(parse_price("$29.99"), Some(29.99));
        assert_eq!(parse_price("$1,299.00"), Some(1299.0));
        assert_eq!(parse_price("$0.99"), Some(0.99));
    }

    #[test]
    fn parses_plain_numbers() {
        assert_eq!(parse_price("29.99"), Some(29.99));
        assert_eq!(parse_price("100"), Some(100.0));
    }

    #[test]
    fn parses_prices_embedded_in_text() {
        assert_eq!(parse_price("Now $49.99"), Some(49.99));
        assert_eq!(parse_price("Price: $199.99"), Some(199.99));
    }

    #[test]
    fn rejects_non_prices() {
        assert_eq!(parse_price(""), None);
        assert_eq!(parse_price("free"), None);
        assert_eq!(parse_price("$0.00"), None);
        assert_eq!(parse_price("abc"), None);
    }

    #[test]
    fn rejects_multiple_decimal_points() {
        // "1.2.3" survives the char filter but is not a valid float.
        assert_eq!(parse_price("v1.2.3"), None);
    }

    #[test]
    fn rounds_to_cents() {
        assert_eq!(parse_price("19.999"), Some(20.0));
        assert_eq!(parse_price("$9.50"), Some(9.5));
    }

    #[test]
    fn savings_for_simple_discount() {
        let s = calculate_savings(79.99, Some(99.99)).unwrap();
        assert!((s.amount - 20.0).abs() < 0.01);
        assert!((s.percent - 20.0).abs() < 0.5);
    }

    #[test]
    fn savings_for_large_discount() {
        let s = calculate_savings(25.0, Some(100.0)).unwrap();
        assert!((s.amount - 75.0).abs() < f64::EPSILON);
        assert!((s.percent - 75.0).abs() < f64::EPSILON);
    }

    #[test]
    fn no_savings_without_original_price() {
        assert_eq!(calculate_savings(29.99, None), None);
    }

    #[test]
    fn no_savings_when_original_not_greater() {
        assert_eq!(calculate_savings(100.0, Some(100.0)), None);
        assert_eq!(calculate_savings(100.0, Some(50.0)), None);
    }

    #[test]
    fn featured_at_threshold() {
        let s = calculate_savings(80.0, Some(100.0));
        assert!(is_featured_discount(s.as_ref()), "20% is featured");
    }

    #[test]
    fn not_featured_below_threshold() {
        let s = calculate_savings(81.0, Some(100.0));
        assert!(!is_featured_discount(s.as_ref()), "19% is not featured");
        assert!(!is_featured_discount(None));
    }

    #[test]
    fn featured_well_above_threshold() {
        let s = calculate_savings(50.0, Some(100.0));
        assert!(is_featured_discount(s.as_ref()));
    }
}
