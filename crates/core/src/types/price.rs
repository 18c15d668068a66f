//! Price display helpers using decimal arithmetic.
//!
//! The API sends prices as JSON numbers (or numeric strings). They are decoded
//! into [`Decimal`] so that `19.99` never becomes `19.989999...` on the way to
//! the page. The storefront only formats prices; it never sums them.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// Currency symbol prefixed to every displayed amount.
pub const CURRENCY_SYMBOL: &str = "$";

/// Format an amount for display, e.g. `1299.5` becomes `"$1,299.50"`.
#[must_use]
pub fn format_price(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let fixed = format!("{:.2}", rounded.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{sign}{CURRENCY_SYMBOL}{grouped}.{cents}")
}

/// Percentage saved relative to a compare-at price, rounded to a whole number.
///
/// Returns `None` unless `compare_at` is strictly greater than `price`.
#[must_use]
pub fn discount_percent(price: Decimal, compare_at: Decimal) -> Option<u32> {
    if compare_at <= price || compare_at <= Decimal::ZERO {
        return None;
    }

    let saved = (compare_at - price) / compare_at * Decimal::ONE_HUNDRED;
    saved
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_u32()
        .filter(|percent| *percent > 0)
}
