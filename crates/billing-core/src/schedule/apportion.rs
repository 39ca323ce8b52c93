//! # Amount Apportioner
//!
//! Splits a transaction value evenly across its periods without cent drift.
//!
//! ```text
//! V = $1,000.00, N = 3
//!      │
//!      ▼
//! share = round(V / N, 2) = $333.33
//!      │
//!      ▼
//! [$333.33, $333.33, $333.34]   ← last period absorbs the remainder
//!  sum = $1,000.00 exactly
//! ```

use crate::error::{CoreError, CoreResult};
use crate::money::Money;

/// Splits `value` into `periods` amounts that sum exactly to `value`.
///
/// The first `periods - 1` amounts are `round(value / periods, 2)`; the last
/// is whatever remains. Zero periods is rejected.
///
/// ## Example
/// ```rust
/// use billing_core::schedule::apportion;
/// use billing_core::Money;
///
/// let parts = apportion(Money::from_cents(100_000), 3).unwrap();
/// let cents: Vec<i64> = parts.iter().map(|m| m.cents()).collect();
/// assert_eq!(cents, vec![33_333, 33_333, 33_334]);
/// ```
pub fn apportion(value: Money, periods: u32) -> CoreResult<Vec<Money>> {
    if periods == 0 {
        return Err(CoreError::EmptyApportionment);
    }

    let share = value.divide_rounded(periods as i64);
    let leading = periods as usize - 1;
    let last = value - share * leading as i64;

    let mut amounts = vec![share; leading];
    amounts.push(last);
    Ok(amounts)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cents(amounts: &[Money]) -> Vec<i64> {
        amounts.iter().map(|m| m.cents()).collect()
    }

    #[test]
    fn test_single_period_takes_everything() {
        assert_eq!(cents(&apportion(Money::from_cents(12_345), 1).unwrap()), vec![12_345]);
    }

    #[test]
    fn test_even_split() {
        let parts = apportion(Money::from_cents(1_200_000), 12).unwrap();
        assert!(parts.iter().all(|m| m.cents() == 100_000));
    }

    #[test]
    fn test_last_period_absorbs_rounding() {
        // 200.00 / 3 = 66.666.. → 66.67, 66.67, 66.66
        assert_eq!(
            cents(&apportion(Money::from_cents(20_000), 3).unwrap()),
            vec![6_667, 6_667, 6_666]
        );
    }

    #[test]
    fn test_sum_is_exact_for_many_splits() {
        for value in [0i64, 1, 99, 10_000, 100_001, 123_456_789, 999_999_999] {
            for periods in 1u32..=40 {
                let parts = apportion(Money::from_cents(value), periods).unwrap();
                assert_eq!(parts.len(), periods as usize);
                let total: Money = parts.iter().sum();
                assert_eq!(total.cents(), value, "value {} over {} periods", value, periods);
            }
        }
    }

    #[test]
    fn test_zero_periods_is_an_error() {
        assert!(matches!(
            apportion(Money::from_cents(100), 0),
            Err(CoreError::EmptyApportionment)
        ));
    }
}
