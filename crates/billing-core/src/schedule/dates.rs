//! # Date Cadence Expander
//!
//! Lazily yields the invoice dates of one transaction.
//!
//! ## Month-End Policy
//! Each date advances the *previous* date by the cadence, clamping to the
//! last day of a short month. Once clamped, later dates stay on the clamped
//! day:
//! ```text
//! 2023-01-31 ──+1m──► 2023-02-28 ──+1m──► 2023-03-28 ──+1m──► 2023-04-28
//! 2024-02-29 ──+1y──► 2025-02-28
//! ```

use std::iter::FusedIterator;

use chrono::{Months, NaiveDate};

use crate::types::BillingCadence;

/// Iterator over `count` invoice dates starting at `start`.
///
/// Created by [`invoice_dates`]. Always yields exactly `count` dates; to
/// iterate again, build a new one.
#[derive(Debug, Clone)]
pub struct InvoiceDates {
    next: NaiveDate,
    step: Months,
    remaining: u32,
}

/// Expands `start` into `count` dates spaced one `cadence` apart.
///
/// ## Example
/// ```rust
/// use billing_core::schedule::invoice_dates;
/// use billing_core::BillingCadence;
/// use chrono::NaiveDate;
///
/// let start = NaiveDate::from_ymd_opt(2023, 1, 31).unwrap();
/// let dates: Vec<_> = invoice_dates(start, BillingCadence::Monthly, 3).collect();
/// assert_eq!(dates[1], NaiveDate::from_ymd_opt(2023, 2, 28).unwrap());
/// assert_eq!(dates[2], NaiveDate::from_ymd_opt(2023, 3, 28).unwrap());
/// ```
pub fn invoice_dates(start: NaiveDate, cadence: BillingCadence, count: u32) -> InvoiceDates {
    InvoiceDates {
        next: start,
        step: Months::new(cadence.months()),
        remaining: count,
    }
}

impl Iterator for InvoiceDates {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<NaiveDate> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;

        let current = self.next;
        // Saturates at the calendar limit instead of ending early
        self.next = current.checked_add_months(self.step).unwrap_or(NaiveDate::MAX);
        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.remaining as usize;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for InvoiceDates {}

impl FusedIterator for InvoiceDates {}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_monthly_month_end_clamps_and_sticks() {
        let dates: Vec<_> = invoice_dates(date(2023, 1, 31), BillingCadence::Monthly, 4).collect();
        assert_eq!(
            dates,
            vec![date(2023, 1, 31), date(2023, 2, 28), date(2023, 3, 28), date(2023, 4, 28)]
        );
    }

    #[test]
    fn test_leap_year_february() {
        let dates: Vec<_> = invoice_dates(date(2024, 1, 31), BillingCadence::Monthly, 2).collect();
        assert_eq!(dates, vec![date(2024, 1, 31), date(2024, 2, 29)]);
    }

    #[test]
    fn test_quarterly_and_annual_steps() {
        let quarterly: Vec<_> =
            invoice_dates(date(2023, 1, 1), BillingCadence::Quarterly, 4).collect();
        assert_eq!(
            quarterly,
            vec![date(2023, 1, 1), date(2023, 4, 1), date(2023, 7, 1), date(2023, 10, 1)]
        );

        let annual: Vec<_> = invoice_dates(date(2024, 2, 29), BillingCadence::Annually, 2).collect();
        assert_eq!(annual, vec![date(2024, 2, 29), date(2025, 2, 28)]);
    }

    #[test]
    fn test_yields_exactly_count() {
        for count in [0u32, 1, 7, 36] {
            let dates = invoice_dates(date(2023, 5, 15), BillingCadence::Monthly, count);
            assert_eq!(dates.len(), count as usize);
            assert_eq!(dates.count(), count as usize);
        }
    }

    #[test]
    fn test_consecutive_dates_are_one_step_apart() {
        let dates: Vec<_> = invoice_dates(date(2023, 8, 31), BillingCadence::Monthly, 12).collect();
        for pair in dates.windows(2) {
            assert_eq!(pair[0].checked_add_months(Months::new(1)), Some(pair[1]));
        }
    }

    #[test]
    fn test_fused_after_exhaustion() {
        let mut dates = invoice_dates(date(2023, 1, 1), BillingCadence::Annually, 1);
        assert_eq!(dates.next(), Some(date(2023, 1, 1)));
        assert_eq!(dates.next(), None);
        assert_eq!(dates.next(), None);
    }
}
