//! # Period Counter
//!
//! How many billing periods (and so invoices) a transaction's date range
//! spans for its cadence.
//!
//! ```text
//! start 2023-01-15, end 2023-12-02
//!      │
//!      ▼
//! months = (2023*12 + 12) - (2023*12 + 1) + 1 = 12   (whole calendar months, inclusive)
//!      │
//!      ├── monthly    → 12
//!      ├── quarterly  → 12 / 3  = 4
//!      └── annually   → 12 / 12 = 1
//! ```
//!
//! Day-of-month is ignored: a range touching a calendar month counts it.

use chrono::{Datelike, NaiveDate};

use crate::error::CoreResult;
use crate::types::BillingCadence;
use crate::validation::validate_date_range;

/// Whole calendar months touched by `start..=end`.
///
/// Rejects `end < start` with [`crate::CoreError::InvalidDateRange`].
pub fn months_spanned(start: NaiveDate, end: NaiveDate) -> CoreResult<u32> {
    validate_date_range(start, end)?;

    let start_index = start.year() as i64 * 12 + start.month() as i64;
    let end_index = end.year() as i64 * 12 + end.month() as i64;

    // end >= start, so the difference is never negative
    Ok((end_index - start_index + 1) as u32)
}

/// Number of invoices a transaction produces.
///
/// Ranges shorter than one cadence period still produce one invoice, so the
/// count is always at least 1.
///
/// ## Example
/// ```rust
/// use billing_core::schedule::count_periods;
/// use billing_core::BillingCadence;
/// use chrono::NaiveDate;
///
/// let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
/// let end = NaiveDate::from_ymd_opt(2023, 12, 31).unwrap();
/// assert_eq!(count_periods(start, end, BillingCadence::Quarterly).unwrap(), 4);
/// ```
pub fn count_periods(start: NaiveDate, end: NaiveDate, cadence: BillingCadence) -> CoreResult<u32> {
    let months = months_spanned(start, end)?;
    Ok((months / cadence.months()).max(1))
}
