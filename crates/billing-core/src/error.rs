//! # Error Types
//!
//! Domain-specific error types for billing-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  billing-core errors (this file)                                       │
//! │  ├── CoreError        - Domain rule failures                           │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  billing-db errors (separate crate)                                    │
//! │  ├── DbError          - Database operation failures                    │
//! │  └── ServiceError     - CoreError | DbError from an invoicing run      │
//! │                                                                         │
//! │  billing-admin errors (app)                                            │
//! │  └── AdminError       - What the operator sees (code + status)         │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ServiceError → AdminError         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDate;
use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A date range ends before it starts.
    ///
    /// ## When This Occurs
    /// - A transaction is created or edited with `end_date < start_date`
    /// - A contract is created or edited with `end_date < start_date`
    /// - Schedule derivation meets such a transaction (rejected before
    ///   any period counting happens)
    #[error("Invalid date range: end {end} is before start {start}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    /// Invoices already exist for the contract.
    ///
    /// ## User Workflow
    /// ```text
    /// create_invoices(contract)
    ///      │
    ///      ▼
    /// existing invoices: 12
    ///      │
    ///      ▼
    /// DuplicateInvoicing ──► caller uses reconcile_invoices instead
    /// ```
    #[error(
        "Contract {contract_id} already has {existing} invoice(s); reconcile instead of creating"
    )]
    DuplicateInvoicing { contract_id: String, existing: usize },

    /// A value was asked to be split across zero periods.
    #[error("Cannot apportion an amount across zero periods")]
    EmptyApportionment,

    /// Adding amounts left the representable range.
    ///
    /// ## When This Occurs
    /// - Stored transaction values bypassed the per-value limit and their
    ///   sum no longer fits in 64-bit cents
    #[error("Amount total exceeds the supported range")]
    AmountOverflow,

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too short.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Value is above the accepted maximum (in cents).
    #[error("{field} must not exceed {max} cents")]
    TooLarge { field: String, max: i64 },

    /// Invalid format (e.g., unparseable amount).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;
