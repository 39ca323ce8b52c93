//! # Validation Module
//!
//! Input validation for customers, contracts and transactions.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Caller (admin tool / HTTP layer)                             │
//! │  ├── Type validation (deserialization, closed enums)                   │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Required fields, lengths, value bounds                            │
//! │  └── Date ranges (end >= start)                                        │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  ├── UNIQUE constraints (customer name, invoice date per contract)    │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDate;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::types::{Address, NewContract, NewCustomer, NewTransaction};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Minimum customer name length.
pub const MIN_CUSTOMER_NAME_LEN: usize = 3;

/// Maximum customer name length.
pub const MAX_CUSTOMER_NAME_LEN: usize = 128;

/// Largest contract or transaction value: $1,000,000,000,000.00.
pub const MAX_VALUE_CENTS: i64 = 100_000_000_000_000;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a customer name.
///
/// ## Rules
/// - At least 3 characters after trimming
/// - At most 128 characters
///
/// ## Example
/// ```rust
/// use billing_core::validation::validate_customer_name;
///
/// assert!(validate_customer_name("Acme Corp").is_ok());
/// assert!(validate_customer_name("AB").is_err());
/// ```
pub fn validate_customer_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    let len = name.chars().count();
    if len < MIN_CUSTOMER_NAME_LEN {
        return Err(ValidationError::TooShort {
            field: "name".to_string(),
            min: MIN_CUSTOMER_NAME_LEN,
        });
    }

    if len > MAX_CUSTOMER_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: MAX_CUSTOMER_NAME_LEN,
        });
    }

    Ok(())
}

fn require(field: &str, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Validates an address. Every field except `address_line_2` is required.
pub fn validate_address(address: &Address) -> ValidationResult<()> {
    require("address_line_1", &address.address_line_1)?;
    require("city", &address.city)?;
    require("state", &address.state)?;
    require("zip_code", &address.zip_code)?;
    require("country", &address.country)?;
    Ok(())
}

// =============================================================================
// Numeric and Date Validators
// =============================================================================

/// Validates that a monetary value is not negative and at most
/// [`MAX_VALUE_CENTS`].
pub fn validate_value(field: &str, cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }
    if cents > MAX_VALUE_CENTS {
        return Err(ValidationError::TooLarge {
            field: field.to_string(),
            max: MAX_VALUE_CENTS,
        });
    }
    Ok(())
}

/// Validates an inclusive date range.
///
/// ## Example
/// ```rust
/// use billing_core::validation::validate_date_range;
/// use chrono::NaiveDate;
///
/// let jan = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
/// let dec = NaiveDate::from_ymd_opt(2023, 12, 31).unwrap();
/// assert!(validate_date_range(jan, dec).is_ok());
/// assert!(validate_date_range(jan, jan).is_ok());
/// assert!(validate_date_range(dec, jan).is_err());
/// ```
pub fn validate_date_range(start: NaiveDate, end: NaiveDate) -> CoreResult<()> {
    if end < start {
        return Err(CoreError::InvalidDateRange { start, end });
    }
    Ok(())
}

// =============================================================================
// Entity Validators
// =============================================================================

/// Validates input for a new customer.
pub fn validate_new_customer(customer: &NewCustomer) -> ValidationResult<()> {
    validate_customer_name(&customer.name)?;
    validate_address(&customer.address)
}

/// Validates input for a new contract.
pub fn validate_new_contract(contract: &NewContract) -> CoreResult<()> {
    require("customer_id", &contract.customer_id)?;
    validate_value("value", contract.value_cents)?;
    validate_date_range(contract.start_date, contract.end_date)
}

/// Validates input for a new transaction.
pub fn validate_new_transaction(transaction: &NewTransaction) -> CoreResult<()> {
    validate_value("value", transaction.value_cents)?;
    validate_date_range(transaction.start_date, transaction.end_date)
}

// =============================================================================
// Unit Tests
// =============================================================================
