//! # Admin Error Type
//!
//! What the operator sees when a command fails.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in billing-admin                          │
//! │                                                                         │
//! │  ConfigError ──────────────────────┐                                    │
//! │  CoreError ────────────────────────┤                                    │
//! │  DbError ──────────────────────────┼──► AdminError { code, message }   │
//! │  ServiceError (Core | Db) ─────────┘            │                       │
//! │                                                 ├──► stderr (JSON)      │
//! │                                                 └──► exit status        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Internal failures are logged in full and reported with a generic
//! message; everything the operator can act on keeps its detail.

use billing_core::CoreError;
use billing_db::{DbError, ServiceError};
use serde::Serialize;

use crate::config::ConfigError;

/// Error returned from admin commands.
///
/// ## Serialization
/// ```json
/// {
///   "code": "DUPLICATE_INVOICING",
///   "message": "Contract c-1 already has 12 invoice(s); reconcile instead of creating"
/// }
/// ```
#[derive(Debug, Clone, Serialize, thiserror::Error)]
#[serde(rename_all = "camelCase")]
#[error("{message}")]
pub struct AdminError {
    /// Machine-readable error code
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,
}

/// Error codes for failed commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Resource not found (404)
    NotFound,

    /// Input validation failed (400)
    ValidationError,

    /// A date range ends before it starts (400)
    InvalidDateRange,

    /// Contract already invoiced; reconcile instead (409)
    DuplicateInvoicing,

    /// Uniqueness conflict (409)
    Conflict,

    /// Database operation failed (500)
    DatabaseError,

    /// Configuration could not be loaded (500)
    ConfigError,

    /// Internal error (500)
    Internal,
}

impl ErrorCode {
    /// HTTP-style status for the code.
    pub fn status_code(self) -> u16 {
        match self {
            ErrorCode::NotFound => 404,
            ErrorCode::ValidationError | ErrorCode::InvalidDateRange => 400,
            ErrorCode::DuplicateInvoicing | ErrorCode::Conflict => 409,
            ErrorCode::DatabaseError | ErrorCode::ConfigError | ErrorCode::Internal => 500,
        }
    }

    /// Process exit status. 2 is left to clap for usage errors.
    pub fn exit_code(self) -> u8 {
        match self {
            ErrorCode::Internal => 1,
            ErrorCode::ValidationError | ErrorCode::InvalidDateRange => 3,
            ErrorCode::NotFound => 4,
            ErrorCode::DuplicateInvoicing | ErrorCode::Conflict => 5,
            ErrorCode::DatabaseError => 6,
            ErrorCode::ConfigError => 7,
        }
    }
}

impl AdminError {
    /// Creates a new admin error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        AdminError {
            code,
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: &str) -> Self {
        AdminError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        AdminError::new(ErrorCode::Internal, message)
    }
}

/// Converts database errors to admin errors.
impl From<DbError> for AdminError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => AdminError::not_found(&entity, &id),
            DbError::UniqueViolation { field, value } => AdminError::new(
                ErrorCode::Conflict,
                format!("{} '{}' already exists", field, value),
            ),
            DbError::ForeignKeyViolation { message } => {
                tracing::error!("Foreign key violation: {}", message);
                AdminError::new(ErrorCode::ValidationError, "Invalid reference")
            }
            DbError::ConnectionFailed(e) => {
                tracing::error!("Database connection failed: {}", e);
                AdminError::new(ErrorCode::DatabaseError, "Database connection failed")
            }
            DbError::MigrationFailed(e) => {
                tracing::error!("Database migration failed: {}", e);
                AdminError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            DbError::QueryFailed(e) => {
                tracing::error!("Database query failed: {}", e);
                AdminError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::TransactionFailed(e) => {
                tracing::error!("Transaction failed: {}", e);
                AdminError::new(ErrorCode::DatabaseError, "Database transaction failed")
            }
            DbError::PoolExhausted => {
                AdminError::new(ErrorCode::DatabaseError, "Database pool exhausted")
            }
            DbError::Internal(e) => {
                tracing::error!("Internal database error: {}", e);
                AdminError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

/// Converts core errors to admin errors.
impl From<CoreError> for AdminError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidDateRange { .. } => {
                AdminError::new(ErrorCode::InvalidDateRange, err.to_string())
            }
            CoreError::DuplicateInvoicing { .. } => {
                AdminError::new(ErrorCode::DuplicateInvoicing, err.to_string())
            }
            CoreError::Validation(e) => AdminError::new(ErrorCode::ValidationError, e.to_string()),
            CoreError::AmountOverflow => {
                AdminError::new(ErrorCode::ValidationError, err.to_string())
            }
            CoreError::EmptyApportionment => {
                tracing::error!("Schedule derivation failed: {}", err);
                AdminError::internal("Invoice schedule could not be derived")
            }
        }
    }
}

impl From<ServiceError> for AdminError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Core(e) => e.into(),
            ServiceError::Db(e) => e.into(),
        }
    }
}

impl From<ConfigError> for AdminError {
    fn from(err: ConfigError) -> Self {
        AdminError::new(ErrorCode::ConfigError, err.to_string())
    }
}

impl From<serde_json::Error> for AdminError {
    fn from(err: serde_json::Error) -> Self {
        tracing::error!("Output serialization failed: {}", err);
        AdminError::internal("Output could not be serialized")
    }
}

/// Result type for admin commands.
pub type AdminResult<T> = Result<T, AdminError>;
