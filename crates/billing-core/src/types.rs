//! # Domain Types
//!
//! Core domain types used throughout the billing backend.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────┐ 1   * ┌─────────────┐ 1   * ┌─────────────────┐       │
//! │  │  Customer   │──────►│  Contract   │──────►│  Transaction    │       │
//! │  │  name       │       │  dates      │       │  product        │       │
//! │  │  address    │       │  value      │       │  value, dates   │       │
//! │  └─────────────┘       │  status     │       │  cadence        │       │
//! │                        └──────┬──────┘       └────────┬────────┘       │
//! │                               │ 1                     │ *              │
//! │                               ▼ *                     │                │
//! │                        ┌─────────────┐  *             │                │
//! │                        │  Invoice    │◄───────────────┘                │
//! │                        │  date       │  invoice_transactions           │
//! │                        │  terms      │  (no per-line amount)           │
//! │                        │  amount_due │                                 │
//! │                        └─────────────┘                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every enum here is closed and matched exhaustively; the database stores
//! the snake_case variant name.

use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::money::Money;

/// Generates a new entity identifier (UUID v4).
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Enumerations
// =============================================================================

/// The recurring interval at which a transaction is billed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum BillingCadence {
    #[default]
    Monthly,
    Quarterly,
    Annually,
}

impl BillingCadence {
    /// Length of one billing period in calendar months.
    #[inline]
    pub const fn months(&self) -> u32 {
        match self {
            BillingCadence::Monthly => 1,
            BillingCadence::Quarterly => 3,
            BillingCadence::Annually => 12,
        }
    }

    /// All cadences, in ascending period length.
    pub const ALL: [BillingCadence; 3] = [
        BillingCadence::Monthly,
        BillingCadence::Quarterly,
        BillingCadence::Annually,
    ];
}

/// What a transaction sells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum ProductType {
    /// Request for quote.
    Rfq,
    Implementation,
    /// Core subscription.
    Core,
    /// Fullsuite subscription.
    Fullsuite,
}

impl ProductType {
    /// Human-readable product name.
    pub const fn label(&self) -> &'static str {
        match self {
            ProductType::Rfq => "request for quote",
            ProductType::Implementation => "implementation",
            ProductType::Core => "core subscription",
            ProductType::Fullsuite => "fullsuite subscription",
        }
    }
}

/// Lifecycle status of a contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum ContractStatus {
    #[default]
    Draft,
    Pending,
    Active,
    Expired,
    Cancelled,
    Renewed,
    Upgraded,
}

/// When an invoice must be paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[ts(export)]
pub enum PaymentTerms {
    #[default]
    #[serde(rename = "due_upon_receipt")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "due_upon_receipt"))]
    DueUponReceipt,
    #[serde(rename = "net_7")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "net_7"))]
    Net7,
    #[serde(rename = "net_15")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "net_15"))]
    Net15,
    #[serde(rename = "net_30")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "net_30"))]
    Net30,
}

impl PaymentTerms {
    /// Days between the invoice date and the due date.
    pub const fn net_days(&self) -> u64 {
        match self {
            PaymentTerms::DueUponReceipt => 0,
            PaymentTerms::Net7 => 7,
            PaymentTerms::Net15 => 15,
            PaymentTerms::Net30 => 30,
        }
    }

    /// Due date of an invoice issued on `invoice_date`.
    pub fn due_date(&self, invoice_date: NaiveDate) -> NaiveDate {
        invoice_date
            .checked_add_days(Days::new(self.net_days()))
            .unwrap_or(NaiveDate::MAX)
    }
}

// =============================================================================
// Customer
// =============================================================================

/// Postal address of a customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Address {
    pub address_line_1: String,
    pub address_line_2: Option<String>,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
}

/// A billed organisation.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Customer {
    pub id: String,
    /// Unique display name.
    pub name: String,
    pub is_active: bool,
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    pub address: Address,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a customer.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewCustomer {
    pub name: String,
    pub address: Address,
}

/// Partial address update; `None` keeps the stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AddressChanges {
    pub address_line_1: Option<String>,
    pub address_line_2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub country: Option<String>,
}

impl AddressChanges {
    /// Applies the changes on top of `address`.
    pub fn apply_to(self, address: &mut Address) {
        if let Some(v) = self.address_line_1 {
            address.address_line_1 = v;
        }
        if let Some(v) = self.address_line_2 {
            address.address_line_2 = Some(v);
        }
        if let Some(v) = self.city {
            address.city = v;
        }
        if let Some(v) = self.state {
            address.state = v;
        }
        if let Some(v) = self.zip_code {
            address.zip_code = v;
        }
        if let Some(v) = self.country {
            address.country = v;
        }
    }
}

/// Partial customer update.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CustomerChanges {
    pub name: Option<String>,
    pub address: Option<AddressChanges>,
}

// =============================================================================
// Contract
// =============================================================================

/// An agreement with a customer, made up of transactions.
///
/// The transactions' values are expected to sum to `value_cents`; this is
/// reported, not enforced.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Contract {
    pub id: String,
    pub customer_id: String,
    #[ts(as = "String")]
    pub start_date: NaiveDate,
    #[ts(as = "String")]
    pub end_date: NaiveDate,
    pub value_cents: i64,
    pub status: ContractStatus,
    /// Bumped by every invoicing run; serializes concurrent runs.
    pub invoice_revision: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Contract {
    /// Returns the contract value as Money.
    #[inline]
    pub fn value(&self) -> Money {
        Money::from_cents(self.value_cents)
    }
}

/// Input for creating a contract.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewContract {
    pub customer_id: String,
    #[ts(as = "String")]
    pub start_date: NaiveDate,
    #[ts(as = "String")]
    pub end_date: NaiveDate,
    pub value_cents: i64,
}

/// Partial contract update.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ContractChanges {
    pub customer_id: Option<String>,
    #[ts(as = "Option<String>")]
    pub start_date: Option<NaiveDate>,
    #[ts(as = "Option<String>")]
    pub end_date: Option<NaiveDate>,
    pub status: Option<ContractStatus>,
    pub value_cents: Option<i64>,
}

// =============================================================================
// Transaction
// =============================================================================

/// One billable line of a contract.
///
/// Editing value, dates or cadence invalidates the contract's derived
/// invoice schedule until the contract is reconciled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Transaction {
    pub id: String,
    pub contract_id: String,
    pub product: ProductType,
    pub value_cents: i64,
    /// First day covered (inclusive).
    #[ts(as = "String")]
    pub start_date: NaiveDate,
    /// Last day covered (inclusive).
    #[ts(as = "String")]
    pub end_date: NaiveDate,
    pub billing_cadence: BillingCadence,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    /// Returns the transaction value as Money.
    #[inline]
    pub fn value(&self) -> Money {
        Money::from_cents(self.value_cents)
    }
}

/// Input for creating a transaction under a contract.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewTransaction {
    pub product: ProductType,
    pub value_cents: i64,
    #[ts(as = "String")]
    pub start_date: NaiveDate,
    #[ts(as = "String")]
    pub end_date: NaiveDate,
    #[serde(default)]
    pub billing_cadence: BillingCadence,
}

/// Partial transaction update.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TransactionChanges {
    pub contract_id: Option<String>,
    pub product: Option<ProductType>,
    pub value_cents: Option<i64>,
    #[ts(as = "Option<String>")]
    pub start_date: Option<NaiveDate>,
    #[ts(as = "Option<String>")]
    pub end_date: Option<NaiveDate>,
    pub billing_cadence: Option<BillingCadence>,
}

// =============================================================================
// Invoice
// =============================================================================

/// A persisted invoice: a cached materialization of one schedule date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Invoice {
    pub id: String,
    pub contract_id: String,
    pub customer_id: String,
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub payment_terms: PaymentTerms,
    pub amount_due_cents: i64,
    /// Contributing transactions, loaded from `invoice_transactions`.
    #[cfg_attr(feature = "sqlx", sqlx(skip))]
    pub transaction_ids: Vec<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Invoice {
    /// Returns the amount due as Money.
    #[inline]
    pub fn amount_due(&self) -> Money {
        Money::from_cents(self.amount_due_cents)
    }

    /// Date by which the invoice must be paid.
    pub fn due_date(&self) -> NaiveDate {
        self.payment_terms.due_date(self.date)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
