//! # Contract Repository
//!
//! Database operations for contracts.
//!
//! ## Invoice Revision
//! ```text
//! contracts.invoice_revision
//!      0 ──create_invoices──► 1 ──reconcile──► 2 ──reconcile──► 3
//! ```
//! Every invoicing run bumps the revision as its first statement. The bump
//! is a write, so it takes SQLite's write lock before the run reads
//! anything, and a rolled-back run leaves the revision untouched.

use billing_core::validation::{validate_date_range, validate_new_contract, validate_value};
use billing_core::{new_id, Contract, ContractChanges, ContractStatus, Invoice, NewContract, Transaction};
use chrono::Utc;
use sqlx::{FromRow, SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult, ServiceResult};
use crate::repository::{customer, invoice, transaction};

const SELECT_CONTRACT: &str = r#"
    SELECT
        id, customer_id, start_date, end_date, value_cents, status,
        invoice_revision, created_at, updated_at
    FROM contracts
"#;

pub(crate) async fn fetch_contract(
    conn: &mut SqliteConnection,
    id: &str,
) -> DbResult<Option<Contract>> {
    let contract = sqlx::query_as::<_, Contract>(&format!("{SELECT_CONTRACT} WHERE id = ?1"))
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(contract)
}

pub(crate) async fn fetch_for_customer(
    conn: &mut SqliteConnection,
    customer_id: &str,
) -> DbResult<Vec<Contract>> {
    let contracts = sqlx::query_as::<_, Contract>(&format!(
        "{SELECT_CONTRACT} WHERE customer_id = ?1 ORDER BY start_date, created_at"
    ))
    .bind(customer_id)
    .fetch_all(conn)
    .await?;
    Ok(contracts)
}

/// What an invoicing run learns from claiming its contract.
#[derive(Debug, Clone, FromRow)]
pub(crate) struct InvoicingClaim {
    pub customer_id: String,
    pub invoice_revision: i64,
}

/// Bumps the contract's invoice revision. `None` if the contract is missing.
pub(crate) async fn claim_for_invoicing(
    conn: &mut SqliteConnection,
    id: &str,
) -> DbResult<Option<InvoicingClaim>> {
    let claim = sqlx::query_as::<_, InvoicingClaim>(
        r#"
        UPDATE contracts
        SET invoice_revision = invoice_revision + 1
        WHERE id = ?1
        RETURNING customer_id, invoice_revision
        "#,
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;
    Ok(claim)
}

/// Repository for contract database operations.
#[derive(Debug, Clone)]
pub struct ContractRepository {
    pool: SqlitePool,
}

impl ContractRepository {
    /// Creates a new ContractRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ContractRepository { pool }
    }

    /// Creates a draft contract for an existing customer.
    pub async fn create(&self, new: NewContract) -> ServiceResult<Contract> {
        validate_new_contract(&new)?;

        let mut conn = self.pool.acquire().await?;
        if customer::fetch_customer(&mut conn, &new.customer_id)
            .await?
            .is_none()
        {
            return Err(DbError::not_found("Customer", new.customer_id).into());
        }

        let now = Utc::now();
        let contract = Contract {
            id: new_id(),
            customer_id: new.customer_id,
            start_date: new.start_date,
            end_date: new.end_date,
            value_cents: new.value_cents,
            status: ContractStatus::Draft,
            invoice_revision: 0,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO contracts (
                id, customer_id, start_date, end_date, value_cents, status,
                invoice_revision, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&contract.id)
        .bind(&contract.customer_id)
        .bind(contract.start_date)
        .bind(contract.end_date)
        .bind(contract.value_cents)
        .bind(contract.status)
        .bind(contract.invoice_revision)
        .bind(contract.created_at)
        .bind(contract.updated_at)
        .execute(&mut *conn)
        .await?;

        info!(
            contract_id = %contract.id,
            customer_id = %contract.customer_id,
            value = %contract.value(),
            "Contract created"
        );
        Ok(contract)
    }

    /// Gets a contract by ID.
    pub async fn get(&self, id: &str) -> DbResult<Option<Contract>> {
        let mut conn = self.pool.acquire().await?;
        fetch_contract(&mut conn, id).await
    }

    /// Lists all contracts.
    pub async fn list(&self) -> DbResult<Vec<Contract>> {
        let contracts = sqlx::query_as::<_, Contract>(&format!(
            "{SELECT_CONTRACT} ORDER BY start_date, created_at"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(contracts)
    }

    /// Lists the contracts of one customer.
    pub async fn list_for_customer(&self, customer_id: &str) -> DbResult<Vec<Contract>> {
        let mut conn = self.pool.acquire().await?;
        fetch_for_customer(&mut conn, customer_id).await
    }

    /// Applies a partial update.
    ///
    /// Moving a contract to another customer moves its invoices along.
    /// Changing dates or value does not touch invoices; those follow the
    /// transactions and change on the next reconciliation.
    pub async fn update(&self, id: &str, changes: ContractChanges) -> ServiceResult<Contract> {
        let mut tx = self.pool.begin().await?;
        let mut contract = fetch_contract(&mut tx, id)
            .await?
            .ok_or_else(|| DbError::not_found("Contract", id))?;

        let mut customer_changed = false;
        if let Some(customer_id) = changes.customer_id {
            if customer_id != contract.customer_id {
                if customer::fetch_customer(&mut tx, &customer_id).await?.is_none() {
                    return Err(DbError::not_found("Customer", customer_id).into());
                }
                contract.customer_id = customer_id;
                customer_changed = true;
            }
        }
        if let Some(start_date) = changes.start_date {
            contract.start_date = start_date;
        }
        if let Some(end_date) = changes.end_date {
            contract.end_date = end_date;
        }
        if let Some(status) = changes.status {
            contract.status = status;
        }
        if let Some(value_cents) = changes.value_cents {
            contract.value_cents = value_cents;
        }

        validate_date_range(contract.start_date, contract.end_date)?;
        validate_value("value", contract.value_cents)?;
        contract.updated_at = Utc::now();

        debug!(contract_id = %id, customer_changed, "Updating contract");

        sqlx::query(
            r#"
            UPDATE contracts SET
                customer_id = ?2,
                start_date = ?3,
                end_date = ?4,
                value_cents = ?5,
                status = ?6,
                updated_at = ?7
            WHERE id = ?1
            "#,
        )
        .bind(&contract.id)
        .bind(&contract.customer_id)
        .bind(contract.start_date)
        .bind(contract.end_date)
        .bind(contract.value_cents)
        .bind(contract.status)
        .bind(contract.updated_at)
        .execute(&mut *tx)
        .await?;

        if customer_changed {
            sqlx::query("UPDATE invoices SET customer_id = ?2, updated_at = ?3 WHERE contract_id = ?1")
                .bind(&contract.id)
                .bind(&contract.customer_id)
                .bind(contract.updated_at)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(contract)
    }

    /// Deletes a contract with its transactions and invoices.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM contracts WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Contract", id));
        }

        info!(contract_id = %id, "Contract deleted");
        Ok(())
    }

    /// Transactions of a contract, in creation order.
    pub async fn transactions(&self, id: &str) -> DbResult<Vec<Transaction>> {
        let mut conn = self.pool.acquire().await?;
        transaction::fetch_for_contract(&mut conn, id).await
    }

    /// Persisted invoices of a contract, by date.
    pub async fn invoices(&self, id: &str) -> DbResult<Vec<Invoice>> {
        let mut conn = self.pool.acquire().await?;
        invoice::fetch_for_contract(&mut conn, id).await
    }
}
