//! # Transaction Repository
//!
//! Database operations for contract transactions (billable lines).
//!
//! None of these operations touch invoices. After creating, editing or
//! deleting transactions, the caller reconciles the affected contract(s)
//! through the invoicing service.

use billing_core::validation::{validate_date_range, validate_new_transaction, validate_value};
use billing_core::{new_id, CoreError, Invoice, Money, NewTransaction, Transaction, TransactionChanges};
use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult, ServiceResult};
use crate::repository::{contract, invoice};

const SELECT_TRANSACTION: &str = r#"
    SELECT
        id, contract_id, product, value_cents, start_date, end_date,
        billing_cadence, created_at, updated_at
    FROM transactions
"#;

pub(crate) async fn fetch_transaction(
    conn: &mut SqliteConnection,
    id: &str,
) -> DbResult<Option<Transaction>> {
    let transaction =
        sqlx::query_as::<_, Transaction>(&format!("{SELECT_TRANSACTION} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(conn)
            .await?;
    Ok(transaction)
}

/// Transactions of a contract in creation order, which is also the order
/// their lines appear within one invoice date.
pub(crate) async fn fetch_for_contract(
    conn: &mut SqliteConnection,
    contract_id: &str,
) -> DbResult<Vec<Transaction>> {
    let transactions = sqlx::query_as::<_, Transaction>(&format!(
        "{SELECT_TRANSACTION} WHERE contract_id = ?1 ORDER BY created_at, rowid"
    ))
    .bind(contract_id)
    .fetch_all(conn)
    .await?;
    Ok(transactions)
}

async fn insert_transaction(conn: &mut SqliteConnection, transaction: &Transaction) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO transactions (
            id, contract_id, product, value_cents, start_date, end_date,
            billing_cadence, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
    )
    .bind(&transaction.id)
    .bind(&transaction.contract_id)
    .bind(transaction.product)
    .bind(transaction.value_cents)
    .bind(transaction.start_date)
    .bind(transaction.end_date)
    .bind(transaction.billing_cadence)
    .bind(transaction.created_at)
    .bind(transaction.updated_at)
    .execute(conn)
    .await?;
    Ok(())
}

/// Repository for transaction database operations.
#[derive(Debug, Clone)]
pub struct TransactionRepository {
    pool: SqlitePool,
}

impl TransactionRepository {
    /// Creates a new TransactionRepository.
    pub fn new(pool: SqlitePool) -> Self {
        TransactionRepository { pool }
    }

    /// Adds a batch of transactions to a contract, all or nothing.
    ///
    /// Every entry is validated before anything is written. If the
    /// contract's transactions no longer sum to the contract value a warning
    /// is logged; the batch is still stored.
    pub async fn create_batch(
        &self,
        contract_id: &str,
        batch: Vec<NewTransaction>,
    ) -> ServiceResult<Vec<Transaction>> {
        for new in &batch {
            validate_new_transaction(new)?;
        }

        let mut tx = self.pool.begin().await?;
        let contract = contract::fetch_contract(&mut tx, contract_id)
            .await?
            .ok_or_else(|| DbError::not_found("Contract", contract_id))?;

        let now = Utc::now();
        let mut created = Vec::with_capacity(batch.len());
        for new in batch {
            let transaction = Transaction {
                id: new_id(),
                contract_id: contract.id.clone(),
                product: new.product,
                value_cents: new.value_cents,
                start_date: new.start_date,
                end_date: new.end_date,
                billing_cadence: new.billing_cadence,
                created_at: now,
                updated_at: now,
            };
            debug!(
                transaction_id = %transaction.id,
                product = ?transaction.product,
                "Inserting transaction"
            );
            insert_transaction(&mut tx, &transaction).await?;
            created.push(transaction);
        }

        let stored = fetch_for_contract(&mut tx, contract_id).await?;
        let total = Money::checked_sum(stored.iter().map(Transaction::value))
            .ok_or(CoreError::AmountOverflow)?;
        tx.commit().await?;

        if total != contract.value() {
            warn!(
                contract_id = %contract_id,
                transactions_total = %total,
                contract_value = %contract.value(),
                "Transaction values do not sum to the contract value"
            );
        }

        info!(contract_id = %contract_id, count = created.len(), "Transactions created");
        Ok(created)
    }

    /// Gets a transaction by ID.
    pub async fn get(&self, id: &str) -> DbResult<Option<Transaction>> {
        let mut conn = self.pool.acquire().await?;
        fetch_transaction(&mut conn, id).await
    }

    /// Lists all transactions.
    pub async fn list(&self) -> DbResult<Vec<Transaction>> {
        let transactions = sqlx::query_as::<_, Transaction>(&format!(
            "{SELECT_TRANSACTION} ORDER BY contract_id, created_at, rowid"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(transactions)
    }

    /// Applies a partial update.
    ///
    /// Moving a transaction to another contract leaves both contracts'
    /// invoices stale until each is reconciled.
    pub async fn update(&self, id: &str, changes: TransactionChanges) -> ServiceResult<Transaction> {
        let mut tx = self.pool.begin().await?;
        let mut transaction = fetch_transaction(&mut tx, id)
            .await?
            .ok_or_else(|| DbError::not_found("Transaction", id))?;

        if let Some(contract_id) = changes.contract_id {
            if contract_id != transaction.contract_id {
                if contract::fetch_contract(&mut tx, &contract_id).await?.is_none() {
                    return Err(DbError::not_found("Contract", contract_id).into());
                }
                transaction.contract_id = contract_id;
            }
        }
        if let Some(product) = changes.product {
            transaction.product = product;
        }
        if let Some(value_cents) = changes.value_cents {
            transaction.value_cents = value_cents;
        }
        if let Some(start_date) = changes.start_date {
            transaction.start_date = start_date;
        }
        if let Some(end_date) = changes.end_date {
            transaction.end_date = end_date;
        }
        if let Some(cadence) = changes.billing_cadence {
            transaction.billing_cadence = cadence;
        }

        validate_value("value", transaction.value_cents)?;
        validate_date_range(transaction.start_date, transaction.end_date)?;
        transaction.updated_at = Utc::now();

        debug!(transaction_id = %id, "Updating transaction");

        sqlx::query(
            r#"
            UPDATE transactions SET
                contract_id = ?2,
                product = ?3,
                value_cents = ?4,
                start_date = ?5,
                end_date = ?6,
                billing_cadence = ?7,
                updated_at = ?8
            WHERE id = ?1
            "#,
        )
        .bind(&transaction.id)
        .bind(&transaction.contract_id)
        .bind(transaction.product)
        .bind(transaction.value_cents)
        .bind(transaction.start_date)
        .bind(transaction.end_date)
        .bind(transaction.billing_cadence)
        .bind(transaction.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(transaction)
    }

    /// Deletes a transaction and returns the id of the contract it belonged
    /// to, so the caller can reconcile that contract.
    pub async fn delete(&self, id: &str) -> DbResult<String> {
        let contract_id: Option<String> =
            sqlx::query_scalar("DELETE FROM transactions WHERE id = ?1 RETURNING contract_id")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        let contract_id = contract_id.ok_or_else(|| DbError::not_found("Transaction", id))?;
        info!(transaction_id = %id, contract_id = %contract_id, "Transaction deleted");
        Ok(contract_id)
    }

    /// Invoices this transaction currently contributes to.
    pub async fn invoices(&self, id: &str) -> DbResult<Vec<Invoice>> {
        let mut conn = self.pool.acquire().await?;
        invoice::fetch_for_transaction(&mut conn, id).await
    }
}
