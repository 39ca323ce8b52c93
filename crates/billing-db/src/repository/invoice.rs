//! # Invoice Repository
//!
//! Database operations for persisted invoices and their links to
//! contributing transactions.
//!
//! ## Storage
//! ```text
//! invoices                          invoice_transactions
//! ┌────────┬────────────┬───────┐   ┌────────────┬────────────────┐
//! │ id     │ date       │ due   │   │ invoice_id │ transaction_id │
//! ├────────┼────────────┼───────┤   ├────────────┼────────────────┤
//! │ inv-1  │ 2023-03-01 │ 15000 │──►│ inv-1      │ core           │
//! │        │            │       │   │ inv-1      │ impl           │
//! └────────┴────────────┴───────┘   └────────────┴────────────────┘
//! ```
//! Links carry no amount, so an invoice's per-transaction split is only
//! recoverable by re-deriving the schedule from the current transactions.
//!
//! Amounts and links are written by the invoicing service. This repository
//! only exposes reads, payment terms and deletion.

use billing_core::{Invoice, InvoiceDraft, InvoiceUpdate, PaymentTerms, Transaction};
use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};

const SELECT_INVOICE: &str = r#"
    SELECT
        id, contract_id, customer_id, date, payment_terms, amount_due_cents,
        created_at, updated_at
    FROM invoices
"#;

/// Fills `transaction_ids` from `invoice_transactions`, in link order.
async fn load_links(conn: &mut SqliteConnection, invoices: &mut [Invoice]) -> DbResult<()> {
    for invoice in invoices.iter_mut() {
        invoice.transaction_ids = sqlx::query_scalar(
            "SELECT transaction_id FROM invoice_transactions WHERE invoice_id = ?1 ORDER BY rowid",
        )
        .bind(&invoice.id)
        .fetch_all(&mut *conn)
        .await?;
    }
    Ok(())
}

async fn fetch_where(
    conn: &mut SqliteConnection,
    filter: &str,
    value: &str,
) -> DbResult<Vec<Invoice>> {
    let mut invoices = sqlx::query_as::<_, Invoice>(&format!(
        "{SELECT_INVOICE} WHERE {filter} ORDER BY date, created_at"
    ))
    .bind(value)
    .fetch_all(&mut *conn)
    .await?;
    load_links(conn, &mut invoices).await?;
    Ok(invoices)
}

pub(crate) async fn fetch_invoice(
    conn: &mut SqliteConnection,
    id: &str,
) -> DbResult<Option<Invoice>> {
    let mut invoices = fetch_where(conn, "id = ?1", id).await?;
    Ok(invoices.pop())
}

pub(crate) async fn fetch_for_contract(
    conn: &mut SqliteConnection,
    contract_id: &str,
) -> DbResult<Vec<Invoice>> {
    fetch_where(conn, "contract_id = ?1", contract_id).await
}

pub(crate) async fn fetch_for_customer(
    conn: &mut SqliteConnection,
    customer_id: &str,
) -> DbResult<Vec<Invoice>> {
    fetch_where(conn, "customer_id = ?1", customer_id).await
}

pub(crate) async fn fetch_for_transaction(
    conn: &mut SqliteConnection,
    transaction_id: &str,
) -> DbResult<Vec<Invoice>> {
    fetch_where(
        conn,
        "id IN (SELECT invoice_id FROM invoice_transactions WHERE transaction_id = ?1)",
        transaction_id,
    )
    .await
}

async fn link_transactions(
    conn: &mut SqliteConnection,
    invoice_id: &str,
    transaction_ids: &[String],
) -> DbResult<()> {
    for transaction_id in transaction_ids {
        sqlx::query("INSERT INTO invoice_transactions (invoice_id, transaction_id) VALUES (?1, ?2)")
            .bind(invoice_id)
            .bind(transaction_id)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

/// Inserts a scheduled invoice and its transaction links.
pub(crate) async fn insert_invoice(
    conn: &mut SqliteConnection,
    contract_id: &str,
    customer_id: &str,
    draft: &InvoiceDraft,
) -> DbResult<Invoice> {
    let now = Utc::now();
    let invoice = Invoice {
        id: billing_core::new_id(),
        contract_id: contract_id.to_string(),
        customer_id: customer_id.to_string(),
        date: draft.date,
        payment_terms: draft.payment_terms,
        amount_due_cents: draft.amount_due.cents(),
        transaction_ids: draft.transaction_ids.clone(),
        created_at: now,
        updated_at: now,
    };

    debug!(contract_id, date = %invoice.date, amount_due = %draft.amount_due, "Inserting invoice");

    sqlx::query(
        r#"
        INSERT INTO invoices (
            id, contract_id, customer_id, date, payment_terms, amount_due_cents,
            created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
    )
    .bind(&invoice.id)
    .bind(&invoice.contract_id)
    .bind(&invoice.customer_id)
    .bind(invoice.date)
    .bind(invoice.payment_terms)
    .bind(invoice.amount_due_cents)
    .bind(invoice.created_at)
    .bind(invoice.updated_at)
    .execute(&mut *conn)
    .await?;

    link_transactions(conn, &invoice.id, &invoice.transaction_ids).await?;
    Ok(invoice)
}

/// Rewrites an invoice's amount due and replaces its transaction links.
pub(crate) async fn apply_update(conn: &mut SqliteConnection, update: &InvoiceUpdate) -> DbResult<()> {
    debug!(
        invoice_id = %update.invoice_id,
        amount_due = %update.amount_due,
        "Updating invoice"
    );

    let result = sqlx::query("UPDATE invoices SET amount_due_cents = ?2, updated_at = ?3 WHERE id = ?1")
        .bind(&update.invoice_id)
        .bind(update.amount_due.cents())
        .bind(Utc::now())
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Invoice", &update.invoice_id));
    }

    sqlx::query("DELETE FROM invoice_transactions WHERE invoice_id = ?1")
        .bind(&update.invoice_id)
        .execute(&mut *conn)
        .await?;
    link_transactions(conn, &update.invoice_id, &update.transaction_ids).await
}

/// Deletes an invoice; its links go with it.
pub(crate) async fn delete_invoice(conn: &mut SqliteConnection, id: &str) -> DbResult<()> {
    let result = sqlx::query("DELETE FROM invoices WHERE id = ?1")
        .bind(id)
        .execute(conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Invoice", id));
    }
    Ok(())
}

/// Repository for invoice database operations.
#[derive(Debug, Clone)]
pub struct InvoiceRepository {
    pool: SqlitePool,
}

impl InvoiceRepository {
    /// Creates a new InvoiceRepository.
    pub fn new(pool: SqlitePool) -> Self {
        InvoiceRepository { pool }
    }

    /// Gets an invoice with its contributing transaction ids.
    pub async fn get(&self, id: &str) -> DbResult<Option<Invoice>> {
        let mut conn = self.pool.acquire().await?;
        fetch_invoice(&mut conn, id).await
    }

    /// Lists all invoices by date.
    pub async fn list(&self) -> DbResult<Vec<Invoice>> {
        let mut conn = self.pool.acquire().await?;
        let mut invoices =
            sqlx::query_as::<_, Invoice>(&format!("{SELECT_INVOICE} ORDER BY date, created_at"))
                .fetch_all(&mut *conn)
                .await?;
        load_links(&mut conn, &mut invoices).await?;
        Ok(invoices)
    }

    /// Lists the invoices of one contract by date.
    pub async fn list_for_contract(&self, contract_id: &str) -> DbResult<Vec<Invoice>> {
        let mut conn = self.pool.acquire().await?;
        fetch_for_contract(&mut conn, contract_id).await
    }

    /// Changes when an invoice must be paid.
    ///
    /// Reconciliation never resets payment terms.
    pub async fn set_payment_terms(&self, id: &str, terms: PaymentTerms) -> DbResult<Invoice> {
        let mut conn = self.pool.acquire().await?;
        let result = sqlx::query("UPDATE invoices SET payment_terms = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(terms)
            .bind(Utc::now())
            .execute(&mut *conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Invoice", id));
        }

        info!(invoice_id = %id, payment_terms = ?terms, "Payment terms changed");
        fetch_invoice(&mut conn, id)
            .await?
            .ok_or_else(|| DbError::not_found("Invoice", id))
    }

    /// Deletes one invoice.
    ///
    /// The next reconciliation recreates it if its date is still scheduled.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let mut conn = self.pool.acquire().await?;
        delete_invoice(&mut conn, id).await?;
        info!(invoice_id = %id, "Invoice deleted");
        Ok(())
    }

    /// The transactions linked to an invoice.
    pub async fn transactions(&self, id: &str) -> DbResult<Vec<Transaction>> {
        let transactions = sqlx::query_as::<_, Transaction>(
            r#"
            SELECT
                t.id, t.contract_id, t.product, t.value_cents, t.start_date, t.end_date,
                t.billing_cadence, t.created_at, t.updated_at
            FROM transactions t
            JOIN invoice_transactions it ON it.transaction_id = t.id
            WHERE it.invoice_id = ?1
            ORDER BY it.rowid
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;
        Ok(transactions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{database, date, seed_invoiced_contract};

    #[tokio::test]
    async fn test_links_load_in_order() {
        let db = database().await;
        let (contract, transactions) = seed_invoiced_contract(&db).await;

        let invoices = db.invoices().list_for_contract(&contract.id).await.unwrap();
        assert_eq!(invoices.len(), 12);

        let january = &invoices[0];
        assert_eq!(january.date, date(2023, 1, 1));
        assert_eq!(
            january.transaction_ids,
            vec![transactions[0].id.clone(), transactions[1].id.clone()]
        );
        assert_eq!(january.amount_due_cents, 10_000 + 10_000);

        let linked = db.invoices().transactions(&january.id).await.unwrap();
        assert_eq!(linked.len(), 2);
        assert_eq!(linked[0].id, transactions[0].id);
    }

    #[tokio::test]
    async fn test_set_payment_terms() {
        let db = database().await;
        let (contract, _) = seed_invoiced_contract(&db).await;
        let invoice = db.invoices().list_for_contract(&contract.id).await.unwrap().remove(0);
        assert_eq!(invoice.payment_terms, PaymentTerms::DueUponReceipt);

        let changed = db
            .invoices()
            .set_payment_terms(&invoice.id, PaymentTerms::Net30)
            .await
            .unwrap();
        assert_eq!(changed.payment_terms, PaymentTerms::Net30);
        assert_eq!(changed.due_date(), date(2023, 1, 31));
        assert_eq!(changed.transaction_ids, invoice.transaction_ids);
    }

    #[tokio::test]
    async fn test_delete_cascades_links() {
        let db = database().await;
        let (contract, transactions) = seed_invoiced_contract(&db).await;
        let invoice = db.invoices().list_for_contract(&contract.id).await.unwrap().remove(0);

        db.invoices().delete(&invoice.id).await.unwrap();
        assert!(db.invoices().get(&invoice.id).await.unwrap().is_none());

        let remaining: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM invoice_transactions WHERE invoice_id = ?1")
                .bind(&invoice.id)
                .fetch_one(db.pool())
                .await
                .unwrap();
        assert_eq!(remaining, 0);

        // Monthly line still contributes to the other eleven
        let contributing = db.transactions().invoices(&transactions[0].id).await.unwrap();
        assert_eq!(contributing.len(), 11);
    }

    #[tokio::test]
    async fn test_missing_invoice() {
        let db = database().await;
        assert!(db.invoices().get("nope").await.unwrap().is_none());
        assert!(matches!(
            db.invoices().set_payment_terms("nope", PaymentTerms::Net7).await,
            Err(DbError::NotFound { .. })
        ));
    }
}
