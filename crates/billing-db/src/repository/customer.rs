//! # Customer Repository
//!
//! Database operations for customers.

use billing_core::validation::{validate_address, validate_customer_name, validate_new_customer};
use billing_core::{new_id, Contract, Customer, CustomerChanges, Invoice, NewCustomer};
use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult, ServiceResult};
use crate::repository::{contract, invoice};

const SELECT_CUSTOMER: &str = r#"
    SELECT
        id, name, is_active,
        address_line_1, address_line_2, city, state, zip_code, country,
        created_at, updated_at
    FROM customers
"#;

pub(crate) async fn fetch_customer(
    conn: &mut SqliteConnection,
    id: &str,
) -> DbResult<Option<Customer>> {
    let customer = sqlx::query_as::<_, Customer>(&format!("{SELECT_CUSTOMER} WHERE id = ?1"))
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(customer)
}

/// Maps a UNIQUE failure on `customers.name` to a readable duplicate error.
fn name_taken(err: sqlx::Error, name: &str) -> DbError {
    match DbError::from(err) {
        DbError::UniqueViolation { .. } => DbError::duplicate("customer name", name),
        other => other,
    }
}

/// Repository for customer database operations.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    /// Creates a new CustomerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    /// Creates an active customer.
    ///
    /// ## Errors
    /// - Validation: name shorter than 3 characters, missing address field
    /// - `DbError::UniqueViolation`: another customer has the same name
    pub async fn create(&self, new: NewCustomer) -> ServiceResult<Customer> {
        validate_new_customer(&new)?;

        let now = Utc::now();
        let customer = Customer {
            id: new_id(),
            name: new.name.trim().to_string(),
            is_active: true,
            address: new.address,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO customers (
                id, name, is_active,
                address_line_1, address_line_2, city, state, zip_code, country,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&customer.id)
        .bind(&customer.name)
        .bind(customer.is_active)
        .bind(&customer.address.address_line_1)
        .bind(&customer.address.address_line_2)
        .bind(&customer.address.city)
        .bind(&customer.address.state)
        .bind(&customer.address.zip_code)
        .bind(&customer.address.country)
        .bind(customer.created_at)
        .bind(customer.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| name_taken(e, &customer.name))?;

        info!(customer_id = %customer.id, name = %customer.name, "Customer created");
        Ok(customer)
    }

    /// Gets a customer by ID.
    pub async fn get(&self, id: &str) -> DbResult<Option<Customer>> {
        let mut conn = self.pool.acquire().await?;
        fetch_customer(&mut conn, id).await
    }

    /// Gets a customer by its unique name.
    pub async fn get_by_name(&self, name: &str) -> DbResult<Option<Customer>> {
        let customer =
            sqlx::query_as::<_, Customer>(&format!("{SELECT_CUSTOMER} WHERE name = ?1"))
                .bind(name.trim())
                .fetch_optional(&self.pool)
                .await?;
        Ok(customer)
    }

    /// Lists all customers by name.
    pub async fn list(&self) -> DbResult<Vec<Customer>> {
        let customers =
            sqlx::query_as::<_, Customer>(&format!("{SELECT_CUSTOMER} ORDER BY name"))
                .fetch_all(&self.pool)
                .await?;
        Ok(customers)
    }

    /// Applies a partial update.
    ///
    /// The resulting name and address are validated as a whole, the same as
    /// on create.
    pub async fn update(&self, id: &str, changes: CustomerChanges) -> ServiceResult<Customer> {
        let mut conn = self.pool.acquire().await?;
        let mut customer = fetch_customer(&mut conn, id)
            .await?
            .ok_or_else(|| DbError::not_found("Customer", id))?;

        if let Some(name) = changes.name {
            customer.name = name.trim().to_string();
        }
        if let Some(address) = changes.address {
            address.apply_to(&mut customer.address);
        }
        validate_customer_name(&customer.name)?;
        validate_address(&customer.address)?;
        customer.updated_at = Utc::now();

        debug!(customer_id = %id, "Updating customer");

        sqlx::query(
            r#"
            UPDATE customers SET
                name = ?2,
                address_line_1 = ?3,
                address_line_2 = ?4,
                city = ?5,
                state = ?6,
                zip_code = ?7,
                country = ?8,
                updated_at = ?9
            WHERE id = ?1
            "#,
        )
        .bind(&customer.id)
        .bind(&customer.name)
        .bind(&customer.address.address_line_1)
        .bind(&customer.address.address_line_2)
        .bind(&customer.address.city)
        .bind(&customer.address.state)
        .bind(&customer.address.zip_code)
        .bind(&customer.address.country)
        .bind(customer.updated_at)
        .execute(&mut *conn)
        .await
        .map_err(|e| name_taken(e, &customer.name))?;

        Ok(customer)
    }

    /// Deletes a customer with all of its contracts and invoices.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM customers WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", id));
        }

        info!(customer_id = %id, "Customer deleted");
        Ok(())
    }

    /// Contracts of a customer, oldest first.
    pub async fn contracts(&self, id: &str) -> DbResult<Vec<Contract>> {
        let mut conn = self.pool.acquire().await?;
        contract::fetch_for_customer(&mut conn, id).await
    }

    /// Invoices billed to a customer, across all contracts, by date.
    pub async fn invoices(&self, id: &str) -> DbResult<Vec<Invoice>> {
        let mut conn = self.pool.acquire().await?;
        invoice::fetch_for_customer(&mut conn, id).await
    }
}
