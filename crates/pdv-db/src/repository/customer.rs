//! # Customer Repository
//!
//! Database operations for customers.
//!
//! ## Key Operations
//! - CRUD with validation of CPF/CNPJ, UF and CEP on every write
//! - Name search (`CustomerFilter::NameContains`)
//! - Email lookup
//!
//! A customer's sales are reached through
//! [`SaleRepository::find_by_customer`](crate::repository::sale::SaleRepository::find_by_customer).

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::generate_id;
use crate::repository::scope::push_where;
use pdv_core::{Customer, CustomerChanges, CustomerFilter, NewCustomer, Validate};

/// Lowercased copy of the name stored in `name_search`.
fn search_key(name: &str) -> String {
    name.to_lowercase()
}

const COLUMNS: &str = "id, name, email, phone, tax_id, address, city, state, postal_code, \
                       created_at, updated_at";

/// Repository for customer database operations.
///
/// ## Usage
/// ```rust,ignore
/// let silvas = db.customers()
///     .list(&[CustomerFilter::NameContains("silva".into())])
///     .await?;
/// ```
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    /// Creates a new CustomerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    /// Inserts a new customer.
    ///
    /// ## Returns
    /// * `Ok(Customer)` - Stored customer with generated id and timestamps
    /// * `Err(DbError::Core)` - A field failed validation
    pub async fn insert(&self, input: NewCustomer) -> DbResult<Customer> {
        let customer = input.into_customer(generate_id(), Utc::now());
        customer.validate()?;

        debug!(id = %customer.id, "Inserting customer");

        sqlx::query(
            r#"
            INSERT INTO customers (
                id, name, email, phone, tax_id,
                address, city, state, postal_code,
                created_at, updated_at, name_search
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5,
                ?6, ?7, ?8, ?9,
                ?10, ?11, ?12
            )
            "#,
        )
        .bind(&customer.id)
        .bind(&customer.name)
        .bind(&customer.email)
        .bind(&customer.phone)
        .bind(&customer.tax_id)
        .bind(&customer.address)
        .bind(&customer.city)
        .bind(&customer.state)
        .bind(&customer.postal_code)
        .bind(customer.created_at)
        .bind(customer.updated_at)
        .bind(search_key(&customer.name))
        .execute(&self.pool)
        .await?;

        Ok(customer)
    }

    /// Gets a customer by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Customer>> {
        let customer =
            sqlx::query_as::<_, Customer>(&format!("SELECT {COLUMNS} FROM customers WHERE id = ?1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(customer)
    }

    /// Gets the first customer registered with an email address.
    ///
    /// Emails are not unique in storage; the oldest match wins.
    pub async fn get_by_email(&self, email: &str) -> DbResult<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>(&format!(
            "SELECT {COLUMNS} FROM customers WHERE email = ?1 ORDER BY created_at, rowid LIMIT 1"
        ))
        .bind(email.trim())
        .fetch_optional(&self.pool)
        .await?;

        Ok(customer)
    }

    /// Lists customers matching every filter, ordered by name.
    pub async fn list(&self, filters: &[CustomerFilter]) -> DbResult<Vec<Customer>> {
        let mut qb = QueryBuilder::<Sqlite>::new(format!("SELECT {COLUMNS} FROM customers"));
        push_where(&mut qb, filters);
        qb.push(" ORDER BY name, rowid");

        let customers = qb.build_query_as::<Customer>().fetch_all(&self.pool).await?;

        debug!(count = customers.len(), "Listed customers");
        Ok(customers)
    }

    /// Applies whitelisted changes to a customer.
    ///
    /// Load, apply, validate and write happen in one transaction.
    ///
    /// ## Returns
    /// * `Ok(Customer)` - The updated record
    /// * `Err(DbError::NotFound)` - No such customer
    /// * `Err(DbError::Core)` - The changed record failed validation; nothing written
    pub async fn update(&self, id: &str, changes: CustomerChanges) -> DbResult<Customer> {
        debug!(id = %id, "Updating customer");

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let mut customer =
            sqlx::query_as::<_, Customer>(&format!("SELECT {COLUMNS} FROM customers WHERE id = ?1"))
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| DbError::not_found("Customer", id))?;

        changes.apply(&mut customer, Utc::now());
        customer.validate()?;

        sqlx::query(
            r#"
            UPDATE customers SET
                name = ?2,
                email = ?3,
                phone = ?4,
                tax_id = ?5,
                address = ?6,
                city = ?7,
                state = ?8,
                postal_code = ?9,
                updated_at = ?10,
                name_search = ?11
            WHERE id = ?1
            "#,
        )
        .bind(&customer.id)
        .bind(&customer.name)
        .bind(&customer.email)
        .bind(&customer.phone)
        .bind(&customer.tax_id)
        .bind(&customer.address)
        .bind(&customer.city)
        .bind(&customer.state)
        .bind(&customer.postal_code)
        .bind(customer.updated_at)
        .bind(search_key(&customer.name))
        .execute(&mut *tx)
        .await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok(customer)
    }

    /// Deletes a customer.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - No such customer
    /// * `Err(DbError::ForeignKeyViolation)` - The customer has sales
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting customer");

        let result = sqlx::query("DELETE FROM customers WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", id));
        }

        Ok(())
    }

    /// Counts customers (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM customers")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::repository::fixtures;
    use pdv_core::{Fillable, ValidationError};
    use serde_json::json;

    #[tokio::test]
    async fn test_insert_and_get_by_email() {
        let db = fixtures::db().await;
        let created = fixtures::customer(&db, "Maria Souza").await;

        let fetched = db
            .customers()
            .get_by_email("cliente@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fetched.id, created.id);
        assert_eq!(fetched.state.as_deref(), Some("SP"));
        assert_eq!(fetched.tax_id, "529.982.247-25");
    }

    #[tokio::test]
    async fn test_insert_rejects_invalid_cpf() {
        let db = fixtures::db().await;
        let err = db
            .customers()
            .insert(NewCustomer {
                tax_id: "123.456.789-00".to_string(),
                ..fixtures::new_customer("Fulano")
            })
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::ValidationRejected);
        assert_eq!(db.customers().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_name_contains_filter() {
        let db = fixtures::db().await;
        fixtures::customer(&db, "João Silva").await;
        fixtures::customer(&db, "Maria Souza").await;
        fixtures::customer(&db, "Pedro Silveira").await;

        let hits = db
            .customers()
            .list(&[CustomerFilter::NameContains("silv".to_string())])
            .await
            .unwrap();
        let names: Vec<&str> = hits.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["João Silva", "Pedro Silveira"]);
    }

    #[tokio::test]
    async fn test_name_contains_folds_accented_letters() {
        let db = fixtures::db().await;
        fixtures::customer(&db, "João Silva").await;
        fixtures::customer(&db, "Érica Lima").await;
        fixtures::customer(&db, "Joana Prado").await;

        for (needle, expected) in [("JOÃO", "João Silva"), ("érica", "Érica Lima")] {
            let filter = CustomerFilter::NameContains(needle.to_string());
            let hits = db.customers().list(&[filter.clone()]).await.unwrap();
            let names: Vec<&str> = hits.iter().map(|c| c.name.as_str()).collect();
            assert_eq!(names, vec![expected], "searching {needle}");

            let all = db.customers().list(&[]).await.unwrap();
            let in_memory = pdv_core::filter::select(&all, &[filter]);
            assert_eq!(in_memory.len(), hits.len(), "searching {needle}");
        }
    }

    #[tokio::test]
    async fn test_name_search_follows_renames() {
        let db = fixtures::db().await;
        let customer = fixtures::customer(&db, "Ana").await;

        let changes = CustomerChanges::from_json(json!({ "name": "Ângela Araújo" })).unwrap();
        db.customers().update(&customer.id, changes).await.unwrap();

        let by_new = db
            .customers()
            .list(&[CustomerFilter::NameContains("ÂNGELA".to_string())])
            .await
            .unwrap();
        assert_eq!(by_new.len(), 1);

        let by_old = db
            .customers()
            .list(&[CustomerFilter::NameContains("ana".to_string())])
            .await
            .unwrap();
        assert!(by_old.is_empty());
    }

    #[tokio::test]
    async fn test_name_contains_treats_wildcards_literally() {
        let db = fixtures::db().await;
        fixtures::customer(&db, "Loja 100% Natural").await;
        fixtures::customer(&db, "Loja 1000 Natural").await;

        let hits = db
            .customers()
            .list(&[CustomerFilter::NameContains("100%".to_string())])
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Loja 100% Natural");
    }

    #[tokio::test]
    async fn test_update_clears_nullable_field() {
        let db = fixtures::db().await;
        let customer = fixtures::customer(&db, "Ana").await;

        let changes = CustomerChanges::from_json(json!({ "phone": null, "city": "Campinas" })).unwrap();
        let updated = db.customers().update(&customer.id, changes).await.unwrap();

        assert_eq!(updated.phone, None);
        assert_eq!(updated.city.as_deref(), Some("Campinas"));
        assert!(updated.updated_at >= customer.updated_at);

        let stored = db.customers().get_by_id(&customer.id).await.unwrap().unwrap();
        assert_eq!(stored.phone, None);
        assert_eq!(stored.city.as_deref(), Some("Campinas"));
    }

    #[tokio::test]
    async fn test_update_rejects_invalid_state_without_writing() {
        let db = fixtures::db().await;
        let customer = fixtures::customer(&db, "Ana").await;

        let err = db
            .customers()
            .update(
                &customer.id,
                CustomerChanges {
                    state: Some(Some("XX".to_string())),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Core(pdv_core::CoreError::Validation(ValidationError::InvalidFormat { .. }))
        ));

        let stored = db.customers().get_by_id(&customer.id).await.unwrap().unwrap();
        assert_eq!(stored.state.as_deref(), Some("SP"));
    }

    #[tokio::test]
    async fn test_update_missing_customer() {
        let db = fixtures::db().await;
        let err = db
            .customers()
            .update(&generate_id(), CustomerChanges::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_delete_customer_with_sales_is_rejected() {
        let db = fixtures::db().await;
        let user = fixtures::operator(&db).await;
        let customer = fixtures::customer(&db, "Ana").await;
        fixtures::sale(&db, &customer, &user, fixtures::date(2024, 5, 1)).await;

        let err = db.customers().delete(&customer.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ReferentialIntegrityViolation);
    }

    #[tokio::test]
    async fn test_delete_customer_without_sales() {
        let db = fixtures::db().await;
        let customer = fixtures::customer(&db, "Ana").await;

        db.customers().delete(&customer.id).await.unwrap();
        assert!(db.customers().get_by_id(&customer.id).await.unwrap().is_none());

        let err = db.customers().delete(&customer.id).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
