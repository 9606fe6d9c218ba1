//! # Sale Item Repository
//!
//! Line items of a sale. This is where the subtotal derivation is enforced:
//! no path in this crate writes a `sale_items` row without first running
//! [`recompute_subtotal`] on it.
//!
//! ## Write Path
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  insert(NewSaleItem)          update(id, SaleItemChanges)              │
//! │       │                            │                                    │
//! │       │                       BEGIN, load row                           │
//! │       │                       apply changes                             │
//! │       ▼                            ▼                                    │
//! │  validate ─────────────────► validate                                  │
//! │       ▼                            ▼                                    │
//! │  recompute_subtotal         recompute_subtotal                         │
//! │  (quantity × unit_price,    (caller-supplied subtotal never survives)  │
//! │   overflow → error)                ▼                                    │
//! │       ▼                       UPDATE, COMMIT                            │
//! │  INSERT                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `SaleRepository::record` reuses the same insert step inside its own
//! transaction.

use chrono::Utc;
use sqlx::{Executor, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::generate_id;
use pdv_core::derivation::recompute_subtotal;
use pdv_core::{NewSaleItem, SaleItem, SaleItemChanges, Validate};

const COLUMNS: &str =
    "id, sale_id, product_id, quantity, unit_price, subtotal, created_at, updated_at";

/// Validates, derives the subtotal and inserts one item.
///
/// Works on the pool or on an open transaction.
pub(crate) async fn insert_item<'e, E>(executor: E, item: &mut SaleItem) -> DbResult<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    item.validate()?;
    recompute_subtotal(item)?;

    debug!(
        id = %item.id,
        sale_id = %item.sale_id,
        product_id = %item.product_id,
        quantity = item.quantity,
        subtotal = item.subtotal.cents(),
        "Inserting sale item"
    );

    sqlx::query(
        r#"
        INSERT INTO sale_items (
            id, sale_id, product_id,
            quantity, unit_price, subtotal,
            created_at, updated_at
        ) VALUES (
            ?1, ?2, ?3,
            ?4, ?5, ?6,
            ?7, ?8
        )
        "#,
    )
    .bind(&item.id)
    .bind(&item.sale_id)
    .bind(&item.product_id)
    .bind(item.quantity)
    .bind(item.unit_price)
    .bind(item.subtotal)
    .bind(item.created_at)
    .bind(item.updated_at)
    .execute(executor)
    .await?;

    Ok(())
}

/// Repository for sale item database operations.
#[derive(Debug, Clone)]
pub struct SaleItemRepository {
    pool: SqlitePool,
}

impl SaleItemRepository {
    /// Creates a new SaleItemRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleItemRepository { pool }
    }

    /// Inserts a line item with its subtotal derived.
    ///
    /// ## Returns
    /// * `Ok(SaleItem)` - Stored item, `subtotal == quantity × unit_price`
    /// * `Err(DbError::Core)` - Invalid quantity/price, or the subtotal overflows
    /// * `Err(DbError::ForeignKeyViolation)` - Sale or product doesn't exist
    pub async fn insert(&self, input: NewSaleItem) -> DbResult<SaleItem> {
        let mut item = input.into_sale_item(generate_id(), Utc::now());
        insert_item(&self.pool, &mut item).await?;
        Ok(item)
    }

    /// Gets a sale item by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<SaleItem>> {
        let item =
            sqlx::query_as::<_, SaleItem>(&format!("SELECT {COLUMNS} FROM sale_items WHERE id = ?1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(item)
    }

    /// Items of a sale, in insertion order.
    pub async fn find_by_sale(&self, sale_id: &str) -> DbResult<Vec<SaleItem>> {
        let items = sqlx::query_as::<_, SaleItem>(&format!(
            "SELECT {COLUMNS} FROM sale_items WHERE sale_id = ?1 ORDER BY rowid"
        ))
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Every item that sold a product, oldest first.
    pub async fn find_by_product(&self, product_id: &str) -> DbResult<Vec<SaleItem>> {
        let items = sqlx::query_as::<_, SaleItem>(&format!(
            "SELECT {COLUMNS} FROM sale_items WHERE product_id = ?1 ORDER BY rowid"
        ))
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Name of the product an item refers to.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - No such item
    /// * `Err(DbError::ForeignKeyViolation)` - The item points at a product
    ///   that no longer exists
    pub async fn product_name(&self, item_id: &str) -> DbResult<String> {
        let row: Option<(String, Option<String>)> = sqlx::query_as(
            r#"
            SELECT i.product_id, p.name
            FROM sale_items i
            LEFT JOIN products p ON p.id = i.product_id
            WHERE i.id = ?1
            "#,
        )
        .bind(item_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            None => Err(DbError::not_found("SaleItem", item_id)),
            Some((_, Some(name))) => Ok(name),
            Some((product_id, None)) => Err(DbError::dangling(format!(
                "sale item {item_id} refers to missing product {product_id}"
            ))),
        }
    }

    /// Applies whitelisted changes and re-derives the subtotal.
    ///
    /// Load, apply, validate, derive and write happen in one transaction.
    ///
    /// ## Returns
    /// * `Ok(SaleItem)` - Updated item, `subtotal == quantity × unit_price`
    /// * `Err(DbError::NotFound)` - No such item
    pub async fn update(&self, id: &str, changes: SaleItemChanges) -> DbResult<SaleItem> {
        debug!(id = %id, "Updating sale item");

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let mut item =
            sqlx::query_as::<_, SaleItem>(&format!("SELECT {COLUMNS} FROM sale_items WHERE id = ?1"))
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| DbError::not_found("SaleItem", id))?;

        changes.apply(&mut item, Utc::now());
        item.validate()?;
        recompute_subtotal(&mut item)?;

        sqlx::query(
            r#"
            UPDATE sale_items SET
                sale_id = ?2,
                product_id = ?3,
                quantity = ?4,
                unit_price = ?5,
                subtotal = ?6,
                updated_at = ?7
            WHERE id = ?1
            "#,
        )
        .bind(&item.id)
        .bind(&item.sale_id)
        .bind(&item.product_id)
        .bind(item.quantity)
        .bind(item.unit_price)
        .bind(item.subtotal)
        .bind(item.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        debug!(id = %item.id, subtotal = item.subtotal.cents(), "Sale item updated");
        Ok(item)
    }

    /// Deletes a sale item.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting sale item");

        let result = sqlx::query("DELETE FROM sale_items WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("SaleItem", id));
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::pool::Database;
    use crate::repository::fixtures;
    use pdv_core::{CoreError, Fillable, Money, Product, Sale, ValidationError};
    use serde_json::json;

    async fn setup() -> (Database, Sale, Product) {
        let db = fixtures::db().await;
        let user = fixtures::operator(&db).await;
        let customer = fixtures::customer(&db, "Ana").await;
        let sale = fixtures::sale(&db, &customer, &user, fixtures::date(2024, 5, 1)).await;
        let product = fixtures::product(&db, "Café Torrado 500g", 1099, 50).await;
        (db, sale, product)
    }

    fn line(sale: &Sale, product: &Product, quantity: i64, unit_price: i64) -> NewSaleItem {
        NewSaleItem {
            sale_id: sale.id.clone(),
            product_id: product.id.clone(),
            quantity,
            unit_price: Money::from_cents(unit_price),
        }
    }

    #[tokio::test]
    async fn test_insert_derives_subtotal() {
        let (db, sale, product) = setup().await;

        let item = db.sale_items().insert(line(&sale, &product, 3, 1099)).await.unwrap();
        assert_eq!(item.subtotal, Money::from_cents(3297));

        let stored = db.sale_items().get_by_id(&item.id).await.unwrap().unwrap();
        assert_eq!(stored.subtotal, Money::from_cents(3297));
        assert_eq!(stored.quantity, 3);
    }

    #[tokio::test]
    async fn test_subtotal_follows_repeated_updates() {
        let (db, sale, product) = setup().await;
        let item = db.sale_items().insert(line(&sale, &product, 1, 250)).await.unwrap();

        for (quantity, price) in [(2, 250), (2, 199), (7, 199), (1, 0), (12, 1550)] {
            let updated = db
                .sale_items()
                .update(
                    &item.id,
                    SaleItemChanges {
                        quantity: Some(quantity),
                        unit_price: Some(Money::from_cents(price)),
                        ..Default::default()
                    },
                )
                .await
                .unwrap();
            assert_eq!(updated.subtotal.cents(), quantity * price);

            let stored = db.sale_items().get_by_id(&item.id).await.unwrap().unwrap();
            assert_eq!(stored.subtotal.cents(), quantity * price);
        }
    }

    #[tokio::test]
    async fn test_updating_only_quantity_rederives() {
        let (db, sale, product) = setup().await;
        let item = db.sale_items().insert(line(&sale, &product, 2, 500)).await.unwrap();

        let changes = SaleItemChanges::from_json(json!({ "quantity": 5 })).unwrap();
        let updated = db.sale_items().update(&item.id, changes).await.unwrap();
        assert_eq!(updated.subtotal, Money::from_cents(2500));
    }

    #[tokio::test]
    async fn test_forged_subtotal_is_rejected() {
        let (db, sale, product) = setup().await;
        let item = db.sale_items().insert(line(&sale, &product, 2, 500)).await.unwrap();

        let err = SaleItemChanges::from_json(json!({ "quantity": 3, "subtotal": 1 })).unwrap_err();
        assert!(matches!(err, ValidationError::NotFillable { ref field, .. } if field == "subtotal"));

        let stored = db.sale_items().get_by_id(&item.id).await.unwrap().unwrap();
        assert_eq!(stored.quantity, 2);
        assert_eq!(stored.subtotal, Money::from_cents(1000));
    }

    #[tokio::test]
    async fn test_overflow_is_rejected_and_nothing_written() {
        let (db, sale, product) = setup().await;
        let item = db.sale_items().insert(line(&sale, &product, 2, 500)).await.unwrap();

        let err = db
            .sale_items()
            .update(
                &item.id,
                SaleItemChanges {
                    unit_price: Some(Money::from_cents(i64::MAX)),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::AmountOverflow { .. })));
        assert_eq!(err.kind(), ErrorKind::ValidationRejected);

        let stored = db.sale_items().get_by_id(&item.id).await.unwrap().unwrap();
        assert_eq!(stored.subtotal, Money::from_cents(1000));
    }

    #[tokio::test]
    async fn test_zero_quantity_is_rejected() {
        let (db, sale, product) = setup().await;
        let err = db.sale_items().insert(line(&sale, &product, 0, 500)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationRejected);
        assert!(db.sale_items().find_by_sale(&sale.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_product_is_referential_violation() {
        let (db, sale, _) = setup().await;
        let err = db
            .sale_items()
            .insert(NewSaleItem {
                sale_id: sale.id.clone(),
                product_id: generate_id(),
                quantity: 1,
                unit_price: Money::from_cents(100),
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ReferentialIntegrityViolation);
    }

    #[tokio::test]
    async fn test_find_by_sale_keeps_insertion_order() {
        let (db, sale, product) = setup().await;
        let other = fixtures::product(&db, "Açúcar 1kg", 459, 30).await;

        let first = db.sale_items().insert(line(&sale, &product, 1, 1099)).await.unwrap();
        let second = db.sale_items().insert(line(&sale, &other, 4, 459)).await.unwrap();
        let third = db.sale_items().insert(line(&sale, &product, 2, 1099)).await.unwrap();

        let ids: Vec<String> = db
            .sale_items()
            .find_by_sale(&sale.id)
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.id)
            .collect();
        assert_eq!(ids, vec![first.id, second.id, third.id]);

        assert_eq!(db.sale_items().find_by_product(&product.id).await.unwrap().len(), 2);
        assert_eq!(db.sale_items().find_by_product(&other.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_product_name() {
        let (db, sale, product) = setup().await;
        let item = db.sale_items().insert(line(&sale, &product, 1, 1099)).await.unwrap();

        assert_eq!(
            db.sale_items().product_name(&item.id).await.unwrap(),
            "Café Torrado 500g"
        );

        let err = db.sale_items().product_name(&generate_id()).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_product_name_of_orphaned_item() {
        let (db, sale, product) = setup().await;
        let item = db.sale_items().insert(line(&sale, &product, 1, 1099)).await.unwrap();

        // Simulate rows written by a tool that bypassed foreign keys.
        sqlx::query("PRAGMA foreign_keys = OFF").execute(db.pool()).await.unwrap();
        sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(&product.id)
            .execute(db.pool())
            .await
            .unwrap();
        sqlx::query("PRAGMA foreign_keys = ON").execute(db.pool()).await.unwrap();

        let err = db.sale_items().product_name(&item.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ReferentialIntegrityViolation);
    }

    #[tokio::test]
    async fn test_delete_item() {
        let (db, sale, product) = setup().await;
        let item = db.sale_items().insert(line(&sale, &product, 1, 1099)).await.unwrap();

        db.sale_items().delete(&item.id).await.unwrap();
        assert!(db.sale_items().get_by_id(&item.id).await.unwrap().is_none());
        assert!(matches!(
            db.sale_items().delete(&item.id).await.unwrap_err(),
            DbError::NotFound { .. }
        ));
    }
}
