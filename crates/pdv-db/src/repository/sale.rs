//! # Sale Repository
//!
//! Database operations for sales.
//!
//! ## Recording a Sale
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  record(NewSale, [SaleLine, SaleLine, ...])                            │
//! │                                                                         │
//! │  BEGIN                                                                 │
//! │   ├── validate + INSERT sale                                           │
//! │   ├── for each line:                                                   │
//! │   │     unit_price given?  yes ──► use it                              │
//! │   │                        no  ──► SELECT price FROM products          │
//! │   │     validate, recompute_subtotal, INSERT sale_item                 │
//! │   └── COMMIT                                                           │
//! │                                                                         │
//! │  Any failure rolls back the sale and every item written so far.        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The sale `total` is supplied by the caller and stored as given; the net
//! total is never stored and comes from [`Sale::net_total`].

use chrono::Utc;
use sqlx::{Executor, QueryBuilder, Sqlite, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::generate_id;
use crate::repository::sale_item::insert_item;
use crate::repository::scope::push_where;
use pdv_core::{
    Money, NewSale, NewSaleItem, Sale, SaleChanges, SaleFilter, SaleItem, SaleLine, Validate,
};

const COLUMNS: &str = "id, customer_id, user_id, sale_date, total, discount, payment_method, \
                       status, notes, created_at, updated_at";

async fn insert_sale<'e, E>(executor: E, sale: &Sale) -> DbResult<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sale.validate()?;

    debug!(
        id = %sale.id,
        customer_id = %sale.customer_id,
        total = sale.total.cents(),
        "Inserting sale"
    );

    sqlx::query(
        r#"
        INSERT INTO sales (
            id, customer_id, user_id, sale_date,
            total, discount, payment_method, status, notes,
            created_at, updated_at
        ) VALUES (
            ?1, ?2, ?3, ?4,
            ?5, ?6, ?7, ?8, ?9,
            ?10, ?11
        )
        "#,
    )
    .bind(&sale.id)
    .bind(&sale.customer_id)
    .bind(&sale.user_id)
    .bind(sale.sale_date)
    .bind(sale.total)
    .bind(sale.discount)
    .bind(sale.payment_method)
    .bind(sale.status)
    .bind(&sale.notes)
    .bind(sale.created_at)
    .bind(sale.updated_at)
    .execute(executor)
    .await?;

    Ok(())
}

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Inserts a sale without items.
    ///
    /// ## Returns
    /// * `Err(DbError::Core)` - Negative total/discount or malformed ids
    /// * `Err(DbError::ForeignKeyViolation)` - Customer or operator doesn't exist
    pub async fn insert(&self, input: NewSale) -> DbResult<Sale> {
        let sale = input.into_sale(generate_id(), Utc::now());
        insert_sale(&self.pool, &sale).await?;
        Ok(sale)
    }

    /// Records a sale and its items atomically.
    ///
    /// A line without a `unit_price` captures the product's price as it is
    /// right now; later price changes leave the item untouched.
    ///
    /// ## Returns
    /// The stored sale and its items in line order.
    pub async fn record(&self, input: NewSale, lines: Vec<SaleLine>) -> DbResult<(Sale, Vec<SaleItem>)> {
        let now = Utc::now();
        let sale = input.into_sale(generate_id(), now);

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        insert_sale(&mut *tx, &sale).await?;

        let mut items = Vec::with_capacity(lines.len());
        for line in lines {
            let unit_price = match line.unit_price {
                Some(price) => price,
                None => sqlx::query_scalar::<_, Money>("SELECT price FROM products WHERE id = ?1")
                    .bind(&line.product_id)
                    .fetch_optional(&mut *tx)
                    .await?
                    .ok_or_else(|| {
                        DbError::dangling(format!("product {} does not exist", line.product_id))
                    })?,
            };

            let mut item = NewSaleItem {
                sale_id: sale.id.clone(),
                product_id: line.product_id,
                quantity: line.quantity,
                unit_price,
            }
            .into_sale_item(generate_id(), now);

            insert_item(&mut *tx, &mut item).await?;
            items.push(item);
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(
            id = %sale.id,
            items = items.len(),
            net_total = sale.net_total().cents(),
            "Sale recorded"
        );

        Ok((sale, items))
    }

    /// Gets a sale by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>(&format!("SELECT {COLUMNS} FROM sales WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(sale)
    }

    /// Sales of a customer, oldest first.
    pub async fn find_by_customer(&self, customer_id: &str) -> DbResult<Vec<Sale>> {
        let sales = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {COLUMNS} FROM sales WHERE customer_id = ?1 ORDER BY sale_date, rowid"
        ))
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(sales)
    }

    /// Lists sales matching every filter, ordered by date.
    ///
    /// ## Example
    /// ```rust,ignore
    /// let today_done = db.sales().list(&[SaleFilter::Completed, SaleFilter::today()]).await?;
    /// ```
    pub async fn list(&self, filters: &[SaleFilter]) -> DbResult<Vec<Sale>> {
        let mut qb = QueryBuilder::<Sqlite>::new(format!("SELECT {COLUMNS} FROM sales"));
        push_where(&mut qb, filters);
        qb.push(" ORDER BY sale_date, rowid");

        let sales = qb.build_query_as::<Sale>().fetch_all(&self.pool).await?;

        debug!(count = sales.len(), "Listed sales");
        Ok(sales)
    }

    /// Applies whitelisted changes to a sale.
    ///
    /// ## Returns
    /// * `Ok(Sale)` - The updated record
    /// * `Err(DbError::NotFound)` - No such sale
    /// * `Err(DbError::ForeignKeyViolation)` - New customer or operator doesn't exist
    pub async fn update(&self, id: &str, changes: SaleChanges) -> DbResult<Sale> {
        debug!(id = %id, "Updating sale");

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let mut sale = sqlx::query_as::<_, Sale>(&format!("SELECT {COLUMNS} FROM sales WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| DbError::not_found("Sale", id))?;

        changes.apply(&mut sale, Utc::now());
        sale.validate()?;

        sqlx::query(
            r#"
            UPDATE sales SET
                customer_id = ?2,
                user_id = ?3,
                sale_date = ?4,
                total = ?5,
                discount = ?6,
                payment_method = ?7,
                status = ?8,
                notes = ?9,
                updated_at = ?10
            WHERE id = ?1
            "#,
        )
        .bind(&sale.id)
        .bind(&sale.customer_id)
        .bind(&sale.user_id)
        .bind(sale.sale_date)
        .bind(sale.total)
        .bind(sale.discount)
        .bind(sale.payment_method)
        .bind(sale.status)
        .bind(&sale.notes)
        .bind(sale.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok(sale)
    }

    /// Deletes a sale together with its items.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting sale");

        let result = sqlx::query("DELETE FROM sales WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Sale", id));
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
    use crate::repository::fixtures;
    use pdv_core::{Fillable, PaymentMethod, ProductChanges, SaleStatus, ValidationError};
    use serde_json::json;

    #[tokio::test]
    async fn test_net_total_after_update() {
        let db = fixtures::db().await;
        let user = fixtures::operator(&db).await;
        let customer = fixtures::customer(&db, "Ana").await;
        let sale = db
            .sales()
            .insert(NewSale {
                total: Money::from_cents(10_000),
                discount: Money::from_cents(1_500),
                ..fixtures::new_sale(&customer, &user, fixtures::date(2024, 1, 15))
            })
            .await
            .unwrap();
        assert_eq!(sale.net_total(), Money::from_cents(8_500));

        let changes = SaleChanges::from_json(json!({ "discount": 2000 })).unwrap();
        db.sales().update(&sale.id, changes).await.unwrap();

        let stored = db.sales().get_by_id(&sale.id).await.unwrap().unwrap();
        assert_eq!(stored.net_total(), Money::from_cents(8_000));
    }

    #[tokio::test]
    async fn test_forged_id_never_reaches_storage() {
        let db = fixtures::db().await;
        let user = fixtures::operator(&db).await;
        let customer = fixtures::customer(&db, "Ana").await;
        let sale = fixtures::sale(&db, &customer, &user, fixtures::date(2024, 1, 15)).await;

        let err = SaleChanges::from_json(json!({ "id": "forged", "total": 1 })).unwrap_err();
        assert!(matches!(err, ValidationError::NotFillable { ref field, .. } if field == "id"));

        let stored = db.sales().get_by_id(&sale.id).await.unwrap().unwrap();
        assert_eq!(stored.total, sale.total);
        assert!(db.sales().get_by_id("forged").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_period_filter_is_inclusive() {
        let db = fixtures::db().await;
        let user = fixtures::operator(&db).await;
        let customer = fixtures::customer(&db, "Ana").await;
        let first = fixtures::sale(&db, &customer, &user, fixtures::date(2024, 1, 1)).await;
        let middle = fixtures::sale(&db, &customer, &user, fixtures::date(2024, 1, 15)).await;
        fixtures::sale(&db, &customer, &user, fixtures::date(2024, 2, 1)).await;

        let january = db
            .sales()
            .list(&[SaleFilter::Period {
                start: fixtures::date(2024, 1, 1),
                end: fixtures::date(2024, 1, 31),
            }])
            .await
            .unwrap();
        let ids: Vec<String> = january.into_iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![first.id, middle.id]);
    }

    #[tokio::test]
    async fn test_completed_and_on_date_filters() {
        let db = fixtures::db().await;
        let user = fixtures::operator(&db).await;
        let customer = fixtures::customer(&db, "Ana").await;
        let day = fixtures::date(2024, 3, 10);

        let done = fixtures::sale(&db, &customer, &user, day).await;
        db.sales()
            .insert(NewSale {
                status: SaleStatus::Cancelled,
                ..fixtures::new_sale(&customer, &user, day)
            })
            .await
            .unwrap();
        fixtures::sale(&db, &customer, &user, fixtures::date(2024, 3, 11)).await;

        let hits = db
            .sales()
            .list(&[SaleFilter::Completed, SaleFilter::OnDate(day)])
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, done.id);

        assert_eq!(db.sales().list(&[SaleFilter::Completed]).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_today_filter() {
        let db = fixtures::db().await;
        let user = fixtures::operator(&db).await;
        let customer = fixtures::customer(&db, "Ana").await;
        let today = chrono::Local::now().date_naive();
        let sale = fixtures::sale(&db, &customer, &user, today).await;
        fixtures::sale(&db, &customer, &user, fixtures::date(2000, 1, 1)).await;

        let hits = db.sales().list(&[SaleFilter::today()]).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, sale.id);
    }

    #[tokio::test]
    async fn test_find_by_customer() {
        let db = fixtures::db().await;
        let user = fixtures::operator(&db).await;
        let ana = fixtures::customer(&db, "Ana").await;
        let bia = fixtures::customer(&db, "Bia").await;
        fixtures::sale(&db, &ana, &user, fixtures::date(2024, 1, 2)).await;
        fixtures::sale(&db, &ana, &user, fixtures::date(2024, 1, 1)).await;
        fixtures::sale(&db, &bia, &user, fixtures::date(2024, 1, 1)).await;

        let sales = db.sales().find_by_customer(&ana.id).await.unwrap();
        assert_eq!(sales.len(), 2);
        assert_eq!(sales[0].sale_date, fixtures::date(2024, 1, 1));
        assert!(sales.iter().all(|s| s.customer_id == ana.id));

        let owner = db.customers().get_by_id(&sales[0].customer_id).await.unwrap().unwrap();
        assert_eq!(owner.name, "Ana");
        let operator = db.users().get_by_id(&sales[0].user_id).await.unwrap().unwrap();
        assert_eq!(operator.id, user.id);
    }

    #[tokio::test]
    async fn test_unknown_customer_is_referential_violation() {
        let db = fixtures::db().await;
        let user = fixtures::operator(&db).await;
        let err = db
            .sales()
            .insert(NewSale {
                customer_id: generate_id(),
                user_id: user.id.clone(),
                sale_date: fixtures::date(2024, 1, 1),
                total: Money::from_cents(100),
                discount: Money::zero(),
                payment_method: PaymentMethod::Pix,
                status: SaleStatus::Pending,
                notes: None,
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ReferentialIntegrityViolation);
    }

    #[tokio::test]
    async fn test_record_captures_current_price() {
        let db = fixtures::db().await;
        let user = fixtures::operator(&db).await;
        let customer = fixtures::customer(&db, "Ana").await;
        let coffee = fixtures::product(&db, "Café Torrado 500g", 1890, 40).await;
        let sugar = fixtures::product(&db, "Açúcar 1kg", 459, 40).await;

        let (sale, items) = db
            .sales()
            .record(
                fixtures::new_sale(&customer, &user, fixtures::date(2024, 6, 1)),
                vec![
                    SaleLine {
                        product_id: coffee.id.clone(),
                        quantity: 2,
                        unit_price: None,
                    },
                    SaleLine {
                        product_id: sugar.id.clone(),
                        quantity: 3,
                        unit_price: Some(Money::from_cents(400)),
                    },
                ],
            )
            .await
            .unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].unit_price, Money::from_cents(1890));
        assert_eq!(items[0].subtotal, Money::from_cents(3780));
        assert_eq!(items[1].subtotal, Money::from_cents(1200));

        db.products()
            .update(
                &coffee.id,
                ProductChanges {
                    price: Some(Money::from_cents(2190)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let summary = |list: &[SaleItem]| -> Vec<(String, i64, i64)> {
            list.iter()
                .map(|i| (i.id.clone(), i.unit_price.cents(), i.subtotal.cents()))
                .collect()
        };
        let stored = db.sale_items().find_by_sale(&sale.id).await.unwrap();
        assert_eq!(summary(&stored), summary(&items));
    }

    #[tokio::test]
    async fn test_record_rolls_back_on_bad_line() {
        let db = fixtures::db().await;
        let user = fixtures::operator(&db).await;
        let customer = fixtures::customer(&db, "Ana").await;
        let coffee = fixtures::product(&db, "Café Torrado 500g", 1890, 40).await;

        let err = db
            .sales()
            .record(
                fixtures::new_sale(&customer, &user, fixtures::date(2024, 6, 1)),
                vec![
                    SaleLine {
                        product_id: coffee.id.clone(),
                        quantity: 1,
                        unit_price: None,
                    },
                    SaleLine {
                        product_id: generate_id(),
                        quantity: 1,
                        unit_price: None,
                    },
                ],
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ReferentialIntegrityViolation);

        assert!(db.sales().find_by_customer(&customer.id).await.unwrap().is_empty());
        assert!(db.sale_items().find_by_product(&coffee.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_sale_cascades_to_items() {
        let db = fixtures::db().await;
        let user = fixtures::operator(&db).await;
        let customer = fixtures::customer(&db, "Ana").await;
        let coffee = fixtures::product(&db, "Café Torrado 500g", 1890, 40).await;

        let (sale, items) = db
            .sales()
            .record(
                fixtures::new_sale(&customer, &user, fixtures::date(2024, 6, 1)),
                vec![SaleLine {
                    product_id: coffee.id.clone(),
                    quantity: 1,
                    unit_price: None,
                }],
            )
            .await
            .unwrap();

        db.sales().delete(&sale.id).await.unwrap();
        assert!(db.sale_items().get_by_id(&items[0].id).await.unwrap().is_none());

        // The product is free to go once nothing references it.
        db.products().delete(&coffee.id).await.unwrap();
    }
}
