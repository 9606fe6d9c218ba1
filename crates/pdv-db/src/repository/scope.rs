//! # SQL Translation of Query Filters
//!
//! Every filter enum from `pdv_core::filter` renders into a `WHERE`
//! fragment here. The in-memory predicate and the SQL fragment describe the
//! same set of rows. Name search runs against `customers.name_search`, the
//! Unicode-lowercased name, because SQLite's `LIKE` folds only ASCII letters.
//!
//! ```text
//! list(&[ProductFilter::Active, ProductFilter::low_stock()])
//!
//!   SELECT ... FROM products
//!    WHERE (active = 1)
//!      AND (stock <= ?)            ← bound 10
//!    ORDER BY name
//! ```

use pdv_core::{CustomerFilter, ProductFilter, SaleFilter, SaleStatus};
use sqlx::{QueryBuilder, Sqlite};

/// A filter that can render itself as a SQL predicate.
pub trait SqlFilter {
    /// Appends one predicate, binding its values.
    fn push_sql(&self, qb: &mut QueryBuilder<'_, Sqlite>);
}

/// Appends `WHERE a AND b AND ...`, or nothing for an empty slice.
pub fn push_where<F: SqlFilter>(qb: &mut QueryBuilder<'_, Sqlite>, filters: &[F]) {
    for (i, filter) in filters.iter().enumerate() {
        qb.push(if i == 0 { " WHERE (" } else { " AND (" });
        filter.push_sql(qb);
        qb.push(")");
    }
}

/// Escapes `%`, `_` and the escape character itself for a `LIKE ... ESCAPE '\'`.
pub fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

impl SqlFilter for CustomerFilter {
    fn push_sql(&self, qb: &mut QueryBuilder<'_, Sqlite>) {
        match self {
            CustomerFilter::NameContains(needle) => {
                qb.push("name_search LIKE ");
                qb.push_bind(format!("%{}%", escape_like(&needle.to_lowercase())));
                qb.push(" ESCAPE '\\'");
            }
        }
    }
}

impl SqlFilter for ProductFilter {
    fn push_sql(&self, qb: &mut QueryBuilder<'_, Sqlite>) {
        match self {
            ProductFilter::Active => {
                qb.push("active = 1");
            }
            ProductFilter::Category(category) => {
                qb.push("category = ");
                qb.push_bind(category.clone());
            }
            ProductFilter::LowStock { limit } => {
                qb.push("stock <= ");
                qb.push_bind(*limit);
            }
        }
    }
}

impl SqlFilter for SaleFilter {
    fn push_sql(&self, qb: &mut QueryBuilder<'_, Sqlite>) {
        match *self {
            SaleFilter::Completed => {
                qb.push("status = ");
                qb.push_bind(SaleStatus::Completed);
            }
            SaleFilter::Period { start, end } => {
                qb.push("sale_date BETWEEN ");
                qb.push_bind(start);
                qb.push(" AND ");
                qb.push_bind(end);
            }
            SaleFilter::OnDate(date) => {
                qb.push("sale_date = ");
                qb.push_bind(date);
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
