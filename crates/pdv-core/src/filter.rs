//! # Query Filters
//!
//! Named predicates over collections of records. Each filter has a pure
//! in-memory form here; pdv-db translates the same enum into a SQL `WHERE`
//! clause so both sides agree on what a filter means.
//!
//! | Filter | Record | Predicate |
//! |---|---|---|
//! | `CustomerFilter::NameContains` | Customer | case-insensitive substring on name |
//! | `ProductFilter::Active` | Product | `active` |
//! | `ProductFilter::Category` | Product | exact category |
//! | `ProductFilter::LowStock` | Product | `stock <= limit` |
//! | `SaleFilter::Completed` | Sale | status is `concluida` |
//! | `SaleFilter::Period` | Sale | `start <= sale_date <= end` |
//! | `SaleFilter::OnDate` | Sale | `sale_date == date` |

use chrono::{Local, NaiveDate};

use crate::types::{Customer, Product, Sale, SaleStatus};
use crate::DEFAULT_LOW_STOCK_LIMIT;

/// A named predicate over records of type `T`.
pub trait Filter<T> {
    fn matches(&self, record: &T) -> bool;
}

/// Keeps the records that satisfy every filter (filters combine with AND).
///
/// ## Example
/// ```rust,ignore
/// let low = select(&products, &[ProductFilter::Active, ProductFilter::low_stock()]);
/// ```
pub fn select<'a, T, F>(records: &'a [T], filters: &[F]) -> Vec<&'a T>
where
    F: Filter<T>,
{
    records
        .iter()
        .filter(|record| filters.iter().all(|f| f.matches(record)))
        .collect()
}

// =============================================================================
// Customer
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CustomerFilter {
    /// Case-insensitive substring match on the name.
    NameContains(String),
}

impl Filter<Customer> for CustomerFilter {
    fn matches(&self, customer: &Customer) -> bool {
        match self {
            CustomerFilter::NameContains(needle) => customer
                .name
                .to_lowercase()
                .contains(&needle.to_lowercase()),
        }
    }
}

// =============================================================================
// Product
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProductFilter {
    /// Only products offered for sale.
    Active,
    /// Exact category match.
    Category(String),
    /// Stock at or below `limit`.
    LowStock { limit: i64 },
}

impl ProductFilter {
    /// Low stock with the default limit of 10 units.
    pub const fn low_stock() -> Self {
        ProductFilter::LowStock {
            limit: DEFAULT_LOW_STOCK_LIMIT,
        }
    }
}

impl Filter<Product> for ProductFilter {
    fn matches(&self, product: &Product) -> bool {
        match self {
            ProductFilter::Active => product.active,
            ProductFilter::Category(category) => {
                product.category.as_deref() == Some(category.as_str())
            }
            ProductFilter::LowStock { limit } => product.stock <= *limit,
        }
    }
}

// =============================================================================
// Sale
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaleFilter {
    /// Status is completed (`concluida`).
    Completed,
    /// Sale date within the inclusive range.
    Period { start: NaiveDate, end: NaiveDate },
    /// Sale date equal to the given day.
    OnDate(NaiveDate),
}

impl SaleFilter {
    /// Sales dated today, by the local clock.
    pub fn today() -> Self {
        SaleFilter::OnDate(Local::now().date_naive())
    }
}

impl Filter<Sale> for SaleFilter {
    fn matches(&self, sale: &Sale) -> bool {
        match self {
            SaleFilter::Completed => sale.status == SaleStatus::Completed,
            SaleFilter::Period { start, end } => *start <= sale.sale_date && sale.sale_date <= *end,
            SaleFilter::OnDate(date) => sale.sale_date == *date,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
