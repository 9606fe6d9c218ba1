//! # Repository Module
//!
//! Database repository implementations for PDV.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Write Path (every repository)                        │
//! │                                                                         │
//! │  Caller                                                                │
//! │       │  db.sale_items().update(id, SaleItemChanges { .. })            │
//! │       ▼                                                                 │
//! │  BEGIN                                                                 │
//! │       │                                                                 │
//! │       ├── load row (missing → NotFound)                                │
//! │       ├── apply whitelisted changes, touch updated_at                  │
//! │       ├── validate (pdv-core)                                          │
//! │       ├── derive (sale items: subtotal = quantity × unit_price)        │
//! │       ├── UPDATE                                                       │
//! │       ▼                                                                 │
//! │  COMMIT  (any error above drops the transaction → ROLLBACK)           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Relationships are explicit queries: `find_by_customer`, `find_by_sale`,
//! `find_by_product`, `product_name`. Nothing is loaded lazily.
//!
//! ## Available Repositories
//!
//! - [`UserRepository`](user::UserRepository) - Operators
//! - [`CustomerRepository`](customer::CustomerRepository) - Customers and name search
//! - [`ProductRepository`](product::ProductRepository) - Catalog, barcode lookup, stock filters
//! - [`SaleRepository`](sale::SaleRepository) - Sales, period filters, recording a sale with items
//! - [`SaleItemRepository`](sale_item::SaleItemRepository) - Line items with derived subtotal

use uuid::Uuid;

pub mod customer;
pub mod product;
pub mod sale;
pub mod sale_item;
pub mod scope;
pub mod user;

/// Generates a new record ID (UUID v4).
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Test Fixtures
// =============================================================================
