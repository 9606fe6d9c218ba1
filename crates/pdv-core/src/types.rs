//! # Domain Types
//!
//! The four PDV records plus the operator who rings up a sale.
//!
//! ## Entity Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────┐ 1     * ┌─────────────┐ 1     * ┌─────────────────┐   │
//! │  │  Customer   │────────►│    Sale     │────────►│    SaleItem     │   │
//! │  │  tax_id     │         │  total      │         │  quantity       │   │
//! │  │  (CPF/CNPJ) │         │  discount   │         │  unit_price     │   │
//! │  └─────────────┘         │  status     │         │  subtotal (der.)│   │
//! │                          └──────▲──────┘         └────────▲────────┘   │
//! │  ┌─────────────┐ 1            * │                         │ *          │
//! │  │    User     │────────────────┘                         │ 1          │
//! │  │ (operator)  │                                 ┌────────┴────────┐   │
//! │  └─────────────┘                                 │    Product      │   │
//! │                                                  │  price, stock   │   │
//! │                                                  └─────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Relationships are foreign-key columns only. Traversal is an explicit
//! repository query in pdv-db, never a lazily loaded field.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::derivation;
use crate::money::Money;

// =============================================================================
// User
// =============================================================================

/// The operator who records sales.
///
/// Owned by the identity collaborator; stored here so `Sale.user_id` has a
/// row to reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Customer
// =============================================================================

/// A customer of the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Customer {
    /// Unique identifier (UUID v4).
    pub id: String,

    pub name: String,

    /// Contact email. Intended unique; not enforced by storage.
    pub email: String,

    pub phone: Option<String>,

    /// CPF (11 digits) or CNPJ (14 digits), punctuation allowed.
    pub tax_id: String,

    pub address: Option<String>,

    pub city: Option<String>,

    /// Two-letter UF code (e.g. "SP").
    pub state: Option<String>,

    /// CEP.
    pub postal_code: Option<String>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Product
// =============================================================================

/// A product available for sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name shown to the cashier and on receipts.
    pub name: String,

    pub description: Option<String>,

    /// Current selling price.
    pub price: Money,

    /// Units on hand. Unguarded: may reach zero or go below.
    pub stock: i64,

    /// Free-text category.
    pub category: Option<String>,

    /// EAN/GTIN barcode, unique when present.
    pub barcode: Option<String>,

    /// Whether the product is offered for sale.
    pub active: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Sale Status
// =============================================================================

/// The status of a sale.
///
/// Stored and serialized with the store's Portuguese labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[ts(export)]
pub enum SaleStatus {
    /// Recorded but not yet settled.
    #[serde(rename = "pendente")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "pendente"))]
    Pending,
    /// Paid and closed.
    #[serde(rename = "concluida")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "concluida"))]
    Completed,
    /// Cancelled.
    #[serde(rename = "cancelada")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "cancelada"))]
    Cancelled,
}

impl Default for SaleStatus {
    fn default() -> Self {
        SaleStatus::Pending
    }
}

// =============================================================================
// Payment Method
// =============================================================================

/// How a sale was paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum PaymentMethod {
    /// Cash.
    Dinheiro,
    CartaoCredito,
    CartaoDebito,
    /// Instant bank transfer.
    Pix,
    /// Bank slip.
    Boleto,
}

// =============================================================================
// Sale
// =============================================================================

/// A sale to a customer, recorded by an operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Sale {
    pub id: String,
    pub customer_id: String,
    pub user_id: String,
    #[ts(as = "String")]
    pub sale_date: NaiveDate,
    pub total: Money,
    pub discount: Money,
    pub payment_method: PaymentMethod,
    pub status: SaleStatus,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Sale {
    /// Total after discount, computed fresh on every call.
    #[inline]
    pub fn net_total(&self) -> Money {
        derivation::net_total(self)
    }
}

// =============================================================================
// Sale Item
// =============================================================================

/// A line item in a sale.
///
/// `unit_price` is frozen at sale time so later price changes on the
/// product leave history intact. `subtotal` is derived: the repository
/// overwrites it with `quantity × unit_price` on every write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SaleItem {
    pub id: String,
    pub sale_id: String,
    pub product_id: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub subtotal: Money,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================
