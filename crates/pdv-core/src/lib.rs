//! # pdv-core: Entities and Business Rules for PDV
//!
//! Pure types and rules for a retail point of sale: customers, products,
//! sales and sale items. No I/O happens here; pdv-db persists what this
//! crate defines.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          PDV Architecture                               │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │            Caller (HTTP / CLI front end, not in this repo)      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ NewSale, SaleChanges, filters          │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ pdv-core (THIS CRATE) ★                         │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌────────────┐ ┌────────┐ ┌────────┐ │   │
//! │  │   │  types  │ │  input  │ │ derivation │ │ filter │ │ valid. │ │   │
//! │  │   │ Sale    │ │ New*    │ │ subtotal   │ │ scopes │ │ CPF    │ │   │
//! │  │   │ Product │ │ Changes │ │ net total  │ │        │ │ CNPJ   │ │   │
//! │  │   └─────────┘ └─────────┘ └────────────┘ └────────┘ └────────┘ │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    pdv-db (Database Layer)                      │   │
//! │  │            SQLite repositories, migrations, seed                │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Customer, Product, Sale, SaleItem, User
//! - [`money`] - Fixed-point money in centavos
//! - [`input`] - Whitelisted create/update inputs and mass assignment
//! - [`derivation`] - Sale item subtotal and sale net total
//! - [`filter`] - Named query filters
//! - [`validation`] - Field rules (CPF/CNPJ, UF, CEP, barcode, ...)
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use pdv_core::{derivation, Money, NewSaleItem};
//! use chrono::Utc;
//!
//! let mut item = NewSaleItem {
//!     sale_id: "sale".into(),
//!     product_id: "product".into(),
//!     quantity: 3,
//!     unit_price: Money::from_cents(1099),
//! }
//! .into_sale_item("item".into(), Utc::now());
//!
//! derivation::recompute_subtotal(&mut item).unwrap();
//! assert_eq!(item.subtotal, Money::from_cents(3297));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod derivation;
pub mod error;
pub mod filter;
pub mod input;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use filter::{CustomerFilter, Filter, ProductFilter, SaleFilter};
pub use input::{
    CustomerChanges, Fillable, NewCustomer, NewProduct, NewSale, NewSaleItem, NewUser,
    ProductChanges, SaleChanges, SaleItemChanges, SaleLine,
};
pub use money::Money;
pub use types::*;
pub use validation::Validate;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Stock level at or below which a product counts as low stock.
pub const DEFAULT_LOW_STOCK_LIMIT: i64 = 10;

/// Maximum length of a display name (customers, products, operators).
pub const MAX_NAME_LENGTH: usize = 200;
