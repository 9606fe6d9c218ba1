//! # Whitelisted Inputs
//!
//! Every way a caller can create or change a record goes through one of the
//! types below. A field missing from the type cannot be set, so `id`,
//! timestamps and the derived `subtotal` are out of reach at compile time.
//!
//! ## Mass Assignment
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  External JSON map                                                      │
//! │  { "total": 5000, "id": "evil" }                                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SaleChanges::from_json(value)                                          │
//! │       │                                                                 │
//! │       ├── every key whitelisted?  ──► Ok(SaleChanges)                   │
//! │       │                                                                 │
//! │       └── "id" is not ──► Err(NotFillable { entity: "Sale",             │
//! │                                             field: "id" })             │
//! │                                                                         │
//! │  Policy: non-whitelisted keys are REJECTED, never silently dropped.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Nullable Fields in Changes
//! `Option<Option<T>>`: key absent → `None` (leave as is), `null` →
//! `Some(None)` (clear), value → `Some(Some(v))` (set).

use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{Customer, PaymentMethod, Product, Sale, SaleItem, SaleStatus, User};
use crate::validation::ValidationResult;

// =============================================================================
// Fillable
// =============================================================================

/// An input type that can be mass-assigned from an external JSON map.
pub trait Fillable: DeserializeOwned {
    /// Entity name used in rejection messages.
    const ENTITY: &'static str;

    /// Deserializes a whitelisted input, rejecting unknown keys.
    ///
    /// ## Example
    /// ```rust
    /// use pdv_core::input::{Fillable, SaleChanges};
    /// use pdv_core::ValidationError;
    ///
    /// let err = SaleChanges::from_json(serde_json::json!({ "id": "x" })).unwrap_err();
    /// assert!(matches!(err, ValidationError::NotFillable { .. }));
    /// ```
    fn from_json(value: serde_json::Value) -> ValidationResult<Self> {
        serde_json::from_value(value).map_err(|err| classify(Self::ENTITY, &err))
    }
}

/// Maps a serde rejection onto the validation taxonomy.
///
/// serde_json exposes no structured error kind for these cases, so the
/// field is read from the message serde's derive emits:
/// ``unknown field `x`, expected one of ...`` under `deny_unknown_fields`
/// and ``missing field `x` `` for absent required fields. Anything else is
/// reported as `InvalidFormat`.
fn classify(entity: &str, err: &serde_json::Error) -> ValidationError {
    let message = err.to_string();

    if let Some(field) = backticked_after(&message, "unknown field `") {
        return ValidationError::NotFillable {
            entity: entity.to_string(),
            field,
        };
    }
    if let Some(field) = backticked_after(&message, "missing field `") {
        return ValidationError::Required { field };
    }

    ValidationError::InvalidFormat {
        field: entity.to_string(),
        reason: message,
    }
}

fn backticked_after(message: &str, marker: &str) -> Option<String> {
    let start = message.find(marker)? + marker.len();
    let rest = &message[start..];
    let end = rest.find('`')?;
    Some(rest[..end].to_string())
}

fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn default_true() -> bool {
    true
}

// =============================================================================
// User
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewUser {
    pub name: String,
    pub email: String,
}

impl Fillable for NewUser {
    const ENTITY: &'static str = "User";
}

impl NewUser {
    pub fn into_user(self, id: String, now: DateTime<Utc>) -> User {
        User {
            id,
            name: self.name,
            email: self.email,
            created_at: now,
        }
    }
}

// =============================================================================
// Customer
// =============================================================================

/// Fillable fields of a new customer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewCustomer {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub tax_id: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
}

impl Fillable for NewCustomer {
    const ENTITY: &'static str = "Customer";
}

impl NewCustomer {
    pub fn into_customer(self, id: String, now: DateTime<Utc>) -> Customer {
        Customer {
            id,
            name: self.name,
            email: self.email,
            phone: self.phone,
            tax_id: self.tax_id,
            address: self.address,
            city: self.city,
            state: self.state,
            postal_code: self.postal_code,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Fillable fields of a customer update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CustomerChanges {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub phone: Option<Option<String>>,
    #[serde(default)]
    pub tax_id: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub address: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub city: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub state: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub postal_code: Option<Option<String>>,
}

impl Fillable for CustomerChanges {
    const ENTITY: &'static str = "Customer";
}

impl CustomerChanges {
    pub fn apply(self, customer: &mut Customer, now: DateTime<Utc>) {
        if let Some(name) = self.name {
            customer.name = name;
        }
        if let Some(email) = self.email {
            customer.email = email;
        }
        if let Some(phone) = self.phone {
            customer.phone = phone;
        }
        if let Some(tax_id) = self.tax_id {
            customer.tax_id = tax_id;
        }
        if let Some(address) = self.address {
            customer.address = address;
        }
        if let Some(city) = self.city {
            customer.city = city;
        }
        if let Some(state) = self.state {
            customer.state = state;
        }
        if let Some(postal_code) = self.postal_code {
            customer.postal_code = postal_code;
        }
        customer.updated_at = now;
    }
}

// =============================================================================
// Product
// =============================================================================

/// Fillable fields of a new product.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewProduct {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Money,
    #[serde(default)]
    pub stock: i64,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub barcode: Option<String>,
    #[serde(default = "default_true")]
    pub active: bool,
}

impl Fillable for NewProduct {
    const ENTITY: &'static str = "Product";
}

impl NewProduct {
    /// An active product with no stock, category, barcode or description.
    pub fn new(name: impl Into<String>, price: Money) -> Self {
        NewProduct {
            name: name.into(),
            description: None,
            price,
            stock: 0,
            category: None,
            barcode: None,
            active: true,
        }
    }

    pub fn into_product(self, id: String, now: DateTime<Utc>) -> Product {
        Product {
            id,
            name: self.name,
            description: self.description,
            price: self.price,
            stock: self.stock,
            category: self.category,
            barcode: self.barcode,
            active: self.active,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Fillable fields of a product update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProductChanges {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(default)]
    pub price: Option<Money>,
    #[serde(default)]
    pub stock: Option<i64>,
    #[serde(default, deserialize_with = "double_option")]
    pub category: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub barcode: Option<Option<String>>,
    #[serde(default)]
    pub active: Option<bool>,
}

impl Fillable for ProductChanges {
    const ENTITY: &'static str = "Product";
}

impl ProductChanges {
    pub fn apply(self, product: &mut Product, now: DateTime<Utc>) {
        if let Some(name) = self.name {
            product.name = name;
        }
        if let Some(description) = self.description {
            product.description = description;
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(stock) = self.stock {
            product.stock = stock;
        }
        if let Some(category) = self.category {
            product.category = category;
        }
        if let Some(barcode) = self.barcode {
            product.barcode = barcode;
        }
        if let Some(active) = self.active {
            product.active = active;
        }
        product.updated_at = now;
    }
}

// =============================================================================
// Sale
// =============================================================================

/// Fillable fields of a new sale.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewSale {
    pub customer_id: String,
    /// Supplied by the identity collaborator.
    pub user_id: String,
    pub sale_date: NaiveDate,
    pub total: Money,
    #[serde(default)]
    pub discount: Money,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub status: SaleStatus,
    #[serde(default)]
    pub notes: Option<String>,
}

impl Fillable for NewSale {
    const ENTITY: &'static str = "Sale";
}

impl NewSale {
    pub fn into_sale(self, id: String, now: DateTime<Utc>) -> Sale {
        Sale {
            id,
            customer_id: self.customer_id,
            user_id: self.user_id,
            sale_date: self.sale_date,
            total: self.total,
            discount: self.discount,
            payment_method: self.payment_method,
            status: self.status,
            notes: self.notes,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Fillable fields of a sale update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SaleChanges {
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub sale_date: Option<NaiveDate>,
    #[serde(default)]
    pub total: Option<Money>,
    #[serde(default)]
    pub discount: Option<Money>,
    #[serde(default)]
    pub payment_method: Option<PaymentMethod>,
    #[serde(default)]
    pub status: Option<SaleStatus>,
    #[serde(default, deserialize_with = "double_option")]
    pub notes: Option<Option<String>>,
}

impl Fillable for SaleChanges {
    const ENTITY: &'static str = "Sale";
}

impl SaleChanges {
    pub fn apply(self, sale: &mut Sale, now: DateTime<Utc>) {
        if let Some(customer_id) = self.customer_id {
            sale.customer_id = customer_id;
        }
        if let Some(user_id) = self.user_id {
            sale.user_id = user_id;
        }
        if let Some(sale_date) = self.sale_date {
            sale.sale_date = sale_date;
        }
        if let Some(total) = self.total {
            sale.total = total;
        }
        if let Some(discount) = self.discount {
            sale.discount = discount;
        }
        if let Some(payment_method) = self.payment_method {
            sale.payment_method = payment_method;
        }
        if let Some(status) = self.status {
            sale.status = status;
        }
        if let Some(notes) = self.notes {
            sale.notes = notes;
        }
        sale.updated_at = now;
    }
}

// =============================================================================
// Sale Item
// =============================================================================

/// Fillable fields of a new sale item.
///
/// There is no `subtotal`: the write path derives it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewSaleItem {
    pub sale_id: String,
    pub product_id: String,
    pub quantity: i64,
    /// Price captured at sale time, independent of the product's current price.
    pub unit_price: Money,
}

impl Fillable for NewSaleItem {
    const ENTITY: &'static str = "SaleItem";
}

impl NewSaleItem {
    /// Builds the record with a zero subtotal; the repository derives the
    /// real value immediately before writing.
    pub fn into_sale_item(self, id: String, now: DateTime<Utc>) -> SaleItem {
        SaleItem {
            id,
            sale_id: self.sale_id,
            product_id: self.product_id,
            quantity: self.quantity,
            unit_price: self.unit_price,
            subtotal: Money::zero(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Fillable fields of a sale item update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SaleItemChanges {
    #[serde(default)]
    pub sale_id: Option<String>,
    #[serde(default)]
    pub product_id: Option<String>,
    #[serde(default)]
    pub quantity: Option<i64>,
    #[serde(default)]
    pub unit_price: Option<Money>,
}

impl Fillable for SaleItemChanges {
    const ENTITY: &'static str = "SaleItem";
}

impl SaleItemChanges {
    pub fn apply(self, item: &mut SaleItem, now: DateTime<Utc>) {
        if let Some(sale_id) = self.sale_id {
            item.sale_id = sale_id;
        }
        if let Some(product_id) = self.product_id {
            item.product_id = product_id;
        }
        if let Some(quantity) = self.quantity {
            item.quantity = quantity;
        }
        if let Some(unit_price) = self.unit_price {
            item.unit_price = unit_price;
        }
        item.updated_at = now;
    }
}

/// One line of a sale recorded together with its items.
///
/// Without a `unit_price` the product's price at the moment of recording
/// is captured.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SaleLine {
    pub product_id: String,
    pub quantity: i64,
    #[serde(default)]
    pub unit_price: Option<Money>,
}

impl Fillable for SaleLine {
    const ENTITY: &'static str = "SaleItem";
}

// =============================================================================
// Unit Tests
// =============================================================================
