//! # Derivation Rules
//!
//! Keeps computed monetary fields consistent with their inputs.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Where Derivations Run                                │
//! │                                                                         │
//! │  SaleItem write (insert / update / record)                             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  validate ──► recompute_subtotal ──► INSERT/UPDATE ──► COMMIT          │
//! │               (last step before SQL, same transaction)                 │
//! │                                                                         │
//! │  Sale read                                                             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  net_total(sale) = total - discount   (never stored, never cached)    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{Sale, SaleItem};

/// Computes `quantity × unit_price` without wrapping.
///
/// ## Example
/// ```rust
/// use pdv_core::derivation::line_subtotal;
/// use pdv_core::Money;
///
/// let subtotal = line_subtotal(3, Money::from_cents(1099)).unwrap();
/// assert_eq!(subtotal.cents(), 3297);
/// ```
pub fn line_subtotal(quantity: i64, unit_price: Money) -> CoreResult<Money> {
    unit_price
        .checked_multiply_quantity(quantity)
        .ok_or(CoreError::AmountOverflow {
            quantity,
            unit_price_cents: unit_price.cents(),
        })
}

/// Overwrites `item.subtotal` with `quantity × unit_price`.
///
/// Whatever the item carried before is discarded. The repository calls this
/// as the last step before every sale item write; on error the item is left
/// untouched and nothing is written.
pub fn recompute_subtotal(item: &mut SaleItem) -> CoreResult<()> {
    item.subtotal = line_subtotal(item.quantity, item.unit_price)?;
    Ok(())
}

/// Net total of a sale: `total - discount`.
#[inline]
pub fn net_total(sale: &Sale) -> Money {
    sale.total - sale.discount
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PaymentMethod, SaleStatus};
    use chrono::{NaiveDate, Utc};

    fn item(quantity: i64, unit_price: i64, subtotal: i64) -> SaleItem {
        let now = Utc::now();
        SaleItem {
            id: "item".to_string(),
            sale_id: "sale".to_string(),
            product_id: "product".to_string(),
            quantity,
            unit_price: Money::from_cents(unit_price),
            subtotal: Money::from_cents(subtotal),
            created_at: now,
            updated_at: now,
        }
    }

    fn sale(total: i64, discount: i64) -> Sale {
        let now = Utc::now();
        Sale {
            id: "sale".to_string(),
            customer_id: "customer".to_string(),
            user_id: "user".to_string(),
            sale_date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            total: Money::from_cents(total),
            discount: Money::from_cents(discount),
            payment_method: PaymentMethod::Dinheiro,
            status: SaleStatus::Completed,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_recompute_overwrites_supplied_subtotal() {
        let mut it = item(3, 1099, 1);
        recompute_subtotal(&mut it).unwrap();
        assert_eq!(it.subtotal.cents(), 3297);
    }

    #[test]
    fn test_recompute_is_stable_across_repeated_updates() {
        let mut it = item(1, 333, 0);
        for quantity in 1..=50 {
            it.quantity = quantity;
            recompute_subtotal(&mut it).unwrap();
            assert_eq!(it.subtotal.cents(), 333 * quantity);
        }
    }

    #[test]
    fn test_zero_price_gives_zero_subtotal() {
        let mut it = item(7, 0, 99);
        recompute_subtotal(&mut it).unwrap();
        assert_eq!(it.subtotal, Money::zero());
    }

    #[test]
    fn test_overflow_never_wraps_negative() {
        let mut it = item(2, i64::MAX, 5);
        let err = recompute_subtotal(&mut it).unwrap_err();
        assert!(matches!(err, CoreError::AmountOverflow { quantity: 2, .. }));
        assert_eq!(it.subtotal.cents(), 5);
    }

    #[test]
    fn test_net_total_reflects_changes_immediately() {
        let mut s = sale(10_000, 1_500);
        assert_eq!(net_total(&s).cents(), 8_500);

        s.discount = Money::from_cents(2_000);
        assert_eq!(s.net_total().cents(), 8_000);

        s.total = Money::from_cents(1_000);
        assert_eq!(s.net_total().cents(), -1_000);
    }
}
