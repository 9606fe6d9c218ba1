//! # Validation Module
//!
//! Field rules checked by the repository write path before any SQL runs.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Input types (pdv-core::input)                                │
//! │  └── Whitelist: unknown fields are rejected at deserialization         │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE (Validate trait on each entity)                  │
//! │  ├── Required text, lengths                                            │
//! │  ├── CPF / CNPJ check digits, UF, CEP, barcode                         │
//! │  └── Quantity > 0, amounts >= 0, FK ids are UUIDs                      │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / UNIQUE constraints                                     │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{Customer, Product, Sale, SaleItem, User};
use crate::MAX_NAME_LENGTH;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// The 27 Brazilian federative units.
pub const STATE_CODES: [&str; 27] = [
    "AC", "AL", "AP", "AM", "BA", "CE", "DF", "ES", "GO", "MA", "MT", "MS", "MG", "PA", "PB",
    "PR", "PE", "PI", "RJ", "RN", "RS", "RO", "RR", "SC", "SP", "SE", "TO",
];

// =============================================================================
// Validate Trait
// =============================================================================

/// Whole-record validation, run after inputs are applied and before a write.
pub trait Validate {
    fn validate(&self) -> ValidationResult<()>;
}

impl Validate for User {
    fn validate(&self) -> ValidationResult<()> {
        validate_name("name", &self.name)?;
        validate_email(&self.email)
    }
}

impl Validate for Customer {
    fn validate(&self) -> ValidationResult<()> {
        validate_name("name", &self.name)?;
        validate_email(&self.email)?;
        validate_tax_id(&self.tax_id)?;
        if let Some(state) = &self.state {
            validate_state_code(state)?;
        }
        if let Some(cep) = &self.postal_code {
            validate_postal_code(cep)?;
        }
        Ok(())
    }
}

impl Validate for Product {
    fn validate(&self) -> ValidationResult<()> {
        validate_name("name", &self.name)?;
        validate_non_negative("price", self.price)?;
        if let Some(barcode) = &self.barcode {
            validate_barcode(barcode)?;
        }
        Ok(())
    }
}

impl Validate for Sale {
    fn validate(&self) -> ValidationResult<()> {
        validate_uuid("customer_id", &self.customer_id)?;
        validate_uuid("user_id", &self.user_id)?;
        validate_non_negative("total", self.total)?;
        validate_non_negative("discount", self.discount)
    }
}

impl Validate for SaleItem {
    fn validate(&self) -> ValidationResult<()> {
        validate_uuid("sale_id", &self.sale_id)?;
        validate_uuid("product_id", &self.product_id)?;
        validate_quantity(self.quantity)?;
        validate_non_negative("unit_price", self.unit_price)
    }
}

// =============================================================================
// String Validators
// =============================================================================

/// Validates a required display name.
///
/// ## Rules
/// - Must not be blank
/// - At most MAX_NAME_LENGTH characters
pub fn validate_name(field: &str, name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LENGTH,
        });
    }

    Ok(())
}

/// Validates the shape of an email address: `local@domain.tld`, no spaces.
pub fn validate_email(email: &str) -> ValidationResult<()> {
    let email = email.trim();
    if email.is_empty() {
        return Err(ValidationError::Required {
            field: "email".to_string(),
        });
    }

    let well_formed = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };

    if !well_formed {
        return Err(ValidationError::InvalidFormat {
            field: "email".to_string(),
            reason: "expected local@domain".to_string(),
        });
    }

    Ok(())
}

/// Validates a two-letter UF code (case-sensitive, upper case).
pub fn validate_state_code(state: &str) -> ValidationResult<()> {
    if STATE_CODES.contains(&state) {
        Ok(())
    } else {
        Err(ValidationError::InvalidFormat {
            field: "state".to_string(),
            reason: "must be a two-letter UF code such as SP".to_string(),
        })
    }
}

/// Validates a CEP: 8 digits, optionally written `NNNNN-NNN`.
pub fn validate_postal_code(cep: &str) -> ValidationResult<()> {
    let digits: String = cep.chars().filter(|c| *c != '-').collect();
    if digits.len() == 8 && digits.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err(ValidationError::InvalidFormat {
            field: "postal_code".to_string(),
            reason: "CEP must have 8 digits".to_string(),
        })
    }
}

/// Validates an EAN-8, UPC-A, EAN-13 or GTIN-14 barcode (digits only).
pub fn validate_barcode(barcode: &str) -> ValidationResult<()> {
    let len = barcode.len();
    if matches!(len, 8 | 12 | 13 | 14) && barcode.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err(ValidationError::InvalidFormat {
            field: "barcode".to_string(),
            reason: "must be 8, 12, 13 or 14 digits".to_string(),
        })
    }
}

// =============================================================================
// Tax Identifier (CPF / CNPJ)
// =============================================================================

/// Which document a tax identifier holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaxIdKind {
    /// Individual taxpayer, 11 digits.
    Cpf,
    /// Company, 14 digits.
    Cnpj,
}

/// Validates a CPF or CNPJ, with or without punctuation.
///
/// ## Example
/// ```rust
/// use pdv_core::validation::{validate_tax_id, TaxIdKind};
///
/// assert_eq!(validate_tax_id("529.982.247-25").unwrap(), TaxIdKind::Cpf);
/// assert_eq!(validate_tax_id("11.222.333/0001-81").unwrap(), TaxIdKind::Cnpj);
/// assert!(validate_tax_id("529.982.247-24").is_err());
/// ```
pub fn validate_tax_id(tax_id: &str) -> ValidationResult<TaxIdKind> {
    let invalid = |reason: &str| ValidationError::InvalidFormat {
        field: "tax_id".to_string(),
        reason: reason.to_string(),
    };

    if tax_id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "tax_id".to_string(),
        });
    }

    let mut digits = Vec::with_capacity(14);
    for c in tax_id.trim().chars() {
        match c {
            '0'..='9' => digits.push(c as u32 - '0' as u32),
            '.' | '-' | '/' => {}
            _ => return Err(invalid("only digits and . - / are allowed")),
        }
    }

    if !matches!(digits.len(), 11 | 14) {
        return Err(invalid("must have 11 (CPF) or 14 (CNPJ) digits"));
    }

    // Repeated digits pass the checksum but are never issued.
    if digits.windows(2).all(|w| w[0] == w[1]) {
        return Err(invalid("repeated digits"));
    }

    match digits.len() {
        11 => {
            if cpf_check_digits(&digits[..9]) == [digits[9], digits[10]] {
                Ok(TaxIdKind::Cpf)
            } else {
                Err(invalid("CPF check digits do not match"))
            }
        }
        14 => {
            if cnpj_check_digits(&digits[..12]) == [digits[12], digits[13]] {
                Ok(TaxIdKind::Cnpj)
            } else {
                Err(invalid("CNPJ check digits do not match"))
            }
        }
        _ => Err(invalid("must have 11 (CPF) or 14 (CNPJ) digits")),
    }
}

/// Check digits for the first nine digits of a CPF.
pub fn cpf_check_digits(base: &[u32]) -> [u32; 2] {
    let first = cpf_digit(base);
    let mut extended = base.to_vec();
    extended.push(first);
    [first, cpf_digit(&extended)]
}

fn cpf_digit(digits: &[u32]) -> u32 {
    let top = digits.len() as u32 + 1;
    let sum: u32 = digits
        .iter()
        .enumerate()
        .map(|(i, d)| d * (top - i as u32))
        .sum();
    let rest = (sum * 10) % 11;
    if rest == 10 {
        0
    } else {
        rest
    }
}

/// Check digits for the first twelve digits of a CNPJ.
pub fn cnpj_check_digits(base: &[u32]) -> [u32; 2] {
    const FIRST: [u32; 12] = [5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];
    const SECOND: [u32; 13] = [6, 5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];

    let first = cnpj_digit(base, &FIRST);
    let mut extended = base.to_vec();
    extended.push(first);
    [first, cnpj_digit(&extended, &SECOND)]
}

fn cnpj_digit(digits: &[u32], weights: &[u32]) -> u32 {
    let sum: u32 = digits.iter().zip(weights).map(|(d, w)| d * w).sum();
    let rest = sum % 11;
    if rest < 2 {
        0
    } else {
        11 - rest
    }
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a sale item quantity.
///
/// ## Rules
/// - Must be positive (> 0)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    Ok(())
}

/// Validates a monetary amount that may be zero but not negative.
///
/// ## Example
/// ```rust
/// use pdv_core::validation::validate_non_negative;
/// use pdv_core::Money;
///
/// assert!(validate_non_negative("price", Money::from_cents(1099)).is_ok());
/// assert!(validate_non_negative("price", Money::zero()).is_ok());
/// assert!(validate_non_negative("price", Money::from_cents(-1)).is_err());
/// ```
pub fn validate_non_negative(field: &str, amount: Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

// =============================================================================
// UUID Validators
// =============================================================================

/// Validates a UUID string used as a record identity or foreign key.
pub fn validate_uuid(field: &str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name() {
        assert!(validate_name("name", "Maria da Silva").is_ok());
        assert!(validate_name("name", "").is_err());
        assert!(validate_name("name", "   ").is_err());
        assert!(validate_name("name", &"A".repeat(300)).is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("maria@example.com.br").is_ok());
        assert!(validate_email("").is_err());
        assert!(validate_email("maria").is_err());
        assert!(validate_email("maria@localhost").is_err());
        assert!(validate_email("a@b@c.com").is_err());
        assert!(validate_email("ma ria@example.com").is_err());
    }

    #[test]
    fn test_validate_cpf() {
        assert_eq!(validate_tax_id("52998224725").unwrap(), TaxIdKind::Cpf);
        assert_eq!(validate_tax_id("529.982.247-25").unwrap(), TaxIdKind::Cpf);
        assert!(validate_tax_id("529.982.247-24").is_err());
        assert!(validate_tax_id("111.111.111-11").is_err());
        assert!(validate_tax_id("5299822472").is_err());
    }

    #[test]
    fn test_validate_cnpj() {
        assert_eq!(validate_tax_id("11222333000181").unwrap(), TaxIdKind::Cnpj);
        assert_eq!(
            validate_tax_id("11.222.333/0001-81").unwrap(),
            TaxIdKind::Cnpj
        );
        assert!(validate_tax_id("11.222.333/0001-80").is_err());
        assert!(validate_tax_id("00000000000000").is_err());
    }

    #[test]
    fn test_validate_tax_id_rejects_letters() {
        let err = validate_tax_id("529.982.247-2X").unwrap_err();
        assert!(matches!(err, ValidationError::InvalidFormat { .. }));
        assert!(matches!(
            validate_tax_id(" ").unwrap_err(),
            ValidationError::Required { .. }
        ));
    }

    #[test]
    fn test_cpf_check_digits_generation() {
        assert_eq!(cpf_check_digits(&[5, 2, 9, 9, 8, 2, 2, 4, 7]), [2, 5]);
    }

    #[test]
    fn test_validate_state_and_cep() {
        assert!(validate_state_code("SP").is_ok());
        assert!(validate_state_code("DF").is_ok());
        assert!(validate_state_code("sp").is_err());
        assert!(validate_state_code("XX").is_err());

        assert!(validate_postal_code("01310-100").is_ok());
        assert!(validate_postal_code("01310100").is_ok());
        assert!(validate_postal_code("0131010").is_err());
        assert!(validate_postal_code("0131A100").is_err());
    }

    #[test]
    fn test_validate_barcode() {
        assert!(validate_barcode("7891000315507").is_ok());
        assert!(validate_barcode("96385074").is_ok());
        assert!(validate_barcode("12345").is_err());
        assert!(validate_barcode("789100031550X").is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(1000).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
    }

    #[test]
    fn test_validate_uuid() {
        assert!(validate_uuid("id", "550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_uuid("id", "").is_err());
        assert!(validate_uuid("id", "not-a-uuid").is_err());
    }
}
