//! # Validation Module
//!
//! Input validation utilities for Stockroom.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Presentation (forms)                                         │
//! │  ├── Basic format checks (empty, length)                               │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Repositories / Ledger (Rust)                                 │
//! │  └── THIS MODULE: Business rule validation                             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK constraints (stock never negative)               │
//! │  ├── UNIQUE constraints (city per state)                               │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use stockroom_core::validation::{validate_postal_code, validate_order_quantity};
//!
//! assert!(validate_postal_code("01310100").is_ok());
//! assert!(validate_order_quantity(5).is_ok());
//! ```

use crate::error::ValidationError;
use crate::MAX_NAME_LEN;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Rejects empty or whitespace-only values.
pub fn validate_required(field: &str, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Validates a display name (product, category, party, city).
///
/// ## Rules
/// - Must not be empty
/// - At most [`MAX_NAME_LEN`] characters
pub fn validate_name(field: &str, value: &str) -> ValidationResult<()> {
    validate_required(field, value)?;

    if value.trim().chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok(())
}

/// Validates a phone number.
///
/// ## Rules
/// - Digits only
/// - 10 or 11 digits (area code + 8 or 9 digit number)
///
/// ## Example
/// ```rust
/// use stockroom_core::validation::validate_phone;
///
/// assert!(validate_phone("11987654321").is_ok());
/// assert!(validate_phone("1133334444").is_ok());
/// assert!(validate_phone("(11) 3333-4444").is_err());
/// ```
pub fn validate_phone(phone: &str) -> ValidationResult<()> {
    let phone = phone.trim();
    let digits_only = !phone.is_empty() && phone.chars().all(|c| c.is_ascii_digit());

    if !digits_only || !(10..=11).contains(&phone.len()) {
        return Err(ValidationError::InvalidFormat {
            field: "phone".to_string(),
            reason: "must be 10 or 11 digits".to_string(),
        });
    }

    Ok(())
}

/// Validates an email address.
///
/// Only the shape is checked: a non-empty local part, an `@`, and a domain.
pub fn validate_email(email: &str) -> ValidationResult<()> {
    validate_required("email", email)?;

    let valid = match email.trim().split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty() && !domain.contains('@'),
        None => false,
    };

    if !valid {
        return Err(ValidationError::InvalidFormat {
            field: "email".to_string(),
            reason: "must look like name@domain".to_string(),
        });
    }

    Ok(())
}

/// Validates a postal code (CEP): exactly 8 digits, no separator.
pub fn validate_postal_code(code: &str) -> ValidationResult<()> {
    let code = code.trim();

    if code.len() != 8 || !code.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::InvalidFormat {
            field: "postal code".to_string(),
            reason: "must be 8 digits".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a quantity on an order line.
///
/// ## Rules
/// - Must be positive (> 0)
pub fn validate_order_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    Ok(())
}

/// Validates a stock level (quantity on hand or minimum stock).
///
/// ## Rules
/// - Must be non-negative (>= 0)
pub fn validate_stock_level(field: &str, qty: i64) -> ValidationResult<()> {
    if qty < 0 {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a catalog price in cents.
///
/// ## Rules
/// - Must be positive (> 0); the catalog has no free items
///
/// ## Example
/// ```rust
/// use stockroom_core::validation::validate_price_cents;
///
/// assert!(validate_price_cents(1099).is_ok());
/// assert!(validate_price_cents(0).is_err());
/// assert!(validate_price_cents(-100).is_err());
/// ```
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "price".to_string(),
        });
    }

    Ok(())
}

/// Validates a street number. Zero stands for "no number".
pub fn validate_street_number(number: i64) -> ValidationResult<()> {
    if number < 0 {
        return Err(ValidationError::OutOfRange {
            field: "number".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

// =============================================================================
// UUID Validators
// =============================================================================

/// Validates a UUID string format.
///
/// ## Example
/// ```rust
/// use stockroom_core::validation::validate_uuid;
///
/// assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_uuid("not-a-uuid").is_err());
/// ```
pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
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
        assert!(validate_name("name", "Rice 5kg").is_ok());
        assert!(validate_name("name", "").is_err());
        assert!(validate_name("name", "   ").is_err());
        assert!(validate_name("name", &"A".repeat(300)).is_err());
    }

    #[test]
    fn test_validate_phone() {
        assert!(validate_phone("11987654321").is_ok());
        assert!(validate_phone("1133334444").is_ok());

        assert!(validate_phone("").is_err());
        assert!(validate_phone("123456789").is_err());
        assert!(validate_phone("119876543210").is_err());
        assert!(validate_phone("11-98765432").is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("ana@example.com").is_ok());
        assert!(validate_email("").is_err());
        assert!(validate_email("ana.example.com").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("ana@").is_err());
    }

    #[test]
    fn test_validate_postal_code() {
        assert!(validate_postal_code("01310100").is_ok());
        assert!(validate_postal_code("01310-100").is_err());
        assert!(validate_postal_code("0131010").is_err());
    }

    #[test]
    fn test_validate_quantities() {
        assert!(validate_order_quantity(1).is_ok());
        assert!(validate_order_quantity(0).is_err());
        assert!(validate_order_quantity(-1).is_err());

        assert!(validate_stock_level("quantity", 0).is_ok());
        assert!(validate_stock_level("quantity", -1).is_err());
    }

    #[test]
    fn test_validate_price_cents() {
        assert!(validate_price_cents(1).is_ok());
        assert!(validate_price_cents(0).is_err());
        assert!(validate_price_cents(-100).is_err());
    }

    #[test]
    fn test_validate_uuid() {
        assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_uuid("").is_err());
        assert!(validate_uuid("123").is_err());
    }
}
