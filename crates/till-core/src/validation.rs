//! # Validation Module
//!
//! Input validation for products, quantities and accounts.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Station command                                              │
//! │  ├── Type validation (deserialization)                                 │
//! │  └── THIS MODULE: Business rule validation                             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Repository                                                   │
//! │  └── Re-checks rules that guard stored invariants                      │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / UNIQUE / FOREIGN KEY                                   │
//! │  └── CHECK (quantity_sold <= quantity_stocked)                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use till_core::validation::{validate_product_code, validate_quantity};
//!
//! validate_product_code("6001234567890").unwrap();
//! validate_quantity(5).unwrap();
//! assert!(validate_quantity(0).is_err());
//! ```

use crate::error::ValidationError;
use crate::types::{NewProduct, ProductUpdate};
use crate::{MAX_ITEM_QUANTITY, MIN_PASSWORD_LEN};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Largest bottle volume accepted, in milliliters.
pub const MAX_MILLILITERS: i64 = 10_000;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a product code (barcode or shelf code).
///
/// ## Rules
/// - Must not be empty
/// - At most 50 characters
/// - No whitespace (scanners never emit it inside a code)
///
/// ## Example
/// ```rust
/// use till_core::validation::validate_product_code;
///
/// assert!(validate_product_code("6001234567890").is_ok());
/// assert!(validate_product_code("WARAGI-750").is_ok());
/// assert!(validate_product_code("").is_err());
/// assert!(validate_product_code("NILE 500").is_err());
/// ```
pub fn validate_product_code(code: &str) -> ValidationResult<()> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::required("product code"));
    }

    if code.chars().count() > 50 {
        return Err(ValidationError::TooLong {
            field: "product code".to_string(),
            max: 50,
        });
    }

    if code.chars().any(char::is_whitespace) {
        return Err(ValidationError::InvalidFormat {
            field: "product code".to_string(),
            reason: "must not contain spaces".to_string(),
        });
    }

    Ok(())
}

/// Validates a product name.
///
/// ## Rules
/// - Must not be empty
/// - At most 200 characters
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::required("name"));
    }

    if name.chars().count() > 200 {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: 200,
        });
    }

    Ok(())
}

/// Validates a search query and returns it trimmed.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.chars().count() > 100 {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: 100,
        });
    }

    Ok(query.to_string())
}

/// Validates a username.
///
/// ## Rules
/// - 3 to 50 characters
/// - Letters, digits, `.`, `_` and `-` only
pub fn validate_username(username: &str) -> ValidationResult<()> {
    let username = username.trim();

    if username.is_empty() {
        return Err(ValidationError::required("username"));
    }

    let len = username.chars().count();
    if len < 3 {
        return Err(ValidationError::TooShort {
            field: "username".to_string(),
            min: 3,
        });
    }
    if len > 50 {
        return Err(ValidationError::TooLong {
            field: "username".to_string(),
            max: 50,
        });
    }

    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || c == '.' || c == '_' || c == '-')
    {
        return Err(ValidationError::InvalidFormat {
            field: "username".to_string(),
            reason: "must contain only letters, numbers, dots, hyphens, and underscores"
                .to_string(),
        });
    }

    Ok(())
}

pub fn validate_full_name(full_name: &str) -> ValidationResult<()> {
    let full_name = full_name.trim();

    if full_name.is_empty() {
        return Err(ValidationError::required("full name"));
    }

    if full_name.chars().count() > 100 {
        return Err(ValidationError::TooLong {
            field: "full name".to_string(),
            max: 100,
        });
    }

    Ok(())
}

/// Validates a new password.
///
/// ## Example
/// ```rust
/// use till_core::validation::validate_password;
///
/// assert!(validate_password("1234").is_ok());
/// assert!(validate_password("abc").is_err());
/// ```
pub fn validate_password(password: &str) -> ValidationResult<()> {
    if password.is_empty() {
        return Err(ValidationError::required("password"));
    }

    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::TooShort {
            field: "password".to_string(),
            min: MIN_PASSWORD_LEN,
        });
    }

    Ok(())
}

/// Validates a new password together with its confirmation.
pub fn validate_password_change(new_password: &str, confirm: &str) -> ValidationResult<()> {
    validate_password(new_password)?;

    if new_password != confirm {
        return Err(ValidationError::Mismatch(
            "New passwords do not match".to_string(),
        ));
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a cart or restock quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (999)
///
/// ## User Workflow
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Cart: Add Item                                                         │
/// │                                                                         │
/// │  Cashier enters quantity: 5                                            │
/// │       │                                                                 │
/// │       ▼                                                                 │
/// │  validate_quantity(5) ← THIS FUNCTION                                  │
/// │       │                                                                 │
/// │       ├── qty <= 0? → Error: "quantity must be positive"               │
/// │       │                                                                 │
/// │       ├── qty > 999? → Error: "quantity must be between 1 and 999"     │
/// │       │                                                                 │
/// │       └── OK → Availability check against the ledger                   │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::must_be_positive("quantity"));
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a restock delivery size. Deliveries are not capped by the cart
/// limit, only required to be positive.
pub fn validate_restock_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::must_be_positive("restock quantity"));
    }
    Ok(())
}

/// Validates a price in minor units. Zero is allowed.
pub fn validate_price(field: &str, cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Validates cost and selling price together.
///
/// ## Example
/// ```rust
/// use till_core::validation::validate_prices;
///
/// assert!(validate_prices(2500, 3500).is_ok());
/// assert!(validate_prices(2500, 2500).is_ok());
/// assert!(validate_prices(3500, 2500).is_err());
/// ```
pub fn validate_prices(cost_cents: i64, selling_cents: i64) -> ValidationResult<()> {
    validate_price("cost price", cost_cents)?;
    validate_price("selling price", selling_cents)?;

    if selling_cents < cost_cents {
        return Err(ValidationError::Mismatch(
            "Selling price cannot be less than cost price".to_string(),
        ));
    }

    Ok(())
}

pub fn validate_milliliters(ml: i64) -> ValidationResult<()> {
    if !(0..=MAX_MILLILITERS).contains(&ml) {
        return Err(ValidationError::OutOfRange {
            field: "milliliters".to_string(),
            min: 0,
            max: MAX_MILLILITERS,
        });
    }
    Ok(())
}

pub fn validate_stock_level(stocked: i64) -> ValidationResult<()> {
    if stocked < 0 {
        return Err(ValidationError::Negative {
            field: "quantity stocked".to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Composite Validators
// =============================================================================

/// Validates every field of a new product.
pub fn validate_new_product(p: &NewProduct) -> ValidationResult<()> {
    validate_product_code(&p.id)?;
    validate_product_name(&p.name)?;
    validate_milliliters(p.milliliters)?;
    validate_prices(p.cost_price_cents, p.selling_price_cents)?;
    validate_stock_level(p.quantity_stocked)?;
    Ok(())
}

/// Validates an edit. The `stocked >= sold` rule needs the stored row and is
/// enforced by the repository.
pub fn validate_product_update(p: &ProductUpdate) -> ValidationResult<()> {
    validate_product_code(&p.id)?;
    validate_product_name(&p.name)?;
    validate_milliliters(p.milliliters)?;
    validate_prices(p.cost_price_cents, p.selling_price_cents)?;
    validate_stock_level(p.quantity_stocked)?;
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> NewProduct {
        NewProduct {
            id: "6001234567890".to_string(),
            name: "Nile Special".to_string(),
            description: None,
            milliliters: 500,
            cost_price_cents: 2500,
            selling_price_cents: 3500,
            quantity_stocked: 200,
        }
    }

    #[test]
    fn test_product_code() {
        assert!(validate_product_code("6001234567890").is_ok());
        assert!(validate_product_code("   ").is_err());
        assert!(validate_product_code(&"9".repeat(51)).is_err());
        assert!(matches!(
            validate_product_code("A B"),
            Err(ValidationError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn test_quantity_bounds() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());
        assert!(validate_quantity(1000).is_err());
        assert!(validate_quantity(-3).is_err());
        assert!(validate_restock_quantity(5000).is_ok());
        assert!(validate_restock_quantity(0).is_err());
    }

    #[test]
    fn test_prices() {
        assert!(validate_prices(0, 0).is_ok());
        assert!(matches!(
            validate_prices(-1, 10),
            Err(ValidationError::Negative { .. })
        ));
        assert!(matches!(
            validate_prices(3500, 2500),
            Err(ValidationError::Mismatch(_))
        ));
    }

    #[test]
    fn test_accounts() {
        assert!(validate_username("cashier1").is_ok());
        assert!(validate_username("ab").is_err());
        assert!(validate_username("john doe").is_err());
        assert!(validate_full_name("").is_err());
        assert!(validate_password_change("abcd", "abcd").is_ok());
        assert!(matches!(
            validate_password_change("abcd", "abce"),
            Err(ValidationError::Mismatch(_))
        ));
        assert!(matches!(
            validate_password_change("abc", "abc"),
            Err(ValidationError::TooShort { min: 4, .. })
        ));
    }

    #[test]
    fn test_new_product() {
        assert!(validate_new_product(&sample()).is_ok());

        let mut bad = sample();
        bad.milliliters = -1;
        assert!(validate_new_product(&bad).is_err());

        let mut bad = sample();
        bad.quantity_stocked = -5;
        assert!(validate_new_product(&bad).is_err());
    }
}
