//! # Validation Module
//!
//! Catalog rules and quantity checks for the inventory engine.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Request Gateway (external)                                   │
//! │  └── Shape checks (types, required fields)                             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Engine (Rust)                                                │
//! │  └── THIS MODULE: catalog and quantity rules                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK (quantity >= 0)                                             │
//! │  └── UNIQUE (name_key) WHERE is_active = 1                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use sweetshop_core::validation::{validate_item_name, validate_purchase_quantity};
//!
//! validate_item_name("Ladoo").unwrap();
//! assert!(validate_purchase_quantity(0).is_err());
//! ```

use crate::error::{InventoryError, ValidationError};
use crate::money::Money;
use crate::types::{ItemPatch, ItemSpec};
use crate::{MAX_CATEGORY_LEN, MAX_DESCRIPTION_LEN, MAX_NAME_LEN, MAX_TAG_LEN};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

fn required_with_max(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

/// Validates an item name.
///
/// ## Rules
/// - Must not be empty after trimming
/// - At most 100 characters
///
/// ## Example
/// ```rust
/// use sweetshop_core::validation::validate_item_name;
///
/// assert!(validate_item_name("Kaju Katli").is_ok());
/// assert!(validate_item_name("   ").is_err());
/// ```
pub fn validate_item_name(name: &str) -> ValidationResult<()> {
    required_with_max("name", name, MAX_NAME_LEN)
}

/// Validates a category. The wildcard `"all"` is a search sentinel, not a
/// real category, so it is rejected here.
pub fn validate_category(category: &str) -> ValidationResult<()> {
    required_with_max("category", category, MAX_CATEGORY_LEN)?;

    if category.trim().eq_ignore_ascii_case(crate::CATEGORY_WILDCARD) {
        return Err(ValidationError::InvalidFormat {
            field: "category".to_string(),
            reason: format!("'{}' is reserved", crate::CATEGORY_WILDCARD),
        });
    }

    Ok(())
}

pub fn validate_description(description: &str) -> ValidationResult<()> {
    if description.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(ValidationError::TooLong {
            field: "description".to_string(),
            max: MAX_DESCRIPTION_LEN,
        });
    }

    Ok(())
}

/// Tags must be non-empty and short. Order is kept as given.
pub fn validate_tags(tags: &[String]) -> ValidationResult<()> {
    for tag in tags {
        required_with_max("tag", tag, MAX_TAG_LEN)?;
    }

    Ok(())
}

/// Validates a search needle.
///
/// ## Returns
/// The trimmed needle, or `None` when it is blank (no filter).
pub fn validate_search_query(query: &str) -> ValidationResult<Option<String>> {
    let query = query.trim();

    if query.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok((!query.is_empty()).then(|| query.to_string()))
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Price must be strictly positive.
///
/// ## Example
/// ```rust
/// use sweetshop_core::{validation::validate_price, Money};
///
/// assert!(validate_price(Money::from_cents(1099)).is_ok());
/// assert!(validate_price(Money::zero()).is_err());
/// ```
pub fn validate_price(price: Money) -> ValidationResult<()> {
    if !price.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "price".to_string(),
        });
    }

    Ok(())
}

pub fn validate_initial_quantity(quantity: i64) -> ValidationResult<()> {
    if quantity < 0 {
        return Err(ValidationError::Negative {
            field: "quantity".to_string(),
        });
    }

    Ok(())
}

/// Validates the quantity of a purchase.
///
/// ## User Workflow
/// ```text
/// Purchase (qty: -5)
///      │
///      ▼
/// validate_purchase_quantity(-5) ← THIS FUNCTION
///      │
///      ├── qty <= 0? → InvalidQuantity, store never touched
///      │
///      └── OK → conditional decrement
/// ```
pub fn validate_purchase_quantity(quantity: i64) -> Result<(), InventoryError> {
    if quantity <= 0 {
        return Err(InventoryError::invalid_quantity(
            quantity,
            "purchase quantity must be positive",
        ));
    }

    Ok(())
}

/// Validates a restock delta against the configured maximum.
pub fn validate_restock_quantity(quantity: i64, max_delta: i64) -> Result<(), InventoryError> {
    if quantity <= 0 {
        return Err(InventoryError::invalid_quantity(
            quantity,
            "restock quantity must be positive",
        ));
    }

    if quantity > max_delta {
        return Err(InventoryError::invalid_quantity(
            quantity,
            format!("restock quantity cannot exceed {}", max_delta),
        ));
    }

    Ok(())
}

// =============================================================================
// Request Validators
// =============================================================================

/// Checks every field of a creation request.
pub fn validate_item_spec(spec: &ItemSpec) -> ValidationResult<()> {
    validate_item_name(&spec.name)?;
    validate_category(&spec.category)?;
    validate_price(spec.price)?;
    validate_initial_quantity(spec.quantity)?;
    if let Some(description) = &spec.description {
        validate_description(description)?;
    }
    validate_tags(&spec.tags)?;

    Ok(())
}

/// Checks the fields a patch actually carries.
pub fn validate_item_patch(patch: &ItemPatch) -> ValidationResult<()> {
    if let Some(name) = &patch.name {
        validate_item_name(name)?;
    }
    if let Some(category) = &patch.category {
        validate_category(category)?;
    }
    if let Some(price) = patch.price {
        validate_price(price)?;
    }
    if let Some(description) = &patch.description {
        validate_description(description)?;
    }
    if let Some(tags) = &patch.tags {
        validate_tags(tags)?;
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_item_name() {
        assert!(validate_item_name("Ladoo").is_ok());
        assert!(validate_item_name(&"a".repeat(100)).is_ok());

        assert!(validate_item_name("").is_err());
        assert!(validate_item_name("   ").is_err());
        assert!(validate_item_name(&"a".repeat(101)).is_err());
    }

    #[test]
    fn test_validate_category() {
        assert!(validate_category("Traditional").is_ok());
        assert!(validate_category("").is_err());
        assert!(validate_category("All").is_err());
        assert!(validate_category(&"c".repeat(51)).is_err());
    }

    #[test]
    fn test_validate_price() {
        assert!(validate_price(Money::from_cents(1)).is_ok());
        assert!(validate_price(Money::zero()).is_err());
        assert!(validate_price(Money::from_cents(-100)).is_err());
    }

    #[test]
    fn test_validate_quantities() {
        assert!(validate_initial_quantity(0).is_ok());
        assert!(validate_initial_quantity(-1).is_err());

        assert!(validate_purchase_quantity(1).is_ok());
        assert!(matches!(
            validate_purchase_quantity(0),
            Err(InventoryError::InvalidQuantity { quantity: 0, .. })
        ));

        assert!(validate_restock_quantity(100, 100).is_ok());
        assert!(validate_restock_quantity(-5, 100).is_err());
        assert!(validate_restock_quantity(101, 100).is_err());
    }

    #[test]
    fn test_validate_item_spec() {
        let spec = ItemSpec::new("Ladoo", "Traditional", Money::from_cents(1000), 50);
        assert!(validate_item_spec(&spec).is_ok());

        let bad = ItemSpec::new("Ladoo", "Traditional", Money::from_cents(1000), 50)
            .with_description("x".repeat(501));
        assert_eq!(
            validate_item_spec(&bad),
            Err(ValidationError::TooLong {
                field: "description".to_string(),
                max: 500
            })
        );

        let bad_tag = ItemSpec::new("Ladoo", "Traditional", Money::from_cents(1000), 0)
            .with_tags(["ok", " "]);
        assert!(validate_item_spec(&bad_tag).is_err());
    }

    #[test]
    fn test_validate_item_patch_checks_present_fields_only() {
        assert!(validate_item_patch(&ItemPatch::default()).is_ok());
        assert!(validate_item_patch(&ItemPatch::rename("")).is_err());
        assert!(validate_item_patch(&ItemPatch::reprice(Money::zero())).is_err());
    }

    #[test]
    fn test_validate_search_query() {
        assert_eq!(validate_search_query("  lad ").unwrap(), Some("lad".to_string()));
        assert_eq!(validate_search_query("   ").unwrap(), None);
    }
}
