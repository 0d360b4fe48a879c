//! # Error Types
//!
//! Error taxonomy shared by the stores and the engine.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  sweetshop-core errors (this file)                                     │
//! │  ├── ValidationError  - Field-level input failures                     │
//! │  └── InventoryError   - What engine callers branch on                  │
//! │                                                                         │
//! │  sweetshop-db errors (separate crate)                                  │
//! │  └── DbError          - Store failures, mapped into InventoryError     │
//! │                                                                         │
//! │  Flow: ValidationError ─┐                                               │
//! │        DbError ─────────┴─► InventoryError ─► ErrorBody ─► Gateway     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Failure Classes
//! - Expected, recoverable: `InvalidSpec`, `InvalidQuantity`,
//!   `DuplicateName`, `NotFound`, `InsufficientStock`
//! - Infrastructure, retryable: `StoreUnavailable`, `Timeout`
//! - Fatal to the request: `Internal` (details are logged, never returned)

use serde::{Serialize, Serializer};
use thiserror::Error;
use ts_rs::TS;

// =============================================================================
// Inventory Error
// =============================================================================

/// Every failure an engine operation can return.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InventoryError {
    /// Item spec or patch breaks a catalog rule (empty name, price <= 0, ...).
    #[error("Invalid item: {0}")]
    InvalidSpec(#[from] ValidationError),

    /// Purchase/restock quantity is not a positive, sane delta.
    #[error("Invalid quantity {quantity}: {reason}")]
    InvalidQuantity { quantity: i64, reason: String },

    /// Another active item already uses this name (case-insensitive).
    #[error("An item named '{name}' already exists")]
    DuplicateName { name: String },

    /// Unknown id, or the item was soft-deleted.
    #[error("Item not found: {id}")]
    NotFound { id: String },

    /// Stock cannot cover the requested purchase.
    ///
    /// ## User Workflow
    /// ```text
    /// Purchase (qty: 100)
    ///      │
    ///      ▼
    /// Conditional update matches no row (quantity < 100)
    ///      │
    ///      ▼
    /// InsufficientStock { name: "Ladoo", available: 45, requested: 100 }
    /// ```
    #[error("Insufficient stock for {name}: available {available}, requested {requested}")]
    InsufficientStock {
        item_id: String,
        name: String,
        available: i64,
        requested: i64,
    },

    /// The store could not be reached (pool closed, pool exhausted).
    #[error("Inventory store is unavailable, please retry")]
    StoreUnavailable,

    /// A store call did not finish within the configured timeout.
    #[error("Inventory store timed out after {timeout_ms}ms, please retry")]
    Timeout { timeout_ms: u64 },

    /// Unexpected fault. The cause is logged where it happened.
    #[error("Internal error")]
    Internal,
}

impl InventoryError {
    /// Creates a NotFound error for an item id.
    pub fn not_found(id: impl Into<String>) -> Self {
        InventoryError::NotFound { id: id.into() }
    }

    /// Creates an InvalidQuantity error.
    pub fn invalid_quantity(quantity: i64, reason: impl Into<String>) -> Self {
        InventoryError::InvalidQuantity {
            quantity,
            reason: reason.into(),
        }
    }

    /// Creates a DuplicateName error.
    pub fn duplicate_name(name: impl Into<String>) -> Self {
        InventoryError::DuplicateName { name: name.into() }
    }

    /// Stable machine-readable code for this failure.
    pub fn code(&self) -> ErrorCode {
        match self {
            InventoryError::InvalidSpec(_) => ErrorCode::InvalidSpec,
            InventoryError::InvalidQuantity { .. } => ErrorCode::InvalidQuantity,
            InventoryError::DuplicateName { .. } => ErrorCode::DuplicateName,
            InventoryError::NotFound { .. } => ErrorCode::NotFound,
            InventoryError::InsufficientStock { .. } => ErrorCode::InsufficientStock,
            InventoryError::StoreUnavailable => ErrorCode::StoreUnavailable,
            InventoryError::Timeout { .. } => ErrorCode::Timeout,
            InventoryError::Internal => ErrorCode::Internal,
        }
    }

    /// HTTP status a gateway should answer with.
    ///
    /// ```text
    /// NotFound                                          → 404
    /// DuplicateName / InvalidQuantity /
    /// InvalidSpec / InsufficientStock                   → 400
    /// StoreUnavailable / Timeout                        → 503
    /// Internal                                          → 500
    /// ```
    pub fn http_status(&self) -> u16 {
        match self {
            InventoryError::NotFound { .. } => 404,
            InventoryError::InvalidSpec(_)
            | InventoryError::InvalidQuantity { .. }
            | InventoryError::DuplicateName { .. }
            | InventoryError::InsufficientStock { .. } => 400,
            InventoryError::StoreUnavailable | InventoryError::Timeout { .. } => 503,
            InventoryError::Internal => 500,
        }
    }

    /// True for infrastructure failures a caller may retry as-is.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            InventoryError::StoreUnavailable | InventoryError::Timeout { .. }
        )
    }

    /// Converts to the stable shape handed to end users.
    pub fn to_body(&self) -> ErrorBody {
        ErrorBody {
            code: self.code(),
            message: self.to_string(),
        }
    }
}

/// Errors serialize as their [`ErrorBody`].
impl Serialize for InventoryError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_body().serialize(serializer)
    }
}

// =============================================================================
// Error Code / Body
// =============================================================================

/// Error codes for gateway responses.
///
/// ## Usage in a Frontend
/// ```typescript
/// switch (body.code) {
///   case 'INSUFFICIENT_STOCK': showStock(body.message); break;
///   case 'DUPLICATE_NAME':     highlightName(); break;
///   default:                   showError(body.message);
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InvalidSpec,
    InvalidQuantity,
    DuplicateName,
    NotFound,
    InsufficientStock,
    StoreUnavailable,
    Timeout,
    Internal,
}

impl ErrorCode {
    /// The serialized form of the code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::InvalidSpec => "INVALID_SPEC",
            ErrorCode::InvalidQuantity => "INVALID_QUANTITY",
            ErrorCode::DuplicateName => "DUPLICATE_NAME",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::InsufficientStock => "INSUFFICIENT_STOCK",
            ErrorCode::StoreUnavailable => "STORE_UNAVAILABLE",
            ErrorCode::Timeout => "TIMEOUT",
            ErrorCode::Internal => "INTERNAL",
        }
    }
}

/// User-visible error payload.
///
/// ```json
/// { "code": "INSUFFICIENT_STOCK", "message": "Insufficient stock for Ladoo: available 45, requested 100" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct ErrorBody {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when a request breaks a catalog rule.
/// They are wrapped by [`InventoryError::InvalidSpec`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} cannot be negative")]
    Negative { field: String },

    /// Invalid format (e.g., a price that is not a decimal amount).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with InventoryError.
pub type InventoryResult<T> = Result<T, InventoryError>;

// =============================================================================
// Unit Tests
// =============================================================================
