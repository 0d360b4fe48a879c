//! # sweetshop-core: Pure Domain Logic for the Sweet Shop Inventory
//!
//! This crate holds the data model and every invariant check of the
//! inventory engine as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Sweet Shop Inventory Architecture                   │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              Request Gateway (external, HTTP)                   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ typed requests + Actor                 │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │        sweetshop-engine (ItemCatalog, StockLedger, Query)       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ sweetshop-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │   error   │  │ validation│  │   │
//! │  │   │   Item    │  │   Money   │  │ Inventory │  │  catalog  │  │   │
//! │  │   │ Mutation  │  │  rounding │  │   Error   │  │   rules   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │            sweetshop-db (Catalog Store + Audit Store)           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Item, MutationRecord, results, stats)
//! - [`money`] - Money type with integer cents (no floating point!)
//! - [`error`] - Error taxonomy shared by every layer
//! - [`validation`] - Catalog and quantity rules
//!
//! ## Example Usage
//!
//! ```rust
//! use sweetshop_core::money::Money;
//!
//! // Prices arrive as decimal strings and are rounded to the cent
//! let price: Money = "10.005".parse().unwrap();
//! assert_eq!(price.cents(), 1001);
//!
//! let total = price.multiply_quantity(5).unwrap();
//! assert_eq!(total.cents(), 5005);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{ErrorBody, ErrorCode, InventoryError, InventoryResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum length of an item name (characters).
pub const MAX_NAME_LEN: usize = 100;

/// Maximum length of a category (characters).
pub const MAX_CATEGORY_LEN: usize = 50;

/// Maximum length of an item description (characters).
pub const MAX_DESCRIPTION_LEN: usize = 500;

/// Maximum length of a single tag (characters).
pub const MAX_TAG_LEN: usize = 50;

/// Largest quantity a single restock call may add.
///
/// ## Business Reason
/// Rejects absurd deltas (typing 1000000 instead of 100). The engine
/// config can lower or raise it per deployment.
pub const DEFAULT_MAX_RESTOCK_DELTA: i64 = 100_000;

/// Category value that matches every category in a search.
pub const CATEGORY_WILDCARD: &str = "all";

/// Upper bound for a single search page.
pub const MAX_PAGE_SIZE: u32 = 1000;

/// Default threshold used by low-stock reports.
pub const DEFAULT_LOW_STOCK_THRESHOLD: i64 = 10;
