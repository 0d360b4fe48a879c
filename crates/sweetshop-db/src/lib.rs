//! # sweetshop-db: Store Layer for the Sweet Shop Inventory
//!
//! This crate provides the Catalog Store and the Audit Store.
//! It uses SQLite with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Sweet Shop Inventory Data Flow                      │
//! │                                                                         │
//! │  StockLedger::purchase / ItemCatalog::create                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  sweetshop-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ ItemRepo      │    │ 001_items    │  │   │
//! │  │   │ SqlitePool    │◄───│ AuditRepo     │    │ 002_stock_   │  │   │
//! │  │   │ WAL + busy    │    │               │    │   mutations  │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database file                                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types and their engine mapping
//! - [`repository`] - Store traits and SQLite repositories
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sweetshop_db::{CatalogStore, Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("inventory.db")).await?;
//! let low = db.items().low_stock(10).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::audit::AuditRepository;
pub use repository::item::{generate_item_id, ItemRepository};
pub use repository::{AuditStore, CatalogStore};
