//! # Repository Module
//!
//! Store seams and their SQLite implementations.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Two Independent Stores                               │
//! │                                                                         │
//! │  sweetshop-engine                                                      │
//! │       │                                                                 │
//! │       ├──► Arc<dyn CatalogStore> ──► ItemRepository  ──► items         │
//! │       │                                                                 │
//! │       └──► Arc<dyn AuditStore>   ──► AuditRepository ──► stock_mutations│
//! │                                                                         │
//! │  There is no transaction spanning both. A stock change is committed    │
//! │  by the catalog store first, then the audit record is appended.        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ItemRepository`](item::ItemRepository) - Catalog CRUD, search, conditional stock updates
//! - [`AuditRepository`](audit::AuditRepository) - Append-only mutation log

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sweetshop_core::{Item, ItemPatch, ItemSearch, MutationRecord};

use crate::error::DbResult;

pub mod audit;
pub mod item;

/// Durable home of catalog items and their stock counters.
///
/// Every method touches exactly one row or reads a consistent snapshot.
/// Stock methods are single conditional statements so concurrent callers
/// can never drive a quantity below zero.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Inserts a fully-formed item. Fails with `UniqueViolation` when an
    /// active item already uses the same case-folded name.
    async fn insert(&self, item: &Item) -> DbResult<()>;

    /// Fetches an item. Inactive rows are returned only when asked for.
    async fn get(&self, id: &str, include_inactive: bool) -> DbResult<Option<Item>>;

    /// The active item whose case-folded name equals `name`'s, if any.
    async fn find_active_by_name(&self, name: &str) -> DbResult<Option<Item>>;

    /// Active items, newest first.
    async fn list_active(&self) -> DbResult<Vec<Item>>;

    /// Active items matching every filter present, ordered by name.
    async fn search(&self, filter: &ItemSearch) -> DbResult<Vec<Item>>;

    /// Applies the fields present in `patch` to an active item and stamps
    /// `updated_at`/`updated_by`. `None` when no active row matched.
    async fn update_metadata(
        &self,
        id: &str,
        patch: &ItemPatch,
        actor_id: &str,
        at: DateTime<Utc>,
    ) -> DbResult<Option<Item>>;

    /// Marks an active item inactive. `false` when nothing changed.
    async fn soft_delete(&self, id: &str, actor_id: &str, at: DateTime<Utc>) -> DbResult<bool>;

    /// Subtracts `quantity` only if the item is active, holds at least that
    /// much, and `price × quantity` fits in `i64`. Bumps `stock_version`.
    /// Returns the row as written, or `None` when the guard failed.
    async fn decrement_if_sufficient(
        &self,
        id: &str,
        quantity: i64,
        actor_id: &str,
        at: DateTime<Utc>,
    ) -> DbResult<Option<Item>>;

    /// Adds `quantity` to an active item and bumps `stock_version`. `None`
    /// when no active row matched or the sum would overflow.
    async fn increment(
        &self,
        id: &str,
        quantity: i64,
        actor_id: &str,
        at: DateTime<Utc>,
    ) -> DbResult<Option<Item>>;

    /// Active items with `0 < quantity <= threshold`, lowest stock first.
    async fn low_stock(&self, threshold: i64) -> DbResult<Vec<Item>>;

    /// Active items with nothing left.
    async fn out_of_stock(&self) -> DbResult<Vec<Item>>;

    /// Sorted distinct categories of active items.
    async fn categories(&self) -> DbResult<Vec<String>>;
}

/// Append-only log of stock mutations.
#[async_trait]
pub trait AuditStore: Send + Sync {
    async fn append(&self, record: &MutationRecord) -> DbResult<()>;

    /// Every record for one item in `stock_version` order, which is the
    /// order the changes were applied. Includes records of items that were
    /// later deleted.
    async fn history_for_item(&self, item_id: &str) -> DbResult<Vec<MutationRecord>>;

    /// Records created by one actor, newest first.
    async fn history_for_actor(&self, actor_id: &str, limit: u32) -> DbResult<Vec<MutationRecord>>;

    /// The most recent records across all items, newest first.
    async fn recent(&self, limit: u32) -> DbResult<Vec<MutationRecord>>;
}
