//! # Item Catalog
//!
//! Create, update, soft-delete and look up catalog entries.
//!
//! ## Name Uniqueness
//! ```text
//! create("Barfi")
//!      │
//!      ▼
//! find_active_by_name("barfi") ── Some ──► DuplicateName  (friendly pre-check)
//!      │ None
//!      ▼
//! INSERT ... (partial unique index on name_key WHERE is_active = 1)
//!      │
//!      ├── UNIQUE violation ──► DuplicateName  (a concurrent create won)
//!      └── OK ──► Item
//! ```

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info};

use crate::store_call::guarded;
use sweetshop_core::validation::{validate_item_patch, validate_item_spec, validate_search_query};
use sweetshop_core::{
    Actor, InventoryError, InventoryResult, Item, ItemPatch, ItemSearch, ItemSpec,
};
use sweetshop_db::{generate_item_id, CatalogStore};

/// Catalog CRUD over a [`CatalogStore`].
#[derive(Clone)]
pub struct ItemCatalog {
    store: Arc<dyn CatalogStore>,
    timeout: Duration,
}

impl ItemCatalog {
    pub fn new(store: Arc<dyn CatalogStore>, timeout: Duration) -> Self {
        ItemCatalog { store, timeout }
    }

    /// Adds a new active item.
    ///
    /// ## Errors
    /// - `InvalidSpec` when a field breaks a catalog rule
    /// - `DuplicateName` when an active item already uses the name
    pub async fn create(&self, spec: ItemSpec, actor: &Actor) -> InventoryResult<Item> {
        validate_item_spec(&spec)?;

        let name = spec.name.trim().to_string();
        self.ensure_name_free(&name, None).await?;

        let now = Utc::now();
        let item = Item {
            id: generate_item_id(),
            name,
            category: spec.category.trim().to_string(),
            price_cents: spec.price.cents(),
            quantity: spec.quantity,
            stock_version: 0,
            description: spec.description,
            image_url: spec.image_url,
            tags: spec.tags.into_iter().map(|t| t.trim().to_string()).collect(),
            is_active: true,
            created_at: now,
            updated_at: now,
            created_by: actor.id.clone(),
            updated_by: actor.id.clone(),
            deleted_at: None,
        };

        guarded(self.timeout, "insert_item", self.store.insert(&item)).await?;

        info!(id = %item.id, name = %item.name, actor = %actor.id, "Item created");
        Ok(item)
    }

    /// Active item by id.
    pub async fn get(&self, id: &str) -> InventoryResult<Option<Item>> {
        guarded(self.timeout, "get_item", self.store.get(id, false)).await
    }

    /// Any item by id, deleted ones included (audit tooling).
    pub async fn get_including_inactive(&self, id: &str) -> InventoryResult<Option<Item>> {
        guarded(self.timeout, "get_item", self.store.get(id, true)).await
    }

    /// Applies a partial update. Stock is never touched here.
    ///
    /// An empty patch still refreshes `updated_at` and `updated_by`.
    pub async fn update(&self, id: &str, patch: ItemPatch, actor: &Actor) -> InventoryResult<Item> {
        validate_item_patch(&patch)?;

        let patch = ItemPatch {
            name: patch.name.map(|n| n.trim().to_string()),
            category: patch.category.map(|c| c.trim().to_string()),
            tags: patch
                .tags
                .map(|tags| tags.into_iter().map(|t| t.trim().to_string()).collect()),
            ..patch
        };

        if let Some(name) = &patch.name {
            self.ensure_name_free(name, Some(id)).await?;
        }

        let updated = guarded(
            self.timeout,
            "update_item",
            self.store.update_metadata(id, &patch, &actor.id, Utc::now()),
        )
        .await?
        .ok_or_else(|| InventoryError::not_found(id))?;

        info!(id = %id, actor = %actor.id, "Item updated");
        Ok(updated)
    }

    /// Soft-deletes an item. Returns `false` when it was unknown or already
    /// deleted.
    pub async fn delete(&self, id: &str, actor: &Actor) -> InventoryResult<bool> {
        let deleted = guarded(
            self.timeout,
            "delete_item",
            self.store.soft_delete(id, &actor.id, Utc::now()),
        )
        .await?;

        if deleted {
            info!(id = %id, actor = %actor.id, "Item deleted");
        } else {
            debug!(id = %id, "Delete was a no-op");
        }
        Ok(deleted)
    }

    /// Active items, newest first.
    pub async fn list(&self) -> InventoryResult<Vec<Item>> {
        guarded(self.timeout, "list_items", self.store.list_active()).await
    }

    /// Active items matching every filter present, ordered by name.
    pub async fn search(&self, filter: &ItemSearch) -> InventoryResult<Vec<Item>> {
        let name = match filter.name.as_deref() {
            Some(needle) => validate_search_query(needle)?,
            None => None,
        };

        if let (Some(min), Some(max)) = (filter.min_price, filter.max_price) {
            if min > max {
                return Ok(Vec::new());
            }
        }

        let filter = ItemSearch {
            name,
            ..filter.clone()
        };
        guarded(self.timeout, "search_items", self.store.search(&filter)).await
    }

    /// Sorted distinct categories of active items.
    pub async fn categories(&self) -> InventoryResult<Vec<String>> {
        guarded(self.timeout, "list_categories", self.store.categories()).await
    }

    async fn ensure_name_free(&self, name: &str, except_id: Option<&str>) -> InventoryResult<()> {
        let holder = guarded(
            self.timeout,
            "find_item_by_name",
            self.store.find_active_by_name(name),
        )
        .await?;

        match holder {
            Some(other) if Some(other.id.as_str()) != except_id => {
                Err(InventoryError::duplicate_name(name))
            }
            _ => Ok(()),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
