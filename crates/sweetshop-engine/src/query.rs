//! # Inventory Query Service
//!
//! Read-only reports over the catalog and the audit trail. Nothing here
//! writes, and nothing is cached: every call reads the stores afresh.

use std::sync::Arc;
use std::time::Duration;

use crate::store_call::guarded;
use sweetshop_core::{InventoryResult, InventoryStats, Item, MutationRecord, MAX_PAGE_SIZE};
use sweetshop_db::{AuditStore, CatalogStore};

#[derive(Clone)]
pub struct InventoryQuery {
    catalog: Arc<dyn CatalogStore>,
    audit: Arc<dyn AuditStore>,
    timeout: Duration,
    low_stock_threshold: i64,
}

impl InventoryQuery {
    pub fn new(
        catalog: Arc<dyn CatalogStore>,
        audit: Arc<dyn AuditStore>,
        timeout: Duration,
        low_stock_threshold: i64,
    ) -> Self {
        InventoryQuery {
            catalog,
            audit,
            timeout,
            low_stock_threshold,
        }
    }

    /// Active items with `0 < quantity <= threshold`, lowest stock first.
    pub async fn low_stock(&self, threshold: i64) -> InventoryResult<Vec<Item>> {
        guarded(self.timeout, "low_stock", self.catalog.low_stock(threshold)).await
    }

    /// [`low_stock`](Self::low_stock) with the configured threshold.
    pub async fn low_stock_default(&self) -> InventoryResult<Vec<Item>> {
        self.low_stock(self.low_stock_threshold).await
    }

    pub async fn out_of_stock(&self) -> InventoryResult<Vec<Item>> {
        guarded(self.timeout, "out_of_stock", self.catalog.out_of_stock()).await
    }

    /// Totals over active items.
    pub async fn stats(&self) -> InventoryResult<InventoryStats> {
        let items = guarded(self.timeout, "list_items", self.catalog.list_active()).await?;
        Ok(InventoryStats::from_items(&items))
    }

    /// Every mutation of one item, oldest first. Works for deleted items.
    pub async fn item_history(&self, item_id: &str) -> InventoryResult<Vec<MutationRecord>> {
        guarded(self.timeout, "item_history", self.audit.history_for_item(item_id)).await
    }

    /// Purchases and restocks made by one actor, newest first.
    pub async fn actor_history(
        &self,
        actor_id: &str,
        limit: u32,
    ) -> InventoryResult<Vec<MutationRecord>> {
        guarded(
            self.timeout,
            "actor_history",
            self.audit.history_for_actor(actor_id, limit.min(MAX_PAGE_SIZE)),
        )
        .await
    }

    pub async fn recent_mutations(&self, limit: u32) -> InventoryResult<Vec<MutationRecord>> {
        guarded(
            self.timeout,
            "recent_mutations",
            self.audit.recent(limit.min(MAX_PAGE_SIZE)),
        )
        .await
    }
}
