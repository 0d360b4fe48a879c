//! # Stock Ledger
//!
//! Purchases, restocks and bulk restocks.
//!
//! ## Purchase Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  purchase(id, 30, alice)                                               │
//! │       │                                                                 │
//! │       ├── 30 <= 0? ──► InvalidQuantity (store untouched)               │
//! │       ▼                                                                 │
//! │  decrement_if_sufficient ── one conditional UPDATE ... RETURNING       │
//! │       │                                                                 │
//! │       ├── row ──► price snapshot from the same row                     │
//! │       │            │                                                    │
//! │       │            ▼                                                    │
//! │       │      append MutationRecord ── fails? ──► Degraded + warn!      │
//! │       │            │                                                    │
//! │       │            ▼                                                    │
//! │       │      PurchaseResult                                             │
//! │       │                                                                 │
//! │       └── no row ──► read once                                          │
//! │                       ├── missing/inactive ──► NotFound                 │
//! │                       ├── quantity < 30    ──► InsufficientStock       │
//! │                       ├── price × 30 > max ──► InvalidQuantity         │
//! │                       └── enough stock     ──► retry (at most 3 tries) │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Stock and audit live in separate stores. Once the update has committed
//! the operation has succeeded; an audit failure only downgrades the
//! result to [`AuditStatus::Degraded`].

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::store_call::guarded;
use sweetshop_core::validation::{validate_purchase_quantity, validate_restock_quantity};
use sweetshop_core::{
    Actor, AuditStatus, BulkEntryResult, BulkRestockEntry, BulkRestockOutcome,
    BulkRestockRequest, InventoryError, InventoryResult, Item, MutationDetail, MutationRecord,
    PurchaseResult, RestockResult,
};
use sweetshop_db::{AuditStore, CatalogStore};

/// A failed guard is re-read once; if stock was topped up in between the
/// decrement is retried, at most this many times in total.
const MAX_PURCHASE_ATTEMPTS: usize = 3;

/// Stock mutations over a [`CatalogStore`] with an audit trail in an
/// [`AuditStore`].
#[derive(Clone)]
pub struct StockLedger {
    catalog: Arc<dyn CatalogStore>,
    audit: Arc<dyn AuditStore>,
    timeout: Duration,
    max_restock_delta: i64,
}

impl StockLedger {
    pub fn new(
        catalog: Arc<dyn CatalogStore>,
        audit: Arc<dyn AuditStore>,
        timeout: Duration,
        max_restock_delta: i64,
    ) -> Self {
        StockLedger {
            catalog,
            audit,
            timeout,
            max_restock_delta,
        }
    }

    /// Sells `quantity` units of an item.
    ///
    /// ## Errors
    /// - `InvalidQuantity` when `quantity <= 0`
    /// - `NotFound` when the item is unknown or deleted
    /// - `InsufficientStock` when fewer than `quantity` units remain
    /// - `InvalidQuantity` when `price × quantity` does not fit in `Money`
    /// - `StoreUnavailable` when the stock kept changing under every attempt
    ///
    /// A failed purchase never changes the stored quantity.
    pub async fn purchase(
        &self,
        item_id: &str,
        quantity: i64,
        actor: &Actor,
    ) -> InventoryResult<PurchaseResult> {
        validate_purchase_quantity(quantity)?;

        let (item, at) = self.decrement(item_id, quantity, actor).await?;

        let unit_price = item.price();
        let total = unit_price.multiply_quantity(quantity).ok_or_else(|| {
            // The decrement guard refuses unpayable totals; reaching this is a store fault
            error!(
                item_id = %item_id,
                actor = %actor.id,
                quantity,
                unit_price_cents = unit_price.cents(),
                "Purchase total overflowed"
            );
            InventoryError::Internal
        })?;

        let record = MutationRecord {
            id: Uuid::new_v4().to_string(),
            item_id: item.id.clone(),
            item_name: item.name.clone(),
            quantity,
            previous_quantity: item.quantity + quantity,
            new_quantity: item.quantity,
            stock_version: item.stock_version,
            actor_id: actor.id.clone(),
            recorded_at: at,
            detail: MutationDetail::Purchase { unit_price, total },
        };
        let audit = self.record(record, "purchase").await;

        info!(
            item_id = %item.id,
            actor = %actor.id,
            quantity,
            remaining = item.quantity,
            total_cents = total.cents(),
            "Purchase applied"
        );

        Ok(PurchaseResult {
            remaining_quantity: item.quantity,
            unit_price,
            total,
            audit,
            item,
        })
    }

    /// Adds `quantity` units to an item.
    ///
    /// ## Errors
    /// - `InvalidQuantity` when `quantity <= 0` or above the configured maximum
    /// - `NotFound` when the item is unknown or deleted
    pub async fn restock(
        &self,
        item_id: &str,
        quantity: i64,
        actor: &Actor,
    ) -> InventoryResult<RestockResult> {
        validate_restock_quantity(quantity, self.max_restock_delta)?;

        let at = Utc::now();
        let updated = guarded(
            self.timeout,
            "increment_stock",
            self.catalog.increment(item_id, quantity, &actor.id, at),
        )
        .await?;

        let item = match updated {
            Some(item) => item,
            None => return Err(self.classify_failed_restock(item_id, quantity).await),
        };

        let previous_quantity = item.quantity - quantity;
        let record = MutationRecord {
            id: Uuid::new_v4().to_string(),
            item_id: item.id.clone(),
            item_name: item.name.clone(),
            quantity,
            previous_quantity,
            new_quantity: item.quantity,
            stock_version: item.stock_version,
            actor_id: actor.id.clone(),
            recorded_at: at,
            detail: MutationDetail::Restock,
        };
        let audit = self.record(record, "restock").await;

        info!(
            item_id = %item.id,
            actor = %actor.id,
            quantity,
            new_quantity = item.quantity,
            "Restock applied"
        );

        Ok(RestockResult {
            previous_quantity,
            new_quantity: item.quantity,
            audit,
            item,
        })
    }

    /// Restocks every entry independently, in request order.
    ///
    /// A failing entry does not undo or stop the others. Use
    /// [`BulkRestockOutcome::retry_request`] to resubmit only the failures.
    pub async fn bulk_restock(
        &self,
        request: &BulkRestockRequest,
        actor: &Actor,
    ) -> BulkRestockOutcome {
        let mut outcome = BulkRestockOutcome::default();

        for (item_id, quantity) in request.iter() {
            let result = match self.restock(item_id, quantity, actor).await {
                Ok(result) => BulkEntryResult::Restocked { result },
                Err(error) => BulkEntryResult::Failed { error },
            };
            outcome.entries.push(BulkRestockEntry {
                item_id: item_id.to_string(),
                requested: quantity,
                result,
            });
        }

        info!(
            actor = %actor.id,
            requested = request.len(),
            succeeded = outcome.succeeded().count(),
            "Bulk restock finished"
        );
        outcome
    }

    async fn decrement(
        &self,
        item_id: &str,
        quantity: i64,
        actor: &Actor,
    ) -> InventoryResult<(Item, DateTime<Utc>)> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let at = Utc::now();
            let updated = guarded(
                self.timeout,
                "decrement_stock",
                self.catalog.decrement_if_sufficient(item_id, quantity, &actor.id, at),
            )
            .await?;

            if let Some(item) = updated {
                return Ok((item, at));
            }

            let current = guarded(self.timeout, "get_item", self.catalog.get(item_id, false))
                .await?
                .ok_or_else(|| InventoryError::not_found(item_id))?;

            if current.quantity < quantity {
                return Err(InventoryError::InsufficientStock {
                    item_id: current.id,
                    name: current.name,
                    available: current.quantity,
                    requested: quantity,
                });
            }

            if current.price().multiply_quantity(quantity).is_none() {
                return Err(InventoryError::invalid_quantity(
                    quantity,
                    format!("total for {} would overflow", current.name),
                ));
            }

            if attempt >= MAX_PURCHASE_ATTEMPTS {
                warn!(
                    item_id = %item_id,
                    actor = %actor.id,
                    quantity,
                    available = current.quantity,
                    attempts = attempt,
                    "Purchase kept losing the stock race"
                );
                return Err(InventoryError::StoreUnavailable);
            }
        }
    }

    /// The increment matched no row: the item is gone, or the sum would
    /// not fit in the counter.
    async fn classify_failed_restock(&self, item_id: &str, quantity: i64) -> InventoryError {
        match guarded(self.timeout, "get_item", self.catalog.get(item_id, false)).await {
            Ok(Some(_)) => InventoryError::invalid_quantity(quantity, "stock counter would overflow"),
            Ok(None) => InventoryError::not_found(item_id),
            Err(e) => e,
        }
    }

    async fn record(&self, record: MutationRecord, op: &'static str) -> AuditStatus {
        match guarded(self.timeout, "append_mutation", self.audit.append(&record)).await {
            Ok(()) => AuditStatus::Recorded { record },
            Err(e) => {
                warn!(
                    op,
                    item_id = %record.item_id,
                    actor = %record.actor_id,
                    error = %e,
                    "Stock changed but audit record was not written"
                );
                AuditStatus::Degraded {
                    reason: e.to_string(),
                }
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{file_engine, memory_engine, FailingAuditStore, TempDb};
    use crate::InventoryEngine;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use sweetshop_core::{ErrorCode, ItemPatch, ItemSearch, ItemSpec, Money};
    use sweetshop_db::{Database, DbConfig, DbResult};

    /// Catalog whose decrement always loses a race: the guard never matches
    /// while every read shows plenty of stock.
    struct ContendedCatalog {
        item: Item,
        decrements: AtomicUsize,
    }

    #[async_trait]
    impl CatalogStore for ContendedCatalog {
        async fn insert(&self, _item: &Item) -> DbResult<()> {
            unreachable!()
        }

        async fn get(&self, _id: &str, _include_inactive: bool) -> DbResult<Option<Item>> {
            Ok(Some(self.item.clone()))
        }

        async fn find_active_by_name(&self, _name: &str) -> DbResult<Option<Item>> {
            unreachable!()
        }

        async fn list_active(&self) -> DbResult<Vec<Item>> {
            unreachable!()
        }

        async fn search(&self, _filter: &ItemSearch) -> DbResult<Vec<Item>> {
            unreachable!()
        }

        async fn update_metadata(
            &self,
            _id: &str,
            _patch: &ItemPatch,
            _actor_id: &str,
            _at: DateTime<Utc>,
        ) -> DbResult<Option<Item>> {
            unreachable!()
        }

        async fn soft_delete(&self, _id: &str, _actor_id: &str, _at: DateTime<Utc>) -> DbResult<bool> {
            unreachable!()
        }

        async fn decrement_if_sufficient(
            &self,
            _id: &str,
            _quantity: i64,
            _actor_id: &str,
            _at: DateTime<Utc>,
        ) -> DbResult<Option<Item>> {
            self.decrements.fetch_add(1, Ordering::SeqCst);
            Ok(None)
        }

        async fn increment(
            &self,
            _id: &str,
            _quantity: i64,
            _actor_id: &str,
            _at: DateTime<Utc>,
        ) -> DbResult<Option<Item>> {
            unreachable!()
        }

        async fn low_stock(&self, _threshold: i64) -> DbResult<Vec<Item>> {
            unreachable!()
        }

        async fn out_of_stock(&self) -> DbResult<Vec<Item>> {
            unreachable!()
        }

        async fn categories(&self) -> DbResult<Vec<String>> {
            unreachable!()
        }
    }

    async fn with_ladoo(engine: &InventoryEngine, quantity: i64) -> Item {
        engine
            .catalog()
            .create(
                ItemSpec::new("Ladoo", "Traditional", Money::from_cents(1000), quantity),
                &Actor::privileged("admin"),
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_purchase_records_price_snapshot() {
        let engine = memory_engine().await;
        let ladoo = with_ladoo(&engine, 50).await;
        let alice = Actor::new("alice");

        let result = engine.ledger().purchase(&ladoo.id, 5, &alice).await.unwrap();
        assert_eq!(result.remaining_quantity, 45);
        assert_eq!(result.total, Money::from_cents(5000));
        assert_eq!(result.item.updated_by, "alice");

        let record = result.audit.record().unwrap();
        assert_eq!(record.previous_quantity, 50);
        assert_eq!(record.new_quantity, 45);
        assert_eq!(
            record.detail,
            MutationDetail::Purchase {
                unit_price: Money::from_cents(1000),
                total: Money::from_cents(5000),
            }
        );
    }

    #[tokio::test]
    async fn test_repricing_keeps_past_purchase_totals() {
        let engine = memory_engine().await;
        let ladoo = with_ladoo(&engine, 50).await;
        let admin = Actor::privileged("admin");

        engine
            .ledger()
            .purchase(&ladoo.id, 5, &Actor::new("alice"))
            .await
            .unwrap();
        let repriced = engine
            .catalog()
            .update(&ladoo.id, ItemPatch::reprice(Money::from_cents(1500)), &admin)
            .await
            .unwrap();
        assert_eq!(repriced.price(), Money::from_cents(1500));

        let later = engine
            .ledger()
            .purchase(&ladoo.id, 2, &Actor::new("bob"))
            .await
            .unwrap();
        assert_eq!(later.total, Money::from_cents(3000));

        let history = engine.query().item_history(&ladoo.id).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(
            history[0].detail,
            MutationDetail::Purchase {
                unit_price: Money::from_cents(1000),
                total: Money::from_cents(5000),
            }
        );
        assert_eq!(
            history[1].detail,
            MutationDetail::Purchase {
                unit_price: Money::from_cents(1500),
                total: Money::from_cents(3000),
            }
        );
    }

    #[tokio::test]
    async fn test_unpayable_purchase_leaves_stock_untouched() {
        let engine = memory_engine().await;
        let gold = engine
            .catalog()
            .create(
                ItemSpec::new("Gold Ladoo", "Luxury", Money::from_cents(i64::MAX / 2), 10),
                &Actor::privileged("admin"),
            )
            .await
            .unwrap();
        let alice = Actor::new("alice");

        let err = engine.ledger().purchase(&gold.id, 3, &alice).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidQuantity);
        assert_eq!(engine.catalog().get(&gold.id).await.unwrap().unwrap().quantity, 10);
        assert!(engine.query().item_history(&gold.id).await.unwrap().is_empty());

        let sold = engine.ledger().purchase(&gold.id, 2, &alice).await.unwrap();
        assert_eq!(sold.remaining_quantity, 8);
        assert_eq!(sold.total, Money::from_cents(i64::MAX / 2 * 2));
    }

    #[tokio::test]
    async fn test_purchase_losing_every_race_is_retryable() {
        let engine = memory_engine().await;
        let ladoo = with_ladoo(&engine, 50).await;

        let contended = Arc::new(ContendedCatalog {
            item: ladoo.clone(),
            decrements: AtomicUsize::new(0),
        });
        let ledger = StockLedger::new(
            contended.clone(),
            Arc::new(FailingAuditStore),
            Duration::from_secs(5),
            100_000,
        );

        let err = ledger
            .purchase(&ladoo.id, 5, &Actor::new("alice"))
            .await
            .unwrap_err();
        assert_eq!(err, InventoryError::StoreUnavailable);
        assert!(err.is_retryable());
        assert_eq!(contended.decrements.load(Ordering::SeqCst), MAX_PURCHASE_ATTEMPTS);
    }

    #[tokio::test]
    async fn test_purchase_rejects_bad_quantities_without_touching_stock() {
        let engine = memory_engine().await;
        let ladoo = with_ladoo(&engine, 50).await;
        let alice = Actor::new("alice");

        for qty in [0, -3] {
            let err = engine.ledger().purchase(&ladoo.id, qty, &alice).await.unwrap_err();
            assert_eq!(err.code(), ErrorCode::InvalidQuantity);
        }

        let err = engine.ledger().purchase(&ladoo.id, 51, &alice).await.unwrap_err();
        assert_eq!(
            err,
            InventoryError::InsufficientStock {
                item_id: ladoo.id.clone(),
                name: "Ladoo".to_string(),
                available: 50,
                requested: 51,
            }
        );

        let err = engine.ledger().purchase("missing", 1, &alice).await.unwrap_err();
        assert_eq!(err, InventoryError::not_found("missing"));

        assert_eq!(engine.catalog().get(&ladoo.id).await.unwrap().unwrap().quantity, 50);
        assert!(engine.query().item_history(&ladoo.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_purchase_of_deleted_item_is_not_found() {
        let engine = memory_engine().await;
        let ladoo = with_ladoo(&engine, 50).await;
        engine
            .catalog()
            .delete(&ladoo.id, &Actor::privileged("admin"))
            .await
            .unwrap();

        let err = engine
            .ledger()
            .purchase(&ladoo.id, 1, &Actor::new("alice"))
            .await
            .unwrap_err();
        assert_eq!(err.http_status(), 404);
    }

    #[tokio::test]
    async fn test_restock_bounds() {
        let engine = memory_engine().await;
        let ladoo = with_ladoo(&engine, 0).await;
        let admin = Actor::privileged("admin");

        let result = engine.ledger().restock(&ladoo.id, 100_000, &admin).await.unwrap();
        assert_eq!(result.previous_quantity, 0);
        assert_eq!(result.new_quantity, 100_000);
        assert_eq!(result.audit.record().unwrap().kind(), sweetshop_core::MutationKind::Restock);

        let err = engine.ledger().restock(&ladoo.id, 100_001, &admin).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidQuantity);

        let err = engine.ledger().restock("missing", 5, &admin).await.unwrap_err();
        assert_eq!(err, InventoryError::not_found("missing"));
    }

    #[tokio::test]
    async fn test_bulk_restock_is_per_entry() {
        let engine = memory_engine().await;
        let ladoo = with_ladoo(&engine, 10).await;
        let admin = Actor::privileged("admin");

        let request = BulkRestockRequest::new()
            .with(ladoo.id.clone(), 5)
            .with("missing", 7)
            .with(ladoo.id.clone(), 15);

        let outcome = engine.ledger().bulk_restock(&request, &admin).await;
        assert_eq!(outcome.entries.len(), 2);
        assert_eq!(outcome.entries[0].item_id, ladoo.id);

        let (_, restocked) = outcome.succeeded().next().unwrap();
        assert_eq!(restocked.new_quantity, 25);

        let failed: Vec<_> = outcome.failed().collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].0, "missing");

        let retry = outcome.retry_request();
        assert_eq!(retry.iter().collect::<Vec<_>>(), vec![("missing", 7)]);
    }

    #[tokio::test]
    async fn test_audit_failure_degrades_but_keeps_stock_change() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let engine = InventoryEngine::new(
            Arc::new(db.items()),
            Arc::new(FailingAuditStore),
            crate::EngineConfig::default(),
        );
        let ladoo = with_ladoo(&engine, 50).await;

        let result = engine
            .ledger()
            .purchase(&ladoo.id, 5, &Actor::new("alice"))
            .await
            .unwrap();
        assert!(result.audit.is_degraded());
        assert_eq!(result.remaining_quantity, 45);

        let restocked = engine
            .ledger()
            .restock(&ladoo.id, 5, &Actor::privileged("admin"))
            .await
            .unwrap();
        assert!(restocked.audit.is_degraded());

        assert_eq!(engine.catalog().get(&ladoo.id).await.unwrap().unwrap().quantity, 50);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_purchases_never_oversell() {
        let db = TempDb::new();
        let engine = file_engine(&db).await;
        let ladoo = with_ladoo(&engine, 50).await;

        let mut tasks = Vec::new();
        for n in 0..2 {
            let engine = engine.clone();
            let id = ladoo.id.clone();
            tasks.push(tokio::spawn(async move {
                engine
                    .ledger()
                    .purchase(&id, 30, &Actor::new(format!("buyer-{}", n)))
                    .await
            }));
        }

        let mut successes = 0;
        let mut insufficient = 0;
        for task in tasks {
            match task.await.unwrap() {
                Ok(_) => successes += 1,
                Err(InventoryError::InsufficientStock { available, .. }) => {
                    assert_eq!(available, 20);
                    insufficient += 1;
                }
                Err(other) => panic!("unexpected error: {other}"),
            }
        }

        assert_eq!((successes, insufficient), (1, 1));
        assert_eq!(engine.catalog().get(&ladoo.id).await.unwrap().unwrap().quantity, 20);
        assert_eq!(engine.query().item_history(&ladoo.id).await.unwrap().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_many_concurrent_purchases_conserve_stock() {
        let db = TempDb::new();
        let engine = file_engine(&db).await;
        let ladoo = with_ladoo(&engine, 50).await;

        let mut tasks = Vec::new();
        for n in 0..20 {
            let engine = engine.clone();
            let id = ladoo.id.clone();
            tasks.push(tokio::spawn(async move {
                engine
                    .ledger()
                    .purchase(&id, 3, &Actor::new(format!("buyer-{}", n)))
                    .await
            }));
        }

        let mut sold = 0;
        for task in tasks {
            if let Ok(result) = task.await.unwrap() {
                sold += 3;
                assert!(result.remaining_quantity >= 0);
            }
        }

        let remaining = engine.catalog().get(&ladoo.id).await.unwrap().unwrap().quantity;
        assert_eq!(sold, 48);
        assert_eq!(remaining, 50 - sold);

        let history = engine.query().item_history(&ladoo.id).await.unwrap();
        assert_eq!(history.len(), 16);
        assert_eq!(history[0].previous_quantity, 50);
        assert_eq!(history[15].new_quantity, 2);
        for (n, record) in history.iter().enumerate() {
            assert_eq!(record.stock_version, n as i64 + 1);
        }
        for pair in history.windows(2) {
            assert_eq!(pair[0].new_quantity, pair[1].previous_quantity);
        }
    }
}
