//! # Domain Types
//!
//! Core domain types used throughout the inventory engine.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │      Item       │   │ MutationRecord  │   │     Actor       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (opaque)    │       │
//! │  │  name (unique)  │   │  item_id        │   │  is_privileged  │       │
//! │  │  price_cents    │   │  detail         │   └─────────────────┘       │
//! │  │  quantity >= 0  │   │  actor_id       │                             │
//! │  │  is_active      │   └─────────────────┘                             │
//! │  └─────────────────┘                                                    │
//! │                                                                         │
//! │  Requests: ItemSpec, ItemPatch, ItemSearch, BulkRestockRequest         │
//! │  Results:  PurchaseResult, RestockResult, BulkRestockOutcome           │
//! │  Reports:  InventoryStats                                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use ts_rs::TS;

use crate::error::InventoryError;
use crate::money::Money;

// =============================================================================
// Actor
// =============================================================================

/// The identity performing an operation, as vouched for by the identity
/// service. The engine stamps `id` into audit fields and never checks
/// `is_privileged` itself: the gateway has already authorized the call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Actor {
    pub id: String,
    pub is_privileged: bool,
}

impl Actor {
    /// A regular customer.
    pub fn new(id: impl Into<String>) -> Self {
        Actor {
            id: id.into(),
            is_privileged: false,
        }
    }

    /// An admin / staff member.
    pub fn privileged(id: impl Into<String>) -> Self {
        Actor {
            id: id.into(),
            is_privileged: true,
        }
    }
}

// =============================================================================
// Item
// =============================================================================

/// A sweet in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Item {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name, unique among active items (case-insensitive).
    pub name: String,

    pub category: String,

    /// Price in cents, always positive.
    pub price_cents: i64,

    /// Units in stock, never negative.
    pub quantity: i64,

    /// Bumped by every purchase and restock. Zero for a fresh item.
    pub stock_version: i64,

    pub description: Option<String>,

    pub image_url: Option<String>,

    pub tags: Vec<String>,

    /// Whether the item is active (soft delete).
    pub is_active: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,

    pub created_by: String,

    pub updated_by: String,

    /// Set once, when the item is soft-deleted.
    #[ts(as = "Option<String>")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Item {
    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Value of the units on hand (price × quantity).
    pub fn stock_value(&self) -> Option<Money> {
        self.price().multiply_quantity(self.quantity)
    }

    /// In stock but at or below `threshold`.
    pub fn is_low_stock(&self, threshold: i64) -> bool {
        self.quantity > 0 && self.quantity <= threshold
    }

    pub fn is_out_of_stock(&self) -> bool {
        self.quantity == 0
    }
}

/// Case-folded form of a name, the key of the uniqueness invariant.
///
/// ```rust
/// use sweetshop_core::name_key;
///
/// assert_eq!(name_key("  Barfi "), name_key("barfi"));
/// ```
pub fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

// =============================================================================
// Item Requests
// =============================================================================

/// Everything needed to create an item.
///
/// ## Example
/// ```rust
/// use sweetshop_core::{ItemSpec, Money};
///
/// let spec = ItemSpec::new("Ladoo", "Traditional", Money::from_cents(1000), 50)
///     .with_description("Gram flour and ghee")
///     .with_tags(["festive", "bestseller"]);
/// assert_eq!(spec.tags.len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ItemSpec {
    pub name: String,
    pub category: String,
    pub price: Money,
    pub quantity: i64,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl ItemSpec {
    pub fn new(
        name: impl Into<String>,
        category: impl Into<String>,
        price: Money,
        quantity: i64,
    ) -> Self {
        ItemSpec {
            name: name.into(),
            category: category.into(),
            price,
            quantity,
            description: None,
            image_url: None,
            tags: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_image_url(mut self, url: impl Into<String>) -> Self {
        self.image_url = Some(url.into());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }
}

/// A partial update. `None` fields are left untouched.
///
/// Stock is deliberately absent: only purchases and restocks move quantity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ItemPatch {
    pub name: Option<String>,
    pub category: Option<String>,
    pub price: Option<Money>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl ItemPatch {
    pub fn rename(name: impl Into<String>) -> Self {
        ItemPatch {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn reprice(price: Money) -> Self {
        ItemPatch {
            price: Some(price),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.category.is_none()
            && self.price.is_none()
            && self.description.is_none()
            && self.image_url.is_none()
            && self.tags.is_none()
    }
}

/// Catalog search filters. All are optional and combine with AND.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ItemSearch {
    /// Case-insensitive substring of the name.
    pub name: Option<String>,
    /// Exact category; `"all"` matches everything.
    pub category: Option<String>,
    /// Inclusive lower price bound.
    pub min_price: Option<Money>,
    /// Inclusive upper price bound.
    pub max_price: Option<Money>,
    #[serde(default)]
    pub offset: u32,
    /// Page size, capped at [`crate::MAX_PAGE_SIZE`].
    pub limit: Option<u32>,
}

impl ItemSearch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, needle: impl Into<String>) -> Self {
        self.name = Some(needle.into());
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn price_between(mut self, min: Option<Money>, max: Option<Money>) -> Self {
        self.min_price = min;
        self.max_price = max;
        self
    }

    pub fn page(mut self, offset: u32, limit: u32) -> Self {
        self.offset = offset;
        self.limit = Some(limit);
        self
    }
}

// =============================================================================
// Mutation Records (audit trail)
// =============================================================================

/// Kind of stock mutation, as stored in the audit table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum MutationKind {
    Purchase,
    Restock,
}

impl MutationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MutationKind::Purchase => "purchase",
            MutationKind::Restock => "restock",
        }
    }
}

/// Kind-specific part of a mutation record.
///
/// A purchase freezes the unit price observed by the decrement itself, so
/// later price edits never change what was charged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MutationDetail {
    Purchase { unit_price: Money, total: Money },
    Restock,
}

impl MutationDetail {
    pub fn kind(&self) -> MutationKind {
        match self {
            MutationDetail::Purchase { .. } => MutationKind::Purchase,
            MutationDetail::Restock => MutationKind::Restock,
        }
    }
}

/// One immutable audit entry. Created once per successful purchase or
/// restock, never updated or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MutationRecord {
    pub id: String,
    pub item_id: String,
    /// Item name at the time of the mutation (frozen).
    pub item_name: String,
    /// Positive number of units moved.
    pub quantity: i64,
    pub previous_quantity: i64,
    pub new_quantity: i64,
    /// The item's `stock_version` once this change was applied. Orders an
    /// item's records exactly as the changes hit the catalog.
    pub stock_version: i64,
    pub actor_id: String,
    #[ts(as = "String")]
    pub recorded_at: DateTime<Utc>,
    pub detail: MutationDetail,
}

impl MutationRecord {
    pub fn kind(&self) -> MutationKind {
        self.detail.kind()
    }
}

/// Whether the audit append that follows a stock change succeeded.
///
/// Stock and audit live in independent stores. When the append fails the
/// stock change still stands and the result reports `Degraded`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AuditStatus {
    Recorded { record: MutationRecord },
    Degraded { reason: String },
}

impl AuditStatus {
    pub fn is_degraded(&self) -> bool {
        matches!(self, AuditStatus::Degraded { .. })
    }

    pub fn record(&self) -> Option<&MutationRecord> {
        match self {
            AuditStatus::Recorded { record } => Some(record),
            AuditStatus::Degraded { .. } => None,
        }
    }
}

// =============================================================================
// Stock Results
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PurchaseResult {
    /// Item as it stands right after the decrement.
    pub item: Item,
    pub remaining_quantity: i64,
    pub unit_price: Money,
    /// unit_price × quantity at purchase time.
    pub total: Money,
    pub audit: AuditStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RestockResult {
    pub item: Item,
    pub previous_quantity: i64,
    pub new_quantity: i64,
    pub audit: AuditStatus,
}

// =============================================================================
// Bulk Restock
// =============================================================================

/// Ordered mapping of item id → quantity to add.
///
/// Inserting an id that is already present replaces its quantity and keeps
/// its original position, so each id is attempted exactly once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkRestockRequest {
    entries: Vec<(String, i64)>,
}

impl BulkRestockRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, item_id: impl Into<String>, quantity: i64) {
        let item_id = item_id.into();
        match self.entries.iter_mut().find(|(id, _)| *id == item_id) {
            Some(entry) => entry.1 = quantity,
            None => self.entries.push((item_id, quantity)),
        }
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with(mut self, item_id: impl Into<String>, quantity: i64) -> Self {
        self.insert(item_id, quantity);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> {
        self.entries.iter().map(|(id, qty)| (id.as_str(), *qty))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, i64)> for BulkRestockRequest {
    fn from_iter<T: IntoIterator<Item = (S, i64)>>(iter: T) -> Self {
        let mut request = BulkRestockRequest::new();
        for (id, qty) in iter {
            request.insert(id, qty);
        }
        request
    }
}

/// Result of one bulk entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum BulkEntryResult {
    Restocked { result: RestockResult },
    Failed { error: InventoryError },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BulkRestockEntry {
    pub item_id: String,
    pub requested: i64,
    pub result: BulkEntryResult,
}

/// Per-item results of a bulk restock, in request order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BulkRestockOutcome {
    pub entries: Vec<BulkRestockEntry>,
}

impl BulkRestockOutcome {
    pub fn succeeded(&self) -> impl Iterator<Item = (&str, &RestockResult)> {
        self.entries.iter().filter_map(|e| match &e.result {
            BulkEntryResult::Restocked { result } => Some((e.item_id.as_str(), result)),
            BulkEntryResult::Failed { .. } => None,
        })
    }

    pub fn failed(&self) -> impl Iterator<Item = (&str, &InventoryError)> {
        self.entries.iter().filter_map(|e| match &e.result {
            BulkEntryResult::Failed { error } => Some((e.item_id.as_str(), error)),
            BulkEntryResult::Restocked { .. } => None,
        })
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed().next().is_none()
    }

    /// Request containing only the failed entries, for a targeted retry.
    pub fn retry_request(&self) -> BulkRestockRequest {
        self.entries
            .iter()
            .filter(|e| matches!(e.result, BulkEntryResult::Failed { .. }))
            .map(|e| (e.item_id.clone(), e.requested))
            .collect()
    }
}

// =============================================================================
// Inventory Stats
// =============================================================================

/// Aggregate view over active items, computed fresh on every call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct InventoryStats {
    pub total_items: usize,
    pub total_units: i64,
    /// Σ price × quantity, saturating at `i64::MAX` cents.
    pub total_value: Money,
    /// total_value / total_units, zero when nothing is in stock.
    pub average_unit_price: Money,
    pub category_counts: BTreeMap<String, usize>,
}

impl InventoryStats {
    /// Computes the stats for a set of active items.
    ///
    /// Sums are taken in `i128`, so no catalog can overflow them. A total
    /// that does not fit back into `i64` is reported as `i64::MAX`; the
    /// average is still computed from the exact sums.
    ///
    /// ## Example
    /// ```rust
    /// use sweetshop_core::InventoryStats;
    ///
    /// let stats = InventoryStats::from_items(&[]);
    /// assert_eq!(stats.average_unit_price.cents(), 0);
    /// ```
    pub fn from_items(items: &[Item]) -> Self {
        let mut category_counts = BTreeMap::new();
        let mut units: i128 = 0;
        let mut value: i128 = 0;

        for item in items {
            units = units.saturating_add(i128::from(item.quantity));
            value = value.saturating_add(
                i128::from(item.price_cents).saturating_mul(i128::from(item.quantity)),
            );
            *category_counts.entry(item.category.clone()).or_insert(0) += 1;
        }

        let average = if units == 0 {
            0
        } else {
            // Half away from zero; both operands are non-negative
            let (q, r) = (value / units, value % units);
            if r * 2 >= units {
                q + 1
            } else {
                q
            }
        };

        InventoryStats {
            total_items: items.len(),
            total_units: saturate(units),
            total_value: Money::from_cents(saturate(value)),
            average_unit_price: Money::from_cents(saturate(average)),
            category_counts,
        }
    }
}

/// Clamps a wide total into `i64`. Totals past `i64::MAX` report `i64::MAX`.
fn saturate(total: i128) -> i64 {
    i64::try_from(total).unwrap_or(if total < 0 { i64::MIN } else { i64::MAX })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn item(name: &str, category: &str, price_cents: i64, quantity: i64) -> Item {
        let now = Utc::now();
        Item {
            id: format!("id-{}", name),
            name: name.to_string(),
            category: category.to_string(),
            price_cents,
            quantity,
            stock_version: 0,
            description: None,
            image_url: None,
            tags: vec![],
            is_active: true,
            created_at: now,
            updated_at: now,
            created_by: "admin".to_string(),
            updated_by: "admin".to_string(),
            deleted_at: None,
        }
    }

    #[test]
    fn test_stock_predicates() {
        assert!(item("a", "c", 100, 3).is_low_stock(5));
        assert!(item("a", "c", 100, 5).is_low_stock(5));
        assert!(!item("a", "c", 100, 0).is_low_stock(5));
        assert!(!item("a", "c", 100, 6).is_low_stock(5));
        assert!(item("a", "c", 100, 0).is_out_of_stock());
    }

    #[test]
    fn test_stats_from_items() {
        let items = vec![
            item("Ladoo", "Traditional", 1000, 45),
            item("Barfi", "Traditional", 1250, 10),
            item("Brownie", "Baked", 300, 0),
        ];
        let stats = InventoryStats::from_items(&items);

        assert_eq!(stats.total_items, 3);
        assert_eq!(stats.total_units, 55);
        assert_eq!(stats.total_value.cents(), 45_000 + 12_500);
        // 57500 / 55 = 1045.45 → 1045
        assert_eq!(stats.average_unit_price.cents(), 1045);
        assert_eq!(stats.category_counts["Traditional"], 2);
        assert_eq!(stats.category_counts["Baked"], 1);
    }

    #[test]
    fn test_stats_saturate_instead_of_overflowing() {
        let pricey = i64::MAX / 4;
        let items = vec![
            item("Gold Ladoo", "Luxury", pricey, 3),
            item("Silver Barfi", "Luxury", pricey, 3),
            item("Peda", "Milk", 1000, 10),
        ];
        let stats = InventoryStats::from_items(&items);

        assert_eq!(stats.total_units, 16);
        assert_eq!(stats.total_value.cents(), i64::MAX);

        let exact = 6 * i128::from(pricey) + 10_000;
        let expected = exact / 16 + i128::from((exact % 16) * 2 >= 16);
        assert_eq!(i128::from(stats.average_unit_price.cents()), expected);
    }

    #[test]
    fn test_stats_count_single_overflowing_item_in_full() {
        let stats = InventoryStats::from_items(&[item("Gold Ladoo", "Luxury", i64::MAX, 2)]);

        assert_eq!(stats.total_value.cents(), i64::MAX);
        assert_eq!(stats.average_unit_price.cents(), i64::MAX);
    }

    #[test]
    fn test_stats_without_units_has_zero_average() {
        let stats = InventoryStats::from_items(&[item("Brownie", "Baked", 300, 0)]);
        assert_eq!(stats.total_units, 0);
        assert_eq!(stats.average_unit_price, Money::zero());
    }

    #[test]
    fn test_bulk_request_keeps_first_position() {
        let request = BulkRestockRequest::new()
            .with("a", 5)
            .with("b", 7)
            .with("a", 9);

        let entries: Vec<_> = request.iter().collect();
        assert_eq!(entries, vec![("a", 9), ("b", 7)]);
    }

    #[test]
    fn test_retry_request_contains_only_failures() {
        let ok = RestockResult {
            item: item("Ladoo", "Traditional", 1000, 10),
            previous_quantity: 5,
            new_quantity: 10,
            audit: AuditStatus::Degraded {
                reason: "test".to_string(),
            },
        };
        let outcome = BulkRestockOutcome {
            entries: vec![
                BulkRestockEntry {
                    item_id: "a".to_string(),
                    requested: 5,
                    result: BulkEntryResult::Restocked { result: ok },
                },
                BulkRestockEntry {
                    item_id: "b".to_string(),
                    requested: 3,
                    result: BulkEntryResult::Failed {
                        error: InventoryError::not_found("b"),
                    },
                },
            ],
        };

        assert!(!outcome.all_succeeded());
        assert_eq!(outcome.succeeded().count(), 1);
        let retry: Vec<_> = outcome.retry_request().iter().map(|(id, q)| (id.to_string(), q)).collect();
        assert_eq!(retry, vec![("b".to_string(), 3)]);
    }

    #[test]
    fn test_mutation_detail_serializes_tagged() {
        let detail = MutationDetail::Purchase {
            unit_price: Money::from_cents(1000),
            total: Money::from_cents(5000),
        };
        let json = serde_json::to_value(&detail).unwrap();
        assert_eq!(json["kind"], "purchase");
        assert_eq!(json["total"], 5000);
        assert_eq!(detail.kind(), MutationKind::Purchase);
    }
}
