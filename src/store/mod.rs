//! Record store.
//!
//! The storefront talks to a hosted data service through two seams: the
//! [`OrderSink`] used by checkout, and table-level CRUD used by the back-office.
//! [`MemoryStore`] implements both in process.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::model::{
    Offer, OrderDraft, OrderRecord, Product, RecordId, Testimonial, UncompletedOrder,
};
use crate::order_number::OrderNumber;

mod error;
pub use error::StoreError;

mod table;
pub use table::{Record, Table};

/// Where a validated checkout ends up.
///
/// The backend is authoritative for order identity: it assigns both the row id
/// and the order number.
pub trait OrderSink {
    fn place(
        &self,
        draft: OrderDraft,
    ) -> impl Future<Output = Result<OrderRecord, StoreError>> + Send;
}

/// In-process stand-in for the hosted data service.
pub struct MemoryStore {
    pub orders: Table<OrderRecord>,
    pub products: Table<Product>,
    pub testimonials: Table<Testimonial>,
    pub offers: Table<Offer>,
    pub uncompleted: Table<UncompletedOrder>,
    settings: RwLock<BTreeMap<String, String>>,
    order_sequence: AtomicU32,
    offline: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            orders: Table::new(),
            products: Table::new(),
            testimonials: Table::new(),
            offers: Table::new(),
            uncompleted: Table::new(),
            settings: RwLock::new(BTreeMap::new()),
            order_sequence: AtomicU32::new(0),
            offline: AtomicBool::new(false),
        }
    }

    /// A store whose order placement always fails with a retryable error.
    pub fn failing() -> Self {
        let store = Self::new();
        store.set_offline(true);
        store
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::Relaxed);
    }

    pub async fn get_setting(&self, key: &str) -> Option<String> {
        self.settings.read().await.get(key).cloned()
    }

    /// Insert or overwrite one setting, keyed by name.
    pub async fn upsert_setting(&self, key: impl Into<String>, value: impl Into<String>) {
        self.settings.write().await.insert(key.into(), value.into());
    }

    pub async fn settings(&self) -> BTreeMap<String, String> {
        self.settings.read().await.clone()
    }

    /// Record a partially filled checkout; an existing capture with `id` is replaced.
    pub async fn save_uncompleted(&self, capture: UncompletedOrder) -> UncompletedOrder {
        let id = capture.id;
        if id != 0 {
            let replacement = capture.clone();
            if let Ok(row) = self.uncompleted.update(id, |row| *row = replacement).await {
                return row;
            }
        }
        self.uncompleted.insert(capture).await
    }

    pub async fn mark_converted(&self, id: RecordId) -> Result<UncompletedOrder, StoreError> {
        self.uncompleted.update(id, |row| row.converted = true).await
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl OrderSink for MemoryStore {
    async fn place(&self, draft: OrderDraft) -> Result<OrderRecord, StoreError> {
        if self.offline.load(Ordering::Relaxed) {
            warn!("order placement refused, store offline");
            return Err(StoreError::Unavailable("store is offline".to_string()));
        }

        let sequence = self.order_sequence.fetch_add(1, Ordering::Relaxed) + 1;
        let order_number = OrderNumber::new(draft.placed_on(), sequence);
        let record = self
            .orders
            .insert(OrderRecord::from_draft(0, order_number, draft))
            .await;

        info!(
            id = record.id,
            order = %record.order_number,
            total = %record.total,
            "order stored"
        );
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    use crate::Taka;
    use crate::model::{ContactInfo, OrderStatus, ProductVariant, Quantity};
    use crate::pricing::PriceBreakdown;

    fn draft() -> OrderDraft {
        let variant = ProductVariant::new("500g", "Beetroot 500g", "500g Jar", Taka::new(1450));
        let quantity = Quantity::new(5).unwrap();
        OrderDraft {
            contact: ContactInfo {
                name: " Rahim Uddin ".into(),
                phone: "017 1234 5678".into(),
                email: String::new(),
                address: "House 12, Road 5, Dhaka".into(),
            },
            breakdown: PriceBreakdown::compute(variant.unit_price, quantity),
            variant,
            quantity,
            placed_at: Utc.with_ymd_and_hms(2026, 10, 18, 9, 30, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn place_assigns_id_and_sequential_order_numbers() {
        let store = MemoryStore::new();
        let first = store.place(draft()).await.unwrap();
        let second = store.place(draft()).await.unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(first.order_number.as_str(), "ORD-20261018-0001");
        assert_eq!(second.order_number.as_str(), "ORD-20261018-0002");
        assert_eq!(store.orders.len().await, 2);
    }

    #[tokio::test]
    async fn placed_order_carries_pricing_and_normalized_contact() {
        let store = MemoryStore::new();
        let record = store.place(draft()).await.unwrap();

        assert_eq!(record.customer_name, "Rahim Uddin");
        assert_eq!(record.customer_phone, "01712345678");
        assert_eq!(record.subtotal, Taka::new(7250));
        assert_eq!(record.discount, Taka::new(580));
        assert_eq!(record.discount_pct, 8);
        assert_eq!(record.total, Taka::new(6670));
        assert_eq!(record.status, OrderStatus::Pending);
        assert_eq!(record.payment_method, "cod");
    }

    #[tokio::test]
    async fn failing_store_rejects_with_retryable_error() {
        let store = MemoryStore::failing();
        let err = store.place(draft()).await.unwrap_err();
        assert!(err.is_retryable());
        assert!(store.orders.is_empty().await);

        store.set_offline(false);
        assert!(store.place(draft()).await.is_ok());
    }

    #[tokio::test]
    async fn settings_upsert_overwrites() {
        let store = MemoryStore::new();
        store.upsert_setting("phone", "01700000000").await;
        store.upsert_setting("phone", "01711111111").await;
        assert_eq!(store.get_setting("phone").await.as_deref(), Some("01711111111"));
        assert_eq!(store.settings().await.len(), 1);
        assert_eq!(store.get_setting("email").await, None);
    }

    #[tokio::test]
    async fn uncompleted_capture_is_replaced_then_converted() {
        let store = MemoryStore::new();
        let first = store
            .save_uncompleted(UncompletedOrder {
                customer_name: Some("Rahim".into()),
                ..Default::default()
            })
            .await;

        let updated = store
            .save_uncompleted(UncompletedOrder {
                id: first.id,
                customer_phone: Some("01712345678".into()),
                ..first.clone()
            })
            .await;

        assert_eq!(updated.id, first.id);
        assert_eq!(store.uncompleted.len().await, 1);

        let converted = store.mark_converted(first.id).await.unwrap();
        assert!(converted.converted);
    }
}
