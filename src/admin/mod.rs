//! Back-office operations over the record store.

use std::collections::BTreeSet;

use tracing::info;

use crate::model::{OrderRecord, OrderStatus, RecordId, UncompletedOrder};
use crate::store::{MemoryStore, StoreError};

mod dashboard;
pub use dashboard::{DashboardStats, FREE_DELIVERY_SAVING, RECENT_ORDERS};

/// Keys the settings page edits.
pub const SETTING_KEYS: [&str; 5] = [
    "site_name",
    "phone",
    "email",
    "free_delivery",
    "stock_alert_threshold",
];

/// Search box and status dropdown of the orders page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderFilter {
    pub search: String,
    /// `None` shows every status.
    pub status: Option<OrderStatus>,
}

impl OrderFilter {
    /// Search matches order number or customer name (case-insensitive) or a phone substring.
    pub fn matches(&self, order: &OrderRecord) -> bool {
        let search = self.search.trim();
        let matches_search = search.is_empty() || {
            let needle = search.to_lowercase();
            order.order_number.as_str().to_lowercase().contains(&needle)
                || order.customer_name.to_lowercase().contains(&needle)
                || order.customer_phone.contains(search)
        };
        let matches_status = self.status.is_none_or(|status| order.status == status);
        matches_search && matches_status
    }

    /// Matching orders, newest first.
    pub fn apply<'a>(&self, orders: &'a [OrderRecord]) -> Vec<&'a OrderRecord> {
        let mut filtered: Vec<_> = orders.iter().filter(|o| self.matches(o)).collect();
        filtered.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        filtered
    }
}

/// Orders ticked for bulk export.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    ids: BTreeSet<RecordId>,
}

impl Selection {
    pub fn toggle(&mut self, id: RecordId) {
        if !self.ids.remove(&id) {
            self.ids.insert(id);
        }
    }

    /// Select every visible order, or clear if they already are all selected.
    pub fn toggle_all(&mut self, visible: &[&OrderRecord]) {
        if !visible.is_empty() && self.ids.len() == visible.len() {
            self.ids.clear();
        } else {
            self.ids = visible.iter().map(|o| o.id).collect();
        }
    }

    pub fn contains(&self, id: RecordId) -> bool {
        self.ids.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn pick<'a>(&self, orders: &'a [OrderRecord]) -> Vec<&'a OrderRecord> {
        orders.iter().filter(|o| self.contains(o.id)).collect()
    }
}

pub async fn update_status(
    store: &MemoryStore,
    id: RecordId,
    status: OrderStatus,
) -> Result<OrderRecord, StoreError> {
    let order = store.orders.update(id, |o| o.status = status).await?;
    info!(id, order = %order.order_number, status = %status, "order status updated");
    Ok(order)
}

/// Share of the four contact fields that were filled, in percent.
pub fn completeness(order: &UncompletedOrder) -> u8 {
    let filled = [
        &order.customer_name,
        &order.customer_phone,
        &order.customer_email,
        &order.customer_address,
    ]
    .into_iter()
    .filter(|f| f.as_deref().is_some_and(|v| !v.trim().is_empty()))
    .count();
    (filled * 100 / 4) as u8
}

/// Abandoned checkouts that never converted, most recent capture first.
pub async fn open_uncompleted(store: &MemoryStore) -> Vec<UncompletedOrder> {
    let mut rows = store.uncompleted.select(|row| !row.converted).await;
    rows.reverse();
    rows
}

#[cfg(test)]
pub(crate) mod test_utils {
    use chrono::{DateTime, TimeZone, Utc};

    use crate::Taka;
    use crate::model::{OrderRecord, OrderStatus, PAYMENT_CASH_ON_DELIVERY, RecordId};
    use crate::order_number::OrderNumber;

    pub fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, day, hour, 0, 0).unwrap()
    }

    pub fn order(
        id: RecordId,
        name: &str,
        status: OrderStatus,
        total: i64,
        discount: i64,
    ) -> OrderRecord {
        let created_at = at(10 + (id % 10) as u32, 9);
        OrderRecord {
            id,
            order_number: OrderNumber::new(created_at.date_naive(), id as u32),
            customer_name: name.to_string(),
            customer_phone: format!("0171234{id:04}"),
            customer_email: String::new(),
            customer_address: "House 12, Road 5, Dhaka".to_string(),
            product_name: "Organic Beetroot Powder 500g".to_string(),
            variation: "500g Jar".to_string(),
            quantity: 1,
            unit_price: Taka::new(total + discount),
            subtotal: Taka::new(total + discount),
            discount: Taka::new(discount),
            discount_pct: 0,
            total: Taka::new(total),
            status,
            payment_method: PAYMENT_CASH_ON_DELIVERY.to_string(),
            notes: None,
            created_at,
        }
    }
}
