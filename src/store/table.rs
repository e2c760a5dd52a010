use std::collections::BTreeMap;

use tokio::sync::RwLock;
use tracing::debug;

use super::StoreError;
use crate::model::{Offer, OrderRecord, Product, RecordId, Testimonial, UncompletedOrder};

/// A row type that lives in a named table and takes its id from the table.
pub trait Record: Clone + Send + Sync {
    const TABLE: &'static str;

    fn set_id(&mut self, id: RecordId);
}

struct Rows<R> {
    rows: BTreeMap<RecordId, R>,
    next_id: RecordId,
}

/// In-memory table with the CRUD surface of the hosted data service.
pub struct Table<R> {
    inner: RwLock<Rows<R>>,
}

impl<R: Record> Table<R> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Rows {
                rows: BTreeMap::new(),
                next_id: 1,
            }),
        }
    }

    /// Rows matching `filter`, in id order.
    pub async fn select(&self, filter: impl Fn(&R) -> bool) -> Vec<R> {
        let inner = self.inner.read().await;
        inner.rows.values().filter(|r| filter(r)).cloned().collect()
    }

    pub async fn all(&self) -> Vec<R> {
        self.select(|_| true).await
    }

    pub async fn get(&self, id: RecordId) -> Option<R> {
        self.inner.read().await.rows.get(&id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.rows.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Insert a row, overwriting whatever id it carried with a fresh one.
    pub async fn insert(&self, mut row: R) -> R {
        let mut inner = self.inner.write().await;
        let id = inner.next_id;
        inner.next_id += 1;

        row.set_id(id);
        inner.rows.insert(id, row.clone());
        debug!(table = R::TABLE, id, "row inserted");
        row
    }

    /// Apply `patch` in place and return the updated row. The id cannot be changed.
    pub async fn update(&self, id: RecordId, patch: impl FnOnce(&mut R)) -> Result<R, StoreError> {
        let mut inner = self.inner.write().await;
        let row = inner.rows.get_mut(&id).ok_or(StoreError::NotFound {
            table: R::TABLE,
            id,
        })?;

        patch(row);
        row.set_id(id);
        debug!(table = R::TABLE, id, "row updated");
        Ok(row.clone())
    }

    pub async fn delete(&self, id: RecordId) -> Result<R, StoreError> {
        let removed = self.inner.write().await.rows.remove(&id);
        let row = removed.ok_or(StoreError::NotFound {
            table: R::TABLE,
            id,
        })?;
        debug!(table = R::TABLE, id, "row deleted");
        Ok(row)
    }
}

impl<R: Record> Default for Table<R> {
    fn default() -> Self {
        Self::new()
    }
}

macro_rules! record {
    ($ty:ty, $table:literal) => {
        impl Record for $ty {
            const TABLE: &'static str = $table;

            fn set_id(&mut self, id: RecordId) {
                self.id = id;
            }
        }
    };
}

record!(OrderRecord, "orders");
record!(Product, "products");
record!(Testimonial, "testimonials");
record!(Offer, "offers");
record!(UncompletedOrder, "uncompleted_orders");
