//! In-memory order store.
//!
//! Keeps encoded records and the index set behind a single lock so every
//! mutation is atomic, mirroring what the Redis backend gets from MULTI/EXEC.
//! Nothing survives a restart.

use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::order::{Order, OrderId};

use super::codec::{decode, encode};
use super::keys::order_key;
use super::{OrderRepository, PageRequest, PageResult, StoreError, SCAN_COMPLETE};

#[derive(Default)]
struct MemoryState {
    records: HashMap<String, Vec<u8>>,
    index: BTreeSet<String>,
}

#[derive(Clone, Default)]
pub struct MemoryOrderStore {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store raw bytes under an order's key, bypassing the codec.
    #[cfg(test)]
    pub(crate) async fn put_raw(&self, id: OrderId, bytes: &[u8]) {
        let key = order_key(id);
        let mut state = self.state.write().await;
        state.records.insert(key.clone(), bytes.to_vec());
        state.index.insert(key);
    }
}

#[async_trait]
impl OrderRepository for MemoryOrderStore {
    async fn insert(&self, order: &Order) -> Result<(), StoreError> {
        let key = order_key(order.order_id);
        let mut record = order.clone();
        record.revision = 0;
        let bytes = encode(&record)?;

        let mut state = self.state.write().await;
        if state.records.contains_key(&key) {
            return Err(StoreError::AlreadyExists(order.order_id));
        }
        state.records.insert(key.clone(), bytes);
        state.index.insert(key);

        tracing::debug!(order_id = order.order_id, "Inserted order into memory store");
        Ok(())
    }

    async fn find_by_id(&self, id: OrderId) -> Result<Order, StoreError> {
        let state = self.state.read().await;
        let bytes = state
            .records
            .get(&order_key(id))
            .ok_or(StoreError::NotFound(id))?;
        decode(bytes)
    }

    async fn update(&self, order: &Order) -> Result<u64, StoreError> {
        let key = order_key(order.order_id);

        let mut state = self.state.write().await;
        let current = state
            .records
            .get(&key)
            .ok_or(StoreError::NotFound(order.order_id))?;
        let stored_revision = decode(current)?.revision;

        if stored_revision != order.revision {
            return Err(StoreError::Conflict {
                id: order.order_id,
                expected: order.revision,
                actual: stored_revision,
            });
        }

        let mut record = order.clone();
        record.revision = stored_revision + 1;
        state.records.insert(key, encode(&record)?);

        Ok(record.revision)
    }

    async fn delete_by_id(&self, id: OrderId) -> Result<(), StoreError> {
        let key = order_key(id);

        let mut state = self.state.write().await;
        if state.records.remove(&key).is_none() {
            return Err(StoreError::NotFound(id));
        }
        state.index.remove(&key);

        tracing::debug!(order_id = id, "Deleted order from memory store");
        Ok(())
    }

    async fn find_all(&self, page: PageRequest) -> Result<PageResult, StoreError> {
        let state = self.state.read().await;
        let start = usize::try_from(page.offset).unwrap_or(usize::MAX);
        let size = usize::try_from(page.size.max(1)).unwrap_or(usize::MAX);

        let orders = state
            .index
            .iter()
            .skip(start)
            .take(size)
            .filter_map(|key| state.records.get(key))
            .map(|bytes| decode(bytes))
            .collect::<Result<Vec<_>, _>>()?;

        let end = start.saturating_add(size);
        let next_offset = if end >= state.index.len() {
            SCAN_COMPLETE
        } else {
            end as u64
        };

        Ok(PageResult { orders, next_offset })
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
