// ============================================================================
// Order Store - Persistence Layer
// ============================================================================
//
// The OrderRepository trait is the only way the rest of the crate touches
// stored orders. Two backends implement it:
// - RedisOrderStore: production backend (SET NX / SSCAN / MULTI / Lua)
// - MemoryOrderStore: in-process backend for tests and local runs
//
// Layout (one logical namespace):
//   order:{id}  -> encoded Order record
//   orders      -> set of every live order:{id} key
//
// ============================================================================

pub mod codec;
pub mod keys;
pub mod memory;
pub mod redis;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::order::{Order, OrderId};
use crate::utils::IsTransient;

pub use memory::MemoryOrderStore;
pub use self::redis::RedisOrderStore;

/// Cursor value that starts a scan and, when returned, marks it exhausted.
pub const SCAN_COMPLETE: u64 = 0;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Order {0} already exists")]
    AlreadyExists(OrderId),

    #[error("Order {0} not found")]
    NotFound(OrderId),

    #[error("Failed to decode stored order: {0}")]
    Decode(String),

    #[error("Failed to encode order: {0}")]
    Encode(String),

    #[error("Order {id} was modified concurrently: expected revision {expected}, found {actual}")]
    Conflict {
        id: OrderId,
        expected: u64,
        actual: u64,
    },

    #[error("Store unavailable: {0}")]
    Transport(String),
}

impl IsTransient for StoreError {
    fn is_transient(&self) -> bool {
        matches!(self, StoreError::Transport(_) | StoreError::Conflict { .. })
    }
}

impl From<::redis::RedisError> for StoreError {
    fn from(err: ::redis::RedisError) -> Self {
        StoreError::Transport(err.to_string())
    }
}

impl From<tokio::time::error::Elapsed> for StoreError {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        StoreError::Transport("operation timed out".to_string())
    }
}

/// One step of a resumable scan over the order index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// Opaque cursor returned by the previous page, or [`SCAN_COMPLETE`] to start.
    pub offset: u64,
    /// Approximate number of index entries to visit.
    pub size: u64,
}

impl PageRequest {
    #[cfg(test)]
    pub fn first(size: u64) -> Self {
        Self { offset: SCAN_COMPLETE, size }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PageResult {
    pub orders: Vec<Order>,
    pub next_offset: u64,
}

impl PageResult {
    #[cfg(test)]
    pub fn is_last(&self) -> bool {
        self.next_offset == SCAN_COMPLETE
    }
}

/// Transactional order repository.
///
/// Callers only ever receive copies of stored orders. No implementation
/// retries internally; transient failures are returned as-is.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Create-if-absent. Writes the record and its index entry together.
    async fn insert(&self, order: &Order) -> Result<(), StoreError>;

    async fn find_by_id(&self, id: OrderId) -> Result<Order, StoreError>;

    /// Update-if-present, conditional on `order.revision` matching the stored
    /// revision. Returns the revision now stored.
    async fn update(&self, order: &Order) -> Result<u64, StoreError>;

    /// Removes the record and its index entry together.
    async fn delete_by_id(&self, id: OrderId) -> Result<(), StoreError>;

    /// Partial scan of the index. Order is unspecified and not stable under
    /// concurrent writes.
    async fn find_all(&self, page: PageRequest) -> Result<PageResult, StoreError>;

    /// Round-trip to the backend, used for health checks.
    async fn ping(&self) -> Result<(), StoreError>;
}

#[cfg(test)]
pub(crate) mod contract {
    //! Behaviour every `OrderRepository` backend must share.

    use super::*;
    use crate::domain::order::LineItem;
    use chrono::Utc;
    use std::collections::HashSet;
    use uuid::Uuid;

    pub fn order(id: OrderId) -> Order {
        Order::new(
            id,
            Uuid::new_v4(),
            vec![
                LineItem { item_id: Uuid::new_v4(), quantity: 2, price: 1250 },
                LineItem { item_id: Uuid::new_v4(), quantity: 1, price: 499 },
            ],
            "",
            Utc::now(),
        )
    }

    pub async fn insert_then_find<R: OrderRepository>(repo: &R) {
        let o = order(1001);
        repo.insert(&o).await.unwrap();
        assert_eq!(repo.find_by_id(1001).await.unwrap(), o);
    }

    pub async fn insert_existing_is_rejected<R: OrderRepository>(repo: &R) {
        let original = order(42);
        repo.insert(&original).await.unwrap();

        let mut dup = order(42);
        dup.order_status = "overwritten".to_string();
        let err = repo.insert(&dup).await.unwrap_err();

        assert!(matches!(err, StoreError::AlreadyExists(42)));
        assert_eq!(repo.find_by_id(42).await.unwrap(), original);
    }

    pub async fn find_missing_is_not_found<R: OrderRepository>(repo: &R) {
        let err = repo.find_by_id(7).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(7)));
    }

    pub async fn update_bumps_revision<R: OrderRepository>(repo: &R) {
        let mut o = order(5);
        repo.insert(&o).await.unwrap();

        o.order_status = "shipped".to_string();
        o.shipped_at = Some(Utc::now());
        let revision = repo.update(&o).await.unwrap();
        assert_eq!(revision, 1);

        let stored = repo.find_by_id(5).await.unwrap();
        assert_eq!(stored.revision, 1);
        assert_eq!(stored.order_status, "shipped");
        assert_eq!(stored.shipped_at, o.shipped_at);
    }

    pub async fn update_missing_is_not_found<R: OrderRepository>(repo: &R) {
        let err = repo.update(&order(9)).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(9)));
        assert!(matches!(repo.find_by_id(9).await, Err(StoreError::NotFound(9))));
    }

    pub async fn stale_update_conflicts<R: OrderRepository>(repo: &R) {
        let o = order(11);
        repo.insert(&o).await.unwrap();

        let mut first = o.clone();
        first.order_status = "shipped".to_string();
        repo.update(&first).await.unwrap();

        let mut second = o.clone();
        second.order_status = "completed".to_string();
        let err = repo.update(&second).await.unwrap_err();

        assert!(matches!(
            err,
            StoreError::Conflict { id: 11, expected: 0, actual: 1 }
        ));
        assert_eq!(repo.find_by_id(11).await.unwrap().order_status, "shipped");
    }

    pub async fn delete_removes_record_and_index<R: OrderRepository>(repo: &R) {
        repo.insert(&order(1)).await.unwrap();
        repo.insert(&order(2)).await.unwrap();

        repo.delete_by_id(1).await.unwrap();

        assert!(matches!(repo.find_by_id(1).await, Err(StoreError::NotFound(1))));
        let ids = scan_ids(repo, 10).await;
        assert_eq!(ids, HashSet::from([2]));

        let err = repo.delete_by_id(1).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(1)));
    }

    pub async fn scan_visits_every_order<R: OrderRepository>(repo: &R) {
        let expected: HashSet<OrderId> = (1..=37).collect();
        for id in &expected {
            repo.insert(&order(*id)).await.unwrap();
        }

        assert_eq!(scan_ids(repo, 5).await, expected);
    }

    pub async fn empty_scan_is_complete<R: OrderRepository>(repo: &R) {
        let page = repo.find_all(PageRequest::first(50)).await.unwrap();
        assert!(page.orders.is_empty());
        assert!(page.is_last());
    }

    async fn scan_ids<R: OrderRepository>(repo: &R, size: u64) -> HashSet<OrderId> {
        let mut seen = HashSet::new();
        let mut request = PageRequest::first(size);
        loop {
            let page = repo.find_all(request).await.unwrap();
            seen.extend(page.orders.iter().map(|o| o.order_id));
            if page.is_last() {
                return seen;
            }
            request.offset = page.next_offset;
        }
    }
}
