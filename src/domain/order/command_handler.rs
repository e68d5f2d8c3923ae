use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;

use crate::metrics::Metrics;
use crate::store::{OrderRepository, PageRequest, PageResult, StoreError};
use crate::utils::{retry_on_transient, IsTransient, RetryConfig};

use super::commands::{CreateOrder, UpdateStatus};
use super::errors::OrderError;
use super::id::{IdGenerator, RandomIdGenerator};
use super::lifecycle::apply_transition;
use super::value_objects::{Order, OrderId};

/// Default number of index entries visited per listing page.
pub const DEFAULT_PAGE_SIZE: u64 = 50;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Order(#[from] OrderError),
}

impl ServiceError {
    /// Short label used for metrics and logs.
    pub fn outcome(&self) -> &'static str {
        match self {
            ServiceError::Store(StoreError::AlreadyExists(_)) => "already_exists",
            ServiceError::Store(StoreError::NotFound(_)) => "not_found",
            ServiceError::Store(StoreError::Decode(_)) => "decode_error",
            ServiceError::Store(StoreError::Encode(_)) => "encode_error",
            ServiceError::Store(StoreError::Conflict { .. }) => "conflict",
            ServiceError::Store(StoreError::Transport(_)) => "transport_error",
            ServiceError::Order(OrderError::InvalidTransition { .. }) => "invalid_transition",
        }
    }
}

// A transport failure is transient for the store but is not replayed here:
// a timed-out write may already have landed, so the client decides.
impl IsTransient for ServiceError {
    fn is_transient(&self) -> bool {
        match self {
            ServiceError::Store(StoreError::Transport(_)) => false,
            ServiceError::Store(err) => err.is_transient(),
            ServiceError::Order(_) => false,
        }
    }
}

// ============================================================================
// Order Command Handler
// ============================================================================
//
// Orchestrates: Command → Lifecycle → OrderRepository
//
// ============================================================================

pub struct OrderCommandHandler {
    repository: Arc<dyn OrderRepository>,
    ids: Arc<dyn IdGenerator>,
    metrics: Arc<Metrics>,
    retry: RetryConfig,
    page_size: u64,
}

impl OrderCommandHandler {
    pub fn new(repository: Arc<dyn OrderRepository>, metrics: Arc<Metrics>) -> Self {
        Self {
            repository,
            ids: Arc::new(RandomIdGenerator),
            metrics,
            retry: RetryConfig::default(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    #[cfg(test)]
    pub fn with_id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_page_size(mut self, page_size: u64) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Place a new order with a fresh id and `created_at = now`.
    pub async fn create(&self, command: CreateOrder) -> Result<Order, ServiceError> {
        let started = Instant::now();
        let order = Order::new(
            self.ids.next_id(),
            command.customer_id,
            command.line_items,
            command.order_status,
            Utc::now(),
        );

        let result = self.repository.insert(&order).await.map(|_| order);
        if let Err(StoreError::AlreadyExists(id)) = &result {
            tracing::error!(order_id = *id, "Order id collision on insert");
        }

        self.finish("create", started, result.map_err(ServiceError::from))
    }

    pub async fn get(&self, id: OrderId) -> Result<Order, ServiceError> {
        let started = Instant::now();
        let result = self.repository.find_by_id(id).await;
        self.finish("get", started, result.map_err(ServiceError::from))
    }

    /// One page of the order listing. Pass [`crate::store::SCAN_COMPLETE`] to start.
    pub async fn list(&self, cursor: u64) -> Result<PageResult, ServiceError> {
        let started = Instant::now();
        let result = self
            .repository
            .find_all(PageRequest { offset: cursor, size: self.page_size })
            .await;
        self.finish("list", started, result.map_err(ServiceError::from))
    }

    /// Read, transition and conditionally write back. A lost revision race
    /// re-reads and re-applies the transition, up to the retry budget.
    pub async fn update_status(
        &self,
        id: OrderId,
        command: UpdateStatus,
    ) -> Result<Order, ServiceError> {
        let started = Instant::now();
        let status = command.status.as_str();

        let result = retry_on_transient(self.retry.clone(), |attempt| {
            self.try_transition(id, status, attempt)
        })
        .await
        .into_result();

        self.finish("update_status", started, result)
    }

    pub async fn delete(&self, id: OrderId) -> Result<(), ServiceError> {
        let started = Instant::now();
        let result = self.repository.delete_by_id(id).await;
        self.finish("delete", started, result.map_err(ServiceError::from))
    }

    pub async fn ping(&self) -> Result<(), ServiceError> {
        let result = self.repository.ping().await;
        self.metrics.set_store_up(result.is_ok());
        result.map_err(ServiceError::from)
    }

    async fn try_transition(
        &self,
        id: OrderId,
        status: &str,
        attempt: u32,
    ) -> Result<Order, ServiceError> {
        let mut order = self.repository.find_by_id(id).await?;
        let transition = apply_transition(&mut order, status, Utc::now())?;

        match self.repository.update(&order).await {
            Ok(revision) => {
                order.revision = revision;
                self.metrics.record_transition(transition.label());
                tracing::info!(
                    order_id = id,
                    transition = transition.label(),
                    revision,
                    attempt,
                    "Order status updated"
                );
                Ok(order)
            }
            Err(err @ StoreError::Conflict { .. }) => {
                self.metrics.record_conflict();
                Err(err.into())
            }
            Err(err) => Err(err.into()),
        }
    }

    fn finish<T>(
        &self,
        operation: &str,
        started: Instant,
        result: Result<T, ServiceError>,
    ) -> Result<T, ServiceError> {
        let outcome = match &result {
            Ok(_) => "ok",
            Err(err) => err.outcome(),
        };
        self.metrics
            .record_operation(operation, outcome, started.elapsed().as_secs_f64());
        result
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
