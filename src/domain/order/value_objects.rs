use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Order Value Objects
// ============================================================================

/// Order identifier, drawn from the full 64-bit space.
pub type OrderId = u64;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct LineItem {
    pub item_id: Uuid,
    pub quantity: u32,
    pub price: u64,
}

/// A stored order record.
///
/// `revision` is the optimistic concurrency token: inserts start at 0 and
/// every successful update bumps it by one.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Order {
    pub order_id: OrderId,
    pub customer_id: Uuid,
    pub line_items: Vec<LineItem>,
    pub order_status: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipped_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub revision: u64,
}

impl Order {
    pub fn new(
        order_id: OrderId,
        customer_id: Uuid,
        line_items: Vec<LineItem>,
        order_status: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            order_id,
            customer_id,
            line_items,
            order_status: order_status.into(),
            created_at,
            shipped_at: None,
            completed_at: None,
            revision: 0,
        }
    }

    /// Lifecycle position derived from the stamped timestamps.
    pub fn status(&self) -> OrderStatus {
        if self.completed_at.is_some() {
            OrderStatus::Completed
        } else if self.shipped_at.is_some() {
            OrderStatus::Shipped
        } else {
            OrderStatus::Unshipped
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Unshipped,
    Shipped,
    Completed,
}

impl OrderStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatus::Unshipped => write!(f, "unshipped"),
            OrderStatus::Shipped => write!(f, "shipped"),
            OrderStatus::Completed => write!(f, "completed"),
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
