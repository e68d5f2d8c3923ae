use serde::Deserialize;
use uuid::Uuid;

use super::value_objects::LineItem;

// ============================================================================
// Order Commands - Represent user intent
// ============================================================================

/// Request to place a new order. The id and creation time are assigned by
/// the command handler.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateOrder {
    pub customer_id: Uuid,
    pub line_items: Vec<LineItem>,
    #[serde(default)]
    pub order_status: String,
}

/// Request to move an order along its lifecycle (`"shipped"` or `"completed"`).
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateStatus {
    pub status: String,
}
