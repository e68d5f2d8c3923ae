use crate::domain::order::Order;

use super::StoreError;

// ============================================================================
// Record Codec - Order <-> stored bytes (JSON)
// ============================================================================

pub fn encode(order: &Order) -> Result<Vec<u8>, StoreError> {
    serde_json::to_vec(order).map_err(|e| StoreError::Encode(e.to_string()))
}

pub fn decode(bytes: &[u8]) -> Result<Order, StoreError> {
    serde_json::from_slice(bytes).map_err(|e| StoreError::Decode(e.to_string()))
}
