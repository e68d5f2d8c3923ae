use super::value_objects::OrderStatus;

// ============================================================================
// Order Business Rule Errors
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OrderError {
    #[error("Cannot move order from {status} to '{requested}'")]
    InvalidTransition {
        requested: String,
        status: OrderStatus,
    },
}
