use chrono::{DateTime, Utc};

use super::errors::OrderError;
use super::value_objects::Order;

// ============================================================================
// Order Lifecycle - Status State Machine
// ============================================================================
//
//   unshipped ──shipped──▶ shipped ──completed──▶ completed (terminal)
//       │                     │
//       └──shipped (again)────┘   re-stamps shipped_at while not completed
//
// Transitions only mutate the in-memory order. Persisting the result is the
// caller's job (conditional update on the order's revision).
//
// ============================================================================

pub const SHIPPED: &str = "shipped";
pub const COMPLETED: &str = "completed";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Ship,
    Complete,
}

impl Transition {
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            SHIPPED => Some(Transition::Ship),
            COMPLETED => Some(Transition::Complete),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Transition::Ship => SHIPPED,
            Transition::Complete => COMPLETED,
        }
    }

    /// Check the guard for this transition against the order's current state.
    pub fn permitted_from(&self, order: &Order) -> bool {
        match self {
            Transition::Ship => !order.status().is_terminal(),
            Transition::Complete => order.shipped_at.is_some() && order.completed_at.is_none(),
        }
    }
}

/// Apply the transition named by `requested` to `order`, stamping `now`.
///
/// Unknown labels and failed guards both surface as
/// [`OrderError::InvalidTransition`]; the order is left untouched on error.
pub fn apply_transition(
    order: &mut Order,
    requested: &str,
    now: DateTime<Utc>,
) -> Result<Transition, OrderError> {
    let status = order.status();
    let invalid = || OrderError::InvalidTransition {
        requested: requested.to_string(),
        status,
    };

    let transition = Transition::from_label(requested).ok_or_else(invalid)?;
    if !transition.permitted_from(order) {
        return Err(invalid());
    }

    match transition {
        Transition::Ship => order.shipped_at = Some(now),
        Transition::Complete => order.completed_at = Some(now),
    }
    order.order_status = transition.label().to_string();

    tracing::debug!(
        order_id = order.order_id,
        from = %status,
        to = %order.status(),
        "Applied lifecycle transition"
    );

    Ok(transition)
}

// ============================================================================
// Unit Tests
// ============================================================================
