// ============================================================================
// Order Domain - Business Logic for Orders
// ============================================================================
//
// This module contains ALL Order-specific code:
// - Value objects (Order, LineItem, OrderStatus)
// - Commands (CreateOrder, UpdateStatus)
// - Errors (OrderError enum)
// - Lifecycle state machine (shipped / completed transitions)
// - Identifier generation
// - Command Handler (OrderCommandHandler)
//
// Persistence lives in crate::store and is reached only through the
// OrderRepository trait.
//
// ============================================================================

pub mod value_objects;
pub mod commands;
pub mod errors;
pub mod id;
pub mod lifecycle;
pub mod command_handler;

// Re-export for convenience
pub use value_objects::*;
pub use commands::*;
pub use errors::*;
pub use command_handler::*;
