// ============================================================================
// Domain Layer - Business Logic
// ============================================================================
//
// Each aggregate has its own subdirectory with:
// - Value objects
// - Commands
// - Errors
// - Lifecycle rules
// - Command handler
//
// This layer knows nothing about Redis or HTTP; storage is injected through
// crate::store::OrderRepository.
//
// ============================================================================

pub mod order;
