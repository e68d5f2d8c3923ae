// ============================================================================
// HTTP API
// ============================================================================
//
// Thin actix-web layer: decode the request, call OrderCommandHandler, map
// errors to status codes. No business rules live here.
//
// ============================================================================

mod errors;
mod orders;
mod server;

pub use server::run;
