//! REST API implementation
//!
//! - types: request/response payloads and shared state
//! - extractors: JSON extractor with uniform error bodies
//! - handlers: endpoint handlers
//! - router: router assembly

mod extractors;
mod handlers;
mod router;
mod tests;
pub mod types;

// Re-export public API
pub use extractors::JsonExtractor;
pub use router::create_router;
pub use types::{
    AppState, HealthResponse, SimulationStartPayload, TransactionListQuery,
    TransactionListResponse,
};
