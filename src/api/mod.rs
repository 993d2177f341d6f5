//! API layer - HTTP endpoints and middleware

pub mod ask;
pub mod health;
pub mod middleware;
pub mod router;
pub mod state;
pub mod types;

pub use router::{create_router, RouterOptions};
pub use state::{AppState, SemanticCacheServiceTrait};
