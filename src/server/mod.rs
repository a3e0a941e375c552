//! Axum-based local proxy for the offline agent.
//!
//! Every request outside the admin prefix becomes a fetch signal and is
//! answered from the cache, the network or the offline fallback. The admin
//! endpoints deliver the remaining lifecycle signals and expose health and
//! metrics.
//!
//! # Components
//!
//! - `handlers`: proxy translation and the admin endpoints.
//! - `middleware`: request ID tracking and body limits.
//! - `routes`: the router tying handlers and layers together.
//!
//! Author: kelexine (<https://github.com/kelexine>)

mod handlers;
mod middleware;
mod routes;

pub use handlers::SOURCE_HEADER;
pub use routes::{create_router, AppState, ADMIN_PREFIX};
