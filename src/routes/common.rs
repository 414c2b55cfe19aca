//! Common routes: health.

use crate::db::Database;
use crate::handlers::health;
use axum::{routing::get, Router};

/// GET /health, backed by a `SELECT 1` through the pool.
pub fn common_routes(db: Database) -> Router {
    Router::new().route("/health", get(health)).with_state(db)
}
