//! Router factory: one model descriptor in, six bound CRUD routes out.

use crate::db::Database;
use crate::handlers::crud::{create, delete_all, delete_one, list, read, update};
use crate::model::ModelDescriptor;
use crate::state::CrudState;
use axum::{routing::get, Router};
use std::sync::Arc;

/// Routes for `model` under `prefix` (e.g. `/ingredient`):
/// `GET|POST|DELETE {prefix}` and `GET|PUT|DELETE {prefix}/:id`.
pub fn crud_routes(model: Arc<ModelDescriptor>, db: Database, prefix: &str, label: &str) -> Router {
    let prefix = format!("/{}", prefix.trim_matches('/'));
    tracing::debug!(model = %model.name, prefix = %prefix, "mounting crud routes");
    let state = CrudState::new(db, model, label);
    Router::new()
        .route(&prefix, get(list).post(create).delete(delete_all))
        .route(&format!("{}/:id", prefix), get(read).put(update).delete(delete_one))
        .with_state(state)
}
