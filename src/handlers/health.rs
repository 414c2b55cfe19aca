//! Liveness: a trivial query through the connection provider.

use crate::db::Database;
use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

#[derive(Serialize)]
pub struct HealthBody {
    status: &'static str,
}

pub async fn health(State(db): State<Database>) -> (StatusCode, Json<HealthBody>) {
    match db.ping().await {
        Ok(()) => (StatusCode::OK, Json(HealthBody { status: "ok" })),
        Err(e) => {
            tracing::error!(error = %e, "health check failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(HealthBody { status: "unavailable" }),
            )
        }
    }
}
