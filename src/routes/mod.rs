//! Route assembly: per-model CRUD routers grouped by category, plus common routes and HTTP layers.

mod common;
mod crud;

pub use common::common_routes;
pub use crud::crud_routes;

use crate::db::Database;
use crate::model::Catalog;
use crate::settings::Settings;
use axum::{extract::Request, Router};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

/// `/{category}/{model}` for every model in the catalog.
pub fn build_top_router(catalog: &Catalog, db: &Database) -> Router {
    catalog.categories.iter().fold(Router::new(), |top, category| {
        let sub = category.models.iter().fold(Router::new(), |sub, model| {
            sub.merge(crud_routes(model.clone(), db.clone(), &model.path(), &model.name))
        });
        top.nest(&format!("/{}", category.name), sub)
    })
}

/// Full application: model routes (under `API_PREFIX` if set), health, request ids, tracing, body limit.
pub fn app(catalog: &Catalog, db: Database, settings: &Settings) -> Router {
    let models = build_top_router(catalog, &db);
    let models = match settings.api_prefix.as_deref() {
        Some(prefix) => Router::new().nest(prefix, models),
        None => models,
    };
    Router::new()
        .merge(models)
        .merge(common_routes(db))
        .layer(RequestBodyLimitLayer::new(settings.body_limit_bytes))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http().make_span_with(|req: &Request| {
            let request_id = req
                .headers()
                .get("x-request-id")
                .and_then(|v| v.to_str().ok())
                .unwrap_or("-");
            tracing::info_span!("request", method = %req.method(), uri = %req.uri(), request_id = %request_id)
        }))
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}
