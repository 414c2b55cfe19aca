//! Model CRUD handlers: list, read, create, update, delete one, delete all.
//! Each request runs in its own session, committed on success and rolled back otherwise.

use crate::error::AppError;
use crate::model::{Pagination, PkType};
use crate::service::{CrudService, Lookup};
use crate::state::CrudState;
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    Json,
};
use serde_json::{Map, Value};
use std::collections::HashMap;

fn parse_id(id_str: &str, pk_type: PkType) -> Result<Value, AppError> {
    Ok(match pk_type {
        PkType::Uuid => {
            let u = uuid::Uuid::parse_str(id_str).map_err(|_| AppError::BadRequest("invalid uuid".into()))?;
            Value::String(u.to_string())
        }
        PkType::Integer => {
            let n: i64 = id_str.parse().map_err(|_| AppError::BadRequest("invalid id".into()))?;
            Value::Number(n.into())
        }
    })
}

fn body_to_map(body: Result<Json<Value>, JsonRejection>) -> Result<Map<String, Value>, AppError> {
    match body {
        Ok(Json(Value::Object(m))) => Ok(m),
        Ok(_) => Err(AppError::BadRequest("body must be a JSON object".into())),
        Err(rejection) => Err(AppError::BadRequest(rejection.body_text())),
    }
}

fn not_found(state: &CrudState, id: &str) -> AppError {
    AppError::NotFound(format!("{} {}", state.model.name, id))
}

pub async fn list(
    State(state): State<CrudState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Vec<Value>>, AppError> {
    let page = Pagination::from_query(&params)?;
    let filter = state.search.parse_query(&params)?;
    let mut session = state.db.acquire().await?;
    let result = CrudService::find_many(&state.model, &mut session, &filter, page.skip, page.limit).await;
    let rows = session.finish(result).await?;
    tracing::debug!(model = %state.label, count = rows.len(), "list");
    Ok(Json(rows))
}

pub async fn read(State(state): State<CrudState>, Path(id_str): Path<String>) -> Result<Json<Value>, AppError> {
    let id = parse_id(&id_str, state.model.pk_type())?;
    let mut session = state.db.acquire().await?;
    let result = CrudService::find_one(&state.model, &mut session, Lookup::ById(&id)).await;
    session
        .finish(result)
        .await?
        .map(Json)
        .ok_or_else(|| not_found(&state, &id_str))
}

pub async fn create(
    State(state): State<CrudState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let body = body_to_map(body)?;
    let mut session = state.db.acquire().await?;
    let result = CrudService::create(&state.model, &mut session, &body).await;
    let row = session.finish(result).await?;
    let id = &row[state.model.pk_name()];
    tracing::info!(model = %state.label, id = %id, "created");
    Ok(Json(row))
}

pub async fn update(
    State(state): State<CrudState>,
    Path(id_str): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let id = parse_id(&id_str, state.model.pk_type())?;
    let body = body_to_map(body)?;
    let mut session = state.db.acquire().await?;
    let result = CrudService::update(&state.model, &mut session, &id, &body).await;
    let row = session.finish(result).await?.ok_or_else(|| not_found(&state, &id_str))?;
    tracing::info!(model = %state.label, id = %id_str, "updated");
    Ok(Json(row))
}

pub async fn delete_one(State(state): State<CrudState>, Path(id_str): Path<String>) -> Result<Json<Value>, AppError> {
    let id = parse_id(&id_str, state.model.pk_type())?;
    let mut session = state.db.acquire().await?;
    let result = CrudService::delete_one(&state.model, &mut session, &id).await;
    let row = session.finish(result).await?.ok_or_else(|| not_found(&state, &id_str))?;
    tracing::info!(model = %state.label, id = %id_str, "deleted");
    Ok(Json(row))
}

pub async fn delete_all(
    State(state): State<CrudState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Vec<Value>>, AppError> {
    let filter = state.search.parse_query(&params)?;
    let mut session = state.db.acquire().await?;
    let result = CrudService::delete_all(&state.model, &mut session, &filter).await;
    let remaining = session.finish(result).await?;
    tracing::info!(model = %state.label, filtered = !filter.is_empty(), remaining = remaining.len(), "deleted all");
    Ok(Json(remaining))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn ids_parse_by_pk_type() {
        assert_eq!(parse_id("7", PkType::Integer).unwrap(), json!(7));
        assert!(matches!(parse_id("seven", PkType::Integer), Err(AppError::BadRequest(_))));
        let u = uuid::Uuid::new_v4().to_string();
        assert_eq!(parse_id(&u, PkType::Uuid).unwrap(), json!(u));
        assert!(parse_id("7", PkType::Uuid).is_err());
    }
}
