//! Generic CRUD execution against SQLite, scoped to one session and one model's table.

use crate::db::Session;
use crate::error::AppError;
use crate::model::{FieldType, ModelDescriptor, PkType, SearchFilter};
use crate::service::RequestValidator;
use crate::sql::{delete_by_id, delete_where, insert, select_by_id, select_list, update, BindValue, QueryBuf};
use serde_json::{Map, Value};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};

/// How `find_one` locates its record.
#[derive(Clone, Copy, Debug)]
pub enum Lookup<'a> {
    ById(&'a Value),
    /// First match in primary-key order. Must carry at least one condition.
    ByFilter(&'a SearchFilter),
}

pub struct CrudService;

impl CrudService {
    /// Fetch one record. `None` when nothing matches.
    pub async fn find_one(
        model: &ModelDescriptor,
        session: &mut Session,
        lookup: Lookup<'_>,
    ) -> Result<Option<Value>, AppError> {
        let q = match lookup {
            Lookup::ById(id) => select_by_id(model, id),
            Lookup::ByFilter(filter) if filter.is_empty() => {
                return Err(AppError::BadRequest("find_one needs an id or at least one filter".into()));
            }
            Lookup::ByFilter(filter) => select_list(model, filter, 0, Some(1)),
        };
        query_optional(session.conn(), model, &q).await
    }

    /// Records matching `filter` in ascending primary-key order, offset by `skip`, capped by `limit`.
    pub async fn find_many(
        model: &ModelDescriptor,
        session: &mut Session,
        filter: &SearchFilter,
        skip: u64,
        limit: Option<u64>,
    ) -> Result<Vec<Value>, AppError> {
        let q = select_list(model, filter, skip, limit);
        query_many(session.conn(), model, &q).await
    }

    /// Validate and insert one record; returns the stored row including its assigned key.
    pub async fn create(
        model: &ModelDescriptor,
        session: &mut Session,
        body: &Map<String, Value>,
    ) -> Result<Value, AppError> {
        let values = RequestValidator::for_create(model, body)?;
        let pk_value = match model.pk_type() {
            PkType::Integer => None,
            PkType::Uuid => Some(Value::String(uuid::Uuid::new_v4().to_string())),
        };
        let q = insert(model, &values, pk_value.as_ref());
        query_optional(session.conn(), model, &q)
            .await?
            .ok_or_else(|| AppError::Db(sqlx::Error::RowNotFound))
    }

    /// Apply the fields present in `body` to record `id`. `None` when the id does not exist.
    pub async fn update(
        model: &ModelDescriptor,
        session: &mut Session,
        id: &Value,
        body: &Map<String, Value>,
    ) -> Result<Option<Value>, AppError> {
        let values = RequestValidator::for_update(model, body)?;
        // The write is the session's first statement, so SQLite takes the write lock up front.
        let q = update(model, id, &values);
        query_optional(session.conn(), model, &q).await
    }

    /// Delete record `id`, returning it as it was. `None` when the id does not exist.
    pub async fn delete_one(
        model: &ModelDescriptor,
        session: &mut Session,
        id: &Value,
    ) -> Result<Option<Value>, AppError> {
        let q = delete_by_id(model, id);
        query_optional(session.conn(), model, &q).await
    }

    /// Delete every record matching `filter` (all of them when empty); returns what is left in the table.
    pub async fn delete_all(
        model: &ModelDescriptor,
        session: &mut Session,
        filter: &SearchFilter,
    ) -> Result<Vec<Value>, AppError> {
        let q = delete_where(model, filter);
        let affected = execute(session.conn(), &q).await?;
        tracing::debug!(model = %model.name, affected, "deleted rows");
        Self::find_many(model, session, &SearchFilter::default(), 0, None).await
    }
}

fn bind_all<'q>(
    sql: &'q str,
    params: &[Value],
) -> sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>> {
    let mut query = sqlx::query(sql);
    for p in params {
        query = query.bind(BindValue::from_json(p));
    }
    query
}

async fn query_many(conn: &mut SqliteConnection, model: &ModelDescriptor, q: &QueryBuf) -> Result<Vec<Value>, AppError> {
    tracing::debug!(sql = %q.sql, params = ?q.params, "query");
    let rows = bind_all(&q.sql, &q.params).fetch_all(&mut *conn).await?;
    rows.iter().map(|r| row_to_json(model, r)).collect()
}

async fn query_optional(
    conn: &mut SqliteConnection,
    model: &ModelDescriptor,
    q: &QueryBuf,
) -> Result<Option<Value>, AppError> {
    tracing::debug!(sql = %q.sql, params = ?q.params, "query");
    let row = bind_all(&q.sql, &q.params).fetch_optional(&mut *conn).await?;
    row.map(|r| row_to_json(model, &r)).transpose()
}

async fn execute(conn: &mut SqliteConnection, q: &QueryBuf) -> Result<u64, AppError> {
    tracing::debug!(sql = %q.sql, params = ?q.params, "execute");
    let done = bind_all(&q.sql, &q.params).execute(&mut *conn).await?;
    Ok(done.rows_affected())
}

/// Decode a row using the descriptor's column types.
fn row_to_json(model: &ModelDescriptor, row: &SqliteRow) -> Result<Value, AppError> {
    let mut map = Map::new();
    let pk = model.pk_name();
    let pk_value = match model.pk_type() {
        PkType::Integer => Value::Number(row.try_get::<i64, _>(pk)?.into()),
        PkType::Uuid => Value::String(row.try_get::<String, _>(pk)?),
    };
    map.insert(pk.to_string(), pk_value);
    for f in model.non_key_fields() {
        let name = f.name.as_str();
        let v = match f.field_type {
            FieldType::Integer => row.try_get::<Option<i64>, _>(name)?.map(|n| Value::Number(n.into())),
            FieldType::Float | FieldType::Duration => row
                .try_get::<Option<f64>, _>(name)?
                .and_then(serde_json::Number::from_f64)
                .map(Value::Number),
            FieldType::Boolean => row.try_get::<Option<bool>, _>(name)?.map(Value::Bool),
            FieldType::Text | FieldType::DateTime | FieldType::IpAddress => {
                row.try_get::<Option<String>, _>(name)?.map(Value::String)
            }
        };
        map.insert(f.name.clone(), v.unwrap_or(Value::Null));
    }
    Ok(Value::Object(map))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::migration::ensure_tables;
    use crate::model::{Catalog, FieldDescriptor};
    use serde_json::json;
    use std::sync::Arc;

    fn garden() -> Catalog {
        Catalog::new().category(
            "garden",
            vec![
                ModelDescriptor::new("Plant")
                    .field(FieldDescriptor::new("name", FieldType::Text))
                    .field(FieldDescriptor::new("bed", FieldType::Integer))
                    .field(FieldDescriptor::new("watered", FieldType::Boolean).default_value(false))
                    .field(FieldDescriptor::new("height", FieldType::Float).nullable()),
                ModelDescriptor::new("Seed")
                    .primary_key("id", PkType::Uuid)
                    .field(FieldDescriptor::new("name", FieldType::Text).unique()),
            ],
        )
    }

    async fn setup() -> (Database, Arc<ModelDescriptor>, Arc<ModelDescriptor>) {
        let db = Database::connect_in_memory().await.unwrap();
        let catalog = garden();
        ensure_tables(&db, &catalog).await.unwrap();
        let plant = catalog.categories[0].models[0].clone();
        let seed = catalog.categories[0].models[1].clone();
        (db, plant, seed)
    }

    async fn seed_plants(db: &Database, plant: &ModelDescriptor) -> Vec<Value> {
        let mut s = db.acquire().await.unwrap();
        let mut out = Vec::new();
        for (i, name) in ["fern", "basil", "mint", "sage", "thyme"].iter().enumerate() {
            let body = json!({ "name": name, "bed": (i % 2) as i64, "watered": i == 2 });
            out.push(CrudService::create(plant, &mut s, body.as_object().unwrap()).await.unwrap());
        }
        s.commit().await.unwrap();
        out
    }

    #[tokio::test]
    async fn find_many_orders_by_pk_and_paginates() {
        let (db, plant, _) = setup().await;
        let created = seed_plants(&db, &plant).await;
        let mut s = db.acquire().await.unwrap();

        let all = CrudService::find_many(&plant, &mut s, &SearchFilter::default(), 0, None).await.unwrap();
        assert_eq!(all, created);

        let page = CrudService::find_many(&plant, &mut s, &SearchFilter::default(), 1, Some(2)).await.unwrap();
        assert_eq!(page, created[1..3].to_vec());

        let tail = CrudService::find_many(&plant, &mut s, &SearchFilter::default(), 3, Some(10)).await.unwrap();
        assert_eq!(tail.len(), 2);

        let past_end = CrudService::find_many(&plant, &mut s, &SearchFilter::default(), 9, None).await.unwrap();
        assert!(past_end.is_empty());
    }

    #[tokio::test]
    async fn filters_are_conjunctive() {
        let (db, plant, _) = setup().await;
        seed_plants(&db, &plant).await;
        let mut s = db.acquire().await.unwrap();

        let bed0 = SearchFilter::default().with("bed", 0);
        let rows = CrudService::find_many(&plant, &mut s, &bed0, 0, None).await.unwrap();
        let names: Vec<_> = rows.iter().map(|r| r["name"].clone()).collect();
        assert_eq!(names, vec![json!("fern"), json!("mint"), json!("thyme")]);

        let both = SearchFilter::default().with("bed", 0).with("watered", true);
        let rows = CrudService::find_many(&plant, &mut s, &both, 0, None).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["name"], json!("mint"));
    }

    #[tokio::test]
    async fn find_one_by_filter_and_missing() {
        let (db, plant, _) = setup().await;
        seed_plants(&db, &plant).await;
        let mut s = db.acquire().await.unwrap();

        let sage = SearchFilter::default().with("name", "sage");
        let row = CrudService::find_one(&plant, &mut s, Lookup::ByFilter(&sage)).await.unwrap().unwrap();
        assert_eq!(row["id"], json!(4));

        let none = SearchFilter::default().with("name", "rose");
        assert!(CrudService::find_one(&plant, &mut s, Lookup::ByFilter(&none)).await.unwrap().is_none());
        assert!(CrudService::find_one(&plant, &mut s, Lookup::ById(&json!(99))).await.unwrap().is_none());

        let empty = SearchFilter::default();
        let err = CrudService::find_one(&plant, &mut s, Lookup::ByFilter(&empty)).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn create_applies_defaults_and_decodes_types() {
        let (db, plant, _) = setup().await;
        let mut s = db.acquire().await.unwrap();
        let row = CrudService::create(&plant, &mut s, json!({ "name": "fern", "bed": 2 }).as_object().unwrap())
            .await
            .unwrap();
        assert_eq!(row, json!({ "id": 1, "name": "fern", "bed": 2, "watered": false, "height": null }));
    }

    #[tokio::test]
    async fn update_is_partial() {
        let (db, plant, _) = setup().await;
        let created = seed_plants(&db, &plant).await;
        let mut s = db.acquire().await.unwrap();
        let updated = CrudService::update(&plant, &mut s, &json!(2), json!({ "height": 1.5 }).as_object().unwrap())
            .await
            .unwrap()
            .unwrap();
        let mut expected = created[1].clone();
        expected["height"] = json!(1.5);
        assert_eq!(updated, expected);

        let missing = CrudService::update(&plant, &mut s, &json!(42), json!({ "bed": 1 }).as_object().unwrap())
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn delete_one_returns_row_once() {
        let (db, plant, _) = setup().await;
        let created = seed_plants(&db, &plant).await;
        let mut s = db.acquire().await.unwrap();
        let gone = CrudService::delete_one(&plant, &mut s, &json!(1)).await.unwrap();
        assert_eq!(gone, Some(created[0].clone()));
        assert!(CrudService::delete_one(&plant, &mut s, &json!(1)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_validates_body_before_touching_the_table() {
        let (db, plant, _) = setup().await;
        let mut s = db.acquire().await.unwrap();
        let err = CrudService::update(&plant, &mut s, &json!(42), json!({ "bed": "north" }).as_object().unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn delete_all_with_filter_returns_remaining_table() {
        let (db, plant, _) = setup().await;
        seed_plants(&db, &plant).await;
        let mut s = db.acquire().await.unwrap();
        let left = CrudService::delete_all(&plant, &mut s, &SearchFilter::default().with("bed", 1)).await.unwrap();
        assert_eq!(left.len(), 3);
        assert!(left.iter().all(|r| r["bed"] == json!(0)));

        let left = CrudService::delete_all(&plant, &mut s, &SearchFilter::default()).await.unwrap();
        assert!(left.is_empty());
        let again = CrudService::delete_all(&plant, &mut s, &SearchFilter::default()).await.unwrap();
        assert!(again.is_empty());
    }

    #[tokio::test]
    async fn uuid_keys_and_unique_violation() {
        let (db, _, seed) = setup().await;
        let mut s = db.acquire().await.unwrap();
        let row = CrudService::create(&seed, &mut s, json!({ "name": "tomato" }).as_object().unwrap())
            .await
            .unwrap();
        let id = row["id"].as_str().unwrap();
        assert!(uuid::Uuid::parse_str(id).is_ok());

        let err = CrudService::create(&seed, &mut s, json!({ "name": "tomato" }).as_object().unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Integrity(_)));
    }
}
