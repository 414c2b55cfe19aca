//! Create tables for a catalog if they do not exist yet: CREATE TABLE, then CREATE INDEX.
//! Referenced tables are created before the tables that point at them.

use crate::db::Database;
use crate::error::AppError;
use crate::model::{Catalog, ModelDescriptor, PkType};
use crate::sql::quoted;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;

/// SQL literal for a JSON default or allowed value.
fn literal(v: &Value) -> String {
    match v {
        Value::Null => "NULL".into(),
        Value::Bool(b) => (if *b { "1" } else { "0" }).to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => format!("'{}'", s.replace('\'', "''")),
        other => format!("'{}'", other.to_string().replace('\'', "''")),
    }
}

/// CREATE TABLE statement for one model.
pub fn create_table_sql(model: &ModelDescriptor) -> String {
    let pk = quoted(model.pk_name());
    let mut col_defs = vec![match model.pk_type() {
        PkType::Integer => format!("{} INTEGER PRIMARY KEY AUTOINCREMENT", pk),
        PkType::Uuid => format!("{} TEXT PRIMARY KEY NOT NULL", pk),
    }];

    for f in model.non_key_fields() {
        let name = quoted(&f.name);
        let mut def = format!("{} {}", name, f.field_type.sql_type());
        if !f.nullable {
            def.push_str(" NOT NULL");
        }
        if f.unique {
            def.push_str(" UNIQUE");
        }
        if let Some(ref d) = f.default {
            def.push_str(" DEFAULT ");
            def.push_str(&literal(d));
        }
        if let Some(ref allowed) = f.rules.allowed {
            let values: Vec<String> = allowed.iter().map(literal).collect();
            def.push_str(&format!(" CHECK ({} IN ({}))", name, values.join(", ")));
        }
        col_defs.push(def);
    }

    // Foreign keys target the referenced table's primary key; SQLite resolves them lazily.
    for f in model.non_key_fields() {
        if let Some(ref target) = f.references {
            col_defs.push(format!("FOREIGN KEY ({}) REFERENCES {}", quoted(&f.name), quoted(target)));
        }
    }

    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n  {}\n)",
        quoted(&model.table_name()),
        col_defs.join(",\n  ")
    )
}

pub fn create_index_sql(model: &ModelDescriptor) -> Vec<String> {
    let table = model.table_name();
    model
        .non_key_fields()
        .filter(|f| f.index)
        .map(|f| {
            format!(
                "CREATE INDEX IF NOT EXISTS {} ON {} ({})",
                quoted(&format!("ix_{}_{}", table, f.name)),
                quoted(&table),
                quoted(&f.name)
            )
        })
        .collect()
}

/// Models ordered so that every referenced table comes before its referrers.
/// Cycles are broken by falling back to catalog order.
fn creation_order(catalog: &Catalog) -> Vec<Arc<ModelDescriptor>> {
    let mut pending: Vec<Arc<ModelDescriptor>> = catalog.models().cloned().collect();
    let mut created: HashSet<String> = HashSet::new();
    let mut ordered = Vec::with_capacity(pending.len());
    while !pending.is_empty() {
        let ready = pending.iter().position(|m| {
            m.non_key_fields()
                .filter_map(|f| f.references.as_deref())
                .all(|t| t == m.table_name() || created.contains(t))
        });
        let m = pending.remove(ready.unwrap_or(0));
        created.insert(m.table_name());
        ordered.push(m);
    }
    ordered
}

/// Create every catalog table and index that is missing. Existing tables are left untouched.
pub async fn ensure_tables(db: &Database, catalog: &Catalog) -> Result<(), AppError> {
    catalog.validate()?;
    let mut tx = db.pool().begin().await?;
    for model in creation_order(catalog) {
        let sql = create_table_sql(&model);
        tracing::debug!(sql = %sql, "create table");
        sqlx::query(&sql).execute(&mut *tx).await?;
        for sql in create_index_sql(&model) {
            sqlx::query(&sql).execute(&mut *tx).await?;
        }
    }
    tx.commit().await?;
    tracing::info!(tables = catalog.models().count(), "tables ensured");
    Ok(())
}
