//! Builds parameterized SELECT, INSERT, UPDATE, DELETE from a model descriptor.

use crate::model::{ModelDescriptor, SearchFilter};
use serde_json::Value;

/// Quote identifier for SQLite (safe: names are validated when the catalog loads).
pub fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<Value>,
}

impl QueryBuf {
    fn new() -> Self {
        Self::default()
    }

    fn push_param(&mut self, v: Value) {
        self.params.push(v);
    }
}

/// WHERE-clause body (without the keyword) plus its params. Empty `sql` matches every row.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Predicate {
    pub sql: String,
    pub params: Vec<Value>,
}

impl Predicate {
    fn where_clause(&self) -> String {
        if self.sql.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.sql)
        }
    }
}

/// Primary key first, then fields in declaration order.
pub fn select_column_list(model: &ModelDescriptor) -> String {
    std::iter::once(model.pk_name())
        .chain(model.non_key_fields().map(|f| f.name.as_str()))
        .map(quoted)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Equality condition per present filter field, joined with AND. Fields unknown to the model,
/// and the primary key, are skipped. A JSON null matches NULL columns; only filters built in code
/// (`SearchFilter::with`) carry nulls, query strings never do.
pub fn build_filter_predicate(model: &ModelDescriptor, filter: &SearchFilter) -> Predicate {
    let mut p = Predicate::default();
    let mut parts = Vec::new();
    for (col, val) in &filter.conditions {
        if model.field_by_name(col).is_none() || col == model.pk_name() {
            continue;
        }
        if val.is_null() {
            parts.push(format!("{} IS NULL", quoted(col)));
        } else {
            parts.push(format!("{} = ?", quoted(col)));
            p.params.push(val.clone());
        }
    }
    p.sql = parts.join(" AND ");
    p
}

/// SELECT by primary key.
pub fn select_by_id(model: &ModelDescriptor, id: &Value) -> QueryBuf {
    let mut q = QueryBuf::new();
    q.push_param(id.clone());
    q.sql = format!(
        "SELECT {} FROM {} WHERE {} = ?",
        select_column_list(model),
        quoted(&model.table_name()),
        quoted(model.pk_name())
    );
    q
}

/// SELECT with filter, ORDER BY pk, OFFSET `skip`, LIMIT `limit` (None = unbounded).
pub fn select_list(model: &ModelDescriptor, filter: &SearchFilter, skip: u64, limit: Option<u64>) -> QueryBuf {
    let predicate = build_filter_predicate(model, filter);
    // SQLite needs a LIMIT before OFFSET; -1 means no limit.
    let limit_clause = match limit {
        Some(n) => format!(" LIMIT {}", n.min(i64::MAX as u64)),
        None if skip > 0 => " LIMIT -1".to_string(),
        None => String::new(),
    };
    let offset_clause = if skip > 0 {
        format!(" OFFSET {}", skip.min(i64::MAX as u64))
    } else {
        String::new()
    };
    QueryBuf {
        sql: format!(
            "SELECT {} FROM {}{} ORDER BY {}{}{}",
            select_column_list(model),
            quoted(&model.table_name()),
            predicate.where_clause(),
            quoted(model.pk_name()),
            limit_clause,
            offset_clause
        ),
        params: predicate.params,
    }
}

/// INSERT the given columns (plus an explicit pk when the store does not assign one).
pub fn insert(model: &ModelDescriptor, values: &[(String, Value)], pk_value: Option<&Value>) -> QueryBuf {
    let mut q = QueryBuf::new();
    let table = quoted(&model.table_name());
    let mut cols = Vec::new();
    if let Some(pk) = pk_value {
        cols.push(quoted(model.pk_name()));
        q.push_param(pk.clone());
    }
    for (col, val) in values {
        cols.push(quoted(col));
        q.push_param(val.clone());
    }
    let returning = select_column_list(model);
    q.sql = if cols.is_empty() {
        format!("INSERT INTO {} DEFAULT VALUES RETURNING {}", table, returning)
    } else {
        format!(
            "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
            table,
            cols.join(", "),
            vec!["?"; cols.len()].join(", "),
            returning
        )
    };
    q
}

/// UPDATE by id: SET only the given columns. With nothing to set this is a plain select by id.
pub fn update(model: &ModelDescriptor, id: &Value, values: &[(String, Value)]) -> QueryBuf {
    if values.is_empty() {
        return select_by_id(model, id);
    }
    let mut q = QueryBuf::new();
    let mut sets = Vec::new();
    for (col, val) in values {
        sets.push(format!("{} = ?", quoted(col)));
        q.push_param(val.clone());
    }
    q.push_param(id.clone());
    q.sql = format!(
        "UPDATE {} SET {} WHERE {} = ? RETURNING {}",
        quoted(&model.table_name()),
        sets.join(", "),
        quoted(model.pk_name()),
        select_column_list(model)
    );
    q
}

/// DELETE by id, returning the removed row.
pub fn delete_by_id(model: &ModelDescriptor, id: &Value) -> QueryBuf {
    QueryBuf {
        sql: format!(
            "DELETE FROM {} WHERE {} = ? RETURNING {}",
            quoted(&model.table_name()),
            quoted(model.pk_name()),
            select_column_list(model)
        ),
        params: vec![id.clone()],
    }
}

/// DELETE every row matching the filter; an empty filter empties the table.
pub fn delete_where(model: &ModelDescriptor, filter: &SearchFilter) -> QueryBuf {
    let predicate = build_filter_predicate(model, filter);
    QueryBuf {
        sql: format!("DELETE FROM {}{}", quoted(&model.table_name()), predicate.where_clause()),
        params: predicate.params,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FieldDescriptor, FieldType};
    use serde_json::json;

    fn item() -> ModelDescriptor {
        ModelDescriptor::new("CannedGood")
            .field(FieldDescriptor::new("amount", FieldType::Integer).default_value(0))
            .field(FieldDescriptor::new("units", FieldType::Text).nullable())
    }

    #[test]
    fn predicate_is_conjunction_of_equalities() {
        let filter = SearchFilter::default()
            .with("amount", 3)
            .with("units", "cup")
            .with("colour", "red")
            .with("id", 1);
        let p = build_filter_predicate(&item(), &filter);
        assert_eq!(p.sql, r#""amount" = ? AND "units" = ?"#);
        assert_eq!(p.params, vec![json!(3), json!("cup")]);
    }

    #[test]
    fn null_filter_is_is_null() {
        let p = build_filter_predicate(&item(), &SearchFilter::default().with("units", Value::Null));
        assert_eq!(p.sql, r#""units" IS NULL"#);
        assert!(p.params.is_empty());
    }

    #[test]
    fn list_orders_by_pk_and_paginates() {
        let q = select_list(&item(), &SearchFilter::default(), 0, None);
        assert_eq!(
            q.sql,
            r#"SELECT "id", "amount", "units" FROM "canned_good" ORDER BY "id""#
        );
        let q = select_list(&item(), &SearchFilter::default().with("amount", 1), 5, None);
        assert_eq!(
            q.sql,
            r#"SELECT "id", "amount", "units" FROM "canned_good" WHERE "amount" = ? ORDER BY "id" LIMIT -1 OFFSET 5"#
        );
        let q = select_list(&item(), &SearchFilter::default(), 2, Some(3));
        assert!(q.sql.ends_with(r#"ORDER BY "id" LIMIT 3 OFFSET 2"#));
    }

    #[test]
    fn insert_returns_all_columns() {
        let q = insert(&item(), &[("amount".into(), json!(2))], None);
        assert_eq!(
            q.sql,
            r#"INSERT INTO "canned_good" ("amount") VALUES (?) RETURNING "id", "amount", "units""#
        );
        let q = insert(&item(), &[], None);
        assert!(q.sql.starts_with(r#"INSERT INTO "canned_good" DEFAULT VALUES"#));
        let q = insert(&item(), &[("amount".into(), json!(2))], Some(&json!("abc")));
        assert_eq!(q.params, vec![json!("abc"), json!(2)]);
    }

    #[test]
    fn update_binds_id_last() {
        let q = update(&item(), &json!(4), &[("units".into(), json!("cup"))]);
        assert_eq!(
            q.sql,
            r#"UPDATE "canned_good" SET "units" = ? WHERE "id" = ? RETURNING "id", "amount", "units""#
        );
        assert_eq!(q.params, vec![json!("cup"), json!(4)]);
        assert_eq!(update(&item(), &json!(4), &[]), select_by_id(&item(), &json!(4)));
    }

    #[test]
    fn delete_where_without_filter_targets_whole_table() {
        assert_eq!(delete_where(&item(), &SearchFilter::default()).sql, r#"DELETE FROM "canned_good""#);
    }
}
