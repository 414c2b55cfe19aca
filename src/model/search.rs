//! Search schema: the all-optional mirror of a model used to parse query-string filters.
//! Derived once per descriptor and memoized for the life of the process.

use crate::error::AppError;
use crate::model::{FieldType, ModelDescriptor};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Reserved query keys that never become filters.
pub const SKIP_PARAM: &str = "skip";
pub const LIMIT_PARAM: &str = "limit";

#[derive(Clone, Debug, PartialEq)]
pub struct FilterField {
    pub name: String,
    pub field_type: FieldType,
    /// Always true: absence means "no filter".
    pub optional: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SearchSchema {
    pub model: String,
    pub fields: Vec<FilterField>,
}

/// One parsed filter: the present fields and their values, in schema order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SearchFilter {
    pub conditions: Vec<(String, Value)>,
}

impl SearchFilter {
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push((field.into(), value.into()));
        self
    }
}

/// Offset/limit for list queries. `limit: None` means unbounded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Pagination {
    pub skip: u64,
    pub limit: Option<u64>,
}

impl Pagination {
    /// `skip` must be an integer >= 0, `limit` an integer > 0.
    pub fn from_query(params: &HashMap<String, String>) -> Result<Self, AppError> {
        let skip = match params.get(SKIP_PARAM) {
            Some(s) => s
                .trim()
                .parse::<u64>()
                .map_err(|_| AppError::BadRequest(format!("{} must be an integer >= 0", SKIP_PARAM)))?,
            None => 0,
        };
        let limit = match params.get(LIMIT_PARAM) {
            Some(s) => match s.trim().parse::<u64>() {
                Ok(n) if n > 0 => Some(n),
                _ => return Err(AppError::BadRequest(format!("{} must be an integer > 0", LIMIT_PARAM))),
            },
            None => None,
        };
        Ok(Pagination { skip, limit })
    }
}

/// Search schema for `descriptor`: one optional filter per non-key field. Computed at most once.
pub fn derive_search_schema(descriptor: &ModelDescriptor) -> Arc<SearchSchema> {
    descriptor
        .search
        .get_or_init(|| {
            tracing::debug!(model = %descriptor.name, "deriving search schema");
            Arc::new(SearchSchema {
                model: descriptor.name.clone(),
                fields: descriptor
                    .non_key_fields()
                    .map(|f| FilterField {
                        name: f.name.clone(),
                        field_type: f.field_type,
                        optional: true,
                    })
                    .collect(),
            })
        })
        .clone()
}

impl SearchSchema {
    /// Parse query parameters into a filter. Unknown keys and pagination keys are ignored;
    /// a value that does not parse as its field's type is a validation error.
    /// Values are never null here: `?units=null` filters on the text `"null"`.
    pub fn parse_query(&self, params: &HashMap<String, String>) -> Result<SearchFilter, AppError> {
        let mut conditions = Vec::new();
        for f in &self.fields {
            let Some(raw) = params.get(&f.name) else { continue };
            let value = f
                .field_type
                .parse_str(raw)
                .map_err(|e| AppError::Validation(format!("filter {}: {}", f.name, e)))?;
            conditions.push((f.name.clone(), value));
        }
        Ok(SearchFilter { conditions })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FieldDescriptor;
    use serde_json::json;

    fn item() -> ModelDescriptor {
        ModelDescriptor::new("FreshItem")
            .field(FieldDescriptor::new("ingredient_id", FieldType::Integer).nullable())
            .field(FieldDescriptor::new("amount", FieldType::Integer).default_value(0))
            .field(FieldDescriptor::new("units", FieldType::Text).nullable())
    }

    fn query(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn mirrors_non_key_fields_as_optional() {
        let m = item().field(FieldDescriptor::new("id", FieldType::Integer));
        let schema = derive_search_schema(&m);
        let names: Vec<_> = schema.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["ingredient_id", "amount", "units"]);
        assert!(schema.fields.iter().all(|f| f.optional));
    }

    #[test]
    fn derived_once_per_descriptor() {
        let m = item();
        let a = derive_search_schema(&m);
        let b = derive_search_schema(&m);
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn parses_present_fields_only() {
        let schema = derive_search_schema(&item());
        let filter = schema
            .parse_query(&query(&[("amount", "3"), ("skip", "2"), ("colour", "red")]))
            .unwrap();
        assert_eq!(filter.conditions, vec![("amount".to_string(), json!(3))]);
        assert!(schema.parse_query(&query(&[])).unwrap().is_empty());
    }

    #[test]
    fn query_values_are_never_null() {
        let schema = derive_search_schema(&item());
        let filter = schema.parse_query(&query(&[("units", "null")])).unwrap();
        assert_eq!(filter.conditions, vec![("units".to_string(), json!("null"))]);
    }

    #[test]
    fn bad_filter_value_is_validation_error() {
        let schema = derive_search_schema(&item());
        let err = schema.parse_query(&query(&[("amount", "lots")])).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn pagination_bounds() {
        assert_eq!(Pagination::from_query(&query(&[])).unwrap(), Pagination { skip: 0, limit: None });
        assert_eq!(
            Pagination::from_query(&query(&[("skip", "4"), ("limit", "2")])).unwrap(),
            Pagination { skip: 4, limit: Some(2) }
        );
        assert!(Pagination::from_query(&query(&[("skip", "-1")])).is_err());
        assert!(Pagination::from_query(&query(&[("limit", "0")])).is_err());
        assert!(Pagination::from_query(&query(&[("limit", "ten")])).is_err());
    }
}
