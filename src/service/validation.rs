//! Request body validation against the model descriptor: required fields, types and field rules.
//! Keys that are not model fields (including the primary key) are ignored.

use crate::error::AppError;
use crate::model::{FieldDescriptor, FieldRules, ModelDescriptor};
use serde_json::{Map, Value};

pub struct RequestValidator;

impl RequestValidator {
    /// Columns for an INSERT, in field order. Required fields must be present; omitted optional
    /// fields are left out so the column default (or NULL) applies.
    pub fn for_create(model: &ModelDescriptor, body: &Map<String, Value>) -> Result<Vec<(String, Value)>, AppError> {
        log_ignored(model, body);
        let mut out = Vec::new();
        for field in model.non_key_fields() {
            match body.get(&field.name) {
                Some(v) => out.push((field.name.clone(), validate_field(field, v)?)),
                None if field.is_required() => {
                    return Err(AppError::Validation(format!("{} is required", field.name)));
                }
                None => {}
            }
        }
        Ok(out)
    }

    /// Columns for a partial UPDATE: only fields present in the body.
    pub fn for_update(model: &ModelDescriptor, body: &Map<String, Value>) -> Result<Vec<(String, Value)>, AppError> {
        log_ignored(model, body);
        model
            .non_key_fields()
            .filter_map(|field| body.get(&field.name).map(|v| (field, v)))
            .map(|(field, v)| Ok((field.name.clone(), validate_field(field, v)?)))
            .collect()
    }
}

fn log_ignored(model: &ModelDescriptor, body: &Map<String, Value>) {
    for key in body.keys() {
        if key != model.pk_name() && model.field_by_name(key).is_none() {
            tracing::debug!(model = %model.name, key = %key, "ignoring unknown body key");
        }
    }
}

fn validate_field(field: &FieldDescriptor, v: &Value) -> Result<Value, AppError> {
    let col = &field.name;
    if v.is_null() {
        if field.nullable {
            return Ok(Value::Null);
        }
        return Err(AppError::Validation(format!("{} may not be null", col)));
    }
    let v = field
        .field_type
        .check_json(v)
        .map_err(|e| AppError::Validation(format!("{}: {}", col, e)))?;
    validate_rules(col, &v, &field.rules)?;
    Ok(v)
}

fn validate_rules(col: &str, v: &Value, rule: &FieldRules) -> Result<(), AppError> {
    if let Some(max) = rule.max_length {
        if let Some(s) = v.as_str() {
            if s.chars().count() > max as usize {
                return Err(AppError::Validation(format!(
                    "{} must be at most {} characters",
                    col, max
                )));
            }
        }
    }
    if let Some(min) = rule.min_length {
        if let Some(s) = v.as_str() {
            if s.chars().count() < min as usize {
                return Err(AppError::Validation(format!(
                    "{} must be at least {} characters",
                    col, min
                )));
            }
        }
    }
    let pattern = rule
        .pattern_regex()
        .map_err(|_| AppError::Validation(format!("invalid pattern for {}", col)))?;
    if let Some(re) = pattern {
        if let Some(s) = v.as_str() {
            if !re.is_match(s) {
                return Err(AppError::Validation(format!("{} does not match required pattern", col)));
            }
        }
    }
    if let Some(ref allowed) = rule.allowed {
        if !allowed.iter().any(|a| value_eq(v, a)) {
            return Err(AppError::Validation(format!(
                "{} must be one of: {:?}",
                col,
                allowed.iter().take(8).collect::<Vec<_>>()
            )));
        }
    }
    if let Some(min) = rule.minimum {
        if let Some(n) = v.as_f64() {
            if n < min {
                return Err(AppError::Validation(format!("{} must be at least {}", col, min)));
            }
        }
    }
    if let Some(max) = rule.maximum {
        if let Some(n) = v.as_f64() {
            if n > max {
                return Err(AppError::Validation(format!("{} must be at most {}", col, max)));
            }
        }
    }
    Ok(())
}

fn value_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(n), Value::Number(m)) => n.as_f64() == m.as_f64(),
        _ => a == b,
    }
}
