//! Catalog validation: naming, uniqueness and referential integrity between models.

use crate::error::ConfigError;
use crate::model::{Catalog, FieldType, ModelDescriptor};
use std::collections::HashSet;

fn invalid(model: &ModelDescriptor, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidModel {
        model: model.name.clone(),
        reason: reason.into(),
    }
}

/// Identifiers end up quoted in SQL and in route paths; keep them plain.
fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

pub fn validate(catalog: &Catalog) -> Result<(), ConfigError> {
    let tables: HashSet<String> = catalog.models().map(|m| m.table_name()).collect();
    let mut category_names = HashSet::new();
    let mut seen_tables = HashSet::new();

    for category in &catalog.categories {
        if !is_identifier(&category.name) {
            return Err(ConfigError::InvalidModel {
                model: category.name.clone(),
                reason: "category name must be an identifier".into(),
            });
        }
        if !category_names.insert(category.name.as_str()) {
            return Err(ConfigError::Duplicate {
                kind: "category",
                name: category.name.clone(),
            });
        }

        let mut paths = HashSet::new();
        for model in &category.models {
            validate_model(model, &tables)?;
            if !paths.insert(model.path()) {
                return Err(ConfigError::Duplicate {
                    kind: "path segment",
                    name: format!("{}/{}", category.name, model.path()),
                });
            }
            if !seen_tables.insert(model.table_name()) {
                return Err(ConfigError::Duplicate {
                    kind: "table",
                    name: model.table_name(),
                });
            }
        }
    }
    Ok(())
}

fn validate_model(model: &ModelDescriptor, tables: &HashSet<String>) -> Result<(), ConfigError> {
    if model.name.is_empty() {
        return Err(invalid(model, "empty model name"));
    }
    for (what, ident) in [
        ("table", model.table_name()),
        ("path segment", model.path()),
        ("primary key", model.pk_name().to_string()),
    ] {
        if !is_identifier(&ident) {
            return Err(invalid(model, format!("{} '{}' is not an identifier", what, ident)));
        }
    }

    let mut field_names = HashSet::new();
    for field in &model.fields {
        if !is_identifier(&field.name) {
            return Err(invalid(model, format!("field '{}' is not an identifier", field.name)));
        }
        if field.name == model.pk_name() {
            return Err(invalid(model, format!("field '{}' shadows the primary key", field.name)));
        }
        if !field_names.insert(field.name.as_str()) {
            return Err(ConfigError::Duplicate {
                kind: "field",
                name: format!("{}.{}", model.name, field.name),
            });
        }
        if let Some(target) = &field.references {
            if !tables.contains(target) {
                return Err(ConfigError::MissingReference {
                    kind: "table",
                    id: target.clone(),
                });
            }
        }
        if let Err(e) = field.rules.pattern_regex() {
            return Err(invalid(model, format!("field '{}' pattern: {}", field.name, e)));
        }
        if let Some(allowed) = &field.rules.allowed {
            if allowed.is_empty() {
                return Err(invalid(model, format!("field '{}' has an empty allowed list", field.name)));
            }
            for v in allowed {
                field
                    .field_type
                    .check_json(v)
                    .map_err(|e| invalid(model, format!("field '{}' allowed value {}: {}", field.name, v, e)))?;
            }
        }
        if (field.rules.minimum.is_some() || field.rules.maximum.is_some()) && !field.field_type.is_numeric() {
            return Err(invalid(model, format!("field '{}' has numeric bounds on a non-numeric type", field.name)));
        }
        if let Some(default) = &field.default {
            if !default.is_null() {
                field
                    .field_type
                    .check_json(default)
                    .map_err(|e| invalid(model, format!("field '{}' default: {}", field.name, e)))?;
            }
        }
        if field.field_type == FieldType::Boolean && field.rules.pattern.is_some() {
            return Err(invalid(model, format!("field '{}' has a pattern on a boolean", field.name)));
        }
    }
    Ok(())
}
