//! Model descriptors: static schema metadata for one persisted entity.
//! Owned by domain code (built-in catalog or JSON file); the CRUD layer only reads them.

use crate::case::to_snake_case;
use crate::model::search::SearchSchema;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::{Arc, OnceLock};

/// Semantic type of a model field. Drives DDL, body validation and query-string parsing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Integer,
    Float,
    Boolean,
    Text,
    /// RFC 3339 or naive ISO 8601 timestamp, stored as text.
    DateTime,
    /// Length of time in seconds.
    Duration,
    IpAddress,
}

impl FieldType {
    /// SQLite column type.
    pub fn sql_type(&self) -> &'static str {
        match self {
            FieldType::Integer | FieldType::Boolean => "INTEGER",
            FieldType::Float | FieldType::Duration => "REAL",
            FieldType::Text | FieldType::DateTime | FieldType::IpAddress => "TEXT",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, FieldType::Integer | FieldType::Float | FieldType::Duration)
    }

    /// Check a JSON value against this type. Returns the value to store.
    pub fn check_json(&self, v: &Value) -> Result<Value, String> {
        match (self, v) {
            (FieldType::Integer, Value::Number(n)) if n.is_i64() => Ok(v.clone()),
            (FieldType::Integer, _) => Err("expected an integer".into()),
            (FieldType::Float | FieldType::Duration, Value::Number(_)) => Ok(v.clone()),
            (FieldType::Float | FieldType::Duration, _) => Err("expected a number".into()),
            (FieldType::Boolean, Value::Bool(_)) => Ok(v.clone()),
            (FieldType::Boolean, _) => Err("expected a boolean".into()),
            (FieldType::Text, Value::String(_)) => Ok(v.clone()),
            (FieldType::Text, _) => Err("expected a string".into()),
            (FieldType::DateTime, Value::String(s)) if is_datetime(s) => Ok(v.clone()),
            (FieldType::DateTime, _) => Err("expected an ISO 8601 datetime".into()),
            (FieldType::IpAddress, Value::String(s)) if s.parse::<std::net::IpAddr>().is_ok() => Ok(v.clone()),
            (FieldType::IpAddress, _) => Err("expected an IP address".into()),
        }
    }

    /// Parse a query-string value into a typed JSON value.
    pub fn parse_str(&self, raw: &str) -> Result<Value, String> {
        match self {
            FieldType::Integer => raw
                .parse::<i64>()
                .map(|n| Value::Number(n.into()))
                .map_err(|_| "expected an integer".into()),
            FieldType::Float | FieldType::Duration => raw
                .parse::<f64>()
                .ok()
                .and_then(serde_json::Number::from_f64)
                .map(Value::Number)
                .ok_or_else(|| "expected a number".into()),
            FieldType::Boolean => match raw.to_ascii_lowercase().as_str() {
                "true" | "1" => Ok(Value::Bool(true)),
                "false" | "0" => Ok(Value::Bool(false)),
                _ => Err("expected true or false".into()),
            },
            FieldType::Text | FieldType::DateTime | FieldType::IpAddress => {
                self.check_json(&Value::String(raw.to_string()))
            }
        }
    }
}

fn is_datetime(s: &str) -> bool {
    use chrono::{DateTime, NaiveDate, NaiveDateTime};
    DateTime::parse_from_rfc3339(s).is_ok()
        || NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f").is_ok()
        || NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S").is_ok()
        || NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
}

/// Primary key type for parsing path ids and generating keys on insert.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PkType {
    /// `INTEGER PRIMARY KEY AUTOINCREMENT`, assigned by SQLite.
    #[default]
    Integer,
    /// Random v4 uuid, generated at insert.
    Uuid,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimaryKey {
    #[serde(default = "default_pk_name")]
    pub name: String,
    #[serde(default, rename = "type")]
    pub pk_type: PkType,
}

fn default_pk_name() -> String {
    "id".into()
}

impl Default for PrimaryKey {
    fn default() -> Self {
        PrimaryKey {
            name: default_pk_name(),
            pk_type: PkType::Integer,
        }
    }
}

/// Value constraints applied to create/update bodies.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldRules {
    #[serde(default)]
    pub minimum: Option<f64>,
    #[serde(default)]
    pub maximum: Option<f64>,
    #[serde(default)]
    pub min_length: Option<u32>,
    #[serde(default)]
    pub max_length: Option<u32>,
    #[serde(default)]
    pub pattern: Option<String>,
    /// Enumeration of permitted values; also emitted as a CHECK constraint.
    #[serde(default)]
    pub allowed: Option<Vec<Value>>,
    #[serde(skip)]
    compiled: CompiledPattern,
}

impl FieldRules {
    /// `pattern` compiled on first use and reused for every later body.
    pub fn pattern_regex(&self) -> Result<Option<&Regex>, regex::Error> {
        let Some(pattern) = self.pattern.as_deref() else {
            return Ok(None);
        };
        if let Some(re) = self.compiled.0.get() {
            return Ok(Some(re));
        }
        let re = Regex::new(pattern)?;
        Ok(Some(self.compiled.0.get_or_init(|| re)))
    }
}

/// Cache slot for a compiled pattern. Never part of equality.
#[derive(Clone, Debug, Default)]
struct CompiledPattern(OnceLock<Regex>);

impl PartialEq for CompiledPattern {
    fn eq(&self, _: &Self) -> bool {
        true
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub nullable: bool,
    #[serde(default)]
    pub default: Option<Value>,
    #[serde(default)]
    pub unique: bool,
    #[serde(default)]
    pub index: bool,
    /// Table name of the referenced model; the foreign key targets its primary key.
    #[serde(default)]
    pub references: Option<String>,
    #[serde(default)]
    pub rules: FieldRules,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        FieldDescriptor {
            name: name.into(),
            field_type,
            nullable: false,
            default: None,
            unique: false,
            index: false,
            references: None,
            rules: FieldRules::default(),
        }
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn index(mut self) -> Self {
        self.index = true;
        self
    }

    pub fn references(mut self, table: impl Into<String>) -> Self {
        self.references = Some(table.into());
        self
    }

    pub fn minimum(mut self, min: f64) -> Self {
        self.rules.minimum = Some(min);
        self
    }

    pub fn maximum(mut self, max: f64) -> Self {
        self.rules.maximum = Some(max);
        self
    }

    pub fn max_length(mut self, max: u32) -> Self {
        self.rules.max_length = Some(max);
        self
    }

    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.rules.pattern = Some(pattern.into());
        self.rules.compiled = CompiledPattern::default();
        self
    }

    pub fn allowed<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.rules.allowed = Some(values.into_iter().map(Into::into).collect());
        self
    }

    /// Must be present in a create body: not nullable and no default.
    pub fn is_required(&self) -> bool {
        !self.nullable && self.default.is_none()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ModelDescriptor {
    pub name: String,
    /// Defaults to snake_case of `name`.
    #[serde(default)]
    pub table: Option<String>,
    /// Defaults to snake_case of `name`.
    #[serde(default)]
    pub path_segment: Option<String>,
    #[serde(default)]
    pub primary_key: PrimaryKey,
    pub fields: Vec<FieldDescriptor>,
    #[serde(skip)]
    pub(crate) search: OnceLock<Arc<SearchSchema>>,
}

impl ModelDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        ModelDescriptor {
            name: name.into(),
            table: None,
            path_segment: None,
            primary_key: PrimaryKey::default(),
            fields: Vec::new(),
            search: OnceLock::new(),
        }
    }

    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    pub fn path_segment(mut self, segment: impl Into<String>) -> Self {
        self.path_segment = Some(segment.into());
        self
    }

    pub fn primary_key(mut self, name: impl Into<String>, pk_type: PkType) -> Self {
        self.primary_key = PrimaryKey {
            name: name.into(),
            pk_type,
        };
        self
    }

    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    pub fn table_name(&self) -> String {
        self.table.clone().unwrap_or_else(|| to_snake_case(&self.name))
    }

    pub fn path(&self) -> String {
        self.path_segment.clone().unwrap_or_else(|| to_snake_case(&self.name))
    }

    pub fn pk_name(&self) -> &str {
        &self.primary_key.name
    }

    pub fn pk_type(&self) -> PkType {
        self.primary_key.pk_type
    }

    pub fn field_by_name(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Fields other than the primary key, in declaration order.
    pub fn non_key_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter(move |f| f.name != self.primary_key.name)
    }
}
