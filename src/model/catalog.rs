//! Catalog of model descriptors grouped by category, from the built-in domain models or a JSON file.

use crate::error::ConfigError;
use crate::model::{validate, ModelDescriptor};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;

#[derive(Clone, Debug)]
pub struct Category {
    pub name: String,
    pub models: Vec<Arc<ModelDescriptor>>,
}

#[derive(Clone, Debug, Default)]
pub struct Catalog {
    pub categories: Vec<Category>,
}

/// On-disk shape: `{ "categories": [ { "name": "food", "models": [ ... ] } ] }`.
#[derive(Deserialize)]
struct CatalogFile {
    categories: Vec<CategoryFile>,
}

#[derive(Deserialize)]
struct CategoryFile {
    name: String,
    models: Vec<ModelDescriptor>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a category of models. Use `validate` (or a loader) before mounting.
    pub fn category(mut self, name: impl Into<String>, models: Vec<ModelDescriptor>) -> Self {
        self.categories.push(Category {
            name: name.into(),
            models: models.into_iter().map(Arc::new).collect(),
        });
        self
    }

    pub fn models(&self) -> impl Iterator<Item = &Arc<ModelDescriptor>> {
        self.categories.iter().flat_map(|c| c.models.iter())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate(self)
    }

    /// Parse and validate a catalog from JSON text.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let file: CatalogFile = serde_json::from_str(s).map_err(|e| ConfigError::Load(e.to_string()))?;
        let catalog = file
            .categories
            .into_iter()
            .fold(Catalog::new(), |c, cat| c.category(cat.name, cat.models));
        catalog.validate()?;
        Ok(catalog)
    }

    pub async fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))?;
        let catalog = Self::from_json_str(&text)?;
        tracing::info!(
            path = %path.display(),
            categories = catalog.categories.len(),
            models = catalog.models().count(),
            "loaded model catalog"
        );
        Ok(catalog)
    }
}
