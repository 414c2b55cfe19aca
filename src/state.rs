//! Per-model router state: the shared connection provider plus the model it serves.

use crate::db::Database;
use crate::model::{derive_search_schema, ModelDescriptor, SearchSchema};
use std::sync::Arc;

#[derive(Clone)]
pub struct CrudState {
    pub db: Database,
    pub model: Arc<ModelDescriptor>,
    pub search: Arc<SearchSchema>,
    /// Tag for this router's log lines.
    pub label: Arc<str>,
}

impl CrudState {
    pub fn new(db: Database, model: Arc<ModelDescriptor>, label: &str) -> Self {
        let search = derive_search_schema(&model);
        CrudState {
            db,
            model,
            search,
            label: Arc::from(label),
        }
    }
}
