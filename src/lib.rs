//! Pantry: descriptor-driven CRUD REST backend for household inventory.

pub mod case;
pub mod db;
pub mod error;
pub mod handlers;
pub mod migration;
pub mod model;
pub mod routes;
pub mod service;
pub mod settings;
pub mod sql;
pub mod state;

pub use db::{Database, Session};
pub use error::{AppError, ConfigError};
pub use migration::ensure_tables;
pub use model::{builtin, derive_search_schema, Catalog, FieldDescriptor, FieldType, ModelDescriptor, PkType, SearchSchema};
pub use routes::{app, build_top_router, common_routes, crud_routes};
pub use service::{CrudService, Lookup};
pub use settings::{init_tracing, Settings};
pub use state::CrudState;
