//! HTTP handlers for model CRUD and health.

pub mod crud;
pub mod health;
pub use health::health;
