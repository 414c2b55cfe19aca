//! CrudService: generic CRUD using the safe SQL builder.

mod crud;
mod validation;
pub use crud::{CrudService, Lookup};
pub use validation::RequestValidator;
