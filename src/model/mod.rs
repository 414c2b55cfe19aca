pub mod builtin;
pub mod catalog;
pub mod descriptor;
pub mod search;
pub mod validator;

pub use builtin::builtin;
pub use catalog::*;
pub use descriptor::*;
pub use search::*;
pub use validator::*;
