//! Request handling core: payload validation and store calls, independent of HTTP.

mod crud;
mod validation;
pub use crud::CrudService;
pub use validation::RequestValidator;
