//! Safe SQL builder for the record table: parameterized queries only.

mod builder;
mod params;
pub use builder::*;
pub use params::PgBindValue;
