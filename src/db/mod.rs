pub mod driver;
pub mod schema;
