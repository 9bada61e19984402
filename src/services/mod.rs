pub mod aggregate;
pub mod cleaning;
pub mod dates;
pub mod excel;
pub mod file_loader;
pub mod schema;
