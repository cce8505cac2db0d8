//! Catalog and rule loading for Panteón sessions.

pub mod load;
pub mod schema;

pub use load::*;
pub use schema::*;
