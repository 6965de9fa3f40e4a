//! Prospect Store — SQLite entity records, embeddings and vector search.

pub mod embedding;
pub mod schema;
pub mod sqlite;
pub mod traits;
pub mod types;

pub use sqlite::SqliteStore;
pub use traits::EntityStore;
pub use types::*;
