// File I/O operations

pub mod csv;
pub mod discover;
pub mod read;
pub mod sqlite;

/// SQLite record store schema version.
/// Increment when the schema changes in a way that old versions can't read.
pub const STORE_SCHEMA_VERSION: u32 = 1;
