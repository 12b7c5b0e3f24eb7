pub mod connection;
pub mod history;
pub mod schema;

pub use connection::Database;

/// Append-only per-agent history, backed by SQLite.
pub type PersistentHistory = Database;
