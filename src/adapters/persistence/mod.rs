//! Persistence adapter: libsql (SQLite) implementation of every store port.

pub mod accounts;
pub mod billing;
pub mod lessons;
pub mod requests;
pub mod sessions;
pub mod sqlite_repo;

pub use sqlite_repo::SqliteRepo;
