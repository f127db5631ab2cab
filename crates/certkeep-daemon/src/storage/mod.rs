//! SQLite storage for the certkeep daemon.
//!
//! Provides persistence for certificates, shared-access grants, and user
//! preferences.

mod db;
mod models;
mod queries_access;
mod queries_certs;
mod queries_users;


pub use certkeep_core::db::DatabaseError;
pub use db::Database;
pub use models::*;
pub use queries_users::DEFAULT_LANGUAGE;
