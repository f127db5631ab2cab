//! Shared foundation for the certkeep crates.
//!
//! Provides the SQLite pool helpers and [`DatabaseError`](db::DatabaseError)
//! behind the daemon's storage layer, plus the calendar math used by expiry
//! matching and the daily notification schedule.

pub mod db;
pub mod time;
