//! certkeep daemon library.
//!
//! Storage, visibility rules, upload ingest, and expiry notifications for
//! the certificate store. The binary in `main.rs` wires these together; the
//! integration tests drive them directly.

pub mod ingest;
pub mod notify;
pub mod storage;
pub mod visibility;
