//! Shared domain types and rules for the Taskboard platform
//!
//! Everything here is free of I/O so it can be unit tested in isolation and
//! reused by the server, its tests and any future client.

pub mod identifiers;
pub mod models;
pub mod realtime;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;
