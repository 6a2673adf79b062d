//! # Arbourne Common Library
//!
//! Shared code for the Arbourne Audio site backend:
//! - Database schema, migrations and row models
//! - Event types (closed enum) and the lead-scoring table
//! - Tagged event payload union
//! - Session token and voter hash helpers
//! - Configuration loading
//! - Fixed-TTL cache

pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod session;

pub use error::{Error, Result};
