//! HTTP API handlers for arbourne-web

pub mod admin;
pub mod board;
pub mod error;
pub mod events;
pub mod health;
pub mod session;

pub use error::ApiError;
