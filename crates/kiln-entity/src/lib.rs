//! # kiln-entity
//!
//! Entity models for the Kiln plugin host. Every struct in this crate
//! represents a database table row or a domain value object. Database
//! entities derive `sqlx::FromRow` and map the storage column names onto
//! Rust field names.

pub mod plugin;
pub mod setting;
pub mod user;
pub mod widget;
