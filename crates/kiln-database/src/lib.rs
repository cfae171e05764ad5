//! # kiln-database
//!
//! SQLite connection management, embedded migrations and the concrete
//! repositories for plugins, hook bindings, widgets and settings.

pub mod connection;
pub mod migration;
pub mod repositories;

pub use connection::DatabasePool;
