//! # kiln-core
//!
//! Core crate for the Kiln CMS plugin host. Contains the configuration
//! schema and the unified error system.
//!
//! This crate has **no** internal dependencies on other Kiln crates.

pub mod config;
pub mod error;
pub mod result;

pub use error::AppError;
pub use result::AppResult;
