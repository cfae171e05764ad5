//! # kiln-cache
//!
//! In-process caches used by the plugin host:
//!
//! - [`ScopedCache`]: a lazily populated cache whose concurrent first
//!   loads coalesce into one, with an explicit invalidation entry point.

pub mod scoped;

pub use scoped::ScopedCache;
