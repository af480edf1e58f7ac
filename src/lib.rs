// src/lib.rs

pub mod buffer;
pub mod error;
pub mod handle;
pub mod report;

/// Library version, for diagnostics.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
