//! Healthwatch Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared types, logging setup, and error handling for the Healthwatch pipeline.
//!
//! # Overview
//!
//! This crate provides common functionality used across all Healthwatch workspace members:
//!
//! - **Error Handling**: Custom error types and result types
//! - **Logging**: `tracing` subscriber configuration (console, rolling files, JSON)
//! - **Types**: Monitored locations and the canonical ingestion record
//!
//! # Example
//!
//! ```no_run
//! use healthwatch_common::types::Location;
//! use healthwatch_common::Result;
//!
//! fn check() -> Result<()> {
//!     let location = Location::new("Denver", "CO", 39.7392, -104.9903, "347810");
//!     location.validate()?;
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod logging;
pub mod types;

// Re-export commonly used types
pub use error::{HealthwatchError, Result};
