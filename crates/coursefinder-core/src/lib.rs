//! Core definitions shared across the coursefinder crates.
//!
//! The retrieval engine, the HTTP gateway and the CLI all report failures
//! through a single error enum so that each layer can decide how to surface
//! them (status codes, exit codes, log levels) without re-wrapping.
//!
//! # Main types
//!
//! - [`CourseFinderError`]: Unified error enum for loading, validation and scoring.
//! - [`CourseFinderResult`]: Convenience alias for `Result<T, CourseFinderError>`.

/// Error taxonomy.
pub mod error;

pub use error::{CourseFinderError, CourseFinderResult};
