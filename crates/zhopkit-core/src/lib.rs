//! # zhopkit Core
//!
//! Core types and utilities shared by the zhopkit crates:
//! machine positions, feed-rate conversions, and the error taxonomy.

pub mod data;
pub mod error;
pub mod units;

pub use data::Position;
pub use error::{ConfigError, Error, GcodeError, ProfileError, Result};
