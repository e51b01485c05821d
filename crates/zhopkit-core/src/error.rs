//! Error handling for zhopkit
//!
//! Provides error types for every layer of the post-processor:
//! - G-Code errors (block and sequence rewriting)
//! - Profile errors (trajectory geometry, model parameters)
//! - Configuration errors (ranges, file formats)
//!
//! All error types use `thiserror` for ergonomic error handling.

use thiserror::Error;

/// G-Code error type
///
/// Represents errors raised while rewriting G-Code blocks.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GcodeError {
    /// Block could not be processed as a whole
    #[error("Block {index} failed: {reason}")]
    BlockFailed {
        /// Index of the layer block in the document.
        index: usize,
        /// The reason the block failed.
        reason: String,
    },

    /// Generic G-Code error
    #[error("G-Code error: {message}")]
    Other {
        /// The error message.
        message: String,
    },
}

/// Trajectory profile error type
///
/// Raised when synthesized geometry would be unusable.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProfileError {
    /// A computed coordinate is NaN or infinite
    #[error("Non-finite {quantity} at distance {distance}")]
    NonFinite {
        /// Which quantity went bad (e.g. "z", "offset").
        quantity: String,
        /// Cumulative path distance where it happened.
        distance: f64,
    },

    /// A model parameter cannot produce a trajectory
    #[error("Invalid {model} parameter '{name}': {reason}")]
    InvalidParameter {
        /// Model name.
        model: String,
        /// Parameter name.
        name: String,
        /// The reason the parameter is invalid.
        reason: String,
    },
}

/// Configuration error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Value outside its allowed range
    #[error("{name} = {value} is out of range [{min}, {max}]")]
    OutOfRange {
        /// Option name.
        name: String,
        /// The rejected value.
        value: f64,
        /// Inclusive lower bound.
        min: f64,
        /// Inclusive upper bound.
        max: f64,
    },

    /// File extension not supported
    #[error("Unsupported config format '{extension}' (expected .json or .toml)")]
    UnsupportedFormat {
        /// The extension that was given.
        extension: String,
    },

    /// File content could not be parsed or serialized
    #[error("Invalid {format} config: {reason}")]
    Parse {
        /// "JSON" or "TOML".
        format: String,
        /// Parser message.
        reason: String,
    },
}

/// Unified error type
#[derive(Error, Debug)]
pub enum Error {
    /// G-Code error
    #[error(transparent)]
    Gcode(#[from] GcodeError),

    /// Profile error
    #[error(transparent)]
    Profile(#[from] ProfileError),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Check if this is a G-Code error
    pub fn is_gcode_error(&self) -> bool {
        matches!(self, Error::Gcode(_))
    }

    /// Check if this is a profile error
    pub fn is_profile_error(&self) -> bool {
        matches!(self, Error::Profile(_))
    }

    /// Check if this is a configuration error
    pub fn is_config_error(&self) -> bool {
        matches!(self, Error::Config(_))
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;
