//! # Cache Error Types
//!
//! Errors surfaced by configuration loading and the collaborator seams.
//! Producer and backend failures are recovered inside the rebuild pass and
//! only ever reach the log; configuration errors propagate to the caller.

use thiserror::Error;

/// Errors that can occur while setting up or driving the cache.
#[derive(Error, Debug)]
pub enum CacheError {
    /// A configuration value is out of range.
    #[error("invalid configuration: {field}: {reason}")]
    InvalidConfig {
        /// Offending field.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// The configuration file could not be read.
    #[error("failed to read configuration: {0}")]
    ConfigIo(#[from] std::io::Error),

    /// The configuration file is not valid TOML for `CacheConfig`.
    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

/// Failure raised by a producer while baking its static geometry.
///
/// Never escalated: the rebuild pass logs it, skips the producer and keeps
/// whatever the producer staged before failing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BakeError {
    /// An asset the producer needs (font, texture, model) is not loaded.
    #[error("missing asset `{0}`")]
    MissingAsset(String),

    /// The producer's own state cannot be rendered right now.
    #[error("invalid producer state: {0}")]
    InvalidState(String),

    /// Anything else.
    #[error("{0}")]
    Other(String),
}

/// Failure reported by a graphics backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// The backend refused the staged geometry.
    #[error("upload rejected for layer `{layer}`: {reason}")]
    UploadRejected {
        /// Layer name.
        layer: &'static str,
        /// Backend-specific reason.
        reason: String,
    },

    /// No pipeline state is registered for the layer.
    #[error("no pipeline registered for layer `{0}`")]
    UnknownLayer(&'static str),
}

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;
