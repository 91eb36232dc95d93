//! Error types for the wave estimation engine.
//!
//! Only genuinely invalid calls are errors. Running short of data is not:
//! the streaming pipeline reports that through `None`, `NaN` or a zero
//! confidence and keeps going.

/// Error type for all fallible operations in the crate.
#[derive(Debug, thiserror::Error)]
pub enum WaveError {
    /// Returned when a transform length is not a power of two.
    #[error("transform length {n} is not a power of two")]
    InvalidLength {
        /// The rejected length.
        n: usize,
    },

    /// Returned when more input values are supplied than the transform length.
    #[error("input of {len} values does not fit a transform of length {n}")]
    InputTooLong {
        /// Number of values supplied.
        len: usize,
        /// Transform length.
        n: usize,
    },

    /// Returned when configuration is invalid.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// Description of the problem.
        reason: String,
    },

    /// Returned when a configuration file is not valid TOML for [`crate::config::WaveConfig`].
    #[error("config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Returned when the configuration cannot be serialised.
    #[error("config serialise error: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    /// Returned when a configuration file cannot be read or written.
    #[error("config io: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, WaveError>;
