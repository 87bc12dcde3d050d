//! Errors in the library.
use thiserror::Error;

/// Errors in the library.
#[derive(Error, Debug, PartialEq)]
pub enum ArmRlError {
    /// A batch larger than the number of stored transitions was requested.
    #[error("Insufficient data: requested {requested} items, but only {available} are stored")]
    InsufficientData {
        /// Requested batch size.
        requested: usize,
        /// Number of items currently stored.
        available: usize,
    },

    /// A batch of size zero was requested.
    #[error("Sample size must be positive")]
    EmptySample,

    /// A buffer was configured with an unusable capacity.
    #[error("Invalid capacity: {0}")]
    InvalidCapacity(usize),

    /// A configuration value is out of range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Record key error.
    #[error("Record key error: {0}")]
    RecordKeyError(String),

    /// Record value type error.
    #[error("Record value type error: {0}")]
    RecordValueTypeError(String),

    /// A learning curve file could not be interpreted.
    #[error("Curve format error: {0}")]
    CurveFormat(String),
}
