use std::fmt;

/// Result type for beamtrack operations
pub type Result<T> = std::result::Result<T, BeamError>;

/// Main error type for the beamtrack library
#[derive(Debug, Clone)]
pub enum BeamError {
    /// Array shapes that must agree do not
    DimensionMismatch {
        expected: String,
        actual: String,
    },

    /// Invalid parameter value
    InvalidParameter {
        name: String,
        reason: String,
    },

    /// IO errors (file operations)
    IoError(String),

    /// Serialization/deserialization errors
    SerializationError(String),

    /// Action outside the receive codebook
    InvalidAction {
        action: usize,
        max_actions: usize,
    },

    /// Trace has no trajectories or no timesteps
    EmptyTrace(String),

    /// Neither the cache nor the simulator produced a trace
    TraceUnavailable(String),
}

impl fmt::Display for BeamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BeamError::DimensionMismatch { expected, actual } => {
                write!(f, "Dimension mismatch: expected {}, got {}", expected, actual)
            }
            BeamError::InvalidParameter { name, reason } => {
                write!(f, "Invalid parameter '{}': {}", name, reason)
            }
            BeamError::IoError(msg) => write!(f, "IO error: {}", msg),
            BeamError::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            BeamError::InvalidAction { action, max_actions } => {
                write!(f, "Invalid action {}: must be less than {}", action, max_actions)
            }
            BeamError::EmptyTrace(msg) => write!(f, "Empty trace: {}", msg),
            BeamError::TraceUnavailable(msg) => write!(f, "Trace unavailable: {}", msg),
        }
    }
}

impl std::error::Error for BeamError {}

impl From<std::io::Error> for BeamError {
    fn from(err: std::io::Error) -> Self {
        BeamError::IoError(err.to_string())
    }
}

impl From<bincode::Error> for BeamError {
    fn from(err: bincode::Error) -> Self {
        BeamError::SerializationError(err.to_string())
    }
}

impl From<serde_json::Error> for BeamError {
    fn from(err: serde_json::Error) -> Self {
        BeamError::SerializationError(err.to_string())
    }
}

// Helper functions for common error patterns
impl BeamError {
    pub fn dimension_mismatch<S: Into<String>>(expected: S, actual: S) -> Self {
        BeamError::DimensionMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    pub fn invalid_parameter<S: Into<String>>(name: S, reason: S) -> Self {
        BeamError::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }
}
