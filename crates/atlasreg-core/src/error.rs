//! Error types for registration coordination.

use thiserror::Error;

/// Main error type for registration coordination.
#[derive(Error, Debug)]
pub enum RegistrationError {
    /// The external toolkit failed to register or resample.
    #[error("Registration computation failed: {0}")]
    ComputationFailed(String),

    /// An apply operation ran before a transform chain was computed.
    #[error("No transform chain has been computed for this session")]
    TransformChainMissing,

    /// A registration run produced no transform components.
    #[error("Transform chain is empty")]
    EmptyTransformChain,

    /// More chained components than one apply invocation can take.
    #[error("Transform chain has {len} components, at most {max} are supported")]
    ChainTooLong { len: usize, max: usize },

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Filesystem error while managing working directories.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for registration coordination.
pub type Result<T> = std::result::Result<T, RegistrationError>;

impl RegistrationError {
    /// Create a computation-failed error.
    pub fn computation(msg: impl Into<String>) -> Self {
        Self::ComputationFailed(msg.into())
    }

    /// Create an invalid configuration error.
    pub fn invalid_configuration(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = RegistrationError::computation("script exited with 1");
        assert!(matches!(err, RegistrationError::ComputationFailed(_)));
    }

    #[test]
    fn test_error_display() {
        let err = RegistrationError::computation("script exited with 1");
        assert_eq!(
            err.to_string(),
            "Registration computation failed: script exited with 1"
        );
    }

    #[test]
    fn test_chain_too_long_display() {
        let err = RegistrationError::ChainTooLong { len: 5, max: 4 };
        let err_str = err.to_string();
        assert!(err_str.contains("5 components"));
        assert!(err_str.contains("at most 4"));
    }
}
