//! # Error Types
//!
//! Custom error types for Teleop Twist using `thiserror`.
//!
//! The controller core never fails: short samples and unmapped axes resolve
//! to zero. Errors only come from the edges (config files, I/O, devices and
//! parameter updates).

use thiserror::Error;

/// Main error type for Teleop Twist
#[derive(Debug, Error)]
pub enum TeleopError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// Rejected parameter update batch
    #[error("Parameter error: {0}")]
    Parameter(#[from] ParameterError),

    /// Malformed JSON on the sample stream or while encoding a command
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Gamepad device errors
    #[error("Device error: {0}")]
    Device(String),

    /// No usable gamepad was found
    #[error("No gamepad found under /dev/input")]
    DeviceNotFound,

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Reason a parameter update batch was rejected.
///
/// A rejected batch leaves the previous configuration untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParameterError {
    /// A known parameter was given a value of the wrong kind.
    #[error("Only {expected} values can be set for '{name}'.")]
    TypeMismatch {
        /// Offending parameter name
        name: String,
        /// Kind the parameter accepts ("integer", "double" or "boolean")
        expected: &'static str,
    },
}

/// Result type alias for Teleop Twist
pub type Result<T> = std::result::Result<T, TeleopError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_mismatch_message_names_field() {
        let err = ParameterError::TypeMismatch {
            name: "axis_linear.x".to_string(),
            expected: "integer",
        };
        assert_eq!(
            err.to_string(),
            "Only integer values can be set for 'axis_linear.x'."
        );
    }

    #[test]
    fn test_parameter_error_converts() {
        let err: TeleopError = ParameterError::TypeMismatch {
            name: "require_enable_button".to_string(),
            expected: "boolean",
        }
        .into();
        assert!(matches!(err, TeleopError::Parameter(_)));
        assert!(err.to_string().contains("require_enable_button"));
    }
}
