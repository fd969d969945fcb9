//! Configuration error types.

use std::fmt;

/// Errors that can occur while loading configuration from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A required variable is unset or empty.
    MissingVariable {
        /// The environment variable name.
        name: String,
    },

    /// A variable is set but its value cannot be used.
    InvalidValue {
        /// The environment variable name.
        name: String,
        /// The value that was found.
        value: String,
        /// Why the value was rejected.
        reason: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingVariable { name } => {
                write!(f, "Missing required variable: {}", name)
            }
            ConfigError::InvalidValue {
                name,
                value,
                reason,
            } => {
                write!(
                    f,
                    "Invalid value '{}' for variable '{}': {}",
                    value, name, reason
                )
            }
        }
    }
}

impl std::error::Error for ConfigError {}
