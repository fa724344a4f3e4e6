//! Error types for the CLI

use covforge::CovError;
use thiserror::Error;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// Errors that can occur in the CLI
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// Invalid argument
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Error message
        message: String,
    },

    /// Coverage pipeline error
    #[error("{0}")]
    Pipeline(#[from] CovError),

    /// Summary could not be rendered
    #[error("Output failed: {message}")]
    Output {
        /// Error message
        message: String,
    },
}

impl CliError {
    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an invalid argument error
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create an output error
    #[must_use]
    pub fn output(message: impl Into<String>) -> Self {
        Self::Output {
            message: message.into(),
        }
    }

    /// Process exit status: the failing tool's own status when it fits in
    /// 1..=255, otherwise 1
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Pipeline(err) => err
                .tool_exit_code()
                .and_then(|code| u8::try_from(code).ok())
                .filter(|code| *code != 0)
                .unwrap_or(1),
            _ => 1,
        }
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        Self::output(err.to_string())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use covforge::Stage;

    fn tool_failed(code: Option<i32>) -> CliError {
        CliError::Pipeline(CovError::ToolFailed {
            stage: Stage::Test,
            command: "cargo test".to_string(),
            code,
            stderr: String::new(),
        })
    }

    mod message_tests {
        use super::*;

        #[test]
        fn test_config_error() {
            let err = CliError::config("bad config");
            assert!(err.to_string().contains("Configuration"));
            assert!(err.to_string().contains("bad config"));
        }

        #[test]
        fn test_invalid_argument_error() {
            let err = CliError::invalid_argument("bad arg");
            assert!(err.to_string().contains("Invalid argument"));
        }

        #[test]
        fn test_pipeline_error_is_transparent() {
            let err = CliError::from(CovError::NoTestBinaries);
            assert_eq!(err.to_string(), CovError::NoTestBinaries.to_string());
        }
    }

    mod exit_code_tests {
        use super::*;

        #[test]
        fn test_tool_status_propagates() {
            assert_eq!(tool_failed(Some(101)).exit_code(), 101);
            assert_eq!(tool_failed(Some(3)).exit_code(), 3);
        }

        #[test]
        fn test_out_of_range_status_is_one() {
            assert_eq!(tool_failed(Some(256)).exit_code(), 1);
            assert_eq!(tool_failed(Some(-1)).exit_code(), 1);
            assert_eq!(tool_failed(Some(0)).exit_code(), 1);
            assert_eq!(tool_failed(None).exit_code(), 1);
        }

        #[test]
        fn test_other_errors_are_one() {
            assert_eq!(CliError::from(CovError::EmptyReport).exit_code(), 1);
            assert_eq!(CliError::config("x").exit_code(), 1);
        }
    }
}
