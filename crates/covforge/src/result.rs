//! Result and error types for covforge.

use crate::pipeline::Stage;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for covforge operations
pub type CovResult<T> = Result<T, CovError>;

/// Errors that can occur while producing a coverage report
#[derive(Debug, Error)]
pub enum CovError {
    /// External tool could not be started
    #[error("{stage}: failed to spawn `{command}`: {source}")]
    ToolSpawn {
        /// Stage that issued the command
        stage: Stage,
        /// Rendered command line
        command: String,
        /// Underlying spawn error
        #[source]
        source: std::io::Error,
    },

    /// External tool exited unsuccessfully
    #[error("{stage}: `{command}` exited with {}", describe_code(.code))]
    ToolFailed {
        /// Stage that issued the command
        stage: Stage,
        /// Rendered command line
        command: String,
        /// Exit code, `None` when terminated by a signal
        code: Option<i32>,
        /// Captured stderr (empty when stderr was inherited)
        stderr: String,
    },

    /// Merge stage found no raw profiles
    #[error("no raw profiles matching `{pattern}` under {}", .root.display())]
    NoRawProfiles {
        /// Directory that was searched
        root: PathBuf,
        /// File name pattern searched for
        pattern: String,
    },

    /// Discovery found no test binaries
    #[error("cargo reported no test binaries to export coverage for")]
    NoTestBinaries,

    /// Malformed cargo JSON message
    #[error("malformed cargo message on line {line}: {source}")]
    ArtifactParse {
        /// 1-based line number in cargo's stdout
        line: usize,
        /// JSON error
        #[source]
        source: serde_json::Error,
    },

    /// Exporter produced no coverage records
    #[error("coverage export produced no lcov records")]
    EmptyReport,

    /// Exporter output is not lcov
    #[error("coverage export output is not valid lcov: {message}")]
    InvalidReport {
        /// What was wrong
        message: String,
    },

    /// LLVM tool not present in the toolchain
    #[error("{tool} not found at {}; install it with `rustup component add llvm-tools`", .path.display())]
    LlvmToolMissing {
        /// Tool name
        tool: &'static str,
        /// Where it was expected
        path: PathBuf,
    },

    /// Configuration values are unusable
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Error message
        message: String,
    },

    /// Configuration file could not be loaded
    #[error("config file {}: {message}", .path.display())]
    ConfigFile {
        /// Config file path
        path: PathBuf,
        /// Error message
        message: String,
    },

    /// I/O error on a specific path
    #[error("{}: {source}", .path.display())]
    PathIo {
        /// Path being accessed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
}

fn describe_code(code: &Option<i32>) -> String {
    code.map_or_else(|| "no exit code (terminated by signal)".to_string(), |c| format!("status {c}"))
}

impl CovError {
    /// Create an invalid configuration error
    #[must_use]
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Wrap an I/O error with the path it occurred on
    #[must_use]
    pub fn path_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::PathIo {
            path: path.into(),
            source,
        }
    }

    /// Stage the error is attributed to, when it came from a tool
    #[must_use]
    pub const fn stage(&self) -> Option<Stage> {
        match self {
            Self::ToolSpawn { stage, .. } | Self::ToolFailed { stage, .. } => Some(*stage),
            Self::NoRawProfiles { .. } | Self::LlvmToolMissing { .. } => Some(Stage::Merge),
            Self::NoTestBinaries | Self::ArtifactParse { .. } => Some(Stage::Discover),
            Self::EmptyReport | Self::InvalidReport { .. } => Some(Stage::Export),
            _ => None,
        }
    }

    /// Exit code of the failing tool, if the error came from one
    #[must_use]
    pub const fn tool_exit_code(&self) -> Option<i32> {
        match self {
            Self::ToolFailed { code, .. } => *code,
            _ => None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_failed_message() {
        let err = CovError::ToolFailed {
            stage: Stage::Merge,
            command: "cargo profdata -- merge".to_string(),
            code: Some(3),
            stderr: String::new(),
        };
        let msg = err.to_string();
        assert!(msg.starts_with("merge:"));
        assert!(msg.contains("status 3"));
        assert_eq!(err.tool_exit_code(), Some(3));
    }

    #[test]
    fn test_tool_failed_signal() {
        let err = CovError::ToolFailed {
            stage: Stage::Test,
            command: "cargo test".to_string(),
            code: None,
            stderr: String::new(),
        };
        assert!(err.to_string().contains("signal"));
        assert_eq!(err.tool_exit_code(), None);
    }

    #[test]
    fn test_stage_attribution() {
        assert_eq!(CovError::NoTestBinaries.stage(), Some(Stage::Discover));
        assert_eq!(CovError::EmptyReport.stage(), Some(Stage::Export));
        assert_eq!(
            CovError::NoRawProfiles {
                root: PathBuf::from("."),
                pattern: "coverage-*.profraw".to_string(),
            }
            .stage(),
            Some(Stage::Merge)
        );
        assert_eq!(CovError::invalid_config("x").stage(), None);
    }

    #[test]
    fn test_llvm_tool_missing_mentions_component() {
        let err = CovError::LlvmToolMissing {
            tool: "llvm-cov",
            path: PathBuf::from("/sysroot/bin/llvm-cov"),
        };
        assert!(err.to_string().contains("llvm-tools"));
        assert_eq!(err.stage(), Some(Stage::Merge));
    }
}
