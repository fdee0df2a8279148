/*!
 * Error types for the fabric validator.
 *
 * This module contains the error taxonomy for the validation pipeline, the
 * CLI client and configuration loading, using the thiserror crate for
 * ergonomic error definitions.
 */

use thiserror::Error;

/// Errors that can occur while handling a single validation request
///
/// A tool run that completes and reports a rejected configuration is not an
/// error; it is a `Verdict::Rejected` result.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// The request body could not be read as a multipart form
    #[error("Malformed upload: {0}")]
    MalformedUpload(String),

    /// The required wiring upload is absent
    #[error("wiring file is required")]
    MissingRequiredFile,

    /// An uploaded file exceeds the configured size limit
    #[error("{field} file exceeds the {limit} byte limit")]
    FileTooLarge {
        /// Form field name of the upload
        field: String,
        /// Limit in bytes
        limit: usize,
    },

    /// Creating or writing the request workspace failed
    #[error("Workspace error: {0}")]
    Workspace(String),

    /// The validation tool could not be found or started
    #[error("{program} utility not available")]
    ToolUnavailable {
        /// Program name or path that was looked up
        program: String,
    },

    /// The workspace initialization step exited unsuccessfully
    #[error("{program} init failed with {}", describe_exit(.exit_code))]
    InitFailed {
        /// Program name
        program: String,
        /// Exit code, if the process exited normally
        exit_code: Option<i32>,
        /// Combined output of the init step
        output: String,
    },

    /// The tool did not finish within the configured timeout
    #[error("{program} did not finish within {timeout_secs}s")]
    ToolTimedOut {
        /// Program name
        program: String,
        /// Timeout in seconds
        timeout_secs: u64,
    },

    /// The tool failed without reporting a recognizable validation error
    #[error("{program} validate failed with {}", describe_exit(.exit_code))]
    ToolCrashed {
        /// Program name
        program: String,
        /// Exit code, if the process exited normally
        exit_code: Option<i32>,
        /// Combined output of the validate step
        output: String,
    },
}

impl ValidationError {
    /// True for errors caused by the caller's request rather than the service
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::MalformedUpload(_) | Self::MissingRequiredFile | Self::FileTooLarge { .. }
        )
    }

    /// Short fixed description used as the envelope message
    pub fn summary(&self) -> &'static str {
        match self {
            Self::MalformedUpload(_) => "Failed to parse multipart form",
            Self::MissingRequiredFile => "missing required file",
            Self::FileTooLarge { .. } => "Uploaded file is too large",
            Self::Workspace(_) => "Failed to prepare workspace",
            Self::ToolUnavailable { .. } => "Validation tool unavailable",
            Self::InitFailed { .. } => "Failed to initialize workspace",
            Self::ToolTimedOut { .. } => "Validation timed out",
            Self::ToolCrashed { .. } => "Validation tool failed unexpectedly",
        }
    }

    /// Captured tool output attached to this error, if any
    pub fn output(&self) -> Option<&str> {
        match self {
            Self::InitFailed { output, .. } | Self::ToolCrashed { output, .. } => Some(output),
            _ => None,
        }
    }
}

fn describe_exit(exit_code: &Option<i32>) -> String {
    match exit_code {
        Some(code) => format!("exit code {}", code),
        None => "no exit code (terminated by signal)".to_string(),
    }
}

impl From<std::io::Error> for ValidationError {
    fn from(error: std::io::Error) -> Self {
        Self::Workspace(error.to_string())
    }
}

/// Errors raised by the CLI client
#[derive(Error, Debug)]
pub enum ClientError {
    /// A local input file is missing or unreadable
    #[error("{kind} file does not exist: {path}")]
    InputFile {
        /// Which upload the file was meant for
        kind: &'static str,
        /// Path given on the command line
        path: String,
    },

    /// The server URL could not be used
    #[error("Invalid server URL: {0}")]
    InvalidUrl(String),

    /// The HTTP request failed
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The server answered with something that is not a validation envelope
    #[error("failed to parse response (HTTP {status}): {message}")]
    InvalidResponse {
        /// HTTP status code
        status: u16,
        /// Parser error
        message: String,
    },
}

/// Errors raised while building the server configuration
#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    /// A variable is present but cannot be parsed
    #[error("Invalid value for {name}: '{value}'")]
    InvalidValue {
        /// Variable name
        name: &'static str,
        /// Raw value
        value: String,
    },

    /// The parsed configuration is unusable
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
