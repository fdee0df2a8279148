/*!
 * JSON envelopes returned by the validation service.
 *
 * The same types are used by the server to answer and by the CLI client to
 * decode, so both sides always agree on the wire format.
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::ValidationError;
use crate::workflow::{ValidationResult, Verdict, WorkflowVariant};

/// Token the validation tool prints on error log lines
pub const ERROR_MARKER: &str = "ERR";

/// Summary reported when a rejected run has no marker line
pub const UNKNOWN_ERROR: &str = "Unknown validation error";

/// The error summary on the first marker line, if the output has one
pub fn find_error_message(output: &str) -> Option<String> {
    let needle = format!("{} ", ERROR_MARKER);
    output
        .split('\n')
        .filter(|line| line.contains(ERROR_MARKER))
        .find_map(|line| line.find(&needle).map(|idx| line[idx + needle.len()..].trim().to_string()))
}

/// Pull a short error summary out of the tool output
///
/// Takes the first line containing the marker and returns the text after
/// `"ERR "` on it. Best effort: multi-line errors are not joined.
pub fn extract_error_message(output: &str) -> String {
    find_error_message(output).unwrap_or_else(|| UNKNOWN_ERROR.to_string())
}

/// Response body of `POST /validate`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidateResponse {
    pub success: bool,
    pub message: String,
    #[serde(default)]
    pub output: String,
    #[serde(default)]
    pub use_case: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ValidateResponse {
    /// Envelope for a run that reached a verdict
    pub fn from_result(result: &ValidationResult) -> Self {
        let error = match &result.verdict {
            Verdict::Passed => None,
            Verdict::Rejected { summary } => Some(summary.clone()),
        };

        Self {
            success: result.succeeded(),
            message: result.output.clone(),
            output: result.output.clone(),
            use_case: result.variant.tag().to_string(),
            error,
        }
    }

    /// Envelope for a request that never reached a verdict
    pub fn from_error(error: &ValidationError, variant: Option<WorkflowVariant>) -> Self {
        Self {
            success: false,
            message: error.summary().to_string(),
            output: error.output().unwrap_or_default().to_string(),
            use_case: variant.map(|v| v.tag().to_string()).unwrap_or_default(),
            error: Some(error.to_string()),
        }
    }
}

/// Response body of `GET /health` when the tool is available
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
}

/// Response body of `GET /health` when the tool is missing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnhealthyResponse {
    pub status: String,
    pub error: String,
}

/// Response body of `GET /`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InfoResponse {
    pub service: String,
    pub description: String,
    pub version: String,
    pub endpoints: Vec<String>,
}
