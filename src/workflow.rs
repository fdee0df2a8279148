/*!
 * Request and result types for the two validation workflows.
 *
 * A request always carries the wiring diagram. When a fabricator config is
 * uploaded as well, the two-file workflow runs and the uploaded `fab.yaml`
 * replaces the generated default.
 */

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Which validation shape a request follows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WorkflowVariant {
    /// Wiring diagram only, validated against the default fabricator config
    #[serde(rename = "single-file", alias = "uc1")]
    SingleFile,
    /// Wiring diagram plus a user-provided fabricator config
    #[serde(rename = "two-file", alias = "uc2")]
    TwoFile,
}

impl WorkflowVariant {
    /// Wire tag reported in the `use_case` field
    pub fn tag(&self) -> &'static str {
        match self {
            Self::SingleFile => "single-file",
            Self::TwoFile => "two-file",
        }
    }
}

impl std::fmt::Display for WorkflowVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

/// Uploaded files for one validation
#[derive(Debug, Clone)]
pub struct ValidationRequest {
    /// Wiring diagram contents
    pub wiring: Bytes,
    /// Optional fabricator config contents
    pub fab: Option<Bytes>,
}

impl ValidationRequest {
    /// Request for the single-file workflow
    pub fn wiring_only(wiring: impl Into<Bytes>) -> Self {
        Self {
            wiring: wiring.into(),
            fab: None,
        }
    }

    /// Request for the two-file workflow
    pub fn with_fab(wiring: impl Into<Bytes>, fab: impl Into<Bytes>) -> Self {
        Self {
            wiring: wiring.into(),
            fab: Some(fab.into()),
        }
    }

    /// The workflow selected by the uploaded files
    pub fn variant(&self) -> WorkflowVariant {
        if self.fab.is_some() {
            WorkflowVariant::TwoFile
        } else {
            WorkflowVariant::SingleFile
        }
    }
}

/// What the validation tool concluded
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// The tool accepted the configuration
    Passed,
    /// The tool rejected the configuration and reported why
    Rejected {
        /// Error summary extracted from the tool output
        summary: String,
    },
}

/// Outcome of a completed validation run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    /// Workflow that ran
    pub variant: WorkflowVariant,
    /// Combined stdout/stderr of the validate step, verbatim
    pub output: String,
    /// Tool verdict
    pub verdict: Verdict,
}

impl ValidationResult {
    pub fn succeeded(&self) -> bool {
        self.verdict == Verdict::Passed
    }
}
