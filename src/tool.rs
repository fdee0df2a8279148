/*!
 * External validation tool invocation.
 *
 * The `ValidationTool` trait is the seam between the validation pipeline
 * and the process that actually checks the configuration:
 * - `HhfabTool`: runs the `hhfab` binary as a subprocess
 * - test suites provide scripted implementations
 */

use async_trait::async_trait;
use log::{debug, warn};
use std::fmt::Debug;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

use crate::errors::ValidationError;

/// One invocation of the validation tool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolStep {
    /// Generate a default working directory (`init --dev`)
    Init,
    /// Validate the working directory (`validate`)
    Validate,
}

impl ToolStep {
    /// Fixed command-line arguments for this step
    pub fn args(&self) -> &'static [&'static str] {
        match self {
            Self::Init => &["init", "--dev"],
            Self::Validate => &["validate"],
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Validate => "validate",
        }
    }
}

/// Captured result of a finished tool process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    /// Whether the process exited with status zero
    pub success: bool,
    /// Exit code, absent when the process was killed by a signal
    pub exit_code: Option<i32>,
    /// Combined stdout and stderr in write order
    pub output: String,
}

impl ToolOutput {
    /// Output of a process that exited with `exit_code`
    pub fn exited(exit_code: i32, output: impl Into<String>) -> Self {
        Self {
            success: exit_code == 0,
            exit_code: Some(exit_code),
            output: output.into(),
        }
    }
}

/// Common trait for validation tool backends
#[async_trait]
pub trait ValidationTool: Send + Sync + Debug {
    /// Program name used in logs and error messages
    fn program(&self) -> &str;

    /// Whether the tool can currently be started
    fn is_available(&self) -> bool;

    /// Run one step with `work_dir` as the current directory
    ///
    /// # Returns
    /// * `Ok(ToolOutput)` - the process ran to completion, whatever its exit status
    /// * `Err(ValidationError)` - the process could not be started or timed out
    async fn run(&self, step: ToolStep, work_dir: &Path) -> Result<ToolOutput, ValidationError>;
}

/// Process-backed `hhfab` invoker
#[derive(Debug, Clone)]
pub struct HhfabTool {
    /// Program name or path
    program: String,
    /// Per-invocation timeout
    timeout: Duration,
}

impl HhfabTool {
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    fn unavailable(&self) -> ValidationError {
        ValidationError::ToolUnavailable {
            program: self.program.clone(),
        }
    }
}

#[async_trait]
impl ValidationTool for HhfabTool {
    fn program(&self) -> &str {
        &self.program
    }

    fn is_available(&self) -> bool {
        locate_program(&self.program).is_some()
    }

    async fn run(&self, step: ToolStep, work_dir: &Path) -> Result<ToolOutput, ValidationError> {
        let program = locate_program(&self.program).ok_or_else(|| self.unavailable())?;

        // Both streams share one file so the capture keeps their interleaving
        let capture = tempfile::tempfile()
            .map_err(|e| ValidationError::Workspace(format!("create output capture: {}", e)))?;
        let stdout = capture.try_clone()?;
        let stderr = capture.try_clone()?;

        debug!("Running {:?} {} in {:?}", program, step.args().join(" "), work_dir);

        let mut child = Command::new(&program)
            .args(step.args())
            .current_dir(work_dir)
            .stdin(Stdio::null())
            .stdout(stdout)
            .stderr(stderr)
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                warn!("Failed to start {:?}: {}", program, e);
                self.unavailable()
            })?;

        let status = match tokio::time::timeout(self.timeout, child.wait()).await {
            Ok(status) => status?,
            Err(_) => {
                if let Err(e) = child.kill().await {
                    warn!("Failed to kill timed out {} {}: {}", self.program, step.name(), e);
                }
                return Err(ValidationError::ToolTimedOut {
                    program: self.program.clone(),
                    timeout_secs: self.timeout.as_secs(),
                });
            }
        };

        let output = tokio::task::spawn_blocking(move || read_capture(capture))
            .await
            .map_err(|e| ValidationError::Workspace(format!("read output capture: {}", e)))??;
        Ok(ToolOutput {
            success: status.success(),
            exit_code: status.code(),
            output,
        })
    }
}

fn read_capture(mut capture: File) -> Result<String, ValidationError> {
    let mut bytes = Vec::new();
    capture.seek(SeekFrom::Start(0))?;
    capture.read_to_end(&mut bytes)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Resolve a program name the way a shell would
///
/// Names containing a path separator are checked directly; bare names are
/// searched for in `PATH`.
pub fn locate_program(program: &str) -> Option<PathBuf> {
    let candidate = Path::new(program);
    if candidate.components().count() > 1 {
        // Absolute so the child's working directory does not change its meaning
        return is_executable(candidate)
            .then(|| candidate.canonicalize().ok())
            .flatten();
    }

    let paths = std::env::var_os("PATH")?;
    std::env::split_paths(&paths)
        .flat_map(|dir| executable_names(program).into_iter().map(move |name| dir.join(name)))
        .find(|path| is_executable(path))
}

#[cfg(windows)]
fn executable_names(program: &str) -> Vec<String> {
    vec![program.to_string(), format!("{}.exe", program)]
}

#[cfg(not(windows))]
fn executable_names(program: &str) -> Vec<String> {
    vec![program.to_string()]
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
