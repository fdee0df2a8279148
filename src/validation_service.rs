use log::{Level, debug, error, info, log_enabled, warn};
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

use crate::app_config::ServerConfig;
use crate::errors::ValidationError;
use crate::response::find_error_message;
use crate::tool::{HhfabTool, ToolStep, ValidationTool};
use crate::workflow::{ValidationRequest, ValidationResult, Verdict, WorkflowVariant};
use crate::workspace::Workspace;

// @module: Validation pipeline shared by both workflows

/// Runs one validation request end to end
///
/// Steps, in order:
/// 1. create an isolated workspace and stage the uploads
/// 2. `init --dev` inside `work/`
/// 3. move the uploads into place (replacing `fab.yaml` for two-file requests)
/// 4. `validate` and classify its exit status and output
///
/// The workspace is removed before this function returns, on every path.
/// Workspace file operations run on the blocking thread pool.
#[derive(Debug, Clone)]
pub struct ValidationService {
    // @field: Tool backend
    tool: Arc<dyn ValidationTool>,
    // @field: Parent directory for workspaces
    work_root: Option<PathBuf>,
}

impl ValidationService {
    /// Create a service around any tool backend
    pub fn new(tool: Arc<dyn ValidationTool>, work_root: Option<PathBuf>) -> Self {
        Self { tool, work_root }
    }

    /// Create the production service from the server configuration
    pub fn from_config(config: &ServerConfig) -> Self {
        let tool = HhfabTool::new(config.tool.clone(), config.timeout());
        Self::new(Arc::new(tool), config.work_root.clone())
    }

    /// Program name of the tool backend
    pub fn tool_program(&self) -> &str {
        self.tool.program()
    }

    /// Whether the tool backend can be started
    pub fn tool_available(&self) -> bool {
        self.tool.is_available()
    }

    /// Validate the uploaded files
    pub async fn validate(&self, request: ValidationRequest) -> Result<ValidationResult, ValidationError> {
        let request_id = Uuid::new_v4();
        let variant = request.variant();
        info!(
            "[{}] Validating {} request (wiring {} bytes, fab {} bytes)",
            request_id,
            variant,
            request.wiring.len(),
            request.fab.as_ref().map_or(0, |fab| fab.len())
        );

        let outcome = self.run_pipeline(&request, request_id).await;

        match &outcome {
            Ok(result) if result.succeeded() => info!("[{}] Configuration is valid", request_id),
            Ok(result) => {
                if let Verdict::Rejected { summary } = &result.verdict {
                    warn!("[{}] Configuration rejected: {}", request_id, summary);
                }
            }
            Err(e) if e.is_client_error() => warn!("[{}] {}", request_id, e),
            Err(e) => error!("[{}] {}", request_id, e),
        }

        outcome
    }

    async fn run_pipeline(
        &self,
        request: &ValidationRequest,
        request_id: Uuid,
    ) -> Result<ValidationResult, ValidationError> {
        let root = self.work_root.clone();
        let uploads = request.clone();
        let workspace = blocking(move || {
            let workspace = Workspace::create(root.as_deref())?;
            workspace.stage(&uploads)?;
            Ok(Arc::new(workspace))
        })
        .await?;

        let outcome = self.run_steps(&workspace, request.variant(), request_id).await;

        // Removing the tree is blocking too
        if let Err(e) = tokio::task::spawn_blocking(move || drop(workspace)).await {
            warn!("[{}] Workspace cleanup task failed: {}", request_id, e);
        }

        outcome
    }

    async fn run_steps(
        &self,
        workspace: &Arc<Workspace>,
        variant: WorkflowVariant,
        request_id: Uuid,
    ) -> Result<ValidationResult, ValidationError> {
        let work_dir = workspace.work_dir();

        let init = self.tool.run(ToolStep::Init, &work_dir).await?;
        if !init.success {
            return Err(ValidationError::InitFailed {
                program: self.tool.program().to_string(),
                exit_code: init.exit_code,
                output: init.output,
            });
        }

        let installed = workspace.clone();
        let staged_files = blocking(move || {
            installed.install(variant)?;
            Ok(log_enabled!(Level::Debug).then(|| installed.staged_files()))
        })
        .await?;
        if let Some(files) = staged_files {
            debug!("[{}] Workspace {:?} contains {:?}", request_id, workspace.path(), files);
        }

        let validate = self.tool.run(ToolStep::Validate, &work_dir).await?;
        if validate.success {
            return Ok(ValidationResult {
                variant,
                output: validate.output,
                verdict: Verdict::Passed,
            });
        }

        match find_error_message(&validate.output) {
            Some(summary) => Ok(ValidationResult {
                variant,
                output: validate.output,
                verdict: Verdict::Rejected { summary },
            }),
            None => Err(ValidationError::ToolCrashed {
                program: self.tool.program().to_string(),
                exit_code: validate.exit_code,
                output: validate.output,
            }),
        }
    }
}

/// Run filesystem work on the blocking pool
async fn blocking<F, T>(task: F) -> Result<T, ValidationError>
where
    F: FnOnce() -> Result<T, ValidationError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| ValidationError::Workspace(format!("workspace task failed: {}", e)))?
}
