use log::debug;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use walkdir::WalkDir;

use crate::errors::ValidationError;
use crate::workflow::{ValidationRequest, WorkflowVariant};

// @module: Per-request workspace for the validation tool

/// File name of the wiring diagram inside `work/include/`
pub const WIRING_FILE: &str = "wiring.yaml";

/// File name of the fabricator config inside `work/`
pub const FAB_FILE: &str = "fab.yaml";

const WORKSPACE_PREFIX: &str = "validator-";
const UPLOADS_DIR: &str = "uploads";
const WORK_DIR: &str = "work";
const INCLUDE_DIR: &str = "include";

/// Isolated directory tree for one validation request
///
/// Layout:
/// ```text
/// validator-XXXXXX/
///   uploads/wiring.yaml   staged before any tool runs
///   uploads/fab.yaml      two-file workflow only
///   work/                 tool working directory
///   work/include/         wiring diagram after install
/// ```
///
/// The whole tree is removed when the value is dropped.
#[derive(Debug)]
pub struct Workspace {
    // @field: Owning handle, deletes the tree on drop
    root: TempDir,
}

impl Workspace {
    /// Create a fresh workspace under `parent`, or the system temp dir
    pub fn create(parent: Option<&Path>) -> Result<Self, ValidationError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(WORKSPACE_PREFIX);

        let root = match parent {
            Some(parent) => {
                fs::create_dir_all(parent).map_err(|e| {
                    workspace_error("create workspace parent", parent, e)
                })?;
                builder.tempdir_in(parent)
            }
            None => builder.tempdir(),
        }
        .map_err(|e| ValidationError::Workspace(format!("create temporary directory: {}", e)))?;

        restrict_permissions(root.path())?;

        let workspace = Self { root };
        for dir in [workspace.uploads_dir(), workspace.work_dir()] {
            fs::create_dir(&dir).map_err(|e| workspace_error("create directory", &dir, e))?;
        }

        debug!("Created workspace {:?}", workspace.path());
        Ok(workspace)
    }

    /// Workspace root
    pub fn path(&self) -> &Path {
        self.root.path()
    }

    /// Directory the validation tool runs in
    pub fn work_dir(&self) -> PathBuf {
        self.root.path().join(WORK_DIR)
    }

    fn uploads_dir(&self) -> PathBuf {
        self.root.path().join(UPLOADS_DIR)
    }

    /// Final location of the wiring diagram
    pub fn wiring_path(&self) -> PathBuf {
        self.work_dir().join(INCLUDE_DIR).join(WIRING_FILE)
    }

    /// Final location of the fabricator config
    pub fn fab_path(&self) -> PathBuf {
        self.work_dir().join(FAB_FILE)
    }

    /// Write the uploads into the staging area
    pub fn stage(&self, request: &ValidationRequest) -> Result<(), ValidationError> {
        let wiring = self.uploads_dir().join(WIRING_FILE);
        fs::write(&wiring, &request.wiring)
            .map_err(|e| workspace_error("write wiring file", &wiring, e))?;

        if let Some(fab_bytes) = &request.fab {
            let fab = self.uploads_dir().join(FAB_FILE);
            fs::write(&fab, fab_bytes).map_err(|e| workspace_error("write fab file", &fab, e))?;
        }

        Ok(())
    }

    /// Move staged uploads into the initialized working directory
    ///
    /// For the two-file workflow the uploaded `fab.yaml` replaces whatever
    /// the init step generated.
    pub fn install(&self, variant: WorkflowVariant) -> Result<(), ValidationError> {
        let include = self.work_dir().join(INCLUDE_DIR);
        fs::create_dir_all(&include)
            .map_err(|e| workspace_error("create include directory", &include, e))?;

        let wiring = self.wiring_path();
        move_file(&self.uploads_dir().join(WIRING_FILE), &wiring)?;

        if variant == WorkflowVariant::TwoFile {
            let fab = self.fab_path();
            if fab.exists() {
                fs::remove_file(&fab)
                    .map_err(|e| workspace_error("remove default fab file", &fab, e))?;
            }
            move_file(&self.uploads_dir().join(FAB_FILE), &fab)?;
        }

        Ok(())
    }

    /// Files currently present under the working directory, relative to it
    pub fn staged_files(&self) -> Vec<PathBuf> {
        let work_dir = self.work_dir();
        let mut files: Vec<PathBuf> = WalkDir::new(&work_dir)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .filter_map(|entry| {
                entry
                    .path()
                    .strip_prefix(&work_dir)
                    .ok()
                    .map(Path::to_path_buf)
            })
            .collect();
        files.sort();
        files
    }
}

fn move_file(from: &Path, to: &Path) -> Result<(), ValidationError> {
    fs::rename(from, to).map_err(|e| workspace_error("move staged file", to, e))
}

fn workspace_error(action: &str, path: &Path, error: std::io::Error) -> ValidationError {
    ValidationError::Workspace(format!("{} {:?}: {}", action, path, error))
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<(), ValidationError> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o700))
        .map_err(|e| workspace_error("restrict permissions on", path, e))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<(), ValidationError> {
    Ok(())
}
