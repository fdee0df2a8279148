/*!
 * Common test utilities for the fabric-validator test suite
 */

use anyhow::Result;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use tempfile::TempDir;

use fabric_validator::app_config::{RunMode, ServerConfig};
use fabric_validator::server::{AppState, build_router};
use fabric_validator::tool::{HhfabTool, ValidationTool};
use fabric_validator::validation_service::ValidationService;


pub use mock_tool::ScriptedTool;

/// Output the scripted tool prints for a passing configuration
pub const VALID_OUTPUT: &str = "06:37:39 INF Hedgehog Fabricator version=v0.40.0\n\
06:37:39 INF Wiring hydrated successfully mode=if-not-present\n\
06:37:39 INF Fabricator config and wiring are valid\n";

pub const SAMPLE_WIRING: &str = "apiVersion: wiring.githedgehog.com/v1beta1
kind: VLANNamespace
metadata:
  name: default
spec:
  ranges:
  - from: 1000
    to: 2999
";

pub const SAMPLE_FAB: &str = "apiVersion: fabricator.githedgehog.com/v1beta1
kind: Fabricator
metadata:
  name: custom
";

/// Route test logs through env_logger once per test binary
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    std::fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Server configuration suitable for tests
pub fn test_config() -> ServerConfig {
    ServerConfig {
        mode: RunMode::Test,
        ..ServerConfig::default()
    }
}

/// A running server bound to an ephemeral local port
pub struct TestServer {
    pub addr: SocketAddr,
    pub http: reqwest::Client,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

/// Start the router around `tool` with the given configuration
pub async fn spawn_server(config: ServerConfig, tool: Arc<ScriptedTool>) -> Result<TestServer> {
    serve_tool(config, tool).await
}

/// Start the router around the real process invoker running the fake `hhfab`
#[cfg(unix)]
pub async fn spawn_hhfab_server(timeout: std::time::Duration) -> Result<TestServer> {
    let tool = HhfabTool::new(fake_hhfab().to_string_lossy(), timeout);
    serve_tool(test_config(), Arc::new(tool)).await
}

async fn serve_tool(config: ServerConfig, tool: Arc<dyn ValidationTool>) -> Result<TestServer> {
    init_logging();
    let service = ValidationService::new(tool, config.work_root.clone());
    let app = build_router(AppState::new(config, service));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move { axum::serve(listener, app).await.expect("serve app") });

    Ok(TestServer {
        addr,
        http: reqwest::Client::new(),
    })
}

/// Multipart form with the given uploads
pub fn upload_form(wiring: Option<&str>, fab: Option<&str>) -> reqwest::multipart::Form {
    let mut form = reqwest::multipart::Form::new();
    if let Some(wiring) = wiring {
        let part = reqwest::multipart::Part::text(wiring.to_string()).file_name("wiring.yaml");
        form = form.part("wiring", part);
    }
    if let Some(fab) = fab {
        let part = reqwest::multipart::Part::text(fab.to_string()).file_name("fab.yaml");
        form = form.part("fab", part);
    }
    form
}

/// Path of a shell script that mimics `hhfab init` and `hhfab validate`
///
/// Written once per test binary. Behaviour is keyed on words in the wiring
/// file: `invalid` reports an ERR line, `crash` fails without one, `sleep`
/// stalls for five seconds.
#[cfg(unix)]
pub fn fake_hhfab() -> PathBuf {
    static SCRIPT: OnceLock<PathBuf> = OnceLock::new();
    SCRIPT
        .get_or_init(|| {
            use std::os::unix::fs::PermissionsExt;

            let dir = std::env::temp_dir().join(format!("fake-hhfab-{}", std::process::id()));
            std::fs::create_dir_all(&dir).expect("create script dir");
            let path = dir.join("hhfab");
            std::fs::write(&path, FAKE_HHFAB_SCRIPT).expect("write script");
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
                .expect("chmod script");
            path
        })
        .clone()
}

/// Exact combined output of the fake `validate` step for a passing wiring
#[cfg(unix)]
pub const FAKE_VALID_OUTPUT: &str = "06:37:39 INF Hedgehog Fabricator version=v0.40.0\n\
06:37:39 INF Wiring hydrated successfully mode=if-not-present\n\
06:37:39 INF Fabricator config and wiring are valid\n";

/// Exact combined output of the fake `validate` step for an `invalid` wiring
#[cfg(unix)]
pub const FAKE_REJECTED_OUTPUT: &str = "06:37:39 INF Hedgehog Fabricator version=v0.40.0\n\
06:38:17 ERR validating: loading wiring: invalid object\n";

#[cfg(unix)]
const FAKE_HHFAB_SCRIPT: &str = r#"#!/bin/sh
case "$1" in
  init)
    echo "06:37:38 INF Fabricator dir initialized"
    printf 'kind: Fabricator\nmetadata:\n  name: default\n' > fab.yaml
    ;;
  validate)
    echo "06:37:39 INF Hedgehog Fabricator version=v0.40.0"
    if grep -q sleep include/wiring.yaml; then sleep 5; fi
    if grep -q invalid include/wiring.yaml; then
      echo "06:38:17 ERR validating: loading wiring: invalid object" >&2
      exit 1
    fi
    if grep -q crash include/wiring.yaml; then
      echo "segmentation fault" >&2
      exit 3
    fi
    if grep -q "name: custom" fab.yaml; then
      echo "06:37:39 INF Using custom fabricator config" >&2
    fi
    echo "06:37:39 INF Wiring hydrated successfully mode=if-not-present" >&2
    echo "06:37:39 INF Fabricator config and wiring are valid"
    ;;
  *)
    echo "unknown command: $1" >&2
    exit 64
    ;;
esac
"#;
