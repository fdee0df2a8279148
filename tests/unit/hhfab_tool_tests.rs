/*!
 * Tests for the process-backed tool against a scripted stand-in for hhfab
 */

#![cfg(unix)]

use anyhow::Result;
use std::fs;
use std::sync::Arc;
use std::time::{Duration, Instant};

use fabric_validator::errors::ValidationError;
use fabric_validator::tool::{HhfabTool, ToolStep, ValidationTool};
use fabric_validator::validation_service::ValidationService;
use fabric_validator::workflow::{ValidationRequest, Verdict, WorkflowVariant};

use crate::common;

fn fake_tool(timeout: Duration) -> HhfabTool {
    HhfabTool::new(common::fake_hhfab().to_string_lossy(), timeout)
}

fn service_with(tool: HhfabTool) -> ValidationService {
    ValidationService::new(Arc::new(tool), None)
}

#[tokio::test]
async fn test_run_withInit_shouldCreateDefaultFab() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let tool = fake_tool(Duration::from_secs(10));

    let output = tool.run(ToolStep::Init, temp_dir.path()).await?;

    assert!(output.success);
    assert_eq!(output.exit_code, Some(0));
    assert!(output.output.contains("Fabricator dir initialized"));
    assert!(fs::read_to_string(temp_dir.path().join("fab.yaml"))?.contains("name: default"));
    Ok(())
}

#[tokio::test]
async fn test_run_withValidate_shouldInterleaveStdoutAndStderr() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let tool = fake_tool(Duration::from_secs(10));
    tool.run(ToolStep::Init, temp_dir.path()).await?;
    fs::create_dir_all(temp_dir.path().join("include"))?;
    common::create_test_file(temp_dir.path(), "include/wiring.yaml", common::SAMPLE_WIRING)?;

    let output = tool.run(ToolStep::Validate, temp_dir.path()).await?;

    assert!(output.success);
    let version = output.output.find("Hedgehog Fabricator version").unwrap();
    let hydrated = output.output.find("Wiring hydrated successfully").unwrap();
    let valid = output.output.find("config and wiring are valid").unwrap();
    assert!(version < hydrated, "stdout line before stderr line");
    assert!(hydrated < valid, "stderr line before final stdout line");
    Ok(())
}

#[tokio::test]
async fn test_run_withSlowTool_shouldTimeOut() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    fs::create_dir_all(temp_dir.path().join("include"))?;
    common::create_test_file(temp_dir.path(), "include/wiring.yaml", "sleep")?;
    let tool = fake_tool(Duration::from_secs(1));

    let started = Instant::now();
    let err = tool.run(ToolStep::Validate, temp_dir.path()).await.unwrap_err();

    assert!(matches!(err, ValidationError::ToolTimedOut { timeout_secs: 1, .. }));
    assert!(started.elapsed() < Duration::from_secs(4));
    Ok(())
}

#[tokio::test]
async fn test_run_withNonExecutablePath_shouldReportUnavailable() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let script = common::create_test_file(temp_dir.path(), "hhfab", "#!/bin/sh\nexit 0\n")?;
    let tool = HhfabTool::new(script.to_string_lossy(), Duration::from_secs(1));

    let err = tool.run(ToolStep::Init, temp_dir.path()).await.unwrap_err();

    assert!(!tool.is_available());
    assert!(matches!(err, ValidationError::ToolUnavailable { .. }));
    Ok(())
}

#[tokio::test]
async fn test_validate_withSingleFile_shouldPass() -> Result<()> {
    let service = service_with(fake_tool(Duration::from_secs(10)));

    let result = service
        .validate(ValidationRequest::wiring_only(common::SAMPLE_WIRING))
        .await?;

    assert_eq!(result.variant, WorkflowVariant::SingleFile);
    assert_eq!(result.verdict, Verdict::Passed);
    assert!(result.output.contains("config and wiring are valid"));
    assert!(!result.output.contains("custom fabricator config"));
    Ok(())
}

#[tokio::test]
async fn test_validate_withTwoFiles_shouldUseUploadedFab() -> Result<()> {
    let service = service_with(fake_tool(Duration::from_secs(10)));

    let result = service
        .validate(ValidationRequest::with_fab(common::SAMPLE_WIRING, common::SAMPLE_FAB))
        .await?;

    assert_eq!(result.variant, WorkflowVariant::TwoFile);
    assert!(result.succeeded());
    assert!(result.output.contains("Using custom fabricator config"));
    Ok(())
}

#[tokio::test]
async fn test_validate_withInvalidWiring_shouldRejectWithSummary() -> Result<()> {
    let service = service_with(fake_tool(Duration::from_secs(10)));

    let result = service
        .validate(ValidationRequest::wiring_only("kind: invalid"))
        .await?;

    assert_eq!(
        result.verdict,
        Verdict::Rejected {
            summary: "validating: loading wiring: invalid object".to_string()
        }
    );
    assert!(result.output.contains("06:38:17 ERR validating"));
    Ok(())
}

#[tokio::test]
async fn test_validate_withCrashingTool_shouldReturnToolCrashed() -> Result<()> {
    let service = service_with(fake_tool(Duration::from_secs(10)));

    let err = service
        .validate(ValidationRequest::wiring_only("kind: crash"))
        .await
        .unwrap_err();

    match err {
        ValidationError::ToolCrashed { exit_code, output, .. } => {
            assert_eq!(exit_code, Some(3));
            assert!(output.contains("segmentation fault"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    Ok(())
}
