/*!
 * # fabric-validator - Hedgehog Open Network Fabric configuration validator
 *
 * An HTTP service and CLI client that validate fabric configuration files
 * with the external `hhfab` utility.
 *
 * ## Workflows
 *
 * - single-file: a wiring diagram, validated against the default fabricator
 *   config generated by `hhfab init --dev`
 * - two-file: a wiring diagram plus a user-provided `fab.yaml`
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Server configuration built from the environment
 * - `workflow`: Request, variant and result types
 * - `workspace`: Per-request temporary directory and file staging
 * - `tool`: External tool invocation (`ValidationTool`, `HhfabTool`)
 * - `validation_service`: The validation pipeline
 * - `response`: JSON envelopes and error summary extraction
 * - `server`: axum routes
 * - `client`: HTTP client used by the CLI
 * - `logging`: Console logger
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
#![allow(clippy::uninlined_format_args)]
#![cfg_attr(test, allow(non_snake_case))]

// Public modules
pub mod app_config;
pub mod client;
pub mod errors;
pub mod logging;
pub mod response;
pub mod server;
pub mod tool;
pub mod validation_service;
pub mod workflow;
pub mod workspace;

// Re-export main types for easier usage
pub use app_config::ServerConfig;
pub use errors::{ClientError, ConfigError, ValidationError};
pub use response::{ValidateResponse, extract_error_message};
pub use server::{AppState, build_router};
pub use tool::{HhfabTool, ToolOutput, ToolStep, ValidationTool};
pub use validation_service::ValidationService;
pub use workflow::{ValidationRequest, ValidationResult, Verdict, WorkflowVariant};
