/*!
 * HTTP client for the validation service.
 *
 * Uploads local wiring and fabricator files as a multipart form, decodes
 * the JSON envelope and renders it for the terminal.
 */

use log::debug;
use reqwest::multipart::{Form, Part};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::errors::ClientError;
use crate::response::ValidateResponse;
use crate::server::{FAB_FIELD, WIRING_FIELD};

/// Default service location
pub const DEFAULT_SERVER_URL: &str = "http://localhost:8080";

/// Everything the client needs for one validation call
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Wiring diagram to upload
    pub wiring: PathBuf,
    /// Optional fabricator config to upload
    pub fab: Option<PathBuf>,
    /// Base URL of the service
    pub server_url: String,
    /// Whole-request timeout
    pub timeout: Duration,
    /// Print configuration, use case and full output
    pub verbose: bool,
}

impl ClientOptions {
    pub fn new(wiring: impl Into<PathBuf>) -> Self {
        Self {
            wiring: wiring.into(),
            fab: None,
            server_url: DEFAULT_SERVER_URL.to_string(),
            timeout: Duration::from_secs(30),
            verbose: false,
        }
    }

    /// Check that every given input file exists
    pub fn check_input_files(&self) -> Result<(), ClientError> {
        ensure_file("wiring", &self.wiring)?;
        if let Some(fab) = &self.fab {
            ensure_file("fab", fab)?;
        }
        Ok(())
    }

    /// Full URL of the validate endpoint
    pub fn validate_url(&self) -> Result<Url, ClientError> {
        let base = format!("{}/", self.server_url.trim_end_matches('/'));
        Url::parse(&base)
            .and_then(|url| url.join("validate"))
            .map_err(|e| ClientError::InvalidUrl(format!("{}: {}", self.server_url, e)))
    }

    /// Human-readable configuration summary shown in verbose mode
    pub fn describe(&self) -> String {
        let mut text = String::from("Configuration:\n");
        text.push_str(&format!("  Wiring file: {}\n", self.wiring.display()));
        if let Some(fab) = &self.fab {
            text.push_str(&format!("  Fab file: {}\n", fab.display()));
        }
        text.push_str(&format!("  Server URL: {}\n", self.server_url));
        text.push_str(&format!("  Timeout: {} seconds\n", self.timeout.as_secs()));
        text
    }
}

fn ensure_file(kind: &'static str, path: &Path) -> Result<(), ClientError> {
    if path.is_file() {
        Ok(())
    } else {
        Err(ClientError::InputFile {
            kind,
            path: path.display().to_string(),
        })
    }
}

/// Client for the validation service
#[derive(Debug)]
pub struct ValidatorClient {
    options: ClientOptions,
    http: reqwest::Client,
}

impl ValidatorClient {
    pub fn new(options: ClientOptions) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder().timeout(options.timeout).build()?;
        Ok(Self { options, http })
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Upload the files and decode the service's answer
    ///
    /// Non-2xx answers are still decoded: the service reports validation
    /// failures with an error status and a regular envelope.
    pub async fn validate(&self) -> Result<ValidateResponse, ClientError> {
        self.options.check_input_files()?;
        let url = self.options.validate_url()?;

        let mut form = Form::new().part(WIRING_FIELD, file_part("wiring", &self.options.wiring).await?);
        if let Some(fab) = &self.options.fab {
            form = form.part(FAB_FIELD, file_part("fab", fab).await?);
        }

        debug!("Making request to: {}", url);
        let response = self.http.post(url).multipart(form).send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        serde_json::from_slice::<ValidateResponse>(&body).map_err(|e| ClientError::InvalidResponse {
            status: status.as_u16(),
            message: e.to_string(),
        })
    }
}

async fn file_part(kind: &'static str, path: &Path) -> Result<Part, ClientError> {
    let content = tokio::fs::read(path).await.map_err(|_| ClientError::InputFile {
        kind,
        path: path.display().to_string(),
    })?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| format!("{}.yaml", kind));
    Ok(Part::bytes(content).file_name(file_name))
}

/// Render the envelope the way the CLI prints it
pub fn render_response(response: &ValidateResponse, verbose: bool) -> String {
    let mut text = String::new();
    if response.success {
        text.push_str(&format!("✓ {}\n", response.message));
        if verbose {
            text.push_str(&format!("\nUse case: {}\n", response.use_case));
            text.push_str(&format!("Output:\n{}\n", response.output));
        }
    } else {
        text.push_str(&format!("✗ {}\n", response.message));
        if let Some(error) = response.error.as_deref().filter(|e| !e.is_empty()) {
            text.push_str(&format!("Error: {}\n", error));
        }
        if verbose && !response.output.is_empty() {
            text.push_str(&format!("\nFull output:\n{}\n", response.output));
        }
        if verbose {
            text.push_str(&format!("\nUse case: {}\n", response.use_case));
        }
    }
    text
}
