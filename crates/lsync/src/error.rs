//! CLI error types with miette diagnostics.
//!
//! Maps API, reconciler, and configuration failures into user-facing
//! errors with help text and a stable exit code.

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

use lsync_config::{API_KEY_VAR, ConfigError};
use lsync_core::CoreError;

pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach the Lightstep API at {url}")]
    #[diagnostic(
        code(lsync::connection_failed),
        help(
            "Check network access and LIGHTSTEP_ENV / LIGHTSTEP_API_BASE_URL.\n\
             Failed requests are retried with backoff before giving up."
        )
    )]
    ConnectionFailed {
        url: String,
        #[source]
        source: lsync_api::Error,
    },

    #[error("Request timed out after {seconds}s")]
    #[diagnostic(
        code(lsync::timeout),
        help("Increase the deadline with --timeout or retry later.")
    )]
    Timeout { seconds: u64 },

    #[error("Interrupted")]
    #[diagnostic(code(lsync::cancelled))]
    Cancelled,

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed (HTTP {status})")]
    #[diagnostic(
        code(lsync::auth_failed),
        help(
            "Verify LIGHTSTEP_API_KEY and that the key belongs to organization '{org}'.\n\
             Server said: {body}"
        )
    )]
    AuthFailed {
        status: i32,
        org: String,
        body: String,
    },

    #[error("{var} is not set")]
    #[diagnostic(
        code(lsync::no_credentials),
        help("Export {var} in the environment before running lsync.")
    )]
    NoCredentials { var: &'static str },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{kind} '{identifier}' not found")]
    #[diagnostic(
        code(lsync::not_found),
        help("Check the project name and identifier; objects may have been deleted outside lsync.")
    )]
    NotFound { kind: String, identifier: String },

    // ── API ──────────────────────────────────────────────────────────
    #[error("API error (HTTP {status})")]
    #[diagnostic(code(lsync::api_error), help("{message}"))]
    Api { status: i32, message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(lsync::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("{var} is not set")]
    #[diagnostic(
        code(lsync::missing_setting),
        help("Export {var} or pass the matching command-line flag.")
    )]
    MissingSetting { var: &'static str },

    #[error(transparent)]
    #[diagnostic(code(lsync::config))]
    Config(Box<figment::Error>),

    // ── IO / Serialization ───────────────────────────────────────────
    #[error("Could not read {}", .path.display())]
    #[diagnostic(code(lsync::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON definition in {}", .path.display())]
    #[diagnostic(
        code(lsync::json),
        help("The file must hold the declared attributes of one object.")
    )]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to render output: {0}")]
    #[diagnostic(code(lsync::render))]
    Render(#[source] serde_json::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Validation { .. } | Self::MissingSetting { .. } | Self::Json { .. } => {
                exit_code::USAGE
            }
            _ => exit_code::GENERAL,
        }
    }

    /// Attach the organization name to authentication failures, which
    /// are almost always a key issued for a different organization.
    pub fn with_org(self, org_name: &str) -> Self {
        match self {
            Self::AuthFailed { status, body, .. } => Self::AuthFailed {
                status,
                org: org_name.to_owned(),
                body,
            },
            other => other,
        }
    }
}

// ── Library errors → CliError ────────────────────────────────────────

impl From<lsync_api::Error> for CliError {
    fn from(err: lsync_api::Error) -> Self {
        use lsync_api::Error as Api;

        match err {
            Api::Timeout { timeout_secs, .. } => Self::Timeout {
                seconds: timeout_secs,
            },
            Api::Cancelled { .. } => Self::Cancelled,
            Api::Transport { ref url, .. } => Self::ConnectionFailed {
                url: url.to_string(),
                source: err,
            },
            Api::Rejected { ref url, .. } if err.is_not_found() => Self::NotFound {
                kind: "object".into(),
                identifier: url.to_string(),
            },
            Api::InvalidUrl(ref e) => Self::Validation {
                field: "url".into(),
                reason: e.to_string(),
            },
            ref rejected if rejected.is_auth_rejected() => Self::AuthFailed {
                status: rejected.status_code(),
                org: String::new(),
                body: rejected
                    .http_response()
                    .map(|resp| resp.body.to_owned())
                    .unwrap_or_default(),
            },
            other => Self::Api {
                status: other.status_code(),
                message: other.to_string(),
            },
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Api(api) => api.into(),
            CoreError::NotFound { kind, project, id } => Self::NotFound {
                kind: kind.into(),
                identifier: format!("{project}.{id}"),
            },
            err @ CoreError::InvalidImportReference { .. } => Self::Validation {
                field: "reference".into(),
                reason: err.to_string(),
            },
            err @ (CoreError::Untracked { .. } | CoreError::AlreadyCreated { .. }) => {
                Self::Validation {
                    field: "state".into(),
                    reason: err.to_string(),
                }
            }
            other => Self::Api {
                status: other.status_code(),
                message: other.to_string(),
            },
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Missing { var } if var == API_KEY_VAR => Self::NoCredentials { var },
            ConfigError::Missing { var } => Self::MissingSetting { var },
            ConfigError::Api(api) => api.into(),
            ConfigError::Figment(e) => Self::Config(e),
        }
    }
}
