//! Configuration for the lsync CLI and anything else embedding the
//! client.
//!
//! Settings come from the environment (`LIGHTSTEP_*` plus
//! `LS_DISABLE_RATE_LIMIT`), optionally overlaid with explicit overrides
//! such as CLI flags, and resolve into a ready-to-use [`Client`].

use figment::{Figment, providers::Serialized};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use lsync_api::client::PUBLIC_ENV;
use lsync_api::{Client, ClientIdentity, ClientOptions, RateLimit, TransportConfig};

pub const API_KEY_VAR: &str = "LIGHTSTEP_API_KEY";
pub const ORG_VAR: &str = "LIGHTSTEP_ORG";
pub const ENV_VAR: &str = "LIGHTSTEP_ENV";
pub const BASE_URL_VAR: &str = "LIGHTSTEP_API_BASE_URL";
pub const RATE_LIMIT_VAR: &str = "LIGHTSTEP_API_RATE_LIMIT";
pub const DISABLE_RATE_LIMIT_VAR: &str = "LS_DISABLE_RATE_LIMIT";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} must be set")]
    Missing { var: &'static str },

    #[error(transparent)]
    Api(#[from] lsync_api::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── Environment ─────────────────────────────────────────────────────

/// Environment settings, read verbatim.
///
/// figment's `Env` provider parses values (`0123` becomes `123`). Keys and
/// org names are opaque, so they are read as text and layered through
/// `Serialized`, which leaves strings alone.
#[derive(Debug, Default, Serialize, Deserialize)]
struct EnvSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    org: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    env: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    api_base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    api_rate_limit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    disable_rate_limit: Option<String>,
}

impl EnvSettings {
    /// Unset, empty, and non-UTF-8 variables all count as absent.
    fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());
        Self {
            api_key: var(API_KEY_VAR),
            org: var(ORG_VAR),
            env: var(ENV_VAR),
            api_base_url: var(BASE_URL_VAR),
            api_rate_limit: var(RATE_LIMIT_VAR),
            disable_rate_limit: var(DISABLE_RATE_LIMIT_VAR),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

// ── Overrides ───────────────────────────────────────────────────────

/// Values that take precedence over the environment, e.g. CLI flags.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Overrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub org: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub env: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base_url: Option<String>,
}

// ── Settings ────────────────────────────────────────────────────────

/// Resolved settings. Credentials stay optional until a client is built
/// so commands that never reach the network still work without them.
#[derive(Debug, Clone)]
pub struct Settings {
    pub api_key: Option<SecretString>,
    pub org: Option<String>,
    pub env: String,
    pub api_base_url: Option<String>,
    pub rate_limit: RateLimit,
}

impl Settings {
    /// Read settings from the process environment.
    pub fn load(overrides: &Overrides) -> Result<Self, ConfigError> {
        Self::from_figment(&layered(overrides))
    }

    pub fn from_figment(figment: &Figment) -> Result<Self, ConfigError> {
        let raw: EnvSettings = figment.extract()?;
        Ok(Self {
            api_key: non_empty(raw.api_key).map(SecretString::from),
            org: non_empty(raw.org),
            env: non_empty(raw.env).unwrap_or_else(|| PUBLIC_ENV.to_owned()),
            api_base_url: non_empty(raw.api_base_url),
            rate_limit: RateLimit {
                per_second: RateLimit::parse_per_second(raw.api_rate_limit.as_deref()),
                enabled: non_empty(raw.disable_rate_limit).is_none(),
            },
        })
    }

    pub fn identity(&self) -> Result<ClientIdentity, ConfigError> {
        let api_key = self
            .api_key
            .clone()
            .ok_or(ConfigError::Missing { var: API_KEY_VAR })?;
        let org = self
            .org
            .as_deref()
            .ok_or(ConfigError::Missing { var: ORG_VAR })?;
        Ok(ClientIdentity::new(
            api_key,
            org,
            &self.env,
            self.api_base_url.as_deref(),
        )?)
    }

    /// Build a client with these settings and the given transport knobs.
    pub fn build_client(&self, transport: TransportConfig) -> Result<Client, ConfigError> {
        let options = ClientOptions {
            rate_limit: self.rate_limit,
            transport,
            ..ClientOptions::default()
        };
        Ok(Client::new(self.identity()?, options)?)
    }
}

/// Environment layered under `overrides`.
pub fn layered(overrides: &Overrides) -> Figment {
    Figment::from(Serialized::defaults(EnvSettings::from_env()))
        .merge(Serialized::defaults(overrides))
}
