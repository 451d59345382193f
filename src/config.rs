//! Command line and environment configuration.
//!
//! Every flag has a `PIXELBOARD_*` environment fallback; a `.env` file in the
//! working directory is loaded before parsing.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use canvas::consts::DEFAULT_COLOR;
use canvas::engine::Identity;
use clap::{Parser, Subcommand};

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:54321";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
const LIVE_PATH: &str = "/realtime/v1/pixels";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing API key; pass --api-key or set PIXELBOARD_API_KEY")]
    MissingApiKey,
    #[error("invalid base URL (expected http:// or https://): {0}")]
    InvalidBaseUrl(String),
    #[error("invalid viewport {width}x{height}")]
    InvalidViewport { width: String, height: String },
    #[error("{name} must be greater than zero")]
    InvalidTimeout { name: &'static str },
}

#[derive(Parser, Debug)]
#[command(name = "pixelboard", about = "Shared pixel board client")]
pub struct Cli {
    #[arg(long, env = "PIXELBOARD_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Live feed URL; derived from the base URL when absent.
    #[arg(long, env = "PIXELBOARD_LIVE_URL")]
    pub live_url: Option<String>,

    #[arg(long, env = "PIXELBOARD_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Signed-in user id. Without it the session is read-only.
    #[arg(long, env = "PIXELBOARD_USER_ID")]
    pub user_id: Option<String>,

    #[arg(long, env = "PIXELBOARD_USER_NAME")]
    pub user_name: Option<String>,

    #[arg(long, env = "PIXELBOARD_VIEWPORT_WIDTH", default_value_t = 1280.0)]
    pub viewport_width: f64,

    #[arg(long, env = "PIXELBOARD_VIEWPORT_HEIGHT", default_value_t = 800.0)]
    pub viewport_height: f64,

    #[arg(long, env = "PIXELBOARD_REQUEST_TIMEOUT_SECS", default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS)]
    pub request_timeout_secs: u64,

    #[arg(long, env = "PIXELBOARD_CONNECT_TIMEOUT_SECS", default_value_t = DEFAULT_CONNECT_TIMEOUT_SECS)]
    pub connect_timeout_secs: u64,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Sync the grid and log live placements until interrupted.
    Watch,
    /// Place one cell and wait for the store to accept it.
    Place {
        #[arg(long)]
        x: i32,
        #[arg(long)]
        y: i32,
        #[arg(long, default_value = DEFAULT_COLOR)]
        color: String,
    },
    /// Load the grid and print the initial viewport.
    Focus,
    /// Drive the interaction engine from a pointer script.
    Replay {
        #[arg(long, default_value = "-", help = "Script path, or - for stdin")]
        input: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

/// Validated connection settings for the HTTP store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub base_url: String,
    pub live_url: String,
    pub api_key: String,
    pub timeouts: StoreTimeouts,
}

impl StoreConfig {
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when the API key is missing, the base URL is
    /// not http(s), or a timeout is zero.
    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        let api_key = cli
            .api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or(ConfigError::MissingApiKey)?
            .to_owned();
        let base_url = cli.base_url.trim_end_matches('/').to_owned();
        let live_url = match &cli.live_url {
            Some(url) => url.clone(),
            None => live_url(&base_url)?,
        };
        if cli.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout { name: "request timeout" });
        }
        if cli.connect_timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout { name: "connect timeout" });
        }
        Ok(Self {
            base_url,
            live_url,
            api_key,
            timeouts: StoreTimeouts {
                request_secs: cli.request_timeout_secs,
                connect_secs: cli.connect_timeout_secs,
            },
        })
    }
}

impl Cli {
    /// The signed-in user, when a non-empty user id is configured.
    #[must_use]
    pub fn identity(&self) -> Option<Identity> {
        let id = self.user_id.as_deref().map(str::trim).filter(|id| !id.is_empty())?;
        Some(Identity::new(id, self.user_name.as_deref()))
    }

    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidViewport`] for non-finite or non-positive sizes.
    pub fn viewport(&self) -> Result<(f64, f64), ConfigError> {
        let (w, h) = (self.viewport_width, self.viewport_height);
        if !(w.is_finite() && h.is_finite() && w > 0.0 && h > 0.0) {
            return Err(ConfigError::InvalidViewport { width: w.to_string(), height: h.to_string() });
        }
        Ok((w, h))
    }
}

/// Live feed URL for an http(s) base URL.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidBaseUrl`] for any other scheme.
pub fn live_url(base_url: &str) -> Result<String, ConfigError> {
    let base_url = base_url.trim_end_matches('/');
    if let Some(rest) = base_url.strip_prefix("http://") {
        return Ok(format!("ws://{rest}{LIVE_PATH}"));
    }
    if let Some(rest) = base_url.strip_prefix("https://") {
        return Ok(format!("wss://{rest}{LIVE_PATH}"));
    }
    Err(ConfigError::InvalidBaseUrl(base_url.to_owned()))
}
