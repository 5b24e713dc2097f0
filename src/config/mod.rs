//! Configuration handling for the email pipeline and its driver.
//!
//! Every knob has a development default that matches production behaviour,
//! so `PipelineConfig::default()` is what a caller normally wants. The
//! `from_env` constructors let a deployment override individual values with
//! `SLEUTH_*` environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

/// Environment variable names. Public so tests and wrappers can refer to them.
pub const ENV_GLOBAL_TIMEOUT_SECS: &str = "SLEUTH_GLOBAL_TIMEOUT_SECS";
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "SLEUTH_REQUEST_TIMEOUT_SECS";
pub const ENV_HOMEPAGE_RETRIES: &str = "SLEUTH_HOMEPAGE_RETRIES";
pub const ENV_CONTACT_PAGE_RETRIES: &str = "SLEUTH_CONTACT_PAGE_RETRIES";
pub const ENV_USER_AGENT: &str = "SLEUTH_USER_AGENT";
pub const ENV_RENDER_ENDPOINT: &str = "SLEUTH_RENDER_ENDPOINT";
pub const ENV_CONCURRENCY: &str = "SLEUTH_CONCURRENCY";
pub const ENV_LOG_JSON: &str = "SLEUTH_LOG_JSON";

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
pub const DEFAULT_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

const DEFAULT_GLOBAL_TIMEOUT: Duration = Duration::from_secs(45);
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_HOMEPAGE_RETRIES: u32 = 2;
const DEFAULT_CONTACT_PAGE_RETRIES: u32 = 1;
const DEFAULT_FIRST_BACKOFF: Duration = Duration::from_secs(1);
const DEFAULT_LATER_BACKOFF: Duration = Duration::from_secs(3);
const DEFAULT_MAX_BODY_BYTES: usize = 5 * 1024 * 1024; // 5MB
const DEFAULT_MAX_REDIRECTS: usize = 3;
const DEFAULT_MAX_RENDERED_CONTACT_PAGES: usize = 3;
const DEFAULT_CONCURRENCY: usize = 4;

/// Tunables for one email pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Upper bound on a whole run, all levels included.
    pub global_timeout: Duration,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    pub homepage_retries: u32,
    pub contact_page_retries: u32,
    /// Wait before the first retry.
    pub first_backoff: Duration,
    /// Wait before every retry after the first.
    pub later_backoff: Duration,
    /// Bytes read from a response before the rest is discarded.
    pub max_body_bytes: usize,
    pub max_redirects: usize,
    pub user_agent: String,
    pub accept: String,
    /// Contact pages rendered at the browser level.
    pub max_rendered_contact_pages: usize,
    /// Rendering service used for the browser level, if any.
    pub render_endpoint: Option<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            global_timeout: DEFAULT_GLOBAL_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            homepage_retries: DEFAULT_HOMEPAGE_RETRIES,
            contact_page_retries: DEFAULT_CONTACT_PAGE_RETRIES,
            first_backoff: DEFAULT_FIRST_BACKOFF,
            later_backoff: DEFAULT_LATER_BACKOFF,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            max_redirects: DEFAULT_MAX_REDIRECTS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept: DEFAULT_ACCEPT.to_string(),
            max_rendered_contact_pages: DEFAULT_MAX_RENDERED_CONTACT_PAGES,
            render_endpoint: None,
        }
    }
}

impl PipelineConfig {
    /// Load from environment variables, falling back to the defaults.
    ///
    /// Fails only when a variable is present but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let global_timeout = env_parse::<u64>(ENV_GLOBAL_TIMEOUT_SECS)?
            .map(Duration::from_secs)
            .unwrap_or(defaults.global_timeout);
        let request_timeout = env_parse::<u64>(ENV_REQUEST_TIMEOUT_SECS)?
            .map(Duration::from_secs)
            .unwrap_or(defaults.request_timeout);
        let homepage_retries =
            env_parse(ENV_HOMEPAGE_RETRIES)?.unwrap_or(defaults.homepage_retries);
        let contact_page_retries =
            env_parse(ENV_CONTACT_PAGE_RETRIES)?.unwrap_or(defaults.contact_page_retries);
        let user_agent = env::var(ENV_USER_AGENT).unwrap_or(defaults.user_agent);
        let render_endpoint = env::var(ENV_RENDER_ENDPOINT)
            .ok()
            .filter(|endpoint| !endpoint.trim().is_empty());

        if global_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: ENV_GLOBAL_TIMEOUT_SECS,
                reason: "must be greater than zero".to_string(),
            });
        }

        Ok(Self {
            global_timeout,
            request_timeout,
            homepage_retries,
            contact_page_retries,
            user_agent,
            render_endpoint,
            ..defaults
        })
    }
}

/// Settings for the command-line driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverConfig {
    pub pipeline: PipelineConfig,
    /// Targets processed at the same time.
    pub concurrency: usize,
    pub log_json: bool,
}

impl DriverConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let concurrency = env_parse(ENV_CONCURRENCY)?.unwrap_or(DEFAULT_CONCURRENCY);
        if concurrency == 0 {
            return Err(ConfigError::InvalidValue {
                field: ENV_CONCURRENCY,
                reason: "must be at least 1".to_string(),
            });
        }
        let log_json = env::var(ENV_LOG_JSON).is_ok_and(|v| v == "1" || v == "true");

        Ok(Self {
            pipeline: PipelineConfig::from_env()?,
            concurrency,
            log_json,
        })
    }
}

/// Errors that can occur while building a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for '{field}': {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

fn env_parse<T>(key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e: T::Err| ConfigError::InvalidValue {
                field: key,
                reason: e.to_string(),
            }),
        Err(_) => Ok(None),
    }
}
