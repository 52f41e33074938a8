use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{bail, Context, Result};

pub const DEFAULT_UPSTREAM_BASE_URL: &str = "https://pokeapi.co/api/v2";

/// The single username/password pair allowed to obtain tokens.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

pub struct AppConfig {
    pub listen_addr: SocketAddr,
    pub jwt_secret: String,
    pub credentials: Credentials,
    pub upstream_base_url: String,
    pub upstream_timeout: Duration,
    pub log_format: LogFormat,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let listen_addr: SocketAddr = lookup("POKEGATE_ADDR")
            .unwrap_or_else(|| "0.0.0.0:5000".to_string())
            .parse()
            .context("invalid POKEGATE_ADDR")?;

        let jwt_secret = required(&lookup, "JWT_SECRET_KEY")?;
        let credentials = Credentials {
            username: required(&lookup, "USERNAMEAPI")?,
            password: required(&lookup, "PASSWORD")?,
        };

        let upstream_base_url = lookup("POKEAPI_BASE_URL")
            .filter(|raw| !raw.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_UPSTREAM_BASE_URL.to_string());

        let upstream_timeout = parse_duration(&lookup, "POKEGATE_UPSTREAM_TIMEOUT_SECONDS", 10)?;
        if upstream_timeout.is_zero() {
            bail!("POKEGATE_UPSTREAM_TIMEOUT_SECONDS must be greater than zero");
        }

        let log_format = parse_log_format(lookup("POKEGATE_LOG_FORMAT").as_deref())?;

        Ok(Self {
            listen_addr,
            jwt_secret,
            credentials,
            upstream_base_url,
            upstream_timeout,
            log_format,
        })
    }

    pub fn listen_addr(&self) -> SocketAddr {
        self.listen_addr
    }

    pub fn upstream_timeout(&self) -> Duration {
        self.upstream_timeout
    }
}

fn required<F: Fn(&str) -> Option<String>>(lookup: &F, key: &str) -> Result<String> {
    let value = lookup(key).with_context(|| format!("{key} must be set"))?;
    if value.is_empty() {
        bail!("{key} must not be empty");
    }
    Ok(value)
}

fn parse_duration<F: Fn(&str) -> Option<String>>(
    lookup: &F,
    key: &str,
    default_secs: u64,
) -> Result<Duration> {
    let raw = lookup(key).unwrap_or_else(|| default_secs.to_string());
    let secs: u64 = raw
        .parse()
        .with_context(|| format!("{key} must be an integer number of seconds"))?;

    Ok(Duration::from_secs(secs))
}

fn parse_log_format(raw: Option<&str>) -> Result<LogFormat> {
    match raw.map(str::trim).map(str::to_ascii_lowercase).as_deref() {
        None | Some("") | Some("text") => Ok(LogFormat::Text),
        Some("json") => Ok(LogFormat::Json),
        Some(other) => bail!("POKEGATE_LOG_FORMAT must be `text` or `json`, got `{other}`"),
    }
}
