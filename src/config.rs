//! Server configuration parsed from environment variables.

use std::path::PathBuf;

use url::Url;

use crate::backend::ApiTimeouts;
use crate::backend::gotrue::{DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_REQUEST_TIMEOUT_SECS};

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_SITE_DIR: &str = "./site";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} required")]
    Missing { var: &'static str },
    #[error("invalid {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub supabase_url: Url,
    pub supabase_anon_key: String,
    pub port: u16,
    /// Public origin of this site, without a trailing slash.
    pub site_url: String,
    pub cookie_secure: bool,
    pub storage_key: String,
    pub timeouts: ApiTimeouts,
    pub site_dir: PathBuf,
}

impl AppConfig {
    /// Build typed config from the process environment.
    ///
    /// Required:
    /// - `SUPABASE_URL`
    /// - `SUPABASE_ANON_KEY`
    ///
    /// Optional:
    /// - `PORT`: default 3000
    /// - `SITE_URL`: default `http://localhost:<PORT>`
    /// - `COOKIE_SECURE`: default true when `SITE_URL` is https
    /// - `AUTH_STORAGE_KEY`: default `sb-<project-ref>-auth-token`
    /// - `AUTH_REQUEST_TIMEOUT_SECS`: default 30
    /// - `AUTH_CONNECT_TIMEOUT_SECS`: default 10
    /// - `SITE_DIR`: default `./site`
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`AppConfig::from_env`] over an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or malformed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let raw_url = required(&lookup, "SUPABASE_URL")?;
        let supabase_url = Url::parse(raw_url.trim())
            .map_err(|e| ConfigError::Invalid { var: "SUPABASE_URL", reason: e.to_string() })?;
        let supabase_anon_key = required(&lookup, "SUPABASE_ANON_KEY")?;

        let port = match lookup("PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|e| ConfigError::Invalid { var: "PORT", reason: e.to_string() })?,
            None => DEFAULT_PORT,
        };

        let site_url = lookup("SITE_URL")
            .unwrap_or_else(|| format!("http://localhost:{port}"))
            .trim()
            .trim_end_matches('/')
            .to_owned();
        let cookie_secure = env_bool(lookup("COOKIE_SECURE").as_deref()).unwrap_or_else(|| site_url.starts_with("https://"));

        let storage_key = lookup("AUTH_STORAGE_KEY").unwrap_or_else(|| default_storage_key(&supabase_url));
        let timeouts = ApiTimeouts {
            request_secs: env_parse(lookup("AUTH_REQUEST_TIMEOUT_SECS"), DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_secs: env_parse(lookup("AUTH_CONNECT_TIMEOUT_SECS"), DEFAULT_CONNECT_TIMEOUT_SECS),
        };
        let site_dir = lookup("SITE_DIR").map_or_else(|| PathBuf::from(DEFAULT_SITE_DIR), PathBuf::from);

        Ok(Self { supabase_url, supabase_anon_key, port, site_url, cookie_secure, storage_key, timeouts, site_dir })
    }
}

fn required(lookup: &impl Fn(&str) -> Option<String>, var: &'static str) -> Result<String, ConfigError> {
    lookup(var)
        .filter(|v| !v.trim().is_empty())
        .ok_or(ConfigError::Missing { var })
}

pub(crate) fn env_bool(raw: Option<&str>) -> Option<bool> {
    raw.and_then(|raw| match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    })
}

pub(crate) fn env_parse<T>(raw: Option<String>, default: T) -> T
where
    T: std::str::FromStr,
{
    raw.and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

/// `sb-<project-ref>-auth-token`, where the project ref is the first label of
/// the project host. Matches the hosted SDK's cookie name.
fn default_storage_key(project_url: &Url) -> String {
    let project_ref = project_url
        .host_str()
        .and_then(|host| host.split('.').next())
        .unwrap_or("local");
    format!("sb-{project_ref}-auth-token")
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
