//! Connection settings loaded from the environment
//!
//! Settings are read once into explicit structs that are handed to the
//! collaborator constructors. A `credentials.env` file can pre-populate the
//! environment; its absence is not an error.

use anyhow::{Context, Result};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::config::{
    CREDENTIAL_DOTENV_DIR_VAR, CREDENTIALS_FILE, DEFAULT_CREDENTIAL_DIR, DEFAULT_S3_REGION,
};
use crate::error::IngestError;

/// Location of the credentials dotenv file
///
/// The directory comes from `CREDENTIAL_DOTENV_DIR`, then `PWD`, then the
/// container default `/opt/app-root/src`.
pub fn credentials_dotenv_path() -> PathBuf {
    let dir = std::env::var(CREDENTIAL_DOTENV_DIR_VAR)
        .or_else(|_| std::env::var("PWD"))
        .unwrap_or_else(|_| DEFAULT_CREDENTIAL_DIR.to_string());
    PathBuf::from(dir).join(CREDENTIALS_FILE)
}

/// Load `credentials.env` into the process environment if it exists
///
/// Values in the file override variables that are already set. Returns the
/// path that was loaded, or `None` when there was no file.
pub fn load_credentials_dotenv() -> Result<Option<PathBuf>> {
    load_dotenv_file(&credentials_dotenv_path())
}

pub(crate) fn load_dotenv_file(path: &Path) -> Result<Option<PathBuf>> {
    if !path.is_file() {
        debug!(path = %path.display(), "no credentials file, using environment as is");
        return Ok(None);
    }
    dotenvy::from_path_override(path)
        .with_context(|| format!("Failed to load credentials from {}", path.display()))?;
    debug!(path = %path.display(), "loaded credentials file");
    Ok(Some(path.to_path_buf()))
}

fn required(
    lookup: &impl Fn(&str) -> Option<String>,
    prefix: &str,
    suffix: &str,
) -> Result<String, IngestError> {
    let name = format!("{prefix}_{suffix}");
    lookup(&name).ok_or(IngestError::MissingEnv(name))
}

/// Trino coordinator settings (`<PREFIX>_USER`, `_HOST`, `_PORT`, `_PASSWD`)
#[derive(Clone, PartialEq, Eq)]
pub struct TrinoConfig {
    pub user: String,
    pub host: String,
    pub port: u16,
    /// JWT sent as a bearer token
    pub password: String,
    pub http_scheme: String,
}

impl TrinoConfig {
    pub fn from_env(prefix: &str) -> Result<Self, IngestError> {
        Self::from_lookup(prefix, |name| std::env::var(name).ok())
    }

    pub fn from_lookup(
        prefix: &str,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, IngestError> {
        let port_var = format!("{prefix}_PORT");
        let port_raw = required(&lookup, prefix, "PORT")?;
        let port = port_raw
            .trim()
            .parse::<u16>()
            .map_err(|_| IngestError::InvalidEnv {
                name: port_var,
                value: port_raw.clone(),
            })?;

        Ok(Self {
            user: required(&lookup, prefix, "USER")?,
            host: required(&lookup, prefix, "HOST")?,
            port,
            password: required(&lookup, prefix, "PASSWD")?,
            http_scheme: "https".to_string(),
        })
    }
}

impl fmt::Debug for TrinoConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrinoConfig")
            .field("user", &self.user)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("password", &"<redacted>")
            .field("http_scheme", &self.http_scheme)
            .finish()
    }
}

/// S3-compatible object store settings
/// (`<PREFIX>_ENDPOINT`, `_ACCESS_KEY`, `_SECRET_KEY`, `_BUCKET`)
#[derive(Clone, PartialEq, Eq)]
pub struct S3Config {
    pub endpoint: String,
    pub access_key: String,
    pub secret_key: String,
    pub bucket: String,
    pub region: String,
}

impl S3Config {
    pub fn from_env(prefix: &str) -> Result<Self, IngestError> {
        Self::from_lookup(prefix, |name| std::env::var(name).ok())
    }

    /// `<PREFIX>_REGION` is optional and defaults to `us-east-1`, which most
    /// S3-compatible stores accept.
    pub fn from_lookup(
        prefix: &str,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, IngestError> {
        Ok(Self {
            endpoint: required(&lookup, prefix, "ENDPOINT")?,
            access_key: required(&lookup, prefix, "ACCESS_KEY")?,
            secret_key: required(&lookup, prefix, "SECRET_KEY")?,
            bucket: required(&lookup, prefix, "BUCKET")?,
            region: lookup(&format!("{prefix}_REGION"))
                .unwrap_or_else(|| DEFAULT_S3_REGION.to_string()),
        })
    }
}

impl fmt::Debug for S3Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("S3Config")
            .field("endpoint", &self.endpoint)
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .finish()
    }
}
