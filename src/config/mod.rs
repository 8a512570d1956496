use std::env;

use anyhow::{Context, Result};
use tracing::{info, warn};

/// Client configuration, read once at startup. No runtime reconfiguration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Origin of the conversion service, without the `/api/{version}` segment.
    pub api_url: String,
    pub api_version: String,
    pub upload_max_size_mb: u64,
    pub poll_interval_seconds: u64,
    pub request_timeout_seconds: u64,
    pub preview_enabled: bool,
    pub dark_mode: bool,
    /// Object storage origin and bucket, used only to construct display links.
    pub minio_endpoint: String,
    pub minio_bucket: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_url: "http://localhost:8000".to_string(),
            api_version: "v1".to_string(),
            upload_max_size_mb: 100,
            poll_interval_seconds: 5,
            request_timeout_seconds: 30,
            preview_enabled: false,
            dark_mode: false,
            minio_endpoint: "http://localhost:9000".to_string(),
            minio_bucket: "files".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        info!("Loading configuration from environment variables");

        let defaults = Config::default();
        let config = Config {
            api_url: env::var("API_URL").unwrap_or_else(|_| {
                info!("API_URL not set, using default: {}", defaults.api_url);
                defaults.api_url.clone()
            }),
            api_version: env::var("API_VERSION").unwrap_or_else(|_| {
                info!("API_VERSION not set, using default: {}", defaults.api_version);
                defaults.api_version.clone()
            }),
            upload_max_size_mb: Self::parse_env_var("UPLOAD_MAX_SIZE_MB", defaults.upload_max_size_mb)
                .context("Failed to parse UPLOAD_MAX_SIZE_MB")?,
            poll_interval_seconds: Self::parse_env_var("POLL_INTERVAL_SECONDS", defaults.poll_interval_seconds)
                .context("Failed to parse POLL_INTERVAL_SECONDS")?,
            request_timeout_seconds: Self::parse_env_var("REQUEST_TIMEOUT_SECONDS", defaults.request_timeout_seconds)
                .context("Failed to parse REQUEST_TIMEOUT_SECONDS")?,
            preview_enabled: Self::parse_env_var("ENABLE_FILE_PREVIEW", defaults.preview_enabled)
                .context("Failed to parse ENABLE_FILE_PREVIEW")?,
            dark_mode: Self::parse_env_var("ENABLE_DARK_MODE", defaults.dark_mode)
                .context("Failed to parse ENABLE_DARK_MODE")?,
            minio_endpoint: env::var("MINIO_ENDPOINT").unwrap_or_else(|_| {
                info!("MINIO_ENDPOINT not set, using default: {}", defaults.minio_endpoint);
                defaults.minio_endpoint.clone()
            }),
            minio_bucket: env::var("MINIO_BUCKET").unwrap_or_else(|_| {
                info!("MINIO_BUCKET not set, using default: {}", defaults.minio_bucket);
                defaults.minio_bucket.clone()
            }),
        };

        config.validate()?;

        info!("Configuration loaded successfully: {:?}", config);
        Ok(config)
    }

    fn parse_env_var<T>(var_name: &str, default: T) -> Result<T>
    where
        T: std::str::FromStr + Copy + std::fmt::Debug,
        T::Err: std::fmt::Display,
    {
        match env::var(var_name) {
            Ok(val) => match val.parse() {
                Ok(parsed) => Ok(parsed),
                Err(e) => {
                    warn!("Failed to parse {}: {} (using default: {:?})", var_name, e, default);
                    Ok(default)
                }
            },
            Err(_) => {
                info!("{} not set, using default: {:?}", var_name, default);
                Ok(default)
            }
        }
    }

    fn validate(&self) -> Result<()> {
        if self.api_url.is_empty() {
            return Err(anyhow::anyhow!("API_URL must not be empty"));
        }
        if self.api_version.is_empty() {
            return Err(anyhow::anyhow!("API_VERSION must not be empty"));
        }
        if self.upload_max_size_mb == 0 {
            return Err(anyhow::anyhow!("UPLOAD_MAX_SIZE_MB must be greater than 0"));
        }
        if self.poll_interval_seconds == 0 {
            return Err(anyhow::anyhow!("POLL_INTERVAL_SECONDS must be greater than 0"));
        }
        if self.request_timeout_seconds == 0 {
            return Err(anyhow::anyhow!("REQUEST_TIMEOUT_SECONDS must be greater than 0"));
        }
        Ok(())
    }

    /// Full URL for a service endpoint, e.g. `api_endpoint("/files/list")`.
    pub fn api_endpoint(&self, path: &str) -> String {
        format!("{}/api/{}{}", self.api_url, self.api_version, path)
    }

    /// Display link for an object stored by the conversion backend.
    pub fn storage_url(&self, object_path: &str) -> String {
        format!("{}/{}/{}", self.minio_endpoint, self.minio_bucket, object_path)
    }

    pub fn max_upload_bytes(&self) -> u64 {
        self.upload_max_size_mb * 1024 * 1024
    }
}
