//! Persisted settings and credentials
//!
//! Settings live in `~/.datahub/config.json` and the login token in
//! `~/.datahub/credentials.json`. Environment variables take precedence over
//! persisted values when resolving the effective configuration.

use crate::error::{DataHubError, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_API_URL: &str = "http://localhost:3000";
pub const DEFAULT_REGION: &str = "ap-shanghai";

const CONFIG_FILE: &str = "config.json";
const CREDENTIALS_FILE: &str = "credentials.json";

/// Values persisted in `config.json`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StoredConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cos_secret_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cos_secret_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cos_region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cos_bucket: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cos_endpoint: Option<String>,
}

/// Values persisted in `credentials.json`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StoredCredentials {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

/// Object-store connection settings
#[derive(Debug, Clone, PartialEq)]
pub struct CosConfig {
    pub secret_id: String,
    pub secret_key: String,
    pub region: String,
    pub bucket: String,
    /// Endpoint host without scheme, e.g. `cos.ap-shanghai.myqcloud.com`
    pub endpoint_host: String,
}

impl CosConfig {
    /// Credentials and bucket are all present.
    pub fn is_configured(&self) -> bool {
        self.validate().is_ok()
    }

    pub fn validate(&self) -> Result<()> {
        if self.secret_id.trim().is_empty() || self.secret_key.trim().is_empty() {
            return Err(DataHubError::Configuration(
                "COS credentials not configured. Run 'datahub config cos' to set up.".to_string(),
            ));
        }
        if self.bucket.trim().is_empty() {
            return Err(DataHubError::Configuration(
                "COS bucket not configured. Run 'datahub config cos' to set up.".to_string(),
            ));
        }
        Ok(())
    }

    /// Secret id shortened for display
    pub fn masked_secret_id(&self) -> String {
        if self.secret_id.is_empty() {
            return "(not set)".to_string();
        }
        let prefix: String = self.secret_id.chars().take(8).collect();
        format!("{}...", prefix)
    }
}

pub fn default_endpoint_host(region: &str) -> String {
    format!("cos.{}.myqcloud.com", region)
}

/// Config directory: `DATAHUB_CONFIG_DIR` or `~/.datahub`
pub fn default_config_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os("DATAHUB_CONFIG_DIR") {
        return PathBuf::from(dir);
    }
    let home = std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    home.join(".datahub")
}

/// Settings store rooted at a config directory
#[derive(Debug, Clone)]
pub struct Settings {
    dir: PathBuf,
}

impl Settings {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn open_default() -> Self {
        Self::new(default_config_dir())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn load_config(&self) -> Result<StoredConfig> {
        read_json(&self.dir.join(CONFIG_FILE))
    }

    pub fn save_config(&self, config: &StoredConfig) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        write_json(&self.dir.join(CONFIG_FILE), config)
    }

    pub fn load_credentials(&self) -> Result<StoredCredentials> {
        read_json(&self.dir.join(CREDENTIALS_FILE))
    }

    pub fn save_credentials(&self, credentials: &StoredCredentials) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(CREDENTIALS_FILE);
        write_json(&path, credentials)?;
        restrict_permissions(&path)
    }

    pub fn api_url(&self) -> Result<String> {
        let stored = self.load_config()?;
        Ok(resolve_api_url(&stored, env_lookup))
    }

    pub fn set_api_url(&self, url: &str) -> Result<()> {
        let mut stored = self.load_config()?;
        stored.api_url = Some(url.trim_end_matches('/').to_string());
        self.save_config(&stored)
    }

    pub fn cos_config(&self) -> Result<CosConfig> {
        let stored = self.load_config()?;
        Ok(resolve_cos_config(&stored, env_lookup))
    }

    pub fn set_cos(
        &self,
        secret_id: &str,
        secret_key: &str,
        region: &str,
        bucket: &str,
        endpoint: Option<&str>,
    ) -> Result<()> {
        let mut stored = self.load_config()?;
        stored.cos_secret_id = Some(secret_id.to_string());
        stored.cos_secret_key = Some(secret_key.to_string());
        stored.cos_region = Some(region.to_string());
        stored.cos_bucket = Some(bucket.to_string());
        stored.cos_endpoint = endpoint.map(|e| e.to_string());
        self.save_config(&stored)
    }

    pub fn token(&self) -> Result<Option<String>> {
        Ok(self.load_credentials()?.token.filter(|t| !t.is_empty()))
    }

    pub fn set_token(&self, token: &str) -> Result<()> {
        let mut credentials = self.load_credentials()?;
        credentials.token = Some(token.to_string());
        self.save_credentials(&credentials)
    }

    pub fn clear_token(&self) -> Result<()> {
        let mut credentials = self.load_credentials()?;
        credentials.token = None;
        self.save_credentials(&credentials)
    }
}

fn env_lookup(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

/// Environment wins over the stored value, then the default applies.
fn pick<F>(lookup: &F, env: &str, stored: Option<&String>, default: &str) -> String
where
    F: Fn(&str) -> Option<String>,
{
    lookup(env)
        .or_else(|| stored.cloned())
        .unwrap_or_else(|| default.to_string())
}

pub fn resolve_api_url<F>(stored: &StoredConfig, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    pick(&lookup, "DATAHUB_API_URL", stored.api_url.as_ref(), DEFAULT_API_URL)
        .trim_end_matches('/')
        .to_string()
}

pub fn resolve_cos_config<F>(stored: &StoredConfig, lookup: F) -> CosConfig
where
    F: Fn(&str) -> Option<String>,
{
    let region = pick(&lookup, "COS_REGION", stored.cos_region.as_ref(), DEFAULT_REGION);
    let endpoint = lookup("COS_ENDPOINT")
        .or_else(|| stored.cos_endpoint.clone())
        .filter(|e| !e.trim().is_empty())
        .map(|e| strip_scheme(&e))
        .unwrap_or_else(|| default_endpoint_host(&region));

    CosConfig {
        secret_id: pick(&lookup, "COS_SECRET_ID", stored.cos_secret_id.as_ref(), ""),
        secret_key: pick(&lookup, "COS_SECRET_KEY", stored.cos_secret_key.as_ref(), ""),
        region,
        bucket: pick(&lookup, "COS_BUCKET", stored.cos_bucket.as_ref(), ""),
        endpoint_host: endpoint,
    }
}

fn strip_scheme(endpoint: &str) -> String {
    let trimmed = endpoint.trim().trim_end_matches('/');
    trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .unwrap_or(trimmed)
        .to_string()
}

fn read_json<T>(path: &Path) -> Result<T>
where
    T: serde::de::DeserializeOwned + Default,
{
    match std::fs::read_to_string(path) {
        Ok(text) => Ok(serde_json::from_str(&text)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("config_missing: {}", path.display());
            Ok(T::default())
        }
        Err(e) => Err(e.into()),
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value)?;
    std::fs::write(path, text)?;
    Ok(())
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    Ok(())
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<()> {
    Ok(())
}
