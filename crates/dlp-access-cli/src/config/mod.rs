//! Configuration loading and resolution.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use dlp_access::client::DEFAULT_TIMEOUT_MS;
use dlp_access::facets::DEFAULT_SEARCH_URL;
use dlp_access::gateway::{DEFAULT_ARK_PREFIX, DEFAULT_READY_TIMEOUT_MS};
use dlp_access::{
    AccessError, ContentRegistry, FacetLinkRewriter, GatewayOptions, HttpTransport,
};

/// Env var naming the config file.
pub const CONFIG_ENV: &str = "DLP_ACCESS_CONFIG";
/// Env var overriding `api.endpoint`.
pub const ENDPOINT_ENV: &str = "DLP_API_ENDPOINT";
/// Env var overriding `api.api_key`.
pub const API_KEY_ENV: &str = "DLP_API_KEY";

const LOCAL_CONFIG: &str = "dlp-access.toml";

/// Errors raised while loading configuration.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("No data API endpoint configured (set api.endpoint or {ENDPOINT_ENV})")]
    MissingEndpoint,

    #[error(transparent)]
    Access(#[from] AccessError),
}

/// `[api]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub timeout_ms: u64,
    pub ready_timeout_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            ready_timeout_ms: DEFAULT_READY_TIMEOUT_MS,
        }
    }
}

/// `[site]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SiteSettings {
    pub name: String,
    pub url: String,
    pub search_url: String,
    pub ark_prefix: String,
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self {
            name: "Virginia Tech Digital Libraries".to_string(),
            url: "https://digitallibraries.lib.vt.edu".to_string(),
            search_url: DEFAULT_SEARCH_URL.to_string(),
            ark_prefix: DEFAULT_ARK_PREFIX.to_string(),
        }
    }
}

/// Full configuration file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AccessConfig {
    pub api: ApiConfig,
    pub site: SiteSettings,
    /// Section name -> CMS content id overrides.
    pub content: BTreeMap<String, String>,
}

impl AccessConfig {
    /// Parse a TOML document.
    pub fn from_toml(text: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply endpoint/key overrides; `None` keeps the file value.
    pub fn apply_overrides(&mut self, endpoint: Option<String>, api_key: Option<String>) {
        if let Some(endpoint) = endpoint.filter(|e| !e.trim().is_empty()) {
            self.api.endpoint = Some(endpoint);
        }
        if let Some(key) = api_key.filter(|k| !k.trim().is_empty()) {
            self.api.api_key = Some(key);
        }
    }

    /// Apply `DLP_API_ENDPOINT` / `DLP_API_KEY`.
    pub fn apply_env(&mut self) {
        self.apply_overrides(std::env::var(ENDPOINT_ENV).ok(), std::env::var(API_KEY_ENV).ok());
    }

    pub fn gateway_options(&self) -> GatewayOptions {
        GatewayOptions {
            ark_prefix: self.site.ark_prefix.clone(),
            ready_timeout: Duration::from_millis(self.api.ready_timeout_ms),
        }
    }

    pub fn content_registry(&self) -> Result<ContentRegistry, ConfigError> {
        Ok(ContentRegistry::from_overrides(
            self.content.iter().map(|(k, v)| (k.as_str(), v.as_str())),
        )?)
    }

    pub fn rewriter(&self) -> Result<FacetLinkRewriter, ConfigError> {
        Ok(FacetLinkRewriter::with_search_url(&self.site.search_url)?)
    }

    pub fn transport(&self) -> Result<HttpTransport, ConfigError> {
        let endpoint = self
            .api
            .endpoint
            .as_deref()
            .ok_or(ConfigError::MissingEndpoint)?;
        Ok(HttpTransport::from_endpoint(
            endpoint,
            self.api.api_key.clone(),
            self.api.timeout_ms,
        )?)
    }
}

/// Resolve the config file path.
pub fn resolve_config_path(explicit: Option<&str>) -> Option<PathBuf> {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .ok()
        .map(PathBuf::from);
    resolve_config_path_from(
        explicit,
        std::env::var(CONFIG_ENV).ok(),
        Path::new("."),
        home.as_deref(),
    )
}

/// Precedence: explicit path, then the env var, then `./dlp-access.toml`,
/// then `$HOME/.config/dlp-access/config.toml`.
pub fn resolve_config_path_from(
    explicit: Option<&str>,
    env_path: Option<String>,
    cwd: &Path,
    home: Option<&Path>,
) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(PathBuf::from(path));
    }

    if let Some(env_path) = env_path.filter(|p| !p.is_empty()) {
        return Some(PathBuf::from(env_path));
    }

    let local = cwd.join(LOCAL_CONFIG);
    if local.exists() {
        return Some(local);
    }

    let user = home?.join(".config/dlp-access/config.toml");
    user.exists().then_some(user)
}

/// Load configuration from `path` (defaults when `None`) and apply env
/// overrides.
pub fn load_config(path: Option<&Path>) -> Result<AccessConfig, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            tracing::debug!("Loaded config from {}", path.display());
            AccessConfig::from_toml(&text, path)?
        }
        None => AccessConfig::default(),
    };
    config.apply_env();
    Ok(config)
}
