//! Widget configuration.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Widget configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Backend endpoints.
    pub backend: BackendConfig,
    /// Map widget defaults.
    pub map: MapConfig,
    /// Lightbox behaviour.
    pub lightbox: LightboxConfig,
}

/// Where the crowdsourcing API lives.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Origin that relative endpoint paths are resolved against.
    pub base_url: String,
    /// Path segment the survey API is mounted under.
    pub api_prefix: String,
    /// Request timeout in seconds. `None` waits indefinitely.
    pub timeout_secs: Option<u64>,
    /// User agent string.
    pub user_agent: String,
}

/// Map widget configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// Highest zoom level the provider supports.
    pub max_zoom: u8,
    /// Map viewport width in pixels.
    pub viewport_width: u32,
    /// Map viewport height in pixels.
    pub viewport_height: u32,
    /// Image shown in the details panel while a submission loads.
    pub loading_image: String,
}

/// Lightbox configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LightboxConfig {
    /// Interval between image completion probes.
    pub poll_interval_ms: u64,
    /// Probes attempted before giving up.
    pub max_polls: u32,
    /// Reveal animation length.
    pub animate_ms: u64,
    /// Distance between the viewport top and the panel.
    pub top_offset: u32,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            api_prefix: "crowdsourcing".to_string(),
            timeout_secs: None,
            user_agent: "crowdsource-rs/0.1".to_string(),
        }
    }
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            max_zoom: 19,
            viewport_width: 500,
            viewport_height: 320,
            loading_image: "/media/img/loading.gif".to_string(),
        }
    }
}

impl Default for LightboxConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 100,
            max_polls: 600,
            animate_ms: 250,
            top_offset: 10,
        }
    }
}

impl BackendConfig {
    /// Path of a survey API endpoint, e.g. `/crowdsourcing/{slug}/api/questions/`.
    #[must_use]
    pub fn api_path(&self, slug: &str, endpoint: &str) -> String {
        let prefix = self.api_prefix.trim_matches('/');
        let endpoint = endpoint.trim_matches('/');
        format!("/{prefix}/{slug}/api/{endpoint}/")
    }

    /// Request timeout, if one is configured.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

impl LightboxConfig {
    /// Interval between completion probes.
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `.env` (via dotenvy, if present)
    /// 2. `config/default.toml`
    /// 3. `config/{environment}.toml` (based on `CROWDSOURCE_ENV`)
    /// 4. Environment variables with `CROWDSOURCE__` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();
        let env = std::env::var("CROWDSOURCE_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("CROWDSOURCE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("CROWDSOURCE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
