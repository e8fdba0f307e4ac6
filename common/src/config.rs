use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub sampler: SamplerConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_frames_dir")]
    pub frames_dir: PathBuf,
    #[serde(default = "default_gifs_dir")]
    pub gifs_dir: PathBuf,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
    #[serde(default = "default_allowed_extensions")]
    pub allowed_extensions: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SamplerConfig {
    #[serde(default = "default_frames")]
    pub frames: u32,
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,
    /// Engine used when a request does not name one. Validated per request.
    #[serde(default = "default_browser")]
    pub default_browser: String,
    #[serde(default)]
    pub hash_algorithm: HashAlgorithm,
    #[serde(default = "default_hash_size")]
    pub hash_size: u32,
    /// Maximum Hamming distance still treated as "same frame". 0 means exact equality.
    #[serde(default)]
    pub distance_threshold: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// DCT-based perceptual hash.
    #[default]
    Phash,
    /// Mean-threshold average hash.
    Ahash,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BrowserConfig {
    #[serde(default = "default_chrome_webdriver_url")]
    pub chrome_webdriver_url: String,
    #[serde(default = "default_firefox_webdriver_url")]
    pub firefox_webdriver_url: String,
    #[serde(default = "default_headless")]
    pub headless: bool,
    pub window_width: Option<u32>,
    pub window_height: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            frames_dir: default_frames_dir(),
            gifs_dir: default_gifs_dir(),
            max_upload_bytes: default_max_upload_bytes(),
            allowed_extensions: default_allowed_extensions(),
        }
    }
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            frames: default_frames(),
            interval_ms: default_interval_ms(),
            settle_ms: default_settle_ms(),
            default_browser: default_browser(),
            hash_algorithm: HashAlgorithm::default(),
            hash_size: default_hash_size(),
            distance_threshold: 0,
        }
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            chrome_webdriver_url: default_chrome_webdriver_url(),
            firefox_webdriver_url: default_firefox_webdriver_url(),
            headless: default_headless(),
            window_width: None,
            window_height: None,
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadFile(path.display().to_string(), e))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// `host:port` for the HTTP listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {0}: {1}")]
    ReadFile(String, std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(String),
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    5000
}
fn default_frames_dir() -> PathBuf {
    PathBuf::from("static/images")
}
fn default_gifs_dir() -> PathBuf {
    PathBuf::from("static/gifs")
}
fn default_max_upload_bytes() -> usize {
    16 * 1024 * 1024
}
fn default_allowed_extensions() -> Vec<String> {
    vec!["gif".into()]
}
fn default_frames() -> u32 {
    20
}
fn default_interval_ms() -> u64 {
    1000
}
fn default_settle_ms() -> u64 {
    3000
}
fn default_browser() -> String {
    "chrome".into()
}
fn default_hash_size() -> u32 {
    8
}
fn default_chrome_webdriver_url() -> String {
    "http://localhost:9515".into()
}
fn default_firefox_webdriver_url() -> String {
    "http://localhost:4444".into()
}
fn default_headless() -> bool {
    true
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_log_level() -> String {
    "info".into()
}
