//! Configuration management
//!
//! This module handles loading, saving, and migrating the pan configuration file.
//! The configuration file is stored in TOML format at ~/.config/pan/config.toml,
//! or under `$PAN_CONFIG_DIR` when that variable is set.
//!
//! PROTECTED FILE: Changes to schema_version require migration support.

use std::collections::BTreeMap;
use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

use humansize::{BINARY, format_size};
use serde::{Deserialize, Serialize};

use crate::coordinator::PollPolicy;
use crate::error::{Error, Result};
use crate::resolver::MatchPolicy;
use crate::scope::Scope;

/// Current configuration schema version
///
/// IMPORTANT: Bumping this version requires:
/// 1. Adding a migration in `ConfigManager::migrate`
/// 2. Updating migration tests
/// 3. Marking the change as BREAKING
pub const SCHEMA_VERSION: u32 = 1;

/// Environment variable overriding the config directory
pub const CONFIG_DIR_ENV: &str = "PAN_CONFIG_DIR";

pub const DEFAULT_WEB_URL: &str = "https://cloud.189.cn";
pub const DEFAULT_API_URL: &str = "https://api.cloud.189.cn";

const KB: u64 = 1024;

/// Accepted range of `poll.multiplier`
const MULTIPLIER_RANGE: std::ops::RangeInclusive<f64> = 1.0..=10.0;

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Schema version for migration support
    pub schema_version: u32,

    /// Base url of the personal-space web API
    #[serde(default = "default_web_url")]
    pub web_url: String,

    /// Base url of the family-space API
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Working directory for relative paths in the personal space
    #[serde(default = "default_workdir")]
    pub workdir: String,

    /// Working directory for relative paths in family spaces
    #[serde(default = "default_workdir")]
    pub family_workdir: String,

    /// How path segments are matched against child names
    #[serde(default)]
    pub match_policy: MatchPolicy,

    /// Paths resolved at once by a batch command
    #[serde(default = "default_resolve_concurrency")]
    pub resolve_concurrency: usize,

    /// Download buffer size in bytes
    #[serde(default = "default_cache_size")]
    pub cache_size: u64,

    #[serde(default = "default_download_parallel")]
    pub max_download_parallel: u32,

    #[serde(default = "default_upload_parallel")]
    pub max_upload_parallel: u32,

    /// Files downloaded at the same time
    #[serde(default = "default_download_load")]
    pub max_download_load: u32,

    /// Bytes per second, 0 for unlimited
    #[serde(default)]
    pub max_download_rate: u64,

    /// Bytes per second, 0 for unlimited
    #[serde(default)]
    pub max_upload_rate: u64,

    /// Local directory for downloads
    #[serde(default)]
    pub savedir: String,

    /// http, https or socks5 proxy url
    #[serde(default)]
    pub proxy: String,

    /// Comma separated local addresses to bind outgoing connections to
    #[serde(default)]
    pub local_addrs: String,

    #[serde(default)]
    pub poll: PollConfig,

    #[serde(default)]
    pub transport: TransportSettings,

    /// Default settings
    #[serde(default)]
    pub defaults: Defaults,
}

/// Polling schedule for batch tasks, in milliseconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    pub initial_delay_ms: u64,
    pub interval_ms: u64,
    pub max_interval_ms: u64,
    pub multiplier: f64,
    pub timeout_ms: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        let policy = PollPolicy::default();
        Self {
            initial_delay_ms: policy.initial_delay.as_millis() as u64,
            interval_ms: policy.interval.as_millis() as u64,
            max_interval_ms: policy.max_interval.as_millis() as u64,
            multiplier: policy.multiplier,
            timeout_ms: policy.timeout.as_millis() as u64,
        }
    }
}

impl PollConfig {
    pub fn to_policy(&self) -> PollPolicy {
        PollPolicy {
            initial_delay: Duration::from_millis(self.initial_delay_ms),
            interval: Duration::from_millis(self.interval_ms),
            max_interval: Duration::from_millis(self.max_interval_ms.max(self.interval_ms)),
            multiplier: self.multiplier,
            timeout: Duration::from_millis(self.timeout_ms),
        }
    }
}

/// HTTP client settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportSettings {
    pub connect_timeout_ms: u64,
    pub request_timeout_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    /// Extra headers sent with every request (session cookies, tokens)
    pub headers: BTreeMap<String, String>,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            connect_timeout_ms: 10_000,
            request_timeout_ms: 30_000,
            user_agent: None,
            headers: BTreeMap::new(),
        }
    }
}

/// Output format used when `--json` is not given
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Human,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "human" => Ok(OutputFormat::Human),
            "json" => Ok(OutputFormat::Json),
            other => Err(Error::InvalidInput(format!(
                "unknown output format '{other}', expected human or json"
            ))),
        }
    }
}

/// When to color human output
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    /// Color when the terminal supports it
    #[default]
    Auto,
    Always,
    Never,
}

impl std::str::FromStr for ColorMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "auto" => Ok(ColorMode::Auto),
            "always" => Ok(ColorMode::Always),
            "never" => Ok(ColorMode::Never),
            other => Err(Error::InvalidInput(format!(
                "unknown color mode '{other}', expected auto, always or never"
            ))),
        }
    }
}

/// Output settings applied when no flag overrides them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Defaults {
    #[serde(default)]
    pub output: OutputFormat,

    #[serde(default)]
    pub color: ColorMode,

    /// Show spinners while batch tasks run
    #[serde(default = "default_true")]
    pub progress: bool,
}

fn default_true() -> bool {
    true
}

fn default_web_url() -> String {
    DEFAULT_WEB_URL.to_string()
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_workdir() -> String {
    "/".to_string()
}

fn default_resolve_concurrency() -> usize {
    1
}

fn default_cache_size() -> u64 {
    64 * KB
}

fn default_download_parallel() -> u32 {
    10
}

fn default_upload_parallel() -> u32 {
    10
}

fn default_download_load() -> u32 {
    1
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: OutputFormat::Human,
            color: ColorMode::Auto,
            progress: true,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            web_url: default_web_url(),
            api_url: default_api_url(),
            workdir: default_workdir(),
            family_workdir: default_workdir(),
            match_policy: MatchPolicy::default(),
            resolve_concurrency: default_resolve_concurrency(),
            cache_size: default_cache_size(),
            max_download_parallel: default_download_parallel(),
            max_upload_parallel: default_upload_parallel(),
            max_download_load: default_download_load(),
            max_download_rate: 0,
            max_upload_rate: 0,
            savedir: String::new(),
            proxy: String::new(),
            local_addrs: String::new(),
            poll: PollConfig::default(),
            transport: TransportSettings::default(),
            defaults: Defaults::default(),
        }
    }
}

/// One row of `config show`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigEntry {
    pub key: &'static str,
    pub value: String,
    pub recommended: &'static str,
    pub description: &'static str,
}

impl Config {
    /// Working directory used for relative paths in `scope`
    pub fn workdir_for(&self, scope: Scope) -> &str {
        if scope.is_family() {
            &self.family_workdir
        } else {
            &self.workdir
        }
    }

    pub fn set_workdir(&mut self, scope: Scope, path: impl Into<String>) {
        if scope.is_family() {
            self.family_workdir = path.into();
        } else {
            self.workdir = path.into();
        }
    }

    /// Parsed `local_addrs`, empty entries skipped
    pub fn local_addr_list(&self) -> Result<Vec<IpAddr>> {
        self.local_addrs
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse::<IpAddr>()
                    .map_err(|_| Error::Config(format!("invalid local address '{s}'")))
            })
            .collect()
    }

    /// Check cross-field constraints after loading
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.web_url)?;
        url::Url::parse(&self.api_url)?;
        if !self.proxy.is_empty() {
            validate_proxy(&self.proxy)?;
        }
        self.local_addr_list()?;
        if self.resolve_concurrency == 0 {
            return Err(Error::Config("resolve_concurrency must be at least 1".into()));
        }
        if self.poll.timeout_ms == 0 {
            return Err(Error::Config("poll.timeout_ms must be positive".into()));
        }
        if !MULTIPLIER_RANGE.contains(&self.poll.multiplier) {
            return Err(Error::Config(format!(
                "poll.multiplier must be between 1 and 10, got {}",
                self.poll.multiplier
            )));
        }
        Ok(())
    }

    /// Set one key from its user-facing string form
    pub fn set_key(&mut self, key: &str, value: &str) -> Result<()> {
        let value = value.trim();
        match key {
            "cache_size" => {
                self.cache_size = in_range(key, parse_size_str(value)?, KB, 256 * KB)?;
            }
            "max_download_parallel" => {
                self.max_download_parallel = in_range(key, parse_number(key, value)?, 1, 64)?;
            }
            "max_upload_parallel" => {
                self.max_upload_parallel = in_range(key, parse_number(key, value)?, 1, 100)?;
            }
            "max_download_load" => {
                self.max_download_load = in_range(key, parse_number(key, value)?, 1, 5)?;
            }
            "max_download_rate" => self.max_download_rate = parse_rate_str(value)?,
            "max_upload_rate" => self.max_upload_rate = parse_rate_str(value)?,
            "savedir" => self.savedir = value.to_string(),
            "proxy" => {
                if !value.is_empty() {
                    validate_proxy(value)?;
                }
                self.proxy = value.to_string();
            }
            "local_addrs" => {
                let previous = std::mem::replace(&mut self.local_addrs, value.to_string());
                if let Err(e) = self.local_addr_list() {
                    self.local_addrs = previous;
                    return Err(e);
                }
            }
            "web_url" => {
                url::Url::parse(value)?;
                self.web_url = value.trim_end_matches('/').to_string();
            }
            "api_url" => {
                url::Url::parse(value)?;
                self.api_url = value.trim_end_matches('/').to_string();
            }
            "match_policy" => self.match_policy = value.parse()?,
            "resolve_concurrency" => {
                self.resolve_concurrency = in_range(key, parse_number(key, value)?, 1, 32)?;
            }
            "poll.initial_delay_ms" => self.poll.initial_delay_ms = parse_number(key, value)?,
            "poll.interval_ms" => {
                self.poll.interval_ms = in_range(key, parse_number(key, value)?, 1, u64::MAX)?;
            }
            "poll.max_interval_ms" => {
                self.poll.max_interval_ms = in_range(key, parse_number(key, value)?, 1, u64::MAX)?;
            }
            "poll.multiplier" => {
                let multiplier: f64 = parse_number(key, value)?;
                if !MULTIPLIER_RANGE.contains(&multiplier) {
                    return Err(Error::InvalidInput(format!(
                        "{key} must be between 1 and 10, got {value}"
                    )));
                }
                self.poll.multiplier = multiplier;
            }
            "poll.timeout_ms" => {
                self.poll.timeout_ms = in_range(key, parse_number(key, value)?, 1, u64::MAX)?;
            }
            "transport.connect_timeout_ms" => {
                self.transport.connect_timeout_ms = parse_number(key, value)?;
            }
            "transport.request_timeout_ms" => {
                self.transport.request_timeout_ms = parse_number(key, value)?;
            }
            "defaults.output" => self.defaults.output = value.parse()?,
            "defaults.color" => self.defaults.color = value.parse()?,
            "defaults.progress" => {
                self.defaults.progress = value.parse().map_err(|_| {
                    Error::InvalidInput(format!("{key} must be true or false, got {value}"))
                })?;
            }
            "transport.user_agent" => {
                self.transport.user_agent = (!value.is_empty()).then(|| value.to_string());
            }
            _ => {
                return Err(Error::InvalidInput(format!("unknown config key '{key}'")));
            }
        }
        Ok(())
    }

    /// Rows for `config show`
    pub fn entries(&self) -> Vec<ConfigEntry> {
        vec![
            ConfigEntry {
                key: "cache_size",
                value: format_size(self.cache_size, BINARY),
                recommended: "1KB ~ 256KB",
                description: "Download buffer, raise it if disk usage is high or downloads are slow",
            },
            ConfigEntry {
                key: "max_download_parallel",
                value: self.max_download_parallel.to_string(),
                recommended: "1 ~ 64",
                description: "Maximum concurrent download connections",
            },
            ConfigEntry {
                key: "max_upload_parallel",
                value: self.max_upload_parallel.to_string(),
                recommended: "1 ~ 100",
                description: "Maximum files uploaded at the same time",
            },
            ConfigEntry {
                key: "max_download_load",
                value: self.max_download_load.to_string(),
                recommended: "1 ~ 5",
                description: "Maximum files downloaded at the same time",
            },
            ConfigEntry {
                key: "max_download_rate",
                value: format_rate(self.max_download_rate),
                recommended: "",
                description: "Download speed limit, 0 for unlimited",
            },
            ConfigEntry {
                key: "max_upload_rate",
                value: format_rate(self.max_upload_rate),
                recommended: "",
                description: "Upload speed limit, 0 for unlimited",
            },
            ConfigEntry {
                key: "savedir",
                value: self.savedir.clone(),
                recommended: "",
                description: "Directory downloaded files are stored in",
            },
            ConfigEntry {
                key: "proxy",
                value: self.proxy.clone(),
                recommended: "",
                description: "http or socks5 proxy, e.g. http://127.0.0.1:8888",
            },
            ConfigEntry {
                key: "local_addrs",
                value: self.local_addrs.clone(),
                recommended: "",
                description: "Local network addresses to bind, comma separated",
            },
            ConfigEntry {
                key: "match_policy",
                value: match self.match_policy {
                    MatchPolicy::CaseSensitive => "case_sensitive".to_string(),
                    MatchPolicy::CaseInsensitive => "case_insensitive".to_string(),
                },
                recommended: "case_sensitive",
                description: "How path segments are matched against file names",
            },
            ConfigEntry {
                key: "resolve_concurrency",
                value: self.resolve_concurrency.to_string(),
                recommended: "1 ~ 32",
                description: "Paths resolved at once by rm, mv and cp",
            },
            ConfigEntry {
                key: "defaults.output",
                value: match self.defaults.output {
                    OutputFormat::Human => "human".to_string(),
                    OutputFormat::Json => "json".to_string(),
                },
                recommended: "human",
                description: "Output format when --json is not given",
            },
            ConfigEntry {
                key: "defaults.color",
                value: match self.defaults.color {
                    ColorMode::Auto => "auto".to_string(),
                    ColorMode::Always => "always".to_string(),
                    ColorMode::Never => "never".to_string(),
                },
                recommended: "auto",
                description: "When to color human output, --no-color wins",
            },
            ConfigEntry {
                key: "defaults.progress",
                value: self.defaults.progress.to_string(),
                recommended: "true",
                description: "Show a spinner while batch tasks run",
            },
            ConfigEntry {
                key: "poll.timeout_ms",
                value: self.poll.timeout_ms.to_string(),
                recommended: "",
                description: "How long to wait for a batch task to finish",
            },
        ]
    }
}

fn validate_proxy(proxy: &str) -> Result<()> {
    let url = url::Url::parse(proxy)?;
    match url.scheme() {
        "http" | "https" | "socks5" | "socks5h" => Ok(()),
        other => Err(Error::Config(format!(
            "unsupported proxy scheme '{other}', expected http, https or socks5"
        ))),
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| Error::InvalidInput(format!("{key} expects a number, got '{value}'")))
}

fn in_range<T: PartialOrd + std::fmt::Display>(key: &str, value: T, min: T, max: T) -> Result<T> {
    if value < min || value > max {
        return Err(Error::InvalidInput(format!(
            "{key} must be between {min} and {max}, got {value}"
        )));
    }
    Ok(value)
}

/// Parse a human size string such as `64KB`, `1.5 MB` or `1024`
///
/// Units are binary (1KB = 1024 bytes). A bare number is bytes.
pub fn parse_size_str(input: &str) -> Result<u64> {
    let trimmed = input.trim();
    let split = trimmed
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(trimmed.len());
    let (number, unit) = trimmed.split_at(split);

    let number: f64 = number
        .parse()
        .map_err(|_| Error::InvalidInput(format!("invalid size '{input}'")))?;
    let multiplier = match unit.trim().to_ascii_uppercase().as_str() {
        "" | "B" => 1,
        "K" | "KB" | "KIB" => KB,
        "M" | "MB" | "MIB" => KB.pow(2),
        "G" | "GB" | "GIB" => KB.pow(3),
        "T" | "TB" | "TIB" => KB.pow(4),
        _ => return Err(Error::InvalidInput(format!("invalid size unit in '{input}'"))),
    };

    Ok((number * multiplier as f64).round() as u64)
}

/// Parse a rate such as `2MB/s`; the `/s` suffix is optional
pub fn parse_rate_str(input: &str) -> Result<u64> {
    let trimmed = input.trim();
    let size = trimmed
        .strip_suffix("/s")
        .or_else(|| trimmed.strip_suffix("/S"))
        .unwrap_or(trimmed);
    parse_size_str(size)
}

/// Rate for display, `unlimited` for 0
pub fn format_rate(rate: u64) -> String {
    if rate == 0 {
        "unlimited".to_string()
    } else {
        format!("{}/s", format_size(rate, BINARY))
    }
}

/// Configuration manager handles loading and saving config
#[derive(Debug)]
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new ConfigManager with the default config path
    pub fn new() -> Result<Self> {
        let config_dir = match std::env::var_os(CONFIG_DIR_ENV) {
            Some(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => dirs::config_dir()
                .ok_or_else(|| Error::Config("Could not determine config directory".into()))?
                .join("pan"),
        };
        Ok(Self {
            config_path: config_dir.join("config.toml"),
        })
    }

    /// Create a ConfigManager with a custom path (useful for testing)
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Get the configuration file path
    pub fn config_path(&self) -> &PathBuf {
        &self.config_path
    }

    /// Load configuration from disk
    ///
    /// If the configuration file doesn't exist, returns a default configuration.
    /// If the schema version doesn't match, attempts migration.
    pub fn load(&self) -> Result<Config> {
        if !self.config_path.exists() {
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(&self.config_path)?;
        let mut config: Config = toml::from_str(&content)?;

        if config.schema_version < SCHEMA_VERSION {
            config = self.migrate(config)?;
        } else if config.schema_version > SCHEMA_VERSION {
            return Err(Error::Config(format!(
                "Configuration file version {} is newer than supported version {}. Please upgrade pan.",
                config.schema_version, SCHEMA_VERSION
            )));
        }

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to disk
    ///
    /// Creates parent directories if they don't exist.
    /// Sets file permissions to 600 (owner read/write only), the file may
    /// hold session headers.
    pub fn save(&self, config: &Config) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(config)?;
        std::fs::write(&self.config_path, content)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&self.config_path, permissions)?;
        }

        tracing::debug!("Saved configuration to {}", self.config_path.display());
        Ok(())
    }

    /// Migrate configuration from older schema version
    fn migrate(&self, mut config: Config) -> Result<Config> {
        // Version 0 files predate the [poll] table; serde defaults fill it in
        tracing::debug!(
            "Migrating configuration from version {} to {}",
            config.schema_version,
            SCHEMA_VERSION
        );
        config.schema_version = SCHEMA_VERSION;
        Ok(config)
    }
}
