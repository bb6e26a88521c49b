//! Configuration for salesnav-harvest.
//!
//! Every field has a default, so an empty or missing config file is valid.
//! Values are read from TOML and then overridden by environment variables.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::browser::BrowserEngineConfig;
use crate::pacing::DelayRange;

/// Application name, used for config and data directories.
pub const APP_NAME: &str = "salesnav-harvest";

/// Config file name inside the config directory.
pub const CONFIG_FILENAME: &str = "config.toml";

/// Address fragment that marks a lead search page.
pub const DEFAULT_ACTIVATION_PATTERN: &str = "/sales/search";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Top-level harvest configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HarvestConfig {
    #[serde(default)]
    pub readiness: ReadinessConfig,
    #[serde(default)]
    pub lazy_load: LazyLoadConfig,
    #[serde(default)]
    pub pacing: PacingConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub browser: BrowserEngineConfig,
    #[serde(default)]
    pub paths: PathsConfig,
}

/// Page-readiness polling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessConfig {
    /// Interval between record-count polls.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Consecutive equal non-zero samples required before the page counts as ready.
    #[serde(default = "default_stability_window")]
    pub stability_window: usize,
    /// Hard wall-clock deadline for the whole wait.
    #[serde(default = "default_deadline_ms")]
    pub deadline_ms: u64,
    /// Randomized settle delay before the first poll.
    #[serde(default = "default_settle")]
    pub settle: DelayRange,
}

impl ReadinessConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn deadline(&self) -> Duration {
        Duration::from_millis(self.deadline_ms)
    }
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            stability_window: default_stability_window(),
            deadline_ms: default_deadline_ms(),
            settle: default_settle(),
        }
    }
}

fn default_poll_interval_ms() -> u64 {
    500
}

fn default_stability_window() -> usize {
    3
}

fn default_deadline_ms() -> u64 {
    15_000
}

fn default_settle() -> DelayRange {
    DelayRange::new(800, 1_600)
}

/// Scroll-driven lazy loading of the result list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LazyLoadConfig {
    /// Upper bound on scroll/measure cycles.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,
    /// Number of fractional scroll steps per cycle.
    #[serde(default = "default_scroll_steps")]
    pub scroll_steps: usize,
    #[serde(default = "default_step_delay")]
    pub step_delay: DelayRange,
    /// Pause after the last step of a cycle, before measuring.
    #[serde(default = "default_after_scroll_delay")]
    pub after_scroll_delay: DelayRange,
    /// Pause after scrolling back to the top.
    #[serde(default = "default_restore_delay")]
    pub restore_delay: DelayRange,
}

impl Default for LazyLoadConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            scroll_steps: default_scroll_steps(),
            step_delay: default_step_delay(),
            after_scroll_delay: default_after_scroll_delay(),
            restore_delay: default_restore_delay(),
        }
    }
}

fn default_max_attempts() -> usize {
    10
}

fn default_scroll_steps() -> usize {
    4
}

fn default_step_delay() -> DelayRange {
    DelayRange::new(300, 700)
}

fn default_after_scroll_delay() -> DelayRange {
    DelayRange::new(800, 1_400)
}

fn default_restore_delay() -> DelayRange {
    DelayRange::new(400, 800)
}

/// Pauses taken by the orchestrator between phases.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PacingConfig {
    /// After lazy loading, before extraction.
    #[serde(default = "default_page_settle")]
    pub page_settle: DelayRange,
    /// After persisting, before navigating to the next page.
    #[serde(default = "default_inter_page")]
    pub inter_page: DelayRange,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            page_settle: default_page_settle(),
            inter_page: default_inter_page(),
        }
    }
}

fn default_page_settle() -> DelayRange {
    DelayRange::new(1_000, 2_000)
}

fn default_inter_page() -> DelayRange {
    DelayRange::new(2_500, 4_500)
}

/// Session lifecycle limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Sessions older than this are discarded unresumed.
    #[serde(default = "default_staleness_ms")]
    pub staleness_ms: i64,
    /// Pages in a row without a retained lead before the harvest gives up.
    #[serde(default = "default_max_consecutive_empty_pages")]
    pub max_consecutive_empty_pages: u32,
    /// Address fragment that enables harvesting.
    #[serde(default = "default_activation_pattern")]
    pub activation_pattern: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            staleness_ms: default_staleness_ms(),
            max_consecutive_empty_pages: default_max_consecutive_empty_pages(),
            activation_pattern: default_activation_pattern(),
        }
    }
}

fn default_staleness_ms() -> i64 {
    3_600_000
}

fn default_max_consecutive_empty_pages() -> u32 {
    3
}

fn default_activation_pattern() -> String {
    DEFAULT_ACTIVATION_PATTERN.to_string()
}

/// Filesystem locations. Unset entries fall back to platform defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Directory for the persisted session.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    /// Directory exported CSV files are written to.
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
}

/// Resolved runtime paths.
#[derive(Debug, Clone)]
pub struct Settings {
    pub data_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl Settings {
    pub fn from_config(config: &HarvestConfig) -> Self {
        let data_dir = config.paths.data_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(APP_NAME)
        });
        let output_dir = config
            .paths
            .output_dir
            .clone()
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
        Self {
            data_dir,
            output_dir,
        }
    }
}

impl HarvestConfig {
    /// Parse a config from TOML text.
    pub fn from_toml(text: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load from an explicit path, or the default location if it exists, else defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match explicit {
            Some(p) => Some(p.to_path_buf()),
            None => default_config_path().filter(|p| p.exists()),
        };

        let mut config = match path {
            Some(path) => {
                let text = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
                    path: path.clone(),
                    source,
                })?;
                tracing::debug!("Loaded config from {}", path.display());
                Self::from_toml(&text, &path)?
            }
            None => Self::default(),
        };

        config.apply_env();
        Ok(config)
    }

    /// Environment variables take precedence over file values.
    pub fn apply_env(&mut self) {
        if let Some(dir) = env_var("SALESNAV_DATA_DIR") {
            tracing::debug!("Using SALESNAV_DATA_DIR from environment: {}", dir);
            self.paths.data_dir = Some(PathBuf::from(dir));
        }
        if let Some(dir) = env_var("SALESNAV_OUTPUT_DIR") {
            tracing::debug!("Using SALESNAV_OUTPUT_DIR from environment: {}", dir);
            self.paths.output_dir = Some(PathBuf::from(dir));
        }
        if let Some(url) = env_var("SALESNAV_REMOTE_URL") {
            tracing::debug!("Using SALESNAV_REMOTE_URL from environment: {}", url);
            self.browser.remote_url = Some(url);
        }
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}

/// `$XDG_CONFIG_HOME/salesnav-harvest/config.toml` or the platform equivalent.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_NAME).join(CONFIG_FILENAME))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = HarvestConfig::from_toml("", Path::new("config.toml")).unwrap();
        assert_eq!(config.readiness.poll_interval_ms, 500);
        assert_eq!(config.readiness.stability_window, 3);
        assert_eq!(config.readiness.deadline_ms, 15_000);
        assert_eq!(config.lazy_load.max_attempts, 10);
        assert_eq!(config.session.staleness_ms, 3_600_000);
        assert_eq!(config.session.activation_pattern, "/sales/search");
        assert!(config.browser.headless);
    }

    #[test]
    fn test_partial_override() {
        let text = r#"
            [readiness]
            deadline_ms = 5000

            [pacing]
            inter_page = { min_ms = 10, max_ms = 20 }

            [paths]
            output_dir = "/tmp/leads"
        "#;
        let config = HarvestConfig::from_toml(text, Path::new("config.toml")).unwrap();
        assert_eq!(config.readiness.deadline(), Duration::from_secs(5));
        assert_eq!(config.readiness.poll_interval_ms, 500);
        assert_eq!(config.pacing.inter_page, DelayRange::new(10, 20));
        assert_eq!(config.pacing.page_settle, DelayRange::new(1_000, 2_000));

        let settings = Settings::from_config(&config);
        assert_eq!(settings.output_dir, PathBuf::from("/tmp/leads"));
    }

    #[test]
    fn test_invalid_toml_reports_path() {
        let err = HarvestConfig::from_toml("readiness = 3", Path::new("bad.toml")).unwrap_err();
        assert!(err.to_string().contains("bad.toml"));
    }
}
