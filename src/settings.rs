//! Timeline settings and configuration

use crate::timeline::cursor::RetryPolicy;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Timeline settings
///
/// Tunables for the chat panel controller and its fetch driver.
/// Settings are stored in JSON format and can be loaded/saved from disk.
///
/// # Example
/// ```rust,no_run
/// use chatdesk::settings::TimelineSettings;
///
/// // Load settings (returns default if file doesn't exist)
/// let mut settings = TimelineSettings::load("timeline.json").expect("Failed to load");
///
/// settings.page_size = 50;
/// settings.save("timeline.json").expect("Failed to save");
///
/// println!("Fetch timeout: {:?}", settings.fetch_timeout());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineSettings {
    /// Distance from the bottom (layout units) within which new messages auto-follow
    pub follow_threshold: f64,
    /// Distance from the top (layout units) at which older history is requested
    pub top_threshold: f64,
    /// Messages per history page
    pub page_size: usize,
    /// Upper bound for a single history fetch in milliseconds
    pub fetch_timeout_ms: u64,
    /// Retries for a failed history fetch (0 = give up immediately)
    pub max_fetch_retries: u32,
    /// Base delay for retry backoff in milliseconds
    pub retry_base_delay_ms: u64,
}

impl TimelineSettings {
    /// Load settings from a JSON file
    ///
    /// # Arguments
    /// * `path` - Path to the settings file
    ///
    /// # Returns
    /// The loaded settings, or default settings if file doesn't exist
    pub fn load<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Ok(Self::default());
        }

        let data = std::fs::read_to_string(path)
            .map_err(|e| Error::Settings(format!("Failed to read settings: {}", e)))?;

        // Handle empty file (return defaults)
        if data.trim().is_empty() {
            return Ok(Self::default());
        }

        let settings: Self = serde_json::from_str(&data)
            .map_err(|e| Error::Settings(format!("Failed to parse settings: {}", e)))?;

        settings.validate()?;
        Ok(settings)
    }

    /// Save settings to a JSON file
    ///
    /// # Arguments
    /// * `path` - Path to save the settings file
    pub fn save<P: AsRef<std::path::Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();

        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::Settings(format!("Failed to create settings directory: {}", e)))?;
        }

        let json = serde_json::to_string_pretty(self)
            .map_err(|e| Error::Settings(format!("Failed to serialize settings: {}", e)))?;

        std::fs::write(path, json)
            .map_err(|e| Error::Settings(format!("Failed to write settings: {}", e)))?;

        Ok(())
    }

    /// Reject values the controller cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(Error::Settings("page_size must be at least 1".to_string()));
        }
        let valid = |v: f64| v.is_finite() && v >= 0.0;
        if !valid(self.follow_threshold) || !valid(self.top_threshold) {
            return Err(Error::Settings("thresholds must be non-negative".to_string()));
        }
        if self.fetch_timeout_ms == 0 {
            return Err(Error::Settings("fetch_timeout_ms must be positive".to_string()));
        }
        Ok(())
    }

    /// Fetch timeout as a `Duration`
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    /// Retry policy for failed fetches
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_fetch_retries,
            base_delay: Duration::from_millis(self.retry_base_delay_ms),
        }
    }
}

impl Default for TimelineSettings {
    fn default() -> Self {
        Self {
            follow_threshold: 100.0,
            top_threshold: 0.0,
            page_size: 20,
            fetch_timeout_ms: 10_000,
            max_fetch_retries: 0,
            retry_base_delay_ms: 1000,
        }
    }
}
