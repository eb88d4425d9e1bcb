//! Scraper configuration
//!
//! Defaults reproduce the fixed behaviour of the transit form workflow. A YAML
//! file named by `TRANSIT_SCRAPER_CONFIG` can replace them, and a handful of
//! deployment settings can be overridden from the environment.

use std::time::Duration;

use serde::Deserialize;

/// Environment variable naming an optional YAML config file.
pub const CONFIG_PATH_ENV: &str = "TRANSIT_SCRAPER_CONFIG";

/// Transit page on the target site.
pub const DEFAULT_BASE_URL: &str = "https://www.astrosage.com/free/transit-today.asp";

/// Timezone entered on the form; not derived from the coordinates.
pub const DEFAULT_TIMEZONE: &str = "5.5";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    pub base_url: String,
    pub timezone: String,
    /// Upper bound on waiting for the result container.
    pub result_timeout_ms: u64,
    /// Settle delay after opening the advanced settings section.
    pub advanced_settle_ms: u64,
    /// Settle delay after closing each popup.
    pub popup_settle_ms: u64,
    /// Maximum browser sessions alive at once.
    pub max_sessions: usize,
    pub headless: bool,
    pub chrome_executable: Option<String>,
    pub bind_addr: String,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timezone: DEFAULT_TIMEZONE.to_string(),
            result_timeout_ms: 10_000,
            advanced_settle_ms: 3_000,
            popup_settle_ms: 500,
            max_sessions: 2,
            headless: true,
            chrome_executable: None,
            bind_addr: "0.0.0.0:4000".to_string(),
        }
    }
}

impl ScraperConfig {
    /// Load configuration from a YAML file
    pub fn from_file(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Load configuration from a YAML string
    pub fn from_yaml(content: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let config: ScraperConfig = serde_yaml::from_str(content)?;
        Ok(config)
    }

    /// File named by `TRANSIT_SCRAPER_CONFIG` (or defaults), then env overrides.
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        let mut config = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => {
                tracing::info!(path = %path, "Loading scraper configuration");
                Self::from_file(&path)?
            }
            Err(_) => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply overrides from a key lookup (the process environment in `load`).
    ///
    /// Unparsable values are ignored with a warning.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("TRANSIT_BASE_URL") {
            self.base_url = url;
        }
        if let Some(addr) = lookup("TRANSIT_BIND_ADDR") {
            self.bind_addr = addr;
        }
        if let Some(path) = lookup("CHROME_PATH") {
            self.chrome_executable = Some(path);
        }
        if let Some(raw) = lookup("TRANSIT_MAX_SESSIONS") {
            match raw.parse::<usize>() {
                Ok(n) if n > 0 => self.max_sessions = n,
                _ => tracing::warn!(value = %raw, "Ignoring invalid TRANSIT_MAX_SESSIONS"),
            }
        }
        if let Some(raw) = lookup("TRANSIT_HEADLESS") {
            match raw.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => self.headless = true,
                "0" | "false" | "no" => self.headless = false,
                _ => tracing::warn!(value = %raw, "Ignoring invalid TRANSIT_HEADLESS"),
            }
        }
    }

    pub fn result_timeout(&self) -> Duration {
        Duration::from_millis(self.result_timeout_ms)
    }

    pub fn advanced_settle(&self) -> Duration {
        Duration::from_millis(self.advanced_settle_ms)
    }

    pub fn popup_settle(&self) -> Duration {
        Duration::from_millis(self.popup_settle_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_match_form_constants() {
        let config = ScraperConfig::default();
        assert_eq!(config.timezone, "5.5");
        assert_eq!(config.result_timeout(), Duration::from_secs(10));
        assert_eq!(config.popup_settle(), Duration::from_millis(500));
        assert_eq!(config.bind_addr, "0.0.0.0:4000");
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = r#"
max_sessions: 4
headless: false
"#;
        let config = ScraperConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.max_sessions, 4);
        assert!(!config.headless);
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.advanced_settle_ms, 3_000);
    }

    #[test]
    fn test_shipped_config_matches_defaults() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../../config/transit_scraper.yaml");
        let config = ScraperConfig::from_file(path).unwrap();
        assert_eq!(config, ScraperConfig::default());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("TRANSIT_MAX_SESSIONS", "3"),
            ("TRANSIT_HEADLESS", "false"),
            ("TRANSIT_BIND_ADDR", "127.0.0.1:9000"),
        ]
        .into_iter()
        .collect();

        let mut config = ScraperConfig::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.max_sessions, 3);
        assert!(!config.headless);
        assert_eq!(config.bind_addr, "127.0.0.1:9000");
        assert!(config.chrome_executable.is_none());
    }

    #[test]
    fn test_invalid_overrides_are_ignored() {
        let mut config = ScraperConfig::default();
        config.apply_overrides(|key| match key {
            "TRANSIT_MAX_SESSIONS" => Some("0".to_string()),
            "TRANSIT_HEADLESS" => Some("maybe".to_string()),
            _ => None,
        });
        assert_eq!(config.max_sessions, 2);
        assert!(config.headless);
    }
}
