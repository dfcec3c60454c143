//! Application configuration value object

use serde::{Deserialize, Serialize};

use super::settings::ClipboardSettings;

/// X11-specific configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct X11Config {
    pub display: Option<String>,
    pub max_spawn_retries: Option<u32>,
    pub conversion_chunk: Option<usize>,
}

/// Application configuration.
/// All fields are optional to support partial configs and merging.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    pub log_level: Option<String>,
    pub x11: Option<X11Config>,
}

impl AppConfig {
    /// Create config with default values
    pub fn defaults() -> Self {
        Self {
            log_level: Some(DEFAULT_LOG_LEVEL.to_string()),
            x11: Some(X11Config {
                display: None,
                max_spawn_retries: Some(ClipboardSettings::DEFAULT_MAX_SPAWN_RETRIES),
                conversion_chunk: Some(ClipboardSettings::DEFAULT_CONVERSION_CHUNK),
            }),
        }
    }

    /// Create an empty config (all None)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Merge this config with another, where other takes precedence.
    /// Only non-None values from other will override this.
    pub fn merge(self, other: Self) -> Self {
        Self {
            log_level: other.log_level.or(self.log_level),
            x11: Self::merge_x11_config(self.x11, other.x11),
        }
    }

    /// Merge X11 config sections
    fn merge_x11_config(base: Option<X11Config>, other: Option<X11Config>) -> Option<X11Config> {
        match (base, other) {
            (None, None) => None,
            (Some(b), None) => Some(b),
            (None, Some(o)) => Some(o),
            (Some(b), Some(o)) => Some(X11Config {
                display: o.display.or(b.display),
                max_spawn_retries: o.max_spawn_retries.or(b.max_spawn_retries),
                conversion_chunk: o.conversion_chunk.or(b.conversion_chunk),
            }),
        }
    }

    /// Get log level, or "warn" if not set
    pub fn log_level_or_default(&self) -> &str {
        self.log_level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    /// Resolve the backend settings, filling gaps with defaults
    pub fn clipboard_settings(&self) -> ClipboardSettings {
        let x11 = self.x11.clone().unwrap_or_default();
        let defaults = ClipboardSettings::default();
        ClipboardSettings {
            display: x11.display.filter(|d| !d.is_empty()),
            max_spawn_retries: x11.max_spawn_retries.unwrap_or(defaults.max_spawn_retries),
            conversion_chunk: x11
                .conversion_chunk
                .filter(|chunk| *chunk > 0)
                .unwrap_or(defaults.conversion_chunk),
        }
    }
}

const DEFAULT_LOG_LEVEL: &str = "warn";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_have_expected_values() {
        let config = AppConfig::defaults();
        assert_eq!(config.log_level, Some("warn".to_string()));
        let x11 = config.x11.as_ref().unwrap();
        assert!(x11.display.is_none());
        assert_eq!(x11.max_spawn_retries, Some(3));
        assert_eq!(x11.conversion_chunk, Some(32));
    }

    #[test]
    fn empty_has_all_none() {
        let config = AppConfig::empty();
        assert!(config.log_level.is_none());
        assert!(config.x11.is_none());
    }

    #[test]
    fn merge_other_takes_precedence() {
        let base = AppConfig {
            log_level: Some("info".to_string()),
            x11: Some(X11Config {
                display: Some(":0".to_string()),
                max_spawn_retries: Some(5),
                conversion_chunk: None,
            }),
        };

        let other = AppConfig {
            log_level: None, // Should not override
            x11: Some(X11Config {
                display: Some(":1".to_string()),
                ..Default::default()
            }),
        };

        let merged = base.merge(other);

        assert_eq!(merged.log_level, Some("info".to_string())); // Kept from base
        let x11 = merged.x11.unwrap();
        assert_eq!(x11.display, Some(":1".to_string()));
        assert_eq!(x11.max_spawn_retries, Some(5));
        assert!(x11.conversion_chunk.is_none());
    }

    #[test]
    fn merge_preserves_base_when_other_is_none() {
        let base = AppConfig::defaults();
        let merged = base.clone().merge(AppConfig::empty());
        assert_eq!(merged, base);
    }

    #[test]
    fn clipboard_settings_from_empty_config() {
        let settings = AppConfig::empty().clipboard_settings();
        assert_eq!(settings, ClipboardSettings::default());
    }

    #[test]
    fn clipboard_settings_ignore_blank_display_and_zero_chunk() {
        let config = AppConfig {
            x11: Some(X11Config {
                display: Some(String::new()),
                max_spawn_retries: Some(1),
                conversion_chunk: Some(0),
            }),
            ..Default::default()
        };
        let settings = config.clipboard_settings();
        assert!(settings.display.is_none());
        assert_eq!(settings.max_spawn_retries, 1);
        assert_eq!(settings.conversion_chunk, 32);
    }

    #[test]
    fn log_level_or_default_returns_warn() {
        assert_eq!(AppConfig::empty().log_level_or_default(), "warn");
    }

    #[test]
    fn toml_round_trip_of_nested_section() {
        let text = "log_level = \"debug\"\n\n[x11]\ndisplay = \":2\"\n";
        let config: AppConfig = toml::from_str(text).unwrap();
        assert_eq!(config.log_level_or_default(), "debug");
        assert_eq!(config.clipboard_settings().display.as_deref(), Some(":2"));
    }
}
