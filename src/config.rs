//! Loader Configuration
//!
//! Look-ahead and timing knobs recognized by incremental data instances,
//! loadable from TOML.

use crate::constants::DEFAULT_LOOK_AHEAD_ROW_COUNT;
use crate::error::{Error, Result};
use serde::Deserialize;
use std::time::Duration;

/// Incremental loader configuration
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoaderConfig {
    /// Rows before the loaded end that trigger the next increment. Negative disables look-ahead.
    pub look_ahead_row_count: i32,
    /// Treat contents as dirty if hidden for at least this long
    pub auto_invalidate_delay: Option<Duration>,
    /// Release contents and stop the worker after being hidden this long
    pub hide_timeout: Option<Duration>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            look_ahead_row_count: DEFAULT_LOOK_AHEAD_ROW_COUNT,
            auto_invalidate_delay: None,
            hide_timeout: None,
        }
    }
}

/// TOML representation; durations are expressed in milliseconds
#[derive(Debug, Default, Deserialize)]
struct LoaderConfigFile {
    look_ahead_row_count: Option<i32>,
    auto_invalidate_delay_ms: Option<u64>,
    hide_timeout_ms: Option<u64>,
}

impl LoaderConfig {
    /// Parse a configuration from TOML, falling back to defaults for missing keys
    pub fn from_toml_str(value: &str) -> Result<Self> {
        if value.trim().is_empty() {
            return Ok(Self::default());
        }

        let file: LoaderConfigFile = toml::from_str(value)?;
        let defaults = Self::default();

        Ok(Self {
            look_ahead_row_count: file
                .look_ahead_row_count
                .unwrap_or(defaults.look_ahead_row_count),
            auto_invalidate_delay: file.auto_invalidate_delay_ms.map(Duration::from_millis),
            hide_timeout: file.hide_timeout_ms.map(Duration::from_millis),
        })
    }

    /// Builder-style look-ahead override
    pub fn with_look_ahead_row_count(mut self, rows: i32) -> Self {
        self.look_ahead_row_count = rows;
        self
    }

    /// Builder-style auto-invalidate delay
    pub fn with_auto_invalidate_delay(mut self, delay: Duration) -> Self {
        self.auto_invalidate_delay = Some(delay);
        self
    }

    /// Builder-style hide timeout
    pub fn with_hide_timeout(mut self, timeout: Duration) -> Self {
        self.hide_timeout = Some(timeout);
        self
    }

    /// Check that the configuration is usable
    pub fn validate(&self) -> Result<()> {
        if self.hide_timeout == Some(Duration::ZERO) {
            return Err(Error::Invalid {
                message: "hide timeout must be non-zero; omit it to disable".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LoaderConfig::default();
        assert_eq!(config.look_ahead_row_count, 5);
        assert_eq!(config.auto_invalidate_delay, None);
        assert_eq!(config.hide_timeout, None);
    }

    #[test]
    fn test_from_toml() {
        let config = LoaderConfig::from_toml_str(
            r#"
            look_ahead_row_count = -1
            hide_timeout_ms = 1500
            "#,
        )
        .expect("config");
        assert_eq!(config.look_ahead_row_count, -1);
        assert_eq!(config.hide_timeout, Some(Duration::from_millis(1500)));
        assert_eq!(config.auto_invalidate_delay, None);
    }

    #[test]
    fn test_empty_toml_is_default() {
        let config = LoaderConfig::from_toml_str("  ").expect("config");
        assert_eq!(config, LoaderConfig::default());
    }

    #[test]
    fn test_malformed_toml() {
        let err = LoaderConfig::from_toml_str("look_ahead_row_count = \"many\"")
            .expect_err("should fail");
        assert!(matches!(err, Error::TomlDe { .. }));
    }

    #[test]
    fn test_zero_hide_timeout_rejected() {
        let config = LoaderConfig::default().with_hide_timeout(Duration::ZERO);
        assert!(config.validate().is_err());
    }
}
