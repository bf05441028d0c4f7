//! Runtime configuration loaded from TOML or JSON.
//!
//! ```toml
//! # flexwm.toml
//! [sizing]
//! soft_min_unflex = [1, 8]
//!
//! [render]
//! max_retries = 5
//! backoff = "linear"
//! retry_delay_ms = 10
//!
//! [log]
//! filter = "flexwm=debug"
//! ```
//!
//! Every field defaults to the standard value, so `FlexConfig::default()`
//! reproduces the built-in thresholds and render settings.

use std::path::Path;

use flexwm_layout::{GlobalSizings, NORMAL, Ratio, Size, SizingRatios};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::render::DEFAULT_PERCENT_SCALE;
use crate::retry::{BackoffStrategy, RetryPolicy};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("validation errors: {}", .0.join("; "))]
    Validation(Vec<String>),
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlexConfig {
    /// Ratios the sizing thresholds are derived from.
    pub sizing: SizingRatios,
    /// Resize command dispatch.
    pub render: RenderConfig,
    /// Log filter used when `RUST_LOG` is unset.
    pub log: LogConfig,
}

/// Backoff shape between resize retry passes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffKind {
    #[default]
    Fixed,
    Linear,
    Exponential,
}

/// Resize dispatch settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Scale resize amounts are expressed in. Default: 100.
    pub percent_scale: Size,
    /// Retry passes over rejected commands. Default: 3.
    pub max_retries: u32,
    /// Backoff shape between retry passes. Default: fixed.
    pub backoff: BackoffKind,
    /// Fixed delay, or base delay for linear and exponential backoff. Default: 0.
    pub retry_delay_ms: u64,
    /// Cap for linear and exponential backoff. Default: 1000.
    pub retry_max_delay_ms: u64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            percent_scale: DEFAULT_PERCENT_SCALE,
            max_retries: 3,
            backoff: BackoffKind::Fixed,
            retry_delay_ms: 0,
            retry_max_delay_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Default `tracing` filter directive, overridden by `RUST_LOG`.
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "info".into(),
        }
    }
}

impl FlexConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_toml_str(&std::fs::read_to_string(path.as_ref())?)
    }

    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_json_str(&std::fs::read_to_string(path.as_ref())?)
    }

    /// Load a file, picking the format from its extension (`.json` or TOML
    /// otherwise), and validate it.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let config = match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::from_json_file(path)?,
            _ => Self::from_toml_file(path)?,
        };
        let errors = config.validate();
        if !errors.is_empty() {
            return Err(ConfigError::Validation(errors));
        }
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Check every parameter. An empty list means the config is valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        let s = &self.sizing;
        let ratios: [(&str, Ratio); 6] = [
            ("default_flex", s.default_flex),
            ("max_flex", s.max_flex),
            ("soft_min_flex", s.soft_min_flex),
            ("hard_min_flex", s.hard_min_flex),
            ("soft_min_unflex", s.soft_min_unflex),
            ("hard_min_unflex", s.hard_min_unflex),
        ];
        for (name, ratio) in ratios {
            if ratio.divisor <= 0 {
                errors.push(format!(
                    "sizing.{name} divisor must be > 0, got {}",
                    ratio.divisor
                ));
            } else if ratio.dividend <= 0 || ratio.dividend >= ratio.divisor {
                errors.push(format!(
                    "sizing.{name} must be in (0, 1), got {}/{}",
                    ratio.dividend, ratio.divisor
                ));
            }
        }

        // Ordering only makes sense once every ratio converts.
        if errors.is_empty() {
            match GlobalSizings::from_ratios(s) {
                Ok(g) => {
                    if g.hard_min_unflex > g.soft_min_unflex {
                        errors.push(format!(
                            "sizing.hard_min_unflex ({}) must not exceed sizing.soft_min_unflex ({})",
                            g.hard_min_unflex, g.soft_min_unflex
                        ));
                    }
                    if g.hard_min_flex <= NORMAL / 2 {
                        errors.push("sizing.hard_min_flex must be at least 1/2".into());
                    }
                    if g.hard_min_flex > g.soft_min_flex {
                        errors.push(format!(
                            "sizing.hard_min_flex ({}) must not exceed sizing.soft_min_flex ({})",
                            g.hard_min_flex, g.soft_min_flex
                        ));
                    }
                    if g.soft_min_flex > g.max_flex {
                        errors.push(format!(
                            "sizing.soft_min_flex ({}) must not exceed sizing.max_flex ({})",
                            g.soft_min_flex, g.max_flex
                        ));
                    }
                }
                Err(err) => errors.push(format!("sizing: {err}")),
            }
        }

        if self.render.percent_scale <= 0 {
            errors.push(format!(
                "render.percent_scale must be > 0, got {}",
                self.render.percent_scale
            ));
        }
        if self.render.backoff != BackoffKind::Fixed
            && self.render.retry_max_delay_ms < self.render.retry_delay_ms
        {
            errors.push("render.retry_max_delay_ms must be >= render.retry_delay_ms".into());
        }

        if self.log.filter.trim().is_empty() {
            errors.push("log.filter must not be empty".into());
        }

        errors
    }

    /// Build the sizing thresholds, validating first.
    pub fn to_sizings(&self) -> Result<GlobalSizings, ConfigError> {
        let errors = self.validate();
        if !errors.is_empty() {
            return Err(ConfigError::Validation(errors));
        }
        GlobalSizings::from_ratios(&self.sizing)
            .map_err(|err| ConfigError::Validation(vec![format!("sizing: {err}")]))
    }

    /// Build the resize retry policy.
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        let r = &self.render;
        let backoff = match r.backoff {
            BackoffKind::Fixed => BackoffStrategy::Fixed {
                delay_ms: r.retry_delay_ms,
            },
            BackoffKind::Linear => BackoffStrategy::Linear {
                base_ms: r.retry_delay_ms,
                max_ms: r.retry_max_delay_ms,
            },
            BackoffKind::Exponential => BackoffStrategy::Exponential {
                base_ms: r.retry_delay_ms,
                max_ms: r.retry_max_delay_ms,
            },
        };
        RetryPolicy::new(r.max_retries, backoff)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flexwm_layout::globals;
    use std::io::Write;

    #[test]
    fn default_matches_standard_sizings() {
        let config = FlexConfig::default();
        assert_eq!(config.to_sizings().unwrap(), *globals());
        assert_eq!(config.retry_policy(), RetryPolicy::default());
    }

    #[test]
    fn default_validates_clean() {
        let errors = FlexConfig::default().validate();
        assert!(errors.is_empty(), "default should validate: {errors:?}");
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = FlexConfig::from_toml_str(
            r#"
            [sizing]
            soft_min_unflex = [1, 8]

            [render]
            max_retries = 5
            "#,
        )
        .unwrap();
        assert_eq!(config.sizing.soft_min_unflex, Ratio::new(1, 8));
        assert_eq!(config.sizing.hard_min_unflex, Ratio::new(1, 20));
        assert_eq!(config.render.max_retries, 5);
        assert_eq!(config.render.percent_scale, 100);
        assert_eq!(config.log.filter, "info");
        assert_eq!(config.to_sizings().unwrap().soft_min_unflex, 125);
    }

    #[test]
    fn json_round_trips_through_defaults() {
        let config =
            FlexConfig::from_json_str(r#"{"render": {"backoff": "exponential", "retry_delay_ms": 5}}"#)
                .unwrap();
        assert_eq!(
            config.retry_policy().backoff,
            BackoffStrategy::Exponential {
                base_ms: 5,
                max_ms: 1000
            }
        );
    }

    #[test]
    fn validate_catches_zero_divisor() {
        let mut config = FlexConfig::default();
        config.sizing.max_flex = Ratio::new(9, 0);
        let errors = config.validate();
        assert!(errors.iter().any(|e| e.contains("sizing.max_flex divisor")));
        assert!(matches!(
            config.to_sizings(),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn validate_catches_ratio_out_of_range() {
        let mut config = FlexConfig::default();
        config.sizing.soft_min_unflex = Ratio::new(3, 2);
        let errors = config.validate();
        assert!(errors.iter().any(|e| e.contains("sizing.soft_min_unflex")));
    }

    #[test]
    fn validate_catches_floor_order() {
        let mut config = FlexConfig::default();
        config.sizing.hard_min_unflex = Ratio::new(1, 5);
        config.sizing.soft_min_flex = Ratio::new(95, 100);
        let errors = config.validate();
        assert!(errors.iter().any(|e| e.contains("sizing.hard_min_unflex")));
        assert!(errors.iter().any(|e| e.contains("sizing.soft_min_flex")));
    }

    #[test]
    fn validate_catches_minority_hard_flex_floor() {
        let mut config = FlexConfig::default();
        config.sizing.hard_min_flex = Ratio::new(1, 3);
        let errors = config.validate();
        assert!(errors.iter().any(|e| e.contains("at least 1/2")));
    }

    #[test]
    fn validate_catches_render_and_log() {
        let mut config = FlexConfig::default();
        config.render.percent_scale = 0;
        config.render.backoff = BackoffKind::Linear;
        config.render.retry_delay_ms = 50;
        config.render.retry_max_delay_ms = 10;
        config.log.filter = "  ".into();
        let errors = config.validate();
        assert_eq!(errors.len(), 3, "{errors:?}");
    }

    #[test]
    fn load_picks_format_by_extension() {
        let dir = tempfile::tempdir().unwrap();

        let toml_path = dir.path().join("flexwm.toml");
        std::fs::write(&toml_path, "[log]\nfilter = \"debug\"\n").unwrap();
        assert_eq!(FlexConfig::load(&toml_path).unwrap().log.filter, "debug");

        let json_path = dir.path().join("flexwm.json");
        let mut file = std::fs::File::create(&json_path).unwrap();
        file.write_all(br#"{"render": {"percent_scale": 1000}}"#)
            .unwrap();
        assert_eq!(
            FlexConfig::load(&json_path).unwrap().render.percent_scale,
            1000
        );
    }

    #[test]
    fn load_rejects_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[render]\npercent_scale = -1\n").unwrap();
        let err = FlexConfig::load(&path).unwrap_err();
        assert!(err.to_string().contains("render.percent_scale"));
    }

    #[test]
    fn load_reports_missing_and_malformed_files() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            FlexConfig::load(dir.path().join("missing.toml")),
            Err(ConfigError::Io(_))
        ));
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "[render\n").unwrap();
        assert!(matches!(FlexConfig::load(&path), Err(ConfigError::Toml(_))));
    }
}
