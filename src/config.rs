//! Chart configuration.
//!
//! Every field has a default, so an empty file (or no file) yields a working
//! chart. Environment variables prefixed with `STREAMPLOT_` override file
//! values, with `__` separating nested keys (`STREAMPLOT_OVERLAYS__TRACKER`).

use std::path::Path;
use std::time::Duration;

use config::{Config, Environment, File, FileFormat};
use regex::Regex;
use serde::Deserialize;

use crate::error::ChartError;
use crate::interaction::{MagnifierSettings, OverlayFlags};

const ENV_PREFIX: &str = "STREAMPLOT";

/// Recognized chart options.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    /// Length of one batching window in milliseconds.
    pub windowing_time_ms: u64,
    /// Maximum age of retained points; `None` keeps everything.
    pub drop_data_after_ms: Option<u64>,
    /// Whether the chart attaches to its source on creation.
    pub should_subscribe: bool,
    /// Regular expression restricting which series are drawn.
    pub filter: String,
    /// Span shown by auto-follow, in milliseconds.
    pub time_window_ms: u64,
    /// Trailing window for windowed statistics; `None` means lifetime.
    pub stats_window_ms: Option<u64>,
    /// Whether the time axis starts in auto-follow mode.
    pub follow: bool,
    /// Overlay switches.
    pub overlays: OverlayFlags,
    /// Magnifier lens geometry.
    pub magnifier: MagnifierSettings,
    /// Maximum pointer distance for tooltip hits, in pixels.
    pub tooltip_threshold_px: f32,
    /// Exponent applied per scroll unit when zooming.
    pub zoom_sensitivity: f64,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            windowing_time_ms: 100,
            drop_data_after_ms: None,
            should_subscribe: true,
            filter: ".*".to_string(),
            time_window_ms: 10_000,
            stats_window_ms: None,
            follow: true,
            overlays: OverlayFlags::default(),
            magnifier: MagnifierSettings::default(),
            tooltip_threshold_px: 12.0,
            zoom_sensitivity: 0.002,
        }
    }
}

impl ChartConfig {
    /// Load from an optional file plus `STREAMPLOT_*` environment overrides.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ChartError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?;
        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML document.
    pub fn from_toml(source: &str) -> Result<Self, ChartError> {
        let settings = Config::builder()
            .add_source(File::from_str(source, FileFormat::Toml))
            .build()?;
        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values no chart can run with.
    pub fn validate(&self) -> Result<(), ChartError> {
        if self.time_window_ms == 0 {
            return Err(ChartError::InvalidSetting {
                field: "time_window_ms",
                reason: "must be positive",
            });
        }
        if !self.zoom_sensitivity.is_finite() || self.zoom_sensitivity <= 0.0 {
            return Err(ChartError::InvalidSetting {
                field: "zoom_sensitivity",
                reason: "must be a positive number",
            });
        }
        let magnification = self.magnifier.magnification;
        if magnification.is_nan() || magnification < 1.0 {
            return Err(ChartError::InvalidSetting {
                field: "magnifier.magnification",
                reason: "must be at least 1",
            });
        }
        self.compiled_filter()?;
        Ok(())
    }

    /// Compile the series filter.
    pub fn compiled_filter(&self) -> Result<Regex, ChartError> {
        Ok(Regex::new(&self.filter)?)
    }

    /// Batching window.
    pub fn windowing_time(&self) -> Duration {
        Duration::from_millis(self.windowing_time_ms)
    }

    /// Eviction age in stream milliseconds (infinite when unset).
    pub fn drop_data_after(&self) -> f64 {
        self.drop_data_after_ms.map_or(f64::INFINITY, |ms| ms as f64)
    }

    /// Auto-follow span in stream milliseconds.
    pub fn time_window(&self) -> f64 {
        self.time_window_ms as f64
    }

    /// Statistics window in stream milliseconds (infinite when unset).
    pub fn stats_window(&self) -> f64 {
        self.stats_window_ms.map_or(f64::INFINITY, |ms| ms as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interaction::OverlayMode;

    #[test]
    fn defaults_match_documented_values() {
        let config = ChartConfig::default();
        assert_eq!(config.windowing_time(), Duration::from_millis(100));
        assert!(config.drop_data_after().is_infinite());
        assert!(config.should_subscribe);
        assert!(config.compiled_filter().unwrap().is_match("anything"));
        assert_eq!(config.time_window(), 10_000.0);
    }

    #[test]
    fn toml_overrides_only_given_fields() {
        let config = ChartConfig::from_toml(
            r#"
            windowing_time_ms = 250
            drop_data_after_ms = 5000
            filter = "^cpu"

            [overlays]
            tooltip = true
            magnifier = true
            "#,
        )
        .unwrap();
        assert_eq!(config.windowing_time_ms, 250);
        assert_eq!(config.drop_data_after(), 5000.0);
        assert_eq!(config.time_window_ms, 10_000);
        assert_eq!(config.overlays.resolve(), OverlayMode::Magnifier);
        assert!(!config.compiled_filter().unwrap().is_match("mem"));
    }

    #[test]
    fn invalid_filter_fails_fast() {
        let err = ChartConfig::from_toml(r#"filter = "(unclosed""#).unwrap_err();
        assert!(matches!(err, ChartError::InvalidFilter(_)));
    }

    #[test]
    fn zero_time_window_is_rejected() {
        let config = ChartConfig {
            time_window_ms: 0,
            ..ChartConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ChartError::InvalidSetting {
                field: "time_window_ms",
                ..
            })
        ));
    }
}
