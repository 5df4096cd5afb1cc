//! Driver configuration
//!
//! Stored as TOML under the user config directory. Missing fields take
//! their defaults so older files keep loading.

use std::path::{Path, PathBuf};
use std::time::Duration;

use cadence_transport::Handedness;
use serde::{Deserialize, Serialize};

use crate::canvas::ViewRates;
use crate::error::DriverError;

/// Per-panel override, matched by serial number
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelOverride {
    pub serial: String,
    /// Force handedness when the product name does not tell
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handedness: Option<Handedness>,
    /// Cell columns (24 for a bridged pair)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub columns: Option<u32>,
}

/// Complete driver configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Pan step in device dots
    pub pan_rate: f64,
    pub pan_rate_multiplier: f64,
    /// Zoom factor per step
    pub zoom_rate: f64,
    pub zoom_rate_multiplier: f64,
    /// Black/white threshold out of 100
    pub threshold: f64,
    pub threshold_rate: f64,
    pub threshold_rate_multiplier: f64,
    /// Raise dots for dark pixels
    pub threshold_reversed: bool,
    pub correct_aspect_ratio: bool,
    pub refresh_interval_ms: u64,
    pub capture_timeout_ms: u64,
    /// Screen size bounding the pan centre when the capture source has none
    pub screen_width: u32,
    pub screen_height: u32,
    pub panels: Vec<PanelOverride>,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            pan_rate: 2.0,
            pan_rate_multiplier: 1.5,
            zoom_rate: 1.25,
            zoom_rate_multiplier: 1.5,
            threshold: 50.0,
            threshold_rate: 7.0,
            threshold_rate_multiplier: 1.5,
            threshold_reversed: true,
            correct_aspect_ratio: true,
            refresh_interval_ms: 500,
            capture_timeout_ms: 2000,
            screen_width: 1920,
            screen_height: 1080,
            panels: Vec::new(),
        }
    }
}

impl DriverConfig {
    /// Get the default config file path
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("cadence")
            .join("driver.toml")
    }

    /// Load config from a file, or return default if not found
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: DriverConfig = toml::from_str(&content)?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to a file
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject values the navigation maths cannot work with
    pub fn validate(&self) -> Result<(), DriverError> {
        if self.zoom_rate <= 1.0 {
            return Err(DriverError::Config(format!(
                "zoom_rate must be greater than 1, got {}",
                self.zoom_rate
            )));
        }
        for (name, value) in [
            ("pan_rate_multiplier", self.pan_rate_multiplier),
            ("zoom_rate_multiplier", self.zoom_rate_multiplier),
            ("threshold_rate_multiplier", self.threshold_rate_multiplier),
        ] {
            if value <= 0.0 {
                return Err(DriverError::Config(format!("{name} must be positive")));
            }
        }
        if !(0.0..=100.0).contains(&self.threshold) {
            return Err(DriverError::Config(format!(
                "threshold must be within 0..=100, got {}",
                self.threshold
            )));
        }
        if self.refresh_interval_ms == 0 {
            return Err(DriverError::Config("refresh_interval_ms must be non-zero".into()));
        }
        if self.capture_timeout_ms == 0 {
            return Err(DriverError::Config("capture_timeout_ms must be non-zero".into()));
        }
        Ok(())
    }

    pub fn view_rates(&self) -> ViewRates {
        ViewRates {
            pan_rate: self.pan_rate,
            pan_rate_multiplier: self.pan_rate_multiplier,
            zoom_rate: self.zoom_rate,
            zoom_rate_multiplier: self.zoom_rate_multiplier,
        }
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }

    pub fn capture_timeout(&self) -> Duration {
        Duration::from_millis(self.capture_timeout_ms)
    }

    /// Override for the panel with `serial`, if any
    pub fn panel_override(&self, serial: Option<&str>) -> Option<&PanelOverride> {
        let serial = serial?;
        self.panels.iter().find(|p| p.serial == serial)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_serializes() {
        let config = DriverConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("pan_rate = 2.0"));
        assert!(toml_str.contains("threshold_reversed = true"));
    }

    #[test]
    fn test_roundtrip() {
        let mut config = DriverConfig::default();
        config.panels.push(PanelOverride {
            serial: "C0FFEE".into(),
            handedness: Some(Handedness::Right),
            columns: Some(24),
        });
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: DriverConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let parsed: DriverConfig = toml::from_str(
            r#"
            threshold = 40.0

            [[panels]]
            serial = "A1"
            handedness = "left"
            "#,
        )
        .unwrap();
        assert_eq!(parsed.threshold, 40.0);
        assert_eq!(parsed.zoom_rate, 1.25);
        assert_eq!(parsed.refresh_interval_ms, 500);
        let o = parsed.panel_override(Some("A1")).unwrap();
        assert_eq!(o.handedness, Some(Handedness::Left));
        assert_eq!(o.columns, None);
        assert!(parsed.panel_override(None).is_none());
    }

    #[test]
    fn test_validate_rejects_neutral_zoom() {
        let config = DriverConfig {
            zoom_rate: 1.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
        assert!(DriverConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_durations() {
        let config = DriverConfig {
            capture_timeout_ms: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(DriverError::Config(m)) if m.contains("capture_timeout_ms")));
        let config = DriverConfig {
            refresh_interval_ms: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_file_gives_default() {
        let path = std::env::temp_dir().join("cadence-driver-test-missing.toml");
        let config = DriverConfig::load(&path).unwrap();
        assert_eq!(config, DriverConfig::default());
    }

    #[test]
    fn test_save_then_load() {
        let path = std::env::temp_dir()
            .join(format!("cadence-driver-test-{}", std::process::id()))
            .join("driver.toml");
        let config = DriverConfig {
            threshold: 65.0,
            ..Default::default()
        };
        config.save(&path).unwrap();
        assert_eq!(DriverConfig::load(&path).unwrap(), config);
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }
}
