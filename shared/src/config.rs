use palette::Srgb;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

use crate::profile::MachineProfile;

// ===== ERRORS =====

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("unsupported config version '{0}'")]
    UnsupportedVersion(String),
    #[error("invalid color '{value}' for {field}")]
    InvalidColor { field: &'static str, value: String },
    #[error("tick rate must be greater than zero")]
    ZeroTickRate,
}

// ===== CONFIG TYPES =====

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub app: AppSection,
    pub session: SessionSection,
    pub keyboard: KeyboardSection,
    pub colors: ColorsSection,
    pub assets: AssetsSection,
}

impl AppConfig {
    /// Parses and validates a TOML document. Missing sections keep defaults.
    pub fn from_toml(source: &str) -> Result<Self, ConfigError> {
        let mut config: AppConfig = toml::from_str(source)?;
        if !config.app.is_supported_version() {
            return Err(ConfigError::UnsupportedVersion(config.app.version));
        }
        if config.session.tick_hz == 0 {
            return Err(ConfigError::ZeroTickRate);
        }
        config.colors.normalize()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

// AppSection carries the format version so stored overrides can be migrated
// when the layout changes
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AppSection {
    pub version: String,
}

impl AppSection {
    /// Current configuration format version
    pub const CURRENT_VERSION: &'static str = "1.0.0";

    pub fn is_supported_version(&self) -> bool {
        matches!(self.version.as_str(), "1.0.0")
    }

    pub fn needs_migration(&self) -> bool {
        self.version != Self::CURRENT_VERSION
    }

    pub fn get_migration_strategy(&self) -> MigrationStrategy {
        match self.version.as_str() {
            "1.0.0" => MigrationStrategy::None,
            _ => MigrationStrategy::Recreate,
        }
    }
}

impl Default for AppSection {
    fn default() -> Self {
        Self {
            version: Self::CURRENT_VERSION.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MigrationStrategy {
    None,
    Recreate,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct SessionSection {
    /// Refresh ticks per second.
    pub tick_hz: u32,
    pub default_profile: MachineProfile,
}

impl SessionSection {
    pub fn tick_interval_ms(&self) -> u32 {
        (1000 / self.tick_hz.max(1)).max(1)
    }
}

impl Default for SessionSection {
    fn default() -> Self {
        Self {
            tick_hz: 30,
            default_profile: MachineProfile::Full,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct KeyboardSection {
    /// How long the simulated key stays down, in milliseconds.
    pub dwell_ms: u32,
    /// Refresh ticks between two macro key presses.
    pub key_spacing_ticks: u32,
}

impl Default for KeyboardSection {
    fn default() -> Self {
        Self {
            dwell_ms: 75,
            key_spacing_ticks: 5,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ColorsSection {
    pub signal_low: String,
    pub signal_high: String,
    pub highlight: String,
}

impl ColorsSection {
    fn normalize(&mut self) -> Result<(), ConfigError> {
        self.signal_low = normalize_color("signal_low", &self.signal_low)?;
        self.signal_high = normalize_color("signal_high", &self.signal_high)?;
        self.highlight = normalize_color("highlight", &self.highlight)?;
        Ok(())
    }
}

impl Default for ColorsSection {
    fn default() -> Self {
        Self {
            signal_low: "#3a3a3a".to_string(),
            signal_high: "#00c800".to_string(),
            highlight: "#ff8c00".to_string(),
        }
    }
}

/// Parses a hex colour and returns it as lowercase `#rrggbb`.
pub fn normalize_color(field: &'static str, value: &str) -> Result<String, ConfigError> {
    let color = Srgb::<u8>::from_str(value.trim()).map_err(|_| ConfigError::InvalidColor {
        field,
        value: value.to_string(),
    })?;
    Ok(format!("#{:02x}{:02x}{:02x}", color.red, color.green, color.blue))
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AssetsSection {
    /// Prefix for sheet and keyboard SVG files.
    pub base_path: String,
}

impl Default for AssetsSection {
    fn default() -> Self {
        Self {
            base_path: "circuits/commodore_pet_2001n/".to_string(),
        }
    }
}
