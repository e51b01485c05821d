//! Configuration for the Z-hop post-processor
//!
//! Every recognised option with its default, JSON and TOML file handling,
//! and validation. Configuration is organized into sections:
//! - General (master switch, hop mode, profile model)
//! - Layer change hop
//! - Travel hop (height, gating)
//! - Speed (hop speed limit, feed capping)
//! - Profile model tuning
//! - Output formatting

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use zhopkit_core::{ConfigError, Error, Result};

/// How a travel hop is shaped
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum HopMode {
    /// Vertical lift, travel, vertical drop
    Traditional,
    /// Curved or staged lift along the travel path
    Slingshot,
    /// Unknown name from a config file; the engine stays disabled
    Unrecognized(String),
}

impl From<String> for HopMode {
    fn from(value: String) -> Self {
        match value.trim().to_lowercase().as_str() {
            "traditional" | "vertical" => HopMode::Traditional,
            "slingshot" | "curved" => HopMode::Slingshot,
            _ => HopMode::Unrecognized(value),
        }
    }
}

impl From<HopMode> for String {
    fn from(mode: HopMode) -> Self {
        mode.to_string()
    }
}

impl fmt::Display for HopMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Traditional => write!(f, "traditional"),
            Self::Slingshot => write!(f, "slingshot"),
            Self::Unrecognized(name) => write!(f, "{}", name),
        }
    }
}

/// Height profile model used in slingshot mode
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ProfileModel {
    /// Height from total travel length, flat along the path
    Linear,
    /// Ascent, plateau, and descent as shares of the path
    Percentage,
    /// Ascent and descent runs from a lift angle
    Angle,
    /// Circular-arc ascent
    Arc,
    /// Unknown name from a config file; the engine stays disabled
    Unrecognized(String),
}

impl From<String> for ProfileModel {
    fn from(value: String) -> Self {
        match value.trim().to_lowercase().as_str() {
            "linear" => ProfileModel::Linear,
            "percentage" | "percent" => ProfileModel::Percentage,
            "angle" => ProfileModel::Angle,
            "arc" | "curve" => ProfileModel::Arc,
            _ => ProfileModel::Unrecognized(value),
        }
    }
}

impl From<ProfileModel> for String {
    fn from(model: ProfileModel) -> Self {
        model.to_string()
    }
}

impl fmt::Display for ProfileModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Linear => write!(f, "linear"),
            Self::Percentage => write!(f, "percentage"),
            Self::Angle => write!(f, "angle"),
            Self::Arc => write!(f, "arc"),
            Self::Unrecognized(name) => write!(f, "{}", name),
        }
    }
}

/// Where a hop height comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeightSource {
    /// Slice thickness declared in the program
    LayerHeight,
    /// Fixed value from the config
    Custom,
}

/// General settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Master on/off switch
    pub enabled: bool,
    /// Vertical or slingshot hops
    pub mode: HopMode,
    /// Profile model for slingshot hops
    pub model: ProfileModel,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            mode: HopMode::Slingshot,
            model: ProfileModel::Percentage,
        }
    }
}

/// Hop inserted where one layer ends and the next begins
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayerChangeSettings {
    /// Insert layer change hops
    pub enabled: bool,
    /// Height source
    pub height_source: HeightSource,
    /// Height in mm when the source is `custom`
    pub custom_height: f64,
}

impl Default for LayerChangeSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            height_source: HeightSource::LayerHeight,
            custom_height: 0.4,
        }
    }
}

/// Travel hop settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TravelSettings {
    /// Insert travel hops
    pub enabled: bool,
    /// Height source
    pub height_source: HeightSource,
    /// Maximum hop height in mm when the source is `custom`
    pub custom_height: f64,
    /// Travel shorter than this (mm) is left alone unless it follows a retraction
    pub min_distance: f64,
    /// 1-based layer numbers that always get travel hops, as a list or a
    /// string such as `"1 5 10"`
    #[serde(deserialize_with = "deserialize_layer_list")]
    pub custom_layers: Vec<u32>,
    /// Only the first and last layer get travel hops
    pub top_bottom_only: bool,
    /// Dedicated feed for synthesized moves, mm/s
    pub z_feedrate: Option<f64>,
}

impl Default for TravelSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            height_source: HeightSource::Custom,
            custom_height: 0.4,
            min_distance: 20.0,
            custom_layers: Vec::new(),
            top_bottom_only: false,
            z_feedrate: None,
        }
    }
}

/// Z speed handling during hops
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeedSettings {
    /// Temporary `M203` Z limit during a hop, mm/s
    pub hop_speed: Option<f64>,
    /// Slow synthesized moves so their Z component respects the Z limit
    pub cap_feedrate: bool,
    /// Z limit assumed when the program does not declare one, mm/s
    pub default_max_z_speed: f64,
}

impl Default for SpeedSettings {
    fn default() -> Self {
        Self {
            hop_speed: None,
            cap_feedrate: false,
            default_max_z_speed: 5.0,
        }
    }
}

/// Height profile tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileSettings {
    /// Linear model height at or below the lower threshold, mm
    pub min_height: f64,
    /// Linear model lower distance threshold, mm
    pub min_distance_threshold: f64,
    /// Linear model upper distance threshold, mm
    pub max_distance_threshold: f64,
    /// Linear model share of the path used to lift and to drop, percent
    pub edge_percent: f64,
    /// Ascent share of the path, percent
    pub ascent_percent: f64,
    /// Descent share of the path, percent
    pub descent_percent: f64,
    /// Lift angle in degrees
    pub lift_angle: f64,
    /// Keep the lift angle and let the peak drop on short paths
    pub angle_priority: bool,
    /// Arc tightness, percent (200 and above is a semicircle)
    pub arc_radius_percent: f64,
    /// Samples across the arc ascent
    pub arc_segments: u32,
    /// Clamp the arc radius to the largest safe value
    pub arc_limit_radius: bool,
}

impl Default for ProfileSettings {
    fn default() -> Self {
        Self {
            min_height: 0.1,
            min_distance_threshold: 0.0,
            max_distance_threshold: 80.0,
            edge_percent: 10.0,
            ascent_percent: 30.0,
            descent_percent: 30.0,
            lift_angle: 45.0,
            angle_priority: false,
            arc_radius_percent: 50.0,
            arc_segments: 8,
            arc_limit_radius: false,
        }
    }
}

/// Output formatting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    /// Decimals on synthesized coordinates
    pub precision: u32,
    /// Points closer than this in X and Y are the same point, mm
    pub duplicate_epsilon: f64,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            precision: 5,
            duplicate_epsilon: 0.001,
        }
    }
}

/// Complete configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralSettings,
    /// Layer change hop
    pub layer_change: LayerChangeSettings,
    /// Travel hop
    pub travel: TravelSettings,
    /// Z speed handling
    pub speed: SpeedSettings,
    /// Profile tuning
    pub profile: ProfileSettings,
    /// Output formatting
    pub output: OutputSettings,
}

fn check_range(name: &str, value: f64, min: f64, max: f64) -> Result<()> {
    if value.is_finite() && value >= min && value <= max {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            name: name.to_string(),
            value,
            min,
            max,
        }
        .into())
    }
}

fn format_error(extension: &str) -> Error {
    ConfigError::UnsupportedFormat {
        extension: extension.to_string(),
    }
    .into()
}

fn parse_error(format: &str, reason: impl fmt::Display) -> Error {
    ConfigError::Parse {
        format: format.to_string(),
        reason: reason.to_string(),
    }
    .into()
}

impl Config {
    /// Create new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load config from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = match extension_of(path).as_str() {
            "json" => serde_json::from_str(&content).map_err(|e| parse_error("JSON", e))?,
            "toml" => toml::from_str(&content).map_err(|e| parse_error("TOML", e))?,
            other => return Err(format_error(other)),
        };

        config.validate()?;
        Ok(config)
    }

    /// Save config to file (JSON or TOML)
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        self.validate()?;

        let content = match extension_of(path).as_str() {
            "json" => serde_json::to_string_pretty(self).map_err(|e| parse_error("JSON", e))?,
            "toml" => self.to_toml()?,
            other => return Err(format_error(other)),
        };

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Render as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| parse_error("TOML", e))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        check_range("layer_change.custom_height", self.layer_change.custom_height, 0.0, 10.0)?;

        check_range("travel.custom_height", self.travel.custom_height, 0.0, 10.0)?;
        check_range("travel.min_distance", self.travel.min_distance, 0.0, 10_000.0)?;
        if let Some(feed) = self.travel.z_feedrate {
            check_range("travel.z_feedrate", feed, 0.1, 1_000.0)?;
        }

        if let Some(speed) = self.speed.hop_speed {
            check_range("speed.hop_speed", speed, 0.1, 1_000.0)?;
        }
        check_range("speed.default_max_z_speed", self.speed.default_max_z_speed, 0.1, 1_000.0)?;

        let p = &self.profile;
        check_range("profile.min_height", p.min_height, 0.0, 10.0)?;
        check_range("profile.min_distance_threshold", p.min_distance_threshold, 0.0, 10_000.0)?;
        check_range(
            "profile.max_distance_threshold",
            p.max_distance_threshold,
            p.min_distance_threshold,
            10_000.0,
        )?;
        check_range("profile.edge_percent", p.edge_percent, 1.0, 50.0)?;
        check_range("profile.ascent_percent", p.ascent_percent, 0.0, 100.0)?;
        check_range("profile.descent_percent", p.descent_percent, 0.0, 100.0)?;
        check_range("profile.lift_angle", p.lift_angle, 1.0, 90.0)?;
        check_range("profile.arc_radius_percent", p.arc_radius_percent, 0.01, 1_000.0)?;
        check_range("profile.arc_segments", p.arc_segments as f64, 1.0, 64.0)?;

        check_range("output.precision", self.output.precision as f64, 1.0, 8.0)?;
        check_range("output.duplicate_epsilon", self.output.duplicate_epsilon, 1e-6, 1.0)?;

        Ok(())
    }

    /// Overlay every section of `other` that differs from the defaults
    pub fn merge(&mut self, other: &Config) {
        if other.general != GeneralSettings::default() {
            self.general = other.general.clone();
        }
        if other.layer_change != LayerChangeSettings::default() {
            self.layer_change = other.layer_change.clone();
        }
        if other.travel != TravelSettings::default() {
            self.travel = other.travel.clone();
        }
        if other.speed != SpeedSettings::default() {
            self.speed = other.speed.clone();
        }
        if other.profile != ProfileSettings::default() {
            self.profile = other.profile.clone();
        }
        if other.output != OutputSettings::default() {
            self.output = other.output.clone();
        }
    }

    /// `<config dir>/zhopkit/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("zhopkit").join("config.toml"))
    }

    /// Load the default config file, or defaults when it does not exist
    pub fn load_or_default() -> Result<Self> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load_from_file(&path),
            _ => Ok(Self::default()),
        }
    }
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default()
        .to_lowercase()
}

/// Read a layer list such as `"1 5 10"` or `"1,5,10"`
///
/// Tokens that are not layer numbers are skipped.
pub fn parse_layer_list(text: &str) -> Vec<u32> {
    let mut layers: Vec<u32> = text
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter_map(|token| token.trim().parse().ok())
        .collect();
    layers.sort_unstable();
    layers.dedup();
    layers
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LayerList {
    Numbers(Vec<u32>),
    Text(String),
}

fn deserialize_layer_list<'de, D>(deserializer: D) -> std::result::Result<Vec<u32>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match LayerList::deserialize(deserializer)? {
        LayerList::Numbers(mut layers) => {
            layers.sort_unstable();
            layers.dedup();
            layers
        }
        LayerList::Text(text) => parse_layer_list(&text),
    })
}
