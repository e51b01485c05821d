//! Z speed limit around hops

use zhopkit_gcode::emit::speed_limit_line;
use zhopkit_gcode::EmbeddedSettings;
use zhopkit_settings::SpeedSettings;

/// Settings key holding the machine's maximum Z speed, mm/s
pub const MAX_Z_FEEDRATE_KEY: &str = "machine_max_feedrate_z";

/// Z speed assumed when nothing else is known, mm/s
pub const DEFAULT_MAX_Z_SPEED: f64 = 5.0;

/// Known Z speeds for one run
#[derive(Debug, Clone, PartialEq)]
pub struct SpeedState {
    /// Maximum Z speed declared by the program, mm/s
    pub machine_max: Option<f64>,
    /// Temporary limit while hopping, mm/s
    pub hop_speed: Option<f64>,
    /// Fallback when the program declares nothing, mm/s
    pub default_max: f64,
}

impl SpeedState {
    /// Read the machine limit from embedded settings
    pub fn new(embedded: &EmbeddedSettings, settings: &SpeedSettings) -> Self {
        let machine_max = embedded
            .get_f64(MAX_Z_FEEDRATE_KEY)
            .filter(|speed| *speed > 0.0);
        let default_max = if settings.default_max_z_speed > 0.0 {
            settings.default_max_z_speed
        } else {
            DEFAULT_MAX_Z_SPEED
        };
        Self {
            machine_max,
            hop_speed: settings.hop_speed.filter(|speed| *speed > 0.0),
            default_max,
        }
    }

    /// Scan a whole document for the settings payload
    pub fn from_document(blocks: &[String], settings: &SpeedSettings) -> Self {
        let embedded = EmbeddedSettings::from_lines(blocks.iter().flat_map(|b| b.lines()));
        Self::new(&embedded, settings)
    }

    /// Z speed in force while a hop runs
    pub fn hop_z_limit(&self) -> f64 {
        self.hop_speed
            .or(self.machine_max)
            .unwrap_or(self.default_max)
    }

    /// Whether hops get an `M203` wrap
    ///
    /// Only when a hop speed is configured and the original limit is known,
    /// since the restore line needs a value to go back to.
    pub fn wraps(&self) -> bool {
        self.hop_speed.is_some() && self.machine_max.is_some()
    }

    /// Surround hop lines with the speed limit and its restore
    pub fn wrap(&self, lines: Vec<String>) -> Vec<String> {
        let (Some(hop), Some(original)) = (self.hop_speed, self.machine_max) else {
            return lines;
        };
        let mut wrapped = Vec::with_capacity(lines.len() + 2);
        wrapped.push(speed_limit_line(hop, "Smart Z-Hop Speed Limit"));
        wrapped.extend(lines);
        wrapped.push(speed_limit_line(original, "Smart Z-Hop Speed Restore"));
        wrapped
    }
}
