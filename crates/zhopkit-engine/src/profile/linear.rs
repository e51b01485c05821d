//! Distance-scaled flat hop

use super::{HeightProfile, StageLayout};
use zhopkit_settings::ProfileSettings;

/// Hop height for a path of `total` mm
///
/// `min_height` up to the lower threshold, `max_height` from the upper
/// threshold on, linear in between.
pub fn linear_height(total: f64, max_height: f64, settings: &ProfileSettings) -> f64 {
    let low = settings.min_height.min(max_height);
    let (min_d, max_d) = (
        settings.min_distance_threshold,
        settings.max_distance_threshold,
    );
    if total <= min_d {
        low
    } else if total >= max_d {
        max_height
    } else {
        low + (max_height - low) * (total - min_d) / (max_d - min_d)
    }
}

/// One height for the whole path, chosen from its length
///
/// The first `edge_percent` of the path is the lift and the last
/// `edge_percent` is the drop.
#[derive(Debug, Clone)]
pub struct LinearProfile {
    layout: StageLayout,
    height: f64,
}

impl LinearProfile {
    /// Profile for a path of `total` mm
    pub fn new(total: f64, max_height: f64, settings: &ProfileSettings) -> Self {
        let edge = (settings.edge_percent / 100.0).clamp(0.0, 0.5);
        Self {
            layout: StageLayout::from_ratios(total, edge, edge),
            height: linear_height(total, max_height, settings),
        }
    }
}

impl HeightProfile for LinearProfile {
    fn name(&self) -> &str {
        "linear"
    }

    fn layout(&self) -> &StageLayout {
        &self.layout
    }

    fn peak(&self) -> f64 {
        self.height
    }

    fn offset(&self, distance: f64) -> f64 {
        if distance <= 0.0 {
            0.0
        } else {
            self.height
        }
    }
}
