//! Height profiles
//!
//! A profile maps cumulative travel distance to the Z offset added on top of
//! the travel path. Every model keeps `0 <= offset <= peak <= max_height`,
//! returns exactly 0 at distance 0, rises monotonically through the ascent
//! stage, and holds its peak through the descent stage. The real descent
//! is the corrective move the segmenter appends at the end of the path.

pub mod arc;
pub mod linear;
pub mod ramp;

pub use arc::{max_safe_radius_percent, ArcProfile, ArcShape};
pub use linear::{linear_height, LinearProfile};
pub use ramp::RampProfile;

use serde::{Deserialize, Serialize};
use zhopkit_core::{ProfileError, Result};
use zhopkit_settings::{ProfileModel, ProfileSettings};

/// Part of the path a point belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
    /// Rising
    Ascent,
    /// Holding the peak
    Travel,
    /// Past the nominal descent start
    Descent,
}

impl Stage {
    /// Comment written on synthesized moves
    pub fn label(&self) -> &'static str {
        match self {
            Stage::Ascent => "Smart Ascent",
            Stage::Travel => "Smart Travel",
            Stage::Descent => "Smart Descent",
        }
    }
}

/// Stage boundaries along a path
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StageLayout {
    /// Total planar distance
    pub total: f64,
    /// Ascent to plateau
    pub ascent_end: f64,
    /// Plateau to descent
    pub descent_start: f64,
}

impl StageLayout {
    /// Layout with `0 <= ascent_end <= descent_start <= total`
    ///
    /// Overlapping spans collapse the plateau to zero width.
    pub fn new(total: f64, ascent_end: f64, descent_start: f64) -> Self {
        let total = total.max(0.0);
        let ascent_end = ascent_end.clamp(0.0, total);
        let descent_start = descent_start.clamp(ascent_end, total);
        Self {
            total,
            ascent_end,
            descent_start,
        }
    }

    /// Layout from ascent and descent shares of the path
    pub fn from_ratios(total: f64, ascent: f64, descent: f64) -> Self {
        let ascent_end = total * ascent.clamp(0.0, 1.0);
        let descent_start = total * (1.0 - descent.clamp(0.0, 1.0));
        Self::new(total, ascent_end, descent_start.max(ascent_end))
    }

    /// Stage at a distance
    pub fn stage_at(&self, distance: f64) -> Stage {
        if distance <= self.ascent_end {
            Stage::Ascent
        } else if distance <= self.descent_start {
            Stage::Travel
        } else {
            Stage::Descent
        }
    }

    /// Boundaries strictly inside the path
    pub fn boundaries(&self) -> Vec<f64> {
        let mut points = Vec::with_capacity(2);
        for d in [self.ascent_end, self.descent_start] {
            if d > 0.0 && d < self.total && points.last() != Some(&d) {
                points.push(d);
            }
        }
        points
    }
}

/// A height profile over one travel path
pub trait HeightProfile: Send + Sync {
    /// Model name for logs
    fn name(&self) -> &str;

    /// Stage boundaries
    fn layout(&self) -> &StageLayout;

    /// Highest offset this profile produces
    fn peak(&self) -> f64;

    /// Z offset at a cumulative distance
    fn offset(&self, distance: f64) -> f64;

    /// Distances where the path must get a point of its own
    fn breakpoints(&self) -> Vec<f64> {
        self.layout().boundaries()
    }
}

/// Zero everywhere; used for paths with no length
#[derive(Debug, Clone)]
pub struct FlatProfile {
    layout: StageLayout,
}

impl FlatProfile {
    /// Flat profile over `total`
    pub fn new(total: f64) -> Self {
        Self {
            layout: StageLayout::new(total, 0.0, total),
        }
    }
}

impl HeightProfile for FlatProfile {
    fn name(&self) -> &str {
        "flat"
    }

    fn layout(&self) -> &StageLayout {
        &self.layout
    }

    fn peak(&self) -> f64 {
        0.0
    }

    fn offset(&self, _distance: f64) -> f64 {
        0.0
    }
}

/// Build the profile for a path of `total` mm with ceiling `max_height`
pub fn build_profile(
    model: &ProfileModel,
    total: f64,
    max_height: f64,
    settings: &ProfileSettings,
) -> Result<Box<dyn HeightProfile>> {
    if !(total.is_finite() && max_height.is_finite()) {
        return Err(ProfileError::NonFinite {
            quantity: "path length or height".to_string(),
            distance: total,
        }
        .into());
    }
    if total <= 0.0 || max_height <= 0.0 {
        return Ok(Box::new(FlatProfile::new(total)));
    }

    let profile: Box<dyn HeightProfile> = match model {
        ProfileModel::Linear => Box::new(LinearProfile::new(total, max_height, settings)),
        ProfileModel::Percentage => Box::new(RampProfile::percentage(total, max_height, settings)),
        ProfileModel::Angle => Box::new(RampProfile::angle(total, max_height, settings)),
        ProfileModel::Arc => Box::new(ArcProfile::new(total, max_height, settings)),
        ProfileModel::Unrecognized(name) => {
            return Err(ProfileError::InvalidParameter {
                model: name.clone(),
                name: "model".to_string(),
                reason: "unknown profile model".to_string(),
            }
            .into())
        }
    };
    Ok(profile)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODELS: [ProfileModel; 4] = [
        ProfileModel::Linear,
        ProfileModel::Percentage,
        ProfileModel::Angle,
        ProfileModel::Arc,
    ];

    #[test]
    fn test_layout_collapses_overlap() {
        let layout = StageLayout::from_ratios(10.0, 0.7, 0.6);
        assert_eq!(layout.ascent_end, 7.0);
        assert_eq!(layout.descent_start, 7.0);
        assert_eq!(layout.boundaries(), vec![7.0]);
    }

    #[test]
    fn test_layout_stages() {
        let layout = StageLayout::from_ratios(10.0, 0.3, 0.3);
        assert_eq!(layout.stage_at(0.0), Stage::Ascent);
        assert_eq!(layout.stage_at(3.0), Stage::Ascent);
        assert_eq!(layout.stage_at(5.0), Stage::Travel);
        assert_eq!(layout.stage_at(7.0), Stage::Travel);
        assert_eq!(layout.stage_at(7.5), Stage::Descent);
        assert_eq!(layout.boundaries(), vec![3.0, 7.0]);
    }

    #[test]
    fn test_degenerate_total_is_flat() {
        let settings = ProfileSettings::default();
        for model in MODELS {
            for total in [0.0, -3.0] {
                let profile = build_profile(&model, total, 0.4, &settings).unwrap();
                assert_eq!(profile.offset(0.0), 0.0);
                assert_eq!(profile.offset(1.0), 0.0);
                assert!(profile.breakpoints().is_empty());
            }
        }
    }

    #[test]
    fn test_non_finite_rejected() {
        let settings = ProfileSettings::default();
        assert!(build_profile(&ProfileModel::Linear, f64::NAN, 0.4, &settings).is_err());
        assert!(build_profile(&ProfileModel::Linear, 10.0, f64::INFINITY, &settings).is_err());
    }

    #[test]
    fn test_unrecognized_model_rejected() {
        let settings = ProfileSettings::default();
        let model = ProfileModel::Unrecognized("spline".to_string());
        assert!(build_profile(&model, 10.0, 0.4, &settings).is_err());
    }

    #[test]
    fn test_every_model_starts_at_zero_and_stays_under_ceiling() {
        let settings = ProfileSettings::default();
        for model in MODELS {
            for total in [0.5, 5.0, 27.0, 42.43, 200.0] {
                let profile = build_profile(&model, total, 0.4, &settings).unwrap();
                assert_eq!(profile.offset(0.0), 0.0, "{model} at d=0");
                let mut d = 0.0;
                while d <= total {
                    let offset = profile.offset(d);
                    assert!((0.0..=0.4 + 1e-12).contains(&offset), "{model} {d} {offset}");
                    d += total / 97.0;
                }
            }
        }
    }

    #[test]
    fn test_stage_labels() {
        assert_eq!(Stage::Ascent.label(), "Smart Ascent");
        assert_eq!(Stage::Travel.label(), "Smart Travel");
        assert_eq!(Stage::Descent.label(), "Smart Descent");
    }
}
