//! Circular-arc ascent
//!
//! The ascent is drawn in normalized coordinates: `u` is the share of the
//! ascent span covered and `v` the share of the peak reached. The curve is
//! the lower arc of a circle through (0, 0) and (1, 1), so it starts flat and
//! steepens toward the plateau. The radius is given as a percentage where
//! 100% means a radius of `sqrt(2) * 100 / p` chord units; at 200% and above
//! the circle is the semicircle on the chord.
//!
//! Tight radii put the circle's center to the right of the start, and the arc
//! then sags below its starting height. Those parts are clipped to the floor
//! and the point where the arc climbs back out (the crossover) becomes a
//! breakpoint of its own.

use std::f64::consts::SQRT_2;

use super::{HeightProfile, StageLayout};
use zhopkit_settings::ProfileSettings;

/// Radius percentage giving the tightest arc (a semicircle on the chord)
pub const SEMICIRCLE_PERCENT: f64 = 200.0;

/// Circle through (0, 0) and (1, 1) bending below the chord
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArcShape {
    radius: f64,
    center_u: f64,
    center_v: f64,
}

impl ArcShape {
    /// Shape for a radius percentage; non-positive values give a near-straight arc
    pub fn new(radius_percent: f64) -> Self {
        let percent = radius_percent.clamp(1e-6, SEMICIRCLE_PERCENT);
        let radius = (SQRT_2 * 100.0 / percent).max(SQRT_2 / 2.0);
        let offset = (radius * radius - 0.5).max(0.0).sqrt() / SQRT_2;
        Self {
            radius,
            center_u: 0.5 - offset,
            center_v: 0.5 + offset,
        }
    }

    /// Radius in chord units
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Unclipped height share at `u`; may be negative where the arc sags
    pub fn fraction(&self, u: f64) -> f64 {
        let du = u - self.center_u;
        self.center_v - (self.radius * self.radius - du * du).max(0.0).sqrt()
    }

    /// Lowest unclipped value over `0 <= u <= 1`
    pub fn min_value(&self) -> f64 {
        if self.center_u > 1e-12 && self.center_u < 1.0 {
            self.center_v - self.radius
        } else {
            self.fraction(0.0).min(self.fraction(1.0))
        }
    }

    /// Where the arc rises back through `floor` after sagging under it
    pub fn crossover(&self, floor: f64) -> Option<f64> {
        if self.center_u <= 1e-12 || self.center_v - self.radius >= floor {
            return None;
        }
        let dv = self.center_v - floor;
        let u = self.center_u + (self.radius * self.radius - dv * dv).max(0.0).sqrt();
        (u > 0.0 && u <= 1.0 + 1e-9).then(|| u.min(1.0))
    }
}

/// Largest radius percentage whose arc never drops below `floor`
///
/// `floor` is in height shares, so 0 means "never below the start".
pub fn max_safe_radius_percent(floor: f64) -> f64 {
    if floor >= 0.0 {
        return SQRT_2 * 100.0;
    }
    if ArcShape::new(SEMICIRCLE_PERCENT).min_value() >= floor {
        return SEMICIRCLE_PERCENT;
    }
    let (mut lo, mut hi) = (SQRT_2 * 100.0, SEMICIRCLE_PERCENT);
    for _ in 0..60 {
        let mid = (lo + hi) / 2.0;
        if ArcShape::new(mid).min_value() >= floor {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    lo
}

/// Arc ascent, plateau, held descent
#[derive(Debug, Clone)]
pub struct ArcProfile {
    layout: StageLayout,
    peak: f64,
    shape: ArcShape,
    segments: u32,
}

impl ArcProfile {
    /// Profile for a path of `total` mm
    pub fn new(total: f64, max_height: f64, settings: &ProfileSettings) -> Self {
        let mut percent = settings.arc_radius_percent;
        if settings.arc_limit_radius {
            percent = percent.min(max_safe_radius_percent(0.0));
        }
        Self {
            layout: StageLayout::from_ratios(
                total,
                settings.ascent_percent / 100.0,
                settings.descent_percent / 100.0,
            ),
            peak: max_height,
            shape: ArcShape::new(percent),
            segments: settings.arc_segments.max(1),
        }
    }

    /// Underlying circle
    pub fn shape(&self) -> &ArcShape {
        &self.shape
    }

    /// Crossover distance along the path, if the arc sags
    pub fn crossover_distance(&self) -> Option<f64> {
        self.shape
            .crossover(0.0)
            .map(|u| u * self.layout.ascent_end)
    }
}

impl HeightProfile for ArcProfile {
    fn name(&self) -> &str {
        "arc"
    }

    fn layout(&self) -> &StageLayout {
        &self.layout
    }

    fn peak(&self) -> f64 {
        self.peak
    }

    fn offset(&self, distance: f64) -> f64 {
        if distance <= 0.0 {
            return 0.0;
        }
        let ascent = self.layout.ascent_end;
        if distance >= ascent {
            return self.peak;
        }
        self.peak * self.shape.fraction(distance / ascent).clamp(0.0, 1.0)
    }

    fn breakpoints(&self) -> Vec<f64> {
        let ascent = self.layout.ascent_end;
        let mut points: Vec<f64> = (1..self.segments)
            .map(|k| ascent * f64::from(k) / f64::from(self.segments))
            .collect();
        points.extend(self.crossover_distance());
        points.extend(self.layout.boundaries());
        points.retain(|d| *d > 0.0 && *d < self.layout.total);
        points.sort_by(f64::total_cmp);
        points.dedup_by(|a, b| (*a - *b).abs() < 1e-9);
        points
    }
}
