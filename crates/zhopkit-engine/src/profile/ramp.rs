//! Three-stage ramp: straight lift, plateau, held descent
//!
//! Shared by the percentage model (spans as shares of the path) and the angle
//! model (spans from a lift angle).

use super::{linear_height, HeightProfile, StageLayout};
use zhopkit_settings::ProfileSettings;

/// Angles at or above this are treated as a vertical lift
pub const VERTICAL_ANGLE_DEG: f64 = 89.5;

/// Horizontal run needed to climb `height` at `angle_deg`
pub fn horizontal_run(height: f64, angle_deg: f64) -> f64 {
    if angle_deg >= VERTICAL_ANGLE_DEG {
        return 0.0;
    }
    height / angle_deg.to_radians().tan()
}

/// Linear lift to the peak over the ascent span, then flat
#[derive(Debug, Clone)]
pub struct RampProfile {
    name: &'static str,
    layout: StageLayout,
    peak: f64,
}

impl RampProfile {
    /// Ascent and descent as percentages of the path
    pub fn percentage(total: f64, max_height: f64, settings: &ProfileSettings) -> Self {
        Self {
            name: "percentage",
            layout: StageLayout::from_ratios(
                total,
                settings.ascent_percent / 100.0,
                settings.descent_percent / 100.0,
            ),
            peak: max_height,
        }
    }

    /// Ascent and descent spans from the lift angle
    ///
    /// Without angle priority the peak comes from the path length and the
    /// slope steepens when both runs do not fit. With angle priority the slope
    /// is kept and the peak drops instead, never rising above `max_height`.
    pub fn angle(total: f64, max_height: f64, settings: &ProfileSettings) -> Self {
        let angle = settings.lift_angle;
        let half = total / 2.0;

        let (peak, run) = if settings.angle_priority {
            let run = horizontal_run(max_height, angle);
            if run > half {
                let peak = (half * angle.to_radians().tan()).min(max_height);
                (peak, half)
            } else {
                (max_height, run)
            }
        } else {
            let peak = linear_height(total, max_height, settings);
            (peak, horizontal_run(peak, angle).min(half))
        };

        Self {
            name: "angle",
            layout: StageLayout::new(total, run, total - run),
            peak,
        }
    }
}

impl HeightProfile for RampProfile {
    fn name(&self) -> &str {
        self.name
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
        if distance < ascent {
            self.peak * distance / ascent
        } else {
            self.peak
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> ProfileSettings {
        ProfileSettings::default()
    }

    #[test]
    fn test_percentage_stages() {
        let profile = RampProfile::percentage(27.0, 0.4, &settings());
        let layout = profile.layout();
        assert!((layout.ascent_end - 8.1).abs() < 1e-9);
        assert!((layout.descent_start - 18.9).abs() < 1e-9);
        assert!((profile.offset(4.05) - 0.2).abs() < 1e-12);
        assert_eq!(profile.offset(8.1), 0.4);
        assert_eq!(profile.offset(20.0), 0.4);
        assert_eq!(profile.offset(27.0), 0.4);
    }

    #[test]
    fn test_percentage_over_full_clamps_plateau() {
        let s = ProfileSettings {
            ascent_percent: 80.0,
            descent_percent: 50.0,
            ..settings()
        };
        let profile = RampProfile::percentage(10.0, 0.4, &s);
        assert_eq!(profile.layout().ascent_end, 8.0);
        assert_eq!(profile.layout().descent_start, 8.0);
    }

    #[test]
    fn test_zero_ascent_lifts_immediately() {
        let s = ProfileSettings {
            ascent_percent: 0.0,
            ..settings()
        };
        let profile = RampProfile::percentage(10.0, 0.4, &s);
        assert_eq!(profile.offset(0.0), 0.0);
        assert_eq!(profile.offset(1e-6), 0.4);
    }

    #[test]
    fn test_horizontal_run() {
        assert!((horizontal_run(0.4, 45.0) - 0.4).abs() < 1e-12);
        assert_eq!(horizontal_run(0.4, 89.5), 0.0);
        assert_eq!(horizontal_run(0.4, 90.0), 0.0);
        assert!(horizontal_run(0.4, 10.0) > 2.0);
    }

    #[test]
    fn test_angle_height_from_distance() {
        // 40 mm path: linear height 0.25, 45 degrees gives a 0.25 mm run
        let profile = RampProfile::angle(40.0, 0.4, &settings());
        assert!((profile.peak() - 0.25).abs() < 1e-12);
        assert!((profile.layout().ascent_end - 0.25).abs() < 1e-12);
        assert!((profile.layout().descent_start - 39.75).abs() < 1e-12);
    }

    #[test]
    fn test_angle_steepens_on_short_path() {
        let s = ProfileSettings {
            lift_angle: 5.0,
            ..settings()
        };
        let profile = RampProfile::angle(2.0, 0.4, &s);
        assert_eq!(profile.layout().ascent_end, 1.0);
        assert_eq!(profile.layout().descent_start, 1.0);
        assert_eq!(profile.peak(), linear_height(2.0, 0.4, &s));
    }

    #[test]
    fn test_angle_priority_keeps_slope_under_ceiling() {
        let s = ProfileSettings {
            lift_angle: 5.0,
            angle_priority: true,
            ..settings()
        };
        let short = RampProfile::angle(2.0, 0.4, &s);
        let expected = 1.0 * 5f64.to_radians().tan();
        assert!((short.peak() - expected).abs() < 1e-12);
        assert!(short.peak() < 0.4);

        let long = RampProfile::angle(100.0, 0.4, &s);
        assert_eq!(long.peak(), 0.4);
        assert!((long.layout().ascent_end - horizontal_run(0.4, 5.0)).abs() < 1e-9);
    }

    #[test]
    fn test_vertical_angle() {
        let s = ProfileSettings {
            lift_angle: 90.0,
            angle_priority: true,
            ..settings()
        };
        let profile = RampProfile::angle(10.0, 0.4, &s);
        assert_eq!(profile.layout().ascent_end, 0.0);
        assert_eq!(profile.layout().descent_start, 10.0);
        assert_eq!(profile.offset(0.001), 0.4);
    }
}
