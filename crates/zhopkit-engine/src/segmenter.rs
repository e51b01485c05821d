//! Path segmenter and re-emitter
//!
//! Turns a travel sequence plus a height profile into replacement G-code.
//! Segments are split at every profile breakpoint so stage transitions land
//! on emitted points, points that collapse onto the same XY cell are dropped,
//! and runs that stay on one straight 3D line are merged. The last point is
//! always the original end position.
//!
//! A stage with no length becomes a pure Z move: a profile without an ascent
//! span lifts straight up at the start, and one without a descent span holds
//! the peak over the end point and drops straight down. These are the only
//! consecutive points allowed to share an XY cell.

use zhopkit_core::units::{mm_per_sec_to_mm_per_min, round_to};
use zhopkit_core::Position;
use zhopkit_gcode::emit::{feed_line, format_number};
use zhopkit_gcode::{replace_axis, Move, MoveCommand};

use crate::profile::{HeightProfile, Stage};
use crate::travel::TravelSequence;

const COLLINEAR_TOLERANCE: f64 = 1e-6;

/// Z difference below which a pure Z move is not worth emitting, mm
const VERTICAL_TOLERANCE: f64 = 1e-9;

/// Comment on the feed line appended after a trajectory
pub const RESTORE_FEED_COMMENT: &str = "Restore Feed";

/// Knobs for re-emission
#[derive(Debug, Clone, PartialEq)]
pub struct EmitOptions {
    /// Decimal places for coordinates
    pub precision: u32,
    /// XY cell size for duplicate suppression, mm
    pub duplicate_epsilon: f64,
    /// Fixed feed rate for synthesized moves, mm/s
    pub z_feedrate: Option<f64>,
    /// Cap feed rates so the Z component stays under this speed, mm/s
    pub z_speed_cap: Option<f64>,
}

impl Default for EmitOptions {
    fn default() -> Self {
        Self {
            precision: 5,
            duplicate_epsilon: 1e-3,
            z_feedrate: None,
            z_speed_cap: None,
        }
    }
}

/// One point of the lifted path
#[derive(Debug, Clone, PartialEq)]
pub struct TrajectoryPoint {
    /// Target position, Z already lifted
    pub position: Position,
    /// Cumulative planar distance
    pub distance: f64,
    /// Stage label
    pub stage: Stage,
    /// Feed rate of the originating segment, mm/min
    pub feedrate: f64,
}

fn cell(position: &Position, epsilon: f64) -> (i64, i64) {
    let epsilon = if epsilon > 0.0 { epsilon } else { 1e-3 };
    (
        (position.x / epsilon).round() as i64,
        (position.y / epsilon).round() as i64,
    )
}

/// Sample the profile along the sequence
///
/// The result is never empty for a non-empty sequence and always ends with
/// the exact end position of the last move.
pub fn build_trajectory(
    seq: &TravelSequence,
    profile: &dyn HeightProfile,
    duplicate_epsilon: f64,
) -> Vec<TrajectoryPoint> {
    let floor = seq.floor_z();
    let layout = *profile.layout();
    let breakpoints = profile.breakpoints();
    let peak = profile.peak();
    let mut points: Vec<TrajectoryPoint> = Vec::new();

    if let Some(first) = seq.segments.first() {
        if layout.ascent_end <= 0.0 && peak > 0.0 {
            points.push(TrajectoryPoint {
                position: seq.start.with_z((seq.start.z + peak).max(floor)),
                distance: 0.0,
                stage: Stage::Ascent,
                feedrate: first.feedrate,
            });
        }
    }
    let hold_over_end = layout.descent_start >= layout.total && peak > 0.0;

    let lifted = |base: Position, distance: f64, feedrate: f64| {
        let z = (base.z + profile.offset(distance)).max(floor);
        TrajectoryPoint {
            position: base.with_z(z),
            distance,
            stage: layout.stage_at(distance),
            feedrate,
        }
    };

    let same_cell =
        |a: &Position, b: &Position| cell(a, duplicate_epsilon) == cell(b, duplicate_epsilon);
    let push = |points: &mut Vec<TrajectoryPoint>, point: TrajectoryPoint| {
        let previous = points.last().map_or(seq.start, |p| p.position);
        if !same_cell(&previous, &point.position) {
            points.push(point);
        } else if point.position.z > previous.z + VERTICAL_TOLERANCE {
            // the higher point wins so a climb is never cut short
            if let Some(last) = points.last_mut() {
                *last = point;
            }
        }
    };

    let last = seq.segments.len().saturating_sub(1);
    for (index, segment) in seq.segments.iter().enumerate() {
        let from = segment.cumulative - segment.length;
        if segment.length > 0.0 {
            for &d in breakpoints
                .iter()
                .filter(|d| **d > from && **d < segment.cumulative)
            {
                let t = (d - from) / segment.length;
                let base = segment.start.lerp(&segment.end, t);
                push(&mut points, lifted(base, d, segment.feedrate));
            }
        }

        if index == last {
            if hold_over_end {
                push(
                    &mut points,
                    lifted(segment.end, segment.cumulative, segment.feedrate),
                );
            }
            let terminal = TrajectoryPoint {
                position: segment.end,
                distance: segment.cumulative,
                stage: Stage::Descent,
                feedrate: segment.feedrate,
            };
            let duplicate = points
                .last()
                .is_some_and(|p| same_cell(&p.position, &terminal.position));
            if duplicate {
                // keep the height over the exact end point; the terminal drops straight down
                if let Some(held) = points.pop() {
                    if held.position.z - terminal.position.z > VERTICAL_TOLERANCE {
                        points.push(TrajectoryPoint {
                            position: terminal.position.with_z(held.position.z),
                            ..held
                        });
                    }
                }
            }
            points.push(terminal);
        } else {
            push(
                &mut points,
                lifted(segment.end, segment.cumulative, segment.feedrate),
            );
        }
    }
    points
}

/// Drop interior points lying on the straight 3D line through their
/// neighbours, when the feed rate does not change there
pub fn simplify_collinear(start: Position, points: Vec<TrajectoryPoint>) -> Vec<TrajectoryPoint> {
    if points.len() < 2 {
        return points;
    }
    let mut kept: Vec<TrajectoryPoint> = Vec::with_capacity(points.len());
    let count = points.len();
    let mut iter = points.into_iter().peekable();
    let mut index = 0;
    while let Some(point) = iter.next() {
        index += 1;
        if index < count {
            if let Some(next) = iter.peek() {
                let previous = kept.last().map_or(start, |p| p.position);
                if point.feedrate == next.feedrate
                    && on_line(&previous, &point.position, &next.position)
                {
                    continue;
                }
            }
        }
        kept.push(point);
    }
    kept
}

fn on_line(a: &Position, b: &Position, c: &Position) -> bool {
    let (ux, uy) = (b.x - a.x, b.y - a.y);
    let (vx, vy) = (c.x - b.x, c.y - b.y);
    let (lu, lv) = (ux.hypot(uy), vx.hypot(vy));
    if lu == 0.0 || lv == 0.0 {
        return false;
    }
    let cross = ux * vy - uy * vx;
    let dot = ux * vx + uy * vy;
    if cross.abs() > COLLINEAR_TOLERANCE * lu * lv || dot <= 0.0 {
        return false;
    }
    let expected = a.z + (c.z - a.z) * lu / (lu + lv);
    (b.z - expected).abs() <= COLLINEAR_TOLERANCE
}

/// Render trajectory points as G1 lines
///
/// Z is written only when its printed value changes and F only on the first line or when
/// it changes. A feed restore line follows if the last written F differs
/// from the one the original lines left in effect.
pub fn emit_trajectory(
    seq: &TravelSequence,
    points: &[TrajectoryPoint],
    options: &EmitOptions,
) -> Vec<String> {
    let mut lines = Vec::with_capacity(points.len() + 1);
    let mut current = seq.start;
    let mut written_z = round_to(seq.start.z, options.precision);
    let mut written_feed: Option<f64> = None;

    for point in points {
        let target = point.position;
        let mut feed = options
            .z_feedrate
            .map_or(point.feedrate, mm_per_sec_to_mm_per_min);
        if let Some(limit) = options.z_speed_cap {
            let dz = (target.z - current.z).abs();
            if dz > 1e-9 && limit > 0.0 {
                let length = current.distance_to(&target);
                feed = feed.min(mm_per_sec_to_mm_per_min(limit) * length / dz);
            }
        }

        let mut mv = Move::new(MoveCommand::Linear).xy(target.x, target.y);
        let z = round_to(target.z, options.precision);
        if z != written_z {
            mv = mv.z(target.z);
            written_z = z;
        }
        let feed_changed = written_feed.map_or(true, |f| !same_feed(f, feed));
        if feed_changed {
            mv = mv.feed(Some(feed));
            written_feed = Some(feed);
        }
        lines.push(mv.comment(point.stage.label()).to_line(options.precision));
        current = target;
    }

    if let Some(f) = written_feed {
        let exit = seq.exit_feedrate();
        if !same_feed(f, exit) {
            lines.push(feed_line(exit, RESTORE_FEED_COMMENT));
        }
    }
    lines
}

fn same_feed(a: f64, b: f64) -> bool {
    (a - b).abs() < 0.05
}

/// Curved hop over the whole sequence
pub fn slingshot_lines(
    seq: &TravelSequence,
    profile: &dyn HeightProfile,
    options: &EmitOptions,
) -> Vec<String> {
    let points = build_trajectory(seq, profile, options.duplicate_epsilon);
    let points = simplify_collinear(seq.start, points);
    emit_trajectory(seq, &points, options)
}

/// Vertical lift, original moves raised by `height`, vertical drop
///
/// With a fixed Z feed rate the lift and drop carry it and the original feed
/// is restored after each.
pub fn vertical_hop_lines(seq: &TravelSequence, height: f64, options: &EmitOptions) -> Vec<String> {
    let z_feed = options.z_feedrate.map(mm_per_sec_to_mm_per_min);
    let mut lines = Vec::with_capacity(seq.len() + 4);
    lines.push(
        Move::new(MoveCommand::Rapid)
            .z(seq.start.z + height)
            .feed(z_feed)
            .comment(format!("Smart Z-Hop Up (D:{:.2})", seq.total_distance()))
            .to_line(options.precision),
    );
    if z_feed.is_some() {
        lines.push(feed_line(seq.entry_feedrate, RESTORE_FEED_COMMENT));
    }
    for segment in &seq.segments {
        let raw = segment.line.raw.as_str();
        let raised = segment.line.z.and_then(|z| {
            replace_axis(raw, 'Z', &format_number(z + height, options.precision))
        });
        lines.push(raised.unwrap_or_else(|| raw.to_string()));
    }
    lines.push(
        Move::new(MoveCommand::Rapid)
            .z(seq.end().z)
            .feed(z_feed)
            .comment("Smart Z-Hop Down")
            .to_line(options.precision),
    );
    if z_feed.is_some() {
        lines.push(feed_line(seq.exit_feedrate(), RESTORE_FEED_COMMENT));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{build_profile, FlatProfile};
    use zhopkit_gcode::MotionLine;
    use zhopkit_settings::{ProfileModel, ProfileSettings};

    fn sequence(start: Position, moves: &[(f64, f64, f64)], feed: f64) -> TravelSequence {
        let mut seq = TravelSequence::open(start, feed, false);
        for &(x, y, z) in moves {
            let raw = format!("G0 X{x} Y{y}");
            seq.push(MotionLine::parse(&raw), Position::new(x, y, z), feed);
        }
        seq
    }

    fn profile(model: ProfileModel, total: f64) -> Box<dyn HeightProfile> {
        build_profile(&model, total, 0.4, &ProfileSettings::default()).unwrap()
    }

    #[test]
    fn test_single_move_linear_lift_travel_descent() {
        let seq = sequence(
            Position::new(100.0, 100.0, 0.2),
            &[(130.0, 130.0, 0.2)],
            9000.0,
        );
        let profile = profile(ProfileModel::Linear, seq.total_distance());
        let lines = slingshot_lines(&seq, profile.as_ref(), &EmitOptions::default());
        assert_eq!(lines.len(), 3, "{lines:#?}");
        assert!(lines[0].ends_with("; Smart Ascent"));
        assert!(lines[0].contains("F9000"));
        assert!(lines[1].ends_with("; Smart Travel"));
        assert!(!lines[1].contains('F'));
        assert_eq!(lines[2], "G1 X130 Y130 Z0.2 ; Smart Descent");
    }

    #[test]
    fn test_boundary_points_split_segments() {
        let seq = sequence(Position::new(0.0, 0.0, 1.0), &[(10.0, 0.0, 1.0)], 3000.0);
        let profile = profile(ProfileModel::Percentage, 10.0);
        let points = build_trajectory(&seq, profile.as_ref(), 1e-3);
        assert_eq!(points.len(), 3);
        assert!((points[0].distance - 3.0).abs() < 1e-9);
        assert!((points[1].distance - 7.0).abs() < 1e-9);
        assert_eq!(points[2].distance, 10.0);
        assert!((points[0].position.x - 3.0).abs() < 1e-12);
        assert!((points[0].position.z - 1.4).abs() < 1e-12);
        assert_eq!(points[2].position, Position::new(10.0, 0.0, 1.0));
        assert_eq!(points[2].stage, Stage::Descent);
    }

    #[test]
    fn test_collinear_moves_collapse() {
        let moves: Vec<(f64, f64, f64)> = (1..=5).map(|i| (5.4 * i as f64, 0.0, 0.3)).collect();
        let seq = sequence(Position::new(0.0, 0.0, 0.3), &moves, 6000.0);
        let profile = profile(ProfileModel::Percentage, seq.total_distance());
        let points = simplify_collinear(
            seq.start,
            build_trajectory(&seq, profile.as_ref(), 1e-3),
        );
        // ascent end, last held point, end
        assert_eq!(points.len(), 3, "{points:#?}");
    }

    #[test]
    fn test_turns_are_kept() {
        let seq = sequence(
            Position::new(0.0, 0.0, 0.3),
            &[(10.0, 0.0, 0.3), (10.0, 10.0, 0.3), (20.0, 10.0, 0.3)],
            6000.0,
        );
        let profile = profile(ProfileModel::Percentage, 30.0);
        let points = simplify_collinear(
            seq.start,
            build_trajectory(&seq, profile.as_ref(), 1e-3),
        );
        assert!(points.iter().any(|p| p.position.x == 10.0 && p.position.y == 0.0));
        assert!(points.iter().any(|p| p.position.x == 10.0 && p.position.y == 10.0));
    }

    #[test]
    fn test_duplicate_xy_suppressed() {
        let seq = sequence(
            Position::new(0.0, 0.0, 0.3),
            &[(10.0, 0.0, 0.3), (10.0004, 0.0, 0.3), (20.0, 0.0, 0.3)],
            6000.0,
        );
        let profile = profile(ProfileModel::Linear, seq.total_distance());
        let points = build_trajectory(&seq, profile.as_ref(), 1e-3);
        for pair in points.windows(2) {
            assert_ne!(cell(&pair[0].position, 1e-3), cell(&pair[1].position, 1e-3));
        }
    }

    #[test]
    fn test_held_point_snaps_over_end() {
        // breakpoint lands within the duplicate cell of the end point
        let seq = sequence(Position::new(0.0, 0.0, 0.3), &[(10.0, 0.0, 0.3)], 6000.0);
        let settings = ProfileSettings {
            descent_percent: 0.00001,
            ..ProfileSettings::default()
        };
        let profile = build_profile(&ProfileModel::Percentage, 10.0, 0.4, &settings).unwrap();
        let points = build_trajectory(&seq, profile.as_ref(), 1e-3);
        assert_eq!(points.len(), 3);
        assert!((points[1].position.z - 0.7).abs() < 1e-12);
        assert_eq!((points[1].position.x, points[1].position.y), (10.0, 0.0));
        assert_eq!(points[2].position, Position::new(10.0, 0.0, 0.3));
    }

    #[test]
    fn test_terminal_replaces_duplicate_at_same_height() {
        let seq = sequence(
            Position::new(0.0, 0.0, 0.3),
            &[(10.0, 0.0, 0.3), (10.0004, 0.0, 0.3)],
            6000.0,
        );
        let profile = FlatProfile::new(seq.total_distance());
        let points = build_trajectory(&seq, &profile, 1e-3);
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].position, Position::new(10.0004, 0.0, 0.3));
    }

    fn lines_for(settings: ProfileSettings, model: ProfileModel) -> Vec<String> {
        let seq = sequence(Position::new(0.0, 0.0, 0.3), &[(40.0, 0.0, 0.3)], 9000.0);
        let profile = build_profile(&model, 40.0, 0.4, &settings).unwrap();
        slingshot_lines(&seq, profile.as_ref(), &EmitOptions::default())
    }

    #[test]
    fn test_vertical_angle_lifts_at_start() {
        let settings = ProfileSettings {
            lift_angle: 90.0,
            angle_priority: true,
            ..ProfileSettings::default()
        };
        let lines = lines_for(settings, ProfileModel::Angle);
        assert_eq!(
            lines,
            vec![
                "G1 X0 Y0 Z0.7 F9000 ; Smart Ascent",
                "G1 X40 Y0 ; Smart Travel",
                "G1 X40 Y0 Z0.3 ; Smart Descent",
            ]
        );
    }

    #[test]
    fn test_full_ascent_holds_over_end() {
        let settings = ProfileSettings {
            ascent_percent: 100.0,
            ..ProfileSettings::default()
        };
        let lines = lines_for(settings, ProfileModel::Percentage);
        assert_eq!(
            lines,
            vec![
                "G1 X40 Y0 Z0.7 F9000 ; Smart Ascent",
                "G1 X40 Y0 Z0.3 ; Smart Descent",
            ]
        );
    }

    #[test]
    fn test_zero_ramps_lift_and_drop_vertically() {
        let settings = ProfileSettings {
            ascent_percent: 0.0,
            descent_percent: 0.0,
            ..ProfileSettings::default()
        };
        for model in [ProfileModel::Percentage, ProfileModel::Arc] {
            let lines = lines_for(settings.clone(), model);
            assert_eq!(lines.len(), 3, "{lines:#?}");
            assert_eq!(lines[0], "G1 X0 Y0 Z0.7 F9000 ; Smart Ascent");
            assert_eq!(lines[2], "G1 X40 Y0 Z0.3 ; Smart Descent");
        }
    }

    #[test]
    fn test_floor_respected_on_slope() {
        let seq = sequence(Position::new(0.0, 0.0, 2.0), &[(20.0, 0.0, 1.0)], 3000.0);
        let profile = profile(ProfileModel::Arc, 20.0);
        let points = build_trajectory(&seq, profile.as_ref(), 1e-3);
        assert!(points.iter().all(|p| p.position.z >= 1.0));
        assert_eq!(points.last().unwrap().position.z, 1.0);
    }

    #[test]
    fn test_fixed_z_feedrate_and_restore() {
        let seq = sequence(Position::new(0.0, 0.0, 0.3), &[(30.0, 0.0, 0.3)], 9000.0);
        let profile = profile(ProfileModel::Percentage, 30.0);
        let options = EmitOptions {
            z_feedrate: Some(25.0),
            ..EmitOptions::default()
        };
        let lines = slingshot_lines(&seq, profile.as_ref(), &options);
        assert!(lines[0].contains("F1500"));
        assert_eq!(lines.last().unwrap(), "G1 F9000 ; Restore Feed");
        assert_eq!(lines.iter().filter(|l| l.contains(" F")).count(), 2);
    }

    #[test]
    fn test_feed_cap_limits_z_speed() {
        let seq = sequence(Position::new(0.0, 0.0, 0.3), &[(10.0, 0.0, 0.3)], 30000.0);
        let profile = profile(ProfileModel::Percentage, 10.0);
        let options = EmitOptions {
            z_speed_cap: Some(5.0),
            ..EmitOptions::default()
        };
        let lines = slingshot_lines(&seq, profile.as_ref(), &options);
        let first = MotionLine::parse(&lines[0]);
        // 3 mm run for a 0.4 mm rise: 5 mm/s on Z allows about 2270 mm/min
        let expected = 5.0 * 60.0 * (3.0f64.hypot(0.4)) / 0.4;
        assert!((first.f.unwrap() - expected).abs() < 0.1);
        assert!(lines.last().unwrap().ends_with("Restore Feed"));
    }

    #[test]
    fn test_flat_profile_emits_only_end() {
        let seq = sequence(Position::new(0.0, 0.0, 0.3), &[(10.0, 0.0, 0.3)], 3000.0);
        let profile = FlatProfile::new(10.0);
        let lines = slingshot_lines(&seq, &profile, &EmitOptions::default());
        assert_eq!(lines, vec!["G1 X10 Y0 F3000 ; Smart Descent"]);
    }

    #[test]
    fn test_vertical_hop() {
        let mut seq = TravelSequence::open(Position::new(0.0, 0.0, 0.3), 3000.0, true);
        seq.push(
            MotionLine::parse("G0 F9000 X10 Y0"),
            Position::new(10.0, 0.0, 0.3),
            9000.0,
        );
        seq.push(
            MotionLine::parse("G0 X10 Y10 Z0.5"),
            Position::new(10.0, 10.0, 0.5),
            9000.0,
        );
        let lines = vertical_hop_lines(&seq, 0.4, &EmitOptions::default());
        assert_eq!(
            lines,
            vec![
                "G0 Z0.7 ; Smart Z-Hop Up (D:20.00)",
                "G0 F9000 X10 Y0",
                "G0 X10 Y10 Z0.9",
                "G0 Z0.5 ; Smart Z-Hop Down",
            ]
        );
    }

    #[test]
    fn test_vertical_hop_with_z_feedrate() {
        let seq = sequence(Position::new(0.0, 0.0, 0.3), &[(30.0, 0.0, 0.3)], 9000.0);
        let options = EmitOptions {
            z_feedrate: Some(10.0),
            ..EmitOptions::default()
        };
        let lines = vertical_hop_lines(&seq, 0.4, &options);
        assert_eq!(lines[0], "G0 Z0.7 F600 ; Smart Z-Hop Up (D:30.00)");
        assert_eq!(lines[1], "G1 F9000 ; Restore Feed");
        assert_eq!(lines[3], "G0 Z0.3 F600 ; Smart Z-Hop Down");
        assert_eq!(lines[4], "G1 F9000 ; Restore Feed");
    }
}
