//! Safety properties over random travel paths and settings

use proptest::prelude::*;
use zhopkit_core::Position;
use zhopkit_engine::segmenter::simplify_collinear;
use zhopkit_engine::{build_profile, build_trajectory, emit_trajectory, EmitOptions, TravelSequence};
use zhopkit_gcode::MotionLine;
use zhopkit_settings::{ProfileModel, ProfileSettings};

const MODELS: [ProfileModel; 4] = [
    ProfileModel::Linear,
    ProfileModel::Percentage,
    ProfileModel::Angle,
    ProfileModel::Arc,
];

fn settings_strategy() -> impl Strategy<Value = ProfileSettings> {
    // zero-length stages come from the exact edges
    let percent = || prop_oneof![1 => Just(0.0), 1 => Just(100.0), 6 => 0.0..100.0f64];
    (
        percent(),
        percent(),
        prop_oneof![1 => Just(90.0), 1 => 89.5..90.0f64, 6 => 1.0..90.0f64],
        any::<bool>(),
        1.0..400.0f64,
        1u32..16,
        any::<bool>(),
    )
        .prop_map(
            |(ascent, descent, angle, priority, radius, segments, limit)| ProfileSettings {
                ascent_percent: ascent,
                descent_percent: descent,
                lift_angle: angle,
                angle_priority: priority,
                arc_radius_percent: radius,
                arc_segments: segments,
                arc_limit_radius: limit,
                ..ProfileSettings::default()
            },
        )
}

fn path_strategy() -> impl Strategy<Value = (Position, Vec<Position>)> {
    let point = (0.0..200.0f64, 0.0..200.0f64, 0.2..5.0f64)
        .prop_map(|(x, y, z)| Position::new(x, y, z));
    (point.clone(), prop::collection::vec(point, 1..6))
}

/// Paths at one height, at least 1 mm long
fn flat_path_strategy() -> impl Strategy<Value = (Position, Vec<Position>)> {
    let point = (0.0..200.0f64, 0.0..200.0f64);
    (point.clone(), prop::collection::vec(point, 1..6), 0.2..5.0f64)
        .prop_map(|((x, y), ends, z)| {
            let ends = ends.into_iter().map(|(x, y)| Position::new(x, y, z)).collect();
            (Position::new(x, y, z), ends)
        })
        .prop_filter("path too short", |(start, ends)| {
            let mut total = 0.0;
            let mut previous = *start;
            for end in ends {
                total += previous.planar_distance_to(end);
                previous = *end;
            }
            total >= 1.0
        })
}

fn sequence(start: Position, ends: &[Position]) -> TravelSequence {
    let mut seq = TravelSequence::open(start, 3000.0, false);
    for end in ends {
        let raw = format!("G0 X{} Y{} Z{}", end.x, end.y, end.z);
        seq.push(MotionLine::parse(&raw), *end, 9000.0);
    }
    seq
}

proptest! {
    #[test]
    fn prop_trajectory_never_below_floor(
        (start, ends) in path_strategy(),
        settings in settings_strategy(),
        model in 0usize..4,
        height in 0.05..2.0f64,
    ) {
        let seq = sequence(start, &ends);
        let floor = seq.floor_z();
        let profile = build_profile(&MODELS[model], seq.total_distance(), height, &settings).unwrap();
        let points = simplify_collinear(seq.start, build_trajectory(&seq, profile.as_ref(), 1e-3));

        for point in &points {
            prop_assert!(point.position.z >= floor - 1e-9);
        }

        let lines = emit_trajectory(&seq, &points, &EmitOptions::default());
        let mut z = seq.start.z;
        for line in &lines {
            if let Some(value) = MotionLine::parse(line).z {
                z = value;
            }
            prop_assert!(z >= floor - 1e-5, "{line}");
        }
    }

    #[test]
    fn prop_offset_bounded_and_rising(
        total in 0.01..500.0f64,
        height in 0.05..2.0f64,
        settings in settings_strategy(),
        model in 0usize..4,
    ) {
        let profile = build_profile(&MODELS[model], total, height, &settings).unwrap();
        prop_assert_eq!(profile.offset(0.0), 0.0);

        let ascent_end = profile.layout().ascent_end;
        let mut previous = 0.0;
        for step in 0..=200 {
            let d = total * f64::from(step) / 200.0;
            let offset = profile.offset(d);
            prop_assert!(offset >= 0.0);
            prop_assert!(offset <= height + 1e-9);
            if d <= ascent_end {
                prop_assert!(offset + 1e-12 >= previous, "{} at {}", offset, d);
            }
            previous = offset;
        }
    }

    #[test]
    fn prop_endpoint_exact_and_no_duplicates(
        (start, ends) in path_strategy(),
        settings in settings_strategy(),
        model in 0usize..4,
    ) {
        let seq = sequence(start, &ends);
        let profile = build_profile(&MODELS[model], seq.total_distance(), 0.4, &settings).unwrap();
        let points = simplify_collinear(seq.start, build_trajectory(&seq, profile.as_ref(), 1e-3));

        prop_assert_eq!(points.last().map(|p| p.position), Some(seq.end()));

        // only pure Z moves may stay in one XY cell
        let cell = |p: &Position| ((p.x / 1e-3).round() as i64, (p.y / 1e-3).round() as i64);
        for pair in points.windows(2) {
            let (a, b) = (pair[0].position, pair[1].position);
            prop_assert!(cell(&a) != cell(&b) || (a.z - b.z).abs() > 1e-9, "{} {}", a, b);
        }
    }

    #[test]
    fn prop_hopped_path_reaches_peak(
        (start, ends) in flat_path_strategy(),
        settings in settings_strategy(),
        model in 0usize..4,
        height in 0.05..2.0f64,
    ) {
        let seq = sequence(start, &ends);
        let profile = build_profile(&MODELS[model], seq.total_distance(), height, &settings).unwrap();
        prop_assume!(profile.peak() > 0.0);
        let points = simplify_collinear(seq.start, build_trajectory(&seq, profile.as_ref(), 1e-3));
        let lines = emit_trajectory(&seq, &points, &EmitOptions::default());

        let highest = lines
            .iter()
            .filter_map(|line| MotionLine::parse(line).z)
            .fold(start.z, f64::max);
        prop_assert!(
            highest >= start.z + profile.peak() - 1e-4,
            "{} peaked at {} for {}", profile.name(), highest, profile.peak()
        );
    }
}
