//! Travel sequence collection
//!
//! Consecutive travel lines are gathered into one path so the hop can be
//! shaped over the whole run instead of per move.

use zhopkit_core::Position;
use zhopkit_gcode::MotionLine;

/// One travel move inside a sequence
#[derive(Debug, Clone, PartialEq)]
pub struct TravelSegment {
    /// Position before the move
    pub start: Position,
    /// Position after the move
    pub end: Position,
    /// Planar length
    pub length: f64,
    /// Cumulative planar distance at the end of this segment
    pub cumulative: f64,
    /// Feed rate in effect for the move, mm/min
    pub feedrate: f64,
    /// The originating line
    pub line: MotionLine,
}

/// A contiguous run of travel moves
#[derive(Debug, Clone, PartialEq)]
pub struct TravelSequence {
    /// Position before the first move
    pub start: Position,
    /// Moves in order
    pub segments: Vec<TravelSegment>,
    /// First travel after a retraction
    pub after_retraction: bool,
    /// Feed rate in effect before the first move, mm/min
    pub entry_feedrate: f64,
}

impl TravelSequence {
    /// Empty sequence starting at `start`
    pub fn open(start: Position, entry_feedrate: f64, after_retraction: bool) -> Self {
        Self {
            start,
            segments: Vec::new(),
            after_retraction,
            entry_feedrate,
        }
    }

    /// Append a move ending at `end`
    pub fn push(&mut self, line: MotionLine, end: Position, feedrate: f64) {
        let start = self.end();
        let length = start.planar_distance_to(&end);
        let cumulative = self.total_distance() + length;
        self.segments.push(TravelSegment {
            start,
            end,
            length,
            cumulative,
            feedrate,
            line,
        });
    }

    /// Position after the last move
    pub fn end(&self) -> Position {
        self.segments.last().map_or(self.start, |s| s.end)
    }

    /// Total planar distance
    pub fn total_distance(&self) -> f64 {
        self.segments.last().map_or(0.0, |s| s.cumulative)
    }

    /// Feed rate the original lines leave in effect
    pub fn exit_feedrate(&self) -> f64 {
        self.segments.last().map_or(self.entry_feedrate, |s| s.feedrate)
    }

    /// Number of moves
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// No moves yet
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Original lines, for passthrough
    pub fn raw_lines(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().map(|s| s.line.raw.as_str())
    }

    /// Lowest Z the hop may ever reach
    pub fn floor_z(&self) -> f64 {
        self.start.z.min(self.end().z)
    }
}

/// Opens, extends, and closes travel sequences during a scan
#[derive(Debug, Default)]
pub struct TravelCollector {
    open: Option<TravelSequence>,
}

impl TravelCollector {
    /// New collector with nothing open
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a sequence is open
    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }

    /// Add a travel line, opening a sequence at `start` if none is open
    ///
    /// `start` and `after_retraction` are only read when a sequence opens.
    pub fn push(
        &mut self,
        start: Position,
        entry_feedrate: f64,
        after_retraction: bool,
        line: MotionLine,
        end: Position,
        feedrate: f64,
    ) {
        self.open
            .get_or_insert_with(|| TravelSequence::open(start, entry_feedrate, after_retraction))
            .push(line, end, feedrate);
    }

    /// Close the open sequence, if any
    pub fn close(&mut self) -> Option<TravelSequence> {
        self.open.take()
    }
}
