//! Scan state: position, feed rate, and retraction detection

use zhopkit_core::Position;
use zhopkit_gcode::{CommandKind, MotionLine};

/// Feed rate assumed before the program sets one, mm/min
pub const DEFAULT_FEEDRATE: f64 = 3000.0;

/// How E words are interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExtrusionMode {
    /// M82, E is a running total
    #[default]
    Absolute,
    /// M83, E is a per-move amount
    Relative,
}

/// The last two extrusion values seen
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ExtrusionHistory {
    previous: Option<f64>,
    latest: Option<f64>,
}

impl ExtrusionHistory {
    /// Record a new value, dropping the oldest
    pub fn push(&mut self, e: f64) {
        self.previous = self.latest;
        self.latest = Some(e);
    }

    /// Newest value strictly below the one before it
    pub fn is_retraction(&self) -> bool {
        matches!((self.previous, self.latest), (Some(prev), Some(last)) if last < prev)
    }

    /// Forget both values
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Running machine state threaded through a document scan
#[derive(Debug, Clone)]
pub struct ScanState {
    /// Current position
    pub position: Position,
    /// Last explicit feed rate, mm/min
    pub feedrate: Option<f64>,
    /// Current extrusion mode
    pub extrusion_mode: ExtrusionMode,
    history: ExtrusionHistory,
    retraction_pending: bool,
}

impl Default for ScanState {
    fn default() -> Self {
        Self::new()
    }
}

impl ScanState {
    /// State at the start of a program
    pub fn new() -> Self {
        Self {
            position: Position::default(),
            feedrate: None,
            extrusion_mode: ExtrusionMode::Absolute,
            history: ExtrusionHistory::default(),
            retraction_pending: false,
        }
    }

    /// Feed rate in effect, falling back to [`DEFAULT_FEEDRATE`]
    pub fn current_feedrate(&self) -> f64 {
        self.feedrate.unwrap_or(DEFAULT_FEEDRATE)
    }

    /// Apply one line; axes absent from the line keep their value
    pub fn observe(&mut self, line: &MotionLine) {
        match line.kind {
            CommandKind::AbsoluteExtrusion => {
                self.extrusion_mode = ExtrusionMode::Absolute;
                self.history.clear();
            }
            CommandKind::RelativeExtrusion => {
                self.extrusion_mode = ExtrusionMode::Relative;
                self.history.clear();
            }
            CommandKind::SetPosition => {
                self.apply_axes(line);
                self.history.clear();
                self.retraction_pending = false;
                if let Some(e) = line.e {
                    self.history.push(e);
                }
            }
            CommandKind::Rapid | CommandKind::Linear => {
                self.apply_axes(line);
                if let Some(f) = line.f.filter(|f| *f > 0.0) {
                    self.feedrate = Some(f);
                }
                if let Some(e) = line.e {
                    self.record_extrusion(e);
                }
            }
            CommandKind::Other => {}
        }
    }

    fn apply_axes(&mut self, line: &MotionLine) {
        if let Some(x) = line.x {
            self.position.x = x;
        }
        if let Some(y) = line.y {
            self.position.y = y;
        }
        if let Some(z) = line.z {
            self.position.z = z;
        }
    }

    fn record_extrusion(&mut self, e: f64) {
        self.history.push(e);
        self.retraction_pending = match self.extrusion_mode {
            ExtrusionMode::Absolute => self.history.is_retraction(),
            ExtrusionMode::Relative => e < 0.0,
        };
    }

    /// Whether a retraction is waiting for the next travel
    pub fn retraction_pending(&self) -> bool {
        self.retraction_pending
    }

    /// Consume the retraction signal
    pub fn take_retraction(&mut self) -> bool {
        std::mem::take(&mut self.retraction_pending)
    }
}
