//! Line emission
//!
//! Geometry code hands typed moves to this module and gets text back, so
//! number formatting lives in one place.

use zhopkit_core::units::round_to;

/// Motion command for a synthesized line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveCommand {
    /// G0
    Rapid,
    /// G1
    Linear,
}

impl MoveCommand {
    fn word(&self) -> &'static str {
        match self {
            MoveCommand::Rapid => "G0",
            MoveCommand::Linear => "G1",
        }
    }
}

/// A synthesized move; absent words are not written
#[derive(Debug, Clone, PartialEq)]
pub struct Move {
    /// G0 or G1
    pub command: MoveCommand,
    /// Target X
    pub x: Option<f64>,
    /// Target Y
    pub y: Option<f64>,
    /// Target Z
    pub z: Option<f64>,
    /// Feed rate in mm/min
    pub f: Option<f64>,
    /// Trailing comment
    pub comment: Option<String>,
}

impl Move {
    /// Empty move with the given command
    pub fn new(command: MoveCommand) -> Self {
        Self {
            command,
            x: None,
            y: None,
            z: None,
            f: None,
            comment: None,
        }
    }

    /// Set X and Y
    pub fn xy(mut self, x: f64, y: f64) -> Self {
        self.x = Some(x);
        self.y = Some(y);
        self
    }

    /// Set Z
    pub fn z(mut self, z: f64) -> Self {
        self.z = Some(z);
        self
    }

    /// Set the feed rate if one is given
    pub fn feed(mut self, f: Option<f64>) -> Self {
        self.f = f;
        self
    }

    /// Set the trailing comment
    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Render as one G-code line, coordinates rounded to `precision` decimals
    pub fn to_line(&self, precision: u32) -> String {
        let mut line = String::from(self.command.word());
        for (letter, value) in [('X', self.x), ('Y', self.y), ('Z', self.z)] {
            if let Some(value) = value {
                line.push(' ');
                line.push(letter);
                line.push_str(&format_number(value, precision));
            }
        }
        if let Some(f) = self.f {
            line.push_str(" F");
            line.push_str(&format_number(f, 1));
        }
        if let Some(comment) = &self.comment {
            line.push_str(" ; ");
            line.push_str(comment);
        }
        line
    }
}

/// Round and print in shortest form (`105`, `48.65`, never `-0`)
pub fn format_number(value: f64, precision: u32) -> String {
    let rounded = round_to(value, precision);
    if rounded == 0.0 {
        return "0".to_string();
    }
    format!("{}", rounded)
}

/// `M203 Z<mm/s>` axis speed limit line
pub fn speed_limit_line(z_mm_per_sec: f64, comment: &str) -> String {
    format!("M203 Z{} ; {}", format_number(z_mm_per_sec, 3), comment)
}

/// Feed-only `G1 F<mm/min>` line
pub fn feed_line(f: f64, comment: &str) -> String {
    format!("G1 F{} ; {}", format_number(f, 1), comment)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(105.0, 5), "105");
        assert_eq!(format_number(48.650, 5), "48.65");
        assert_eq!(format_number(1.234567891, 5), "1.23457");
        assert_eq!(format_number(-0.000001, 3), "0");
        assert_eq!(format_number(-2.5, 3), "-2.5");
    }

    #[test]
    fn test_move_to_line() {
        let line = Move::new(MoveCommand::Linear)
            .xy(105.123456, 102.0)
            .z(0.6)
            .feed(Some(30000.0))
            .comment("Smart Ascent")
            .to_line(5);
        assert_eq!(line, "G1 X105.12346 Y102 Z0.6 F30000 ; Smart Ascent");
    }

    #[test]
    fn test_xy_only_move() {
        let line = Move::new(MoveCommand::Linear).xy(1.0, 2.0).to_line(3);
        assert_eq!(line, "G1 X1 Y2");
    }

    #[test]
    fn test_z_only_rapid() {
        let line = Move::new(MoveCommand::Rapid)
            .z(0.7)
            .comment("Smart Z-Hop Layer Change")
            .to_line(3);
        assert_eq!(line, "G0 Z0.7 ; Smart Z-Hop Layer Change");
    }

    #[test]
    fn test_control_lines() {
        assert_eq!(speed_limit_line(5.0, "limit"), "M203 Z5 ; limit");
        assert_eq!(feed_line(1500.0, "Restore Feed"), "G1 F1500 ; Restore Feed");
    }
}
