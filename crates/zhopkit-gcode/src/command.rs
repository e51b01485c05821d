//! Parsed G-code lines

use serde::{Deserialize, Serialize};

use crate::parser::{axis_value, command_word, split_comment};

/// Command kinds the Z-hop engine distinguishes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommandKind {
    /// G0
    Rapid,
    /// G1
    Linear,
    /// G92
    SetPosition,
    /// M82
    AbsoluteExtrusion,
    /// M83
    RelativeExtrusion,
    /// Anything else, including comments and blank lines
    Other,
}

impl CommandKind {
    fn from_word(word: Option<(char, u32)>) -> Self {
        match word {
            Some(('G', 0)) => CommandKind::Rapid,
            Some(('G', 1)) => CommandKind::Linear,
            Some(('G', 92)) => CommandKind::SetPosition,
            Some(('M', 82)) => CommandKind::AbsoluteExtrusion,
            Some(('M', 83)) => CommandKind::RelativeExtrusion,
            _ => CommandKind::Other,
        }
    }

    /// G0 or G1
    pub fn is_motion(&self) -> bool {
        matches!(self, CommandKind::Rapid | CommandKind::Linear)
    }
}

/// One line of the program with the words the engine cares about
///
/// The raw text is kept so untouched lines pass through byte for byte.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotionLine {
    /// Original line text without its line terminator
    pub raw: String,
    /// Command kind
    pub kind: CommandKind,
    /// X value
    pub x: Option<f64>,
    /// Y value
    pub y: Option<f64>,
    /// Z value
    pub z: Option<f64>,
    /// Extrusion value
    pub e: Option<f64>,
    /// Feed rate in mm/min
    pub f: Option<f64>,
}

impl MotionLine {
    /// Parse a raw line; never fails
    pub fn parse(raw: &str) -> Self {
        let kind = CommandKind::from_word(command_word(raw));
        let carries_words = kind.is_motion() || kind == CommandKind::SetPosition;
        let value = |letter| {
            if carries_words {
                axis_value(raw, letter)
            } else {
                None
            }
        };
        Self {
            raw: raw.to_string(),
            kind,
            x: value('X'),
            y: value('Y'),
            z: value('Z'),
            e: value('E'),
            f: value('F'),
        }
    }

    /// Has an X or Y word
    pub fn has_planar(&self) -> bool {
        self.x.is_some() || self.y.is_some()
    }

    /// Comment text, if any
    pub fn comment(&self) -> Option<&str> {
        split_comment(&self.raw).1
    }

    /// Nothing but whitespace
    pub fn is_blank(&self) -> bool {
        self.raw.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_travel() {
        let line = MotionLine::parse("G0 F30000 X105 Y102 ;travel");
        assert_eq!(line.kind, CommandKind::Rapid);
        assert_eq!(line.x, Some(105.0));
        assert_eq!(line.y, Some(102.0));
        assert_eq!(line.z, None);
        assert_eq!(line.e, None);
        assert_eq!(line.f, Some(30000.0));
        assert!(line.has_planar());
        assert_eq!(line.comment(), Some("travel"));
    }

    #[test]
    fn test_parse_extrusion() {
        let line = MotionLine::parse("G1 X10 Y20 E48.0 F1500");
        assert_eq!(line.kind, CommandKind::Linear);
        assert_eq!(line.e, Some(48.0));
    }

    #[test]
    fn test_non_motion_words_ignored() {
        let line = MotionLine::parse("M104 S200");
        assert_eq!(line.kind, CommandKind::Other);
        assert_eq!(line.x, None);
        let line = MotionLine::parse("M203 Z5");
        assert_eq!(line.z, None);
    }

    #[test]
    fn test_set_position_and_modes() {
        let line = MotionLine::parse("G92 E0");
        assert_eq!(line.kind, CommandKind::SetPosition);
        assert_eq!(line.e, Some(0.0));
        assert_eq!(MotionLine::parse("M83").kind, CommandKind::RelativeExtrusion);
        assert_eq!(MotionLine::parse("M82").kind, CommandKind::AbsoluteExtrusion);
    }

    #[test]
    fn test_blank() {
        assert!(MotionLine::parse("   ").is_blank());
        assert!(!MotionLine::parse(";x").is_blank());
    }
}
