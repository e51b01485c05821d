//! Line classification

use crate::command::MotionLine;
use crate::marker::Marker;

/// What a line means to the Z-hop engine
#[derive(Debug, Clone, PartialEq)]
pub enum LineClass {
    /// G0/G1 carrying an extrusion word
    Extrusion,
    /// G0/G1 without extrusion that moves in X or Y
    Travel,
    /// Slicer structural comment
    Marker(Marker),
    /// Position or feed updates, other commands, plain comments
    Other,
}

impl LineClass {
    /// Travel move
    pub fn is_travel(&self) -> bool {
        matches!(self, LineClass::Travel)
    }
}

/// Classify a parsed line
pub fn classify(line: &MotionLine) -> LineClass {
    if line.kind.is_motion() {
        if line.e.is_some() {
            return LineClass::Extrusion;
        }
        if line.has_planar() {
            return LineClass::Travel;
        }
        return LineClass::Other;
    }
    match Marker::parse(line.raw.trim_start()) {
        Some(marker) => LineClass::Marker(marker),
        None => LineClass::Other,
    }
}
