//! Layer tracking and the travel eligibility gate

use zhopkit_gcode::{Marker, MeshBoundary};
use zhopkit_settings::{HeightSource, TravelSettings};

/// Layer height assumed when the program never declares one, mm
pub const FALLBACK_LAYER_HEIGHT: f64 = 0.2;

/// Pick a hop height from its configured source
pub fn resolve_height(source: HeightSource, custom: f64, detected: Option<f64>) -> f64 {
    match source {
        HeightSource::LayerHeight => detected.unwrap_or(FALLBACK_LAYER_HEIGHT),
        HeightSource::Custom => custom,
    }
}

/// Which layers get travel hops
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayerGate {
    /// Only the first and last layer
    pub top_bottom_only: bool,
    /// Layers that always qualify
    pub custom_layers: Vec<u32>,
}

impl LayerGate {
    /// Gate from travel settings
    pub fn from_settings(settings: &TravelSettings) -> Self {
        Self {
            top_bottom_only: settings.top_bottom_only,
            custom_layers: settings.custom_layers.clone(),
        }
    }

    /// Whether `layer` (1-based) qualifies
    ///
    /// Nothing qualifies before the first layer marker. With an unknown layer
    /// count no layer is treated as the last one. A custom list adds its
    /// layers; on its own it also excludes every other layer.
    pub fn allows(&self, layer: Option<i64>, layer_count: Option<u32>) -> bool {
        let Some(layer) = layer else {
            return false;
        };
        let mut allowed = if self.top_bottom_only {
            layer <= 1 || layer_count.is_some_and(|count| layer >= i64::from(count))
        } else {
            true
        };
        if !self.custom_layers.is_empty() {
            let listed = u32::try_from(layer).is_ok_and(|l| self.custom_layers.contains(&l));
            if listed {
                allowed = true;
            } else if !self.top_bottom_only {
                allowed = false;
            }
        }
        allowed
    }
}

/// What a marker did to the layer state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerEvent {
    /// Nothing that affects hops
    None,
    /// A new layer began
    LayerStarted {
        /// A layer came before it
        had_previous: bool,
        /// The previous layer reached a non-mesh section
        previous_had_nonmesh: bool,
    },
    /// The non-mesh section of the layer began
    NonMesh,
}

/// Per-document layer state
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayerContext {
    /// Current 1-based layer, `None` before the first marker
    pub layer: Option<i64>,
    /// Declared layer count
    pub layer_count: Option<u32>,
    /// Declared layer height, mm
    pub layer_height: Option<f64>,
    /// Inside the non-mesh tail of a layer
    pub in_nonmesh: bool,
    nonmesh_seen: bool,
}

impl LayerContext {
    /// Nothing seen yet
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a marker
    pub fn apply(&mut self, marker: &Marker) -> LayerEvent {
        match marker {
            Marker::LayerCount(count) => {
                self.layer_count = Some(*count);
                LayerEvent::None
            }
            Marker::LayerHeight(height) => {
                self.layer_height = Some(*height);
                LayerEvent::None
            }
            Marker::LayerStart(_) => {
                let event = LayerEvent::LayerStarted {
                    had_previous: self.layer.is_some(),
                    previous_had_nonmesh: self.nonmesh_seen,
                };
                self.layer = marker.layer_number();
                self.in_nonmesh = false;
                self.nonmesh_seen = false;
                event
            }
            Marker::Mesh(MeshBoundary::NonMesh) => {
                self.in_nonmesh = true;
                self.nonmesh_seen = true;
                LayerEvent::NonMesh
            }
            Marker::Mesh(MeshBoundary::Mesh(_)) => {
                self.in_nonmesh = false;
                LayerEvent::None
            }
            Marker::Settings(_) => LayerEvent::None,
        }
    }

    /// Whether travel in the current region may be hopped
    pub fn travel_eligible(&self, gate: &LayerGate) -> bool {
        !self.in_nonmesh && gate.allows(self.layer, self.layer_count)
    }
}
