//! # zhopkit engine
//!
//! Trajectory synthesis for Z-hops: scan state and retraction detection,
//! travel sequence collection, height profiles, the layer gate, path
//! segmentation and re-emission, and the block processor tying them together.

pub mod layer;
pub mod processor;
pub mod profile;
pub mod segmenter;
pub mod speed;
pub mod state;
pub mod travel;

pub use layer::{resolve_height, LayerContext, LayerGate, FALLBACK_LAYER_HEIGHT};
pub use processor::{HopReport, SmartZHop};
pub use profile::{build_profile, HeightProfile, Stage, StageLayout};
pub use segmenter::{build_trajectory, emit_trajectory, EmitOptions, TrajectoryPoint};
pub use speed::{SpeedState, DEFAULT_MAX_Z_SPEED};
pub use state::{ExtrusionMode, ScanState};
pub use travel::{TravelCollector, TravelSequence};
