//! # zhopkit G-code
//!
//! Line-level G-code handling for the Z-hop post-processor: word parsing,
//! structural markers, line classification, line emission, and the block
//! processor pipeline.

pub mod classify;
pub mod command;
pub mod emit;
pub mod marker;
pub mod parser;
pub mod pipeline;

pub use classify::{classify, LineClass};
pub use command::{CommandKind, MotionLine};
pub use emit::{format_number, Move, MoveCommand};
pub use marker::{EmbeddedSettings, Marker, MeshBoundary};
pub use parser::{axis_value, command_word, replace_axis, split_comment};
pub use pipeline::{BlockContext, BlockProcessor, ProcessorPipeline};
