//! # zhopkit
//!
//! A G-code post-processor that inserts Z-hops: a lift before long travel
//! moves, shaped vertically or along a curved path, and a lift at layer
//! changes.
//!
//! ## Architecture
//!
//! zhopkit is organized as a workspace with multiple crates:
//!
//! 1. **zhopkit-core** - Positions, units, error types
//! 2. **zhopkit-gcode** - Line parsing, markers, emission, block pipeline
//! 3. **zhopkit-settings** - Configuration file handling and validation
//! 4. **zhopkit-engine** - Scan state, travel collection, height profiles, re-emission
//! 5. **zhopkit** - Document splitting, logging setup, and the command line tool

use serde::Serialize;

pub use zhopkit_core::{Error, Position, Result};
pub use zhopkit_engine::{HopReport, LayerContext, SmartZHop, SpeedState};
pub use zhopkit_gcode::{BlockProcessor, ProcessorPipeline};
pub use zhopkit_settings::{Config, HopMode, ProfileModel};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

const LAYER_MARKER: &str = ";LAYER:";

/// Log line format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// Human readable
    #[default]
    Pretty,
    /// One JSON object per event
    Json,
}

/// Initialize logging
///
/// Logs go to stderr so processed G-code can be written to stdout. The
/// level is `info`, or `debug` when verbose, unless `RUST_LOG` is set.
pub fn init_logging(format: LogFormat, verbose: bool) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let default_level = if verbose { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    match format {
        LogFormat::Pretty => {
            let fmt_layer = fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_level(true)
                .with_line_number(true);
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt_layer)
                .try_init()?;
        }
        LogFormat::Json => {
            let fmt_layer = fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_current_span(false);
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt_layer)
                .try_init()?;
        }
    }

    Ok(())
}

/// Split a document into per-layer blocks
///
/// Block 0 is everything before the first layer marker; every marker line
/// starts a new block. Line endings stay attached to their lines, so
/// [`join_layers`] restores the input exactly.
pub fn split_layers(text: &str) -> Vec<String> {
    let mut blocks = vec![String::new()];
    for line in text.split_inclusive('\n') {
        let starts_layer = line.starts_with(LAYER_MARKER);
        if starts_layer && blocks.last().is_some_and(|b| !b.is_empty()) {
            blocks.push(String::new());
        }
        if let Some(block) = blocks.last_mut() {
            block.push_str(line);
        }
    }
    blocks
}

/// Inverse of [`split_layers`]
pub fn join_layers(blocks: &[String]) -> String {
    blocks.concat()
}

/// Run `processors` and then the Z-hop processor over a document's blocks
///
/// A block that a processor fails on passes through that processor
/// unchanged and is counted in the report's `block_fallbacks`.
pub fn process_blocks<'p>(
    blocks: Vec<String>,
    config: Config,
    processors: Vec<Box<dyn BlockProcessor + 'p>>,
) -> (Vec<String>, SmartZHop) {
    let mut hop = SmartZHop::new(config);
    let (blocks, fallbacks) = {
        let mut pipeline = ProcessorPipeline::new();
        for processor in processors {
            pipeline.register(processor);
        }
        pipeline.register(Box::new(&mut hop));
        let blocks = pipeline.process_document(blocks);
        (blocks, pipeline.fallback_count())
    };
    hop.record_block_fallbacks(fallbacks);
    (blocks, hop)
}

/// Run the Z-hop processor over a whole document
pub fn process_text(text: &str, config: Config) -> (String, HopReport) {
    let (blocks, hop) = process_blocks(split_layers(text), config, Vec::new());
    (join_layers(&blocks), hop.report().clone())
}

/// What a dry run learned about a document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analysis {
    /// Blocks after splitting
    pub blocks: usize,
    /// Declared layer count
    pub layer_count: Option<u32>,
    /// Declared layer height, mm
    pub layer_height: Option<f64>,
    /// Last layer number reached
    pub last_layer: Option<i64>,
    /// Maximum Z speed from the embedded settings, mm/s
    pub machine_max_z_speed: Option<f64>,
    /// What processing would do
    pub report: HopReport,
}

/// Process a document without keeping the output
pub fn analyze_text(text: &str, config: Config) -> Analysis {
    let blocks = split_layers(text);
    let count = blocks.len();
    let speed = SpeedState::from_document(&blocks, &config.speed);
    let (_, hop) = process_blocks(blocks, config, Vec::new());
    let layers: &LayerContext = hop.layers();
    Analysis {
        blocks: count,
        layer_count: layers.layer_count,
        layer_height: layers.layer_height,
        last_layer: layers.layer,
        machine_max_z_speed: speed.machine_max,
        report: hop.report().clone(),
    }
}
