//! The Z-hop block processor
//!
//! One [`SmartZHop`] is fed every block of a document in order. It tracks
//! machine state across blocks, gathers travel runs, and replaces each run
//! that passes the gates with a hop. Anything that goes wrong inside a run
//! leaves that run untouched.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use zhopkit_core::{GcodeError, Result};
use zhopkit_gcode::{
    classify, BlockContext, BlockProcessor, LineClass, Marker, MotionLine, Move, MoveCommand,
};
use zhopkit_settings::{Config, HopMode, ProfileModel};

use crate::layer::{resolve_height, LayerContext, LayerEvent, LayerGate};
use crate::profile::build_profile;
use crate::segmenter::{slingshot_lines, vertical_hop_lines, EmitOptions};
use crate::speed::SpeedState;
use crate::state::ScanState;
use crate::travel::{TravelCollector, TravelSequence};

/// Paths shorter than this have no direction to hop along, mm
pub const DEGENERATE_DISTANCE: f64 = 1e-6;

/// Counters for one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HopReport {
    /// Travel sequences that reached the distance gate
    pub sequences: usize,
    /// Sequences replaced by a hop
    pub hopped: usize,
    /// Sequences below the minimum distance
    pub skipped_short: usize,
    /// Sequences with no planar length
    pub skipped_degenerate: usize,
    /// Layer change hops inserted
    pub layer_hops: usize,
    /// Sequences passed through after an error
    pub fallbacks: usize,
    /// Blocks a pipeline processor failed on and passed through
    pub block_fallbacks: usize,
}

/// Inserts Z-hops before travel moves and at layer changes
pub struct SmartZHop {
    config: Config,
    active: bool,
    gate: LayerGate,
    state: ScanState,
    layers: LayerContext,
    layer_hop_armed: bool,
    speed: Option<SpeedState>,
    report: HopReport,
}

impl SmartZHop {
    /// Validate `config` and build the processor
    ///
    /// An invalid config or an unknown mode or model leaves the processor
    /// inactive, so every block passes through unchanged.
    pub fn new(config: Config) -> Self {
        let active = config.general.enabled && Self::usable(&config);
        Self {
            gate: LayerGate::from_settings(&config.travel),
            config,
            active,
            state: ScanState::new(),
            layers: LayerContext::new(),
            layer_hop_armed: false,
            speed: None,
            report: HopReport::default(),
        }
    }

    fn usable(config: &Config) -> bool {
        if let Err(e) = config.validate() {
            warn!("Invalid Z-hop configuration: {}; Z-hop disabled", e);
            return false;
        }
        if let HopMode::Unrecognized(name) = &config.general.mode {
            warn!("Unknown hop mode '{}'; Z-hop disabled", name);
            return false;
        }
        if let ProfileModel::Unrecognized(name) = &config.general.model {
            warn!("Unknown profile model '{}'; Z-hop disabled", name);
            return false;
        }
        true
    }

    /// Counters so far
    pub fn report(&self) -> &HopReport {
        &self.report
    }

    /// Add blocks the surrounding pipeline passed through after an error
    pub fn record_block_fallbacks(&mut self, count: usize) {
        self.report.block_fallbacks += count;
    }

    /// Configuration in use
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Machine state after the last processed line
    pub fn scan_state(&self) -> &ScanState {
        &self.state
    }

    /// Layer state after the last processed line
    pub fn layers(&self) -> &LayerContext {
        &self.layers
    }

    fn travel_hop_allowed(&self) -> bool {
        self.config.travel.enabled && self.layers.travel_eligible(&self.gate)
    }

    fn travel_height(&self) -> f64 {
        let travel = &self.config.travel;
        resolve_height(
            travel.height_source,
            travel.custom_height,
            self.layers.layer_height,
        )
    }

    fn on_marker(&mut self, marker: &Marker) {
        let arm = match self.layers.apply(marker) {
            LayerEvent::NonMesh => true,
            LayerEvent::LayerStarted {
                had_previous,
                previous_had_nonmesh,
            } => had_previous && !previous_had_nonmesh,
            LayerEvent::None => false,
        };
        if arm && self.config.layer_change.enabled {
            self.layer_hop_armed = true;
        }
    }

    fn layer_hop_line(&mut self) -> String {
        let settings = &self.config.layer_change;
        let height = resolve_height(
            settings.height_source,
            settings.custom_height,
            self.layers.layer_height,
        );
        let z = self.state.position.z + height;
        self.state.position.z = z;
        self.layer_hop_armed = false;
        self.report.layer_hops += 1;
        debug!("Layer change hop to Z{:.3}", z);
        Move::new(MoveCommand::Rapid)
            .z(z)
            .comment("Smart Z-Hop Layer Change")
            .to_line(self.config.output.precision)
    }

    fn speed_state(&mut self, document: &[String]) -> SpeedState {
        let settings = &self.config.speed;
        self.speed
            .get_or_insert_with(|| SpeedState::from_document(document, settings))
            .clone()
    }

    fn emit_options(&self, speed: &SpeedState) -> EmitOptions {
        EmitOptions {
            precision: self.config.output.precision,
            duplicate_epsilon: self.config.output.duplicate_epsilon,
            z_feedrate: self.config.travel.z_feedrate.filter(|f| *f > 0.0),
            z_speed_cap: self
                .config
                .speed
                .cap_feedrate
                .then(|| speed.hop_z_limit()),
        }
    }

    fn hop_lines(&self, seq: &TravelSequence, speed: &SpeedState) -> Result<Vec<String>> {
        if !(seq.start.is_finite() && seq.end().is_finite()) {
            return Err(GcodeError::Other {
                message: "travel endpoints are not finite".to_string(),
            }
            .into());
        }
        let height = self.travel_height();
        let options = self.emit_options(speed);
        let lines = match self.config.general.mode {
            HopMode::Traditional => vertical_hop_lines(seq, height, &options),
            _ => {
                let profile = build_profile(
                    &self.config.general.model,
                    seq.total_distance(),
                    height,
                    &self.config.profile,
                )?;
                slingshot_lines(seq, profile.as_ref(), &options)
            }
        };
        Ok(speed.wrap(lines))
    }

    /// Close out a travel run; returns whether it was replaced
    fn finish_sequence(
        &mut self,
        seq: TravelSequence,
        document: &[String],
        out: &mut Vec<String>,
    ) -> bool {
        self.report.sequences += 1;
        let total = seq.total_distance();

        if total < DEGENERATE_DISTANCE {
            self.report.skipped_degenerate += 1;
            out.extend(seq.raw_lines().map(str::to_string));
            return false;
        }
        if total < self.config.travel.min_distance && !seq.after_retraction {
            self.report.skipped_short += 1;
            out.extend(seq.raw_lines().map(str::to_string));
            return false;
        }

        let speed = self.speed_state(document);
        match self.hop_lines(&seq, &speed) {
            Ok(lines) => {
                debug!(
                    "Hopped {} travel move(s) over {:.2} mm{}",
                    seq.len(),
                    total,
                    if seq.after_retraction {
                        " after retraction"
                    } else {
                        ""
                    }
                );
                self.report.hopped += 1;
                out.extend(lines);
                true
            }
            Err(e) => {
                warn!(
                    "Z-hop failed for travel at {}: {}; passing it through",
                    seq.start, e
                );
                self.report.fallbacks += 1;
                out.extend(seq.raw_lines().map(str::to_string));
                false
            }
        }
    }
}

impl BlockProcessor for SmartZHop {
    fn name(&self) -> &str {
        "smart_zhop"
    }

    fn description(&self) -> &str {
        "Inserts Z-hops before travel moves and at layer changes"
    }

    fn process_block(&mut self, block: &str, context: &BlockContext<'_>) -> Result<String> {
        if !self.active {
            return Ok(block.to_string());
        }

        let newline = if block.contains("\r\n") { "\r\n" } else { "\n" };
        let mut out: Vec<String> = Vec::new();
        let mut modified = false;
        let mut collector = TravelCollector::new();

        for raw in block.lines() {
            let line = MotionLine::parse(raw);
            let class = classify(&line);
            let hop_travel = class.is_travel() && self.travel_hop_allowed();

            if !hop_travel {
                if let Some(seq) = collector.close() {
                    modified |= self.finish_sequence(seq, context.document, &mut out);
                }
            }

            if self.layer_hop_armed && line.kind.is_motion() {
                out.push(self.layer_hop_line());
                modified = true;
            }

            if hop_travel {
                let start = self.state.position;
                let entry = self.state.current_feedrate();
                let after_retraction = !collector.is_open() && self.state.take_retraction();
                self.state.observe(&line);
                let end = self.state.position;
                let feedrate = self.state.current_feedrate();
                collector.push(start, entry, after_retraction, line, end, feedrate);
                continue;
            }

            match &class {
                LineClass::Travel => {
                    self.state.take_retraction();
                }
                LineClass::Marker(marker) => self.on_marker(marker),
                _ => {}
            }
            self.state.observe(&line);
            out.push(raw.to_string());
        }

        if let Some(seq) = collector.close() {
            modified |= self.finish_sequence(seq, context.document, &mut out);
        }

        if !modified {
            return Ok(block.to_string());
        }
        let mut text = out.join(newline);
        if block.ends_with('\n') {
            text.push_str(newline);
        }
        Ok(text)
    }

    fn is_enabled(&self) -> bool {
        self.active
    }
}
