//! zhopkit Settings Crate
//!
//! Handles the post-processor configuration: defaults, validation, and
//! JSON/TOML persistence.

pub mod config;

pub use config::{
    parse_layer_list, Config, GeneralSettings, HeightSource, HopMode, LayerChangeSettings,
    OutputSettings, ProfileModel, ProfileSettings, SpeedSettings, TravelSettings,
};
