//! Structural comments written by the slicer
//!
//! Layer markers, the per-print layer height, mesh boundaries, and the
//! embedded settings block that carries machine limits.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::OnceLock;

const LAYER_COUNT_PREFIX: &str = ";LAYER_COUNT:";
const LAYER_PREFIX: &str = ";LAYER:";
const LAYER_HEIGHT_PREFIX: &str = ";Layer height:";
const MESH_PREFIX: &str = ";MESH:";
const NON_MESH: &str = "NONMESH";

/// Prefix of an embedded settings line
pub const SETTINGS_PREFIX: &str = ";SETTING_3 ";

/// Which side of a mesh boundary the following lines belong to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MeshBoundary {
    /// Moves that belong to no mesh (end-of-layer travel)
    NonMesh,
    /// Start of a named mesh
    Mesh(String),
}

/// A recognised structural comment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Marker {
    /// Total number of layers in the print
    LayerCount(u32),
    /// Slice thickness in mm
    LayerHeight(f64),
    /// Start of a layer, carrying the slicer's 0-based index
    LayerStart(i64),
    /// Mesh boundary
    Mesh(MeshBoundary),
    /// One fragment of the embedded settings payload
    Settings(String),
}

impl Marker {
    /// Parse a structural comment; unrelated or malformed lines yield `None`
    pub fn parse(line: &str) -> Option<Marker> {
        let line = line.trim_end_matches(['\r', '\n']);
        if let Some(rest) = line.strip_prefix(LAYER_COUNT_PREFIX) {
            return rest.trim().parse().ok().map(Marker::LayerCount);
        }
        if let Some(rest) = line.strip_prefix(LAYER_PREFIX) {
            return rest.trim().parse().ok().map(Marker::LayerStart);
        }
        if let Some(rest) = line.strip_prefix(LAYER_HEIGHT_PREFIX) {
            return rest
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|h| h.is_finite() && *h > 0.0)
                .map(Marker::LayerHeight);
        }
        if let Some(rest) = line.strip_prefix(MESH_PREFIX) {
            let name = rest.trim();
            return Some(Marker::Mesh(if name == NON_MESH {
                MeshBoundary::NonMesh
            } else {
                MeshBoundary::Mesh(name.to_string())
            }));
        }
        line.strip_prefix(SETTINGS_PREFIX)
            .map(|payload| Marker::Settings(payload.to_string()))
    }

    /// 1-based layer number for a layer start marker
    pub fn layer_number(&self) -> Option<i64> {
        match self {
            Marker::LayerStart(index) => Some(index + 1),
            _ => None,
        }
    }
}

fn leading_number_regex() -> &'static Regex {
    static NUMBER_REGEX: OnceLock<Regex> = OnceLock::new();
    NUMBER_REGEX.get_or_init(|| {
        Regex::new(r"^[-+]?(?:\d+(?:\.\d*)?|\.\d+)(?:[eE][-+]?\d+)?").expect("invalid regex pattern")
    })
}

/// `key = value` pairs recovered from the embedded settings block
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmbeddedSettings {
    entries: HashMap<String, String>,
}

impl EmbeddedSettings {
    /// Collect every settings fragment from the given lines
    ///
    /// Fragments are concatenated in order and literal `\n` sequences are
    /// turned back into line breaks before the pairs are read.
    pub fn from_lines<'a>(lines: impl IntoIterator<Item = &'a str>) -> Self {
        let payload: String = lines
            .into_iter()
            .filter_map(|line| line.trim_end_matches(['\r', '\n']).strip_prefix(SETTINGS_PREFIX))
            .collect();
        Self::from_payload(&payload)
    }

    /// Read pairs from an already concatenated payload
    pub fn from_payload(payload: &str) -> Self {
        let text = payload.replace("\\n", "\n");
        let entries = text
            .lines()
            .filter_map(|line| {
                let (key, value) = line.split_once('=')?;
                let key = key.trim().trim_matches(|c: char| c == '"' || c == '{');
                if key.is_empty() || key.contains(char::is_whitespace) {
                    return None;
                }
                Some((key.to_string(), value.trim().to_string()))
            })
            .collect();
        Self { entries }
    }

    /// Raw value for a key
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Numeric value for a key, reading only the leading number
    pub fn get_f64(&self, key: &str) -> Option<f64> {
        let value = self.get(key)?;
        leading_number_regex()
            .find(value)
            .and_then(|m| m.as_str().parse::<f64>().ok())
            .filter(|v| v.is_finite())
    }

    /// Number of pairs found
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no pairs were found
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
