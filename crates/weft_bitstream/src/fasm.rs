//! FASM feature lists.
//!
//! One enabled feature per line, prefixed with its tile location:
//!
//! ```text
//! X1Y0.LA_FF
//! X1Y0.N1BEG0.E1END2
//! X2Y0.M1.p1 = 0
//! ```
//!
//! A trailing `= 0` disables the feature; `= 1` or no value enables it.
//! `#` starts a comment.

use crate::compile::CompiledFabric;
use crate::config_bits::ConfigImage;
use crate::error::BitstreamError;
use std::collections::BTreeMap;
use std::fmt::Write;
use weft_common::TileCoord;

/// One enabled feature at one tile location.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct FasmFeature {
    /// Tile location.
    pub location: TileCoord,
    /// Feature name from the location's feature table.
    pub feature: String,
}

impl FasmFeature {
    /// Creates a feature annotation.
    pub fn new(location: TileCoord, feature: &str) -> Self {
        Self {
            location,
            feature: feature.to_string(),
        }
    }

    /// Formats this feature as a FASM line.
    pub fn to_fasm_line(&self) -> String {
        format!("{}.{}", self.location, self.feature)
    }
}

/// A collection of FASM features forming a fabric configuration.
#[derive(Debug, Clone, Default)]
pub struct FasmOutput {
    features: Vec<FasmFeature>,
}

impl FasmOutput {
    /// Creates an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a feature.
    pub fn add_feature(&mut self, location: TileCoord, feature: &str) {
        self.features.push(FasmFeature::new(location, feature));
    }

    /// Adds a pre-constructed feature.
    pub fn add(&mut self, feature: FasmFeature) {
        self.features.push(feature);
    }

    /// Returns the number of features.
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Returns whether no features have been added.
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Features in insertion order.
    pub fn features(&self) -> &[FasmFeature] {
        &self.features
    }

    /// Renders the list sorted by location then feature name.
    pub fn render(&self) -> String {
        let mut sorted = self.features.clone();
        sorted.sort();
        let mut output = String::new();
        for f in &sorted {
            let _ = writeln!(output, "{}", f.to_fasm_line());
        }
        output
    }
}

/// Parses an `X{x}Y{y}` location key.
pub fn parse_location(text: &str) -> Option<TileCoord> {
    let rest = text.strip_prefix('X')?;
    let (x, y) = rest.split_once('Y')?;
    Some(TileCoord::new(x.parse().ok()?, y.parse().ok()?))
}

/// Parses FASM text. Disabled features (`= 0`) are dropped.
pub fn parse_fasm(text: &str) -> Result<FasmOutput, BitstreamError> {
    let mut output = FasmOutput::new();
    for (i, raw) in text.lines().enumerate() {
        let line = (i + 1) as u32;
        let err = |message: String| BitstreamError::MalformedFasm { line, message };
        let content = raw.split('#').next().unwrap_or_default().trim();
        if content.is_empty() {
            continue;
        }
        let (path, value) = match content.split_once('=') {
            Some((path, value)) => (path.trim(), Some(value.trim())),
            None => (content, None),
        };
        let enabled = match value {
            None | Some("1") => true,
            Some("0") => false,
            Some(other) => return Err(err(format!("unsupported value '{other}'"))),
        };
        let (location, feature) = path
            .split_once('.')
            .ok_or_else(|| err(format!("expected '<location>.<feature>', found '{path}'")))?;
        let location =
            parse_location(location).ok_or_else(|| err(format!("invalid location '{location}'")))?;
        if feature.is_empty() {
            return Err(err("empty feature name".to_string()));
        }
        if enabled {
            output.add_feature(location, feature);
        }
    }
    Ok(output)
}

/// Writes every feature into a per-location frame image.
///
/// Locations without features get no image.
pub fn assemble(
    fasm: &FasmOutput,
    fabric: &CompiledFabric,
) -> Result<BTreeMap<TileCoord, ConfigImage>, BitstreamError> {
    let frame_bits = fabric.config.frame_bits_per_row;
    let frame_count = fabric.config.max_frames_per_col;
    let mut images = BTreeMap::new();
    for f in fasm.features() {
        let key = f.location.key();
        let features = fabric
            .features_at(f.location)
            .ok_or_else(|| BitstreamError::UnknownFeature {
                location: key.clone(),
                feature: f.feature.clone(),
            })?;
        images
            .entry(f.location)
            .or_insert_with(|| ConfigImage::new(frame_bits, frame_count))
            .enable(&features, &f.feature, &key)?;
    }
    Ok(images)
}

/// The FASM listing of every feature enabled in `images`.
pub fn disassemble(images: &BTreeMap<TileCoord, ConfigImage>, fabric: &CompiledFabric) -> FasmOutput {
    let mut output = FasmOutput::new();
    for (&location, image) in images {
        if let Some(features) = fabric.features_at(location) {
            for feature in image.enabled_features(&features) {
                output.add_feature(location, feature);
            }
        }
    }
    output
}
