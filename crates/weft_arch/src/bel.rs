//! Configurable primitives and their feature maps.

use crate::error::ArchError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One named feature as written in a fabric description.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSpec {
    /// Feature name, e.g. `INIT[3]` or `FF`.
    pub name: String,
    /// Local bit offsets inside the owning bel, in significance order.
    pub bits: Vec<u32>,
}

/// Ordered association list from feature name to local bit offsets.
///
/// Encounter order is part of the output: the feature table lists bel
/// features in exactly this order, so the container must never reorder.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<FeatureSpec>", into = "Vec<FeatureSpec>")]
pub struct FeatureMap {
    entries: IndexMap<String, Vec<u32>>,
}

impl FeatureMap {
    /// Creates an empty feature map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a feature. Fails if the name is already present.
    pub fn insert(&mut self, name: impl Into<String>, bits: Vec<u32>) -> Result<(), ArchError> {
        let name = name.into();
        if self.entries.contains_key(&name) {
            return Err(ArchError::DuplicateFeature { feature: name });
        }
        self.entries.insert(name, bits);
        Ok(())
    }

    /// Iterates features in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[u32])> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Returns the offsets of a feature.
    pub fn get(&self, name: &str) -> Option<&[u32]> {
        self.entries.get(name).map(Vec::as_slice)
    }

    /// Number of features.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there are no features.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl TryFrom<Vec<FeatureSpec>> for FeatureMap {
    type Error = ArchError;

    fn try_from(specs: Vec<FeatureSpec>) -> Result<Self, Self::Error> {
        let mut map = FeatureMap::new();
        for spec in specs {
            map.insert(spec.name, spec.bits)?;
        }
        Ok(map)
    }
}

impl From<FeatureMap> for Vec<FeatureSpec> {
    fn from(map: FeatureMap) -> Self {
        map.entries
            .into_iter()
            .map(|(name, bits)| FeatureSpec { name, bits })
            .collect()
    }
}

/// A configurable primitive instantiated in a tile.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bel {
    /// Primitive name, e.g. `LUT4c_frame_config`.
    pub name: String,
    /// Instance prefix prepended to port and feature names, e.g. `LA_`.
    #[serde(default)]
    pub prefix: String,
    /// Inputs, driven by the switch matrix.
    #[serde(default)]
    pub inputs: Vec<String>,
    /// Outputs, feeding the switch matrix.
    #[serde(default)]
    pub outputs: Vec<String>,
    /// Ports exported to the fabric top level.
    #[serde(default)]
    pub external: Vec<String>,
    /// Ports merged across bels, e.g. a user clock.
    #[serde(default)]
    pub shared: Vec<String>,
    /// Configuration bits this bel consumes.
    #[serde(default)]
    pub config_bits: u32,
    /// Named features and the local bits they occupy.
    #[serde(default)]
    pub features: FeatureMap,
}

impl Bel {
    /// Creates a bel with no ports or features.
    pub fn new(name: impl Into<String>, prefix: impl Into<String>, config_bits: u32) -> Self {
        Self {
            name: name.into(),
            prefix: prefix.into(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            external: Vec::new(),
            shared: Vec::new(),
            config_bits,
            features: FeatureMap::new(),
        }
    }

    /// Adds a feature, builder style.
    pub fn with_feature(mut self, name: &str, bits: Vec<u32>) -> Result<Self, ArchError> {
        self.features.insert(name, bits)?;
        Ok(self)
    }

    /// Input names as they appear in the switch matrix (prefixed).
    pub fn matrix_inputs(&self) -> impl Iterator<Item = String> + '_ {
        self.inputs.iter().map(|p| format!("{}{p}", self.prefix))
    }

    /// Output names as they appear in the switch matrix (prefixed).
    pub fn matrix_outputs(&self) -> impl Iterator<Item = String> + '_ {
        self.outputs.iter().map(|p| format!("{}{p}", self.prefix))
    }

    /// Feature-table name of `feature` for the bel at `index` within its tile.
    ///
    /// `{prefix}{feature}` when the bel has a prefix, otherwise the bel's
    /// index letter: `A.{feature}`, `B.{feature}`, and so on.
    pub fn feature_name(&self, index: usize, feature: &str) -> String {
        if self.prefix.is_empty() {
            format!("{}.{feature}", index_letter(index))
        } else {
            format!("{}{feature}", self.prefix)
        }
    }

    /// Checks that every feature fits inside the bel's configuration bits.
    pub fn validate(&self, tile: &str) -> Result<(), ArchError> {
        for (feature, bits) in self.features.iter() {
            if let Some(&offset) = bits.iter().find(|&&b| b >= self.config_bits) {
                return Err(ArchError::FeatureOutOfRange {
                    tile: tile.to_string(),
                    bel: self.name.clone(),
                    feature: feature.to_string(),
                    offset,
                    config_bits: self.config_bits,
                });
            }
        }
        Ok(())
    }
}

/// `A`..`Z`, then `AA`, `AB`, ... for larger indices.
fn index_letter(index: usize) -> String {
    let mut n = index;
    let mut out = Vec::new();
    loop {
        out.push(b'A' + (n % 26) as u8);
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}
