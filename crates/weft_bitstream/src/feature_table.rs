//! Feature tables: human-readable feature names to physical bit patterns.
//!
//! The builder walks the allocation records alongside the tile's entity
//! list with its own cursor and fails with an internal error if the two
//! ever disagree. Every nameable connection gets a row; fixed connections
//! have an empty bit map.

use crate::alloc::{AllocationRecord, TileAllocation};
use crate::encode::EncodeDict;
use crate::error::BitstreamError;
use indexmap::map::Entry;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use weft_arch::{ConfigEntity, Tile};
use weft_common::InternalError;

/// Expected value of one configuration bit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BitValue {
    /// Bit cleared.
    #[serde(rename = "0")]
    Zero,
    /// Bit set.
    #[serde(rename = "1")]
    One,
}

impl BitValue {
    /// Converts from a boolean.
    pub fn from_bool(value: bool) -> Self {
        if value {
            BitValue::One
        } else {
            BitValue::Zero
        }
    }

    /// Converts to a boolean.
    pub fn as_bool(self) -> bool {
        self == BitValue::One
    }
}

impl fmt::Display for BitValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(if self.as_bool() { "1" } else { "0" })
    }
}

/// Physical bit index to expected value, in listing order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureBits {
    bits: IndexMap<u32, BitValue>,
}

impl FeatureBits {
    /// An empty pattern (a fixed connection).
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a bit.
    pub fn push(&mut self, physical: u32, value: BitValue) {
        self.bits.insert(physical, value);
    }

    /// Bits in listing order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, BitValue)> + '_ {
        self.bits.iter().map(|(&p, &v)| (p, v))
    }

    /// Expected value of one physical bit.
    pub fn get(&self, physical: u32) -> Option<BitValue> {
        self.bits.get(&physical).copied()
    }

    /// Number of bits.
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    /// Returns `true` for fixed connections.
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }
}

impl fmt::Display for FeatureBits {
    /// `phys=value` pairs separated by spaces.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (p, v)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{p}={v}")?;
        }
        Ok(())
    }
}

/// The feature table of one tile type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureTable {
    /// Tile type name.
    pub tile: String,
    entries: IndexMap<String, FeatureBits>,
}

impl FeatureTable {
    /// Builds the table from a tile's allocation and encoding.
    pub fn build(
        tile: &Tile,
        alloc: &TileAllocation,
        encode: &EncodeDict,
    ) -> Result<FeatureTable, BitstreamError> {
        let entities = tile.config_entities();
        if entities.len() != alloc.records.len() {
            return Err(drift(format!(
                "tile '{}' has {} configuration entities but {} allocation records",
                tile.name,
                entities.len(),
                alloc.records.len()
            )));
        }

        let physical = |logical: u32| {
            encode.physical(logical).ok_or_else(|| {
                drift(format!(
                    "tile '{}': logical bit {logical} has no physical position",
                    tile.name
                ))
            })
        };

        let mut table = FeatureTable {
            tile: tile.name.clone(),
            entries: IndexMap::new(),
        };
        let mut cursor = 0u32;
        for (entity, record) in entities.iter().zip(&alloc.records) {
            match (entity, record) {
                (ConfigEntity::Bel { index, bel }, AllocationRecord::Bel { range, .. }) => {
                    if range.start != cursor || range.width != bel.config_bits {
                        return Err(drift(format!(
                            "bel '{}' of tile '{}' allocated at {}+{}, expected {cursor}+{}",
                            bel.name, tile.name, range.start, range.width, bel.config_bits
                        )));
                    }
                    for (feature, offsets) in bel.features.iter() {
                        let mut bits = FeatureBits::new();
                        for &offset in offsets {
                            bits.push(physical(cursor + offset)?, BitValue::One);
                        }
                        table.insert_configurable(bel.feature_name(*index, feature), bits)?;
                    }
                    cursor += bel.config_bits;
                }
                (
                    ConfigEntity::Mux {
                        destination,
                        sources,
                    },
                    AllocationRecord::Mux(mux),
                ) if mux.destination == *destination => {
                    if mux.range.start != cursor {
                        return Err(drift(format!(
                            "multiplexer '{destination}' of tile '{}' allocated at {}, expected {cursor}",
                            tile.name, mux.range.start
                        )));
                    }
                    let width = mux.range.width;
                    for (k, source) in sources.iter().enumerate() {
                        let mut bits = FeatureBits::new();
                        for j in (0..width).rev() {
                            let value = (k >> j) & 1 == 1;
                            bits.push(physical(cursor + j)?, BitValue::from_bool(value));
                        }
                        table.insert_configurable(format!("{destination}.{}", source.name()), bits)?;
                    }
                    cursor += width;
                }
                (
                    ConfigEntity::Mux { destination, .. },
                    AllocationRecord::PassThrough {
                        destination: d,
                        source,
                    }
                    | AllocationRecord::ConstantTie {
                        destination: d,
                        source,
                        ..
                    },
                ) if d.as_str() == *destination => {
                    table.insert_configurable(format!("{destination}.{source}"), FeatureBits::new())?;
                }
                (ConfigEntity::Mux { destination, .. }, AllocationRecord::Unused { destination: d })
                    if d.as_str() == *destination =>
                {
                    table.insert_configurable(destination.to_string(), FeatureBits::new())?;
                }
                _ => {
                    return Err(drift(format!(
                        "tile '{}': allocation record order does not match its entities",
                        tile.name
                    )))
                }
            }
        }
        if cursor != alloc.global_config_bits {
            return Err(drift(format!(
                "tile '{}': feature walk ended at bit {cursor}, allocation has {}",
                tile.name, alloc.global_config_bits
            )));
        }

        for (source, destination, _) in tile.fixed_connections() {
            table.insert_fixed(format!("{destination}.{source}"));
        }
        Ok(table)
    }

    /// A copy with further zero-bit `(source, destination)` rows, such as
    /// the super tile internal nets one instance takes part in.
    pub fn with_fixed(&self, connections: &[(String, String)]) -> FeatureTable {
        let mut table = self.clone();
        for (source, destination) in connections {
            table.insert_fixed(format!("{destination}.{source}"));
        }
        table
    }

    /// Adds a bel or multiplexer row. Each must own its name.
    fn insert_configurable(&mut self, name: String, bits: FeatureBits) -> Result<(), BitstreamError> {
        match self.entries.entry(name) {
            Entry::Occupied(e) => Err(BitstreamError::DuplicateFeature {
                tile: self.tile.clone(),
                feature: e.key().clone(),
            }),
            Entry::Vacant(e) => {
                e.insert(bits);
                Ok(())
            }
        }
    }

    /// Adds a zero-bit fixed connection unless the name is already taken.
    fn insert_fixed(&mut self, name: String) {
        self.entries.entry(name).or_default();
    }

    /// Looks up a feature.
    pub fn get(&self, name: &str) -> Option<&FeatureBits> {
        self.entries.get(name)
    }

    /// Features in table order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FeatureBits)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// The underlying ordered map.
    pub fn entries(&self) -> &IndexMap<String, FeatureBits> {
        &self.entries
    }

    /// Number of features.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the table has no features.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn drift(message: String) -> BitstreamError {
    BitstreamError::Internal(InternalError::new(message))
}
