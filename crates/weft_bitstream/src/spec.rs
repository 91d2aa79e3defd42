//! The fabric-level bitstream specification.
//!
//! This is the document a bitstream assembler consumes: which tile type sits
//! at each location, every location's feature table, and how each tile
//! type's logical bits land in its frames.

use crate::compile::CompiledFabric;
use crate::feature_table::FeatureBits;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write;

/// Frame geometry shared by every tile column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchSpecs {
    /// Frames per tile column.
    #[serde(rename = "MaxFramesPerCol")]
    pub max_frames_per_col: u32,
    /// Data lines per frame.
    #[serde(rename = "FrameBitsPerRow")]
    pub frame_bits_per_row: u32,
}

/// The serialized bitstream specification.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BitstreamSpec {
    /// `X{x}Y{y}` to tile type name or `NULL`, row-major.
    #[serde(rename = "TileMap")]
    pub tile_map: IndexMap<String, String>,
    /// `X{x}Y{y}` to that location's feature table, row-major.
    #[serde(rename = "TileSpecs")]
    pub tile_specs: IndexMap<String, IndexMap<String, FeatureBits>>,
    /// Tile type to frame index to used-bit mask. Empty for tiles without
    /// frame-latched bits.
    #[serde(rename = "FrameMap")]
    pub frame_map: BTreeMap<String, BTreeMap<u32, String>>,
    /// Tile type to logical bit to physical bit.
    #[serde(rename = "FrameMapEncode")]
    pub frame_map_encode: BTreeMap<String, BTreeMap<u32, u32>>,
    /// Frame geometry.
    #[serde(rename = "ArchSpecs")]
    pub arch_specs: ArchSpecs,
}

impl BitstreamSpec {
    /// Collects the bitstream specification from a compiled fabric.
    pub fn from_compiled(fabric: &CompiledFabric) -> BitstreamSpec {
        let tile_map = fabric.tile_map.iter().cloned().collect();
        let tile_specs = fabric
            .instances()
            .filter_map(|(coord, _)| {
                let features = fabric.features_at(coord)?;
                Some((coord.key(), features.entries().clone()))
            })
            .collect();

        let mut frame_map = BTreeMap::new();
        let mut frame_map_encode = BTreeMap::new();
        for (name, tile) in &fabric.tiles {
            let masks = match &tile.config_mem {
                Some(mem) if tile.allocation.global_config_bits > 0 => mem
                    .entries
                    .iter()
                    .map(|e| (e.frame_index, e.mask.clone()))
                    .collect(),
                _ => BTreeMap::new(),
            };
            frame_map.insert(name.clone(), masks);
            frame_map_encode.insert(name.clone(), tile.encode.assigned().collect());
        }

        BitstreamSpec {
            tile_map,
            tile_specs,
            frame_map,
            frame_map_encode,
            arch_specs: ArchSpecs {
                max_frames_per_col: fabric.config.max_frames_per_col,
                frame_bits_per_row: fabric.config.frame_bits_per_row,
            },
        }
    }

    /// Pretty-printed JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Reads a bitstream specification back from JSON.
    pub fn from_json(text: &str) -> serde_json::Result<BitstreamSpec> {
        serde_json::from_str(text)
    }

    /// Flat two-column dump: a location line, then one `feature,bits` line
    /// per feature with bits as space-separated `phys=value` pairs.
    pub fn to_csv(&self) -> String {
        let mut out = String::new();
        for (location, features) in &self.tile_specs {
            let _ = writeln!(out, "{location}");
            for (name, bits) in features {
                let _ = writeln!(out, "{name},{bits}");
            }
        }
        out
    }
}
