//! Configuration types deserialized from `fabric.toml`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use weft_arch::{Bel, Port, SuperTile};
use weft_common::FabricConfig;

/// The top-level fabric description parsed from `fabric.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FabricFile {
    /// Fabric name and global parameters.
    pub fabric: FabricSection,
    /// The tile grid.
    #[serde(default)]
    pub grid: GridSection,
    /// Tile type library.
    #[serde(default, rename = "tile")]
    pub tiles: Vec<TileSpec>,
    /// Super tile layouts.
    #[serde(default, rename = "super_tile")]
    pub super_tiles: Vec<SuperTile>,
}

/// The `[fabric]` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FabricSection {
    /// Fabric name.
    pub name: String,
    /// Frame geometry, configuration mode and multiplexer style.
    #[serde(flatten)]
    pub config: FabricConfig,
}

/// The `[grid]` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSection {
    /// Tile type names row by row; `NULL` for empty cells.
    #[serde(default)]
    pub rows: Vec<Vec<String>>,
}

/// One `[[tile]]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileSpec {
    /// Tile type name.
    pub name: String,
    /// Switch-matrix adjacency file, `.csv` or `.list`. A tile without one
    /// has no switch matrix.
    #[serde(default)]
    pub matrix: Option<PathBuf>,
    /// Explicit ConfigMem table. When absent the default policy applies.
    #[serde(default)]
    pub config_mem: Option<PathBuf>,
    /// Boundary ports.
    #[serde(default, rename = "port")]
    pub ports: Vec<Port>,
    /// Primitives.
    #[serde(default, rename = "bel")]
    pub bels: Vec<Bel>,
}

impl FabricFile {
    /// Looks up a tile spec by name.
    pub fn tile(&self, name: &str) -> Option<&TileSpec> {
        self.tiles.iter().find(|t| t.name == name)
    }
}
