//! The fabric grid.

use crate::error::ArchError;
use crate::port::{is_null, NULL_PORT};
use crate::super_tile::{ComposedSuperTile, SuperTile};
use crate::tile::Tile;
use indexmap::IndexMap;
use std::collections::{BTreeMap, BTreeSet};
use weft_common::{FabricConfig, TileCoord};

/// A complete fabric: global parameters, the tile library, and the grid.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fabric {
    /// Fabric name.
    pub name: String,
    /// Global parameters.
    pub config: FabricConfig,
    /// Tile type names row by row (`grid[y][x]`), `NULL` for empty cells.
    pub grid: Vec<Vec<String>>,
    /// Tile library keyed by type name.
    pub tiles: BTreeMap<String, Tile>,
    /// Super tile groupings.
    pub super_tiles: Vec<SuperTile>,
}

impl Fabric {
    /// Assembles and validates a fabric.
    pub fn new(
        name: impl Into<String>,
        config: FabricConfig,
        grid: Vec<Vec<String>>,
        tiles: impl IntoIterator<Item = Tile>,
        super_tiles: Vec<SuperTile>,
    ) -> Result<Fabric, ArchError> {
        let fabric = Fabric {
            name: name.into(),
            config,
            grid,
            tiles: tiles.into_iter().map(|t| (t.name.clone(), t)).collect(),
            super_tiles,
        };
        fabric.validate()?;
        Ok(fabric)
    }

    /// Checks that every grid cell names a known tile type and that every
    /// super tile composes.
    pub fn validate(&self) -> Result<(), ArchError> {
        for (coord, name) in self.cells() {
            if !is_null(name) && !self.tiles.contains_key(name) {
                return Err(ArchError::UnknownTileType {
                    name: name.to_string(),
                    coord,
                });
            }
        }
        for tile in self.tiles.values() {
            tile.validate()?;
        }
        for st in &self.super_tiles {
            st.compose(&self.tiles)?;
        }
        Ok(())
    }

    fn cells(&self) -> impl Iterator<Item = (TileCoord, &str)> {
        self.grid.iter().enumerate().flat_map(|(y, row)| {
            row.iter()
                .enumerate()
                .map(move |(x, name)| (TileCoord::new(x as u32, y as u32), name.as_str()))
        })
    }

    /// Number of columns (the widest row).
    pub fn width(&self) -> u32 {
        self.grid.iter().map(Vec::len).max().unwrap_or(0) as u32
    }

    /// Number of rows.
    pub fn height(&self) -> u32 {
        self.grid.len() as u32
    }

    /// The tile instantiated at `coord`, if any.
    pub fn tile_at(&self, coord: TileCoord) -> Option<&Tile> {
        let name = self.grid.get(coord.y as usize)?.get(coord.x as usize)?;
        self.tiles.get(name)
    }

    /// Every populated location in row-major order.
    pub fn locations(&self) -> Vec<(TileCoord, &Tile)> {
        self.cells()
            .filter_map(|(coord, name)| self.tiles.get(name).map(|t| (coord, t)))
            .collect()
    }

    /// `X{x}Y{y}` to tile type name or `NULL`, row-major.
    pub fn tile_map(&self) -> IndexMap<String, String> {
        self.cells()
            .map(|(coord, name)| {
                let value = if self.tiles.contains_key(name) { name } else { NULL_PORT };
                (coord.key(), value.to_string())
            })
            .collect()
    }

    /// Tile types that appear somewhere in the grid.
    pub fn used_tile_types(&self) -> BTreeSet<&str> {
        self.locations().into_iter().map(|(_, t)| t.name.as_str()).collect()
    }

    /// Placed super tile instances as `(index into super_tiles, anchor)`.
    pub fn super_tile_placements(&self) -> Vec<(usize, TileCoord)> {
        self.super_tiles
            .iter()
            .enumerate()
            .flat_map(|(index, st)| st.placements(&self.grid).into_iter().map(move |a| (index, a)))
            .collect()
    }

    /// Composes every super tile.
    pub fn composed_super_tiles(&self) -> Result<Vec<ComposedSuperTile>, ArchError> {
        self.super_tiles.iter().map(|st| st.compose(&self.tiles)).collect()
    }
}
