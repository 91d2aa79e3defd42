//! The per-tile pipeline and its fabric-wide driver.
//!
//! Each tile type used in the grid runs allocator, encoder and feature-table
//! builder independently, so tile types compile in parallel. Results are
//! collected into ordered maps, making the output independent of scheduling.

use crate::alloc::{allocate, TileAllocation};
use crate::config_mem::ConfigMem;
use crate::encode::EncodeDict;
use crate::error::BitstreamError;
use crate::feature_table::FeatureTable;
use rayon::prelude::*;
use std::borrow::Cow;
use std::collections::BTreeMap;
use weft_arch::{Fabric, Tile};
use weft_common::{ConfigBitMode, FabricConfig, InternalError, TileCoord};
use weft_diagnostics::DiagnosticSink;

/// Everything the pipeline produces for one tile type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompiledTile {
    /// Tile type name.
    pub tile: String,
    /// Ordered allocation records.
    pub allocation: TileAllocation,
    /// The frame table in use. `None` in shift-register chain mode.
    pub config_mem: Option<ConfigMem>,
    /// `true` when `config_mem` came from the default policy rather than a file.
    pub generated_config_mem: bool,
    /// Logical-to-physical map.
    pub encode: EncodeDict,
    /// Feature table shared by every instance of the type. Super tile
    /// members add location-specific rows, see [`CompiledFabric::features_at`].
    pub features: FeatureTable,
}

/// Runs the pipeline for one tile type.
///
/// `explicit` overrides the default frame policy.
pub fn compile_tile(
    tile: &Tile,
    config: &FabricConfig,
    explicit: Option<&ConfigMem>,
    sink: &DiagnosticSink,
) -> Result<CompiledTile, BitstreamError> {
    let allocation = allocate(tile, config, sink);
    let global = allocation.global_config_bits;
    let (config_mem, generated_config_mem, encode) = match config.config_bit_mode {
        ConfigBitMode::FrameBased => {
            let (mem, generated) = match explicit {
                Some(mem) => (mem.clone(), false),
                None => (ConfigMem::default_policy(&tile.name, global, config)?, true),
            };
            let encode = EncodeDict::build(&mem, global, config)?;
            (Some(mem), generated, encode)
        }
        ConfigBitMode::ShiftRegisterChain => (None, false, EncodeDict::identity(global)),
    };
    let features = FeatureTable::build(tile, &allocation, &encode)?;
    Ok(CompiledTile {
        tile: tile.name.clone(),
        allocation,
        config_mem,
        generated_config_mem,
        encode,
        features,
    })
}

/// A compiled fabric: per-type results plus the grid that instantiates them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompiledFabric {
    /// Fabric name.
    pub name: String,
    /// Global parameters the fabric was compiled with.
    pub config: FabricConfig,
    /// Compiled tile types, by name.
    pub tiles: BTreeMap<String, CompiledTile>,
    /// Populated locations and their tile type.
    pub locations: BTreeMap<TileCoord, String>,
    /// Every grid cell as `(X{x}Y{y}, type or NULL)`, row-major.
    pub tile_map: Vec<(String, String)>,
    /// Zero-bit `(source, destination)` super tile internal nets by the
    /// location of a member they touch.
    pub internal_nets: BTreeMap<TileCoord, Vec<(String, String)>>,
}

impl CompiledFabric {
    /// The compiled tile type at a location.
    pub fn tile_at(&self, coord: TileCoord) -> Option<&CompiledTile> {
        self.tiles.get(self.locations.get(&coord)?)
    }

    /// The feature table of the instance at a location: its type's table,
    /// plus a row per super tile internal net the instance takes part in.
    pub fn features_at(&self, coord: TileCoord) -> Option<Cow<'_, FeatureTable>> {
        let tile = self.tile_at(coord)?;
        Some(match self.internal_nets.get(&coord) {
            Some(nets) => Cow::Owned(tile.features.with_fixed(nets)),
            None => Cow::Borrowed(&tile.features),
        })
    }

    /// Populated locations and their compiled type, row-major.
    pub fn instances(&self) -> impl Iterator<Item = (TileCoord, &CompiledTile)> {
        let mut coords: Vec<_> = self.locations.keys().copied().collect();
        coords.sort_by_key(|c| (c.y, c.x));
        coords
            .into_iter()
            .filter_map(move |c| self.tile_at(c).map(|t| (c, t)))
    }
}

/// Zero-bit connections contributed by placed super tiles, by location.
/// Each net is listed at both its driving and its receiving member.
fn internal_nets(
    fabric: &Fabric,
) -> Result<BTreeMap<TileCoord, Vec<(String, String)>>, BitstreamError> {
    let composed = fabric.composed_super_tiles().map_err(|e| {
        BitstreamError::Internal(InternalError::new(format!(
            "super tile composition failed after validation: {e}"
        )))
    })?;
    let mut nets: BTreeMap<TileCoord, Vec<(String, String)>> = BTreeMap::new();
    for (index, anchor) in fabric.super_tile_placements() {
        let Some(composed) = composed.get(index) else {
            continue;
        };
        for net in &composed.internal {
            let connection = (net.source.clone(), net.destination.clone());
            for (x, y) in [net.from, net.to] {
                let list = nets.entry(TileCoord::new(anchor.x + x, anchor.y + y)).or_default();
                if !list.contains(&connection) {
                    list.push(connection.clone());
                }
            }
        }
    }
    Ok(nets)
}

/// Compiles every tile type that appears in the grid.
///
/// `config_mems` holds explicit frame tables by tile type name. Each failing
/// tile reports its error to `sink`; the first failure in tile-name order is
/// returned.
pub fn compile_fabric(
    fabric: &Fabric,
    config_mems: &BTreeMap<String, ConfigMem>,
    sink: &DiagnosticSink,
) -> Result<CompiledFabric, BitstreamError> {
    let internal_nets = internal_nets(fabric)?;
    let used: Vec<&Tile> = fabric
        .used_tile_types()
        .into_iter()
        .filter_map(|name| fabric.tiles.get(name))
        .collect();

    let results: Vec<Result<CompiledTile, BitstreamError>> = used
        .par_iter()
        .map(|tile| {
            compile_tile(tile, &fabric.config, config_mems.get(&tile.name), sink)
                .inspect_err(|e| sink.emit(e.to_diagnostic()))
        })
        .collect();

    let mut tiles = BTreeMap::new();
    for result in results {
        let compiled = result?;
        tiles.insert(compiled.tile.clone(), compiled);
    }

    let locations = fabric
        .locations()
        .into_iter()
        .map(|(coord, tile)| (coord, tile.name.clone()))
        .collect();
    Ok(CompiledFabric {
        name: fabric.name.clone(),
        config: fabric.config,
        tiles,
        locations,
        tile_map: fabric.tile_map().into_iter().collect(),
        internal_nets,
    })
}
