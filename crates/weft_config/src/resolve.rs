//! Path resolution and fabric assembly.

use crate::error::ConfigError;
use crate::types::FabricFile;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use weft_arch::{Fabric, FanInMap, Tile};

/// Files belonging to one tile type, resolved against the description's directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileSources {
    /// Tile type name.
    pub tile: String,
    /// Switch-matrix file, if the tile has one.
    pub matrix: Option<PathBuf>,
    /// Explicit ConfigMem table.
    pub config_mem: Option<PathBuf>,
    /// Where a generated ConfigMem table is written when none is given.
    pub default_config_mem: PathBuf,
}

impl TileSources {
    /// The ConfigMem table to read: the explicit one, else the generated one
    /// if it already exists.
    pub fn existing_config_mem(&self) -> Option<&Path> {
        match &self.config_mem {
            Some(path) => Some(path.as_path()),
            None if self.default_config_mem.is_file() => Some(self.default_config_mem.as_path()),
            None => None,
        }
    }
}

/// Resolves every tile's file references against `base_dir`.
///
/// Absolute paths are kept as written.
pub fn resolve_tile_sources(config: &FabricFile, base_dir: &Path) -> Vec<TileSources> {
    config
        .tiles
        .iter()
        .map(|t| TileSources {
            tile: t.name.clone(),
            matrix: t.matrix.as_ref().map(|p| base_dir.join(p)),
            config_mem: t.config_mem.as_ref().map(|p| base_dir.join(p)),
            default_config_mem: base_dir.join(format!("{}_ConfigMem.init.csv", t.name)),
        })
        .collect()
}

/// Builds the [`Fabric`] from a validated description and the fan-in maps
/// loaded for each tile.
///
/// A tile that declares a matrix file must have an entry in `fan_ins`;
/// tiles without one get an empty switch matrix.
pub fn assemble_fabric(
    config: &FabricFile,
    mut fan_ins: BTreeMap<String, FanInMap>,
) -> Result<Fabric, ConfigError> {
    let mut tiles = Vec::with_capacity(config.tiles.len());
    for spec in &config.tiles {
        let fan_in = match fan_ins.remove(&spec.name) {
            Some(map) => map,
            None if spec.matrix.is_none() => FanInMap::new(),
            None => {
                return Err(ConfigError::MissingField(format!(
                    "switch matrix for tile '{}'",
                    spec.name
                )))
            }
        };
        tiles.push(Tile::new(
            spec.name.clone(),
            spec.ports.clone(),
            spec.bels.clone(),
            fan_in,
        )?);
    }
    Fabric::new(
        config.fabric.name.clone(),
        config.fabric.config,
        config.grid.rows.clone(),
        tiles,
        config.super_tiles.clone(),
    )
    .map_err(ConfigError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::load_config_from_str;

    const DESC: &str = r#"
[fabric]
name = "demo"
frame_bits_per_row = 4
max_frames_per_col = 2

[grid]
rows = [["LUT", "IO"]]

[[tile]]
name = "LUT"
matrix = "LUT_switch_matrix.csv"

[[tile]]
name = "IO"
config_mem = "/abs/IO_ConfigMem.csv"
"#;

    #[test]
    fn paths_resolve_against_base() {
        let config = load_config_from_str(DESC).unwrap();
        let sources = resolve_tile_sources(&config, Path::new("/work/fabric"));
        assert_eq!(
            sources[0].matrix.as_deref(),
            Some(Path::new("/work/fabric/LUT_switch_matrix.csv"))
        );
        assert_eq!(
            sources[0].default_config_mem,
            PathBuf::from("/work/fabric/LUT_ConfigMem.init.csv")
        );
        assert_eq!(sources[1].matrix, None);
        assert_eq!(sources[1].config_mem.as_deref(), Some(Path::new("/abs/IO_ConfigMem.csv")));
        assert_eq!(sources[1].existing_config_mem(), Some(Path::new("/abs/IO_ConfigMem.csv")));
    }

    #[test]
    fn generated_config_mem_is_picked_up_once_written() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_from_str(DESC).unwrap();
        let sources = resolve_tile_sources(&config, dir.path());
        assert_eq!(sources[0].existing_config_mem(), None);
        std::fs::write(&sources[0].default_config_mem, "").unwrap();
        assert!(sources[0].existing_config_mem().is_some());
    }

    #[test]
    fn assemble_requires_declared_matrices() {
        let config = load_config_from_str(DESC).unwrap();
        let err = assemble_fabric(&config, BTreeMap::new()).unwrap_err();
        assert!(matches!(err, ConfigError::MissingField(_)));

        let mut fan_ins = BTreeMap::new();
        fan_ins.insert("LUT".to_string(), FanInMap::new());
        let fabric = assemble_fabric(&config, fan_ins).unwrap();
        assert_eq!(fabric.locations().len(), 2);
        assert!(fabric.tiles["IO"].fan_in.is_empty());
    }

    #[test]
    fn matrix_names_must_match_declared_ports() {
        let config = load_config_from_str(DESC).unwrap();
        let mut fan_ins = BTreeMap::new();
        fan_ins.insert("LUT".to_string(), FanInMap::from_pairs([("A", vec!["b"])]));
        let err = assemble_fabric(&config, fan_ins).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Arch(weft_arch::ArchError::UnknownPort { role: "destination", .. })
        ));
        assert_eq!(err.code().to_string(), "A105");
    }
}
