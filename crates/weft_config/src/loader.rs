//! Fabric description loading and validation.

use crate::error::ConfigError;
use crate::types::FabricFile;
use std::collections::BTreeSet;
use std::path::Path;
use weft_arch::NULL_PORT;

/// File name looked up when [`load_config`] is given a directory.
pub const DEFAULT_FILE_NAME: &str = "fabric.toml";

/// Loads and validates a fabric description.
///
/// `path` is either the description itself or a directory containing
/// `fabric.toml`.
pub fn load_config(path: &Path) -> Result<FabricFile, ConfigError> {
    let file = if path.is_dir() {
        path.join(DEFAULT_FILE_NAME)
    } else {
        path.to_path_buf()
    };
    let content = std::fs::read_to_string(&file)?;
    load_config_from_str(&content)
}

/// Parses and validates a fabric description from a string.
///
/// Useful for testing without filesystem dependencies.
pub fn load_config_from_str(content: &str) -> Result<FabricFile, ConfigError> {
    let config: FabricFile =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Validates that required fields are present and references resolve.
pub fn validate_config(config: &FabricFile) -> Result<(), ConfigError> {
    if config.fabric.name.is_empty() {
        return Err(ConfigError::MissingField("fabric.name".to_string()));
    }
    if config.fabric.config.frame_bits_per_row == 0 {
        return Err(ConfigError::ValidationError(
            "frame_bits_per_row must be positive".to_string(),
        ));
    }
    if config.fabric.config.max_frames_per_col == 0 {
        return Err(ConfigError::ValidationError(
            "max_frames_per_col must be positive".to_string(),
        ));
    }

    let mut names = BTreeSet::new();
    for tile in &config.tiles {
        if tile.name.is_empty() {
            return Err(ConfigError::MissingField("tile.name".to_string()));
        }
        if !names.insert(tile.name.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "tile type '{}' is defined twice",
                tile.name
            )));
        }
        for port in &tile.ports {
            port.validate(&tile.name)?;
        }
        for bel in &tile.bels {
            bel.validate(&tile.name)?;
        }
    }

    for (y, row) in config.grid.rows.iter().enumerate() {
        for (x, cell) in row.iter().enumerate() {
            if cell != NULL_PORT && !names.contains(cell.as_str()) {
                return Err(ConfigError::ValidationError(format!(
                    "grid X{x}Y{y} refers to unknown tile type '{cell}'"
                )));
            }
        }
    }

    for st in &config.super_tiles {
        for (pos, member) in st.members() {
            if !names.contains(member) {
                return Err(ConfigError::ValidationError(format!(
                    "super tile '{}' member at X{}Y{} refers to unknown tile type '{member}'",
                    st.name, pos.0, pos.1
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_common::{ConfigBitMode, MultiplexerStyle};

    const MINIMAL: &str = r#"
[fabric]
name = "demo"
frame_bits_per_row = 32
max_frames_per_col = 20
"#;

    #[test]
    fn parse_minimal_config() {
        let config = load_config_from_str(MINIMAL).unwrap();
        assert_eq!(config.fabric.name, "demo");
        assert_eq!(config.fabric.config.frame_bits_per_row, 32);
        assert_eq!(config.fabric.config.config_bit_mode, ConfigBitMode::FrameBased);
        assert_eq!(config.fabric.config.multiplexer_style, MultiplexerStyle::Generic);
        assert!(config.tiles.is_empty());
        assert!(config.grid.rows.is_empty());
    }

    #[test]
    fn parse_full_config() {
        let toml = r#"
[fabric]
name = "demo"
frame_bits_per_row = 4
max_frames_per_col = 2
config_bit_mode = "FlipFlopChain"
multiplexer_style = "custom"
generate_delay_in_switch_matrix = 80

[grid]
rows = [["NULL", "LUT4AB"], ["LUT4AB", "LUT4AB"]]

[[tile]]
name = "LUT4AB"
matrix = "LUT4AB_switch_matrix.csv"

[[tile.port]]
direction = "NORTH"
source = "N1BEG"
x_offset = 0
y_offset = -1
destination = "N1END"
wires = 4

[[tile.port]]
direction = "JUMP"
source = "J_BEG"
destination = "J_END"
wires = 2

[[tile.bel]]
name = "LUT4c_frame_config"
prefix = "LA_"
inputs = ["I0", "I1"]
outputs = ["O"]
config_bits = 18
features = [
  { name = "INIT", bits = [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15] },
  { name = "FF", bits = [16] },
  { name = "IOmux", bits = [17] },
]

[[super_tile]]
name = "PAIR"
rows = [["LUT4AB"], ["LUT4AB"]]
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.fabric.config.config_bit_mode, ConfigBitMode::ShiftRegisterChain);
        assert_eq!(config.fabric.config.multiplexer_style, MultiplexerStyle::Discrete);
        assert_eq!(config.fabric.config.generate_delay_in_switch_matrix, 80);
        let tile = config.tile("LUT4AB").unwrap();
        assert_eq!(tile.ports.len(), 2);
        assert_eq!(tile.ports[1].x_offset, 0);
        assert_eq!(tile.bels[0].config_bits, 18);
        let features: Vec<&str> = tile.bels[0].features.iter().map(|(n, _)| n).collect();
        assert_eq!(features, vec!["INIT", "FF", "IOmux"]);
        assert_eq!(config.super_tiles[0].members().count(), 2);
    }

    #[test]
    fn unknown_mode_is_a_parse_error() {
        let toml = MINIMAL.replace("max_frames_per_col = 20", "max_frames_per_col = 20\nconfig_bit_mode = \"latches\"");
        let err = load_config_from_str(&toml).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn zero_frame_width_rejected() {
        let toml = MINIMAL.replace("= 32", "= 0");
        let err = load_config_from_str(&toml).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn missing_name_errors() {
        let toml = MINIMAL.replace("\"demo\"", "\"\"");
        let err = load_config_from_str(&toml).unwrap_err();
        assert!(matches!(err, ConfigError::MissingField(_)));
    }

    #[test]
    fn grid_with_unknown_tile_rejected() {
        let toml = format!("{MINIMAL}\n[grid]\nrows = [[\"DSP\"]]\n");
        let err = load_config_from_str(&toml).unwrap_err();
        assert!(err.to_string().contains("unknown tile type 'DSP'"));
    }

    #[test]
    fn duplicate_tile_rejected() {
        let toml = format!("{MINIMAL}\n[[tile]]\nname = \"A\"\n\n[[tile]]\nname = \"A\"\n");
        let err = load_config_from_str(&toml).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn feature_outside_bel_rejected() {
        let toml = format!(
            "{MINIMAL}\n[[tile]]\nname = \"A\"\n\n[[tile.bel]]\nname = \"FF\"\nconfig_bits = 1\nfeatures = [{{ name = \"INIT\", bits = [1] }}]\n"
        );
        let err = load_config_from_str(&toml).unwrap_err();
        assert!(matches!(err, ConfigError::Arch(weft_arch::ArchError::FeatureOutOfRange { .. })));
    }

    #[test]
    fn diagonal_port_rejected() {
        let toml = format!(
            "{MINIMAL}\n[[tile]]\nname = \"A\"\n\n[[tile.port]]\ndirection = \"NORTH\"\nsource = \"X\"\nx_offset = 1\ny_offset = -1\ndestination = \"Y\"\nwires = 1\n"
        );
        let err = load_config_from_str(&toml).unwrap_err();
        assert_eq!(err.code().to_string(), "G101");
    }

    #[test]
    fn load_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(DEFAULT_FILE_NAME), MINIMAL).unwrap();
        let config = load_config(dir.path()).unwrap();
        assert_eq!(config.fabric.name, "demo");
    }

    #[test]
    fn io_error_from_nonexistent_file() {
        let err = load_config(Path::new("/nonexistent/fabric.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::IoError(_)));
    }
}
