//! Structural errors in a fabric description.

use weft_common::TileCoord;
use weft_diagnostics::{Category, Diagnostic, DiagnosticCode, Locus};

/// A broken fabric description. Every variant aborts compilation of the whole fabric.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArchError {
    /// The adjacency table has no header row.
    #[error("switch matrix for tile '{tile}' has no header row")]
    EmptyMatrix {
        /// Tile type name.
        tile: String,
    },

    /// A row's cell count differs from the header's.
    #[error("switch matrix for tile '{tile}', line {line}: row has {found} cells, header has {expected}")]
    MalformedRow {
        /// Tile type name.
        tile: String,
        /// 1-based line number.
        line: u32,
        /// Header cell count.
        expected: usize,
        /// This row's cell count.
        found: usize,
    },

    /// A cell holds something other than `0`, `1` or nothing.
    #[error("switch matrix for tile '{tile}', line {line}: invalid cell '{value}'")]
    InvalidCell {
        /// Tile type name.
        tile: String,
        /// 1-based line number.
        line: u32,
        /// The rejected cell text.
        value: String,
    },

    /// A destination or source name appears twice in the table.
    #[error("switch matrix for tile '{tile}': port '{name}' is declared twice")]
    DuplicatePort {
        /// Tile type name.
        tile: String,
        /// The repeated port name.
        name: String,
    },

    /// A connection refers to a port the matrix does not declare.
    #[error("tile '{tile}': port '{name}' is not a {role} of the switch matrix")]
    UnknownPort {
        /// Tile type name.
        tile: String,
        /// The unresolved port name.
        name: String,
        /// `"source"` or `"destination"`.
        role: &'static str,
    },

    /// A list line could not be expanded into port names.
    #[error("list line {line}: {message}")]
    MalformedList {
        /// 1-based line number.
        line: u32,
        /// What went wrong.
        message: String,
    },

    /// A port has nonzero offsets on both axes.
    #[error("tile '{tile}': wire '{port}' has diagonal offset ({x_offset}, {y_offset})")]
    DiagonalWire {
        /// Tile type name.
        tile: String,
        /// Source name of the port.
        port: String,
        /// Horizontal offset.
        x_offset: i32,
        /// Vertical offset.
        y_offset: i32,
    },

    /// A jump port has a nonzero offset.
    #[error("tile '{tile}': jump wire '{port}' must have offset (0, 0)")]
    JumpWithOffset {
        /// Tile type name.
        tile: String,
        /// Source name of the port.
        port: String,
    },

    /// A port declares zero wires or an empty name.
    #[error("tile '{tile}': invalid port '{port}': {reason}")]
    InvalidPort {
        /// Tile type name.
        tile: String,
        /// Source name of the port.
        port: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A bel feature occupies an offset outside the bel's configuration bits.
    #[error("tile '{tile}': feature '{feature}' of bel '{bel}' uses bit {offset} but the bel has {config_bits} configuration bits")]
    FeatureOutOfRange {
        /// Tile type name.
        tile: String,
        /// Bel name.
        bel: String,
        /// Feature name.
        feature: String,
        /// Offending local bit offset.
        offset: u32,
        /// Declared configuration bits of the bel.
        config_bits: u32,
    },

    /// A bel declares the same feature name twice.
    #[error("bel feature '{feature}' is declared twice")]
    DuplicateFeature {
        /// Feature name.
        feature: String,
    },

    /// The grid names a tile type that is not defined.
    #[error("grid location {coord} refers to unknown tile type '{name}'")]
    UnknownTileType {
        /// The undefined name.
        name: String,
        /// Where it appears.
        coord: TileCoord,
    },

    /// A super tile layout is unusable.
    #[error("super tile '{name}': {reason}")]
    InvalidSuperTile {
        /// Super tile name.
        name: String,
        /// What is wrong with it.
        reason: String,
    },
}

impl ArchError {
    /// Returns the diagnostic code for this error.
    pub fn code(&self) -> DiagnosticCode {
        let (category, number) = match self {
            ArchError::EmptyMatrix { .. } => (Category::Adjacency, 101),
            ArchError::MalformedRow { .. } => (Category::Adjacency, 102),
            ArchError::InvalidCell { .. } => (Category::Adjacency, 103),
            ArchError::DuplicatePort { .. } => (Category::Adjacency, 104),
            ArchError::UnknownPort { .. } => (Category::Adjacency, 105),
            ArchError::MalformedList { .. } => (Category::Adjacency, 106),
            ArchError::DiagonalWire { .. } => (Category::Graph, 101),
            ArchError::JumpWithOffset { .. } => (Category::Graph, 102),
            ArchError::InvalidPort { .. } => (Category::Graph, 103),
            ArchError::FeatureOutOfRange { .. } => (Category::Graph, 104),
            ArchError::DuplicateFeature { .. } => (Category::Graph, 105),
            ArchError::UnknownTileType { .. } => (Category::Graph, 106),
            ArchError::InvalidSuperTile { .. } => (Category::Graph, 107),
        };
        DiagnosticCode::new(category, number)
    }

    /// Converts this error into an error diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let locus = match self {
            ArchError::EmptyMatrix { tile }
            | ArchError::DuplicatePort { tile, .. }
            | ArchError::UnknownPort { tile, .. }
            | ArchError::DiagonalWire { tile, .. }
            | ArchError::JumpWithOffset { tile, .. }
            | ArchError::InvalidPort { tile, .. }
            | ArchError::FeatureOutOfRange { tile, .. } => Locus::tile(tile.as_str()),
            ArchError::MalformedRow { tile, line, .. } | ArchError::InvalidCell { tile, line, .. } => {
                Locus::tile(tile.as_str()).line(*line)
            }
            ArchError::MalformedList { line, .. } => Locus::none().line(*line),
            ArchError::UnknownTileType { coord, .. } => Locus::none().at(*coord),
            ArchError::InvalidSuperTile { name, .. } => Locus::tile(name.as_str()),
            ArchError::DuplicateFeature { .. } => Locus::none(),
        };
        let diag = Diagnostic::error(self.code(), self.to_string(), locus);
        match self {
            ArchError::DiagonalWire { .. } => {
                diag.with_help("route diagonals as two wires joined by a single-source multiplexer")
            }
            _ => diag,
        }
    }
}
