//! Errors raised while allocating and encoding configuration bits.

use weft_common::InternalError;
use weft_diagnostics::{Category, Diagnostic, DiagnosticCode, Locus};

/// A consistency failure in a tile's configuration memory.
///
/// All variants are fatal for the tile and carry enough context to point
/// at the offending frame.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BitstreamError {
    /// The tile needs more bits than its frames can hold.
    #[error("tile '{tile}' needs {bits} configuration bits but only {capacity} fit in its frames")]
    CapacityExceeded {
        /// Tile type name.
        tile: String,
        /// Allocated bits.
        bits: u32,
        /// `max_frames_per_col * frame_bits_per_row`.
        capacity: u64,
    },

    /// Two configuration entities of a tile produce the same feature name.
    #[error("tile '{tile}': feature '{feature}' is produced by more than one bel or multiplexer")]
    DuplicateFeature {
        /// Tile type name.
        tile: String,
        /// The repeated feature name.
        feature: String,
    },

    /// A ConfigMem line could not be parsed.
    #[error("ConfigMem for tile '{tile}', line {line}: {message}")]
    MalformedConfigMem {
        /// Tile type name.
        tile: String,
        /// 1-based line number.
        line: u32,
        /// What went wrong.
        message: String,
    },

    /// A mask does not have exactly `frame_bits_per_row` characters.
    #[error("tile '{tile}', frame {frame}: mask has {found} bits, expected {expected}")]
    MaskWidth {
        /// Tile type name.
        tile: String,
        /// Frame index.
        frame: u32,
        /// `frame_bits_per_row`.
        expected: u32,
        /// Actual mask length.
        found: u32,
    },

    /// A mask marks more bits than a frame has.
    #[error("tile '{tile}', frame {frame}: {ones} bits used but a frame holds {width}")]
    FrameOverflow {
        /// Tile type name.
        tile: String,
        /// Frame index.
        frame: u32,
        /// 1s in the mask.
        ones: u32,
        /// `frame_bits_per_row`.
        width: u32,
    },

    /// Mask, declared count, and range list disagree.
    #[error("tile '{tile}', frame {frame}: mask has {mask_ones} ones, bits_used_in_frame is {bits_used}, ranges list {ranges} bits")]
    UsedBitsMismatch {
        /// Tile type name.
        tile: String,
        /// Frame index.
        frame: u32,
        /// 1s in the mask.
        mask_ones: u32,
        /// Declared `bits_used_in_frame`.
        bits_used: u32,
        /// Number of range values.
        ranges: u32,
    },

    /// The masks together do not cover the tile's configuration bits.
    #[error("tile '{tile}': frames hold {mask_total} bits but the tile allocates {global}")]
    TotalMismatch {
        /// Tile type name.
        tile: String,
        /// 1s across all masks.
        mask_total: u32,
        /// `globalConfigBits`.
        global: u32,
    },

    /// A logical bit appears in two ranges.
    #[error("tile '{tile}', frame {frame}: configuration bit {bit} is already mapped")]
    DuplicateClaim {
        /// Tile type name.
        tile: String,
        /// Frame of the second claim.
        frame: u32,
        /// The logical index.
        bit: u32,
    },

    /// A range names a logical bit the tile does not have.
    #[error("tile '{tile}', frame {frame}: configuration bit {bit} is out of range (tile has {global})")]
    BitOutOfRange {
        /// Tile type name.
        tile: String,
        /// Frame index.
        frame: u32,
        /// The logical index.
        bit: u32,
        /// `globalConfigBits`.
        global: u32,
    },

    /// A frame index is not below `max_frames_per_col`.
    #[error("tile '{tile}': frame index {frame} is out of range (max {max})")]
    FrameIndexOutOfRange {
        /// Tile type name.
        tile: String,
        /// Frame index.
        frame: u32,
        /// `max_frames_per_col`.
        max: u32,
    },

    /// Two rows describe the same frame.
    #[error("tile '{tile}': frame {frame} is described twice")]
    DuplicateFrame {
        /// Tile type name.
        tile: String,
        /// Frame index.
        frame: u32,
    },

    /// The table does not have one row per frame.
    #[error("tile '{tile}': ConfigMem has {found} rows, expected {expected}")]
    RowCount {
        /// Tile type name.
        tile: String,
        /// `max_frames_per_col`.
        expected: u32,
        /// Rows present.
        found: u32,
    },

    /// A feature name is not in the location's feature table.
    #[error("{location}: unknown feature '{feature}'")]
    UnknownFeature {
        /// `X{x}Y{y}` key.
        location: String,
        /// The feature name.
        feature: String,
    },

    /// Two enabled features need opposite values on one bit.
    #[error("{location}: feature '{feature}' conflicts with an earlier feature on bit {bit}")]
    FeatureConflict {
        /// `X{x}Y{y}` key.
        location: String,
        /// The later feature.
        feature: String,
        /// Physical bit.
        bit: u32,
    },

    /// A FASM line could not be parsed.
    #[error("FASM line {line}: {message}")]
    MalformedFasm {
        /// 1-based line number.
        line: u32,
        /// What went wrong.
        message: String,
    },

    /// An invariant between compiler stages was broken.
    #[error(transparent)]
    Internal(#[from] InternalError),
}

impl BitstreamError {
    /// Returns the diagnostic code for this error.
    pub fn code(&self) -> DiagnosticCode {
        let (category, number) = match self {
            BitstreamError::CapacityExceeded { .. } => (Category::Allocation, 101),
            BitstreamError::DuplicateFeature { .. } => (Category::Allocation, 102),
            BitstreamError::Internal(_) => (Category::Allocation, 900),
            BitstreamError::MalformedConfigMem { .. } => (Category::Frame, 101),
            BitstreamError::MaskWidth { .. } => (Category::Frame, 102),
            BitstreamError::FrameOverflow { .. } => (Category::Frame, 103),
            BitstreamError::UsedBitsMismatch { .. } => (Category::Frame, 104),
            BitstreamError::TotalMismatch { .. } => (Category::Frame, 105),
            BitstreamError::DuplicateClaim { .. } => (Category::Frame, 106),
            BitstreamError::BitOutOfRange { .. } => (Category::Frame, 107),
            BitstreamError::FrameIndexOutOfRange { .. } => (Category::Frame, 108),
            BitstreamError::DuplicateFrame { .. } => (Category::Frame, 109),
            BitstreamError::RowCount { .. } => (Category::Frame, 110),
            BitstreamError::UnknownFeature { .. } => (Category::Frame, 201),
            BitstreamError::FeatureConflict { .. } => (Category::Frame, 202),
            BitstreamError::MalformedFasm { .. } => (Category::Frame, 203),
        };
        DiagnosticCode::new(category, number)
    }

    /// Converts this error into an error diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let locus = match self {
            BitstreamError::MaskWidth { tile, frame, .. }
            | BitstreamError::FrameOverflow { tile, frame, .. }
            | BitstreamError::UsedBitsMismatch { tile, frame, .. }
            | BitstreamError::DuplicateClaim { tile, frame, .. }
            | BitstreamError::BitOutOfRange { tile, frame, .. }
            | BitstreamError::FrameIndexOutOfRange { tile, frame, .. }
            | BitstreamError::DuplicateFrame { tile, frame } => {
                Locus::tile(tile.as_str()).frame(*frame)
            }
            BitstreamError::MalformedConfigMem { tile, line, .. } => {
                Locus::tile(tile.as_str()).line(*line)
            }
            BitstreamError::CapacityExceeded { tile, .. }
            | BitstreamError::DuplicateFeature { tile, .. }
            | BitstreamError::TotalMismatch { tile, .. }
            | BitstreamError::RowCount { tile, .. } => Locus::tile(tile.as_str()),
            BitstreamError::UnknownFeature { location, .. }
            | BitstreamError::FeatureConflict { location, .. } => Locus::tile(location.as_str()),
            BitstreamError::MalformedFasm { line, .. } => Locus::none().line(*line),
            BitstreamError::Internal(_) => Locus::none(),
        };
        let diag = Diagnostic::error(self.code(), self.to_string(), locus);
        match self {
            BitstreamError::CapacityExceeded { .. } => {
                diag.with_help("increase max_frames_per_col or frame_bits_per_row")
            }
            BitstreamError::DuplicateFeature { .. } => {
                diag.with_help("give the bels distinct prefixes or rename the feature")
            }
            BitstreamError::Internal(_) => diag.with_note("this is a bug in the compiler"),
            _ => diag,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_errors_point_at_frame() {
        let err = BitstreamError::MaskWidth {
            tile: "LUT4AB".into(),
            frame: 3,
            expected: 32,
            found: 31,
        };
        assert_eq!(err.to_string(), "tile 'LUT4AB', frame 3: mask has 31 bits, expected 32");
        let diag = err.to_diagnostic();
        assert_eq!(diag.code.to_string(), "F102");
        assert_eq!(diag.locus.frame, Some(3));
        assert_eq!(diag.locus.tile.as_deref(), Some("LUT4AB"));
    }

    #[test]
    fn internal_error_is_transparent() {
        let err = BitstreamError::from(InternalError::new("cursor drift"));
        assert_eq!(err.to_string(), "internal compiler error: cursor drift");
        assert_eq!(err.code().to_string(), "B900");
        assert_eq!(err.to_diagnostic().notes.len(), 1);
    }
}
