//! Where in a fabric description a diagnostic applies.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use weft_common::TileCoord;

/// The context a diagnostic points at.
///
/// Fabric inputs are small tables rather than free text, so a tile name,
/// a file line, or a frame index identifies the problem better than a byte span.
/// All fields are optional and an empty locus renders as nothing.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Locus {
    /// Tile type name.
    pub tile: Option<String>,
    /// Grid location of a tile instance.
    pub coord: Option<TileCoord>,
    /// Input file.
    pub file: Option<PathBuf>,
    /// 1-based line in `file`.
    pub line: Option<u32>,
    /// Configuration frame index.
    pub frame: Option<u32>,
}

impl Locus {
    /// A locus with no context.
    pub fn none() -> Self {
        Self::default()
    }

    /// A locus naming a tile type.
    pub fn tile(name: impl Into<String>) -> Self {
        Self {
            tile: Some(name.into()),
            ..Self::default()
        }
    }

    /// A locus naming a file.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            file: Some(path.into()),
            ..Self::default()
        }
    }

    /// Sets the tile type name.
    pub fn with_tile(mut self, name: impl Into<String>) -> Self {
        self.tile = Some(name.into());
        self
    }

    /// Sets the grid location.
    pub fn at(mut self, coord: TileCoord) -> Self {
        self.coord = Some(coord);
        self
    }

    /// Sets the file.
    pub fn in_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    /// Sets the 1-based line.
    pub fn line(mut self, line: u32) -> Self {
        self.line = Some(line);
        self
    }

    /// Sets the frame index.
    pub fn frame(mut self, frame: u32) -> Self {
        self.frame = Some(frame);
        self
    }

    /// Returns `true` if no context is set.
    pub fn is_empty(&self) -> bool {
        self.tile.is_none()
            && self.coord.is_none()
            && self.file.is_none()
            && self.line.is_none()
            && self.frame.is_none()
    }
}

impl fmt::Display for Locus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(file) = &self.file {
            match self.line {
                Some(line) => parts.push(format!("{}:{line}", file.display())),
                None => parts.push(file.display().to_string()),
            }
        }
        if let Some(tile) = &self.tile {
            parts.push(format!("tile {tile}"));
        }
        if let Some(coord) = self.coord {
            parts.push(format!("at {coord}"));
        }
        if let Some(frame) = self.frame {
            parts.push(format!("frame {frame}"));
        }
        write!(f, "{}", parts.join(", "))
    }
}
