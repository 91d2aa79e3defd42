//! Tile boundary ports.
//!
//! A [`Port`] describes a bundle of wires leaving a tile: the switch matrix
//! drives `source` in this tile, and the signal arrives as `destination` in
//! the tile `(x_offset, y_offset)` away. Either name may be [`NULL_PORT`] for
//! wires that only leave or only enter (fabric borders).

use crate::error::ArchError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Sentinel name for "no connection".
pub const NULL_PORT: &str = "NULL";

/// Returns `true` if `name` is the no-connection sentinel.
pub fn is_null(name: &str) -> bool {
    name == NULL_PORT
}

/// The side of the tile a port leaves through.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Direction {
    /// Towards smaller `y`.
    North,
    /// Towards larger `x`.
    East,
    /// Towards larger `y`.
    South,
    /// Towards smaller `x`.
    West,
    /// Stays inside the tile.
    Jump,
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NORTH" | "N" => Ok(Direction::North),
            "EAST" | "E" => Ok(Direction::East),
            "SOUTH" | "S" => Ok(Direction::South),
            "WEST" | "W" => Ok(Direction::West),
            "JUMP" => Ok(Direction::Jump),
            other => Err(format!("unknown wire direction '{other}'")),
        }
    }
}

impl TryFrom<String> for Direction {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Direction> for String {
    fn from(d: Direction) -> Self {
        d.to_string()
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Direction::North => "NORTH",
            Direction::East => "EAST",
            Direction::South => "SOUTH",
            Direction::West => "WEST",
            Direction::Jump => "JUMP",
        };
        f.write_str(s)
    }
}

/// A bundle of wires between a tile and a neighbour (or itself, for jumps).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Port {
    /// Which side the wires leave through.
    pub direction: Direction,
    /// Name driven by this tile's switch matrix.
    pub source: String,
    /// Horizontal displacement of the far end.
    #[serde(default)]
    pub x_offset: i32,
    /// Vertical displacement of the far end.
    #[serde(default)]
    pub y_offset: i32,
    /// Name the signal arrives as at the far end.
    pub destination: String,
    /// Bundle width.
    pub wires: u32,
}

impl Port {
    /// Creates a port.
    pub fn new(
        direction: Direction,
        source: impl Into<String>,
        x_offset: i32,
        y_offset: i32,
        destination: impl Into<String>,
        wires: u32,
    ) -> Self {
        Self {
            direction,
            source: source.into(),
            x_offset,
            y_offset,
            destination: destination.into(),
            wires,
        }
    }

    /// Creates a jump port (offset `(0, 0)`).
    pub fn jump(source: impl Into<String>, destination: impl Into<String>, wires: u32) -> Self {
        Self::new(Direction::Jump, source, 0, 0, destination, wires)
    }

    /// Tiles crossed: `|x_offset| + |y_offset|`.
    pub fn span(&self) -> u32 {
        self.x_offset.unsigned_abs() + self.y_offset.unsigned_abs()
    }

    /// Returns `true` for jump wires.
    pub fn is_jump(&self) -> bool {
        self.direction == Direction::Jump
    }

    /// Returns `true` if this tile drives the wires.
    pub fn has_source(&self) -> bool {
        !is_null(&self.source)
    }

    /// Returns `true` if the wires arrive somewhere.
    pub fn has_destination(&self) -> bool {
        !is_null(&self.destination)
    }

    /// Returns `true` if both ends are named, i.e. the port forms a wire.
    pub fn is_connected(&self) -> bool {
        self.has_source() && self.has_destination()
    }

    /// The unit step `(dx, dy)` of one segment, `(0, 0)` for zero-span ports.
    pub fn unit_step(&self) -> (i32, i32) {
        (self.x_offset.signum(), self.y_offset.signum())
    }

    /// Physical vector width of the bundle: `span * wires` (at least `wires`).
    pub fn vector_width(&self) -> u32 {
        self.span().max(1) * self.wires
    }

    /// Checks the offset and naming rules for this port.
    pub fn validate(&self, tile: &str) -> Result<(), ArchError> {
        if self.source.is_empty() || self.destination.is_empty() {
            return Err(ArchError::InvalidPort {
                tile: tile.to_string(),
                port: self.source.clone(),
                reason: "port names must not be empty (use NULL for no connection)".into(),
            });
        }
        if self.wires == 0 {
            return Err(ArchError::InvalidPort {
                tile: tile.to_string(),
                port: self.source.clone(),
                reason: "wire count must be at least 1".into(),
            });
        }
        if self.x_offset != 0 && self.y_offset != 0 {
            return Err(ArchError::DiagonalWire {
                tile: tile.to_string(),
                port: self.source.clone(),
                x_offset: self.x_offset,
                y_offset: self.y_offset,
            });
        }
        if self.is_jump() && self.span() != 0 {
            return Err(ArchError::JumpWithOffset {
                tile: tile.to_string(),
                port: self.source.clone(),
            });
        }
        Ok(())
    }

    /// Switch-matrix names on the driving side: `{source}{i}` for each bundle index.
    pub fn source_wires(&self) -> Vec<String> {
        if !self.has_source() {
            return Vec::new();
        }
        (0..self.wires).map(|i| format!("{}{i}", self.source)).collect()
    }

    /// Switch-matrix names on the receiving side: `{destination}{i}` for each bundle index.
    pub fn destination_wires(&self) -> Vec<String> {
        if !self.has_destination() {
            return Vec::new();
        }
        (0..self.wires).map(|i| format!("{}{i}", self.destination)).collect()
    }

    /// Name of position `j` of the source vector.
    ///
    /// The switch matrix drives the top `wires` positions, which carry the
    /// matrix names; lower positions are pass-through outputs and use
    /// `{source}[j]`.
    pub fn source_node(&self, j: u32) -> String {
        let window = self.vector_width() - self.wires;
        if j >= window {
            format!("{}{}", self.source, j - window)
        } else {
            format!("{}[{j}]", self.source)
        }
    }

    /// Name of position `j` of the destination vector.
    ///
    /// The bottom `wires` positions feed the switch matrix and carry the
    /// matrix names; higher positions are still in transit and use
    /// `{destination}[j]`.
    pub fn destination_node(&self, j: u32) -> String {
        if j < self.wires {
            format!("{}{j}", self.destination)
        } else {
            format!("{}[{j}]", self.destination)
        }
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{},{},{},{}",
            self.direction, self.source, self.x_offset, self.y_offset, self.destination, self.wires
        )
    }
}
