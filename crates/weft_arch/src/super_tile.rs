//! Super tiles: rectangular groups of tiles compiled behind one perimeter.

use crate::error::ArchError;
use crate::port::{is_null, Port};
use crate::tile::Tile;
use crate::wire::WireKind;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use weft_common::TileCoord;

/// A named layout of member tile types. `NULL` cells are holes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuperTile {
    /// Super tile name.
    pub name: String,
    /// Member tile type names, row by row. Row index is `y`, column is `x`.
    pub rows: Vec<Vec<String>>,
}

/// A port of a member that crosses the super tile boundary.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberPort {
    /// Member position inside the super tile.
    pub member: (u32, u32),
    /// Member tile type.
    pub tile: String,
    /// The port as declared by the member.
    pub port: Port,
}

/// A unit segment whose both ends lie on members of the same super tile.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InternalNet {
    /// Driving member.
    pub from: (u32, u32),
    /// Node name in the driving member.
    pub source: String,
    /// Receiving member.
    pub to: (u32, u32),
    /// Node name in the receiving member.
    pub destination: String,
}

/// Result of [`SuperTile::compose`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComposedSuperTile {
    /// Super tile name.
    pub name: String,
    /// Ports with at least one end outside the super tile, in member then declaration order.
    pub perimeter: Vec<MemberPort>,
    /// Member-to-member segments, sorted.
    pub internal: Vec<InternalNet>,
}

impl ComposedSuperTile {
    /// Internal nets as zero-bit `(source, destination)` connections, deduplicated.
    pub fn fixed_connections(&self) -> Vec<(String, String)> {
        let set: BTreeSet<(String, String)> = self
            .internal
            .iter()
            .map(|n| (n.source.clone(), n.destination.clone()))
            .collect();
        set.into_iter().collect()
    }
}

impl SuperTile {
    /// Member positions and tile type names, row-major, holes skipped.
    pub fn members(&self) -> impl Iterator<Item = ((u32, u32), &str)> {
        self.rows.iter().enumerate().flat_map(|(y, row)| {
            row.iter()
                .enumerate()
                .filter(|(_, name)| !is_null(name) && !name.is_empty())
                .map(move |(x, name)| ((x as u32, y as u32), name.as_str()))
        })
    }

    /// Splits member ports into perimeter ports and internal nets.
    ///
    /// Jump ports never leave their member and appear in neither list.
    pub fn compose(&self, tiles: &BTreeMap<String, Tile>) -> Result<ComposedSuperTile, ArchError> {
        let members: BTreeMap<(i64, i64), &Tile> = self
            .members()
            .map(|((x, y), name)| {
                tiles
                    .get(name)
                    .map(|t| ((x as i64, y as i64), t))
                    .ok_or_else(|| self.invalid(format!("unknown member tile type '{name}'")))
            })
            .collect::<Result<_, _>>()?;
        if members.is_empty() {
            return Err(self.invalid("layout has no members".into()));
        }

        let mut perimeter = Vec::new();
        let mut internal = BTreeSet::new();
        for (&(mx, my), tile) in &members {
            let member = (mx as u32, my as u32);
            for port in tile.ports.iter().filter(|p| !p.is_jump()) {
                let (dx, dy) = (port.x_offset as i64, port.y_offset as i64);
                let drives_out = port.has_source() && !members.contains_key(&(mx + dx, my + dy));
                let receives_in =
                    port.has_destination() && !members.contains_key(&(mx - dx, my - dy));
                if drives_out || receives_in {
                    perimeter.push(MemberPort {
                        member,
                        tile: tile.name.clone(),
                        port: port.clone(),
                    });
                }
            }
            for wire in tile.wires().atomic() {
                if wire.kind != WireKind::Segment {
                    continue;
                }
                let from = (mx + wire.from.0 as i64, my + wire.from.1 as i64);
                let to = (mx + wire.to.0 as i64, my + wire.to.1 as i64);
                if members.contains_key(&from) && members.contains_key(&to) {
                    internal.insert(InternalNet {
                        from: (from.0 as u32, from.1 as u32),
                        source: wire.source.clone(),
                        to: (to.0 as u32, to.1 as u32),
                        destination: wire.destination.clone(),
                    });
                }
            }
        }

        Ok(ComposedSuperTile {
            name: self.name.clone(),
            perimeter,
            internal: internal.into_iter().collect(),
        })
    }

    /// Top-left anchors of every place in `grid` where the whole layout
    /// appears, row-major. A match overlapping an earlier one is skipped.
    pub fn placements(&self, grid: &[Vec<String>]) -> Vec<TileCoord> {
        let cell = |x: usize, y: usize| grid.get(y)?.get(x).map(String::as_str);
        let mut claimed = BTreeSet::new();
        let mut anchors = Vec::new();
        if self.members().next().is_none() {
            return anchors;
        }
        for (ay, row) in grid.iter().enumerate() {
            for ax in 0..row.len() {
                let cells: Vec<(usize, usize)> = self
                    .members()
                    .map(|((x, y), _)| (ax + x as usize, ay + y as usize))
                    .collect();
                let fits = self
                    .members()
                    .all(|((x, y), name)| cell(ax + x as usize, ay + y as usize) == Some(name));
                if fits && !cells.iter().any(|c| claimed.contains(c)) {
                    claimed.extend(cells);
                    anchors.push(TileCoord::new(ax as u32, ay as u32));
                }
            }
        }
        anchors
    }

    fn invalid(&self, reason: String) -> ArchError {
        ArchError::InvalidSuperTile {
            name: self.name.clone(),
            reason,
        }
    }
}
