//! Flattened routing graph.
//!
//! Nodes are `(location, wire name)` pairs. Pips connect them: multiplexer
//! pips carry the select value that enables them, fixed pips are the
//! atomic wire segments, pass-through buffers and jumps. The graph is
//! stored in arenas indexed by [`NodeId`] and [`PipId`], with a name index
//! rebuilt after deserialization.

use crate::fabric::Fabric;
use crate::ids::{NodeId, PipId};
use crate::matrix::select_width;
use crate::wire::WireKind;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use weft_common::TileCoord;
use weft_diagnostics::{Category, Diagnostic, DiagnosticCode, DiagnosticSink, Locus};

/// Warning: a wire runs past the fabric edge or into an empty cell.
pub const DANGLING_WIRE: DiagnosticCode = DiagnosticCode::new(Category::Graph, 201);

/// The select value that enables one multiplexer input.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SelectValue {
    /// Index `k` of the selected source.
    pub value: u32,
    /// Width of the select field.
    pub width: u32,
}

impl SelectValue {
    /// Select bits, most significant first.
    pub fn bits_msb_first(self) -> Vec<bool> {
        (0..self.width).rev().map(|j| (self.value >> j) & 1 == 1).collect()
    }
}

impl fmt::Display for SelectValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for bit in self.bits_msb_first() {
            f.write_str(if bit { "1" } else { "0" })?;
        }
        Ok(())
    }
}

/// How a pip is realized.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipKind {
    /// A switch-matrix input, enabled by one select value. Single-source
    /// multiplexers have a zero-width select.
    Mux {
        /// Enabling select value.
        select: SelectValue,
    },
    /// An always-on connection.
    Fixed(WireKind),
}

/// A wire node at one location.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Arena index.
    pub id: NodeId,
    /// Location.
    pub coord: TileCoord,
    /// Wire name inside the tile.
    pub name: String,
}

/// A directed connection between two nodes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pip {
    /// Arena index.
    pub id: PipId,
    /// Driving node.
    pub from: NodeId,
    /// Driven node.
    pub to: NodeId,
    /// Realization.
    pub kind: PipKind,
}

/// Nodes and pips of a whole fabric.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RoutingGraph {
    /// All nodes.
    pub nodes: Vec<Node>,
    /// All pips.
    pub pips: Vec<Pip>,
    /// Auxiliary index: `(coord, name)` to node (rebuilt on deserialization).
    #[serde(skip)]
    pub node_by_name: HashMap<(TileCoord, String), NodeId>,
}

impl RoutingGraph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the node for `(coord, name)`, adding it if needed.
    pub fn intern(&mut self, coord: TileCoord, name: &str) -> NodeId {
        if let Some(&id) = self.node_by_name.get(&(coord, name.to_string())) {
            return id;
        }
        let id = NodeId::from_raw(self.nodes.len() as u32);
        self.nodes.push(Node {
            id,
            coord,
            name: name.to_string(),
        });
        self.node_by_name.insert((coord, name.to_string()), id);
        id
    }

    /// Adds a pip and returns its ID.
    pub fn add_pip(&mut self, from: NodeId, to: NodeId, kind: PipKind) -> PipId {
        let id = PipId::from_raw(self.pips.len() as u32);
        self.pips.push(Pip { id, from, to, kind });
        id
    }

    /// Looks up a node by location and name.
    pub fn find_node(&self, coord: TileCoord, name: &str) -> Option<NodeId> {
        self.node_by_name.get(&(coord, name.to_string())).copied()
    }

    /// Returns the node with the given ID.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    /// Returns the pip with the given ID.
    pub fn pip(&self, id: PipId) -> &Pip {
        &self.pips[id.index()]
    }

    /// Pips driving `node`.
    pub fn pips_into(&self, node: NodeId) -> impl Iterator<Item = &Pip> {
        self.pips.iter().filter(move |p| p.to == node)
    }

    /// The node a multiplexer at `node` forwards when its select field holds `value`.
    pub fn mux_source(&self, node: NodeId, value: u32) -> Option<NodeId> {
        self.pips_into(node).find_map(|p| match p.kind {
            PipKind::Mux { select } if select.value == value => Some(p.from),
            _ => None,
        })
    }

    /// Returns the number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the number of pips.
    pub fn pip_count(&self) -> usize {
        self.pips.len()
    }

    /// Rebuilds the name index after deserialization.
    pub fn rebuild_indices(&mut self) {
        self.node_by_name = self
            .nodes
            .iter()
            .map(|n| ((n.coord, n.name.clone()), n.id))
            .collect();
    }

    /// Builds the graph for every populated location of `fabric`.
    ///
    /// A declared wire with any hop outside the grid or into an empty cell
    /// is left out entirely and reported to `sink` as a warning.
    pub fn build(fabric: &Fabric, sink: &DiagnosticSink) -> RoutingGraph {
        let mut graph = RoutingGraph::new();
        for (coord, tile) in fabric.locations() {
            for (dest, sources) in tile.fan_in.iter() {
                let width = select_width(sources.len());
                let to = graph.intern(coord, dest);
                for (k, source) in sources.iter().enumerate() {
                    let from = graph.intern(coord, source.name());
                    let select = SelectValue {
                        value: k as u32,
                        width,
                    };
                    graph.add_pip(from, to, PipKind::Mux { select });
                }
            }

            let arena = tile.wires();
            for index in 0..arena.declared_count() {
                let id = crate::ids::WireId::from_raw(index as u32);
                let hops: Option<Vec<_>> = arena
                    .wires_of(id)
                    .map(|w| {
                        let from = coord.offset(w.from.0, w.from.1)?;
                        let to = coord.offset(w.to.0, w.to.1)?;
                        fabric.tile_at(from)?;
                        fabric.tile_at(to)?;
                        Some((from, w, to))
                    })
                    .collect();
                match hops {
                    Some(hops) => {
                        for (from, w, to) in hops {
                            let a = graph.intern(from, &w.source);
                            let b = graph.intern(to, &w.destination);
                            graph.add_pip(a, b, PipKind::Fixed(w.kind));
                        }
                    }
                    None => {
                        let name = arena.port(id).map(|p| p.source.as_str()).unwrap_or("?");
                        sink.emit(Diagnostic::warning(
                            DANGLING_WIRE,
                            format!("wire '{name}' leaves the populated fabric and is not routable"),
                            Locus::tile(tile.name.as_str()).at(coord),
                        ));
                    }
                }
            }
        }
        graph
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::FanInMap;
    use crate::port::{Direction, Port, NULL_PORT};
    use crate::tile::Tile;
    use weft_common::FabricConfig;

    fn fabric(grid: &[&[&str]]) -> Fabric {
        let tile = Tile::new(
            "T",
            vec![
                Port::new(Direction::East, "E2BEG", 2, 0, "E2END", 1),
                Port::jump(NULL_PORT, "IN", 3),
            ],
            vec![],
            FanInMap::from_pairs([("E2BEG0", vec!["IN0", "IN1", "IN2"])]),
        )
        .unwrap();
        let grid = grid
            .iter()
            .map(|r| r.iter().map(|s| s.to_string()).collect())
            .collect();
        Fabric::new("f", FabricConfig::default(), grid, [tile], vec![]).unwrap()
    }

    #[test]
    fn select_bits_are_msb_first() {
        let s = SelectValue { value: 1, width: 2 };
        assert_eq!(s.bits_msb_first(), vec![false, true]);
        assert_eq!(s.to_string(), "01");
    }

    #[test]
    fn mux_pips_carry_select_values() {
        let sink = DiagnosticSink::new();
        let g = RoutingGraph::build(&fabric(&[&["T"]]), &sink);
        let dest = g.find_node(TileCoord::new(0, 0), "E2BEG0").unwrap();
        let picked = g.mux_source(dest, 2).unwrap();
        assert_eq!(g.node(picked).name, "IN2");
        assert!(g.mux_source(dest, 3).is_none());
    }

    #[test]
    fn edge_wires_are_dropped_with_warning() {
        let sink = DiagnosticSink::new();
        let g = RoutingGraph::build(&fabric(&[&["T"]]), &sink);
        assert!(g.pips.iter().all(|p| matches!(p.kind, PipKind::Mux { .. })));
        assert_eq!(sink.warning_count(), 1);
        assert_eq!(sink.diagnostics()[0].code, DANGLING_WIRE);
    }

    #[test]
    fn interior_wires_span_locations() {
        let sink = DiagnosticSink::new();
        let g = RoutingGraph::build(&fabric(&[&["T", "T", "T"]]), &sink);
        let start = g.find_node(TileCoord::new(0, 0), "E2BEG0").unwrap();
        let end = g.find_node(TileCoord::new(2, 0), "E2END0").unwrap();
        let mid = g.find_node(TileCoord::new(1, 0), "E2END[1]").unwrap();
        assert!(g.pips.iter().any(|p| p.from == start && p.to == mid));
        assert!(g.pips_into(end).any(|p| p.kind == PipKind::Fixed(WireKind::Segment)));
        // tiles at x=1 and x=2 run off the east edge
        assert_eq!(sink.warning_count(), 2);
    }

    #[test]
    fn index_survives_serde() {
        let sink = DiagnosticSink::new();
        let g = RoutingGraph::build(&fabric(&[&["T", "T", "T"]]), &sink);
        let json = serde_json::to_string(&g).unwrap();
        let mut back: RoutingGraph = serde_json::from_str(&json).unwrap();
        assert!(back.find_node(TileCoord::new(0, 0), "E2BEG0").is_none());
        back.rebuild_indices();
        assert!(back.find_node(TileCoord::new(0, 0), "E2BEG0").is_some());
    }
}
