//! Tile types.

use crate::bel::Bel;
use crate::error::ArchError;
use crate::matrix::{AdjacencyMatrix, FanInMap, Source};
use crate::port::Port;
use crate::wire::{WireArena, WireKind};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A tile type: boundary ports, primitives, and a loaded switch matrix.
///
/// Immutable once built. `globalConfigBits` is not stored here; it is the
/// result of running the allocator over [`config_entities`](Tile::config_entities).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    /// Tile type name.
    pub name: String,
    /// Boundary ports in declaration order.
    pub ports: Vec<Port>,
    /// Primitives in declaration order.
    pub bels: Vec<Bel>,
    /// Switch-matrix fan-in.
    pub fan_in: FanInMap,
}

/// One configuration-consuming entity, in allocation order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigEntity<'a> {
    /// A primitive and its index within the tile.
    Bel {
        /// Position in [`Tile::bels`].
        index: usize,
        /// The primitive.
        bel: &'a Bel,
    },
    /// A switch-matrix multiplexer.
    Mux {
        /// Driven port.
        destination: &'a str,
        /// Candidate drivers in select order.
        sources: &'a [Source],
    },
}

impl Tile {
    /// Builds a tile, validating every port and bel and checking that the
    /// switch matrix only names ports the tile declares.
    pub fn new(
        name: impl Into<String>,
        ports: Vec<Port>,
        bels: Vec<Bel>,
        fan_in: FanInMap,
    ) -> Result<Tile, ArchError> {
        let tile = Tile {
            name: name.into(),
            ports,
            bels,
            fan_in,
        };
        tile.validate()?;
        Ok(tile)
    }

    /// Checks port offsets, bel feature ranges, and switch-matrix names.
    ///
    /// Every fan-in destination must be a switch-matrix destination of the
    /// tile and every non-constant source a switch-matrix source.
    pub fn validate(&self) -> Result<(), ArchError> {
        for port in &self.ports {
            port.validate(&self.name)?;
        }
        for bel in &self.bels {
            bel.validate(&self.name)?;
        }
        let (sources, dests) = self.switch_matrix_ports();
        let sources: HashSet<&str> = sources.iter().map(String::as_str).collect();
        let dests: HashSet<&str> = dests.iter().map(String::as_str).collect();
        for (destination, drivers) in self.fan_in.iter() {
            if !dests.contains(destination) {
                return Err(self.unknown_port(destination, "destination"));
            }
            if let Some(source) = drivers
                .iter()
                .find(|s| !s.is_constant() && !sources.contains(s.name()))
            {
                return Err(self.unknown_port(source.name(), "source"));
            }
        }
        Ok(())
    }

    fn unknown_port(&self, name: &str, role: &'static str) -> ArchError {
        ArchError::UnknownPort {
            tile: self.name.clone(),
            name: name.to_string(),
            role,
        }
    }

    /// The single ordered entity list shared by the allocator and the
    /// feature-table builder: bels in declaration order, then multiplexers
    /// in fan-in order.
    pub fn config_entities(&self) -> Vec<ConfigEntity<'_>> {
        let bels = self
            .bels
            .iter()
            .enumerate()
            .map(|(index, bel)| ConfigEntity::Bel { index, bel });
        let muxes = self
            .fan_in
            .iter()
            .map(|(destination, sources)| ConfigEntity::Mux {
                destination,
                sources,
            });
        bels.chain(muxes).collect()
    }

    /// Total bits consumed by bels.
    pub fn bel_config_bits(&self) -> u32 {
        self.bels.iter().map(|b| b.config_bits).sum()
    }

    /// Resolves this tile's ports into atomic wires.
    pub fn wires(&self) -> WireArena {
        WireArena::from_ports(&self.ports)
    }

    /// Zero-bit connections owned by one instance of this tile:
    /// jumps, pass-through buffers, and segments leaving the tile.
    pub fn fixed_connections(&self) -> Vec<(String, String, WireKind)> {
        self.wires().local_connections()
    }

    /// Ports of the switch matrix, split into `(sources, destinations)`.
    ///
    /// Sources are wire ends arriving from neighbours, bel outputs, then
    /// jump ends; destinations are wire beginnings, bel inputs, then jump
    /// beginnings. Duplicates keep their first position.
    pub fn switch_matrix_ports(&self) -> (Vec<String>, Vec<String>) {
        let mut sources = Vec::new();
        let mut dests = Vec::new();
        for port in self.ports.iter().filter(|p| !p.is_jump()) {
            sources.extend(port.destination_wires());
            dests.extend(port.source_wires());
        }
        for bel in &self.bels {
            sources.extend(bel.matrix_outputs());
            dests.extend(bel.matrix_inputs());
        }
        for port in self.ports.iter().filter(|p| p.is_jump()) {
            sources.extend(port.destination_wires());
            dests.extend(port.source_wires());
        }
        (dedup(sources), dedup(dests))
    }

    /// An all-zero adjacency table with this tile's switch-matrix ports,
    /// ready to be filled in by hand or from a list file.
    pub fn bootstrap_matrix(&self) -> AdjacencyMatrix {
        let (sources, dests) = self.switch_matrix_ports();
        AdjacencyMatrix::empty(self.name.clone(), dests, sources)
    }
}

fn dedup(names: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    names.into_iter().filter(|n| seen.insert(n.clone())).collect()
}
