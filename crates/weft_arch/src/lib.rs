//! Structural model of a reconfigurable fabric.
//!
//! A [`Fabric`] is a grid of [`Tile`] instances. Each tile type declares its
//! boundary [`Port`]s, its configurable primitives ([`Bel`]), and a switch
//! matrix described by an adjacency table that [`matrix`] parses into a
//! [`FanInMap`]. Wires spanning more than one tile are broken into unit
//! segments by the [`WireArena`], and [`SuperTile`]s merge neighbouring tiles
//! behind a shared perimeter. The [`RoutingGraph`] flattens everything into
//! nodes and pips for place-and-route consumers.

#![warn(missing_docs)]

pub mod bel;
pub mod error;
pub mod fabric;
pub mod ids;
pub mod list;
pub mod matrix;
pub mod port;
pub mod routing;
pub mod super_tile;
pub mod tile;
pub mod wire;

pub use bel::{Bel, FeatureMap};
pub use error::ArchError;
pub use fabric::Fabric;
pub use ids::{NodeId, PipId, WireId};
pub use matrix::{select_width, AdjacencyMatrix, FanInMap, Source};
pub use port::{Direction, Port, NULL_PORT};
pub use routing::{Pip, PipKind, RoutingGraph, SelectValue};
pub use super_tile::{ComposedSuperTile, InternalNet, MemberPort, SuperTile};
pub use tile::{ConfigEntity, Tile};
pub use wire::{AtomicWire, WireArena, WireKind};
