//! Cascading-wire resolution.
//!
//! Ports are declared into a [`WireArena`] and resolved into
//! [`AtomicWire`] records: unit-length segments between neighbouring tiles,
//! pass-through buffers in every intermediate tile of a long wire, and
//! in-tile jumps. Resolution only appends records; declared ports are never
//! edited, and a resolved index set makes repeated resolution a no-op.
//!
//! For a port of span `m` and bundle width `w`, the physical vectors are
//! `m * w` wide. Bundle `i` leaves the driving tile at source position
//! `(m-1)*w + i`, drops by `w` positions in each intermediate tile, and
//! reaches the switch matrix `m` tiles away at destination position `i`.

use crate::ids::WireId;
use crate::port::Port;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// What an atomic wire physically is.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub enum WireKind {
    /// Unit-length metal between neighbouring tiles.
    Segment,
    /// A buffer forwarding an in-transit signal inside an intermediate tile.
    PassThrough,
    /// A connection that stays inside the tile.
    Jump,
}

/// One unit of routing produced by resolution.
///
/// Tile offsets are relative to the tile that declared the port.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AtomicWire {
    /// The declared wire this record belongs to.
    pub parent: WireId,
    /// Physical kind.
    pub kind: WireKind,
    /// Tile offset of the driving end.
    pub from: (i32, i32),
    /// Node name at the driving end.
    pub source: String,
    /// Tile offset of the receiving end.
    pub to: (i32, i32),
    /// Node name at the receiving end.
    pub destination: String,
}

/// Arena of declared wires and their resolved atomic records.
#[derive(Clone, Debug, Default)]
pub struct WireArena {
    declared: Vec<Port>,
    by_name: HashMap<(String, String), WireId>,
    resolved: BTreeSet<WireId>,
    atomic: Vec<AtomicWire>,
}

impl WireArena {
    /// Creates an empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares and resolves every connected port in `ports`.
    pub fn from_ports(ports: &[Port]) -> Self {
        let mut arena = WireArena::new();
        for port in ports {
            arena.declare(port);
        }
        arena.resolve();
        arena
    }

    /// Declares a port. Ports with a `NULL` end carry no wire and return `None`.
    /// A second port with the same source and destination names maps to the
    /// first declaration.
    pub fn declare(&mut self, port: &Port) -> Option<WireId> {
        if !port.is_connected() {
            return None;
        }
        let key = (port.source.clone(), port.destination.clone());
        if let Some(&id) = self.by_name.get(&key) {
            return Some(id);
        }
        let id = WireId::from_raw(self.declared.len() as u32);
        self.declared.push(port.clone());
        self.by_name.insert(key, id);
        Some(id)
    }

    /// Resolves every declared wire that has not been resolved yet.
    pub fn resolve(&mut self) {
        for index in 0..self.declared.len() {
            let id = WireId::from_raw(index as u32);
            if self.resolved.contains(&id) {
                continue;
            }
            let records = atomize(id, &self.declared[index]);
            self.atomic.extend(records);
            self.resolved.insert(id);
        }
    }

    /// Returns `true` once `id` has produced its atomic records.
    pub fn is_resolved(&self, id: WireId) -> bool {
        self.resolved.contains(&id)
    }

    /// The port behind a declared wire.
    pub fn port(&self, id: WireId) -> Option<&Port> {
        self.declared.get(id.index())
    }

    /// Number of declared wires.
    pub fn declared_count(&self) -> usize {
        self.declared.len()
    }

    /// All atomic records in resolution order.
    pub fn atomic(&self) -> &[AtomicWire] {
        &self.atomic
    }

    /// Atomic records of one declared wire.
    pub fn wires_of(&self, id: WireId) -> impl Iterator<Item = &AtomicWire> {
        self.atomic.iter().filter(move |w| w.parent == id)
    }

    /// Fixed connections as seen from inside a single tile instance.
    ///
    /// Every tile of a type declares the same ports, so a record at any
    /// offset of the chain is also the record some instance of the type
    /// owns locally. Offsets are dropped and duplicates removed; each entry
    /// is `(source, destination, kind)`.
    pub fn local_connections(&self) -> Vec<(String, String, WireKind)> {
        let mut seen = BTreeSet::new();
        let mut out = Vec::new();
        for w in &self.atomic {
            if seen.insert((w.source.as_str(), w.destination.as_str())) {
                out.push((w.source.clone(), w.destination.clone(), w.kind));
            }
        }
        out
    }
}

fn atomize(id: WireId, port: &Port) -> Vec<AtomicWire> {
    let w = port.wires;
    if port.is_jump() || port.span() == 0 {
        return (0..w)
            .map(|i| AtomicWire {
                parent: id,
                kind: WireKind::Jump,
                from: (0, 0),
                source: format!("{}{i}", port.source),
                to: (0, 0),
                destination: format!("{}{i}", port.destination),
            })
            .collect();
    }

    let m = port.span();
    let (ux, uy) = port.unit_step();
    let at = |k: u32| (ux * k as i32, uy * k as i32);
    let mut out = Vec::with_capacity((w * (2 * m - 1)) as usize);
    for i in 0..w {
        for k in 0..m {
            let j = (m - 1 - k) * w + i;
            if k > 0 {
                out.push(AtomicWire {
                    parent: id,
                    kind: WireKind::PassThrough,
                    from: at(k),
                    source: port.destination_node(j + w),
                    to: at(k),
                    destination: port.source_node(j),
                });
            }
            out.push(AtomicWire {
                parent: id,
                kind: WireKind::Segment,
                from: at(k),
                source: port.source_node(j),
                to: at(k + 1),
                destination: port.destination_node(j),
            });
        }
    }
    out
}
