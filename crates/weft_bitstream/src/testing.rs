//! Tile fixtures for unit tests.

use std::collections::BTreeMap;
use weft_arch::{Bel, FanInMap, Port, Tile, NULL_PORT};

/// NULL-ended jump ports declaring every name `fan_in` uses, so a tile can
/// be built without wiring. Names must end in a bundle index.
pub(crate) fn matrix_ports(fan_in: &FanInMap) -> Vec<Port> {
    let mut dests = BTreeMap::new();
    let mut sources = BTreeMap::new();
    for (destination, drivers) in fan_in.iter() {
        widen(&mut dests, destination);
        for source in drivers.iter().filter(|s| !s.is_constant()) {
            widen(&mut sources, source.name());
        }
    }
    let dests = dests.into_iter().map(|(base, w)| Port::jump(base, NULL_PORT, w));
    let sources = sources.into_iter().map(|(base, w)| Port::jump(NULL_PORT, base, w));
    dests.chain(sources).collect()
}

fn widen(widths: &mut BTreeMap<String, u32>, name: &str) {
    let base = name.trim_end_matches(|c: char| c.is_ascii_digit());
    let index: u32 = name[base.len()..].parse().expect("name ends in a bundle index");
    let width = widths.entry(base.to_string()).or_insert(0);
    *width = (*width).max(index + 1);
}

/// A tile whose ports are exactly the names its switch matrix uses.
pub(crate) fn matrix_tile(name: &str, bels: Vec<Bel>, fan_in: FanInMap) -> Tile {
    Tile::new(name, matrix_ports(&fan_in), bels, fan_in).expect("fixture tile is valid")
}
