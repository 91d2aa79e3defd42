//! Configuration bit allocation.
//!
//! Walks [`Tile::config_entities`] with a running cursor. Bels take their
//! declared `config_bits`; a multiplexer with `N >= 2` sources takes
//! `ceil(log2 N)` select bits; single-source and unused destinations take
//! none. The final cursor is the tile's `globalConfigBits`.

use crate::mux::{MuxComponent, MuxRecord};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;
use weft_arch::{select_width, ConfigEntity, Source, Tile};
use weft_common::{ConfigBitMode, FabricConfig, MultiplexerStyle};
use weft_diagnostics::{Category, Diagnostic, DiagnosticCode, DiagnosticSink, Locus};

/// Warning: a destination with no sources.
pub const UNUSED_MUX: DiagnosticCode = DiagnosticCode::new(Category::Allocation, 301);
/// Warning: a discrete multiplexer whose fan-in is not a power of two.
pub const NON_POWER_OF_TWO: DiagnosticCode = DiagnosticCode::new(Category::Allocation, 302);
/// Warning: a fan-in too large for any discrete cell.
pub const OVERSIZE_DISCRETE: DiagnosticCode = DiagnosticCode::new(Category::Allocation, 303);

/// A contiguous run of logical configuration bits.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BitRange {
    /// First logical bit.
    pub start: u32,
    /// Number of bits.
    pub width: u32,
}

impl BitRange {
    /// Creates a range.
    pub fn new(start: u32, width: u32) -> Self {
        Self { start, width }
    }

    /// One past the last bit.
    pub fn end(self) -> u32 {
        self.start + self.width
    }

    /// Returns `true` for zero-width ranges.
    pub fn is_empty(self) -> bool {
        self.width == 0
    }

    /// Logical bits in ascending order.
    pub fn iter(self) -> Range<u32> {
        self.start..self.end()
    }
}

impl fmt::Display for BitRange {
    /// `hi:lo`, or nothing for an empty range.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.width == 0 {
            return Ok(());
        }
        write!(f, "{}:{}", self.end() - 1, self.start)
    }
}

/// One entry of the allocation stream, in entity order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AllocationRecord {
    /// A bel and its configuration bits.
    Bel {
        /// Position among the tile's bels.
        index: usize,
        /// Bel name.
        name: String,
        /// Instance prefix.
        prefix: String,
        /// Allocated bits.
        range: BitRange,
    },
    /// A multiplexer with at least two sources.
    Mux(MuxRecord),
    /// A single non-constant source wired straight through.
    PassThrough {
        /// Driven port.
        destination: String,
        /// Its only source.
        source: String,
    },
    /// A single constant source.
    ConstantTie {
        /// Driven port.
        destination: String,
        /// Constant source name.
        source: String,
        /// Tied level.
        value: bool,
    },
    /// A destination with no sources.
    Unused {
        /// Undriven port.
        destination: String,
    },
}

impl AllocationRecord {
    /// Bits this record consumes.
    pub fn width(&self) -> u32 {
        match self {
            AllocationRecord::Bel { range, .. } => range.width,
            AllocationRecord::Mux(m) => m.range.width,
            _ => 0,
        }
    }
}

/// Configuration ports a tile exposes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigPorts {
    /// The tile has no configuration bits.
    None,
    /// Frame data and frame strobe inputs.
    Frames {
        /// Width of the frame data bus.
        frame_bits: u32,
        /// Number of frame strobes.
        max_frames: u32,
    },
    /// A shift-register chain.
    Chain {
        /// Chain length in bits, padded to even.
        length: u32,
    },
}

/// A tile's allocation: the ordered record stream and its totals.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileAllocation {
    /// Tile type name.
    pub tile: String,
    /// Records in entity order.
    pub records: Vec<AllocationRecord>,
    /// Bits consumed: `globalConfigBits`.
    pub global_config_bits: u32,
    /// Configuration ports.
    pub ports: ConfigPorts,
}

impl TileAllocation {
    /// Multiplexer records in allocation order.
    pub fn muxes(&self) -> impl Iterator<Item = &MuxRecord> {
        self.records.iter().filter_map(|r| match r {
            AllocationRecord::Mux(m) => Some(m),
            _ => None,
        })
    }

    /// The multiplexer driving `destination`.
    pub fn mux(&self, destination: &str) -> Option<&MuxRecord> {
        self.muxes().find(|m| m.destination == destination)
    }

    /// `(destination, select field)` per multiplexer, for exposing select
    /// signals as debug outputs.
    pub fn debug_selects(&self) -> Vec<(&str, BitRange)> {
        self.muxes().map(|m| (m.destination.as_str(), m.range)).collect()
    }
}

/// Allocates configuration bits for `tile`.
///
/// Advisory findings (unused destinations, awkward discrete fan-ins) go to
/// `sink`; allocation itself cannot fail.
pub fn allocate(tile: &Tile, config: &FabricConfig, sink: &DiagnosticSink) -> TileAllocation {
    let mut cursor = 0u32;
    let mut records = Vec::new();
    for entity in tile.config_entities() {
        let record = match entity {
            ConfigEntity::Bel { index, bel } => AllocationRecord::Bel {
                index,
                name: bel.name.clone(),
                prefix: bel.prefix.clone(),
                range: BitRange::new(cursor, bel.config_bits),
            },
            ConfigEntity::Mux {
                destination,
                sources,
            } => mux_record(tile, destination, sources, cursor, config.multiplexer_style, sink),
        };
        cursor += record.width();
        records.push(record);
    }

    let ports = match config.config_bit_mode {
        _ if cursor == 0 => ConfigPorts::None,
        ConfigBitMode::FrameBased => ConfigPorts::Frames {
            frame_bits: config.frame_bits_per_row,
            max_frames: config.max_frames_per_col,
        },
        ConfigBitMode::ShiftRegisterChain => ConfigPorts::Chain {
            length: cursor + cursor % 2,
        },
    };

    TileAllocation {
        tile: tile.name.clone(),
        records,
        global_config_bits: cursor,
        ports,
    }
}

fn mux_record(
    tile: &Tile,
    destination: &str,
    sources: &[Source],
    cursor: u32,
    style: MultiplexerStyle,
    sink: &DiagnosticSink,
) -> AllocationRecord {
    let locus = || Locus::tile(tile.name.as_str());
    match sources {
        [] => {
            sink.emit(Diagnostic::warning(
                UNUSED_MUX,
                format!("multiplexer '{destination}' has no sources and is left undriven"),
                locus(),
            ));
            AllocationRecord::Unused {
                destination: destination.to_string(),
            }
        }
        [Source::Constant { name, value }] => AllocationRecord::ConstantTie {
            destination: destination.to_string(),
            source: name.clone(),
            value: *value,
        },
        [only] => AllocationRecord::PassThrough {
            destination: destination.to_string(),
            source: only.name().to_string(),
        },
        _ => {
            let n = sources.len();
            let component = MuxComponent::choose(n, style);
            if style == MultiplexerStyle::Discrete {
                if component == MuxComponent::Generic {
                    sink.emit(
                        Diagnostic::warning(
                            OVERSIZE_DISCRETE,
                            format!(
                                "multiplexer '{destination}' has {n} sources; no discrete cell is that wide"
                            ),
                            locus(),
                        )
                        .with_note("using the generic multiplexer instead"),
                    );
                } else if !n.is_power_of_two() {
                    sink.emit(Diagnostic::warning(
                        NON_POWER_OF_TWO,
                        format!(
                            "multiplexer '{destination}' has {n} sources; unused inputs of {} are tied to ground",
                            component
                        ),
                        locus(),
                    ));
                }
            }
            AllocationRecord::Mux(MuxRecord {
                destination: destination.to_string(),
                sources: sources.to_vec(),
                range: BitRange::new(cursor, select_width(n)),
                component,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::matrix_tile;
    use weft_arch::{Bel, FanInMap};

    fn tile(bel_bits: u32, fan_in: FanInMap) -> Tile {
        matrix_tile("T", vec![Bel::new("LUT", "LA_", bel_bits)], fan_in)
    }

    #[test]
    fn bels_then_muxes_with_running_cursor() {
        let t = tile(
            2,
            FanInMap::from_pairs([("M1", vec!["p0", "p1", "p2"]), ("M2", vec!["q0"]), ("M3", vec!["a0", "a1"])]),
        );
        let sink = DiagnosticSink::new();
        let alloc = allocate(&t, &FabricConfig::new(4, 2), &sink);
        assert_eq!(alloc.global_config_bits, 5);
        assert!(matches!(
            alloc.records[0],
            AllocationRecord::Bel { range: BitRange { start: 0, width: 2 }, .. }
        ));
        assert_eq!(alloc.mux("M1").map(|m| m.range), Some(BitRange::new(2, 2)));
        assert!(matches!(&alloc.records[2], AllocationRecord::PassThrough { source, .. } if source == "q0"));
        assert_eq!(alloc.mux("M3").map(|m| m.range), Some(BitRange::new(4, 1)));
        assert_eq!(
            alloc.ports,
            ConfigPorts::Frames {
                frame_bits: 4,
                max_frames: 2
            }
        );
        assert_eq!(sink.warning_count(), 0);
    }

    #[test]
    fn unused_and_constant_consume_nothing() {
        let t = tile(0, FanInMap::from_pairs([("U0", vec![]), ("C0", vec!["GND0"]), ("V0", vec!["VCC"])]));
        let sink = DiagnosticSink::new();
        let alloc = allocate(&t, &FabricConfig::default(), &sink);
        assert_eq!(alloc.global_config_bits, 0);
        assert_eq!(alloc.ports, ConfigPorts::None);
        assert!(matches!(&alloc.records[1], AllocationRecord::Unused { destination } if destination == "U0"));
        assert!(matches!(&alloc.records[2], AllocationRecord::ConstantTie { value: false, .. }));
        assert!(matches!(&alloc.records[3], AllocationRecord::ConstantTie { value: true, .. }));
        assert_eq!(sink.diagnostics()[0].code, UNUSED_MUX);
    }

    #[test]
    fn chain_length_is_padded_to_even() {
        let t = tile(3, FanInMap::new());
        let config = FabricConfig::default().with_config_bit_mode(ConfigBitMode::ShiftRegisterChain);
        let alloc = allocate(&t, &config, &DiagnosticSink::new());
        assert_eq!(alloc.ports, ConfigPorts::Chain { length: 4 });
        assert_eq!(alloc.global_config_bits, 3);
    }

    #[test]
    fn discrete_style_warnings() {
        let many: Vec<String> = (0..17).map(|i| format!("s{i}")).collect();
        let t = tile(
            0,
            FanInMap::from_pairs([
                ("THREE0", vec!["s0", "s1", "s2"]),
                ("WIDE0", many.iter().map(String::as_str).collect()),
                ("FOUR0", vec!["s0", "s1", "s2", "s3"]),
            ]),
        );
        let sink = DiagnosticSink::new();
        let config = FabricConfig::default().with_multiplexer_style(MultiplexerStyle::Discrete);
        let alloc = allocate(&t, &config, &sink);
        let codes: Vec<DiagnosticCode> = sink.diagnostics().iter().map(|d| d.code).collect();
        assert_eq!(codes, vec![NON_POWER_OF_TWO, OVERSIZE_DISCRETE]);
        assert_eq!(alloc.mux("WIDE0").map(|m| m.component), Some(MuxComponent::Generic));
        assert_eq!(alloc.mux("FOUR0").map(|m| m.component), Some(MuxComponent::Mux4));
        assert_eq!(alloc.global_config_bits, 2 + 5 + 2);
    }

    #[test]
    fn debug_selects_list_only_real_muxes() {
        let t = tile(1, FanInMap::from_pairs([("A0", vec!["x0", "x1"]), ("B0", vec!["z0"])]));
        let alloc = allocate(&t, &FabricConfig::default(), &DiagnosticSink::new());
        assert_eq!(alloc.debug_selects(), vec![("A0", BitRange::new(1, 1))]);
    }

    #[test]
    fn bit_range_display() {
        assert_eq!(BitRange::new(2, 2).to_string(), "3:2");
        assert_eq!(BitRange::new(5, 0).to_string(), "");
    }
}
