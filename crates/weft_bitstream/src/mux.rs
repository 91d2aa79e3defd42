//! Switch-matrix multiplexer records and their hardware realization.
//!
//! A [`MuxRecord`] owns a contiguous select field. Bit `j` of the select
//! value (bit 0 least significant) lives at logical configuration bit
//! `range.start + j`. Generic multiplexers index an input vector with the
//! field; discrete multiplexers wire each field bit to a select pin of a
//! library cell. Both read back the same source for every select value.

use crate::alloc::BitRange;
use serde::{Deserialize, Serialize};
use std::fmt;
use weft_arch::Source;
use weft_common::MultiplexerStyle;

/// Net used to pad unused inputs of a discrete multiplexer.
pub const PAD_NET: &str = "GND0";

/// The cell realizing one multiplexer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MuxComponent {
    /// Behavioural indexed selection, any fan-in.
    Generic,
    /// `my_mux2`.
    Mux2,
    /// `cus_mux41_buf`.
    Mux4,
    /// `cus_mux81_buf`.
    Mux8,
    /// `cus_mux161_buf`.
    Mux16,
}

impl MuxComponent {
    /// Largest fan-in a discrete cell can realize.
    pub const MAX_DISCRETE: usize = 16;

    /// Picks the component for a fan-in of `n` under `style`.
    ///
    /// Discrete style uses the smallest cell with at least `n` inputs and
    /// falls back to [`Generic`](MuxComponent::Generic) past
    /// [`MAX_DISCRETE`](MuxComponent::MAX_DISCRETE).
    pub fn choose(n: usize, style: MultiplexerStyle) -> MuxComponent {
        match style {
            MultiplexerStyle::Generic => MuxComponent::Generic,
            MultiplexerStyle::Discrete => match n {
                0..=2 => MuxComponent::Mux2,
                3..=4 => MuxComponent::Mux4,
                5..=8 => MuxComponent::Mux8,
                9..=16 => MuxComponent::Mux16,
                _ => MuxComponent::Generic,
            },
        }
    }

    /// Library cell name, `None` for the generic realization.
    pub fn cell_name(self) -> Option<&'static str> {
        match self {
            MuxComponent::Generic => None,
            MuxComponent::Mux2 => Some("my_mux2"),
            MuxComponent::Mux4 => Some("cus_mux41_buf"),
            MuxComponent::Mux8 => Some("cus_mux81_buf"),
            MuxComponent::Mux16 => Some("cus_mux161_buf"),
        }
    }

    /// Number of data inputs of a discrete cell.
    pub fn inputs(self) -> usize {
        match self {
            MuxComponent::Generic => 0,
            MuxComponent::Mux2 => 2,
            MuxComponent::Mux4 => 4,
            MuxComponent::Mux8 => 8,
            MuxComponent::Mux16 => 16,
        }
    }
}

impl fmt::Display for MuxComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.cell_name().unwrap_or("generic"))
    }
}

/// What a cell pin connects to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PinNet {
    /// A logical configuration bit.
    ConfigBit(u32),
    /// A routing signal.
    Signal(String),
}

/// One pin of a discrete multiplexer instance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MuxPin {
    /// Cell pin name.
    pub pin: String,
    /// Connected net.
    pub net: PinNet,
}

/// A multiplexer with at least two sources and its select field.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MuxRecord {
    /// Driven port.
    pub destination: String,
    /// Candidate drivers; index `k` is selected by select value `k`.
    pub sources: Vec<Source>,
    /// Select field.
    pub range: BitRange,
    /// Realization.
    pub component: MuxComponent,
}

impl MuxRecord {
    /// Logical select bits, most significant first.
    pub fn select_bits_msb_first(&self) -> Vec<u32> {
        self.range.iter().rev().collect()
    }

    /// The generic realization: `{dest}_input[ConfigBits[hi:lo]]`.
    pub fn generic_expression(&self) -> String {
        format!("{}_input[ConfigBits[{}]]", self.destination, self.range)
    }

    /// Source names, padded with [`PAD_NET`] up to the component's input count.
    pub fn padded_inputs(&self) -> Vec<String> {
        let mut inputs: Vec<String> = self.sources.iter().map(|s| s.name().to_string()).collect();
        while inputs.len() < self.component.inputs() {
            inputs.push(PAD_NET.to_string());
        }
        inputs
    }

    /// Pin connections of the discrete cell, empty for the generic realization.
    ///
    /// Data pins `A{k}` come first, then select pins (`S` for `my_mux2`,
    /// `S{i}` otherwise, `S{i}` tied to `ConfigBits[start + i]`), then `X`.
    pub fn pin_map(&self) -> Vec<MuxPin> {
        if self.component == MuxComponent::Generic {
            return Vec::new();
        }
        let mut pins: Vec<MuxPin> = self
            .padded_inputs()
            .into_iter()
            .enumerate()
            .map(|(k, net)| MuxPin {
                pin: format!("A{k}"),
                net: PinNet::Signal(net),
            })
            .collect();
        for (i, bit) in self.range.iter().enumerate() {
            let pin = if self.component == MuxComponent::Mux2 {
                "S".to_string()
            } else {
                format!("S{i}")
            };
            pins.push(MuxPin {
                pin,
                net: PinNet::ConfigBit(bit),
            });
        }
        pins.push(MuxPin {
            pin: "X".to_string(),
            net: PinNet::Signal(self.destination.clone()),
        });
        pins
    }

    /// The signal the realized hardware forwards when the select field holds `select`.
    ///
    /// Evaluates the emitted structure: the generic expression indexes the
    /// source vector, a discrete cell decodes its select pins. Padding
    /// inputs and out-of-range values give `None`.
    pub fn resolve(&self, select: u32) -> Option<String> {
        let config_bit = |logical: u32| -> usize {
            logical
                .checked_sub(self.range.start)
                .map_or(0, |j| ((select >> j) & 1) as usize)
        };
        match self.component {
            MuxComponent::Generic => {
                let index = self
                    .range
                    .iter()
                    .map(|bit| config_bit(bit) << (bit - self.range.start))
                    .sum::<usize>();
                self.sources.get(index).map(|s| s.name().to_string())
            }
            _ => {
                let pins = self.pin_map();
                let index = pins
                    .iter()
                    .filter_map(|p| match (&p.net, select_pin_index(&p.pin)) {
                        (PinNet::ConfigBit(bit), Some(i)) => Some(config_bit(*bit) << i),
                        _ => None,
                    })
                    .sum::<usize>();
                if index >= self.sources.len() {
                    return None;
                }
                let data_pin = format!("A{index}");
                pins.into_iter().find_map(|p| match p.net {
                    PinNet::Signal(net) if p.pin == data_pin => Some(net),
                    _ => None,
                })
            }
        }
    }
}

fn select_pin_index(pin: &str) -> Option<usize> {
    match pin.strip_prefix('S')? {
        "" => Some(0),
        digits => digits.parse().ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(n: usize, start: u32, style: MultiplexerStyle) -> MuxRecord {
        let sources = (0..n).map(|k| Source::classify(&format!("s{k}"))).collect();
        MuxRecord {
            destination: "D".into(),
            sources,
            range: BitRange::new(start, weft_arch::select_width(n)),
            component: MuxComponent::choose(n, style),
        }
    }

    #[test]
    fn component_choice() {
        use MultiplexerStyle::*;
        assert_eq!(MuxComponent::choose(2, Discrete), MuxComponent::Mux2);
        assert_eq!(MuxComponent::choose(3, Discrete), MuxComponent::Mux4);
        assert_eq!(MuxComponent::choose(8, Discrete), MuxComponent::Mux8);
        assert_eq!(MuxComponent::choose(16, Discrete), MuxComponent::Mux16);
        assert_eq!(MuxComponent::choose(17, Discrete), MuxComponent::Generic);
        assert_eq!(MuxComponent::choose(4, Generic), MuxComponent::Generic);
    }

    #[test]
    fn generic_expression_names_field() {
        let r = record(3, 2, MultiplexerStyle::Generic);
        assert_eq!(r.generic_expression(), "D_input[ConfigBits[3:2]]");
        assert_eq!(r.select_bits_msb_first(), vec![3, 2]);
    }

    #[test]
    fn discrete_pins_pad_with_ground() {
        let r = record(3, 10, MultiplexerStyle::Discrete);
        let pins = r.pin_map();
        let names: Vec<&str> = pins.iter().map(|p| p.pin.as_str()).collect();
        assert_eq!(names, vec!["A0", "A1", "A2", "A3", "S0", "S1", "X"]);
        assert_eq!(pins[3].net, PinNet::Signal(PAD_NET.into()));
        assert_eq!(pins[4].net, PinNet::ConfigBit(10));
        assert_eq!(pins[5].net, PinNet::ConfigBit(11));
    }

    #[test]
    fn mux2_uses_single_select_pin() {
        let r = record(2, 0, MultiplexerStyle::Discrete);
        let pins = r.pin_map();
        assert_eq!(pins[2].pin, "S");
        assert_eq!(r.resolve(1).as_deref(), Some("s1"));
    }

    #[test]
    fn every_select_value_resolves_to_its_source() {
        for style in [MultiplexerStyle::Generic, MultiplexerStyle::Discrete] {
            for n in 2..=17 {
                let r = record(n, 5, style);
                for k in 0..n {
                    assert_eq!(r.resolve(k as u32), Some(format!("s{k}")), "n={n} k={k} {style:?}");
                }
            }
        }
    }

    #[test]
    fn padding_and_overflow_resolve_to_nothing() {
        let r = record(3, 0, MultiplexerStyle::Discrete);
        assert_eq!(r.resolve(3), None);
        let g = record(3, 0, MultiplexerStyle::Generic);
        assert_eq!(g.resolve(3), None);
    }
}
