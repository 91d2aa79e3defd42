//! The immutable fabric parameter set threaded through every compiler stage.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How configuration bits are stored in the fabric.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ConfigBitMode {
    /// Bits are latched from frame data under per-frame strobes.
    #[default]
    FrameBased,
    /// Bits are shifted in through a flip-flop chain.
    ShiftRegisterChain,
}

/// How switch-matrix multiplexers are realized in hardware.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum MultiplexerStyle {
    /// An indexed-select expression the synthesis tool maps freely.
    #[default]
    Generic,
    /// Hand-instantiated multiplexer cells of size 2, 4, 8 or 16.
    Discrete,
}

/// Error returned when a mode or style string is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized {kind}: '{input}'")]
pub struct ParseModeError {
    /// What was being parsed, e.g. `"multiplexer style"`.
    pub kind: &'static str,
    /// The rejected input.
    pub input: String,
}

impl FromStr for ConfigBitMode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "frame_based" | "framebased" | "frame" => Ok(ConfigBitMode::FrameBased),
            "shift_register_chain" | "shiftregisterchain" | "flipflopchain" | "ff_chain" => {
                Ok(ConfigBitMode::ShiftRegisterChain)
            }
            _ => Err(ParseModeError {
                kind: "configuration bit mode",
                input: s.to_string(),
            }),
        }
    }
}

impl FromStr for MultiplexerStyle {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "generic" => Ok(MultiplexerStyle::Generic),
            "discrete" | "custom" => Ok(MultiplexerStyle::Discrete),
            _ => Err(ParseModeError {
                kind: "multiplexer style",
                input: s.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for ConfigBitMode {
    type Error = ParseModeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl TryFrom<String> for MultiplexerStyle {
    type Error = ParseModeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ConfigBitMode> for String {
    fn from(mode: ConfigBitMode) -> Self {
        mode.to_string()
    }
}

impl From<MultiplexerStyle> for String {
    fn from(style: MultiplexerStyle) -> Self {
        style.to_string()
    }
}

impl fmt::Display for ConfigBitMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigBitMode::FrameBased => write!(f, "frame_based"),
            ConfigBitMode::ShiftRegisterChain => write!(f, "shift_register_chain"),
        }
    }
}

impl fmt::Display for MultiplexerStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MultiplexerStyle::Generic => write!(f, "generic"),
            MultiplexerStyle::Discrete => write!(f, "discrete"),
        }
    }
}

/// Global fabric parameters.
///
/// Built once by the loader and passed by reference into the allocator,
/// the frame encoder, and the feature-table builder. Nothing reads these
/// values from ambient state.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct FabricConfig {
    /// Physical bits per configuration frame.
    pub frame_bits_per_row: u32,
    /// Frames available to each tile column.
    pub max_frames_per_col: u32,
    /// Storage scheme for configuration bits.
    #[serde(default)]
    pub config_bit_mode: ConfigBitMode,
    /// Multiplexer realization in the switch matrix.
    #[serde(default)]
    pub multiplexer_style: MultiplexerStyle,
    /// Simulation delay annotated on switch-matrix assignments, in time units.
    #[serde(default)]
    pub generate_delay_in_switch_matrix: u32,
}

impl FabricConfig {
    /// Creates a frame-based configuration with the generic multiplexer style.
    pub fn new(frame_bits_per_row: u32, max_frames_per_col: u32) -> Self {
        Self {
            frame_bits_per_row,
            max_frames_per_col,
            config_bit_mode: ConfigBitMode::FrameBased,
            multiplexer_style: MultiplexerStyle::Generic,
            generate_delay_in_switch_matrix: 0,
        }
    }

    /// Returns a copy with a different multiplexer style.
    pub fn with_multiplexer_style(mut self, style: MultiplexerStyle) -> Self {
        self.multiplexer_style = style;
        self
    }

    /// Returns a copy with a different configuration bit mode.
    pub fn with_config_bit_mode(mut self, mode: ConfigBitMode) -> Self {
        self.config_bit_mode = mode;
        self
    }

    /// Total configuration bits addressable by one tile: `max_frames_per_col * frame_bits_per_row`.
    pub fn tile_capacity(&self) -> u64 {
        u64::from(self.max_frames_per_col) * u64::from(self.frame_bits_per_row)
    }
}

impl Default for FabricConfig {
    fn default() -> Self {
        Self::new(32, 20)
    }
}
