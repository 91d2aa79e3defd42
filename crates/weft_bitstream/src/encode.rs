//! Logical-to-physical bit encoding.
//!
//! Frame `f`, mask position `i` (0 = MSB) addresses physical bit
//! `f * F + (F - 1 - i)`. Building an [`EncodeDict`] from a [`ConfigMem`]
//! also checks the table against the tile's allocation.

use crate::config_mem::ConfigMem;
use crate::error::BitstreamError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use weft_common::FabricConfig;

/// One frame latch: configuration bit `config_bit` captures data line
/// `frame_data_bit` when frame `frame_index` is strobed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FrameLatch {
    /// Strobed frame.
    pub frame_index: u32,
    /// Frame data line.
    pub frame_data_bit: u32,
    /// Logical configuration bit.
    pub config_bit: u32,
}

/// The logical-to-physical map of one tile type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodeDict {
    frame_bits: u32,
    global_config_bits: u32,
    slots: Vec<Option<u32>>,
    latches: Vec<FrameLatch>,
}

impl EncodeDict {
    /// Builds and validates the encoding described by `mem`.
    pub fn build(
        mem: &ConfigMem,
        global: u32,
        config: &FabricConfig,
    ) -> Result<EncodeDict, BitstreamError> {
        let tile = || mem.tile.clone();
        let f = config.frame_bits_per_row;
        let max = config.max_frames_per_col;
        if mem.entries.len() != max as usize {
            return Err(BitstreamError::RowCount {
                tile: tile(),
                expected: max,
                found: mem.entries.len() as u32,
            });
        }

        let mut slots = vec![None; (config.tile_capacity() as usize).max(global as usize)];
        let mut latches = Vec::new();
        let mut frames = BTreeSet::new();
        for entry in &mem.entries {
            let frame = entry.frame_index;
            if frame >= max {
                return Err(BitstreamError::FrameIndexOutOfRange {
                    tile: tile(),
                    frame,
                    max,
                });
            }
            if !frames.insert(frame) {
                return Err(BitstreamError::DuplicateFrame { tile: tile(), frame });
            }
            let ones = entry.mask_ones();
            if ones > f {
                return Err(BitstreamError::FrameOverflow {
                    tile: tile(),
                    frame,
                    ones,
                    width: f,
                });
            }
            if entry.mask.len() != f as usize {
                return Err(BitstreamError::MaskWidth {
                    tile: tile(),
                    frame,
                    expected: f,
                    found: entry.mask.len() as u32,
                });
            }
            if ones != entry.bits_used || ones as usize != entry.ranges.len() {
                return Err(BitstreamError::UsedBitsMismatch {
                    tile: tile(),
                    frame,
                    mask_ones: ones,
                    bits_used: entry.bits_used,
                    ranges: entry.ranges.len() as u32,
                });
            }

            let positions = entry
                .mask
                .bytes()
                .enumerate()
                .filter(|&(_, b)| b == b'1')
                .map(|(i, _)| i as u32);
            for (i, &bit) in positions.zip(&entry.ranges) {
                if bit >= global {
                    return Err(BitstreamError::BitOutOfRange {
                        tile: tile(),
                        frame,
                        bit,
                        global,
                    });
                }
                let slot = &mut slots[bit as usize];
                if slot.is_some() {
                    return Err(BitstreamError::DuplicateClaim { tile: tile(), frame, bit });
                }
                let data_bit = f - 1 - i;
                *slot = Some(frame * f + data_bit);
                latches.push(FrameLatch {
                    frame_index: frame,
                    frame_data_bit: data_bit,
                    config_bit: bit,
                });
            }
        }

        let mask_total = mem.total_bits();
        if mask_total != global {
            return Err(BitstreamError::TotalMismatch {
                tile: tile(),
                mask_total,
                global,
            });
        }
        Ok(EncodeDict {
            frame_bits: f,
            global_config_bits: global,
            slots,
            latches,
        })
    }

    /// The shift-register-chain encoding: physical order equals logical order.
    pub fn identity(global: u32) -> EncodeDict {
        EncodeDict {
            frame_bits: 0,
            global_config_bits: global,
            slots: (0..global).map(Some).collect(),
            latches: Vec::new(),
        }
    }

    /// Physical position of a logical bit.
    pub fn physical(&self, logical: u32) -> Option<u32> {
        self.slots.get(logical as usize).copied().flatten()
    }

    /// Logical bits covered by this encoding.
    pub fn global_config_bits(&self) -> u32 {
        self.global_config_bits
    }

    /// Number of addressable positions, `max_frames_per_col * F` for frame encodings.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` if no position is addressable.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// `(logical, physical)` pairs in logical order.
    pub fn assigned(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(l, p)| p.map(|p| (l as u32, p)))
    }

    /// Splits a physical position into `(frame, frame_data_bit)`. `None` for
    /// chain encodings.
    pub fn frame_position(&self, physical: u32) -> Option<(u32, u32)> {
        (self.frame_bits > 0).then(|| (physical / self.frame_bits, physical % self.frame_bits))
    }

    /// Frame latch records in table order.
    pub fn latches(&self) -> &[FrameLatch] {
        &self.latches
    }
}
