//! Configuration frame images.
//!
//! A [`ConfigImage`] holds the frames of one tile instance. Enabling a
//! feature writes its bit pattern; reading a multiplexer's select field back
//! through the encoding recovers the chosen source.

use crate::encode::EncodeDict;
use crate::error::BitstreamError;
use crate::feature_table::{BitValue, FeatureTable};
use crate::mux::MuxRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A frame index within a tile column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FrameAddress(u32);

impl FrameAddress {
    /// Creates a frame address from a raw index.
    pub fn from_raw(index: u32) -> Self {
        Self(index)
    }

    /// Returns the raw frame index.
    pub fn as_raw(self) -> u32 {
        self.0
    }
}

/// A single configuration bit: frame, data line, value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConfigBit {
    /// The frame containing this bit.
    pub frame: FrameAddress,
    /// The frame data line.
    pub bit_offset: u32,
    /// The value to program (true = 1).
    pub value: bool,
}

/// One frame's data packed into 32-bit words, data line `n` at bit `n % 32`
/// of word `n / 32`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigFrame {
    /// The address of this frame.
    pub address: FrameAddress,
    /// Packed frame data.
    pub data: Vec<u32>,
}

/// The configuration frames of one tile instance.
///
/// Frames are created on demand as bits are set. Bits written through
/// [`enable`](ConfigImage::enable) are remembered so that conflicting
/// features are caught.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigImage {
    frames: BTreeMap<FrameAddress, Vec<u32>>,
    assigned: BTreeMap<u32, bool>,
    /// Data lines per frame.
    pub frame_bits: u32,
    /// Frames in the tile column.
    pub frame_count: u32,
}

impl ConfigImage {
    /// Creates an all-zero image.
    pub fn new(frame_bits: u32, frame_count: u32) -> Self {
        Self {
            frames: BTreeMap::new(),
            assigned: BTreeMap::new(),
            frame_bits: frame_bits.max(1),
            frame_count,
        }
    }

    fn word_count(&self) -> usize {
        self.frame_bits.div_ceil(32) as usize
    }

    /// Sets a single configuration bit. Bits past the frame width are ignored.
    pub fn set_bit(&mut self, bit: ConfigBit) {
        if bit.bit_offset >= self.frame_bits {
            return;
        }
        let word_count = self.word_count();
        let frame_data = self
            .frames
            .entry(bit.frame)
            .or_insert_with(|| vec![0u32; word_count]);
        let word = &mut frame_data[(bit.bit_offset / 32) as usize];
        let mask = 1 << (bit.bit_offset % 32);
        if bit.value {
            *word |= mask;
        } else {
            *word &= !mask;
        }
    }

    /// Reads a single configuration bit.
    pub fn get_bit(&self, frame: FrameAddress, bit_offset: u32) -> bool {
        self.frames
            .get(&frame)
            .and_then(|data| data.get((bit_offset / 32) as usize))
            .is_some_and(|word| word & (1 << (bit_offset % 32)) != 0)
    }

    fn split(&self, physical: u32) -> (FrameAddress, u32) {
        (
            FrameAddress::from_raw(physical / self.frame_bits),
            physical % self.frame_bits,
        )
    }

    /// Sets the bit at a physical position.
    pub fn set_physical(&mut self, physical: u32, value: bool) {
        let (frame, bit_offset) = self.split(physical);
        self.set_bit(ConfigBit {
            frame,
            bit_offset,
            value,
        });
    }

    /// Reads the bit at a physical position.
    pub fn get_physical(&self, physical: u32) -> bool {
        let (frame, offset) = self.split(physical);
        self.get_bit(frame, offset)
    }

    /// Writes the bit pattern of feature `name` from `table`.
    ///
    /// The pattern is written only if none of its bits contradicts an
    /// earlier feature; on conflict the image is left untouched.
    /// `location` only labels errors.
    pub fn enable(
        &mut self,
        table: &FeatureTable,
        name: &str,
        location: &str,
    ) -> Result<(), BitstreamError> {
        let bits = table.get(name).ok_or_else(|| BitstreamError::UnknownFeature {
            location: location.to_string(),
            feature: name.to_string(),
        })?;
        let conflict = bits.iter().find(|(physical, value)| {
            self.assigned
                .get(physical)
                .is_some_and(|&previous| previous != value.as_bool())
        });
        if let Some((bit, _)) = conflict {
            return Err(BitstreamError::FeatureConflict {
                location: location.to_string(),
                feature: name.to_string(),
                bit,
            });
        }
        for (physical, value) in bits.iter() {
            self.assigned.insert(physical, value.as_bool());
            self.set_physical(physical, value.as_bool());
        }
        Ok(())
    }

    /// Features of `table` whose bits have all been written with matching
    /// values. Fixed connections (empty patterns) are never reported.
    pub fn enabled_features<'t>(&self, table: &'t FeatureTable) -> Vec<&'t str> {
        table
            .iter()
            .filter(|(_, bits)| !bits.is_empty())
            .filter(|(_, bits)| {
                bits.iter()
                    .all(|(p, v)| self.assigned.get(&p) == Some(&(v == BitValue::One)))
            })
            .map(|(name, _)| name)
            .collect()
    }

    /// The select value a multiplexer's field currently holds.
    pub fn read_select(&self, mux: &MuxRecord, encode: &EncodeDict) -> Option<u32> {
        let mut value = 0;
        for (j, logical) in mux.range.iter().enumerate() {
            if self.get_physical(encode.physical(logical)?) {
                value |= 1 << j;
            }
        }
        Some(value)
    }

    /// One frame as a string of data lines, MSB (line `F-1`) first.
    pub fn frame_string(&self, frame: u32) -> String {
        let address = FrameAddress::from_raw(frame);
        (0..self.frame_bits)
            .rev()
            .map(|line| if self.get_bit(address, line) { '1' } else { '0' })
            .collect()
    }

    /// Returns the number of frames that have been modified.
    pub fn active_frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Returns the modified frames in ascending address order.
    pub fn finalize(&self) -> Vec<ConfigFrame> {
        self.frames
            .iter()
            .map(|(&address, data)| ConfigFrame {
                address,
                data: data.clone(),
            })
            .collect()
    }

    /// Returns whether any bits have been set in the image.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}
