//! ConfigMem tables: which logical bits each configuration frame latches.
//!
//! The CSV form has one row per frame:
//!
//! ```text
//! frame_name,frame_index,bits_used_in_frame,used_bits_mask,ConfigBits_ranges
//! frame0,0,4,1111,5:2
//! frame1,1,2,1100,1:0
//! ```
//!
//! Masks are written MSB first and may contain `_` separators. Ranges are
//! `hi:lo` (descending), `lo:hi` (ascending) or single indices, separated by
//! `;` or spread over extra columns, and are consumed in order by the mask's
//! 1s. `#` starts a comment, so `# NULL` marks a frame with no ranges.

use crate::error::BitstreamError;
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use weft_common::FabricConfig;

/// Header row of the CSV form.
pub const HEADER: &str = "frame_name,frame_index,bits_used_in_frame,used_bits_mask,ConfigBits_ranges";

/// One frame row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigMemEntry {
    /// Display name, e.g. `frame0`.
    pub frame_name: String,
    /// Frame index within the tile column.
    pub frame_index: u32,
    /// Declared number of latched bits.
    pub bits_used: u32,
    /// Used-bit mask, MSB first, `'1'` for a latched bit. No separators.
    pub mask: String,
    /// Logical bits in consumption order.
    pub ranges: Vec<u32>,
}

impl ConfigMemEntry {
    /// Number of `'1'`s in the mask.
    pub fn mask_ones(&self) -> u32 {
        self.mask.bytes().filter(|&b| b == b'1').count() as u32
    }
}

/// A tile's frame table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigMem {
    /// Tile type name.
    pub tile: String,
    /// Frame rows in file order.
    pub entries: Vec<ConfigMemEntry>,
}

impl ConfigMem {
    /// Packs `global` bits into frames, highest logical bits first.
    ///
    /// A full frame latches `rem-1 .. rem-F`; the last partial frame uses
    /// the top `rem` mask positions; later frames are empty.
    pub fn default_policy(
        tile: &str,
        global: u32,
        config: &FabricConfig,
    ) -> Result<ConfigMem, BitstreamError> {
        let f = config.frame_bits_per_row;
        if u64::from(global) > config.tile_capacity() {
            return Err(BitstreamError::CapacityExceeded {
                tile: tile.to_string(),
                bits: global,
                capacity: config.tile_capacity(),
            });
        }
        let mut remaining = global;
        let entries = (0..config.max_frames_per_col)
            .map(|k| {
                let used = remaining.min(f);
                let mask: String = (0..f).map(|i| if i < used { '1' } else { '0' }).collect();
                let ranges = ((remaining - used)..remaining).rev().collect();
                remaining -= used;
                ConfigMemEntry {
                    frame_name: format!("frame{k}"),
                    frame_index: k,
                    bits_used: used,
                    mask,
                    ranges,
                }
            })
            .collect();
        Ok(ConfigMem {
            tile: tile.to_string(),
            entries,
        })
    }

    /// Parses the CSV form. Structural checks only; consistency is checked
    /// when the encoding is built.
    pub fn parse_csv(text: &str, tile: &str) -> Result<ConfigMem, BitstreamError> {
        let mut entries = Vec::new();
        for (i, raw) in text.lines().enumerate() {
            let line = (i + 1) as u32;
            let err = |message: String| BitstreamError::MalformedConfigMem {
                tile: tile.to_string(),
                line,
                message,
            };
            let content = raw.split('#').next().unwrap_or_default();
            let cells: Vec<&str> = content.split(',').map(str::trim).collect();
            if cells.iter().all(|c| c.is_empty()) || cells[0] == "frame_name" {
                continue;
            }
            if cells.len() < 4 {
                return Err(err(format!("expected at least 4 columns, found {}", cells.len())));
            }
            let number = |cell: &str, what: &str| {
                cell.parse::<u32>()
                    .map_err(|_| err(format!("invalid {what} '{cell}'")))
            };
            let frame_index = number(cells[1], "frame index")?;
            let bits_used = number(cells[2], "bits_used_in_frame")?;
            let mask: String = cells[3].chars().filter(|&c| c != '_' && c != ' ').collect();
            if let Some(bad) = mask.chars().find(|&c| c != '0' && c != '1') {
                return Err(err(format!("invalid mask character '{bad}'")));
            }
            let mut ranges = Vec::new();
            for field in cells[4..].iter().flat_map(|c| c.split(';')) {
                ranges.extend(expand_range(field.trim()).map_err(&err)?);
            }
            entries.push(ConfigMemEntry {
                frame_name: cells[0].to_string(),
                frame_index,
                bits_used,
                mask,
                ranges,
            });
        }
        Ok(ConfigMem {
            tile: tile.to_string(),
            entries,
        })
    }

    /// Renders the CSV form.
    pub fn to_csv(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{HEADER}");
        for e in &self.entries {
            let ranges = if e.ranges.is_empty() {
                "# NULL".to_string()
            } else {
                compress_ranges(&e.ranges)
            };
            let _ = writeln!(
                out,
                "{},{},{},{},{}",
                e.frame_name,
                e.frame_index,
                e.bits_used,
                group_mask(&e.mask),
                ranges
            );
        }
        out
    }

    /// Total `'1'`s across all masks.
    pub fn total_bits(&self) -> u32 {
        self.entries.iter().map(ConfigMemEntry::mask_ones).sum()
    }
}

fn expand_range(field: &str) -> Result<Vec<u32>, String> {
    if field.is_empty() {
        return Ok(Vec::new());
    }
    let parse = |s: &str| {
        s.trim()
            .parse::<u32>()
            .map_err(|_| format!("invalid bit range '{field}'"))
    };
    match field.split_once(':') {
        Some((a, b)) => {
            let (a, b) = (parse(a)?, parse(b)?);
            Ok(if a >= b { (b..=a).rev().collect() } else { (a..=b).collect() })
        }
        None => Ok(vec![parse(field)?]),
    }
}

/// Collapses runs of consecutive indices into `hi:lo` / `lo:hi` fields.
fn compress_ranges(values: &[u32]) -> String {
    let mut fields = Vec::new();
    let mut i = 0;
    while i < values.len() {
        let first = values[i];
        let mut j = i;
        let step = match values.get(i + 1) {
            Some(&next) if next + 1 == first => -1i64,
            Some(&next) if first + 1 == next => 1,
            _ => 0,
        };
        if step != 0 {
            while j + 1 < values.len() && i64::from(values[j + 1]) - i64::from(values[j]) == step {
                j += 1;
            }
        }
        fields.push(if j == i {
            first.to_string()
        } else {
            format!("{first}:{}", values[j])
        });
        i = j + 1;
    }
    fields.join(";")
}

/// Inserts `_` every four digits counting from the right.
fn group_mask(mask: &str) -> String {
    let len = mask.len();
    let mut out = String::with_capacity(len + len / 4);
    for (i, c) in mask.chars().enumerate() {
        if i > 0 && (len - i) % 4 == 0 {
            out.push('_');
        }
        out.push(c);
    }
    out
}
