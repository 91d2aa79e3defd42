//! Switch-matrix adjacency tables.
//!
//! The table format: the first row holds the tile name in its corner cell
//! followed by destination names; every later row starts with a source name
//! followed by one cell per destination, `1` where the source may drive
//! that destination and `0` (or nothing) otherwise. `#` starts a comment.
//!
//! ```text
//! LUT4AB,N1BEG0,N1BEG1,LA_I0
//! N1END0,1,0,1
//! LA_O,0,1,1,#,2
//! #,1,1,2
//! ```
//!
//! The [`FanInMap`] derived from a table is the select-value contract: its
//! key order fixes multiplexer allocation order and each list's order fixes
//! which select value picks which source.

use crate::error::ArchError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use weft_diagnostics::{Category, Diagnostic, DiagnosticCode, DiagnosticSink, Locus};

/// A destination with no sources.
pub const UNUSED_DESTINATION: DiagnosticCode = DiagnosticCode::new(Category::Adjacency, 201);

/// Number of select bits for a fan-in of `n`: `ceil(log2 n)`, zero for `n < 2`.
pub fn select_width(n: usize) -> u32 {
    if n < 2 {
        0
    } else {
        usize::BITS - (n - 1).leading_zeros()
    }
}

/// A candidate driver of a multiplexer.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Source {
    /// A switch-matrix input port.
    Port(String),
    /// A fixed logic level. The name is kept for display (`GND0`, `VCC`, `1`).
    Constant {
        /// Name as written in the table.
        name: String,
        /// Logic level.
        value: bool,
    },
}

impl Source {
    /// Classifies a source name.
    ///
    /// Names starting with `GND` are constant 0, names starting with `VCC` or
    /// `VDD` are constant 1, and the literals `0`/`1` are themselves.
    pub fn classify(name: &str) -> Source {
        let constant = |value| Source::Constant {
            name: name.to_string(),
            value,
        };
        if name == "0" || name.starts_with("GND") {
            constant(false)
        } else if name == "1" || name.starts_with("VCC") || name.starts_with("VDD") {
            constant(true)
        } else {
            Source::Port(name.to_string())
        }
    }

    /// The name as written in the table.
    pub fn name(&self) -> &str {
        match self {
            Source::Port(name) => name,
            Source::Constant { name, .. } => name,
        }
    }

    /// Returns `true` for fixed-level pseudo-sources.
    pub fn is_constant(&self) -> bool {
        matches!(self, Source::Constant { .. })
    }
}

/// Ordered map from destination to its candidate sources.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FanInMap {
    entries: IndexMap<String, Vec<Source>>,
}

impl FanInMap {
    /// Creates an empty fan-in map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a map from `(destination, sources)` pairs, classifying each source name.
    ///
    /// Sources of a repeated destination are appended to its first occurrence.
    pub fn from_pairs<'a, I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, S)>,
        S: IntoIterator<Item = &'a str>,
    {
        let mut map = FanInMap::new();
        for (dest, sources) in pairs {
            let list = map.entries.entry(dest.to_string()).or_default();
            list.extend(sources.into_iter().map(Source::classify));
        }
        map
    }

    /// Iterates destinations in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Source])> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Sources of one destination.
    pub fn get(&self, destination: &str) -> Option<&[Source]> {
        self.entries.get(destination).map(Vec::as_slice)
    }

    /// Number of destinations.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there are no destinations.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A parsed adjacency table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdjacencyMatrix {
    /// Tile name from the corner cell.
    pub tile: String,
    /// Column names, in order.
    pub destinations: Vec<String>,
    /// Row names, in order.
    pub sources: Vec<String>,
    /// `cells[row][column]`.
    cells: Vec<Vec<bool>>,
}

impl AdjacencyMatrix {
    /// Creates an all-zero matrix.
    pub fn empty(tile: impl Into<String>, destinations: Vec<String>, sources: Vec<String>) -> Self {
        let cells = vec![vec![false; destinations.len()]; sources.len()];
        Self {
            tile: tile.into(),
            destinations,
            sources,
            cells,
        }
    }

    /// Parses the CSV form.
    ///
    /// `tile` names the tile in errors when the corner cell is empty. A
    /// destination with no sources is reported to `sink` as a warning.
    pub fn parse_csv(
        text: &str,
        tile: &str,
        sink: &DiagnosticSink,
    ) -> Result<AdjacencyMatrix, ArchError> {
        let mut rows = text
            .lines()
            .enumerate()
            .filter_map(|(i, line)| split_row(line).map(|cells| ((i + 1) as u32, cells)));

        let (_, header) = rows.next().ok_or_else(|| ArchError::EmptyMatrix {
            tile: tile.to_string(),
        })?;
        let corner = header.first().map(|s| s.as_str()).unwrap_or_default();
        let name = if corner.is_empty() { tile } else { corner }.to_string();
        let destinations: Vec<String> = header[1..].to_vec();
        check_unique(&name, &destinations)?;

        let mut sources = Vec::new();
        let mut cells = Vec::new();
        for (line, row) in rows {
            if row.len() != header.len() {
                return Err(ArchError::MalformedRow {
                    tile: name,
                    line,
                    expected: header.len(),
                    found: row.len(),
                });
            }
            let mut bits = Vec::with_capacity(destinations.len());
            for cell in &row[1..] {
                match cell.as_str() {
                    "1" => bits.push(true),
                    "0" | "" => bits.push(false),
                    other => {
                        return Err(ArchError::InvalidCell {
                            tile: name,
                            line,
                            value: other.to_string(),
                        })
                    }
                }
            }
            sources.push(row[0].clone());
            cells.push(bits);
        }
        check_unique(&name, &sources)?;

        let matrix = AdjacencyMatrix {
            tile: name,
            destinations,
            sources,
            cells,
        };
        for dest in matrix.unused_destinations() {
            sink.emit(Diagnostic::warning(
                UNUSED_DESTINATION,
                format!("destination '{dest}' has no sources"),
                Locus::tile(matrix.tile.as_str()),
            ));
        }
        Ok(matrix)
    }

    /// Returns whether `source` may drive `destination`.
    pub fn get(&self, source: usize, destination: usize) -> bool {
        self.cells
            .get(source)
            .and_then(|row| row.get(destination))
            .copied()
            .unwrap_or(false)
    }

    /// Sets one cell, returning its previous value.
    pub fn set(&mut self, source: usize, destination: usize, value: bool) -> bool {
        match self.cells.get_mut(source).and_then(|row| row.get_mut(destination)) {
            Some(cell) => std::mem::replace(cell, value),
            None => false,
        }
    }

    /// Derives the fan-in map: destinations in column order, sources in row order.
    pub fn fan_in(&self) -> FanInMap {
        let mut map = FanInMap::new();
        for (j, dest) in self.destinations.iter().enumerate() {
            let sources = self
                .sources
                .iter()
                .enumerate()
                .filter(|(i, _)| self.get(*i, j))
                .map(|(_, s)| Source::classify(s))
                .collect();
            map.entries.insert(dest.clone(), sources);
        }
        map
    }

    /// Destinations without any source.
    pub fn unused_destinations(&self) -> Vec<&str> {
        (0..self.destinations.len())
            .filter(|&j| (0..self.sources.len()).all(|i| !self.get(i, j)))
            .map(|j| self.destinations[j].as_str())
            .collect()
    }

    /// Number of destinations a source row drives.
    pub fn fan_out(&self, source: usize) -> usize {
        self.cells
            .get(source)
            .map_or(0, |row| row.iter().filter(|&&c| c).count())
    }

    /// Number of sources feeding a destination column.
    pub fn fan_in_count(&self, destination: usize) -> usize {
        self.cells.iter().filter(|row| row.get(destination) == Some(&true)).count()
    }

    /// Renders the CSV form with a `#,count` comment per row and a final
    /// comment row of column counts.
    pub fn to_csv(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{},{}", self.tile, self.destinations.join(","));
        for (i, source) in self.sources.iter().enumerate() {
            let row: Vec<&str> = self.cells[i]
                .iter()
                .map(|&c| if c { "1" } else { "0" })
                .collect();
            let _ = writeln!(out, "{source},{},#,{}", row.join(","), self.fan_out(i));
        }
        let counts: Vec<String> = (0..self.destinations.len())
            .map(|j| self.fan_in_count(j).to_string())
            .collect();
        let _ = writeln!(out, "#,{}", counts.join(","));
        out
    }

    /// Human-readable summary: sources per destination, then fan-out per source.
    pub fn info(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Tile: {}", self.tile);
        let _ = writeln!(out, "\nDestinations:");
        for (j, dest) in self.destinations.iter().enumerate() {
            let list: Vec<&str> = (0..self.sources.len())
                .filter(|&i| self.get(i, j))
                .map(|i| self.sources[i].as_str())
                .collect();
            let _ = writeln!(
                out,
                "{dest}: MUX-{} ({} select bits) [{}]",
                list.len(),
                select_width(list.len()),
                list.join(", ")
            );
        }
        let _ = writeln!(out, "\nSources:");
        for (i, source) in self.sources.iter().enumerate() {
            let list: Vec<&str> = (0..self.destinations.len())
                .filter(|&j| self.get(i, j))
                .map(|j| self.destinations[j].as_str())
                .collect();
            let _ = writeln!(out, "{source} drives {} [{}]", list.len(), list.join(", "));
        }
        out
    }
}

/// Strips the comment, trims each cell, and drops the separator left in
/// front of a stripped comment. Returns `None` for blank lines.
fn split_row(line: &str) -> Option<Vec<String>> {
    let (content, had_comment) = match line.find('#') {
        Some(pos) => (&line[..pos], true),
        None => (line, false),
    };
    let mut content = content.trim();
    if had_comment {
        content = content.strip_suffix(',').unwrap_or(content);
    }
    if content.is_empty() {
        return None;
    }
    Some(content.split(',').map(|c| c.trim().to_string()).collect())
}

fn check_unique(tile: &str, names: &[String]) -> Result<(), ArchError> {
    let mut seen = std::collections::HashSet::new();
    for name in names {
        if !seen.insert(name.as_str()) {
            return Err(ArchError::DuplicatePort {
                tile: tile.to_string(),
                name: name.clone(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = "\
T,M1,M2,M3
p0,1,0,0
q0,0,1,0
p1,1,0,0
p2,1,0,0
";

    fn parse(text: &str) -> (Result<AdjacencyMatrix, ArchError>, DiagnosticSink) {
        let sink = DiagnosticSink::new();
        (AdjacencyMatrix::parse_csv(text, "T", &sink), sink)
    }

    #[test]
    fn select_widths() {
        assert_eq!(select_width(0), 0);
        assert_eq!(select_width(1), 0);
        assert_eq!(select_width(2), 1);
        assert_eq!(select_width(3), 2);
        assert_eq!(select_width(4), 2);
        assert_eq!(select_width(5), 3);
        assert_eq!(select_width(16), 4);
        assert_eq!(select_width(17), 5);
    }

    #[test]
    fn fan_in_follows_declaration_order() {
        let (m, sink) = parse(TABLE);
        let fan_in = m.unwrap().fan_in();
        let dests: Vec<&str> = fan_in.iter().map(|(d, _)| d).collect();
        assert_eq!(dests, vec!["M1", "M2", "M3"]);
        let m1: Vec<&str> = fan_in.get("M1").unwrap().iter().map(Source::name).collect();
        assert_eq!(m1, vec!["p0", "p1", "p2"]);
        assert_eq!(fan_in.get("M3").unwrap().len(), 0);
        // M3 has no sources
        let diags = sink.take_all();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, UNUSED_DESTINATION);
        assert!(diags[0].message.contains("M3"));
    }

    #[test]
    fn comments_and_blank_cells() {
        let text = "T,A,B # header comment\nx,1,,#,1\n\ny,,1 # trailing\n#,1,1\n";
        let (m, sink) = parse(text);
        let m = m.unwrap();
        assert_eq!(m.sources, vec!["x", "y"]);
        assert!(m.get(0, 0));
        assert!(!m.get(0, 1));
        assert!(m.get(1, 1));
        assert!(!sink.has_errors());
    }

    #[test]
    fn ragged_row_is_fatal() {
        let (m, _) = parse("T,A,B\nx,1\n");
        assert!(matches!(
            m,
            Err(ArchError::MalformedRow { line: 2, expected: 3, found: 2, .. })
        ));
    }

    #[test]
    fn invalid_cell_is_fatal() {
        let (m, _) = parse("T,A\nx,2\n");
        assert!(matches!(m, Err(ArchError::InvalidCell { line: 2, .. })));
    }

    #[test]
    fn duplicate_destination_is_fatal() {
        let (m, _) = parse("T,A,A\nx,1,0\n");
        assert!(matches!(m, Err(ArchError::DuplicatePort { .. })));
    }

    #[test]
    fn empty_table_is_fatal() {
        let (m, _) = parse("# nothing here\n\n");
        assert!(matches!(m, Err(ArchError::EmptyMatrix { .. })));
    }

    #[test]
    fn constant_sources() {
        assert_eq!(
            Source::classify("GND0"),
            Source::Constant { name: "GND0".into(), value: false }
        );
        assert_eq!(
            Source::classify("VDD"),
            Source::Constant { name: "VDD".into(), value: true }
        );
        assert!(Source::classify("1").is_constant());
        assert!(!Source::classify("N1END0").is_constant());
    }

    #[test]
    fn csv_rendering_reparses() {
        let (m, _) = parse(TABLE);
        let m = m.unwrap();
        let text = m.to_csv();
        assert!(text.contains("p0,1,0,0,#,1"));
        assert!(text.ends_with("#,3,1,0\n"));
        let (again, _) = parse(&text);
        assert_eq!(again.unwrap(), m);
    }

    #[test]
    fn info_lists_both_views() {
        let (m, _) = parse(TABLE);
        let info = m.unwrap().info();
        assert!(info.contains("M1: MUX-3 (2 select bits) [p0, p1, p2]"));
        assert!(info.contains("q0 drives 1 [M2]"));
    }

    #[test]
    fn from_pairs_keeps_order() {
        let map = FanInMap::from_pairs([("B", vec!["x", "GND0"]), ("A", vec!["y"])]);
        let dests: Vec<&str> = map.iter().map(|(d, _)| d).collect();
        assert_eq!(dests, vec!["B", "A"]);
        assert!(map.get("B").unwrap()[1].is_constant());
    }
}
