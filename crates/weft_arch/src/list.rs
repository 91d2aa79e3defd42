//! The `.list` switch-matrix format.
//!
//! One connection per line, `source,destination`. Either side may use
//! bracket alternatives that expand to several names:
//! `N1END[0|1]` is `N1END0` and `N1END1`, and brackets nest left to right.
//! Both sides are expanded; equal counts are zipped pairwise and a single
//! name on one side is paired with every name on the other.

use crate::error::ArchError;
use crate::matrix::AdjacencyMatrix;
use std::fmt::Write;
use weft_diagnostics::{Category, Diagnostic, DiagnosticCode, DiagnosticSink, Locus};

/// A list connection already present in the matrix.
pub const DUPLICATE_CONNECTION: DiagnosticCode = DiagnosticCode::new(Category::Adjacency, 202);

/// Expands every `[a|b|...]` group in `port`.
pub fn expand_list_ports(port: &str) -> Result<Vec<String>, String> {
    let mut out = Vec::new();
    expand_into(port, &mut out)?;
    Ok(out)
}

fn expand_into(port: &str, out: &mut Vec<String>) -> Result<(), String> {
    let Some(left) = port.find('[') else {
        if port.contains(']') {
            return Err(format!("unmatched ']' in '{port}'"));
        }
        out.push(port.to_string());
        return Ok(());
    };
    let right = port[left..]
        .find(']')
        .map(|r| left + r)
        .ok_or_else(|| format!("cannot find closing ']' in '{port}'"))?;
    let (before, after) = (&port[..left], &port[right + 1..]);
    for alt in port[left + 1..right].split('|') {
        expand_into(&format!("{before}{alt}{after}"), out)?;
    }
    Ok(())
}

/// Parses a list file into `(source, destination)` pairs in file order.
pub fn parse_list(text: &str) -> Result<Vec<(String, String)>, ArchError> {
    let mut pairs = Vec::new();
    for (i, raw) in text.lines().enumerate() {
        let line = (i + 1) as u32;
        let content = raw.split('#').next().unwrap_or_default().trim();
        if content.is_empty() {
            continue;
        }
        let malformed = |message: String| ArchError::MalformedList { line, message };
        let (left, right) = content
            .split_once(',')
            .ok_or_else(|| malformed(format!("expected 'source,destination', found '{content}'")))?;
        let sources = expand_list_ports(left.trim()).map_err(malformed)?;
        let dests = expand_list_ports(right.trim()).map_err(malformed)?;
        match (sources.len(), dests.len()) {
            (a, b) if a == b => pairs.extend(sources.into_iter().zip(dests)),
            (1, _) => pairs.extend(dests.into_iter().map(|d| (sources[0].clone(), d))),
            (_, 1) => pairs.extend(sources.into_iter().map(|s| (s, dests[0].clone()))),
            (a, b) => {
                return Err(malformed(format!(
                    "{a} sources cannot be paired with {b} destinations"
                )))
            }
        }
    }
    Ok(pairs)
}

impl AdjacencyMatrix {
    /// Sets the cell for every pair.
    ///
    /// Every name must already be a row (source) or column (destination).
    /// Pairs that are already connected are reported to `sink`.
    pub fn merge_pairs(
        &mut self,
        pairs: &[(String, String)],
        sink: &DiagnosticSink,
    ) -> Result<(), ArchError> {
        for (source, dest) in pairs {
            let i = self.sources.iter().position(|s| s == source).ok_or_else(|| {
                ArchError::UnknownPort {
                    tile: self.tile.clone(),
                    name: source.clone(),
                    role: "source",
                }
            })?;
            let j = self.destinations.iter().position(|d| d == dest).ok_or_else(|| {
                ArchError::UnknownPort {
                    tile: self.tile.clone(),
                    name: dest.clone(),
                    role: "destination",
                }
            })?;
            if self.set(i, j, true) {
                sink.emit(Diagnostic::warning(
                    DUPLICATE_CONNECTION,
                    format!("connection ({source}, {dest}) already exists"),
                    Locus::tile(self.tile.as_str()),
                ));
            }
        }
        Ok(())
    }

    /// Renders the list form: a `# tile` header, then `source,destination` per set cell.
    pub fn to_list(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "# {}", self.tile);
        for (i, source) in self.sources.iter().enumerate() {
            for (j, dest) in self.destinations.iter().enumerate() {
                if self.get(i, j) {
                    let _ = writeln!(out, "{source},{dest}");
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn expand_plain() {
        assert_eq!(expand_list_ports("N1END0").unwrap(), names(&["N1END0"]));
    }

    #[test]
    fn expand_nested_groups() {
        assert_eq!(
            expand_list_ports("[N|S]1END[0|1]").unwrap(),
            names(&["N1END0", "N1END1", "S1END0", "S1END1"])
        );
    }

    #[test]
    fn expand_unclosed() {
        assert!(expand_list_ports("N1END[0|1").is_err());
        assert!(expand_list_ports("N1END0]").is_err());
    }

    #[test]
    fn parse_zip_and_broadcast() {
        let text = "# LUT4AB\nN1END[0|1],LA_I[0|1]\nGND0,[JN2BEG0|JS2BEG0]\n\n";
        let pairs = parse_list(text).unwrap();
        assert_eq!(
            pairs,
            vec![
                ("N1END0".to_string(), "LA_I0".to_string()),
                ("N1END1".to_string(), "LA_I1".to_string()),
                ("GND0".to_string(), "JN2BEG0".to_string()),
                ("GND0".to_string(), "JS2BEG0".to_string()),
            ]
        );
    }

    #[test]
    fn parse_arity_mismatch() {
        let err = parse_list("a[0|1|2],b[0|1]\n").unwrap_err();
        assert!(matches!(err, ArchError::MalformedList { line: 1, .. }));
    }

    #[test]
    fn parse_missing_comma() {
        assert!(matches!(
            parse_list("\nN1END0 LA_I0\n"),
            Err(ArchError::MalformedList { line: 2, .. })
        ));
    }

    #[test]
    fn merge_and_export() {
        let mut m = AdjacencyMatrix::empty("T", names(&["A", "B"]), names(&["x", "y"]));
        let sink = DiagnosticSink::new();
        let pairs = parse_list("x,[A|B]\ny,B\nx,A\n").unwrap();
        m.merge_pairs(&pairs, &sink).unwrap();
        assert!(m.get(0, 0) && m.get(0, 1) && m.get(1, 1) && !m.get(1, 0));
        // x,A appears twice
        assert_eq!(sink.warning_count(), 1);
        assert_eq!(m.to_list(), "# T\nx,A\nx,B\ny,B\n");
    }

    #[test]
    fn merge_unknown_destination() {
        let mut m = AdjacencyMatrix::empty("T", names(&["A"]), names(&["x"]));
        let sink = DiagnosticSink::new();
        let err = m
            .merge_pairs(&[("x".into(), "Z".into())], &sink)
            .unwrap_err();
        assert!(matches!(err, ArchError::UnknownPort { role: "destination", .. }));
    }
}
