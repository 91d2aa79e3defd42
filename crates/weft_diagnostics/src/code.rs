//! Diagnostic codes grouped by the compiler stage that raises them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The stage a diagnostic code belongs to, determining its prefix letter.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub enum Category {
    /// Fabric description loading, prefixed with `C`.
    Config,
    /// Switch-matrix adjacency tables and lists, prefixed with `A`.
    Adjacency,
    /// Ports, wires and super tiles, prefixed with `G`.
    Graph,
    /// Configuration bit allocation, prefixed with `B`.
    Allocation,
    /// Frame masks and the logical-to-physical encoding, prefixed with `F`.
    Frame,
}

impl Category {
    /// Returns the single-character prefix for this category.
    pub fn prefix(self) -> char {
        match self {
            Category::Config => 'C',
            Category::Adjacency => 'A',
            Category::Graph => 'G',
            Category::Allocation => 'B',
            Category::Frame => 'F',
        }
    }
}

/// A category prefix plus a numeric identifier, displayed as e.g. `F203`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct DiagnosticCode {
    /// The category of this diagnostic.
    pub category: Category,
    /// The numeric identifier within the category.
    pub number: u16,
}

impl DiagnosticCode {
    /// Creates a new diagnostic code.
    pub const fn new(category: Category, number: u16) -> Self {
        Self { category, number }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:03}", self.category.prefix(), self.number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_prefixes() {
        assert_eq!(Category::Config.prefix(), 'C');
        assert_eq!(Category::Adjacency.prefix(), 'A');
        assert_eq!(Category::Graph.prefix(), 'G');
        assert_eq!(Category::Allocation.prefix(), 'B');
        assert_eq!(Category::Frame.prefix(), 'F');
    }

    #[test]
    fn display_format() {
        assert_eq!(DiagnosticCode::new(Category::Frame, 203).to_string(), "F203");
        assert_eq!(DiagnosticCode::new(Category::Adjacency, 7).to_string(), "A007");
    }
}
