//! Tile grid coordinates.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A tile location in the fabric grid.
///
/// `x` grows to the east, `y` grows to the south, so a North port has a
/// negative `y` offset. Displayed as `X{x}Y{y}`, the key used by every
/// per-location output.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct TileCoord {
    /// Column index.
    pub x: u32,
    /// Row index.
    pub y: u32,
}

impl TileCoord {
    /// Creates a coordinate.
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Returns the coordinate displaced by `(dx, dy)`, or `None` if it leaves the
    /// non-negative quadrant.
    pub fn offset(self, dx: i32, dy: i32) -> Option<TileCoord> {
        let x = i64::from(self.x) + i64::from(dx);
        let y = i64::from(self.y) + i64::from(dy);
        if x < 0 || y < 0 || x > i64::from(u32::MAX) || y > i64::from(u32::MAX) {
            return None;
        }
        Some(TileCoord::new(x as u32, y as u32))
    }

    /// Returns the `X{x}Y{y}` key for this location.
    pub fn key(self) -> String {
        self.to_string()
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "X{}Y{}", self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_key() {
        assert_eq!(TileCoord::new(3, 12).key(), "X3Y12");
    }

    #[test]
    fn offset_within_grid() {
        let c = TileCoord::new(2, 2);
        assert_eq!(c.offset(0, -1), Some(TileCoord::new(2, 1)));
        assert_eq!(c.offset(1, 0), Some(TileCoord::new(3, 2)));
    }

    #[test]
    fn offset_leaves_grid() {
        assert_eq!(TileCoord::new(0, 0).offset(-1, 0), None);
        assert_eq!(TileCoord::new(0, 1).offset(0, -2), None);
    }

    #[test]
    fn ordering_sorts_by_x_then_y() {
        let mut v = vec![TileCoord::new(1, 0), TileCoord::new(0, 1), TileCoord::new(0, 0)];
        v.sort();
        assert_eq!(v[0], TileCoord::new(0, 0));
        assert_eq!(v[2], TileCoord::new(1, 0));
    }
}
