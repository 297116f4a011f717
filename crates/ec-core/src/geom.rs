use serde::{Deserialize, Serialize};

/// Integer raster position, row first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Pixel {
    pub row: usize,
    pub col: usize,
}

impl Pixel {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Row-major linear index in a raster of the given width.
    #[inline]
    pub fn index(self, width: usize) -> usize {
        self.row * width + self.col
    }

    #[inline]
    pub fn from_index(idx: usize, width: usize) -> Self {
        Self {
            row: idx / width,
            col: idx % width,
        }
    }

    /// True when `other` is one of the eight neighbours of `self`.
    pub fn is_adjacent8(self, other: Pixel) -> bool {
        let dr = self.row.abs_diff(other.row);
        let dc = self.col.abs_diff(other.col);
        dr <= 1 && dc <= 1 && (dr | dc) != 0
    }
}

#[cfg(test)]
mod tests {
    use super::Pixel;

    #[test]
    fn linear_index_round_trips() {
        let p = Pixel::new(3, 7);
        assert_eq!(p.index(10), 37);
        assert_eq!(Pixel::from_index(37, 10), p);
    }

    #[test]
    fn adjacency_is_eight_connected() {
        let c = Pixel::new(5, 5);

        assert!(c.is_adjacent8(Pixel::new(4, 4)));
        assert!(c.is_adjacent8(Pixel::new(5, 6)));
        assert!(c.is_adjacent8(Pixel::new(6, 4)));
        assert!(!c.is_adjacent8(c));
        assert!(!c.is_adjacent8(Pixel::new(5, 7)));
        assert!(!c.is_adjacent8(Pixel::new(3, 5)));
    }
}
