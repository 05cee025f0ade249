//! Axis-aligned pixel regions.

/// A rectangle in pixel coordinates, half-open on the upper bound.
///
/// `Rectangle::new(8, 0, 24, 8)` covers `x` in `8..24` and `y` in `0..8`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rectangle {
    /// Left edge, inclusive.
    pub x1: u32,
    /// Top edge, inclusive.
    pub y1: u32,
    /// Right edge, exclusive.
    pub x2: u32,
    /// Bottom edge, exclusive.
    pub y2: u32,
}

impl Rectangle {
    /// Covers `x1..x2` by `y1..y2`.
    pub const fn new(x1: u32, y1: u32, x2: u32, y2: u32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Width in pixels; 0 if inverted.
    #[inline]
    pub const fn width(&self) -> u32 {
        self.x2.saturating_sub(self.x1)
    }

    /// Height in pixels; 0 if inverted.
    #[inline]
    pub const fn height(&self) -> u32 {
        self.y2.saturating_sub(self.y1)
    }

    /// Number of pixels covered.
    #[inline]
    pub const fn area(&self) -> u32 {
        self.width() * self.height()
    }

    /// Visits every coordinate column by column: `x` ascending on the outside,
    /// `y` ascending on the inside.
    pub fn columns(&self) -> impl Iterator<Item = (u32, u32)> {
        let Rectangle { x1, y1, x2, y2 } = *self;
        (x1..x2).flat_map(move |x| (y1..y2).map(move |y| (x, y)))
    }

    /// Whether `(x, y)` lies inside.
    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x1 && x < self.x2 && y >= self.y1 && y < self.y2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_columns_order() {
        let rect = Rectangle::new(2, 5, 4, 7);
        let coords: Vec<_> = rect.columns().collect();
        assert_eq!(coords, vec![(2, 5), (2, 6), (3, 5), (3, 6)]);
    }

    #[test]
    fn test_half_open_bounds() {
        let rect = Rectangle::new(0, 0, 8, 4);
        assert_eq!(rect.area(), 32);
        assert!(rect.contains(7, 3));
        assert!(!rect.contains(8, 3));
        assert!(!rect.contains(7, 4));
    }

    #[test]
    fn test_empty_rectangle() {
        let rect = Rectangle::new(4, 4, 4, 10);
        assert_eq!(rect.area(), 0);
        assert_eq!(rect.columns().count(), 0);
    }
}
