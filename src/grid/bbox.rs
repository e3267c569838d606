use super::WORD_BITS;

/// Inclusive cell rectangle. `bottom` is the smallest row index and `top`
/// the largest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct BoundingBox {
    pub left: i32,
    pub bottom: i32,
    pub right: i32,
    pub top: i32,
}

impl BoundingBox {
    #[inline]
    pub const fn new(left: i32, bottom: i32, right: i32, top: i32) -> Self {
        Self {
            left,
            bottom,
            right,
            top,
        }
    }

    /// The single-cell box at the centre of a grid, used when nothing is alive
    pub fn centre_of(width: usize, height: usize) -> Self {
        let (x, y) = ((width / 2) as i32, (height / 2) as i32);
        Self::new(x, y, x, y)
    }

    #[inline]
    pub fn width(&self) -> i32 {
        self.right - self.left + 1
    }
    #[inline]
    pub fn height(&self) -> i32 {
        self.top - self.bottom + 1
    }

    #[inline]
    pub fn contains(&self, x: i32, y: i32) -> bool {
        (self.left..=self.right).contains(&x) && (self.bottom..=self.top).contains(&y)
    }

    pub fn union(&self, other: &Self) -> Self {
        Self::new(
            self.left.min(other.left),
            self.bottom.min(other.bottom),
            self.right.max(other.right),
            self.top.max(other.top),
        )
    }

    pub fn translate(&mut self, dx: i32, dy: i32) {
        self.left += dx;
        self.right += dx;
        self.bottom += dy;
        self.top += dy;
    }

    pub fn expand(&self, by: i32) -> Self {
        Self::new(
            self.left - by,
            self.bottom - by,
            self.right + by,
            self.top + by,
        )
    }

    /// Clips to the extents of a `width`x`height` grid
    pub fn clip(&self, width: usize, height: usize) -> Self {
        let (w, h) = (width as i32, height as i32);
        Self::new(
            self.left.clamp(0, w - 1),
            self.bottom.clamp(0, h - 1),
            self.right.clamp(0, w - 1),
            self.top.clamp(0, h - 1),
        )
    }
}

/// Accumulates the extremes of live cells during a scan.
#[derive(Debug, Clone, Copy)]
pub struct BoxTracker {
    left: i32,
    bottom: i32,
    right: i32,
    top: i32,
}

impl Default for BoxTracker {
    fn default() -> Self {
        Self {
            left: i32::MAX,
            bottom: i32::MAX,
            right: i32::MIN,
            top: i32::MIN,
        }
    }
}

impl BoxTracker {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.left > self.right
    }

    #[inline]
    pub fn include(&mut self, x: usize, y: usize) {
        let (x, y) = (x as i32, y as i32);
        self.left = self.left.min(x);
        self.right = self.right.max(x);
        self.bottom = self.bottom.min(y);
        self.top = self.top.max(y);
    }

    /// Includes every set cell of a non-empty bit-grid word
    #[inline]
    pub fn include_word(&mut self, wx: usize, y: usize, word: u16) {
        debug_assert_ne!(word, 0);
        let base = (wx * WORD_BITS) as i32;
        self.left = self.left.min(base + word.leading_zeros() as i32);
        self.right = self
            .right
            .max(base + (WORD_BITS as i32 - 1) - word.trailing_zeros() as i32);
        self.bottom = self.bottom.min(y as i32);
        self.top = self.top.max(y as i32);
    }

    /// The tracked box clipped to the grid, or the grid's centre cell when
    /// nothing was included
    pub fn finish(&self, width: usize, height: usize) -> BoundingBox {
        if self.is_empty() {
            return BoundingBox::centre_of(width, height);
        }
        BoundingBox::new(self.left, self.bottom, self.right, self.top).clip(width, height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_tracker_pins_to_centre() {
        let tracker = BoxTracker::default();

        assert!(tracker.is_empty());
        assert_eq!(tracker.finish(64, 32), BoundingBox::new(32, 16, 32, 16));
    }

    #[test]
    fn words_convert_to_exact_columns() {
        let mut tracker = BoxTracker::default();
        tracker.include_word(2, 9, 0b0010_0000_0000_0100);
        tracker.include(40, 12);

        assert_eq!(tracker.finish(64, 64), BoundingBox::new(34, 9, 45, 12));
    }

    #[test]
    fn clip_and_expand() {
        let bbox = BoundingBox::new(1, 2, 3, 4).expand(3);

        assert_eq!(bbox, BoundingBox::new(-2, -1, 6, 7));
        assert_eq!(bbox.clip(5, 100), BoundingBox::new(0, 0, 4, 7));
        assert_eq!(bbox.width(), 9);
        assert!(bbox.contains(-2, 7));
    }
}
