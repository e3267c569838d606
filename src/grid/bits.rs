use super::{BoundingBox, TILE_SIZE, WORD_BITS};

/// A bit-packed grid with one bit per cell.
///
/// Rows are stored back to back as `u16` words. Inside a word the most
/// significant bit is the leftmost cell, so cell `x` lives in word `x / 16`
/// under the mask [`BitGrid::mask`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BitGrid {
    width: usize,
    height: usize,
    stride: usize,
    words: Vec<u16>,
}

impl BitGrid {
    pub fn new(width: usize, height: usize) -> Self {
        debug_assert!(
            width % WORD_BITS == 0 && height % TILE_SIZE == 0,
            "grid of {width}x{height} is not tile aligned"
        );
        let stride = width / WORD_BITS;
        Self {
            width,
            height,
            stride,
            words: vec![0; stride * height],
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }
    /// Words per row
    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    #[inline]
    pub const fn mask(x: usize) -> u16 {
        0x8000 >> (x % WORD_BITS)
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> bool {
        self.words[y * self.stride + x / WORD_BITS] & Self::mask(x) != 0
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, alive: bool) {
        let word = &mut self.words[y * self.stride + x / WORD_BITS];
        if alive {
            *word |= Self::mask(x);
        } else {
            *word &= !Self::mask(x);
        }
    }

    #[inline]
    pub fn word(&self, wx: usize, y: usize) -> u16 {
        self.words[y * self.stride + wx]
    }

    #[inline]
    pub fn set_word(&mut self, wx: usize, y: usize, word: u16) {
        self.words[y * self.stride + wx] = word;
    }

    #[inline]
    pub fn row(&self, y: usize) -> &[u16] {
        &self.words[y * self.stride..(y + 1) * self.stride]
    }

    /// The 16 words of the tile at `(tx, ty)`, top row first
    pub fn tile(&self, tx: usize, ty: usize) -> [u16; TILE_SIZE] {
        let mut words = [0; TILE_SIZE];
        for (r, word) in words.iter_mut().enumerate() {
            *word = self.word(tx, ty * TILE_SIZE + r);
        }
        words
    }

    pub fn clear_tile(&mut self, tx: usize, ty: usize) {
        for y in ty * TILE_SIZE..(ty + 1) * TILE_SIZE {
            self.words[y * self.stride + tx] = 0;
        }
    }

    pub fn clear(&mut self) {
        self.words.fill(0);
    }

    /// Zeroes every word overlapping the (already clipped) region
    pub fn clear_region(&mut self, region: &BoundingBox) {
        let (first, last) = (
            region.left as usize / WORD_BITS,
            region.right as usize / WORD_BITS,
        );
        for y in region.bottom as usize..=region.top as usize {
            let row = y * self.stride;
            self.words[row + first..=row + last].fill(0);
        }
    }

    /// Number of set bits
    pub fn count(&self) -> u32 {
        self.words.iter().map(|w| w.count_ones()).sum()
    }

    /// Copies `src` into the centre of this (at least as large) grid.
    ///
    /// Both grids have power-of-two sizes of at least two words, so the
    /// horizontal offset is always a whole number of words.
    pub fn copy_centred_from(&mut self, src: &BitGrid) {
        debug_assert!(self.width >= src.width && self.height >= src.height);
        let dx = (self.width - src.width) / 2;
        let dy = (self.height - src.height) / 2;
        debug_assert_eq!(dx % WORD_BITS, 0, "unaligned horizontal offset");

        let wx = dx / WORD_BITS;
        for y in 0..src.height {
            let start = (y + dy) * self.stride + wx;
            self.words[start..start + src.stride].copy_from_slice(src.row(y));
        }
    }

    pub fn bytes(&self) -> usize {
        self.words.len() * std::mem::size_of::<u16>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leftmost_cell_is_high_bit() {
        let mut grid = BitGrid::new(32, 16);
        grid.set(0, 3, true);
        grid.set(17, 3, true);

        assert_eq!(grid.word(0, 3), 0x8000);
        assert_eq!(grid.word(1, 3), 0x4000);
        assert!(grid.get(17, 3));
        assert_eq!(grid.count(), 2);

        grid.set(0, 3, false);
        assert!(!grid.get(0, 3));
    }

    #[test]
    fn centred_copy_keeps_relative_positions() {
        let mut small = BitGrid::new(32, 32);
        small.set(5, 7, true);
        small.set(31, 0, true);

        let mut big = BitGrid::new(64, 64);
        big.copy_centred_from(&small);

        assert!(big.get(21, 23));
        assert!(big.get(47, 16));
        assert_eq!(big.count(), 2);
    }

    #[test]
    fn clear_region_clears_whole_words() {
        let mut grid = BitGrid::new(64, 16);
        grid.set(3, 2, true);
        grid.set(20, 2, true);
        grid.set(40, 2, true);

        grid.clear_region(&BoundingBox::new(10, 0, 25, 5));

        assert!(grid.get(40, 2));
        assert!(!grid.get(20, 2));
        // shares a word with column 10
        assert!(!grid.get(3, 2));
    }
}
