use super::{TILE_SIZE, WORD_BITS};

/// Which borders of a freshly computed tile hold live cells.
///
/// `north` is the tile's first row (lowest `y`), `west` its first column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TileEdges {
    pub occupied: bool,
    pub north: bool,
    pub south: bool,
    pub west: bool,
    pub east: bool,
    pub north_west: bool,
    pub north_east: bool,
    pub south_west: bool,
    pub south_east: bool,
}

impl TileEdges {
    pub fn from_words(words: &[u16; TILE_SIZE]) -> Self {
        const WEST: u16 = 0x8000;
        const EAST: u16 = 0x0001;

        let any = words.iter().fold(0, |acc, &w| acc | w);
        let (first, last) = (words[0], words[TILE_SIZE - 1]);
        Self {
            occupied: any != 0,
            north: first != 0,
            south: last != 0,
            west: any & WEST != 0,
            east: any & EAST != 0,
            north_west: first & WEST != 0,
            north_east: first & EAST != 0,
            south_west: last & WEST != 0,
            south_east: last & EAST != 0,
        }
    }
}

/// One bit per tile: set means the tile may hold a live (or just changed)
/// cell, clear guarantees the whole tile is dead.
///
/// Bits are packed like [`super::BitGrid`], most significant bit first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TileBitmap {
    cols: usize,
    rows: usize,
    stride: usize,
    words: Vec<u16>,
}

impl TileBitmap {
    pub fn new(cols: usize, rows: usize) -> Self {
        let stride = cols.div_ceil(WORD_BITS);
        Self {
            cols,
            rows,
            stride,
            words: vec![0; stride * rows],
        }
    }

    /// A bitmap covering a `width`x`height` cell grid
    pub fn for_grid(width: usize, height: usize) -> Self {
        Self::new(width / TILE_SIZE, height / TILE_SIZE)
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }
    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    fn locate(&self, tx: usize, ty: usize) -> (usize, u16) {
        (ty * self.stride + tx / WORD_BITS, 0x8000 >> (tx % WORD_BITS))
    }

    #[inline]
    pub fn get(&self, tx: usize, ty: usize) -> bool {
        let (i, mask) = self.locate(tx, ty);
        self.words[i] & mask != 0
    }

    #[inline]
    pub fn set(&mut self, tx: usize, ty: usize) {
        let (i, mask) = self.locate(tx, ty);
        self.words[i] |= mask;
    }

    pub fn clear_all(&mut self) {
        self.words.fill(0);
    }

    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    pub fn count(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Sets the tile and every neighbouring tile that a live cell on one of
    /// its borders could spread into next generation
    pub fn mark(&mut self, tx: usize, ty: usize, edges: TileEdges) {
        if !edges.occupied {
            return;
        }
        self.set(tx, ty);

        let west = tx.checked_sub(1);
        let east = (tx + 1 < self.cols).then_some(tx + 1);
        let north = ty.checked_sub(1);
        let south = (ty + 1 < self.rows).then_some(ty + 1);

        let mut neighbour = |hit: bool, x: Option<usize>, y: Option<usize>| {
            if let (true, Some(x), Some(y)) = (hit, x, y) {
                self.set(x, y);
            }
        };
        neighbour(edges.north, Some(tx), north);
        neighbour(edges.south, Some(tx), south);
        neighbour(edges.west, west, Some(ty));
        neighbour(edges.east, east, Some(ty));
        neighbour(edges.north_west, west, north);
        neighbour(edges.north_east, east, north);
        neighbour(edges.south_west, west, south);
        neighbour(edges.south_east, east, south);
    }

    /// Iterates the `(tx, ty)` of every set tile in row-major order
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.iter_words(|i| self.words[i])
    }

    /// Iterates the tiles set in either bitmap (which must share dimensions)
    pub fn iter_union<'a>(
        &'a self,
        other: &'a TileBitmap,
    ) -> impl Iterator<Item = (usize, usize)> + 'a {
        debug_assert_eq!(self.words.len(), other.words.len());
        self.iter_words(move |i| self.words[i] | other.words[i])
    }

    fn iter_words<'a>(
        &'a self,
        word: impl Fn(usize) -> u16 + 'a,
    ) -> impl Iterator<Item = (usize, usize)> + 'a {
        let stride = self.stride;
        (0..self.words.len()).flat_map(move |i| {
            let mut bits = word(i);
            let (ty, base) = (i / stride, (i % stride) * WORD_BITS);
            std::iter::from_fn(move || {
                if bits == 0 {
                    return None;
                }
                let lead = bits.leading_zeros() as usize;
                bits &= !(0x8000 >> lead);
                Some((base + lead, ty))
            })
        })
    }

    pub fn bytes(&self) -> usize {
        self.words.len() * std::mem::size_of::<u16>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iterates_set_tiles_in_order() {
        let mut tiles = TileBitmap::new(40, 3);
        tiles.set(33, 0);
        tiles.set(2, 2);
        tiles.set(0, 0);

        let set: Vec<_> = tiles.iter().collect();
        assert_eq!(set, vec![(0, 0), (33, 0), (2, 2)]);
        assert_eq!(tiles.count(), 3);
    }

    #[test]
    fn union_merges_both_bitmaps() {
        let mut a = TileBitmap::new(4, 4);
        let mut b = TileBitmap::new(4, 4);
        a.set(1, 1);
        b.set(1, 1);
        b.set(3, 2);

        let set: Vec<_> = a.iter_union(&b).collect();
        assert_eq!(set, vec![(1, 1), (3, 2)]);
    }

    #[test]
    fn edge_cells_mark_neighbouring_tiles() {
        let mut words = [0u16; TILE_SIZE];
        words[0] = 0x8000; // north-west corner cell
        words[7] = 0x0001; // east edge

        let mut tiles = TileBitmap::new(3, 3);
        tiles.mark(1, 1, TileEdges::from_words(&words));

        let set: Vec<_> = tiles.iter().collect();
        assert_eq!(set, vec![(0, 0), (1, 0), (0, 1), (1, 1), (2, 1)]);
    }

    #[test]
    fn marking_clips_at_bitmap_edges() {
        let mut words = [0u16; TILE_SIZE];
        words[0] = 0x8000;

        let mut tiles = TileBitmap::new(2, 2);
        tiles.mark(0, 0, TileEdges::from_words(&words));

        assert_eq!(tiles.iter().collect::<Vec<_>>(), vec![(0, 0)]);
    }

    #[test]
    fn interior_cells_mark_only_their_tile() {
        let mut words = [0u16; TILE_SIZE];
        words[5] = 0x0180;

        let mut tiles = TileBitmap::new(3, 3);
        tiles.mark(1, 1, TileEdges::from_words(&words));
        tiles.mark(2, 2, TileEdges::default());

        assert_eq!(tiles.iter().collect::<Vec<_>>(), vec![(1, 1)]);
    }
}
