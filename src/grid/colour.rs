use super::{BoundingBox, TILE_SIZE};

/// One byte of state per cell for multi-state rules.
///
/// `0` is dead, the rule's maximum state is alive and anything in between
/// is decaying. An unallocated grid (see [`ColourGrid::empty`]) is used by
/// two-state rules that never touch colour.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColourGrid {
    width: usize,
    height: usize,
    cells: Vec<u8>,
}

impl ColourGrid {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![0; width * height],
        }
    }

    #[inline]
    pub fn empty() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_allocated(&self) -> bool {
        !self.cells.is_empty()
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.cells[y * self.width + x]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, state: u8) {
        self.cells[y * self.width + x] = state;
    }

    #[inline]
    pub fn row(&self, y: usize) -> &[u8] {
        &self.cells[y * self.width..(y + 1) * self.width]
    }

    #[inline]
    pub fn row_mut(&mut self, y: usize) -> &mut [u8] {
        &mut self.cells[y * self.width..(y + 1) * self.width]
    }

    /// Whether any cell of the tile at `(tx, ty)` is non-zero
    pub fn tile_occupied(&self, tx: usize, ty: usize) -> bool {
        let x = tx * TILE_SIZE;
        (ty * TILE_SIZE..(ty + 1) * TILE_SIZE)
            .any(|y| self.row(y)[x..x + TILE_SIZE].iter().any(|&c| c != 0))
    }

    pub fn clear(&mut self) {
        self.cells.fill(0);
    }

    pub fn clear_region(&mut self, region: &BoundingBox) {
        if !self.is_allocated() {
            return;
        }
        let (left, right) = (region.left as usize, region.right as usize);
        for y in region.bottom as usize..=region.top as usize {
            self.row_mut(y)[left..=right].fill(0);
        }
    }

    /// Copies `src` into the centre of this (at least as large) grid
    pub fn copy_centred_from(&mut self, src: &ColourGrid) {
        if !src.is_allocated() {
            return;
        }
        debug_assert!(self.width >= src.width && self.height >= src.height);
        let dx = (self.width - src.width) / 2;
        let dy = (self.height - src.height) / 2;
        for y in 0..src.height {
            self.row_mut(y + dy)[dx..dx + src.width].copy_from_slice(src.row(y));
        }
    }

    pub fn bytes(&self) -> usize {
        self.cells.len()
    }
}
