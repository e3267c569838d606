//! Finite grids with wrapping edges.
//!
//! A bounded grid is a rectangle centred in the (larger) engine grid. Before
//! each generation a halo around the rectangle is filled with copies of the
//! cells the topology joins to each edge, so the ordinary unbounded rule
//! pass sees the right neighbours. Afterwards everything outside the
//! rectangle is cleared again.

use super::GridState;
use crate::grid::{BitGrid, BoundingBox, ColourGrid, TILE_SIZE};
use std::ops::RangeInclusive;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    Horizontal,
    Vertical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topology {
    /// Hard edges, nothing wraps
    Plane,
    /// Opposite edges joined. Crossing the top or bottom edge moves
    /// `shift_x` columns, crossing the left or right edge moves `shift_y`
    /// rows; at most one of them should be non-zero.
    Torus { shift_x: i32, shift_y: i32 },
    /// Like a torus, but the `twist` edges are joined with the other axis
    /// reversed: [`Axis::Horizontal`] mirrors columns when crossing the top
    /// or bottom edge
    Klein { twist: Axis },
    /// Both pairs of edges joined reversed
    CrossSurface,
    /// Adjacent edges joined: top to left and bottom to right. Needs a
    /// square rectangle.
    Sphere,
}

impl Topology {
    /// Numeric code for the topology; `-1` denotes an unbounded grid
    pub fn code(&self) -> i32 {
        match self {
            Self::Plane => 0,
            Self::Torus { .. } => 1,
            Self::Klein { .. } => 2,
            Self::CrossSurface => 3,
            Self::Sphere => 4,
        }
    }
}

#[inline]
fn wrap(c: i32, size: i32) -> i32 {
    c.rem_euclid(size)
}

/// A bounded rectangle and how its edges join.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoundedGrid {
    width: u32,
    height: u32,
    topology: Topology,
}

impl BoundedGrid {
    /// A sphere takes `width` for both sides
    pub fn new(width: u32, height: u32, topology: Topology) -> Self {
        let height = match topology {
            Topology::Sphere => width,
            _ => height,
        };
        Self {
            width: width.max(1),
            height: height.max(1),
            topology,
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }
    #[inline]
    pub fn topology(&self) -> Topology {
        self.topology
    }

    /// Shrinks the rectangle to at most `width`x`height`
    pub(super) fn clamped(&self, width: usize, height: usize) -> Self {
        let clamp = |side: u32, limit: usize| side.min(limit as u32);
        Self::new(
            clamp(self.width, width),
            clamp(self.height, height),
            self.topology,
        )
    }

    /// The rectangle inside a `grid_width`x`grid_height` grid
    pub fn rect(&self, grid_width: usize, grid_height: usize) -> BoundingBox {
        let (w, h) = (self.width as i32, self.height as i32);
        let left = (grid_width as i32 - w) / 2;
        let bottom = (grid_height as i32 - h) / 2;
        BoundingBox::new(left, bottom, left + w - 1, bottom + h - 1)
    }

    /// The cell inside the rectangle that the cell at rectangle-relative
    /// `(u, v)` (normally just outside it) is joined to, or [`None`] if the
    /// topology leaves it dead
    pub fn source(&self, u: i32, v: i32) -> Option<(i32, i32)> {
        let (w, h) = (self.width as i32, self.height as i32);
        let outside_u = !(0..w).contains(&u);
        let outside_v = !(0..h).contains(&v);

        let joined = match self.topology {
            Topology::Plane => None,
            Topology::Torus { shift_x, shift_y } => {
                let (mut u, mut v) = (u, v);
                if u < 0 {
                    (u, v) = (u + w, v - shift_y);
                } else if u >= w {
                    (u, v) = (u - w, v + shift_y);
                }
                if v < 0 {
                    (u, v) = (u - shift_x, v + h);
                } else if v >= h {
                    (u, v) = (u + shift_x, v - h);
                }
                Some((wrap(u, w), wrap(v, h)))
            }
            Topology::Klein {
                twist: Axis::Horizontal,
            } => {
                let u = wrap(u, w);
                match outside_v {
                    true => Some((w - 1 - u, wrap(v, h))),
                    false => Some((u, v)),
                }
            }
            Topology::Klein {
                twist: Axis::Vertical,
            } => {
                let v = wrap(v, h);
                match outside_u {
                    true => Some((wrap(u, w), h - 1 - v)),
                    false => Some((u, v)),
                }
            }
            // a corner cell crosses both of its edges in turn, which
            // reflects it through the corner
            Topology::CrossSurface | Topology::Sphere => {
                let (mut u, mut v) = (u, v);
                for _ in 0..2 {
                    if (0..w).contains(&u) && (0..h).contains(&v) {
                        break;
                    }
                    (u, v) = self.cross_edge(u, v);
                }
                Some((u, v))
            }
        };
        joined.filter(|&(x, y)| (0..w).contains(&x) && (0..h).contains(&y))
    }

    /// Carries a cell over one edge of a cross-surface or sphere
    fn cross_edge(&self, u: i32, v: i32) -> (i32, i32) {
        let (w, h) = (self.width as i32, self.height as i32);
        match self.topology {
            Topology::Sphere if v < 0 => (-v - 1, u),
            Topology::Sphere if v >= h => (w - 1 - (v - h), u),
            Topology::Sphere if u < 0 => (v, -u - 1),
            Topology::Sphere => (v, h - 1 - (u - w)),
            _ if !(0..w).contains(&u) => (wrap(u, w), h - 1 - v),
            _ => (w - 1 - u, wrap(v, h)),
        }
    }

    /// Fills the depth-1 halo of the bit grid and schedules the tiles it
    /// touches. Returns the number of halo cells made alive.
    pub(super) fn pre_process_bits(&self, state: &mut GridState) -> u32 {
        let rect = self.rect(state.width, state.height);
        let GridState { bits, tiles, .. } = state;
        let (cols, rows) = (tiles.cols(), tiles.rows());
        fill_halo(self, &rect, 1, bits, |x, y| {
            for ty in tile_span(y, rows) {
                for tx in tile_span(x, cols) {
                    tiles.set(tx, ty);
                }
            }
        })
    }

    /// Fills a depth-`range` halo of the colour grid
    pub(super) fn pre_process_colours(&self, state: &mut GridState, range: i32, max_state: u8) {
        let rect = self.rect(state.width, state.height);
        let mut cells = Colours {
            grid: &mut state.colour,
            max_state,
        };
        fill_halo(self, &rect, range, &mut cells, |_, _| {});
    }

    /// Clears the depth-2 ring around the rectangle in the freshly swapped
    /// current grids.
    ///
    /// `survivors` counts removed cells that were also alive in the previous
    /// generation (halo copies that stayed alive), so the caller can correct
    /// births and deaths.
    pub(super) fn post_process(&self, state: &mut GridState, max_state: u8) -> Trim {
        let rect = self.rect(state.width, state.height);
        let GridState {
            bits,
            next_bits,
            colour,
            ..
        } = state;

        let mut trim = Trim::default();
        for_each_ring_cell(&rect, 2, |x, y| {
            let (x, y) = (x as usize, y as usize);
            if bits.get(x, y) {
                trim.removed += 1;
                trim.survivors += u32::from(next_bits.get(x, y));
                bits.set(x, y, false);
            }
        });
        if colour.is_allocated() {
            clear_outside(&rect, 2, &mut Colours {
                grid: colour,
                max_state,
            });
        }
        trim
    }

    /// Clears the colour halo written by [`BoundedGrid::pre_process_colours`]
    pub(super) fn clear_halo(&self, state: &mut GridState, range: i32, max_state: u8) {
        let rect = self.rect(state.width, state.height);
        clear_outside(&rect, range, &mut Colours {
            grid: &mut state.colour,
            max_state,
        });
    }
}

/// Cells removed by [`BoundedGrid::post_process`]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(super) struct Trim {
    pub removed: u32,
    pub survivors: u32,
}

/// Cell access for halo filling and clearing
pub(super) trait HaloCells {
    fn is_alive(&self, x: usize, y: usize) -> bool;
    fn revive(&mut self, x: usize, y: usize);
    /// Clears the cell, returning whether it was alive
    fn kill(&mut self, x: usize, y: usize) -> bool;
}

impl HaloCells for BitGrid {
    fn is_alive(&self, x: usize, y: usize) -> bool {
        self.get(x, y)
    }
    fn revive(&mut self, x: usize, y: usize) {
        self.set(x, y, true);
    }
    fn kill(&mut self, x: usize, y: usize) -> bool {
        let alive = self.get(x, y);
        self.set(x, y, false);
        alive
    }
}

/// A colour grid seen as alive (maximum state) or not
pub(super) struct Colours<'a> {
    pub grid: &'a mut ColourGrid,
    pub max_state: u8,
}

impl HaloCells for Colours<'_> {
    fn is_alive(&self, x: usize, y: usize) -> bool {
        self.grid.get(x, y) == self.max_state
    }
    fn revive(&mut self, x: usize, y: usize) {
        self.grid.set(x, y, self.max_state);
    }
    fn kill(&mut self, x: usize, y: usize) -> bool {
        let alive = self.is_alive(x, y);
        self.grid.set(x, y, 0);
        alive
    }
}

/// Tiles whose cells neighbour column (or row) `c`
fn tile_span(c: usize, limit: usize) -> RangeInclusive<usize> {
    c.saturating_sub(1) / TILE_SIZE..=((c + 1) / TILE_SIZE).min(limit - 1)
}

/// Visits every cell within `depth` outside `rect`
pub(super) fn for_each_ring_cell(rect: &BoundingBox, depth: i32, mut visit: impl FnMut(i32, i32)) {
    for y in rect.bottom - depth..=rect.top + depth {
        if (rect.bottom..=rect.top).contains(&y) {
            for x in (rect.left - depth..rect.left).chain(rect.right + 1..=rect.right + depth) {
                visit(x, y);
            }
        } else {
            for x in rect.left - depth..=rect.right + depth {
                visit(x, y);
            }
        }
    }
}

/// Copies the alive state of each joined cell into the halo around `rect`,
/// calling `touched` for every halo cell revived. Returns how many were.
fn fill_halo<C: HaloCells>(
    bounded: &BoundedGrid,
    rect: &BoundingBox,
    depth: i32,
    cells: &mut C,
    mut touched: impl FnMut(usize, usize),
) -> u32 {
    if bounded.topology == Topology::Plane {
        return 0;
    }
    let mut revived = 0;
    for_each_ring_cell(rect, depth, |x, y| {
        let Some((u, v)) = bounded.source(x - rect.left, y - rect.bottom) else {
            return;
        };
        let (sx, sy) = ((u + rect.left) as usize, (v + rect.bottom) as usize);
        if cells.is_alive(sx, sy) {
            let (x, y) = (x as usize, y as usize);
            cells.revive(x, y);
            touched(x, y);
            revived += 1;
        }
    });
    revived
}

/// Kills every cell within `depth` outside `rect`, returning how many were
/// alive
pub(super) fn clear_outside<C: HaloCells>(rect: &BoundingBox, depth: i32, cells: &mut C) -> u32 {
    let mut removed = 0;
    for_each_ring_cell(rect, depth, |x, y| {
        removed += u32::from(cells.kill(x as usize, y as usize));
    });
    removed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn torus_wraps_both_axes() {
        let torus = BoundedGrid::new(8, 6, Topology::Torus { shift_x: 0, shift_y: 0 });
        assert_eq!(torus.source(-1, 2), Some((7, 2)));
        assert_eq!(torus.source(8, 2), Some((0, 2)));
        assert_eq!(torus.source(3, -1), Some((3, 5)));
        assert_eq!(torus.source(-1, -1), Some((7, 5)));
        assert_eq!(torus.source(8, 6), Some((0, 0)));
    }

    #[test]
    fn shifted_torus_slides_along_the_edge() {
        let torus = BoundedGrid::new(8, 6, Topology::Torus { shift_x: 2, shift_y: 0 });
        assert_eq!(torus.source(3, 6), Some((5, 0)));
        assert_eq!(torus.source(3, -1), Some((1, 5)));
        assert_eq!(torus.source(7, 6), Some((1, 0)));
    }

    #[test]
    fn klein_bottle_mirrors_the_twisted_edge() {
        let klein = BoundedGrid::new(8, 6, Topology::Klein { twist: Axis::Horizontal });
        assert_eq!(klein.source(1, -1), Some((6, 5)));
        assert_eq!(klein.source(1, 6), Some((6, 0)));
        assert_eq!(klein.source(-1, 2), Some((7, 2)));

        let klein = BoundedGrid::new(8, 6, Topology::Klein { twist: Axis::Vertical });
        assert_eq!(klein.source(-1, 1), Some((7, 4)));
        assert_eq!(klein.source(2, -1), Some((2, 5)));
    }

    #[test]
    fn cross_surface_reflects_corners() {
        let cross = BoundedGrid::new(8, 6, Topology::CrossSurface);
        assert_eq!(cross.source(-1, 1), Some((7, 4)));
        assert_eq!(cross.source(2, 6), Some((5, 0)));
        assert_eq!(cross.source(-1, -1), Some((0, 0)));
        assert_eq!(cross.source(8, -1), Some((7, 0)));
        assert_eq!(cross.source(8, 6), Some((7, 5)));
        assert_eq!(cross.source(-2, 7), Some((1, 4)));
    }

    #[test]
    fn sphere_joins_adjacent_edges() {
        let sphere = BoundedGrid::new(6, 99, Topology::Sphere);
        assert_eq!(sphere.height(), 6);
        assert_eq!(sphere.source(2, -1), Some((0, 2)));
        assert_eq!(sphere.source(-1, 2), Some((2, 0)));
        assert_eq!(sphere.source(2, 6), Some((5, 2)));
        assert_eq!(sphere.source(6, 2), Some((2, 5)));
        assert_eq!(sphere.source(6, 6), Some((5, 5)));
        assert_eq!(sphere.source(-1, -1), Some((0, 0)));
        assert_eq!(sphere.source(6, -1), Some((5, 0)));
        assert_eq!(sphere.source(-1, 6), Some((0, 5)));
    }

    #[test]
    fn plane_joins_nothing() {
        let plane = BoundedGrid::new(8, 6, Topology::Plane);
        assert_eq!(plane.source(-1, 0), None);
        assert_eq!(plane.source(3, 6), None);
    }

    #[test]
    fn rect_is_centred() {
        let bounded = BoundedGrid::new(10, 6, Topology::Plane);
        assert_eq!(bounded.rect(64, 32), BoundingBox::new(27, 13, 36, 18));
    }

    #[test]
    fn ring_visits_each_cell_once() {
        let rect = BoundingBox::new(5, 5, 8, 7);
        let mut seen = Vec::new();
        for_each_ring_cell(&rect, 2, |x, y| seen.push((x, y)));
        assert_eq!(seen.len(), 8 * 7 - 4 * 3);
        assert!(seen.iter().all(|&(x, y)| !rect.contains(x, y)));
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), 8 * 7 - 4 * 3);
    }

    #[test]
    fn halo_copies_and_clears() {
        let bounded = BoundedGrid::new(8, 8, Topology::Torus { shift_x: 0, shift_y: 0 });
        let rect = bounded.rect(32, 32);
        let mut grid = BitGrid::new(32, 32);
        grid.set(rect.left as usize, rect.bottom as usize, true);

        let mut touched = 0;
        let revived = fill_halo(&bounded, &rect, 1, &mut grid, |_, _| touched += 1);
        // the corner cell shows up beyond the right edge, the top edge and the far corner
        assert_eq!((revived, touched), (3, 3));
        assert!(grid.get(rect.right as usize + 1, rect.bottom as usize));
        assert!(grid.get(rect.left as usize, rect.top as usize + 1));
        assert!(grid.get(rect.right as usize + 1, rect.top as usize + 1));

        assert_eq!(clear_outside(&rect, 2, &mut grid), 3);
        assert_eq!(grid.count(), 1);
    }
}
