use super::bounded::BoundedGrid;
use super::index::{LookupTable, MooreTables};
use super::{GridState, PassResult};
use crate::grid::{BitGrid, TILE_SIZE, TileEdges};

/// The 18 cells of row `y` seen by word `wx`: the cell to its left, its 16
/// cells, and the cell to its right. Rows and columns off the grid are dead.
#[inline]
fn strip(grid: &BitGrid, wx: usize, y: Option<usize>) -> u32 {
    let Some(row) = y.filter(|&y| y < grid.height()).map(|y| grid.row(y)) else {
        return 0;
    };
    let left = wx.checked_sub(1).map_or(0, |l| u32::from(row[l] & 1));
    let right = row.get(wx + 1).map_or(0, |&r| u32::from(r >> 15));
    (left << 17) | (u32::from(row[wx]) << 1) | right
}

/// Next state of the 16 cells of the middle strip
#[inline]
fn evaluate(table: &LookupTable, top: u32, middle: u32, bottom: u32) -> u16 {
    let mut word = 0;
    for shift in [12, 8, 4, 0] {
        let index = (((top >> shift) & 0x3f) << 12)
            | (((middle >> shift) & 0x3f) << 6)
            | ((bottom >> shift) & 0x3f);
        word |= u16::from(table.lookup(index as usize)) << shift;
    }
    word
}

/// Applies `table` to every scheduled tile, writing the next buffers.
///
/// Only tiles set in the current bitmap are computed; the next bitmap ends
/// up holding every tile that can change in the generation after.
pub(super) fn next_generation(
    table: &LookupTable,
    state: &mut GridState,
    stats: bool,
) -> PassResult {
    let GridState {
        bits,
        next_bits,
        tiles,
        next_tiles,
        ..
    } = state;

    // the next buffer still holds the generation before last; blank the tiles
    // that this pass will not overwrite
    for (tx, ty) in next_tiles.iter() {
        if !tiles.get(tx, ty) {
            next_bits.clear_tile(tx, ty);
        }
    }
    next_tiles.clear_all();

    let mut result = PassResult::default();
    for (tx, ty) in tiles.iter() {
        let y0 = ty * TILE_SIZE;
        let mut top = strip(bits, tx, y0.checked_sub(1));
        let mut middle = strip(bits, tx, Some(y0));
        let mut out = [0u16; TILE_SIZE];

        for (r, word) in out.iter_mut().enumerate() {
            let y = y0 + r;
            let bottom = strip(bits, tx, Some(y + 1));
            *word = evaluate(table, top, middle, bottom);
            (top, middle) = (middle, bottom);

            if *word != 0 {
                result.bbox.include_word(tx, y, *word);
            }
            if stats {
                let old = bits.word(tx, y);
                result.population += word.count_ones();
                result.births += (*word & !old).count_ones();
                result.deaths += (old & !*word).count_ones();
            }
            next_bits.set_word(tx, y, *word);
        }

        let edges = TileEdges::from_words(&out);
        result.alive |= edges.occupied;
        next_tiles.mark(tx, ty, edges);
    }
    result.decaying = result.alive;
    result
}

/// One two-state generation, including the bounded halo round trip
pub(super) fn step(
    tables: &MooreTables,
    state: &mut GridState,
    boundary: Option<&BoundedGrid>,
    stats: bool,
) {
    if !state.anything_alive {
        state.apply(PassResult::default(), stats);
        return;
    }

    let halo = boundary.map_or(0, |b| b.pre_process_bits(state));
    let result = next_generation(tables.table_for(state.generation), state, stats);
    state.swap_bits();
    state.apply(result, stats);

    if let Some(boundary) = boundary {
        let trim = boundary.post_process(state, 1);
        if stats {
            state.births = state.births.saturating_sub(trim.removed - trim.survivors);
            state.deaths = state.deaths.saturating_sub(halo - trim.survivors);
        }
        if trim.removed > 0 {
            state.recount(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ColourMode;
    use crate::engine::rule::MooreRule;

    fn state_with(cells: &[(usize, usize)]) -> GridState {
        let mut state = GridState::new(32, 32, ColourMode::None);
        for &(x, y) in cells {
            state.bits.set(x, y, true);
        }
        state.rebuild_tiles();
        state.recount(1);
        state
    }

    #[test]
    fn strip_reads_neighbouring_words() {
        let mut grid = BitGrid::new(32, 32);
        grid.set(15, 3, true);
        grid.set(16, 3, true);
        grid.set(17, 3, true);
        assert_eq!(strip(&grid, 0, Some(3)), 0b10 | 1);
        assert_eq!(strip(&grid, 1, Some(3)), (1 << 17) | (0b11 << 15));
        assert_eq!(strip(&grid, 0, None), 0);
        assert_eq!(strip(&grid, 0, Some(32)), 0);
    }

    #[test]
    fn blinker_crosses_a_word_boundary() {
        let table = LookupTable::from_map(|i| MooreRule::conway().next_state(i));
        let mut state = state_with(&[(15, 8), (16, 8), (17, 8)]);
        let result = next_generation(&table, &mut state, true);
        state.swap_bits();

        assert_eq!(result.population, 3);
        assert_eq!((result.births, result.deaths), (2, 2));
        for y in 7..=9 {
            assert!(state.bits.get(16, y));
        }
        assert!(!state.bits.get(15, 8));
        assert!(!state.bits.get(17, 8));
    }

    #[test]
    fn cells_spill_into_the_next_tile() {
        let table = LookupTable::from_map(|i| MooreRule::conway().next_state(i));
        // vertical blinker on the last row of the first tile row
        let mut state = state_with(&[(4, 14), (4, 15), (4, 16)]);
        next_generation(&table, &mut state, false);
        state.swap_bits();
        assert!(state.tiles.get(0, 0));
        assert!(state.tiles.get(0, 1));
        assert!(state.bits.get(3, 15) && state.bits.get(5, 15));
    }

    #[test]
    fn stale_tiles_are_blanked_before_reuse() {
        let table = LookupTable::from_map(|i| MooreRule::conway().next_state(i));
        // a block in tile (0, 0) and a lone cell in tile (1, 1) that dies
        let mut state = state_with(&[(1, 1), (2, 1), (1, 2), (2, 2), (20, 20)]);
        for _ in 0..4 {
            let result = next_generation(&table, &mut state, true);
            state.swap_bits();
            state.apply(result, true);
        }
        assert_eq!(state.population, 4);
        assert_eq!(state.bits.count(), 4);
        assert!(!state.tiles.get(1, 1));
    }
}
