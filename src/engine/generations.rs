use super::bounded::BoundedGrid;
use super::index::MooreTables;
use super::{GridState, PassResult, moore};
use crate::grid::{BitGrid, TILE_SIZE};
use std::mem;

/// The colour a cell moves to given its colour and whether the bit pass
/// left it alive
#[inline]
fn decay(colour: u8, alive: bool, max_state: u8) -> u8 {
    match colour {
        0 if alive => max_state,
        0 => 0,
        c if c == max_state && alive => max_state,
        c => c - 1,
    }
}

/// Folds the freshly computed bits into the colour grid in place.
///
/// Dying cells count down one state per generation and cannot be reborn
/// until they reach 0, so the bit grid is rewritten to hold only the cells
/// that end up in the alive state.
fn apply_decay(max_state: u8, state: &mut GridState) -> PassResult {
    let GridState {
        bits,
        tiles,
        colour,
        colour_tiles,
        next_colour_tiles,
        ..
    } = state;

    next_colour_tiles.clear_all();
    let mut result = PassResult::default();

    for (tx, ty) in colour_tiles.iter_union(tiles) {
        let x0 = tx * TILE_SIZE;
        let mut occupied = false;

        for y in ty * TILE_SIZE..(ty + 1) * TILE_SIZE {
            let alive = bits.word(tx, y);
            let mut settled = 0u16;

            for (k, cell) in colour.row_mut(y)[x0..x0 + TILE_SIZE].iter_mut().enumerate() {
                let mask = BitGrid::mask(k);
                let old = *cell;
                let new = decay(old, alive & mask != 0, max_state);
                *cell = new;

                if old == max_state && new != max_state {
                    result.deaths += 1;
                }
                if new == 0 {
                    continue;
                }
                occupied = true;
                result.bbox.include(x0 + k, y);
                if new == max_state {
                    settled |= mask;
                    result.births += u32::from(old == 0);
                }
            }

            bits.set_word(tx, y, settled);
            result.population += settled.count_ones();
        }

        if occupied {
            next_colour_tiles.set(tx, ty);
        }
    }
    mem::swap(colour_tiles, next_colour_tiles);

    result.alive = result.population > 0;
    result.decaying = !result.bbox.is_empty();
    result
}

/// One Generations step: a two-state pass over the alive cells, then decay.
/// Statistics are always collected since the decay pass visits every
/// occupied cell anyway.
pub(super) fn step(
    tables: &MooreTables,
    state: &mut GridState,
    boundary: Option<&BoundedGrid>,
    max_state: u8,
) {
    if !state.generations_alive {
        state.apply(PassResult::default(), true);
        return;
    }

    // with nothing alive only the decay runs, over the all-dead bit grid
    if state.anything_alive {
        if let Some(boundary) = boundary {
            boundary.pre_process_bits(state);
        }
        moore::next_generation(tables.table_for(state.generation), state, false);
        state.swap_bits();
    }

    let result = apply_decay(max_state, state);
    state.apply(result, true);

    if let Some(boundary) = boundary {
        let trim = boundary.post_process(state, max_state);
        if trim.removed > 0 {
            state.births = state.births.saturating_sub(trim.removed);
            state.recount(max_state);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ColourMode;
    use crate::engine::rule::MooreRule;

    #[test]
    fn decay_counts_down_to_dead() {
        assert_eq!(decay(0, true, 3), 3);
        assert_eq!(decay(0, false, 3), 0);
        assert_eq!(decay(3, true, 3), 3);
        assert_eq!(decay(3, false, 3), 2);
        assert_eq!(decay(2, true, 3), 1);
        assert_eq!(decay(1, true, 3), 0);
    }

    #[test]
    fn births_on_decaying_cells_are_dropped() {
        // B1/S/3: every cell next to an alive one is born
        let rule = MooreRule::life_like(1 << 1, 0);
        let tables = MooreTables::new(&rule);
        let mut state = GridState::new(32, 32, ColourMode::Single);
        state.bits.set(10, 10, true);
        state.colour.set(10, 10, 2);
        state.colour.set(11, 10, 1);
        state.rebuild_tiles();
        state.recount(2);

        step(&tables, &mut state, None, 2);

        // the alive cell dies and decays, its dying neighbour is not reborn
        assert_eq!(state.colour.get(10, 10), 1);
        assert_eq!(state.colour.get(11, 10), 0);
        assert!(!state.bits.get(11, 10));
        assert_eq!(state.colour.get(9, 9), 2);
        assert!(state.bits.get(9, 9));
        assert_eq!(state.population, 7);
        assert_eq!(state.births, 7);
        assert_eq!(state.deaths, 1);
    }

    #[test]
    fn decaying_cells_keep_the_pattern_running() {
        let tables = MooreTables::new(&MooreRule::life_like(0, 0));
        let mut state = GridState::new(32, 32, ColourMode::Single);
        state.bits.set(5, 5, true);
        state.colour.set(5, 5, 3);
        state.rebuild_tiles();
        state.recount(3);

        step(&tables, &mut state, None, 3);
        assert!(!state.anything_alive);
        assert!(state.generations_alive);
        assert_eq!(state.colour.get(5, 5), 2);

        step(&tables, &mut state, None, 3);
        step(&tables, &mut state, None, 3);
        assert!(!state.generations_alive);
        assert_eq!(state.colour.get(5, 5), 0);
        assert!(state.colour_tiles.is_empty());
    }
}
