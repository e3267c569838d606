use super::bounded::BoundedGrid;
use super::rule::{LtlRule, Neighbourhood};
use super::{GridState, PassResult};
use crate::grid::{BoundingBox, ColourGrid, TILE_POWER};

/// Counting buffers reused between generations; reallocated with the grid.
#[derive(Debug, Default)]
pub(super) struct LtlScratch {
    /// Vertical window sum per column (Moore)
    columns: Vec<u32>,
    /// `2R+1` rows of horizontal prefix sums (von Neumann, circular)
    ring: Vec<u32>,
    slots: usize,
    stride: usize,
    widths: Vec<usize>,
}

impl LtlScratch {
    pub fn new(rule: &LtlRule, width: usize) -> Self {
        let slots = 2 * rule.range as usize + 1;
        let stride = width + 1;
        let ring = match rule.neighbourhood {
            Neighbourhood::Moore => Vec::new(),
            _ => vec![0; slots * stride],
        };
        Self {
            columns: vec![0; width],
            ring,
            slots,
            stride,
            widths: rule.row_widths(),
        }
    }

    pub fn bytes(&self) -> usize {
        (self.columns.len() + self.ring.len()) * size_of::<u32>()
    }
}

#[inline]
fn settle(rule: &LtlRule, max_state: u8, old: u8, count: u32) -> u8 {
    match old {
        0 if rule.born(count) => max_state,
        0 => 0,
        c if c == max_state && rule.survives(count) => max_state,
        c => c - 1,
    }
}

/// Column span a row of `region` needs counted: the region widened by
/// `range` and clipped to the grid
#[inline]
fn columns_for(region: &BoundingBox, range: usize, width: usize) -> (usize, usize) {
    let (x0, x1) = (region.left as usize, region.right as usize);
    (x0.saturating_sub(range), (x1 + range).min(width - 1))
}

/// Square neighbourhoods: running column sums slid down the region, then a
/// horizontal window slid along each row
fn count_square(
    colour: &ColourGrid,
    max_state: u8,
    range: usize,
    region: &BoundingBox,
    columns: &mut [u32],
    mut visit: impl FnMut(usize, usize, u32),
) {
    let (width, height) = (colour.width(), colour.height());
    let alive = |x: usize, y: usize| u32::from(colour.get(x, y) == max_state);
    let (x0, x1) = (region.left as usize, region.right as usize);
    let (y0, y1) = (region.bottom as usize, region.top as usize);
    let (lo, hi) = columns_for(region, range, width);

    let first = y0.saturating_sub(range)..=(y0 + range).min(height - 1);
    for x in lo..=hi {
        columns[x] = first.clone().map(|y| alive(x, y)).sum();
    }

    for y in y0..=y1 {
        if y > y0 {
            let leaving = y.checked_sub(range + 1);
            let entering = (y + range < height).then_some(y + range);
            for x in lo..=hi {
                if let Some(row) = leaving {
                    columns[x] -= alive(x, row);
                }
                if let Some(row) = entering {
                    columns[x] += alive(x, row);
                }
            }
        }

        let mut count: u32 = columns[lo..=(x0 + range).min(hi)].iter().sum();
        for x in x0..=x1 {
            if x > x0 {
                if let Some(col) = x.checked_sub(range + 1) {
                    count -= columns[col];
                }
                if x + range <= hi {
                    count += columns[x + range];
                }
            }
            visit(x, y, count);
        }
    }
}

/// Prefix sums of alive cells along row `y` over columns `lo..=hi`
fn fill_prefix(prefix: &mut [u32], colour: &ColourGrid, max_state: u8, y: usize, lo: usize, hi: usize) {
    let row = colour.row(y);
    prefix[0] = 0;
    for (i, &cell) in row[lo..=hi].iter().enumerate() {
        prefix[i + 1] = prefix[i] + u32::from(cell == max_state);
    }
}

/// Shaped neighbourhoods: each row offset contributes a prefix-sum range of
/// its own half-width. Prefix rows live in a ring indexed by `y % (2R+1)`.
fn count_shaped(
    colour: &ColourGrid,
    max_state: u8,
    region: &BoundingBox,
    scratch: &mut LtlScratch,
    mut visit: impl FnMut(usize, usize, u32),
) {
    let LtlScratch {
        ring,
        slots,
        stride,
        widths,
        ..
    } = scratch;
    let (slots, stride) = (*slots, *stride);
    let range = slots / 2;
    let height = colour.height();
    let (x0, x1) = (region.left as usize, region.right as usize);
    let (y0, y1) = (region.bottom as usize, region.top as usize);
    let (lo, hi) = columns_for(region, range, colour.width());

    let fill = |ring: &mut [u32], y: usize| {
        let slot = (y % slots) * stride;
        fill_prefix(&mut ring[slot..slot + stride], colour, max_state, y, lo, hi);
    };
    for y in y0.saturating_sub(range)..(y0 + range).min(height) {
        fill(ring.as_mut_slice(), y);
    }

    for y in y0..=y1 {
        if y + range < height {
            fill(ring.as_mut_slice(), y + range);
        }
        for x in x0..=x1 {
            let left_of = |half: usize| x.saturating_sub(half).max(lo) - lo;
            let right_of = |half: usize| (x + half).min(hi) - lo + 1;
            let mut count = 0;
            for (offset, &half) in widths.iter().enumerate() {
                let Some(row) = (y + offset).checked_sub(range).filter(|&r| r < height) else {
                    continue;
                };
                let prefix = &ring[(row % slots) * stride..];
                count += prefix[right_of(half)] - prefix[left_of(half)];
            }
            visit(x, y, count);
        }
    }
}

/// Computes `region` of the next colour grid from the current one.
///
/// The next buffers must be blank on entry; [`retire`] keeps them that way.
pub(super) fn next_generation(
    rule: &LtlRule,
    scratch: &mut LtlScratch,
    state: &mut GridState,
    region: BoundingBox,
    stats: bool,
) -> PassResult {
    let max_state = rule.max_state();
    let GridState {
        colour,
        next_colour,
        next_bits,
        next_tiles,
        next_colour_tiles,
        ..
    } = state;
    let colour: &ColourGrid = colour;

    let mut result = PassResult::default();
    let mut write = |x: usize, y: usize, count: u32| {
        let old = colour.get(x, y);
        let count = match !rule.include_middle && old == max_state {
            true => count - 1,
            false => count,
        };
        let new = settle(rule, max_state, old, count);
        if stats && old == max_state && new != max_state {
            result.deaths += 1;
        }
        if new == 0 {
            return;
        }

        let tile = (x >> TILE_POWER, y >> TILE_POWER);
        next_colour.set(x, y, new);
        next_colour_tiles.set(tile.0, tile.1);
        result.bbox.include(x, y);
        if new == max_state {
            next_bits.set(x, y, true);
            next_tiles.set(tile.0, tile.1);
            result.population += 1;
            if stats && old == 0 {
                result.births += 1;
            }
        }
    };

    match rule.neighbourhood {
        Neighbourhood::Moore => count_square(
            colour,
            max_state,
            rule.range as usize,
            &region,
            &mut scratch.columns,
            &mut write,
        ),
        _ => count_shaped(colour, max_state, &region, scratch, &mut write),
    }

    result.alive = result.population > 0;
    result.decaying = !result.bbox.is_empty();
    result
}

/// Blanks the generation that was just read, inside the box it occupied,
/// and swaps it behind the freshly computed one
pub(super) fn retire(state: &mut GridState, previous: &BoundingBox) {
    state.colour.clear_region(previous);
    state.bits.clear_region(previous);
    state.tiles.clear_all();
    state.colour_tiles.clear_all();
    state.swap_bits();
    state.swap_colour();
}

/// One Larger than Life generation over the live region (or the whole
/// bounded rectangle)
pub(super) fn step(
    rule: &LtlRule,
    scratch: &mut LtlScratch,
    state: &mut GridState,
    boundary: Option<&BoundedGrid>,
    stats: bool,
) {
    if !state.generations_alive {
        state.apply(PassResult::default(), stats);
        return;
    }

    let max_state = rule.max_state();
    let range = rule.range as i32;
    let previous = state.zoom_box;
    let region = match boundary {
        Some(boundary) => {
            boundary.pre_process_colours(state, range, max_state);
            boundary.rect(state.width, state.height)
        }
        None => previous.expand(range).clip(state.width, state.height),
    };

    let result = next_generation(rule, scratch, state, region, stats);
    if let Some(boundary) = boundary {
        boundary.clear_halo(state, range, max_state);
    }
    retire(state, &previous);
    state.apply(result, stats);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ColourMode;

    fn rule(neighbourhood: Neighbourhood) -> LtlRule {
        LtlRule {
            range: 2,
            states: 2,
            include_middle: true,
            birth: (0, u32::MAX),
            survival: (0, u32::MAX),
            neighbourhood,
        }
    }

    /// Counts reported for every cell of the region around one alive cell
    fn counts(neighbourhood: Neighbourhood) -> Vec<(usize, usize, u32)> {
        let rule = rule(neighbourhood);
        let mut colour = ColourGrid::new(32, 32);
        colour.set(10, 10, 1);
        let region = BoundingBox::new(6, 6, 14, 14);
        let mut scratch = LtlScratch::new(&rule, 32);
        let mut seen = Vec::new();
        let visit = |x, y, count| seen.push((x, y, count));
        match neighbourhood {
            Neighbourhood::Moore => count_square(&colour, 1, 2, &region, &mut scratch.columns, visit),
            _ => count_shaped(&colour, 1, &region, &mut scratch, visit),
        }
        seen
    }

    fn reached(neighbourhood: Neighbourhood) -> usize {
        counts(neighbourhood).iter().filter(|&&(_, _, c)| c == 1).count()
    }

    #[test]
    fn neighbourhood_shapes_reach_the_expected_cells() {
        assert_eq!(reached(Neighbourhood::Moore), 25);
        assert_eq!(reached(Neighbourhood::VonNeumann), 13);
        assert_eq!(reached(Neighbourhood::Circular), 21);
    }

    #[test]
    fn region_is_visited_row_by_row() {
        let seen = counts(Neighbourhood::Moore);
        assert_eq!(seen.len(), 81);
        assert_eq!((seen[0].0, seen[0].1), (6, 6));
        assert_eq!((seen[80].0, seen[80].1), (14, 14));
    }

    #[test]
    fn retire_leaves_next_buffers_blank() {
        let rule = LtlRule {
            birth: (3, 3),
            survival: (2, 3),
            ..rule(Neighbourhood::Moore)
        };
        let mut scratch = LtlScratch::new(&rule, 32);
        let mut state = GridState::new(32, 32, ColourMode::Double);
        for x in 10..13 {
            state.colour.set(x, 10, 1);
            state.bits.set(x, 10, true);
        }
        state.rebuild_tiles();
        state.recount(1);

        step(&rule, &mut scratch, &mut state, None, true);
        assert!(state.population > 0);
        assert!((0..32).all(|y| state.next_colour.row(y).iter().all(|&c| c == 0)));
        assert_eq!(state.next_bits.count(), 0);
    }
}
