use super::bounded::{self, Colours, HaloCells};
use super::ltl::LtlScratch;
use super::{Kernel, LifeEngine, Rule};
use crate::grid::BoundingBox;
use log::debug;

/// Cells kept clear between the live region and the grid edge
pub(super) fn growth_margin(rule: &Rule) -> i32 {
    match rule {
        Rule::Ltl(rule) => 2 * rule.range.max(1) as i32,
        _ => 16,
    }
}

impl LifeEngine {
    /// Whether the grid is still below the maximum size in either dimension
    pub fn can_grow(&self) -> bool {
        let max = self.config.max_grid_size;
        self.state.width < max || self.state.height < max
    }

    /// Whether the live region has come within the growth margin of an edge
    pub(super) fn needs_growth(&self) -> bool {
        let state = &self.state;
        if !state.generations_alive || !self.can_grow() {
            return false;
        }
        let margin = growth_margin(&self.rule);
        let (w, h) = (state.width as i32, state.height as i32);
        let b = state.zoom_box;
        b.left < margin || b.bottom < margin || b.right >= w - margin || b.top >= h - margin
    }

    /// Doubles the grid (up to the maximum) with the pattern re-centred.
    /// Returns `false` if the grid is already at the maximum size.
    pub fn grow_grid(&mut self) -> bool {
        let (width, height) = (self.state.width, self.state.height);
        let max = self.config.max_grid_size;
        let grown = |side: usize| (side * 2).min(max).max(side);
        let (new_width, new_height) = (grown(width), grown(height));
        if (new_width, new_height) == (width, height) {
            return false;
        }

        self.state.resize(new_width, new_height);
        if let Kernel::Ltl { rule, scratch } = &mut self.kernel {
            *scratch = LtlScratch::new(rule, new_width);
        }
        self.memory.record(self.state.bytes() + self.kernel.bytes());
        debug!(
            "grid grown from {width}x{height} to {new_width}x{new_height} at generation {}",
            self.state.generation
        );
        true
    }

    /// The region cells may occupy at the maximum size, and the depth of
    /// the band around it
    fn hard_edge(&self) -> (BoundingBox, i32) {
        let depth = self.rule.range() as i32;
        let (w, h) = (self.state.width as i32, self.state.height as i32);
        (BoundingBox::new(depth, depth, w - 1 - depth, h - 1 - depth), depth)
    }

    fn within_hard_edge(&self) -> bool {
        let (inner, _) = self.hard_edge();
        let b = self.state.zoom_box;
        inner.contains(b.left, b.bottom) && inner.contains(b.right, b.top)
    }

    fn is_alive_at(&self, x: usize, y: usize) -> bool {
        let state = &self.state;
        match state.colour.is_allocated() {
            true => state.colour.get(x, y) == self.rule.max_state(),
            false => state.bits.get(x, y),
        }
    }

    /// Alive cells already inside the edge band, taken before a generation
    /// so that [`LifeEngine::clear_hard_edge`] can tell survivors from births
    pub(super) fn hard_edge_cells(&self) -> Vec<(usize, usize)> {
        if self.can_grow() || !self.state.generations_alive || self.within_hard_edge() {
            return Vec::new();
        }
        let (inner, depth) = self.hard_edge();
        let mut cells = Vec::new();
        bounded::for_each_ring_cell(&inner, depth, |x, y| {
            let (x, y) = (x as usize, y as usize);
            if self.is_alive_at(x, y) {
                cells.push((x, y));
            }
        });
        cells
    }

    /// At the maximum size, removes cells that reach the outer band of the
    /// grid, where their neighbourhood would run off the edge. `before` lists
    /// the band's alive cells from the previous generation: removing one of
    /// those counts as a death, removing any other alive cell cancels its
    /// birth.
    pub(super) fn clear_hard_edge(&mut self, before: &[(usize, usize)], stats: bool) {
        if self.can_grow() || !self.state.generations_alive || self.within_hard_edge() {
            return;
        }
        let (inner, depth) = self.hard_edge();
        let max_state = self.rule.max_state();
        let state = &mut self.state;
        let (mut born, mut survived, mut removed) = (0, 0, 0);
        bounded::for_each_ring_cell(&inner, depth, |x, y| {
            let (x, y) = (x as usize, y as usize);
            let alive = if state.colour.is_allocated() {
                state.bits.set(x, y, false);
                removed += u32::from(state.colour.get(x, y) != 0);
                Colours {
                    grid: &mut state.colour,
                    max_state,
                }
                .kill(x, y)
            } else {
                let alive = state.bits.kill(x, y);
                removed += u32::from(alive);
                alive
            };
            match (alive, before.contains(&(x, y))) {
                (false, _) => {}
                (true, true) => survived += 1,
                (true, false) => born += 1,
            }
        });

        state.recount(max_state);
        if stats {
            state.births = state.births.saturating_sub(born);
            state.deaths += survived;
        }
        debug!(
            "cleared {removed} cells at the grid edge in generation {}",
            state.generation
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Pos2;
    use crate::engine::{EngineConfig, LtlRule, Neighbourhood};

    #[test]
    fn margins_follow_the_neighbourhood_range() {
        assert_eq!(growth_margin(&Rule::default()), 16);
        let ltl = LtlRule {
            range: 5,
            states: 2,
            include_middle: true,
            birth: (34, 45),
            survival: (34, 58),
            neighbourhood: Neighbourhood::Moore,
        };
        assert_eq!(growth_margin(&Rule::Ltl(ltl)), 10);
    }

    #[test]
    fn growth_doubles_up_to_the_maximum() {
        let config = EngineConfig {
            max_grid_size: 64,
            ..Default::default()
        };
        let mut engine = LifeEngine::new(Rule::default(), &[Pos2::zero()], config);
        assert_eq!((engine.width(), engine.height()), (64, 64));
        assert!(!engine.can_grow());
        assert!(!engine.grow_grid());

        let mut engine = LifeEngine::new(Rule::default(), &[Pos2::zero()], EngineConfig::default());
        assert_eq!(engine.width(), 64);
        assert!(engine.grow_grid());
        assert_eq!((engine.width(), engine.height()), (128, 128));
        assert_eq!(engine.memory().allocations, 3);
    }

    #[test]
    fn growth_keeps_cells_relative_to_the_pattern() {
        let cells = [Pos2::new(0, 0), Pos2::new(5, 3), Pos2::new(-2, 7)];
        let mut engine = LifeEngine::new(Rule::default(), &cells, EngineConfig::default());
        let before = engine.alive_cells();
        let origin = engine.origin();

        engine.grow_grid();
        assert_eq!(engine.alive_cells(), before);
        assert_eq!(engine.population(), 3);
        let shift = Pos2::new(engine.width() as i32 / 4, engine.height() as i32 / 4);
        assert_eq!(engine.origin(), origin + shift);
    }

    #[test]
    fn cells_at_a_full_size_edge_are_removed() {
        let config = EngineConfig {
            max_grid_size: 32,
            ..Default::default()
        };
        // a block, plus a blinker on the left edge added below
        let cells = [
            Pos2::new(10, 10),
            Pos2::new(11, 10),
            Pos2::new(10, 11),
            Pos2::new(11, 11),
        ];
        let mut engine = LifeEngine::new(Rule::default(), &cells, config);
        let origin = engine.origin();
        for y in 0..3 {
            engine.set_cell(Pos2::new(-origin.x, 4 + y), 1);
        }
        assert_eq!(engine.population(), 7);

        engine.step();
        // the blinker turns horizontal and its cell on column 0 is cleared:
        // that cell survived, so it counts as a third death
        assert!(engine.alive_cells().iter().all(|p| p.x + origin.x >= 1));
        assert_eq!(engine.population(), engine.alive_cells().len() as u32);
        assert_eq!(
            (engine.population(), engine.births(), engine.deaths()),
            (5, 1, 3)
        );
    }
}
