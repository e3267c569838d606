/// The number of permutations for a 3x3 grid of cells
pub const PERMUTATIONS: usize = 1 << 9;

/// Bit of the centre cell in a 3x3 window index.
///
/// Rows are packed top to bottom (`y - 1` in bits 8..6), and within a row
/// the leftmost cell is the most significant bit.
pub const CENTRE: usize = 0b000_010_000;

/// A two-state rule over the 3x3 Moore window.
///
/// Stored as the full 512-entry map so that non-totalistic rules decoded
/// elsewhere can be supplied as well as plain birth/survival counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MooreRule {
    map: [bool; PERMUTATIONS],
}

impl MooreRule {
    /// Builds a rule from a predicate over 9-bit window indices
    pub fn from_fn(mut next_state: impl FnMut(usize) -> bool) -> Self {
        let mut map = [false; PERMUTATIONS];
        for (i, entry) in map.iter_mut().enumerate() {
            *entry = next_state(i);
        }
        Self { map }
    }

    /// Outer-totalistic rule: bit `n` of `birth` (`survival`) set means a dead
    /// (live) cell with `n` live neighbours is alive next generation
    pub fn life_like(birth: u16, survival: u16) -> Self {
        Self::from_fn(|i| {
            let neighbours = (i & !CENTRE).count_ones();
            let mask = if i & CENTRE != 0 { survival } else { birth };
            mask & (1 << neighbours) != 0
        })
    }

    /// B3/S23
    pub fn conway() -> Self {
        Self::life_like(1 << 3, (1 << 2) | (1 << 3))
    }

    #[inline]
    pub fn next_state(&self, index: usize) -> bool {
        self.map[index]
    }

    /// B0: an empty neighbourhood gives birth
    #[inline]
    pub fn births_on_empty(&self) -> bool {
        self.map[0]
    }

    /// S8: a full neighbourhood survives
    #[inline]
    pub fn survives_when_full(&self) -> bool {
        self.map[PERMUTATIONS - 1]
    }
}

impl Default for MooreRule {
    fn default() -> Self {
        Self::conway()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Neighbourhood {
    /// The full `(2R+1)x(2R+1)` square
    Moore,
    /// Cells within Manhattan distance `R`
    VonNeumann,
    /// Cells with `dx² + dy² <= R² + R`
    Circular,
}

/// A Larger than Life rule.
///
/// `birth` and `survival` are inclusive neighbour-count intervals; the count
/// only considers cells in the alive (maximum) state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LtlRule {
    pub range: u32,
    /// Total number of states, 2 for a rule without decay
    pub states: u8,
    /// Whether a cell counts itself
    pub include_middle: bool,
    pub birth: (u32, u32),
    pub survival: (u32, u32),
    pub neighbourhood: Neighbourhood,
}

impl LtlRule {
    #[inline]
    pub fn max_state(&self) -> u8 {
        self.states.max(2) - 1
    }

    #[inline]
    pub fn born(&self, count: u32) -> bool {
        (self.birth.0..=self.birth.1).contains(&count)
    }

    #[inline]
    pub fn survives(&self, count: u32) -> bool {
        (self.survival.0..=self.survival.1).contains(&count)
    }

    /// Half-width of the neighbourhood on each row offset `-R..=R`
    pub fn row_widths(&self) -> Vec<usize> {
        let r = self.range as i64;
        (-r..=r)
            .map(|dy| {
                let half = match self.neighbourhood {
                    Neighbourhood::Moore => r,
                    Neighbourhood::VonNeumann => r - dy.abs(),
                    Neighbourhood::Circular => (r * r + r - dy * dy).isqrt(),
                };
                half as usize
            })
            .collect()
    }

    /// Cells in the neighbourhood, including the middle
    pub fn neighbourhood_size(&self) -> u32 {
        self.row_widths().iter().map(|&w| 2 * w as u32 + 1).sum()
    }
}

/// A rule descriptor as handed over by the pattern loader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule {
    /// Two-state 3x3 rule
    Life(MooreRule),
    /// 3x3 rule whose cells decay through `states - 2` ageing states after
    /// failing to survive
    Generations { rule: MooreRule, states: u8 },
    /// Range-R neighbour-count rule
    Ltl(LtlRule),
}

impl Rule {
    /// State of a cell that is alive: 1 for two-state rules
    pub fn max_state(&self) -> u8 {
        match self {
            Self::Life(_) => 1,
            Self::Generations { states, .. } => states.saturating_sub(1).max(1),
            Self::Ltl(rule) => rule.max_state(),
        }
    }

    /// Neighbourhood radius
    pub fn range(&self) -> u32 {
        match self {
            Self::Ltl(rule) => rule.range.max(1),
            _ => 1,
        }
    }

    /// Whether the colour grid, rather than the bit grid, is authoritative
    pub fn uses_colour(&self) -> bool {
        !matches!(self, Self::Life(_))
    }
}

impl Default for Rule {
    fn default() -> Self {
        Self::Life(MooreRule::conway())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_value(alive: bool, neighbors: usize) -> usize {
        const NEIGHBOR_BITS: [usize; 8] = [
            0b000_000_001,
            0b000_000_010,
            0b000_000_100,
            0b000_001_000,
            0b000_100_000,
            0b001_000_000,
            0b010_000_000,
            0b100_000_000,
        ];

        let mut value = if alive { CENTRE } else { 0 };
        for bit in NEIGHBOR_BITS.iter().take(neighbors) {
            value |= bit;
        }
        value
    }

    #[test]
    fn rules_match_conway_life() {
        let rule = MooreRule::conway();

        assert!(rule.next_state(grid_value(true, 2)));
        assert!(rule.next_state(grid_value(true, 3)));
        assert!(rule.next_state(grid_value(false, 3)));

        assert!(!rule.next_state(grid_value(true, 0)));
        assert!(!rule.next_state(grid_value(true, 1)));
        assert!(!rule.next_state(grid_value(true, 4)));
        assert!(!rule.next_state(grid_value(false, 2)));
        assert!(!rule.next_state(grid_value(false, 4)));
        assert!(!rule.births_on_empty());
    }

    #[test]
    fn b0_and_s8_flags() {
        let rule = MooreRule::life_like(0b1001, 0b1_0000_0000);

        assert!(rule.births_on_empty());
        assert!(rule.survives_when_full());
    }

    #[test]
    fn neighbourhood_sizes() {
        let ltl = |neighbourhood| LtlRule {
            range: 2,
            states: 2,
            include_middle: true,
            birth: (1, 1),
            survival: (1, 1),
            neighbourhood,
        };

        assert_eq!(ltl(Neighbourhood::Moore).neighbourhood_size(), 25);
        assert_eq!(ltl(Neighbourhood::VonNeumann).neighbourhood_size(), 13);
        // r² + r = 6 admits (±2, ±1) but not (±2, ±2)
        assert_eq!(ltl(Neighbourhood::Circular).neighbourhood_size(), 21);
    }

    #[test]
    fn max_states() {
        assert_eq!(Rule::default().max_state(), 1);
        let brain = Rule::Generations {
            rule: MooreRule::life_like(1 << 2, 0),
            states: 3,
        };
        assert_eq!(brain.max_state(), 2);
        assert!(brain.uses_colour());
    }
}
