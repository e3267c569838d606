use super::rule::{MooreRule, PERMUTATIONS};
use std::fmt;

/// Bits in a composite lookup index: three rows of a 6-cell window
pub(super) const WINDOW_BITS: u32 = 18;
const WINDOW_ENTRIES: usize = 1 << WINDOW_BITS;
const ROW_MASK: usize = 0b11_1111;

/// Lookup table over a 6x3 window producing the next state of its 4 middle
/// cells.
///
/// The index is `top << 12 | middle << 6 | bottom`, each row holding 6 cells
/// with the leftmost in the high bit. The 4-bit result has the leftmost
/// output cell in bit 3.
pub struct LookupTable {
    entries: Box<[u8]>,
}

impl LookupTable {
    /// Pre-combines a 512-entry 3x3 map into the 6x3 table
    pub fn from_map(next_state: impl Fn(usize) -> bool) -> Self {
        let mut entries = vec![0u8; WINDOW_ENTRIES].into_boxed_slice();
        for (index, entry) in entries.iter_mut().enumerate() {
            let top = (index >> 12) & ROW_MASK;
            let middle = (index >> 6) & ROW_MASK;
            let bottom = index & ROW_MASK;

            // output bit `shift` is the cell whose 3x3 window starts at bit `shift + 2`
            for shift in 0..4 {
                let cell = (((top >> shift) & 0b111) << 6)
                    | (((middle >> shift) & 0b111) << 3)
                    | ((bottom >> shift) & 0b111);
                if next_state(cell) {
                    *entry |= 1 << shift;
                }
            }
        }
        Self { entries }
    }

    #[inline]
    pub fn lookup(&self, index: usize) -> u8 {
        self.entries[index]
    }

    pub fn bytes(&self) -> usize {
        self.entries.len()
    }
}

impl fmt::Debug for LookupTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LookupTable")
            .field("entries", &self.entries.len())
            .finish()
    }
}

/// How the stored grid relates to the true cell states under a B0 rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inversion {
    /// Stored cells are the true cells
    None,
    /// B0 without S8: the background flips every generation, so odd
    /// generations are stored complemented
    OddGenerations,
    /// B0 with S8: the background is born in generation 1 and never dies,
    /// so every generation after the first is stored complemented
    AfterFirst,
}

/// The lookup tables for one 3x3 rule.
///
/// Rules without B0 use a single table. B0 rules are emulated on a stored
/// grid whose background is always dead: without S8 the table alternates by
/// generation parity, even generations using `!R(i)` and odd ones `R(!i)`.
/// With S8 the loaded pattern is advanced once with `!R(i)` and every later
/// generation with `!R(!i)`.
#[derive(Debug)]
pub struct MooreTables {
    even: LookupTable,
    odd: Option<LookupTable>,
    /// Advances generation 0 when it differs from `even`
    first: Option<LookupTable>,
    inversion: Inversion,
}

impl MooreTables {
    pub fn new(rule: &MooreRule) -> Self {
        const ALL: usize = PERMUTATIONS - 1;

        match (rule.births_on_empty(), rule.survives_when_full()) {
            (false, _) => Self {
                even: LookupTable::from_map(|i| rule.next_state(i)),
                odd: None,
                first: None,
                inversion: Inversion::None,
            },
            (true, false) => Self {
                even: LookupTable::from_map(|i| !rule.next_state(i)),
                odd: Some(LookupTable::from_map(|i| rule.next_state(!i & ALL))),
                first: None,
                inversion: Inversion::OddGenerations,
            },
            (true, true) => Self {
                even: LookupTable::from_map(|i| !rule.next_state(!i & ALL)),
                odd: None,
                first: Some(LookupTable::from_map(|i| !rule.next_state(i))),
                inversion: Inversion::AfterFirst,
            },
        }
    }

    /// The table that advances the stored grid from `generation`
    #[inline]
    pub fn table_for(&self, generation: u64) -> &LookupTable {
        match (&self.first, &self.odd) {
            (Some(first), _) if generation == 0 => first,
            (_, Some(odd)) if generation & 1 == 1 => odd,
            _ => &self.even,
        }
    }

    /// Whether the stored grid at `generation` is the complement of the
    /// true grid
    #[inline]
    pub fn is_inverted(&self, generation: u64) -> bool {
        match self.inversion {
            Inversion::None => false,
            Inversion::OddGenerations => generation & 1 == 1,
            Inversion::AfterFirst => generation > 0,
        }
    }

    pub fn inversion(&self) -> Inversion {
        self.inversion
    }

    pub fn bytes(&self) -> usize {
        self.even.bytes()
            + self.odd.as_ref().map_or(0, LookupTable::bytes)
            + self.first.as_ref().map_or(0, LookupTable::bytes)
    }
}
