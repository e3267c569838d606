//! The simulation engine.
//!
//! A [`LifeEngine`] owns every buffer of one pattern: two bit grids that swap
//! roles each generation, their tile occupancy bitmaps, the colour grid used
//! by multi-state rules, and the snapshot history. An external driver calls
//! [`LifeEngine::step`] (or [`LifeEngine::run_to`]) and reads the results
//! back; nothing here decides when to advance.

mod bounded;
mod generations;
mod growth;
mod index;
mod ltl;
mod moore;
mod rule;
mod snapshot;
mod window;


pub use self::bounded::{Axis, BoundedGrid, Topology};
pub use self::rule::{LtlRule, MooreRule, Neighbourhood, Rule};
pub use self::snapshot::{Snapshot, SnapshotConfig, SnapshotManager};
pub use self::window::GridWindow;

use self::index::MooreTables;
use self::ltl::LtlScratch;
use crate::Pos2;
use crate::grid::{BitGrid, BoundingBox, BoxTracker, ColourGrid, TILE_SIZE, TileBitmap, TileEdges};
use log::{debug, trace};
use std::mem;

/// Grids are never smaller than this, so growth offsets stay word aligned
const MIN_GRID_SIZE: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Largest width or height the grid may grow to (a power of two)
    pub max_grid_size: usize,
    /// Smallest width or height allocated for a pattern
    pub min_grid_size: usize,
    pub snapshots: SnapshotConfig,
    /// Population samples kept before recording stops
    pub max_samples: usize,
}

impl EngineConfig {
    /// Power-of-two grid dimension holding `cells`, within the configured limits
    fn grid_size(&self, cells: usize) -> usize {
        let min = self.min_grid_size.max(MIN_GRID_SIZE).next_power_of_two();
        cells.next_power_of_two().max(min).min(self.max_grid_size.max(min))
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_grid_size: 8192,
            min_grid_size: MIN_GRID_SIZE,
            snapshots: SnapshotConfig::default(),
            max_samples: 1 << 20,
        }
    }
}

/// Population counters for one generation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenerationStats {
    pub generation: u64,
    pub population: u32,
    pub births: u32,
    pub deaths: u32,
}

/// Allocation accounting, for diagnostics only
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoryStats {
    /// Buffer (re)allocations since the engine was created
    pub allocations: usize,
    /// Bytes currently held
    pub bytes: usize,
}

impl MemoryStats {
    fn record(&mut self, bytes: usize) {
        self.allocations += 1;
        self.bytes = bytes;
    }

    fn combined(&self, other: MemoryStats) -> Self {
        Self {
            allocations: self.allocations + other.allocations,
            bytes: self.bytes + other.bytes,
        }
    }
}

/// Outcome of one rule pass over the next buffers
#[derive(Debug, Default)]
struct PassResult {
    population: u32,
    births: u32,
    deaths: u32,
    bbox: BoxTracker,
    /// Any cell in the alive state
    alive: bool,
    /// Any cell in a non-dead state
    decaying: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColourMode {
    None,
    /// Updated in place (Generations)
    Single,
    /// Double buffered (LTL)
    Double,
}

impl ColourMode {
    fn for_rule(rule: &Rule) -> Self {
        match rule {
            Rule::Life(_) => Self::None,
            Rule::Generations { .. } => Self::Single,
            Rule::Ltl(_) => Self::Double,
        }
    }
}

/// Every buffer and counter that snapshots capture and growth re-centres
#[derive(Debug)]
struct GridState {
    width: usize,
    height: usize,
    colour_mode: ColourMode,

    bits: BitGrid,
    next_bits: BitGrid,
    tiles: TileBitmap,
    next_tiles: TileBitmap,
    colour: ColourGrid,
    next_colour: ColourGrid,
    colour_tiles: TileBitmap,
    next_colour_tiles: TileBitmap,

    generation: u64,
    population: u32,
    births: u32,
    deaths: u32,
    anything_alive: bool,
    generations_alive: bool,

    zoom_box: BoundingBox,
    initial_box: BoundingBox,
    history_box: BoundingBox,
    /// Grid position of the pattern's `(0, 0)`
    origin: Pos2,
}

impl GridState {
    fn new(width: usize, height: usize, colour_mode: ColourMode) -> Self {
        let colour = |allocate: bool| match allocate {
            true => ColourGrid::new(width, height),
            false => ColourGrid::empty(),
        };
        let centre = BoundingBox::centre_of(width, height);
        Self {
            width,
            height,
            colour_mode,
            bits: BitGrid::new(width, height),
            next_bits: BitGrid::new(width, height),
            tiles: TileBitmap::for_grid(width, height),
            next_tiles: TileBitmap::for_grid(width, height),
            colour: colour(colour_mode != ColourMode::None),
            next_colour: colour(colour_mode == ColourMode::Double),
            colour_tiles: TileBitmap::for_grid(width, height),
            next_colour_tiles: TileBitmap::for_grid(width, height),
            generation: 0,
            population: 0,
            births: 0,
            deaths: 0,
            anything_alive: false,
            generations_alive: false,
            zoom_box: centre,
            initial_box: centre,
            history_box: centre,
            origin: Pos2::zero(),
        }
    }

    #[inline]
    fn in_bounds(&self, pos: Pos2) -> bool {
        (0..self.width as i32).contains(&pos.x) && (0..self.height as i32).contains(&pos.y)
    }

    fn bytes(&self) -> usize {
        self.bits.bytes()
            + self.next_bits.bytes()
            + self.colour.bytes()
            + self.next_colour.bytes()
            + self.tiles.bytes() * 4
    }

    fn swap_bits(&mut self) {
        mem::swap(&mut self.bits, &mut self.next_bits);
        mem::swap(&mut self.tiles, &mut self.next_tiles);
    }

    fn swap_colour(&mut self) {
        mem::swap(&mut self.colour, &mut self.next_colour);
        mem::swap(&mut self.colour_tiles, &mut self.next_colour_tiles);
    }

    /// Sets the cell at grid position `pos`; positions off the grid are ignored
    fn place(&mut self, pos: Pos2, state: u8, max_state: u8) {
        if !self.in_bounds(pos) {
            return;
        }
        let (x, y) = (pos.x as usize, pos.y as usize);
        let state = state.min(max_state);
        self.bits.set(x, y, state == max_state);
        if self.colour.is_allocated() {
            self.colour.set(x, y, state);
        }
    }

    /// Recomputes both current tile bitmaps from the grids
    fn rebuild_tiles(&mut self) {
        self.tiles.clear_all();
        self.colour_tiles.clear_all();
        for ty in 0..self.tiles.rows() {
            for tx in 0..self.tiles.cols() {
                let edges = TileEdges::from_words(&self.bits.tile(tx, ty));
                self.tiles.mark(tx, ty, edges);
                if self.colour.is_allocated() && self.colour.tile_occupied(tx, ty) {
                    self.colour_tiles.set(tx, ty);
                }
            }
        }
    }

    /// Rescans the authoritative grid for the bounding box, population and
    /// alive flags
    fn recount(&mut self, max_state: u8) {
        let mut tracker = BoxTracker::default();
        let mut population = 0;
        if self.colour.is_allocated() {
            for (tx, ty) in self.colour_tiles.iter() {
                for y in ty * TILE_SIZE..(ty + 1) * TILE_SIZE {
                    for x in tx * TILE_SIZE..(tx + 1) * TILE_SIZE {
                        match self.colour.get(x, y) {
                            0 => {}
                            state => {
                                tracker.include(x, y);
                                population += u32::from(state == max_state);
                            }
                        }
                    }
                }
            }
        } else {
            for (tx, ty) in self.tiles.iter() {
                for y in ty * TILE_SIZE..(ty + 1) * TILE_SIZE {
                    let word = self.bits.word(tx, y);
                    if word != 0 {
                        tracker.include_word(tx, y, word);
                        population += word.count_ones();
                    }
                }
            }
        }
        self.population = population;
        self.anything_alive = population > 0;
        self.generations_alive = !tracker.is_empty();
        self.zoom_box = tracker.finish(self.width, self.height);
    }

    fn apply(&mut self, result: PassResult, stats: bool) {
        if stats {
            self.population = result.population;
            self.births = result.births;
            self.deaths = result.deaths;
        }
        self.anything_alive = result.alive;
        self.generations_alive = result.decaying;
        self.zoom_box = result.bbox.finish(self.width, self.height);
    }

    /// Reallocates at a larger size with the old content in the centre
    fn resize(&mut self, width: usize, height: usize) {
        let dx = ((width - self.width) / 2) as i32;
        let dy = ((height - self.height) / 2) as i32;
        let shift = |mut bbox: BoundingBox| {
            bbox.translate(dx, dy);
            bbox
        };

        let mut grown = GridState::new(width, height, self.colour_mode);
        grown.bits.copy_centred_from(&self.bits);
        grown.colour.copy_centred_from(&self.colour);
        grown.rebuild_tiles();

        grown.generation = self.generation;
        grown.population = self.population;
        grown.births = self.births;
        grown.deaths = self.deaths;
        grown.anything_alive = self.anything_alive;
        grown.generations_alive = self.generations_alive;
        grown.zoom_box = shift(self.zoom_box);
        grown.initial_box = shift(self.initial_box);
        grown.history_box = shift(self.history_box);
        grown.origin = self.origin + Pos2::new(dx, dy);

        *self = grown;
    }

    /// Clears every cell outside `rect`
    fn retain_within(&mut self, rect: &BoundingBox) {
        for ty in 0..self.tiles.rows() {
            for tx in 0..self.tiles.cols() {
                for y in ty * TILE_SIZE..(ty + 1) * TILE_SIZE {
                    for x in tx * TILE_SIZE..(tx + 1) * TILE_SIZE {
                        if !rect.contains(x as i32, y as i32) {
                            self.bits.set(x, y, false);
                            if self.colour.is_allocated() {
                                self.colour.set(x, y, 0);
                            }
                        }
                    }
                }
            }
        }
    }

    fn sample(&self) -> GenerationStats {
        GenerationStats {
            generation: self.generation,
            population: self.population,
            births: self.births,
            deaths: self.deaths,
        }
    }
}

/// The rule evaluation strategy, with its precomputed tables or buffers
#[derive(Debug)]
enum Kernel {
    Life(MooreTables),
    Generations(MooreTables),
    Ltl { rule: LtlRule, scratch: LtlScratch },
}

impl Kernel {
    fn new(rule: &Rule, width: usize) -> Self {
        match rule {
            Rule::Life(rule) => Self::Life(MooreTables::new(rule)),
            Rule::Generations { rule, .. } => Self::Generations(MooreTables::new(rule)),
            Rule::Ltl(rule) => Self::Ltl {
                rule: *rule,
                scratch: LtlScratch::new(rule, width),
            },
        }
    }

    fn bytes(&self) -> usize {
        match self {
            Self::Life(tables) | Self::Generations(tables) => tables.bytes(),
            Self::Ltl { scratch, .. } => scratch.bytes(),
        }
    }
}

/// Simulation state for one pattern under one rule.
#[derive(Debug)]
pub struct LifeEngine {
    rule: Rule,
    kernel: Kernel,
    state: GridState,
    boundary: Option<BoundedGrid>,
    snapshots: SnapshotManager,
    samples: Vec<GenerationStats>,
    config: EngineConfig,
    memory: MemoryStats,
}

impl LifeEngine {
    /// Loads `cells` (alive, in pattern coordinates) onto a grid sized to
    /// the pattern and takes the reset snapshot
    pub fn new(rule: Rule, cells: &[Pos2], config: EngineConfig) -> Self {
        let max_state = rule.max_state();
        let states: Vec<(Pos2, u8)> = cells.iter().map(|&p| (p, max_state)).collect();
        Self::with_states(rule, &states, config)
    }

    /// Like [`LifeEngine::new`] but each cell carries its own state, so
    /// multi-state patterns can start with decaying cells
    pub fn with_states(rule: Rule, cells: &[(Pos2, u8)], config: EngineConfig) -> Self {
        let max_state = rule.max_state();
        let margin = growth::growth_margin(&rule) as usize;
        let positions: Vec<Pos2> = cells.iter().map(|&(p, _)| p).collect();
        let (lo, hi) = Pos2::extent(&positions).unwrap_or_default();
        let span = hi - lo + Pos2::one();

        let width = config.grid_size(span.x as usize + 2 * margin);
        let height = config.grid_size(span.y as usize + 2 * margin);
        let mut state = GridState::new(width, height, ColourMode::for_rule(&rule));
        state.origin = Pos2::new(
            (width as i32 - span.x) / 2 - lo.x,
            (height as i32 - span.y) / 2 - lo.y,
        );
        for &(cell, cell_state) in cells {
            state.place(cell + state.origin, cell_state, max_state);
        }
        state.rebuild_tiles();
        state.recount(max_state);

        let kernel = Kernel::new(&rule, width);
        let mut memory = MemoryStats::default();
        memory.record(state.bytes() + kernel.bytes());

        let mut engine = Self {
            rule,
            kernel,
            state,
            boundary: None,
            snapshots: SnapshotManager::new(config.snapshots),
            samples: Vec::new(),
            config,
            memory,
        };
        engine.save_reset_snapshot();
        debug!(
            "loaded {} cells onto a {width}x{height} grid",
            engine.state.population
        );
        engine
    }

    /// Builder form of [`LifeEngine::set_bounded`]
    pub fn with_bounded(mut self, boundary: BoundedGrid) -> Self {
        self.set_bounded(Some(boundary));
        self
    }

    /// Attaches (or with [`None`] detaches) a bounded topology.
    ///
    /// The grid grows until the rectangle and its halo fit, cells outside the
    /// rectangle are removed, and the current state becomes the reset point.
    /// Growth is disabled while bounded.
    pub fn set_bounded(&mut self, boundary: Option<BoundedGrid>) {
        self.boundary = None;
        if let Some(boundary) = boundary {
            let halo = 4 * self.rule.range() as usize + 4;
            let fits = |state: &GridState| {
                state.width >= boundary.width() as usize + halo
                    && state.height >= boundary.height() as usize + halo
            };
            while !fits(&self.state) && self.grow_grid() {}

            let boundary = boundary.clamped(
                self.state.width.saturating_sub(halo),
                self.state.height.saturating_sub(halo),
            );
            let max_state = self.rule.max_state();
            self.state
                .retain_within(&boundary.rect(self.state.width, self.state.height));
            self.state.rebuild_tiles();
            self.state.recount(max_state);
            self.boundary = Some(boundary);
            debug!("bounded grid {:?}", boundary);
        }
        self.save_reset_snapshot();
    }

    #[inline]
    pub fn rule(&self) -> &Rule {
        &self.rule
    }
    #[inline]
    pub fn boundary(&self) -> Option<&BoundedGrid> {
        self.boundary.as_ref()
    }
    #[inline]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
    #[inline]
    pub fn width(&self) -> usize {
        self.state.width
    }
    #[inline]
    pub fn height(&self) -> usize {
        self.state.height
    }
    #[inline]
    pub fn generation(&self) -> u64 {
        self.state.generation
    }
    #[inline]
    pub fn population(&self) -> u32 {
        self.state.population
    }
    #[inline]
    pub fn births(&self) -> u32 {
        self.state.births
    }
    #[inline]
    pub fn deaths(&self) -> u32 {
        self.state.deaths
    }
    /// Any cell in the alive state
    #[inline]
    pub fn anything_alive(&self) -> bool {
        self.state.anything_alive
    }
    /// Any cell alive or decaying
    #[inline]
    pub fn generations_alive(&self) -> bool {
        self.state.generations_alive
    }
    /// Bounding box of the current generation, in grid coordinates
    #[inline]
    pub fn zoom_box(&self) -> BoundingBox {
        self.state.zoom_box
    }
    /// Bounding box at the reset point
    #[inline]
    pub fn initial_box(&self) -> BoundingBox {
        self.state.initial_box
    }
    /// Union of every bounding box since the reset point
    #[inline]
    pub fn history_box(&self) -> BoundingBox {
        self.state.history_box
    }
    /// Grid position of the pattern's `(0, 0)`; moves when the grid grows
    #[inline]
    pub fn origin(&self) -> Pos2 {
        self.state.origin
    }
    #[inline]
    pub fn bit_grid(&self) -> &BitGrid {
        &self.state.bits
    }
    #[inline]
    pub fn colour_grid(&self) -> &ColourGrid {
        &self.state.colour
    }
    #[inline]
    pub fn tile_bitmap(&self) -> &TileBitmap {
        &self.state.tiles
    }
    #[inline]
    pub fn colour_tile_bitmap(&self) -> &TileBitmap {
        &self.state.colour_tiles
    }
    #[inline]
    pub fn samples(&self) -> &[GenerationStats] {
        &self.samples
    }
    #[inline]
    pub fn snapshots(&self) -> &SnapshotManager {
        &self.snapshots
    }

    pub fn memory(&self) -> MemoryStats {
        self.memory.combined(self.snapshots.memory())
    }

    /// Whether the stored bit grid is the complement of the displayed cells
    /// (B0 emulation)
    pub fn is_inverted(&self) -> bool {
        match &self.kernel {
            Kernel::Life(tables) => tables.is_inverted(self.state.generation),
            _ => false,
        }
    }

    /// Display state of the cell at grid position `(x, y)`: 0 or 1 for
    /// two-state rules, the colour for multi-state rules. Cells off the grid
    /// or outside a bounded rectangle are dead.
    pub fn get_state(&self, x: i32, y: i32) -> u8 {
        let state = &self.state;
        if !state.in_bounds(Pos2::new(x, y)) {
            return 0;
        }
        if let Some(boundary) = &self.boundary {
            if !boundary.rect(state.width, state.height).contains(x, y) {
                return 0;
            }
        }
        let (x, y) = (x as usize, y as usize);
        match &self.kernel {
            Kernel::Life(tables) => {
                u8::from(state.bits.get(x, y) != tables.is_inverted(state.generation))
            }
            _ => state.colour.get(x, y),
        }
    }

    /// [`LifeEngine::get_state`] in pattern coordinates
    pub fn cell_state(&self, pos: Pos2) -> u8 {
        let at = pos + self.state.origin;
        self.get_state(at.x, at.y)
    }

    /// Every stored non-dead cell with its state, in pattern coordinates,
    /// sorted row-major
    pub fn cells(&self) -> Vec<(Pos2, u8)> {
        let state = &self.state;
        let to_pattern = |x: usize, y: usize| Pos2::new(x as i32, y as i32) - state.origin;
        let mut cells = Vec::new();
        if state.colour.is_allocated() {
            for (tx, ty) in state.colour_tiles.iter() {
                for y in ty * TILE_SIZE..(ty + 1) * TILE_SIZE {
                    for x in tx * TILE_SIZE..(tx + 1) * TILE_SIZE {
                        match state.colour.get(x, y) {
                            0 => {}
                            colour => cells.push((to_pattern(x, y), colour)),
                        }
                    }
                }
            }
        } else {
            for (tx, ty) in state.tiles.iter() {
                for y in ty * TILE_SIZE..(ty + 1) * TILE_SIZE {
                    let word = state.bits.word(tx, y);
                    for x in tx * TILE_SIZE..(tx + 1) * TILE_SIZE {
                        if word & BitGrid::mask(x) != 0 {
                            cells.push((to_pattern(x, y), 1));
                        }
                    }
                }
            }
        }
        cells.sort();
        cells
    }

    /// Stored cells in the alive state, in pattern coordinates
    pub fn alive_cells(&self) -> Vec<Pos2> {
        let max_state = self.rule.max_state();
        self.cells()
            .into_iter()
            .filter(|&(_, state)| state == max_state)
            .map(|(pos, _)| pos)
            .collect()
    }

    pub fn window(&self, top_left: Pos2, bottom_right: Pos2) -> GridWindow<'_> {
        GridWindow::new(self, top_left, bottom_right)
    }

    /// Sets one cell (pattern coordinates) to `state`, clamped to the rule's
    /// states. Snapshots and samples from this generation on are dropped.
    pub fn set_cell(&mut self, pos: Pos2, state: u8) {
        let at = pos + self.state.origin;
        if !self.state.in_bounds(at) {
            return;
        }
        if let Some(boundary) = &self.boundary {
            if !boundary.rect(self.state.width, self.state.height).contains(at.x, at.y) {
                return;
            }
        }

        // inverted generations store the complement
        let state = match self.is_inverted() {
            true => u8::from(state == 0),
            false => state,
        };
        let max_state = self.rule.max_state();
        self.state.place(at, state, max_state);
        let (tx, ty) = (at.x as usize / TILE_SIZE, at.y as usize / TILE_SIZE);
        let edges = TileEdges::from_words(&self.state.bits.tile(tx, ty));
        self.state.tiles.mark(tx, ty, edges);
        if state > 0 && self.state.colour.is_allocated() {
            self.state.colour_tiles.set(tx, ty);
        }
        self.state.recount(max_state);
        self.invalidate_history();
    }

    /// Kills every cell
    pub fn clear(&mut self) {
        let state = &mut self.state;
        state.bits.clear();
        state.colour.clear();
        state.tiles.clear_all();
        state.colour_tiles.clear_all();
        state.recount(self.rule.max_state());
        self.invalidate_history();
    }

    fn invalidate_history(&mut self) {
        let generation = self.state.generation;
        self.snapshots.discard_from(generation);
        self.samples.retain(|s| s.generation < generation);
    }

    /// Advances one generation with statistics
    pub fn step(&mut self) {
        self.next_generation(true);
    }

    /// Advances one generation. With `stats` off, population, births and
    /// deaths are left stale (the alive flags and bounding box are always
    /// maintained).
    pub fn next_generation(&mut self, stats: bool) {
        if self.boundary.is_none() && self.needs_growth() {
            self.grow_grid();
        }
        let edge = match self.boundary {
            None => self.hard_edge_cells(),
            Some(_) => Vec::new(),
        };

        let boundary = self.boundary.as_ref();
        match &mut self.kernel {
            Kernel::Life(tables) => moore::step(tables, &mut self.state, boundary, stats),
            Kernel::Generations(tables) => {
                generations::step(tables, &mut self.state, boundary, self.rule.max_state())
            }
            Kernel::Ltl { rule, scratch } => {
                ltl::step(rule, scratch, &mut self.state, boundary, stats)
            }
        }
        self.state.generation += 1;

        if self.boundary.is_none() {
            self.clear_hard_edge(&edge, stats);
        }
        self.record(stats);
    }

    /// Per-generation bookkeeping: history box, samples and checkpoints
    fn record(&mut self, stats: bool) {
        let state = &mut self.state;
        if state.generations_alive {
            state.history_box = state.history_box.union(&state.zoom_box);
        }
        if stats
            && self.samples.len() < self.config.max_samples
            && self
                .samples
                .last()
                .is_none_or(|s| s.generation < state.generation)
        {
            self.samples.push(state.sample());
        }
        // counts are stale without statistics
        if stats && self.snapshots.is_due(state.generation) {
            self.snapshots.save(state);
        }
        trace!(
            "generation {}: population {} (+{} -{})",
            state.generation, state.population, state.births, state.deaths
        );
    }

    /// Checkpoints the current state regardless of the interval
    pub fn save_snapshot(&mut self) {
        self.snapshots.save(&self.state);
    }

    /// Makes the current state the reset point, dropping all other
    /// snapshots and samples
    pub fn save_reset_snapshot(&mut self) {
        let state = &mut self.state;
        state.initial_box = state.zoom_box;
        state.history_box = state.zoom_box;
        self.snapshots.set_reset(state);
        self.samples.clear();
        self.samples.push(state.sample());
    }

    /// Restores the latest snapshot at or before `target`. Returns `false`
    /// (leaving the state untouched) if there is none. Samples after the
    /// restored generation are dropped.
    pub fn restore_snapshot_before(&mut self, target: u64) -> bool {
        if !self.restore_before(target) {
            return false;
        }
        let generation = self.state.generation;
        self.samples.retain(|s| s.generation <= generation);
        true
    }

    fn restore_before(&mut self, target: u64) -> bool {
        let Some(snapshot) = self.snapshots.snapshot_before(target) else {
            debug!("no snapshot at or before generation {target}");
            return false;
        };
        snapshot.restore(&mut self.state);
        debug!(
            "restored generation {} for target {target}",
            self.state.generation
        );
        true
    }

    /// Rewinds to the reset snapshot
    pub fn reset_to_start(&mut self) {
        if let Some(snapshot) = self.snapshots.reset_snapshot() {
            snapshot.restore(&mut self.state);
            self.state.history_box = self.state.initial_box;
            let generation = self.state.generation;
            self.samples.retain(|s| s.generation <= generation);
        }
    }

    /// Brings the state to exactly `target`.
    ///
    /// Going backwards restores the nearest earlier snapshot and drops the
    /// samples after `target`. The replay runs with statistics disabled,
    /// except for the final generation and those due a checkpoint.
    /// Does nothing if no snapshot is available.
    pub fn run_to(&mut self, target: u64) {
        if target < self.state.generation {
            if !self.restore_before(target) {
                return;
            }
            // samples up to the target were recorded on the way out
            self.samples.retain(|s| s.generation <= target);
        }
        while self.state.generation + 1 < target {
            // checkpoints need exact counts
            let due = self.snapshots.is_due(self.state.generation + 1);
            self.next_generation(due);
        }
        if self.state.generation < target {
            self.next_generation(true);
        }
    }
}
