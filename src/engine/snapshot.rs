//! Checkpoints for rewinding.
//!
//! A [`Snapshot`] stores only the occupied tiles of each grid, so a sparse
//! pattern on a large grid stays cheap. The [`SnapshotManager`] keeps a
//! reset point plus a rolling history bounded by a byte budget.

use super::{GridState, MemoryStats};
use crate::Pos2;
use crate::grid::{BoundingBox, TILE_SIZE, TileBitmap};
use log::debug;
use std::collections::VecDeque;

/// Recycled snapshots kept for reuse after eviction
const SPARE_SNAPSHOTS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotConfig {
    pub enabled: bool,
    /// Generations between automatic snapshots
    pub interval: u64,
    /// Bytes the history may hold before the oldest snapshots are evicted
    pub budget_bytes: usize,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval: 50,
            budget_bytes: 32 << 20,
        }
    }
}

/// The state of one generation, restricted to occupied tiles.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    generation: u64,
    width: usize,
    height: usize,
    tiles: TileBitmap,
    /// `TILE_SIZE` words per set tile, in tile iteration order
    words: Vec<u16>,
    colour_tiles: TileBitmap,
    /// `TILE_SIZE²` cells per set colour tile
    colours: Vec<u8>,
    zoom_box: BoundingBox,
    origin: Pos2,
    population: u32,
    births: u32,
    deaths: u32,
    anything_alive: bool,
    generations_alive: bool,
}

impl Snapshot {
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }
    #[inline]
    pub fn population(&self) -> u32 {
        self.population
    }

    pub fn bytes(&self) -> usize {
        size_of::<Self>()
            + self.words.len() * size_of::<u16>()
            + self.colours.len()
            + self.tiles.bytes()
            + self.colour_tiles.bytes()
    }

    /// Overwrites this snapshot with `state`, reusing its buffers
    pub(super) fn capture(&mut self, state: &GridState) {
        self.generation = state.generation;
        self.width = state.width;
        self.height = state.height;

        self.tiles.clone_from(&state.tiles);
        self.words.clear();
        for (tx, ty) in state.tiles.iter() {
            self.words.extend_from_slice(&state.bits.tile(tx, ty));
        }

        self.colour_tiles.clone_from(&state.colour_tiles);
        self.colours.clear();
        if state.colour.is_allocated() {
            for (tx, ty) in state.colour_tiles.iter() {
                let x = tx * TILE_SIZE;
                for y in ty * TILE_SIZE..(ty + 1) * TILE_SIZE {
                    self.colours
                        .extend_from_slice(&state.colour.row(y)[x..x + TILE_SIZE]);
                }
            }
        }

        self.zoom_box = state.zoom_box;
        self.origin = state.origin;
        self.population = state.population;
        self.births = state.births;
        self.deaths = state.deaths;
        self.anything_alive = state.anything_alive;
        self.generations_alive = state.generations_alive;
    }

    /// Replaces every buffer of `state` with this snapshot, centred if the
    /// grid has grown since it was taken
    pub(super) fn restore(&self, state: &mut GridState) {
        state.bits.clear();
        state.next_bits.clear();
        state.colour.clear();
        state.next_colour.clear();
        state.tiles.clear_all();
        state.next_tiles.clear_all();
        state.colour_tiles.clear_all();
        state.next_colour_tiles.clear_all();

        let dx = (state.width - self.width) / 2;
        let dy = (state.height - self.height) / 2;
        let (tdx, tdy) = (dx / TILE_SIZE, dy / TILE_SIZE);

        for ((tx, ty), words) in self.tiles.iter().zip(self.words.chunks_exact(TILE_SIZE)) {
            let (tx, ty) = (tx + tdx, ty + tdy);
            for (r, &word) in words.iter().enumerate() {
                state.bits.set_word(tx, ty * TILE_SIZE + r, word);
            }
            state.tiles.set(tx, ty);
        }

        let cells = self.colour_tiles.iter().zip(self.colours.chunks_exact(TILE_SIZE * TILE_SIZE));
        for ((tx, ty), tile) in cells {
            let (x, ty) = ((tx + tdx) * TILE_SIZE, ty + tdy);
            for (r, row) in tile.chunks_exact(TILE_SIZE).enumerate() {
                state.colour.row_mut(ty * TILE_SIZE + r)[x..x + TILE_SIZE].copy_from_slice(row);
            }
            state.colour_tiles.set(tx + tdx, ty);
        }

        if (dx, dy) != (0, 0) {
            // bitmaps of the smaller grid do not line up after centring
            state.rebuild_tiles();
        }

        state.generation = self.generation;
        state.population = self.population;
        state.births = self.births;
        state.deaths = self.deaths;
        state.anything_alive = self.anything_alive;
        state.generations_alive = self.generations_alive;
        state.zoom_box = self.zoom_box;
        state.zoom_box.translate(dx as i32, dy as i32);
        state.origin = self.origin + Pos2::new(dx as i32, dy as i32);
    }
}

/// The reset snapshot plus a byte-budgeted history in generation order.
#[derive(Debug, Default)]
pub struct SnapshotManager {
    config: SnapshotConfig,
    reset: Option<Snapshot>,
    history: VecDeque<Snapshot>,
    spare: Vec<Snapshot>,
    /// Bytes held by `history`
    bytes: usize,
    allocations: usize,
}

impl SnapshotManager {
    pub fn new(config: SnapshotConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn config(&self) -> &SnapshotConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn bytes(&self) -> usize {
        self.bytes
    }

    pub fn reset_snapshot(&self) -> Option<&Snapshot> {
        self.reset.as_ref()
    }

    /// Generations currently held in the history, oldest first
    pub fn generations(&self) -> impl Iterator<Item = u64> + '_ {
        self.history.iter().map(Snapshot::generation)
    }

    pub fn memory(&self) -> MemoryStats {
        MemoryStats {
            allocations: self.allocations,
            bytes: self.bytes + self.reset.as_ref().map_or(0, Snapshot::bytes),
        }
    }

    fn latest_generation(&self) -> Option<u64> {
        self.history
            .back()
            .or(self.reset.as_ref())
            .map(Snapshot::generation)
    }

    /// Whether an automatic snapshot should be taken at `generation`
    pub fn is_due(&self, generation: u64) -> bool {
        self.config.enabled
            && self.config.interval > 0
            && generation % self.config.interval == 0
            && self.latest_generation().is_none_or(|latest| latest < generation)
    }

    /// The newest snapshot at or before `target`, falling back to the reset
    /// snapshot
    pub fn snapshot_before(&self, target: u64) -> Option<&Snapshot> {
        self.history
            .iter()
            .rev()
            .find(|s| s.generation <= target)
            .or(self.reset.as_ref().filter(|s| s.generation <= target))
    }

    /// Drops the whole history, keeping the reset snapshot
    pub fn reset(&mut self) {
        while let Some(snapshot) = self.history.pop_front() {
            self.recycle(snapshot);
        }
        self.bytes = 0;
    }

    /// Drops every history snapshot at `generation` or later
    pub fn discard_from(&mut self, generation: u64) {
        while self.history.back().is_some_and(|s| s.generation >= generation) {
            if let Some(snapshot) = self.history.pop_back() {
                self.bytes -= snapshot.bytes();
                self.recycle(snapshot);
            }
        }
    }

    /// Appends a snapshot of `state`, evicting the oldest ones to stay within
    /// budget. A snapshot larger than the whole budget is not kept.
    pub(super) fn save(&mut self, state: &GridState) {
        self.discard_from(state.generation);
        let mut snapshot = self.take_spare();
        snapshot.capture(state);

        let size = snapshot.bytes();
        if size > self.config.budget_bytes {
            debug!(
                "snapshot at generation {} ({size} bytes) exceeds the budget",
                state.generation
            );
            self.recycle(snapshot);
            return;
        }
        while self.bytes + size > self.config.budget_bytes {
            let Some(oldest) = self.history.pop_front() else {
                break;
            };
            debug!("evicting snapshot at generation {}", oldest.generation);
            self.bytes -= oldest.bytes();
            self.recycle(oldest);
        }

        self.bytes += size;
        self.history.push_back(snapshot);
    }

    /// Replaces the reset snapshot and clears the history
    pub(super) fn set_reset(&mut self, state: &GridState) {
        self.reset();
        let mut snapshot = self.reset.take().unwrap_or_else(|| self.take_spare());
        snapshot.capture(state);
        self.reset = Some(snapshot);
    }

    fn take_spare(&mut self) -> Snapshot {
        self.spare.pop().unwrap_or_else(|| {
            self.allocations += 1;
            Snapshot::default()
        })
    }

    fn recycle(&mut self, snapshot: Snapshot) {
        if self.spare.len() < SPARE_SNAPSHOTS {
            self.spare.push(snapshot);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ColourMode;

    fn state_at(generation: u64) -> GridState {
        let mut state = GridState::new(32, 32, ColourMode::None);
        state.bits.set(3, 4, true);
        state.bits.set(20, 30, true);
        state.rebuild_tiles();
        state.recount(1);
        state.generation = generation;
        state
    }

    fn manager(budget_bytes: usize) -> SnapshotManager {
        SnapshotManager::new(SnapshotConfig {
            enabled: true,
            interval: 10,
            budget_bytes,
        })
    }

    #[test]
    fn only_occupied_tiles_are_stored() {
        let mut snapshot = Snapshot::default();
        snapshot.capture(&state_at(0));
        assert_eq!(snapshot.words.len(), 2 * TILE_SIZE);
        assert!(snapshot.colours.is_empty());
    }

    #[test]
    fn restore_into_a_grown_grid_centres_the_cells() {
        let mut snapshot = Snapshot::default();
        snapshot.capture(&state_at(7));

        let mut state = GridState::new(64, 64, ColourMode::None);
        snapshot.restore(&mut state);
        assert_eq!(state.generation, 7);
        assert_eq!(state.population, 2);
        assert!(state.bits.get(3 + 16, 4 + 16));
        assert!(state.bits.get(20 + 16, 30 + 16));
        assert_eq!(state.origin, Pos2::new(16, 16));
        assert_eq!(state.zoom_box, BoundingBox::new(19, 20, 36, 46));
    }

    #[test]
    fn due_only_on_new_interval_generations() {
        let mut manager = manager(1 << 20);
        manager.set_reset(&state_at(0));
        assert!(!manager.is_due(0));
        assert!(!manager.is_due(5));
        assert!(manager.is_due(10));
        manager.save(&state_at(10));
        assert!(!manager.is_due(10));
        assert!(manager.is_due(20));
    }

    #[test]
    fn finds_the_latest_snapshot_before_a_target() {
        let mut manager = manager(1 << 20);
        manager.set_reset(&state_at(0));
        for generation in [10, 20, 30] {
            manager.save(&state_at(generation));
        }
        assert_eq!(manager.snapshot_before(25).map(Snapshot::generation), Some(20));
        assert_eq!(manager.snapshot_before(30).map(Snapshot::generation), Some(30));
        assert_eq!(manager.snapshot_before(9).map(Snapshot::generation), Some(0));

        manager.discard_from(20);
        assert_eq!(manager.generations().collect::<Vec<_>>(), vec![10]);
    }

    #[test]
    fn evicts_oldest_when_over_budget() {
        let mut probe = Snapshot::default();
        probe.capture(&state_at(0));
        let mut manager = manager(probe.bytes() * 2);

        for generation in [10, 20, 30] {
            manager.save(&state_at(generation));
        }
        assert_eq!(manager.generations().collect::<Vec<_>>(), vec![20, 30]);
        assert!(manager.bytes() <= probe.bytes() * 2);
    }

    #[test]
    fn oversized_snapshots_are_skipped() {
        let mut manager = manager(16);
        manager.save(&state_at(10));
        assert!(manager.is_empty());
        assert_eq!(manager.bytes(), 0);
    }

    #[test]
    fn reset_keeps_the_reset_snapshot() {
        let mut manager = manager(1 << 20);
        manager.set_reset(&state_at(0));
        manager.save(&state_at(10));
        manager.reset();
        assert!(manager.is_empty());
        assert_eq!(manager.snapshot_before(100).map(Snapshot::generation), Some(0));
    }
}
