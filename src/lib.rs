//! Bit-packed cellular automaton engine for Life-like, Generations and
//! Larger than Life rules on a growable or bounded grid.

pub mod engine;
pub mod grid;
pub mod pos;

pub use engine::{
    Axis, BoundedGrid, EngineConfig, GenerationStats, GridWindow, LifeEngine, LtlRule,
    MemoryStats, MooreRule, Neighbourhood, Rule, Snapshot, SnapshotConfig, SnapshotManager,
    Topology,
};
pub use grid::BoundingBox;
pub use pos::Pos2;
