//! Cell storage: the bit-packed alive grid, the per-cell colour grid, the
//! tile occupancy bitmap and bounding boxes.

mod bbox;
mod bits;
mod colour;
mod tiles;

pub use self::bbox::{BoundingBox, BoxTracker};
pub use self::bits::BitGrid;
pub use self::colour::ColourGrid;
pub use self::tiles::{TileBitmap, TileEdges};

/// Number of cells packed into one [`BitGrid`] word
pub const WORD_BITS: usize = 16;

/// Tiles are `2^TILE_POWER` cells square
pub const TILE_POWER: u32 = 4;

/// Edge length of a tile in cells. A tile column is exactly one word wide.
pub const TILE_SIZE: usize = 1 << TILE_POWER;

const _: () = assert!(TILE_SIZE == WORD_BITS);
