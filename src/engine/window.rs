use super::LifeEngine;
use crate::Pos2;

/// A rectangular view of the stored cells, in pattern coordinates.
/// `br` is exclusive.
pub struct GridWindow<'a> {
    tl: Pos2,
    br: Pos2,
    engine: &'a LifeEngine,
}
impl<'a> GridWindow<'a> {
    pub fn new(engine: &'a LifeEngine, top_left: Pos2, bottom_right: Pos2) -> Self {
        Self {
            tl: top_left,
            br: bottom_right,
            engine,
        }
    }

    /// Non-dead cells inside the window with their states, row-major
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (Pos2, u8)> + use<'a> {
        let rx = self.tl.x..self.br.x;
        let ry = self.tl.y..self.br.y;
        self.engine
            .cells()
            .into_iter()
            .filter(move |(pos, _)| rx.contains(&pos.x) && ry.contains(&pos.y))
    }

    fn glyph(&self, state: u8) -> char {
        match self.engine.rule().max_state() {
            max if state == max => '█',
            max if u16::from(state) * 2 > u16::from(max) => '▓',
            _ => '░',
        }
    }
}

impl std::fmt::Display for GridWindow<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut last = self.tl - Pos2 { x: 1, y: 0 };
        for (cell, state) in self.iter() {
            // determine the number of lines to print
            let lines = cell.y - last.y;
            // determine the number of padding spaces to print
            let padding = match lines {
                0 => cell.x - last.x - 1,
                _ => cell.x - self.tl.x,
            };
            write!(
                f,
                "{0:\n<1$}{0: <2$}{3}",
                "",
                lines as usize,
                padding as usize,
                self.glyph(state)
            )?;
            last = cell;
        }
        Ok(())
    }
}
