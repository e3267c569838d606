use std::{
    cmp::Ordering,
    ops::{Add, Neg, Sub},
};

/// A cell coordinate, either relative to a pattern's origin or absolute
/// within the engine's grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pos2 {
    pub x: i32,
    pub y: i32,
}
impl Pos2 {
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
    #[inline]
    pub const fn zero() -> Self {
        Self::new(0, 0)
    }
    #[inline]
    pub const fn one() -> Self {
        Self::new(1, 1)
    }

    /// Component-wise minimum
    #[inline]
    pub fn min(self, other: Self) -> Self {
        Self::new(self.x.min(other.x), self.y.min(other.y))
    }
    /// Component-wise maximum
    #[inline]
    pub fn max(self, other: Self) -> Self {
        Self::new(self.x.max(other.x), self.y.max(other.y))
    }

    /// The smallest and largest corner covering every position, or [`None`]
    /// for an empty slice
    pub fn extent(cells: &[Pos2]) -> Option<(Pos2, Pos2)> {
        let (&first, rest) = cells.split_first()?;
        Some(
            rest.iter()
                .fold((first, first), |(lo, hi), &p| (lo.min(p), hi.max(p))),
        )
    }
}
impl Default for Pos2 {
    #[inline]
    fn default() -> Self {
        Self::zero()
    }
}
impl From<(i32, i32)> for Pos2 {
    #[inline]
    fn from((x, y): (i32, i32)) -> Self {
        Self::new(x, y)
    }
}
impl PartialOrd for Pos2 {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for Pos2 {
    #[inline]
    fn cmp(&self, other: &Self) -> Ordering {
        // row-major: y first, then x
        Ord::cmp(&self.y, &other.y).then(Ord::cmp(&self.x, &other.x))
    }
}
impl Neg for Pos2 {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self::Output {
        Self::new(-self.x, -self.y)
    }
}
impl Add for Pos2 {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self::Output {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}
impl Sub for Pos2 {
    type Output = Pos2;

    #[inline]
    fn sub(self, rhs: Self) -> Self::Output {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orders_row_major() {
        let mut cells = vec![Pos2::new(3, 1), Pos2::new(0, 2), Pos2::new(1, 1)];
        cells.sort();

        assert_eq!(cells, vec![Pos2::new(1, 1), Pos2::new(3, 1), Pos2::new(0, 2)]);
    }

    #[test]
    fn extent_covers_all_cells() {
        let cells = [Pos2::new(4, -2), Pos2::new(-1, 5), Pos2::new(2, 2)];

        assert_eq!(
            Pos2::extent(&cells),
            Some((Pos2::new(-1, -2), Pos2::new(4, 5)))
        );
        assert_eq!(Pos2::extent(&[]), None);
    }
}
