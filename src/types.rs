//! Core geometry types shared by the board, the reveal state and the solver.
//!
//! Per-cell storage is a flat `Vec` in column-major layout:
//! `cells[x * height + y]` holds cell `(x, y)`. Deterministic scans use
//! [`Dimensions::row_major`] instead, so ties resolve top row first.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A cell position, `0 <= x < width`, `0 <= y < height`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coord {
    pub x: usize,
    pub y: usize,
}

impl Coord {
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    /// The cell one column to the right, unchecked against the board edge.
    #[inline(always)]
    pub fn right(self) -> Self {
        Self::new(self.x + 1, self.y)
    }

    /// The cell one row down, unchecked against the board edge.
    #[inline(always)]
    pub fn down(self) -> Self {
        Self::new(self.x, self.y + 1)
    }
}

impl From<(usize, usize)> for Coord {
    fn from((x, y): (usize, usize)) -> Self {
        Self::new(x, y)
    }
}

impl std::fmt::Display for Coord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Board width and height. Both are always positive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: usize,
    pub height: usize,
}

impl Dimensions {
    pub fn new(width: usize, height: usize) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidDimensions { width, height });
        }
        Ok(Self { width, height })
    }

    #[inline(always)]
    pub fn cell_count(&self) -> usize {
        self.width * self.height
    }

    #[inline(always)]
    pub fn contains(&self, c: Coord) -> bool {
        c.x < self.width && c.y < self.height
    }

    /// Reject an off-board coordinate with [`Error::OutOfBounds`].
    pub fn check(&self, c: Coord) -> Result<()> {
        if self.contains(c) {
            Ok(())
        } else {
            Err(Error::OutOfBounds {
                x: c.x,
                y: c.y,
                width: self.width,
                height: self.height,
            })
        }
    }

    /// Flat storage index of an in-bounds cell.
    #[inline(always)]
    pub fn index(&self, c: Coord) -> usize {
        c.x * self.height + c.y
    }

    /// Inverse of [`Dimensions::index`].
    #[inline(always)]
    pub fn coord(&self, index: usize) -> Coord {
        Coord::new(index / self.height, index % self.height)
    }

    /// All cells, top row first, left to right within a row.
    pub fn row_major(&self) -> impl Iterator<Item = Coord> {
        let (width, height) = (self.width, self.height);
        (0..height).flat_map(move |y| (0..width).map(move |x| Coord::new(x, y)))
    }
}

/// Moore neighborhoods of every cell, clipped at the edges, built once per
/// board size.
#[derive(Clone, Debug)]
pub struct NeighborCache {
    dims: Dimensions,
    data: Vec<Coord>,
    /// Cell `i` owns `data[offsets[i]..offsets[i + 1]]`.
    offsets: Vec<usize>,
}

impl NeighborCache {
    pub fn new(dims: Dimensions) -> Self {
        let cells = dims.cell_count();
        let mut data = Vec::with_capacity(cells * 8);
        let mut offsets = Vec::with_capacity(cells + 1);

        for x in 0..dims.width {
            for y in 0..dims.height {
                offsets.push(data.len());
                for dy in -1i64..=1 {
                    for dx in -1i64..=1 {
                        let (nx, ny) = (x as i64 + dx, y as i64 + dy);
                        let inside = (0..dims.width as i64).contains(&nx)
                            && (0..dims.height as i64).contains(&ny);
                        if (dx, dy) != (0, 0) && inside {
                            data.push(Coord::new(nx as usize, ny as usize));
                        }
                    }
                }
            }
        }
        offsets.push(data.len());

        Self { dims, data, offsets }
    }

    pub fn dims(&self) -> Dimensions {
        self.dims
    }

    /// Neighbors of an in-bounds cell.
    #[inline(always)]
    pub fn get(&self, c: Coord) -> &[Coord] {
        let idx = self.dims.index(c);
        &self.data[self.offsets[idx]..self.offsets[idx + 1]]
    }
}
