//! Two-dimensional cell arrays indexed by `(x, y)`.
//!
//! Values are stored in file order: rows of constant `y`, with `x` varying
//! fastest. Callers always address cells as `(x, y)`, so the storage order
//! never leaks into the API.

use crate::error::{EnsimError, EnsimResult};

/// A rectangular `nx` by `ny` array of cell values.
#[derive(Debug, Clone, PartialEq)]
pub struct GridArray<T = f64> {
    nx: usize,
    ny: usize,
    data: Vec<T>,
}

impl<T: Copy> GridArray<T> {
    /// Create an array with every cell set to `value`.
    pub fn filled(nx: usize, ny: usize, value: T) -> Self {
        Self {
            nx,
            ny,
            data: vec![value; nx * ny],
        }
    }

    /// Create an array from values in file order (y-major, x fastest).
    pub fn from_rows(nx: usize, ny: usize, data: Vec<T>) -> EnsimResult<Self> {
        if data.len() != nx * ny {
            return Err(EnsimError::InvalidArgument(format!(
                "expected {} values for a {}x{} grid, got {}",
                nx * ny,
                nx,
                ny,
                data.len()
            )));
        }
        Ok(Self { nx, ny, data })
    }

    /// Create an array by evaluating `f(x, y)` for every cell.
    pub fn from_fn(nx: usize, ny: usize, f: impl Fn(usize, usize) -> T) -> Self {
        let mut data = Vec::with_capacity(nx * ny);
        for y in 0..ny {
            for x in 0..nx {
                data.push(f(x, y));
            }
        }
        Self { nx, ny, data }
    }

    pub fn nx(&self) -> usize {
        self.nx
    }

    pub fn ny(&self) -> usize {
        self.ny
    }

    /// Total number of cells.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Value at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if the index is outside the array.
    pub fn get(&self, x: usize, y: usize) -> T {
        assert!(
            x < self.nx && y < self.ny,
            "cell ({x}, {y}) outside {}x{} grid",
            self.nx,
            self.ny
        );
        self.data[y * self.nx + x]
    }

    /// Value at `(x, y)`, or `None` outside the array.
    pub fn try_get(&self, x: usize, y: usize) -> Option<T> {
        if x < self.nx && y < self.ny {
            Some(self.data[y * self.nx + x])
        } else {
            None
        }
    }

    pub fn set(&mut self, x: usize, y: usize, value: T) {
        assert!(
            x < self.nx && y < self.ny,
            "cell ({x}, {y}) outside {}x{} grid",
            self.nx,
            self.ny
        );
        self.data[y * self.nx + x] = value;
    }

    /// One row of constant `y`, ordered by `x`.
    pub fn row(&self, y: usize) -> &[T] {
        &self.data[y * self.nx..(y + 1) * self.nx]
    }

    /// Rows in file order.
    pub fn rows(&self) -> impl Iterator<Item = &[T]> {
        self.data.chunks(self.nx.max(1))
    }

    /// Values in file order.
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Iterate `(x, y, value)` in file order.
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize, T)> + '_ {
        let nx = self.nx.max(1);
        self.data
            .iter()
            .enumerate()
            .map(move |(i, &v)| (i % nx, i / nx, v))
    }

    /// Apply `f` to every cell.
    pub fn map<U: Copy>(&self, f: impl Fn(T) -> U) -> GridArray<U> {
        GridArray {
            nx: self.nx,
            ny: self.ny,
            data: self.data.iter().map(|&v| f(v)).collect(),
        }
    }

    /// Whether `other` has the same dimensions.
    pub fn same_shape<U>(&self, other: &GridArray<U>) -> bool {
        self.nx == other.nx && self.ny == other.ny
    }
}
