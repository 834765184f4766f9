//! Dense array containers for voxel, component and face data
//!
//! All arrays are stored flat in C order (last axis fastest), matching the
//! layout of the geometry datasets they are loaded from and written to.

use serde::{Deserialize, Serialize};

/// Number of elements in a `shape`, or `None` if the product overflows
pub fn element_count(shape: &[usize]) -> Option<usize> {
    shape.iter().try_fold(1_usize, |acc, &n| acc.checked_mul(n))
}

/// Dense 3D array indexed `[i][j][k]`.
///
/// Index = `(i * ny + j) * nz + k`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoxelArray<T> {
    shape: [usize; 3],
    data: Vec<T>,
}

impl<T: Copy> VoxelArray<T> {
    /// Create an array of the given shape filled with `value`
    pub fn filled(shape: [usize; 3], value: T) -> Self {
        Self {
            shape,
            data: vec![value; shape[0] * shape[1] * shape[2]],
        }
    }

    /// Wrap flat C-order data, returning `None` if the length does not match
    pub fn from_vec(shape: [usize; 3], data: Vec<T>) -> Option<Self> {
        (element_count(&shape) == Some(data.len())).then_some(Self { shape, data })
    }

    /// Array extents `[ni, nj, nk]`
    pub fn shape(&self) -> [usize; 3] {
        self.shape
    }

    /// Whether the stored data length agrees with the shape (deserialised
    /// arrays are not checked on load)
    pub fn is_well_formed(&self) -> bool {
        element_count(&self.shape) == Some(self.data.len())
    }

    #[inline]
    fn index(&self, i: usize, j: usize, k: usize) -> usize {
        debug_assert!(i < self.shape[0] && j < self.shape[1] && k < self.shape[2]);
        (i * self.shape[1] + j) * self.shape[2] + k
    }

    /// Value at `(i, j, k)`
    ///
    /// # Panics
    ///
    /// Panics if the index is out of bounds
    #[inline]
    pub fn get(&self, i: usize, j: usize, k: usize) -> T {
        self.data[self.index(i, j, k)]
    }

    /// Set the value at `(i, j, k)`
    ///
    /// # Panics
    ///
    /// Panics if the index is out of bounds
    #[inline]
    pub fn set(&mut self, i: usize, j: usize, k: usize, value: T) {
        let idx = self.index(i, j, k);
        self.data[idx] = value;
    }

    /// Flat C-order view
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Map every element into a new array of the same shape
    pub fn map<U: Copy>(&self, f: impl Fn(T) -> U) -> VoxelArray<U> {
        VoxelArray {
            shape: self.shape,
            data: self.data.iter().map(|&v| f(v)).collect(),
        }
    }

    /// Copy the box `[start, start + extent)` into a new array
    pub fn slice(&self, start: [usize; 3], extent: [usize; 3]) -> Self {
        let mut data = Vec::with_capacity(extent[0] * extent[1] * extent[2]);
        if extent[2] == 0 {
            return Self {
                shape: extent,
                data,
            };
        }
        for i in start[0]..start[0] + extent[0] {
            for j in start[1]..start[1] + extent[1] {
                let row = self.index(i, j, start[2]);
                data.extend_from_slice(&self.data[row..row + extent[2]]);
            }
        }
        Self {
            shape: extent,
            data,
        }
    }
}

/// Dense 4D array indexed `[component][i][j][k]`.
///
/// Used for per-edge rigidity flags and per-component material ids, where the
/// leading axis selects the field component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentArray<T> {
    components: usize,
    shape: [usize; 3],
    data: Vec<T>,
}

impl<T: Copy> ComponentArray<T> {
    /// Create an array with `components` leading entries, each of `shape`
    pub fn filled(components: usize, shape: [usize; 3], value: T) -> Self {
        Self {
            components,
            shape,
            data: vec![value; components * shape[0] * shape[1] * shape[2]],
        }
    }

    /// Wrap flat C-order data, returning `None` if the length does not match
    pub fn from_vec(components: usize, shape: [usize; 3], data: Vec<T>) -> Option<Self> {
        let [ni, nj, nk] = shape;
        (element_count(&[components, ni, nj, nk]) == Some(data.len())).then_some(Self {
            components,
            shape,
            data,
        })
    }

    /// Number of field components (leading axis length)
    pub fn components(&self) -> usize {
        self.components
    }

    /// Per-component spatial extents
    pub fn shape(&self) -> [usize; 3] {
        self.shape
    }

    /// Whether the stored data length agrees with the component count and shape
    pub fn is_well_formed(&self) -> bool {
        let [ni, nj, nk] = self.shape;
        element_count(&[self.components, ni, nj, nk]) == Some(self.data.len())
    }

    /// Map every element into a new array of the same layout
    pub fn map<U: Copy>(&self, f: impl Fn(T) -> U) -> ComponentArray<U> {
        ComponentArray {
            components: self.components,
            shape: self.shape,
            data: self.data.iter().map(|&v| f(v)).collect(),
        }
    }

    #[inline]
    fn index(&self, c: usize, i: usize, j: usize, k: usize) -> usize {
        debug_assert!(c < self.components);
        debug_assert!(i < self.shape[0] && j < self.shape[1] && k < self.shape[2]);
        ((c * self.shape[0] + i) * self.shape[1] + j) * self.shape[2] + k
    }

    /// Value at `(c, i, j, k)`
    #[inline]
    pub fn get(&self, c: usize, i: usize, j: usize, k: usize) -> T {
        self.data[self.index(c, i, j, k)]
    }

    /// Set the value at `(c, i, j, k)`
    #[inline]
    pub fn set(&mut self, c: usize, i: usize, j: usize, k: usize, value: T) {
        let idx = self.index(c, i, j, k);
        self.data[idx] = value;
    }

    /// Flat C-order view
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Copy the spatial box `[start, start + extent)` of every component
    pub fn slice(&self, start: [usize; 3], extent: [usize; 3]) -> Self {
        let mut data = Vec::with_capacity(self.components * extent[0] * extent[1] * extent[2]);
        if extent[2] == 0 {
            return Self {
                components: self.components,
                shape: extent,
                data,
            };
        }
        for c in 0..self.components {
            for i in start[0]..start[0] + extent[0] {
                for j in start[1]..start[1] + extent[1] {
                    let row = self.index(c, i, j, start[2]);
                    data.extend_from_slice(&self.data[row..row + extent[2]]);
                }
            }
        }
        Self {
            components: self.components,
            shape: extent,
            data,
        }
    }

    /// Overwrite the box starting at `offset` with `src`, passing each source
    /// value through `f`; entries where `f` returns `None` are left as they are
    ///
    /// The caller guarantees the component counts match and the box fits.
    pub fn copy_from<S: Copy>(
        &mut self,
        src: &ComponentArray<S>,
        offset: [usize; 3],
        f: impl Fn(S) -> Option<T>,
    ) {
        debug_assert_eq!(self.components, src.components);
        let [si, sj, sk] = src.shape;
        if sk == 0 {
            return;
        }
        for c in 0..src.components {
            for i in 0..si {
                for j in 0..sj {
                    let dst_row = self.index(c, offset[0] + i, offset[1] + j, offset[2]);
                    let src_row = src.index(c, i, j, 0);
                    for k in 0..sk {
                        if let Some(v) = f(src.data[src_row + k]) {
                            self.data[dst_row + k] = v;
                        }
                    }
                }
            }
        }
    }
}

/// Dense 2D array over the cells of a planar face.
///
/// Stored row-major with the first in-plane axis major: index = `a * cols + b`.
/// For an x-normal face the axes are `(y, z)`, for y-normal `(x, z)`, for
/// z-normal `(x, y)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceArray<T> {
    rows: usize,
    cols: usize,
    data: Vec<T>,
}

impl<T: Copy> FaceArray<T> {
    /// Create a face array filled with `value`
    pub fn filled(rows: usize, cols: usize, value: T) -> Self {
        Self {
            rows,
            cols,
            data: vec![value; rows * cols],
        }
    }

    /// Wrap flat row-major data, returning `None` if the length does not match
    pub fn from_vec(rows: usize, cols: usize, data: Vec<T>) -> Option<Self> {
        (data.len() == rows * cols).then_some(Self { rows, cols, data })
    }

    /// `(rows, cols)`
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Number of cells
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True when the face has no cells
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Value at `(a, b)`
    ///
    /// # Panics
    ///
    /// Panics if coordinates are out of bounds
    pub fn get(&self, a: usize, b: usize) -> T {
        assert!(a < self.rows && b < self.cols, "Coordinates out of bounds");
        self.data[a * self.cols + b]
    }

    /// Set value at `(a, b)`
    ///
    /// # Panics
    ///
    /// Panics if coordinates are out of bounds
    pub fn set(&mut self, a: usize, b: usize, value: T) {
        assert!(a < self.rows && b < self.cols, "Coordinates out of bounds");
        self.data[a * self.cols + b] = value;
    }

    /// Convert a flat row-major index back to `(a, b)`
    pub fn unravel(&self, flat: usize) -> (usize, usize) {
        (flat / self.cols, flat % self.cols)
    }

    /// Flat row-major view
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Mutable flat row-major view
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }
}
