// In: src/grid.rs

//! Index arithmetic for regular voxel grids (x fastest, then y, then z) and the
//! neighbor stencils the spatial kernels walk.

use serde::{Deserialize, Serialize};

/// Which neighbors count as adjacent. At distance 1 these are the 6 face, 18
/// face+edge and 26 full neighbors.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Connectivity {
    #[default]
    Face,
    FaceEdge,
    Full,
}

impl Connectivity {
    /// Maximum number of non-zero offset components allowed.
    fn max_axes(&self) -> usize {
        match self {
            Connectivity::Face => 1,
            Connectivity::FaceEdge => 2,
            Connectivity::Full => 3,
        }
    }
}

pub type Offset = [i64; 3];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoxelGrid {
    dims: [usize; 3],
}

impl VoxelGrid {
    pub fn new(dims: [usize; 3]) -> Self {
        Self { dims }
    }

    pub fn dims(&self) -> [usize; 3] {
        self.dims
    }

    pub fn len(&self) -> usize {
        self.dims.iter().product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of voxels in one z-section.
    pub fn section_len(&self) -> usize {
        self.dims[0] * self.dims[1]
    }

    #[inline]
    pub fn index(&self, x: usize, y: usize, z: usize) -> usize {
        (z * self.dims[1] + y) * self.dims[0] + x
    }

    #[inline]
    pub fn coords(&self, index: usize) -> [usize; 3] {
        let nx = self.dims[0];
        let ny = self.dims[1];
        [index % nx, (index / nx) % ny, index / (nx * ny)]
    }

    /// Index of `index + offset`, or `None` when it falls outside the grid.
    #[inline]
    pub fn offset(&self, index: usize, offset: Offset) -> Option<usize> {
        let c = self.coords(index);
        let mut out = [0usize; 3];
        for axis in 0..3 {
            let v = c[axis] as i64 + offset[axis];
            if v < 0 || v >= self.dims[axis] as i64 {
                return None;
            }
            out[axis] = v as usize;
        }
        Some(self.index(out[0], out[1], out[2]))
    }

    /// In-bounds neighbors of `index` under `offsets`, in stencil order.
    pub fn neighbors<'a>(&'a self, index: usize, offsets: &'a [Offset]) -> impl Iterator<Item = usize> + 'a {
        offsets.iter().filter_map(move |&o| self.offset(index, o))
    }
}

/// The offsets at Chebyshev distance exactly `level`, restricted to at most
/// `connectivity.max_axes()` non-zero components. Ordered z, y, x ascending so
/// that ties resolve in scan order.
pub fn shell_offsets(level: usize, connectivity: Connectivity) -> Vec<Offset> {
    let l = level as i64;
    let mut offsets = Vec::new();
    if level == 0 {
        return offsets;
    }
    for dz in -l..=l {
        for dy in -l..=l {
            for dx in -l..=l {
                let o = [dx, dy, dz];
                let chebyshev = o.iter().map(|v| v.abs()).max().unwrap_or(0);
                let axes = o.iter().filter(|v| **v != 0).count();
                if chebyshev == l && axes <= connectivity.max_axes() {
                    offsets.push(o);
                }
            }
        }
    }
    offsets
}

/// Face neighbors restricted to enabled axes.
pub fn face_offsets(axes: [bool; 3]) -> Vec<Offset> {
    let mut offsets = Vec::with_capacity(6);
    for axis in (0..3).rev() {
        if !axes[axis] {
            continue;
        }
        for step in [-1, 1] {
            let mut o = [0i64; 3];
            o[axis] = step;
            offsets.push(o);
        }
    }
    offsets
}
