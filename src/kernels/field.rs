//! The orientation view shared by the neighbor kernels: per-voxel quaternions
//! and phases on a grid, plus the per-phase symmetry lookup.

use crate::grid::VoxelGrid;
use crate::orientation::{misorientation, within_tolerance, PhaseSymmetry, Quat, SymmetryGroup};

/// One `dst ← src` tuple copy decided by a cleanup kernel. Callers replay
/// these in order over every array of the cell matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TupleCopy {
    pub src: usize,
    pub dst: usize,
}

#[derive(Debug, Clone)]
pub struct OrientationField<'a> {
    pub grid: VoxelGrid,
    pub quats: Vec<Quat>,
    pub phases: Vec<i32>,
    pub symmetry: &'a PhaseSymmetry,
}

impl<'a> OrientationField<'a> {
    /// Builds the field from a `(x, y, z, w)` Float32 array and Int32 phases.
    pub fn from_arrays(
        grid: VoxelGrid,
        quats_xyzw: &[f32],
        phases: &[i32],
        symmetry: &'a PhaseSymmetry,
    ) -> Self {
        Self {
            grid,
            quats: quats_xyzw.chunks_exact(4).map(Quat::from_xyzw).collect(),
            phases: phases.to_vec(),
            symmetry,
        }
    }

    pub fn len(&self) -> usize {
        self.quats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quats.is_empty()
    }

    /// The group shared by `a` and `b`, if they are in the same indexed phase.
    #[inline]
    pub fn shared_group(&self, a: usize, b: usize) -> Option<&'static SymmetryGroup> {
        if self.phases[a] != self.phases[b] {
            return None;
        }
        self.symmetry.group(self.phases[a])
    }

    /// Same phase and misorientation strictly below `tolerance` radians.
    #[inline]
    pub fn similar(&self, a: usize, b: usize, tolerance: f64) -> bool {
        self.shared_group(a, b)
            .map(|g| within_tolerance(&self.quats[a], &self.quats[b], g, tolerance))
            .unwrap_or(false)
    }

    /// Misorientation in radians, or `None` across phases.
    #[inline]
    pub fn misorientation(&self, a: usize, b: usize) -> Option<f64> {
        self.shared_group(a, b)
            .map(|g| misorientation(&self.quats[a], &self.quats[b], g))
    }

    /// Mirrors a tuple copy into the field's own orientation and phase state.
    pub fn copy(&mut self, copy: TupleCopy) {
        self.quats[copy.dst] = self.quats[copy.src];
        self.phases[copy.dst] = self.phases[copy.src];
    }
}
