//! Orientation math: quaternions, representation conversions, crystal symmetry
//! groups and the shared misorientation routine used by every neighbor kernel.

pub mod conversions;
pub mod misorientation;
pub mod quaternion;
pub mod symmetry;

pub use conversions::{
    axis_angle_to_quat, euler_to_quat, quat_to_axis_angle, quat_to_euler, AngleUnit,
    OrientationRepresentation,
};
pub use misorientation::{misorientation, nearest_equivalent, within_tolerance};
pub use quaternion::Quat;
pub use symmetry::{CrystalStructure, SymmetryGroup};

/// Per-phase symmetry lookup built from a "CrystalStructures" ensemble array.
///
/// Index 0 is conventionally the unindexed phase; phases whose structure is
/// unknown (or out of range) have no group and never compare as similar.
#[derive(Debug, Clone)]
pub struct PhaseSymmetry {
    groups: Vec<Option<&'static SymmetryGroup>>,
}

impl PhaseSymmetry {
    pub fn from_structure_ids(ids: &[u32]) -> Self {
        Self {
            groups: ids
                .iter()
                .map(|&id| CrystalStructure::from_id(id).symmetry())
                .collect(),
        }
    }

    pub fn group(&self, phase: i32) -> Option<&'static SymmetryGroup> {
        if phase <= 0 {
            return None;
        }
        self.groups.get(phase as usize).copied().flatten()
    }

    pub fn phase_count(&self) -> usize {
        self.groups.len()
    }
}
