//! Crystal structures and their proper rotation (Laue) groups.
//!
//! Each structure is bound to a fixed operator set. The sets are generated once
//! by closing a small list of generators under multiplication and then shared
//! for the life of the process.

use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, FRAC_PI_3, PI};
use std::sync::OnceLock;

use crate::orientation::Quat;

/// Crystal structure identifiers. The discriminants are the ids stored in a
/// "CrystalStructures" ensemble array.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CrystalStructure {
    HexagonalHigh = 0,
    CubicHigh = 1,
    HexagonalLow = 2,
    CubicLow = 3,
    Triclinic = 4,
    Monoclinic = 5,
    Orthorhombic = 6,
    TetragonalLow = 7,
    TetragonalHigh = 8,
    TrigonalLow = 9,
    TrigonalHigh = 10,
    Unknown = 999,
}

impl CrystalStructure {
    pub const ALL_KNOWN: [CrystalStructure; 11] = [
        CrystalStructure::HexagonalHigh,
        CrystalStructure::CubicHigh,
        CrystalStructure::HexagonalLow,
        CrystalStructure::CubicLow,
        CrystalStructure::Triclinic,
        CrystalStructure::Monoclinic,
        CrystalStructure::Orthorhombic,
        CrystalStructure::TetragonalLow,
        CrystalStructure::TetragonalHigh,
        CrystalStructure::TrigonalLow,
        CrystalStructure::TrigonalHigh,
    ];

    /// Maps a stored id to a structure; anything unrecognized is `Unknown`.
    pub fn from_id(id: u32) -> Self {
        Self::ALL_KNOWN
            .iter()
            .copied()
            .find(|s| *s as u32 == id)
            .unwrap_or(CrystalStructure::Unknown)
    }

    pub fn id(&self) -> u32 {
        *self as u32
    }

    /// The shared symmetry group, or `None` for `Unknown`.
    pub fn symmetry(&self) -> Option<&'static SymmetryGroup> {
        if *self == CrystalStructure::Unknown {
            return None;
        }
        static GROUPS: OnceLock<Vec<SymmetryGroup>> = OnceLock::new();
        let groups = GROUPS.get_or_init(|| {
            Self::ALL_KNOWN
                .iter()
                .map(|s| SymmetryGroup::generate(*s))
                .collect()
        });
        groups.iter().find(|g| g.structure == *self)
    }
}

/// A finite set of rotation operators, stored with canonical sign (`w >= 0`).
#[derive(Debug, Clone)]
pub struct SymmetryGroup {
    structure: CrystalStructure,
    operators: Vec<Quat>,
}

impl SymmetryGroup {
    pub fn structure(&self) -> CrystalStructure {
        self.structure
    }

    pub fn operators(&self) -> &[Quat] {
        &self.operators
    }

    pub fn order(&self) -> usize {
        self.operators.len()
    }

    /// Closes the structure's generators under multiplication.
    fn generate(structure: CrystalStructure) -> Self {
        let generators = generators_for(structure);
        let mut operators = vec![Quat::IDENTITY];
        let mut frontier = vec![Quat::IDENTITY];

        while let Some(current) = frontier.pop() {
            for g in &generators {
                let candidate = (current * *g).normalized().canonical();
                if !operators.iter().any(|op| op.same_rotation(&candidate, 1e-9)) {
                    operators.push(candidate);
                    frontier.push(candidate);
                }
            }
        }

        Self {
            structure,
            operators,
        }
    }
}

fn rot(axis: [f64; 3], angle: f64) -> Quat {
    Quat::from_axis_angle(axis, angle)
}

/// Generators of each proper point group, with `c` along z and `a` along x.
fn generators_for(structure: CrystalStructure) -> Vec<Quat> {
    const Z: [f64; 3] = [0.0, 0.0, 1.0];
    const X: [f64; 3] = [1.0, 0.0, 0.0];
    const Y: [f64; 3] = [0.0, 1.0, 0.0];
    const BODY_DIAGONAL: [f64; 3] = [1.0, 1.0, 1.0];
    let three_fold_diag = rot(BODY_DIAGONAL, 2.0 * FRAC_PI_3);

    match structure {
        CrystalStructure::CubicHigh => vec![rot(Z, FRAC_PI_2), three_fold_diag],
        CrystalStructure::CubicLow => vec![rot(Z, PI), three_fold_diag],
        CrystalStructure::HexagonalHigh => vec![rot(Z, FRAC_PI_3), rot(X, PI)],
        CrystalStructure::HexagonalLow => vec![rot(Z, FRAC_PI_3)],
        CrystalStructure::TrigonalHigh => vec![rot(Z, 2.0 * FRAC_PI_3), rot(X, PI)],
        CrystalStructure::TrigonalLow => vec![rot(Z, 2.0 * FRAC_PI_3)],
        CrystalStructure::TetragonalHigh => vec![rot(Z, FRAC_PI_2), rot(X, PI)],
        CrystalStructure::TetragonalLow => vec![rot(Z, FRAC_PI_2)],
        CrystalStructure::Orthorhombic => vec![rot(Z, PI), rot(X, PI)],
        CrystalStructure::Monoclinic => vec![rot(Y, PI)],
        CrystalStructure::Triclinic | CrystalStructure::Unknown => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_orders() {
        let expected = [
            (CrystalStructure::CubicHigh, 24),
            (CrystalStructure::CubicLow, 12),
            (CrystalStructure::HexagonalHigh, 12),
            (CrystalStructure::HexagonalLow, 6),
            (CrystalStructure::TrigonalHigh, 6),
            (CrystalStructure::TrigonalLow, 3),
            (CrystalStructure::TetragonalHigh, 8),
            (CrystalStructure::TetragonalLow, 4),
            (CrystalStructure::Orthorhombic, 4),
            (CrystalStructure::Monoclinic, 2),
            (CrystalStructure::Triclinic, 1),
        ];
        for (structure, order) in expected {
            let group = structure.symmetry().unwrap();
            assert_eq!(group.order(), order, "{:?}", structure);
            assert_eq!(group.structure(), structure);
        }
    }

    #[test]
    fn test_groups_are_closed() {
        let group = CrystalStructure::CubicHigh.symmetry().unwrap();
        for a in group.operators() {
            for b in group.operators() {
                let product = (*a * *b).normalized();
                assert!(group
                    .operators()
                    .iter()
                    .any(|op| op.same_rotation(&product, 1e-9)));
            }
        }
    }

    #[test]
    fn test_ids_roundtrip_and_unknown() {
        for s in CrystalStructure::ALL_KNOWN {
            assert_eq!(CrystalStructure::from_id(s.id()), s);
        }
        assert_eq!(CrystalStructure::from_id(42), CrystalStructure::Unknown);
        assert!(CrystalStructure::Unknown.symmetry().is_none());
    }
}
