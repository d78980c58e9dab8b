//! Bad-data neighbor check: fills voxels flagged bad from consistent good
//! neighbors, expanding outward one distance band at a time.
//!
//! At each level `L` the stencil is the Chebyshev shell of radius `L`,
//! restricted by connectivity. A bad voxel is filled when at least
//! `min_neighbors` good, same-phase voxels in that shell lie within the
//! misorientation tolerance; it takes the tuple of the closest of them.
//! Passes use snapshot semantics: every decision in a pass reads the state at
//! the start of the pass. A level is finished when a pass fills nothing.

use rayon::prelude::*;

use crate::grid::{shell_offsets, Connectivity};
use crate::kernels::field::{OrientationField, TupleCopy};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NeighborCheckParams {
    /// Radians.
    pub tolerance: f64,
    pub min_neighbors: usize,
    pub search_radius: usize,
    pub connectivity: Connectivity,
    /// Cap on passes per level.
    pub max_passes: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NeighborCheckReport {
    /// Every fill, in the order it must be replayed.
    pub copies: Vec<TupleCopy>,
    pub passes: usize,
    /// `false` if some level hit `max_passes` while still filling voxels.
    pub converged: bool,
    pub remaining_bad: usize,
}

/// Fills bad voxels in place (`good[i] == false` marks bad) and reports the
/// tuple copies performed.
pub fn fill_bad_voxels(
    field: &mut OrientationField<'_>,
    good: &mut [bool],
    params: &NeighborCheckParams,
) -> NeighborCheckReport {
    let mut report = NeighborCheckReport {
        converged: true,
        ..Default::default()
    };

    for level in 1..=params.search_radius {
        let offsets = shell_offsets(level, params.connectivity);
        let mut level_passes = 0;
        loop {
            if level_passes == params.max_passes {
                report.converged = false;
                break;
            }
            let decisions = decide_pass(field, good, &offsets, params);
            level_passes += 1;
            report.passes += 1;
            if decisions.is_empty() {
                break;
            }
            log::debug!(
                "bad-data check level {} pass {}: filled {} voxels",
                level,
                level_passes,
                decisions.len()
            );
            for copy in decisions {
                field.copy(copy);
                good[copy.dst] = true;
                report.copies.push(copy);
            }
        }
    }

    report.remaining_bad = good.iter().filter(|g| !**g).count();
    report
}

fn decide_pass(
    field: &OrientationField<'_>,
    good: &[bool],
    offsets: &[[i64; 3]],
    params: &NeighborCheckParams,
) -> Vec<TupleCopy> {
    (0..field.len())
        .into_par_iter()
        .filter(|&i| !good[i])
        .filter_map(|i| {
            let mut count = 0;
            let mut best: Option<(usize, f64)> = None;
            for j in field.grid.neighbors(i, offsets) {
                if !good[j] {
                    continue;
                }
                let Some(angle) = field.misorientation(i, j) else {
                    continue;
                };
                if angle >= params.tolerance {
                    continue;
                }
                count += 1;
                if best.map_or(true, |(_, b)| angle < b) {
                    best = Some((j, angle));
                }
            }
            match best {
                Some((src, _)) if count >= params.min_neighbors => Some(TupleCopy { src, dst: i }),
                _ => None,
            }
        })
        .collect()
}
