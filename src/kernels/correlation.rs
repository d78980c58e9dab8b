//! Neighbor orientation correlation.
//!
//! A voxel whose confidence is below the threshold is replaced by the neighbor
//! orientation that most of its other neighbors agree with (the mode, since
//! orientations cannot be averaged linearly). Repeats until nothing changes or
//! the iteration cap is reached.

use rayon::prelude::*;

use crate::grid::Offset;
use crate::kernels::field::{OrientationField, TupleCopy};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CorrelationParams {
    pub min_confidence: f32,
    /// Radians.
    pub tolerance: f64,
    /// Required `agreement + 1` (the candidate counts itself).
    pub min_agreement: usize,
    pub max_iterations: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CorrelationReport {
    pub copies: Vec<TupleCopy>,
    pub iterations: usize,
    pub converged: bool,
}

/// Runs the correlation in place over `field` and `confidence`.
///
/// Candidates are neighbors at or above `min_confidence`; voters are any
/// in-bounds neighbor other than the candidate.
pub fn correlate(
    field: &mut OrientationField<'_>,
    confidence: &mut [f32],
    offsets: &[Offset],
    params: &CorrelationParams,
) -> CorrelationReport {
    let mut report = CorrelationReport::default();
    while report.iterations < params.max_iterations {
        let decisions = decide_iteration(field, confidence, offsets, params);
        report.iterations += 1;
        if decisions.is_empty() {
            report.converged = true;
            return report;
        }
        for copy in decisions {
            field.copy(copy);
            confidence[copy.dst] = confidence[copy.src];
            report.copies.push(copy);
        }
    }
    // The cap was reached; one more look tells whether anything is pending.
    report.converged = decide_iteration(field, confidence, offsets, params).is_empty();
    report
}

fn decide_iteration(
    field: &OrientationField<'_>,
    confidence: &[f32],
    offsets: &[Offset],
    params: &CorrelationParams,
) -> Vec<TupleCopy> {
    (0..field.len())
        .into_par_iter()
        .filter(|&i| confidence[i] < params.min_confidence)
        .filter_map(|i| {
            let neighbors: Vec<usize> = field.grid.neighbors(i, offsets).collect();
            let mut best: Option<(usize, usize)> = None;
            for &j in &neighbors {
                if confidence[j] < params.min_confidence || field.symmetry.group(field.phases[j]).is_none() {
                    continue;
                }
                let agreement = neighbors
                    .iter()
                    .filter(|&&k| k != j && field.similar(j, k, params.tolerance))
                    .count();
                if best.map_or(true, |(_, b)| agreement > b) {
                    best = Some((j, agreement));
                }
            }
            match best {
                Some((src, agreement)) if agreement + 1 >= params.min_agreement => {
                    Some(TupleCopy { src, dst: i })
                }
                _ => None,
            }
        })
        .collect()
}
