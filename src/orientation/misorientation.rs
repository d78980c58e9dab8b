//! The shared minimum-over-symmetry routine.
//!
//! Every neighbor comparison in the kernels funnels through [`misorientation`],
//! so this is where the per-comparison cost (one product per operator) lives.

use crate::orientation::{Quat, SymmetryGroup};

/// Minimum rotation angle (radians) between two orientations under `group`:
/// `min over g of angle(q1⁻¹ · g · q2)`.
pub fn misorientation(q1: &Quat, q2: &Quat, group: &SymmetryGroup) -> f64 {
    let q1_inv = q1.inverse();
    let mut best = std::f64::consts::PI;
    for g in group.operators() {
        let delta = q1_inv.compose(&g.compose(q2));
        let angle = delta.angle();
        if angle < best {
            best = angle;
        }
    }
    best
}

/// `true` when the misorientation is strictly below `tolerance` radians.
///
/// Compares on `|w|` rather than the angle to skip the `acos` per operator.
pub fn within_tolerance(q1: &Quat, q2: &Quat, group: &SymmetryGroup, tolerance: f64) -> bool {
    let threshold = (tolerance * 0.5).cos();
    let q1_inv = q1.inverse();
    group
        .operators()
        .iter()
        .any(|g| (q1_inv * (*g * *q2)).w.abs() > threshold)
}

/// The symmetry-equivalent of `q` (`g · q`, sign matched) closest to `reference`.
/// Used to accumulate orientation averages without crossing symmetry boundaries.
pub fn nearest_equivalent(reference: &Quat, q: &Quat, group: &SymmetryGroup) -> Quat {
    let mut best = *q;
    let mut best_dot = -1.0;
    for g in group.operators() {
        let candidate = g.compose(q);
        let dot = reference.dot(&candidate);
        if dot.abs() > best_dot {
            best_dot = dot.abs();
            best = if dot < 0.0 { candidate.negated() } else { candidate };
        }
    }
    best
}
