// In: src/kernels/alignment.rs

//! Section-to-section registration by maximizing mutual information.
//!
//! A pair shift `(dx, dy)` between sections `A` and `B` means `B[x+dx, y+dy]`
//! matches `A[x, y]`. A section's applied shift `(sx, sy)` resamples it as
//! `B'[x, y] = B[x+sx, y+sy]`, leaving vacated cells zeroed.

use ndarray::ArrayView2;
use serde::{Deserialize, Serialize};

use crate::error::EbsdError;
use crate::grid::{Connectivity, VoxelGrid};
use crate::kernels::field::OrientationField;
use crate::kernels::mutual_information::{mutual_information, EXCLUDED};
use crate::kernels::segmentation::{segment, GrowthReference, SegmentationParams, UndersizedPolicy};

/// MI values within this distance are considered tied.
pub const TIE_EPSILON: f64 = 1e-12;

//==================================================================================
// 1. Parameters
//==================================================================================

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum AlignmentMode {
    /// Each section registers against its predecessor; shifts accumulate.
    #[default]
    Local,
    /// Each section registers directly against one reference section.
    Global,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SearchStrategy {
    /// Every shift in `[-r, r]²`.
    #[default]
    Exhaustive,
    /// Greedy ascent over the 8-neighborhood from `(0, 0)`, bounded by the radius.
    HillClimb { max_steps: usize },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlignmentParams {
    pub search_radius: i32,
    pub strategy: SearchStrategy,
    pub mode: AlignmentMode,
    pub reference_section: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairShift {
    pub shift: (i32, i32),
    pub mutual_information: f64,
    pub converged: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AlignmentResult {
    /// Applied shift per section.
    pub shifts: Vec<(i32, i32)>,
    /// `false` when some hill climb ran out of steps.
    pub converged: bool,
}

//==================================================================================
// 2. Pair Search
//==================================================================================

fn magnitude(shift: (i32, i32)) -> i64 {
    let (dx, dy) = (shift.0 as i64, shift.1 as i64);
    dx * dx + dy * dy
}

/// `true` when `candidate` beats `best`: higher MI, or a tie with a smaller
/// magnitude. Equal magnitudes keep the earlier one.
fn improves(candidate: (f64, (i32, i32)), best: (f64, (i32, i32))) -> bool {
    let diff = candidate.0 - best.0;
    if diff > TIE_EPSILON {
        return true;
    }
    if diff < -TIE_EPSILON {
        return false;
    }
    magnitude(candidate.1) < magnitude(best.1)
}

pub fn best_shift(a: &ArrayView2<'_, u32>, b: &ArrayView2<'_, u32>, params: &AlignmentParams) -> PairShift {
    let r = params.search_radius.max(0);
    match params.strategy {
        SearchStrategy::Exhaustive => {
            let mut best: Option<(f64, (i32, i32))> = None;
            for dy in -r..=r {
                for dx in -r..=r {
                    let candidate = (mutual_information(a, b, dx, dy), (dx, dy));
                    if best.map_or(true, |current| improves(candidate, current)) {
                        best = Some(candidate);
                    }
                }
            }
            let (mi, shift) = best.unwrap_or((f64::NEG_INFINITY, (0, 0)));
            PairShift {
                shift,
                mutual_information: mi,
                converged: true,
            }
        }
        SearchStrategy::HillClimb { max_steps } => {
            let mut current = (mutual_information(a, b, 0, 0), (0, 0));
            for _ in 0..max_steps {
                let (cx, cy) = current.1;
                let mut next = current;
                for dy in -1..=1 {
                    for dx in -1..=1 {
                        let shift: (i32, i32) = (cx + dx, cy + dy);
                        if (dx, dy) == (0, 0) || shift.0.abs() > r || shift.1.abs() > r {
                            continue;
                        }
                        let candidate = (mutual_information(a, b, shift.0, shift.1), shift);
                        if improves(candidate, next) {
                            next = candidate;
                        }
                    }
                }
                if next.1 == current.1 {
                    return PairShift {
                        shift: current.1,
                        mutual_information: current.0,
                        converged: true,
                    };
                }
                current = next;
            }
            PairShift {
                shift: current.1,
                mutual_information: current.0,
                converged: false,
            }
        }
    }
}

//==================================================================================
// 3. Stack Alignment
//==================================================================================

/// Computes the applied shift of every section of `sections`.
pub fn align_sections(sections: &[ArrayView2<'_, u32>], params: &AlignmentParams) -> Result<AlignmentResult, EbsdError> {
    let nz = sections.len();
    if nz < 2 {
        return Err(EbsdError::InvalidParameter(format!(
            "alignment needs at least 2 sections, found {nz}"
        )));
    }
    let mut shifts = vec![(0, 0); nz];
    let mut converged = true;
    match params.mode {
        AlignmentMode::Local => {
            for k in 1..nz {
                let pair = best_shift(&sections[k - 1], &sections[k], params);
                converged &= pair.converged;
                let (px, py) = shifts[k - 1];
                shifts[k] = (px + pair.shift.0, py + pair.shift.1);
                log::debug!(
                    "section {} -> {}: pair shift {:?}, MI {:.6}",
                    k - 1,
                    k,
                    pair.shift,
                    pair.mutual_information
                );
            }
        }
        AlignmentMode::Global => {
            let reference = params.reference_section;
            if reference >= nz {
                return Err(EbsdError::InvalidParameter(format!(
                    "reference section {reference} is out of range for {nz} sections"
                )));
            }
            for k in (0..nz).filter(|&k| k != reference) {
                let pair = best_shift(&sections[reference], &sections[k], params);
                converged &= pair.converged;
                shifts[k] = pair.shift;
            }
        }
    }
    Ok(AlignmentResult { shifts, converged })
}

/// Splits a flat `(x fastest, then y, then z)` label volume into `(ny, nx)` views.
pub fn section_views<'a>(labels: &'a [u32], dims: [usize; 3]) -> Result<Vec<ArrayView2<'a, u32>>, EbsdError> {
    let [nx, ny, nz] = dims;
    let plane = nx * ny;
    if labels.len() != plane * nz {
        return Err(EbsdError::TupleCountMismatch {
            path: "section labels".to_string(),
            expected: plane * nz,
            found: labels.len(),
        });
    }
    (0..nz)
        .map(|z| {
            ArrayView2::from_shape((ny, nx), &labels[z * plane..(z + 1) * plane])
                .map_err(|e| EbsdError::AlgorithmicFailure(format!("section {z}: {e}")))
        })
        .collect()
}

/// Per-section 2-D segmentation labels used as the orientation signal.
/// Ineligible pixels become `EXCLUDED`.
pub fn orientation_labels(field: &OrientationField<'_>, mask: Option<&[bool]>, tolerance: f64) -> Vec<u32> {
    let [nx, ny, nz] = field.grid.dims();
    let plane = nx * ny;
    let params = SegmentationParams {
        tolerance,
        connectivity: Connectivity::Face,
        reference: GrowthReference::Neighbor,
        min_feature_size: 1,
        undersized: UndersizedPolicy::Unlabel,
    };
    let mut labels = Vec::with_capacity(field.len());
    for z in 0..nz {
        let range = z * plane..(z + 1) * plane;
        let section = OrientationField {
            grid: VoxelGrid::new([nx, ny, 1]),
            quats: field.quats[range.clone()].to_vec(),
            phases: field.phases[range.clone()].to_vec(),
            symmetry: field.symmetry,
        };
        let seg = segment(&section, mask.map(|m| &m[range]), &params);
        labels.extend(
            seg.feature_ids
                .iter()
                .map(|&id| if id > 0 { id as u32 } else { EXCLUDED }),
        );
    }
    labels
}

/// Source tuple for every voxel after applying per-section shifts.
pub fn shift_tuple_map(grid: VoxelGrid, shifts: &[(i32, i32)]) -> Vec<Option<usize>> {
    let [nx, ny, _] = grid.dims();
    (0..grid.len())
        .map(|i| {
            let [x, y, z] = grid.coords(i);
            let (sx, sy) = shifts.get(z).copied().unwrap_or((0, 0));
            let src_x = x as i64 + sx as i64;
            let src_y = y as i64 + sy as i64;
            if src_x < 0 || src_y < 0 || src_x >= nx as i64 || src_y >= ny as i64 {
                None
            } else {
                Some(grid.index(src_x as usize, src_y as usize, z))
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn pattern(nx: usize, ny: usize) -> Array2<u32> {
        // Distinct labels with no translational self-similarity.
        Array2::from_shape_fn((ny, nx), |(y, x)| ((x * 7 + y * 13 + x * y) % 11) as u32)
    }

    /// `B[x, y] = A[x - tx, y - ty]`, so the pair shift is `(tx, ty)`.
    fn translated(a: &Array2<u32>, tx: i32, ty: i32) -> Array2<u32> {
        let (ny, nx) = a.dim();
        Array2::from_shape_fn((ny, nx), |(y, x)| {
            let sx = x as i32 - tx;
            let sy = y as i32 - ty;
            if sx < 0 || sy < 0 || sx >= nx as i32 || sy >= ny as i32 {
                EXCLUDED
            } else {
                a[[sy as usize, sx as usize]]
            }
        })
    }

    fn params(strategy: SearchStrategy, mode: AlignmentMode) -> AlignmentParams {
        AlignmentParams {
            search_radius: 3,
            strategy,
            mode,
            reference_section: 0,
        }
    }

    #[test]
    fn test_identical_sections_resolve_to_zero() {
        let a = pattern(16, 12);
        let pair = best_shift(&a.view(), &a.view(), &params(SearchStrategy::Exhaustive, AlignmentMode::Local));
        assert_eq!(pair.shift, (0, 0));
    }

    #[test]
    fn test_ties_prefer_smallest_shift() {
        // A constant section scores 0 everywhere; the tie-break must pick (0, 0).
        let a = Array2::from_elem((8, 8), 4u32);
        let pair = best_shift(&a.view(), &a.view(), &params(SearchStrategy::Exhaustive, AlignmentMode::Local));
        assert_eq!(pair.shift, (0, 0));
        assert!(improves((0.0, (0, 1)), (0.0, (1, 1))));
        assert!(!improves((0.0, (1, 0)), (0.0, (0, 1))));
        assert!(improves((0.5, (3, 3)), (0.1, (0, 0))));
    }

    #[test]
    fn test_equal_magnitude_ties_keep_scan_order() {
        // One spike in A and two in B on either side of it: (-1, 0) and (1, 0)
        // pair the same label multiset and both beat (0, 0).
        let a = Array2::from_shape_vec((1, 7), vec![1u32, 1, 1, 2, 1, 1, 1]).unwrap();
        let b = Array2::from_shape_vec((1, 7), vec![1u32, 1, 2, 1, 2, 1, 1]).unwrap();
        let left = mutual_information(&a.view(), &b.view(), -1, 0);
        let right = mutual_information(&a.view(), &b.view(), 1, 0);
        assert!((left - right).abs() <= TIE_EPSILON);
        assert!(left > mutual_information(&a.view(), &b.view(), 0, 0));

        let mut p = params(SearchStrategy::Exhaustive, AlignmentMode::Local);
        p.search_radius = 1;
        let exhaustive = best_shift(&a.view(), &b.view(), &p);
        assert_eq!(exhaustive.shift, (-1, 0));

        p.strategy = SearchStrategy::HillClimb { max_steps: 5 };
        let climb = best_shift(&a.view(), &b.view(), &p);
        assert!(climb.converged);
        assert_eq!(climb.shift, (-1, 0));
    }

    #[test]
    fn test_recovers_known_translation() {
        let a = pattern(20, 16);
        let b = translated(&a, 2, -1);
        let exhaustive = best_shift(&a.view(), &b.view(), &params(SearchStrategy::Exhaustive, AlignmentMode::Local));
        assert_eq!(exhaustive.shift, (2, -1));

        let climb = best_shift(
            &a.view(),
            &b.view(),
            &params(SearchStrategy::HillClimb { max_steps: 10 }, AlignmentMode::Local),
        );
        assert!(climb.converged);
        assert!(climb.mutual_information <= exhaustive.mutual_information + TIE_EPSILON);
    }

    #[test]
    fn test_hill_climb_step_cap() {
        let a = pattern(20, 16);
        let b = translated(&a, 3, 0);
        let climb = best_shift(
            &a.view(),
            &b.view(),
            &params(SearchStrategy::HillClimb { max_steps: 0 }, AlignmentMode::Local),
        );
        assert!(!climb.converged);
        assert_eq!(climb.shift, (0, 0));
    }

    #[test]
    fn test_local_shifts_accumulate_and_global_uses_reference() {
        let a = pattern(20, 16);
        let b = translated(&a, 1, 0);
        let c = translated(&b, 1, 0);
        let views = [a.view(), b.view(), c.view()];

        let local = align_sections(&views, &params(SearchStrategy::Exhaustive, AlignmentMode::Local)).unwrap();
        assert_eq!(local.shifts, vec![(0, 0), (1, 0), (2, 0)]);

        let global = align_sections(&views, &params(SearchStrategy::Exhaustive, AlignmentMode::Global)).unwrap();
        assert_eq!(global.shifts, vec![(0, 0), (1, 0), (2, 0)]);

        assert!(align_sections(&views[..1], &params(SearchStrategy::Exhaustive, AlignmentMode::Local)).is_err());
    }

    #[test]
    fn test_shift_tuple_map_zeroes_vacated_cells() {
        let grid = VoxelGrid::new([3, 1, 2]);
        let map = shift_tuple_map(grid, &[(0, 0), (1, 0)]);
        assert_eq!(map, vec![Some(0), Some(1), Some(2), Some(4), Some(5), None]);
    }

    #[test]
    fn test_section_views() {
        let labels: Vec<u32> = (0..12).collect();
        let views = section_views(&labels, [3, 2, 2]).unwrap();
        assert_eq!(views.len(), 2);
        assert_eq!(views[1][[1, 0]], 9);
    }
}
