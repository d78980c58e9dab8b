//! Erode/dilate of the bad (FeatureId 0) region.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::grid::{face_offsets, VoxelGrid};
use crate::kernels::field::TupleCopy;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum MorphologyOp {
    /// Shrinks the bad region: bad voxels take their most common good neighbor.
    #[default]
    Dilate,
    /// Grows the bad region: good voxels touching a bad voxel take its tuple.
    Erode,
}

/// Runs `iterations` snapshot passes over `feature_ids` (updated in place) and
/// returns the tuple copies to replay over the cell matrix.
pub fn erode_dilate(
    grid: VoxelGrid,
    feature_ids: &mut [i32],
    op: MorphologyOp,
    iterations: usize,
    axes: [bool; 3],
) -> Vec<TupleCopy> {
    let offsets = face_offsets(axes);
    let mut copies = Vec::new();
    for _ in 0..iterations {
        let snapshot = feature_ids.to_vec();
        let mut pass = Vec::new();
        for i in 0..snapshot.len() {
            let src = match op {
                MorphologyOp::Dilate if snapshot[i] == 0 => most_common_neighbor(&grid, &snapshot, i, &offsets),
                MorphologyOp::Erode if snapshot[i] != 0 => {
                    grid.neighbors(i, &offsets).find(|&j| snapshot[j] == 0)
                }
                _ => None,
            };
            if let Some(src) = src {
                pass.push(TupleCopy { src, dst: i });
            }
        }
        if pass.is_empty() {
            break;
        }
        for copy in &pass {
            feature_ids[copy.dst] = snapshot[copy.src];
        }
        copies.extend(pass);
    }
    copies
}

/// First-seen neighbor index of the most frequent non-zero FeatureId.
fn most_common_neighbor(grid: &VoxelGrid, ids: &[i32], i: usize, offsets: &[[i64; 3]]) -> Option<usize> {
    let mut votes: HashMap<i32, (usize, usize)> = HashMap::new();
    let mut order = Vec::new();
    for j in grid.neighbors(i, offsets) {
        let id = ids[j];
        if id == 0 {
            continue;
        }
        votes
            .entry(id)
            .and_modify(|(count, _)| *count += 1)
            .or_insert_with(|| {
                order.push(id);
                (1, j)
            });
    }
    let mut best: Option<(usize, usize)> = None;
    for id in order {
        let (count, first) = votes[&id];
        if best.map_or(true, |(c, _)| count > c) {
            best = Some((count, first));
        }
    }
    best.map(|(_, j)| j)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dilate_fills_hole_with_majority() {
        let grid = VoxelGrid::new([3, 3, 1]);
        let mut ids = vec![1, 2, 1, 1, 0, 2, 1, 1, 1];
        let copies = erode_dilate(grid, &mut ids, MorphologyOp::Dilate, 1, [true, true, true]);
        // Neighbors of the centre are 1 (id 2), 3 (1), 5 (2), 7 (1): a tie,
        // first seen wins.
        assert_eq!(copies, vec![TupleCopy { src: 1, dst: 4 }]);
        assert_eq!(ids[4], 2);

        let mut ids = vec![1, 1, 1, 1, 0, 2, 1, 1, 1];
        erode_dilate(grid, &mut ids, MorphologyOp::Dilate, 1, [true, true, true]);
        assert_eq!(ids[4], 1);
    }

    #[test]
    fn test_erode_grows_bad_region() {
        let grid = VoxelGrid::new([5, 1, 1]);
        let mut ids = vec![1, 1, 0, 1, 1];
        let copies = erode_dilate(grid, &mut ids, MorphologyOp::Erode, 1, [true, true, true]);
        assert_eq!(ids, vec![1, 0, 0, 0, 1]);
        assert_eq!(copies.len(), 2);
        erode_dilate(grid, &mut ids, MorphologyOp::Erode, 5, [true, true, true]);
        assert_eq!(ids, vec![0; 5]);
    }

    #[test]
    fn test_disabled_axes_are_ignored() {
        let grid = VoxelGrid::new([3, 1, 1]);
        let mut ids = vec![1, 0, 1];
        let copies = erode_dilate(grid, &mut ids, MorphologyOp::Dilate, 3, [false, true, true]);
        assert!(copies.is_empty());
        assert_eq!(ids, vec![1, 0, 1]);
    }
}
