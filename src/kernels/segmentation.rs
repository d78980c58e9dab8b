// In: src/kernels/segmentation.rs

//! Region-growing grain segmentation.
//!
//! Seeds are taken in scan order from the first unvisited eligible voxel. Each
//! region grows breadth-first through an explicit `VecDeque` worklist and a
//! `BitVec` visited set, so stack depth stays bounded on large volumes.
//! Neighbors join when they share the seed's phase and lie within the
//! misorientation tolerance of the growth reference.
//!
//! Labels are assigned serially; a region's FeatureId is fixed when its seed
//! is taken. Ineligible voxels (masked out, phase 0, or a phase with no known
//! symmetry) keep FeatureId 0.

use std::collections::VecDeque;

use bitvec::prelude::*;
use hashbrown::HashMap;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::grid::{shell_offsets, Connectivity, Offset};
use crate::kernels::field::OrientationField;
use crate::orientation::{nearest_equivalent, within_tolerance, Quat};

//==================================================================================
// 1. Parameters
//==================================================================================

/// Which orientation a candidate neighbor is compared against.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum GrowthReference {
    /// The region's seed voxel.
    Seed,
    /// The voxel being expanded.
    #[default]
    Neighbor,
    /// The running symmetry-aware average of the region.
    Average,
}

/// What happens to regions smaller than `min_feature_size`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum UndersizedPolicy {
    /// Relabel into the adjacent feature with the most contacts.
    #[default]
    Merge,
    /// Reset to FeatureId 0.
    Unlabel,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentationParams {
    /// Radians.
    pub tolerance: f64,
    pub connectivity: Connectivity,
    pub reference: GrowthReference,
    pub min_feature_size: usize,
    pub undersized: UndersizedPolicy,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Segmentation {
    pub feature_ids: Vec<i32>,
    /// Number of regions grown; labels run `1..=seeds`.
    pub seeds: usize,
    /// `active[f]` is true when label `f` still owns voxels. `active[0]` is false.
    pub active: Vec<bool>,
}

impl Segmentation {
    pub fn active_count(&self) -> usize {
        self.active.iter().filter(|a| **a).count()
    }
}

//==================================================================================
// 2. Flood Fill
//==================================================================================

pub fn segment(
    field: &OrientationField<'_>,
    mask: Option<&[bool]>,
    params: &SegmentationParams,
) -> Segmentation {
    let n = field.len();
    let offsets = shell_offsets(1, params.connectivity);
    let eligible = |i: usize| {
        mask.map_or(true, |m| m[i]) && field.symmetry.group(field.phases[i]).is_some()
    };

    let mut feature_ids = vec![0i32; n];
    let mut visited: BitVec = bitvec![0; n];
    let mut queue = VecDeque::new();
    let mut label = 0i32;

    for seed in 0..n {
        if visited[seed] || !eligible(seed) {
            continue;
        }
        let phase = field.phases[seed];
        let Some(group) = field.symmetry.group(phase) else {
            continue;
        };
        label += 1;
        visited.set(seed, true);
        feature_ids[seed] = label;
        queue.push_back(seed);

        let seed_quat = field.quats[seed];
        let mut sum = [seed_quat.w, seed_quat.x, seed_quat.y, seed_quat.z];
        let mut average = seed_quat;

        while let Some(current) = queue.pop_front() {
            let reference = match params.reference {
                GrowthReference::Seed => seed_quat,
                GrowthReference::Neighbor => field.quats[current],
                GrowthReference::Average => average,
            };
            for j in field.grid.neighbors(current, &offsets) {
                if visited[j] || field.phases[j] != phase || !eligible(j) {
                    continue;
                }
                if !within_tolerance(&reference, &field.quats[j], group, params.tolerance) {
                    continue;
                }
                visited.set(j, true);
                feature_ids[j] = label;
                queue.push_back(j);
                if params.reference == GrowthReference::Average {
                    let q = nearest_equivalent(&average, &field.quats[j], group);
                    sum[0] += q.w;
                    sum[1] += q.x;
                    sum[2] += q.y;
                    sum[3] += q.z;
                    average = Quat::new(sum[0], sum[1], sum[2], sum[3]).normalized();
                }
            }
        }
    }

    let seeds = label as usize;
    let mut active = vec![true; seeds + 1];
    active[0] = false;
    let mut segmentation = Segmentation {
        feature_ids,
        seeds,
        active,
    };
    if params.min_feature_size > 1 {
        apply_min_size(&mut segmentation, field, &offsets, params);
    }
    segmentation
}

//==================================================================================
// 3. Minimum Size
//==================================================================================

fn apply_min_size(
    segmentation: &mut Segmentation,
    field: &OrientationField<'_>,
    offsets: &[Offset],
    params: &SegmentationParams,
) {
    let ids = &mut segmentation.feature_ids;
    let mut members: Vec<Vec<usize>> = vec![Vec::new(); segmentation.seeds + 1];
    for (i, &id) in ids.iter().enumerate() {
        if id > 0 {
            members[id as usize].push(i);
        }
    }

    for feature in 1..=segmentation.seeds {
        let size = members[feature].len();
        if size == 0 || size >= params.min_feature_size {
            continue;
        }
        let target = match params.undersized {
            UndersizedPolicy::Merge => most_contacted(ids, &members[feature], field, offsets, feature as i32),
            UndersizedPolicy::Unlabel => None,
        };
        let voxels = std::mem::take(&mut members[feature]);
        let new_id = target.unwrap_or(0);
        for &v in &voxels {
            ids[v] = new_id;
        }
        if new_id > 0 {
            members[new_id as usize].extend(voxels);
        }
        segmentation.active[feature] = false;
    }
    log::debug!(
        "min-size filter kept {} of {} features",
        segmentation.active_count(),
        segmentation.seeds
    );
}

/// The adjacent, same-phase feature sharing the most contacts with `voxels`;
/// ties go to the first one met.
fn most_contacted(
    ids: &[i32],
    voxels: &[usize],
    field: &OrientationField<'_>,
    offsets: &[Offset],
    feature: i32,
) -> Option<i32> {
    let mut contacts: HashMap<i32, usize> = HashMap::new();
    let mut order = Vec::new();
    for &v in voxels {
        for j in field.grid.neighbors(v, offsets) {
            let other = ids[j];
            if other <= 0 || other == feature || field.phases[j] != field.phases[v] {
                continue;
            }
            let count = contacts.entry(other).or_insert_with(|| {
                order.push(other);
                0
            });
            *count += 1;
        }
    }
    let mut best: Option<(i32, usize)> = None;
    for id in order {
        let count = contacts[&id];
        if best.map_or(true, |(_, c)| count > c) {
            best = Some((id, count));
        }
    }
    best.map(|(id, _)| id)
}

//==================================================================================
// 4. Label Randomization
//==================================================================================

/// Deterministically shuffles labels `1..=seeds` (0 stays 0) and permutes
/// `active` to match.
pub fn randomize_labels(segmentation: &mut Segmentation, seed: u64) {
    let mut permutation: Vec<i32> = (1..=segmentation.seeds as i32).collect();
    permutation.shuffle(&mut StdRng::seed_from_u64(seed));

    let mut active = vec![false; segmentation.seeds + 1];
    for (old, &new) in permutation.iter().enumerate() {
        active[new as usize] = segmentation.active[old + 1];
    }
    for id in segmentation.feature_ids.iter_mut() {
        if *id > 0 {
            *id = permutation[(*id - 1) as usize];
        }
    }
    segmentation.active = active;
}

#[cfg(test)]
#[path = "segmentation_tests.rs"]
mod tests;
