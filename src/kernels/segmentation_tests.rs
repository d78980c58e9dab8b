use super::*;
use crate::grid::VoxelGrid;
use crate::orientation::{PhaseSymmetry, Quat};

fn cubic() -> PhaseSymmetry {
    PhaseSymmetry::from_structure_ids(&[999, 1, 1])
}

fn params(tolerance_deg: f64) -> SegmentationParams {
    SegmentationParams {
        tolerance: tolerance_deg.to_radians(),
        connectivity: Connectivity::Face,
        reference: GrowthReference::Neighbor,
        min_feature_size: 1,
        undersized: UndersizedPolicy::Merge,
    }
}

fn field(dims: [usize; 3], quats: Vec<Quat>, symmetry: &PhaseSymmetry) -> OrientationField<'_> {
    let n = quats.len();
    OrientationField {
        grid: VoxelGrid::new(dims),
        quats,
        phases: vec![1; n],
        symmetry,
    }
}

fn rot_z(deg: f64) -> Quat {
    Quat::from_axis_angle([0.0, 0.0, 1.0], deg.to_radians())
}

/// Same partition up to renumbering.
fn same_partition(a: &[i32], b: &[i32]) -> bool {
    let mut forward = HashMap::new();
    let mut backward = HashMap::new();
    a.iter().zip(b).all(|(&x, &y)| {
        (x == 0) == (y == 0)
            && *forward.entry(x).or_insert(y) == y
            && *backward.entry(y).or_insert(x) == x
    })
}

#[test]
fn test_masked_three_by_three_yields_one_feature() {
    let symmetry = cubic();
    let f = field([3, 3, 1], vec![Quat::IDENTITY; 9], &symmetry);
    let mask = [true, true, false, true, true, false, false, false, false];

    let seg = segment(&f, Some(&mask), &params(5.0));
    assert_eq!(seg.seeds, 1);
    assert_eq!(seg.feature_ids, vec![1, 1, 0, 1, 1, 0, 0, 0, 0]);
    assert_eq!(seg.active, vec![false, true]);
}

#[test]
fn test_misorientation_splits_regions() {
    let symmetry = cubic();
    let quats = vec![rot_z(0.0), rot_z(1.0), rot_z(30.0), rot_z(31.0)];
    let f = field([4, 1, 1], quats, &symmetry);
    let seg = segment(&f, None, &params(5.0));
    assert_eq!(seg.feature_ids, vec![1, 1, 2, 2]);
    assert_eq!(seg.seeds, 2);
}

#[test]
fn test_symmetry_equivalent_neighbors_join() {
    let symmetry = cubic();
    // 90 degrees about z is a cubic symmetry operator.
    let quats = vec![rot_z(0.0), rot_z(90.0), rot_z(180.5)];
    let f = field([3, 1, 1], quats, &symmetry);
    let seg = segment(&f, None, &params(2.0));
    assert_eq!(seg.feature_ids, vec![1, 1, 1]);
}

#[test]
fn test_phase_boundary_splits_identical_orientations() {
    let symmetry = cubic();
    let mut f = field([4, 1, 1], vec![Quat::IDENTITY; 4], &symmetry);
    f.phases = vec![1, 1, 2, 0];
    let seg = segment(&f, None, &params(5.0));
    assert_eq!(seg.feature_ids, vec![1, 1, 2, 0]);
}

#[test]
fn test_growth_reference_policies() {
    let symmetry = cubic();
    // A gradient of 3 degree steps.
    let quats: Vec<Quat> = (0..6).map(|i| rot_z(3.0 * i as f64)).collect();
    let f = field([6, 1, 1], quats, &symmetry);

    let mut p = params(5.0);
    assert_eq!(segment(&f, None, &p).seeds, 1);

    p.reference = GrowthReference::Seed;
    assert_eq!(segment(&f, None, &p).feature_ids, vec![1, 1, 2, 2, 3, 3]);

    p.reference = GrowthReference::Average;
    let seg = segment(&f, None, &p);
    assert!(seg.seeds > 1 && seg.seeds < 6);
}

#[test]
fn test_segmentation_is_idempotent() {
    let symmetry = cubic();
    let quats: Vec<Quat> = (0..27).map(|i| rot_z(((i * 7) % 5) as f64 * 20.0)).collect();
    let f = field([3, 3, 3], quats, &symmetry);
    let a = segment(&f, None, &params(5.0));
    let b = segment(&f, None, &params(5.0));
    assert_eq!(a, b);
    assert!(same_partition(&a.feature_ids, &b.feature_ids));
}

#[test]
fn test_min_size_merge_into_most_contacted_neighbor() {
    let symmetry = cubic();
    // A single off-orientation voxel in the centre of a 3x3 grain.
    let mut quats = vec![Quat::IDENTITY; 9];
    quats[4] = rot_z(30.0);
    let f = field([3, 3, 1], quats, &symmetry);
    let mut p = params(5.0);
    p.min_feature_size = 2;

    let seg = segment(&f, None, &p);
    assert_eq!(seg.seeds, 2);
    assert_eq!(seg.feature_ids, vec![1; 9]);
    assert_eq!(seg.active, vec![false, true, false]);

    p.undersized = UndersizedPolicy::Unlabel;
    let seg = segment(&f, None, &p);
    assert_eq!(seg.feature_ids[4], 0);
    assert_eq!(seg.active_count(), 1);
}

#[test]
fn test_undersized_feature_merges_into_undersized_neighbor() {
    let symmetry = cubic();
    // Features in seed order: [0], [1], [2, 3, 4].
    let quats = vec![rot_z(0.0), rot_z(30.0), rot_z(60.0), rot_z(60.0), rot_z(60.0)];
    let f = field([5, 1, 1], quats, &symmetry);
    let mut p = params(5.0);
    p.min_feature_size = 2;

    // Feature 1 is folded into feature 2 first, which then meets the size.
    let seg = segment(&f, None, &p);
    assert_eq!(seg.seeds, 3);
    assert_eq!(seg.feature_ids, vec![2, 2, 3, 3, 3]);
    assert_eq!(seg.active, vec![false, false, true, true]);

    // Two lone voxels: the merged pair is still too small and has no
    // other neighbor, so it is unlabeled.
    let pair = field([2, 1, 1], vec![rot_z(0.0), rot_z(30.0)], &symmetry);
    p.min_feature_size = 3;
    let seg = segment(&pair, None, &p);
    assert_eq!(seg.feature_ids, vec![0, 0]);
    assert_eq!(seg.active_count(), 0);
}

#[test]
fn test_fully_masked_volume_has_no_seeds() {
    let symmetry = cubic();
    let f = field([2, 2, 1], vec![Quat::IDENTITY; 4], &symmetry);
    let seg = segment(&f, Some(&[false; 4]), &params(5.0));
    assert_eq!(seg.seeds, 0);
    assert_eq!(seg.feature_ids, vec![0; 4]);
    assert_eq!(seg.active, vec![false]);
}

#[test]
fn test_randomized_labels_keep_partition() {
    let symmetry = cubic();
    let quats: Vec<Quat> = (0..8).map(|i| rot_z(20.0 * i as f64)).collect();
    let f = field([8, 1, 1], quats, &symmetry);
    let original = segment(&f, None, &params(5.0));

    let mut a = original.clone();
    let mut b = original.clone();
    randomize_labels(&mut a, 42);
    randomize_labels(&mut b, 42);
    assert_eq!(a, b);
    assert!(same_partition(&original.feature_ids, &a.feature_ids));
    assert_eq!(a.active[0], false);
    assert_eq!(a.active_count(), original.active_count());
}
