// In: benches/segmentation_bench.rs

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use ebsd_pipeline::grid::{Connectivity, VoxelGrid};
use ebsd_pipeline::kernels::field::OrientationField;
use ebsd_pipeline::kernels::segmentation::{segment, GrowthReference, SegmentationParams, UndersizedPolicy};
use ebsd_pipeline::orientation::{CrystalStructure, PhaseSymmetry, Quat};

// --- MOCK DATA GENERATION ---

/// A cubic single-phase volume split into `block`-sized grains, each rotated
/// a few degrees further about z than the one before it.
fn generate_blocky_volume(dims: [usize; 3], block: usize) -> (Vec<f32>, Vec<i32>) {
    let [nx, ny, nz] = dims;
    let grains_x = nx.div_ceil(block);
    let grains_y = ny.div_ceil(block);
    let mut quats = vec![0f32; nx * ny * nz * 4];
    for z in 0..nz {
        for y in 0..ny {
            for x in 0..nx {
                let grain = (z / block) * grains_x * grains_y + (y / block) * grains_x + x / block;
                let angle = (grain as f64 * 7.0).to_radians();
                let index = (z * ny + y) * nx + x;
                Quat::from_axis_angle([0.0, 0.0, 1.0], angle).write_xyzw(&mut quats[index * 4..index * 4 + 4]);
            }
        }
    }
    (quats, vec![1i32; nx * ny * nz])
}

// --- Benchmark Suite ---

fn bench_segmentation(c: &mut Criterion) {
    let symmetry = PhaseSymmetry::from_structure_ids(&[CrystalStructure::Unknown.id(), CrystalStructure::CubicHigh.id()]);
    let mut group = c.benchmark_group("Segmentation");

    for &(side, block) in &[(32usize, 8usize), (64, 8), (64, 32)] {
        let dims = [side, side, 16];
        let (quats, phases) = generate_blocky_volume(dims, block);
        let field = OrientationField::from_arrays(VoxelGrid::new(dims), &quats, &phases, &symmetry);

        for reference in [GrowthReference::Seed, GrowthReference::Neighbor] {
            let params = SegmentationParams {
                tolerance: 5f64.to_radians(),
                connectivity: Connectivity::Face,
                reference,
                min_feature_size: 1,
                undersized: UndersizedPolicy::Unlabel,
            };
            group.bench_with_input(
                BenchmarkId::new(format!("{reference:?}"), format!("{side}x{side}x16/block{block}")),
                &params,
                |b, params| b.iter(|| segment(black_box(&field), None, params)),
            );
        }
    }

    group.finish();
}

criterion_group!(benches, bench_segmentation);
criterion_main!(benches);
