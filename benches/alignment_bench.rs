// In: benches/alignment_bench.rs

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use ebsd_pipeline::kernels::alignment::{align_sections, section_views, AlignmentMode, AlignmentParams, SearchStrategy};
use ebsd_pipeline::kernels::mutual_information::mutual_information;

// --- MOCK DATA GENERATION ---

/// Label sections of a textured pattern, each translated one pixel further
/// in x than the one below it.
fn generate_drifting_sections(nx: usize, ny: usize, nz: usize, bins: i64) -> Vec<u32> {
    let mut labels = Vec::with_capacity(nx * ny * nz);
    for z in 0..nz as i64 {
        for y in 0..ny as i64 {
            for x in 0..nx as i64 {
                let u = x + z;
                labels.push(((u * 7 + y * 13 + u * y) % bins) as u32);
            }
        }
    }
    labels
}

// --- Benchmark Suite ---

const NX: usize = 128;
const NY: usize = 128;
const NZ: usize = 8;

fn bench_alignment(c: &mut Criterion) {
    let labels = generate_drifting_sections(NX, NY, NZ, 16);
    let sections = section_views(&labels, [NX, NY, NZ]).unwrap();

    let mut group = c.benchmark_group("Alignment");

    group.bench_function("mutual_information/single_shift", |b| {
        b.iter(|| mutual_information(black_box(&sections[0]), black_box(&sections[1]), 1, 0))
    });

    let exhaustive = AlignmentParams {
        search_radius: 3,
        strategy: SearchStrategy::Exhaustive,
        mode: AlignmentMode::Local,
        reference_section: 0,
    };
    group.bench_function("align_sections/exhaustive_r3", |b| {
        b.iter(|| align_sections(black_box(&sections), &exhaustive).unwrap())
    });

    let hill_climb = AlignmentParams {
        strategy: SearchStrategy::HillClimb { max_steps: 16 },
        ..exhaustive
    };
    group.bench_function("align_sections/hill_climb_r3", |b| {
        b.iter(|| align_sections(black_box(&sections), &hill_climb).unwrap())
    });

    group.finish();
}

criterion_group!(benches, bench_alignment);
criterion_main!(benches);
