use criterion::{black_box, criterion_group, criterion_main, Criterion};
use litematica_store::formats::{litematic, structure};
use litematica_store::{BlockState, PackedArray, Region};
use std::time::Duration;

// ── Helpers ──────────────────────────────────────────────────────────────────

fn make_region_solid(size: i32) -> Region {
    let mut r = Region::new("bench", (size, size, size));
    let stone = BlockState::new("minecraft:stone");
    for y in 0..size {
        for z in 0..size {
            for x in 0..size {
                r.set_block(x, y, z, &stone).unwrap();
            }
        }
    }
    r
}

/// Sparse region cycling through `kinds` distinct block names.
fn make_region_mixed(size: i32, pct: f64, kinds: usize) -> Region {
    let mut r = Region::new("bench", (size, size, size));
    let blocks: Vec<BlockState> = (0..kinds)
        .map(|i| BlockState::new(format!("minecraft:block_{}", i)))
        .collect();
    let threshold = (pct * 100.0) as u32;
    let mut counter = 0i32;
    let mut next = 0usize;
    for y in 0..size {
        for z in 0..size {
            for x in 0..size {
                counter = counter.wrapping_mul(1103515245).wrapping_add(12345);
                if (counter.unsigned_abs() % 100) < threshold {
                    r.set_block(x, y, z, &blocks[next % kinds]).unwrap();
                    next += 1;
                }
            }
        }
    }
    r
}

// ── Benchmarks ───────────────────────────────────────────────────────────────

fn bench_set_block(c: &mut Criterion) {
    let mut group = c.benchmark_group("set_block");
    group.measurement_time(Duration::from_secs(3));

    for &size in &[16, 32] {
        group.bench_function(&format!("{}_solid", size), |b| {
            b.iter(|| black_box(make_region_solid(size)));
        });
        group.bench_function(&format!("{}_mixed64", size), |b| {
            b.iter(|| black_box(make_region_mixed(size, 0.5, 64)));
        });
    }
    group.finish();
}

fn bench_get_block(c: &mut Criterion) {
    let mut group = c.benchmark_group("get_block");
    group.measurement_time(Duration::from_secs(3));

    for &size in &[16, 32] {
        let region = make_region_mixed(size, 0.5, 16);
        group.bench_function(&format!("{}_mixed16", size), |b| {
            b.iter(|| {
                let mut sum = 0usize;
                for y in 0..size {
                    for z in 0..size {
                        for x in 0..size {
                            if !region.get_block(x, y, z).unwrap().is_air() {
                                sum += 1;
                            }
                        }
                    }
                }
                black_box(sum);
            });
        });
    }
    group.finish();
}

fn bench_packed_array(c: &mut Criterion) {
    let mut group = c.benchmark_group("packed_array");
    group.measurement_time(Duration::from_secs(2));

    // 5-bit entries straddle word boundaries
    group.bench_function("set_get_5bit_32k", |b| {
        b.iter(|| {
            let mut array = PackedArray::with_bits(5, 32 * 32 * 32);
            for i in 0..array.len() {
                array.set(i, (i % 31) as u32).unwrap();
            }
            let mut sum = 0u64;
            for i in 0..array.len() {
                sum += array.get(i).unwrap() as u64;
            }
            black_box(sum);
        });
    });

    group.bench_function("grow_1_to_12_bits", |b| {
        b.iter(|| {
            let mut array = PackedArray::new(32 * 32 * 32);
            for i in 0..array.len() {
                array.set(i, (i % 4096) as u32).unwrap();
            }
            black_box(array);
        });
    });
    group.finish();
}

fn bench_codecs(c: &mut Criterion) {
    let mut group = c.benchmark_group("codecs");
    group.measurement_time(Duration::from_secs(3));

    let region = make_region_mixed(32, 0.3, 24);
    let litematic_bytes = litematic::to_litematic(&region).unwrap();
    let structure_bytes = structure::to_structure(&region).unwrap();

    group.bench_function("litematic_encode_32", |b| {
        b.iter(|| black_box(litematic::to_litematic(&region).unwrap()));
    });
    group.bench_function("litematic_decode_32", |b| {
        b.iter(|| black_box(litematic::from_litematic(&litematic_bytes).unwrap()));
    });
    group.bench_function("structure_encode_32", |b| {
        b.iter(|| black_box(structure::to_structure(&region).unwrap()));
    });
    group.bench_function("structure_decode_32", |b| {
        b.iter(|| black_box(structure::from_structure(&structure_bytes).unwrap()));
    });
    group.finish();
}

fn bench_change_material(c: &mut Criterion) {
    let mut group = c.benchmark_group("change_material");
    group.measurement_time(Duration::from_secs(2));

    let region = make_region_solid(32);
    let stone = BlockState::new("minecraft:stone");
    let dirt = BlockState::new("minecraft:dirt");
    group.bench_function("32_solid", |b| {
        b.iter_batched(
            || region.clone(),
            |mut r| {
                r.change_material(&stone, &dirt);
                black_box(r);
            },
            criterion::BatchSize::SmallInput,
        );
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_set_block,
    bench_get_block,
    bench_packed_array,
    bench_codecs,
    bench_change_material,
);
criterion_main!(benches);
