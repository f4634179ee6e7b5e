use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use containers_flatbvh::aabb_tree::{ray_test, RayHit};
use containers_flatbvh::{AabbTree, AabbTreeConfig};
use glam::{Mat4, Vec3};
use math_flatbvh::{Frustum, Ray, AABB};
use rand::prelude::*;

const NUM_LEAVES: u32 = 10_000;

fn random_boxes(count: u32, seed: u64) -> Vec<AABB>
{
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count).map(|_|
    {
        let min = Vec3::new(
            rng.random_range(-1000.0..1000.0),
            rng.random_range(-50.0..50.0),
            rng.random_range(-1000.0..1000.0));
        AABB::new(min, min + Vec3::splat(rng.random_range(0.5..10.0)))
    }).collect()
}

fn build_tree(boxes: &[AABB], high_quality: bool) -> AabbTree<u32>
{
    let mut tree = AabbTree::new(AabbTreeConfig::named("bench").high_quality(high_quality));
    for (key, extents) in boxes.iter().enumerate()
    {
        let _ = tree.add(key as u32, *extents);
    }
    tree.finalize();
    tree
}

fn criterion_benchmark(c: &mut Criterion)
{
    let boxes = random_boxes(NUM_LEAVES, 0x0b0e);

    c.bench_function("rebuild_standard", |b| b.iter(|| black_box(build_tree(&boxes, false))));
    c.bench_function("rebuild_high_quality", |b| b.iter(|| black_box(build_tree(&boxes, true))));

    let tree = build_tree(&boxes, false);
    let hq_tree = build_tree(&boxes, true);

    c.bench_function("rebound_after_moves", |b| b.iter_batched(
        || build_tree(&boxes, false),
        |mut tree|
        {
            for (key, extents) in boxes.iter().enumerate().step_by(3)
            {
                let offset = Vec3::new(2.0, 0.0, 1.0);
                let _ = tree.update(key as u32, AABB::new(extents.min + offset, extents.max + offset));
            }
            tree.finalize();
            tree
        },
        BatchSize::LargeInput));

    let projection = Mat4::perspective_lh(std::f32::consts::FRAC_PI_3, 16.0 / 9.0, 1.0, 600.0);
    let view = Mat4::look_at_lh(Vec3::new(0.0, 30.0, -900.0), Vec3::ZERO, Vec3::Y);
    let frustum = Frustum::from_matrix(&(projection * view));
    let mut visible = Vec::with_capacity(NUM_LEAVES as usize);
    for (name, high_quality) in [("visible_standard", false), ("visible_high_quality", true)]
    {
        // visibility queries take the tree mutably
        let mut tree = build_tree(&boxes, high_quality);
        c.bench_function(name, |b| b.iter(|| black_box(tree.get_visible_nodes(&frustum.planes, &mut visible, 0))));
    }

    let mut overlapping = Vec::new();
    let region = AABB::new(Vec3::new(-100.0, -50.0, -100.0), Vec3::new(100.0, 50.0, 100.0));
    c.bench_function("overlapping", |b| b.iter(|| black_box(tree.get_overlapping_nodes(&region, &mut overlapping, 0))));

    let rays: Vec<Ray> = random_boxes(64, 0x7a75).iter()
        .map(|b| Ray::new(Vec3::new(0.0, 0.0, -1200.0), (b.center() - Vec3::new(0.0, 0.0, -1200.0)).normalize()))
        .collect();
    c.bench_function("ray_test_nearest", |b| b.iter(||
    {
        for ray in &rays
        {
            black_box(ray_test(&[&tree, &hq_tree], ray, |candidate| Some(RayHit { factor: candidate.distance, data: candidate.key })));
        }
    }));

    let mut pairs = Vec::new();
    c.bench_function("overlapping_pairs", |b| b.iter(||
    {
        pairs.clear();
        black_box(tree.get_overlapping_pairs(&mut pairs))
    }));
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
