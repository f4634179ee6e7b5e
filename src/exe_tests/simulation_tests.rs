use std::collections::HashMap;
use std::f32::consts::FRAC_PI_3;
use std::sync::Arc;
use approx::assert_relative_eq;
use containers_flatbvh::aabb_tree::{ray_test, RayHit};
use containers_flatbvh::{AabbTree, AabbTreeConfig, NodePool};
use glam::{Mat4, Vec3};
use math_flatbvh::{Frustum, Ray, AABB};
use rand::prelude::*;

struct World
{
    rng: StdRng,
    statics: HashMap<u32, AABB>,
    movers: HashMap<u32, (AABB, Vec3)>,
    static_tree: AabbTree<u32>,
    dynamic_tree: AabbTree<u32>,
    next_key: u32,
}
impl World
{
    fn new(seed: u64, high_quality: bool) -> Self
    {
        let pool = Arc::new(NodePool::default());
        Self
        {
            rng: StdRng::seed_from_u64(seed),
            statics: HashMap::new(),
            movers: HashMap::new(),
            static_tree: AabbTree::with_pool(AabbTreeConfig::named("static").high_quality(high_quality), pool.clone()),
            dynamic_tree: AabbTree::with_pool(AabbTreeConfig::named("dynamic").high_quality(high_quality), pool),
            next_key: 0,
        }
    }

    fn random_box(&mut self, max_size: f32) -> AABB
    {
        let min = Vec3::new(
            self.rng.random_range(-300.0..300.0),
            self.rng.random_range(-20.0..20.0),
            self.rng.random_range(-300.0..300.0));
        AABB::new(min, min + Vec3::splat(self.rng.random_range(0.5..max_size)))
    }

    fn populate(&mut self, statics: u32, movers: u32)
    {
        for _ in 0..statics
        {
            let extents = self.random_box(10.0);
            self.static_tree.add(self.next_key, extents).unwrap();
            self.statics.insert(self.next_key, extents);
            self.next_key += 1;
        }
        for _ in 0..movers
        {
            self.spawn_mover();
        }
        self.static_tree.finalize();
        self.dynamic_tree.finalize();
    }

    fn spawn_mover(&mut self)
    {
        let extents = self.random_box(3.0);
        let velocity = Vec3::new(self.rng.random_range(-4.0..4.0), 0.0, self.rng.random_range(-4.0..4.0));
        self.dynamic_tree.add(self.next_key, extents).unwrap();
        self.movers.insert(self.next_key, (extents, velocity));
        self.next_key += 1;
    }

    fn step(&mut self)
    {
        for (key, (extents, velocity)) in &mut self.movers
        {
            *extents = AABB::new(extents.min + *velocity, extents.max + *velocity);
            self.dynamic_tree.update(*key, *extents).unwrap();
        }

        let mut keys: Vec<u32> = self.movers.keys().copied().collect();
        keys.sort();
        for key in keys
        {
            if self.rng.random_bool(0.01)
            {
                self.dynamic_tree.remove(key).unwrap();
                self.movers.remove(&key);
                self.spawn_mover();
            }
        }

        self.static_tree.finalize();
        self.dynamic_tree.finalize();
    }

    fn everything(&self) -> impl Iterator<Item = (u32, AABB)> + '_
    {
        self.statics.iter().map(|(k, e)| (*k, *e))
            .chain(self.movers.iter().map(|(k, (e, _))| (*k, *e)))
    }
}

fn sorted(mut keys: Vec<u32>) -> Vec<u32>
{
    keys.sort();
    keys
}

fn run_simulation(seed: u64, high_quality: bool)
{
    let mut world = World::new(seed, high_quality);
    world.populate(1500, 400);

    let projection = Mat4::perspective_lh(FRAC_PI_3, 1.5, 1.0, 250.0);
    let mut visible = Vec::new();
    let mut overlapping = Vec::new();

    for step in 0..40
    {
        world.step();
        assert_eq!(world.static_tree.validate(), Ok(()));
        assert_eq!(world.dynamic_tree.validate(), Ok(()));
        assert_eq!(world.dynamic_tree.get_num_leaves(), world.movers.len());

        // frustum, both trees appended into one list
        let angle = step as f32 * 0.15;
        let eye = Vec3::new(angle.cos() * 200.0, 10.0, angle.sin() * 200.0);
        let frustum = Frustum::from_matrix(&(projection * Mat4::look_at_lh(eye, Vec3::ZERO, Vec3::Y)));
        let num_static = world.static_tree.get_visible_nodes(&frustum.planes, &mut visible, 0);
        let num_dynamic = world.dynamic_tree.get_visible_nodes(&frustum.planes, &mut visible, num_static);
        assert_eq!(visible.len(), num_static + num_dynamic);

        let expected: Vec<u32> = world.everything()
            .filter(|(_, e)| !frustum.planes.iter().any(|p| p.is_aabb_outside(e)))
            .map(|(k, _)| k)
            .collect();
        assert_eq!(sorted(visible.clone()), sorted(expected));

        // region
        let center = Vec3::new(world.rng.random_range(-250.0..250.0), 0.0, world.rng.random_range(-250.0..250.0));
        let region = AABB::new(center - Vec3::splat(40.0), center + Vec3::splat(40.0));
        let num_static = world.static_tree.get_overlapping_nodes(&region, &mut overlapping, 0);
        world.dynamic_tree.get_overlapping_nodes(&region, &mut overlapping, num_static);
        let expected: Vec<u32> = world.everything()
            .filter(|(_, e)| region.overlaps(*e))
            .map(|(k, _)| k)
            .collect();
        assert_eq!(sorted(overlapping.clone()), sorted(expected));

        // nearest ray hit across both trees
        let ray = Ray::new(eye, (center - eye).normalize());
        let hit = ray_test(&[&world.static_tree, &world.dynamic_tree], &ray, |c|
        {
            Some(RayHit { factor: c.distance, data: c.key })
        });
        let expected = world.everything()
            .filter_map(|(_, e)| e.ray_distance(&ray))
            .fold(None, |best: Option<f32>, d| Some(best.map_or(d, |b| b.min(d))));
        match (hit, expected)
        {
            (None, None) => { },
            (Some(hit), Some(expected)) => assert_relative_eq!(hit.factor, expected),
            (hit, expected) => panic!("Ray mismatch at step {step}: {hit:?} vs {expected:?}"),
        }
    }
}

#[test]
fn standard_simulation()
{
    run_simulation(0xfeed, false);
}

#[test]
fn high_quality_simulation()
{
    run_simulation(0xbeef, true);
}
