use glam::Vec3;
use rand::prelude::*;
use math_flatbvh::AABB;

pub const WORLD_HALF_EXTENT: f32 = 1000.0;

#[derive(Debug, Clone, Copy)]
pub struct Mover
{
    pub key: u32,
    pub position: Vec3,
    pub velocity: Vec3,
    pub half_size: Vec3,
}
impl Mover
{
    #[inline] #[must_use]
    pub fn bounds(&self) -> AABB
    {
        AABB::new(self.position - self.half_size, self.position + self.half_size)
    }
}

// Seeded random world: static boxes plus movers that bounce around inside the world bounds
pub struct Scene
{
    rng: StdRng,
    pub movers: Vec<Mover>,
    next_key: u32,
}
impl Scene
{
    #[must_use]
    pub fn new(seed: u64) -> Self
    {
        Self
        {
            rng: StdRng::seed_from_u64(seed),
            movers: Vec::new(),
            next_key: 0,
        }
    }

    #[must_use]
    pub fn random_point(&mut self) -> Vec3
    {
        let w = WORLD_HALF_EXTENT;
        Vec3::new(
            self.rng.random_range(-w..w),
            self.rng.random_range(-w / 10.0..w / 10.0),
            self.rng.random_range(-w..w))
    }

    #[must_use]
    pub fn random_static_box(&mut self) -> AABB
    {
        let center = self.random_point();
        let half = Vec3::new(
            self.rng.random_range(0.5..12.0),
            self.rng.random_range(0.5..6.0),
            self.rng.random_range(0.5..12.0));
        AABB::new(center - half, center + half)
    }

    pub fn spawn_mover(&mut self) -> Mover
    {
        let mover = Mover
        {
            key: self.next_key,
            position: self.random_point(),
            velocity: Vec3::new(self.rng.random_range(-20.0..20.0), 0.0, self.rng.random_range(-20.0..20.0)),
            half_size: Vec3::splat(self.rng.random_range(0.5..3.0)),
        };
        self.next_key += 1;
        self.movers.push(mover);
        mover
    }

    pub fn advance(&mut self, dt: f32)
    {
        let w = WORLD_HALF_EXTENT;
        for mover in &mut self.movers
        {
            mover.position += mover.velocity * dt;
            for axis in [0, 2]
            {
                if mover.position[axis].abs() > w
                {
                    mover.position[axis] = mover.position[axis].clamp(-w, w);
                    mover.velocity[axis] = -mover.velocity[axis];
                }
            }
        }
    }

    // Despawn roughly `fraction` of the movers, returning their keys
    pub fn despawn_some(&mut self, fraction: f32) -> Vec<u32>
    {
        let mut despawned = Vec::new();
        let rng = &mut self.rng;
        self.movers.retain(|m|
        {
            let keep = !rng.random_bool(fraction as f64);
            if !keep { despawned.push(m.key); }
            keep
        });
        despawned
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn movers_stay_in_world()
    {
        let mut scene = Scene::new(3);
        for _ in 0..50 { scene.spawn_mover(); }
        for _ in 0..500 { scene.advance(1.0); }

        let world = AABB::new(Vec3::splat(-WORLD_HALF_EXTENT), Vec3::splat(WORLD_HALF_EXTENT));
        assert!(scene.movers.iter().all(|m| world.contains_point(m.position)));
    }

    #[test]
    fn despawn_reports_keys()
    {
        let mut scene = Scene::new(4);
        for _ in 0..200 { scene.spawn_mover(); }
        let despawned = scene.despawn_some(0.25);
        assert_eq!(scene.movers.len() + despawned.len(), 200);
        assert!(despawned.iter().all(|k| scene.movers.iter().all(|m| m.key != *k)));
    }
}
