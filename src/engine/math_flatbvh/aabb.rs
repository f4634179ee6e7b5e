use glam::Vec3;
use crate::{Intersection, Intersects, Ray};

// Six-float layout used at API boundaries: min x/y/z then max x/y/z
pub type Extents = [f32; 6];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AABB
{
    pub min: Vec3,
    pub max: Vec3,
}
impl AABB
{
    pub const MIN_MAX: Self = Self { min: Vec3::MIN, max: Vec3::MAX }; // for 'universe' queries
    // inverted infinities, unions with this are no-ops
    pub const EMPTY: Self = Self { min: Vec3::INFINITY, max: Vec3::NEG_INFINITY };

    #[inline] #[must_use] pub const fn new(min: Vec3, max: Vec3) -> Self { Self { min, max } }
    #[inline] #[must_use]
    pub const fn from_extents(e: Extents) -> Self
    {
        Self
        {
            min: Vec3::new(e[0], e[1], e[2]),
            max: Vec3::new(e[3], e[4], e[5]),
        }
    }
    #[inline] #[must_use]
    pub const fn to_extents(self) -> Extents
    {
        [self.min.x, self.min.y, self.min.z, self.max.x, self.max.y, self.max.z]
    }

    // inverted boxes (including EMPTY) hold nothing
    #[inline] #[must_use] pub fn is_empty(self) -> bool { self.min.cmpgt(self.max).any() }

    #[inline] #[must_use] pub fn size(self) -> Vec3 { self.max - self.min }
    #[inline] #[must_use] pub fn half(self) -> Vec3 { (self.max - self.min) / 2.0 }
    #[inline] #[must_use] pub fn center(self) -> Vec3 { (self.min + self.max) / 2.0 }

    #[inline] #[must_use]
    pub fn volume(self) -> f32
    {
        let size = self.size();
        size.x * size.y * size.z
    }

    #[inline] #[must_use]
    pub fn surface_area(self) -> f32
    {
        let size = self.size();
        2.0 * (size.x * size.y + size.y * size.z + size.z * size.x)
    }

    #[inline]
    pub fn union_with(&mut self, other: Self)
    {
        *self = self.unioned_with(other);
    }

    #[inline] #[must_use]
    pub fn unioned_with(self, rhs: Self) -> Self
    {
        Self
        {
            min: self.min.min(rhs.min),
            max: self.max.max(rhs.max),
        }
    }

    #[must_use]
    pub fn fully_contains(self, rhs: Self) -> bool
    {
        self.min.cmple(rhs.min).all() &&
        self.max.cmpge(rhs.max).all()
    }

    #[must_use]
    pub fn overlaps(self, rhs: Self) -> bool
    {
        self.min.cmple(rhs.max).all() &&
        self.max.cmpge(rhs.min).all()
    }

    #[inline] #[must_use]
    pub fn contains_point(self, point: Vec3) -> bool
    {
        self.min.cmple(point).all() &&
        self.max.cmpge(point).all()
    }

    // Parametric slab test. Returns the entry factor along the (unnormalized) ray direction,
    // clamped to zero when the origin is inside, or None if the ray misses within its max factor
    #[must_use]
    pub fn ray_distance(self, ray: &Ray) -> Option<f32>
    {
        let mut t_enter = 0.0f32;
        let mut t_exit = ray.max_factor;

        for axis in 0..3
        {
            let origin = ray.origin[axis];
            let dir = ray.direction[axis];
            let (lo, hi) = (self.min[axis], self.max[axis]);

            if dir == 0.0
            {
                if origin < lo || origin > hi
                {
                    return None;
                }
                continue;
            }

            let recip = 1.0 / dir;
            let t0 = (lo - origin) * recip;
            let t1 = (hi - origin) * recip;
            let (near, far) = if t0 <= t1 { (t0, t1) } else { (t1, t0) };
            t_enter = t_enter.max(near);
            t_exit = t_exit.min(far);
            if t_enter > t_exit
            {
                return None;
            }
        }

        Some(t_enter)
    }
}
impl Default for AABB
{
    fn default() -> Self { Self::EMPTY }
}
impl From<Extents> for AABB
{
    fn from(e: Extents) -> Self { Self::from_extents(e) }
}
impl From<AABB> for Extents
{
    fn from(aabb: AABB) -> Self { aabb.to_extents() }
}
// how `other` sits relative to this box
impl Intersects<AABB> for AABB
{
    fn get_intersection(&self, other: AABB) -> Intersection
    {
        if !self.overlaps(other) { Intersection::None }
        else if self.fully_contains(other) { Intersection::FullyContained }
        else { Intersection::Overlapping }
    }
}
