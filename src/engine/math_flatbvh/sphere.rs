use std::fmt::{Debug, Formatter};
use glam::{Vec3, Vec4, Vec4Swizzles};
use nab_flatbvh::utils::ShortTypeName;
use crate::{Intersection, Intersects, AABB};

#[derive(Default, Clone, Copy, PartialEq)]
pub struct Sphere(pub Vec4);
impl Sphere
{
    pub const EMPTY: Self = Self(Vec4::ZERO);

    #[inline] #[must_use]
    pub const fn new(center: Vec3, radius: f32) -> Self
    {
        Self(Vec4::new(center.x, center.y, center.z, radius))
    }

    #[inline] #[must_use] pub fn center(&self) -> Vec3 { self.0.xyz() }
    #[inline] #[must_use] pub fn radius(&self) -> f32 { self.0.w }
    #[inline] #[must_use] pub fn radius_sq(&self) -> f32 { self.0.w * self.0.w }

    #[must_use]
    pub fn bounds(&self) -> AABB
    {
        let r = Vec3::splat(self.radius());
        AABB::new(self.center() - r, self.center() + r)
    }
}
impl Debug for Sphere
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result
    {
        f.debug_struct(Self::short_type_name())
            .field("center", &self.center())
            .field("radius", &self.radius())
            .finish()
    }
}
impl Intersects<AABB> for Sphere
{
    fn get_intersection(&self, other: AABB) -> Intersection
    {
        let center = self.center();

        let nearest = center.clamp(other.min, other.max);
        if nearest.distance_squared(center) > self.radius_sq()
        {
            return Intersection::None;
        }

        // the farthest corner decides containment
        let farthest = Vec3::select((center - other.min).cmpgt(other.max - center), other.min, other.max);
        match farthest.distance_squared(center) <= self.radius_sq()
        {
            true => Intersection::FullyContained,
            false => Intersection::Overlapping,
        }
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn accessors()
    {
        let sphere = Sphere::new(Vec3::new(1.0, 2.0, 3.0), 2.0);
        assert_eq!(sphere.center(), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(sphere.radius(), 2.0);
        assert_eq!(sphere.radius_sq(), 4.0);
        assert_eq!(sphere.bounds(), AABB::new(Vec3::new(-1.0, 0.0, 1.0), Vec3::new(3.0, 4.0, 5.0)));
    }

    #[test]
    fn box_intersection()
    {
        let sphere = Sphere::new(Vec3::ZERO, 2.0);

        let small = AABB::new(Vec3::splat(-0.5), Vec3::splat(0.5));
        assert_eq!(sphere.get_intersection(small), Intersection::FullyContained);

        let edge = AABB::new(Vec3::new(1.5, -0.5, -0.5), Vec3::new(3.0, 0.5, 0.5));
        assert_eq!(sphere.get_intersection(edge), Intersection::Overlapping);

        // inside the sphere's bounds but outside the sphere itself
        let corner = AABB::new(Vec3::splat(1.5), Vec3::splat(2.0));
        assert_eq!(sphere.get_intersection(corner), Intersection::None);

        let enclosing = AABB::new(Vec3::splat(-5.0), Vec3::splat(5.0));
        assert_eq!(sphere.get_intersection(enclosing), Intersection::Overlapping);
    }
}
